//! HTTP server: health check plus OAuth login routes for enabled providers.

use crate::config::HostConfig;
use crate::oauth::{OAuthProviders, SessionStore};
use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
struct HealthState {
    providers: Arc<Vec<&'static str>>,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    oauth_providers: Vec<&'static str>,
}

async fn health(State(state): State<HealthState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        oauth_providers: state.providers.as_ref().clone(),
    })
}

/// Full application router.
pub fn build_router(providers: &OAuthProviders, sessions: Arc<dyn SessionStore>, host: HostConfig) -> Router {
    let health_state = HealthState {
        providers: Arc::new(providers.names()),
    };

    Router::new()
        .route("/health", get(health))
        .with_state(health_state)
        .merge(providers.router(sessions, host))
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve in the background. Send on the returned channel to stop.
pub async fn start_server(app: Router, addr: SocketAddr) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;
    info!("Listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}
