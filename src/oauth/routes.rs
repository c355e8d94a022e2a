//! Login and callback routes for enabled providers.
//!
//! `GET /<provider>/login` stores a fresh CSRF state in the session and sends
//! the browser to the provider. `GET /<provider>/authorized` checks that state,
//! exchanges the code and stores the token under `<provider>_token`. A
//! successful callback moves the session to a new id. Failures are logged and
//! end on a fixed login error page; nothing from the callback query is
//! reflected back.

use super::client::OAuthClient;
use super::error::OAuthError;
use super::session::{
    DEFAULT_SESSION_COOKIE, SessionStore, new_session_id, session_cookie, session_id_from_headers,
};
use crate::config::HostConfig;
use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where the browser lands after a successful login.
pub const LOGIN_COMPLETE_PATH: &str = "/login";

#[derive(Clone)]
struct ProviderRoutes {
    client: Arc<OAuthClient>,
    sessions: Arc<dyn SessionStore>,
    host: HostConfig,
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Router with login and callback routes for one provider.
pub fn provider_router(
    client: Arc<OAuthClient>,
    sessions: Arc<dyn SessionStore>,
    host: HostConfig,
) -> Router {
    let spec = client.registration().provider;
    Router::new()
        .route(&spec.login_path(), get(login))
        .route(&spec.callback_path(), get(authorized))
        .with_state(ProviderRoutes {
            client,
            sessions,
            host,
        })
}

fn cookie_name(host: &HostConfig) -> String {
    host.get_str("SESSION_COOKIE_NAME")
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string())
}

/// Absolute callback URL. `SERVER_EXTERNAL_SSL` forces `https`.
fn callback_url(routes: &ProviderRoutes, headers: &HeaderMap) -> String {
    let scheme = if routes.host.get_bool("SERVER_EXTERNAL_SSL") {
        "https".to_string()
    } else {
        headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http")
            .to_string()
    };

    let authority = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let address = routes
                .host
                .get_str("BIND_ADDRESS")
                .unwrap_or_else(|| "127.0.0.1".to_string());
            let port = routes.host.get_u16("PORT").unwrap_or(9191);
            format!("{}:{}", address, port)
        });

    format!(
        "{}://{}{}",
        scheme,
        authority,
        routes.client.registration().provider.callback_path()
    )
}

fn failure_redirect(provider: &str) -> Response {
    Redirect::to(&format!("{}?oauth_error={}", LOGIN_COMPLETE_PATH, provider)).into_response()
}

fn set_cookie_header(routes: &ProviderRoutes, session_id: &str) -> (header::HeaderName, String) {
    let value = session_cookie(
        &cookie_name(&routes.host),
        session_id,
        routes.host.get_bool("SESSION_COOKIE_SECURE"),
    );
    (header::SET_COOKIE, value)
}

async fn login(State(routes): State<ProviderRoutes>, headers: HeaderMap) -> Response {
    let provider = routes.client.name();
    // Only ids this store issued are reused.
    let existing = session_id_from_headers(&headers, &cookie_name(&routes.host))
        .filter(|id| routes.sessions.contains(id));
    let session_id = existing.clone().unwrap_or_else(new_session_id);

    let redirect_uri = callback_url(&routes, &headers);
    let state = uuid::Uuid::new_v4().simple().to_string();

    let authorize_url = match routes.client.authorize_url(&redirect_uri, &state).await {
        Ok(url) => url,
        Err(e) => {
            error!(provider, error = %e, "Cannot start OAuth login");
            return failure_redirect(provider);
        }
    };

    routes.sessions.insert(
        &session_id,
        &routes.client.registration().provider.redirect_session_key(),
        json!({ "state": state, "redirect_uri": redirect_uri }),
    );
    info!(provider, "Redirecting to identity provider");

    if existing.is_some() {
        return Redirect::to(&authorize_url).into_response();
    }
    ([set_cookie_header(&routes, &session_id)], Redirect::to(&authorize_url)).into_response()
}

async fn authorized(
    State(routes): State<ProviderRoutes>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let provider = routes.client.name();
    let inbound_error = params.error.clone();
    let inbound_description = params.error_description.clone();
    match complete_login(&routes, &headers, params).await {
        Ok(session_id) => {
            info!(provider, "OAuth login completed");
            (
                [set_cookie_header(&routes, &session_id)],
                Redirect::to(LOGIN_COMPLETE_PATH),
            )
                .into_response()
        }
        Err(e) => {
            warn!(
                provider,
                error = %e,
                inbound_error = ?inbound_error,
                error_description = ?inbound_description,
                "OAuth callback failed"
            );
            failure_redirect(provider)
        }
    }
}

/// Returns the rotated session id now holding the token.
async fn complete_login(
    routes: &ProviderRoutes,
    headers: &HeaderMap,
    params: CallbackParams,
) -> Result<String, OAuthError> {
    let spec = routes.client.registration().provider;
    let session_id =
        session_id_from_headers(headers, &cookie_name(&routes.host)).ok_or(OAuthError::StateMismatch)?;

    // The pending login is single use whatever the outcome.
    let pending = routes
        .sessions
        .remove(&session_id, &spec.redirect_session_key())
        .ok_or(OAuthError::StateMismatch)?;

    if let Some(error) = params.error {
        return Err(OAuthError::Denied {
            error,
            description: params.error_description,
        });
    }

    let expected = pending.get("state").and_then(|s| s.as_str());
    if expected.is_none() || expected != params.state.as_deref() {
        return Err(OAuthError::StateMismatch);
    }

    let code = params.code.filter(|c| !c.is_empty()).ok_or(OAuthError::MissingCode)?;
    // The exchange must repeat the redirect_uri sent with the authorize request.
    let redirect_uri = pending
        .get("redirect_uri")
        .and_then(|u| u.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| callback_url(routes, headers));
    let token = routes.client.exchange_code(&code, &redirect_uri).await?;

    let session_id = routes.sessions.rotate(&session_id);
    routes.client.update_token(routes.sessions.as_ref(), &session_id, &token);
    Ok(session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::provider::GITHUB;
    use crate::oauth::resolver::{ClientRegistration, EndpointSource};
    use crate::oauth::session::MemorySessionStore;

    fn routes(host: HostConfig) -> ProviderRoutes {
        let registration = ClientRegistration {
            provider: &GITHUB,
            client_id: "id".into(),
            client_secret: "secret".into(),
            scope: "email".into(),
            endpoints: EndpointSource::Manual {
                authorize_url: "https://github.com/login/oauth/authorize".into(),
                token_url: "https://github.com/login/oauth/access_token".into(),
                api_base_url: String::new(),
            },
        };
        ProviderRoutes {
            client: Arc::new(OAuthClient::new(registration).unwrap()),
            sessions: Arc::new(MemorySessionStore::new()),
            host,
        }
    }

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), header::HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn callback_url_follows_request_host() {
        let r = routes(HostConfig::default());
        let h = headers(&[(header::HOST, "dns.example.com")]);
        assert_eq!(callback_url(&r, &h), "http://dns.example.com/github/authorized");
    }

    #[test]
    fn external_ssl_forces_https() {
        let host = HostConfig::default();
        host.insert("SERVER_EXTERNAL_SSL", json!("true"));
        let r = routes(host);
        let h = headers(&[(header::HOST, "dns.example.com")]);
        assert_eq!(callback_url(&r, &h), "https://dns.example.com/github/authorized");
    }

    #[test]
    fn callback_url_falls_back_to_bind_address() {
        let host = HostConfig::default();
        host.insert("BIND_ADDRESS", json!("0.0.0.0"));
        host.insert("PORT", json!(8080));
        let r = routes(host);
        assert_eq!(
            callback_url(&r, &HeaderMap::new()),
            "http://0.0.0.0:8080/github/authorized"
        );
    }

    #[test]
    fn custom_cookie_name() {
        let host = HostConfig::default();
        assert_eq!(cookie_name(&host), DEFAULT_SESSION_COOKIE);
        host.insert("SESSION_COOKIE_NAME", json!("sid"));
        assert_eq!(cookie_name(&host), "sid");
    }

    #[tokio::test]
    async fn missing_pending_login_is_state_mismatch() {
        let r = routes(HostConfig::default());
        let h = headers(&[(header::COOKIE, "zoneadmin_session=abc")]);
        let params = CallbackParams {
            code: Some("c".into()),
            state: Some("s".into()),
            error: None,
            error_description: None,
        };
        assert!(matches!(
            complete_login(&r, &h, params).await,
            Err(OAuthError::StateMismatch)
        ));
    }

    #[tokio::test]
    async fn wrong_state_consumes_pending_login() {
        let r = routes(HostConfig::default());
        r.sessions
            .insert("abc", "github_oauthredir", json!({"state": "expected"}));
        let h = headers(&[(header::COOKIE, "zoneadmin_session=abc")]);
        let params = CallbackParams {
            code: Some("c".into()),
            state: Some("forged".into()),
            error: None,
            error_description: None,
        };

        assert!(matches!(
            complete_login(&r, &h, params).await,
            Err(OAuthError::StateMismatch)
        ));
        assert!(r.sessions.get("abc", "github_oauthredir").is_none());
    }
}
