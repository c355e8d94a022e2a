//! OAuth2/OIDC client registration driven by settings.
//!
//! Each provider (google, github, azure, oidc) is resolved from the settings
//! registry. Only enabled providers get a client and HTTP routes.

mod client;
mod error;
pub mod provider;
mod resolver;
mod routes;
mod session;

pub use client::{OAuthClient, ProviderMetadata, ResolvedEndpoints, TokenResponse};
pub use error::OAuthError;
pub use provider::{PROVIDERS, ProviderSpec};
pub use resolver::{ClientRegistration, EndpointSource, resolve, resolve_all};
pub use routes::{LOGIN_COMPLETE_PATH, provider_router};
pub use session::{
    DEFAULT_SESSION_COOKIE, MemorySessionStore, SessionStore, new_session_id, session_cookie,
    session_id_from_headers,
};

use crate::config::HostConfig;
use crate::error::SettingsError;
use crate::settings::SettingsRegistry;
use axum::Router;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Client(#[from] OAuthError),
}

/// Clients for every enabled provider, keyed by provider name.
#[derive(Default, Clone)]
pub struct OAuthProviders {
    clients: BTreeMap<&'static str, Arc<OAuthClient>>,
}

impl OAuthProviders {
    /// Resolve all providers and build a client for each enabled one.
    pub fn from_registry(registry: &SettingsRegistry) -> Result<Self, RegistrationError> {
        let mut providers = Self::default();
        for registration in resolve_all(registry)? {
            providers.register(OAuthClient::new(registration)?);
        }
        Ok(providers)
    }

    pub fn register(&mut self, client: OAuthClient) {
        self.clients.insert(client.name(), Arc::new(client));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<OAuthClient>> {
        self.clients.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.clients.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Login and callback routes for every registered provider.
    pub fn router(&self, sessions: Arc<dyn SessionStore>, host: HostConfig) -> Router {
        self.clients
            .values()
            .fold(Router::new(), |router, client| {
                router.merge(provider_router(client.clone(), sessions.clone(), host.clone()))
            })
    }
}
