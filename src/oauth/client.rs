//! OAuth2 client for one provider.
//!
//! Discovery-configured clients fetch the provider's metadata document on
//! first use and cache the resulting endpoints for the life of the client.

use super::error::OAuthError;
use super::resolver::{ClientRegistration, EndpointSource};
use super::session::SessionStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Fields of a provider metadata document that the client uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    #[serde(default)]
    pub issuer: Option<String>,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
}

/// Endpoints the client talks to, after discovery if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    /// Empty when the provider exposes no API base
    pub api_base_url: String,
}

/// Token endpoint response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct OAuthClient {
    registration: ClientRegistration,
    http: reqwest::Client,
    endpoints: OnceCell<ResolvedEndpoints>,
}

impl OAuthClient {
    pub fn new(registration: ClientRegistration) -> Result<Self, OAuthError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self::with_http_client(registration, http))
    }

    pub fn with_http_client(registration: ClientRegistration, http: reqwest::Client) -> Self {
        Self {
            registration,
            http,
            endpoints: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.registration.name()
    }

    pub fn registration(&self) -> &ClientRegistration {
        &self.registration
    }

    /// Endpoints for this client, running discovery on first call.
    pub async fn endpoints(&self) -> Result<&ResolvedEndpoints, OAuthError> {
        self.endpoints.get_or_try_init(|| self.resolve_endpoints()).await
    }

    async fn resolve_endpoints(&self) -> Result<ResolvedEndpoints, OAuthError> {
        match &self.registration.endpoints {
            EndpointSource::Manual {
                authorize_url,
                token_url,
                api_base_url,
            } => Ok(ResolvedEndpoints {
                authorize_url: authorize_url.clone(),
                token_url: token_url.clone(),
                api_base_url: api_base_url.clone(),
            }),
            EndpointSource::Discovery { metadata_url } => {
                let metadata = self.discover(metadata_url).await?;
                Ok(ResolvedEndpoints {
                    authorize_url: metadata.authorization_endpoint,
                    token_url: metadata.token_endpoint,
                    api_base_url: metadata.userinfo_endpoint.unwrap_or_default(),
                })
            }
        }
    }

    async fn discover(&self, metadata_url: &str) -> Result<ProviderMetadata, OAuthError> {
        info!(provider = self.name(), url = %metadata_url, "Fetching provider metadata");

        let response = self
            .http
            .get(metadata_url)
            .send()
            .await
            .map_err(|e| OAuthError::discovery(metadata_url, e))?;

        if !response.status().is_success() {
            return Err(OAuthError::discovery(
                metadata_url,
                format!("status {}", response.status()),
            ));
        }

        let metadata: ProviderMetadata = response
            .json()
            .await
            .map_err(|e| OAuthError::discovery(metadata_url, e))?;

        if metadata.authorization_endpoint.is_empty() || metadata.token_endpoint.is_empty() {
            return Err(OAuthError::discovery(metadata_url, "missing endpoints"));
        }

        debug!(
            provider = self.name(),
            issuer = metadata.issuer.as_deref().unwrap_or(""),
            "Provider metadata loaded"
        );
        Ok(metadata)
    }

    /// URL the browser is sent to for the provider's consent page.
    pub async fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String, OAuthError> {
        let endpoints = self.endpoints().await?;
        let separator = if endpoints.authorize_url.contains('?') { '&' } else { '?' };

        let mut url = format!(
            "{}{}response_type=code&client_id={}&redirect_uri={}&state={}",
            endpoints.authorize_url,
            separator,
            urlencoding::encode(&self.registration.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
        );
        if !self.registration.scope.is_empty() {
            url.push_str("&scope=");
            url.push_str(&urlencoding::encode(&self.registration.scope));
        }
        Ok(url)
    }

    /// Exchange an authorization code for a token.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse, OAuthError> {
        let endpoints = self.endpoints().await?;

        let response = self
            .http
            .post(&endpoints.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", self.registration.client_id.as_str()),
                ("client_secret", self.registration.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(provider = self.name(), status = status.as_u16(), "Token exchange rejected");
            return Err(OAuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        parse_token_body(body)
    }

    /// Token stored in the session, if any.
    pub fn fetch_token(&self, sessions: &dyn SessionStore, session_id: &str) -> Option<TokenResponse> {
        let value = sessions.get(session_id, &self.registration.token_session_key())?;
        serde_json::from_value(value).ok()
    }

    /// Store a token in the session slot for this provider.
    pub fn update_token(&self, sessions: &dyn SessionStore, session_id: &str, token: &TokenResponse) {
        match serde_json::to_value(token) {
            Ok(value) => sessions.insert(session_id, &self.registration.token_session_key(), value),
            Err(e) => warn!(provider = self.name(), error = %e, "Cannot serialize token"),
        }
    }
}

/// Some providers (GitHub among them) report errors in a 200 response body.
fn parse_token_body(body: Value) -> Result<TokenResponse, OAuthError> {
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Err(OAuthError::Denied {
            error: error.to_string(),
            description: body
                .get("error_description")
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }
    if body.get("access_token").and_then(Value::as_str).is_none() {
        return Err(OAuthError::MissingAccessToken);
    }
    serde_json::from_value(body).map_err(|_| OAuthError::MissingAccessToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::provider::{GITHUB, OIDC};
    use crate::oauth::session::MemorySessionStore;
    use serde_json::json;

    fn manual() -> ClientRegistration {
        ClientRegistration {
            provider: &GITHUB,
            client_id: "id with space".into(),
            client_secret: "secret".into(),
            scope: "read:user email".into(),
            endpoints: EndpointSource::Manual {
                authorize_url: "https://github.com/login/oauth/authorize".into(),
                token_url: "https://github.com/login/oauth/access_token".into(),
                api_base_url: "https://api.github.com/user".into(),
            },
        }
    }

    #[tokio::test]
    async fn authorize_url_is_encoded() {
        let client = OAuthClient::new(manual()).unwrap();
        let url = client
            .authorize_url("http://localhost:9191/github/authorized", "st8")
            .await
            .unwrap();

        assert_eq!(
            url,
            "https://github.com/login/oauth/authorize?response_type=code\
             &client_id=id%20with%20space\
             &redirect_uri=http%3A%2F%2Flocalhost%3A9191%2Fgithub%2Fauthorized\
             &state=st8&scope=read%3Auser%20email"
        );
    }

    #[tokio::test]
    async fn manual_endpoints_need_no_network() {
        let client = OAuthClient::new(manual()).unwrap();
        let endpoints = client.endpoints().await.unwrap();
        assert_eq!(endpoints.api_base_url, "https://api.github.com/user");
    }

    #[tokio::test]
    async fn unreachable_metadata_is_a_discovery_error() {
        let registration = ClientRegistration {
            provider: &OIDC,
            client_id: "id".into(),
            client_secret: "s".into(),
            scope: "openid".into(),
            endpoints: EndpointSource::Discovery {
                metadata_url: "http://127.0.0.1:1/.well-known/openid-configuration".into(),
            },
        };
        let client = OAuthClient::new(registration).unwrap();
        assert!(matches!(
            client.endpoints().await,
            Err(OAuthError::Discovery { .. })
        ));
    }

    #[test]
    fn token_body_errors() {
        let denied = parse_token_body(json!({"error": "bad_verification_code"})).unwrap_err();
        assert!(matches!(denied, OAuthError::Denied { ref error, .. } if error == "bad_verification_code"));
        assert!(matches!(
            parse_token_body(json!({"token_type": "bearer"})),
            Err(OAuthError::MissingAccessToken)
        ));

        let token = parse_token_body(json!({"access_token": "abc", "token_type": "bearer", "x": 1})).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.extra["x"], 1);
    }

    #[test]
    fn session_token_hooks() {
        let client = OAuthClient::new(manual()).unwrap();
        let sessions = MemorySessionStore::new();
        assert!(client.fetch_token(&sessions, "sid").is_none());

        let token = parse_token_body(json!({"access_token": "abc"})).unwrap();
        client.update_token(&sessions, "sid", &token);
        assert_eq!(client.fetch_token(&sessions, "sid"), Some(token));
        assert!(sessions.get("sid", "github_token").is_some());
    }
}
