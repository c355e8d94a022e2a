use thiserror::Error;

/// Failures while talking to an identity provider.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("metadata discovery from {url} failed: {reason}")]
    Discovery { url: String, reason: String },

    #[error("token endpoint returned status {status}")]
    TokenEndpoint { status: u16, body: String },

    #[error("provider denied authorization: {error}")]
    Denied {
        error: String,
        description: Option<String>,
    },

    #[error("token response carried no access token")]
    MissingAccessToken,

    #[error("authorization state does not match the pending login")]
    StateMismatch,

    #[error("callback is missing the authorization code")]
    MissingCode,
}

impl OAuthError {
    pub fn discovery(url: &str, reason: impl ToString) -> Self {
        Self::Discovery {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
