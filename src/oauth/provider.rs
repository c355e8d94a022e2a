//! Provider descriptors: which settings configure each identity provider.

/// Settings that enable endpoint discovery from a metadata document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoverySettings {
    pub auto_configure: &'static str,
    pub metadata_url: &'static str,
}

/// Setting names for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSpec {
    pub name: &'static str,
    pub enabled: &'static str,
    pub client_id: &'static str,
    pub client_secret: &'static str,
    pub scope: &'static str,
    pub authorize_url: &'static str,
    pub token_url: &'static str,
    pub api_base_url: &'static str,
    /// `None` for providers that are always configured manually
    pub discovery: Option<DiscoverySettings>,
}

pub const GOOGLE: ProviderSpec = ProviderSpec {
    name: "google",
    enabled: "google_oauth_enabled",
    client_id: "google_oauth_client_id",
    client_secret: "google_oauth_client_secret",
    scope: "google_oauth_scope",
    authorize_url: "google_authorize_url",
    token_url: "google_token_url",
    api_base_url: "google_base_url",
    discovery: None,
};

pub const GITHUB: ProviderSpec = ProviderSpec {
    name: "github",
    enabled: "github_oauth_enabled",
    client_id: "github_oauth_key",
    client_secret: "github_oauth_secret",
    scope: "github_oauth_scope",
    authorize_url: "github_oauth_authorize_url",
    token_url: "github_oauth_token_url",
    api_base_url: "github_oauth_api_url",
    discovery: None,
};

pub const AZURE: ProviderSpec = ProviderSpec {
    name: "azure",
    enabled: "azure_oauth_enabled",
    client_id: "azure_oauth_key",
    client_secret: "azure_oauth_secret",
    scope: "azure_oauth_scope",
    authorize_url: "azure_oauth_authorize_url",
    token_url: "azure_oauth_token_url",
    api_base_url: "azure_oauth_api_url",
    discovery: Some(DiscoverySettings {
        auto_configure: "azure_oauth_auto_configure",
        metadata_url: "azure_oauth_metadata_url",
    }),
};

pub const OIDC: ProviderSpec = ProviderSpec {
    name: "oidc",
    enabled: "oidc_oauth_enabled",
    client_id: "oidc_oauth_key",
    client_secret: "oidc_oauth_secret",
    scope: "oidc_oauth_scope",
    authorize_url: "oidc_oauth_authorize_url",
    token_url: "oidc_oauth_token_url",
    api_base_url: "oidc_oauth_api_url",
    discovery: Some(DiscoverySettings {
        auto_configure: "oidc_oauth_auto_configure",
        metadata_url: "oidc_oauth_metadata_url",
    }),
};

/// Every supported provider.
pub const PROVIDERS: [ProviderSpec; 4] = [GOOGLE, GITHUB, AZURE, OIDC];

pub fn provider(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|p| p.name == name)
}

impl ProviderSpec {
    /// Session slot holding this provider's token.
    pub fn token_session_key(&self) -> String {
        format!("{}_token", self.name)
    }

    /// Session slot holding the CSRF state and redirect URI of a pending login.
    pub fn redirect_session_key(&self) -> String {
        format!("{}_oauthredir", self.name)
    }

    pub fn callback_path(&self) -> String {
        format!("/{}/authorized", self.name)
    }

    pub fn login_path(&self) -> String {
        format!("/{}/login", self.name)
    }
}
