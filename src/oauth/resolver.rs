//! Decide how each provider is configured from the settings registry.
//!
//! A provider moves Disabled → Configuring → Registered. Disabled providers
//! resolve to `None`; configured ones yield a [`ClientRegistration`] whose
//! endpoints come either from a discovery metadata URL or from explicit
//! authorize/token/API settings.

use super::provider::{PROVIDERS, ProviderSpec};
use crate::error::{SettingsError, SettingsResult};
use crate::settings::SettingsRegistry;
use tracing::{debug, info};

/// Where a client's endpoints come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointSource {
    /// A single metadata document supplies the authorize, token and userinfo endpoints.
    Discovery { metadata_url: String },
    /// Individually configured endpoints.
    Manual {
        authorize_url: String,
        token_url: String,
        api_base_url: String,
    },
}

/// Everything needed to build an OAuth client for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRegistration {
    pub provider: &'static ProviderSpec,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub endpoints: EndpointSource,
}

impl ClientRegistration {
    pub fn name(&self) -> &'static str {
        self.provider.name
    }

    pub fn token_session_key(&self) -> String {
        self.provider.token_session_key()
    }

    pub fn uses_discovery(&self) -> bool {
        matches!(self.endpoints, EndpointSource::Discovery { .. })
    }
}

/// Resolve one provider. `Ok(None)` means the provider is disabled.
pub fn resolve(
    spec: &'static ProviderSpec,
    registry: &SettingsRegistry,
) -> SettingsResult<Option<ClientRegistration>> {
    if !registry.bool_value(spec.enabled)? {
        debug!(provider = spec.name, "OAuth provider disabled");
        return Ok(None);
    }

    let client_id = registry.str_value(spec.client_id)?;
    let client_secret = registry.str_value(spec.client_secret)?;
    let scope = registry.str_value(spec.scope)?;

    let endpoints = match discovery_url(spec, registry)? {
        Some(metadata_url) => EndpointSource::Discovery { metadata_url },
        None => EndpointSource::Manual {
            authorize_url: required(spec, registry, spec.authorize_url)?,
            token_url: required(spec, registry, spec.token_url)?,
            api_base_url: registry.str_value(spec.api_base_url)?,
        },
    };

    info!(
        provider = spec.name,
        discovery = matches!(endpoints, EndpointSource::Discovery { .. }),
        "OAuth provider configured"
    );

    Ok(Some(ClientRegistration {
        provider: spec,
        client_id,
        client_secret,
        scope,
        endpoints,
    }))
}

/// Resolve every provider, keeping only the enabled ones.
pub fn resolve_all(registry: &SettingsRegistry) -> SettingsResult<Vec<ClientRegistration>> {
    let mut registrations = Vec::new();
    for spec in &PROVIDERS {
        if let Some(registration) = resolve(spec, registry)? {
            registrations.push(registration);
        }
    }
    Ok(registrations)
}

/// The metadata URL, when the provider supports discovery, auto-configure is on,
/// and a URL is set.
fn discovery_url(spec: &ProviderSpec, registry: &SettingsRegistry) -> SettingsResult<Option<String>> {
    let Some(discovery) = spec.discovery else {
        return Ok(None);
    };
    if !registry.bool_value(discovery.auto_configure)? {
        return Ok(None);
    }
    let url = registry.str_value(discovery.metadata_url)?;
    Ok(Some(url).filter(|u| !u.trim().is_empty()))
}

fn required(spec: &ProviderSpec, registry: &SettingsRegistry, setting: &str) -> SettingsResult<String> {
    let value = registry.str_value(setting)?;
    if value.trim().is_empty() {
        return Err(SettingsError::MissingProviderSetting {
            provider: spec.name.to_string(),
            setting: setting.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::oauth::provider::{AZURE, GITHUB, GOOGLE, OIDC};
    use serde_json::json;

    fn registry(values: &[(&str, serde_json::Value)]) -> SettingsRegistry {
        let r = SettingsRegistry::build(Database::open_in_memory().unwrap()).unwrap();
        for (name, value) in values {
            r.set(name, value).unwrap();
        }
        r
    }

    #[test]
    fn disabled_provider_is_absent() {
        let r = registry(&[]);
        for spec in &PROVIDERS {
            assert_eq!(resolve(spec, &r).unwrap(), None);
        }
        assert!(resolve_all(&r).unwrap().is_empty());
    }

    #[test]
    fn plain_provider_uses_manual_endpoints() {
        let r = registry(&[
            ("github_oauth_enabled", json!(true)),
            ("github_oauth_key", json!("gh-id")),
            ("github_oauth_secret", json!("gh-secret")),
        ]);

        let reg = resolve(&GITHUB, &r).unwrap().unwrap();
        assert_eq!(reg.client_id, "gh-id");
        assert_eq!(reg.scope, "email");
        assert_eq!(reg.token_session_key(), "github_token");
        assert_eq!(
            reg.endpoints,
            EndpointSource::Manual {
                authorize_url: "https://github.com/login/oauth/authorize".into(),
                token_url: "https://github.com/login/oauth/access_token".into(),
                api_base_url: "https://api.github.com/user".into(),
            }
        );
    }

    #[test]
    fn discovery_selected_with_auto_configure_and_url() {
        let r = registry(&[
            ("oidc_oauth_enabled", json!("true")),
            ("oidc_oauth_auto_configure", json!(true)),
            (
                "oidc_oauth_metadata_url",
                json!("https://idp.example.com/.well-known/openid-configuration"),
            ),
        ]);

        let reg = resolve(&OIDC, &r).unwrap().unwrap();
        assert!(reg.uses_discovery());
        assert_eq!(
            reg.endpoints,
            EndpointSource::Discovery {
                metadata_url: "https://idp.example.com/.well-known/openid-configuration".into()
            }
        );
    }

    #[test]
    fn auto_configure_off_requires_explicit_endpoints() {
        let base = [
            ("azure_oauth_enabled", json!(true)),
            ("azure_oauth_auto_configure", json!(false)),
            ("azure_oauth_metadata_url", json!("https://login.example.com/meta")),
        ];
        let r = registry(&base);
        let err = resolve(&AZURE, &r).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::MissingProviderSetting { ref setting, .. } if setting == "azure_oauth_authorize_url"
        ));

        r.set("azure_oauth_authorize_url", &json!("https://login.example.com/authorize"))
            .unwrap();
        r.set("azure_oauth_token_url", &json!("https://login.example.com/token"))
            .unwrap();
        let reg = resolve(&AZURE, &r).unwrap().unwrap();
        assert!(!reg.uses_discovery());
        assert!(matches!(
            reg.endpoints,
            EndpointSource::Manual { ref token_url, .. } if token_url == "https://login.example.com/token"
        ));
    }

    #[test]
    fn empty_metadata_url_falls_back_to_manual() {
        let r = registry(&[
            ("oidc_oauth_enabled", json!(true)),
            ("oidc_oauth_auto_configure", json!(true)),
            ("oidc_oauth_metadata_url", json!("  ")),
            ("oidc_oauth_authorize_url", json!("https://idp/authorize")),
            ("oidc_oauth_token_url", json!("https://idp/token")),
        ]);
        assert!(!resolve(&OIDC, &r).unwrap().unwrap().uses_discovery());
    }

    #[test]
    fn non_discovery_provider_ignores_metadata() {
        let r = registry(&[("google_oauth_enabled", json!("1"))]);
        let reg = resolve(&GOOGLE, &r).unwrap().unwrap();
        assert!(!reg.uses_discovery());
        assert_eq!(resolve_all(&r).unwrap().len(), 1);
    }
}
