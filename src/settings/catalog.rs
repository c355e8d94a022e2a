//! Built-in setting catalog and named setting groups.

use super::descriptor::SettingDescriptor;
use super::value::SettingValue;
use serde_json::{Map, Value};

/// Named groups of settings, used by administrative pages and `get_group`.
pub const GROUPS: &[(&str, &[&str])] = &[
    (
        "basic",
        &[
            "maintenance",
            "fullscreen_layout",
            "record_helper",
            "login_ldap_first",
            "default_record_table_size",
            "default_domain_table_size",
            "auto_ptr",
            "record_quick_edit",
            "pretty_ipv6_ptr",
            "dnssec_admins_only",
            "allow_user_create_domain",
            "allow_user_remove_domain",
            "allow_user_view_history",
            "delete_sso_accounts",
            "bg_domain_updates",
            "enable_api_rr_history",
            "preserve_history",
            "site_name",
            "site_url",
            "session_timeout",
            "warn_session_timeout",
            "ttl_options",
            "otp_field_enabled",
            "custom_css",
            "enforce_api_ttl",
            "account_name_extra_chars",
            "gravatar_enabled",
            "max_history_records",
            "deny_domain_override",
        ],
    ),
    (
        "pdns",
        &["pdns_api_url", "pdns_api_key", "pdns_api_timeout", "pdns_version"],
    ),
    (
        "records",
        &["forward_records_allow_edit", "reverse_records_allow_edit"],
    ),
    (
        "authentication",
        &[
            "local_db_enabled",
            "signup_enabled",
            "verify_user_email",
            "otp_force",
            "pwd_enforce_characters",
            "pwd_min_len",
            "pwd_min_lowercase",
            "pwd_min_uppercase",
            "pwd_min_digits",
            "pwd_min_special",
        ],
    ),
    (
        "ldap",
        &[
            "ldap_enabled",
            "ldap_type",
            "ldap_uri",
            "ldap_base_dn",
            "ldap_admin_username",
            "ldap_admin_password",
            "ldap_filter_basic",
            "ldap_filter_username",
            "ldap_sg_enabled",
            "ldap_admin_group",
            "ldap_operator_group",
            "ldap_user_group",
        ],
    ),
    (
        "google",
        &[
            "google_oauth_enabled",
            "google_oauth_client_id",
            "google_oauth_client_secret",
            "google_oauth_scope",
            "google_authorize_url",
            "google_token_url",
            "google_base_url",
        ],
    ),
    (
        "github",
        &[
            "github_oauth_enabled",
            "github_oauth_key",
            "github_oauth_secret",
            "github_oauth_scope",
            "github_oauth_authorize_url",
            "github_oauth_token_url",
            "github_oauth_api_url",
        ],
    ),
    (
        "azure",
        &[
            "azure_oauth_enabled",
            "azure_oauth_key",
            "azure_oauth_secret",
            "azure_oauth_scope",
            "azure_oauth_authorize_url",
            "azure_oauth_token_url",
            "azure_oauth_api_url",
            "azure_oauth_auto_configure",
            "azure_oauth_metadata_url",
            "azure_sg_enabled",
            "azure_admin_group",
            "azure_operator_group",
            "azure_user_group",
        ],
    ),
    (
        "oidc",
        &[
            "oidc_oauth_enabled",
            "oidc_oauth_key",
            "oidc_oauth_secret",
            "oidc_oauth_scope",
            "oidc_oauth_authorize_url",
            "oidc_oauth_token_url",
            "oidc_oauth_api_url",
            "oidc_oauth_auto_configure",
            "oidc_oauth_metadata_url",
            "oidc_oauth_logout_url",
            "oidc_oauth_username",
            "oidc_oauth_email",
            "oidc_oauth_firstname",
            "oidc_oauth_last_name",
        ],
    ),
];

/// Look up the member names of a named group.
pub fn group(name: &str) -> Option<&'static [&'static str]> {
    GROUPS
        .iter()
        .find(|(group_name, _)| *group_name == name)
        .map(|(_, members)| *members)
}

/// Record-type editor flags, e.g. `{"A": true, "SOA": false}`.
fn record_flags(entries: &[(&str, bool)]) -> SettingValue {
    let map: Map<String, Value> = entries
        .iter()
        .map(|(rtype, enabled)| (rtype.to_string(), Value::Bool(*enabled)))
        .collect();
    SettingValue::Dict(map)
}

fn forward_record_defaults() -> SettingValue {
    record_flags(&[
        ("A", true),
        ("AAAA", true),
        ("AFSDB", false),
        ("ALIAS", false),
        ("CAA", true),
        ("CERT", false),
        ("CDNSKEY", false),
        ("CDS", false),
        ("CNAME", true),
        ("DNSKEY", false),
        ("DNAME", false),
        ("DS", false),
        ("HINFO", false),
        ("KEY", false),
        ("LOC", true),
        ("LUA", false),
        ("MX", true),
        ("NAPTR", false),
        ("NS", true),
        ("NSEC", false),
        ("NSEC3", false),
        ("NSEC3PARAM", false),
        ("OPENPGPKEY", false),
        ("PTR", true),
        ("RP", false),
        ("RRSIG", false),
        ("SOA", false),
        ("SPF", true),
        ("SSHFP", false),
        ("SRV", true),
        ("TKEY", false),
        ("TSIG", false),
        ("TLSA", false),
        ("SMIMEA", false),
        ("TXT", true),
        ("URI", false),
    ])
}

fn reverse_record_defaults() -> SettingValue {
    record_flags(&[
        ("A", false),
        ("AAAA", false),
        ("AFSDB", false),
        ("ALIAS", false),
        ("CAA", false),
        ("CERT", false),
        ("CDNSKEY", false),
        ("CDS", false),
        ("CNAME", false),
        ("DNSKEY", false),
        ("DNAME", false),
        ("DS", false),
        ("HINFO", true),
        ("KEY", false),
        ("LOC", true),
        ("LUA", false),
        ("MX", false),
        ("NAPTR", false),
        ("NS", true),
        ("NSEC", false),
        ("NSEC3", false),
        ("NSEC3PARAM", false),
        ("OPENPGPKEY", false),
        ("PTR", true),
        ("RP", false),
        ("RRSIG", false),
        ("SOA", false),
        ("SPF", false),
        ("SSHFP", false),
        ("SRV", false),
        ("TKEY", false),
        ("TSIG", false),
        ("TLSA", false),
        ("SMIMEA", false),
        ("TXT", true),
        ("URI", false),
    ])
}

/// Every setting the application knows about, with its compiled-in default.
pub fn catalog() -> Vec<SettingDescriptor> {
    vec![
        // Site behaviour
        SettingDescriptor::new("maintenance", false)
            .with_label("Maintenance mode")
            .with_description("Reject non-administrative requests while enabled."),
        SettingDescriptor::new("fullscreen_layout", true).with_label("Fullscreen layout"),
        SettingDescriptor::new("record_helper", true).with_label("Record helper"),
        SettingDescriptor::new("login_ldap_first", true).with_label("Select LDAP on login page"),
        SettingDescriptor::new("default_record_table_size", 15i64),
        SettingDescriptor::new("default_domain_table_size", 10i64),
        SettingDescriptor::new("auto_ptr", false).with_label("Automatic PTR records"),
        SettingDescriptor::new("record_quick_edit", true),
        SettingDescriptor::new("pretty_ipv6_ptr", false),
        SettingDescriptor::new("dnssec_admins_only", false),
        SettingDescriptor::new("allow_user_create_domain", false),
        SettingDescriptor::new("allow_user_remove_domain", false),
        SettingDescriptor::new("allow_user_view_history", false),
        SettingDescriptor::new("delete_sso_accounts", false),
        SettingDescriptor::new("bg_domain_updates", false),
        SettingDescriptor::new("enable_api_rr_history", true),
        SettingDescriptor::new("preserve_history", false),
        SettingDescriptor::new("site_name", "Zone Admin").with_label("Site name"),
        SettingDescriptor::new("site_url", "http://localhost:9191").with_label("Site URL"),
        SettingDescriptor::new("session_timeout", 10i64)
            .with_label("Session timeout")
            .with_description("Minutes of inactivity before a session expires."),
        SettingDescriptor::new("warn_session_timeout", true),
        SettingDescriptor::new("ttl_options", "1 minute,5 minutes,30 minutes,60 minutes,24 hours")
            .with_label("TTL options")
            .with_description("Comma separated list of durations offered in the record editor."),
        SettingDescriptor::new("otp_field_enabled", true),
        SettingDescriptor::new("custom_css", ""),
        SettingDescriptor::new("enforce_api_ttl", false),
        SettingDescriptor::new("account_name_extra_chars", false),
        SettingDescriptor::new("gravatar_enabled", false),
        SettingDescriptor::new("max_history_records", 1000i64),
        SettingDescriptor::new("deny_domain_override", false),
        // PowerDNS API
        SettingDescriptor::new("pdns_api_url", "").with_label("PowerDNS API URL"),
        SettingDescriptor::new("pdns_api_key", "").with_label("PowerDNS API key"),
        SettingDescriptor::new("pdns_api_timeout", 30i64)
            .with_label("PowerDNS API timeout")
            .with_description("Seconds."),
        SettingDescriptor::new("pdns_version", "4.1.1"),
        SettingDescriptor::new("verify_ssl_connections", true),
        // Record editor
        SettingDescriptor::new("forward_records_allow_edit", forward_record_defaults())
            .with_label("Forward zone record types"),
        SettingDescriptor::new("reverse_records_allow_edit", reverse_record_defaults())
            .with_label("Reverse zone record types"),
        // Local authentication
        SettingDescriptor::new("local_db_enabled", true),
        SettingDescriptor::new("signup_enabled", true),
        SettingDescriptor::new("verify_user_email", false),
        SettingDescriptor::new("otp_force", false),
        SettingDescriptor::new("pwd_enforce_characters", false),
        SettingDescriptor::new("pwd_min_len", 10i64),
        SettingDescriptor::new("pwd_min_lowercase", 3i64),
        SettingDescriptor::new("pwd_min_uppercase", 2i64),
        SettingDescriptor::new("pwd_min_digits", 2i64),
        SettingDescriptor::new("pwd_min_special", 1i64),
        // LDAP
        SettingDescriptor::new("ldap_enabled", false),
        SettingDescriptor::new("ldap_type", "ldap"),
        SettingDescriptor::new("ldap_uri", ""),
        SettingDescriptor::new("ldap_base_dn", ""),
        SettingDescriptor::new("ldap_admin_username", ""),
        SettingDescriptor::new("ldap_admin_password", ""),
        SettingDescriptor::new("ldap_filter_basic", ""),
        SettingDescriptor::new("ldap_filter_username", ""),
        SettingDescriptor::new("ldap_sg_enabled", false),
        SettingDescriptor::new("ldap_admin_group", ""),
        SettingDescriptor::new("ldap_operator_group", ""),
        SettingDescriptor::new("ldap_user_group", ""),
        // Google OAuth
        SettingDescriptor::new("google_oauth_enabled", false).with_label("Google OAuth"),
        SettingDescriptor::new("google_oauth_client_id", ""),
        SettingDescriptor::new("google_oauth_client_secret", ""),
        SettingDescriptor::new("google_oauth_scope", "openid email profile"),
        SettingDescriptor::new(
            "google_authorize_url",
            "https://accounts.google.com/o/oauth2/v2/auth",
        ),
        SettingDescriptor::new("google_token_url", "https://oauth2.googleapis.com/token"),
        SettingDescriptor::new("google_base_url", "https://www.googleapis.com/oauth2/v3/"),
        // GitHub OAuth
        SettingDescriptor::new("github_oauth_enabled", false).with_label("GitHub OAuth"),
        SettingDescriptor::new("github_oauth_key", ""),
        SettingDescriptor::new("github_oauth_secret", ""),
        SettingDescriptor::new("github_oauth_scope", "email"),
        SettingDescriptor::new(
            "github_oauth_authorize_url",
            "https://github.com/login/oauth/authorize",
        ),
        SettingDescriptor::new(
            "github_oauth_token_url",
            "https://github.com/login/oauth/access_token",
        ),
        SettingDescriptor::new("github_oauth_api_url", "https://api.github.com/user"),
        // Azure AD OAuth
        SettingDescriptor::new("azure_oauth_enabled", false).with_label("Microsoft Azure OAuth"),
        SettingDescriptor::new("azure_oauth_key", ""),
        SettingDescriptor::new("azure_oauth_secret", ""),
        SettingDescriptor::new("azure_oauth_scope", "User.Read openid email profile"),
        SettingDescriptor::new("azure_oauth_authorize_url", ""),
        SettingDescriptor::new("azure_oauth_token_url", ""),
        SettingDescriptor::new("azure_oauth_api_url", "https://graph.microsoft.com/v1.0/"),
        SettingDescriptor::new("azure_oauth_auto_configure", true)
            .with_description("Resolve endpoints from the metadata URL when one is set."),
        SettingDescriptor::new("azure_oauth_metadata_url", ""),
        SettingDescriptor::new("azure_sg_enabled", false),
        SettingDescriptor::new("azure_admin_group", ""),
        SettingDescriptor::new("azure_operator_group", ""),
        SettingDescriptor::new("azure_user_group", ""),
        // Generic OpenID Connect
        SettingDescriptor::new("oidc_oauth_enabled", false).with_label("OpenID Connect"),
        SettingDescriptor::new("oidc_oauth_key", ""),
        SettingDescriptor::new("oidc_oauth_secret", ""),
        SettingDescriptor::new("oidc_oauth_scope", "email"),
        SettingDescriptor::new("oidc_oauth_authorize_url", ""),
        SettingDescriptor::new("oidc_oauth_token_url", ""),
        SettingDescriptor::new("oidc_oauth_api_url", ""),
        SettingDescriptor::new("oidc_oauth_auto_configure", true)
            .with_description("Resolve endpoints from the metadata URL when one is set."),
        SettingDescriptor::new("oidc_oauth_metadata_url", ""),
        SettingDescriptor::new("oidc_oauth_logout_url", ""),
        SettingDescriptor::new("oidc_oauth_username", "preferred_username"),
        SettingDescriptor::new("oidc_oauth_email", "email"),
        SettingDescriptor::new("oidc_oauth_firstname", "given_name"),
        SettingDescriptor::new("oidc_oauth_last_name", "family_name"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_names_are_unique() {
        let entries = catalog();
        let names: HashSet<&str> = entries.iter().map(|d| d.name()).collect();
        assert_eq!(names.len(), entries.len());
    }

    #[test]
    fn every_group_member_is_in_catalog() {
        let entries = catalog();
        let names: HashSet<&str> = entries.iter().map(|d| d.name()).collect();
        for (group_name, members) in GROUPS {
            for member in *members {
                assert!(names.contains(member), "{group_name}: {member} missing");
            }
        }
    }

    #[test]
    fn group_lookup() {
        assert_eq!(
            group("pdns"),
            Some(&["pdns_api_url", "pdns_api_key", "pdns_api_timeout", "pdns_version"][..])
        );
        assert!(group("saml").is_none());
    }
}
