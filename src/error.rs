//! Structured error types for settings and provider configuration.

use serde::Serialize;
use std::path::PathBuf;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Catalog errors
    SettingNotRegistered,
    SettingAlreadyRegistered,
    UnknownGroup,

    // Value errors
    InvalidSettingValue,
    LengthUnsupported,
    InvalidDuration,
    MissingProviderSetting,

    // Bootstrap errors
    EnvironmentConflict,
    SecretFileUnreadable,
    InvalidConfigFile,

    // Internal errors
    DatabaseError,
}

/// Errors raised by the settings registry, loader and store.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Setting '{0}' is not registered")]
    NotRegistered(String),

    #[error("Setting '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("Cannot coerce {value} for setting {name}: {reason}")]
    Coercion {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Both {env} and {file_env} are set but are exclusive")]
    EnvironmentConflict { env: String, file_env: String },

    #[error("Cannot read secret file {} for {env}: {source}", path.display())]
    SecretFile {
        env: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot persist setting '{name}': {reason}")]
    Persistence { name: String, reason: String },

    #[error("Setting '{name}' of kind {kind} has no length")]
    LengthUnsupported { name: String, kind: String },

    #[error("Unknown setting group: {0}")]
    UnknownGroup(String),

    #[error("Cannot parse duration '{0}'")]
    InvalidDuration(String),

    #[error("Provider {provider} requires a non-empty '{setting}'")]
    MissingProviderSetting { provider: String, setting: String },

    #[error("Invalid configuration file {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl SettingsError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SettingsError::NotRegistered(_) => ErrorCode::SettingNotRegistered,
            SettingsError::AlreadyRegistered(_) => ErrorCode::SettingAlreadyRegistered,
            SettingsError::Coercion { .. } => ErrorCode::InvalidSettingValue,
            SettingsError::EnvironmentConflict { .. } => ErrorCode::EnvironmentConflict,
            SettingsError::SecretFile { .. } => ErrorCode::SecretFileUnreadable,
            SettingsError::Persistence { .. } => ErrorCode::DatabaseError,
            SettingsError::LengthUnsupported { .. } => ErrorCode::LengthUnsupported,
            SettingsError::UnknownGroup(_) => ErrorCode::UnknownGroup,
            SettingsError::InvalidDuration(_) => ErrorCode::InvalidDuration,
            SettingsError::MissingProviderSetting { .. } => ErrorCode::MissingProviderSetting,
            SettingsError::Config { .. } => ErrorCode::InvalidConfigFile,
        }
    }

    pub fn coercion(name: &str, value: impl ToString, reason: impl ToString) -> Self {
        SettingsError::Coercion {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn persistence(name: &str, err: impl std::fmt::Display) -> Self {
        SettingsError::Persistence {
            name: name.to_string(),
            reason: err.to_string(),
        }
    }

    /// True for errors that must abort startup.
    pub fn is_fatal_at_bootstrap(&self) -> bool {
        matches!(
            self,
            SettingsError::EnvironmentConflict { .. }
                | SettingsError::SecretFile { .. }
                | SettingsError::Coercion { .. }
                | SettingsError::NotRegistered(_)
                | SettingsError::Config { .. }
        )
    }
}

/// Result type for settings operations.
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_message_names_setting_and_value() {
        let err = SettingsError::coercion("forward_records_allow_edit", "{oops", "expected value");
        let msg = err.to_string();
        assert!(msg.contains("forward_records_allow_edit"));
        assert!(msg.contains("{oops"));
        assert_eq!(err.code(), ErrorCode::InvalidSettingValue);
    }

    #[test]
    fn conflict_is_fatal() {
        let err = SettingsError::EnvironmentConflict {
            env: "SITE_NAME".into(),
            file_env: "SITE_NAME_FILE".into(),
        };
        assert!(err.is_fatal_at_bootstrap());
        assert_eq!(
            err.to_string(),
            "Both SITE_NAME and SITE_NAME_FILE are set but are exclusive"
        );
    }

    #[test]
    fn persistence_is_recoverable() {
        let err = SettingsError::persistence("maintenance", "database is locked");
        assert!(!err.is_fatal_at_bootstrap());
        let code = serde_json::to_value(err.code()).unwrap();
        assert_eq!(code, "DATABASE_ERROR");
    }
}
