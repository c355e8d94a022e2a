//! Environment variable access.
//!
//! Loading goes through [`EnvSource`] so tests can supply a fixed map instead
//! of mutating the process environment.

use std::collections::HashMap;

pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;

    fn contains(&self, key: &str) -> bool {
        self.var(key).is_some()
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}
