//! The host configuration map.
//!
//! An upper-case keyed JSON map seeded from the layered config files and
//! overlaid with environment-sourced settings. Other collaborators (HTTP
//! server, session layer) read it directly.

use arc_swap::ArcSwap;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct HostConfig {
    inner: Arc<ArcSwap<Map<String, Value>>>,
}

impl HostConfig {
    pub fn new(map: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(map)),
        }
    }

    /// Build from a merged config document. Non-object documents yield an empty map.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::new(map),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.load().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.load().contains_key(key)
    }

    /// Insert or replace one key.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.inner.rcu(|current| {
            let mut next = Map::clone(current);
            next.insert(key.clone(), value.clone());
            next
        });
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Boolean view using the same lenient text rule as boolean settings.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => crate::settings::is_truthy_text(&s),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f > 0.0),
            _ => false,
        }
    }

    pub fn get_u16(&self, key: &str) -> Option<u16> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Current contents as an owned map.
    pub fn snapshot(&self) -> Map<String, Value> {
        Map::clone(&self.inner.load())
    }
}

impl std::fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self.inner.load().keys().cloned().collect();
        f.debug_struct("HostConfig").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_is_visible_to_clones() {
        let host = HostConfig::default();
        let shared = host.clone();
        host.insert("SITE_NAME", json!("Example"));
        assert_eq!(shared.get_str("SITE_NAME").as_deref(), Some("Example"));
    }

    #[test]
    fn typed_views() {
        let host = HostConfig::from_value(json!({
            "SERVER_EXTERNAL_SSL": "True",
            "PORT": 9191,
            "DEBUG": false
        }));
        assert!(host.get_bool("SERVER_EXTERNAL_SSL"));
        assert!(!host.get_bool("DEBUG"));
        assert!(!host.get_bool("MISSING"));
        assert_eq!(host.get_u16("PORT"), Some(9191));
    }

    #[test]
    fn non_object_document_is_empty() {
        let host = HostConfig::from_value(json!([1, 2]));
        assert!(host.snapshot().is_empty());
    }
}
