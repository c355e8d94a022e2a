//! Deep merge for layered YAML configuration files.
//!
//! Later layers override earlier ones field-by-field. Arrays are replaced
//! entirely, not concatenated.

use serde_json::Value;

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans, nulls are replaced entirely
/// - If overlay is null, the base value is preserved (null means "not specified")
///
/// # Example
/// ```
/// use serde_json::json;
/// use zoneadmin_settings::config::deep_merge;
///
/// let baseline = json!({
///     "PORT": 9191,
///     "SESSION": { "COOKIE_NAME": "zoneadmin_session", "SECURE": false }
/// });
/// let deployment = json!({
///     "SESSION": { "SECURE": true }
/// });
/// let merged = deep_merge(baseline, deployment);
/// assert_eq!(merged["PORT"], 9191);
/// assert_eq!(merged["SESSION"]["SECURE"], true);
/// assert_eq!(merged["SESSION"]["COOKIE_NAME"], "zoneadmin_session");
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge layers in order, with later layers taking precedence.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_keys_win() {
        let base = json!({"BIND_ADDRESS": "127.0.0.1", "PORT": 9191});
        let overlay = json!({"PORT": 80, "LOG_LEVEL": "debug"});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"BIND_ADDRESS": "127.0.0.1", "PORT": 80, "LOG_LEVEL": "debug"})
        );
    }

    #[test]
    fn nested_sections_merge() {
        let base = json!({"MAIL": {"SERVER": "localhost", "PORT": 25}});
        let overlay = json!({"MAIL": {"PORT": 587}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"MAIL": {"SERVER": "localhost", "PORT": 587}})
        );
    }

    #[test]
    fn lists_are_replaced() {
        let base = json!({"TRUSTED_PROXIES": ["10.0.0.1", "10.0.0.2"]});
        let overlay = json!({"TRUSTED_PROXIES": ["192.168.1.1"]});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"TRUSTED_PROXIES": ["192.168.1.1"]})
        );
    }

    #[test]
    fn null_keeps_lower_layer() {
        let base = json!({"SECRET_KEY": "abc"});
        let overlay = json!({"SECRET_KEY": null});
        assert_eq!(deep_merge(base, overlay), json!({"SECRET_KEY": "abc"}));
    }

    #[test]
    fn three_layers_fold_in_order() {
        let layers = vec![
            json!({"PORT": 9191, "DEBUG": false}),
            json!({"PORT": 8080}),
            json!({"DEBUG": true}),
        ];
        assert_eq!(deep_merge_all(layers), json!({"PORT": 8080, "DEBUG": true}));
    }
}
