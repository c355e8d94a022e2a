//! Typed setting values and the coercion rules that produce them.
//!
//! Every setting has a fixed [`ValueKind`]. Raw input (environment strings,
//! stored rows, administrative writes, YAML values) arrives as a
//! [`serde_json::Value`] and is coerced into a [`SettingValue`] of that kind.

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Strings that coerce to `true` for boolean settings (compared lower-cased).
const TRUTHY: [&str; 3] = ["true", "t", "1"];

/// The declared type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    Dict,
    List,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Int => write!(f, "int"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::String => write!(f, "string"),
            ValueKind::Dict => write!(f, "dict"),
            ValueKind::List => write!(f, "list"),
        }
    }
}

/// A resolved setting value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Dict(Map<String, Value>),
    List(Vec<Value>),
}

impl ValueKind {
    /// Coerce `raw` into a value of this kind.
    ///
    /// `name` is only used to build the error message.
    pub fn coerce(self, name: &str, raw: &Value) -> SettingsResult<SettingValue> {
        match self {
            ValueKind::Bool => Ok(SettingValue::Bool(match raw {
                Value::Bool(b) => *b,
                other => is_truthy_text(&text_form(other)),
            })),
            ValueKind::Int => coerce_int(name, raw).map(SettingValue::Int),
            ValueKind::Float => coerce_float(name, raw).map(SettingValue::Float),
            ValueKind::String => Ok(SettingValue::Str(text_form(raw))),
            ValueKind::Dict => match coerce_structured(name, raw)? {
                None => Ok(SettingValue::Dict(Map::new())),
                Some(Value::Object(map)) => Ok(SettingValue::Dict(map)),
                Some(other) => Err(SettingsError::coercion(name, other, "expected a mapping")),
            },
            ValueKind::List => match coerce_structured(name, raw)? {
                None => Ok(SettingValue::List(Vec::new())),
                Some(Value::Array(items)) => Ok(SettingValue::List(items)),
                Some(other) => Err(SettingsError::coercion(name, other, "expected a list")),
            },
        }
    }
}

/// Lenient boolean text comparison: unrecognized strings are `false`.
pub fn is_truthy_text(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    TRUTHY.contains(&lowered.as_str())
}

/// Parse JSON, falling back to the legacy single-quoted `True`/`False` form.
///
/// The legacy form is what older deployments stored, e.g. `{'A': True}`.
pub fn parse_json_lenient(text: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(_) => {
            let legacy = text
                .replace('\'', "\"")
                .replace("True", "true")
                .replace("False", "false");
            serde_json::from_str(&legacy)
        }
    }
}

/// String form of a raw value (strings verbatim, null empty).
fn text_form(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn coerce_int(name: &str, raw: &Value) -> SettingsResult<i64> {
    match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else {
                // 2^63 is exact in f64; the cast would saturate outside it.
                const LIMIT: f64 = 9_223_372_036_854_775_808.0;
                match n.as_f64().map(f64::trunc) {
                    Some(t) if (-LIMIT..LIMIT).contains(&t) => Ok(t as i64),
                    _ => Err(SettingsError::coercion(name, n, "not a representable integer")),
                }
            }
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| SettingsError::coercion(name, s, e)),
        other => Err(SettingsError::coercion(name, other, "expected an integer")),
    }
}

fn coerce_float(name: &str, raw: &Value) -> SettingsResult<f64> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| SettingsError::coercion(name, n, "not a representable float")),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| SettingsError::coercion(name, s, e)),
        other => Err(SettingsError::coercion(name, other, "expected a number")),
    }
}

/// Shared Dict/List handling. `None` means "empty string", which yields an empty container.
fn coerce_structured(name: &str, raw: &Value) -> SettingsResult<Option<Value>> {
    match raw {
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => parse_json_lenient(s)
            .map(Some)
            .map_err(|e| SettingsError::coercion(name, s, format!("cannot parse json: {}", e))),
        other => Ok(Some(other.clone())),
    }
}

impl SettingValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SettingValue::Bool(_) => ValueKind::Bool,
            SettingValue::Int(_) => ValueKind::Int,
            SettingValue::Float(_) => ValueKind::Float,
            SettingValue::Str(_) => ValueKind::String,
            SettingValue::Dict(_) => ValueKind::Dict,
            SettingValue::List(_) => ValueKind::List,
        }
    }

    /// Kind-specific truthiness.
    pub fn as_bool(&self) -> bool {
        match self {
            SettingValue::Bool(b) => *b,
            SettingValue::Int(i) => *i > 0,
            SettingValue::Float(f) => *f > 0.0,
            SettingValue::Dict(map) => !map.is_empty(),
            SettingValue::List(items) => !items.is_empty(),
            SettingValue::Str(s) => is_truthy_text(s),
        }
    }

    /// Number of entries, only defined for Dict and List.
    pub fn len(&self) -> Option<usize> {
        match self {
            SettingValue::Dict(map) => Some(map.len()),
            SettingValue::List(items) => Some(items.len()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Map<String, Value>> {
        match self {
            SettingValue::Dict(map) => Some(map),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            SettingValue::Bool(b) => Value::Bool(*b),
            SettingValue::Int(i) => Value::from(*i),
            SettingValue::Float(f) => Value::from(*f),
            SettingValue::Str(s) => Value::String(s.clone()),
            SettingValue::Dict(map) => Value::Object(map.clone()),
            SettingValue::List(items) => Value::Array(items.clone()),
        }
    }

    /// Text written to the persisted row: JSON for Dict/List, plain text otherwise.
    pub fn to_stored_text(&self) -> String {
        match self {
            SettingValue::Str(s) => s.clone(),
            SettingValue::Bool(b) => b.to_string(),
            SettingValue::Int(i) => i.to_string(),
            SettingValue::Float(f) => f.to_string(),
            SettingValue::Dict(_) | SettingValue::List(_) => self.to_json().to_string(),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_stored_text())
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Str(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Str(value)
    }
}
