//! Field value model.
//!
//! Each field kind stores one shape of value. Instead of an untyped "anything" the engine
//! uses a small tagged union; the rendering adapter is the single place converting between
//! a concrete widget value and [`FieldValue`].
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::errors::FormError;

/// Current value of one field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value at all (null / undefined).
    #[default]
    Null,
    Text(String),
    Num(f64),
    Bool(bool),
    Multi(Vec<String>),
}

/// Shared `Null` used when a key is absent.
pub(crate) static NULL: FieldValue = FieldValue::Null;

impl FieldValue {
    /// Empty values fail a `required` check: null, `""` and `[]`.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Multi(items) => items.is_empty(),
            FieldValue::Num(_) | FieldValue::Bool(_) => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            FieldValue::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_multi(&self) -> Option<&[String]> {
        match self {
            FieldValue::Multi(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Text form of scalar values, used for option lookups and editor seeding.
    pub fn to_plain_string(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Num(n) => format_number(*n),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Multi(items) => items.join(","),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Null => JsonValue::Null,
            FieldValue::Text(s) => JsonValue::String(s.clone()),
            FieldValue::Num(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                JsonValue::from(*n as i64)
            }
            FieldValue::Num(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            FieldValue::Bool(b) => JsonValue::Bool(*b),
            FieldValue::Multi(items) => {
                JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect())
            }
        }
    }

    /// Convert a JSON value found under `key` of a record.
    pub fn from_json(key: &str, value: JsonValue) -> Result<Self, FormError> {
        match value {
            JsonValue::Null => Ok(FieldValue::Null),
            JsonValue::String(s) => Ok(FieldValue::Text(s)),
            JsonValue::Bool(b) => Ok(FieldValue::Bool(b)),
            JsonValue::Number(n) => n.as_f64().map(FieldValue::Num).ok_or_else(|| {
                FormError::UnsupportedValue {
                    key: key.to_string(),
                    reason: format!("number {n} is not representable"),
                }
            }),
            JsonValue::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    JsonValue::String(s) => Ok(s),
                    JsonValue::Number(n) => Ok(n.to_string()),
                    JsonValue::Bool(b) => Ok(b.to_string()),
                    other => Err(FormError::UnsupportedValue {
                        key: key.to_string(),
                        reason: format!("array item {other} is not a scalar"),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::Multi),
            JsonValue::Object(_) => Err(FormError::UnsupportedValue {
                key: key.to_string(),
                reason: "nested objects are not field values".into(),
            }),
        }
    }
}

/// Integral numbers print without a fractional part.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Num(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Num(n as f64)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::Multi(items)
    }
}

impl TryFrom<JsonValue> for FieldValue {
    type Error = FormError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        FieldValue::from_json("value", value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emptiness_follows_required_semantics() {
        assert!(FieldValue::Null.is_empty());
        assert!(FieldValue::from("").is_empty());
        assert!(FieldValue::Multi(vec![]).is_empty());
        assert!(!FieldValue::from(" ").is_empty());
        assert!(!FieldValue::Bool(false).is_empty());
        assert!(!FieldValue::Num(0.0).is_empty());
    }

    #[test]
    fn json_arrays_become_multi() {
        let v = FieldValue::from_json("days", json!(["mon", "wed", 3])).unwrap();
        assert_eq!(v, FieldValue::Multi(vec!["mon".into(), "wed".into(), "3".into()]));
    }

    #[test]
    fn json_objects_are_rejected() {
        let err = FieldValue::from_json("meta", json!({"a": 1})).unwrap_err();
        assert!(matches!(err, FormError::UnsupportedValue { key, .. } if key == "meta"));
    }

    #[test]
    fn serializes_untagged() {
        let out = serde_json::to_value(vec![
            FieldValue::Null,
            FieldValue::from("Ana"),
            FieldValue::Num(12.5),
            FieldValue::Bool(true),
        ])
        .unwrap();
        assert_eq!(out, json!([null, "Ana", 12.5, true]));
    }

    #[test]
    fn integral_numbers_print_plain() {
        assert_eq!(FieldValue::Num(45.0).to_plain_string(), "45");
        assert_eq!(FieldValue::Num(45.5).to_plain_string(), "45.5");
    }
}
