//! Form runtime values.
//!
//! A [`FormState`] maps field ids to [`FieldValue`]s. It is never mutated in place: every
//! write returns a new state (`with_value`), so a host can tell "something changed" by
//! identity (`same_as`) or by `revision`. Cloning is cheap (shared map).
//!
//! ```ignore
//! let state = FormState::default().with_value("name", "Ana");
//! assert_eq!(state.text("name"), "Ana");
//! ```
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::errors::FormError;
use crate::field::FieldDescriptor;
use crate::value::{FieldValue, NULL};

#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: Arc<HashMap<String, FieldValue>>,
    revision: u64,
}

impl FormState {
    /// Seed a state for a freshly opened form.
    ///
    /// Per descriptor: initial data wins, then the descriptor default, then the kind's
    /// empty value. Initial keys without a descriptor (e.g. a record id) are kept.
    pub fn seed(descriptors: &[FieldDescriptor], initial: Option<&FormState>) -> Self {
        let mut values: HashMap<String, FieldValue> = initial
            .map(|s| s.values.as_ref().clone())
            .unwrap_or_default();
        for d in descriptors {
            values
                .entry(d.id.clone())
                .or_insert_with(|| d.seed_value());
        }
        Self {
            values: Arc::new(values),
            revision: 0,
        }
    }

    /// Value of `id`, or `Null` when the key is absent.
    pub fn value(&self, id: &str) -> &FieldValue {
        self.values.get(id).unwrap_or(&NULL)
    }

    pub fn get(&self, id: &str) -> Option<&FieldValue> {
        self.values.get(id)
    }

    /// Text of `id`, or `""` for absent / non-text values.
    pub fn text(&self, id: &str) -> &str {
        self.value(id).as_text().unwrap_or("")
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    /// New state with `id` set to `value`; `self` is left untouched.
    pub fn with_value(&self, id: &str, value: FieldValue) -> Self {
        let mut values = self.values.as_ref().clone();
        values.insert(id.to_string(), value);
        Self {
            values: Arc::new(values),
            revision: self.revision + 1,
        }
    }

    /// Identity check: true when both handles share the very same values.
    pub fn same_as(&self, other: &FormState) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a state from a JSON record (must be an object).
    pub fn from_json(record: &JsonValue) -> Result<Self, FormError> {
        let JsonValue::Object(map) = record else {
            return Err(FormError::NotAnObject(json_type(record).to_string()));
        };
        let mut values = HashMap::with_capacity(map.len());
        for (key, value) in map {
            values.insert(key.clone(), FieldValue::from_json(key, value.clone())?);
        }
        Ok(Self {
            values: Arc::new(values),
            revision: 0,
        })
    }

    /// Record payload handed to the host (keys sorted).
    pub fn to_json(&self) -> JsonValue {
        let map: JsonMap<String, JsonValue> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        JsonValue::Object(map)
    }
}

/// Equality compares values only, not identity or revision.
impl PartialEq for FormState {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other) || self.values == other.values
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FormState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: Arc::new(values),
            revision: 0,
        }
    }
}

fn json_type(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn with_value_replaces_identity() {
        let a = FormState::default();
        let b = a.with_value("name", "Ana".into());
        assert!(!a.same_as(&b));
        assert!(a.get("name").is_none());
        assert_eq!(b.text("name"), "Ana");
        assert_eq!(b.revision(), a.revision() + 1);
    }

    #[test]
    fn clones_share_identity() {
        let a = FormState::default().with_value("x", true.into());
        let b = a.clone();
        assert!(a.same_as(&b));
    }

    #[test]
    fn seed_prefers_initial_then_default_then_kind() {
        let fields = vec![
            FieldDescriptor::new("name", "Name", FieldKind::Text),
            FieldDescriptor::new("active", "Active", FieldKind::Switch).default_value(true),
            FieldDescriptor::new("days", "Days", FieldKind::MultiSelect),
        ];
        let initial: FormState = [("name", "Ana"), ("id", "u-7")].into_iter().collect();
        let state = FormState::seed(&fields, Some(&initial));
        assert_eq!(state.text("name"), "Ana");
        assert_eq!(state.value("active"), &FieldValue::Bool(true));
        assert_eq!(state.value("days"), &FieldValue::Multi(vec![]));
        assert_eq!(state.text("id"), "u-7");
    }

    #[test]
    fn json_round_trip_of_record() {
        let record = json!({"id": "e-1", "fee": 45, "days": ["mon"], "paid": false});
        let state = FormState::from_json(&record).unwrap();
        assert_eq!(state.to_json(), record);
    }

    #[test]
    fn non_object_records_are_rejected() {
        let err = FormState::from_json(&json!([1, 2])).unwrap_err();
        assert_eq!(err, FormError::NotAnObject("array".into()));
    }
}
