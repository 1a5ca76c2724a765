//! Validation pipeline.
//!
//! Pure and synchronous: no I/O, no mutation. That is what lets the same functions run
//! per keystroke (fields opting into live validation) and atomically before submit.
//!
//! Check order for one field:
//! 1. required-ness (`null`, `""`, `[]` are empty)
//! 2. the cross-field rule (`validate`, sees the whole form state)
//! 3. the value-only rule (`validate_value`)
//!
//! First failure wins. The field kind never adds checks of its own.
use std::collections::HashMap;

use crate::field::FieldDescriptor;
use crate::state::FormState;
use crate::value::FieldValue;

/// Field id → error message. Only fields with an error have an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: HashMap<String, String>,
}

impl ValidationErrors {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.errors.get(id).map(|s| s.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.errors.contains_key(id)
    }

    /// Record (`Some`) or clear (`None`) the error of one field.
    pub fn set(&mut self, id: &str, error: Option<String>) {
        match error {
            Some(msg) => {
                self.errors.insert(id.to_string(), msg);
            }
            None => {
                self.errors.remove(id);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Ids with errors, sorted for stable output.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.errors.keys().map(|k| k.as_str()).collect();
        ids.sort_unstable();
        ids
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Validate one field against its descriptor. `None` means valid.
pub fn validate_field(
    descriptor: &FieldDescriptor,
    value: &FieldValue,
    state: &FormState,
) -> Option<String> {
    if descriptor.required && value.is_empty() {
        return Some(
            descriptor
                .required_message
                .clone()
                .unwrap_or_else(|| format!("{} is required", descriptor.label)),
        );
    }
    if let Some(rule) = &descriptor.validate {
        if let Some(msg) = rule(value, state) {
            return Some(msg);
        }
    }
    if let Some(rule) = &descriptor.validate_value {
        if let Some(msg) = rule(value) {
            return Some(msg);
        }
    }
    None
}

/// Validate every currently visible descriptor. Values in `state` that have no descriptor
/// in `descriptors` are out of scope.
pub fn validate_form(descriptors: &[FieldDescriptor], state: &FormState) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    for d in descriptors {
        errors.set(&d.id, validate_field(d, state.value(&d.id), state));
    }
    errors
}
