//! Form schema: title, description and the ordered descriptor list of one form.
//!
//! Kept free of runtime state; a host builds a schema per render (conditional fields are
//! simply left out of `fields`) and hands `fields` to the open [`crate::Form`].
//!
//! ```ignore
//! use form_engine::{FieldDescriptor, FieldKind, FormSchema};
//!
//! let schema = FormSchema::new("New course", vec![
//!     FieldDescriptor::new("name", "Name", FieldKind::Text).required(),
//!     FieldDescriptor::new("price", "Monthly fee", FieldKind::Number)
//!         .range(Some(0.0), None),
//! ]).description("Courses appear in the enrollment form once saved");
//! ```
use serde::Serialize;

use crate::field::FieldDescriptor;

/// Declarative schema for a multi-field form.
#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl FormSchema {
    pub fn new(title: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            title: title.into(),
            description: None,
            fields,
        }
    }

    /// Attach an optional description (multi-line friendly).
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Find a field by its id.
    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.id.as_str())
    }
}
