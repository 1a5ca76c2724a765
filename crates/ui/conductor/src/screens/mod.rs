//! Host screens.
//!
//! Every screen is a stateless description of one record collection: which fields its form
//! shows (rebuilt from the current values on every render so conditional fields come and
//! go), which columns its list shows, and how a record is labelled. The form engine never
//! sees anything screen specific beyond the descriptors.
use clap::ValueEnum;
use form_engine::{
    BadgeMeta, FieldDescriptor, Form, FormError, FormOptions, FormSchema, FormState,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use strum::{Display, EnumIter, EnumString};

use crate::store::Directory;

pub mod enrollments;
pub mod payments;
pub mod rules;
pub mod sessions;
pub mod users;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ScreenKind {
    #[default]
    Users,
    Enrollments,
    Payments,
    Sessions,
}

impl ScreenKind {
    pub fn screen(self) -> &'static dyn Screen {
        match self {
            ScreenKind::Users => &users::UsersScreen,
            ScreenKind::Enrollments => &enrollments::EnrollmentsScreen,
            ScreenKind::Payments => &payments::PaymentsScreen,
            ScreenKind::Sessions => &sessions::SessionsScreen,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ScreenKind::Users => "Users",
            ScreenKind::Enrollments => "Enrollments",
            ScreenKind::Payments => "Payments",
            ScreenKind::Sessions => "Class sessions",
        }
    }

    /// Prefix of generated record ids (`u-1`, `e-4`, ...).
    pub fn id_prefix(self) -> &'static str {
        match self {
            ScreenKind::Users => "u",
            ScreenKind::Enrollments => "e",
            ScreenKind::Payments => "p",
            ScreenKind::Sessions => "s",
        }
    }

    /// Field that must be unique across the collection (case-insensitive).
    pub fn unique_field(self) -> Option<&'static str> {
        match self {
            ScreenKind::Users => Some("email"),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            ScreenKind::Users => ScreenKind::Enrollments,
            ScreenKind::Enrollments => ScreenKind::Payments,
            ScreenKind::Payments => ScreenKind::Sessions,
            ScreenKind::Sessions => ScreenKind::Users,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ScreenKind::Users => ScreenKind::Sessions,
            ScreenKind::Enrollments => ScreenKind::Users,
            ScreenKind::Payments => ScreenKind::Enrollments,
            ScreenKind::Sessions => ScreenKind::Payments,
        }
    }
}

/// One list column: header and the record field it shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub header: &'static str,
    pub field: &'static str,
    pub width: u16,
}

impl Column {
    pub const fn new(header: &'static str, field: &'static str, width: u16) -> Self {
        Self {
            header,
            field,
            width,
        }
    }
}

pub trait Screen: Send + Sync {
    fn kind(&self) -> ScreenKind;

    /// Singular record noun used in titles ("user", "payment").
    fn noun(&self) -> &'static str;

    /// Descriptors visible for the given values.
    fn descriptors(&self, values: &FormState, dir: &Directory) -> Vec<FieldDescriptor>;

    fn columns(&self) -> &'static [Column];

    /// Short human label of a record, used in option lists and titles.
    fn label(&self, record: &JsonValue, dir: &Directory) -> String;

    fn badge(&self, _record: &JsonValue) -> Option<BadgeMeta> {
        None
    }

    fn description(&self) -> Option<&'static str> {
        None
    }

    /// Record handed to the store; defaults to all form values.
    fn to_record(&self, values: &FormState) -> JsonValue {
        values.to_json()
    }

    fn schema(&self, values: &FormState, dir: &Directory) -> FormSchema {
        let title = if values.contains("id") {
            format!("Edit {}", self.noun())
        } else {
            format!("New {}", self.noun())
        };
        let schema = FormSchema::new(title, self.descriptors(values, dir));
        match self.description() {
            Some(desc) => schema.description(desc),
            None => schema,
        }
    }
}

/// Open a form for `record` (`None` for a new one).
pub fn open_form(
    screen: &dyn Screen,
    record: Option<&JsonValue>,
    dir: &Directory,
    options: FormOptions,
) -> Result<Form, FormError> {
    let initial = record.map(FormState::from_json).transpose()?;
    let seed = initial.clone().unwrap_or_default();
    let mut form = Form::open(screen.descriptors(&seed, dir), initial, options);
    sync_descriptors(&mut form, screen, dir);
    Ok(form)
}

/// Hand the form the descriptors matching its current values. Seeding a field that just
/// appeared can reveal further conditional fields, so this repeats until the visible set
/// is stable.
pub fn sync_descriptors(form: &mut Form, screen: &dyn Screen, dir: &Directory) {
    for _ in 0..4 {
        let before: Vec<String> = form.descriptors().iter().map(|d| d.id.clone()).collect();
        form.set_descriptors(screen.descriptors(form.state(), dir));
        if form.descriptors().iter().map(|d| &d.id).eq(before.iter()) {
            return;
        }
    }
}

/// Text of `key` in a JSON record, `""` when absent or not a string.
pub fn text<'a>(record: &'a JsonValue, key: &str) -> &'a str {
    record.get(key).and_then(JsonValue::as_str).unwrap_or("")
}

pub fn number(record: &JsonValue, key: &str) -> Option<f64> {
    record.get(key).and_then(JsonValue::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn kinds_parse_from_kebab_case() {
        assert_eq!(<ScreenKind as FromStr>::from_str("sessions").ok(), Some(ScreenKind::Sessions));
        assert_eq!(ScreenKind::Enrollments.to_string(), "enrollments");
    }

    #[test]
    fn next_and_prev_visit_every_screen() {
        let mut kind = ScreenKind::Users;
        for _ in ScreenKind::iter() {
            assert_eq!(kind.next().prev(), kind);
            kind = kind.next();
        }
        assert_eq!(kind, ScreenKind::Users);
    }

    #[test]
    fn screens_report_their_own_kind() {
        for kind in ScreenKind::iter() {
            assert_eq!(kind.screen().kind(), kind);
        }
    }

    #[test]
    fn schema_title_depends_on_record_id() {
        let dir = Directory::default();
        let new = ScreenKind::Users.screen().schema(&FormState::default(), &dir);
        assert_eq!(new.title, "New user");
        let existing: FormState = [("id", "u-1")].into_iter().collect();
        let edit = ScreenKind::Users.screen().schema(&existing, &dir);
        assert_eq!(edit.title, "Edit user");
    }
}
