use std::str::FromStr;

use chrono::{Local, NaiveDate};
use form_engine::{
    Badge, BadgeMeta, FieldDescriptor, FieldKind, FieldOption, FieldValue, FormState, Tone,
};
use serde_json::Value as JsonValue;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

use super::{Column, Screen, ScreenKind, rules, text};
use crate::catalog;
use crate::store::Directory;

/// Age below which a student needs a guardian on file.
const ADULT_AGE: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn of(record: &JsonValue) -> Option<Role> {
        Role::from_str(text(record, "role")).ok()
    }

    fn from_value(value: &FieldValue) -> Option<Role> {
        value.as_text().and_then(|r| Role::from_str(r).ok())
    }
}

impl Badge for Role {
    fn meta(&self) -> BadgeMeta {
        match self {
            Role::Admin => BadgeMeta::new("Admin", Tone::Info, "shield"),
            Role::Teacher => BadgeMeta::new("Teacher", Tone::Success, "music"),
            Role::Student => BadgeMeta::new("Student", Tone::Neutral, "user"),
        }
    }
}

pub struct UsersScreen;

const COLUMNS: &[Column] = &[
    Column::new("Name", "name", 24),
    Column::new("E-mail", "email", 28),
    Column::new("Phone", "phone", 16),
    Column::new("Active", "active", 8),
];

impl UsersScreen {
    fn fields(values: &FormState, today: NaiveDate) -> Vec<FieldDescriptor> {
        let creating = !values.contains("id");
        let role = Role::from_value(values.value("role"));

        let mut fields = vec![
            FieldDescriptor::new("name", "Full name", FieldKind::Text)
                .required()
                .max_length(60)
                .placeholder("Ana Costa"),
            FieldDescriptor::new("email", "E-mail", FieldKind::Email)
                .required()
                .max_length(80)
                .live()
                .validate_value(rules::email),
            FieldDescriptor::new("phone", "Phone", FieldKind::Text).max_length(20),
            FieldDescriptor::new("role", "Role", FieldKind::Select)
                .required_with("Choose a role")
                .options(Role::iter().map(|r| FieldOption::new(r.as_ref(), r.label())))
                .derive(|value, state, set| {
                    // Instruments only make sense for teachers.
                    let teacher = Role::from_value(value) == Some(Role::Teacher);
                    if !teacher && !state.value("instruments").is_empty() {
                        set.set("instruments", Vec::<String>::new());
                    }
                }),
        ];

        match role {
            Some(Role::Teacher) => fields.push(
                FieldDescriptor::new("instruments", "Instruments", FieldKind::MultiSelect)
                    .required_with("Teachers need at least one instrument")
                    .options(catalog::instrument_options()),
            ),
            Some(Role::Student) => {
                fields.push(
                    FieldDescriptor::new("birthDate", "Birth date", FieldKind::Date)
                        .placeholder("YYYY-MM-DD")
                        .validate_value(rules::date_not_after(today)),
                );
                fields.push(
                    FieldDescriptor::new("guardian", "Guardian", FieldKind::Text)
                        .max_length(60)
                        .validate(move |value, state| {
                            let minor = rules::parse_date(state.value("birthDate"))
                                .and_then(|birth| today.years_since(birth))
                                .is_some_and(|age| age < ADULT_AGE);
                            (minor && value.is_empty())
                                .then(|| "Students under 18 need a guardian".to_string())
                        })
                        .dynamic_help(move |_, state| {
                            rules::parse_date(state.value("birthDate"))
                                .and_then(|birth| today.years_since(birth))
                                .map(|age| format!("Student is {age} years old"))
                        })
                        .help("Needed for students under 18"),
                );
            }
            Some(Role::Admin) | None => {}
        }

        fields.push(
            FieldDescriptor::new("active", "Active", FieldKind::Switch).default_value(true),
        );

        let mut password = FieldDescriptor::new("password", "Password", FieldKind::Password)
            .max_length(64)
            .validate_value(rules::min_chars(8))
            .derive(|value, state, set| {
                // The confirmation turns read-only once the password is emptied.
                if value.is_empty() && !state.value("confirmPassword").is_empty() {
                    set.set("confirmPassword", value.clone());
                }
            });
        if creating {
            password = password.required();
        } else {
            password = password.help("Leave empty to keep the current password");
        }
        fields.push(password);

        fields.push(
            FieldDescriptor::new("confirmPassword", "Confirm password", FieldKind::Password)
                .max_length(64)
                .live()
                .disabled_if(values.text("password").is_empty())
                .validate(|value, state| {
                    let password = state.value("password");
                    let both_empty = value.is_empty() && password.is_empty();
                    (!both_empty && value != password)
                        .then(|| "Passwords do not match".to_string())
                }),
        );
        fields
    }
}

impl Screen for UsersScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Users
    }

    fn noun(&self) -> &'static str {
        "user"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Teachers are assigned instruments, students a guardian when under 18.")
    }

    fn descriptors(&self, values: &FormState, _dir: &Directory) -> Vec<FieldDescriptor> {
        Self::fields(values, Local::now().date_naive())
    }

    fn columns(&self) -> &'static [Column] {
        COLUMNS
    }

    fn label(&self, record: &JsonValue, _dir: &Directory) -> String {
        text(record, "name").to_string()
    }

    fn badge(&self, record: &JsonValue) -> Option<BadgeMeta> {
        Role::of(record).map(|r| r.meta())
    }

    /// Passwords never reach the record store.
    fn to_record(&self, values: &FormState) -> JsonValue {
        let mut record = values.to_json();
        if let Some(map) = record.as_object_mut() {
            map.remove("password");
            map.remove("confirmPassword");
        }
        record
    }
}
