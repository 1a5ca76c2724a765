//! Field descriptor model.
//!
//! A [`FieldDescriptor`] is the metadata for one editable value: label, kind, constraints,
//! option list and the optional behaviour hooks (validation rules, derivation hook,
//! dynamic help). Descriptors are immutable while a form is open; the *set* of descriptors
//! may change between renders when the host includes or excludes conditional fields.
//!
//! Usage:
//! ```ignore
//! use form_engine::{FieldDescriptor, FieldKind};
//!
//! let role = FieldDescriptor::new("role", "Role", FieldKind::Select)
//!     .required()
//!     .option("teacher", "Teacher")
//!     .option("student", "Student");
//! ```
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::propagation::FieldSetter;
use crate::state::FormState;
use crate::value::FieldValue;

/// Cross-field validation rule: receives the value and the whole form state.
pub type FormRule = Arc<dyn Fn(&FieldValue, &FormState) -> Option<String> + Send + Sync>;
/// Value-only validation rule (older style, same contract minus the form state).
pub type ValueRule = Arc<dyn Fn(&FieldValue) -> Option<String> + Send + Sync>;
/// Derivation hook: may write other fields through the setter.
pub type DeriveHook = Arc<dyn Fn(&FieldValue, &FormState, &mut FieldSetter) + Send + Sync>;
/// Help text computed from the current value / state.
pub type HelpHook = Arc<dyn Fn(&FieldValue, &FormState) -> Option<String> + Send + Sync>;

/// Input kind of a field. The kind picks the control and the value shape; apart from
/// required-ness it never implies validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Number,
    Email,
    Password,
    Date,
    Time,
    Select,
    MultiSelect,
    Switch,
    Checkbox,
    Radio,
    /// Host specific control identified by name.
    Custom(String),
}

impl FieldKind {
    /// Value a field of this kind holds when neither initial data nor a default exists.
    pub fn empty_value(&self) -> FieldValue {
        match self {
            FieldKind::Text
            | FieldKind::Email
            | FieldKind::Password
            | FieldKind::Date
            | FieldKind::Time => FieldValue::Text(String::new()),
            FieldKind::Switch | FieldKind::Checkbox => FieldValue::Bool(false),
            FieldKind::MultiSelect => FieldValue::Multi(Vec::new()),
            FieldKind::Number | FieldKind::Select | FieldKind::Radio | FieldKind::Custom(_) => {
                FieldValue::Null
            }
        }
    }

    /// Kinds edited through a single-line text editor.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldKind::Text
                | FieldKind::Number
                | FieldKind::Email
                | FieldKind::Password
                | FieldKind::Date
                | FieldKind::Time
                | FieldKind::Custom(_)
        )
    }

    /// Kinds rendered from the descriptor's option list.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            FieldKind::Select | FieldKind::MultiSelect | FieldKind::Radio
        )
    }

    pub fn is_toggle(&self) -> bool {
        matches!(self, FieldKind::Switch | FieldKind::Checkbox)
    }
}

/// One entry of a select / multiSelect / radio option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Optional input bounds, enforced by the control (not by validation).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.max_length.is_none() && self.min.is_none() && self.max.is_none()
    }

    /// Bring a widget value inside the bounds: text is truncated to `max_length`
    /// characters, numbers are clamped into `[min, max]`.
    pub fn clamp(&self, value: FieldValue) -> FieldValue {
        match value {
            FieldValue::Text(s) => match self.max_length {
                Some(max) if s.chars().count() > max => {
                    FieldValue::Text(s.chars().take(max).collect())
                }
                _ => FieldValue::Text(s),
            },
            FieldValue::Num(mut n) => {
                if let Some(min) = self.min {
                    n = n.max(min);
                }
                if let Some(max) = self.max {
                    n = n.min(max);
                }
                FieldValue::Num(n)
            }
            other => other,
        }
    }
}

/// Declarative description of a form field.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub id: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_message: Option<String>,
    /// Re-validate this field on every edit instead of waiting for submit.
    pub live_validation: bool,
    #[serde(skip)]
    pub validate: Option<FormRule>,
    #[serde(skip)]
    pub validate_value: Option<ValueRule>,
    #[serde(skip)]
    pub derive: Option<DeriveHook>,
    #[serde(skip)]
    pub dynamic_help: Option<HelpHook>,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            required: false,
            disabled: false,
            options: Vec::new(),
            constraints: Constraints::default(),
            default_value: None,
            help: None,
            placeholder: None,
            required_message: None,
            live_validation: false,
            validate: None,
            validate_value: None,
            derive: None,
            dynamic_help: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Required with a custom message instead of "`<label>` is required".
    pub fn required_with(mut self, message: impl Into<String>) -> Self {
        self.required = true;
        self.required_message = Some(message.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn disabled_if(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(FieldOption::new(value, label));
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = FieldOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.constraints.max_length = Some(max);
        self
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.constraints.min = min;
        self.constraints.max = max;
        self
    }

    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn live(mut self) -> Self {
        self.live_validation = true;
        self
    }

    /// Attach a cross-field rule (`None` = valid).
    pub fn validate(
        mut self,
        rule: impl Fn(&FieldValue, &FormState) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Arc::new(rule));
        self
    }

    /// Attach a value-only rule (`None` = valid).
    pub fn validate_value(
        mut self,
        rule: impl Fn(&FieldValue) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.validate_value = Some(Arc::new(rule));
        self
    }

    /// Attach a derivation hook, the only sanctioned way to change other fields.
    pub fn derive(
        mut self,
        hook: impl Fn(&FieldValue, &FormState, &mut FieldSetter) + Send + Sync + 'static,
    ) -> Self {
        self.derive = Some(Arc::new(hook));
        self
    }

    pub fn dynamic_help(
        mut self,
        hook: impl Fn(&FieldValue, &FormState) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.dynamic_help = Some(Arc::new(hook));
        self
    }

    /// Value used when the form opens without initial data for this field.
    pub fn seed_value(&self) -> FieldValue {
        self.default_value
            .clone()
            .unwrap_or_else(|| self.kind.empty_value())
    }

    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }

    /// Help line for the current value: dynamic help wins over static help.
    pub fn help_for(&self, value: &FieldValue, state: &FormState) -> Option<String> {
        self.dynamic_help
            .as_ref()
            .and_then(|hook| hook(value, state))
            .or_else(|| self.help.clone())
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("disabled", &self.disabled)
            .field("options", &self.options.len())
            .field("validate", &self.validate.is_some())
            .field("validate_value", &self.validate_value.is_some())
            .field("derive", &self.derive.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_value_per_kind() {
        assert_eq!(FieldKind::Email.empty_value(), FieldValue::Text(String::new()));
        assert_eq!(FieldKind::Checkbox.empty_value(), FieldValue::Bool(false));
        assert_eq!(FieldKind::MultiSelect.empty_value(), FieldValue::Multi(vec![]));
        assert_eq!(FieldKind::Select.empty_value(), FieldValue::Null);
    }

    #[test]
    fn clamp_truncates_text_by_chars() {
        let c = Constraints {
            max_length: Some(3),
            ..Default::default()
        };
        assert_eq!(c.clamp("ñandú".into()), FieldValue::from("ñan"));
        assert_eq!(c.clamp("ab".into()), FieldValue::from("ab"));
    }

    #[test]
    fn clamp_bounds_numbers() {
        let c = Constraints {
            min: Some(0.0),
            max: Some(100.0),
            ..Default::default()
        };
        assert_eq!(c.clamp(FieldValue::Num(-5.0)), FieldValue::Num(0.0));
        assert_eq!(c.clamp(FieldValue::Num(250.0)), FieldValue::Num(100.0));
        assert_eq!(c.clamp(FieldValue::Num(42.0)), FieldValue::Num(42.0));
    }

    #[test]
    fn default_value_wins_over_kind_default() {
        let d = FieldDescriptor::new("active", "Active", FieldKind::Switch).default_value(true);
        assert_eq!(d.seed_value(), FieldValue::Bool(true));
    }

    #[test]
    fn serialization_skips_hooks() {
        let d = FieldDescriptor::new("email", "E-mail", FieldKind::Email)
            .required()
            .validate_value(|_| None);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["id"], "email");
        assert_eq!(json["kind"], "email");
        assert!(json.get("validateValue").is_none());
    }
}
