//! Value formatting for adapters and read-only views.
use crate::field::{FieldDescriptor, FieldKind};
use crate::value::{FieldValue, format_number};

const MASK: char = '•';

/// Human readable text for `value` as shown by `descriptor`.
pub fn format_value(descriptor: &FieldDescriptor, value: &FieldValue) -> String {
    match (&descriptor.kind, value) {
        (_, FieldValue::Null) => String::new(),
        (FieldKind::Password, v) => MASK.to_string().repeat(v.to_plain_string().chars().count()),
        (FieldKind::Switch | FieldKind::Checkbox, FieldValue::Bool(b)) => yes_no(*b).to_string(),
        (_, FieldValue::Multi(items)) => items
            .iter()
            .map(|item| label_or_raw(descriptor, item))
            .collect::<Vec<_>>()
            .join(", "),
        (FieldKind::Select | FieldKind::Radio, v) => label_or_raw(descriptor, &v.to_plain_string()),
        (_, FieldValue::Num(n)) => format_number(*n),
        (_, v) => v.to_plain_string(),
    }
}

pub fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}

fn label_or_raw(descriptor: &FieldDescriptor, raw: &str) -> String {
    descriptor
        .option_label(raw)
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string())
}
