//! Validation rules and option builders shared by the screens.
//!
//! Rules follow the engine contract: `None` means valid. They run on empty optional values
//! as well, so each one lets an empty value pass and leaves required-ness to the descriptor.
use chrono::{NaiveDate, NaiveTime};
use form_engine::{FieldOption, FieldValue};
use serde_json::Value as JsonValue;

use super::text;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

pub fn parse_date(value: &FieldValue) -> Option<NaiveDate> {
    value
        .as_text()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
}

/// `YYYY-MM-DD`.
pub fn date(value: &FieldValue) -> Option<String> {
    if value.is_empty() || parse_date(value).is_some() {
        None
    } else {
        Some("Use the format YYYY-MM-DD".into())
    }
}

/// A valid date that is not after `today`.
pub fn date_not_after(today: NaiveDate) -> impl Fn(&FieldValue) -> Option<String> {
    move |value| {
        date(value).or_else(|| match parse_date(value) {
            Some(d) if d > today => Some("Date lies in the future".into()),
            _ => None,
        })
    }
}

/// `HH:MM`, 24h.
pub fn time(value: &FieldValue) -> Option<String> {
    let valid = value
        .as_text()
        .map(|s| NaiveTime::parse_from_str(s.trim(), TIME_FORMAT).is_ok())
        .unwrap_or(false);
    if value.is_empty() || valid {
        None
    } else {
        Some("Use the format HH:MM".into())
    }
}

pub fn email(value: &FieldValue) -> Option<String> {
    let s = value.as_text().unwrap_or("").trim();
    if s.is_empty() {
        return None;
    }
    let valid = match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    (!valid).then(|| "Not a valid e-mail address".to_string())
}

pub fn min_chars(min: usize) -> impl Fn(&FieldValue) -> Option<String> {
    move |value| {
        let len = value.as_text().map(|s| s.chars().count()).unwrap_or(0);
        (len > 0 && len < min).then(|| format!("At least {min} characters"))
    }
}

pub fn positive(value: &FieldValue) -> Option<String> {
    match value.as_num() {
        Some(n) if n <= 0.0 => Some("Must be greater than zero".into()),
        _ => None,
    }
}

/// Options built from store records, keyed by record id.
pub fn record_options<'a>(
    records: impl IntoIterator<Item = &'a JsonValue>,
    label: impl Fn(&JsonValue) -> String,
) -> Vec<FieldOption> {
    records
        .into_iter()
        .map(|r| FieldOption::new(text(r, "id"), label(r)))
        .collect()
}
