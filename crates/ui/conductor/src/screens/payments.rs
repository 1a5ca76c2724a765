use std::collections::HashMap;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use form_engine::{
    Badge, BadgeMeta, FieldDescriptor, FieldKind, FieldOption, FormState, Tone,
};
use serde_json::Value as JsonValue;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

use super::enrollments::EnrollmentsScreen;
use super::{Column, Screen, ScreenKind, number, rules, text};
use crate::store::Directory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Refunded,
}

impl Badge for PaymentStatus {
    fn meta(&self) -> BadgeMeta {
        match self {
            PaymentStatus::Paid => BadgeMeta::new("Paid", Tone::Success, "check"),
            PaymentStatus::Pending => BadgeMeta::new("Pending", Tone::Warning, "clock"),
            PaymentStatus::Refunded => BadgeMeta::new("Refunded", Tone::Info, "undo"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Method {
    Cash,
    Card,
    Transfer,
}

impl Method {
    fn label(self) -> &'static str {
        match self {
            Method::Cash => "Cash",
            Method::Card => "Card",
            Method::Transfer => "Bank transfer",
        }
    }
}

pub struct PaymentsScreen;

const COLUMNS: &[Column] = &[
    Column::new("Enrollment", "enrollment", 28),
    Column::new("Amount", "amount", 9),
    Column::new("Method", "method", 14),
    Column::new("Paid on", "paidOn", 12),
];

impl PaymentsScreen {
    fn fields(values: &FormState, dir: &Directory, today: NaiveDate) -> Vec<FieldDescriptor> {
        let fees: HashMap<String, f64> = dir
            .enrollments
            .iter()
            .filter_map(|e| {
                let fee = number(e, "total").or_else(|| number(e, "price"))?;
                Some((text(e, "id").to_string(), fee))
            })
            .collect();
        // Unset means the default, cash.
        let cash = values
            .value("method")
            .as_text()
            .map_or(true, |m| m == Method::Cash.as_ref());

        let mut fields = vec![
            FieldDescriptor::new("enrollment", "Enrollment", FieldKind::Select)
                .required_with("Pick an enrollment")
                .options(rules::record_options(&dir.enrollments, |r| {
                    EnrollmentsScreen.label(r, dir)
                }))
                .derive(move |value, _, set| {
                    if let Some(fee) = value.as_text().and_then(|id| fees.get(id)) {
                        set.set("amount", *fee);
                    }
                }),
            FieldDescriptor::new("amount", "Amount", FieldKind::Number)
                .required()
                .range(Some(0.0), None)
                .live()
                .validate_value(rules::positive),
            FieldDescriptor::new("method", "Method", FieldKind::Radio)
                .options(Method::iter().map(|m| FieldOption::new(m.as_ref(), m.label())))
                .default_value(Method::Cash.as_ref()),
        ];
        if !cash {
            fields.push(
                FieldDescriptor::new("reference", "Reference", FieldKind::Text)
                    .required_with("Card and transfer payments need a reference")
                    .max_length(40)
                    .placeholder("TX-0000"),
            );
        }
        fields.push(
            FieldDescriptor::new("paidOn", "Paid on", FieldKind::Date)
                .required()
                .placeholder("YYYY-MM-DD")
                .validate_value(rules::date_not_after(today)),
        );
        fields.push(
            FieldDescriptor::new("status", "Status", FieldKind::Select)
                .options(PaymentStatus::iter().map(|s| FieldOption::new(s.as_ref(), s.label())))
                .default_value(PaymentStatus::Paid.as_ref()),
        );
        fields
    }
}

impl Screen for PaymentsScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Payments
    }

    fn noun(&self) -> &'static str {
        "payment"
    }

    fn descriptors(&self, values: &FormState, dir: &Directory) -> Vec<FieldDescriptor> {
        Self::fields(values, dir, Local::now().date_naive())
    }

    fn columns(&self) -> &'static [Column] {
        COLUMNS
    }

    fn label(&self, record: &JsonValue, dir: &Directory) -> String {
        let enrollment = dir
            .find(ScreenKind::Enrollments, text(record, "enrollment"))
            .map(|e| EnrollmentsScreen.label(e, dir))
            .unwrap_or_else(|| "?".into());
        format!("{enrollment} · {}", text(record, "paidOn"))
    }

    fn badge(&self, record: &JsonValue) -> Option<BadgeMeta> {
        PaymentStatus::from_str(text(record, "status"))
            .ok()
            .map(|s| s.meta())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::{open_form, sync_descriptors};
    use form_engine::{FieldValue, FormOptions};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dir() -> Directory {
        Directory {
            users: vec![json!({"id": "u-3", "name": "Ana", "role": "student"})],
            enrollments: vec![
                json!({"id": "e-1", "student": "u-3", "course": "cello", "price": 90, "total": 81}),
            ],
            ..Default::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
    }

    #[test]
    fn enrollment_fills_amount() {
        let dir = dir();
        let mut form = open_form(&PaymentsScreen, None, &dir, FormOptions::default()).unwrap();
        form.edit("enrollment", "e-1").unwrap();
        assert_eq!(form.value("amount"), &FieldValue::Num(81.0));
    }

    #[test]
    fn reference_only_for_non_cash() {
        let dir = dir();
        let mut form = open_form(&PaymentsScreen, None, &dir, FormOptions::default()).unwrap();
        assert_eq!(form.state().text("method"), "cash");
        assert!(form.descriptor("reference").is_none());

        form.edit("method", "card").unwrap();
        sync_descriptors(&mut form, &PaymentsScreen, &dir);
        assert!(form.descriptor("reference").is_some());
        assert_eq!(
            form.validate().get("reference"),
            Some("Card and transfer payments need a reference")
        );

        form.edit("reference", "TX-1").unwrap();
        form.edit("method", "cash").unwrap();
        sync_descriptors(&mut form, &PaymentsScreen, &dir);
        assert!(form.descriptor("reference").is_none());
        assert_eq!(form.state().text("reference"), "TX-1");
    }

    #[test]
    fn paid_on_cannot_be_in_the_future() {
        let values = FormState::default();
        let fields = PaymentsScreen::fields(&values, &Directory::default(), today());
        let paid_on = fields.iter().find(|f| f.id == "paidOn").unwrap();
        assert!(form_engine::validate_field(paid_on, &"2027-01-01".into(), &values).is_some());
        assert_eq!(
            form_engine::validate_field(paid_on, &"2026-09-30".into(), &values),
            None
        );
    }

    #[test]
    fn label_uses_enrollment() {
        let record = json!({"enrollment": "e-1", "paidOn": "2026-09-03"});
        assert_eq!(PaymentsScreen.label(&record, &dir()), "Ana · Cello · 2026-09-03");
    }
}
