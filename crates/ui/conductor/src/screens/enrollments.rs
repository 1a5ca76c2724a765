use std::str::FromStr;

use form_engine::{
    Badge, BadgeMeta, FieldDescriptor, FieldKind, FieldOption, FieldValue, FormState, Tone,
};
use serde_json::Value as JsonValue;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

use super::users::Role;
use super::{Column, Screen, ScreenKind, rules, text};
use crate::catalog;
use crate::store::Directory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Active,
    Suspended,
    Cancelled,
}

impl Badge for EnrollmentStatus {
    fn meta(&self) -> BadgeMeta {
        match self {
            EnrollmentStatus::Pending => BadgeMeta::new("Pending", Tone::Warning, "clock"),
            EnrollmentStatus::Active => BadgeMeta::new("Active", Tone::Success, "check"),
            EnrollmentStatus::Suspended => BadgeMeta::new("Suspended", Tone::Warning, "pause"),
            EnrollmentStatus::Cancelled => BadgeMeta::new("Cancelled", Tone::Danger, "cross"),
        }
    }
}

pub struct EnrollmentsScreen;

const COLUMNS: &[Column] = &[
    Column::new("Student", "student", 20),
    Column::new("Course", "course", 18),
    Column::new("Start", "startDate", 12),
    Column::new("Monthly", "total", 9),
];

/// Monthly fee after the percentage discount, rounded to cents.
fn total(price: Option<f64>, discount: Option<f64>) -> FieldValue {
    match price {
        Some(p) => {
            let d = discount.unwrap_or(0.0).clamp(0.0, 100.0);
            FieldValue::Num((p * (100.0 - d)).round() / 100.0)
        }
        None => FieldValue::Null,
    }
}

pub fn student_options(dir: &Directory) -> Vec<FieldOption> {
    rules::record_options(
        dir.users
            .iter()
            .filter(|u| Role::of(u) == Some(Role::Student)),
        |r| text(r, "name").to_string(),
    )
}

impl Screen for EnrollmentsScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Enrollments
    }

    fn noun(&self) -> &'static str {
        "enrollment"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Price follows the course; the discount is a percentage of it.")
    }

    fn descriptors(&self, values: &FormState, dir: &Directory) -> Vec<FieldDescriptor> {
        let category = values.value("category").as_text().filter(|c| !c.is_empty());
        vec![
            FieldDescriptor::new("student", "Student", FieldKind::Select)
                .required_with("Pick a student")
                .options(student_options(dir)),
            FieldDescriptor::new("category", "Category", FieldKind::Select)
                .required()
                .options(catalog::category_options())
                .derive(|value, state, set| {
                    let course = state.value("course").as_text().and_then(catalog::course);
                    if course.is_some_and(|c| Some(c.category) != value.as_text()) {
                        set.clear("course");
                    }
                }),
            FieldDescriptor::new("course", "Course", FieldKind::Select)
                .required_with("Pick a course")
                .options(catalog::course_options(category))
                .derive(|value, _, set| {
                    let fee = value.as_text().and_then(catalog::course).map(|c| c.monthly_fee);
                    set.set("price", fee);
                }),
            FieldDescriptor::new("price", "Price", FieldKind::Number)
                .disabled()
                .help("Set from the course")
                .derive(|value, state, set| {
                    set.set("total", total(value.as_num(), state.value("discount").as_num()));
                }),
            FieldDescriptor::new("discount", "Discount %", FieldKind::Number)
                .range(Some(0.0), Some(100.0))
                .derive(|value, state, set| {
                    set.set("total", total(state.value("price").as_num(), value.as_num()));
                }),
            FieldDescriptor::new("total", "Monthly fee", FieldKind::Number).disabled(),
            FieldDescriptor::new("startDate", "Start date", FieldKind::Date)
                .required()
                .placeholder("YYYY-MM-DD")
                .validate_value(rules::date),
            FieldDescriptor::new("status", "Status", FieldKind::Select)
                .options(
                    EnrollmentStatus::iter()
                        .map(|s| FieldOption::new(s.as_ref(), s.label())),
                )
                .default_value(EnrollmentStatus::Pending.as_ref()),
            FieldDescriptor::new("notes", "Notes", FieldKind::Text).max_length(200),
        ]
    }

    fn columns(&self) -> &'static [Column] {
        COLUMNS
    }

    fn label(&self, record: &JsonValue, dir: &Directory) -> String {
        let student = dir
            .find(ScreenKind::Users, text(record, "student"))
            .map(|u| text(u, "name"))
            .unwrap_or("?");
        let course = catalog::course(text(record, "course"))
            .map(|c| c.name)
            .unwrap_or("?");
        format!("{student} · {course}")
    }

    fn badge(&self, record: &JsonValue) -> Option<BadgeMeta> {
        EnrollmentStatus::from_str(text(record, "status"))
            .ok()
            .map(|s| s.meta())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::{open_form, sync_descriptors};
    use form_engine::FormOptions;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn open() -> (form_engine::Form, Directory) {
        let dir = Directory::default();
        let form = open_form(&EnrollmentsScreen, None, &dir, FormOptions::default()).unwrap();
        (form, dir)
    }

    #[test]
    fn course_fills_price_and_total() {
        let (mut form, _) = open();
        form.edit("category", "keys").unwrap();
        form.edit("course", "piano-advanced").unwrap();
        assert_eq!(form.value("price"), &FieldValue::Num(95.0));
        assert_eq!(form.value("total"), &FieldValue::Num(95.0));

        form.edit("discount", 10.0).unwrap();
        assert_eq!(form.value("total"), &FieldValue::Num(85.5));
    }

    #[test]
    fn changing_category_clears_a_foreign_course() {
        let (mut form, dir) = open();
        form.edit("category", "keys").unwrap();
        form.edit("course", "organ").unwrap();
        form.edit("category", "voice").unwrap();
        assert_eq!(form.value("course"), &FieldValue::Null);
        assert_eq!(form.value("price"), &FieldValue::Null);
        assert_eq!(form.value("total"), &FieldValue::Null);

        sync_descriptors(&mut form, &EnrollmentsScreen, &dir);
        let course = form.descriptor("course").unwrap();
        let offered: Vec<&str> = course.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(offered, vec!["choir", "singing"]);
    }

    #[test]
    fn status_defaults_to_pending() {
        let (form, _) = open();
        assert_eq!(form.state().text("status"), "pending");
    }

    #[test]
    fn only_students_are_offered() {
        let dir = Directory {
            users: vec![
                json!({"id": "u-1", "name": "Marta", "role": "teacher"}),
                json!({"id": "u-2", "name": "Ana", "role": "student"}),
            ],
            ..Default::default()
        };
        assert_eq!(student_options(&dir), vec![FieldOption::new("u-2", "Ana")]);
    }

    #[test]
    fn label_and_badge() {
        let dir = Directory {
            users: vec![json!({"id": "u-2", "name": "Ana", "role": "student"})],
            ..Default::default()
        };
        let record = json!({"student": "u-2", "course": "cello", "status": "active"});
        assert_eq!(EnrollmentsScreen.label(&record, &dir), "Ana · Cello");
        assert_eq!(EnrollmentsScreen.badge(&record).map(|b| b.tone), Some(Tone::Success));
    }
}
