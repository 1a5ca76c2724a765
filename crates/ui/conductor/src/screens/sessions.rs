use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use form_engine::{Badge, BadgeMeta, FieldDescriptor, FieldKind, FieldValue, FormState, Tone};
use serde_json::Value as JsonValue;

use super::enrollments::EnrollmentStatus;
use super::users::Role;
use super::{Column, Screen, ScreenKind, rules, text};
use crate::catalog;
use crate::store::Directory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Scheduled,
    Held,
}

impl SessionState {
    pub fn on(date: NaiveDate, today: NaiveDate) -> Self {
        if date >= today {
            SessionState::Scheduled
        } else {
            SessionState::Held
        }
    }
}

impl Badge for SessionState {
    fn meta(&self) -> BadgeMeta {
        match self {
            SessionState::Scheduled => BadgeMeta::new("Scheduled", Tone::Info, "calendar"),
            SessionState::Held => BadgeMeta::new("Held", Tone::Neutral, "archive"),
        }
    }
}

pub struct SessionsScreen;

const COLUMNS: &[Column] = &[
    Column::new("Course", "course", 18),
    Column::new("Teacher", "teacher", 18),
    Column::new("Date", "date", 12),
    Column::new("Time", "time", 7),
    Column::new("Present", "attendance", 28),
];

/// Student ids per course, from enrollments that are not cancelled.
fn enrolled_by_course(dir: &Directory) -> HashMap<String, Vec<String>> {
    let mut by_course: HashMap<String, Vec<String>> = HashMap::new();
    for e in &dir.enrollments {
        if text(e, "status") == EnrollmentStatus::Cancelled.as_ref() {
            continue;
        }
        by_course
            .entry(text(e, "course").to_string())
            .or_default()
            .push(text(e, "student").to_string());
    }
    by_course
}

impl Screen for SessionsScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Sessions
    }

    fn noun(&self) -> &'static str {
        "class session"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Attendance lists the students enrolled in the course.")
    }

    fn descriptors(&self, values: &FormState, dir: &Directory) -> Vec<FieldDescriptor> {
        let by_course = enrolled_by_course(dir);
        let course = values.text("course").to_string();
        let enrolled = by_course.get(&course).cloned().unwrap_or_default();

        let instruments: HashMap<String, String> = dir
            .users
            .iter()
            .filter(|u| Role::of(u) == Some(Role::Teacher))
            .map(|u| {
                let list = u
                    .get("instruments")
                    .and_then(JsonValue::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(JsonValue::as_str)
                            .map(|i| {
                                catalog::INSTRUMENTS
                                    .iter()
                                    .find(|(id, _)| *id == i)
                                    .map(|(_, label)| *label)
                                    .unwrap_or(i)
                            })
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                (text(u, "id").to_string(), list)
            })
            .collect();

        let attendance = FieldDescriptor::new("attendance", "Attendance", FieldKind::MultiSelect)
            .options(rules::record_options(
                dir.users
                    .iter()
                    .filter(|u| enrolled.iter().any(|id| id == text(u, "id"))),
                |r| text(r, "name").to_string(),
            ))
            .help(if course.is_empty() {
                "Pick a course first"
            } else {
                "Students enrolled in the course"
            });

        vec![
            FieldDescriptor::new("course", "Course", FieldKind::Select)
                .required()
                .options(catalog::course_options(None))
                .derive(move |value, state, set| {
                    // Drop attendees that are not enrolled in the new course.
                    let allowed = value.as_text().and_then(|c| by_course.get(c));
                    let present = state.value("attendance").as_multi().unwrap_or(&[]);
                    let kept: Vec<String> = present
                        .iter()
                        .filter(|id| allowed.is_some_and(|a| a.contains(*id)))
                        .cloned()
                        .collect();
                    if kept.len() != present.len() {
                        set.set("attendance", kept);
                    }
                }),
            FieldDescriptor::new("teacher", "Teacher", FieldKind::Select)
                .required()
                .options(rules::record_options(
                    dir.users
                        .iter()
                        .filter(|u| Role::of(u) == Some(Role::Teacher)),
                    |r| text(r, "name").to_string(),
                ))
                .dynamic_help(move |value, _| {
                    value
                        .as_text()
                        .and_then(|id| instruments.get(id))
                        .filter(|list| !list.is_empty())
                        .map(|list| format!("Teaches {list}"))
                }),
            FieldDescriptor::new("date", "Date", FieldKind::Date)
                .required()
                .placeholder("YYYY-MM-DD")
                .validate_value(rules::date),
            FieldDescriptor::new("time", "Time", FieldKind::Time)
                .required()
                .placeholder("HH:MM")
                .validate_value(rules::time),
            FieldDescriptor::new("duration", "Minutes", FieldKind::Number)
                .range(Some(15.0), Some(180.0))
                .default_value(45.0),
            FieldDescriptor::new("room", "Room", FieldKind::Text).max_length(20),
            attendance,
            FieldDescriptor::new("notes", "Notes", FieldKind::Text).max_length(200),
        ]
    }

    fn columns(&self) -> &'static [Column] {
        COLUMNS
    }

    fn label(&self, record: &JsonValue, _dir: &Directory) -> String {
        let course = catalog::course(text(record, "course"))
            .map(|c| c.name)
            .unwrap_or("?");
        format!("{course} · {} {}", text(record, "date"), text(record, "time"))
    }

    fn badge(&self, record: &JsonValue) -> Option<BadgeMeta> {
        let date = rules::parse_date(&FieldValue::from(text(record, "date")))?;
        Some(SessionState::on(date, Local::now().date_naive()).meta())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::{open_form, sync_descriptors};
    use form_engine::FormOptions;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dir() -> Directory {
        Directory {
            users: vec![
                json!({"id": "u-1", "name": "Marta", "role": "teacher", "instruments": ["piano", "voice"]}),
                json!({"id": "u-3", "name": "Ana", "role": "student"}),
                json!({"id": "u-4", "name": "Leo", "role": "student"}),
            ],
            enrollments: vec![
                json!({"id": "e-1", "student": "u-3", "course": "piano-beginner", "status": "active"}),
                json!({"id": "e-2", "student": "u-4", "course": "piano-beginner", "status": "cancelled"}),
                json!({"id": "e-3", "student": "u-4", "course": "cello", "status": "pending"}),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn attendance_offers_enrolled_students() {
        let dir = dir();
        let values: FormState = [("course", "piano-beginner")].into_iter().collect();
        let fields = SessionsScreen.descriptors(&values, &dir);
        let attendance = fields.iter().find(|f| f.id == "attendance").unwrap();
        let offered: Vec<&str> = attendance.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(offered, vec!["u-3"]);
    }

    #[test]
    fn changing_course_drops_foreign_attendees() {
        let dir = dir();
        let mut form = open_form(&SessionsScreen, None, &dir, FormOptions::default()).unwrap();
        form.edit("course", "cello").unwrap();
        sync_descriptors(&mut form, &SessionsScreen, &dir);
        form.edit("attendance", vec!["u-4".to_string()]).unwrap();

        form.edit("course", "piano-beginner").unwrap();
        assert_eq!(form.value("attendance"), &FieldValue::Multi(vec![]));
    }

    #[test]
    fn teacher_help_lists_instruments() {
        let dir = dir();
        let fields = SessionsScreen.descriptors(&FormState::default(), &dir);
        let teacher = fields.iter().find(|f| f.id == "teacher").unwrap();
        assert_eq!(
            teacher.help_for(&"u-1".into(), &FormState::default()).as_deref(),
            Some("Teaches Piano, Voice")
        );
    }

    #[test]
    fn session_state_by_date() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let past = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();
        assert_eq!(SessionState::on(today, today), SessionState::Scheduled);
        assert_eq!(SessionState::on(past, today), SessionState::Held);
    }

    #[test]
    fn duration_defaults_to_45_minutes() {
        let form = open_form(&SessionsScreen, None, &dir(), FormOptions::default()).unwrap();
        assert_eq!(form.value("duration"), &FieldValue::Num(45.0));
    }
}
