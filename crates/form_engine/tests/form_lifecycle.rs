use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use form_engine::{
    FieldDescriptor, FieldKind, FieldValue, Form, FormOptions, FormState, SubmissionStatus,
    SubmitAttempt, SubmitOutcome, validate_field, validate_form,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn signup_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("name", "Name", FieldKind::Text).required(),
        FieldDescriptor::new("password", "Password", FieldKind::Password).required(),
        FieldDescriptor::new("confirmPassword", "Confirm password", FieldKind::Password)
            .required()
            .live()
            .validate(|v, state| {
                (v != state.value("password")).then(|| "Passwords do not match".to_string())
            }),
        FieldDescriptor::new("newsletter", "Newsletter", FieldKind::Checkbox),
    ]
}

#[test]
fn required_fields_reject_every_empty_value() {
    let state = FormState::default();
    let kinds = [
        FieldKind::Text,
        FieldKind::Email,
        FieldKind::Select,
        FieldKind::MultiSelect,
        FieldKind::Number,
    ];
    for kind in kinds {
        let d = FieldDescriptor::new("f", "Field", kind.clone()).required();
        for empty in [FieldValue::Null, "".into(), FieldValue::Multi(vec![])] {
            assert!(
                validate_field(&d, &empty, &state).is_some(),
                "{kind:?} accepted {empty:?}"
            );
        }
        for filled in [FieldValue::from("x"), FieldValue::Num(0.0), FieldValue::Bool(false)] {
            assert_eq!(validate_field(&d, &filled, &state), None);
        }
    }
}

#[test]
fn validate_form_is_idempotent() {
    let mut form = Form::open(signup_fields(), None, FormOptions::default());
    form.edit("password", "Abc12345").unwrap();
    let before = form.state().clone();
    let first = validate_form(form.descriptors(), form.state());
    let second = validate_form(form.descriptors(), form.state());
    assert_eq!(first, second);
    assert_eq!(form.validate().clone(), first);
    assert!(form.state().same_as(&before));
}

#[tokio::test]
async fn second_submit_while_in_flight_is_ignored() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut form = Form::open(
        signup_fields(),
        Some([("name", "Ana")].into_iter().collect()),
        FormOptions::default(),
    );
    form.edit("password", "Abc12345").unwrap();
    form.edit("confirmPassword", "Abc12345").unwrap();

    let SubmitAttempt::Started(values) = form.begin_submit() else {
        panic!("first submit should start");
    };
    let in_flight = {
        let calls = calls.clone();
        tokio::spawn(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(values.to_json())
        })
    };

    let snapshot = form.state().clone();
    assert_eq!(form.begin_submit(), SubmitAttempt::Ignored);
    assert_eq!(form.status(), SubmissionStatus::Submitting);
    assert!(form.state().same_as(&snapshot));

    let result = in_flight.await.unwrap();
    assert!(form.complete_submit(result).is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(form.status(), SubmissionStatus::Idle);
}

#[test]
fn derived_value_is_visible_right_after_the_edit() {
    let fields = vec![
        FieldDescriptor::new("course", "Course", FieldKind::Select)
            .option("piano", "Piano")
            .derive(|v, _, set| {
                let fee = if v.as_text() == Some("piano") { 120.0 } else { 0.0 };
                set.set("fee", fee);
            }),
        FieldDescriptor::new("fee", "Fee", FieldKind::Number).disabled(),
    ];
    let mut form = Form::open(fields, None, FormOptions::default());
    form.edit("course", "piano").unwrap();
    assert_eq!(form.value("fee"), &FieldValue::Num(120.0));
}

#[tokio::test]
async fn failed_submit_keeps_entered_values() {
    let mut form = Form::open(signup_fields(), None, FormOptions::default());
    form.edit("name", "Ana").unwrap();
    form.edit("password", "Abc12345").unwrap();
    form.edit("confirmPassword", "Abc12345").unwrap();
    let before = form.state().clone();

    let outcome = form
        .submit(|_| async { Err::<(), _>("e-mail already registered".to_string()) })
        .await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed("e-mail already registered".to_string())
    );
    assert_eq!(form.state(), &before);
    assert_eq!(form.status(), SubmissionStatus::Idle);
}

#[tokio::test]
async fn untouched_record_round_trips_to_the_callback() {
    let fields = vec![
        FieldDescriptor::new("name", "Name", FieldKind::Text).required(),
        FieldDescriptor::new("active", "Active", FieldKind::Switch).default_value(true),
        FieldDescriptor::new("instruments", "Instruments", FieldKind::MultiSelect),
        FieldDescriptor::new("level", "Level", FieldKind::Select),
    ];
    let record = json!({"id": "u-1", "name": "Ana"});
    let mut form = Form::open_json(fields, Some(&record), FormOptions::default()).unwrap();

    let outcome = form
        .submit(|values| async move { Ok::<_, String>(values.to_json()) })
        .await;

    assert_eq!(
        outcome,
        SubmitOutcome::Succeeded(json!({
            "id": "u-1",
            "name": "Ana",
            "active": true,
            "instruments": [],
            "level": null,
        }))
    );
}

#[test]
fn password_confirmation_scenario() {
    let mut form = Form::open(signup_fields(), None, FormOptions::default());
    form.edit("name", "Ana").unwrap();
    form.edit("password", "Abc12345").unwrap();
    form.edit("confirmPassword", "Abc1234").unwrap();

    let errors = form.validate().clone();
    assert_eq!(errors.ids(), vec!["confirmPassword"]);
    assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));

    form.edit("confirmPassword", "Abc12345").unwrap();
    assert_eq!(form.error("confirmPassword"), None);
    assert!(form.validate().is_valid());
}

#[test]
fn hidden_field_keeps_value_but_leaves_validation() {
    let role = FieldDescriptor::new("role", "Role", FieldKind::Select)
        .option("teacher", "Teacher")
        .option("student", "Student");
    let instrument = FieldDescriptor::new("instrument", "Instrument", FieldKind::Text).required();

    let mut form = Form::open(
        vec![role.clone(), instrument],
        None,
        FormOptions::default(),
    );
    form.edit("role", "teacher").unwrap();
    form.edit("instrument", "").unwrap();

    form.set_descriptors(vec![role]);
    assert!(form.state().contains("instrument"));
    assert!(form.validate().is_valid());
    assert!(matches!(form.begin_submit(), SubmitAttempt::Started(values) if values.contains("instrument")));
}

#[test]
fn cyclic_derivation_leaves_state_untouched() {
    let fields = vec![
        FieldDescriptor::new("a", "A", FieldKind::Text).derive(|v, _, s| s.set("b", v.clone())),
        FieldDescriptor::new("b", "B", FieldKind::Text).derive(|v, _, s| s.set("a", v.clone())),
    ];
    let mut form = Form::open(fields, None, FormOptions::default());
    let before = form.state().clone();
    assert!(form.edit("a", "x").is_err());
    assert!(form.state().same_as(&before));
}
