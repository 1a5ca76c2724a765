//! Declarative form engine.
//!
//! A hosting screen hands the engine a list of [`FieldDescriptor`]s, optional initial
//! record data, a submit callback and a close callback. The engine owns the per-form
//! runtime pieces:
//!
//! - [`FormState`]: current values, replaced (never mutated in place) on every edit
//! - [`ValidationErrors`]: field-level messages, recomputed per edit or atomically on submit
//! - [`SubmissionStatus`]: `Idle` / `Submitting`, guarding the submit callback (single-flight)
//!
//! Module map:
//! - `value`       : [`FieldValue`] tagged union + JSON bridge
//! - `field`       : [`FieldDescriptor`], [`FieldKind`], options, constraints, hook types
//! - `schema`      : [`FormSchema`] presentation container
//! - `state`       : [`FormState`]
//! - `validation`  : [`validate_field`], [`validate_form`], [`ValidationErrors`]
//! - `propagation` : edit transactions, [`FieldSetter`], cycle/depth bounds
//! - `submission`  : submission state machine types
//! - `form`        : [`Form`], one open form instance tying everything together
//! - `display`     : value formatting for adapters and read-only detail views
//! - `badge`       : enumeration → badge metadata mapping
//!
//! ```ignore
//! use form_engine::{FieldDescriptor, FieldKind, Form, FormOptions};
//!
//! let fields = vec![
//!     FieldDescriptor::new("password", "Password", FieldKind::Password).required(),
//!     FieldDescriptor::new("confirm", "Confirm password", FieldKind::Password)
//!         .required()
//!         .validate(|v, state| {
//!             (v != state.value("password")).then(|| "Passwords do not match".to_string())
//!         }),
//! ];
//! let mut form = Form::open(fields, None, FormOptions::default());
//! form.edit("password", "Abc12345")?;
//! ```

pub mod badge;
pub mod display;
pub mod errors;
pub mod field;
pub mod form;
pub mod propagation;
pub mod schema;
pub mod state;
pub mod submission;
pub mod validation;
pub mod value;

pub use badge::{Badge, BadgeMeta, Tone};
pub use errors::{FormError, Result};
pub use field::{Constraints, FieldDescriptor, FieldKind, FieldOption};
pub use form::{Form, FormOptions};
pub use propagation::FieldSetter;
pub use schema::FormSchema;
pub use state::FormState;
pub use submission::{SubmissionStatus, SubmitAttempt, SubmitOutcome};
pub use validation::{ValidationErrors, validate_field, validate_form};
pub use value::FieldValue;
