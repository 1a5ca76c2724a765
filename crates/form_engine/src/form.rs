//! One open form instance.
//!
//! `Form` owns the runtime pieces of a single open form (values, errors, submission
//! status). The host keeps ownership of what it supplies: it passes descriptors in on
//! open and again whenever its conditional fields change, and it runs the submit callback.
//!
//! Lifecycle:
//! ```text
//! open ──▶ edit* / set_descriptors* ──▶ begin_submit ──▶ complete_submit ──▶ close
//!                     ▲                                        │ (failed)
//!                     └────────────────────────────────────────┘
//! ```
use std::fmt;
use std::future::Future;

use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::errors::FormError;
use crate::field::FieldDescriptor;
use crate::propagation::Propagation;
use crate::state::FormState;
use crate::submission::{Submission, SubmissionStatus, SubmitAttempt, SubmitOutcome};
use crate::validation::{ValidationErrors, validate_form};
use crate::value::FieldValue;

type CloseCallback = Box<dyn FnOnce(Option<&str>) + Send>;

/// Engine tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOptions {
    /// Longest chain of derived writes accepted within one edit.
    pub max_derivation_depth: usize,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            max_derivation_depth: 16,
        }
    }
}

pub struct Form {
    descriptors: Vec<FieldDescriptor>,
    state: FormState,
    /// Snapshot taken on open; `is_dirty` and `reset` compare against it.
    seeded: FormState,
    errors: ValidationErrors,
    submission: Submission,
    options: FormOptions,
    on_close: Option<CloseCallback>,
}

impl Form {
    /// Open a form: seed values from `initial` (if any), descriptor defaults and kind
    /// defaults.
    pub fn open(
        descriptors: Vec<FieldDescriptor>,
        initial: Option<FormState>,
        options: FormOptions,
    ) -> Self {
        let state = FormState::seed(&descriptors, initial.as_ref());
        debug!(
            fields = descriptors.len(),
            seeded = state.len(),
            "form opened"
        );
        Self {
            descriptors,
            seeded: state.clone(),
            state,
            errors: ValidationErrors::default(),
            submission: Submission::default(),
            options,
            on_close: None,
        }
    }

    /// Open with a JSON record as initial data (`None` for a new record).
    pub fn open_json(
        descriptors: Vec<FieldDescriptor>,
        record: Option<&JsonValue>,
        options: FormOptions,
    ) -> Result<Self, FormError> {
        let initial = record.map(FormState::from_json).transpose()?;
        Ok(Self::open(descriptors, initial, options))
    }

    /// Register the host's close callback.
    pub fn on_close(mut self, f: impl FnOnce(Option<&str>) + Send + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }

    // --- Accessors -----------------------------------------------------------------------------

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, id: &str) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn value(&self, id: &str) -> &FieldValue {
        self.state.value(id)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error(&self, id: &str) -> Option<&str> {
        self.errors.get(id)
    }

    pub fn status(&self) -> SubmissionStatus {
        self.submission.status()
    }

    pub fn is_submitting(&self) -> bool {
        self.status() == SubmissionStatus::Submitting
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// True when values differ from what the form was opened with.
    pub fn is_dirty(&self) -> bool {
        self.state != self.seeded
    }

    // --- Editing -------------------------------------------------------------------------------

    /// Apply one edit plus every derived write it triggers.
    ///
    /// Completes synchronously: when this returns, derived fields already hold their new
    /// values. On a derivation defect nothing changes and the error is returned.
    /// Refused with [`FormError::Busy`] while a submit is in flight, so a failed submit
    /// leaves the values exactly as they were handed to the callback.
    pub fn edit(&mut self, id: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
        if self.is_submitting() {
            debug!(field = id, "edit refused while submitting");
            return Err(FormError::Busy);
        }
        let out = Propagation::new(
            &self.descriptors,
            self.state.clone(),
            self.errors.clone(),
            self.options.max_derivation_depth,
        )
        .run(id, value.into())?;
        debug!(field = id, touched = out.touched.len(), "edit applied");
        self.state = out.state;
        self.errors = out.errors;
        Ok(())
    }

    /// Replace the visible descriptor list (host re-render).
    ///
    /// Fields appearing for the first time are seeded, in the state and in the opening
    /// snapshot alike; values of fields that disappeared stay in the state. Errors of hidden
    /// fields are dropped. Existing values are never touched, so this is safe mid-submit.
    pub fn set_descriptors(&mut self, descriptors: Vec<FieldDescriptor>) {
        for d in &descriptors {
            if !self.state.contains(&d.id) {
                self.state = self.state.with_value(&d.id, d.seed_value());
            }
            if !self.seeded.contains(&d.id) {
                self.seeded = self.seeded.with_value(&d.id, d.seed_value());
            }
        }
        let stale: Vec<String> = self
            .errors
            .iter()
            .filter(|(id, _)| !descriptors.iter().any(|d| d.id == *id))
            .map(|(id, _)| id.to_string())
            .collect();
        for id in stale {
            self.errors.set(&id, None);
        }
        self.descriptors = descriptors;
    }

    /// Validate all visible fields at once and store the result.
    pub fn validate(&mut self) -> &ValidationErrors {
        self.errors = validate_form(&self.descriptors, &self.state);
        &self.errors
    }

    /// Back to the values the form was opened with.
    pub fn reset(&mut self) -> Result<(), FormError> {
        if self.is_submitting() {
            return Err(FormError::Busy);
        }
        self.state = FormState::seed(&self.descriptors, Some(&self.seeded));
        self.errors = ValidationErrors::default();
        Ok(())
    }

    // --- Submission ----------------------------------------------------------------------------

    /// First half of a submit: guard, validate, hand out the values to submit.
    pub fn begin_submit(&mut self) -> SubmitAttempt {
        if !self.submission.try_begin() {
            return SubmitAttempt::Ignored;
        }
        let errors = validate_form(&self.descriptors, &self.state);
        self.errors = errors.clone();
        if !errors.is_valid() {
            self.submission.finish();
            debug!(invalid = errors.len(), "submit blocked by validation");
            return SubmitAttempt::Blocked(errors);
        }
        info!(revision = self.state.revision(), "submit started");
        SubmitAttempt::Started(self.state.clone())
    }

    /// Second half of a submit: report the callback's result. Values are never touched.
    pub fn complete_submit<T, E: fmt::Display>(
        &mut self,
        result: Result<T, E>,
    ) -> SubmitOutcome<T, E> {
        if !self.submission.finish() {
            return SubmitOutcome::Ignored;
        }
        match result {
            Ok(v) => {
                info!("submit succeeded");
                SubmitOutcome::Succeeded(v)
            }
            Err(e) => {
                info!(reason = %e, "submit failed");
                SubmitOutcome::Failed(e)
            }
        }
    }

    /// Guarded submit around an awaited callback.
    pub async fn submit<F, Fut, T, E>(&mut self, on_submit: F) -> SubmitOutcome<T, E>
    where
        F: FnOnce(FormState) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        match self.begin_submit() {
            SubmitAttempt::Started(values) => {
                let result = on_submit(values).await;
                self.complete_submit(result)
            }
            SubmitAttempt::Blocked(errors) => SubmitOutcome::Blocked(errors),
            SubmitAttempt::Ignored => SubmitOutcome::Ignored,
        }
    }

    /// Close the form: notify the host and hand back the final values.
    pub fn close(mut self, reason: Option<&str>) -> FormState {
        debug!(reason = reason.unwrap_or("-"), "form closed");
        if let Some(cb) = self.on_close.take() {
            cb(reason);
        }
        self.state
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("descriptors", &self.descriptors.len())
            .field("state", &self.state)
            .field("errors", &self.errors)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
