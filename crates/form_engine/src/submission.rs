//! Submission state machine.
//!
//! ```text
//!            begin (valid)                 complete(Ok / Err)
//!   Idle ─────────────────▶ Submitting ─────────────────────▶ Idle
//!    ▲  │ begin (invalid)        │ begin
//!    └──┘                        └──▶ ignored, nothing changes
//! ```
//!
//! There is no retry, no timeout and no cancellation: a callback that never resolves
//! keeps the form in `Submitting`.
use serde::Serialize;
use tracing::{debug, warn};

use crate::state::FormState;
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
}

/// What `begin_submit` decided.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAttempt {
    /// Validation passed; the host must run its submit callback with these values and
    /// report back through `complete_submit`.
    Started(FormState),
    /// Validation failed; the callback must not run. Errors are already stored on the form.
    Blocked(ValidationErrors),
    /// A submission is already in flight; nothing happened.
    Ignored,
}

/// Final result of one submit request as seen by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T, E> {
    Succeeded(T),
    /// The callback failed; the reason is passed through untouched and the form keeps
    /// the values the user entered.
    Failed(E),
    Blocked(ValidationErrors),
    Ignored,
}

impl<T, E> SubmitOutcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded(_))
    }
}

/// Guard owning the `Idle` / `Submitting` flag.
#[derive(Debug, Default)]
pub(crate) struct Submission {
    status: SubmissionStatus,
}

impl Submission {
    pub(crate) fn status(&self) -> SubmissionStatus {
        self.status
    }

    /// Enter `Submitting`; `false` if a submission is already running.
    pub(crate) fn try_begin(&mut self) -> bool {
        match self.status {
            SubmissionStatus::Submitting => {
                debug!("submit ignored: already submitting");
                false
            }
            SubmissionStatus::Idle => {
                self.status = SubmissionStatus::Submitting;
                true
            }
        }
    }

    /// Back to `Idle`; `false` if nothing was in flight (late or duplicate completion).
    pub(crate) fn finish(&mut self) -> bool {
        match self.status {
            SubmissionStatus::Submitting => {
                self.status = SubmissionStatus::Idle;
                true
            }
            SubmissionStatus::Idle => {
                warn!("submit completion without a submission in flight");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_refused() {
        let mut s = Submission::default();
        assert!(s.try_begin());
        assert!(!s.try_begin());
        assert_eq!(s.status(), SubmissionStatus::Submitting);
    }

    #[test]
    fn finish_returns_to_idle_once() {
        let mut s = Submission::default();
        s.try_begin();
        assert!(s.finish());
        assert!(!s.finish());
        assert_eq!(s.status(), SubmissionStatus::Idle);
    }
}
