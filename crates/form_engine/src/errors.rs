use thiserror::Error;

/// Failures the engine reports to its host.
///
/// Field-level validation messages are *not* errors: they travel as plain data in
/// [`crate::ValidationErrors`]. This enum only covers defects in host-supplied behaviour
/// (derivation cycles) and malformed records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("derivation cycle: {}", path.join(" -> "))]
    DerivationCycle { path: Vec<String> },

    #[error("derivation chain from {field:?} exceeds {limit} levels")]
    DerivationTooDeep { field: String, limit: usize },

    #[error("unsupported value for field {key:?}: {reason}")]
    UnsupportedValue { key: String, reason: String },

    #[error("record must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error("form is submitting")]
    Busy,
}

pub type Result<T> = std::result::Result<T, FormError>;
