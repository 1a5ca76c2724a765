//! Change propagation.
//!
//! One user edit is one transaction:
//! 1. write the new value into a *new* [`FormState`]
//! 2. live-validated fields recompute their error, other fields drop a stale error
//! 3. the field's derivation hook runs with a [`FieldSetter`]; every write it issues is
//!    applied through steps 1–3 again, in issue order, before the edit returns
//!
//! Hooks never see a half-applied write: they get the state as it was right after their
//! own field changed. A hook that re-enters a field whose hook is still running is a
//! cycle; chains deeper than the configured limit are rejected as well. Either defect
//! aborts the whole transaction so the form keeps its pre-edit state.
use tracing::{debug, error};

use crate::errors::FormError;
use crate::field::FieldDescriptor;
use crate::state::FormState;
use crate::validation::{ValidationErrors, validate_field};
use crate::value::FieldValue;

/// Write channel handed to derivation hooks.
///
/// Writes are queued and applied by the engine after the hook returns, in the order
/// they were issued.
#[derive(Debug, Default)]
pub struct FieldSetter {
    writes: Vec<(String, FieldValue)>,
}

impl FieldSetter {
    pub fn set(&mut self, id: impl Into<String>, value: impl Into<FieldValue>) {
        self.writes.push((id.into(), value.into()));
    }

    /// Reset a field to `Null`.
    pub fn clear(&mut self, id: impl Into<String>) {
        self.writes.push((id.into(), FieldValue::Null));
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    fn into_writes(self) -> Vec<(String, FieldValue)> {
        self.writes
    }
}

/// Result of a committed transaction.
#[derive(Debug, Clone)]
pub struct Propagated {
    pub state: FormState,
    pub errors: ValidationErrors,
    /// Ids written during the transaction, in application order (the edited field first).
    pub touched: Vec<String>,
}

/// Single edit transaction over a borrowed descriptor list.
pub struct Propagation<'a> {
    descriptors: &'a [FieldDescriptor],
    state: FormState,
    errors: ValidationErrors,
    max_depth: usize,
    /// Fields whose derivation hook is currently running, outermost first.
    active: Vec<String>,
    touched: Vec<String>,
}

impl<'a> Propagation<'a> {
    pub fn new(
        descriptors: &'a [FieldDescriptor],
        state: FormState,
        errors: ValidationErrors,
        max_depth: usize,
    ) -> Self {
        Self {
            descriptors,
            state,
            errors,
            max_depth,
            active: Vec::new(),
            touched: Vec::new(),
        }
    }

    /// Apply `value` to `id` including every derived write. On error nothing of the
    /// transaction is kept; the caller still owns its previous state.
    pub fn run(mut self, id: &str, value: FieldValue) -> Result<Propagated, FormError> {
        match self.apply(id, value, 0) {
            Ok(()) => Ok(Propagated {
                state: self.state,
                errors: self.errors,
                touched: self.touched,
            }),
            Err(e) => {
                error!(field = id, error = %e, "edit rolled back");
                Err(e)
            }
        }
    }

    fn apply(&mut self, id: &str, value: FieldValue, depth: usize) -> Result<(), FormError> {
        if depth > self.max_depth {
            return Err(FormError::DerivationTooDeep {
                field: self
                    .active
                    .first()
                    .cloned()
                    .unwrap_or_else(|| id.to_string()),
                limit: self.max_depth,
            });
        }

        self.state = self.state.with_value(id, value.clone());
        self.touched.push(id.to_string());

        let descriptors = self.descriptors;
        let Some(descriptor) = descriptors.iter().find(|d| d.id == id) else {
            debug!(field = id, "write to field without visible descriptor");
            return Ok(());
        };

        if descriptor.live_validation {
            let error = validate_field(descriptor, &value, &self.state);
            self.errors.set(id, error);
        } else {
            self.errors.set(id, None);
        }

        let Some(hook) = &descriptor.derive else {
            return Ok(());
        };
        if self.active.iter().any(|a| a == id) {
            let mut path = self.active.clone();
            path.push(id.to_string());
            return Err(FormError::DerivationCycle { path });
        }

        let mut setter = FieldSetter::default();
        hook(&value, &self.state, &mut setter);
        if setter.is_empty() {
            return Ok(());
        }

        self.active.push(id.to_string());
        for (other, other_value) in setter.into_writes() {
            debug!(from = id, to = %other, "derived write");
            self.apply(&other, other_value, depth + 1)?;
        }
        self.active.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use pretty_assertions::assert_eq;

    fn run(
        fields: &[FieldDescriptor],
        state: FormState,
        id: &str,
        value: impl Into<FieldValue>,
    ) -> Result<Propagated, FormError> {
        Propagation::new(fields, state, ValidationErrors::default(), 16).run(id, value.into())
    }

    #[test]
    fn derived_writes_apply_in_issue_order() {
        let fields = vec![
            FieldDescriptor::new("a", "A", FieldKind::Text).derive(|v, _, set| {
                set.set("b", v.clone());
                set.set("c", "first");
                set.set("c", "second");
            }),
            FieldDescriptor::new("b", "B", FieldKind::Text),
            FieldDescriptor::new("c", "C", FieldKind::Text),
        ];
        let out = run(&fields, FormState::default(), "a", "x").unwrap();
        assert_eq!(out.state.text("b"), "x");
        assert_eq!(out.state.text("c"), "second");
        assert_eq!(out.touched, vec!["a", "b", "c", "c"]);
    }

    #[test]
    fn chained_derivations_run() {
        let fields = vec![
            FieldDescriptor::new("a", "A", FieldKind::Text).derive(|_, _, s| s.set("b", "1")),
            FieldDescriptor::new("b", "B", FieldKind::Text).derive(|_, _, s| s.set("c", "2")),
            FieldDescriptor::new("c", "C", FieldKind::Text),
        ];
        let out = run(&fields, FormState::default(), "a", "go").unwrap();
        assert_eq!(out.state.text("c"), "2");
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let fields = vec![
            FieldDescriptor::new("a", "A", FieldKind::Text).derive(|_, _, s| {
                s.set("b", "b");
                s.set("c", "c");
            }),
            FieldDescriptor::new("b", "B", FieldKind::Text).derive(|_, _, s| s.set("c", "from-b")),
            FieldDescriptor::new("c", "C", FieldKind::Text).derive(|_, _, s| s.set("d", "d")),
            FieldDescriptor::new("d", "D", FieldKind::Text),
        ];
        let out = run(&fields, FormState::default(), "a", "go").unwrap();
        assert_eq!(out.state.text("c"), "c");
        assert_eq!(out.state.text("d"), "d");
    }

    #[test]
    fn two_field_cycle_is_reported() {
        let fields = vec![
            FieldDescriptor::new("a", "A", FieldKind::Text).derive(|v, _, s| s.set("b", v.clone())),
            FieldDescriptor::new("b", "B", FieldKind::Text).derive(|v, _, s| s.set("a", v.clone())),
        ];
        let err = run(&fields, FormState::default(), "a", "loop").unwrap_err();
        assert_eq!(
            err,
            FormError::DerivationCycle {
                path: vec!["a".into(), "b".into(), "a".into()]
            }
        );
    }

    #[test]
    fn self_write_is_a_cycle() {
        let fields = vec![FieldDescriptor::new("a", "A", FieldKind::Text)
            .derive(|v, _, s| s.set("a", v.to_plain_string().to_uppercase()))];
        let err = run(&fields, FormState::default(), "a", "x").unwrap_err();
        assert!(matches!(err, FormError::DerivationCycle { .. }));
    }

    #[test]
    fn long_chains_hit_the_depth_limit() {
        let fields: Vec<FieldDescriptor> = (0..10)
            .map(|i| {
                FieldDescriptor::new(format!("f{i}"), "F", FieldKind::Text)
                    .derive(move |_, _, s| s.set(format!("f{}", i + 1), "x"))
            })
            .collect();
        let err = Propagation::new(&fields, FormState::default(), ValidationErrors::default(), 3)
            .run("f0", "x".into())
            .unwrap_err();
        assert_eq!(
            err,
            FormError::DerivationTooDeep {
                field: "f0".into(),
                limit: 3
            }
        );
    }

    #[test]
    fn stale_error_is_cleared_unless_live() {
        let fields = vec![
            FieldDescriptor::new("lazy", "Lazy", FieldKind::Text).required(),
            FieldDescriptor::new("eager", "Eager", FieldKind::Text)
                .required()
                .live(),
        ];
        let errors: ValidationErrors = [("lazy", "Lazy is required")].into_iter().collect();
        let out = Propagation::new(&fields, FormState::default(), errors, 16)
            .run("lazy", "".into())
            .unwrap();
        assert!(!out.errors.contains("lazy"));

        let out = Propagation::new(&fields, out.state, out.errors, 16)
            .run("eager", "".into())
            .unwrap();
        assert_eq!(out.errors.get("eager"), Some("Eager is required"));
    }

    #[test]
    fn hook_sees_its_own_write() {
        let fields = vec![
            FieldDescriptor::new("qty", "Qty", FieldKind::Number).derive(|_, state, s| {
                let qty = state.value("qty").as_num().unwrap_or(0.0);
                s.set("total", qty * 10.0);
            }),
            FieldDescriptor::new("total", "Total", FieldKind::Number),
        ];
        let out = run(&fields, FormState::default(), "qty", 3.0).unwrap();
        assert_eq!(out.state.value("total"), &FieldValue::Num(30.0));
    }
}
