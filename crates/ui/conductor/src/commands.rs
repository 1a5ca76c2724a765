//! Headless subcommands: describe a screen's form, check a record file against it.
use std::path::Path;

use color_eyre::{Result, eyre::WrapErr};
use form_engine::FormOptions;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::screens::{self, ScreenKind};
use crate::store::Directory;

/// Field-level findings of `check`, in form order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckReport {
    pub screen: ScreenKind,
    pub errors: Vec<FieldProblem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldProblem {
    pub field: String,
    pub message: String,
}

impl CheckReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Read a record file. JSON5 so hand-written files may carry comments.
pub fn read_record(path: &Path) -> Result<JsonValue> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("cannot read {}", path.display()))?;
    json5::from_str(&raw).wrap_err_with(|| format!("{} is not valid JSON5", path.display()))
}

/// Schema of `kind` as pretty JSON; with a record the conditional fields follow its values.
pub fn describe(kind: ScreenKind, record: Option<&JsonValue>, dir: &Directory) -> Result<String> {
    let screen = kind.screen();
    let form = screens::open_form(screen, record, dir, FormOptions::default())?;
    let schema = screen.schema(form.state(), dir);
    Ok(serde_json::to_string_pretty(&schema)?)
}

/// Open the form with `record` and validate every visible field, as a submit would.
pub fn check(
    kind: ScreenKind,
    record: &JsonValue,
    dir: &Directory,
    options: FormOptions,
) -> Result<CheckReport> {
    let screen = kind.screen();
    let mut form = screens::open_form(screen, Some(record), dir, options)?;
    let errors = form.validate().clone();
    let problems = form
        .descriptors()
        .iter()
        .filter_map(|d| {
            errors.get(&d.id).map(|m| FieldProblem {
                field: d.id.clone(),
                message: m.to_string(),
            })
        })
        .collect();
    form.close(None);
    Ok(CheckReport {
        screen: kind,
        errors: problems,
    })
}
