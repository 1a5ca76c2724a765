//! Form popup: the terminal rendering adapter of the form engine.
//!
//! - `popup.rs`  : focus, editing, per-kind controls, submit hand-off (no drawing)
//! - `render.rs` : layout and drawing of one popup frame
//!
//! This is the only place where a widget value (editor text, toggle, option index) becomes
//! a [`FieldValue`] and back.
use form_engine::{FieldDescriptor, FieldKind, FieldValue};

mod popup;
mod render;

pub use popup::{FormPopup, Notice};
pub use render::{FormRenderMetrics, compute_scrollbar_thumb};

/// Convert committed editor text into the value shape of `kind`.
///
/// Empty text is `Null` for numbers (an untouched number field is empty, not `0`).
pub fn parse_input(kind: &FieldKind, text: &str) -> Result<FieldValue, String> {
    match kind {
        FieldKind::Number => {
            let t = text.trim();
            if t.is_empty() {
                return Ok(FieldValue::Null);
            }
            t.replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FieldValue::Num)
                .ok_or_else(|| "Not a number".to_string())
        }
        FieldKind::Date | FieldKind::Time | FieldKind::Email => {
            Ok(FieldValue::Text(text.trim().to_string()))
        }
        _ => Ok(FieldValue::Text(text.to_string())),
    }
}

/// Next option value for select/radio controls; an unset value starts at the first
/// (forward) or last (backward) option.
pub fn cycle_option(descriptor: &FieldDescriptor, current: &FieldValue, step: i32) -> FieldValue {
    let options = &descriptor.options;
    if options.is_empty() {
        return current.clone();
    }
    let len = options.len() as i32;
    let next = match current
        .as_text()
        .and_then(|v| options.iter().position(|o| o.value == v))
    {
        Some(idx) => (idx as i32 + step).rem_euclid(len),
        None if step < 0 => len - 1,
        None => 0,
    };
    FieldValue::Text(options[next as usize].value.clone())
}

/// Toggle membership of `option` in a multiSelect value, keeping option order.
pub fn toggle_member(descriptor: &FieldDescriptor, current: &FieldValue, option: &str) -> FieldValue {
    let mut selected: Vec<String> = current.as_multi().map(<[String]>::to_vec).unwrap_or_default();
    if let Some(pos) = selected.iter().position(|s| s == option) {
        selected.remove(pos);
    } else {
        selected.push(option.to_string());
    }
    // Values not in the option list stay at the end, in their previous order.
    selected.sort_by_key(|s| {
        descriptor
            .options
            .iter()
            .position(|o| &o.value == s)
            .unwrap_or(usize::MAX)
    });
    FieldValue::Multi(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn level() -> FieldDescriptor {
        FieldDescriptor::new("level", "Level", FieldKind::Select)
            .option("a", "A")
            .option("b", "B")
            .option("c", "C")
    }

    #[test]
    fn numbers_parse_or_complain() {
        assert_eq!(parse_input(&FieldKind::Number, " 12,5 "), Ok(FieldValue::Num(12.5)));
        assert_eq!(parse_input(&FieldKind::Number, ""), Ok(FieldValue::Null));
        assert_eq!(
            parse_input(&FieldKind::Number, "twelve"),
            Err("Not a number".to_string())
        );
    }

    #[test]
    fn text_is_kept_verbatim() {
        assert_eq!(parse_input(&FieldKind::Text, " Ana "), Ok(" Ana ".into()));
        assert_eq!(parse_input(&FieldKind::Date, " 2026-09-01 "), Ok("2026-09-01".into()));
    }

    #[test]
    fn cycling_wraps_and_starts_from_ends() {
        let d = level();
        assert_eq!(cycle_option(&d, &FieldValue::Null, 1), "a".into());
        assert_eq!(cycle_option(&d, &FieldValue::Null, -1), "c".into());
        assert_eq!(cycle_option(&d, &"c".into(), 1), "a".into());
        assert_eq!(cycle_option(&d, &"a".into(), -1), "c".into());
    }

    #[test]
    fn multi_toggle_follows_option_order() {
        let d = level();
        let v = toggle_member(&d, &FieldValue::Multi(vec![]), "c");
        let v = toggle_member(&d, &v, "a");
        assert_eq!(v, FieldValue::Multi(vec!["a".into(), "c".into()]));
        let v = toggle_member(&d, &v, "c");
        assert_eq!(v, FieldValue::Multi(vec!["a".into()]));
    }
}
