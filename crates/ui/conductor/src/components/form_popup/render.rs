use color_eyre::Result;
use form_engine::{FieldDescriptor, FieldKind, SubmissionStatus, display};
use ratatui::{
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Clear, Paragraph, Wrap},
};

use super::{FormPopup, Notice, popup::FIELD_ROWS};
use crate::components::popup::{centered_rect_fixed, draw_popup_frame};
use crate::theme::UiGroup;
use crate::tui::Frame;

const POPUP_WIDTH: u16 = 76;

/// Layout facts of the last rendered frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRenderMetrics {
    pub total_fields: usize,
    pub visible_start: usize,
    pub visible_end: usize,
    pub focused_index: usize,
    pub scroll: usize,
    pub thumb_y: Option<usize>,
}

/// Vertical thumb position of the scrollbar.
///
/// Returns `None` when everything fits (`total <= visible`) or the track is empty.
pub fn compute_scrollbar_thumb(
    total: usize,
    visible: usize,
    scroll: usize,
    track_height: u16,
) -> Option<usize> {
    if track_height == 0 || total == 0 || visible == 0 || total <= visible {
        return None;
    }
    let max_thumb_y = track_height.saturating_sub(1) as usize;
    let denom = total.saturating_sub(visible).max(1);
    let ratio = (scroll as f32) / (denom as f32);
    let thumb_y = (ratio * (max_thumb_y as f32)).round() as usize;
    Some(thumb_y.min(max_thumb_y))
}

/// Draw one frame of the popup. Only `last_inner_height` and the scroll offset change.
pub fn render_form_popup(
    popup: &mut FormPopup,
    f: &mut Frame<'_>,
    area: Rect,
) -> Result<FormRenderMetrics> {
    let total = popup.field_count();
    if area.width < 5 || area.height < 5 {
        return Ok(FormRenderMetrics {
            total_fields: total,
            visible_start: 0,
            visible_end: 0,
            focused_index: popup.focused_index(),
            scroll: popup.scroll(),
            thumb_y: None,
        });
    }

    let wanted = (total as u16)
        .saturating_mul(FIELD_ROWS)
        .saturating_add(8)
        .saturating_add(popup.description().map_or(0, |d| d.lines().count() as u16 + 1));
    let dialog = centered_rect_fixed(area, POPUP_WIDTH, wanted);
    let inner = draw_popup_frame(f, dialog, popup.title());
    f.render_widget(Clear, inner);
    popup.set_last_inner_height(inner.height);

    popup.ensure_visible(inner.height);
    let (start, end) = popup.visible_bounds(inner.height);
    let theme = &popup.theme;

    let mut lines: Vec<Line> = Vec::new();
    if let Some(desc) = popup.description() {
        for l in desc.lines() {
            lines.push(Line::from(Span::styled(l.to_string(), theme.style(UiGroup::Help))));
        }
        lines.push(Line::raw(""));
    }

    let mut cursor: Option<Position> = None;
    for (idx, field) in popup.fields()[start..end].iter().enumerate() {
        let focused = start + idx == popup.focused_index();
        let editing = focused && popup.is_editing();

        let mut label_style = if field.disabled {
            theme.style(UiGroup::Disabled)
        } else {
            theme.style(UiGroup::Label)
        };
        if focused {
            label_style = label_style.add_modifier(Modifier::BOLD);
        }
        let marker = if field.required { " *" } else { "" };
        let label = format!("{}{marker}: ", field.label);
        let label_width = label.chars().count() as u16;
        let mut spans = vec![Span::styled(label, label_style)];

        if editing {
            let input = popup.input();
            cursor = Some(Position::new(
                inner.x + label_width + input.visual_cursor() as u16,
                inner.y + lines.len() as u16,
            ));
            spans.push(Span::styled(
                input.value().to_string(),
                theme.style(UiGroup::Focused),
            ));
        } else {
            spans.extend(value_spans(popup, field, focused));
        }
        lines.push(Line::from(spans));

        let value = popup.form().value(&field.id);
        if let Some(err) = popup.form().error(&field.id) {
            lines.push(Line::from(Span::styled(
                format!("  {err}"),
                theme.style(UiGroup::Error),
            )));
        } else if let Some(help) = field.help_for(value, popup.form().state()) {
            lines.push(Line::from(Span::styled(
                format!("  {help}"),
                theme.style(UiGroup::Help),
            )));
        }
        lines.push(Line::raw(""));
    }

    match (popup.form().status(), popup.notice()) {
        (SubmissionStatus::Submitting, _) => lines.push(Line::from(Span::styled(
            "Saving…",
            theme.style(UiGroup::Warn),
        ))),
        (_, Some(Notice::Error(msg))) => {
            lines.push(Line::from(Span::styled(msg.clone(), theme.style(UiGroup::Error))))
        }
        (_, Some(Notice::Info(msg))) => {
            lines.push(Line::from(Span::styled(msg.clone(), theme.style(UiGroup::Info))))
        }
        _ => lines.push(Line::raw("")),
    }
    lines.push(footer(popup));

    let para = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    f.render_widget(para, inner);
    if let Some(pos) = cursor {
        f.set_cursor_position(pos);
    }

    // Scrollbar
    let visible = end.saturating_sub(start);
    let thumb_y = if inner.width >= 1 {
        let track = Rect {
            x: inner.x + inner.width.saturating_sub(1),
            y: inner.y,
            width: 1,
            height: inner.height,
        };
        let thumb = compute_scrollbar_thumb(total, visible, popup.scroll(), track.height);
        if let Some(thumb) = thumb {
            let track_lines: Vec<Line> = (0..track.height)
                .map(|i| {
                    if i as usize == thumb {
                        Line::from(Span::styled("█", theme.style(UiGroup::Label)))
                    } else {
                        Line::from(Span::styled("│", theme.style(UiGroup::Border)))
                    }
                })
                .collect();
            f.render_widget(Paragraph::new(Text::from(track_lines)), track);
        }
        thumb
    } else {
        None
    };

    Ok(FormRenderMetrics {
        total_fields: total,
        visible_start: start,
        visible_end: end,
        focused_index: popup.focused_index(),
        scroll: popup.scroll(),
        thumb_y,
    })
}

/// Value part of a field line: the control for the focused field, formatted text otherwise.
fn value_spans(popup: &FormPopup, field: &FieldDescriptor, focused: bool) -> Vec<Span<'static>> {
    let theme = &popup.theme;
    let value = popup.form().value(&field.id);
    let value_style = if focused && !field.disabled {
        theme.style(UiGroup::Focused)
    } else if field.disabled {
        theme.style(UiGroup::Disabled)
    } else {
        theme.style(UiGroup::Value)
    };

    match &field.kind {
        // Every option is listed, in the order the screen supplied them.
        FieldKind::MultiSelect if focused => {
            let selected = value.as_multi().unwrap_or_default();
            let mut spans = Vec::with_capacity(field.options.len() * 2);
            for (i, opt) in field.options.iter().enumerate() {
                let mark = if selected.contains(&opt.value) { "[x]" } else { "[ ]" };
                let mut style = theme.style(UiGroup::Value);
                if i == popup.option_cursor() {
                    style = theme.style(UiGroup::Focused);
                }
                spans.push(Span::styled(format!("{mark} {}", opt.label), style));
                spans.push(Span::raw("  "));
            }
            if field.options.is_empty() {
                spans.push(Span::styled("(no options)", theme.style(UiGroup::Dimmed)));
            }
            spans
        }
        FieldKind::Radio if focused => field
            .options
            .iter()
            .flat_map(|opt| {
                let on = value.as_text() == Some(opt.value.as_str());
                let style = if on { value_style } else { theme.style(UiGroup::Value) };
                [
                    Span::styled(format!("({}) {}", if on { "•" } else { " " }, opt.label), style),
                    Span::raw("  "),
                ]
            })
            .collect(),
        FieldKind::Select if focused && !field.disabled => {
            let shown = display::format_value(field, value);
            let shown = if shown.is_empty() { "choose".to_string() } else { shown };
            vec![Span::styled(format!("‹ {shown} ›"), value_style)]
        }
        _ => {
            let shown = display::format_value(field, value);
            if shown.is_empty() {
                let hint = field.placeholder.clone().unwrap_or_else(|| "—".to_string());
                vec![Span::styled(hint, theme.style(UiGroup::Dimmed))]
            } else {
                vec![Span::styled(shown, value_style)]
            }
        }
    }
}

fn footer(popup: &FormPopup) -> Line<'static> {
    let key = popup.theme.style(UiGroup::Label);
    let dim = popup.theme.style(UiGroup::Dimmed);
    let hints: &[(&str, &str)] = if popup.is_editing() {
        &[("Enter", "Confirm"), ("Esc", "Discard"), ("Ctrl+S", "Save")]
    } else {
        &[
            ("↑/↓", "Navigate"),
            ("Enter", "Edit"),
            ("←/→/Space", "Choose"),
            ("Ctrl+S", "Save"),
            ("Ctrl+R", "Reset"),
            ("Esc", "Close"),
        ]
    };
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (k, what) in hints {
        spans.push(Span::styled(k.to_string(), key));
        spans.push(Span::styled(format!(": {what}   "), dim));
    }
    Line::from(spans).style(Style::default())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::components::Component;
    use crate::screens::ScreenKind;
    use crate::store::Directory;
    use form_engine::FormOptions;
    use ratatui::{Terminal, backend::TestBackend};

    #[test]
    fn thumb_is_absent_when_everything_fits() {
        assert_eq!(compute_scrollbar_thumb(5, 5, 0, 10), None);
        assert_eq!(compute_scrollbar_thumb(5, 3, 0, 0), None);
    }

    #[test]
    fn thumb_travels_the_track() {
        assert_eq!(compute_scrollbar_thumb(20, 5, 0, 10), Some(0));
        assert_eq!(compute_scrollbar_thumb(20, 5, 15, 10), Some(9));
        assert_eq!(compute_scrollbar_thumb(20, 5, 99, 10), Some(9));
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn draws_labels_required_markers_and_errors() {
        let mut popup = FormPopup::open(
            1,
            ScreenKind::Users.screen(),
            None,
            Arc::new(Directory::default()),
            FormOptions::default(),
        )
        .unwrap();
        popup.update(crate::action::Action::Submit).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(90, 50)).unwrap();
        terminal.draw(|f| popup.draw(f, f.area()).unwrap()).unwrap();
        let text = screen_text(&terminal);

        assert!(text.contains("New user"));
        assert!(text.contains("Full name *:"));
        assert!(text.contains("Phone:"));
        assert!(text.contains("Full name is required"));
        assert!(text.contains("Ctrl+S"));
    }
}
