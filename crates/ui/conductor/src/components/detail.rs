use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use form_engine::{FormState, display};
use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};
use serde_json::Value as JsonValue;

use crate::{
    action::Action,
    components::{
        Component,
        popup::{centered_rect_fixed, draw_popup_frame},
    },
    screens::{self, Screen},
    store::Directory,
    theme::{Theme, UiGroup},
    tui::{EventResponse, Frame},
};

/// Read-only view of one record, formatted the way its form shows it.
pub struct DetailPopup {
    screen: &'static dyn Screen,
    record: JsonValue,
    dir: Arc<Directory>,
    theme: Theme,
}

impl DetailPopup {
    pub fn new(screen: &'static dyn Screen, record: JsonValue, dir: Arc<Directory>) -> Self {
        Self {
            screen,
            record,
            dir,
            theme: Theme::default(),
        }
    }

    pub fn record_id(&self) -> &str {
        screens::text(&self.record, "id")
    }

    /// `(label, formatted value)` rows for every field the form would show.
    pub fn rows(&self) -> Vec<(String, String)> {
        let Ok(values) = FormState::from_json(&self.record) else {
            return Vec::new();
        };
        self.screen
            .descriptors(&values, &self.dir)
            .iter()
            .filter(|d| d.kind != form_engine::FieldKind::Password)
            .map(|d| (d.label.clone(), display::format_value(d, values.value(&d.id))))
            .collect()
    }
}

impl Component for DetailPopup {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<EventResponse<Action>>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => Action::ClosePopup,
            KeyCode::Char('e') => Action::OpenForm(Some(self.record_id().to_string())),
            _ => return Ok(None),
        };
        Ok(Some(EventResponse::Stop(action)))
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        if area.width < 5 || area.height < 5 {
            return Ok(());
        }
        let rows = self.rows();
        let height = (rows.len() as u16).saturating_add(6);
        let dialog = centered_rect_fixed(area, 70, height);
        let title = self.screen.label(&self.record, &self.dir);
        let inner = draw_popup_frame(f, dialog, &title);

        let mut lines = Vec::with_capacity(rows.len() + 4);
        if let Some(meta) = self.screen.badge(&self.record) {
            lines.push(Line::from(self.theme.badge(&meta)));
            lines.push(Line::raw(""));
        }
        let width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
        for (label, value) in rows {
            let value = if value.is_empty() { "—".to_string() } else { value };
            lines.push(Line::from(vec![
                Span::styled(format!("{label:<width$}  "), self.theme.style(UiGroup::Label)),
                Span::styled(value, self.theme.style(UiGroup::Value)),
            ]));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "e: Edit   Esc: Close",
            self.theme.style(UiGroup::Dimmed),
        )));
        f.render_widget(Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }), inner);
        Ok(())
    }
}
