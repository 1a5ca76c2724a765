use std::time::{Duration, Instant};

use color_eyre::Result;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};
use strum::IntoEnumIterator;

use crate::{
    action::Action,
    components::Component,
    screens::ScreenKind,
    theme::{Theme, UiGroup},
    tui::Frame,
};

const MESSAGE_TTL: Duration = Duration::from_secs(6);

/// Bottom bar: screen tabs on the left, the latest notification on the right.
pub struct StatusBar {
    current: ScreenKind,
    message: Option<(String, bool, Instant)>,
    theme: Theme,
}

impl StatusBar {
    pub fn new(current: ScreenKind) -> Self {
        Self {
            current,
            message: None,
            theme: Theme::default(),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|(m, ..)| m.as_str())
    }

    fn tabs(&self) -> Line<'static> {
        let mut spans = Vec::new();
        for kind in ScreenKind::iter() {
            let style = if kind == self.current {
                self.theme.style(UiGroup::Focused)
            } else {
                self.theme.style(UiGroup::Dimmed)
            };
            spans.push(Span::styled(format!(" {} ", kind.title()), style));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            " Tab: Screen  n: New  e: Edit  Enter: View  q: Quit",
            self.theme.style(UiGroup::Dimmed),
        ));
        Line::from(spans)
    }
}

impl Component for StatusBar {
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::SelectScreen(kind) => self.current = kind,
            Action::Notify(msg) => self.message = Some((msg, false, Instant::now())),
            Action::Error(msg) => self.message = Some((msg, true, Instant::now())),
            Action::Tick => {
                if self
                    .message
                    .as_ref()
                    .is_some_and(|(_, _, at)| at.elapsed() > MESSAGE_TTL)
                {
                    self.message = None;
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let [left, right] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Percentage(35)]).areas(area);
        f.render_widget(Paragraph::new(self.tabs()), left);
        if let Some((msg, error, _)) = &self.message {
            let group = if *error { UiGroup::Error } else { UiGroup::Success };
            let line = Line::from(Span::styled(msg.clone(), self.theme.style(group)))
                .right_aligned();
            f.render_widget(Paragraph::new(line), right);
        }
        Ok(())
    }
}
