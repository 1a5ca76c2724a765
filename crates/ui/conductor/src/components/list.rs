use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use form_engine::{FormState, display};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
};
use serde_json::Value as JsonValue;

use crate::{
    action::Action,
    components::Component,
    screens::{self, ScreenKind},
    store::Directory,
    theme::{Theme, UiGroup},
    tui::{EventResponse, Frame},
};

/// Record table of the current screen.
pub struct RecordList {
    kind: ScreenKind,
    dir: Arc<Directory>,
    state: TableState,
    loading: bool,
    theme: Theme,
}

impl RecordList {
    pub fn new(kind: ScreenKind) -> Self {
        Self {
            kind,
            dir: Arc::new(Directory::default()),
            state: TableState::default(),
            loading: true,
            theme: Theme::default(),
        }
    }

    pub fn kind(&self) -> ScreenKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: ScreenKind) {
        if kind != self.kind {
            self.kind = kind;
            self.state.select(self.first_row());
        }
    }

    pub fn set_directory(&mut self, dir: Arc<Directory>) {
        self.dir = dir;
        self.loading = false;
        let len = self.records().len();
        match self.state.selected() {
            Some(i) if i < len => {}
            Some(_) if len > 0 => self.state.select(Some(len - 1)),
            _ => self.state.select(self.first_row()),
        }
    }

    fn first_row(&self) -> Option<usize> {
        (!self.records().is_empty()).then_some(0)
    }

    pub fn records(&self) -> &[JsonValue] {
        self.dir.records(self.kind)
    }

    pub fn selected(&self) -> Option<&JsonValue> {
        self.state.selected().and_then(|i| self.records().get(i))
    }

    pub fn selected_id(&self) -> Option<String> {
        self.selected()
            .map(|r| screens::text(r, "id").to_string())
            .filter(|id| !id.is_empty())
    }

    fn select_up(&mut self) {
        let i = self.state.selected().unwrap_or(0);
        self.state.select(self.first_row().map(|_| i.saturating_sub(1)));
    }

    fn select_down(&mut self) {
        let max = self.records().len().saturating_sub(1);
        let i = self.state.selected().map_or(0, |i| (i + 1).min(max));
        self.state.select(self.first_row().map(|_| i));
    }

    /// Cell texts of `record`, formatted through the screen's own field descriptors.
    pub fn cells(&self, record: &JsonValue) -> Vec<String> {
        let screen = self.kind.screen();
        let values = FormState::from_json(record).unwrap_or_default();
        let descriptors = screen.descriptors(&values, &self.dir);
        screen
            .columns()
            .iter()
            .map(|col| match descriptors.iter().find(|d| d.id == col.field) {
                Some(d) => display::format_value(d, values.value(col.field)),
                None => values.value(col.field).to_plain_string(),
            })
            .collect()
    }
}

impl Component for RecordList {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<EventResponse<Action>>> {
        let action = match key.code {
            KeyCode::Up | KeyCode::Char('k') => Action::Up,
            KeyCode::Down | KeyCode::Char('j') => Action::Down,
            KeyCode::Tab => Action::NextScreen,
            KeyCode::BackTab => Action::PrevScreen,
            KeyCode::Char('n') => Action::OpenForm(None),
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('e') => match self.selected_id() {
                Some(id) => Action::OpenForm(Some(id)),
                None => return Ok(None),
            },
            KeyCode::Enter => match self.selected_id() {
                Some(id) => Action::OpenDetail(id),
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(EventResponse::Stop(action)))
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::Up => self.select_up(),
            Action::Down => self.select_down(),
            Action::Loaded(dir) => self.set_directory(Arc::new(dir)),
            Action::SelectScreen(kind) => self.set_kind(kind),
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let screen = self.kind.screen();
        let columns = screen.columns();
        let badges = self.records().iter().any(|r| screen.badge(r).is_some());

        let mut header: Vec<Cell> = columns.iter().map(|c| Cell::from(c.header)).collect();
        let mut widths: Vec<Constraint> = columns.iter().map(|c| Constraint::Length(c.width)).collect();
        if badges {
            header.push(Cell::from("Status"));
            widths.push(Constraint::Min(12));
        }

        let rows: Vec<Row> = self
            .records()
            .iter()
            .map(|record| {
                let mut cells: Vec<Cell> = self.cells(record).into_iter().map(Cell::from).collect();
                if badges {
                    let badge = screen
                        .badge(record)
                        .map(|m| Line::from(self.theme.badge(&m)))
                        .unwrap_or_default();
                    cells.push(Cell::from(badge));
                }
                Row::new(cells)
            })
            .collect();

        let title = if self.loading {
            format!(" {} (loading…) ", self.kind.title())
        } else {
            format!(" {} ({}) ", self.kind.title(), self.records().len())
        };
        let table = Table::new(rows, widths)
            .header(Row::new(header).style(self.theme.style(UiGroup::Title)))
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(self.theme.style(UiGroup::Border)),
            )
            .row_highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

        f.render_stateful_widget(table, area, &mut self.state);
        Ok(())
    }
}
