use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use form_engine::{
    FieldDescriptor, FieldKind, FieldValue, Form, FormError, FormOptions, FormState,
    SubmitAttempt, SubmitOutcome,
};
use serde_json::Value as JsonValue;
use tracing::{debug, error};
use tui_input::{Input, backend::crossterm::EventHandler};

use super::{cycle_option, parse_input, render, toggle_member};
use crate::{
    action::{Action, SessionId},
    components::Component,
    screens::{self, Screen},
    store::Directory,
    theme::Theme,
    tui::{EventResponse, Frame},
};

/// Rows one field occupies: label/value, error or help, spacer.
pub(super) const FIELD_ROWS: u16 = 3;

/// Message shown above the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

pub struct FormPopup {
    session: SessionId,
    screen: &'static dyn Screen,
    dir: Arc<Directory>,
    form: Form,
    title: String,
    description: Option<String>,
    focused: usize,
    scroll: usize,
    /// Highlighted entry of a focused multiSelect.
    option_cursor: usize,
    editing: bool,
    input: Input,
    notice: Option<Notice>,
    /// Esc was pressed once on unsaved changes; a second Esc discards them.
    discard_armed: bool,
    last_inner_height: u16, // remembered from last render for page-size heuristics
    pub(super) theme: Theme,
}

impl FormPopup {
    /// Open the form of `screen` for `record` (`None` creates a new record).
    pub fn open(
        session: SessionId,
        screen: &'static dyn Screen,
        record: Option<&JsonValue>,
        dir: Arc<Directory>,
        options: FormOptions,
    ) -> Result<Self, FormError> {
        let form = screens::open_form(screen, record, &dir, options)?;
        let schema = screen.schema(form.state(), &dir);
        debug!(session, screen = %screen.kind(), fields = form.descriptors().len(), "form opened");
        let mut popup = Self {
            session,
            screen,
            dir,
            form,
            title: schema.title,
            description: schema.description,
            focused: 0,
            scroll: 0,
            option_cursor: 0,
            editing: false,
            input: Input::default(),
            notice: None,
            discard_armed: false,
            last_inner_height: 0,
            theme: Theme::default(),
        };
        popup.reset_option_cursor();
        Ok(popup)
    }

    /// Register the close notification handed to the engine.
    pub fn on_close(mut self, f: impl FnOnce(Option<&str>) + Send + 'static) -> Self {
        self.form = self.form.on_close(f);
        self
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn screen(&self) -> &'static dyn Screen {
        self.screen
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Close the form and hand back its final values.
    pub fn close(self, reason: Option<&str>) -> FormState {
        self.form.close(reason)
    }

    pub(super) fn title(&self) -> &str {
        &self.title
    }

    pub(super) fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(super) fn fields(&self) -> &[FieldDescriptor] {
        self.form.descriptors()
    }

    pub(super) fn field_count(&self) -> usize {
        self.form.descriptors().len()
    }

    pub(super) fn focused_index(&self) -> usize {
        self.focused
    }

    pub(super) fn scroll(&self) -> usize {
        self.scroll
    }

    pub(super) fn option_cursor(&self) -> usize {
        self.option_cursor
    }

    pub(super) fn is_editing(&self) -> bool {
        self.editing
    }

    pub(super) fn input(&self) -> &Input {
        &self.input
    }

    pub(super) fn set_last_inner_height(&mut self, h: u16) {
        self.last_inner_height = h;
    }

    fn reserved_rows(&self) -> u16 {
        let desc = self
            .description
            .as_deref()
            .map_or(0, |d| d.lines().count() as u16 + 1);
        desc + 4
    }

    /// Number of fields that fit into `inner_height`.
    pub(super) fn page_size(&self, inner_height: u16) -> usize {
        (inner_height.saturating_sub(self.reserved_rows()) / FIELD_ROWS).max(1) as usize
    }

    /// Compute visible window bounds for the field list.
    pub(super) fn visible_bounds(&self, inner_height: u16) -> (usize, usize) {
        let total = self.field_count();
        if total == 0 {
            return (0, 0);
        }
        let start = self.scroll.min(self.focused).min(total.saturating_sub(1));
        let end = (start + self.page_size(inner_height)).min(total);
        (start, end)
    }

    pub(super) fn ensure_visible(&mut self, inner_height: u16) {
        let page = self.page_size(inner_height);
        if self.focused < self.scroll {
            self.scroll = self.focused;
        } else if self.focused >= self.scroll + page {
            self.scroll = self.focused + 1 - page;
        }
    }

    fn current_field(&self) -> Option<&FieldDescriptor> {
        self.form.descriptors().get(self.focused)
    }

    fn focus_next(&mut self) {
        if self.field_count() == 0 {
            return;
        }
        self.focused = (self.focused + 1) % self.field_count();
        self.reset_option_cursor();
    }

    fn focus_prev(&mut self) {
        if self.field_count() == 0 {
            return;
        }
        self.focused = if self.focused == 0 {
            self.field_count() - 1
        } else {
            self.focused - 1
        };
        self.reset_option_cursor();
    }

    fn focus_id(&mut self, id: &str) {
        if let Some(idx) = self.fields().iter().position(|d| d.id == id) {
            self.focused = idx;
            self.reset_option_cursor();
        }
    }

    fn reset_option_cursor(&mut self) {
        self.option_cursor = self
            .current_field()
            .filter(|d| d.kind == FieldKind::MultiSelect)
            .and_then(|d| {
                let first = self.form.value(&d.id).as_multi()?.first()?;
                d.options.iter().position(|o| &o.value == first)
            })
            .unwrap_or(0);
    }

    /// Route a user edit through the engine, then let the screen re-render its fields.
    pub fn edit(&mut self, id: &str, value: FieldValue) {
        let Some(descriptor) = self.form.descriptor(id) else {
            return;
        };
        if descriptor.disabled {
            self.notice = Some(Notice::Info(format!("{} is read-only", descriptor.label)));
            return;
        }
        let value = descriptor.constraints.clamp(value);
        match self.form.edit(id, value) {
            Ok(()) => {
                self.notice = None;
                let focused = self.current_field().map(|d| d.id.clone());
                screens::sync_descriptors(&mut self.form, self.screen, &self.dir);
                match focused {
                    Some(f) if self.fields().iter().any(|d| d.id == f) => self.focus_id(&f),
                    _ => self.focused = self.focused.min(self.field_count().saturating_sub(1)),
                }
            }
            Err(FormError::Busy) => {
                self.notice = Some(Notice::Info("Saving… please wait".into()));
            }
            Err(e) => {
                error!(field = id, error = %e, "edit rejected");
                self.notice = Some(Notice::Error(format!("Edit rejected: {e}")));
            }
        }
    }

    fn start_editing(&mut self) {
        let Some(field) = self.current_field() else {
            return;
        };
        if field.disabled {
            let msg = format!("{} is read-only", field.label);
            self.notice = Some(Notice::Info(msg));
            return;
        }
        let current = self.form.value(&field.id).to_plain_string();
        if self.form.is_submitting() {
            self.notice = Some(Notice::Info("Saving… please wait".into()));
            return;
        }
        self.input = Input::new(current);
        self.editing = true;
    }

    fn cancel_editing(&mut self) {
        self.editing = false;
        self.input.reset();
    }

    /// Convert the editor text; invalid text keeps the editor open.
    fn commit_editing(&mut self) {
        let Some(field) = self.current_field() else {
            self.cancel_editing();
            return;
        };
        match parse_input(&field.kind, self.input.value()) {
            Ok(value) => {
                let id = field.id.clone();
                self.cancel_editing();
                self.edit(&id, value);
            }
            Err(msg) => self.notice = Some(Notice::Error(msg)),
        }
    }

    /// Left/Right/Space on a non-text control.
    fn operate(&mut self, key: KeyCode) -> bool {
        let Some(field) = self.current_field().cloned() else {
            return false;
        };
        let id = field.id.clone();
        let current = self.form.value(&id).clone();
        let step = if key == KeyCode::Left { -1 } else { 1 };
        let next = match &field.kind {
            k if k.is_toggle() => FieldValue::Bool(!current.as_bool().unwrap_or(false)),
            FieldKind::Select | FieldKind::Radio => cycle_option(&field, &current, step),
            FieldKind::MultiSelect if key == KeyCode::Char(' ') => {
                let Some(option) = field.options.get(self.option_cursor) else {
                    return true;
                };
                toggle_member(&field, &current, &option.value)
            }
            FieldKind::MultiSelect => {
                let len = field.options.len();
                if len > 0 {
                    self.option_cursor = (self.option_cursor as i32 + step).rem_euclid(len as i32) as usize;
                }
                return true;
            }
            _ => return false,
        };
        self.edit(&id, next);
        true
    }

    fn clear_current(&mut self) {
        if let Some(field) = self.current_field() {
            let id = field.id.clone();
            let empty = field.kind.empty_value();
            self.edit(&id, empty);
        }
    }

    fn reset(&mut self) {
        match self.form.reset() {
            Ok(()) => {
                screens::sync_descriptors(&mut self.form, self.screen, &self.dir);
                self.focused = 0;
                self.scroll = 0;
                self.reset_option_cursor();
                self.notice = Some(Notice::Info("Changes discarded".into()));
            }
            Err(e) => self.notice = Some(Notice::Info(format!("Cannot reset: {e}"))),
        }
    }

    /// Start a submit; valid values leave as a `SubmitForm` action for the app to run.
    fn submit(&mut self) -> Option<Action> {
        match self.form.begin_submit() {
            SubmitAttempt::Started(values) => {
                self.notice = Some(Notice::Info("Saving…".into()));
                Some(Action::SubmitForm {
                    session: self.session,
                    screen: self.screen.kind(),
                    record: self.screen.to_record(&values),
                })
            }
            SubmitAttempt::Blocked(errors) => {
                if let Some(first) = self
                    .fields()
                    .iter()
                    .find(|d| errors.contains(&d.id))
                    .map(|d| d.id.clone())
                {
                    self.focus_id(&first);
                }
                self.notice = Some(Notice::Error(match errors.len() {
                    1 => "1 field needs attention".to_string(),
                    n => format!("{n} fields need attention"),
                }));
                None
            }
            SubmitAttempt::Ignored => {
                debug!(session = self.session, "submit ignored, already saving");
                None
            }
        }
    }

    /// Result of the store call started by [`Self::submit`].
    pub fn finish_submit(&mut self, result: Result<JsonValue, String>) -> Option<Action> {
        match self.form.complete_submit(result) {
            SubmitOutcome::Succeeded(record) => {
                let label = self.screen.label(&record, &self.dir);
                Some(Action::CloseForm {
                    session: self.session,
                    reason: Some(format!("Saved {label}")),
                })
            }
            SubmitOutcome::Failed(msg) => {
                self.notice = Some(Notice::Error(format!("Save failed: {msg}")));
                None
            }
            _ => None,
        }
    }
}

impl Component for FormPopup {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<EventResponse<Action>>> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if self.editing {
            match key.code {
                KeyCode::Enter => self.commit_editing(),
                KeyCode::Esc => self.cancel_editing(),
                KeyCode::Char('s') if ctrl => {
                    self.commit_editing();
                    if !self.editing {
                        return Ok(Some(EventResponse::Stop(Action::Submit)));
                    }
                }
                _ => {
                    self.input.handle_event(&crossterm::event::Event::Key(key));
                }
            }
            return Ok(Some(EventResponse::Stop(Action::Update)));
        }

        let discard_armed = std::mem::take(&mut self.discard_armed);
        let action = match key.code {
            KeyCode::Char('s') if ctrl => Action::Submit,
            KeyCode::Char('r') if ctrl => {
                self.reset();
                Action::Update
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.focus_prev();
                Action::Update
            }
            KeyCode::Down | KeyCode::Tab => {
                self.focus_next();
                Action::Update
            }
            KeyCode::PageDown | KeyCode::PageUp => {
                let jump = self.page_size(self.last_inner_height).saturating_sub(1).max(1);
                for _ in 0..jump {
                    if key.code == KeyCode::PageDown {
                        self.focus_next();
                    } else {
                        self.focus_prev();
                    }
                }
                Action::Update
            }
            KeyCode::Home => {
                self.focused = 0;
                self.reset_option_cursor();
                Action::Update
            }
            KeyCode::End => {
                self.focused = self.field_count().saturating_sub(1);
                self.reset_option_cursor();
                Action::Update
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => {
                if !self.operate(key.code) {
                    return Ok(None);
                }
                Action::Update
            }
            KeyCode::Delete | KeyCode::Backspace => {
                self.clear_current();
                Action::Update
            }
            KeyCode::Enter => {
                if self.current_field().is_some_and(|f| f.kind.is_textual()) {
                    self.start_editing();
                    Action::Update
                } else {
                    Action::Submit
                }
            }
            KeyCode::Esc if self.form.is_dirty() && !discard_armed => {
                self.discard_armed = true;
                self.notice = Some(Notice::Info(
                    "Unsaved changes: press Esc again to discard".into(),
                ));
                Action::Update
            }
            KeyCode::Esc => Action::CloseForm {
                session: self.session,
                reason: None,
            },
            _ => return Ok(None),
        };
        Ok(Some(EventResponse::Stop(action)))
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::Submit => Ok(self.submit()),
            Action::SubmitFinished {
                session, result, ..
            } if session == self.session => Ok(self.finish_submit(result)),
            Action::Loaded(dir) => {
                self.dir = Arc::new(dir);
                screens::sync_descriptors(&mut self.form, self.screen, &self.dir);
                self.focused = self.focused.min(self.field_count().saturating_sub(1));
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: ratatui::layout::Rect) -> Result<()> {
        render::render_form_popup(self, f, area).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::ScreenKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(popup: &mut FormPopup, text: &str) {
        popup.handle_key_events(key(KeyCode::Enter)).unwrap();
        for c in text.chars() {
            popup.handle_key_events(key(KeyCode::Char(c))).unwrap();
        }
        popup.handle_key_events(key(KeyCode::Enter)).unwrap();
    }

    fn focus(popup: &mut FormPopup, id: &str) {
        popup.focus_id(id);
        assert_eq!(popup.current_field().map(|d| d.id.as_str()), Some(id));
    }

    fn users_popup() -> FormPopup {
        FormPopup::open(
            7,
            ScreenKind::Users.screen(),
            None,
            Arc::new(Directory::default()),
            FormOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn scrollbar_pages_follow_focus() {
        let mut popup = users_popup();
        popup.focused = popup.field_count() - 1;
        popup.ensure_visible(10);
        let (start, end) = popup.visible_bounds(10);
        assert_eq!(end, popup.field_count());
        assert_eq!(end - start, popup.page_size(10));
    }

    #[test]
    fn typed_text_reaches_the_engine() {
        let mut popup = users_popup();
        focus(&mut popup, "name");
        type_text(&mut popup, "Ana");
        assert_eq!(popup.form().value("name"), &FieldValue::from("Ana"));
        assert!(!popup.is_editing());
    }

    #[test]
    fn choosing_teacher_reveals_instruments() {
        let mut popup = users_popup();
        focus(&mut popup, "role");
        // admin -> teacher
        popup.handle_key_events(key(KeyCode::Right)).unwrap();
        popup.handle_key_events(key(KeyCode::Right)).unwrap();
        assert_eq!(popup.form().value("role"), &FieldValue::from("teacher"));
        assert!(popup.fields().iter().any(|d| d.id == "instruments"));
        assert_eq!(popup.current_field().map(|d| d.id.as_str()), Some("role"));
    }

    #[test]
    fn multiselect_space_toggles_the_highlighted_option() {
        let mut popup = users_popup();
        focus(&mut popup, "role");
        popup.edit("role", "teacher".into());
        focus(&mut popup, "instruments");
        popup.handle_key_events(key(KeyCode::Right)).unwrap();
        popup.handle_key_events(key(KeyCode::Char(' '))).unwrap();
        let second = popup.current_field().unwrap().options[1].value.clone();
        assert_eq!(
            popup.form().value("instruments"),
            &FieldValue::Multi(vec![second])
        );
    }

    #[test]
    fn submit_of_empty_form_focuses_first_error() {
        let mut popup = users_popup();
        focus(&mut popup, "active");
        let out = popup.handle_key_events(ctrl('s')).unwrap();
        assert_eq!(out, Some(EventResponse::Stop(Action::Submit)));
        assert_eq!(popup.update(Action::Submit).unwrap(), None);
        assert_eq!(popup.current_field().map(|d| d.id.as_str()), Some("name"));
        assert!(matches!(popup.notice(), Some(Notice::Error(_))));
    }

    fn valid_admin(popup: &mut FormPopup) {
        popup.edit("name", "Ana Costa".into());
        popup.edit("email", "ana@mail.org".into());
        popup.edit("role", "admin".into());
        popup.edit("password", "Abc12345".into());
        popup.edit("confirmPassword", "Abc12345".into());
    }

    #[test]
    fn submit_hands_out_a_record_and_guards_repeats() {
        let mut popup = users_popup();
        valid_admin(&mut popup);
        let Some(Action::SubmitForm {
            session, record, ..
        }) = popup.update(Action::Submit).unwrap()
        else {
            panic!("submit did not start");
        };
        assert_eq!(session, 7);
        assert_eq!(record["email"], json!("ana@mail.org"));
        assert!(record.get("password").is_none());

        // second submit while saving is dropped, edits are refused
        assert_eq!(popup.update(Action::Submit).unwrap(), None);
        popup.edit("name", "Other".into());
        assert_eq!(popup.form().value("name"), &FieldValue::from("Ana Costa"));
    }

    #[test]
    fn failed_save_keeps_values_and_reports() {
        let mut popup = users_popup();
        valid_admin(&mut popup);
        popup.update(Action::Submit).unwrap();
        let out = popup
            .update(Action::SubmitFinished {
                session: 7,
                screen: ScreenKind::Users,
                result: Err("e-mail already in use".into()),
            })
            .unwrap();
        assert_eq!(out, None);
        assert_eq!(
            popup.notice(),
            Some(&Notice::Error("Save failed: e-mail already in use".into()))
        );
        assert_eq!(popup.form().value("name"), &FieldValue::from("Ana Costa"));
        assert!(!popup.form().is_submitting());
    }

    #[test]
    fn results_for_other_sessions_are_ignored() {
        let mut popup = users_popup();
        valid_admin(&mut popup);
        popup.update(Action::Submit).unwrap();
        let out = popup
            .update(Action::SubmitFinished {
                session: 3,
                screen: ScreenKind::Users,
                result: Ok(json!({})),
            })
            .unwrap();
        assert_eq!(out, None);
        assert!(popup.form().is_submitting());
    }

    #[test]
    fn edits_while_saving_are_refused() {
        let mut popup = users_popup();
        valid_admin(&mut popup);
        popup.update(Action::Submit).unwrap();
        popup.edit("name", "Someone else".into());
        assert_eq!(popup.notice(), Some(&Notice::Info("Saving… please wait".into())));

        popup
            .update(Action::SubmitFinished {
                session: 7,
                screen: ScreenKind::Users,
                result: Err("store offline".into()),
            })
            .unwrap();
        assert_eq!(popup.form().value("name"), &FieldValue::from("Ana Costa"));
    }

    #[test]
    fn escape_on_unsaved_changes_needs_confirmation() {
        let mut popup = users_popup();
        popup.edit("name", "Ana".into());
        let out = popup.handle_key_events(key(KeyCode::Esc)).unwrap();
        assert_eq!(out, Some(EventResponse::Stop(Action::Update)));
        assert_eq!(
            popup.notice(),
            Some(&Notice::Info("Unsaved changes: press Esc again to discard".into()))
        );

        // Any other key disarms the confirmation.
        popup.handle_key_events(key(KeyCode::Down)).unwrap();
        let out = popup.handle_key_events(key(KeyCode::Esc)).unwrap();
        assert_eq!(out, Some(EventResponse::Stop(Action::Update)));

        let out = popup.handle_key_events(key(KeyCode::Esc)).unwrap();
        assert_eq!(
            out,
            Some(EventResponse::Stop(Action::CloseForm {
                session: 7,
                reason: None
            }))
        );
    }

    #[test]
    fn disabled_fields_refuse_edits() {
        let mut popup = FormPopup::open(
            1,
            ScreenKind::Enrollments.screen(),
            None,
            Arc::new(Directory::default()),
            FormOptions::default(),
        )
        .unwrap();
        popup.edit("total", FieldValue::Num(1.0));
        assert!(popup.form().value("total").is_empty());
        assert_eq!(
            popup.notice(),
            Some(&Notice::Info("Monthly fee is read-only".into()))
        );
    }

    #[test]
    fn bad_numbers_keep_the_editor_open() {
        let mut popup = FormPopup::open(
            1,
            ScreenKind::Enrollments.screen(),
            None,
            Arc::new(Directory::default()),
            FormOptions::default(),
        )
        .unwrap();
        focus(&mut popup, "discount");
        popup.handle_key_events(key(KeyCode::Enter)).unwrap();
        popup.handle_key_events(key(KeyCode::Char('x'))).unwrap();
        popup.handle_key_events(key(KeyCode::Enter)).unwrap();
        assert!(popup.is_editing());
        assert_eq!(popup.notice(), Some(&Notice::Error("Not a number".into())));

        popup.handle_key_events(key(KeyCode::Backspace)).unwrap();
        for c in "250".chars() {
            popup.handle_key_events(key(KeyCode::Char(c))).unwrap();
        }
        popup.handle_key_events(key(KeyCode::Enter)).unwrap();
        // clamped to the 0..100 range
        assert_eq!(popup.form().value("discount"), &FieldValue::Num(100.0));
    }

    #[test]
    fn escape_asks_the_app_to_close() {
        let mut popup = users_popup();
        let out = popup.handle_key_events(key(KeyCode::Esc)).unwrap();
        assert_eq!(
            out,
            Some(EventResponse::Stop(Action::CloseForm {
                session: 7,
                reason: None
            }))
        );
    }
}
