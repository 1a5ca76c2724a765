use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    prelude::Frame,
};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::{
    action::{Action, SessionId},
    components::{
        Component, detail::DetailPopup, form_popup::FormPopup, list::RecordList,
        popup::render_backdrop, status_bar::StatusBar,
    },
    config::Config,
    screens::ScreenKind,
    store::{Directory, Store},
    tui::{Event, EventResponse, Tui},
};

/// What sits on top of the record list.
pub enum Overlay {
    Form(FormPopup),
    Detail(DetailPopup),
}

impl Overlay {
    fn component(&mut self) -> &mut dyn Component {
        match self {
            Overlay::Form(p) => p,
            Overlay::Detail(p) => p,
        }
    }
}

pub struct App {
    pub config: Config,
    store: Arc<Store>,
    dir: Arc<Directory>,
    screen: ScreenKind,
    list: RecordList,
    status: StatusBar,
    overlay: Option<Overlay>,
    next_session: SessionId,
    pub should_quit: bool,
    pub should_suspend: bool,
}

impl App {
    pub fn new(config: Config, store: Arc<Store>, screen: ScreenKind) -> Self {
        Self {
            config,
            store,
            dir: Arc::new(Directory::default()),
            screen,
            list: RecordList::new(screen),
            status: StatusBar::new(screen),
            overlay: None,
            next_session: 1,
            should_quit: false,
            should_suspend: false,
        }
    }

    pub fn screen(&self) -> ScreenKind {
        self.screen
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn form(&self) -> Option<&FormPopup> {
        match &self.overlay {
            Some(Overlay::Form(p)) => Some(p),
            _ => None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

        let mut tui = Tui::new()?
            .tick_rate(self.config.ui.tick_rate)
            .frame_rate(self.config.ui.frame_rate);
        tui.enter()?;
        action_tx.send(Action::Refresh)?;

        loop {
            if let Some(e) = tui.next().await {
                self.handle_event(e, &action_tx)?;
            }

            while let Ok(action) = action_rx.try_recv() {
                match action {
                    Action::Render => self.draw(&mut tui, &action_tx)?,
                    Action::Resize(w, h) => {
                        tui.resize(Rect::new(0, 0, w, h))?;
                        self.draw(&mut tui, &action_tx)?;
                    }
                    action => self.handle_action(action, &action_tx)?,
                }
            }

            if self.should_suspend {
                tui.suspend()?;
                action_tx.send(Action::Resume)?;
                tui = Tui::new()?
                    .tick_rate(self.config.ui.tick_rate)
                    .frame_rate(self.config.ui.frame_rate);
                tui.enter()?;
            } else if self.should_quit {
                tui.stop()?;
                break;
            }
        }
        tui.exit()?;
        Ok(())
    }

    /// Route one terminal event: the overlay sees it first, then the list.
    pub fn handle_event(&mut self, e: Event, tx: &UnboundedSender<Action>) -> Result<()> {
        let mut stop_event_propagation = match self.overlay.as_mut() {
            Some(overlay) => send_response(overlay.component().handle_events(e.clone())?, tx)?,
            None => false,
        };
        // Keys never fall through an open popup to the list below.
        stop_event_propagation = stop_event_propagation
            || (self.overlay.is_none() && send_response(self.list.handle_events(e.clone())?, tx)?);

        if !stop_event_propagation {
            match e {
                Event::Quit => tx.send(Action::Quit)?,
                Event::Tick => tx.send(Action::Tick)?,
                Event::Render => tx.send(Action::Render)?,
                Event::Resize(x, y) => tx.send(Action::Resize(x, y))?,
                Event::Key(key) if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    match key.code {
                        KeyCode::Char('c') => tx.send(Action::Quit)?,
                        KeyCode::Char('z') => tx.send(Action::Suspend)?,
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Everything except drawing.
    pub fn handle_action(&mut self, action: Action, tx: &UnboundedSender<Action>) -> Result<()> {
        if action != Action::Tick && action != Action::Render {
            debug!(%action, "action");
        }
        match &action {
            Action::Quit => self.should_quit = true,
            Action::Suspend => self.should_suspend = true,
            Action::Resume => self.should_suspend = false,
            Action::Refresh => self.refresh(tx),
            Action::Loaded(dir) => self.dir = Arc::new(dir.clone()),
            Action::NextScreen if self.overlay.is_none() => {
                tx.send(Action::SelectScreen(self.screen.next()))?
            }
            Action::PrevScreen if self.overlay.is_none() => {
                tx.send(Action::SelectScreen(self.screen.prev()))?
            }
            Action::SelectScreen(kind) => self.screen = *kind,
            Action::OpenForm(id) => self.open_form(id.as_deref(), tx)?,
            Action::OpenDetail(id) => self.open_detail(id, tx)?,
            Action::ClosePopup => {
                if matches!(self.overlay, Some(Overlay::Detail(_))) {
                    self.overlay = None;
                }
            }
            Action::CloseForm { session, reason } => self.close_form(*session, reason.as_deref()),
            Action::SubmitForm {
                session,
                screen,
                record,
            } => self.spawn_save(*session, *screen, record.clone(), tx),
            Action::SubmitFinished {
                session, result, ..
            } => {
                if self.form().map(FormPopup::session) != Some(*session) {
                    // The popup that asked for this save is gone; the store has the
                    // record either way.
                    debug!(session, ok = result.is_ok(), "late submit result ignored");
                    if result.is_ok() {
                        tx.send(Action::Refresh)?;
                    }
                }
            }
            Action::Error(msg) => error!(%msg, "reported error"),
            _ => {}
        }

        if let Some(overlay) = self.overlay.as_mut() {
            if let Some(next) = overlay.component().update(action.clone())? {
                tx.send(next)?;
            }
        }
        if let Some(next) = self.list.update(action.clone())? {
            tx.send(next)?;
        }
        if let Some(next) = self.status.update(action)? {
            tx.send(next)?;
        }
        Ok(())
    }

    fn refresh(&self, tx: &UnboundedSender<Action>) {
        let store = Arc::clone(&self.store);
        let tx = tx.clone();
        tokio::spawn(async move {
            let dir = store.snapshot().await;
            let _ = tx.send(Action::Loaded(dir));
        });
    }

    /// The submit callback: runs on the runtime, reports back by session id.
    fn spawn_save(
        &self,
        session: SessionId,
        screen: ScreenKind,
        record: serde_json::Value,
        tx: &UnboundedSender<Action>,
    ) {
        let store = Arc::clone(&self.store);
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = store.save(screen, record).await.map_err(|e| e.to_string());
            if let Err(e) = &result {
                warn!(session, %screen, error = %e, "save rejected");
            }
            let _ = tx.send(Action::SubmitFinished {
                session,
                screen,
                result,
            });
        });
    }

    fn open_form(&mut self, id: Option<&str>, tx: &UnboundedSender<Action>) -> Result<()> {
        let record = match id {
            Some(id) => match self.dir.find(self.screen, id) {
                Some(r) => Some(r.clone()),
                None => {
                    tx.send(Action::Error(format!("No record {id}")))?;
                    return Ok(());
                }
            },
            None => None,
        };
        let session = self.next_session;
        self.next_session += 1;
        let screen = self.screen.screen();
        let on_close_tx = tx.clone();
        let popup = FormPopup::open(
            session,
            screen,
            record.as_ref(),
            Arc::clone(&self.dir),
            self.config.form_options(),
        );
        match popup {
            Ok(popup) => {
                info!(session, screen = %self.screen, id = id.unwrap_or("new"), "form opened");
                let popup = popup.on_close(move |reason| {
                    if let Some(reason) = reason {
                        let _ = on_close_tx.send(Action::Notify(reason.to_string()));
                        let _ = on_close_tx.send(Action::Refresh);
                    }
                });
                self.overlay = Some(Overlay::Form(popup));
            }
            Err(e) => {
                error!(error = %e, "form could not be opened");
                tx.send(Action::Error(format!("Cannot open form: {e}")))?;
            }
        }
        Ok(())
    }

    fn open_detail(&mut self, id: &str, tx: &UnboundedSender<Action>) -> Result<()> {
        match self.dir.find(self.screen, id) {
            Some(record) => {
                let popup =
                    DetailPopup::new(self.screen.screen(), record.clone(), Arc::clone(&self.dir));
                self.overlay = Some(Overlay::Detail(popup));
            }
            None => tx.send(Action::Error(format!("No record {id}")))?,
        }
        Ok(())
    }

    fn close_form(&mut self, session: SessionId, reason: Option<&str>) {
        match self.overlay.take() {
            Some(Overlay::Form(popup)) if popup.session() == session => {
                if popup.form().is_submitting() {
                    debug!(session, "form closed while saving");
                }
                popup.close(reason);
            }
            other => self.overlay = other,
        }
    }

    fn draw(&mut self, tui: &mut Tui, tx: &UnboundedSender<Action>) -> Result<()> {
        tui.draw(|f| {
            if let Err(err) = self.render(f) {
                let _ = tx.send(Action::Error(format!("Failed to draw: {err:?}")));
            }
        })?;
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        let [main, footer] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(frame.area());
        self.list.draw(frame, main)?;
        self.status.draw(frame, footer)?;
        if let Some(overlay) = self.overlay.as_mut() {
            render_backdrop(frame, main);
            overlay.component().draw(frame, main)?;
        }
        Ok(())
    }
}

fn send_response(
    response: Option<EventResponse<Action>>,
    tx: &UnboundedSender<Action>,
) -> Result<bool> {
    Ok(match response {
        Some(EventResponse::Continue(action)) => {
            tx.send(action)?;
            false
        }
        Some(EventResponse::Stop(action)) => {
            tx.send(action)?;
            true
        }
        None => false,
    })
}
