use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use strum::Display;

use crate::screens::ScreenKind;
use crate::store::Directory;

/// Identifies one opened form popup; submit results for a closed popup carry a stale id.
pub type SessionId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Display, Deserialize)]
pub enum Action {
    Tick,
    Render,
    Resize(u16, u16),
    Suspend,
    Resume,
    Quit,
    Refresh,
    Error(String),
    /// Transient message for the status bar.
    Notify(String),
    Update,
    Up,
    Down,
    Submit,
    NextScreen,
    PrevScreen,
    SelectScreen(ScreenKind),
    /// Open the form for a record id, or for a new record.
    OpenForm(Option<String>),
    OpenDetail(String),
    ClosePopup,
    /// Form closed by the user or after a successful submit.
    CloseForm {
        session: SessionId,
        reason: Option<String>,
    },
    /// Validated values ready to be sent to the store.
    SubmitForm {
        session: SessionId,
        screen: ScreenKind,
        record: JsonValue,
    },
    SubmitFinished {
        session: SessionId,
        screen: ScreenKind,
        result: Result<JsonValue, String>,
    },
    Loaded(Directory),
}
