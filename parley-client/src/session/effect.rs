//! Effects requested by the session controller
//!
//! The controller never touches the transport, the upload job or the screen
//! directly. It returns [`Effect`]s; the app executes transport effects and
//! hands the rest to a [`Presenter`].

use std::path::PathBuf;
use std::time::Duration;

use crate::render::TimelineEntry;

/// Identifies one shown status so its timer can clear exactly that status
pub type StatusId = u64;

/// Severity of a transient status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// A status line that may clear itself after a delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientStatus {
    pub id: StatusId,
    pub text: String,
    pub level: StatusLevel,
    /// `None` keeps the status until it is replaced
    pub clear_after: Option<Duration>,
}

/// Enabled state of the user controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub send_enabled: bool,
    pub upload_enabled: bool,
    pub cancel_visible: bool,
}

impl Controls {
    /// Everything disabled, as before the connection is established
    pub const LOCKED: Controls = Controls {
        send_enabled: false,
        upload_enabled: false,
        cancel_visible: false,
    };
}

/// A side effect the controller asks for
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a text frame over the chat channel
    Send(String),
    /// Begin uploading a file
    StartUpload(PathBuf),
    /// Append an entry to the timeline
    Append(TimelineEntry),
    /// Reveal the newest timeline entry
    ScrollToLatest,
    /// Update the enabled state of the controls
    SetControls(Controls),
    /// Show a transient status
    ShowStatus(TransientStatus),
    /// Remove the current status
    ClearStatus,
}

/// Rendering surface the controller's presentation effects are applied to
pub trait Presenter {
    fn append_entry(&mut self, entry: TimelineEntry);

    fn scroll_to_latest(&mut self) {}

    fn set_controls(&mut self, controls: Controls);

    fn show_status(&mut self, status: &TransientStatus);

    fn clear_status(&mut self);

    /// Apply a presentation effect; transport effects are handed back
    fn present(&mut self, effect: Effect) -> Option<Effect> {
        match effect {
            Effect::Append(entry) => self.append_entry(entry),
            Effect::ScrollToLatest => self.scroll_to_latest(),
            Effect::SetControls(controls) => self.set_controls(controls),
            Effect::ShowStatus(status) => self.show_status(&status),
            Effect::ClearStatus => self.clear_status(),
            other @ (Effect::Send(_) | Effect::StartUpload(_)) => return Some(other),
        }
        None
    }
}
