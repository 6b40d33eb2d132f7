//! Session state machine
//!
//! Serializes user intent (send, cancel, upload) against the states
//! "awaiting a response" and "uploading", and folds channel and upload
//! notifications into one timeline. Every reaction runs to completion and
//! returns the effects it needs; nothing here performs I/O.

use std::path::Path;
use std::time::Duration;

use parley_protocol::InboundFrame;
use parley_utils::{ParleyError, Result};

use crate::render::{Message, Renderer};
use crate::upload::UploadOutcome;

use super::effect::{Controls, Effect, StatusId, StatusLevel, TransientStatus};
use super::event::SessionEvent;

/// Notice appended when the user cancels a pending request
pub const CANCEL_NOTICE: &str = "Processing cancelled.";

/// Conversation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResponse,
    Uploading,
}

/// Chat channel condition as seen by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Not established yet
    Pending,
    Open,
    /// Was open, then closed or failed
    Lost,
}

/// Tunables for the session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Responder greeting shown whenever the channel opens; `None` disables it
    pub greeting: Option<String>,
    /// How long a success status stays up
    pub success_clear: Duration,
    /// How long an error status stays up
    pub failure_clear: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            greeting: Some("Ask me anything!".into()),
            success_clear: Duration::from_secs(5),
            failure_clear: Duration::from_secs(8),
        }
    }
}

/// The session controller
#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
    link: LinkState,
    /// Name of the file being uploaded; set together with `Uploading`,
    /// cleared only by the upload completion
    upload_in_flight: Option<String>,
    renderer: Renderer,
    settings: SessionSettings,
    next_status_id: StatusId,
    current_status: Option<StatusId>,
}

impl SessionController {
    pub fn new(renderer: Renderer, settings: SessionSettings) -> Self {
        Self {
            state: SessionState::Idle,
            link: LinkState::Pending,
            upload_in_flight: None,
            renderer,
            settings,
            next_status_id: 0,
            current_status: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    pub fn is_upload_in_flight(&self) -> bool {
        self.upload_in_flight.is_some()
    }

    /// Current status id, if a status is shown
    pub fn current_status(&self) -> Option<StatusId> {
        self.current_status
    }

    /// Enabled state of the controls, derived from the session state
    pub fn controls(&self) -> Controls {
        let open = self.link == LinkState::Open;
        let idle = self.state == SessionState::Idle;
        Controls {
            send_enabled: open && idle,
            upload_enabled: open && idle && self.upload_in_flight.is_none(),
            cancel_visible: self.state == SessionState::AwaitingResponse,
        }
    }

    // ==================== User Actions ====================

    /// Send a message and wait for the responder
    pub fn submit_message(&mut self, text: &str) -> Result<Vec<Effect>> {
        self.ensure_open()?;

        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        if self.state != SessionState::Idle {
            tracing::debug!(state = ?self.state, "Ignoring submit while busy");
            return Ok(Vec::new());
        }

        self.state = SessionState::AwaitingResponse;
        tracing::debug!(len = text.len(), "Submitting message");

        let mut effects = vec![Effect::Send(text.to_string())];
        self.append(&mut effects, Message::user(text));
        effects.push(Effect::SetControls(self.controls()));
        Ok(effects)
    }

    /// Stop waiting for the pending response
    ///
    /// Purely local: the request already sent is not retracted, and a late
    /// reply is still appended when it arrives.
    pub fn cancel(&mut self) -> Result<Vec<Effect>> {
        if self.link == LinkState::Pending {
            return Err(ParleyError::ConnectionNotReady);
        }
        if self.state != SessionState::AwaitingResponse {
            return Ok(Vec::new());
        }

        tracing::info!("User cancelled pending request");
        self.state = SessionState::Idle;

        let mut effects = Vec::new();
        self.append(&mut effects, Message::notice(CANCEL_NOTICE));
        effects.push(Effect::SetControls(self.controls()));
        Ok(effects)
    }

    /// Start uploading a file
    pub fn start_upload(&mut self, file: &Path) -> Result<Vec<Effect>> {
        self.ensure_open()?;

        if self.state != SessionState::Idle || self.upload_in_flight.is_some() {
            tracing::debug!(
                state = ?self.state,
                upload_in_flight = ?self.upload_in_flight,
                "Ignoring upload while busy"
            );
            return Ok(Vec::new());
        }

        self.upload_in_flight = Some(display_name(file));
        self.state = SessionState::Uploading;

        let mut effects = vec![
            Effect::SetControls(self.controls()),
            Effect::StartUpload(file.to_path_buf()),
        ];
        effects.extend(self.uploading_status());
        Ok(effects)
    }

    /// Show a rejected action as an expiring error status
    pub fn notify_error(&mut self, text: impl Into<String>) -> Vec<Effect> {
        let after = self.settings.failure_clear;
        vec![self.status(text.into(), StatusLevel::Error, Some(after))]
    }

    // ==================== Event Handling ====================

    /// React to an asynchronous notification
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Established => self.on_established(),
            SessionEvent::Inbound(payload) => self.on_inbound(&payload),
            SessionEvent::ChannelClosed(info) => self.on_channel_closed(&info),
            SessionEvent::UploadFinished(outcome) => self.on_upload_finished(outcome),
            SessionEvent::StatusExpired(id) => self.on_status_expired(id),
        }
    }

    fn on_established(&mut self) -> Vec<Effect> {
        tracing::info!("Chat channel established");
        self.link = LinkState::Open;
        if self.state == SessionState::AwaitingResponse {
            self.state = SessionState::Idle;
        }

        let mut effects = Vec::new();
        if let Some(greeting) = self.settings.greeting.clone() {
            self.append(&mut effects, Message::bot(greeting));
        }
        effects.push(Effect::SetControls(self.controls()));
        effects
    }

    fn on_inbound(&mut self, payload: &str) -> Vec<Effect> {
        tracing::debug!(len = payload.len(), "Inbound frame");
        let mut effects = Vec::new();

        match InboundFrame::parse(payload) {
            InboundFrame::Responder(body) => {
                self.append(&mut effects, Message::bot(body));
                if self.state == SessionState::AwaitingResponse {
                    self.state = SessionState::Idle;
                    effects.push(Effect::SetControls(self.controls()));
                }
            }
            InboundFrame::Plain(text) => {
                self.append(&mut effects, Message::user(text));
            }
        }

        effects
    }

    fn on_channel_closed(&mut self, info: &str) -> Vec<Effect> {
        tracing::warn!("Chat channel closed: {}", info);
        self.link = LinkState::Lost;

        let failure_clear = self.settings.failure_clear;
        vec![
            Effect::SetControls(self.controls()),
            self.status(
                format!("Connection lost: {}", info),
                StatusLevel::Error,
                Some(failure_clear),
            ),
        ]
    }

    fn on_upload_finished(&mut self, outcome: UploadOutcome) -> Vec<Effect> {
        if self.upload_in_flight.take().is_none() {
            tracing::debug!(?outcome, "Ignoring upload completion with no upload in flight");
            return Vec::new();
        }

        if self.state == SessionState::Uploading {
            self.state = SessionState::Idle;
        }

        let status = match outcome {
            UploadOutcome::Succeeded { label } => {
                tracing::info!(%label, "Upload accepted");
                let after = self.settings.success_clear;
                self.status(
                    format!("Processing \"{}\"...", label),
                    StatusLevel::Success,
                    Some(after),
                )
            }
            UploadOutcome::Failed { reason } => {
                tracing::warn!(%reason, "Upload failed");
                let after = self.settings.failure_clear;
                self.status(format!("Upload failed: {}", reason), StatusLevel::Error, Some(after))
            }
        };

        vec![status, Effect::SetControls(self.controls())]
    }

    fn on_status_expired(&mut self, id: StatusId) -> Vec<Effect> {
        if self.current_status != Some(id) {
            return Vec::new();
        }

        // An error shown during an upload gives way to the upload status again
        match self.uploading_status() {
            Some(effect) => vec![effect],
            None => {
                self.current_status = None;
                vec![Effect::ClearStatus]
            }
        }
    }

    // ==================== Helpers ====================

    fn ensure_open(&self) -> Result<()> {
        if self.link == LinkState::Open {
            Ok(())
        } else {
            Err(ParleyError::ConnectionNotReady)
        }
    }

    fn append(&self, effects: &mut Vec<Effect>, message: Message) {
        if let Some(entry) = self.renderer.render(&message) {
            effects.push(Effect::Append(entry));
            effects.push(Effect::ScrollToLatest);
        }
    }

    fn uploading_status(&mut self) -> Option<Effect> {
        let text = format!("Uploading \"{}\"...", self.upload_in_flight.as_ref()?);
        Some(self.status(text, StatusLevel::Info, None))
    }

    fn status(&mut self, text: String, level: StatusLevel, clear_after: Option<Duration>) -> Effect {
        self.next_status_id += 1;
        let id = self.next_status_id;
        self.current_status = Some(id);
        Effect::ShowStatus(TransientStatus {
            id,
            text,
            level,
            clear_after,
        })
    }
}

fn display_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}
