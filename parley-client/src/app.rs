//! Application event loop
//!
//! Owns the session controller and its collaborators. Every event is taken
//! from one queue and handled to completion before the next: console lines
//! become commands, session notifications go to the controller, and the
//! resulting effects are executed here.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use parley_utils::{ParleyError, Result};

use crate::config::ClientConfig;
use crate::connection::{ChannelState, ConnectionChannel, EventForwarder};
use crate::event::{AppEvent, EventHandler};
use crate::render::Renderer;
use crate::session::{Effect, Presenter, SessionController, SessionEvent, StatusId};
use crate::typeset::DelimiterTypesetter;
use crate::ui::{Composer, ConsolePresenter, InputCommand, ThemeStore, HELP_TEXT};
use crate::upload::UploadJob;

/// Application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Quitting,
}

/// Main application
pub struct App<W: Write> {
    /// Identifies this run in the logs
    session_id: Uuid,
    state: AppState,
    controller: SessionController,
    channel: ConnectionChannel,
    uploads: UploadJob,
    presenter: ConsolePresenter<W>,
    themes: ThemeStore,
    composer: Composer,
    events: EventHandler,
}

impl<W: Write> App<W> {
    /// Create the app from a loaded config
    ///
    /// Fails when a configured endpoint is not a usable URL.
    pub fn new(config: &ClientConfig, presenter: ConsolePresenter<W>, themes: ThemeStore) -> Result<Self> {
        let chat_url = config.chat_url()?;
        let upload_url = config.upload_url()?;

        let renderer = Renderer::with_typesetter(Arc::new(DelimiterTypesetter::new()));

        Ok(Self {
            session_id: Uuid::new_v4(),
            state: AppState::Running,
            controller: SessionController::new(renderer, config.session_settings()),
            channel: ConnectionChannel::new(chat_url),
            uploads: UploadJob::new(upload_url),
            presenter,
            themes,
            composer: Composer::new(),
            events: EventHandler::new(),
        })
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// Check if application should quit
    pub fn should_quit(&self) -> bool {
        self.state == AppState::Quitting
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn presenter(&self) -> &ConsolePresenter<W> {
        &self.presenter
    }

    /// Run the main application loop until the user quits or input ends
    pub async fn run(&mut self) -> Result<()> {
        let span = tracing::info_span!("session", id = %self.session_id.as_simple());
        self.run_loop().instrument(span).await
    }

    async fn run_loop(&mut self) -> Result<()> {
        tracing::info!(
            chat_url = %self.channel.url(),
            upload_url = %self.uploads.endpoint(),
            "Session starting"
        );

        self.presenter.print_info("Type /help for commands.");
        self.events.start_input_reader();
        self.connect().await;

        while !self.should_quit() {
            if !self.step().await {
                break;
            }
        }

        self.channel.close().await;
        tracing::info!("Session ended");
        Ok(())
    }

    /// Handle the next queued event; `false` once the queue is gone
    pub async fn step(&mut self) -> bool {
        match self.events.next().await {
            Some(event) => {
                self.handle_event(event).await;
                true
            }
            None => false,
        }
    }

    /// Open the chat channel
    ///
    /// Failures reach the controller through the forwarder, so they are
    /// only logged here.
    pub async fn connect(&mut self) {
        let forwarder = EventForwarder::<AppEvent>::new(self.events.sender());
        if let Err(e) = self.channel.connect(forwarder).await {
            tracing::debug!("Connect attempt failed: {}", e);
        }
    }

    /// Handle an application event
    pub async fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(line) => match self.composer.feed(&line) {
                Ok(Some(command)) => self.handle_command(command).await,
                Ok(None) => {}
                Err(e) => self.presenter.print_error(&e.to_string()),
            },
            AppEvent::InputClosed => {
                tracing::info!("Console input closed");
                self.state = AppState::Quitting;
            }
            AppEvent::Session(event) => {
                let effects = self.controller.handle(event);
                self.apply(effects);
            }
        }
    }

    async fn handle_command(&mut self, command: InputCommand) {
        tracing::debug!(?command, "Handling command");
        let result = match command {
            InputCommand::Submit(text) => self.controller.submit_message(&text),
            InputCommand::Cancel => self.controller.cancel(),
            InputCommand::Upload(path) => self.controller.start_upload(&path),
            InputCommand::ToggleTheme => {
                let theme = self.themes.toggle();
                self.presenter.set_theme(theme);
                Ok(Vec::new())
            }
            InputCommand::Reconnect => {
                if self.channel.state() == ChannelState::Open {
                    self.presenter.print_info("Already connected.");
                } else {
                    self.connect().await;
                }
                Ok(Vec::new())
            }
            InputCommand::Help => {
                self.presenter.print_info(HELP_TEXT);
                Ok(Vec::new())
            }
            InputCommand::Quit => {
                self.state = AppState::Quitting;
                Ok(Vec::new())
            }
        };

        match result {
            Ok(effects) => self.apply(effects),
            Err(e) => self.report(e),
        }
    }

    fn report(&mut self, error: ParleyError) {
        if error.is_precondition() {
            tracing::debug!("Action rejected: {}", error);
        } else {
            tracing::warn!("Action failed: {}", error);
        }
        let effects = self.controller.notify_error(error.to_string());
        self.apply(effects);
    }

    /// Execute effects in order
    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            if let Effect::ShowStatus(status) = &effect {
                if let Some(after) = status.clear_after {
                    self.schedule_expiry(status.id, after);
                }
            }

            match self.presenter.present(effect) {
                Some(Effect::Send(text)) => {
                    if !self.channel.send(&text) {
                        tracing::warn!("Message not sent, channel unavailable");
                    }
                }
                Some(Effect::StartUpload(path)) => self.start_upload(path),
                _ => {}
            }
        }
    }

    fn start_upload(&mut self, path: std::path::PathBuf) {
        let tx = self.events.sender();
        let started = self.uploads.start(path, move |outcome| {
            let _ = tx.send(AppEvent::Session(SessionEvent::UploadFinished(outcome)));
        });

        if let Err(e) = started {
            // The running job still reports, which releases the controller
            tracing::warn!("Upload not started: {}", e);
        }
    }

    fn schedule_expiry(&self, id: StatusId, after: Duration) {
        let tx = self.events.sender();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(AppEvent::Session(SessionEvent::StatusExpired(id)));
        });
    }
}
