//! Event handling for the application
//!
//! Combines console input lines with session notifications into one event
//! stream. Every producer (stdin reader, channel handler, upload completion,
//! status timers) writes to the same queue, so events are handled strictly
//! one at a time in arrival order.

use std::io::BufRead;

use tokio::sync::mpsc;

use crate::session::SessionEvent;

/// Application events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// One line typed at the console, without its line ending
    Input(String),
    /// Standard input reached end of file
    InputClosed,
    /// Notification for the session controller
    Session(SessionEvent),
}

impl From<SessionEvent> for AppEvent {
    fn from(event: SessionEvent) -> Self {
        Self::Session(event)
    }
}

/// Owns the application event queue
pub struct EventHandler {
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Get a sender clone for producers
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    /// Start reading stdin lines on a background thread
    pub fn start_input_reader(&self) {
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            Self::read_lines(stdin.lock(), &tx);
        });
    }

    /// Forward every line of `reader`, then `InputClosed`
    fn read_lines<R: BufRead>(reader: R, tx: &mpsc::UnboundedSender<AppEvent>) {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.send(AppEvent::Input(line)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::error!("Error reading console input: {}", e);
                    break;
                }
            }
        }
        let _ = tx.send(AppEvent::InputClosed);
    }

    /// Receive next event
    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
