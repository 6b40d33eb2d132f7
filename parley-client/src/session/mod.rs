//! Conversation session
//!
//! The controller owns all session state. Events go in, effects come out.

mod controller;
mod effect;
mod event;

pub use controller::{LinkState, SessionController, SessionSettings, SessionState, CANCEL_NOTICE};
pub use effect::{Controls, Effect, Presenter, StatusId, StatusLevel, TransientStatus};
pub use event::SessionEvent;
