//! parley-client: terminal chat client
//!
//! A session controller drives a conversation with a chat server over a
//! WebSocket, renders responses with `$$` formula blocks set apart, and
//! uploads files for server-side processing.

pub mod app;
pub mod cli;
pub mod config;
pub mod connection;
pub mod event;
pub mod render;
pub mod segment;
pub mod session;
pub mod timeline;
pub mod typeset;
pub mod ui;
pub mod upload;

pub use app::{App, AppState};
pub use render::{Author, Message, Renderer, TimelineEntry};
pub use segment::{segment, Segment, SegmentKind};
pub use session::{Effect, Presenter, SessionController, SessionEvent, SessionState};
pub use upload::{UploadJob, UploadOutcome};
