//! Asynchronous notifications the session reacts to

use crate::upload::UploadOutcome;

use super::effect::StatusId;

/// Externally triggered session events
///
/// Channel callbacks, upload completions and status timers all arrive as
/// one of these, in the order the event loop receives them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The chat channel is open
    Established,
    /// A raw text frame arrived
    Inbound(String),
    /// The chat channel closed or failed
    ChannelClosed(String),
    /// The running upload finished
    UploadFinished(UploadOutcome),
    /// A transient status reached its display deadline
    StatusExpired(StatusId),
}
