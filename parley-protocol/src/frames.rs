//! Chat frame classification
//!
//! Frames are plain text in both directions. Outbound frames are the raw user
//! text with no envelope. Inbound frames written by the responder start with
//! [`RESPONDER_PREFIX`] followed by a colon; anything else is an echo-only
//! notification rendered as the user's.

/// Marker the responder puts in front of every reply
pub const RESPONDER_PREFIX: &str = "Bot";

/// A classified inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Responder-authored reply, prefix and following whitespace removed
    Responder(String),
    /// Any other payload, kept verbatim
    Plain(String),
}

impl InboundFrame {
    /// Classify a raw text frame
    pub fn parse(payload: &str) -> Self {
        match strip_responder_prefix(payload) {
            Some(body) => Self::Responder(body.to_string()),
            None => Self::Plain(payload.to_string()),
        }
    }
}

fn strip_responder_prefix(payload: &str) -> Option<&str> {
    payload
        .strip_prefix(RESPONDER_PREFIX)
        .and_then(|rest| rest.strip_prefix(':'))
        .map(str::trim_start)
}
