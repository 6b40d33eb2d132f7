//! Chat server connection management
//!
//! Provides the WebSocket channel to the chat server with async dispatch of
//! inbound frames to a [`ChannelHandler`].

mod client;
mod handler;

pub use client::{ChannelState, ConnectionChannel};
pub use handler::{ChannelHandler, EventForwarder};
