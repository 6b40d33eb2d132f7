//! Channel handler trait and the event queue adapter

use std::marker::PhantomData;

use tokio::sync::mpsc;

use crate::session::SessionEvent;

/// Trait for reacting to channel lifecycle and inbound frames
pub trait ChannelHandler: Send + 'static {
    /// Called once the channel is open
    fn on_established(&mut self) {}

    /// Handle an inbound text frame
    fn on_message(&mut self, text: String);

    /// Called once when the channel closes or fails
    fn on_closed_or_errored(&mut self, _info: String) {}
}

/// Forwards channel notifications onto an event queue as [`SessionEvent`]s
pub struct EventForwarder<E> {
    tx: mpsc::UnboundedSender<E>,
    _event: PhantomData<fn() -> E>,
}

impl<E> EventForwarder<E>
where
    E: From<SessionEvent> + Send + 'static,
{
    pub fn new(tx: mpsc::UnboundedSender<E>) -> Self {
        Self {
            tx,
            _event: PhantomData,
        }
    }

    fn forward(&self, event: SessionEvent) {
        if self.tx.send(E::from(event)).is_err() {
            tracing::debug!("Event queue closed, dropping channel notification");
        }
    }
}

impl<E> ChannelHandler for EventForwarder<E>
where
    E: From<SessionEvent> + Send + 'static,
{
    fn on_established(&mut self) {
        self.forward(SessionEvent::Established);
    }

    fn on_message(&mut self, text: String) {
        self.forward(SessionEvent::Inbound(text));
    }

    fn on_closed_or_errored(&mut self, info: String) {
        self.forward(SessionEvent::ChannelClosed(info));
    }
}
