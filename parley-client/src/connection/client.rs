//! WebSocket channel to the chat server

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use parley_utils::{ParleyError, Result};

use super::handler::ChannelHandler;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outgoing queue depth
const OUTGOING_CAPACITY: usize = 100;

/// How long `close` waits for the pump task to say goodbye
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

/// Persistent bidirectional text channel
pub struct ConnectionChannel {
    /// Chat endpoint (ws:// or wss://)
    url: Url,
    /// Current state, shared with the pump task
    state_tx: watch::Sender<ChannelState>,
    /// Outgoing frames; `None` unless a pump task is running
    tx: Option<mpsc::Sender<String>>,
    /// Handle to the pump task
    task_handle: Option<JoinHandle<()>>,
}

impl ConnectionChannel {
    /// Create a channel (not yet connected)
    pub fn new(url: Url) -> Self {
        let (state_tx, _) = watch::channel(ChannelState::Disconnected);
        Self {
            url,
            state_tx,
            tx: None,
            task_handle: None,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get current channel state
    pub fn state(&self) -> ChannelState {
        *self.state_tx.borrow()
    }

    /// Open the channel, reporting lifecycle and frames to `handler`
    ///
    /// Does nothing when already open. A failed attempt is reported to the
    /// handler as well as returned.
    pub async fn connect<H>(&mut self, mut handler: H) -> Result<()>
    where
        H: ChannelHandler + 'static,
    {
        if self.state() == ChannelState::Open {
            return Ok(());
        }

        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
        self.tx = None;
        self.state_tx.send_replace(ChannelState::Connecting);
        tracing::info!(url = %self.url, "Connecting to chat server");

        let stream = match connect_async(self.url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                let info = format!("Failed to connect to {}: {}", self.url, e);
                tracing::warn!("{}", info);
                self.state_tx.send_replace(ChannelState::Closed);
                handler.on_closed_or_errored(info.clone());
                return Err(ParleyError::connection(info));
            }
        };

        let (outgoing_tx, outgoing_rx) = mpsc::channel::<String>(OUTGOING_CAPACITY);
        self.tx = Some(outgoing_tx);
        self.state_tx.send_replace(ChannelState::Open);

        tracing::info!(url = %self.url, "Chat channel open");
        handler.on_established();

        let handle = tokio::spawn(Self::pump_task(
            stream,
            outgoing_rx,
            handler,
            self.state_tx.clone(),
        ));
        self.task_handle = Some(handle);

        Ok(())
    }

    /// Queue a text frame
    ///
    /// Returns `false` without sending when the channel is not open.
    pub fn send(&self, text: &str) -> bool {
        if self.state() != ChannelState::Open {
            tracing::warn!(state = ?self.state(), "Dropping outgoing frame, channel not open");
            return false;
        }

        let Some(tx) = self.tx.as_ref() else {
            tracing::warn!("Dropping outgoing frame, no pump task");
            return false;
        };

        match tx.try_send(text.to_string()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to queue outgoing frame: {}", e);
                false
            }
        }
    }

    /// Close the channel
    pub async fn close(&mut self) {
        // Dropping the sender tells the pump task to send a close frame
        self.tx = None;

        if let Some(mut handle) = self.task_handle.take() {
            if tokio::time::timeout(CLOSE_TIMEOUT, &mut handle).await.is_err() {
                tracing::debug!("Pump task did not finish in time, aborting");
                handle.abort();
            }
        }

        self.state_tx.send_replace(ChannelState::Closed);
    }

    /// Background task that moves frames between the socket and the handler
    async fn pump_task<H: ChannelHandler>(
        mut stream: WsStream,
        mut outgoing: mpsc::Receiver<String>,
        mut handler: H,
        state_tx: watch::Sender<ChannelState>,
    ) {
        let reason = loop {
            tokio::select! {
                msg = outgoing.recv() => {
                    match msg {
                        Some(text) => {
                            if let Err(e) = stream.send(Message::Text(text)).await {
                                tracing::error!("Failed to send frame: {}", e);
                                break Some(format!("Send failed: {}", e));
                            }
                        }
                        None => {
                            tracing::debug!("Outgoing queue closed, closing channel");
                            let _ = stream.close(None).await;
                            break None;
                        }
                    }
                }

                result = stream.next() => {
                    match result {
                        Some(Ok(Message::Text(text))) => {
                            tracing::debug!(len = text.len(), "Received frame");
                            handler.on_message(text);
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let info = match frame {
                                Some(frame) if !frame.reason.is_empty() => frame.reason.to_string(),
                                Some(frame) => format!("Closed by server ({})", u16::from(frame.code)),
                                None => "Closed by server".to_string(),
                            };
                            tracing::info!("Server closed channel: {}", info);
                            break Some(info);
                        }
                        Some(Ok(_)) => {
                            // Binary, ping and pong frames carry no chat text
                        }
                        Some(Err(e)) => {
                            tracing::error!("Failed to receive frame: {}", e);
                            break Some(e.to_string());
                        }
                        None => {
                            tracing::info!("Server ended the stream");
                            break Some("Connection closed".to_string());
                        }
                    }
                }
            }
        };

        state_tx.send_replace(ChannelState::Closed);
        if let Some(info) = reason {
            handler.on_closed_or_errored(info);
        }
    }
}

impl Drop for ConnectionChannel {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for ConnectionChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionChannel")
            .field("url", &self.url.as_str())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio_tungstenite::accept_async;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Seen {
        Established,
        Message(String),
        Closed(String),
    }

    struct Recording(mpsc::UnboundedSender<Seen>);

    impl ChannelHandler for Recording {
        fn on_established(&mut self) {
            let _ = self.0.send(Seen::Established);
        }

        fn on_message(&mut self, text: String) {
            let _ = self.0.send(Seen::Message(text));
        }

        fn on_closed_or_errored(&mut self, info: String) {
            let _ = self.0.send(Seen::Closed(info));
        }
    }

    fn recording() -> (Recording, UnboundedReceiver<Seen>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Recording(tx), rx)
    }

    async fn next_seen(rx: &mut UnboundedReceiver<Seen>) -> Seen {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for handler")
            .expect("handler dropped")
    }

    /// Local server that echoes each text frame back with a responder prefix
    async fn echo_server() -> (Url, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);

        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let mut ws = accept_async(tcp).await.unwrap();
                    while let Some(Ok(msg)) = ws.next().await {
                        if let Message::Text(text) = msg {
                            log.lock().unwrap().push(text.clone());
                            let _ = ws.send(Message::Text(format!("Bot: {}", text))).await;
                        }
                    }
                });
            }
        });

        let url = Url::parse(&format!("ws://{}/ws", addr)).unwrap();
        (url, received)
    }

    // ==================== State Tests ====================

    #[tokio::test]
    async fn test_channel_state_initial() {
        let channel = ConnectionChannel::new(Url::parse("ws://127.0.0.1:1/ws").unwrap());
        assert_eq!(channel.state(), ChannelState::Disconnected);
    }

    #[tokio::test]
    async fn test_send_before_connect_fails_fast() {
        let channel = ConnectionChannel::new(Url::parse("ws://127.0.0.1:1/ws").unwrap());
        assert!(!channel.send("hello"));
    }

    #[tokio::test]
    async fn test_connect_to_dead_port_reports_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("ws://127.0.0.1:{}/ws", port)).unwrap();
        let mut channel = ConnectionChannel::new(url);
        let (handler, mut rx) = recording();

        let result = channel.connect(handler).await;
        assert!(matches!(result, Err(ParleyError::Connection(_))));
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(matches!(next_seen(&mut rx).await, Seen::Closed(_)));
    }

    // ==================== Exchange Tests ====================

    #[tokio::test]
    async fn test_connect_and_exchange_frames() {
        let (url, received) = echo_server().await;
        let mut channel = ConnectionChannel::new(url);
        let (handler, mut rx) = recording();

        channel.connect(handler).await.unwrap();
        assert_eq!(channel.state(), ChannelState::Open);
        assert_eq!(next_seen(&mut rx).await, Seen::Established);

        assert!(channel.send("2+2?"));
        assert_eq!(next_seen(&mut rx).await, Seen::Message("Bot: 2+2?".into()));
        assert_eq!(received.lock().unwrap().as_slice(), ["2+2?".to_string()]);

        channel.close().await;
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(!channel.send("late"));
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let (url, _received) = echo_server().await;
        let mut channel = ConnectionChannel::new(url);
        let (first, mut first_rx) = recording();
        let (second, mut second_rx) = recording();

        channel.connect(first).await.unwrap();
        channel.connect(second).await.unwrap();

        assert_eq!(next_seen(&mut first_rx).await, Seen::Established);
        // The second handler was never used, so its sender is gone
        assert!(second_rx.recv().await.is_none());

        assert!(channel.send("ping"));
        assert_eq!(next_seen(&mut first_rx).await, Seen::Message("Bot: ping".into()));
    }

    #[tokio::test]
    async fn test_server_close_reported_once() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            let _ = ws.send(Message::Text("Bot: bye".into())).await;
            let _ = ws.close(None).await;
        });

        let mut channel = ConnectionChannel::new(Url::parse(&format!("ws://{}/ws", addr)).unwrap());
        let (handler, mut rx) = recording();
        channel.connect(handler).await.unwrap();

        assert_eq!(next_seen(&mut rx).await, Seen::Established);
        assert_eq!(next_seen(&mut rx).await, Seen::Message("Bot: bye".into()));
        assert!(matches!(next_seen(&mut rx).await, Seen::Closed(_)));
        // Handler is dropped with the pump task, so nothing else arrives
        assert!(rx.recv().await.is_none());
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(!channel.send("anyone?"));
    }
}
