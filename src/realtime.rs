//! Realtime socket client
//!
//! Maintains the persistent connection used for message exchange. The
//! connection runs on a background thread with its own tokio runtime;
//! the UI thread talks to it through channels only:
//!
//! - outgoing client events flow through an unbounded channel into the
//!   socket writer,
//! - inbound frames are decoded and queued for the UI loop to drain,
//!   preserving single-threaded, in-order event delivery.
//!
//! Connection and decode failures are logged and the connection stays
//! down; there is no reconnection logic.

use crate::protocol::{ClientEvent, ServerEvent};
use crate::state::EventSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::mpsc as std_mpsc;
use tokio::sync::mpsc as tokio_mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{error, info, warn};

/// Sending half of the socket; cheap to clone and hand to state code
#[derive(Debug, Clone)]
pub struct SocketSender {
    tx: tokio_mpsc::UnboundedSender<ClientEvent>,
}

impl EventSink for SocketSender {
    fn emit(&self, event: ClientEvent) {
        if self.tx.send(event).is_err() {
            warn!("Socket closed, dropping client event");
        }
    }
}

/// Handle to the realtime connection
#[derive(Debug)]
pub struct Socket {
    sender: SocketSender,
    events: std_mpsc::Receiver<ServerEvent>,
}

impl Socket {
    /// Connect to the realtime endpoint.
    ///
    /// Returns immediately; the connection is established on a background
    /// thread. A failed connect is logged and the handle simply never
    /// yields events.
    pub fn connect(url: &str) -> Self {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let (event_tx, event_rx) = std_mpsc::channel();
        let url = url.to_string();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(run_socket(url, rx, event_tx));
        });

        Self {
            sender: SocketSender { tx },
            events: event_rx,
        }
    }

    /// A clonable sender for emitting client events
    pub fn sender(&self) -> SocketSender {
        self.sender.clone()
    }

    /// Emit one client event
    pub fn emit(&self, event: ClientEvent) {
        self.sender.emit(event);
    }

    /// Drain one pending server event, if any (non-blocking)
    pub fn poll_event(&self) -> Option<ServerEvent> {
        self.events.try_recv().ok()
    }
}

/// Socket task: owns the websocket until either side shuts down.
async fn run_socket(
    url: String,
    mut outgoing: tokio_mpsc::UnboundedReceiver<ClientEvent>,
    events: std_mpsc::Sender<ServerEvent>,
) {
    let (stream, _) = match connect_async(&url).await {
        Ok(connected) => connected,
        Err(e) => {
            error!("Failed to connect socket to {}: {}", url, e);
            return;
        }
    };
    info!("Socket connected to {}", url);

    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            event = outgoing.recv() => {
                match event {
                    Some(event) => match event.encode() {
                        Ok(raw) => {
                            if let Err(e) = sink.send(WsMessage::Text(raw)).await {
                                error!("Socket send failed: {}", e);
                                break;
                            }
                        }
                        Err(e) => error!("Failed to encode client event: {}", e),
                    },
                    None => {
                        // All senders dropped: logout or app teardown
                        let _ = sink.send(WsMessage::Close(None)).await;
                        break;
                    }
                }
            }
            frame = source.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(raw))) => match ServerEvent::decode(&raw) {
                        Ok(event) => {
                            if events.send(event).is_err() {
                                // UI side is gone
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping undecodable frame: {}", e),
                    },
                    Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => {}
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!("Socket disconnected");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Socket read error: {}", e);
                        break;
                    }
                }
            }
        }
    }
}
