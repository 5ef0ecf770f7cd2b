//! Conversation state management
//!
//! The [`ChatState`] owns the authoritative local view of the chat UI:
//! the session, the conversation list with unread counts, the active
//! peer, and the displayed message log. It is mutated exclusively from
//! the single UI thread, so run-to-completion event handling is the only
//! synchronization needed.
//!
//! Server messages are never mutated; the log tracks local UI flags
//! (outgoing tick status, incoming read-flag) next to each message.

use crate::api::ConversationSummary;
use crate::protocol::{ClientEvent, Message};
use crate::session::{ConversationList, Session};
use tracing::debug;

/// Sink for client-to-server realtime events.
///
/// Implemented by the socket handle in production and by a recording
/// stub in tests, so state logic is testable without a live connection.
pub trait EventSink {
    /// Emit one client event
    fn emit(&self, event: ClientEvent);
}

/// Visual delivery status of an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickStatus {
    /// Accepted by the server
    #[default]
    Sent,
    /// Delivered to the receiver's client
    Delivered,
    /// Read by the receiver
    Read,
}

impl TickStatus {
    /// Tick marker rendered next to the message
    pub fn indicator(&self) -> &str {
        match self {
            Self::Sent => "✓",
            Self::Delivered => "✓✓",
            Self::Read => "✓✓",
        }
    }
}

/// Kind of receipt pushed by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptKind {
    /// The message reached the receiver's client
    Delivered,
    /// The receiver read the message
    Read,
}

/// Direction of a displayed message relative to the session user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sent by the active peer to us
    Incoming,
    /// Sent by us
    Outgoing,
}

/// One displayed message plus its local UI flags
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// The server-provided message (read-only)
    pub message: Message,
    /// Whether we sent or received it
    pub direction: Direction,
    /// Tick status; only meaningful for outgoing entries
    pub status: TickStatus,
    /// Incoming only: a read notification was already emitted for it
    pub read_flagged: bool,
}

/// What an inbound message did to the conversation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundDisposition {
    /// First contact: a new conversation entry was created with unread 1
    NewConversation,
    /// Known but inactive sender: unread count incremented
    UnreadIncremented,
    /// Active sender: message appended to the displayed log
    Appended,
    /// Dropped (e.g. echo of our own message on the wrong event)
    Ignored,
}

/// Authoritative local view of session, conversations and displayed messages
#[derive(Debug, Default)]
pub struct ChatState {
    session: Session,
    conversations: ConversationList,
    active_peer: Option<String>,
    log: Vec<LogEntry>,
}

impl ChatState {
    /// Create an empty, logged-out state
    pub fn new() -> Self {
        Self {
            session: Session::new(),
            conversations: ConversationList::new(),
            active_peer: None,
            log: Vec::new(),
        }
    }

    /// The current session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The conversation list
    pub fn conversations(&self) -> &ConversationList {
        &self.conversations
    }

    /// The currently active peer, if a conversation is open
    pub fn active_peer(&self) -> Option<&str> {
        self.active_peer.as_deref()
    }

    /// The displayed message log for the active conversation
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Mark the session as authenticated
    pub fn login(&mut self, username: String) {
        self.session.login(username);
    }

    /// Clear everything: session, conversations, active peer, log
    pub fn reset(&mut self) {
        self.session.clear();
        self.conversations.clear();
        self.active_peer = None;
        self.log.clear();
    }

    /// Seed the conversation list from the conversations endpoint.
    ///
    /// Unread counts are taken from the server; existing entries keep
    /// their position so the sidebar never reshuffles.
    pub fn load_conversations(&mut self, summaries: Vec<ConversationSummary>) {
        for summary in summaries {
            let entry = self.conversations.get_or_create(&summary.username);
            entry.unread = summary.unread_count;
        }
    }

    /// Open a conversation with a peer, making it active.
    ///
    /// No-op when logged out or when `peer` is the session user. Ensures
    /// a conversation entry exists, resets its unread count, and clears
    /// the displayed log pending a history fetch. Returns whether the
    /// caller should fetch history for the peer.
    pub fn start_conversation(&mut self, peer: &str) -> bool {
        if !self.session.is_authenticated() || self.session.is_self(peer) {
            return false;
        }

        self.conversations.get_or_create(peer).clear_unread();
        self.active_peer = Some(peer.to_string());
        self.log.clear();
        true
    }

    /// Apply a fetched message history for a peer.
    ///
    /// A late response for a peer that is no longer active is discarded.
    /// Messages render in the given order; entries are deduplicated by
    /// id so re-applying the same history is idempotent.
    pub fn replace_history(&mut self, peer: &str, messages: Vec<Message>) {
        if self.active_peer.as_deref() != Some(peer) {
            debug!("Discarding stale history response for {}", peer);
            return;
        }

        self.log.clear();
        for message in messages {
            self.push_entry(message);
        }
    }

    /// Handle a message pushed by a peer.
    pub fn on_inbound_message(&mut self, message: Message) -> InboundDisposition {
        let sender = message.sender.clone();
        if self.session.is_self(&sender) {
            return InboundDisposition::Ignored;
        }

        if self.conversations.get(&sender).is_none() {
            let entry = self.conversations.add(sender.clone());
            entry.unread = 1;
            if self.active_peer.as_deref() == Some(sender.as_str()) {
                // Active peer always has an entry, so this is first
                // contact with an inactive peer in practice.
                entry.unread = 0;
                self.push_entry(message);
                return InboundDisposition::Appended;
            }
            return InboundDisposition::NewConversation;
        }

        if self.active_peer.as_deref() != Some(sender.as_str()) {
            if let Some(entry) = self.conversations.get_mut(&sender) {
                entry.bump_unread();
            }
            return InboundDisposition::UnreadIncremented;
        }

        self.push_entry(message);
        InboundDisposition::Appended
    }

    /// Handle the server's echo of a message we sent.
    ///
    /// Appended to the log only when the receiver is the active peer.
    /// Never affects unread counts. Returns whether it was displayed.
    pub fn on_outbound_ack(&mut self, message: Message) -> bool {
        if self.active_peer.as_deref() != Some(message.receiver.as_str()) {
            return false;
        }
        self.push_entry(message);
        true
    }

    /// Apply a delivery or read receipt to a displayed outgoing message.
    ///
    /// The status marker is fully replaced, so replaying a receipt is
    /// idempotent. `Read` is final: a late `Delivered` never downgrades it.
    pub fn on_receipt(&mut self, message_id: &str, kind: ReceiptKind) {
        let entry = self
            .log
            .iter_mut()
            .find(|e| e.direction == Direction::Outgoing && e.message.id == message_id);

        let Some(entry) = entry else {
            debug!("Receipt for unknown message {}", message_id);
            return;
        };

        match kind {
            ReceiptKind::Read => entry.status = TickStatus::Read,
            ReceiptKind::Delivered => {
                if entry.status == TickStatus::Sent {
                    entry.status = TickStatus::Delivered;
                }
            }
        }
    }

    /// Emit read notifications for displayed incoming messages.
    ///
    /// Each unflagged incoming entry produces one `read_message` event
    /// and is flagged locally so it is never re-emitted. Safe to call
    /// repeatedly.
    pub fn mark_visible_incoming_as_read(&mut self, sink: &dyn EventSink) {
        if self.active_peer.is_none() {
            return;
        }

        for entry in &mut self.log {
            if entry.direction == Direction::Incoming && !entry.read_flagged {
                sink.emit(ClientEvent::ReadMessage {
                    message_id: entry.message.id.clone(),
                });
                entry.read_flagged = true;
            }
        }
    }

    /// Render-completion hook: the shell calls this after the message
    /// log has actually been drawn, which is the signal that displayed
    /// incoming messages may be reported as read.
    pub fn on_rendered(&mut self, sink: &dyn EventSink) {
        self.mark_visible_incoming_as_read(sink);
    }

    /// Unread count for a peer (0 when unknown)
    pub fn unread_for(&self, peer: &str) -> u32 {
        self.conversations.get(peer).map(|c| c.unread).unwrap_or(0)
    }

    /// Append one message to the log, deduplicated by id.
    fn push_entry(&mut self, message: Message) {
        if self.log.iter().any(|e| e.message.id == message.id) {
            return;
        }

        let me = self.session.username().unwrap_or_default();
        let direction = if message.is_from(me) {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };

        let status = if message.read_at.is_some() {
            TickStatus::Read
        } else if message.delivered_at.is_some() {
            TickStatus::Delivered
        } else {
            TickStatus::Sent
        };

        // Incoming history the server already recorded as read needs no
        // fresh read notification.
        let read_flagged = direction == Direction::Incoming && message.read_at.is_some();

        self.log.push(LogEntry {
            message,
            direction,
            status,
            read_flagged,
        });
    }
}
