//! Protocol module
//!
//! This module defines the wire types exchanged with the Chatter backend:
//! - Message structure as served by the HTTP history endpoint and the
//!   realtime push channel
//! - Server-to-client realtime events
//! - Client-to-server realtime events
//! - JSON framing for the realtime channel
//!
//! The realtime channel carries one JSON object per frame, shaped as
//! `{"event": <name>, "data": <payload>}`.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message as provided by the server.
///
/// Messages are read-only to the client: the server mints the id and all
/// timestamps. History responses carry `created_at`; the realtime push
/// variant carries `timestamp` instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique message identifier
    #[serde(rename = "_id")]
    pub id: String,

    /// Sender's username
    pub sender: String,

    /// Receiver's username
    pub receiver: String,

    /// Message text
    pub content: String,

    /// Creation timestamp (history responses)
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Server accept timestamp
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,

    /// Delivery timestamp, if the receiver's client acknowledged it
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,

    /// Read timestamp, if the receiver read it
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,

    /// Creation timestamp (realtime push variant)
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    /// Creation time, regardless of which endpoint produced the message
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.timestamp)
    }

    /// Whether this message was sent by `username`
    pub fn is_from(&self, username: &str) -> bool {
        self.sender == username
    }
}

/// One frame on the realtime channel
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Frame {
    /// Event name
    event: String,
    /// Event payload
    data: serde_json::Value,
}

/// Payload carrying only a message id (delivery/read receipts)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiptPayload {
    /// Identifier of the message the receipt refers to
    pub message_id: String,
}

/// Events pushed by the server over the realtime channel
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A peer sent us a message
    ReceiveMessage(Message),
    /// The server accepted a message we sent (echo to the sender)
    MessageSent(Message),
    /// One of our outgoing messages was delivered
    MessageDelivered(ReceiptPayload),
    /// One of our outgoing messages was read
    MessageRead(ReceiptPayload),
}

impl ServerEvent {
    /// Decode a server event from a raw frame
    pub fn decode(raw: &str) -> Result<Self> {
        let frame: Frame = serde_json::from_str(raw)?;
        match frame.event.as_str() {
            "receive_message" => Ok(Self::ReceiveMessage(serde_json::from_value(frame.data)?)),
            "message_sent" => Ok(Self::MessageSent(serde_json::from_value(frame.data)?)),
            "message_delivered" => Ok(Self::MessageDelivered(serde_json::from_value(frame.data)?)),
            "message_read" => Ok(Self::MessageRead(serde_json::from_value(frame.data)?)),
            other => Err(Error::Transport(format!("unknown server event: {}", other))),
        }
    }
}

/// Events the client emits over the realtime channel
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Send a message to a peer
    SendMessage {
        /// Receiving peer's username
        receiver: String,
        /// Message text
        content: String,
    },
    /// Notify the server that a message was read in the UI
    ReadMessage {
        /// Identifier of the read message
        message_id: String,
    },
}

impl ClientEvent {
    /// Encode this event as a raw frame
    pub fn encode(&self) -> Result<String> {
        let frame = match self {
            Self::SendMessage { receiver, content } => Frame {
                event: "send_message".to_string(),
                data: serde_json::json!({ "receiver": receiver, "content": content }),
            },
            Self::ReadMessage { message_id } => Frame {
                event: "read_message".to_string(),
                data: serde_json::json!({ "message_id": message_id }),
            },
        };
        serde_json::to_string(&frame).map_err(Error::JsonSerialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_push_json() -> &'static str {
        r#"{
            "event": "receive_message",
            "data": {
                "_id": "65f1c2d3e4a5b6c7d8e9f0a1",
                "sender": "bob",
                "receiver": "alice",
                "content": "hello there",
                "timestamp": "2024-03-13T12:30:00+00:00"
            }
        }"#
    }

    #[test]
    fn test_decode_receive_message() {
        let event = ServerEvent::decode(sample_push_json()).expect("Failed to decode frame");

        match event {
            ServerEvent::ReceiveMessage(msg) => {
                assert_eq!(msg.id, "65f1c2d3e4a5b6c7d8e9f0a1");
                assert_eq!(msg.sender, "bob");
                assert_eq!(msg.receiver, "alice");
                assert_eq!(msg.content, "hello there");
                // Push variant carries timestamp, not created_at
                assert!(msg.created_at.is_none());
                assert!(msg.created().is_some());
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_history_message_fields() {
        let json = r#"{
            "_id": "abc123",
            "sender": "alice",
            "receiver": "bob",
            "content": "hi",
            "created_at": "2024-03-13T12:00:00+00:00",
            "sent_at": "2024-03-13T12:00:00+00:00",
            "delivered_at": null,
            "read_at": "2024-03-13T12:05:00+00:00"
        }"#;

        let msg: Message = serde_json::from_str(json).expect("Failed to parse message");
        assert_eq!(msg.id, "abc123");
        assert!(msg.delivered_at.is_none());
        assert!(msg.read_at.is_some());
        assert_eq!(msg.created(), msg.created_at);
        assert!(msg.is_from("alice"));
        assert!(!msg.is_from("bob"));
    }

    #[test]
    fn test_decode_receipts() {
        let delivered = ServerEvent::decode(
            r#"{"event": "message_delivered", "data": {"message_id": "m1"}}"#,
        )
        .expect("Failed to decode delivered receipt");
        assert_eq!(
            delivered,
            ServerEvent::MessageDelivered(ReceiptPayload {
                message_id: "m1".to_string()
            })
        );

        let read =
            ServerEvent::decode(r#"{"event": "message_read", "data": {"message_id": "m2"}}"#)
                .expect("Failed to decode read receipt");
        assert_eq!(
            read,
            ServerEvent::MessageRead(ReceiptPayload {
                message_id: "m2".to_string()
            })
        );
    }

    #[test]
    fn test_decode_unknown_event() {
        let result = ServerEvent::decode(r#"{"event": "typing", "data": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_encode_send_message() {
        let event = ClientEvent::SendMessage {
            receiver: "bob".to_string(),
            content: "hello".to_string(),
        };

        let raw = event.encode().expect("Failed to encode event");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("Invalid JSON");
        assert_eq!(value["event"], "send_message");
        assert_eq!(value["data"]["receiver"], "bob");
        assert_eq!(value["data"]["content"], "hello");
    }

    #[test]
    fn test_encode_read_message() {
        let event = ClientEvent::ReadMessage {
            message_id: "m42".to_string(),
        };

        let raw = event.encode().expect("Failed to encode event");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("Invalid JSON");
        assert_eq!(value["event"], "read_message");
        assert_eq!(value["data"]["message_id"], "m42");
    }
}
