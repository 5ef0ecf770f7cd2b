//! Chatter - terminal client for the Chatter chat service
//!
//! This library provides the client-side logic for Chatter, a two-party
//! text chat application: authentication, user search, conversation list
//! maintenance with unread counts, message history rendering, and realtime
//! message exchange over a persistent socket connection.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod protocol;
pub mod realtime;
pub mod session;
pub mod state;
pub mod tui;

/// Result type alias for Chatter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Chatter operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Authentication or API failure reported by the server
    #[error("Auth error: {0}")]
    Auth(String),

    /// API contract violation (unexpected response shape)
    #[error("API error: {0}")]
    Api(String),

    /// Realtime transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Initialize the Chatter library with logging
pub fn init() {
    tracing_subscriber::fmt::init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Auth("Invalid credentials".to_string());
        assert_eq!(err.to_string(), "Auth error: Invalid credentials");
    }
}
