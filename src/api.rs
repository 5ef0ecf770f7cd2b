//! HTTP API client
//!
//! Thin typed wrapper over the Chatter backend's REST surface. The
//! backend authenticates with a session cookie set by `/login`, so the
//! client keeps a cookie store for the lifetime of the process.
//!
//! Failure semantics: non-2xx responses carry a `message` field which is
//! surfaced as [`Error::Auth`]; transport failures surface as
//! [`Error::Http`]. Neither mutates any client state and no retries are
//! performed.

use crate::protocol::Message;
use crate::{Error, Result};
use serde::Deserialize;
use tracing::debug;

/// A user entry from the search endpoint
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UserSummary {
    /// The user's username
    pub username: String,
}

/// A conversation entry from the conversations endpoint
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConversationSummary {
    /// Peer username
    pub username: String,
    /// Server-computed count of messages from this peer not yet read
    #[serde(default)]
    pub unread_count: u32,
}

/// Successful login payload
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOk {
    /// Server confirmation message
    pub message: String,
    /// Authenticated username as confirmed by the server
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    message: String,
    user: LoginUser,
}

#[derive(Debug, Deserialize)]
struct LoginUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    users: Vec<UserSummary>,
}

#[derive(Debug, Deserialize)]
struct ConversationsBody {
    conversations: Vec<ConversationSummary>,
}

#[derive(Debug, Deserialize)]
struct HistoryBody {
    messages: Vec<Message>,
}

/// HTTP client for the Chatter backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for a backend base URL (e.g. `http://127.0.0.1:5000`)
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The realtime socket URL derived from the base URL
    pub fn socket_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            format!("ws://{}", self.base_url)
        };
        format!("{}/socket", ws_base)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into an error, preferring the server's message
    async fn failure(resp: reqwest::Response) -> Error {
        let status = resp.status();
        match resp.json::<MessageBody>().await {
            Ok(body) => Error::Auth(body.message),
            Err(_) => Error::Api(format!("unexpected response status: {}", status)),
        }
    }

    /// Register a new account. Returns the server's confirmation message.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<String> {
        debug!("POST /register for {}", username);
        let resp = self
            .http
            .post(self.url("/register"))
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::failure(resp).await);
        }

        let body: MessageBody = resp.json().await?;
        Ok(body.message)
    }

    /// Log in, establishing the session cookie
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOk> {
        debug!("POST /login for {}", username);
        let resp = self
            .http
            .post(self.url("/login"))
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::failure(resp).await);
        }

        let body: LoginBody = resp.json().await?;
        Ok(LoginOk {
            message: body.message,
            username: body.user.username,
        })
    }

    /// Log out, clearing the server-side session
    pub async fn logout(&self) -> Result<()> {
        debug!("POST /logout");
        let resp = self.http.post(self.url("/logout")).send().await?;

        if !resp.status().is_success() {
            return Err(Self::failure(resp).await);
        }
        Ok(())
    }

    /// Search users by username prefix
    pub async fn search(&self, query: &str) -> Result<Vec<UserSummary>> {
        debug!("GET /search?username={}", query);
        let resp = self
            .http
            .get(self.url("/search"))
            .query(&[("username", query)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::failure(resp).await);
        }

        let body: SearchBody = resp.json().await?;
        Ok(body.users)
    }

    /// Fetch the authenticated user's conversations with unread counts
    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>> {
        debug!("GET /conversations");
        let resp = self.http.get(self.url("/conversations")).send().await?;

        if !resp.status().is_success() {
            return Err(Self::failure(resp).await);
        }

        let body: ConversationsBody = resp.json().await?;
        Ok(body.conversations)
    }

    /// Fetch full message history with a peer, oldest first
    pub async fn chat_history(&self, peer: &str) -> Result<Vec<Message>> {
        debug!("GET /chat/{}", peer);
        let resp = self.http.get(self.url(&format!("/chat/{}", peer))).send().await?;

        if !resp.status().is_success() {
            return Err(Self::failure(resp).await);
        }

        let body: HistoryBody = resp.json().await?;
        Ok(body.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url_derivation() {
        let client = ApiClient::new("http://127.0.0.1:5000").expect("Failed to build client");
        assert_eq!(client.socket_url(), "ws://127.0.0.1:5000/socket");

        let client = ApiClient::new("https://chat.example.com/").expect("Failed to build client");
        assert_eq!(client.socket_url(), "wss://chat.example.com/socket");
    }

    #[test]
    fn test_parse_login_body() {
        let json = r#"{
            "success": true,
            "message": "Login successful",
            "user": {"username": "alice"}
        }"#;

        let body: LoginBody = serde_json::from_str(json).expect("Failed to parse login body");
        assert_eq!(body.message, "Login successful");
        assert_eq!(body.user.username, "alice");
    }

    #[test]
    fn test_parse_conversations_body() {
        let json = r#"{
            "success": true,
            "conversations": [
                {"username": "bob", "unread_count": 3},
                {"username": "carol", "unread_count": 0}
            ]
        }"#;

        let body: ConversationsBody =
            serde_json::from_str(json).expect("Failed to parse conversations");
        assert_eq!(body.conversations.len(), 2);
        assert_eq!(body.conversations[0].username, "bob");
        assert_eq!(body.conversations[0].unread_count, 3);
        assert_eq!(body.conversations[1].unread_count, 0);
    }

    #[test]
    fn test_parse_search_body_ignores_extra_fields() {
        // The backend returns full user documents minus the password field
        let json = r#"{
            "success": true,
            "users": [
                {"_id": "65f1", "username": "bob", "email": "bob@example.com"}
            ]
        }"#;

        let body: SearchBody = serde_json::from_str(json).expect("Failed to parse search body");
        assert_eq!(body.users.len(), 1);
        assert_eq!(body.users[0].username, "bob");
    }

    #[test]
    fn test_parse_history_body() {
        let json = r#"{
            "success": true,
            "messages": [
                {
                    "_id": "m1",
                    "sender": "alice",
                    "receiver": "bob",
                    "content": "hi",
                    "created_at": "2024-03-13T12:00:00+00:00",
                    "sent_at": "2024-03-13T12:00:00+00:00",
                    "delivered_at": null,
                    "read_at": null
                }
            ]
        }"#;

        let body: HistoryBody = serde_json::from_str(json).expect("Failed to parse history");
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].id, "m1");
    }
}
