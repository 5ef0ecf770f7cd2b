//! Main TUI application state and logic

use crate::api::{ApiClient, ConversationSummary, LoginOk, UserSummary};
use crate::protocol::{ClientEvent, Message, ServerEvent};
use crate::realtime::Socket;
use crate::state::{ChatState, InboundDisposition, ReceiptKind};
use crate::tui::screens::{AuthScreen, ChatScreen};
use crate::tui::types::{AuthTab, ChatFocus, Screen};
use std::thread::JoinHandle;
use tracing::{error, info, warn};

/// Run an API future to completion on a background thread.
///
/// The UI loop stays single-threaded; results come back by polling the
/// returned handle each frame.
fn spawn_api<T, Fut>(fut: Fut) -> JoinHandle<T>
where
    T: Send + 'static,
    Fut: std::future::Future<Output = T> + Send + 'static,
{
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
        rt.block_on(fut)
    })
}

/// An in-flight background request
enum Pending {
    /// POST /login
    Login(JoinHandle<crate::Result<LoginOk>>),
    /// POST /register
    Register(JoinHandle<crate::Result<String>>),
    /// POST /logout
    Logout(JoinHandle<crate::Result<()>>),
    /// GET /search
    Search(JoinHandle<crate::Result<Vec<UserSummary>>>),
    /// GET /conversations
    Conversations(JoinHandle<crate::Result<Vec<ConversationSummary>>>),
    /// GET /chat/:peer
    History {
        /// Peer the fetch was issued for
        peer: String,
        /// Fetch handle
        handle: JoinHandle<crate::Result<Vec<Message>>>,
    },
}

impl Pending {
    fn is_finished(&self) -> bool {
        match self {
            Self::Login(h) => h.is_finished(),
            Self::Register(h) => h.is_finished(),
            Self::Logout(h) => h.is_finished(),
            Self::Search(h) => h.is_finished(),
            Self::Conversations(h) => h.is_finished(),
            Self::History { handle, .. } => handle.is_finished(),
        }
    }
}

/// User-facing text for a failed request, preferring the server's message
fn error_text(e: &crate::Error) -> String {
    match e {
        crate::Error::Auth(message) => message.clone(),
        _ => "An error occurred. Please try again.".to_string(),
    }
}

/// Application state
pub struct App {
    /// Current screen
    pub current_screen: Screen,
    /// Auth screen state
    pub auth_screen: AuthScreen,
    /// Chat screen state
    pub chat_screen: ChatScreen,
    /// Conversation/session state
    pub state: ChatState,
    /// HTTP API client
    api: ApiClient,
    /// Realtime connection (present while logged in)
    socket: Option<Socket>,
    /// In-flight background requests, polled each frame
    pending: Vec<Pending>,
    /// Should quit
    pub should_quit: bool,
}

impl App {
    /// Create a new application talking to the given API client
    pub fn new(api: ApiClient) -> Self {
        Self {
            current_screen: Screen::Auth,
            auth_screen: AuthScreen::new(),
            chat_screen: ChatScreen::new(),
            state: ChatState::new(),
            api,
            socket: None,
            pending: Vec::new(),
            should_quit: false,
        }
    }

    // ========== Auth flow ==========

    /// Submit the active auth form
    pub fn submit_auth(&mut self) {
        match self.auth_screen.tab {
            AuthTab::Login => self.submit_login(),
            AuthTab::Register => self.submit_register(),
        }
    }

    fn submit_login(&mut self) {
        let username = self.auth_screen.username.trim().to_string();
        let password = self.auth_screen.password.clone();
        if username.is_empty() || password.is_empty() {
            self.auth_screen
                .set_error("Username and password are required".to_string());
            return;
        }

        let api = self.api.clone();
        let handle = spawn_api(async move { api.login(&username, &password).await });
        self.pending.push(Pending::Login(handle));
    }

    fn submit_register(&mut self) {
        let username = self.auth_screen.username.trim().to_string();
        let email = self.auth_screen.email.trim().to_string();
        let password = self.auth_screen.password.clone();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            self.auth_screen
                .set_error("Username, email and password are required".to_string());
            return;
        }

        let api = self.api.clone();
        let handle = spawn_api(async move { api.register(&username, &email, &password).await });
        self.pending.push(Pending::Register(handle));
    }

    /// Apply a completed login request
    pub fn complete_login(&mut self, result: crate::Result<LoginOk>) {
        match result {
            Ok(ok) => {
                info!("Logged in as {}", ok.username);
                self.auth_screen.set_success(ok.message);
                self.auth_screen.clear_inputs();
                self.state.login(ok.username);
                self.socket = Some(Socket::connect(&self.api.socket_url()));
                self.chat_screen = ChatScreen::new();
                self.current_screen = Screen::Chat;
                self.trigger_conversations();
            }
            Err(e) => self.auth_screen.set_error(error_text(&e)),
        }
    }

    /// Apply a completed registration request
    pub fn complete_register(&mut self, result: crate::Result<String>) {
        match result {
            Ok(message) => {
                self.auth_screen.clear_inputs();
                self.auth_screen.tab = AuthTab::Login;
                self.auth_screen.set_success(message);
            }
            Err(e) => self.auth_screen.set_error(error_text(&e)),
        }
    }

    /// Request a logout
    pub fn trigger_logout(&mut self) {
        let api = self.api.clone();
        let handle = spawn_api(async move { api.logout().await });
        self.pending.push(Pending::Logout(handle));
    }

    /// Apply a completed logout request
    pub fn complete_logout(&mut self, result: crate::Result<()>) {
        match result {
            Ok(()) => {
                info!("Logged out");
                self.socket = None;
                self.state.reset();
                self.chat_screen = ChatScreen::new();
                self.auth_screen = AuthScreen::new();
                self.current_screen = Screen::Auth;
            }
            Err(e) => {
                // Session state is left untouched on failure
                warn!("Logout failed: {}", e);
                self.chat_screen.set_status(error_text(&e));
            }
        }
    }

    // ========== Search & conversations ==========

    /// Submit the current search query
    pub fn submit_search(&mut self) {
        let query = self.chat_screen.search_input.trim().to_string();
        if query.is_empty() {
            return;
        }

        let api = self.api.clone();
        let handle = spawn_api(async move { api.search(&query).await });
        self.pending.push(Pending::Search(handle));
    }

    /// Apply completed search results
    pub fn complete_search(&mut self, result: crate::Result<Vec<UserSummary>>) {
        match result {
            Ok(users) => {
                self.chat_screen.status_message = None;
                self.chat_screen.set_search_results(users);
            }
            Err(e) => {
                error!("Search failed: {}", e);
                self.chat_screen.set_status(error_text(&e));
            }
        }
    }

    /// Fetch the conversation list
    pub fn trigger_conversations(&mut self) {
        let api = self.api.clone();
        let handle = spawn_api(async move { api.conversations().await });
        self.pending.push(Pending::Conversations(handle));
    }

    /// Apply a completed conversation-list fetch
    pub fn complete_conversations(&mut self, result: crate::Result<Vec<ConversationSummary>>) {
        match result {
            Ok(conversations) => self.state.load_conversations(conversations),
            Err(e) => error!("Failed to load conversations: {}", e),
        }
    }

    // ========== Chat flow ==========

    /// Open a chat with a peer and fetch its history
    pub fn start_chat(&mut self, peer: &str) {
        if !self.state.start_conversation(peer) {
            return;
        }

        self.chat_screen.clear_search();
        self.chat_screen.scroll_offset = 0;
        self.chat_screen.focus = ChatFocus::Message;
        if let Some(index) = self.state.conversations().position(peer) {
            self.chat_screen.selected_conversation = index;
        }

        let api = self.api.clone();
        let peer_owned = peer.to_string();
        let handle = spawn_api(async move { api.chat_history(&peer_owned).await });
        self.pending.push(Pending::History {
            peer: peer.to_string(),
            handle,
        });
    }

    /// Open the chat selected in the conversation sidebar
    pub fn open_selected_conversation(&mut self) {
        let peer = self
            .state
            .conversations()
            .at(self.chat_screen.selected_conversation)
            .map(|c| c.peer.clone());
        if let Some(peer) = peer {
            self.start_chat(&peer);
        }
    }

    /// Open a chat with the selected search result
    pub fn chat_with_selected_result(&mut self) {
        let peer = self
            .chat_screen
            .search_results
            .get(self.chat_screen.selected_result)
            .map(|u| u.username.clone());
        if let Some(peer) = peer {
            self.start_chat(&peer);
        }
    }

    /// Apply a completed history fetch
    pub fn complete_history(&mut self, peer: &str, result: crate::Result<Vec<Message>>) {
        match result {
            Ok(messages) => self.state.replace_history(peer, messages),
            Err(e) => error!("Failed to load chat history for {}: {}", peer, e),
        }
    }

    /// Send the composed message to the active peer
    pub fn send_current_message(&mut self) {
        let content = self.chat_screen.message_input.trim().to_string();
        if content.is_empty() {
            return;
        }
        let Some(peer) = self.state.active_peer().map(str::to_string) else {
            return;
        };
        let Some(socket) = &self.socket else {
            warn!("No socket connection, message not sent");
            return;
        };

        // Displayed once the server echoes it back via message_sent
        socket.emit(ClientEvent::SendMessage {
            receiver: peer,
            content,
        });
        self.chat_screen.clear_message_input();
    }

    // ========== Frame polling ==========

    /// Poll in-flight background requests and apply any that finished
    pub fn poll_pending(&mut self) {
        let tasks = std::mem::take(&mut self.pending);
        for task in tasks {
            if task.is_finished() {
                self.finish_task(task);
            } else {
                self.pending.push(task);
            }
        }
    }

    fn finish_task(&mut self, task: Pending) {
        match task {
            Pending::Login(handle) => match handle.join() {
                Ok(result) => self.complete_login(result),
                Err(_) => error!("Login task panicked"),
            },
            Pending::Register(handle) => match handle.join() {
                Ok(result) => self.complete_register(result),
                Err(_) => error!("Register task panicked"),
            },
            Pending::Logout(handle) => match handle.join() {
                Ok(result) => self.complete_logout(result),
                Err(_) => error!("Logout task panicked"),
            },
            Pending::Search(handle) => match handle.join() {
                Ok(result) => self.complete_search(result),
                Err(_) => error!("Search task panicked"),
            },
            Pending::Conversations(handle) => match handle.join() {
                Ok(result) => self.complete_conversations(result),
                Err(_) => error!("Conversations task panicked"),
            },
            Pending::History { peer, handle } => match handle.join() {
                Ok(result) => self.complete_history(&peer, result),
                Err(_) => error!("History task panicked"),
            },
        }
    }

    /// Drain pending realtime events
    pub fn poll_socket(&mut self) {
        loop {
            let event = match &self.socket {
                Some(socket) => socket.poll_event(),
                None => None,
            };
            let Some(event) = event else {
                break;
            };
            self.handle_server_event(event);
        }
    }

    fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::ReceiveMessage(message) => {
                let sender = message.sender.clone();
                match self.state.on_inbound_message(message) {
                    InboundDisposition::NewConversation
                    | InboundDisposition::UnreadIncremented => {
                        info!("New message from {}", sender);
                    }
                    _ => {}
                }
            }
            ServerEvent::MessageSent(message) => {
                self.state.on_outbound_ack(message);
            }
            ServerEvent::MessageDelivered(receipt) => {
                self.state.on_receipt(&receipt.message_id, ReceiptKind::Delivered);
            }
            ServerEvent::MessageRead(receipt) => {
                self.state.on_receipt(&receipt.message_id, ReceiptKind::Read);
            }
        }
    }

    /// Render-completion hook, called right after each draw.
    ///
    /// Once the message log has actually been rendered, displayed
    /// incoming messages may be reported as read.
    pub fn on_frame_rendered(&mut self) {
        if self.current_screen != Screen::Chat {
            return;
        }
        let Some(sender) = self.socket.as_ref().map(|s| s.sender()) else {
            return;
        };
        self.state.on_rendered(&sender);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        // Unroutable backend: background requests fail quietly and tests
        // never poll them.
        let api = ApiClient::new("http://127.0.0.1:1").expect("Failed to build client");
        App::new(api)
    }

    fn logged_in_app() -> App {
        let mut app = test_app();
        app.complete_login(Ok(LoginOk {
            message: "Login successful".to_string(),
            username: "alice".to_string(),
        }));
        app
    }

    fn message(id: &str, sender: &str, receiver: &str, content: &str) -> Message {
        Message {
            id: id.to_string(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            content: content.to_string(),
            created_at: None,
            sent_at: None,
            delivered_at: None,
            read_at: None,
            timestamp: None,
        }
    }

    #[test]
    fn test_app_starts_on_auth_screen() {
        let app = test_app();
        assert_eq!(app.current_screen, Screen::Auth);
        assert!(!app.state.session().is_authenticated());
    }

    #[test]
    fn test_submit_auth_requires_fields() {
        let mut app = test_app();

        app.submit_auth();

        assert!(app.auth_screen.is_error);
        assert!(app.pending.is_empty());
    }

    #[test]
    fn test_complete_login_switches_to_chat() {
        let app = logged_in_app();

        assert_eq!(app.current_screen, Screen::Chat);
        assert_eq!(app.state.session().username(), Some("alice"));
        assert!(app.socket.is_some());
        // Conversations are fetched on login
        assert_eq!(app.pending.len(), 1);
    }

    #[test]
    fn test_failed_login_stays_on_auth() {
        let mut app = test_app();

        app.complete_login(Err(crate::Error::Auth("Invalid credentials".to_string())));

        assert_eq!(app.current_screen, Screen::Auth);
        assert!(app.auth_screen.is_error);
        assert_eq!(
            app.auth_screen.status_message.as_deref(),
            Some("Invalid credentials")
        );
    }

    #[test]
    fn test_complete_register_returns_to_login_tab() {
        let mut app = test_app();
        app.auth_screen.switch_tab();

        app.complete_register(Ok("User registered successfully".to_string()));

        assert_eq!(app.auth_screen.tab, AuthTab::Login);
        assert!(!app.auth_screen.is_error);
        assert_eq!(
            app.auth_screen.status_message.as_deref(),
            Some("User registered successfully")
        );
    }

    #[test]
    fn test_start_chat_activates_peer_and_fetches_history() {
        let mut app = logged_in_app();

        app.chat_screen.search_input = "bob".to_string();
        app.start_chat("bob");

        assert_eq!(app.state.active_peer(), Some("bob"));
        assert_eq!(app.state.unread_for("bob"), 0);
        assert!(app.chat_screen.search_input.is_empty());
        assert_eq!(app.chat_screen.focus, ChatFocus::Message);
        assert!(app
            .pending
            .iter()
            .any(|p| matches!(p, Pending::History { peer, .. } if peer == "bob")));
    }

    #[test]
    fn test_start_chat_with_self_is_noop() {
        let mut app = logged_in_app();
        let pending_before = app.pending.len();

        app.start_chat("alice");

        assert_eq!(app.state.active_peer(), None);
        assert_eq!(app.pending.len(), pending_before);
    }

    #[test]
    fn test_complete_history_renders_messages() {
        let mut app = logged_in_app();
        app.start_chat("bob");

        app.complete_history(
            "bob",
            Ok(vec![
                message("m1", "bob", "alice", "hi"),
                message("m2", "alice", "bob", "hello"),
            ]),
        );

        assert_eq!(app.state.log().len(), 2);
    }

    #[test]
    fn test_stale_history_is_discarded_after_switch() {
        let mut app = logged_in_app();
        app.start_chat("bob");
        app.start_chat("carol");

        app.complete_history("bob", Ok(vec![message("m1", "bob", "alice", "old")]));

        assert!(app.state.log().is_empty());
    }

    #[test]
    fn test_inbound_events_update_state() {
        let mut app = logged_in_app();
        app.start_chat("bob");

        app.handle_server_event(ServerEvent::ReceiveMessage(message(
            "m1", "bob", "alice", "hi",
        )));
        app.handle_server_event(ServerEvent::ReceiveMessage(message(
            "m2", "carol", "alice", "hey",
        )));

        assert_eq!(app.state.log().len(), 1);
        assert_eq!(app.state.unread_for("carol"), 1);
    }

    #[test]
    fn test_outbound_ack_and_receipts() {
        let mut app = logged_in_app();
        app.start_chat("bob");

        app.handle_server_event(ServerEvent::MessageSent(message("m1", "alice", "bob", "yo")));
        app.handle_server_event(ServerEvent::MessageRead(crate::protocol::ReceiptPayload {
            message_id: "m1".to_string(),
        }));

        assert_eq!(app.state.log().len(), 1);
        assert_eq!(app.state.log()[0].status, crate::state::TickStatus::Read);
    }

    #[test]
    fn test_send_message_without_active_peer_is_noop() {
        let mut app = logged_in_app();
        app.chat_screen.message_input = "hello".to_string();

        app.send_current_message();

        // Input preserved since nothing was sent
        assert_eq!(app.chat_screen.message_input, "hello");
    }

    #[test]
    fn test_complete_logout_resets_everything() {
        let mut app = logged_in_app();
        app.start_chat("bob");

        app.complete_logout(Ok(()));

        assert_eq!(app.current_screen, Screen::Auth);
        assert!(!app.state.session().is_authenticated());
        assert!(app.state.conversations().is_empty());
        assert!(app.socket.is_none());
    }

    #[test]
    fn test_failed_logout_leaves_session_intact() {
        let mut app = logged_in_app();

        app.complete_logout(Err(crate::Error::Api("boom".to_string())));

        assert_eq!(app.current_screen, Screen::Chat);
        assert!(app.state.session().is_authenticated());
    }
}
