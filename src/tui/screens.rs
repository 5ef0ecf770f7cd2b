//! Screen state structures for TUI

use crate::api::UserSummary;
use crate::tui::types::{AuthTab, ChatFocus};

/// Auth screen state (login/register tabs)
#[derive(Debug)]
pub struct AuthScreen {
    /// Active tab
    pub tab: AuthTab,
    /// Username input buffer
    pub username: String,
    /// Email input buffer (register tab only)
    pub email: String,
    /// Password input buffer
    pub password: String,
    /// Index of the focused field on the active tab
    pub focused_field: usize,
    /// Inline status message
    pub status_message: Option<String>,
    /// Whether the status is an error
    pub is_error: bool,
}

impl AuthScreen {
    /// Create a fresh auth screen on the login tab
    pub fn new() -> Self {
        Self {
            tab: AuthTab::Login,
            username: String::new(),
            email: String::new(),
            password: String::new(),
            focused_field: 0,
            status_message: None,
            is_error: false,
        }
    }

    /// Switch between the login and register tabs
    pub fn switch_tab(&mut self) {
        self.tab = match self.tab {
            AuthTab::Login => AuthTab::Register,
            AuthTab::Register => AuthTab::Login,
        };
        self.focused_field = 0;
        self.status_message = None;
        self.is_error = false;
    }

    /// Move focus to the next field, wrapping
    pub fn next_field(&mut self) {
        self.focused_field = (self.focused_field + 1) % self.tab.field_count();
    }

    /// Move focus to the previous field, wrapping
    pub fn previous_field(&mut self) {
        if self.focused_field > 0 {
            self.focused_field -= 1;
        } else {
            self.focused_field = self.tab.field_count() - 1;
        }
    }

    /// Mutable reference to the focused input buffer.
    ///
    /// Field order matches the form: username, (email,) password.
    fn focused_buffer(&mut self) -> &mut String {
        match (self.tab, self.focused_field) {
            (_, 0) => &mut self.username,
            (AuthTab::Register, 1) => &mut self.email,
            _ => &mut self.password,
        }
    }

    /// Add character to the focused field
    pub fn add_char(&mut self, c: char) {
        self.focused_buffer().push(c);
    }

    /// Remove last character from the focused field
    pub fn backspace(&mut self) {
        self.focused_buffer().pop();
    }

    /// Clear all input buffers (after a successful submission)
    pub fn clear_inputs(&mut self) {
        self.username.clear();
        self.email.clear();
        self.password.clear();
        self.focused_field = 0;
    }

    /// Set a success status message
    pub fn set_success(&mut self, message: String) {
        self.status_message = Some(message);
        self.is_error = false;
    }

    /// Set an error status message
    pub fn set_error(&mut self, message: String) {
        self.status_message = Some(message);
        self.is_error = true;
    }
}

impl Default for AuthScreen {
    fn default() -> Self {
        Self::new()
    }
}

/// Chat screen state (search, sidebar, message pane)
#[derive(Debug)]
pub struct ChatScreen {
    /// Focused pane
    pub focus: ChatFocus,
    /// Search input buffer
    pub search_input: String,
    /// Current search results
    pub search_results: Vec<UserSummary>,
    /// Selected index within the search results
    pub selected_result: usize,
    /// Selected index within the conversation sidebar
    pub selected_conversation: usize,
    /// Message composition buffer
    pub message_input: String,
    /// Scroll offset for message history, in lines back from the
    /// bottom; 0 keeps the newest messages in view
    pub scroll_offset: usize,
    /// Status message
    pub status_message: Option<String>,
}

impl ChatScreen {
    /// Create a fresh chat screen
    pub fn new() -> Self {
        Self {
            focus: ChatFocus::Search,
            search_input: String::new(),
            search_results: Vec::new(),
            selected_result: 0,
            selected_conversation: 0,
            message_input: String::new(),
            scroll_offset: 0,
            status_message: None,
        }
    }

    /// Cycle focus to the next pane
    pub fn cycle_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Add character to the focused input
    pub fn add_char(&mut self, c: char) {
        match self.focus {
            ChatFocus::Search => self.search_input.push(c),
            ChatFocus::Message => self.message_input.push(c),
            _ => {}
        }
    }

    /// Remove last character from the focused input
    pub fn backspace(&mut self) {
        match self.focus {
            ChatFocus::Search => {
                self.search_input.pop();
            }
            ChatFocus::Message => {
                self.message_input.pop();
            }
            _ => {}
        }
    }

    /// Replace the search results and focus them
    pub fn set_search_results(&mut self, results: Vec<UserSummary>) {
        self.selected_result = 0;
        if !results.is_empty() {
            self.focus = ChatFocus::Results;
        }
        self.search_results = results;
    }

    /// Clear the search box and results (after opening a chat)
    pub fn clear_search(&mut self) {
        self.search_input.clear();
        self.search_results.clear();
        self.selected_result = 0;
    }

    /// Move selection down in the focused list
    pub fn next_item(&mut self, conversation_count: usize) {
        match self.focus {
            ChatFocus::Results => {
                if !self.search_results.is_empty() {
                    self.selected_result = (self.selected_result + 1) % self.search_results.len();
                }
            }
            ChatFocus::Conversations => {
                if conversation_count > 0 {
                    self.selected_conversation =
                        (self.selected_conversation + 1) % conversation_count;
                }
            }
            _ => {}
        }
    }

    /// Move selection up in the focused list
    pub fn previous_item(&mut self, conversation_count: usize) {
        match self.focus {
            ChatFocus::Results => {
                if !self.search_results.is_empty() {
                    if self.selected_result > 0 {
                        self.selected_result -= 1;
                    } else {
                        self.selected_result = self.search_results.len() - 1;
                    }
                }
            }
            ChatFocus::Conversations => {
                if conversation_count > 0 {
                    if self.selected_conversation > 0 {
                        self.selected_conversation -= 1;
                    } else {
                        self.selected_conversation = conversation_count - 1;
                    }
                }
            }
            _ => {}
        }
    }

    /// Clear the message composition buffer
    pub fn clear_message_input(&mut self) {
        self.message_input.clear();
    }

    /// Scroll message history towards older messages
    pub fn scroll_up(&mut self, max_offset: usize) {
        if self.scroll_offset < max_offset {
            self.scroll_offset += 1;
        }
    }

    /// Scroll message history back towards the newest messages
    pub fn scroll_down(&mut self) {
        if self.scroll_offset > 0 {
            self.scroll_offset -= 1;
        }
    }

    /// Set status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }
}

impl Default for ChatScreen {
    fn default() -> Self {
        Self::new()
    }
}
