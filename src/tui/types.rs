//! Core types for TUI screens and navigation

/// Application screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Login / register forms
    Auth,
    /// Main chat interface
    Chat,
}

/// Tabs on the auth screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTab {
    /// Existing-account login form
    Login,
    /// New-account registration form
    Register,
}

impl AuthTab {
    /// Display label for the tab
    pub fn label(&self) -> &str {
        match self {
            Self::Login => "Login",
            Self::Register => "Register",
        }
    }

    /// Number of input fields on this tab's form
    pub fn field_count(&self) -> usize {
        match self {
            Self::Login => 2,
            Self::Register => 3,
        }
    }
}

/// Focusable panes on the chat screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFocus {
    /// User search input
    Search,
    /// Search result list
    Results,
    /// Conversation sidebar
    Conversations,
    /// Message composition input
    Message,
}

impl ChatFocus {
    /// Next pane in the Tab cycle
    pub fn next(&self) -> Self {
        match self {
            Self::Search => Self::Results,
            Self::Results => Self::Conversations,
            Self::Conversations => Self::Message,
            Self::Message => Self::Search,
        }
    }
}
