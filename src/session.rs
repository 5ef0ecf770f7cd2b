//! Session and conversation store
//!
//! Single-session client state: who is logged in and which peers we have
//! open conversations with. The conversation collection is an association
//! list keyed by peer username with stable insertion order, so list
//! rendering never reshuffles entries.

/// The current authenticated session, if any.
///
/// Created at login, destroyed at logout, never persisted across runs.
#[derive(Debug, Clone, Default)]
pub struct Session {
    username: Option<String>,
}

impl Session {
    /// Create a logged-out session
    pub fn new() -> Self {
        Self { username: None }
    }

    /// Mark the session as authenticated
    pub fn login(&mut self, username: String) {
        self.username = Some(username);
    }

    /// Clear the session (logout)
    pub fn clear(&mut self) {
        self.username = None;
    }

    /// The authenticated username, if logged in
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Whether a user is logged in
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    /// Whether `peer` is the authenticated user themselves
    pub fn is_self(&self, peer: &str) -> bool {
        self.username.as_deref() == Some(peer)
    }
}

/// A conversation with one peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// Peer username (unique key within the list)
    pub peer: String,
    /// Count of unread messages from this peer
    pub unread: u32,
}

impl Conversation {
    /// Create a conversation with no unread messages
    pub fn new(peer: String) -> Self {
        Self { peer, unread: 0 }
    }

    /// Increment the unread count
    pub fn bump_unread(&mut self) {
        self.unread += 1;
    }

    /// Reset the unread count to zero
    pub fn clear_unread(&mut self) {
        self.unread = 0;
    }
}

/// Ordered collection of conversations, at most one entry per peer
#[derive(Debug, Clone, Default)]
pub struct ConversationList {
    entries: Vec<Conversation>,
}

impl ConversationList {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of conversations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate conversations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Conversation> {
        self.entries.iter()
    }

    /// Get a conversation by peer
    pub fn get(&self, peer: &str) -> Option<&Conversation> {
        self.entries.iter().find(|c| c.peer == peer)
    }

    /// Get a mutable conversation by peer
    pub fn get_mut(&mut self, peer: &str) -> Option<&mut Conversation> {
        self.entries.iter_mut().find(|c| c.peer == peer)
    }

    /// Position of a peer's entry in insertion order
    pub fn position(&self, peer: &str) -> Option<usize> {
        self.entries.iter().position(|c| c.peer == peer)
    }

    /// Entry at a given position
    pub fn at(&self, index: usize) -> Option<&Conversation> {
        self.entries.get(index)
    }

    /// Add a new conversation for a peer
    pub fn add(&mut self, peer: String) -> &mut Conversation {
        let conversation = Conversation::new(peer);
        self.entries.push(conversation);
        self.entries.last_mut().unwrap()
    }

    /// Get or create a conversation for a peer
    pub fn get_or_create(&mut self, peer: &str) -> &mut Conversation {
        if self.get(peer).is_none() {
            self.add(peer.to_string());
        }
        self.get_mut(peer).unwrap()
    }

    /// Remove all conversations
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let mut session = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.username(), None);

        session.login("alice".to_string());
        assert!(session.is_authenticated());
        assert_eq!(session.username(), Some("alice"));
        assert!(session.is_self("alice"));
        assert!(!session.is_self("bob"));

        session.clear();
        assert!(!session.is_authenticated());
        assert!(!session.is_self("alice"));
    }

    #[test]
    fn test_get_or_create_is_unique_per_peer() {
        let mut list = ConversationList::new();

        list.get_or_create("bob");
        list.get_or_create("bob");
        list.get_or_create("carol");

        assert_eq!(list.len(), 2);
        assert!(list.get("bob").is_some());
        assert!(list.get("carol").is_some());
    }

    #[test]
    fn test_insertion_order_is_stable() {
        let mut list = ConversationList::new();
        list.add("bob".to_string());
        list.add("carol".to_string());
        list.add("dave".to_string());

        // Touching an existing entry must not reorder the list
        list.get_or_create("carol").bump_unread();

        let peers: Vec<&str> = list.iter().map(|c| c.peer.as_str()).collect();
        assert_eq!(peers, vec!["bob", "carol", "dave"]);
        assert_eq!(list.position("carol"), Some(1));
        assert_eq!(list.at(2).unwrap().peer, "dave");
    }

    #[test]
    fn test_unread_counting() {
        let mut conversation = Conversation::new("bob".to_string());
        assert_eq!(conversation.unread, 0);

        conversation.bump_unread();
        conversation.bump_unread();
        assert_eq!(conversation.unread, 2);

        conversation.clear_unread();
        assert_eq!(conversation.unread, 0);
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut list = ConversationList::new();
        list.add("bob".to_string());
        list.add("carol".to_string());

        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.get("bob"), None);
    }
}
