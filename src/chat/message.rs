//! Role-tagged messages and the append-only conversation they form.

use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered conversation history sent with every request.
///
/// Messages can only be appended; there is no way to edit, reorder or
/// remove an entry once it is in the conversation. Growth is unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation opened by a system message.
    pub fn with_system(content: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.append(Message::system(content));
        conversation
    }

    /// Add a message to the end of the conversation.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The full history in conversation order.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut conversation = Conversation::with_system("You are helpful.");
        conversation.append(Message::user("hello"));
        conversation.append(Message::assistant("Hi there"));

        let roles: Vec<Role> = conversation.snapshot().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.last(), Some(&Message::assistant("Hi there")));
    }

    #[test]
    fn test_snapshot_is_prefix_after_append() {
        let mut conversation = Conversation::with_system("sys");
        conversation.append(Message::user("one"));
        let before = conversation.snapshot().to_vec();

        conversation.append(Message::user("two"));
        conversation.append(Message::assistant("three"));

        let after = conversation.snapshot();
        assert_eq!(&after[..before.len()], before.as_slice());
        assert_eq!(after.len(), before.len() + 2);
    }

    #[test]
    fn test_conversation_serializes_as_array() {
        let conversation = Conversation::with_system("sys");
        let json = serde_json::to_string(&conversation).unwrap();
        assert_eq!(json, r#"[{"role":"system","content":"sys"}]"#);
    }
}
