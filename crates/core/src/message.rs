//! Message and Transcript domain types.
//!
//! These are the value objects that flow through a conversation:
//! the user asks → the assistant retrieves and answers → both land in the transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: String,
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// The ordered history of a conversation.
///
/// Append-only: messages are never edited or removed during a conversation.
/// When a greeting is present it is always the first message; it opens the
/// conversation but is not part of any turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
    #[serde(default)]
    has_greeting: bool,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript holding only the assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
            has_greeting: true,
        }
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in conversation order, greeting included.
    pub fn messages(&self) -> &[Message] {
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

    pub fn has_greeting(&self) -> bool {
        self.has_greeting
    }

    /// Messages exchanged after the greeting.
    pub fn conversation(&self) -> &[Message] {
        let offset = usize::from(self.has_greeting);
        &self.messages[offset.min(self.messages.len())..]
    }

    /// The window of prior messages used as chat history for the latest question.
    ///
    /// Takes the last `window` conversation messages and drops the final one,
    /// which is the question currently being answered. The greeting never
    /// counts, so the first turn always yields an empty window.
    pub fn history_window(&self, window: usize) -> &[Message] {
        let conversation = self.conversation();
        if conversation.is_empty() {
            return conversation;
        }
        let end = conversation.len() - 1;
        let start = conversation.len().saturating_sub(window).min(end);
        &conversation[start..end]
    }

    /// Whether roles strictly alternate starting from an assistant message.
    pub fn is_alternating(&self) -> bool {
        let first_ok = self
            .messages
            .first()
            .is_none_or(|m| !self.has_greeting || m.role() == Role::Assistant);
        first_ok
            && self
                .messages
                .windows(2)
                .all(|pair| pair[0].role() != pair[1].role())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript_with_turns(turns: usize) -> Transcript {
        let mut t = Transcript::with_greeting("Hi there!");
        for i in 0..turns {
            t.push(Message::user(format!("question {i}")));
            t.push(Message::assistant(format!("answer {i}")));
        }
        t
    }

    #[test]
    fn create_user_message() {
        let msg = Message::user("Is it okay to remove a helmet?");
        assert_eq!(msg.role(), Role::User);
        assert_eq!(msg.content(), "Is it okay to remove a helmet?");
        assert!(!msg.id().is_empty());
    }

    #[test]
    fn greeting_is_first_and_excluded_from_conversation() {
        let t = Transcript::with_greeting("Hello");
        assert_eq!(t.len(), 1);
        assert_eq!(t.messages()[0].role(), Role::Assistant);
        assert!(t.conversation().is_empty());
    }

    #[test]
    fn first_turn_has_empty_history_window() {
        let mut t = Transcript::with_greeting("Hello");
        t.push(Message::user("first question"));
        assert!(t.history_window(5).is_empty());
        assert!(t.history_window(10).is_empty());
    }

    #[test]
    fn history_window_excludes_current_question() {
        let mut t = transcript_with_turns(3);
        t.push(Message::user("new question"));

        let window = t.history_window(5);
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].content(), "question 1");
        assert_eq!(window[3].content(), "answer 2");
        assert!(window.iter().all(|m| m.content() != "new question"));
    }

    #[test]
    fn history_window_of_one_is_empty() {
        let mut t = transcript_with_turns(2);
        t.push(Message::user("new question"));
        assert!(t.history_window(1).is_empty());
    }

    #[test]
    fn history_window_larger_than_conversation() {
        let mut t = transcript_with_turns(1);
        t.push(Message::user("follow-up"));
        let window = t.history_window(10);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content(), "question 0");
    }

    #[test]
    fn transcript_without_greeting() {
        let mut t = Transcript::new();
        t.push(Message::user("q1"));
        t.push(Message::assistant("a1"));
        t.push(Message::user("q2"));
        assert_eq!(t.conversation().len(), 3);
        assert_eq!(t.history_window(3).len(), 2);
    }

    #[test]
    fn alternation_detects_repeated_roles() {
        let mut t = transcript_with_turns(2);
        assert!(t.is_alternating());
        t.push(Message::user("dangling"));
        t.push(Message::user("retry"));
        assert!(!t.is_alternating());
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::assistant("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, msg);
    }
}
