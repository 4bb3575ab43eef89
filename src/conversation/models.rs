use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::models::ChatMessage;
use crate::utils::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn. Built once and only ever read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now", deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Ordered, append-only transcript.
///
/// Missing fields in a stored document are replaced with fresh values
/// (new id, current time, no messages) instead of failing the load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default = "new_id")]
    id: String,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default = "Utc::now", deserialize_with = "timestamp::deserialize")]
    created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", deserialize_with = "timestamp::deserialize")]
    updated_at: DateTime<Utc>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Fresh conversation holding only `prompt` as its system message.
    /// An empty prompt yields an empty conversation.
    pub fn with_system_prompt(prompt: &str) -> Self {
        let mut conversation = Self::new();
        if !prompt.is_empty() {
            conversation.add_system_message(prompt);
        }
        conversation
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        let message = Message::new(role, content);
        // Never move backwards, even if the wall clock does.
        self.updated_at = self.updated_at.max(message.timestamp);
        self.messages.push(message);
    }

    pub fn add_system_message(&mut self, content: impl Into<String>) {
        self.add_message(Role::System, content);
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.add_message(Role::User, content);
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.add_message(Role::Assistant, content);
    }

    /// Role/content pairs in conversation order. Timestamps never go on the wire.
    pub fn to_wire_messages(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    /// The trailing `limit` messages, or all of them when `limit` is zero.
    pub fn last_messages(&self, limit: usize) -> &[Message] {
        if limit == 0 || limit >= self.messages.len() {
            &self.messages
        } else {
            &self.messages[self.messages.len() - limit..]
        }
    }

    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn deserialize(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

/// Listing row for a stored transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
    pub preview: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_messages_keep_order_and_drop_timestamps() {
        let mut conv = Conversation::new();
        conv.add_system_message("be nice");
        conv.add_user_message("hi");
        conv.add_assistant_message("hello");

        let wire = serde_json::to_value(conv.to_wire_messages()).unwrap();
        assert_eq!(
            wire,
            serde_json::json!([
                {"role": "system", "content": "be nice"},
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"},
            ])
        );
    }

    #[test]
    fn last_messages_returns_trailing_slice() {
        let mut conv = Conversation::new();
        for i in 0..5 {
            conv.add_user_message(format!("m{i}"));
        }
        let tail: Vec<_> = conv.last_messages(2).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(tail, vec!["m3", "m4"]);
        assert_eq!(conv.last_messages(0).len(), 5);
        assert_eq!(conv.last_messages(50).len(), 5);
    }

    #[test]
    fn updated_at_never_decreases() {
        let mut conv = Conversation::new();
        let mut previous = conv.updated_at();
        for _ in 0..10 {
            conv.add_user_message("tick");
            assert!(conv.updated_at() >= previous);
            previous = conv.updated_at();
        }
    }

    #[test]
    fn with_empty_prompt_starts_empty() {
        assert!(Conversation::with_system_prompt("").is_empty());
        assert_eq!(Conversation::with_system_prompt("x").len(), 1);
    }

    #[test]
    fn serialize_round_trip_is_lossless() {
        let mut conv = Conversation::with_system_prompt("sys");
        conv.add_user_message("¿qué tal?");
        conv.add_assistant_message("bien");

        let restored = Conversation::deserialize(&conv.serialize().unwrap()).unwrap();
        assert_eq!(restored, conv);
    }

    #[test]
    fn deserialize_fills_missing_fields() {
        let conv = Conversation::deserialize(r#"{"messages": [{"role": "user", "content": "hi"}]}"#).unwrap();
        assert!(!conv.id().is_empty());
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.messages()[0].role, Role::User);

        let empty = Conversation::deserialize("{}").unwrap();
        assert!(empty.is_empty());
        assert_ne!(empty.id(), conv.id());
    }
}
