use serde::{Deserialize, Serialize};

use crate::conversation::Role;

/// Wire form of a turn: role and content only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Per-call sampling overrides. Unset fields fall back to the adapter's configured values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

/// Fully resolved sampling parameters, serialized as the service's `options` object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    pub temperature: f32,
    pub num_predict: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Sampling {
    pub fn with_overrides(self, options: ChatOptions) -> Self {
        Self {
            temperature: options.temperature.unwrap_or(self.temperature),
            num_predict: options.max_tokens.unwrap_or(self.num_predict),
            top_p: options.top_p.unwrap_or(self.top_p),
            top_k: options.top_k.unwrap_or(self.top_k),
        }
    }
}

impl From<Sampling> for ChatOptions {
    fn from(s: Sampling) -> Self {
        Self {
            temperature: Some(s.temperature),
            max_tokens: Some(s.num_predict),
            top_p: Some(s.top_p),
            top_k: Some(s.top_k),
        }
    }
}
