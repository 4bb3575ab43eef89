pub mod models;
pub mod ollama;
pub mod postprocess;

use ollama::OllamaAdapter;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::LlmConfig;
use models::{ChatMessage, ChatOptions, Sampling};

pub use postprocess::process_search_commands;

/// The model's reply when a prompt needs no search.
pub const NO_SEARCH: &str = "NO_SEARCH";

/// Fixed, near-deterministic sampling for the classification pass.
pub const ANALYSIS_SAMPLING: Sampling = Sampling {
    temperature: 0.1,
    num_predict: 100,
    top_p: 0.9,
    top_k: 40,
};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Could not communicate with the model service - {0}")]
    Network(String),
    #[error("Model service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Unexpected response format from the model service")]
    UnexpectedFormat,
}

#[async_trait]
pub trait LlmAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Bounded health probe. Never fails; any problem reads as "unavailable".
    async fn is_available(&self) -> bool;

    /// Version string reported by the service, when it exposes one.
    async fn version(&self) -> Option<String> {
        None
    }

    /// One non-streaming chat round trip, returning the extracted reply text.
    async fn chat(&self, messages: &[ChatMessage], options: ChatOptions) -> Result<String, LlmError>;

    /// Like [`LlmAdapter::chat`], but failures come back as displayable `Error: ...` text.
    async fn generate_response(&self, messages: &[ChatMessage], options: ChatOptions) -> String {
        match self.chat(messages, options).await {
            Ok(content) => content,
            Err(e) => {
                error!("Error communicating with {}: {}", self.name(), e);
                format!("Error: {}", e)
            }
        }
    }

    /// Asks the model whether `user_input` needs a search.
    ///
    /// Returns the model's directive verbatim, or `None` for the no-search
    /// sentinel, an empty answer, or any failure.
    async fn analyze_prompt(&self, user_input: &str) -> Option<String> {
        let messages = [ChatMessage::system(analysis_prompt(user_input))];
        match self.chat(&messages, ANALYSIS_SAMPLING.into()).await {
            Ok(result) => {
                let result = result.trim();
                if result.is_empty() || result == NO_SEARCH {
                    None
                } else {
                    debug!("Prompt analysis produced directive: {}", result);
                    Some(result.to_string())
                }
            }
            Err(e) => {
                error!("Error in prompt analysis: {}", e);
                None
            }
        }
    }
}

pub fn analysis_prompt(user_input: &str) -> String {
    format!(
        "Analyze the following user prompt and determine if it requires a search.\n\
         If it requires search, respond with the appropriate search command.\n\
         If it doesn't require search, respond with \"{NO_SEARCH}\".\n\
         \n\
         Prompt: {user_input}"
    )
}

/// Builds the adapter named by the configured provider.
pub struct AdapterFactory;

impl AdapterFactory {
    pub fn create_default(config: &LlmConfig) -> Option<Arc<dyn LlmAdapter>> {
        match config.provider.as_str() {
            "ollama" => Some(Arc::new(OllamaAdapter::new(config))),
            _ => None,
        }
    }
}
