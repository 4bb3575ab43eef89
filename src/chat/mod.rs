//! Turn orchestration: one live conversation, one adapter, one personality registry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::ChatConfig;
use crate::conversation::{Conversation, ConversationStore, ConversationSummary, Message, Role};
use crate::error::{SessionError, StoreError};
use crate::llm::{models::ChatOptions, process_search_commands, LlmAdapter};
use crate::personality::{PersonalityStore, DEFAULT_PERSONALITY};
use crate::utils::ensure_dir;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub personality: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_message: Option<String>,
}

pub struct ChatSession {
    adapter: Arc<dyn LlmAdapter>,
    personalities: PersonalityStore,
    store: ConversationStore,
    save_conversations: bool,
    fallback_prompt: String,
    active_personality: String,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(
        config: &ChatConfig,
        adapter: Arc<dyn LlmAdapter>,
        personalities: PersonalityStore,
    ) -> Result<Self, StoreError> {
        let store = ConversationStore::new(&config.conversation_dir);
        if config.save_conversations {
            ensure_dir(store.dir())?;
        }

        let mut session = Self {
            adapter,
            personalities,
            store,
            save_conversations: config.save_conversations,
            fallback_prompt: config.system_prompt.clone(),
            active_personality: DEFAULT_PERSONALITY.to_string(),
            conversation: Conversation::new(),
        };
        session.conversation = Conversation::with_system_prompt(session.active_prompt());
        Ok(session)
    }

    fn active_prompt(&self) -> &str {
        let prompt = self.personalities.get(&self.active_personality);
        if prompt.is_empty() {
            &self.fallback_prompt
        } else {
            prompt
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn active_personality(&self) -> &str {
        &self.active_personality
    }

    pub fn personalities(&self) -> &PersonalityStore {
        &self.personalities
    }

    pub fn personalities_mut(&mut self) -> &mut PersonalityStore {
        &mut self.personalities
    }

    pub fn adapter(&self) -> &Arc<dyn LlmAdapter> {
        &self.adapter
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Runs one turn and always returns displayable text.
    ///
    /// A directive from prompt analysis replaces generation for this turn.
    /// Transport failures arrive as `Error: ...` text and are recorded as the
    /// assistant turn like any other reply.
    pub async fn get_response(&mut self, user_input: &str) -> String {
        self.conversation.add_user_message(user_input);

        let response = match self.adapter.analyze_prompt(user_input).await {
            Some(directive) => directive,
            None => {
                let messages = self.conversation.to_wire_messages();
                let reply = self.adapter.generate_response(&messages, ChatOptions::default()).await;
                process_search_commands(&reply)
            }
        };

        self.conversation.add_assistant_message(response.clone());

        if self.save_conversations {
            if let Err(e) = self.save_conversation() {
                error!("Error saving conversation: {}", e);
            }
        }

        response
    }

    /// Writes the live conversation to its id-keyed file.
    pub fn save_conversation(&self) -> Result<(), StoreError> {
        self.store.save(&self.conversation).map(|_| ())
    }

    /// Swaps in a fresh conversation seeded only with `name`'s prompt.
    /// Unknown names leave the live conversation untouched.
    pub fn change_personality(&mut self, name: &str) -> Result<(), SessionError> {
        let Some(personality) = self.personalities.find(name) else {
            warn!("Personality '{}' not found", name);
            return Err(SessionError::UnknownPersonality(name.to_string()));
        };
        self.conversation = Conversation::with_system_prompt(&personality.prompt);
        self.active_personality = name.to_string();
        info!("Changed personality to: {}", name);
        Ok(())
    }

    /// Starts over under the active personality.
    pub fn new_conversation(&mut self) {
        self.conversation = Conversation::with_system_prompt(self.active_prompt());
    }

    /// Makes a stored transcript live. The active personality becomes the one
    /// whose prompt opens the transcript, or `default` when none matches.
    pub fn load_conversation(&mut self, id: &str) -> Result<(), SessionError> {
        match self.store.load(id) {
            Ok(Some(conversation)) => {
                self.active_personality = conversation
                    .messages()
                    .first()
                    .filter(|m| m.role == Role::System)
                    .and_then(|m| self.personalities.find_by_prompt(&m.content))
                    .map(|p| p.id.clone())
                    .unwrap_or_else(|| DEFAULT_PERSONALITY.to_string());
                self.conversation = conversation;
                Ok(())
            }
            Ok(None) => {
                warn!("Conversation not found: {}", id);
                Err(SessionError::ConversationNotFound(id.to_string()))
            }
            Err(e) => {
                error!("Error loading conversation: {}", e);
                Err(e.into())
            }
        }
    }

    /// Stored transcripts, most recently updated first. Failures read as an empty list.
    pub fn list_conversations(&self) -> Vec<ConversationSummary> {
        self.store.list().unwrap_or_else(|e| {
            error!("Error listing conversations: {}", e);
            Vec::new()
        })
    }

    pub fn history(&self, limit: usize) -> &[Message] {
        self.conversation.last_messages(limit)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.conversation.id().to_string(),
            personality: self.active_personality.clone(),
            message_count: self.conversation.len(),
            created_at: self.conversation.created_at(),
            updated_at: self.conversation.updated_at(),
            last_message: self.conversation.messages().last().map(|m| m.content.clone()),
        }
    }
}
