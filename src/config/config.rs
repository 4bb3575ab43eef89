use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub host: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
    pub verbose: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            host: "http://localhost:11434".to_string(),
            model: "gemma3:1b".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            top_p: 0.9,
            top_k: 40,
            verbose: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// Used when no personality prompt is available.
    pub system_prompt: String,
    pub chat_history_limit: usize,
    pub save_conversations: bool,
    pub conversation_dir: String,
    pub personalities_dir: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: "Eres Emma, una asistente virtual inteligente y amigable.".to_string(),
            chat_history_limit: 20,
            save_conversations: true,
            conversation_dir: "conversations".to_string(),
            personalities_dir: "personalities".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MemoryConfig {
    pub file: String,
    pub search_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            file: "emma_memory.json".to_string(),
            search_limit: 5,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub user_name: String,
    pub assistant_name: String,
    pub use_panels: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            user_name: "You".to_string(),
            assistant_name: "Emma".to_string(),
            use_panels: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub chat: ChatConfig,
    pub memory: MemoryConfig,
    pub display: DisplayConfig,
}

impl AppConfig {
    /// `path` layered under `EMMA__SECTION__KEY` environment variables. A missing file means defaults.
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("EMMA").separator("__"))
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;
        app_config.llm.host = expand_env(&app_config.llm.host);
        app_config.validate()?;

        Ok(app_config)
    }

    /// Like [`AppConfig::load`], but writes a default file first when none exists.
    pub fn load_or_init(path: &str) -> Result<Self, config::ConfigError> {
        if !Path::new(path).exists() {
            warn!("Config file {} not found, writing defaults", path);
            if let Err(e) = AppConfig::default().save(path) {
                warn!("Could not write default config: {}", e);
            }
        }
        Self::load(path)
    }

    pub fn save(&self, path: &str) -> Result<(), StoreError> {
        let data = serde_yaml::to_string(self).map_err(|e| StoreError::yaml(path, e))?;
        fs::write(path, data).map_err(|e| StoreError::io(path, e))
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let llm = &self.llm;
        if !(0.0..=1.0).contains(&llm.temperature) {
            return Err(config::ConfigError::Message(format!(
                "llm.temperature must be within 0.0..=1.0, got {}",
                llm.temperature
            )));
        }
        if !(0.0..=1.0).contains(&llm.top_p) {
            return Err(config::ConfigError::Message(format!(
                "llm.top_p must be within 0.0..=1.0, got {}",
                llm.top_p
            )));
        }
        if llm.max_tokens == 0 {
            return Err(config::ConfigError::Message("llm.max_tokens must be at least 1".to_string()));
        }
        Ok(())
    }
}

// Values written as ${VAR} are read from the environment.
fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_default()
    } else {
        val.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let config = AppConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.llm.model, "gemma3:1b");
        assert_eq!(config.llm.host, "http://localhost:11434");
        assert!(config.chat.save_conversations);
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "llm:\n  model: llama3\n  temperature: 0.2\ndisplay:\n  use_panels: false\n").unwrap();

        let config = AppConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.llm.model, "llama3");
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.llm.top_k, 40);
        assert!(!config.display.use_panels);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = AppConfig::default();
        config.llm.model = "mistral".to_string();
        config.chat.save_conversations = false;
        config.save(path.to_str().unwrap()).unwrap();

        assert_eq!(AppConfig::load(path.to_str().unwrap()).unwrap(), config);
    }

    #[test]
    fn load_or_init_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        AppConfig::load_or_init(path.to_str().unwrap()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn out_of_range_temperature_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "llm:\n  temperature: 1.5\n").unwrap();
        assert!(AppConfig::load(path.to_str().unwrap()).is_err());
    }
}
