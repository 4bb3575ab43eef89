use std::path::PathBuf;

use thiserror::Error;

/// Failures touching the on-disk stores (transcripts, personalities, memory, config).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Malformed YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("The default personality cannot be removed")]
    ProtectedPersonality,
    #[error("Invalid personality name '{0}'")]
    InvalidName(String),
    #[error("A personality needs a prompt")]
    EmptyPrompt,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StoreError::Json { path: path.into(), source }
    }

    pub(crate) fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        StoreError::Yaml { path: path.into(), source }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Personality '{0}' not found")]
    UnknownPersonality(String),
    #[error("Conversation '{0}' not found")]
    ConversationNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
