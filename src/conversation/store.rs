use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::{IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use crate::conversation::models::{Conversation, ConversationSummary};
use crate::error::StoreError;
use crate::utils::{ensure_dir, preview, timestamp};

const FILE_PREFIX: &str = "conversation_";
const FILE_SUFFIX: &str = ".json";
const PREVIEW_CHARS: usize = 50;

/// One JSON document per conversation under a single directory.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{id}{FILE_SUFFIX}"))
    }

    /// Writes (or overwrites) the file belonging to this conversation's id.
    pub fn save(&self, conversation: &Conversation) -> Result<PathBuf, StoreError> {
        ensure_dir(&self.dir)?;
        let path = self.path_for(conversation.id());
        let data = conversation.serialize().map_err(|e| StoreError::json(&path, e))?;
        fs::write(&path, data).map_err(|e| StoreError::io(&path, e))?;
        debug!("Conversation saved to: {}", path.display());
        Ok(path)
    }

    /// Loads by full id, falling back to a unique id prefix.
    pub fn load(&self, id: &str) -> Result<Option<Conversation>, StoreError> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }

        let exact = self.path_for(id);
        let path = if exact.is_file() {
            exact
        } else {
            let mut candidates: Vec<PathBuf> = self
                .stored_files()?
                .into_iter()
                .filter(|p| file_id(p).is_some_and(|stored| stored.starts_with(id)))
                .collect();
            match candidates.len() {
                0 => return Ok(None),
                1 => candidates.remove(0),
                n => {
                    warn!("Conversation id prefix '{}' is ambiguous ({} matches)", id, n);
                    return Ok(None);
                }
            }
        };

        let data = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let conversation = Conversation::deserialize(&data).map_err(|e| StoreError::json(&path, e))?;
        info!("Loaded conversation: {}", conversation.id());
        Ok(Some(conversation))
    }

    /// Summaries of every readable transcript, most recently updated first.
    pub fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        let mut summaries = Vec::new();
        for path in self.stored_files()? {
            match read_summary(&path) {
                Ok(summary) => summaries.push(summary),
                Err(e) => warn!("Skipping unreadable conversation file: {}", e),
            }
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    fn stored_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && file_id(p).is_some())
            .collect();
        files.sort();
        Ok(files)
    }
}

fn file_id(path: &Path) -> Option<&str> {
    path.file_name()?
        .to_str()?
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)
}

#[derive(Deserialize)]
struct StoredHeader {
    #[serde(default)]
    id: String,
    #[serde(default, deserialize_with = "timestamp::optional")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    messages: MessageDigest,
}

/// Message count plus the first message's content; the rest are skipped unparsed.
#[derive(Default)]
struct MessageDigest {
    count: usize,
    first: Option<String>,
}

#[derive(Deserialize)]
struct FirstMessage {
    #[serde(default)]
    content: String,
}

impl<'de> Deserialize<'de> for MessageDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DigestVisitor;

        impl<'de> Visitor<'de> for DigestVisitor {
            type Value = MessageDigest;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of messages")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<MessageDigest, A::Error> {
                let mut digest = MessageDigest::default();
                if let Some(first) = seq.next_element::<FirstMessage>()? {
                    digest.count = 1;
                    digest.first = Some(first.content);
                }
                while seq.next_element::<IgnoredAny>()?.is_some() {
                    digest.count += 1;
                }
                Ok(digest)
            }
        }

        deserializer.deserialize_seq(DigestVisitor)
    }
}

fn read_summary(path: &Path) -> Result<ConversationSummary, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let header: StoredHeader =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| StoreError::json(path, e))?;

    let created_at = header.created_at.unwrap_or_else(Utc::now);
    Ok(ConversationSummary {
        id: header.id,
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        created_at,
        updated_at: header.updated_at.unwrap_or(created_at),
        message_count: header.messages.count,
        preview: header
            .messages
            .first
            .map(|c| preview(&c, PREVIEW_CHARS))
            .unwrap_or_default(),
    })
}
