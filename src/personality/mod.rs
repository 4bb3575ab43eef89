//! Named system prompts backed by one YAML record per personality.
//!
//! The in-memory map is authoritative; every mutation is written through to
//! `<dir>/<id>.yaml` immediately and lookups never touch the disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::StoreError;
use crate::utils::{capitalize, ensure_dir, preview};

pub const DEFAULT_PERSONALITY: &str = "default";

const RECORD_EXTENSION: &str = "yaml";
const PREVIEW_CHARS: usize = 100;

const BUILTIN: &[(&str, &str, &str)] = &[
    (
        "default",
        "Friendly and versatile assistant",
        "Eres Emma, una asistente virtual inteligente y amigable.",
    ),
    (
        "creativa",
        "Creative assistant with great imagination",
        "Eres Emma, una asistente creativa con gran imaginación.",
    ),
    (
        "técnica",
        "Technical expert in programming and technology",
        "Eres Emma, una asistente técnica experta en programación y tecnología.",
    ),
    (
        "concisa",
        "Brief and direct responses",
        "Eres Emma, una asistente que proporciona respuestas breves y directas.",
    ),
    (
        "educativa",
        "Educational assistant with clear explanations",
        "Eres Emma, una asistente educativa que explica conceptos de manera clara y didáctica.",
    ),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Personality {
    pub id: String,
    pub name: String,
    pub description: String,
    pub prompt: String,
}

impl Personality {
    pub fn new(id: &str, prompt: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: capitalize(id),
            description: description.to_string(),
            prompt: prompt.to_string(),
        }
    }
}

/// On-disk shape of a personality file.
#[derive(Debug, Serialize, Deserialize)]
struct PersonalityRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    prompt: String,
}

/// Row for listing personalities.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalityListing {
    pub id: String,
    pub name: String,
    pub description: String,
    pub preview: String,
}

pub struct PersonalityStore {
    dir: PathBuf,
    entries: BTreeMap<String, Personality>,
}

impl PersonalityStore {
    /// Loads every record in `dir`, seeding the built-in set when none load.
    ///
    /// A `default` entry is always present afterwards.
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        ensure_dir(&dir)?;

        let mut store = Self {
            dir,
            entries: BTreeMap::new(),
        };
        store.load_records()?;

        if store.entries.is_empty() {
            for (id, description, prompt) in BUILTIN {
                store.add(id, prompt, description)?;
            }
        } else if !store.entries.contains_key(DEFAULT_PERSONALITY) {
            let (id, description, prompt) = BUILTIN[0];
            store.add(id, prompt, description)?;
        }

        Ok(store)
    }

    fn load_records(&mut self) -> Result<(), StoreError> {
        let read_dir = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        for entry in read_dir.filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            match read_record(&path) {
                Ok(record) => {
                    let name = if record.name.is_empty() { capitalize(&id) } else { record.name };
                    info!("Loaded personality: {}", id);
                    self.entries.insert(
                        id.clone(),
                        Personality {
                            id,
                            name,
                            description: record.description,
                            prompt: record.prompt,
                        },
                    );
                }
                Err(e) => warn!("Invalid personality file {}: {}", path.display(), e),
            }
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{RECORD_EXTENSION}"))
    }

    pub fn find(&self, name: &str) -> Option<&Personality> {
        self.entries.get(name)
    }

    /// First personality (by id) using exactly `prompt`.
    pub fn find_by_prompt(&self, prompt: &str) -> Option<&Personality> {
        self.entries.values().find(|p| p.prompt == prompt)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Prompt for `name`, or the default prompt when `name` is unknown.
    pub fn get(&self, name: &str) -> &str {
        self.entries
            .get(name)
            .or_else(|| self.entries.get(DEFAULT_PERSONALITY))
            .map(|p| p.prompt.as_str())
            .unwrap_or_default()
    }

    /// Inserts or replaces `name`, writing its record first.
    pub fn add(&mut self, name: &str, prompt: &str, description: &str) -> Result<(), StoreError> {
        if !is_valid_name(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        if prompt.trim().is_empty() {
            return Err(StoreError::EmptyPrompt);
        }
        let personality = Personality::new(name, prompt, description);
        let record = PersonalityRecord {
            name: personality.name.clone(),
            description: personality.description.clone(),
            prompt: personality.prompt.clone(),
        };

        let path = self.record_path(name);
        let data = serde_yaml::to_string(&record).map_err(|e| StoreError::yaml(&path, e))?;
        if let Err(e) = fs::write(&path, data) {
            error!("Error saving personality file {}: {}", path.display(), e);
            return Err(StoreError::io(&path, e));
        }

        self.entries.insert(name.to_string(), personality);
        info!("Added personality: {}", name);
        Ok(())
    }

    /// Deletes `name` and its record. `Ok(false)` when there was nothing to delete.
    pub fn remove(&mut self, name: &str) -> Result<bool, StoreError> {
        if name == DEFAULT_PERSONALITY {
            warn!("Cannot remove default personality");
            return Err(StoreError::ProtectedPersonality);
        }
        if !is_valid_name(name) {
            return Ok(false);
        }

        let path = self.record_path(name);
        let had_file = path.exists();
        if had_file {
            fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
        }
        let had_entry = self.entries.remove(name).is_some();

        if had_entry || had_file {
            info!("Removed personality: {}", name);
        }
        Ok(had_entry || had_file)
    }

    pub fn list(&self) -> Vec<PersonalityListing> {
        self.entries
            .values()
            .map(|p| PersonalityListing {
                id: p.id.clone(),
                name: p.name.clone(),
                description: p.description.clone(),
                preview: preview(&p.prompt, PREVIEW_CHARS),
            })
            .collect()
    }

    pub fn info(&self, name: &str) -> Option<Personality> {
        self.find(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Names double as file stems.
fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains(['/', '\\']) && !name.starts_with('.')
}

fn read_record(path: &Path) -> Result<PersonalityRecord, StoreError> {
    let data = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_yaml::from_str(&data).map_err(|e| StoreError::yaml(path, e))
}
