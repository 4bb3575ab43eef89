//! Key/value fact store, independent of any conversation.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::error::StoreError;
use crate::utils::{timestamp, write_json_pretty};

pub trait Memory {
    fn add(&mut self, key: &str, value: Value) -> Result<(), StoreError>;
    fn get(&self, key: &str) -> Option<&Value>;
    fn search(&self, query: &str, limit: usize) -> Vec<MemoryRecord>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub value: Value,
    #[serde(default = "Utc::now", deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    pub key: String,
    pub value: Value,
    pub timestamp: DateTime<Utc>,
}

/// Whole-snapshot JSON file: `{ key: {value, timestamp}, ... }` in insertion order.
pub struct SimpleMemory {
    path: PathBuf,
    entries: Vec<(String, MemoryEntry)>,
}

struct Snapshot<'a>(&'a [(String, MemoryEntry)]);

impl Serialize for Snapshot<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

impl SimpleMemory {
    /// Opens the snapshot at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_snapshot(&path) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Error loading memory: {}", e);
                Vec::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, key: &str) -> Option<&MemoryEntry> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        write_json_pretty(&self.path, &Snapshot(&self.entries)).inspect_err(|e| error!("Error saving memory: {}", e))
    }
}

impl Memory for SimpleMemory {
    /// Upserts `key`. An existing key keeps its position.
    fn add(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let entry = MemoryEntry {
            value,
            timestamp: Utc::now(),
        };
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((key.to_string(), entry)),
        }
        self.save()
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.entry(key).map(|e| &e.value)
    }

    /// Case-insensitive substring match on keys and string values, in insertion order.
    fn search(&self, query: &str, limit: usize) -> Vec<MemoryRecord> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|(key, entry)| {
                key.to_lowercase().contains(&query)
                    || entry
                        .value
                        .as_str()
                        .is_some_and(|v| v.to_lowercase().contains(&query))
            })
            .take(limit)
            .map(|(key, entry)| MemoryRecord {
                key: key.clone(),
                value: entry.value.clone(),
                timestamp: entry.timestamp,
            })
            .collect()
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        info!("Memory cleared");
        self.save()
    }
}

fn load_snapshot(path: &Path) -> Result<Vec<(String, MemoryEntry)>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let raw: Map<String, Value> = serde_json::from_str(&data).map_err(|e| StoreError::json(path, e))?;

    let mut entries = Vec::with_capacity(raw.len());
    for (key, value) in raw {
        match serde_json::from_value::<MemoryEntry>(value) {
            Ok(entry) => entries.push((key, entry)),
            Err(e) => warn!("Skipping malformed memory entry '{}': {}", key, e),
        }
    }
    Ok(entries)
}
