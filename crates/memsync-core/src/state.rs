//! State Store: local memory name to remote id and last-synced fingerprint
//!
//! Persisted as a single JSON object, rewritten in full on every save:
//!
//! ```json
//! {
//!   "foo": { "forgetful_id": "7", "hash": "2cf24dba5fb0a30e..." }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::io::{read_locked, write_atomic};
use crate::{Error, Result};

/// What the remote service knows about one local memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    /// Opaque id returned by the remote create call
    #[serde(rename = "forgetful_id", deserialize_with = "string_or_number")]
    pub remote_id: String,
    /// Fingerprint of the bytes last synchronized, not necessarily the bytes
    /// on disk now
    #[serde(rename = "hash")]
    pub content_hash: String,
}

impl StateEntry {
    pub fn new(remote_id: impl Into<String>, content_hash: impl Into<String>) -> Self {
        Self {
            remote_id: remote_id.into(),
            content_hash: content_hash.into(),
        }
    }
}

/// Older state files wrote the id as a bare number
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// The persisted map, keyed by memory name (file stem). Names are written
/// in sorted order.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    path: PathBuf,
    entries: BTreeMap<String, StateEntry>,
}

impl StateStore {
    /// An empty store that will be saved to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the store from disk, or start empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::State`] if the file exists but is not a valid map.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let Some(content) = read_locked(&path)? else {
            tracing::debug!(path = %path.display(), "No state file, starting empty");
            return Ok(Self::new(path));
        };

        let entries = if content.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&content).map_err(|e| Error::State {
                path: path.clone(),
                message: e.to_string(),
            })?
        };
        Ok(Self { path, entries })
    }

    /// Write the whole map back to disk atomically
    pub fn save(&self) -> Result<()> {
        let mut content = serde_json::to_string_pretty(&self.entries)?;
        content.push('\n');
        write_atomic(&self.path, content.as_bytes())?;
        tracing::debug!(path = %self.path.display(), entries = self.entries.len(), "Saved state");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&StateEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert or replace the entry for `name`
    pub fn insert(&mut self, name: impl Into<String>, entry: StateEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn remove(&mut self, name: &str) -> Option<StateEntry> {
        self.entries.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StateEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
