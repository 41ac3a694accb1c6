//! Deferred change queue
//!
//! When the remote service is unavailable, detected changes are written to a
//! JSON array of `{"path": ..., "operation": ...}` and replayed later.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::io::{read_locked, write_atomic};
use crate::sync::SyncOperation;
use crate::{Error, Result};

/// One queued change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub path: PathBuf,
    pub operation: SyncOperation,
}

/// The queue file at a fixed path
#[derive(Debug, Clone)]
pub struct SyncQueue {
    path: PathBuf,
}

impl SyncQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queued changes in order.
    ///
    /// A missing or unreadable queue yields an empty list; a corrupt one is
    /// logged and also treated as empty.
    pub fn read(&self) -> Vec<(PathBuf, SyncOperation)> {
        let content = match read_locked(&self.path) {
            Ok(Some(content)) => content,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read queue file");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<QueueEntry>>(&content) {
            Ok(entries) => entries.into_iter().map(|e| (e.path, e.operation)).collect(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring corrupt queue file");
                Vec::new()
            }
        }
    }

    /// Replace the queue with `changes`
    pub fn write(&self, changes: &[(PathBuf, SyncOperation)]) -> Result<()> {
        let entries: Vec<QueueEntry> = changes
            .iter()
            .map(|(path, operation)| QueueEntry {
                path: path.clone(),
                operation: *operation,
            })
            .collect();
        let mut content = serde_json::to_string_pretty(&entries)?;
        content.push('\n');
        write_atomic(&self.path, content.as_bytes())
    }

    /// Remove the queue file if present
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&self.path, e)),
        }
    }
}
