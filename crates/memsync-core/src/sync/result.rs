//! Per-item sync outcome

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do with one local memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
    Skip,
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOperation::Create => write!(f, "create"),
            SyncOperation::Update => write!(f, "update"),
            SyncOperation::Delete => write!(f, "delete"),
            SyncOperation::Skip => write!(f, "skip"),
        }
    }
}

/// Outcome of syncing one item, produced once and never mutated
#[derive(Debug, Clone, PartialEq)]
pub struct SyncResult {
    /// Project-relative path of the memory file
    pub path: PathBuf,
    /// Operation actually performed; `Skip` when deduplicated
    pub operation: SyncOperation,
    pub success: bool,
    pub error: Option<String>,
    pub remote_id: Option<String>,
    pub duration: Duration,
}

impl SyncResult {
    /// Create a successful result
    pub fn ok(path: impl Into<PathBuf>, operation: SyncOperation, remote_id: Option<String>) -> Self {
        Self {
            path: path.into(),
            operation,
            success: true,
            error: None,
            remote_id,
            duration: Duration::ZERO,
        }
    }

    /// Create a failed result
    pub fn failed(
        path: impl Into<PathBuf>,
        operation: SyncOperation,
        error: impl Into<String>,
        remote_id: Option<String>,
    ) -> Self {
        Self {
            path: path.into(),
            operation,
            success: false,
            error: Some(error.into()),
            remote_id,
            duration: Duration::ZERO,
        }
    }

    /// Stamp the elapsed time
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}
