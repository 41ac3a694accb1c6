//! Freshness report: how local memory files compare with the State Store

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::checksum::compute_file_hash;
use crate::config::SyncConfig;
use crate::memory::file_stem;
use crate::state::StateStore;
use crate::{Error, Result};

/// Sync status of one memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessStatus {
    /// Local hash matches the last synced hash
    InSync,
    /// Local file changed since the last sync
    Stale,
    /// Local file was never synced
    Missing,
    /// State entry without a local file
    Orphaned,
}

impl FreshnessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FreshnessStatus::InSync => "in_sync",
            FreshnessStatus::Stale => "stale",
            FreshnessStatus::Missing => "missing",
            FreshnessStatus::Orphaned => "orphaned",
        }
    }
}

/// Status of a single memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessDetail {
    pub name: String,
    pub status: FreshnessStatus,
    /// Hash of the file on disk; `None` when orphaned
    pub local_hash: Option<String>,
    pub remote_id: Option<String>,
}

/// Report from a freshness check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreshnessReport {
    pub total: usize,
    pub in_sync: usize,
    pub stale: usize,
    pub missing: usize,
    pub orphaned: usize,
    pub duration_ms: f64,
    /// Sorted by name
    pub details: Vec<FreshnessDetail>,
}

impl FreshnessReport {
    fn from_details(mut details: Vec<FreshnessDetail>, duration_ms: f64) -> Self {
        details.sort_by(|a, b| a.name.cmp(&b.name));
        let count = |status: FreshnessStatus| details.iter().filter(|d| d.status == status).count();
        Self {
            total: details.len(),
            in_sync: count(FreshnessStatus::InSync),
            stale: count(FreshnessStatus::Stale),
            missing: count(FreshnessStatus::Missing),
            orphaned: count(FreshnessStatus::Orphaned),
            duration_ms,
            details,
        }
    }

    /// Whether every memory is in sync
    pub fn is_healthy(&self) -> bool {
        self.in_sync == self.total
    }

    /// Details that are not in sync
    pub fn problems(&self) -> impl Iterator<Item = &FreshnessDetail> {
        self.details
            .iter()
            .filter(|d| d.status != FreshnessStatus::InSync)
    }
}

/// Compare every memory file under the configured directory with the State
/// Store.
///
/// # Errors
///
/// Returns an error if the state file is invalid or a memory file cannot be
/// read.
pub fn check_freshness(project_root: &Path, config: &SyncConfig) -> Result<FreshnessReport> {
    let start = Instant::now();
    let state = StateStore::load(config.state_path(project_root))?;

    let mut files = Vec::new();
    collect_markdown(&config.memory_path(project_root), &mut files)?;

    let mut seen = BTreeSet::new();
    let mut details = Vec::new();
    for file in &files {
        let name = file_stem(file);
        let local_hash = compute_file_hash(file)?;
        let entry = state.get(&name);
        let status = match entry {
            None => FreshnessStatus::Missing,
            Some(entry) if entry.content_hash == local_hash => FreshnessStatus::InSync,
            Some(_) => FreshnessStatus::Stale,
        };
        details.push(FreshnessDetail {
            name: name.clone(),
            status,
            local_hash: Some(local_hash),
            remote_id: entry.map(|e| e.remote_id.clone()),
        });
        seen.insert(name);
    }

    for (name, entry) in state.iter() {
        if !seen.contains(name) {
            details.push(FreshnessDetail {
                name: name.clone(),
                status: FreshnessStatus::Orphaned,
                local_hash: None,
                remote_id: Some(entry.remote_id.clone()),
            });
        }
    }

    let report = FreshnessReport::from_details(details, start.elapsed().as_secs_f64() * 1000.0);
    tracing::debug!(
        total = report.total,
        stale = report.stale,
        missing = report.missing,
        orphaned = report.orphaned,
        "Freshness check complete"
    );
    Ok(report)
}

/// Recursively collect `*.md` files; a missing directory yields nothing
fn collect_markdown(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(dir, e)),
    };
    for entry in entries {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_dir() {
            collect_markdown(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "md") {
            out.push(path);
        }
    }
    Ok(())
}
