//! SyncEngine implementation
//!
//! The SyncEngine reconciles local memory files with the remote service. It
//! owns the loaded [`StateStore`] and borrows a [`ToolCaller`] per call, so one
//! open transport and one state map are shared across a whole batch.

use std::path::{Path, PathBuf};
use std::time::Instant;

use memsync_mcp::ToolCaller;

use crate::Result;
use crate::checksum::compute_content_hash;
use crate::config::SyncConfig;
use crate::memory::{FrontMatterParser, MemoryParser, file_stem};
use crate::state::{StateEntry, StateStore};

use super::extract::extract_remote_id;
use super::payload::{build_create_payload, build_delete_payload, build_update_payload};
use super::result::{SyncOperation, SyncResult};

/// Options for sync operations
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Skip the hash-based deduplication check
    pub force: bool,
    /// Report what would happen without calling the remote service or
    /// writing state
    pub dry_run: bool,
}

/// Engine for mirroring memory files into the remote service
///
/// Items are processed strictly sequentially. State is written back after
/// each successful mutation, so a crash mid-batch keeps earlier progress.
#[derive(Debug)]
pub struct SyncEngine {
    /// Root path of the project
    root: PathBuf,
    config: SyncConfig,
    options: SyncOptions,
    parser: Box<dyn MemoryParser>,
    state: StateStore,
    source_repo: String,
}

impl SyncEngine {
    /// Create a SyncEngine and load the State Store
    ///
    /// # Errors
    ///
    /// Returns an error if the state file exists but cannot be read or parsed.
    pub fn new(root: impl Into<PathBuf>, config: SyncConfig, options: SyncOptions) -> Result<Self> {
        let root = root.into();
        let state = StateStore::load(config.state_path(&root))?;
        let source_repo = config.source_repo_for(&root);
        Ok(Self {
            root,
            config,
            options,
            parser: Box::new(FrontMatterParser),
            state,
            source_repo,
        })
    }

    /// Replace the default front-matter parser
    pub fn with_parser(mut self, parser: Box<dyn MemoryParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Operation for a path whose file exists: UPDATE if the State Store
    /// knows its name, CREATE otherwise
    pub fn operation_for(&self, path: &Path) -> SyncOperation {
        if self.state.contains(&file_stem(path)) {
            SyncOperation::Update
        } else {
            SyncOperation::Create
        }
    }

    /// Sync a single memory to the remote service.
    ///
    /// `path` is relative to the project root. Failures are reported in the
    /// returned [`SyncResult`], never raised, so a batch can continue.
    ///
    /// The result carries the operation actually performed: an UPDATE with no
    /// known remote id is reported as CREATE, success or failure.
    pub async fn sync_memory(
        &mut self,
        client: &mut dyn ToolCaller,
        path: &Path,
        operation: SyncOperation,
    ) -> SyncResult {
        let start = Instant::now();
        let result = match operation {
            SyncOperation::Skip => SyncResult::ok(path, SyncOperation::Skip, None),
            SyncOperation::Delete => self.sync_delete(client, path).await,
            SyncOperation::Create | SyncOperation::Update => {
                self.sync_upsert(client, path, operation).await
            }
        };
        result.with_duration(start.elapsed())
    }

    /// Sync a list of changes in order, sharing the client and State Store
    pub async fn sync_batch(
        &mut self,
        client: &mut dyn ToolCaller,
        changes: &[(PathBuf, SyncOperation)],
    ) -> Vec<SyncResult> {
        let mut results = Vec::with_capacity(changes.len());
        for (path, operation) in changes {
            results.push(self.sync_memory(client, path, *operation).await);
        }
        results
    }

    async fn sync_upsert(
        &mut self,
        client: &mut dyn ToolCaller,
        path: &Path,
        operation: SyncOperation,
    ) -> SyncResult {
        let abs_path = self.root.join(path);
        let bytes = match std::fs::read(&abs_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read memory");
                return SyncResult::failed(
                    path,
                    operation,
                    format!("Parse error in {}: {}", path.display(), e),
                    None,
                );
            }
        };
        let record = match self.parser.parse(path, &bytes) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse memory");
                return SyncResult::failed(path, operation, e.to_string(), None);
            }
        };

        let content_hash = compute_content_hash(&bytes);
        let name = file_stem(path);
        let existing = self.state.get(&name).cloned();

        if operation == SyncOperation::Update
            && !self.options.force
            && let Some(entry) = &existing
            && entry.content_hash == content_hash
        {
            tracing::info!(path = %path.display(), "Skipping, content unchanged");
            return SyncResult::ok(path, SyncOperation::Skip, Some(entry.remote_id.clone()));
        }

        if self.options.dry_run {
            tracing::info!(path = %path.display(), %operation, "[dry-run] Would sync");
            return SyncResult::ok(path, operation, existing.map(|e| e.remote_id));
        }

        match (operation, existing) {
            (SyncOperation::Update, Some(entry)) => {
                let payload = build_update_payload(
                    &record,
                    path,
                    &entry.remote_id,
                    &self.config.encoding_agent,
                );
                if let Err(e) = client
                    .call_tool(&self.config.tools.update_memory, payload)
                    .await
                {
                    tracing::warn!(path = %path.display(), error = %e, "Update failed");
                    return SyncResult::failed(
                        path,
                        SyncOperation::Update,
                        e.to_string(),
                        Some(entry.remote_id),
                    );
                }
                tracing::info!(path = %path.display(), remote_id = %entry.remote_id, "Updated");
                self.commit(
                    path,
                    SyncOperation::Update,
                    name,
                    StateEntry::new(entry.remote_id, content_hash),
                )
            }
            (operation, _) => {
                if operation == SyncOperation::Update {
                    tracing::info!(path = %path.display(), "No known remote id, creating instead");
                }
                let payload = build_create_payload(
                    &record,
                    path,
                    &self.source_repo,
                    &self.config.encoding_agent,
                );
                let response = match client
                    .call_tool(&self.config.tools.create_memory, payload)
                    .await
                {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Create failed");
                        return SyncResult::failed(path, SyncOperation::Create, e.to_string(), None);
                    }
                };
                let remote_id = match extract_remote_id(&response) {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Create returned no id");
                        return SyncResult::failed(path, SyncOperation::Create, e.to_string(), None);
                    }
                };
                tracing::info!(path = %path.display(), %remote_id, "Created");
                self.commit(
                    path,
                    SyncOperation::Create,
                    name,
                    StateEntry::new(remote_id, content_hash),
                )
            }
        }
    }

    async fn sync_delete(&mut self, client: &mut dyn ToolCaller, path: &Path) -> SyncResult {
        let name = file_stem(path);
        let Some(entry) = self.state.get(&name).cloned() else {
            tracing::info!(path = %path.display(), "No remote id for deleted memory, skipping");
            return SyncResult::ok(path, SyncOperation::Skip, None);
        };

        if self.options.dry_run {
            tracing::info!(path = %path.display(), remote_id = %entry.remote_id, "[dry-run] Would delete");
            return SyncResult::ok(path, SyncOperation::Delete, Some(entry.remote_id));
        }

        let payload = build_delete_payload(path, &entry.remote_id);
        if let Err(e) = client
            .call_tool(&self.config.tools.mark_memory_obsolete, payload)
            .await
        {
            // Entry is kept so the delete can be retried
            tracing::warn!(path = %path.display(), error = %e, "Delete failed");
            return SyncResult::failed(
                path,
                SyncOperation::Delete,
                e.to_string(),
                Some(entry.remote_id),
            );
        }

        self.state.remove(&name);
        tracing::info!(path = %path.display(), remote_id = %entry.remote_id, "Deleted");
        match self.state.save() {
            Ok(()) => SyncResult::ok(path, SyncOperation::Delete, Some(entry.remote_id)),
            Err(e) => SyncResult::failed(
                path,
                SyncOperation::Delete,
                format!("remote delete succeeded but state was not saved: {}", e),
                Some(entry.remote_id),
            ),
        }
    }

    /// Record a successful remote mutation and persist state
    fn commit(
        &mut self,
        path: &Path,
        operation: SyncOperation,
        name: String,
        entry: StateEntry,
    ) -> SyncResult {
        let remote_id = entry.remote_id.clone();
        self.state.insert(name, entry);
        match self.state.save() {
            Ok(()) => SyncResult::ok(path, operation, Some(remote_id)),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to save state");
                SyncResult::failed(
                    path,
                    operation,
                    format!("remote {} succeeded but state was not saved: {}", operation, e),
                    Some(remote_id),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memsync_test_utils::caller::RecordingCaller;
    use memsync_test_utils::project::TestProject;

    fn engine(project: &TestProject, options: SyncOptions) -> SyncEngine {
        SyncEngine::new(project.root(), SyncConfig::default(), options).unwrap()
    }

    #[tokio::test]
    async fn skip_has_no_side_effects() {
        let project = TestProject::new();
        let mut engine = engine(&project, SyncOptions::default());
        let mut caller = RecordingCaller::new();

        let result = engine
            .sync_memory(&mut caller, Path::new("anything.md"), SyncOperation::Skip)
            .await;

        assert!(result.success);
        assert_eq!(result.operation, SyncOperation::Skip);
        assert!(caller.calls.is_empty());
        assert!(!project.exists(".memory_sync_state.json"));
    }

    #[tokio::test]
    async fn operation_for_uses_state() {
        let project = TestProject::new();
        project.write_state(&serde_json::json!({"foo": {"forgetful_id": "7", "hash": "x"}}));
        let engine = engine(&project, SyncOptions::default());

        assert_eq!(
            engine.operation_for(&project.memory_path("foo")),
            SyncOperation::Update
        );
        assert_eq!(
            engine.operation_for(&project.memory_path("bar")),
            SyncOperation::Create
        );
    }
}
