//! [`TestProject`] builder for memory-sync test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

/// Memory directory used by the default configuration
pub const MEMORY_DIR: &str = ".serena/memories";

/// A temporary project directory with a `.git` marker and a memory directory.
///
/// # Example
///
/// ```rust,no_run
/// use memsync_test_utils::project::TestProject;
///
/// let project = TestProject::new();
/// let path = project.write_memory("foo", "hello");
/// assert_eq!(path, std::path::PathBuf::from(".serena/memories/foo.md"));
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(".git")).unwrap();
        fs::create_dir_all(temp_dir.path().join(MEMORY_DIR)).unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Project-relative path of a memory file
    pub fn memory_path(&self, name: &str) -> PathBuf {
        Path::new(MEMORY_DIR).join(format!("{}.md", name))
    }

    /// Write a memory file and return its project-relative path
    pub fn write_memory(&self, name: &str, content: &str) -> PathBuf {
        let rel = self.memory_path(name);
        fs::write(self.root().join(&rel), content).unwrap();
        rel
    }

    pub fn remove_memory(&self, name: &str) {
        fs::remove_file(self.root().join(self.memory_path(name))).unwrap();
    }

    /// Write an arbitrary project-relative file
    pub fn write_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Write `.memory_sync.toml`
    pub fn write_config(&self, toml: &str) {
        self.write_file(".memory_sync.toml", toml);
    }

    /// Write the state file directly
    pub fn write_state(&self, state: &Value) {
        self.write_file(
            ".memory_sync_state.json",
            &serde_json::to_string_pretty(state).unwrap(),
        );
    }

    /// Parse the state file, `Value::Null` if it does not exist
    pub fn read_state(&self) -> Value {
        match fs::read_to_string(self.root().join(".memory_sync_state.json")) {
            Ok(content) => serde_json::from_str(&content).unwrap(),
            Err(_) => Value::Null,
        }
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root().join(rel).exists()
    }
}
