//! Project root detection and git staged-file listing

use std::path::{Path, PathBuf};
use std::process::Command;

/// Walk up from `start` to the nearest directory containing `.git`.
///
/// Falls back to `start` when no such directory exists.
pub fn find_project_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .unwrap_or(start)
        .to_path_buf()
}

/// Lines of `git diff --cached --name-status`, empty if git fails
pub fn staged_files(root: &Path) -> Vec<String> {
    let output = Command::new("git")
        .args(["diff", "--cached", "--name-status"])
        .current_dir(root)
        .output();
    match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
            .lines()
            .map(str::to_string)
            .collect(),
        Ok(out) => {
            tracing::warn!(
                stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                "Failed to get staged files from git"
            );
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to run git");
            Vec::new()
        }
    }
}

/// Turn a user-supplied path into one relative to the project root
pub fn relative_to_root(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    } else {
        path.to_path_buf()
    }
}
