//! Change detection from `git diff --cached --name-status` output

use std::path::{Component, Path, PathBuf};

use crate::sync::SyncOperation;

/// Whether `path` is a markdown file somewhere under `memory_dir`
pub fn is_memory_file(path: &Path, memory_dir: &Path) -> bool {
    let binding = normalized(path);
    let Ok(rest) = binding.strip_prefix(normalized(memory_dir)) else {
        return false;
    };
    rest.components().count() >= 1 && path.extension().is_some_and(|ext| ext == "md")
}

/// Drop `.` components so `./a/b` and `a/b` compare equal
fn normalized(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Map a git status letter to a sync operation
fn status_to_operation(status: &str) -> Option<SyncOperation> {
    match status.chars().next()?.to_ascii_uppercase() {
        'A' => Some(SyncOperation::Create),
        'M' | 'R' => Some(SyncOperation::Update),
        'D' => Some(SyncOperation::Delete),
        _ => None,
    }
}

/// Parse staged-file lines into (path, operation) pairs for memory files.
///
/// Each line is `STATUS<TAB>PATH`, or `RNNN<TAB>OLD<TAB>NEW` for renames, in
/// which case the new path is updated. Blank lines, malformed lines, other
/// statuses and paths outside `memory_dir` are ignored.
pub fn detect_changes<S: AsRef<str>>(
    lines: &[S],
    memory_dir: &Path,
) -> Vec<(PathBuf, SyncOperation)> {
    let mut changes = Vec::new();
    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(status), Some(first)) = (fields.next(), fields.next()) else {
            continue;
        };
        let Some(operation) = status_to_operation(status) else {
            continue;
        };
        let file = match (operation, fields.next()) {
            (SyncOperation::Update, Some(renamed_to)) => renamed_to,
            _ => first,
        };
        let path = PathBuf::from(file);
        if is_memory_file(&path, memory_dir) {
            changes.push((path, operation));
        }
    }
    changes
}
