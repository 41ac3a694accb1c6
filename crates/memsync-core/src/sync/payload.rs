//! Remote tool arguments built from memory records

use std::path::Path;

use serde_json::{Value, json};

use crate::memory::{MemoryRecord, file_stem};

/// Map confidence (0.0-1.0) onto the remote importance scale (1-10)
pub fn confidence_to_importance(confidence: f64) -> i64 {
    ((confidence * 10.0).floor() as i64).clamp(1, 10)
}

/// The remote id as sent on the wire: an integer when it parses as one
pub fn memory_id_value(remote_id: &str) -> Value {
    match remote_id.trim().parse::<i64>() {
        Ok(n) => json!(n),
        Err(_) => json!(remote_id),
    }
}

fn keywords(record: &MemoryRecord, path: &Path) -> Vec<String> {
    if record.tags.is_empty() {
        vec![file_stem(path)]
    } else {
        record.tags.clone()
    }
}

fn context(path: &Path) -> String {
    format!("Synced from Serena: {}", path.display())
}

/// Arguments for the remote create tool
pub fn build_create_payload(
    record: &MemoryRecord,
    path: &Path,
    source_repo: &str,
    encoding_agent: &str,
) -> Value {
    let keywords = keywords(record, path);
    let title = if record.id.is_empty() {
        file_stem(path)
    } else {
        record.id.clone()
    };
    json!({
        "title": title,
        "content": record.content,
        "context": context(path),
        "keywords": keywords,
        "tags": keywords,
        "importance": confidence_to_importance(record.confidence),
        "source_repo": source_repo,
        "source_files": [path.display().to_string()],
        "encoding_agent": encoding_agent,
        "confidence": record.confidence,
    })
}

/// Arguments for the remote update tool
pub fn build_update_payload(
    record: &MemoryRecord,
    path: &Path,
    remote_id: &str,
    encoding_agent: &str,
) -> Value {
    let keywords = keywords(record, path);
    json!({
        "memory_id": memory_id_value(remote_id),
        "content": record.content,
        "context": context(path),
        "keywords": keywords,
        "tags": keywords,
        "importance": confidence_to_importance(record.confidence),
        "source_files": [path.display().to_string()],
        "encoding_agent": encoding_agent,
        "confidence": record.confidence,
    })
}

/// Arguments for the remote mark-obsolete tool
pub fn build_delete_payload(path: &Path, remote_id: &str) -> Value {
    json!({
        "memory_id": memory_id_value(remote_id),
        "reason": format!("Deleted from Serena: {}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::path::PathBuf;

    fn record(tags: Vec<&str>, confidence: f64) -> MemoryRecord {
        MemoryRecord {
            id: "foo".to_string(),
            subject: String::new(),
            content: "hello".to_string(),
            tags: tags.into_iter().map(String::from).collect(),
            confidence,
            path: PathBuf::from(".serena/memories/foo.md"),
        }
    }

    #[rstest]
    #[case(0.0, 1)]
    #[case(0.05, 1)]
    #[case(0.5, 5)]
    #[case(0.79, 7)]
    #[case(1.0, 10)]
    fn importance_is_clamped_floor(#[case] confidence: f64, #[case] expected: i64) {
        assert_eq!(confidence_to_importance(confidence), expected);
    }

    #[test]
    fn memory_id_is_numeric_when_possible() {
        assert_eq!(memory_id_value("7"), json!(7));
        assert_eq!(memory_id_value("mem-abc"), json!("mem-abc"));
    }

    #[test]
    fn create_payload_falls_back_to_stem_keywords() {
        let path = Path::new(".serena/memories/foo.md");
        let payload = build_create_payload(&record(vec![], 0.5), path, "me/repo", "memory-sync/0.1.0");
        assert_eq!(
            payload,
            json!({
                "title": "foo",
                "content": "hello",
                "context": "Synced from Serena: .serena/memories/foo.md",
                "keywords": ["foo"],
                "tags": ["foo"],
                "importance": 5,
                "source_repo": "me/repo",
                "source_files": [".serena/memories/foo.md"],
                "encoding_agent": "memory-sync/0.1.0",
                "confidence": 0.5,
            })
        );
    }

    #[test]
    fn update_payload_carries_id_and_no_title() {
        let path = Path::new(".serena/memories/foo.md");
        let payload = build_update_payload(&record(vec!["a", "b"], 0.9), path, "7", "agent");
        assert_eq!(payload["memory_id"], json!(7));
        assert_eq!(payload["keywords"], json!(["a", "b"]));
        assert_eq!(payload["importance"], json!(9));
        assert!(payload.get("title").is_none());
        assert!(payload.get("source_repo").is_none());
    }

    #[test]
    fn delete_payload_has_reason() {
        let payload = build_delete_payload(Path::new(".serena/memories/foo.md"), "7");
        assert_eq!(
            payload,
            json!({"memory_id": 7, "reason": "Deleted from Serena: .serena/memories/foo.md"})
        );
    }
}
