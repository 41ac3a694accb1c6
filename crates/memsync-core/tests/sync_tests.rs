//! Tests for the SyncEngine against a recording tool caller

use std::path::{Path, PathBuf};

use memsync_core::{
    Error, MemoryParser, MemoryRecord, SyncConfig, SyncEngine, SyncOperation, SyncOptions,
    compute_content_hash,
};
use memsync_test_utils::caller::RecordingCaller;
use memsync_test_utils::project::TestProject;
use pretty_assertions::assert_eq;
use serde_json::json;

fn engine(project: &TestProject) -> SyncEngine {
    engine_with(project, SyncOptions::default())
}

fn engine_with(project: &TestProject, options: SyncOptions) -> SyncEngine {
    SyncEngine::new(project.root(), SyncConfig::default(), options).unwrap()
}

fn transport_error() -> memsync_mcp::Error {
    memsync_mcp::Error::Transport {
        message: "server closed stdout".to_string(),
        stderr: "fatal: database locked".to_string(),
    }
}

// ==========================================================================
// CREATE / UPDATE
// ==========================================================================

#[tokio::test]
async fn test_create_persists_state_entry() {
    let project = TestProject::new();
    let path = project.write_memory("foo", "hello");
    let mut caller = RecordingCaller::new().respond_created(7);
    let mut engine = engine(&project);

    let result = engine
        .sync_memory(&mut caller, &path, SyncOperation::Create)
        .await;

    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.operation, SyncOperation::Create);
    assert_eq!(result.remote_id.as_deref(), Some("7"));
    assert_eq!(
        project.read_state(),
        json!({"foo": {"forgetful_id": "7", "hash": compute_content_hash(b"hello")}})
    );

    assert_eq!(caller.calls.len(), 1);
    let call = &caller.calls[0];
    assert_eq!(call.name, "create_memory");
    assert_eq!(call.arguments["title"], "foo");
    assert_eq!(call.arguments["content"], "hello");
    assert_eq!(call.arguments["source_files"], json!([".serena/memories/foo.md"]));
}

#[tokio::test]
async fn test_update_with_unchanged_content_is_skipped() {
    let project = TestProject::new();
    let path = project.write_memory("foo", "hello");
    let mut caller = RecordingCaller::new().respond_created(7);
    let mut engine = engine(&project);

    engine
        .sync_memory(&mut caller, &path, SyncOperation::Create)
        .await;
    let result = engine
        .sync_memory(&mut caller, &path, SyncOperation::Update)
        .await;

    assert!(result.success);
    assert_eq!(result.operation, SyncOperation::Skip);
    assert_eq!(result.remote_id.as_deref(), Some("7"));
    assert_eq!(caller.calls.len(), 1, "no remote call for unchanged content");
}

#[tokio::test]
async fn test_force_bypasses_deduplication() {
    let project = TestProject::new();
    let path = project.write_memory("foo", "hello");
    project.write_state(&json!({"foo": {"forgetful_id": "7", "hash": compute_content_hash(b"hello")}}));
    let mut caller = RecordingCaller::new();
    let mut engine = engine_with(
        &project,
        SyncOptions {
            force: true,
            ..SyncOptions::default()
        },
    );

    let result = engine
        .sync_memory(&mut caller, &path, SyncOperation::Update)
        .await;

    assert!(result.success);
    assert_eq!(result.operation, SyncOperation::Update);
    assert_eq!(caller.calls_to("update_memory").len(), 1);
}

#[tokio::test]
async fn test_update_changed_content_keeps_remote_id() {
    let project = TestProject::new();
    let path = project.write_memory("foo", "hello");
    let mut caller = RecordingCaller::new().respond_created(7);
    let mut engine = engine(&project);
    engine
        .sync_memory(&mut caller, &path, SyncOperation::Create)
        .await;

    project.write_memory("foo", "hello world");
    let result = engine
        .sync_memory(&mut caller, &path, SyncOperation::Update)
        .await;

    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.operation, SyncOperation::Update);
    let updates = caller.calls_to("update_memory");
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].arguments["memory_id"], json!(7));
    assert_eq!(updates[0].arguments["content"], "hello world");
    assert_eq!(
        project.read_state(),
        json!({"foo": {"forgetful_id": "7", "hash": compute_content_hash(b"hello world")}})
    );
}

#[tokio::test]
async fn test_update_without_known_id_creates() {
    let project = TestProject::new();
    let path = project.write_memory("foo", "hello");
    let mut caller = RecordingCaller::new().respond_created(11);
    let mut engine = engine(&project);

    let result = engine
        .sync_memory(&mut caller, &path, SyncOperation::Update)
        .await;

    assert!(result.success);
    assert_eq!(result.operation, SyncOperation::Create);
    assert_eq!(caller.calls_to("create_memory").len(), 1);
    assert_eq!(project.read_state()["foo"]["forgetful_id"], "11");
}

#[tokio::test]
async fn test_failed_fallback_create_reports_create() {
    let project = TestProject::new();
    let path = project.write_memory("foo", "hello");
    let mut caller = RecordingCaller::new().fail(transport_error());
    let mut engine = engine(&project);

    let result = engine
        .sync_memory(&mut caller, &path, SyncOperation::Update)
        .await;

    assert!(!result.success);
    assert_eq!(result.operation, SyncOperation::Create);
    assert_eq!(caller.calls_to("create_memory").len(), 1);
    assert!(caller.calls_to("update_memory").is_empty());
    assert!(!engine.state().contains("foo"));
}

#[tokio::test]
async fn test_parse_error_makes_no_remote_call() {
    let project = TestProject::new();
    let path = project.write_memory("broken", "---\nconfidence: 2.5\n---\nbody\n");
    let mut caller = RecordingCaller::new();
    let mut engine = engine(&project);

    let result = engine
        .sync_memory(&mut caller, &path, SyncOperation::Create)
        .await;

    assert!(!result.success);
    assert!(
        result.error.as_deref().unwrap().starts_with("Parse error"),
        "error: {:?}",
        result.error
    );
    assert!(caller.calls.is_empty());
    assert_eq!(project.read_state(), serde_json::Value::Null);
}

#[tokio::test]
async fn test_missing_file_is_reported_as_failure() {
    let project = TestProject::new();
    let mut caller = RecordingCaller::new();
    let mut engine = engine(&project);

    let result = engine
        .sync_memory(&mut caller, &project.memory_path("ghost"), SyncOperation::Create)
        .await;

    assert!(!result.success);
    assert!(caller.calls.is_empty());
}

#[tokio::test]
async fn test_dry_run_never_calls_remote_or_writes_state() {
    let project = TestProject::new();
    let path = project.write_memory("foo", "hello");
    let mut caller = RecordingCaller::new();
    let mut engine = engine_with(
        &project,
        SyncOptions {
            dry_run: true,
            ..SyncOptions::default()
        },
    );

    let result = engine
        .sync_memory(&mut caller, &path, SyncOperation::Create)
        .await;

    assert!(result.success);
    assert_eq!(result.operation, SyncOperation::Create);
    assert!(caller.calls.is_empty());
    assert!(!project.exists(".memory_sync_state.json"));
}

#[tokio::test]
async fn test_tool_error_on_create_is_caught() {
    let project = TestProject::new();
    let path = project.write_memory("foo", "hello");
    let mut caller =
        RecordingCaller::new().fail(memsync_mcp::Error::tool("tool execution error: quota"));
    let mut engine = engine(&project);

    let result = engine
        .sync_memory(&mut caller, &path, SyncOperation::Create)
        .await;

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("quota"));
    assert!(!engine.state().contains("foo"));
}

#[tokio::test]
async fn test_create_response_without_id_is_failure() {
    let project = TestProject::new();
    let path = project.write_memory("foo", "hello");
    let mut caller = RecordingCaller::new()
        .respond(json!({"content": [{"type": "text", "text": "Memory stored"}]}));
    let mut engine = engine(&project);

    let result = engine
        .sync_memory(&mut caller, &path, SyncOperation::Create)
        .await;

    assert!(!result.success);
    assert!(
        result
            .error
            .as_deref()
            .unwrap()
            .contains("Could not extract memory ID")
    );
    assert!(!engine.state().contains("foo"));
}

#[tokio::test]
async fn test_state_save_failure_reports_remote_id() {
    let project = TestProject::new();
    let path = project.write_memory("foo", "hello");
    let config = SyncConfig {
        state_file: PathBuf::from("blocked/state.json"),
        ..SyncConfig::default()
    };
    let mut engine = SyncEngine::new(project.root(), config, SyncOptions::default()).unwrap();
    // A regular file where the state directory should go
    project.write_file("blocked", "");
    let mut caller = RecordingCaller::new().respond_created(9);

    let result = engine
        .sync_memory(&mut caller, &path, SyncOperation::Create)
        .await;

    assert!(!result.success);
    assert_eq!(result.remote_id.as_deref(), Some("9"));
    assert!(result.error.as_deref().unwrap().contains("state was not saved"));
}

// ==========================================================================
// DELETE
// ==========================================================================

#[tokio::test]
async fn test_delete_without_entry_is_skip() {
    let project = TestProject::new();
    let mut caller = RecordingCaller::new();
    let mut engine = engine(&project);

    let result = engine
        .sync_memory(&mut caller, &project.memory_path("foo"), SyncOperation::Delete)
        .await;

    assert!(result.success);
    assert_eq!(result.operation, SyncOperation::Skip);
    assert!(caller.calls.is_empty());
}

#[tokio::test]
async fn test_delete_marks_obsolete_and_removes_entry() {
    let project = TestProject::new();
    project.write_state(&json!({
        "foo": {"forgetful_id": "7", "hash": "abc"},
        "bar": {"forgetful_id": "8", "hash": "def"},
    }));
    let mut caller = RecordingCaller::new();
    let mut engine = engine(&project);

    let result = engine
        .sync_memory(&mut caller, &project.memory_path("foo"), SyncOperation::Delete)
        .await;

    assert!(result.success);
    assert_eq!(result.operation, SyncOperation::Delete);
    assert_eq!(result.remote_id.as_deref(), Some("7"));
    assert_eq!(
        caller.calls[0].arguments,
        json!({"memory_id": 7, "reason": "Deleted from Serena: .serena/memories/foo.md"})
    );
    assert_eq!(caller.calls[0].name, "mark_memory_obsolete");
    assert_eq!(
        project.read_state(),
        json!({"bar": {"forgetful_id": "8", "hash": "def"}})
    );
}

#[tokio::test]
async fn test_delete_failure_is_caught_and_entry_kept() {
    let project = TestProject::new();
    project.write_state(&json!({"foo": {"forgetful_id": "7", "hash": "abc"}}));
    let mut caller = RecordingCaller::new().fail(transport_error());
    let mut engine = engine(&project);

    let result = engine
        .sync_memory(&mut caller, &project.memory_path("foo"), SyncOperation::Delete)
        .await;

    assert!(!result.success);
    assert_eq!(result.operation, SyncOperation::Delete);
    assert!(result.error.as_deref().unwrap().contains("database locked"));
    assert!(engine.state().contains("foo"));
    assert_eq!(project.read_state()["foo"]["forgetful_id"], "7");
}

#[tokio::test]
async fn test_delete_dry_run_keeps_entry() {
    let project = TestProject::new();
    project.write_state(&json!({"foo": {"forgetful_id": "7", "hash": "abc"}}));
    let mut caller = RecordingCaller::new();
    let mut engine = engine_with(
        &project,
        SyncOptions {
            dry_run: true,
            ..SyncOptions::default()
        },
    );

    let result = engine
        .sync_memory(&mut caller, &project.memory_path("foo"), SyncOperation::Delete)
        .await;

    assert!(result.success);
    assert_eq!(result.operation, SyncOperation::Delete);
    assert!(caller.calls.is_empty());
    assert!(engine.state().contains("foo"));
}

// ==========================================================================
// Batches
// ==========================================================================

#[tokio::test]
async fn test_batch_continues_after_failure_and_persists_progress() {
    let project = TestProject::new();
    let a = project.write_memory("a", "first");
    let b = project.write_memory("b", "second");
    let c = project.write_memory("c", "third");
    let mut caller = RecordingCaller::new()
        .respond_created(1)
        .fail(transport_error())
        .respond_created(3);
    let mut engine = engine(&project);

    let results = engine
        .sync_batch(
            &mut caller,
            &[
                (a, SyncOperation::Create),
                (b, SyncOperation::Create),
                (c, SyncOperation::Create),
            ],
        )
        .await;

    let outcomes: Vec<bool> = results.iter().map(|r| r.success).collect();
    assert_eq!(outcomes, vec![true, false, true]);

    let state = project.read_state();
    assert_eq!(state["a"]["forgetful_id"], "1");
    assert!(state.get("b").is_none());
    assert_eq!(state["c"]["forgetful_id"], "3");
}

#[tokio::test]
async fn test_state_survives_a_new_engine() {
    let project = TestProject::new();
    let path = project.write_memory("foo", "hello");
    let mut caller = RecordingCaller::new().respond_created(7);
    engine(&project)
        .sync_memory(&mut caller, &path, SyncOperation::Create)
        .await;

    let engine = engine(&project);
    assert_eq!(engine.state().get("foo").unwrap().remote_id, "7");
    assert_eq!(engine.operation_for(&path), SyncOperation::Update);
}

// ==========================================================================
// Configuration seams
// ==========================================================================

#[derive(Debug)]
struct UppercaseParser;

impl MemoryParser for UppercaseParser {
    fn parse(&self, path: &Path, source: &[u8]) -> memsync_core::Result<MemoryRecord> {
        let text = String::from_utf8(source.to_vec()).map_err(|e| Error::parse(path, e.to_string()))?;
        Ok(MemoryRecord {
            id: "custom".to_string(),
            subject: String::new(),
            content: text.to_uppercase(),
            tags: vec!["x".to_string()],
            confidence: 1.0,
            path: path.to_path_buf(),
        })
    }
}

#[tokio::test]
async fn test_custom_parser_and_tool_names() {
    let project = TestProject::new();
    let path = project.write_memory("foo", "hello");
    let mut config = SyncConfig::default();
    config.tools.create_memory = "store_memory".to_string();
    config.source_repo = Some("me/repo".to_string());
    let mut engine = SyncEngine::new(project.root(), config, SyncOptions::default())
        .unwrap()
        .with_parser(Box::new(UppercaseParser));
    let mut caller = RecordingCaller::new().respond_created(5);

    let result = engine
        .sync_memory(&mut caller, &path, SyncOperation::Create)
        .await;

    assert!(result.success);
    let call = &caller.calls[0];
    assert_eq!(call.name, "store_memory");
    assert_eq!(call.arguments["title"], "custom");
    assert_eq!(call.arguments["content"], "HELLO");
    assert_eq!(call.arguments["importance"], 10);
    assert_eq!(call.arguments["source_repo"], "me/repo");
}
