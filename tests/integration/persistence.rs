//! Persistence and session restore tests.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use dayflow::core::task::TaskId;
use dayflow::store::{JsonFileStore, WorkflowStore};
use dayflow::workflow::{WorkflowId, WorkflowStatus};
use dayflow::{Config, Error, WorkflowOrchestrator};

use crate::fixtures::{seed, test_date, RecordingNavigator, ScriptedSource};

/// Test: Scenario - one corrupt record among valid ones
/// Given a store holding two valid records and one whose tasks field is a
/// string
/// When all records load
/// Then the corrupt record is skipped and deleted; both valid ones load
#[tokio::test]
async fn test_corrupt_record_does_not_block_load() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());

    // Two valid records via the normal save path
    let mut orchestrator = WorkflowOrchestrator::new(
        Arc::new(ScriptedSource::new(vec![seed("a", &[])])),
        Arc::new(RecordingNavigator::new()),
        Arc::new(JsonFileStore::new(dir.path())),
        Config {
            auto_advance: false,
            ..Config::default()
        },
    );
    orchestrator
        .generate_workflow("alice", test_date(), None)
        .await
        .unwrap();
    orchestrator
        .generate_workflow("bob", test_date(), None)
        .await
        .unwrap();

    let bad = dir.path().join("workflow-mallory-2026-08-06.json");
    fs::write(
        &bad,
        r#"{"id": "workflow-mallory-2026-08-06", "date": "2026-08-06", "userId": "mallory", "tasks": "not-a-sequence"}"#,
    )
    .unwrap();

    let (loaded, errors) = store.load_all();

    assert_eq!(loaded.len(), 2);
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], Error::CorruptRecord(_)));
    assert!(!bad.exists());
}

/// Test: Workflow state survives a session boundary
/// Given a workflow with one completed task
/// When a fresh orchestrator restores from the same store
/// Then counters, statuses and graph readiness are all back
#[tokio::test]
async fn test_restore_across_sessions() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        auto_advance: false,
        ..Config::default()
    };

    let workflow_id = {
        let mut first_session = WorkflowOrchestrator::new(
            Arc::new(ScriptedSource::new(vec![seed("a", &[]), seed("b", &["a"])])),
            Arc::new(RecordingNavigator::new()),
            Arc::new(JsonFileStore::new(dir.path())),
            config.clone(),
        );
        let workflow = first_session
            .generate_workflow("alice", test_date(), None)
            .await
            .unwrap();
        first_session.start_workflow(&workflow.id).unwrap();
        first_session
            .complete_task(&workflow.id, &TaskId::from("a"), None)
            .await
            .unwrap();
        workflow.id
    };

    let mut second_session = WorkflowOrchestrator::new(
        Arc::new(ScriptedSource::new(vec![])),
        Arc::new(RecordingNavigator::new()),
        Arc::new(JsonFileStore::new(dir.path())),
        config,
    );
    let restored = second_session.restore();

    assert_eq!(restored, 1);
    let workflow = second_session.workflow(&workflow_id).unwrap();
    assert_eq!(workflow.completed_tasks, 1);
    assert_eq!(workflow.workflow_status, WorkflowStatus::InProgress);
    assert!(workflow.task(&TaskId::from("a")).unwrap().completed_at.is_some());

    let progress = second_session.progress(&workflow_id).unwrap();
    assert_eq!(progress.completed_tasks, 1);
}

/// Test: Restore is idempotent against regeneration
/// Given a restored workflow
/// When generation is requested for the same (user, date)
/// Then the restored workflow returns without a task-source fetch
#[tokio::test]
async fn test_restore_preserves_generation_idempotence() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        auto_advance: false,
        ..Config::default()
    };

    {
        let mut first_session = WorkflowOrchestrator::new(
            Arc::new(ScriptedSource::new(vec![seed("a", &[])])),
            Arc::new(RecordingNavigator::new()),
            Arc::new(JsonFileStore::new(dir.path())),
            config.clone(),
        );
        first_session
            .generate_workflow("alice", test_date(), None)
            .await
            .unwrap();
    }

    let source = Arc::new(ScriptedSource::new(vec![seed("other", &[])]));
    let mut second_session = WorkflowOrchestrator::new(
        source.clone(),
        Arc::new(RecordingNavigator::new()),
        Arc::new(JsonFileStore::new(dir.path())),
        config,
    );
    second_session.restore();

    let workflow = second_session
        .generate_workflow("alice", test_date(), None)
        .await
        .unwrap();

    assert_eq!(source.fetch_count(), 0);
    assert_eq!(workflow.tasks[0].id, TaskId::from("a"));
}

/// Test: Clearing completed workflows removes their stored records
#[tokio::test]
async fn test_clear_completed_removes_stored_records() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    let mut orchestrator = WorkflowOrchestrator::new(
        Arc::new(ScriptedSource::new(vec![seed("a", &[])])),
        Arc::new(RecordingNavigator::new()),
        Arc::new(JsonFileStore::new(dir.path())),
        Config {
            auto_advance: false,
            ..Config::default()
        },
    );
    let workflow = orchestrator
        .generate_workflow("alice", test_date(), None)
        .await
        .unwrap();
    orchestrator
        .complete_task(&workflow.id, &TaskId::from("a"), None)
        .await
        .unwrap();

    orchestrator.clear_completed();

    let (loaded, errors) = store.load_all();
    assert!(loaded.is_empty());
    assert!(errors.is_empty());
}

/// Test: Removing an absent record stays quiet
#[test]
fn test_remove_missing_record_is_ok() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    assert!(store.remove(&WorkflowId::from("never-there")).is_ok());
}
