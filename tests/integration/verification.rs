//! Completion verification scenarios, driven through the public surface.

use chrono::{Duration, Utc};

use dayflow::core::task::TaskId;
use dayflow::verify::{
    CompletionVerifier, ExecutionContext, PlatformData, UserActivity,
};

use crate::fixtures::{seed, seed_in_pillar, test_date, TestHarness};

/// Test: Scenario - bare task under the generic heuristic
/// Given a task with neither start nor completion timestamp
/// When verified
/// Then confidence is zero with both missing-timestamp warnings
#[test]
fn test_generic_bare_task_scores_zero() {
    let mut verifier = CompletionVerifier::new();
    // "draft" has no registered rule; the generic fallback runs
    let mut task = seed_in_pillar("a", "plan", &[]).into_task();
    task.action_type = "draft".to_string();

    let result = verifier.verify(&task, None);

    assert!(!result.is_completed);
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.warnings.len(), 2);
}

/// Test: Scenario - navigation task with strong evidence
/// Given location match, activity after start, elapsed 60% of estimate
/// When verified
/// Then confidence clears the navigation bar and completion is judged real
#[test]
fn test_navigation_strong_evidence_completes() {
    let mut verifier = CompletionVerifier::new();
    let mut task = seed("go", &[]).into_task();
    task.estimated_time = 20;
    let start = Utc::now() - Duration::minutes(12);
    task.started_at = Some(start);
    task.completed_at = Some(start + Duration::minutes(12));

    let context = ExecutionContext {
        user_id: "alice".to_string(),
        timestamp: Utc::now(),
        platform_data: Some(PlatformData {
            current_location: Some("/go".to_string()),
            last_activity_at: None,
        }),
        user_activity: Some(UserActivity {
            events: vec![start + Duration::minutes(5)],
        }),
    };

    let result = verifier.verify(&task, Some(&context));

    assert!(result.confidence >= 0.6);
    assert!(result.is_completed);
}

/// Test: Confidence stays in [0, 1] across degenerate inputs
#[test]
fn test_confidence_bounds() {
    let mut verifier = CompletionVerifier::new();

    let mut zero_estimate = seed("go", &[]).into_task();
    zero_estimate.estimated_time = 0;
    let start = Utc::now() - Duration::minutes(90);
    zero_estimate.started_at = Some(start);
    zero_estimate.completed_at = Some(start + Duration::minutes(90));

    let saturated_context = ExecutionContext {
        user_id: "alice".to_string(),
        timestamp: Utc::now(),
        platform_data: Some(PlatformData {
            current_location: Some("/go".to_string()),
            last_activity_at: Some(start + Duration::minutes(80)),
        }),
        user_activity: Some(UserActivity {
            events: vec![start + Duration::minutes(1)],
        }),
    };

    for context in [None, Some(&saturated_context)] {
        let result = verifier.verify(&zero_estimate, context);
        assert!((0.0..=1.0).contains(&result.confidence));
    }
}

/// Test: Absent context degrades to fewer signals, never an error
#[test]
fn test_missing_context_degrades_gracefully() {
    let mut verifier = CompletionVerifier::new();
    let mut task = seed("go", &[]).into_task();
    task.complete();

    let bare_context = ExecutionContext::new("alice");

    let with_nothing = verifier.verify(&task, None);
    let with_bare = verifier.verify(&task, Some(&bare_context));

    // Same signals available either way: none of the context ones
    assert_eq!(with_nothing.confidence, with_bare.confidence);
    assert!(!with_nothing.warnings.is_empty());
}

/// Test: Verification through the orchestrator is advisory telemetry
/// Given a completion with no supporting evidence
/// When the task is completed
/// Then the task completes anyway and the low-confidence result is recorded
#[tokio::test]
async fn test_verification_never_gates_completion() {
    let mut h = TestHarness::new(vec![seed("a", &[])]);
    let workflow = h
        .orchestrator
        .generate_workflow("alice", test_date(), None)
        .await
        .unwrap();

    let completion = h
        .orchestrator
        .complete_task(&workflow.id, &TaskId::from("a"), None)
        .await
        .unwrap();

    // Completed despite weak navigation evidence
    assert_eq!(completion.progress.completed_tasks, 1);
    assert!(completion.verification.confidence < 0.6);

    let history = h.orchestrator.verifier().history(&TaskId::from("a"));
    assert_eq!(history.len(), 1);
}

/// Test: History is bounded and statistics derive from what is retained
#[test]
fn test_history_bound_and_stats() {
    let mut verifier = CompletionVerifier::new();
    let mut task = seed_in_pillar("a", "plan", &[]).into_task();
    task.action_type = "review".to_string();
    task.complete();

    for _ in 0..15 {
        verifier.verify(&task, None);
    }

    assert_eq!(verifier.history(&task.id).len(), 10);

    let stats = verifier.stats();
    assert_eq!(stats.total_verifications, 10);
    assert!(stats.average_confidence > 0.0);
    assert_eq!(stats.completion_rate, 1.0);
}

/// Test: A custom rule registered for a pillar/action key takes over
#[tokio::test]
async fn test_custom_rule_registration() {
    use dayflow::core::task::Task;
    use dayflow::verify::{CompletionRule, VerificationResult};

    struct AlwaysTrusted;

    impl CompletionRule for AlwaysTrusted {
        fn verify(
            &self,
            _task: &Task,
            _context: Option<&ExecutionContext>,
        ) -> dayflow::Result<VerificationResult> {
            Ok(VerificationResult {
                is_completed: true,
                confidence: 1.0,
                evidence: vec!["Editorial sign-off on file".to_string()],
                warnings: Vec::new(),
                suggestions: Vec::new(),
            })
        }
    }

    let mut h = TestHarness::new(vec![seed_in_pillar("a", "publish", &[])]);
    h.orchestrator
        .verifier_mut()
        .register_rule("publish", "navigate", Box::new(AlwaysTrusted));

    let workflow = h
        .orchestrator
        .generate_workflow("alice", test_date(), None)
        .await
        .unwrap();
    let completion = h
        .orchestrator
        .complete_task(&workflow.id, &TaskId::from("a"), None)
        .await
        .unwrap();

    assert!(completion.verification.is_completed);
    assert_eq!(completion.verification.confidence, 1.0);
    assert_eq!(
        completion.verification.evidence,
        vec!["Editorial sign-off on file".to_string()]
    );
}
