//! Dependency resolver guarantees, exercised over whole workflows.

use dayflow::core::graph::{self, DependencyGraph, ValidationError};
use dayflow::core::task::TaskId;
use dayflow::workflow::DailyWorkflow;
use dayflow::Error;

use crate::fixtures::{seed, test_date};

fn workflow_from(seeds: Vec<dayflow::orchestration::TaskSeed>) -> DailyWorkflow {
    DailyWorkflow::new(
        "alice",
        test_date(),
        seeds.into_iter().map(|s| s.into_task()).collect(),
    )
}

/// Test: Validation fails exactly on cycles and missing edges
/// Given workflows with and without structural problems
/// When each is validated
/// Then is_valid is false iff a cycle or a dangling edge exists
#[test]
fn test_validation_iff_cycle_or_missing_edge() {
    let clean = workflow_from(vec![seed("a", &[]), seed("b", &["a"])]);
    assert!(graph::validate(&clean).is_valid);

    let cyclic = workflow_from(vec![seed("a", &["b"]), seed("b", &["a"])]);
    assert!(!graph::validate(&cyclic).is_valid);

    let dangling = workflow_from(vec![seed("a", &["z"])]);
    assert!(!graph::validate(&dangling).is_valid);

    // Orphans alone never invalidate
    let orphaned = workflow_from(vec![seed("a", &[]), seed("b", &[])]);
    let report = graph::validate(&orphaned);
    assert!(report.is_valid);
    assert_eq!(report.warnings.len(), 2);
}

/// Test: Scenario - readiness cascade
/// Given tasks A (no deps), B (deps: A), C (deps: A)
/// When A completes
/// Then ready moves from [A] to [B, C]
#[test]
fn test_readiness_cascade() {
    let mut workflow = workflow_from(vec![
        seed("a", &[]),
        seed("b", &["a"]),
        seed("c", &["a"]),
    ]);

    let ready: Vec<&str> = graph::ready_tasks(&workflow)
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(ready, vec!["a"]);

    workflow.task_mut(&TaskId::from("a")).unwrap().complete();

    let ready: Vec<&str> = graph::ready_tasks(&workflow)
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(ready, vec!["b", "c"]);
}

/// Test: Scenario - mutual dependency
/// Given tasks A (deps: B), B (deps: A)
/// When validated
/// Then the cycle error lists both A and B
#[test]
fn test_mutual_dependency_lists_both() {
    let workflow = workflow_from(vec![seed("a", &["b"]), seed("b", &["a"])]);
    let report = graph::validate(&workflow);

    assert!(!report.is_valid);
    let members = report
        .errors
        .iter()
        .find_map(|e| match e {
            ValidationError::Cycle { members } => Some(members),
            _ => None,
        })
        .expect("cycle error expected");
    assert!(members.contains(&TaskId::from("a")));
    assert!(members.contains(&TaskId::from("b")));
}

/// Test: Scenario - dangling edge
/// Given a task depending on "z" which does not exist
/// When validated
/// Then the error references the a -> z edge
#[test]
fn test_dangling_edge_named_in_error() {
    let workflow = workflow_from(vec![seed("a", &["z"])]);
    let report = graph::validate(&workflow);

    assert!(!report.is_valid);
    assert!(report
        .errors
        .iter()
        .any(|e| e.to_string().contains("a -> z")));
}

/// Test: Topological order is a dependency-respecting permutation
/// Given a workflow with a diamond plus independent tasks
/// When ordered
/// Then every task appears once, after all of its dependencies
#[test]
fn test_order_is_dependency_respecting_permutation() {
    let workflow = workflow_from(vec![
        seed("d", &["b", "c"]),
        seed("b", &["a"]),
        seed("c", &["a"]),
        seed("a", &[]),
        seed("solo", &[]),
    ]);

    let order = graph::optimal_order(&workflow).unwrap();

    assert_eq!(order.len(), workflow.tasks.len());
    let position =
        |id: &str| order.iter().position(|t| t.id.as_str() == id).unwrap();
    for task in &workflow.tasks {
        for dep in &task.dependencies {
            assert!(
                position(dep.as_str()) < position(task.id.as_str()),
                "{} must precede {}",
                dep,
                task.id
            );
        }
    }
}

/// Test: Independent subtrees keep the input order
#[test]
fn test_order_stable_for_independent_subtrees() {
    let workflow = workflow_from(vec![
        seed("y", &["x"]),
        seed("x", &[]),
        seed("n", &["m"]),
        seed("m", &[]),
    ]);

    let order: Vec<String> = graph::optimal_order(&workflow)
        .unwrap()
        .iter()
        .map(|t| t.id.to_string())
        .collect();

    assert_eq!(order, vec!["x", "y", "m", "n"]);
}

/// Test: A cycle during ordering is fatal with no partial order
#[test]
fn test_order_cycle_yields_no_partial_result() {
    let workflow = workflow_from(vec![
        seed("a", &[]),
        seed("b", &["c"]),
        seed("c", &["b"]),
    ]);

    match graph::optimal_order(&workflow) {
        Err(Error::CircularDependency { members }) => {
            assert!(members.contains(&TaskId::from("b")));
            assert!(members.contains(&TaskId::from("c")));
        }
        other => panic!("Expected CircularDependency, got {:?}", other),
    }
}

/// Test: Dependency chain is the transitive closure, deduplicated
#[test]
fn test_dependency_chain_closure() {
    let workflow = workflow_from(vec![
        seed("a", &[]),
        seed("b", &["a"]),
        seed("c", &["a", "b"]),
    ]);
    let graph = DependencyGraph::build(&workflow);

    let chain = graph.dependency_chain(&TaskId::from("c"));

    assert_eq!(chain.len(), 2);
    assert!(chain.contains(&TaskId::from("a")));
    assert!(chain.contains(&TaskId::from("b")));
}

/// Test: The empty workflow is valid and fully quiet
#[test]
fn test_empty_workflow_valid() {
    let workflow = workflow_from(vec![]);

    let report = graph::validate(&workflow);
    assert!(report.is_valid);
    assert!(graph::ready_tasks(&workflow).is_empty());
    assert!(graph::blocked_tasks(&workflow).is_empty());
    assert!(graph::optimal_order(&workflow).unwrap().is_empty());
}
