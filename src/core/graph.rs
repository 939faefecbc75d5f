//! Dependency graph resolver for daily workflows.
//!
//! The graph is a pure function of the workflow's current task statuses and
//! declared dependency edges: callers rebuild it whenever they need a fresh
//! view instead of patching long-lived state. [`DependencyGraph::update_status`]
//! exists for the orchestrator's hot path and propagates readiness to direct
//! dependents only; anything further is resolved on the next build.

use crate::core::task::{Task, TaskId, TaskStatus};
use crate::error::{Error, Result};
use crate::workflow::DailyWorkflow;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Computed status of a task node within the graph.
///
/// Completed and skipped mirror the task's own status; ready means every
/// dependency is terminal; blocked means at least one is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Ready,
    Blocked,
    Completed,
    Skipped,
}

impl NodeStatus {
    fn from_task(status: TaskStatus) -> Option<Self> {
        match status {
            TaskStatus::Completed => Some(NodeStatus::Completed),
            TaskStatus::Skipped => Some(NodeStatus::Skipped),
            TaskStatus::Pending | TaskStatus::InProgress => None,
        }
    }

    /// Whether this node satisfies its dependents.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeStatus::Completed | NodeStatus::Skipped)
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Ready => write!(f, "ready"),
            NodeStatus::Blocked => write!(f, "blocked"),
            NodeStatus::Completed => write!(f, "completed"),
            NodeStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// A structural problem found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A dependency loop; every member task id is listed.
    Cycle { members: Vec<TaskId> },
    /// An edge pointing at a task id absent from the workflow.
    MissingDependency { task: TaskId, missing: TaskId },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Cycle { members } => {
                let chain: Vec<&str> = members.iter().map(|t| t.as_str()).collect();
                write!(f, "Circular dependency: {}", chain.join(" -> "))
            }
            ValidationError::MissingDependency { task, missing } => {
                write!(f, "Missing dependency: {} -> {}", task, missing)
            }
        }
    }
}

/// Result of validating a workflow's dependency structure.
///
/// Orphan tasks (no dependencies, no dependents) are reported as warnings
/// only; a standalone task is legal. `is_valid` is false exactly when a
/// cycle or missing-dependency error exists.
#[derive(Debug, Clone)]
pub struct GraphValidation {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
    pub ready_tasks: Vec<TaskId>,
    pub blocked_tasks: Vec<TaskId>,
}

/// Node payload: the task id plus its computed status.
#[derive(Debug, Clone)]
struct GraphNode {
    task_id: TaskId,
    status: NodeStatus,
}

/// The dependency graph of one workflow.
///
/// Uses petgraph's DiGraph with edges running from a dependency to the task
/// that depends on it, so outgoing neighbors are dependents and incoming
/// neighbors are dependencies. Node insertion follows the task array, which
/// keeps every traversal deterministic for a fixed input.
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, ()>,
    index: HashMap<TaskId, NodeIndex>,
    /// Declared edges whose target id is absent from the workflow.
    missing: Vec<(TaskId, TaskId)>,
}

impl DependencyGraph {
    /// Build the graph for a workflow from its current task statuses.
    pub fn build(workflow: &DailyWorkflow) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for task in &workflow.tasks {
            let node = graph.add_node(GraphNode {
                task_id: task.id.clone(),
                status: NodeStatus::Blocked,
            });
            index.insert(task.id.clone(), node);
        }

        let mut missing = Vec::new();
        for task in &workflow.tasks {
            let to = index[&task.id];
            for dep in &task.dependencies {
                match index.get(dep) {
                    Some(&from) => {
                        graph.add_edge(from, to, ());
                    }
                    None => missing.push((task.id.clone(), dep.clone())),
                }
            }
        }

        let mut resolver = Self {
            graph,
            index,
            missing,
        };
        for task in &workflow.tasks {
            let status = match NodeStatus::from_task(task.status) {
                Some(terminal) => terminal,
                None => resolver.computed_readiness(resolver.index[&task.id], workflow),
            };
            let idx = resolver.index[&task.id];
            resolver.graph[idx].status = status;
        }
        resolver
    }

    /// Readiness of a non-terminal node, from the workflow's task statuses.
    fn computed_readiness(&self, idx: NodeIndex, workflow: &DailyWorkflow) -> NodeStatus {
        let id = &self.graph[idx].task_id;
        if self.missing.iter().any(|(task, _)| task == id) {
            return NodeStatus::Blocked;
        }
        let satisfied = workflow
            .task(id)
            .map(|task| {
                task.dependencies.iter().all(|dep| {
                    workflow
                        .task(dep)
                        .map(|d| d.status.is_terminal())
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);
        if satisfied {
            NodeStatus::Ready
        } else {
            NodeStatus::Blocked
        }
    }

    /// Readiness of a non-terminal node, from the live graph statuses.
    fn live_readiness(&self, idx: NodeIndex) -> NodeStatus {
        let id = &self.graph[idx].task_id;
        if self.missing.iter().any(|(task, _)| task == id) {
            return NodeStatus::Blocked;
        }
        let satisfied = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .all(|dep| self.graph[dep].status.is_terminal());
        if satisfied {
            NodeStatus::Ready
        } else {
            NodeStatus::Blocked
        }
    }

    /// Computed status of a task node.
    pub fn node_status(&self, id: &TaskId) -> Option<NodeStatus> {
        self.index.get(id).map(|&idx| self.graph[idx].status)
    }

    /// Direct dependencies of a task, as declared.
    pub fn dependencies(&self, id: &TaskId) -> Vec<TaskId> {
        self.neighbor_ids(id, Direction::Incoming)
    }

    /// Direct dependents of a task (the inverse edge set).
    pub fn dependents(&self, id: &TaskId) -> Vec<TaskId> {
        self.neighbor_ids(id, Direction::Outgoing)
    }

    fn neighbor_ids(&self, id: &TaskId, direction: Direction) -> Vec<TaskId> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut neighbors: Vec<NodeIndex> =
            self.graph.neighbors_directed(idx, direction).collect();
        // petgraph yields neighbors newest-edge-first; restore input order.
        neighbors.sort();
        neighbors
            .into_iter()
            .map(|n| self.graph[n].task_id.clone())
            .collect()
    }

    /// Number of task nodes.
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of resolvable dependency edges.
    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    /// Record a task's new status and refresh the readiness of its direct
    /// dependents.
    ///
    /// Dependents of dependents are left as-is; they are resolved on the
    /// next graph build or explicit query. That staleness window is the
    /// price of not recomputing the whole graph on every status change.
    pub fn update_status(&mut self, id: &TaskId, status: TaskStatus) {
        let Some(&idx) = self.index.get(id) else {
            return;
        };
        self.graph[idx].status = match NodeStatus::from_task(status) {
            Some(terminal) => terminal,
            None => self.live_readiness(idx),
        };

        let dependents: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        for dep_idx in dependents {
            if self.graph[dep_idx].status.is_terminal() {
                continue;
            }
            self.graph[dep_idx].status = self.live_readiness(dep_idx);
        }
    }

    /// All transitive dependencies of a task, deduplicated.
    ///
    /// Used for "what must finish before this" displays.
    pub fn dependency_chain(&self, id: &TaskId) -> Vec<TaskId> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut chain = Vec::new();
        let mut stack: Vec<NodeIndex> = {
            let mut deps: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(start, Direction::Incoming)
                .collect();
            deps.sort();
            deps.reverse();
            deps
        };
        while let Some(idx) = stack.pop() {
            if idx == start || !seen.insert(idx) {
                continue;
            }
            chain.push(self.graph[idx].task_id.clone());
            let mut deps: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .collect();
            deps.sort();
            deps.reverse();
            stack.extend(deps);
        }
        chain
    }

    /// Tasks that become ready as an immediate consequence of `id` reaching
    /// a terminal state.
    ///
    /// A dependent qualifies when it is currently blocked and every one of
    /// its other dependencies is already terminal. Call this before
    /// recording the new status with [`update_status`]; afterwards the
    /// dependents are already ready and nothing "becomes" so.
    pub fn completion_impact(&self, id: &TaskId) -> Vec<TaskId> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut dependents: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        dependents.sort();

        dependents
            .into_iter()
            .filter(|&dep_idx| {
                let node = &self.graph[dep_idx];
                if node.status != NodeStatus::Blocked {
                    return false;
                }
                if self.missing.iter().any(|(task, _)| task == &node.task_id) {
                    return false;
                }
                self.graph
                    .neighbors_directed(dep_idx, Direction::Incoming)
                    .all(|other| other == idx || self.graph[other].status.is_terminal())
            })
            .map(|dep_idx| self.graph[dep_idx].task_id.clone())
            .collect()
    }
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .field("missing", &self.missing.len())
            .finish()
    }
}

/// Validate a workflow's dependency structure.
///
/// Three checks, in order: cycle detection (depth-first with a visiting
/// set, reporting every task id on a detected cycle), missing-dependency
/// detection, and orphan detection. Orphans are warnings and never
/// invalidate.
pub fn validate(workflow: &DailyWorkflow) -> GraphValidation {
    let by_id: HashMap<&TaskId, &Task> =
        workflow.tasks.iter().map(|t| (&t.id, t)).collect();

    // (a) Cycles: DFS with an explicit visiting stack. A back edge into the
    // stack yields the cycle as the stack suffix from the first occurrence.
    let mut errors = Vec::new();
    let mut visited: HashSet<TaskId> = HashSet::new();
    let mut stack: Vec<TaskId> = Vec::new();
    for task in &workflow.tasks {
        find_cycles(&task.id, &by_id, &mut visited, &mut stack, &mut errors);
    }

    // (b) Edges pointing at absent task ids.
    for task in &workflow.tasks {
        for dep in &task.dependencies {
            if !by_id.contains_key(dep) {
                errors.push(ValidationError::MissingDependency {
                    task: task.id.clone(),
                    missing: dep.clone(),
                });
            }
        }
    }

    // (c) Orphans: no dependencies declared, nothing depends on them.
    let referenced: HashSet<&TaskId> = workflow
        .tasks
        .iter()
        .flat_map(|t| t.dependencies.iter())
        .collect();
    let mut warnings = Vec::new();
    for task in &workflow.tasks {
        if task.dependencies.is_empty() && !referenced.contains(&task.id) {
            warnings.push(format!(
                "Task {} has no dependencies and no dependents",
                task.id
            ));
        }
    }

    let mut ready = Vec::new();
    let mut blocked = Vec::new();
    for task in &workflow.tasks {
        if task.status.is_terminal() {
            continue;
        }
        if deps_satisfied(task, &by_id) {
            ready.push(task.id.clone());
        } else {
            blocked.push(task.id.clone());
        }
    }

    GraphValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        ready_tasks: ready,
        blocked_tasks: blocked,
    }
}

fn find_cycles(
    id: &TaskId,
    by_id: &HashMap<&TaskId, &Task>,
    visited: &mut HashSet<TaskId>,
    stack: &mut Vec<TaskId>,
    errors: &mut Vec<ValidationError>,
) {
    if visited.contains(id) {
        return;
    }
    if let Some(pos) = stack.iter().position(|s| s == id) {
        errors.push(ValidationError::Cycle {
            members: stack[pos..].to_vec(),
        });
        return;
    }
    let Some(task) = by_id.get(id) else {
        return;
    };
    stack.push(id.clone());
    for dep in &task.dependencies {
        find_cycles(dep, by_id, visited, stack, errors);
    }
    stack.pop();
    visited.insert(id.clone());
}

fn deps_satisfied(task: &Task, by_id: &HashMap<&TaskId, &Task>) -> bool {
    task.dependencies.iter().all(|dep| {
        by_id
            .get(dep)
            .map(|d| d.status.is_terminal())
            .unwrap_or(false)
    })
}

/// Tasks whose dependencies are all terminal and whose own status is still
/// pending.
pub fn ready_tasks(workflow: &DailyWorkflow) -> Vec<&Task> {
    let by_id: HashMap<&TaskId, &Task> =
        workflow.tasks.iter().map(|t| (&t.id, t)).collect();
    workflow
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Pending && deps_satisfied(t, &by_id))
        .collect()
}

/// Tasks with at least one dependency not yet in a terminal state.
pub fn blocked_tasks(workflow: &DailyWorkflow) -> Vec<&Task> {
    let by_id: HashMap<&TaskId, &Task> =
        workflow.tasks.iter().map(|t| (&t.id, t)).collect();
    workflow
        .tasks
        .iter()
        .filter(|t| !t.status.is_terminal() && !deps_satisfied(t, &by_id))
        .collect()
}

/// Execution order via depth-first post-order traversal: every dependency
/// is emitted before the task that declares it.
///
/// Traversal among independent subtrees follows the task array's original
/// order, so the sort is deterministic and reproducible for a fixed input.
/// A cycle is fatal - the caller never receives a partial order.
pub fn optimal_order(workflow: &DailyWorkflow) -> Result<Vec<Task>> {
    let by_id: HashMap<&TaskId, &Task> =
        workflow.tasks.iter().map(|t| (&t.id, t)).collect();
    let mut visited: HashSet<TaskId> = HashSet::new();
    let mut stack: Vec<TaskId> = Vec::new();
    let mut order: Vec<Task> = Vec::with_capacity(workflow.tasks.len());

    for task in &workflow.tasks {
        emit_post_order(&task.id, &by_id, &mut visited, &mut stack, &mut order)?;
    }
    Ok(order)
}

fn emit_post_order(
    id: &TaskId,
    by_id: &HashMap<&TaskId, &Task>,
    visited: &mut HashSet<TaskId>,
    stack: &mut Vec<TaskId>,
    order: &mut Vec<Task>,
) -> Result<()> {
    if visited.contains(id) {
        return Ok(());
    }
    if let Some(pos) = stack.iter().position(|s| s == id) {
        return Err(Error::CircularDependency {
            members: stack[pos..].to_vec(),
        });
    }
    // Unknown ids cannot be ordered; validation reports them separately.
    let Some(task) = by_id.get(id) else {
        return Ok(());
    };
    stack.push(id.clone());
    for dep in &task.dependencies {
        emit_post_order(dep, by_id, visited, stack, order)?;
    }
    stack.pop();
    visited.insert(id.clone());
    order.push((*task).clone());
    Ok(())
}
