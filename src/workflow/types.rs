//! Core workflow type definitions.

use chrono::{serde::ts_milliseconds_option, DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::task::{Task, TaskId, TaskStatus};

/// Unique identifier for a daily workflow.
///
/// Derived deterministically from the owning user and calendar date, so
/// repeated generation requests for the same day address the same workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub String);

impl WorkflowId {
    /// Build the id for a `(user, date)` pair.
    pub fn for_user_date(user_id: &str, date: NaiveDate) -> Self {
        Self(format!("workflow-{}-{}", user_id, date.format("%Y-%m-%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkflowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorkflowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a workflow in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Workflow created but not yet started.
    #[default]
    NotStarted,
    /// Workflow is actively being worked.
    InProgress,
    /// Every task reached a terminal state.
    Completed,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStatus::NotStarted => write!(f, "not_started"),
            WorkflowStatus::InProgress => write!(f, "in_progress"),
            WorkflowStatus::Completed => write!(f, "completed"),
        }
    }
}

/// One day's ordered task set for one user.
///
/// The `tasks` sequence is execution order (established at generation), not
/// arrival order. `completed_tasks` counts terminal outcomes (completed or
/// skipped) and never decreases; it equals `total_tasks` exactly when
/// `workflow_status` is Completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWorkflow {
    pub id: WorkflowId,
    /// Calendar date, ISO form.
    pub date: NaiveDate,
    pub user_id: String,
    pub tasks: Vec<Task>,
    /// Cursor into `tasks`.
    pub current_task_index: usize,
    pub completed_tasks: u32,
    /// Fixed at creation.
    pub total_tasks: u32,
    pub workflow_status: WorkflowStatus,
    /// Sum of task estimates, minutes.
    pub total_estimated_time: u32,
    /// Accrued elapsed minutes across completed tasks.
    pub actual_time_spent: u32,
    #[serde(default, with = "ts_milliseconds_option")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl DailyWorkflow {
    /// Create a workflow from an execution-ordered task list.
    pub fn new(user_id: &str, date: NaiveDate, tasks: Vec<Task>) -> Self {
        let total_tasks = tasks.len() as u32;
        let total_estimated_time = tasks.iter().map(|t| t.estimated_time).sum();
        Self {
            id: WorkflowId::for_user_date(user_id, date),
            date,
            user_id: user_id.to_string(),
            tasks,
            current_task_index: 0,
            completed_tasks: 0,
            total_tasks,
            workflow_status: WorkflowStatus::NotStarted,
            total_estimated_time,
            actual_time_spent: 0,
            started_at: None,
            completed_at: None,
        }
    }

    /// Look up a task by id.
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Look up a task by id, mutably.
    pub fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }

    /// The task at the cursor, if any.
    pub fn current_task(&self) -> Option<&Task> {
        self.tasks.get(self.current_task_index)
    }

    /// Whether every task reached a terminal state.
    pub fn is_complete(&self) -> bool {
        self.completed_tasks == self.total_tasks
    }

    /// Progress summary for display.
    pub fn progress(&self) -> WorkflowProgress {
        let completion_percentage = if self.total_tasks == 0 {
            0.0
        } else {
            self.completed_tasks as f32 / self.total_tasks as f32 * 100.0
        };

        // "Not yet reached": at or beyond the cursor and still open.
        let estimated_time_remaining = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(i, t)| *i >= self.current_task_index && !t.status.is_terminal())
            .map(|(_, t)| t.estimated_time)
            .sum();

        WorkflowProgress {
            completed_tasks: self.completed_tasks,
            total_tasks: self.total_tasks,
            completion_percentage,
            current_task: self.current_task().cloned(),
            next_task: self.tasks.get(self.current_task_index + 1).cloned(),
            estimated_time_remaining,
            actual_time_spent: self.actual_time_spent,
            pillars: self.pillar_progress(),
        }
    }

    /// Per-pillar completion counts, in first-seen task order.
    pub fn pillar_progress(&self) -> Vec<PillarProgress> {
        let mut pillars: Vec<PillarProgress> = Vec::new();
        for task in &self.tasks {
            match pillars.iter_mut().find(|p| p.pillar_id == task.pillar_id) {
                Some(entry) => {
                    entry.total += 1;
                    if task.status.is_terminal() {
                        entry.completed += 1;
                    }
                }
                None => pillars.push(PillarProgress {
                    pillar_id: task.pillar_id.clone(),
                    completed: if task.status.is_terminal() { 1 } else { 0 },
                    total: 1,
                }),
            }
        }
        pillars
    }

    /// Cursor-derived navigation view.
    pub fn navigation_state(&self) -> NavigationState {
        let previous_task = if self.current_task_index > 0 {
            self.tasks.get(self.current_task_index - 1).cloned()
        } else {
            None
        };
        NavigationState {
            current_task: self.current_task().cloned(),
            previous_task,
            next_task: self.tasks.get(self.current_task_index + 1).cloned(),
            can_go_back: self.current_task_index > 0,
            can_go_forward: self.current_task_index + 1 < self.tasks.len(),
        }
    }
}

/// Progress summary for one workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowProgress {
    pub completed_tasks: u32,
    pub total_tasks: u32,
    pub completion_percentage: f32,
    pub current_task: Option<Task>,
    pub next_task: Option<Task>,
    /// Minutes of estimate in not-yet-reached tasks.
    pub estimated_time_remaining: u32,
    pub actual_time_spent: u32,
    pub pillars: Vec<PillarProgress>,
}

/// Completion counts for one pillar grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarProgress {
    pub pillar_id: String,
    pub completed: u32,
    pub total: u32,
}

/// Cursor-derived navigation view for one workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub current_task: Option<Task>,
    pub previous_task: Option<Task>,
    pub next_task: Option<Task>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}
