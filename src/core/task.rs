//! Task data model for the daily workflow engine.
//!
//! Tasks are the atomic units of a user's day plan. Each task tracks its
//! pillar grouping, lifecycle status, declared dependencies, and timing.

use chrono::{serde::ts_milliseconds, serde::ts_milliseconds_option, DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a task within a workflow.
///
/// Task ids are assigned by the task source (e.g. `"plan-keywords"`), so the
/// id is an opaque string rather than a generated UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task status in its lifecycle.
///
/// Tasks progress `pending -> in_progress -> {completed | skipped}`.
/// Both completed and skipped are terminal for dependency purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task created but not yet started.
    #[default]
    Pending,
    /// Task is the user's current focus.
    InProgress,
    /// Task finished.
    Completed,
    /// Task deliberately skipped; still terminal for progress accounting.
    Skipped,
}

impl TaskStatus {
    /// Whether this status satisfies dependents (completed or skipped).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Skipped)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Priority of a task within the day plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::High => write!(f, "high"),
        }
    }
}

/// A single task in a daily workflow.
///
/// Serialized with camelCase keys and millisecond timestamps - the storage
/// schema shared with the host application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier within the workflow.
    pub id: TaskId,
    /// Topical grouping tag (e.g. "plan", "generate", "publish").
    pub pillar_id: String,
    /// Display title; opaque to the engine.
    pub title: String,
    /// Display description; opaque to the engine.
    pub description: String,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Priority within the day plan.
    pub priority: TaskPriority,
    /// Estimated duration in minutes.
    pub estimated_time: u32,
    /// Ids of tasks that must reach a terminal state before this one is
    /// ready. Empty means immediately ready.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    /// Action kind performed by the external collaborator (e.g. "navigate").
    pub action_type: String,
    /// Opaque action destination (e.g. a route identifier).
    pub action_target: String,
    /// When the task was created.
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// When the task left pending for the first time.
    #[serde(default, with = "ts_milliseconds_option")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the task reached completed.
    #[serde(default, with = "ts_milliseconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Start the task.
    ///
    /// Transitions status to InProgress and records the start time if it
    /// was not already set.
    pub fn start(&mut self) {
        self.status = TaskStatus::InProgress;
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
    }

    /// Mark the task as completed.
    ///
    /// Stamps `completed_at`, and `started_at` as well if the task was
    /// completed straight from pending.
    pub fn complete(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        self.status = TaskStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the task as skipped.
    ///
    /// Stamps `started_at` like every other transition out of pending;
    /// `completed_at` stays empty - it belongs to completed tasks only.
    pub fn skip(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        self.status = TaskStatus::Skipped;
    }

    /// Whether this task satisfies its dependents.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Minutes between start and completion, when both are known.
    pub fn elapsed_minutes(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_minutes()),
            _ => None,
        }
    }
}
