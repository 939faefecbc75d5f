//! External collaborator seams for the orchestrator.
//!
//! The engine's only contract with the planning side of the application is
//! "produce a set of task descriptors"; its only contract with the UI side
//! is "perform the action a task names". Both live behind async traits so a
//! remote planning service or a host UI can stand in without core changes.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::task::{Task, TaskId, TaskPriority, TaskStatus};
use crate::error::Result;
use crate::workflow::WorkflowId;

/// Optional hints passed through to the task source at generation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationContext {
    /// Pillars the user wants the day to focus on.
    #[serde(default)]
    pub focus_pillars: Vec<String>,
    /// Free-form key/value hints, opaque to the engine.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A task descriptor as produced by the task source.
///
/// Seeds carry no status and no timestamps; those belong to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSeed {
    pub id: TaskId,
    pub pillar_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    pub estimated_time: u32,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    pub action_type: String,
    pub action_target: String,
}

impl TaskSeed {
    /// Materialize the seed into a pending task.
    pub fn into_task(self) -> Task {
        Task {
            id: self.id,
            pillar_id: self.pillar_id,
            title: self.title,
            description: self.description,
            status: TaskStatus::Pending,
            priority: self.priority,
            estimated_time: self.estimated_time,
            dependencies: self.dependencies,
            action_type: self.action_type,
            action_target: self.action_target,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }
}

/// Produces the day's task descriptors for a user.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn daily_tasks(
        &self,
        user_id: &str,
        date: NaiveDate,
        context: Option<&GenerationContext>,
    ) -> Result<Vec<TaskSeed>>;
}

/// Performs the side effect a task's action names (e.g. moving the user to
/// a destination). Outcomes never propagate into workflow state.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, task: &Task, workflow_id: &WorkflowId) -> Result<()>;
}

/// Navigator that does nothing, for hosts without a navigation surface.
pub struct NoopNavigator;

#[async_trait]
impl Navigator for NoopNavigator {
    async fn navigate(&self, _task: &Task, _workflow_id: &WorkflowId) -> Result<()> {
        Ok(())
    }
}
