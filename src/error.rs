use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::core::task::TaskId;
use crate::workflow::WorkflowId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Failed to generate workflow for {user_id} on {date}: {reason}")]
    WorkflowGenerationFailed {
        user_id: String,
        date: chrono::NaiveDate,
        reason: String,
    },

    #[error("Workflow not found: {0}")]
    WorkflowNotFound(WorkflowId),

    #[error("Task not found: {task} in workflow {workflow}")]
    TaskNotFound {
        workflow: WorkflowId,
        task: TaskId,
    },

    #[error("Circular dependency among tasks: {}", format_cycle(.members))]
    CircularDependency { members: Vec<TaskId> },

    #[error("Corrupt workflow record: {0}")]
    CorruptRecord(String),
}

fn format_cycle(members: &[TaskId]) -> String {
    members
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl Error {
    /// Machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::TomlParse(_) => "toml_parse_error",
            Error::TomlSerialize(_) => "toml_serialize_error",
            Error::NoHomeDir => "no_home_dir",
            Error::WorkflowGenerationFailed { .. } => "workflow_generation_failed",
            Error::WorkflowNotFound(_) => "workflow_not_found",
            Error::TaskNotFound { .. } => "task_not_found",
            Error::CircularDependency { .. } => "circular_dependency",
            Error::CorruptRecord(_) => "corrupt_record",
        }
    }

    /// Whether retrying the same operation can reasonably succeed.
    ///
    /// Not-found and cycle errors require the caller to fix their input
    /// first; generation and IO-level failures are transient.
    pub fn recoverable(&self) -> bool {
        match self {
            Error::WorkflowGenerationFailed { .. } => true,
            Error::Io(_) | Error::Json(_) => true,
            Error::TomlParse(_) | Error::TomlSerialize(_) => false,
            Error::NoHomeDir => false,
            Error::WorkflowNotFound(_) | Error::TaskNotFound { .. } => false,
            Error::CircularDependency { .. } => false,
            Error::CorruptRecord(_) => false,
        }
    }

    /// Suggested caller action, when one exists.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            Error::WorkflowGenerationFailed { .. } => Some("Retry workflow generation"),
            Error::WorkflowNotFound(_) => Some("Reload workflows and retry with a valid id"),
            Error::TaskNotFound { .. } => Some("Reload the workflow; the client state is stale"),
            Error::CircularDependency { .. } => {
                Some("Fix the declared task dependencies at the source")
            }
            _ => None,
        }
    }

    /// Snapshot this error into a serializable report.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
            timestamp: Utc::now(),
            recoverable: self.recoverable(),
            suggested_action: self.suggested_action(),
        }
    }
}

/// A timestamped, serializable snapshot of an [`Error`], suitable for
/// logging or returning to a UI layer.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub code: &'static str,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub recoverable: bool,
    pub suggested_action: Option<&'static str>,
}

pub type Result<T> = std::result::Result<T, Error>;
