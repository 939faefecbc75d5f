//! dayflow - the daily task workflow engine.
//!
//! Models a user's day as an ordered set of tasks grouped into pillars,
//! computes execution order from a dependency graph, drives per-task
//! lifecycle transitions, scores completions with confidence-weighted
//! heuristics, and persists workflow state across sessions. Content
//! generation, pillar business content and UI rendering are external
//! collaborators behind the [`orchestration`] traits.

pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod orchestration;
pub mod store;
pub mod verify;
pub mod workflow;

pub use self::core::{DependencyGraph, Task, TaskId, TaskPriority, TaskStatus};
pub use config::Config;
pub use error::{Error, ErrorReport, Result};
pub use orchestration::{
    GenerationContext, Navigator, TaskCompletion, TaskSeed, TaskSource, WorkflowOrchestrator,
};
pub use store::{JsonFileStore, WorkflowStore};
pub use verify::{CompletionVerifier, ExecutionContext, VerificationResult};
pub use workflow::{DailyWorkflow, WorkflowId, WorkflowProgress, WorkflowStatus};
