//! Orchestration layer for the daily workflow engine.
//!
//! One orchestrator instance per session coordinates all workflows: it
//! generates them from the task source, drives task lifecycle transitions,
//! and talks to the navigator and the persistence store.

mod orchestrator;
mod source;

pub use orchestrator::{TaskCompletion, WorkflowOrchestrator};
pub use source::{GenerationContext, Navigator, NoopNavigator, TaskSeed, TaskSource};
