//! Core domain models for the workflow engine.
//!
//! This module contains the fundamental data structures used throughout
//! the engine: tasks and the dependency graph resolver.

pub mod graph;
pub mod task;

pub use graph::{DependencyGraph, GraphValidation, NodeStatus, ValidationError};
pub use task::{Task, TaskId, TaskPriority, TaskStatus};
