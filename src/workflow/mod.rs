//! Workflow data model for the daily task engine.
//!
//! This module provides the core type definitions for one user's dated,
//! ordered day plan and the progress/navigation views derived from it.

mod types;

pub use types::{
    DailyWorkflow, NavigationState, PillarProgress, WorkflowId, WorkflowProgress, WorkflowStatus,
};
