//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Building task seeds with declared dependencies
//! - A scripted task source that counts fetches
//! - A navigator that records where it was sent
//! - An orchestrator wired to a temp-dir JSON store

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;

use dayflow::core::task::{Task, TaskId};
use dayflow::orchestration::{
    GenerationContext, Navigator, TaskSeed, TaskSource, WorkflowOrchestrator,
};
use dayflow::store::JsonFileStore;
use dayflow::workflow::WorkflowId;
use dayflow::{Config, Error, Result};

/// The calendar date used across the suite.
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
}

/// A task seed in the "plan" pillar with a navigate action.
pub fn seed(id: &str, deps: &[&str]) -> TaskSeed {
    seed_in_pillar(id, "plan", deps)
}

/// A task seed with an explicit pillar.
pub fn seed_in_pillar(id: &str, pillar: &str, deps: &[&str]) -> TaskSeed {
    TaskSeed {
        id: TaskId::from(id),
        pillar_id: pillar.to_string(),
        title: format!("{} title", id),
        description: format!("{} description", id),
        priority: Default::default(),
        estimated_time: 10,
        dependencies: deps.iter().map(|d| TaskId::from(*d)).collect(),
        action_type: "navigate".to_string(),
        action_target: format!("/{}", id),
    }
}

/// Task source that returns a fixed seed list and counts fetches.
pub struct ScriptedSource {
    seeds: Vec<TaskSeed>,
    fetches: AtomicUsize,
    fail: bool,
}

impl ScriptedSource {
    pub fn new(seeds: Vec<TaskSeed>) -> Self {
        Self {
            seeds,
            fetches: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// A source whose fetches always fail.
    pub fn failing() -> Self {
        Self {
            seeds: Vec::new(),
            fetches: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskSource for ScriptedSource {
    async fn daily_tasks(
        &self,
        _user_id: &str,
        _date: NaiveDate,
        _context: Option<&GenerationContext>,
    ) -> Result<Vec<TaskSeed>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Io(std::io::Error::other(
                "planning service unavailable",
            )));
        }
        Ok(self.seeds.clone())
    }
}

/// Navigator that records every destination task.
pub struct RecordingNavigator {
    visited: Mutex<Vec<TaskId>>,
    fail: bool,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self {
            visited: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A navigator whose navigation attempts always fail.
    pub fn failing() -> Self {
        Self {
            visited: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn visited(&self) -> Vec<TaskId> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn navigate(&self, task: &Task, _workflow_id: &WorkflowId) -> Result<()> {
        self.visited.lock().unwrap().push(task.id.clone());
        if self.fail {
            return Err(Error::Io(std::io::Error::other("navigation surface gone")));
        }
        Ok(())
    }
}

/// An orchestrator with scripted collaborators and a temp-dir store.
pub struct TestHarness {
    pub orchestrator: WorkflowOrchestrator,
    pub source: Arc<ScriptedSource>,
    pub navigator: Arc<RecordingNavigator>,
    pub store_dir: TempDir,
}

impl TestHarness {
    /// Auto-advance off; most tests drive transitions explicitly.
    pub fn new(seeds: Vec<TaskSeed>) -> Self {
        Self::with_config(
            seeds,
            Config {
                auto_advance: false,
                ..Config::default()
            },
        )
    }

    pub fn with_config(seeds: Vec<TaskSeed>, config: Config) -> Self {
        let store_dir = TempDir::new().expect("Failed to create temp directory");
        let source = Arc::new(ScriptedSource::new(seeds));
        let navigator = Arc::new(RecordingNavigator::new());
        let orchestrator = WorkflowOrchestrator::new(
            source.clone(),
            navigator.clone(),
            Arc::new(JsonFileStore::new(store_dir.path())),
            config,
        );
        Self {
            orchestrator,
            source,
            navigator,
            store_dir,
        }
    }
}
