//! Workflow persistence.
//!
//! A key-value store addressed by workflow id, holding the full serialized
//! [`DailyWorkflow`]. Saving is best-effort from the orchestrator's point of
//! view: the trait surfaces errors and the caller decides whether to
//! log-and-continue or escalate.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::workflow::{DailyWorkflow, WorkflowId};

/// Storage for daily workflows, keyed by workflow id.
pub trait WorkflowStore: Send + Sync {
    /// Persist one workflow, replacing any previous record.
    fn save(&self, workflow: &DailyWorkflow) -> Result<()>;

    /// Load every readable record.
    ///
    /// Corrupt records are reported in the error list instead of failing
    /// the whole load; one bad record must not block the rest.
    fn load_all(&self) -> (Vec<DailyWorkflow>, Vec<Error>);

    /// Delete the record for a workflow id. Deleting an absent record is
    /// not an error.
    fn remove(&self, id: &WorkflowId) -> Result<()>;
}

/// One pretty-printed JSON file per workflow under a directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &WorkflowId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Structural check before deserializing: a record must carry id, date
    /// and userId, and its tasks field must be a sequence.
    fn record_is_wellformed(value: &Value) -> bool {
        value.get("id").map(|v| v.is_string()).unwrap_or(false)
            && value.get("date").map(|v| v.is_string()).unwrap_or(false)
            && value.get("userId").map(|v| v.is_string()).unwrap_or(false)
            && value.get("tasks").map(|v| v.is_array()).unwrap_or(false)
    }
}

impl WorkflowStore for JsonFileStore {
    fn save(&self, workflow: &DailyWorkflow) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.record_path(&workflow.id);
        fs::write(&path, serde_json::to_string_pretty(workflow)?)?;
        Ok(())
    }

    fn load_all(&self) -> (Vec<DailyWorkflow>, Vec<Error>) {
        let mut workflows = Vec::new();
        let mut errors = Vec::new();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return (workflows, errors),
            Err(err) => {
                errors.push(err.into());
                return (workflows, errors);
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect();
        paths.sort();

        for path in paths {
            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(err) => {
                    errors.push(err.into());
                    continue;
                }
            };

            let parsed: std::result::Result<Value, _> = serde_json::from_str(&contents);
            let workflow = parsed.ok().filter(Self::record_is_wellformed).and_then(
                |value| serde_json::from_value::<DailyWorkflow>(value).ok(),
            );

            match workflow {
                Some(workflow) => workflows.push(workflow),
                None => {
                    // Corrupt: drop the record so it cannot poison later loads
                    let _ = fs::remove_file(&path);
                    errors.push(Error::CorruptRecord(path.display().to_string()));
                }
            }
        }

        (workflows, errors)
    }

    fn remove(&self, id: &WorkflowId) -> Result<()> {
        let path = self.record_path(id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
