//! The workflow orchestrator.
//!
//! One orchestrator instance coordinates every daily workflow for a
//! session. Mutation entry points are expected to be invoked sequentially
//! by a single caller context; a concurrent host must add per-workflow-id
//! mutual exclusion around them. The only asynchronous behavior is the
//! post-completion auto-navigation, which is fire-and-forget behind a
//! settle delay and cancelable by the next mutation on the same workflow.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::graph::{self, DependencyGraph};
use crate::core::task::{Task, TaskId, TaskStatus};
use crate::error::{Error, Result};
use crate::orchestration::source::{GenerationContext, Navigator, TaskSource};
use crate::store::WorkflowStore;
use crate::verify::{CompletionVerifier, ExecutionContext, VerificationResult};
use crate::workflow::{
    DailyWorkflow, NavigationState, WorkflowId, WorkflowProgress, WorkflowStatus,
};
use crate::{dlog, dlog_debug, dlog_warn};

/// Outcome of a task completion.
#[derive(Debug, Clone)]
pub struct TaskCompletion {
    /// Advisory trust signal; never gates the completion.
    pub verification: VerificationResult,
    pub progress: WorkflowProgress,
    /// Tasks that became ready because this one finished.
    pub unlocked: Vec<TaskId>,
}

/// Coordinates generation, execution and persistence of daily workflows.
pub struct WorkflowOrchestrator {
    workflows: HashMap<WorkflowId, DailyWorkflow>,
    graphs: HashMap<WorkflowId, DependencyGraph>,
    verifier: CompletionVerifier,
    source: Arc<dyn TaskSource>,
    navigator: Arc<dyn Navigator>,
    store: Arc<dyn WorkflowStore>,
    config: Config,
    pending_navigation: HashMap<WorkflowId, CancellationToken>,
}

impl WorkflowOrchestrator {
    pub fn new(
        source: Arc<dyn TaskSource>,
        navigator: Arc<dyn Navigator>,
        store: Arc<dyn WorkflowStore>,
        config: Config,
    ) -> Self {
        Self {
            workflows: HashMap::new(),
            graphs: HashMap::new(),
            verifier: CompletionVerifier::new(),
            source,
            navigator,
            store,
            config,
            pending_navigation: HashMap::new(),
        }
    }

    /// Load persisted workflows into the session.
    ///
    /// Corrupt records were already skipped by the store; they are logged
    /// here and the rest load normally. Returns how many were restored.
    pub fn restore(&mut self) -> usize {
        let (workflows, errors) = self.store.load_all();
        for err in &errors {
            dlog_warn!("Skipping workflow record: {}", err);
        }
        let count = workflows.len();
        for workflow in workflows {
            self.graphs
                .insert(workflow.id.clone(), DependencyGraph::build(&workflow));
            self.workflows.insert(workflow.id.clone(), workflow);
        }
        dlog!("Restored {} workflows", count);
        count
    }

    /// Look up or create the workflow for a `(user, date)` pair.
    ///
    /// Idempotent: a second call with the same key returns the stored
    /// workflow without consulting the task source. On create, the task
    /// set is validated; an invalid dependency structure degrades to a
    /// flat, dependency-free list - a usable plan with no ordering
    /// guarantees beats no plan. A valid structure is reordered into
    /// execution order before storing.
    pub async fn generate_workflow(
        &mut self,
        user_id: &str,
        date: NaiveDate,
        context: Option<&GenerationContext>,
    ) -> Result<DailyWorkflow> {
        let id = WorkflowId::for_user_date(user_id, date);
        if let Some(existing) = self.workflows.get(&id) {
            dlog_debug!("Workflow {} already exists, returning it", id);
            return Ok(existing.clone());
        }

        let seeds = self
            .source
            .daily_tasks(user_id, date, context)
            .await
            .map_err(|err| Error::WorkflowGenerationFailed {
                user_id: user_id.to_string(),
                date,
                reason: err.to_string(),
            })?;

        let tasks: Vec<Task> = seeds.into_iter().map(|seed| seed.into_task()).collect();
        let mut workflow = DailyWorkflow::new(user_id, date, tasks);

        let report = graph::validate(&workflow);
        if report.is_valid {
            workflow.tasks = graph::optimal_order(&workflow)?;
        } else {
            for error in &report.errors {
                dlog_warn!("Workflow {} dependency problem: {}", id, error);
            }
            dlog_warn!("Workflow {} degrades to a flat task list", id);
            for task in &mut workflow.tasks {
                task.dependencies.clear();
            }
        }

        dlog!(
            "Generated workflow {} with {} tasks ({} min estimated)",
            id,
            workflow.total_tasks,
            workflow.total_estimated_time
        );

        self.persist(&workflow);
        self.graphs
            .insert(id.clone(), DependencyGraph::build(&workflow));
        self.workflows.insert(id.clone(), workflow.clone());
        Ok(workflow)
    }

    /// Start a workflow: stamps timing and puts the first task in progress.
    pub fn start_workflow(&mut self, id: &WorkflowId) -> Result<DailyWorkflow> {
        let workflow = self
            .workflows
            .get_mut(id)
            .ok_or_else(|| Error::WorkflowNotFound(id.clone()))?;

        workflow.workflow_status = WorkflowStatus::InProgress;
        if workflow.started_at.is_none() {
            workflow.started_at = Some(Utc::now());
        }
        let first = workflow.tasks.first_mut().map(|task| {
            if task.status == TaskStatus::Pending {
                task.start();
            }
            (task.id.clone(), task.status)
        });
        let snapshot = workflow.clone();

        if let (Some((task_id, status)), Some(graph)) = (first, self.graphs.get_mut(id)) {
            graph.update_status(&task_id, status);
        }

        dlog!("Started workflow {}", id);
        self.persist(&snapshot);
        Ok(snapshot)
    }

    /// Complete a task.
    ///
    /// Verification is advisory telemetry - the task set is self-reported,
    /// so the result is recorded but never blocks the completion. Elapsed
    /// minutes accrue into the workflow, the resolver learns the new
    /// status, and finishing the last task flips the workflow to completed.
    /// When auto-advance is on, navigation to the next ready task is
    /// scheduled behind the settle delay.
    pub async fn complete_task(
        &mut self,
        workflow_id: &WorkflowId,
        task_id: &TaskId,
        context: Option<&ExecutionContext>,
    ) -> Result<TaskCompletion> {
        self.cancel_pending_navigation(workflow_id);

        let workflow = self
            .workflows
            .get_mut(workflow_id)
            .ok_or_else(|| Error::WorkflowNotFound(workflow_id.clone()))?;
        let task = workflow.task_mut(task_id).ok_or_else(|| Error::TaskNotFound {
            workflow: workflow_id.clone(),
            task: task_id.clone(),
        })?;

        let already_terminal = task.status.is_terminal();
        if !already_terminal {
            task.complete();
        }
        let task_snapshot = task.clone();

        if !already_terminal {
            let elapsed = task_snapshot.elapsed_minutes().unwrap_or(0).max(0) as u32;
            workflow.actual_time_spent += elapsed;
            workflow.completed_tasks += 1;
            if workflow.workflow_status == WorkflowStatus::NotStarted {
                workflow.workflow_status = WorkflowStatus::InProgress;
                workflow.started_at.get_or_insert_with(Utc::now);
            }
            if workflow.is_complete() {
                workflow.workflow_status = WorkflowStatus::Completed;
                workflow.completed_at = Some(Utc::now());
                dlog!("Workflow {} completed", workflow_id);
            }
        }
        let snapshot = workflow.clone();

        let unlocked = match self.graphs.get_mut(workflow_id) {
            Some(graph) => {
                let unlocked = graph.completion_impact(task_id);
                graph.update_status(task_id, TaskStatus::Completed);
                unlocked
            }
            None => Vec::new(),
        };

        let verification = self.verifier.verify(&task_snapshot, context);
        dlog_debug!(
            "Task {} completed in {} (confidence {:.2}, {} unlocked)",
            task_id,
            workflow_id,
            verification.confidence,
            unlocked.len()
        );

        self.persist(&snapshot);

        if self.config.auto_advance && snapshot.workflow_status != WorkflowStatus::Completed {
            self.schedule_auto_advance(&snapshot);
        }

        Ok(TaskCompletion {
            verification,
            progress: snapshot.progress(),
            unlocked,
        })
    }

    /// Skip a task.
    ///
    /// Skip is a valid terminal outcome for progress accounting: it counts
    /// toward `completed_tasks` and can finish the workflow. A pending
    /// auto-navigation on the workflow is cancelled, and none is scheduled.
    pub fn skip_task(
        &mut self,
        workflow_id: &WorkflowId,
        task_id: &TaskId,
    ) -> Result<WorkflowProgress> {
        self.cancel_pending_navigation(workflow_id);

        let workflow = self
            .workflows
            .get_mut(workflow_id)
            .ok_or_else(|| Error::WorkflowNotFound(workflow_id.clone()))?;
        let task = workflow.task_mut(task_id).ok_or_else(|| Error::TaskNotFound {
            workflow: workflow_id.clone(),
            task: task_id.clone(),
        })?;

        if !task.status.is_terminal() {
            task.skip();
            workflow.completed_tasks += 1;
            if workflow.workflow_status == WorkflowStatus::NotStarted {
                workflow.workflow_status = WorkflowStatus::InProgress;
                workflow.started_at.get_or_insert_with(Utc::now);
            }
            if workflow.is_complete() {
                workflow.workflow_status = WorkflowStatus::Completed;
                workflow.completed_at = Some(Utc::now());
                dlog!("Workflow {} completed", workflow_id);
            }
        }
        let snapshot = workflow.clone();

        if let Some(graph) = self.graphs.get_mut(workflow_id) {
            graph.update_status(task_id, TaskStatus::Skipped);
        }

        dlog_debug!("Task {} skipped in {}", task_id, workflow_id);
        self.persist(&snapshot);
        Ok(snapshot.progress())
    }

    /// Progress summary for a workflow.
    pub fn progress(&self, workflow_id: &WorkflowId) -> Result<WorkflowProgress> {
        self.workflows
            .get(workflow_id)
            .map(|workflow| workflow.progress())
            .ok_or_else(|| Error::WorkflowNotFound(workflow_id.clone()))
    }

    /// Cursor-derived navigation view for a workflow.
    pub fn navigation_state(&self, workflow_id: &WorkflowId) -> Result<NavigationState> {
        self.workflows
            .get(workflow_id)
            .map(|workflow| workflow.navigation_state())
            .ok_or_else(|| Error::WorkflowNotFound(workflow_id.clone()))
    }

    /// Move the cursor forward by one task.
    ///
    /// The newly current task is started if it was still pending. Returns
    /// None at the end of the sequence without error.
    pub fn advance_cursor(&mut self, workflow_id: &WorkflowId) -> Result<Option<Task>> {
        let workflow = self
            .workflows
            .get_mut(workflow_id)
            .ok_or_else(|| Error::WorkflowNotFound(workflow_id.clone()))?;

        if workflow.current_task_index + 1 >= workflow.tasks.len() {
            return Ok(None);
        }
        workflow.current_task_index += 1;
        let index = workflow.current_task_index;
        if workflow.tasks[index].status == TaskStatus::Pending {
            workflow.tasks[index].start();
        }
        let task = workflow.tasks[index].clone();
        let snapshot = workflow.clone();

        if let Some(graph) = self.graphs.get_mut(workflow_id) {
            graph.update_status(&task.id, task.status);
        }

        self.persist(&snapshot);
        Ok(Some(task))
    }

    /// Remove every completed workflow from the session and the store.
    ///
    /// A maintenance operation, not part of the task lifecycle. Returns
    /// how many workflows were removed.
    pub fn clear_completed(&mut self) -> usize {
        let ids: Vec<WorkflowId> = self
            .workflows
            .iter()
            .filter(|(_, workflow)| workflow.workflow_status == WorkflowStatus::Completed)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &ids {
            self.cancel_pending_navigation(id);
            self.workflows.remove(id);
            self.graphs.remove(id);
            if let Err(err) = self.store.remove(id) {
                dlog_warn!("Failed to remove stored workflow {}: {}", id, err);
            }
        }
        dlog!("Cleared {} completed workflows", ids.len());
        ids.len()
    }

    /// Look up a workflow.
    pub fn workflow(&self, id: &WorkflowId) -> Option<&DailyWorkflow> {
        self.workflows.get(id)
    }

    /// Live dependency graph of a workflow.
    pub fn graph(&self, id: &WorkflowId) -> Option<&DependencyGraph> {
        self.graphs.get(id)
    }

    pub fn workflow_count(&self) -> usize {
        self.workflows.len()
    }

    /// The verification subsystem, for statistics and history queries.
    pub fn verifier(&self) -> &CompletionVerifier {
        &self.verifier
    }

    /// The verification subsystem, for registering or removing rules.
    pub fn verifier_mut(&mut self) -> &mut CompletionVerifier {
        &mut self.verifier
    }

    fn cancel_pending_navigation(&mut self, workflow_id: &WorkflowId) {
        if let Some(token) = self.pending_navigation.remove(workflow_id) {
            token.cancel();
        }
    }

    /// Persistence is best-effort: failures are logged and the in-memory
    /// state change stands.
    fn persist(&self, workflow: &DailyWorkflow) {
        if let Err(err) = self.store.save(workflow) {
            dlog_warn!("Failed to persist workflow {}: {}", workflow.id, err);
        }
    }

    /// Schedule navigation to the next ready task after the settle delay.
    ///
    /// First ready task in stored order wins the tie among simultaneously
    /// ready tasks. The spawned task races the delay against a cancellation
    /// token so a later mutation on the workflow can supersede it; a
    /// navigation failure is logged and swallowed - the completion that
    /// triggered it already stands.
    fn schedule_auto_advance(&mut self, workflow: &DailyWorkflow) {
        let next = match graph::ready_tasks(workflow).first() {
            Some(task) => (*task).clone(),
            None => {
                dlog_debug!("No ready task to auto-advance to in {}", workflow.id);
                return;
            }
        };

        let token = CancellationToken::new();
        self.pending_navigation
            .insert(workflow.id.clone(), token.clone());

        let navigator = Arc::clone(&self.navigator);
        let workflow_id = workflow.id.clone();
        let delay = self.config.advance_delay();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    dlog_debug!("Auto-navigation for {} superseded", workflow_id);
                }
                _ = tokio::time::sleep(delay) => {
                    if let Err(err) = navigator.navigate(&next, &workflow_id).await {
                        dlog_warn!("Auto-navigation for {} failed: {}", workflow_id, err);
                    }
                }
            }
        });
    }
}

impl std::fmt::Debug for WorkflowOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowOrchestrator")
            .field("workflows", &self.workflows.len())
            .field("pending_navigation", &self.pending_navigation.len())
            .finish()
    }
}
