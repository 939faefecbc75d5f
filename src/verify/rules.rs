//! Built-in completion rules.

use crate::core::task::Task;
use crate::error::Result;
use crate::verify::verifier::{ExecutionContext, VerificationResult};

/// Completion threshold for the generic timestamp heuristic.
pub const GENERIC_THRESHOLD: f64 = 0.5;

/// Completion threshold for navigation tasks.
///
/// Higher than the generic bar: navigation signals are weaker evidence of
/// real completion.
pub const NAVIGATION_THRESHOLD: f64 = 0.6;

/// A pluggable completion check for one `(pillar, action_type)` key.
///
/// Implementations score the available evidence; they do not gate the
/// completion itself. Errors are absorbed by the verifier, never surfaced.
pub trait CompletionRule: Send + Sync {
    fn verify(&self, task: &Task, context: Option<&ExecutionContext>)
        -> Result<VerificationResult>;
}

/// Fallback heuristic over the task's own timestamps.
///
/// Confidence accumulates from independent additive signals, each capped so
/// no single signal alone reaches the completion threshold.
pub struct GenericCompletionRule;

impl CompletionRule for GenericCompletionRule {
    fn verify(
        &self,
        task: &Task,
        _context: Option<&ExecutionContext>,
    ) -> Result<VerificationResult> {
        let mut confidence: f64 = 0.0;
        let mut evidence = Vec::new();
        let mut warnings = Vec::new();

        if task.completed_at.is_some() {
            confidence += 0.5;
        } else {
            warnings.push("Task has no completion timestamp".to_string());
        }

        if task.started_at.is_some() {
            confidence += 0.3;
        } else {
            warnings.push("Task has no start timestamp".to_string());
        }

        if let (Some(start), Some(end)) = (task.started_at, task.completed_at) {
            if end > start {
                confidence += 0.2;
                evidence.push(format!("Spent {} minutes on the task", (end - start).num_minutes()));
            }
        }

        Ok(VerificationResult {
            is_completed: confidence >= GENERIC_THRESHOLD,
            confidence,
            evidence,
            warnings,
            suggestions: Vec::new(),
        })
    }
}

/// Rule for navigation tasks (`action_type == "navigate"`).
///
/// Builds confidence from up to three independent context signals plus a
/// timing check against the estimate, capped at 1.0. Finishing faster than
/// half the estimate is a warning, not a failure: the verifier produces a
/// trust signal, it does not block completion.
pub struct NavigationCompletionRule;

impl CompletionRule for NavigationCompletionRule {
    fn verify(
        &self,
        task: &Task,
        context: Option<&ExecutionContext>,
    ) -> Result<VerificationResult> {
        let mut confidence: f64 = 0.0;
        let mut evidence = Vec::new();
        let mut warnings = Vec::new();
        let mut suggestions = Vec::new();

        let platform = context.and_then(|c| c.platform_data.as_ref());

        match platform.and_then(|p| p.current_location.as_deref()) {
            Some(location) if location == task.action_target => {
                confidence += 0.4;
                evidence.push(format!("User is at {}", task.action_target));
            }
            _ => {
                warnings.push(format!("User is not at {}", task.action_target));
                suggestions.push(format!("Navigate to {}", task.action_target));
            }
        }

        let activity_after_start = task.started_at.and_then(|start| {
            context
                .and_then(|c| c.user_activity.as_ref())
                .map(|activity| activity.events.iter().any(|event| *event > start))
        });
        match activity_after_start {
            Some(true) => {
                confidence += 0.3;
                evidence.push("Recent activity after the task started".to_string());
            }
            _ => warnings.push("No activity recorded since the task started".to_string()),
        }

        if let (Some(start), Some(last)) = (
            task.started_at,
            platform.and_then(|p| p.last_activity_at),
        ) {
            if last > start {
                confidence += 0.3;
                evidence.push("Platform reports activity after the task started".to_string());
            }
        }

        if let (Some(start), Some(end)) = (task.started_at, task.completed_at) {
            let elapsed_minutes = (end - start).num_minutes();
            let expected = f64::from(task.estimated_time) * 0.5;
            if elapsed_minutes as f64 >= expected {
                confidence += 0.2;
                evidence.push(format!(
                    "Spent {} of {} estimated minutes",
                    elapsed_minutes, task.estimated_time
                ));
            } else {
                warnings.push("Task completed too quickly".to_string());
            }
        }

        confidence = confidence.min(1.0);

        Ok(VerificationResult {
            is_completed: confidence >= NAVIGATION_THRESHOLD,
            confidence,
            evidence,
            warnings,
            suggestions,
        })
    }
}
