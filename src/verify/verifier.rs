//! The verifier registry, its history, and derived statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::task::{Task, TaskId};
use crate::dlog_trace;
use crate::verify::rules::{CompletionRule, GenericCompletionRule, NavigationCompletionRule};

/// Most-recent verification results retained per task.
pub const HISTORY_LIMIT: usize = 10;

/// Pillar key matching any pillar for a given action type.
pub const WILDCARD_PILLAR: &str = "*";

/// Execution context supplied by the host at verification time.
///
/// Every field beyond the caller identity is optional; absent data means
/// fewer signals and lower confidence, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub platform_data: Option<PlatformData>,
    pub user_activity: Option<UserActivity>,
}

impl ExecutionContext {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            platform_data: None,
            user_activity: None,
        }
    }
}

/// Platform-reported state at verification time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformData {
    /// Where the user currently is (e.g. a route identifier).
    pub current_location: Option<String>,
    /// The platform's last recorded user activity.
    pub last_activity_at: Option<DateTime<Utc>>,
}

/// Recent user activity signals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    /// Timestamps of recent user actions, any order.
    pub events: Vec<DateTime<Utc>>,
}

/// Outcome of verifying one task completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_completed: bool,
    /// Trust score in [0, 1].
    pub confidence: f64,
    pub evidence: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl VerificationResult {
    /// A zero-confidence failure carrying a single warning.
    pub fn failed(warning: impl Into<String>) -> Self {
        Self {
            is_completed: false,
            confidence: 0.0,
            evidence: Vec::new(),
            warnings: vec![warning.into()],
            suggestions: Vec::new(),
        }
    }
}

/// One retained history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub task_id: TaskId,
    pub verified_at: DateTime<Utc>,
    pub result: VerificationResult,
}

/// Statistics derived on demand from the retained history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStats {
    pub total_verifications: usize,
    pub average_confidence: f64,
    /// Fraction of verifications that judged the task completed.
    pub completion_rate: f64,
    /// Warnings by frequency, most frequent first.
    pub frequent_warnings: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RuleKey {
    pillar: String,
    action: String,
}

/// Registry of completion rules plus bounded per-task history.
///
/// Rules are keyed by `(pillar, action_type)`. Lookup tries the exact key,
/// then the `*` pillar wildcard for the action type, then falls back to the
/// generic timestamp heuristic. New pillars therefore need no core changes:
/// callers register and remove rules at runtime.
pub struct CompletionVerifier {
    rules: HashMap<RuleKey, Box<dyn CompletionRule>>,
    fallback: Box<dyn CompletionRule>,
    history: HashMap<TaskId, Vec<VerificationRecord>>,
}

impl CompletionVerifier {
    /// A verifier with the navigation rule registered for every pillar and
    /// the generic heuristic as fallback.
    pub fn new() -> Self {
        let mut verifier = Self {
            rules: HashMap::new(),
            fallback: Box::new(GenericCompletionRule),
            history: HashMap::new(),
        };
        verifier.register_rule(WILDCARD_PILLAR, "navigate", Box::new(NavigationCompletionRule));
        verifier
    }

    /// Register a rule for a `(pillar, action_type)` key, replacing any
    /// existing entry.
    pub fn register_rule(&mut self, pillar: &str, action: &str, rule: Box<dyn CompletionRule>) {
        self.rules.insert(
            RuleKey {
                pillar: pillar.to_string(),
                action: action.to_string(),
            },
            rule,
        );
    }

    /// Remove a registered rule. Returns whether one was present.
    pub fn remove_rule(&mut self, pillar: &str, action: &str) -> bool {
        self.rules
            .remove(&RuleKey {
                pillar: pillar.to_string(),
                action: action.to_string(),
            })
            .is_some()
    }

    fn rule_for(&self, task: &Task) -> &dyn CompletionRule {
        let exact = RuleKey {
            pillar: task.pillar_id.clone(),
            action: task.action_type.clone(),
        };
        if let Some(rule) = self.rules.get(&exact) {
            return rule.as_ref();
        }
        let wildcard = RuleKey {
            pillar: WILDCARD_PILLAR.to_string(),
            action: task.action_type.clone(),
        };
        if let Some(rule) = self.rules.get(&wildcard) {
            return rule.as_ref();
        }
        self.fallback.as_ref()
    }

    /// Verify a task against the available evidence.
    ///
    /// Never fails: a rule error is absorbed into a zero-confidence result
    /// with the message in `warnings`. Confidence is clamped to [0, 1] and
    /// the result is appended to the task's bounded history.
    pub fn verify(&mut self, task: &Task, context: Option<&ExecutionContext>) -> VerificationResult {
        let mut result = match self.rule_for(task).verify(task, context) {
            Ok(result) => result,
            Err(err) => VerificationResult::failed(format!("Verification failed: {}", err)),
        };
        result.confidence = result.confidence.clamp(0.0, 1.0);
        dlog_trace!(
            "verify task={} confidence={:.2} completed={}",
            task.id,
            result.confidence,
            result.is_completed
        );

        let entries = self.history.entry(task.id.clone()).or_default();
        entries.push(VerificationRecord {
            task_id: task.id.clone(),
            verified_at: Utc::now(),
            result: result.clone(),
        });
        if entries.len() > HISTORY_LIMIT {
            let overflow = entries.len() - HISTORY_LIMIT;
            entries.drain(..overflow);
        }

        result
    }

    /// Retained history for one task, oldest first.
    pub fn history(&self, task_id: &TaskId) -> &[VerificationRecord] {
        self.history
            .get(task_id)
            .map(|entries| entries.as_slice())
            .unwrap_or(&[])
    }

    /// Statistics over the retained history across all tasks.
    pub fn stats(&self) -> VerificationStats {
        let records: Vec<&VerificationRecord> =
            self.history.values().flat_map(|v| v.iter()).collect();
        let total = records.len();
        if total == 0 {
            return VerificationStats {
                total_verifications: 0,
                average_confidence: 0.0,
                completion_rate: 0.0,
                frequent_warnings: Vec::new(),
            };
        }

        let confidence_sum: f64 = records.iter().map(|r| r.result.confidence).sum();
        let completed = records.iter().filter(|r| r.result.is_completed).count();

        let mut warning_counts: HashMap<&str, usize> = HashMap::new();
        for record in &records {
            for warning in &record.result.warnings {
                *warning_counts.entry(warning.as_str()).or_default() += 1;
            }
        }
        let mut frequent_warnings: Vec<(String, usize)> = warning_counts
            .into_iter()
            .map(|(w, c)| (w.to_string(), c))
            .collect();
        frequent_warnings.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        VerificationStats {
            total_verifications: total,
            average_confidence: confidence_sum / total as f64,
            completion_rate: completed as f64 / total as f64,
            frequent_warnings,
        }
    }
}

impl Default for CompletionVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompletionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionVerifier")
            .field("rules", &self.rules.len())
            .field("tracked_tasks", &self.history.len())
            .finish()
    }
}
