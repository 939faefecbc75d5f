//! Completion verification for daily workflow tasks.
//!
//! Completion is self-reported, so the verifier produces a trust signal
//! rather than a gate: pluggable rules score the available evidence into a
//! confidence value the orchestrator and UI can act on.

mod rules;
mod verifier;

pub use rules::{
    CompletionRule, GenericCompletionRule, NavigationCompletionRule, GENERIC_THRESHOLD,
    NAVIGATION_THRESHOLD,
};
pub use verifier::{
    CompletionVerifier, ExecutionContext, PlatformData, UserActivity, VerificationRecord,
    VerificationResult, VerificationStats, HISTORY_LIMIT, WILDCARD_PILLAR,
};
