//! Stable event names and pipeline stages for structured logs.
//!
//! Every event carries an `event` field from [`event_names`] and a `stage`
//! field from [`Stage`], so JSONL consumers can filter without parsing
//! messages.

use serde::{Deserialize, Serialize};

/// Steps of the submission pipeline plus the surrounding commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Input validation before any store access.
    Validate,
    /// Cooldown check.
    Cooldown,
    /// Report persistence.
    Persist,
    /// Displayed-value estimation.
    Estimate,
    /// Outlier classification.
    Fraud,
    /// Strike escalation.
    Strikes,
    /// Venue cache update.
    Cache,
    /// Retention sweep.
    Sweep,
    /// Administrative venue/reporter changes.
    Admin,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Validate => "validate",
            Stage::Cooldown => "cooldown",
            Stage::Persist => "persist",
            Stage::Estimate => "estimate",
            Stage::Fraud => "fraud",
            Stage::Strikes => "strikes",
            Stage::Cache => "cache",
            Stage::Sweep => "sweep",
            Stage::Admin => "admin",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Submission pipeline
    pub const SUBMIT_STARTED: &str = "submit.started";
    pub const SUBMIT_INVALID: &str = "submit.invalid";
    pub const SUBMIT_REJECTED_COOLDOWN: &str = "submit.rejected_cooldown";
    pub const SUBMIT_ABORTED: &str = "submit.aborted";
    pub const REPORT_PERSISTED: &str = "report.persisted";
    pub const REPORT_FLAGGED: &str = "report.flagged";
    pub const STRIKES_INCREMENTED: &str = "strikes.incremented";
    pub const REPORTER_HISTORY_POISONED: &str = "reporter.history_poisoned";
    pub const VENUE_CACHE_UPDATED: &str = "venue.cache_updated";

    // Administration
    pub const VENUE_REGISTERED: &str = "venue.registered";
    pub const VENUE_ACTIVE_CHANGED: &str = "venue.active_changed";
    pub const STRIKES_RESET: &str = "strikes.reset";
    pub const SWEEP_FINISHED: &str = "sweep.finished";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [Stage::Init, Stage::Cooldown, Stage::Strikes, Stage::Sweep] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_names::SUBMIT_REJECTED_COOLDOWN, "submit.rejected_cooldown");
        assert_eq!(event_names::REPORTER_HISTORY_POISONED, "reporter.history_poisoned");
        assert_eq!(event_names::SWEEP_FINISHED, "sweep.finished");
    }
}
