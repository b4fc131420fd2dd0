//! Configuration snapshots for audit output and reproducibility.
//!
//! A snapshot records which policy produced a set of displayed values, so a
//! number shown to clients can be traced back to the exact settings.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::policy::{EstimatorModel, FraudBaseline, Policy};
use crate::resolve::ConfigPaths;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// SHA-256 hash of the policy JSON content.
    #[serde(default)]
    pub policy_hash: Option<String>,

    /// Path where the policy was loaded from.
    #[serde(default)]
    pub policy_path: Option<String>,

    /// Source of policy configuration.
    pub policy_source: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSummary {
    pub estimator_model: EstimatorModel,
    pub lookback_minutes: u32,
    pub half_life_minutes: f64,
    pub exclude_flagged: bool,
    pub occupancy_threshold: u8,
    pub line_threshold: u8,
    pub fraud_baseline: FraudBaseline,
    pub strike_threshold: u32,
    pub cooldown_minutes: u32,
    pub retention_hours: u32,
}

impl ConfigSnapshot {
    /// Create a new snapshot from a loaded policy.
    pub fn new(policy: &Policy, paths: &ConfigPaths, policy_json: Option<&str>) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: policy.schema_version.clone(),
            policy_hash: policy_json.map(hash_content),
            policy_path: paths.policy.as_ref().map(|p| p.display().to_string()),
            policy_source: paths.policy_source.to_string(),
            summary: build_summary(policy),
        }
    }

    /// Snapshot for the built-in default policy.
    pub fn from_defaults(policy: &Policy) -> Self {
        Self::new(policy, &ConfigPaths::default(), None)
    }
}

fn build_summary(policy: &Policy) -> ConfigSummary {
    ConfigSummary {
        estimator_model: policy.estimator.model,
        lookback_minutes: policy.estimator.effective_lookback_minutes(),
        half_life_minutes: policy.estimator.half_life_minutes,
        exclude_flagged: policy.estimator.exclude_flagged,
        occupancy_threshold: policy.fraud.occupancy_threshold,
        line_threshold: policy.fraud.line_threshold,
        fraud_baseline: policy.fraud.baseline,
        strike_threshold: policy.strikes.threshold,
        cooldown_minutes: policy.cooldown.minutes,
        retention_hours: policy.retention.max_age_hours,
    }
}

/// Hex-encoded SHA-256 of the given content.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
