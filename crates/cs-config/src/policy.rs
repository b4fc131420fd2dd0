//! Policy configuration types.
//!
//! Every section has a built-in default, so `{"schema_version": "1.0.0"}` is a
//! complete policy file.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::{ValidationError, ValidationResult};

/// Complete policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Policy {
    pub schema_version: String,

    #[serde(default)]
    pub policy_id: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub estimator: EstimatorPolicy,
    #[serde(default)]
    pub fraud: FraudPolicy,
    #[serde(default)]
    pub strikes: StrikePolicy,
    #[serde(default)]
    pub cooldown: CooldownPolicy,
    #[serde(default)]
    pub retention: RetentionPolicy,

    #[serde(default)]
    pub notes: Option<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            policy_id: None,
            description: None,
            estimator: EstimatorPolicy::default(),
            fraud: FraudPolicy::default(),
            strikes: StrikePolicy::default(),
            cooldown: CooldownPolicy::default(),
            retention: RetentionPolicy::default(),
            notes: None,
        }
    }
}

impl Policy {
    /// Parse a policy from JSON text (shape only, no semantic validation).
    pub fn from_json_str(content: &str) -> ValidationResult<Self> {
        serde_json::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))
    }

    /// Read and parse a policy file (shape only, no semantic validation).
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Semantic validation.
    pub fn validate(&self) -> ValidationResult<()> {
        crate::validate::validate_policy(self)
    }
}

/// Versioned estimator model. Client-visible numbers differ between models,
/// so the tag travels with every estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorModel {
    /// Half-life weighted average over a 60 minute lookback.
    #[default]
    DecayedV2,
    /// Unweighted mean over a 15 minute trailing window.
    FlatV1,
}

impl EstimatorModel {
    /// Window used when the policy does not set one.
    pub fn default_lookback_minutes(self) -> u32 {
        match self {
            EstimatorModel::DecayedV2 => 60,
            EstimatorModel::FlatV1 => 15,
        }
    }
}

impl std::fmt::Display for EstimatorModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimatorModel::DecayedV2 => write!(f, "decayed_v2"),
            EstimatorModel::FlatV1 => write!(f, "flat_v1"),
        }
    }
}

/// Estimator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EstimatorPolicy {
    pub model: EstimatorModel,
    /// Lookback window; `None` uses the model's default.
    pub lookback_minutes: Option<u32>,
    /// Only used by `decayed_v2`.
    pub half_life_minutes: f64,
    /// Leave flagged reports out of the average.
    pub exclude_flagged: bool,
}

impl Default for EstimatorPolicy {
    fn default() -> Self {
        Self {
            model: EstimatorModel::DecayedV2,
            lookback_minutes: None,
            half_life_minutes: 15.0,
            exclude_flagged: false,
        }
    }
}

impl EstimatorPolicy {
    pub fn effective_lookback_minutes(&self) -> u32 {
        self.lookback_minutes
            .unwrap_or_else(|| self.model.default_lookback_minutes())
    }
}

/// Which estimate a new report is compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FraudBaseline {
    /// Estimate from the window before the new report is stored.
    #[default]
    ExcludingNew,
    /// Estimate recomputed with the new report included.
    IncludingNew,
}

impl std::fmt::Display for FraudBaseline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FraudBaseline::ExcludingNew => write!(f, "excluding_new"),
            FraudBaseline::IncludingNew => write!(f, "including_new"),
        }
    }
}

/// Outlier thresholds. A report is flagged when it deviates from the baseline
/// by strictly more than the threshold in either dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FraudPolicy {
    pub occupancy_threshold: u8,
    pub line_threshold: u8,
    pub baseline: FraudBaseline,
}

impl Default for FraudPolicy {
    fn default() -> Self {
        Self {
            occupancy_threshold: 3,
            line_threshold: 3,
            baseline: FraudBaseline::ExcludingNew,
        }
    }
}

/// Strike escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StrikePolicy {
    /// History is poisoned once strikes exceed this value.
    pub threshold: u32,
}

impl Default for StrikePolicy {
    fn default() -> Self {
        Self { threshold: 3 }
    }
}

/// Per (reporter, venue) submission cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CooldownPolicy {
    /// Zero disables the cooldown.
    pub minutes: u32,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self { minutes: 10 }
    }
}

/// Bulk retention sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Reports older than this are removed by a sweep.
    pub max_age_hours: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { max_age_hours: 24 }
    }
}
