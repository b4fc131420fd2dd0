//! Outlier classification of incoming reports.

use cs_common::{DisplayedValues, Level, Report, Result};
use cs_config::{FraudBaseline, FraudPolicy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::ReportStore;

/// Classification of one report against a baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FraudVerdict {
    pub flagged: bool,
    /// `None` when the baseline had no occupancy value to compare against.
    pub occupancy_deviation: Option<u8>,
    /// `None` when the baseline had no line value to compare against.
    pub line_deviation: Option<u8>,
}

/// Flags reports that deviate from the current estimate by strictly more
/// than the configured threshold in either dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct FraudDetector {
    occupancy_threshold: u8,
    line_threshold: u8,
    baseline: FraudBaseline,
}

impl FraudDetector {
    pub fn from_policy(policy: &FraudPolicy) -> Self {
        Self {
            occupancy_threshold: policy.occupancy_threshold,
            line_threshold: policy.line_threshold,
            baseline: policy.baseline,
        }
    }

    pub fn baseline(&self) -> FraudBaseline {
        self.baseline
    }

    /// Pure classification.
    pub fn classify(
        &self,
        occupancy: Level,
        line_wait: Level,
        baseline: DisplayedValues,
    ) -> FraudVerdict {
        let occupancy_deviation = baseline.occupancy.map(|d| occupancy.deviation_from(d));
        let line_deviation = baseline.line.map(|d| line_wait.deviation_from(d));

        let flagged = occupancy_deviation.is_some_and(|d| d > self.occupancy_threshold)
            || line_deviation.is_some_and(|d| d > self.line_threshold);

        FraudVerdict {
            flagged,
            occupancy_deviation,
            line_deviation,
        }
    }

    /// Classify a stored report and persist the resulting flag.
    pub fn apply<S: ReportStore>(
        &self,
        store: &mut S,
        report: &Report,
        baseline: DisplayedValues,
    ) -> Result<FraudVerdict> {
        let verdict = self.classify(report.occupancy, report.line_wait, baseline);
        store.update_report_flag(report.id, verdict.flagged)?;
        Ok(verdict)
    }
}
