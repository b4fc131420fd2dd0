//! Displayed-value estimation.
//!
//! Turns the reports in a venue's lookback window into the smoothed
//! occupancy/line values shown to clients. Two versioned models exist:
//!
//! - `decayed_v2`: each report weighs `0.5^(minutes_elapsed / half_life)`
//!   over a 60 minute lookback (default).
//! - `flat_v1`: unweighted mean over a 15 minute trailing window.
//!
//! Means are rounded half-to-even. An empty window yields "no data" for both
//! dimensions, never zero.

use chrono::{DateTime, Duration, Utc};
use cs_common::{DisplayedValues, Report};
use cs_config::{EstimatorModel, EstimatorPolicy};
use cs_math::{half_life_weight, minutes_between, to_display_level, WeightedAccumulator};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Result of one estimation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Estimate {
    pub displayed: DisplayedValues,
    /// Reports that fell inside the window.
    pub reports_considered: usize,
    /// Sum of weights relative to the newest report; equals
    /// `reports_considered` for `flat_v1`.
    pub total_weight: f64,
    pub model: EstimatorModel,
}

/// Configured estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimator {
    model: EstimatorModel,
    lookback: Duration,
    half_life_minutes: f64,
    exclude_flagged: bool,
}

impl Estimator {
    pub fn from_policy(policy: &EstimatorPolicy) -> Self {
        Self {
            model: policy.model,
            lookback: Duration::minutes(i64::from(policy.effective_lookback_minutes())),
            half_life_minutes: policy.half_life_minutes,
            exclude_flagged: policy.exclude_flagged,
        }
    }

    pub fn model(&self) -> EstimatorModel {
        self.model
    }

    pub fn lookback(&self) -> Duration {
        self.lookback
    }

    pub fn excludes_flagged(&self) -> bool {
        self.exclude_flagged
    }

    /// Lower bound of the window at `now` (inclusive).
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.lookback
    }

    fn in_window(&self, report: &Report, now: DateTime<Utc>) -> bool {
        report.created_at >= self.since(now)
            && report.created_at <= now
            && !(self.exclude_flagged && report.flagged)
    }

    /// Decay is measured back from `anchor`, the newest report in the window,
    /// so the newest report always weighs 1.
    fn weight(&self, report: &Report, anchor: DateTime<Utc>) -> f64 {
        match self.model {
            EstimatorModel::FlatV1 => 1.0,
            EstimatorModel::DecayedV2 => {
                let elapsed = minutes_between(
                    report.created_at.timestamp_millis() as f64 / 1000.0,
                    anchor.timestamp_millis() as f64 / 1000.0,
                );
                half_life_weight(elapsed, self.half_life_minutes)
            }
        }
    }

    /// Estimate displayed values at `now`. Reports outside the window are
    /// ignored, so callers may pass a superset.
    pub fn estimate(&self, reports: &[Report], now: DateTime<Utc>) -> Estimate {
        let window: Vec<&Report> = reports.iter().filter(|r| self.in_window(r, now)).collect();
        let anchor = window.iter().map(|r| r.created_at).max().unwrap_or(now);

        let mut occupancy = WeightedAccumulator::new();
        let mut line = WeightedAccumulator::new();

        for report in window {
            let weight = self.weight(report, anchor);
            occupancy.push(f64::from(report.occupancy), weight);
            line.push(f64::from(report.line_wait), weight);
        }

        Estimate {
            displayed: DisplayedValues::new(
                occupancy.mean().and_then(to_display_level),
                line.mean().and_then(to_display_level),
            ),
            reports_considered: occupancy.count,
            total_weight: occupancy.total_weight,
            model: self.model,
        }
    }
}
