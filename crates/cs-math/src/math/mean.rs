//! Weighted means and the rounding used for displayed values.

use serde::{Deserialize, Serialize};

/// Running weighted sum of observations.
///
/// Ignores samples with non-finite or negative weight. A zero weight still
/// counts as an observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedAccumulator {
    pub weighted_sum: f64,
    pub total_weight: f64,
    pub count: usize,
}

impl WeightedAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64, weight: f64) {
        if !weight.is_finite() || weight < 0.0 || !value.is_finite() {
            return;
        }
        self.weighted_sum += value * weight;
        self.total_weight += weight;
        self.count += 1;
    }

    /// Weighted mean, or `None` when nothing was accumulated.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 || self.total_weight <= 0.0 {
            return None;
        }
        Some(self.weighted_sum / self.total_weight)
    }
}

/// Weighted mean of `(value, weight)` pairs. `None` for empty input.
pub fn weighted_mean(samples: &[(f64, f64)]) -> Option<f64> {
    let mut acc = WeightedAccumulator::new();
    for &(value, weight) in samples {
        acc.push(value, weight);
    }
    acc.mean()
}

/// Round to the nearest integer, ties to even (6.5 → 6, 7.5 → 8).
pub fn round_half_even(x: f64) -> f64 {
    x.round_ties_even()
}

/// Round a mean on the 1–10 scale to a displayed level.
///
/// The result is clamped into `1..=10`, so float noise can never produce a
/// value outside the scale.
pub fn to_display_level(mean: f64) -> Option<u8> {
    if !mean.is_finite() {
        return None;
    }
    Some(round_half_even(mean).clamp(1.0, 10.0) as u8)
}
