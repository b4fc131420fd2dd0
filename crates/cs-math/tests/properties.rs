//! Property-based tests for cs-math numerical functions.
//!
//! Uses proptest to verify the estimator's numeric building blocks hold across
//! many random inputs.

use cs_math::{half_life_weight, round_half_even, to_display_level, weighted_mean};
use proptest::prelude::*;

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-9;

// ============================================================================
// half_life_weight properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Weights live in (0, 1].
    #[test]
    fn weight_in_unit_interval(elapsed in 0.0..600.0f64, half_life in 5.0..120.0f64) {
        let w = half_life_weight(elapsed, half_life);
        prop_assert!(w > 0.0 && w <= 1.0, "weight {} out of (0, 1]", w);
    }

    /// Older observations never weigh more than newer ones.
    #[test]
    fn weight_monotone_in_age(a in 0.0..300.0f64, b in 0.0..300.0f64, half_life in 1.0..60.0f64) {
        let (younger, older) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(half_life_weight(younger, half_life) >= half_life_weight(older, half_life) - TOL);
    }

    /// Adding one half-life halves the weight.
    #[test]
    fn weight_halves_per_half_life(elapsed in 0.0..200.0f64, half_life in 1.0..60.0f64) {
        let w0 = half_life_weight(elapsed, half_life);
        let w1 = half_life_weight(elapsed + half_life, half_life);
        prop_assert!((w1 - w0 / 2.0).abs() <= TOL * w0.max(1.0));
    }
}

// ============================================================================
// weighted_mean properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A weighted mean of levels stays inside [min, max] of the levels.
    #[test]
    fn weighted_mean_bounded(samples in prop::collection::vec((1u8..=10, 0.001..1.0f64), 1..40)) {
        let pairs: Vec<(f64, f64)> = samples.iter().map(|&(v, w)| (v as f64, w)).collect();
        let mean = weighted_mean(&pairs).unwrap();
        let min = samples.iter().map(|s| s.0).min().unwrap() as f64;
        let max = samples.iter().map(|s| s.0).max().unwrap() as f64;
        prop_assert!(mean >= min - TOL && mean <= max + TOL, "mean {} outside [{}, {}]", mean, min, max);
    }

    /// Scaling every weight by the same factor leaves the mean unchanged.
    #[test]
    fn weighted_mean_scale_invariant(
        samples in prop::collection::vec((1u8..=10, 0.01..1.0f64), 1..20),
        scale in 0.1..10.0f64,
    ) {
        let pairs: Vec<(f64, f64)> = samples.iter().map(|&(v, w)| (v as f64, w)).collect();
        let scaled: Vec<(f64, f64)> = pairs.iter().map(|&(v, w)| (v, w * scale)).collect();
        let a = weighted_mean(&pairs).unwrap();
        let b = weighted_mean(&scaled).unwrap();
        prop_assert!((a - b).abs() < 1e-9);
    }

    /// Identical levels average to that level regardless of weights.
    #[test]
    fn weighted_mean_of_constant(level in 1u8..=10, weights in prop::collection::vec(0.001..1.0f64, 1..20)) {
        let pairs: Vec<(f64, f64)> = weights.iter().map(|&w| (level as f64, w)).collect();
        prop_assert_eq!(to_display_level(weighted_mean(&pairs).unwrap()), Some(level));
    }
}

// ============================================================================
// rounding properties
// ============================================================================

proptest! {
    /// Rounding moves a value by at most one half.
    #[test]
    fn rounding_within_half(x in -1000.0..1000.0f64) {
        prop_assert!((round_half_even(x) - x).abs() <= 0.5 + TOL);
    }

    /// Displayed levels always land on the 1–10 scale.
    #[test]
    fn display_level_on_scale(x in -50.0..50.0f64) {
        let level = to_display_level(x).unwrap();
        prop_assert!((1..=10).contains(&level));
    }
}
