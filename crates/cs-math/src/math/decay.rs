//! Half-life decay weights.

/// Weight of an observation `elapsed_minutes` old under exponential decay.
///
/// `weight = 0.5^(elapsed / half_life)`: 1.0 at zero elapsed time, 0.5 after
/// one half-life. Negative elapsed time is clamped to zero so a weight never
/// exceeds 1.0. Returns NaN for a non-positive or non-finite half-life.
pub fn half_life_weight(elapsed_minutes: f64, half_life_minutes: f64) -> f64 {
    if !half_life_minutes.is_finite() || half_life_minutes <= 0.0 || elapsed_minutes.is_nan() {
        return f64::NAN;
    }
    let elapsed = elapsed_minutes.max(0.0);
    0.5_f64.powf(elapsed / half_life_minutes)
}

/// Elapsed minutes between two instants given in seconds.
pub fn minutes_between(earlier_secs: f64, later_secs: f64) -> f64 {
    (later_secs - earlier_secs) / 60.0
}
