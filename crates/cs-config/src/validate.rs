//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::policy::Policy;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest possible gap between two levels on the 1–10 scale.
const MAX_DEVIATION: u8 = 9;

/// Upper bound for lookback and cooldown windows.
const MAX_WINDOW_MINUTES: u32 = 24 * 60;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: &str, message: String) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

/// Validate policy configuration semantically.
pub fn validate_policy(policy: &Policy) -> ValidationResult<()> {
    if policy.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: policy.schema_version.clone(),
        });
    }

    // Estimator
    let lookback = policy.estimator.effective_lookback_minutes();
    if lookback == 0 || lookback > MAX_WINDOW_MINUTES {
        return Err(invalid(
            "estimator.lookback_minutes",
            format!("Must be in [1, {}], got {}", MAX_WINDOW_MINUTES, lookback),
        ));
    }
    let half_life = policy.estimator.half_life_minutes;
    if !half_life.is_finite() || half_life <= 0.0 {
        return Err(invalid(
            "estimator.half_life_minutes",
            format!("Must be positive, got {}", half_life),
        ));
    }

    // Fraud thresholds: a threshold of 9 or more can never be exceeded
    if policy.fraud.occupancy_threshold >= MAX_DEVIATION {
        return Err(invalid(
            "fraud.occupancy_threshold",
            format!(
                "Must be below {}, got {}",
                MAX_DEVIATION, policy.fraud.occupancy_threshold
            ),
        ));
    }
    if policy.fraud.line_threshold >= MAX_DEVIATION {
        return Err(invalid(
            "fraud.line_threshold",
            format!(
                "Must be below {}, got {}",
                MAX_DEVIATION, policy.fraud.line_threshold
            ),
        ));
    }

    // Cooldown
    if policy.cooldown.minutes > MAX_WINDOW_MINUTES {
        return Err(invalid(
            "cooldown.minutes",
            format!(
                "Must be at most {}, got {}",
                MAX_WINDOW_MINUTES, policy.cooldown.minutes
            ),
        ));
    }

    // Retention must keep everything the estimator and cooldown still read
    if policy.retention.max_age_hours == 0 {
        return Err(invalid(
            "retention.max_age_hours",
            "Must be positive".to_string(),
        ));
    }
    let retention_minutes = u64::from(policy.retention.max_age_hours) * 60;
    let needed = u64::from(lookback.max(policy.cooldown.minutes));
    if retention_minutes < needed {
        return Err(ValidationError::SemanticError(format!(
            "retention.max_age_hours ({}h) is shorter than the {} minute window still read by the estimator or cooldown",
            policy.retention.max_age_hours, needed
        )));
    }

    Ok(())
}
