//! Error types for CrowdSense.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for callers
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Venue Not Found
//!   Reason: venue 42 not found
//!   Fix: List known venues with 'cs-core venue list' and retry with a valid id.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 30,
//!   "category": "lookup",
//!   "message": "venue 42 not found",
//!   "recoverable": false,
//!   "context": { "venue_id": 42 }
//! }
//! ```
//!
//! A cooldown rejection is deliberately *not* an error: it is a defined
//! submission outcome and never travels through this type.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for CrowdSense operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Policy/configuration errors.
    Config,
    /// Caller input rejected before anything was persisted.
    Input,
    /// Referenced entity does not exist.
    Lookup,
    /// Report store faults.
    Storage,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Lookup => write!(f, "lookup"),
            ErrorCategory::Storage => write!(f, "storage"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for CrowdSense.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    // Input errors (20-29)
    #[error("invalid {field} level {value}: must be between 1 and 10")]
    InvalidLevel { field: &'static str, value: i64 },

    #[error("invalid reporter identity: {0}")]
    InvalidReporter(String),

    #[error("invalid venue name: {0}")]
    InvalidVenueName(String),

    // Lookup errors (30-39)
    #[error("venue {venue_id} not found")]
    VenueNotFound { venue_id: u64 },

    #[error("report {report_id} not found")]
    ReportNotFound { report_id: u64 },

    // Storage errors (40-49)
    #[error("report store failure: {0}")]
    Storage(String),

    #[error("report store corrupted: {0}")]
    StoreCorrupted(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 30-39: Lookup errors
    /// - 40-49: Storage errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidPolicy(_) => 11,
            Error::InvalidLevel { .. } => 20,
            Error::InvalidReporter(_) => 21,
            Error::InvalidVenueName(_) => 22,
            Error::VenueNotFound { .. } => 30,
            Error::ReportNotFound { .. } => 31,
            Error::Storage(_) => 40,
            Error::StoreCorrupted(_) => 41,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidPolicy(_) => ErrorCategory::Config,
            Error::InvalidLevel { .. }
            | Error::InvalidReporter(_)
            | Error::InvalidVenueName(_) => ErrorCategory::Input,
            Error::VenueNotFound { .. } | Error::ReportNotFound { .. } => ErrorCategory::Lookup,
            Error::Storage(_) | Error::StoreCorrupted(_) => ErrorCategory::Storage,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// The core never retries on its own; this is a hint for the caller.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidPolicy(_) => true,

            // Same input will fail the same way
            Error::InvalidLevel { .. } => false,
            Error::InvalidReporter(_) => false,
            Error::InvalidVenueName(_) => false,

            Error::VenueNotFound { .. } => false,
            Error::ReportNotFound { .. } => false,

            // Store faults are usually transient
            Error::Storage(_) => true,
            Error::StoreCorrupted(_) => false,

            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'cs-core check' to validate configuration, or check syntax in policy.json."
            }
            Error::InvalidPolicy(_) => {
                "Fix the reported field in policy.json, or remove the file to use built-in defaults."
            }
            Error::InvalidLevel { .. } => "Occupancy and line-wait levels must be whole numbers from 1 to 10.",
            Error::InvalidReporter(_) => {
                "Reporter identities must be non-empty and at most 255 bytes."
            }
            Error::InvalidVenueName(_) => "Venue names must be non-empty after trimming whitespace.",
            Error::VenueNotFound { .. } => {
                "List known venues with 'cs-core venue list' and retry with a valid id."
            }
            Error::ReportNotFound { .. } => {
                "The report no longer exists. It may have been removed by a retention sweep."
            }
            Error::Storage(_) => {
                "The submission was not applied. Retry once the report store is reachable."
            }
            Error::StoreCorrupted(_) => {
                "The store file could not be parsed. Restore it from backup or start a new store."
            }
            Error::Io(_) => {
                "Check disk space, permissions, and that the store directory exists. Retry the operation."
            }
            Error::Json(_) => {
                "Invalid JSON. Check syntax with 'jq . <file>' or restore from backup."
            }
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidPolicy(_) => "Invalid Policy Configuration",
            Error::InvalidLevel { .. } => "Invalid Level",
            Error::InvalidReporter(_) => "Invalid Reporter",
            Error::InvalidVenueName(_) => "Invalid Venue Name",
            Error::VenueNotFound { .. } => "Venue Not Found",
            Error::ReportNotFound { .. } => "Report Not Found",
            Error::Storage(_) => "Storage Failure",
            Error::StoreCorrupted(_) => "Store Corrupted",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., venue id, field name).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::VenueNotFound { venue_id } => {
                context.insert("venue_id".to_string(), serde_json::json!(venue_id));
            }
            Error::ReportNotFound { report_id } => {
                context.insert("report_id".to_string(), serde_json::json!(report_id));
            }
            Error::InvalidLevel { field, value } => {
                context.insert("field".to_string(), serde_json::json!(field));
                context.insert("value".to_string(), serde_json::json!(value));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::Config("test".into()).code(), 10);
        assert_eq!(
            Error::InvalidLevel {
                field: "occupancy",
                value: 11
            }
            .code(),
            20
        );
        assert_eq!(Error::VenueNotFound { venue_id: 7 }.code(), 30);
        assert_eq!(Error::Storage("disk gone".into()).code(), 40);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(Error::Config("test".into()).category(), ErrorCategory::Config);
        assert_eq!(
            Error::InvalidReporter("".into()).category(),
            ErrorCategory::Input
        );
        assert_eq!(
            Error::VenueNotFound { venue_id: 1 }.category(),
            ErrorCategory::Lookup
        );
        assert_eq!(
            Error::StoreCorrupted("bad".into()).category(),
            ErrorCategory::Storage
        );
    }

    #[test]
    fn test_error_recoverable() {
        assert!(Error::Storage("timeout".into()).is_recoverable());
        assert!(!Error::VenueNotFound { venue_id: 1 }.is_recoverable());
        assert!(!Error::InvalidLevel {
            field: "line_wait",
            value: 0
        }
        .is_recoverable());
    }

    #[test]
    fn test_invalid_level_message() {
        let err = Error::InvalidLevel {
            field: "occupancy",
            value: 12,
        };
        assert_eq!(
            err.to_string(),
            "invalid occupancy level 12: must be between 1 and 10"
        );
    }

    #[test]
    fn test_structured_error_from_error() {
        let err = Error::VenueNotFound { venue_id: 42 };
        let structured = StructuredError::from(&err);

        assert_eq!(structured.code, 30);
        assert_eq!(structured.category, ErrorCategory::Lookup);
        assert!(!structured.recoverable);
        assert_eq!(
            structured.context.get("venue_id"),
            Some(&serde_json::json!(42))
        );
    }

    #[test]
    fn test_structured_error_json() {
        let err = Error::InvalidLevel {
            field: "line_wait",
            value: 0,
        };
        let json = StructuredError::from(&err).to_json();

        assert!(json.contains(r#""code":20"#));
        assert!(json.contains(r#""category":"input""#));
        assert!(json.contains(r#""recoverable":false"#));
        assert!(json.contains(r#""field":"line_wait""#));
    }

    #[test]
    fn test_format_error_human() {
        let err = Error::VenueNotFound { venue_id: 9 };
        let formatted = format_error_human(&err, false);

        assert!(formatted.contains("Venue Not Found"));
        assert!(formatted.contains("venue 9 not found"));
        assert!(formatted.contains("cs-core venue list"));
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Storage.to_string(), "storage");
        assert_eq!(ErrorCategory::Lookup.to_string(), "lookup");
    }
}
