//! Exit codes for the cs-core CLI.
//!
//! Exit codes communicate the submission outcome without requiring output
//! parsing.
//!
//! Exit code ranges:
//! - 0-2: Operational outcomes (not errors)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal and storage errors

use cs_common::error::ErrorCategory;
use cs_common::Error;

/// Exit codes for cs-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-2)
    // ========================================================================
    /// Success
    Clean = 0,

    /// Submission rejected by the cooldown; nothing was stored
    CooldownRejected = 1,

    /// Submission accepted but flagged as an outlier
    Flagged = 2,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments, level or reporter identity
    ArgsError = 10,

    /// Venue or report not found
    NotFound = 11,

    /// Policy could not be loaded or failed validation
    ConfigError = 12,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// Store or file I/O failure
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Codes 0-2 are outcomes, not failures.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Map a core error onto its exit code.
    pub fn from_error(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Input => ExitCode::ArgsError,
            ErrorCategory::Lookup => ExitCode::NotFound,
            ErrorCategory::Storage | ErrorCategory::Io => ExitCode::IoError,
        }
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::CooldownRejected => "OK_COOLDOWN_REJECTED",
            ExitCode::Flagged => "OK_FLAGGED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::NotFound => "ERR_NOT_FOUND",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
