//! CrowdSense common types, IDs, and errors.
//!
//! This crate provides foundational types shared across cs-core modules:
//! - Venue, report and reporter identity types
//! - The validated 1–10 `Level` scale
//! - The report/venue data model
//! - Common error types
//! - Output format selection

pub mod error;
pub mod id;
pub mod level;
pub mod model;
pub mod output;

pub use error::{Error, Result};
pub use id::{ReportId, ReporterId, VenueId};
pub use level::Level;
pub use model::{DisplayedValues, Report, ReporterStanding, StandingState, Venue};
pub use output::OutputFormat;

/// Schema version for serialized state and agent-facing output.
pub const SCHEMA_VERSION: &str = "1.0.0";
