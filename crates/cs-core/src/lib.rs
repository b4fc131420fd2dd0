//! CrowdSense Core Library
//!
//! This library provides the estimation and anti-fraud core:
//! - Displayed-value estimation over a venue's recent reports
//! - Outlier flagging, strike escalation and submission cooldown
//! - The report store interface with in-memory and JSON file stores
//! - The submission pipeline tying them together
//! - Exit codes, structured logging and output rendering for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod cooldown;
pub mod estimator;
pub mod exit_codes;
pub mod fraud;
pub mod logging;
pub mod output;
pub mod schema;
pub mod store;
pub mod strikes;
pub mod tracker;

// Re-export test utilities for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use store::{JsonFileStore, MemoryStore, ReportStore};
pub use tracker::{Rejection, SharedTracker, SubmissionOutcome, SweepSummary, Tracker};
