//! CrowdSense policy loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for policy.json
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation
//! - Config snapshots for audit output

pub mod policy;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use policy::{
    CooldownPolicy, EstimatorModel, EstimatorPolicy, FraudBaseline, FraudPolicy, Policy,
    RetentionPolicy, StrikePolicy,
};
pub use resolve::{load_policy, resolve_config, ConfigPaths, ConfigSource, LoadedPolicy};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_policy, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
