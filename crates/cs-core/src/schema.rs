//! JSON Schema generation for agent-facing output types.
//!
//! ```bash
//! # List available schema types
//! cs-core schema --list
//!
//! # Generate schema for a specific type
//! cs-core schema SubmissionOutcome
//!
//! # Generate all schemas
//! cs-core schema --all
//! ```

use schemars::schema_for;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::cooldown::CooldownDecision;
pub use crate::estimator::Estimate;
pub use crate::fraud::FraudVerdict;
pub use crate::strikes::{StrikeOutcome, StrikeTransition};
pub use crate::tracker::{Rejection, SubmissionOutcome, SweepSummary, VenueSnapshot};
pub use cs_common::{
    DisplayedValues, Level, Report, ReportId, ReporterId, ReporterStanding, StandingState, Venue,
    VenueId,
};
pub use cs_config::{ConfigSnapshot, Policy};

/// Available schema types with their descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        // Identity and scale
        ("VenueId", "Store-assigned venue identifier"),
        ("ReportId", "Store-assigned report identifier"),
        ("ReporterId", "Opaque reporter identity"),
        ("Level", "Occupancy or line-wait level on the 1-10 scale"),
        // Data model
        ("Report", "One stored occupancy/line observation"),
        ("Venue", "Monitored venue with cached displayed values"),
        ("DisplayedValues", "Smoothed client-facing values"),
        ("StandingState", "Reporter standing relative to the strike threshold"),
        ("ReporterStanding", "Strike count and standing for one reporter"),
        // Pipeline results
        ("Estimate", "Displayed values with window statistics"),
        ("VenueSnapshot", "Venue with a freshly computed estimate"),
        ("CooldownDecision", "Accept or reject from the cooldown guard"),
        ("FraudVerdict", "Outlier classification of a report"),
        ("StrikeTransition", "Effect of one strike on a reporter"),
        ("StrikeOutcome", "Strike recorded against a store"),
        ("Rejection", "Reason a submission was not accepted"),
        ("SubmissionOutcome", "Complete result of a report submission"),
        ("SweepSummary", "Result of a retention sweep"),
        // Configuration
        ("Policy", "Estimator, fraud, strike, cooldown and retention policy"),
        ("ConfigSnapshot", "Policy provenance and summary"),
    ]
}

/// Generate JSON Schema for a type by name.
///
/// Returns `None` if the type is unknown.
pub fn generate_schema(type_name: &str) -> Option<Value> {
    let schema = match type_name {
        "VenueId" => schema_for!(VenueId),
        "ReportId" => schema_for!(ReportId),
        "ReporterId" => schema_for!(ReporterId),
        "Level" => schema_for!(Level),
        "Report" => schema_for!(Report),
        "Venue" => schema_for!(Venue),
        "DisplayedValues" => schema_for!(DisplayedValues),
        "StandingState" => schema_for!(StandingState),
        "ReporterStanding" => schema_for!(ReporterStanding),
        "Estimate" => schema_for!(Estimate),
        "VenueSnapshot" => schema_for!(VenueSnapshot),
        "CooldownDecision" => schema_for!(CooldownDecision),
        "FraudVerdict" => schema_for!(FraudVerdict),
        "StrikeTransition" => schema_for!(StrikeTransition),
        "StrikeOutcome" => schema_for!(StrikeOutcome),
        "Rejection" => schema_for!(Rejection),
        "SubmissionOutcome" => schema_for!(SubmissionOutcome),
        "SweepSummary" => schema_for!(SweepSummary),
        "Policy" => schema_for!(Policy),
        "ConfigSnapshot" => schema_for!(ConfigSnapshot),
        _ => return None,
    };

    serde_json::to_value(schema).ok()
}

/// Generate all schemas as a map from type name to schema.
pub fn generate_all_schemas() -> BTreeMap<String, Value> {
    available_schemas()
        .into_iter()
        .filter_map(|(name, _)| generate_schema(name).map(|s| (name.to_string(), s)))
        .collect()
}

/// Schema output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// Pretty-printed JSON (default)
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

/// Format a schema value for output.
pub fn format_schema(schema: &Value, format: SchemaFormat) -> String {
    let rendered = match format {
        SchemaFormat::Json => serde_json::to_string_pretty(schema),
        SchemaFormat::JsonCompact => serde_json::to_string(schema),
    };
    rendered.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_schemas_generate() {
        for (name, _desc) in available_schemas() {
            assert!(generate_schema(name).is_some(), "schema for '{}'", name);
        }
    }

    #[test]
    fn test_unknown_schema_returns_none() {
        assert!(generate_schema("Plan").is_none());
        assert!(generate_schema("").is_none());
    }

    #[test]
    fn test_level_schema_bounds() {
        let schema = generate_schema("Level").unwrap();
        assert_eq!(schema["minimum"], 1);
        assert_eq!(schema["maximum"], 10);
    }

    #[test]
    fn test_submission_outcome_schema_has_fields() {
        let schema = generate_schema("SubmissionOutcome").unwrap();
        let props = &schema["properties"];
        assert!(props.get("accepted").is_some());
        assert!(props.get("displayed").is_some());
    }

    #[test]
    fn test_generate_all_schemas() {
        let all = generate_all_schemas();
        assert_eq!(all.len(), available_schemas().len());
        assert!(all.contains_key("Policy"));
    }

    #[test]
    fn test_format_schema() {
        let schema = generate_schema("FraudVerdict").unwrap();
        assert!(format_schema(&schema, SchemaFormat::Json).contains('\n'));
        assert!(!format_schema(&schema, SchemaFormat::JsonCompact).contains('\n'));
    }
}
