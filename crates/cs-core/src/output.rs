//! Command output rendering.
//!
//! stdout carries exactly one payload per command, in the selected
//! [`OutputFormat`]. JSON payloads are wrapped in an envelope with the schema
//! version, run id and generation time. Errors go to stderr.

use chrono::Utc;
use cs_common::error::{format_error_human, StructuredError};
use cs_common::{DisplayedValues, Error, OutputFormat, ReporterStanding, Venue, SCHEMA_VERSION};
use cs_config::ConfigSnapshot;
use serde::Serialize;
use serde_json::{json, Value};

use crate::estimator::Estimate;
use crate::tracker::{Rejection, SubmissionOutcome, SweepSummary, VenueSnapshot};

/// Human renderings for the non-JSON formats.
pub trait Render {
    /// Markdown for `--format md`.
    fn markdown(&self) -> String;
    /// One line for `--format summary`.
    fn summary(&self) -> String;
}

/// Wrap a payload in the JSON envelope.
pub fn envelope(command: &str, run_id: &str, payload: Value) -> Value {
    json!({
        "schema_version": SCHEMA_VERSION,
        "run_id": run_id,
        "generated_at": Utc::now().to_rfc3339(),
        "command": command,
        "result": payload,
    })
}

/// Render a command result in the requested format.
pub fn render<T: Serialize + Render>(
    format: OutputFormat,
    command: &str,
    run_id: &str,
    value: &T,
) -> String {
    match format {
        OutputFormat::Json => {
            let payload = serde_json::to_value(value).unwrap_or(Value::Null);
            to_pretty(&envelope(command, run_id, payload))
        }
        OutputFormat::Md => value.markdown(),
        OutputFormat::Summary => value.summary(),
    }
}

/// Render an error for stderr.
pub fn render_error(format: OutputFormat, command: &str, err: &Error, use_color: bool) -> String {
    match format {
        OutputFormat::Json => to_pretty(&json!({
            "schema_version": SCHEMA_VERSION,
            "generated_at": Utc::now().to_rfc3339(),
            "command": command,
            "status": "error",
            "error": StructuredError::from(err),
        })),
        OutputFormat::Md => format_error_human(err, use_color),
        OutputFormat::Summary => format!("{}: error {}: {}", command, err.code(), err),
    }
}

pub fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// `-` stands for "no data".
fn level_cell(value: Option<u8>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn displayed_line(displayed: &DisplayedValues) -> String {
    format!(
        "occupancy {} / line {}",
        level_cell(displayed.occupancy),
        level_cell(displayed.line)
    )
}

impl Render for SubmissionOutcome {
    fn markdown(&self) -> String {
        let mut out = String::from("# Report Submission\n\n");
        match (&self.rejection, self.report_id) {
            (Some(Rejection::CooldownActive {
                last_report_at,
                retry_after,
            }), _) => {
                out.push_str("Status: rejected (cooldown)\n");
                out.push_str(&format!("Last report: {}\n", last_report_at.to_rfc3339()));
                out.push_str(&format!("Retry after: {}\n", retry_after.to_rfc3339()));
            }
            (None, report_id) => {
                let status = if self.flagged { "accepted, flagged" } else { "accepted" };
                out.push_str(&format!("Status: {}\n", status));
                if let Some(id) = report_id {
                    out.push_str(&format!("Report: {}\n", id));
                }
            }
        }
        if let Some(strike) = &self.strike {
            out.push_str(&format!("Strikes: {} ({})\n", strike.strikes, strike.state));
            if strike.reports_mass_flagged > 0 {
                out.push_str(&format!(
                    "History flagged: {} report(s)\n",
                    strike.reports_mass_flagged
                ));
            }
        }
        out.push_str(&format!("\nDisplayed: {}\n", displayed_line(&self.displayed)));
        out
    }

    fn summary(&self) -> String {
        let status = if !self.accepted {
            "rejected"
        } else if self.flagged {
            "flagged"
        } else {
            "accepted"
        };
        format!("submit: {} | {}", status, displayed_line(&self.displayed))
    }
}

impl Render for Estimate {
    fn markdown(&self) -> String {
        format!(
            "# Venue Estimate\n\nOccupancy: {}\nLine: {}\nReports considered: {}\nModel: {}\n",
            level_cell(self.displayed.occupancy),
            level_cell(self.displayed.line),
            self.reports_considered,
            self.model
        )
    }

    fn summary(&self) -> String {
        format!(
            "{} ({} reports, {})",
            displayed_line(&self.displayed),
            self.reports_considered,
            self.model
        )
    }
}

impl Render for Vec<VenueSnapshot> {
    fn markdown(&self) -> String {
        let mut out = String::from("# Venues\n\n");
        if self.is_empty() {
            out.push_str("No venues.\n");
            return out;
        }
        out.push_str("| id | name | active | occupancy | line | reports |\n");
        out.push_str("|---:|------|:------:|----------:|-----:|--------:|\n");
        for snap in self {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                snap.venue.id,
                snap.venue.name,
                if snap.venue.active { "yes" } else { "no" },
                level_cell(snap.estimate.displayed.occupancy),
                level_cell(snap.estimate.displayed.line),
                snap.estimate.reports_considered
            ));
        }
        out
    }

    fn summary(&self) -> String {
        format!("{} venue(s)", self.len())
    }
}

impl Render for Venue {
    fn markdown(&self) -> String {
        format!(
            "# Venue {}\n\nName: {}\nActive: {}\nDisplayed: {}\n",
            self.id,
            self.name,
            self.active,
            displayed_line(&self.displayed)
        )
    }

    fn summary(&self) -> String {
        let state = if self.active { "active" } else { "inactive" };
        format!("venue {} '{}' {}", self.id, self.name, state)
    }
}

impl Render for ReporterStanding {
    fn markdown(&self) -> String {
        format!(
            "# Reporter {}\n\nStrikes: {}\nStanding: {}\n",
            self.reporter, self.strikes, self.state
        )
    }

    fn summary(&self) -> String {
        format!("{}: {} strike(s), {}", self.reporter, self.strikes, self.state)
    }
}

impl Render for SweepSummary {
    fn markdown(&self) -> String {
        format!(
            "# Retention Sweep\n\nCutoff: {}\nRemoved: {}\n",
            self.cutoff.to_rfc3339(),
            self.removed
        )
    }

    fn summary(&self) -> String {
        format!("sweep: removed {} report(s)", self.removed)
    }
}

impl Render for ConfigSnapshot {
    fn markdown(&self) -> String {
        let s = &self.summary;
        let mut out = String::from("# Policy\n\n");
        out.push_str(&format!(
            "Source: {}\n",
            self.policy_path.as_deref().unwrap_or("built-in defaults")
        ));
        if let Some(hash) = &self.policy_hash {
            out.push_str(&format!("Hash: {}\n", hash));
        }
        out.push_str(&format!(
            "\nEstimator: {} (lookback {} min, half-life {} min, exclude flagged: {})\n",
            s.estimator_model, s.lookback_minutes, s.half_life_minutes, s.exclude_flagged
        ));
        out.push_str(&format!(
            "Fraud: occupancy > {}, line > {}, baseline {}\n",
            s.occupancy_threshold, s.line_threshold, s.fraud_baseline
        ));
        out.push_str(&format!("Strikes: history flagged above {}\n", s.strike_threshold));
        out.push_str(&format!("Cooldown: {} min\n", s.cooldown_minutes));
        out.push_str(&format!("Retention: {} h\n", s.retention_hours));
        out
    }

    fn summary(&self) -> String {
        format!(
            "policy: {} from {}",
            self.summary.estimator_model, self.policy_source
        )
    }
}
