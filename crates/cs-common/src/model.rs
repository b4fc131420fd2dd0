//! Report, venue and reporter data model.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::id::{ReportId, ReporterId, VenueId};
use crate::level::Level;

/// One user-submitted occupancy/line observation.
///
/// Everything except `flagged` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    pub id: ReportId,
    pub venue_id: VenueId,
    pub reporter: ReporterId,
    pub occupancy: Level,
    pub line_wait: Level,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub flagged: bool,
}

/// Smoothed client-facing values. `None` means "no data", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DisplayedValues {
    pub occupancy: Option<u8>,
    pub line: Option<u8>,
}

impl DisplayedValues {
    pub const NO_DATA: DisplayedValues = DisplayedValues {
        occupancy: None,
        line: None,
    };

    pub fn new(occupancy: Option<u8>, line: Option<u8>) -> Self {
        Self { occupancy, line }
    }

    pub fn is_empty(&self) -> bool {
        self.occupancy.is_none() && self.line.is_none()
    }
}

/// A monitored bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub active: bool,
    /// Cache of the last computed estimate. Never ground truth.
    #[serde(default)]
    pub displayed: DisplayedValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displayed_at: Option<DateTime<Utc>>,
}

/// Reporter standing relative to the strike threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StandingState {
    /// Strikes at or below the threshold.
    GoodStanding,
    /// Strikes above the threshold: every report this identity has ever
    /// made is treated as flagged.
    HistoryPoisoned,
}

impl StandingState {
    /// The state implied by a strike count. Strictly greater than the
    /// threshold poisons the history.
    pub fn for_strikes(strikes: u32, threshold: u32) -> Self {
        if strikes > threshold {
            StandingState::HistoryPoisoned
        } else {
            StandingState::GoodStanding
        }
    }
}

impl std::fmt::Display for StandingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StandingState::GoodStanding => write!(f, "good_standing"),
            StandingState::HistoryPoisoned => write!(f, "history_poisoned"),
        }
    }
}

/// The reporter entity as seen by strike tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReporterStanding {
    pub reporter: ReporterId,
    pub strikes: u32,
    pub state: StandingState,
}

impl ReporterStanding {
    pub fn new(reporter: ReporterId, strikes: u32, threshold: u32) -> Self {
        Self {
            reporter,
            strikes,
            state: StandingState::for_strikes(strikes, threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standing_threshold_is_strict() {
        assert_eq!(StandingState::for_strikes(0, 3), StandingState::GoodStanding);
        assert_eq!(StandingState::for_strikes(3, 3), StandingState::GoodStanding);
        assert_eq!(
            StandingState::for_strikes(4, 3),
            StandingState::HistoryPoisoned
        );
    }

    #[test]
    fn test_displayed_values_no_data() {
        assert!(DisplayedValues::NO_DATA.is_empty());
        assert!(DisplayedValues::default().is_empty());
        assert!(!DisplayedValues::new(Some(4), None).is_empty());
    }

    #[test]
    fn test_report_json_shape() {
        let report = Report {
            id: ReportId(1),
            venue_id: VenueId(2),
            reporter: ReporterId::parse("alice").unwrap(),
            occupancy: Level::new("occupancy", 6).unwrap(),
            line_wait: Level::new("line_wait", 2).unwrap(),
            created_at: DateTime::parse_from_rfc3339("2026-01-15T22:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            flagged: false,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["occupancy"], 6);
        assert_eq!(value["reporter"], "alice");
        assert_eq!(value["flagged"], false);

        let back: Report = serde_json::from_value(value).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_standing_display() {
        assert_eq!(StandingState::HistoryPoisoned.to_string(), "history_poisoned");
    }
}
