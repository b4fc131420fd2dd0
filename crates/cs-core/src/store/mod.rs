//! Report store interface and reference implementations.
//!
//! The estimation and anti-fraud core only ever talks to a [`ReportStore`].
//! Two stores ship with the crate:
//!
//! - [`MemoryStore`]: everything in process memory, snapshot-and-restore
//!   transactions.
//! - [`JsonFileStore`]: the same state persisted as one JSON document,
//!   replaced atomically (temp file + rename) on every commit.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::{MemoryStore, StoreState};

use chrono::{DateTime, Utc};
use cs_common::{
    DisplayedValues, Level, Report, ReportId, ReporterId, Result, Venue, VenueId,
};

/// Storage operations consumed by the core.
///
/// Implementations must propagate faults unchanged; the core never retries.
pub trait ReportStore {
    /// Look up a venue by id.
    fn venue(&self, venue_id: VenueId) -> Result<Option<Venue>>;

    /// All venues, active or not, ordered by id.
    fn venues(&self) -> Result<Vec<Venue>>;

    /// Register a new active venue with no cached values.
    fn insert_venue(&mut self, name: &str) -> Result<Venue>;

    /// Toggle a venue's active flag.
    fn set_venue_active(&mut self, venue_id: VenueId, active: bool) -> Result<Venue>;

    /// Reports for a venue with `created_at >= since`, newest first.
    fn load_recent_reports(&self, venue_id: VenueId, since: DateTime<Utc>)
        -> Result<Vec<Report>>;

    /// Persist a new unflagged report.
    fn create_report(
        &mut self,
        venue_id: VenueId,
        reporter: &ReporterId,
        occupancy: Level,
        line_wait: Level,
        created_at: DateTime<Utc>,
    ) -> Result<Report>;

    /// Set the flagged bit on an existing report.
    fn update_report_flag(&mut self, report_id: ReportId, flagged: bool) -> Result<()>;

    /// Current strike count, creating a zero counter for unseen reporters.
    fn get_or_create_strike_counter(&mut self, reporter: &ReporterId) -> Result<u32>;

    /// Add one strike and return the new count.
    fn increment_strike_counter(&mut self, reporter: &ReporterId) -> Result<u32>;

    /// Set the counter back to zero. Flags already set are left alone.
    fn reset_strike_counter(&mut self, reporter: &ReporterId) -> Result<()>;

    /// Flag every report the reporter ever made, at every venue.
    /// Returns how many reports changed.
    fn mass_flag_reports(&mut self, reporter: &ReporterId) -> Result<usize>;

    /// Overwrite a venue's cached displayed values.
    fn save_venue_displayed_values(
        &mut self,
        venue_id: VenueId,
        displayed: DisplayedValues,
        computed_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Every report by one reporter, newest first.
    fn reports_by_reporter(&self, reporter: &ReporterId) -> Result<Vec<Report>>;

    /// Delete reports with `created_at < cutoff`. Returns how many were removed.
    fn sweep_reports_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Run `f` so that either all of its writes land or none do.
    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
        Self: Sized;
}

/// Newest first, ties broken by id so the order is total.
pub(crate) fn sort_newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
