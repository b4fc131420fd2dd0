//! Test helpers shared by unit and integration tests.
//!
//! Enabled under `cfg(test)` and by the `test-utils` feature.

use chrono::{DateTime, Utc};
use cs_common::{DisplayedValues, Error, Level, Report, ReportId, ReporterId, Result, Venue, VenueId};

use crate::store::{MemoryStore, ReportStore, StoreState};

/// In-memory store that fails the Nth write after being armed.
///
/// Reads never fail. Writes are counted from the moment
/// [`FaultyStore::fail_on_write`] is called; the write with index `n`
/// (zero-based) returns [`Error::Storage`] without touching state.
#[derive(Debug, Clone, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    writes: usize,
    fail_at: Option<usize>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on_write(&mut self, n: usize) {
        self.writes = 0;
        self.fail_at = Some(n);
    }

    pub fn disarm(&mut self) {
        self.fail_at = None;
    }

    /// Writes attempted since the store was last armed.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn state(&self) -> &StoreState {
        self.inner.state()
    }

    fn write<T>(&mut self, op: impl FnOnce(&mut MemoryStore) -> Result<T>) -> Result<T> {
        let index = self.writes;
        self.writes += 1;
        if self.fail_at == Some(index) {
            return Err(Error::Storage(format!("injected fault at write {}", index)));
        }
        op(&mut self.inner)
    }
}

impl ReportStore for FaultyStore {
    fn venue(&self, venue_id: VenueId) -> Result<Option<Venue>> {
        self.inner.venue(venue_id)
    }

    fn venues(&self) -> Result<Vec<Venue>> {
        self.inner.venues()
    }

    fn insert_venue(&mut self, name: &str) -> Result<Venue> {
        self.write(|s| s.insert_venue(name))
    }

    fn set_venue_active(&mut self, venue_id: VenueId, active: bool) -> Result<Venue> {
        self.write(|s| s.set_venue_active(venue_id, active))
    }

    fn load_recent_reports(&self, venue_id: VenueId, since: DateTime<Utc>) -> Result<Vec<Report>> {
        self.inner.load_recent_reports(venue_id, since)
    }

    fn create_report(
        &mut self,
        venue_id: VenueId,
        reporter: &ReporterId,
        occupancy: Level,
        line_wait: Level,
        created_at: DateTime<Utc>,
    ) -> Result<Report> {
        self.write(|s| s.create_report(venue_id, reporter, occupancy, line_wait, created_at))
    }

    fn update_report_flag(&mut self, report_id: ReportId, flagged: bool) -> Result<()> {
        self.write(|s| s.update_report_flag(report_id, flagged))
    }

    fn get_or_create_strike_counter(&mut self, reporter: &ReporterId) -> Result<u32> {
        self.write(|s| s.get_or_create_strike_counter(reporter))
    }

    fn increment_strike_counter(&mut self, reporter: &ReporterId) -> Result<u32> {
        self.write(|s| s.increment_strike_counter(reporter))
    }

    fn reset_strike_counter(&mut self, reporter: &ReporterId) -> Result<()> {
        self.write(|s| s.reset_strike_counter(reporter))
    }

    fn mass_flag_reports(&mut self, reporter: &ReporterId) -> Result<usize> {
        self.write(|s| s.mass_flag_reports(reporter))
    }

    fn save_venue_displayed_values(
        &mut self,
        venue_id: VenueId,
        displayed: DisplayedValues,
        computed_at: DateTime<Utc>,
    ) -> Result<()> {
        self.write(|s| s.save_venue_displayed_values(venue_id, displayed, computed_at))
    }

    fn reports_by_reporter(&self, reporter: &ReporterId) -> Result<Vec<Report>> {
        self.inner.reports_by_reporter(reporter)
    }

    fn sweep_reports_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.write(|s| s.sweep_reports_before(cutoff))
    }

    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let snapshot = self.inner.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.inner = snapshot;
                Err(err)
            }
        }
    }
}
