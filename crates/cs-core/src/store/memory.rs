//! In-memory report store.

use chrono::{DateTime, Utc};
use cs_common::{
    DisplayedValues, Error, Level, Report, ReportId, ReporterId, Result, Venue, VenueId,
    SCHEMA_VERSION,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{sort_newest_first, ReportStore};

/// Complete store contents. Also the on-disk document of [`super::JsonFileStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    pub schema_version: String,
    next_venue_id: u64,
    next_report_id: u64,
    #[serde(default)]
    venues: Vec<Venue>,
    /// Insertion order, which is also id order.
    #[serde(default)]
    reports: Vec<Report>,
    #[serde(default)]
    strikes: BTreeMap<ReporterId, u32>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            next_venue_id: 1,
            next_report_id: 1,
            venues: Vec::new(),
            reports: Vec::new(),
            strikes: BTreeMap::new(),
        }
    }
}

impl StoreState {
    pub fn report_count(&self) -> usize {
        self.reports.len()
    }

    /// Every stored report in id order.
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn report(&self, report_id: ReportId) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == report_id)
    }

    fn venue_mut(&mut self, venue_id: VenueId) -> Result<&mut Venue> {
        self.venues
            .iter_mut()
            .find(|v| v.id == venue_id)
            .ok_or(Error::VenueNotFound { venue_id: venue_id.0 })
    }

    pub(crate) fn venue(&self, venue_id: VenueId) -> Option<Venue> {
        self.venues.iter().find(|v| v.id == venue_id).cloned()
    }

    pub(crate) fn venues(&self) -> Vec<Venue> {
        let mut venues = self.venues.clone();
        venues.sort_by_key(|v| v.id);
        venues
    }

    pub(crate) fn insert_venue(&mut self, name: &str) -> Venue {
        let venue = Venue {
            id: VenueId(self.next_venue_id),
            name: name.to_string(),
            active: true,
            displayed: DisplayedValues::NO_DATA,
            displayed_at: None,
        };
        self.next_venue_id += 1;
        self.venues.push(venue.clone());
        venue
    }

    pub(crate) fn set_venue_active(&mut self, venue_id: VenueId, active: bool) -> Result<Venue> {
        let venue = self.venue_mut(venue_id)?;
        venue.active = active;
        Ok(venue.clone())
    }

    pub(crate) fn load_recent_reports(&self, venue_id: VenueId, since: DateTime<Utc>) -> Vec<Report> {
        let mut recent: Vec<Report> = self
            .reports
            .iter()
            .filter(|r| r.venue_id == venue_id && r.created_at >= since)
            .cloned()
            .collect();
        sort_newest_first(&mut recent);
        recent
    }

    pub(crate) fn create_report(
        &mut self,
        venue_id: VenueId,
        reporter: &ReporterId,
        occupancy: Level,
        line_wait: Level,
        created_at: DateTime<Utc>,
    ) -> Result<Report> {
        if self.venue(venue_id).is_none() {
            return Err(Error::VenueNotFound { venue_id: venue_id.0 });
        }
        let report = Report {
            id: ReportId(self.next_report_id),
            venue_id,
            reporter: reporter.clone(),
            occupancy,
            line_wait,
            created_at,
            flagged: false,
        };
        self.next_report_id += 1;
        self.reports.push(report.clone());
        Ok(report)
    }

    pub(crate) fn update_report_flag(&mut self, report_id: ReportId, flagged: bool) -> Result<()> {
        let report = self
            .reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .ok_or(Error::ReportNotFound {
                report_id: report_id.0,
            })?;
        report.flagged = flagged;
        Ok(())
    }

    pub(crate) fn get_or_create_strike_counter(&mut self, reporter: &ReporterId) -> u32 {
        *self.strikes.entry(reporter.clone()).or_insert(0)
    }

    pub(crate) fn increment_strike_counter(&mut self, reporter: &ReporterId) -> u32 {
        let counter = self.strikes.entry(reporter.clone()).or_insert(0);
        *counter = counter.saturating_add(1);
        *counter
    }

    pub(crate) fn reset_strike_counter(&mut self, reporter: &ReporterId) {
        self.strikes.insert(reporter.clone(), 0);
    }

    pub(crate) fn mass_flag_reports(&mut self, reporter: &ReporterId) -> usize {
        let mut changed = 0;
        for report in self.reports.iter_mut().filter(|r| &r.reporter == reporter) {
            if !report.flagged {
                report.flagged = true;
                changed += 1;
            }
        }
        changed
    }

    pub(crate) fn save_venue_displayed_values(
        &mut self,
        venue_id: VenueId,
        displayed: DisplayedValues,
        computed_at: DateTime<Utc>,
    ) -> Result<()> {
        let venue = self.venue_mut(venue_id)?;
        venue.displayed = displayed;
        venue.displayed_at = Some(computed_at);
        Ok(())
    }

    pub(crate) fn reports_by_reporter(&self, reporter: &ReporterId) -> Vec<Report> {
        let mut reports: Vec<Report> = self
            .reports
            .iter()
            .filter(|r| &r.reporter == reporter)
            .cloned()
            .collect();
        sort_newest_first(&mut reports);
        reports
    }

    pub(crate) fn sweep_reports_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.reports.len();
        self.reports.retain(|r| r.created_at >= cutoff);
        before - self.reports.len()
    }
}

/// Report store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: StoreState,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn into_state(self) -> StoreState {
        self.state
    }
}

impl ReportStore for MemoryStore {
    fn venue(&self, venue_id: VenueId) -> Result<Option<Venue>> {
        Ok(self.state.venue(venue_id))
    }

    fn venues(&self) -> Result<Vec<Venue>> {
        Ok(self.state.venues())
    }

    fn insert_venue(&mut self, name: &str) -> Result<Venue> {
        Ok(self.state.insert_venue(name))
    }

    fn set_venue_active(&mut self, venue_id: VenueId, active: bool) -> Result<Venue> {
        self.state.set_venue_active(venue_id, active)
    }

    fn load_recent_reports(
        &self,
        venue_id: VenueId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Report>> {
        Ok(self.state.load_recent_reports(venue_id, since))
    }

    fn create_report(
        &mut self,
        venue_id: VenueId,
        reporter: &ReporterId,
        occupancy: Level,
        line_wait: Level,
        created_at: DateTime<Utc>,
    ) -> Result<Report> {
        self.state
            .create_report(venue_id, reporter, occupancy, line_wait, created_at)
    }

    fn update_report_flag(&mut self, report_id: ReportId, flagged: bool) -> Result<()> {
        self.state.update_report_flag(report_id, flagged)
    }

    fn get_or_create_strike_counter(&mut self, reporter: &ReporterId) -> Result<u32> {
        Ok(self.state.get_or_create_strike_counter(reporter))
    }

    fn increment_strike_counter(&mut self, reporter: &ReporterId) -> Result<u32> {
        Ok(self.state.increment_strike_counter(reporter))
    }

    fn reset_strike_counter(&mut self, reporter: &ReporterId) -> Result<()> {
        self.state.reset_strike_counter(reporter);
        Ok(())
    }

    fn mass_flag_reports(&mut self, reporter: &ReporterId) -> Result<usize> {
        Ok(self.state.mass_flag_reports(reporter))
    }

    fn save_venue_displayed_values(
        &mut self,
        venue_id: VenueId,
        displayed: DisplayedValues,
        computed_at: DateTime<Utc>,
    ) -> Result<()> {
        self.state
            .save_venue_displayed_values(venue_id, displayed, computed_at)
    }

    fn reports_by_reporter(&self, reporter: &ReporterId) -> Result<Vec<Report>> {
        Ok(self.state.reports_by_reporter(reporter))
    }

    fn sweep_reports_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize> {
        Ok(self.state.sweep_reports_before(cutoff))
    }

    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let snapshot = self.state.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.state = snapshot;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 6, 22, 0, 0).unwrap()
    }

    fn level(v: i64) -> Level {
        Level::new("occupancy", v).unwrap()
    }

    fn alice() -> ReporterId {
        ReporterId::parse("alice").unwrap()
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut store = MemoryStore::new();
        let a = store.insert_venue("Trinity").unwrap();
        let b = store.insert_venue("Coupes").unwrap();
        assert_eq!(a.id, VenueId(1));
        assert_eq!(b.id, VenueId(2));

        let r1 = store
            .create_report(a.id, &alice(), level(5), level(5), t0())
            .unwrap();
        let r2 = store
            .create_report(b.id, &alice(), level(5), level(5), t0())
            .unwrap();
        assert!(r2.id > r1.id);
        assert!(!r1.flagged);
    }

    #[test]
    fn test_create_report_requires_venue() {
        let mut store = MemoryStore::new();
        let err = store
            .create_report(VenueId(9), &alice(), level(5), level(5), t0())
            .unwrap_err();
        assert!(matches!(err, Error::VenueNotFound { venue_id: 9 }));
        assert_eq!(store.state().report_count(), 0);
    }

    #[test]
    fn test_load_recent_is_newest_first_and_inclusive() {
        let mut store = MemoryStore::new();
        let venue = store.insert_venue("Trinity").unwrap();
        for minutes in [30, 10, 20, 61] {
            store
                .create_report(
                    venue.id,
                    &alice(),
                    level(5),
                    level(5),
                    t0() - Duration::minutes(minutes),
                )
                .unwrap();
        }
        let recent = store
            .load_recent_reports(venue.id, t0() - Duration::minutes(30))
            .unwrap();
        let ages: Vec<i64> = recent
            .iter()
            .map(|r| (t0() - r.created_at).num_minutes())
            .collect();
        assert_eq!(ages, vec![10, 20, 30]);
    }

    #[test]
    fn test_mass_flag_spans_venues() {
        let mut store = MemoryStore::new();
        let a = store.insert_venue("Trinity").unwrap();
        let b = store.insert_venue("Coupes").unwrap();
        let bob = ReporterId::parse("bob").unwrap();
        store.create_report(a.id, &alice(), level(5), level(5), t0()).unwrap();
        store.create_report(b.id, &alice(), level(5), level(5), t0()).unwrap();
        store.create_report(a.id, &bob, level(5), level(5), t0()).unwrap();

        assert_eq!(store.mass_flag_reports(&alice()).unwrap(), 2);
        assert_eq!(store.mass_flag_reports(&alice()).unwrap(), 0);
        let bobs = store.reports_by_reporter(&bob).unwrap();
        assert!(!bobs[0].flagged);
    }

    #[test]
    fn test_strike_counter_lifecycle() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get_or_create_strike_counter(&alice()).unwrap(), 0);
        assert_eq!(store.increment_strike_counter(&alice()).unwrap(), 1);
        assert_eq!(store.increment_strike_counter(&alice()).unwrap(), 2);
        store.reset_strike_counter(&alice()).unwrap();
        assert_eq!(store.get_or_create_strike_counter(&alice()).unwrap(), 0);
    }

    #[test]
    fn test_atomically_rolls_back() {
        let mut store = MemoryStore::new();
        let venue = store.insert_venue("Trinity").unwrap();
        let before = store.state().clone();

        let result: Result<()> = store.atomically(|s| {
            s.create_report(venue.id, &alice(), level(5), level(5), t0())?;
            s.increment_strike_counter(&alice())?;
            Err(Error::Storage("injected".into()))
        });

        assert!(result.is_err());
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_sweep_keeps_boundary() {
        let mut store = MemoryStore::new();
        let venue = store.insert_venue("Trinity").unwrap();
        let cutoff = t0() - Duration::hours(24);
        store
            .create_report(venue.id, &alice(), level(5), level(5), cutoff - Duration::seconds(1))
            .unwrap();
        store
            .create_report(venue.id, &alice(), level(5), level(5), cutoff)
            .unwrap();
        assert_eq!(store.sweep_reports_before(cutoff).unwrap(), 1);
        assert_eq!(store.state().report_count(), 1);
    }

    #[test]
    fn test_state_json_roundtrip() {
        let mut store = MemoryStore::new();
        let venue = store.insert_venue("Trinity").unwrap();
        store.create_report(venue.id, &alice(), level(8), level(2), t0()).unwrap();
        store.increment_strike_counter(&alice()).unwrap();

        let json = serde_json::to_string(store.state()).unwrap();
        let back: StoreState = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, store.state());
    }
}
