//! Single-file JSON report store.
//!
//! The whole [`StoreState`] lives in one JSON document. Every committed change
//! rewrites it through a sibling temp file followed by a rename, so readers
//! never observe a half-written store. Inside [`ReportStore::atomically`] the
//! writes are buffered in memory and flushed once at commit.

use chrono::{DateTime, Utc};
use cs_common::{
    DisplayedValues, Error, Level, Report, ReportId, ReporterId, Result, Venue, VenueId,
    SCHEMA_VERSION,
};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::memory::StoreState;
use super::ReportStore;

/// Report store persisted as a JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: StoreState,
    in_transaction: bool,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; nothing is
    /// written until the first change.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            Self::load_state(&path)?
        } else {
            StoreState::default()
        };
        Ok(Self {
            path,
            state,
            in_transaction: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    fn load_state(path: &Path) -> Result<StoreState> {
        let file = File::open(path)?;
        let state: StoreState = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::StoreCorrupted(format!("{}: {}", path.display(), e)))?;
        if state.schema_version != SCHEMA_VERSION {
            return Err(Error::StoreCorrupted(format!(
                "{}: schema version {} (expected {})",
                path.display(),
                state.schema_version,
                SCHEMA_VERSION
            )));
        }
        Ok(state)
    }

    fn save_state(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        if let Err(err) = self.write_and_replace(&temp_path) {
            // Best effort
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        debug!(
            path = %self.path.display(),
            reports = self.state.report_count(),
            "store flushed"
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn write_and_replace(&self, temp_path: &Path) -> Result<()> {
        let file = File::create(temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.state)?;
        writer.flush()?;
        fs::rename(temp_path, &self.path)?;
        Ok(())
    }

    /// Apply one change. Outside a transaction the change is flushed straight
    /// away and undone in memory if the flush fails.
    fn mutate<T>(&mut self, op: impl FnOnce(&mut StoreState) -> Result<T>) -> Result<T> {
        if self.in_transaction {
            return op(&mut self.state);
        }
        let snapshot = self.state.clone();
        let value = op(&mut self.state)?;
        if let Err(err) = self.save_state() {
            self.state = snapshot;
            return Err(err);
        }
        Ok(value)
    }
}

impl ReportStore for JsonFileStore {
    fn venue(&self, venue_id: VenueId) -> Result<Option<Venue>> {
        Ok(self.state.venue(venue_id))
    }

    fn venues(&self) -> Result<Vec<Venue>> {
        Ok(self.state.venues())
    }

    fn insert_venue(&mut self, name: &str) -> Result<Venue> {
        self.mutate(|state| Ok(state.insert_venue(name)))
    }

    fn set_venue_active(&mut self, venue_id: VenueId, active: bool) -> Result<Venue> {
        self.mutate(|state| state.set_venue_active(venue_id, active))
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
        self.mutate(|state| {
            state.create_report(venue_id, reporter, occupancy, line_wait, created_at)
        })
    }

    fn update_report_flag(&mut self, report_id: ReportId, flagged: bool) -> Result<()> {
        self.mutate(|state| state.update_report_flag(report_id, flagged))
    }

    fn get_or_create_strike_counter(&mut self, reporter: &ReporterId) -> Result<u32> {
        // Reads never hit the disk; a fresh zero counter is materialized on the
        // next real write.
        Ok(self.state.get_or_create_strike_counter(reporter))
    }

    fn increment_strike_counter(&mut self, reporter: &ReporterId) -> Result<u32> {
        self.mutate(|state| Ok(state.increment_strike_counter(reporter)))
    }

    fn reset_strike_counter(&mut self, reporter: &ReporterId) -> Result<()> {
        self.mutate(|state| {
            state.reset_strike_counter(reporter);
            Ok(())
        })
    }

    fn mass_flag_reports(&mut self, reporter: &ReporterId) -> Result<usize> {
        self.mutate(|state| Ok(state.mass_flag_reports(reporter)))
    }

    fn save_venue_displayed_values(
        &mut self,
        venue_id: VenueId,
        displayed: DisplayedValues,
        computed_at: DateTime<Utc>,
    ) -> Result<()> {
        self.mutate(|state| state.save_venue_displayed_values(venue_id, displayed, computed_at))
    }

    fn reports_by_reporter(&self, reporter: &ReporterId) -> Result<Vec<Report>> {
        Ok(self.state.reports_by_reporter(reporter))
    }

    fn sweep_reports_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.mutate(|state| Ok(state.sweep_reports_before(cutoff)))
    }

    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if self.in_transaction {
            return f(self);
        }

        let snapshot = self.state.clone();
        self.in_transaction = true;
        let result = f(self);
        self.in_transaction = false;

        let outcome = result.and_then(|value| self.save_state().map(|()| value));
        if outcome.is_err() {
            self.state = snapshot;
        }
        outcome
    }
}
