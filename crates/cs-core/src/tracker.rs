//! The submission pipeline and read paths over a [`ReportStore`].
//!
//! A submission runs, in order:
//!
//! 1. Cooldown check (reject is terminal, nothing is written)
//! 2. Persist the report, unflagged
//! 3. Recompute the venue estimate
//! 4. Classify the report against the baseline and persist the flag
//! 5. On a flag, add a strike and poison history above the threshold
//! 6. Update the venue's cached displayed values
//!
//! Input is validated before step 1. Steps 2-6 run inside
//! [`ReportStore::atomically`], so a fault at any write leaves the store as
//! if the submission never happened.

use chrono::{DateTime, Duration, Utc};
use cs_common::{
    DisplayedValues, Error, Level, ReportId, ReporterId, ReporterStanding, Result,
    StandingState, Venue, VenueId,
};
use cs_config::{FraudBaseline, Policy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::field::display;

use crate::cooldown::{CooldownDecision, CooldownGuard};
use crate::estimator::{Estimate, Estimator};
use crate::fraud::{FraudDetector, FraudVerdict};
use crate::log_event;
use crate::logging::{event_names, Stage};
use crate::store::ReportStore;
use crate::strikes::{record_strike, StrikeOutcome};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Why a submission was not accepted. Not an error: a defined outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    CooldownActive {
        last_report_at: DateTime<Utc>,
        retry_after: DateTime<Utc>,
    },
}

/// Result of [`Tracker::submit_report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubmissionOutcome {
    pub accepted: bool,
    pub flagged: bool,
    /// After the submission when accepted; the current estimate when rejected.
    pub displayed: DisplayedValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<ReportId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<FraudVerdict>,
    /// Present when the report was flagged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike: Option<StrikeOutcome>,
}

impl SubmissionOutcome {
    pub fn displayed_occupancy(&self) -> Option<u8> {
        self.displayed.occupancy
    }

    pub fn displayed_line(&self) -> Option<u8> {
        self.displayed.line
    }

    fn rejected(rejection: Rejection, displayed: DisplayedValues) -> Self {
        Self {
            accepted: false,
            flagged: false,
            displayed,
            report_id: None,
            rejection: Some(rejection),
            verdict: None,
            strike: None,
        }
    }
}

/// A venue with its freshly computed estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VenueSnapshot {
    pub venue: Venue,
    pub estimate: Estimate,
}

/// Result of a retention sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SweepSummary {
    pub cutoff: DateTime<Utc>,
    pub removed: usize,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Estimation and anti-fraud core bound to one store and one policy.
#[derive(Debug)]
pub struct Tracker<S: ReportStore> {
    store: S,
    policy: Policy,
    estimator: Estimator,
    fraud: FraudDetector,
    cooldown: CooldownGuard,
}

impl<S: ReportStore> Tracker<S> {
    /// Bind a store to a policy. The policy is validated first.
    pub fn new(store: S, policy: Policy) -> Result<Self> {
        crate::config::validate(&policy)?;
        Ok(Self {
            estimator: Estimator::from_policy(&policy.estimator),
            fraud: FraudDetector::from_policy(&policy.fraud),
            cooldown: CooldownGuard::from_policy(&policy.cooldown),
            store,
            policy,
        })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn require_venue(&self, venue_id: VenueId) -> Result<Venue> {
        self.store
            .venue(venue_id)?
            .ok_or(Error::VenueNotFound { venue_id: venue_id.0 })
    }

    /// Estimate a venue at `now` without touching the cache.
    pub fn estimate(&self, venue_id: VenueId, now: DateTime<Utc>) -> Result<Estimate> {
        self.require_venue(venue_id)?;
        let recent = self
            .store
            .load_recent_reports(venue_id, self.estimator.since(now))?;
        Ok(self.estimator.estimate(&recent, now))
    }

    /// Submit one report.
    ///
    /// `Ok` with `accepted == false` is a cooldown rejection; `Err` is an
    /// invalid input or a store fault, in which case nothing was written.
    pub fn submit_report(
        &mut self,
        venue_id: VenueId,
        reporter: &ReporterId,
        occupancy: i64,
        line_wait: i64,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome> {
        let (occupancy, line_wait) = match validate_levels(occupancy, line_wait) {
            Ok(levels) => levels,
            Err(err) => {
                log_event!(
                    INFO,
                    event_names::SUBMIT_INVALID,
                    Stage::Validate,
                    "submission rejected before storage",
                    venue_id = venue_id.0,
                    error = display(&err)
                );
                return Err(err);
            }
        };
        self.require_venue(venue_id)?;

        log_event!(
            DEBUG,
            event_names::SUBMIT_STARTED,
            Stage::Validate,
            "submission started",
            venue_id = venue_id.0,
            reporter = reporter.as_str()
        );

        // Step 1
        if let CooldownDecision::Reject {
            last_report_at,
            retry_after,
        } = self.cooldown.check(&self.store, venue_id, reporter, now)?
        {
            log_event!(
                INFO,
                event_names::SUBMIT_REJECTED_COOLDOWN,
                Stage::Cooldown,
                "submission rejected by cooldown",
                venue_id = venue_id.0,
                reporter = reporter.as_str(),
                retry_after = display(retry_after)
            );
            let current = self.estimate(venue_id, now)?.displayed;
            return Ok(SubmissionOutcome::rejected(
                Rejection::CooldownActive {
                    last_report_at,
                    retry_after,
                },
                current,
            ));
        }

        let pre_submission = match self.fraud.baseline() {
            FraudBaseline::ExcludingNew => Some(self.estimate(venue_id, now)?.displayed),
            FraudBaseline::IncludingNew => None,
        };

        let estimator = &self.estimator;
        let fraud = &self.fraud;
        let strike_threshold = self.policy.strikes.threshold;

        let committed = self.store.atomically(|store| {
            // Step 2
            let report = store.create_report(venue_id, reporter, occupancy, line_wait, now)?;

            // Step 3
            let recent = store.load_recent_reports(venue_id, estimator.since(now))?;
            let mut estimate = estimator.estimate(&recent, now);

            // Step 4
            let baseline = pre_submission.unwrap_or(estimate.displayed);
            let verdict = fraud.apply(store, &report, baseline)?;

            // Step 5
            let strike = if verdict.flagged {
                Some(record_strike(store, reporter, strike_threshold)?)
            } else {
                None
            };

            if verdict.flagged && estimator.excludes_flagged() {
                let recent = store.load_recent_reports(venue_id, estimator.since(now))?;
                estimate = estimator.estimate(&recent, now);
            }

            // Step 6
            store.save_venue_displayed_values(venue_id, estimate.displayed, now)?;

            Ok((report.id, verdict, strike, estimate))
        });

        let (report_id, verdict, strike, estimate) = match committed {
            Ok(values) => values,
            Err(err) => {
                log_event!(
                    WARN,
                    event_names::SUBMIT_ABORTED,
                    Stage::Persist,
                    "submission rolled back",
                    venue_id = venue_id.0,
                    error = display(&err)
                );
                return Err(err);
            }
        };

        log_submission(venue_id, reporter, report_id, &verdict, strike.as_ref(), &estimate);

        Ok(SubmissionOutcome {
            accepted: true,
            flagged: verdict.flagged,
            displayed: estimate.displayed,
            report_id: Some(report_id),
            rejection: None,
            verdict: Some(verdict),
            strike,
        })
    }

    /// Recompute a venue's estimate at `now` and write it to the venue cache.
    pub fn refresh_estimate(&mut self, venue_id: VenueId, now: DateTime<Utc>) -> Result<Estimate> {
        let estimate = self.estimate(venue_id, now)?;
        self.store
            .save_venue_displayed_values(venue_id, estimate.displayed, now)?;
        Ok(estimate)
    }

    /// Current displayed values for a venue. Refreshes the venue's cache.
    pub fn get_displayed_values(
        &mut self,
        venue_id: VenueId,
        now: DateTime<Utc>,
    ) -> Result<DisplayedValues> {
        Ok(self.refresh_estimate(venue_id, now)?.displayed)
    }

    /// Recompute and return every venue (active only unless asked).
    pub fn list_venues(
        &mut self,
        now: DateTime<Utc>,
        include_inactive: bool,
    ) -> Result<Vec<VenueSnapshot>> {
        let estimator = &self.estimator;
        self.store.atomically(|store| {
            let mut snapshots = Vec::new();
            for venue in store.venues()? {
                if !venue.active && !include_inactive {
                    continue;
                }
                let recent = store.load_recent_reports(venue.id, estimator.since(now))?;
                let estimate = estimator.estimate(&recent, now);
                store.save_venue_displayed_values(venue.id, estimate.displayed, now)?;
                let venue = Venue {
                    displayed: estimate.displayed,
                    displayed_at: Some(now),
                    ..venue
                };
                snapshots.push(VenueSnapshot { venue, estimate });
            }
            Ok(snapshots)
        })
    }

    pub fn register_venue(&mut self, name: &str) -> Result<Venue> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidVenueName("name is empty".to_string()));
        }
        let venue = self.store.insert_venue(name)?;
        log_event!(
            INFO,
            event_names::VENUE_REGISTERED,
            Stage::Admin,
            "venue registered",
            venue_id = venue.id.0,
            name = venue.name.as_str()
        );
        Ok(venue)
    }

    /// Inactive venues are hidden from listings but still accept reports.
    pub fn set_venue_active(&mut self, venue_id: VenueId, active: bool) -> Result<Venue> {
        let venue = self.store.set_venue_active(venue_id, active)?;
        log_event!(
            INFO,
            event_names::VENUE_ACTIVE_CHANGED,
            Stage::Admin,
            "venue active flag changed",
            venue_id = venue_id.0,
            active = active
        );
        Ok(venue)
    }

    pub fn reporter_standing(&mut self, reporter: &ReporterId) -> Result<ReporterStanding> {
        let strikes = self.store.get_or_create_strike_counter(reporter)?;
        Ok(ReporterStanding::new(
            reporter.clone(),
            strikes,
            self.policy.strikes.threshold,
        ))
    }

    /// Administrative reset. Reports already flagged stay flagged.
    pub fn reset_strikes(&mut self, reporter: &ReporterId) -> Result<ReporterStanding> {
        self.store.reset_strike_counter(reporter)?;
        log_event!(
            INFO,
            event_names::STRIKES_RESET,
            Stage::Admin,
            "strike counter reset",
            reporter = reporter.as_str()
        );
        Ok(ReporterStanding::new(
            reporter.clone(),
            0,
            self.policy.strikes.threshold,
        ))
    }

    /// Delete reports older than `older_than` (default: the policy's retention).
    pub fn sweep_reports(
        &mut self,
        now: DateTime<Utc>,
        older_than: Option<Duration>,
    ) -> Result<SweepSummary> {
        let horizon = older_than.unwrap_or_else(|| {
            Duration::hours(i64::from(self.policy.retention.max_age_hours))
        });
        let cutoff = now - horizon;
        let removed = self.store.sweep_reports_before(cutoff)?;
        log_event!(
            INFO,
            event_names::SWEEP_FINISHED,
            Stage::Sweep,
            "retention sweep finished",
            removed = removed as u64,
            cutoff = display(cutoff)
        );
        Ok(SweepSummary { cutoff, removed })
    }
}

fn validate_levels(occupancy: i64, line_wait: i64) -> Result<(Level, Level)> {
    Ok((
        Level::new("occupancy", occupancy)?,
        Level::new("line_wait", line_wait)?,
    ))
}

fn log_submission(
    venue_id: VenueId,
    reporter: &ReporterId,
    report_id: ReportId,
    verdict: &FraudVerdict,
    strike: Option<&StrikeOutcome>,
    estimate: &Estimate,
) {
    log_event!(
        INFO,
        event_names::REPORT_PERSISTED,
        Stage::Persist,
        "report stored",
        venue_id = venue_id.0,
        report_id = report_id.0,
        reporter = reporter.as_str()
    );

    if verdict.flagged {
        log_event!(
            WARN,
            event_names::REPORT_FLAGGED,
            Stage::Fraud,
            "report flagged as outlier",
            report_id = report_id.0,
            occupancy_deviation = verdict.occupancy_deviation.map(u64::from),
            line_deviation = verdict.line_deviation.map(u64::from)
        );
    }

    if let Some(strike) = strike {
        log_event!(
            INFO,
            event_names::STRIKES_INCREMENTED,
            Stage::Strikes,
            "strike recorded",
            reporter = reporter.as_str(),
            strikes = strike.strikes
        );
        if strike.state == StandingState::HistoryPoisoned {
            log_event!(
                WARN,
                event_names::REPORTER_HISTORY_POISONED,
                Stage::Strikes,
                "reporter history flagged",
                reporter = reporter.as_str(),
                escalated = strike.escalated,
                reports_mass_flagged = strike.reports_mass_flagged as u64
            );
        }
    }

    log_event!(
        DEBUG,
        event_names::VENUE_CACHE_UPDATED,
        Stage::Cache,
        "venue cache updated",
        venue_id = venue_id.0,
        occupancy = estimate.displayed.occupancy.map(u64::from),
        line = estimate.displayed.line.map(u64::from),
        reports_considered = estimate.reports_considered as u64
    );
}

// ---------------------------------------------------------------------------
// Shared tracker
// ---------------------------------------------------------------------------

/// Thread-safe handle that serializes every operation, so two submissions
/// can never interleave between steps 2 and 6.
#[derive(Debug)]
pub struct SharedTracker<S: ReportStore> {
    inner: Arc<Mutex<Tracker<S>>>,
}

impl<S: ReportStore> Clone for SharedTracker<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ReportStore> SharedTracker<S> {
    pub fn new(tracker: Tracker<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tracker<S>>> {
        self.inner
            .lock()
            .map_err(|e| Error::Storage(format!("tracker lock poisoned: {}", e)))
    }

    /// Run `f` with exclusive access to the tracker.
    pub fn with<T>(&self, f: impl FnOnce(&mut Tracker<S>) -> Result<T>) -> Result<T> {
        let mut guard = self.lock()?;
        f(&mut guard)
    }

    pub fn submit_report(
        &self,
        venue_id: VenueId,
        reporter: &ReporterId,
        occupancy: i64,
        line_wait: i64,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome> {
        self.with(|t| t.submit_report(venue_id, reporter, occupancy, line_wait, now))
    }

    pub fn get_displayed_values(
        &self,
        venue_id: VenueId,
        now: DateTime<Utc>,
    ) -> Result<DisplayedValues> {
        self.with(|t| t.get_displayed_values(venue_id, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_utils::FaultyStore;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 6, 22, 0, 0).unwrap()
    }

    fn reporter(name: &str) -> ReporterId {
        ReporterId::parse(name).unwrap()
    }

    fn tracker() -> (Tracker<MemoryStore>, VenueId) {
        let mut tracker = Tracker::new(MemoryStore::new(), Policy::default()).unwrap();
        let venue = tracker.register_venue("Trinity").unwrap();
        (tracker, venue.id)
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let mut policy = Policy::default();
        policy.estimator.lookback_minutes = Some(0);
        assert!(matches!(
            Tracker::new(MemoryStore::new(), policy),
            Err(Error::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_first_report_sets_display() {
        let (mut tracker, venue) = tracker();
        let outcome = tracker
            .submit_report(venue, &reporter("alice"), 8, 2, t0())
            .unwrap();
        assert!(outcome.accepted);
        assert!(!outcome.flagged);
        assert_eq!(outcome.displayed_occupancy(), Some(8));
        assert_eq!(outcome.displayed_line(), Some(2));

        let cached = tracker.store().venue(venue).unwrap().unwrap();
        assert_eq!(cached.displayed, outcome.displayed);
        assert_eq!(cached.displayed_at, Some(t0()));
    }

    #[test]
    fn test_invalid_level_writes_nothing() {
        let (mut tracker, venue) = tracker();
        let err = tracker
            .submit_report(venue, &reporter("alice"), 11, 5, t0())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLevel {
                field: "occupancy",
                value: 11
            }
        ));
        assert_eq!(tracker.store().state().report_count(), 0);
    }

    #[test]
    fn test_unknown_venue() {
        let (mut tracker, _) = tracker();
        let err = tracker
            .submit_report(VenueId(99), &reporter("alice"), 5, 5, t0())
            .unwrap_err();
        assert!(matches!(err, Error::VenueNotFound { venue_id: 99 }));
    }

    #[test]
    fn test_cooldown_rejection_has_no_side_effects() {
        let (mut tracker, venue) = tracker();
        let alice = reporter("alice");
        tracker.submit_report(venue, &alice, 5, 5, t0()).unwrap();
        let before = tracker.store().state().clone();

        let outcome = tracker
            .submit_report(venue, &alice, 10, 10, t0() + Duration::minutes(3))
            .unwrap();
        assert!(!outcome.accepted);
        assert!(!outcome.flagged);
        assert_eq!(
            outcome.rejection,
            Some(Rejection::CooldownActive {
                last_report_at: t0(),
                retry_after: t0() + Duration::minutes(10),
            })
        );
        assert_eq!(outcome.displayed_occupancy(), Some(5));
        assert_eq!(tracker.store().state(), &before);
    }

    #[test]
    fn test_baseline_excluding_new_vs_including_new() {
        // Baseline 5 from one report; new report of 9 deviates by 4 before it
        // is stored, but only by 2 once averaged in (5+9)/2 = 7.
        let (mut excluding, venue) = tracker();
        excluding
            .submit_report(venue, &reporter("alice"), 5, 5, t0())
            .unwrap();
        let outcome = excluding
            .submit_report(venue, &reporter("bob"), 9, 5, t0())
            .unwrap();
        assert!(outcome.flagged);
        assert_eq!(outcome.verdict.unwrap().occupancy_deviation, Some(4));

        let mut policy = Policy::default();
        policy.fraud.baseline = FraudBaseline::IncludingNew;
        let mut including = Tracker::new(MemoryStore::new(), policy).unwrap();
        let venue = including.register_venue("Trinity").unwrap().id;
        including
            .submit_report(venue, &reporter("alice"), 5, 5, t0())
            .unwrap();
        let outcome = including
            .submit_report(venue, &reporter("bob"), 9, 5, t0())
            .unwrap();
        assert!(!outcome.flagged);
        assert_eq!(outcome.verdict.unwrap().occupancy_deviation, Some(2));
    }

    #[test]
    fn test_exclude_flagged_keeps_outlier_out_of_cache() {
        let mut policy = Policy::default();
        policy.estimator.exclude_flagged = true;
        let mut tracker = Tracker::new(MemoryStore::new(), policy).unwrap();
        let venue = tracker.register_venue("Trinity").unwrap().id;

        tracker.submit_report(venue, &reporter("alice"), 3, 3, t0()).unwrap();
        let outcome = tracker
            .submit_report(venue, &reporter("mallory"), 10, 3, t0())
            .unwrap();
        assert!(outcome.flagged);
        assert_eq!(outcome.displayed_occupancy(), Some(3));
    }

    #[test]
    fn test_fault_at_every_write_rolls_back() {
        // Writes per flagged submission: create, flag, strike, cache.
        for fail_at in 0..4 {
            let mut store = FaultyStore::new();
            let venue = store.insert_venue("Trinity").unwrap();
            store.create_report(
                venue.id,
                &reporter("alice"),
                Level::new("occupancy", 2).unwrap(),
                Level::new("line_wait", 2).unwrap(),
                t0(),
            )
            .unwrap();
            let before = store.state().clone();
            store.fail_on_write(fail_at);

            let mut tracker = Tracker::new(store, Policy::default()).unwrap();
            let err = tracker
                .submit_report(venue.id, &reporter("mallory"), 10, 10, t0())
                .unwrap_err();
            assert!(matches!(err, Error::Storage(_)), "fail_at={fail_at}");
            assert_eq!(tracker.store().state(), &before, "fail_at={fail_at}");
        }
    }

    #[test]
    fn test_sweep_uses_policy_retention() {
        let (mut tracker, venue) = tracker();
        tracker
            .submit_report(venue, &reporter("alice"), 5, 5, t0() - Duration::hours(30))
            .unwrap();
        tracker.submit_report(venue, &reporter("alice"), 5, 5, t0()).unwrap();

        let summary = tracker.sweep_reports(t0(), None).unwrap();
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.cutoff, t0() - Duration::hours(24));
        assert_eq!(tracker.store().state().report_count(), 1);
    }

    #[test]
    fn test_shared_tracker_serializes() {
        let (tracker, venue) = tracker();
        let shared = SharedTracker::new(tracker);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    let who = ReporterId::parse(&format!("user-{i}")).unwrap();
                    shared.submit_report(venue, &who, 5, 5, t0()).unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().accepted);
        }
        let count = shared.with(|t| Ok(t.store().state().report_count())).unwrap();
        assert_eq!(count, 8);
    }
}
