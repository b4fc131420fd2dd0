//! Per (reporter, venue) submission cooldown.

use chrono::{DateTime, Duration, Utc};
use cs_common::{Report, ReporterId, Result, VenueId};
use cs_config::CooldownPolicy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::ReportStore;

/// Outcome of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum CooldownDecision {
    Accept,
    Reject {
        last_report_at: DateTime<Utc>,
        retry_after: DateTime<Utc>,
    },
}

impl CooldownDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, CooldownDecision::Accept)
    }
}

/// Rejects a submission when the same reporter already reported the same
/// venue within the window. The boundary is inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct CooldownGuard {
    window: Duration,
}

impl CooldownGuard {
    pub fn from_policy(policy: &CooldownPolicy) -> Self {
        Self {
            window: Duration::minutes(i64::from(policy.minutes)),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decide from an already loaded set of the venue's reports.
    pub fn evaluate(
        &self,
        reports: &[Report],
        reporter: &ReporterId,
        now: DateTime<Utc>,
    ) -> CooldownDecision {
        if self.window <= Duration::zero() {
            return CooldownDecision::Accept;
        }
        let cutoff = now - self.window;
        let last = reports
            .iter()
            .filter(|r| &r.reporter == reporter && r.created_at >= cutoff)
            .map(|r| r.created_at)
            .max();

        match last {
            Some(last_report_at) => CooldownDecision::Reject {
                last_report_at,
                retry_after: last_report_at + self.window,
            },
            None => CooldownDecision::Accept,
        }
    }

    /// Read-only check against the store. Never writes.
    pub fn check<S: ReportStore>(
        &self,
        store: &S,
        venue_id: VenueId,
        reporter: &ReporterId,
        now: DateTime<Utc>,
    ) -> Result<CooldownDecision> {
        if self.window <= Duration::zero() {
            return Ok(CooldownDecision::Accept);
        }
        let recent = store.load_recent_reports(venue_id, now - self.window)?;
        Ok(self.evaluate(&recent, reporter, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use cs_common::Level;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 6, 23, 0, 0).unwrap()
    }

    fn guard() -> CooldownGuard {
        CooldownGuard::from_policy(&CooldownPolicy::default())
    }

    fn seeded(minutes_ago: i64) -> (MemoryStore, VenueId, ReporterId) {
        let mut store = MemoryStore::new();
        let venue = store.insert_venue("Trinity").unwrap();
        let alice = ReporterId::parse("alice").unwrap();
        let five = Level::new("occupancy", 5).unwrap();
        store
            .create_report(venue.id, &alice, five, five, now() - Duration::minutes(minutes_ago))
            .unwrap();
        (store, venue.id, alice)
    }

    #[test]
    fn test_recent_report_rejects() {
        let (store, venue, alice) = seeded(4);
        match guard().check(&store, venue, &alice, now()).unwrap() {
            CooldownDecision::Reject {
                last_report_at,
                retry_after,
            } => {
                assert_eq!(last_report_at, now() - Duration::minutes(4));
                assert_eq!(retry_after, now() + Duration::minutes(6));
            }
            CooldownDecision::Accept => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let (store, venue, alice) = seeded(10);
        assert!(!guard().check(&store, venue, &alice, now()).unwrap().is_accept());
    }

    #[test]
    fn test_expired_cooldown_accepts() {
        let (store, venue, alice) = seeded(11);
        assert!(guard().check(&store, venue, &alice, now()).unwrap().is_accept());
    }

    #[test]
    fn test_other_reporter_and_venue_unaffected() {
        let (mut store, venue, alice) = seeded(1);
        let bob = ReporterId::parse("bob").unwrap();
        assert!(guard().check(&store, venue, &bob, now()).unwrap().is_accept());

        let other = store.insert_venue("Coupes").unwrap();
        assert!(guard().check(&store, other.id, &alice, now()).unwrap().is_accept());
    }

    #[test]
    fn test_zero_window_disables() {
        let (store, venue, alice) = seeded(0);
        let off = CooldownGuard::from_policy(&CooldownPolicy { minutes: 0 });
        assert!(off.check(&store, venue, &alice, now()).unwrap().is_accept());
    }
}
