//! Fuzz target for arbitrary submission sequences.
//!
//! Displayed values always stay on the 1-10 scale, errors never leave
//! partial writes behind, and cooldown rejections never store a report.

#![no_main]

use arbitrary::Arbitrary;
use chrono::{Duration, TimeZone, Utc};
use cs_common::{ReporterId, VenueId};
use cs_config::Policy;
use cs_core::store::{MemoryStore, ReportStore};
use cs_core::tracker::Tracker;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Submission {
    venue: u8,
    reporter: u8,
    occupancy: i8,
    line: i8,
    minutes_later: u8,
}

fuzz_target!(|subs: Vec<Submission>| {
    let Ok(mut tracker) = Tracker::new(MemoryStore::new(), Policy::default()) else {
        return;
    };
    for name in ["A", "B", "C"] {
        if tracker.register_venue(name).is_err() {
            return;
        }
    }

    let mut now = Utc.with_ymd_and_hms(2026, 1, 1, 20, 0, 0).unwrap();
    for sub in subs.iter().take(64) {
        now += Duration::minutes(i64::from(sub.minutes_later % 30));
        let venue = VenueId(u64::from(sub.venue % 4) + 1);
        let Ok(reporter) = ReporterId::parse(&format!("r{}", sub.reporter % 8)) else {
            return;
        };

        let before = tracker.store().state().clone();
        match tracker.submit_report(
            venue,
            &reporter,
            i64::from(sub.occupancy),
            i64::from(sub.line),
            now,
        ) {
            Ok(outcome) => {
                for v in [outcome.displayed.occupancy, outcome.displayed.line]
                    .into_iter()
                    .flatten()
                {
                    assert!((1..=10).contains(&v));
                }
                if !outcome.accepted {
                    assert_eq!(tracker.store().state(), &before);
                }
            }
            Err(_) => assert_eq!(tracker.store().state(), &before),
        }
    }
});
