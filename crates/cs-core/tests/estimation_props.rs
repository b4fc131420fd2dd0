//! Property-based tests for estimation and outlier classification.

use chrono::{DateTime, Duration, TimeZone, Utc};
use cs_common::{DisplayedValues, Level, Report, ReportId, ReporterId, VenueId};
use cs_config::{EstimatorModel, EstimatorPolicy, FraudPolicy};
use cs_core::estimator::Estimator;
use cs_core::fraud::FraudDetector;
use proptest::prelude::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 6, 22, 0, 0).unwrap()
}

fn estimator(model: EstimatorModel) -> Estimator {
    Estimator::from_policy(&EstimatorPolicy {
        model,
        ..EstimatorPolicy::default()
    })
}

fn model_strategy() -> impl Strategy<Value = EstimatorModel> {
    prop_oneof![Just(EstimatorModel::DecayedV2), Just(EstimatorModel::FlatV1)]
}

/// (occupancy, line, seconds ago)
fn reports_strategy(max_age_secs: i64) -> impl Strategy<Value = Vec<(u8, u8, i64)>> {
    prop::collection::vec((1u8..=10, 1u8..=10, 0..max_age_secs), 0..40)
}

fn build(raw: &[(u8, u8, i64)]) -> Vec<Report> {
    raw.iter()
        .enumerate()
        .map(|(i, &(occ, line, secs))| Report {
            id: ReportId(i as u64 + 1),
            venue_id: VenueId(1),
            reporter: ReporterId::parse(&format!("p{i}")).unwrap(),
            occupancy: Level::new("occupancy", i64::from(occ)).unwrap(),
            line_wait: Level::new("line_wait", i64::from(line)).unwrap(),
            created_at: now() - Duration::seconds(secs),
            flagged: false,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The displayed value never leaves the range of the inputs it averages.
    #[test]
    fn displayed_within_input_range(model in model_strategy(), raw in reports_strategy(3 * 3600)) {
        let est = estimator(model);
        let reports = build(&raw);
        let estimate = est.estimate(&reports, now());

        let window: Vec<&Report> = reports
            .iter()
            .filter(|r| r.created_at >= est.since(now()))
            .collect();
        prop_assert_eq!(estimate.reports_considered, window.len());

        match estimate.displayed.occupancy {
            None => prop_assert!(window.is_empty()),
            Some(shown) => {
                let lo = window.iter().map(|r| r.occupancy.get()).min().unwrap();
                let hi = window.iter().map(|r| r.occupancy.get()).max().unwrap();
                prop_assert!(lo <= shown && shown <= hi, "{} outside {}..={}", shown, lo, hi);
            }
        }
        match estimate.displayed.line {
            None => prop_assert!(window.is_empty()),
            Some(shown) => {
                let lo = window.iter().map(|r| r.line_wait.get()).min().unwrap();
                let hi = window.iter().map(|r| r.line_wait.get()).max().unwrap();
                prop_assert!(lo <= shown && shown <= hi);
            }
        }
    }

    /// Unanimous reporters are displayed verbatim.
    #[test]
    fn unanimous_window_shows_that_level(
        model in model_strategy(),
        occ in 1u8..=10,
        line in 1u8..=10,
        ages in prop::collection::vec(0i64..600, 1..20),
    ) {
        let raw: Vec<_> = ages.into_iter().map(|secs| (occ, line, secs)).collect();
        let estimate = estimator(model).estimate(&build(&raw), now());
        prop_assert_eq!(estimate.displayed, DisplayedValues::new(Some(occ), Some(line)));
    }

    /// Input order does not matter for the flat mean.
    #[test]
    fn flat_mean_ignores_order(raw in reports_strategy(900)) {
        let est = estimator(EstimatorModel::FlatV1);
        let forward = build(&raw);
        let mut backward = forward.clone();
        backward.reverse();
        prop_assert_eq!(
            est.estimate(&forward, now()).displayed,
            est.estimate(&backward, now()).displayed
        );
    }

    /// Reports dated after `now` never contribute.
    #[test]
    fn future_reports_are_ignored(model in model_strategy(), raw in reports_strategy(3600)) {
        let est = estimator(model);
        let future: Vec<Report> = build(&raw)
            .into_iter()
            .map(|mut r| {
                r.created_at = now() + (now() - r.created_at) + Duration::seconds(1);
                r
            })
            .collect();
        let estimate = est.estimate(&future, now());
        prop_assert!(estimate.displayed.is_empty());
        prop_assert_eq!(estimate.reports_considered, 0);
    }

    /// A missing baseline dimension never flags; a present one flags exactly
    /// when the deviation exceeds its threshold.
    #[test]
    fn classification_matches_thresholds(
        occ in 1u8..=10,
        line in 1u8..=10,
        base_occ in prop::option::of(1u8..=10),
        base_line in prop::option::of(1u8..=10),
        occ_threshold in 0u8..=9,
        line_threshold in 0u8..=9,
    ) {
        let detector = FraudDetector::from_policy(&FraudPolicy {
            occupancy_threshold: occ_threshold,
            line_threshold,
            ..FraudPolicy::default()
        });
        let verdict = detector.classify(
            Level::new("occupancy", i64::from(occ)).unwrap(),
            Level::new("line_wait", i64::from(line)).unwrap(),
            DisplayedValues::new(base_occ, base_line),
        );

        let occ_out = base_occ.is_some_and(|b| occ.abs_diff(b) > occ_threshold);
        let line_out = base_line.is_some_and(|b| line.abs_diff(b) > line_threshold);
        prop_assert_eq!(verdict.flagged, occ_out || line_out);
        prop_assert_eq!(verdict.occupancy_deviation, base_occ.map(|b| occ.abs_diff(b)));
        prop_assert_eq!(verdict.line_deviation, base_line.map(|b| line.abs_diff(b)));
    }
}
