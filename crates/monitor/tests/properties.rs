//! Property tests for the alert lifecycle and risk scoring

use care_model::{AlertStatus, Individual, IndividualId, MetricKind, Reading, Severity};
use chrono::{DateTime, Duration, TimeZone, Utc};
use monitor::{Monitor, MonitorConfig};
use proptest::prelude::*;
use std::sync::Arc;
use storage::Repository;

fn t(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 10, 7, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn monitor() -> Monitor<Repository> {
    let monitor = Monitor::new(MonitorConfig::default(), Arc::new(Repository::new()));
    monitor
        .enroll(Individual::new("A", "Rosa Alvarez"))
        .unwrap();
    monitor
}

fn hr(value: f64, minute: i64) -> Reading {
    Reading::new("A", MetricKind::HeartRate, value, t(minute))
}

fn alert_count(monitor: &Monitor<Repository>) -> usize {
    monitor.alerts(&IndividualId::new("A"), false).unwrap().len()
}

proptest! {
    #[test]
    fn normal_readings_never_alert(values in prop::collection::vec(60.0f64..=100.0, 1..30)) {
        let monitor = monitor();
        for (i, value) in values.iter().enumerate() {
            let report = monitor.process_reading(hr(*value, i as i64)).unwrap();
            prop_assert_eq!(report.severity, Severity::Normal);
            prop_assert!(report.outcome.update().is_none());
        }
        prop_assert_eq!(alert_count(&monitor), 0);
    }

    #[test]
    fn critical_on_clean_slot_opens_exactly_one(value in prop_oneof![121.0f64..250.0, 0.0f64..50.0]) {
        let monitor = monitor();
        let report = monitor.process_reading(hr(value, 0)).unwrap();
        prop_assert_eq!(report.severity, Severity::Critical);

        let alerts = monitor.alerts(&IndividualId::new("A"), false).unwrap();
        prop_assert_eq!(alerts.len(), 1);
        prop_assert_eq!(alerts[0].status, AlertStatus::Open);
    }

    #[test]
    fn fewer_than_three_normals_never_resolve(
        normals in 0usize..3,
        values in prop::collection::vec(60.0f64..=100.0, 3),
    ) {
        let monitor = monitor();
        monitor.process_reading(hr(130.0, 0)).unwrap();
        for (i, value) in values.iter().take(normals).enumerate() {
            monitor.process_reading(hr(*value, i as i64 + 1)).unwrap();
        }
        let open = monitor.current_open_alerts(&IndividualId::new("A")).unwrap();
        prop_assert_eq!(open.len(), 1);

        for (i, value) in values.iter().enumerate().skip(normals) {
            monitor.process_reading(hr(*value, i as i64 + 1)).unwrap();
        }
        prop_assert!(monitor.current_open_alerts(&IndividualId::new("A")).unwrap().is_empty());
    }

    #[test]
    fn redelivery_never_duplicates_alerts(
        values in prop::collection::vec(30.0f64..200.0, 1..20),
        repeats in 1usize..4,
    ) {
        let once = monitor();
        let many = monitor();
        for (i, value) in values.iter().enumerate() {
            once.process_reading(hr(*value, i as i64)).unwrap();
            for _ in 0..repeats {
                many.process_reading(hr(*value, i as i64)).unwrap();
            }
        }
        prop_assert_eq!(alert_count(&once), alert_count(&many));
        prop_assert!(
            many.current_open_alerts(&IndividualId::new("A")).unwrap().len() <= 1
        );
    }

    #[test]
    fn history_sequences_are_contiguous(values in prop::collection::vec(30.0f64..200.0, 1..40)) {
        let monitor = monitor();
        for (i, value) in values.iter().enumerate() {
            monitor.process_reading(hr(*value, i as i64)).unwrap();
        }
        for alert in monitor.alerts(&IndividualId::new("A"), false).unwrap() {
            let history = monitor.alert_history(alert.id).unwrap();
            prop_assert_eq!(history[0].transition.from, None);
            for (expected, entry) in history.iter().enumerate() {
                prop_assert_eq!(entry.sequence as usize, expected);
            }
        }
    }

    #[test]
    fn risk_non_decreasing_in_critical_alerts(base in 0usize..4, extra in 1usize..3) {
        let score_with = |criticals: usize| {
            let monitor = monitor();
            for minute in 0..3 {
                monitor.process_reading(hr(72.0, minute)).unwrap();
            }
            // One critical alert per distinct metric slot
            let kinds = [
                (MetricKind::OxygenSaturation, 80.0),
                (MetricKind::Glucose, 300.0),
                (MetricKind::SystolicPressure, 190.0),
                (MetricKind::DiastolicPressure, 120.0),
                (MetricKind::FallImpact, 4.0),
            ];
            for (metric, value) in kinds.iter().take(criticals) {
                monitor
                    .process_reading(Reading::new("A", *metric, *value, t(10)))
                    .unwrap();
            }
            monitor
                .compute_risk_score(&IndividualId::new("A"), None, t(60))
                .unwrap()
                .score
        };

        prop_assert!(score_with(base + extra) >= score_with(base));
    }

    #[test]
    fn risk_score_stays_bounded(values in prop::collection::vec(0.0f64..400.0, 3..60)) {
        let monitor = monitor();
        for (i, value) in values.iter().enumerate() {
            let metric = MetricKind::ALL[i % MetricKind::ALL.len()];
            monitor
                .process_reading(Reading::new("A", metric, *value, t(i as i64)))
                .unwrap();
        }
        let score = monitor
            .compute_risk_score(&IndividualId::new("A"), None, t(120))
            .unwrap();
        prop_assert!((0.0..=100.0).contains(&score.score));
    }
}
