//! Risk Score Computation

use crate::statistics::SeriesStatistics;
use care_model::{
    Alert, AlertStore, Individual, MetricKind, PersistenceError, Reading, ReadingStore,
    RiskFactor, RiskLevel, RiskScore, RiskStore, Severity,
};
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use thresholds::ThresholdEvaluator;
use tracing::{debug, info};

#[derive(Debug, Clone, Error)]
pub enum RiskError {
    #[error("Insufficient data: {available} readings in window, {required} required")]
    InsufficientData { available: usize, required: usize },
    #[error("Invalid window: {0}")]
    InvalidWindow(String),
    #[error("Invalid risk config: {0}")]
    InvalidConfig(String),
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Longest accepted lookback, in days
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Scoring weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Default trailing window (default: 7 days)
    pub window_days: u32,
    /// Readings required in the window before a score is produced
    pub min_readings: usize,
    /// Points for a critical alert at zero age
    pub critical_points: f64,
    /// Points for a warning alert at zero age
    pub warning_points: f64,
    /// Points per vital sign at maximum volatility
    pub volatility_weight: f64,
    /// Points per critical fall reading
    pub fall_penalty: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            min_readings: 3,
            critical_points: 10.0,
            warning_points: 3.0,
            volatility_weight: 10.0,
            fall_penalty: 15.0,
        }
    }
}

impl RiskConfig {
    /// Heavier weights, for individuals under closer watch
    pub fn strict() -> Self {
        Self {
            critical_points: 15.0,
            warning_points: 5.0,
            volatility_weight: 15.0,
            fall_penalty: 25.0,
            ..Default::default()
        }
    }

    /// Lighter weights and a longer window
    pub fn lenient() -> Self {
        Self {
            window_days: 14,
            critical_points: 8.0,
            warning_points: 2.0,
            volatility_weight: 5.0,
            fall_penalty: 10.0,
            ..Default::default()
        }
    }

    pub fn default_window(&self) -> Duration {
        Duration::days(i64::from(self.window_days))
    }

    /// Reject windows outside `1..=MAX_WINDOW_DAYS` and weights that are
    /// negative or not finite
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.window_days == 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(RiskError::InvalidConfig(format!(
                "window_days must be between 1 and {}, got {}",
                MAX_WINDOW_DAYS, self.window_days
            )));
        }
        let weights = [
            ("critical_points", self.critical_points),
            ("warning_points", self.warning_points),
            ("volatility_weight", self.volatility_weight),
            ("fall_penalty", self.fall_penalty),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RiskError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

/// Stateless scorer; every input comes in through the call
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: RiskConfig,
}

impl RiskScorer {
    pub fn new(config: RiskConfig) -> Self {
        info!("Creating risk scorer with config: {:?}", config);
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Score an individual over `[now - window, now]` and append the score
    /// to their history
    pub fn compute<S>(
        &self,
        store: &S,
        evaluator: &ThresholdEvaluator,
        individual: &Individual,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<RiskScore, RiskError>
    where
        S: ReadingStore + AlertStore + RiskStore + ?Sized,
    {
        if window <= Duration::zero() {
            return Err(RiskError::InvalidWindow(format!(
                "window must be positive, got {}",
                window
            )));
        }
        let window_start = now.checked_sub_signed(window).ok_or_else(|| {
            RiskError::InvalidWindow(format!("window of {} reaches before the calendar", window))
        })?;

        let mut readings: BTreeMap<MetricKind, Vec<Reading>> = BTreeMap::new();
        for metric in MetricKind::ALL {
            let series: Vec<Reading> = store
                .load_recent_readings(&individual.id, metric, window_start)?
                .into_iter()
                .filter(|r| r.timestamp <= now)
                .collect();
            if !series.is_empty() {
                readings.insert(metric, series);
            }
        }

        let available: usize = readings.values().map(Vec::len).sum();
        if available < self.config.min_readings {
            counter!("carewatch_risk_insufficient_data_total").increment(1);
            debug!(
                "Insufficient data for {}: {} of {} readings",
                individual.id, available, self.config.min_readings
            );
            return Err(RiskError::InsufficientData {
                available,
                required: self.config.min_readings,
            });
        }

        let alerts: Vec<Alert> = store
            .load_alerts_since(&individual.id, window_start)?
            .into_iter()
            .filter(|a| a.last_breach_at <= now)
            .collect();

        let score = self.assess(evaluator, individual, &readings, &alerts, window, now);
        store.save_risk_score(&score)?;

        counter!("carewatch_risk_computations_total", "level" => score.level.as_str())
            .increment(1);
        info!(
            "Risk score for {}: {:.1} ({})",
            individual.id,
            score.score,
            score.level.as_str()
        );
        Ok(score)
    }

    /// Pure scoring over already-loaded window content
    fn assess(
        &self,
        evaluator: &ThresholdEvaluator,
        individual: &Individual,
        readings: &BTreeMap<MetricKind, Vec<Reading>>,
        alerts: &[Alert],
        window: Duration,
        now: DateTime<Utc>,
    ) -> RiskScore {
        let mut factors: BTreeMap<MetricKind, RiskFactor> = BTreeMap::new();

        for alert in alerts {
            let points = match alert.severity {
                Severity::Critical => self.config.critical_points,
                Severity::Warning => self.config.warning_points,
                Severity::Normal => 0.0,
            };
            let factor = factors
                .entry(alert.metric)
                .or_insert_with(|| RiskFactor::new(alert.metric));
            factor.alert_points += points * decay(alert.last_breach_at, window, now);
            factor.alert_count += 1;
        }

        for (metric, series) in readings {
            let bands = evaluator.bands_for(*metric, Some(individual));

            if metric.is_vital_sign() {
                let values: Vec<f64> = series.iter().map(|r| r.value).collect();
                let stats = SeriesStatistics::compute(&values);
                let volatility = bands
                    .normal_width()
                    .map(|width| stats.normalized_volatility(width))
                    .unwrap_or(0.0);
                if volatility > 0.0 {
                    debug!(
                        "{} {} volatility {:.3} (mean {:.1}, std {:.2})",
                        individual.id, metric, volatility, stats.mean, stats.std_dev
                    );
                    factors
                        .entry(*metric)
                        .or_insert_with(|| RiskFactor::new(*metric))
                        .volatility_points += volatility * self.config.volatility_weight;
                }
            } else if *metric == MetricKind::FallImpact {
                let falls = series
                    .iter()
                    .filter(|r| evaluator.evaluate(r, Some(individual)) == Severity::Critical)
                    .count();
                if falls > 0 {
                    factors
                        .entry(*metric)
                        .or_insert_with(|| RiskFactor::new(*metric))
                        .fall_points += falls as f64 * self.config.fall_penalty;
                }
            }
        }

        let total: f64 = factors.values().map(RiskFactor::weight).sum();
        let score = total.clamp(0.0, 100.0);

        RiskScore {
            individual_id: individual.id.clone(),
            score,
            level: RiskLevel::from_score(score),
            factors: factors.into_values().collect(),
            reading_count: readings.values().map(Vec::len).sum(),
            window_start: now - window,
            computed_at: now,
        }
    }
}

/// Linear decay from 1.0 at `now` to 0.0 at the window edge
fn decay(at: DateTime<Utc>, window: Duration, now: DateTime<Utc>) -> f64 {
    let window_ms = window.num_milliseconds() as f64;
    if window_ms <= 0.0 {
        return 0.0;
    }
    let age_ms = (now - at).num_milliseconds().max(0) as f64;
    (1.0 - age_ms / window_ms).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_model::{
        AlertId, AlertStatus, Band, MetricBands, ReadingId, Transition, TransitionCause,
    };
    use chrono::TimeZone;
    use proptest::prelude::*;
    use storage::Repository;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn person() -> Individual {
        Individual::new("D1000", "Rosa Alvarez")
    }

    fn add_reading(repo: &Repository, metric: MetricKind, value: f64, hours_ago: i64) {
        repo.save_reading(&Reading::new(
            "D1000",
            metric,
            value,
            now() - Duration::hours(hours_ago),
        ))
        .unwrap();
    }

    fn add_alert(repo: &Repository, metric: MetricKind, severity: Severity, hours_ago: i64) {
        let at = now() - Duration::hours(hours_ago);
        let alert = Alert {
            id: AlertId::new(),
            individual_id: "D1000".into(),
            metric,
            trigger: ReadingId::new(),
            severity,
            status: AlertStatus::Open,
            created_at: at,
            last_breach_at: at,
            acknowledged_at: None,
            resolved_at: None,
        };
        let transition = Transition {
            from: None,
            to: AlertStatus::Open,
            severity,
            cause: TransitionCause::Opened,
            reading_id: None,
            at,
        };
        repo.commit_transition(&alert, transition).unwrap();
    }

    fn steady_vitals(repo: &Repository) {
        for hours_ago in 1..=3 {
            add_reading(repo, MetricKind::HeartRate, 72.0, hours_ago);
        }
    }

    fn score(repo: &Repository) -> Result<RiskScore, RiskError> {
        RiskScorer::default().compute(
            repo,
            &ThresholdEvaluator::default(),
            &person(),
            Duration::days(7),
            now(),
        )
    }

    #[test]
    fn test_insufficient_data() {
        let repo = Repository::new();
        add_reading(&repo, MetricKind::HeartRate, 72.0, 1);
        add_reading(&repo, MetricKind::HeartRate, 72.0, 24 * 30);

        match score(&repo) {
            Err(RiskError::InsufficientData {
                available,
                required,
            }) => {
                assert_eq!(available, 1);
                assert_eq!(required, 3);
            }
            other => panic!("expected insufficient data, got {other:?}"),
        }
        assert!(repo.load_risk_history(&"D1000".into()).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_window_is_rejected() {
        let repo = Repository::new();
        steady_vitals(&repo);
        let scorer = RiskScorer::default();
        let evaluator = ThresholdEvaluator::default();

        let huge = RiskConfig {
            window_days: 200_000_000,
            ..Default::default()
        };
        for window in [huge.default_window(), Duration::zero(), Duration::days(-1)] {
            assert!(matches!(
                scorer.compute(&repo, &evaluator, &person(), window, now()),
                Err(RiskError::InvalidWindow(_))
            ));
        }
        assert!(repo.load_risk_history(&"D1000".into()).unwrap().is_empty());
    }

    #[test]
    fn test_config_validation() {
        assert!(RiskConfig::default().validate().is_ok());
        assert!(RiskConfig::strict().validate().is_ok());
        assert!(RiskConfig::lenient().validate().is_ok());

        let too_long = RiskConfig {
            window_days: MAX_WINDOW_DAYS + 1,
            ..Default::default()
        };
        assert!(matches!(too_long.validate(), Err(RiskError::InvalidConfig(_))));
        let no_window = RiskConfig {
            window_days: 0,
            ..Default::default()
        };
        assert!(no_window.validate().is_err());
        let negative = RiskConfig {
            fall_penalty: -1.0,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
        let nan = RiskConfig {
            volatility_weight: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_quiet_week_scores_zero() {
        let repo = Repository::new();
        steady_vitals(&repo);

        let result = score(&repo).unwrap();
        assert_eq!(result.score, 0.0);
        assert_eq!(result.level, RiskLevel::Low);
        assert!(result.factors.is_empty());
        assert_eq!(result.reading_count, 3);
    }

    #[test]
    fn test_fresh_critical_alert_counts_full_points() {
        let repo = Repository::new();
        steady_vitals(&repo);
        add_alert(&repo, MetricKind::OxygenSaturation, Severity::Critical, 0);

        let result = score(&repo).unwrap();
        assert!((result.score - 10.0).abs() < 1e-9);
        assert_eq!(result.factors.len(), 1);
        assert_eq!(result.factors[0].metric, MetricKind::OxygenSaturation);
        assert_eq!(result.factors[0].alert_count, 1);
    }

    #[test]
    fn test_alert_points_decay_with_age() {
        let repo = Repository::new();
        steady_vitals(&repo);
        // Halfway through a seven day window
        add_alert(&repo, MetricKind::Glucose, Severity::Warning, 84);

        let result = score(&repo).unwrap();
        assert!((result.score - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_alerts_outside_window_ignored() {
        let repo = Repository::new();
        steady_vitals(&repo);
        add_alert(&repo, MetricKind::HeartRate, Severity::Critical, 24 * 8);

        assert_eq!(score(&repo).unwrap().score, 0.0);
    }

    #[test]
    fn test_volatility_uses_normal_band_width() {
        let repo = Repository::new();
        // std dev 10 over a 40 bpm band
        add_reading(&repo, MetricKind::HeartRate, 70.0, 3);
        add_reading(&repo, MetricKind::HeartRate, 90.0, 2);
        add_reading(&repo, MetricKind::HeartRate, 70.0, 1);
        add_reading(&repo, MetricKind::HeartRate, 90.0, 0);

        let result = score(&repo).unwrap();
        assert!((result.score - 2.5).abs() < 1e-9);
        assert!(result.factors[0].volatility_points > 0.0);
    }

    #[test]
    fn test_override_band_changes_volatility() {
        let repo = Repository::new();
        add_reading(&repo, MetricKind::HeartRate, 70.0, 3);
        add_reading(&repo, MetricKind::HeartRate, 90.0, 2);
        add_reading(&repo, MetricKind::HeartRate, 70.0, 1);
        add_reading(&repo, MetricKind::HeartRate, 90.0, 0);

        let narrow = person().with_threshold(
            MetricKind::HeartRate,
            MetricBands::range(Band::new(70.0, 90.0), Band::new(60.0, 100.0)),
        );
        let result = RiskScorer::default()
            .compute(
                &repo,
                &ThresholdEvaluator::default(),
                &narrow,
                Duration::days(7),
                now(),
            )
            .unwrap();
        assert!((result.score - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_fall_penalty() {
        let repo = Repository::new();
        steady_vitals(&repo);
        add_reading(&repo, MetricKind::FallImpact, 3.4, 5);
        add_reading(&repo, MetricKind::FallImpact, 1.1, 4);

        let result = score(&repo).unwrap();
        assert!((result.score - 15.0).abs() < 1e-9);
        let fall = result
            .factors
            .iter()
            .find(|f| f.metric == MetricKind::FallImpact)
            .unwrap();
        assert_eq!(fall.fall_points, 15.0);
    }

    #[test]
    fn test_score_clamped_and_saved() {
        let repo = Repository::new();
        steady_vitals(&repo);
        for _ in 0..8 {
            add_reading(&repo, MetricKind::FallImpact, 4.0, 2);
        }
        for metric in MetricKind::ALL {
            add_alert(&repo, metric, Severity::Critical, 0);
        }

        let result = score(&repo).unwrap();
        assert_eq!(result.score, 100.0);
        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(repo.load_risk_history(&"D1000".into()).unwrap(), vec![result]);
    }

    #[test]
    fn test_decay_bounds() {
        let window = Duration::days(7);
        assert_eq!(decay(now(), window, now()), 1.0);
        assert_eq!(decay(now() + Duration::hours(1), window, now()), 1.0);
        assert_eq!(decay(now() - Duration::days(7), window, now()), 0.0);
        assert_eq!(decay(now(), Duration::zero(), now()), 0.0);
    }

    proptest! {
        #[test]
        fn prop_score_bounded(
            values in prop::collection::vec(0.0f64..300.0, 3..40),
            criticals in 0usize..20,
            warnings in 0usize..20,
        ) {
            let repo = Repository::new();
            for (i, value) in values.iter().enumerate() {
                add_reading(&repo, MetricKind::ALL[i % MetricKind::ALL.len()], *value, i as i64);
            }
            for i in 0..criticals {
                add_alert(&repo, MetricKind::HeartRate, Severity::Critical, i as i64);
            }
            for i in 0..warnings {
                add_alert(&repo, MetricKind::Glucose, Severity::Warning, i as i64);
            }

            let result = score(&repo).unwrap();
            prop_assert!((0.0..=100.0).contains(&result.score));
            prop_assert_eq!(result.level, RiskLevel::from_score(result.score));
        }

        #[test]
        fn prop_more_criticals_never_lower_score(base in 0usize..12, extra in 1usize..5) {
            let fewer = Repository::new();
            let more = Repository::new();
            for repo in [&fewer, &more] {
                steady_vitals(repo);
            }
            for i in 0..base {
                add_alert(&fewer, MetricKind::HeartRate, Severity::Critical, i as i64);
                add_alert(&more, MetricKind::HeartRate, Severity::Critical, i as i64);
            }
            for i in 0..extra {
                add_alert(&more, MetricKind::OxygenSaturation, Severity::Critical, i as i64);
            }

            prop_assert!(score(&more).unwrap().score >= score(&fewer).unwrap().score);
        }
    }
}
