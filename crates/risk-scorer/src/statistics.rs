//! Series Statistics

/// Summary statistics for one metric series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesStatistics {
    /// Number of samples
    pub count: usize,
    /// Mean value
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl SeriesStatistics {
    /// Compute statistics from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        let m2: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        let std_dev = (m2 / n).sqrt();

        Self {
            count: values.len(),
            mean,
            std_dev,
            min,
            max,
        }
    }

    /// Standard deviation relative to `scale`, capped at 1.0
    pub fn normalized_volatility(&self, scale: f64) -> f64 {
        if self.count < 2 || scale <= 0.0 {
            return 0.0;
        }
        (self.std_dev / scale).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_computation() {
        let stats = SeriesStatistics::compute(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((stats.mean - 3.0).abs() < 0.001);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_std_dev_computation() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = SeriesStatistics::compute(&values);
        assert!((stats.std_dev - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_empty_values() {
        let stats = SeriesStatistics::compute(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.normalized_volatility(40.0), 0.0);
    }

    #[test]
    fn test_volatility_capped() {
        let stats = SeriesStatistics::compute(&[40.0, 160.0]);
        assert_eq!(stats.normalized_volatility(40.0), 1.0);

        let steady = SeriesStatistics::compute(&[70.0, 70.0, 70.0]);
        assert_eq!(steady.normalized_volatility(40.0), 0.0);
    }

    #[test]
    fn test_single_sample_has_no_volatility() {
        let stats = SeriesStatistics::compute(&[95.0]);
        assert_eq!(stats.normalized_volatility(10.0), 0.0);
    }
}
