//! Trimmed mean, standard deviation and coefficient of variation.
//!
//! Two stages, applied in this order and never merged:
//!
//! 1. Head/tail trim: sort ascending and keep the middle `effective_count`
//!    values. Removes warm-up and cool-down skew.
//! 2. IQR band: of the window, keep only values inside
//!    `[Q1 - k*IQR, Q3 + k*IQR]`, with Q1 and Q3 indexed into the full sorted
//!    array. Removes sporadic spikes from the steady state.

use serde::{Deserialize, Serialize};

use super::outliers::IqrBand;
use super::window::TrimWindow;
use crate::config::{validate_trim_parameters, BenchmarkConfig};
use crate::error::StatsError;

/// A raw measurement the engine can reduce.
pub trait SampleValue: Copy {
    fn to_f64(self) -> f64;
}

impl SampleValue for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

impl SampleValue for f32 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl SampleValue for u64 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl SampleValue for u32 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

/// Outlier-robust summary of one sample sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimmedSummary {
    pub mean: f64,
    /// Population standard deviation of the valid set.
    pub std_dev: f64,
    /// `100 * std_dev / mean`, or 0 when the mean is 0.
    pub cv_percent: f64,
    /// Samples that survived both stages.
    pub valid_count: usize,
    /// `N`
    pub sample_count: usize,
    pub ignore_count: usize,
    pub effective_count: usize,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Smallest valid value.
    pub min: f64,
    /// Largest valid value.
    pub max: f64,
}

impl TrimmedSummary {
    /// Window values rejected by the IQR band.
    pub fn outliers_removed(&self) -> usize {
        self.effective_count - self.valid_count
    }
}

/// Summarize `samples` with the trimming constants of `config`.
///
/// `N` is `samples.len()`; `config.iteration_count` is not consulted. The
/// function is pure: the same input always yields a bit-identical summary.
///
/// # Errors
///
/// - [`StatsError::InvalidConfig`] for an out-of-range fraction or multiplier
/// - [`StatsError::InsufficientValidSamples`] when nothing survives, which
///   covers an empty input and inputs made only of NaN
///
/// # Examples
///
/// ```
/// use pqbench_harness::config::BenchmarkConfig;
/// use pqbench_harness::stats::summarize;
///
/// let samples: Vec<f64> = (1..=50).map(f64::from).collect();
/// let summary = summarize(&samples, &BenchmarkConfig::default()).unwrap();
/// assert_eq!(summary.valid_count, 30);
/// assert_eq!(summary.mean, 25.5);
/// ```
pub fn summarize<T: SampleValue>(
    samples: &[T],
    config: &BenchmarkConfig,
) -> Result<TrimmedSummary, StatsError> {
    validate_trim_parameters(config.ignore_fraction, config.iqr_multiplier)?;
    if samples.is_empty() {
        return Err(StatsError::InsufficientValidSamples { effective_count: 0 });
    }

    let window = TrimWindow::new(samples.len(), config.ignore_fraction)?;

    let mut sorted: Vec<f64> = samples.iter().map(|s| s.to_f64()).collect();
    sorted.sort_by(f64::total_cmp);

    let band = IqrBand::from_sorted(&sorted, &window, config.iqr_multiplier);

    let valid: Vec<f64> = window
        .slice(&sorted)
        .iter()
        .copied()
        .filter(|&x| band.contains(x))
        .collect();

    if valid.is_empty() {
        return Err(StatsError::InsufficientValidSamples {
            effective_count: window.effective_count(),
        });
    }

    let count = valid.len() as f64;
    // The valid set is a sorted run, so its ends are its extremes
    let min = valid[0];
    let max = valid[valid.len() - 1];

    let mean = (valid.iter().sum::<f64>() / count).clamp(min, max);
    let variance = valid.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count;
    let std_dev = variance.sqrt();
    let cv_percent = if mean == 0.0 {
        0.0
    } else {
        100.0 * std_dev / mean
    };

    Ok(TrimmedSummary {
        mean,
        std_dev,
        cv_percent,
        valid_count: valid.len(),
        sample_count: window.sample_count(),
        ignore_count: window.ignore_count(),
        effective_count: window.effective_count(),
        q1: band.q1,
        q3: band.q3,
        iqr: band.iqr,
        lower_fence: band.lower_fence,
        upper_fence: band.upper_fence,
        min,
        max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use proptest::prelude::*;

    fn cfg() -> BenchmarkConfig {
        BenchmarkConfig::default()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ascending_fifty() {
        let samples: Vec<f64> = (1..=50).map(f64::from).collect();
        let s = summarize(&samples, &cfg()).unwrap();

        assert_eq!(s.ignore_count, 10);
        assert_eq!(s.effective_count, 30);
        assert_eq!((s.q1, s.q3, s.iqr), (18.0, 33.0, 15.0));
        assert_eq!((s.lower_fence, s.upper_fence), (-4.5, 55.5));
        assert_eq!(s.valid_count, 30);
        assert_eq!(s.outliers_removed(), 0);
        assert_eq!(s.mean, 25.5);
        // Population variance of 30 consecutive integers is (30^2 - 1) / 12
        assert!(close(s.std_dev, (899.0f64 / 12.0).sqrt()));
        assert!((s.std_dev - 8.6554).abs() < 1e-4);
        assert!(close(s.cv_percent, 100.0 * s.std_dev / 25.5));
        assert_eq!((s.min, s.max), (11.0, 40.0));
    }

    #[test]
    fn test_arrival_order_does_not_matter() {
        let ascending: Vec<f64> = (1..=50).map(f64::from).collect();
        let mut shuffled = ascending.clone();
        shuffled.reverse();
        shuffled.swap(3, 41);

        assert_eq!(
            summarize(&ascending, &cfg()).unwrap(),
            summarize(&shuffled, &cfg()).unwrap()
        );
    }

    #[test]
    fn test_in_window_spike_is_rejected_by_band() {
        // Eleven spikes: ten land in the tail trim, one falls inside the window
        let mut samples: Vec<f64> = (1..=39).map(f64::from).collect();
        samples.extend(std::iter::repeat(100_000.0).take(11));
        let s = summarize(&samples, &cfg()).unwrap();

        assert_eq!(s.effective_count, 30);
        assert_eq!(s.valid_count, 29);
        assert_eq!(s.outliers_removed(), 1);
        assert_eq!(s.max, 39.0);
        assert_eq!(s.mean, 25.0);
        assert!(close(s.std_dev, 70.0f64.sqrt()));

        // Had the spike been kept the mean and spread would be far larger
        let with_spike: Vec<f64> = (11..=39).map(f64::from).chain([100_000.0]).collect();
        let hypothetical_mean = with_spike.iter().sum::<f64>() / 30.0;
        let hypothetical_var = with_spike
            .iter()
            .map(|x| (x - hypothetical_mean).powi(2))
            .sum::<f64>()
            / 30.0;
        let hypothetical_sd = hypothetical_var.sqrt();
        assert!(s.mean < hypothetical_mean);
        assert!(s.std_dev < hypothetical_sd);
    }

    #[test]
    fn test_single_spike_is_removed_by_tail_trim() {
        // Replacing 26 with 100000 moves it to the top of the sorted array,
        // where the tail trim drops it before the band sees it
        let samples: Vec<f64> = (1..=50)
            .map(|v| if v == 26 { 100_000.0 } else { f64::from(v) })
            .collect();
        let s = summarize(&samples, &cfg()).unwrap();

        assert_eq!(s.valid_count, 30);
        assert_eq!((s.q1, s.q3), (18.0, 34.0));
        assert_eq!(s.mean, 26.0);
        assert_eq!(s.max, 41.0);
    }

    #[test]
    fn test_idempotent() {
        let samples = [3.1, 2.7, 9.9, 3.0, 2.95, 3.2, 150.0, 3.05, 2.9, 3.15];
        let first = summarize(&samples, &cfg()).unwrap();
        let second = summarize(&samples, &cfg()).unwrap();

        assert_eq!(first.mean.to_bits(), second.mean.to_bits());
        assert_eq!(first.std_dev.to_bits(), second.std_dev.to_bits());
        assert_eq!(first.cv_percent.to_bits(), second.cv_percent.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn test_tiny_sequences() {
        let one = summarize(&[7.0], &cfg()).unwrap();
        assert_eq!((one.valid_count, one.mean, one.std_dev), (1, 7.0, 0.0));

        let two = summarize(&[4.0, 2.0], &cfg()).unwrap();
        assert_eq!((two.q1, two.q3), (2.0, 4.0));
        assert_eq!((two.valid_count, two.mean), (2, 3.0));

        let config = BenchmarkConfig::new(3, 0.4, 1.5).unwrap();
        let three = summarize(&[9.0, 1.0, 5.0], &config).unwrap();
        assert_eq!(
            (three.effective_count, three.valid_count, three.mean),
            (1, 1, 5.0)
        );

        let five = summarize(&[1u64, 2, 3, 4, 5], &cfg()).unwrap();
        assert_eq!(five.effective_count, 3);
        assert_eq!(five.mean, 3.0);
    }

    #[test]
    fn test_integer_cycle_samples() {
        let samples: Vec<u64> = vec![2400, 2400, 2401, 2399, 2400, 9000, 2400, 2400, 2400, 2400];
        let s = summarize(&samples, &cfg()).unwrap();

        // Zero IQR: only values equal to the quartile survive
        assert_eq!(s.iqr, 0.0);
        assert_eq!(s.mean, 2400.0);
        assert_eq!(s.std_dev, 0.0);
    }

    #[test]
    fn test_zero_mean_has_zero_cv() {
        let s = summarize(&[0.0; 10], &cfg()).unwrap();
        assert_eq!((s.mean, s.std_dev, s.cv_percent), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_empty_input_reports_insufficient_samples() {
        let empty: [f64; 0] = [];
        assert_eq!(
            summarize(&empty, &cfg()).unwrap_err(),
            StatsError::InsufficientValidSamples { effective_count: 0 }
        );
    }

    #[test]
    fn test_all_nan_reports_insufficient_samples() {
        let err = summarize(&[f64::NAN; 10], &cfg()).unwrap_err();
        assert_eq!(
            err,
            StatsError::InsufficientValidSamples { effective_count: 6 }
        );
    }

    #[test]
    fn test_invalid_constants_rejected() {
        let bad = BenchmarkConfig {
            iteration_count: 10,
            ignore_fraction: 0.5,
            iqr_multiplier: 1.5,
        };
        assert_eq!(
            summarize(&[1.0; 10], &bad).unwrap_err(),
            StatsError::InvalidConfig(ConfigError::InvalidIgnoreFraction(0.5))
        );
    }

    proptest! {
        #[test]
        fn mean_lies_within_valid_set(
            samples in prop::collection::vec(0.0f64..1e7, 1..300),
            f in 0.0f64..0.49,
            k in 0.0f64..4.0,
        ) {
            let config = BenchmarkConfig {
                iteration_count: samples.len(),
                ignore_fraction: f,
                iqr_multiplier: k,
            };
            let s = summarize(&samples, &config).unwrap();

            prop_assert!(s.valid_count >= 1);
            prop_assert!(s.valid_count <= s.effective_count);
            prop_assert!(s.min <= s.mean && s.mean <= s.max);
            prop_assert!(s.std_dev >= 0.0);
            prop_assert!(s.cv_percent.is_finite());
        }

        #[test]
        fn band_always_contains_q1(
            samples in prop::collection::vec(0u64..1_000_000, 1..200),
        ) {
            let s = summarize(&samples, &cfg()).unwrap();
            prop_assert!(s.lower_fence <= s.q1 && s.q1 <= s.upper_fence);
        }
    }
}
