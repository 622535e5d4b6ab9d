//! Head/tail trim arithmetic.
//!
//! All index math for the trimmed statistics lives here so the engine and the
//! chart sink agree on which samples are "the window".

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::ConfigError;

/// The middle `effective_count` positions of an `N`-sample sequence after
/// discarding `ignore_count` from each end.
///
/// Invariant: `effective_count = sample_count - 2 * ignore_count >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimWindow {
    sample_count: usize,
    ignore_count: usize,
}

impl TrimWindow {
    /// Window for `sample_count` samples with `ignore_fraction` trimmed from
    /// each end.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidIgnoreFraction`] unless `0 <= f < 0.5`
    /// - [`ConfigError::NoEffectiveSamples`] if nothing would survive the trim
    ///
    /// # Examples
    ///
    /// ```
    /// use pqbench_harness::stats::TrimWindow;
    ///
    /// let window = TrimWindow::new(50, 0.2).unwrap();
    /// assert_eq!(window.ignore_count(), 10);
    /// assert_eq!(window.effective_count(), 30);
    /// assert_eq!(window.q1_index(), 17);
    /// assert_eq!(window.q3_index(), 32);
    /// ```
    pub fn new(sample_count: usize, ignore_fraction: f64) -> Result<Self, ConfigError> {
        if !ignore_fraction.is_finite() || !(0.0..0.5).contains(&ignore_fraction) {
            return Err(ConfigError::InvalidIgnoreFraction(ignore_fraction));
        }

        let ignore_count = (sample_count as f64 * ignore_fraction).floor() as usize;
        if sample_count <= 2 * ignore_count {
            return Err(ConfigError::NoEffectiveSamples {
                iterations: sample_count,
                ignore_fraction,
            });
        }

        Ok(Self {
            sample_count,
            ignore_count,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn ignore_count(&self) -> usize {
        self.ignore_count
    }

    pub fn effective_count(&self) -> usize {
        self.sample_count - 2 * self.ignore_count
    }

    /// Positions `ignore_count .. sample_count - ignore_count`.
    pub fn range(&self) -> Range<usize> {
        self.ignore_count..self.sample_count - self.ignore_count
    }

    /// The window of `values`. `values` must hold `sample_count` items.
    pub fn slice<'a, T>(&self, values: &'a [T]) -> &'a [T] {
        &values[self.range()]
    }

    /// Index of Q1 into the full sorted array.
    pub fn q1_index(&self) -> usize {
        self.ignore_count + self.effective_count() / 4
    }

    /// Index of Q3 into the full sorted array.
    pub fn q3_index(&self) -> usize {
        self.ignore_count + 3 * self.effective_count() / 4
    }

    /// 1-based run number of the first windowed sample, used as the chart's
    /// first x value.
    pub fn first_run(&self) -> usize {
        self.ignore_count + 1
    }

    /// 1-based run number of the last windowed sample.
    pub fn last_run(&self) -> usize {
        self.sample_count - self.ignore_count
    }
}
