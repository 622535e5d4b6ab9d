//! Outlier rejection using the Interquartile Range (IQR) method.
//!
//! Quartiles are taken by direct index into the full sorted sample array at
//! the positions given by a [`TrimWindow`]. No interpolation is done.

use serde::{Deserialize, Serialize};

use super::window::TrimWindow;

/// Acceptance band `[Q1 - k*IQR, Q3 + k*IQR]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBand {
    /// First quartile, `sorted[q1_index]`
    pub q1: f64,
    /// Third quartile, `sorted[q3_index]`
    pub q3: f64,
    /// Interquartile range (Q3 - Q1)
    pub iqr: f64,
    /// Lower fence (Q1 - k*IQR)
    pub lower_fence: f64,
    /// Upper fence (Q3 + k*IQR)
    pub upper_fence: f64,
}

impl IqrBand {
    /// Compute the band from an ascending-sorted sample array.
    ///
    /// # Arguments
    ///
    /// * `sorted` - All `N` samples, ascending. Not the trimmed window.
    /// * `window` - Trim window for `N`
    /// * `multiplier` - Band width `k` in IQRs
    ///
    /// # Examples
    ///
    /// ```
    /// use pqbench_harness::stats::{IqrBand, TrimWindow};
    ///
    /// let sorted: Vec<f64> = (1..=50).map(f64::from).collect();
    /// let window = TrimWindow::new(50, 0.2).unwrap();
    /// let band = IqrBand::from_sorted(&sorted, &window, 1.5);
    /// assert_eq!((band.q1, band.q3), (18.0, 33.0));
    /// assert_eq!((band.lower_fence, band.upper_fence), (-4.5, 55.5));
    /// ```
    pub fn from_sorted(sorted: &[f64], window: &TrimWindow, multiplier: f64) -> Self {
        debug_assert_eq!(sorted.len(), window.sample_count());

        let q1 = sorted[window.q1_index()];
        let q3 = sorted[window.q3_index()];
        let iqr = q3 - q1;

        Self {
            q1,
            q3,
            iqr,
            lower_fence: q1 - multiplier * iqr,
            upper_fence: q3 + multiplier * iqr,
        }
    }

    /// Inclusive on both fences. NaN is never inside.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower_fence && value <= self.upper_fence
    }
}
