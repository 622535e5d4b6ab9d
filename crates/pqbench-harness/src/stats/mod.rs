//! Statistical reduction of benchmark samples
//!
//! The engine turns one run-ordered sample sequence into a [`TrimmedSummary`]
//! by a head/tail trim followed by IQR outlier rejection.
//!
//! # Examples
//!
//! ```
//! use pqbench_harness::config::BenchmarkConfig;
//! use pqbench_harness::stats::{summarize, TrimWindow};
//!
//! let samples = vec![12.0, 10.0, 10.5, 11.0, 10.2, 95.0, 10.8, 10.4, 10.1, 10.9];
//! let config = BenchmarkConfig::new(samples.len(), 0.2, 1.5).unwrap();
//!
//! let summary = summarize(&samples, &config).unwrap();
//! println!("mean {:.2} sd {:.2} ({:.1}%)", summary.mean, summary.std_dev, summary.cv_percent);
//!
//! // The chart shows the run-order window, outliers included
//! let window = TrimWindow::new(samples.len(), 0.2).unwrap();
//! assert_eq!(window.slice(&samples).len(), 6);
//! ```

pub mod outliers;
pub mod trimmed;
pub mod window;

pub use outliers::IqrBand;
pub use trimmed::{summarize, SampleValue, TrimmedSummary};
pub use window::TrimWindow;
