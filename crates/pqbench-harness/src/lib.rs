//! Benchmark harness for cryptographic primitives
//!
//! This crate times classical and post-quantum key generation, encapsulation,
//! decapsulation, signing and verification, and reduces each run to an
//! outlier-robust summary plus a chart of the steady-state window.
//!
//! # Features
//!
//! - **Trimmed Statistics**: head/tail trim followed by IQR outlier rejection
//! - **Per-Iteration Isolation**: fresh keys and ciphertexts for every timed call
//! - **Two Clocks**: monotonic wall time or process CPU time
//! - **Two Units**: microseconds, or cycles at an assumed CPU frequency
//! - **Multiple Output Formats**: Console, JSON and Markdown reports, SVG charts
//!
//! The primitives come from a [`CryptoProvider`]; see the `pqbench-crypto` crate.
//!
//! # Example
//!
//! ```ignore
//! use pqbench_harness::{SweepController, SweepFile, Clock, reporter::{Reporter, OutputFormat, SvgChartSink}};
//!
//! let sweep = SweepFile::from_file("kem.toml")?;
//! let controller = SweepController::new(
//!     &provider,
//!     sweep.benchmark_config()?,
//!     sweep.unit()?,
//!     Clock::new(sweep.benchmark.clock)?,
//!     b"message",
//! )?;
//!
//! let mut charts = SvgChartSink::new("plots")?;
//! let report = controller.run_plan(&sweep.variant_plan(), &mut charts)?;
//! Reporter::new(OutputFormat::Console).report(&report)?;
//! ```
//!
//! # Configuration
//!
//! Sweeps are configured using TOML files:
//!
//! ```toml
//! [benchmark]
//! name = "PQ KEM timing"
//! iterations = 50
//! ignore_fraction = 0.2
//! iqr_multiplier = 1.5
//! clock = "monotonic"
//! unit = "microseconds"
//! provider = "oqs"
//!
//! [output]
//! directory = "plots"
//! charts = true
//! format = "console"
//!
//! [[variants]]
//! name = "kyber512"
//! operations = ["keygen", "encapsulate", "decapsulate"]
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod preset;
pub mod provider;
pub mod reporter;
pub mod runner;
pub mod samples;
pub mod sizes;
pub mod stats;
pub mod sweep;

// Re-export main types for convenience
pub use clock::{Clock, ClockSource};
pub use config::{BenchmarkConfig, SweepFile};
pub use error::{BenchError, ClockError, ConfigError, ProviderError, ReportError, StatsError};
pub use preset::{Preset, UnitMode};
pub use provider::{CryptoProvider, Encapsulation, KeySizes, OperationKind, Variant};
pub use reporter::{ChartSeries, OutputFormat, ReportSink, Reporter};
pub use runner::OperationRunner;
pub use samples::{Sample, SampleSequence, Unit};
pub use sizes::{measure_sizes, ArtifactSizes};
pub use stats::{summarize, TrimmedSummary};
pub use sweep::{OperationReport, Outcome, SweepController, SweepReport};
