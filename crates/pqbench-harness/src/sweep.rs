//! Sweep orchestration
//!
//! A sweep is an ordered list of (variant, operation) pairs. For each pair the
//! controller runs the operation, summarizes the samples and hands both the
//! summary and the chart window to a [`ReportSink`].
//!
//! Everything runs on the calling thread, one pair after another. Every pair
//! is validated against the provider before the first operation is timed.
//!
//! # Example
//!
//! ```ignore
//! use pqbench_harness::{BenchmarkConfig, Clock, SweepController, Unit, Variant, OperationKind};
//!
//! let controller = SweepController::new(&provider, BenchmarkConfig::default(), Unit::Microseconds, Clock::monotonic(), b"msg")?;
//! let report = controller.run_sweep(
//!     &[Variant::new("kyber512"), Variant::new("kyber768")],
//!     &OperationKind::KEM,
//!     &mut (),
//! )?;
//! for (variant, operation, summary) in report.summaries() {
//!     println!("{variant} {operation}: {:.2}", summary.mean);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::clock::{Clock, ClockSource};
use crate::config::BenchmarkConfig;
use crate::error::{BenchError, ConfigError, StatsError};
use crate::provider::{CryptoProvider, OperationKind, Variant};
use crate::reporter::{ChartSeries, ReportSink};
use crate::runner::OperationRunner;
use crate::samples::Unit;
use crate::stats::{summarize, TrimmedSummary};

/// Results of a complete sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// Name of the sweep
    pub suite_name: String,
    /// RFC 3339 timestamp when the sweep started
    pub started_at: String,
    /// Provider that executed the operations
    pub provider: String,
    pub unit: Unit,
    pub clock: ClockSource,
    pub config: BenchmarkConfig,
    /// One entry per (variant, operation), in run order
    pub results: Vec<OperationReport>,
    /// Wall time of the whole sweep, including untimed setup
    pub total_duration_ms: u64,
}

impl SweepReport {
    /// Pairs that produced a numeric summary, in run order.
    pub fn summaries(&self) -> impl Iterator<Item = (&str, OperationKind, &TrimmedSummary)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            Outcome::Summary(summary) => Some((r.variant.as_str(), r.operation, summary)),
            Outcome::InsufficientValidSamples { .. } => None,
        })
    }

    /// Pairs whose statistics could not be computed.
    pub fn failures(&self) -> impl Iterator<Item = &OperationReport> {
        self.results
            .iter()
            .filter(|r| r.summary().is_none())
    }
}

/// Outcome for one (variant, operation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationReport {
    pub variant: String,
    pub operation: OperationKind,
    pub unit: Unit,
    pub outcome: Outcome,
}

impl OperationReport {
    pub fn summary(&self) -> Option<&TrimmedSummary> {
        match &self.outcome {
            Outcome::Summary(summary) => Some(summary),
            Outcome::InsufficientValidSamples { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Summary(TrimmedSummary),
    /// No sample survived trimming; reported instead of a numeric summary.
    InsufficientValidSamples {
        effective_count: usize,
    },
}

/// Drives [`OperationRunner`] and the statistics engine over a sweep.
pub struct SweepController<'a, P: CryptoProvider> {
    provider: &'a P,
    config: BenchmarkConfig,
    unit: Unit,
    clock: Clock,
    message: &'a [u8],
    suite_name: String,
}

impl<'a, P: CryptoProvider> SweepController<'a, P> {
    /// Create a controller. `config` is validated here, before anything runs.
    pub fn new(
        provider: &'a P,
        config: BenchmarkConfig,
        unit: Unit,
        clock: Clock,
        message: &'a [u8],
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            provider,
            config,
            unit,
            clock,
            message,
            suite_name: String::from("pqbench"),
        })
    }

    pub fn with_suite_name(mut self, name: impl Into<String>) -> Self {
        self.suite_name = name.into();
        self
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Run every applicable operation of `operations` for every variant.
    ///
    /// Operations a variant does not support are skipped. A variant the
    /// provider does not know at all is a configuration error.
    pub fn run_sweep<S: ReportSink + ?Sized>(
        &self,
        variants: &[Variant],
        operations: &[OperationKind],
        sink: &mut S,
    ) -> Result<SweepReport, BenchError> {
        let mut pairs = Vec::new();
        for variant in variants {
            let supported = self.supported(variant)?;
            for &op in operations {
                if supported.contains(&op) {
                    pairs.push((variant.clone(), op));
                } else {
                    debug!(variant = %variant, operation = %op, "operation not applicable, skipped");
                }
            }
        }
        self.execute(pairs, sink)
    }

    /// Run a plan of variants with explicit operation lists.
    ///
    /// `None` selects every operation the provider supports for that variant.
    /// An explicitly listed operation the variant does not support is a
    /// configuration error.
    pub fn run_plan<S: ReportSink + ?Sized>(
        &self,
        plan: &[(Variant, Option<Vec<OperationKind>>)],
        sink: &mut S,
    ) -> Result<SweepReport, BenchError> {
        let pairs = self.resolve_plan(plan)?;
        self.execute(pairs, sink)
    }

    /// Expand and validate a plan without running it.
    pub fn resolve_plan(
        &self,
        plan: &[(Variant, Option<Vec<OperationKind>>)],
    ) -> Result<Vec<(Variant, OperationKind)>, ConfigError> {
        let mut pairs = Vec::new();
        for (variant, requested) in plan {
            let supported = self.supported(variant)?;
            match requested {
                None => {
                    for op in supported {
                        pairs.push((variant.clone(), op));
                    }
                }
                Some(ops) => {
                    for &op in ops {
                        if !supported.contains(&op) {
                            return Err(ConfigError::UnsupportedOperation {
                                variant: variant.label(),
                                operation: op,
                            });
                        }
                        pairs.push((variant.clone(), op));
                    }
                }
            }
        }
        Ok(pairs)
    }

    fn supported(&self, variant: &Variant) -> Result<Vec<OperationKind>, ConfigError> {
        self.provider
            .supported_operations(variant)
            .map_err(|_| ConfigError::UnsupportedVariant {
                provider: self.provider.name().to_string(),
                variant: variant.label(),
            })
    }

    #[instrument(
        skip_all,
        fields(suite = %self.suite_name, provider = self.provider.name(), pairs = pairs.len())
    )]
    fn execute<S: ReportSink + ?Sized>(
        &self,
        pairs: Vec<(Variant, OperationKind)>,
        sink: &mut S,
    ) -> Result<SweepReport, BenchError> {
        if pairs.is_empty() {
            return Err(ConfigError::EmptySweep.into());
        }

        let start_time = Instant::now();
        let started_at = chrono::Utc::now().to_rfc3339();
        let runner = OperationRunner::new(self.provider, self.clock, self.message);

        info!(
            "Starting sweep '{}': {} pairs x {} iterations, unit {}",
            self.suite_name,
            pairs.len(),
            self.config.iteration_count,
            self.unit
        );

        let mut results = Vec::with_capacity(pairs.len());
        for (variant, operation) in &pairs {
            let report = self.run_pair(&runner, variant, *operation, sink)?;
            results.push(report);
        }

        let report = SweepReport {
            suite_name: self.suite_name.clone(),
            started_at,
            provider: self.provider.name().to_string(),
            unit: self.unit,
            clock: self.clock.source(),
            config: self.config,
            results,
            total_duration_ms: start_time.elapsed().as_millis() as u64,
        };

        let failed = report.failures().count();
        if failed == 0 {
            info!(
                "Sweep '{}' completed in {}ms",
                report.suite_name, report.total_duration_ms
            );
        } else {
            warn!(
                "Sweep '{}' completed with {} pairs lacking valid samples",
                report.suite_name, failed
            );
        }

        Ok(report)
    }

    #[instrument(skip(self, runner, sink), fields(variant = %variant))]
    fn run_pair<S: ReportSink + ?Sized>(
        &self,
        runner: &OperationRunner<'_, P>,
        variant: &Variant,
        operation: OperationKind,
        sink: &mut S,
    ) -> Result<OperationReport, BenchError> {
        info!("Running {} for {}", operation.title(), variant);

        let samples = runner.run(variant, operation, self.config.iteration_count)?;
        let values = samples.to_values(self.unit);

        let outcome = match summarize(&values, &self.config) {
            Ok(summary) => {
                info!(
                    mean = summary.mean,
                    std_dev = summary.std_dev,
                    cv_percent = summary.cv_percent,
                    valid = summary.valid_count,
                    "{} {} summarized",
                    variant,
                    operation
                );
                Outcome::Summary(summary)
            }
            Err(StatsError::InsufficientValidSamples { effective_count }) => {
                warn!(
                    "{} {}: no valid samples in a window of {}",
                    variant, operation, effective_count
                );
                Outcome::InsufficientValidSamples { effective_count }
            }
            Err(StatsError::InvalidConfig(e)) => return Err(e.into()),
        };

        let window = self.config.window()?;
        let series = ChartSeries {
            variant: variant.label(),
            operation,
            unit: self.unit,
            first_run: window.first_run(),
            samples: window.slice(samples.as_slice()).to_vec(),
        };
        sink.chart(&series)?;

        let report = OperationReport {
            variant: variant.label(),
            operation,
            unit: self.unit,
            outcome,
        };
        sink.summary(&report)?;

        Ok(report)
    }
}
