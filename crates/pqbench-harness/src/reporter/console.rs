//! Console reporter for sweep results
//!
//! Mirrors the layout benchmark users already read: one block per operation
//! with Mean, Standard Deviation and Standard Deviation Percentage.

use anyhow::Result;
use std::fmt::{self, Write};
use std::io;

use crate::error::ReportError;
use crate::sizes::ArtifactSizes;
use crate::sweep::{OperationReport, Outcome, SweepReport};

use super::{ChartSeries, ReportSink};

const BANNER: &str = "\
╔══════════════════════════════════════════════════════════════╗
║                    BENCHMARK RESULTS                         ║
╚══════════════════════════════════════════════════════════════╝";

const RULE: &str = "────────────────────────────────────────────────────────────────";

/// Console format reporter
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Format a finished sweep for console output
    pub fn format(report: &SweepReport) -> Result<String> {
        let mut output = String::new();

        Self::format_header(&mut output, report)?;

        let mut current_variant: Option<&str> = None;
        for result in &report.results {
            if current_variant != Some(result.variant.as_str()) {
                writeln!(output, "Algorithm: {}", result.variant)?;
                current_variant = Some(result.variant.as_str());
            }
            Self::format_operation(&mut output, result)?;
        }

        writeln!(output, "{RULE}")?;
        let failed = report.failures().count();
        if failed == 0 {
            writeln!(output, "All {} operations summarized", report.results.len())?;
        } else {
            writeln!(
                output,
                "{} of {} operations had no valid samples",
                failed,
                report.results.len()
            )?;
        }
        writeln!(output)?;

        Ok(output)
    }

    fn format_header(output: &mut String, report: &SweepReport) -> fmt::Result {
        writeln!(output)?;
        writeln!(output, "{BANNER}")?;
        writeln!(output)?;

        writeln!(output, "Suite:     {}", report.suite_name)?;
        writeln!(output, "Provider:  {}", report.provider)?;
        writeln!(output, "Started:   {}", report.started_at)?;
        writeln!(output, "Duration:  {}ms", report.total_duration_ms)?;
        writeln!(output)?;

        let config = &report.config;
        writeln!(output, "Configuration:")?;
        writeln!(output, "  Iterations:       {}", config.iteration_count)?;
        writeln!(output, "  Ignore Fraction:  {}", config.ignore_fraction)?;
        writeln!(output, "  IQR Multiplier:   {}", config.iqr_multiplier)?;
        writeln!(output, "  Clock:            {}", report.clock)?;
        writeln!(output, "  Unit:             {}", report.unit)?;
        writeln!(output)
    }

    /// Format one operation block.
    pub fn format_operation(output: &mut String, report: &OperationReport) -> fmt::Result {
        let unit = report.unit.name();

        writeln!(output, "{}:", report.operation.title())?;
        match &report.outcome {
            Outcome::Summary(summary) => {
                writeln!(output, "  Mean: {:.2} {}", summary.mean, unit)?;
                writeln!(
                    output,
                    "  Standard Deviation: {:.2} {}",
                    summary.std_dev, unit
                )?;
                writeln!(
                    output,
                    "  Standard Deviation Percentage: {:.2}%",
                    summary.cv_percent
                )?;
                writeln!(
                    output,
                    "  Valid Samples: {}/{} ({} outliers removed)",
                    summary.valid_count,
                    summary.effective_count,
                    summary.outliers_removed()
                )?;
            }
            Outcome::InsufficientValidSamples { effective_count } => {
                writeln!(
                    output,
                    "  No valid samples remained after trimming ({} in window)",
                    effective_count
                )?;
            }
        }
        writeln!(output)
    }

    /// Format the artifact size report.
    pub fn format_sizes(sizes: &[ArtifactSizes]) -> Result<String> {
        let mut output = String::new();

        for entry in sizes {
            writeln!(output, "Algorithm: {}", entry.variant)?;
            writeln!(output, "Private key size: {} bytes", entry.secret_key_bytes)?;
            writeln!(output, "Public key size: {} bytes", entry.public_key_bytes)?;
            if let Some(bytes) = entry.signature_bytes {
                writeln!(output, "Signature size: {} bytes", bytes)?;
            }
            if let Some(bytes) = entry.ciphertext_bytes {
                writeln!(output, "Ciphertext size: {} bytes", bytes)?;
            }
            if let Some(bytes) = entry.shared_secret_bytes {
                writeln!(output, "Shared secret size: {} bytes", bytes)?;
            }
            writeln!(output)?;
        }

        Ok(output)
    }
}

/// Streams operation blocks to a writer as the sweep produces them.
pub struct ConsoleSink<W: io::Write> {
    writer: W,
    current_variant: Option<String>,
}

impl<W: io::Write> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            current_variant: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write> ReportSink for ConsoleSink<W> {
    fn chart(&mut self, _series: &ChartSeries) -> Result<(), ReportError> {
        Ok(())
    }

    fn summary(&mut self, report: &OperationReport) -> Result<(), ReportError> {
        let mut block = String::new();
        if self.current_variant.as_deref() != Some(report.variant.as_str()) {
            writeln!(block, "Algorithm: {}", report.variant)?;
            self.current_variant = Some(report.variant.clone());
        }
        ConsoleReporter::format_operation(&mut block, report)?;

        self.writer.write_all(block.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}
