//! Benchmark result reporting
//!
//! Two surfaces live here:
//!
//! - [`ReportSink`]: receives each (variant, operation) as the sweep finishes
//!   it, first the chart window, then the summary. [`SvgChartSink`] and
//!   [`ConsoleSink`] are the stock implementations.
//! - [`Reporter`]: formats a finished [`SweepReport`] as a whole.
//!
//! # Output Formats
//!
//! - **Console**: Human-readable text in the classic Mean / Standard Deviation layout
//! - **JSON**: Machine-readable format for CI/CD integration
//! - **Markdown**: Documentation-friendly tables
//!
//! # Example
//!
//! ```no_run
//! use pqbench_harness::reporter::{OutputFormat, Reporter};
//! use pqbench_harness::sweep::SweepReport;
//!
//! # fn example(report: SweepReport) -> anyhow::Result<()> {
//! Reporter::new(OutputFormat::Console).report(&report)?;
//!
//! // Or write to a file
//! Reporter::new(OutputFormat::Json).write_to_file(&report, "results.json")?;
//! # Ok(())
//! # }
//! ```

mod chart;
mod console;
mod json;
mod markdown;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::{ConfigError, ReportError};
use crate::provider::OperationKind;
use crate::samples::{Sample, Unit};
use crate::sweep::{OperationReport, SweepReport};

pub use chart::{chart_file_name, render_svg, SvgChartSink};
pub use console::{ConsoleReporter, ConsoleSink};
pub use json::JsonReporter;
pub use markdown::MarkdownReporter;

/// The head/tail-trimmed window of one run, in run order.
///
/// IQR outliers are still present; the chart shows them as spikes.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub variant: String,
    pub operation: OperationKind,
    pub unit: Unit,
    /// 1-based run number of `samples[0]`.
    pub first_run: usize,
    pub samples: Vec<Sample>,
}

impl ChartSeries {
    /// `<variant>_<operation>`, the stem of the chart file.
    pub fn label(&self) -> String {
        format!("{}_{}", self.variant, self.operation)
    }

    /// Samples converted to the sweep unit.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| self.unit.convert(*s)).collect()
    }

    /// Run numbers matching [`ChartSeries::values`].
    pub fn runs(&self) -> std::ops::Range<usize> {
        self.first_run..self.first_run + self.samples.len()
    }
}

/// Destination for per-operation results as a sweep produces them.
///
/// For every (variant, operation) the controller calls [`ReportSink::chart`]
/// and then [`ReportSink::summary`]. An error from either aborts the sweep.
pub trait ReportSink {
    fn chart(&mut self, series: &ChartSeries) -> Result<(), ReportError>;

    fn summary(&mut self, report: &OperationReport) -> Result<(), ReportError>;
}

/// Discards everything.
impl ReportSink for () {
    fn chart(&mut self, _series: &ChartSeries) -> Result<(), ReportError> {
        Ok(())
    }

    fn summary(&mut self, _report: &OperationReport) -> Result<(), ReportError> {
        Ok(())
    }
}

/// `None` disables a sink, e.g. charts under `--no-charts`.
impl<S: ReportSink> ReportSink for Option<S> {
    fn chart(&mut self, series: &ChartSeries) -> Result<(), ReportError> {
        match self {
            Some(sink) => sink.chart(series),
            None => Ok(()),
        }
    }

    fn summary(&mut self, report: &OperationReport) -> Result<(), ReportError> {
        match self {
            Some(sink) => sink.summary(report),
            None => Ok(()),
        }
    }
}

/// Fan out to both sinks, left first.
impl<A: ReportSink, B: ReportSink> ReportSink for (A, B) {
    fn chart(&mut self, series: &ChartSeries) -> Result<(), ReportError> {
        self.0.chart(series)?;
        self.1.chart(series)
    }

    fn summary(&mut self, report: &OperationReport) -> Result<(), ReportError> {
        self.0.summary(report)?;
        self.1.summary(report)
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn chart(&mut self, series: &ChartSeries) -> Result<(), ReportError> {
        (**self).chart(series)
    }

    fn summary(&mut self, report: &OperationReport) -> Result<(), ReportError> {
        (**self).summary(report)
    }
}

/// Output format for sweep results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Console output in the classic Mean / Standard Deviation layout
    #[default]
    Console,
    /// JSON format for machine parsing
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Markdown format for documentation
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "console" => Ok(OutputFormat::Console),
            "json" => Ok(OutputFormat::Json),
            "json_pretty" | "json-pretty" => Ok(OutputFormat::JsonPretty),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

/// Reporter for finished sweeps
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    /// Create a new reporter with the specified output format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Report results to stdout
    pub fn report(&self, report: &SweepReport) -> Result<()> {
        let output = self.format_results(report)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    /// Write results to a file
    pub fn write_to_file<P: AsRef<Path>>(&self, report: &SweepReport, path: P) -> Result<()> {
        let path = path.as_ref();
        let output = self.format_results(report)?;
        fs::write(path, output)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Format results as a string
    pub fn format_results(&self, report: &SweepReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => JsonReporter::format(report, false),
            OutputFormat::JsonPretty => JsonReporter::format(report, true),
            OutputFormat::Console => ConsoleReporter::format(report),
            OutputFormat::Markdown => MarkdownReporter::format(report),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_report;
    use super::*;

    #[derive(Default)]
    struct Recording {
        events: Vec<String>,
    }

    impl ReportSink for Recording {
        fn chart(&mut self, series: &ChartSeries) -> Result<(), ReportError> {
            self.events.push(format!("chart:{}", series.label()));
            Ok(())
        }

        fn summary(&mut self, report: &OperationReport) -> Result<(), ReportError> {
            self.events.push(format!("summary:{}", report.variant));
            Ok(())
        }
    }

    fn series() -> ChartSeries {
        ChartSeries {
            variant: "kyber512".into(),
            operation: OperationKind::Encapsulate,
            unit: Unit::Microseconds,
            first_run: 11,
            samples: vec![Sample::from_nanos(2_000), Sample::from_nanos(3_000)],
        }
    }

    #[test]
    fn test_reporter_json_format() {
        let output = Reporter::new(OutputFormat::Json)
            .format_results(&sample_report())
            .unwrap();

        assert!(output.contains("Curve Suite"));
        assert!(output.contains("prime256v1"));
    }

    #[test]
    fn test_reporter_console_format() {
        let output = Reporter::new(OutputFormat::Console)
            .format_results(&sample_report())
            .unwrap();

        assert!(output.contains("Curve Suite"));
        assert!(output.contains("Standard Deviation Percentage"));
    }

    #[test]
    fn test_reporter_markdown_format() {
        let output = Reporter::new(OutputFormat::Markdown)
            .format_results(&sample_report())
            .unwrap();

        assert!(output.contains("# "));
        assert!(output.contains("Curve Suite"));
    }

    #[test]
    fn test_default_format() {
        assert_eq!(Reporter::default().format(), OutputFormat::Console);
    }

    #[test]
    fn test_format_parsing() {
        let format: OutputFormat = "json-pretty".parse().unwrap();
        assert_eq!(format, OutputFormat::JsonPretty);
        assert!("html".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_series_geometry() {
        let s = series();
        assert_eq!(s.label(), "kyber512_encapsulate");
        assert_eq!(s.values(), vec![2.0, 3.0]);
        assert_eq!(s.runs(), 11..13);
    }

    #[test]
    fn test_tuple_sink_fans_out_in_order() {
        let mut sink = (Recording::default(), Some(Recording::default()));
        sink.chart(&series()).unwrap();

        assert_eq!(sink.0.events, vec!["chart:kyber512_encapsulate"]);
        assert_eq!(sink.1.as_ref().map(|r| r.events.len()), Some(1));
    }

    #[test]
    fn test_disabled_sink_is_silent() {
        let mut sink: Option<Recording> = None;
        assert!(sink.chart(&series()).is_ok());
    }
}
