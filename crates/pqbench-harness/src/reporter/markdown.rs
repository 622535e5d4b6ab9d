//! Markdown reporter for sweep results

use anyhow::Result;
use std::fmt::Write;

use crate::sweep::{Outcome, SweepReport};

/// Markdown format reporter
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// Format a sweep report as a Markdown document with one results table
    pub fn format(report: &SweepReport) -> Result<String> {
        let mut output = String::new();
        let unit = report.unit.symbol();

        writeln!(output, "# {}", report.suite_name)?;
        writeln!(output)?;
        writeln!(output, "| Setting | Value |")?;
        writeln!(output, "|---|---|")?;
        writeln!(output, "| Provider | {} |", report.provider)?;
        writeln!(output, "| Started | {} |", report.started_at)?;
        let config = &report.config;
        writeln!(output, "| Iterations | {} |", config.iteration_count)?;
        writeln!(output, "| Ignore fraction | {} |", config.ignore_fraction)?;
        writeln!(output, "| IQR multiplier | {} |", config.iqr_multiplier)?;
        writeln!(output, "| Clock | {} |", report.clock)?;
        writeln!(output, "| Unit | {} |", report.unit)?;
        writeln!(output)?;

        writeln!(output, "## Results")?;
        writeln!(output)?;
        writeln!(
            output,
            "| Variant | Operation | Mean ({unit}) | Std Dev ({unit}) | CV % | Valid |"
        )?;
        writeln!(output, "|---|---|---:|---:|---:|---:|")?;

        for result in &report.results {
            match &result.outcome {
                Outcome::Summary(s) => writeln!(
                    output,
                    "| {} | {} | {:.2} | {:.2} | {:.2} | {}/{} |",
                    result.variant,
                    result.operation.title(),
                    s.mean,
                    s.std_dev,
                    s.cv_percent,
                    s.valid_count,
                    s.effective_count
                )?,
                Outcome::InsufficientValidSamples { effective_count } => writeln!(
                    output,
                    "| {} | {} | n/a | n/a | n/a | 0/{} |",
                    result.variant,
                    result.operation.title(),
                    effective_count
                )?,
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::test_support::sample_report;

    #[test]
    fn test_markdown_table_rows() {
        let output = MarkdownReporter::format(&sample_report()).unwrap();

        assert!(output.starts_with("# Curve Suite\n"));
        assert!(output.contains("| Variant | Operation | Mean (us) |"));
        let summarized = "| prime256v1 | Key Generation | 25.50 | 8.66 | 33.94 | 30/30 |";
        let insufficient = "| secp384r1 | Signing | n/a | n/a | n/a | 0/30 |";
        assert!(output.contains(summarized));
        assert!(output.contains(insufficient));
    }
}
