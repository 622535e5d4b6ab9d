//! JSON reporter for sweep results

use crate::sweep::SweepReport;
use anyhow::Result;

/// JSON format reporter
pub struct JsonReporter;

impl JsonReporter {
    /// Format a sweep report as JSON
    ///
    /// # Arguments
    ///
    /// * `report` - The sweep report to format
    /// * `pretty` - Whether to pretty-print the JSON
    pub fn format(report: &SweepReport, pretty: bool) -> Result<String> {
        let output = if pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(output)
    }
}
