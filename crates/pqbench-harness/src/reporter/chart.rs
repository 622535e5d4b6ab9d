//! SVG line charts of the trimmed window
//!
//! One file per (variant, operation): `<variant>_<operation>_plot.svg`.
//! The x axis is the 1-based run number, the y axis runs from zero to 10%
//! above the largest windowed value.

use std::fmt::{self, Write};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ReportError;
use crate::sweep::OperationReport;

use super::{ChartSeries, ReportSink};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 56.0;
const Y_TICKS: usize = 5;
const HEADROOM: f64 = 1.1;

/// Writes one SVG chart per series into a directory.
#[derive(Debug)]
pub struct SvgChartSink {
    directory: PathBuf,
    written: Vec<PathBuf>,
}

impl SvgChartSink {
    /// Create the sink, creating `directory` if needed.
    pub fn new<P: AsRef<Path>>(directory: P) -> Result<Self, ReportError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            written: Vec::new(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Chart files written so far, in sweep order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ReportSink for SvgChartSink {
    fn chart(&mut self, series: &ChartSeries) -> Result<(), ReportError> {
        let path = self.directory.join(chart_file_name(series));
        let svg = render_svg(series)?;
        fs::write(&path, svg)?;

        debug!(path = %path.display(), points = series.samples.len(), "chart written");
        self.written.push(path);
        Ok(())
    }

    fn summary(&mut self, _report: &OperationReport) -> Result<(), ReportError> {
        Ok(())
    }
}

/// `<variant>_<operation>_plot.svg`, with anything outside `[A-Za-z0-9._-]`
/// replaced by `_`.
pub fn chart_file_name(series: &ChartSeries) -> String {
    let stem: String = series
        .label()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}_plot.svg")
}

/// Render `series` as a standalone SVG document.
pub fn render_svg(series: &ChartSeries) -> Result<String, fmt::Error> {
    let values = series.values();
    let runs = series.runs();
    let first = runs.start as f64;
    let last = runs.end.saturating_sub(1).max(runs.start) as f64;

    let observed_max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    let y_max = if observed_max > 0.0 {
        observed_max * HEADROOM
    } else {
        1.0
    };
    let x_span = (last - first).max(1.0);

    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let px = |run: f64| MARGIN_LEFT + (run - first) / x_span * plot_w;
    let py = |v: f64| MARGIN_TOP + plot_h - (v / y_max).clamp(0.0, 1.0) * plot_h;

    let title = format!("{} ({})", series.operation.title(), series.variant);
    let mut svg = String::new();

    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    )?;
    writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        svg,
        r#"  <text x="{}" y="28" text-anchor="middle" font-family="sans-serif" font-size="18">{}</text>"#,
        WIDTH / 2.0,
        escape(&title)
    )?;

    // Axes
    let x0 = MARGIN_LEFT;
    let y0 = MARGIN_TOP + plot_h;
    writeln!(
        svg,
        r#"  <path d="M{x0} {MARGIN_TOP} V{y0} H{}" fill="none" stroke="black"/>"#,
        MARGIN_LEFT + plot_w
    )?;

    for i in 0..=Y_TICKS {
        let v = y_max * i as f64 / Y_TICKS as f64;
        let y = py(v);
        writeln!(
            svg,
            r#"  <line x1="{}" y1="{y:.1}" x2="{x0}" y2="{y:.1}" stroke="black"/><text x="{}" y="{:.1}" text-anchor="end" font-family="sans-serif" font-size="11">{}</text>"#,
            x0 - 5.0,
            x0 - 8.0,
            y + 4.0,
            tick_label(v)
        )?;
    }

    for run in x_ticks(runs.start, last as usize) {
        let x = px(run as f64);
        writeln!(
            svg,
            r#"  <line x1="{x:.1}" y1="{y0}" x2="{x:.1}" y2="{}" stroke="black"/><text x="{x:.1}" y="{}" text-anchor="middle" font-family="sans-serif" font-size="11">{run}</text>"#,
            y0 + 5.0,
            y0 + 18.0
        )?;
    }

    writeln!(
        svg,
        r#"  <text x="{}" y="{}" text-anchor="middle" font-family="sans-serif" font-size="13">Run</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 14.0
    )?;
    writeln!(
        svg,
        r#"  <text x="18" y="{0}" text-anchor="middle" transform="rotate(-90 18 {0})" font-family="sans-serif" font-size="13">{1}</text>"#,
        MARGIN_TOP + plot_h / 2.0,
        escape(series.unit.name())
    )?;

    // Data
    let mut points = String::new();
    for (run, value) in runs.clone().zip(&values) {
        if !points.is_empty() {
            points.push(' ');
        }
        write!(points, "{:.1},{:.1}", px(run as f64), py(*value))?;
    }
    writeln!(
        svg,
        r##"  <polyline points="{points}" fill="none" stroke="#1f77b4" stroke-width="1.5"/>"##
    )?;
    writeln!(svg, "</svg>")?;

    Ok(svg)
}

/// Up to about eight evenly spaced run numbers, always including both ends.
fn x_ticks(first: usize, last: usize) -> Vec<usize> {
    if last <= first {
        return vec![first];
    }
    let step = ((last - first) / 8).max(1);
    let mut ticks: Vec<usize> = (first..last).step_by(step).collect();
    ticks.push(last);
    ticks
}

fn tick_label(v: f64) -> String {
    if v >= 1000.0 {
        format!("{v:.0}")
    } else if v >= 10.0 {
        format!("{v:.1}")
    } else {
        format!("{v:.2}")
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
