//! Configuration for benchmark sweeps
//!
//! Two layers live here. [`BenchmarkConfig`] is the validated triple the
//! statistics engine and runner consume. [`SweepFile`] is the TOML document a
//! user writes to describe a whole sweep: provider, variants, units and output.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::clock::ClockSource;
use crate::error::ConfigError;
use crate::provider::{OperationKind, Variant};
use crate::reporter::OutputFormat;
use crate::samples::{Unit, DEFAULT_CPU_FREQUENCY_HZ};
use crate::stats::TrimWindow;

/// Process-wide constants for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Invocations per (variant, operation), `N`.
    pub iteration_count: usize,
    /// Fraction of the lowest and of the highest samples discarded, `f`.
    pub ignore_fraction: f64,
    /// Width of the acceptance band in IQRs, `k`.
    pub iqr_multiplier: f64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            iteration_count: default_iterations(),
            ignore_fraction: default_ignore_fraction(),
            iqr_multiplier: default_iqr_multiplier(),
        }
    }
}

impl BenchmarkConfig {
    /// Build and validate a configuration.
    pub fn new(
        iteration_count: usize,
        ignore_fraction: f64,
        iqr_multiplier: f64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            iteration_count,
            ignore_fraction,
            iqr_multiplier,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a trim window.
    ///
    /// Must pass before any operation is timed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iteration_count == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        validate_trim_parameters(self.ignore_fraction, self.iqr_multiplier)?;
        self.window().map(|_| ())
    }

    /// Trim window for `iteration_count` samples.
    pub fn window(&self) -> Result<TrimWindow, ConfigError> {
        TrimWindow::new(self.iteration_count, self.ignore_fraction)
    }
}

/// Check `f` and `k` independently of any sample count.
pub(crate) fn validate_trim_parameters(
    ignore_fraction: f64,
    iqr_multiplier: f64,
) -> Result<(), ConfigError> {
    if !ignore_fraction.is_finite() || !(0.0..0.5).contains(&ignore_fraction) {
        return Err(ConfigError::InvalidIgnoreFraction(ignore_fraction));
    }
    if !iqr_multiplier.is_finite() || iqr_multiplier < 0.0 {
        return Err(ConfigError::InvalidIqrMultiplier(iqr_multiplier));
    }
    Ok(())
}

/// A complete sweep description loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepFile {
    pub benchmark: BenchmarkSection,
    #[serde(default)]
    pub output: OutputConfig,
    /// Variants to run, in report order.
    pub variants: Vec<VariantSpec>,
}

impl SweepFile {
    /// Load a sweep from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed.
    /// Semantic validation happens later in [`SweepFile::benchmark_config`]
    /// and friends, so a file can be loaded and then overridden.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pqbench_harness::config::SweepFile;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let sweep = SweepFile::from_file("kem.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read sweep file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("Invalid sweep file: {}", path.display()))
    }

    /// Parse a sweep from a TOML string
    ///
    /// # Example
    ///
    /// ```
    /// use pqbench_harness::config::SweepFile;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let toml = r#"
    ///     [benchmark]
    ///     name = "Curves"
    ///     provider = "rustcrypto"
    ///
    ///     [[variants]]
    ///     name = "prime256v1"
    /// "#;
    /// let sweep = SweepFile::from_str(toml)?;
    /// assert_eq!(sweep.benchmark.iterations, 50);
    /// # Ok(())
    /// # }
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s)
            .context("Failed to parse TOML sweep configuration")
    }

    /// Render back to TOML, used by `pqbench validate --print`.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self)
            .context("Failed to serialize sweep configuration")
    }

    /// Validated trimming constants.
    pub fn benchmark_config(&self) -> Result<BenchmarkConfig, ConfigError> {
        BenchmarkConfig::new(
            self.benchmark.iterations,
            self.benchmark.ignore_fraction,
            self.benchmark.iqr_multiplier,
        )
    }

    /// Unit the sweep reports in.
    pub fn unit(&self) -> Result<Unit, ConfigError> {
        match self.benchmark.unit {
            UnitName::Microseconds => Ok(Unit::Microseconds),
            UnitName::Cycles => Unit::cycles(self.benchmark.cpu_frequency_hz),
        }
    }

    /// Variants with their requested operations. `None` means every
    /// operation the provider supports for that variant.
    pub fn variant_plan(&self) -> Vec<(Variant, Option<Vec<OperationKind>>)> {
        self.variants
            .iter()
            .map(|spec| (spec.variant(), spec.operations.clone()))
            .collect()
    }

    /// Run-wide checks that do not need a provider.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.benchmark_config()?;
        self.unit()?;
        if self.variants.is_empty() {
            return Err(ConfigError::EmptySweep);
        }
        if self
            .variants
            .iter()
            .any(|v| matches!(&v.operations, Some(ops) if ops.is_empty()))
        {
            return Err(ConfigError::EmptySweep);
        }
        Ok(())
    }
}

/// `[benchmark]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSection {
    /// Name of the sweep, used as the report title
    pub name: String,
    /// Invocations per (variant, operation) (default: 50)
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Head/tail trim fraction (default: 0.2)
    #[serde(default = "default_ignore_fraction")]
    pub ignore_fraction: f64,
    /// IQR band multiplier (default: 1.5)
    #[serde(default = "default_iqr_multiplier")]
    pub iqr_multiplier: f64,
    #[serde(default)]
    pub clock: ClockSource,
    #[serde(default)]
    pub unit: UnitName,
    /// Assumed CPU frequency for cycle units (default: 2.4 GHz)
    #[serde(default = "default_cpu_frequency")]
    pub cpu_frequency_hz: f64,
    /// Provider name: `rustcrypto`, `openssl` or `oqs`
    pub provider: String,
    /// File whose contents are signed and verified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_file: Option<PathBuf>,
    /// Size of the generated message when no file is given (default: 4096)
    #[serde(default = "default_message_size")]
    pub message_size: usize,
}

fn default_iterations() -> usize {
    50
}

fn default_ignore_fraction() -> f64 {
    0.2
}

fn default_iqr_multiplier() -> f64 {
    1.5
}

fn default_cpu_frequency() -> f64 {
    DEFAULT_CPU_FREQUENCY_HZ
}

fn default_message_size() -> usize {
    4096
}

/// Unit name as written in TOML. The frequency is a sibling field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitName {
    #[default]
    Microseconds,
    Cycles,
}

impl std::str::FromStr for UnitName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "microseconds" | "us" => Ok(UnitName::Microseconds),
            "cycles" => Ok(UnitName::Cycles),
            other => Err(ConfigError::UnknownUnit(other.to_string())),
        }
    }
}

/// `[output]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory charts and file reports are written to (default: ".")
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    /// Emit one SVG chart per (variant, operation) (default: true)
    #[serde(default = "default_charts")]
    pub charts: bool,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            charts: default_charts(),
            format: OutputFormat::default(),
        }
    }
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_charts() -> bool {
    true
}

/// One `[[variants]]` entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    /// Operations to time, in order. Omitted means all supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<OperationKind>>,
}

impl VariantSpec {
    pub fn variant(&self) -> Variant {
        match &self.parameter {
            Some(param) => Variant::with_parameter(self.name.clone(), param.clone()),
            None => Variant::new(self.name.clone()),
        }
    }
}
