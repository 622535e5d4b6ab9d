//! Timing samples and the units they are reported in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

/// Frequency assumed when converting elapsed time to cycles (2.4 GHz).
pub const DEFAULT_CPU_FREQUENCY_HZ: f64 = 2.4e9;

/// Elapsed duration of a single operation invocation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Sample(Duration);

impl Sample {
    pub fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn from_nanos(nanos: u64) -> Self {
        Self(Duration::from_nanos(nanos))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }
}

/// Samples of one (variant, operation) run, in run order.
///
/// Built by the operation runner and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSequence {
    samples: Vec<Sample>,
}

impl SampleSequence {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Convert every sample to `unit`, keeping run order.
    pub fn to_values(&self, unit: Unit) -> Vec<f64> {
        self.samples.iter().map(|s| unit.convert(*s)).collect()
    }
}

impl From<Vec<Sample>> for SampleSequence {
    fn from(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
}

/// Unit a sweep reports its measurements in.
///
/// A sweep uses exactly one unit; summaries in different units are never
/// combined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Unit {
    /// Elapsed seconds scaled by 1e6.
    #[default]
    Microseconds,
    /// Elapsed nanoseconds scaled by an assumed fixed CPU frequency and
    /// truncated to a whole number. Illustrative only: the real frequency
    /// moves with turbo and throttling.
    Cycles {
        frequency_hz: f64,
    },
}

impl Unit {
    pub fn cycles(frequency_hz: f64) -> Result<Self, ConfigError> {
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            return Err(ConfigError::InvalidCpuFrequency(frequency_hz));
        }
        Ok(Unit::Cycles { frequency_hz })
    }

    pub fn convert(&self, sample: Sample) -> f64 {
        match self {
            Unit::Microseconds => sample.duration().as_secs_f64() * 1e6,
            Unit::Cycles { frequency_hz } => {
                let cycles = sample.duration().as_nanos() as f64 * frequency_hz / 1e9;
                cycles.floor()
            }
        }
    }

    /// Long name used in report text ("microseconds", "cycles").
    pub fn name(&self) -> &'static str {
        match self {
            Unit::Microseconds => "microseconds",
            Unit::Cycles { .. } => "cycles",
        }
    }

    /// Short suffix used in tables and chart axes.
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Microseconds => "us",
            Unit::Cycles { .. } => "cycles",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Microseconds => write!(f, "microseconds"),
            Unit::Cycles { frequency_hz } => write!(f, "cycles @ {:.2} GHz", frequency_hz / 1e9),
        }
    }
}
