//! Error taxonomy for benchmark runs.
//!
//! Three failure classes are distinguished:
//!
//! - [`ConfigError`]: rejected before any operation is timed.
//! - [`ProviderError`]: the external cryptography call failed or returned an
//!   invalid result. Wrapped in [`BenchError::Provider`] it aborts the sweep.
//! - [`StatsError`]: the statistics engine could not produce a summary for
//!   one (variant, operation). Reported per operation, the sweep continues.

use thiserror::Error;

use crate::provider::OperationKind;

/// Invalid benchmark configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("iteration count must be at least 1")]
    ZeroIterations,

    #[error("ignore fraction must be finite and in [0, 0.5), got {0}")]
    InvalidIgnoreFraction(f64),

    #[error("IQR multiplier must be finite and non-negative, got {0}")]
    InvalidIqrMultiplier(f64),

    #[error(
        "{iterations} iterations with ignore fraction {ignore_fraction} leave no samples after trimming"
    )]
    NoEffectiveSamples {
        iterations: usize,
        ignore_fraction: f64,
    },

    #[error("CPU frequency for cycle units must be finite and positive, got {0}")]
    InvalidCpuFrequency(f64),

    #[error("clock source '{0}' is not available on this platform")]
    ClockUnavailable(&'static str),

    #[error("unknown clock source '{0}'")]
    UnknownClock(String),

    #[error("unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("unknown output format '{0}'")]
    UnknownFormat(String),

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("variant '{variant}' is not supported by provider '{provider}'")]
    UnsupportedVariant {
        provider: String,
        variant: String,
    },

    #[error("operation '{operation}' is not supported for variant '{variant}'")]
    UnsupportedOperation {
        variant: String,
        operation: OperationKind,
    },

    #[error("sweep has no (variant, operation) pairs to run")]
    EmptySweep,
}

/// Failure reported by a cryptography provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("variant '{0}' is not supported")]
    UnsupportedVariant(String),

    #[error("operation '{operation}' is not supported for variant '{variant}'")]
    UnsupportedOperation {
        variant: String,
        operation: OperationKind,
    },

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("encapsulation failed: {0}")]
    Encapsulation(String),

    #[error("decapsulation failed: {0}")]
    Decapsulation(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("verification failed: {0}")]
    Verification(String),

    #[error("signature was rejected by the verifier")]
    SignatureRejected,

    #[error("decapsulated shared secret does not match the encapsulated secret")]
    SharedSecretMismatch,

    #[error("provider backend error: {0}")]
    Backend(String),
}

/// Failure of the trimmed statistics engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error(
        "no valid samples remained after trimming ({effective_count} samples in the trim window)"
    )]
    InsufficientValidSamples {
        effective_count: usize,
    },

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

/// A clock read failed part way through a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("reading the {0} clock failed")]
    ReadFailed(&'static str),
}

/// Failure emitting a report or chart.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to format report: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sweep-level error.
///
/// Every variant is fatal to the sweep that produced it.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("{variant}/{operation}: iteration {iteration} failed: {source}")]
    Provider {
        variant: String,
        operation: OperationKind,
        /// 1-based run index.
        iteration: usize,
        #[source]
        source: ProviderError,
    },

    #[error(
        "{variant}/{operation}: setup before the first iteration failed: {source}"
    )]
    ProviderSetup {
        variant: String,
        operation: OperationKind,
        #[source]
        source: ProviderError,
    },

    #[error(
        "{variant}/{operation}: iteration {iteration} could not be timed: {source}"
    )]
    Clock {
        variant: String,
        operation: OperationKind,
        iteration: usize,
        #[source]
        source: ClockError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),
}
