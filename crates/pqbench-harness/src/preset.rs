//! Built-in sweeps
//!
//! Each preset is a ready-made [`SweepFile`] covering one algorithm family.
//! Time presets use the process CPU clock and microseconds; cycle presets use
//! the monotonic clock converted at the assumed CPU frequency.

use std::fmt;
use std::str::FromStr;

use crate::clock::ClockSource;
use crate::config::{BenchmarkSection, OutputConfig, SweepFile, UnitName, VariantSpec};
use crate::error::ConfigError;
use crate::provider::OperationKind;
use crate::samples::DEFAULT_CPU_FREQUENCY_HZ;

const CURVES: [&str; 3] = ["prime256v1", "secp384r1", "secp521r1"];
const RSA_BITS: [&str; 3] = ["2048", "3072", "4096"];
const KYBER: [&str; 3] = ["kyber512", "kyber768", "kyber1024"];
const PQ_SIGNATURES: [&str; 9] = [
    "dilithium2",
    "dilithium3",
    "dilithium5",
    "falcon512",
    "falcon1024",
    "sphincssha2128fsimple",
    "sphincssha2128ssimple",
    "sphincssha2192fsimple",
    "sphincsshake128fsimple",
];

/// How a preset measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitMode {
    /// Process CPU time in microseconds.
    #[default]
    Time,
    /// Monotonic time converted to cycles.
    Cycles,
}

impl FromStr for UnitMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" | "microseconds" | "us" => Ok(UnitMode::Time),
            "cycles" => Ok(UnitMode::Cycles),
            other => Err(ConfigError::UnknownUnit(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Classical key-exchange key generation (EC curves).
    KexClassical,
    /// Kyber key generation, encapsulation and decapsulation.
    KexPq,
    /// RSA and EC signature key generation.
    SigClassical,
    /// Post-quantum signature key generation.
    SigPqKeygen,
    /// Post-quantum signing and verification.
    SigPq,
    /// Pure-Rust ECDSA keygen, sign and verify.
    Ecdsa,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::KexClassical,
        Preset::KexPq,
        Preset::SigClassical,
        Preset::SigPqKeygen,
        Preset::SigPq,
        Preset::Ecdsa,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::KexClassical => "kex-classical",
            Preset::KexPq => "kex-pq",
            Preset::SigClassical => "sig-classical",
            Preset::SigPqKeygen => "sig-pq-keygen",
            Preset::SigPq => "sig-pq",
            Preset::Ecdsa => "ecdsa",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Preset::KexClassical => "EC key generation for key exchange (OpenSSL)",
            Preset::KexPq => "Kyber keygen / encapsulate / decapsulate (liboqs)",
            Preset::SigClassical => "RSA and EC signature key generation (OpenSSL)",
            Preset::SigPqKeygen => "Dilithium, Falcon and SPHINCS+ key generation (liboqs)",
            Preset::SigPq => "Dilithium, Falcon and SPHINCS+ sign / verify (liboqs)",
            Preset::Ecdsa => "P-256 and P-384 ECDSA keygen / sign / verify (RustCrypto)",
        }
    }

    /// Provider the preset's variants are named for.
    pub fn provider(&self) -> &'static str {
        match self {
            Preset::KexClassical | Preset::SigClassical => "openssl",
            Preset::KexPq | Preset::SigPqKeygen | Preset::SigPq => "oqs",
            Preset::Ecdsa => "rustcrypto",
        }
    }

    /// Iterations per (variant, operation).
    pub fn iterations(&self, mode: UnitMode) -> usize {
        match (self, mode) {
            (Preset::KexClassical | Preset::KexPq, _) => 50,
            (Preset::SigPqKeygen, UnitMode::Cycles) => 60,
            (_, UnitMode::Cycles) => 50,
            (_, UnitMode::Time) => 350,
        }
    }

    fn variants(&self) -> Vec<VariantSpec> {
        let keygen = Some(vec![OperationKind::KeyGen]);
        let named = |names: &[&str], ops: &Option<Vec<OperationKind>>| -> Vec<VariantSpec> {
            names
                .iter()
                .map(|name| VariantSpec {
                    name: (*name).to_string(),
                    parameter: None,
                    operations: ops.clone(),
                })
                .collect()
        };

        match self {
            Preset::KexClassical => named(&CURVES, &keygen),
            Preset::KexPq => named(&KYBER, &Some(OperationKind::KEM.to_vec())),
            Preset::SigClassical => {
                let mut specs: Vec<VariantSpec> = RSA_BITS
                    .iter()
                    .map(|bits| VariantSpec {
                        name: "RSA".to_string(),
                        parameter: Some((*bits).to_string()),
                        operations: keygen.clone(),
                    })
                    .collect();
                specs.extend(named(&CURVES, &keygen));
                specs
            }
            Preset::SigPqKeygen => named(&PQ_SIGNATURES, &keygen),
            Preset::SigPq => named(
                &PQ_SIGNATURES,
                &Some(vec![OperationKind::Sign, OperationKind::Verify]),
            ),
            Preset::Ecdsa => named(&CURVES[..2], &Some(OperationKind::SIGNATURE.to_vec())),
        }
    }

    /// Expand into a sweep description.
    pub fn build(&self, mode: UnitMode) -> SweepFile {
        let (clock, unit, suffix) = match mode {
            UnitMode::Time => (ClockSource::ProcessCpu, UnitName::Microseconds, "time"),
            UnitMode::Cycles => (ClockSource::Monotonic, UnitName::Cycles, "cycles"),
        };

        SweepFile {
            benchmark: BenchmarkSection {
                name: format!("{} ({})", self.name(), suffix),
                iterations: self.iterations(mode),
                ignore_fraction: 0.2,
                iqr_multiplier: 1.5,
                clock,
                unit,
                cpu_frequency_hz: DEFAULT_CPU_FREQUENCY_HZ,
                provider: self.provider().to_string(),
                message_file: None,
                message_size: 4096,
            },
            output: OutputConfig::default(),
            variants: self.variants(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}
