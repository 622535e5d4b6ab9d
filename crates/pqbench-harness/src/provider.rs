//! The cryptography provider seam.
//!
//! The harness never implements a primitive itself. Everything it times goes
//! through [`CryptoProvider`]; concrete providers live in `pqbench-crypto`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ProviderError};

/// Algorithm configuration under benchmark, e.g. `prime256v1`, `RSA-2048`
/// or `kyber768`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    /// Algorithm or parameter-set name.
    pub name: String,
    /// Optional parameter such as a key size (`RSA` + `2048`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl Variant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter: None,
        }
    }

    pub fn with_parameter(name: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter: Some(parameter.into()),
        }
    }

    /// Name and parameter joined with `-`. Providers match on this.
    pub fn label(&self) -> String {
        match &self.parameter {
            Some(param) => format!("{}-{}", self.name, param),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameter {
            Some(param) => write!(f, "{}-{}", self.name, param),
            None => f.write_str(&self.name),
        }
    }
}

impl From<&str> for Variant {
    fn from(name: &str) -> Self {
        Variant::new(name)
    }
}

/// An operation the harness can time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    #[serde(rename = "keygen")]
    KeyGen,
    Encapsulate,
    Decapsulate,
    Sign,
    Verify,
}

impl OperationKind {
    /// Canonical order used when a sweep runs "every supported operation".
    pub const ALL: [OperationKind; 5] = [
        OperationKind::KeyGen,
        OperationKind::Encapsulate,
        OperationKind::Decapsulate,
        OperationKind::Sign,
        OperationKind::Verify,
    ];

    pub const KEM: [OperationKind; 3] = [
        OperationKind::KeyGen,
        OperationKind::Encapsulate,
        OperationKind::Decapsulate,
    ];

    pub const SIGNATURE: [OperationKind; 3] = [
        OperationKind::KeyGen,
        OperationKind::Sign,
        OperationKind::Verify,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::KeyGen => "keygen",
            OperationKind::Encapsulate => "encapsulate",
            OperationKind::Decapsulate => "decapsulate",
            OperationKind::Sign => "sign",
            OperationKind::Verify => "verify",
        }
    }

    /// Heading used in report text and chart titles.
    pub fn title(&self) -> &'static str {
        match self {
            OperationKind::KeyGen => "Key Generation",
            OperationKind::Encapsulate => "Encapsulation",
            OperationKind::Decapsulate => "Decapsulation",
            OperationKind::Sign => "Signing",
            OperationKind::Verify => "Verifying",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keygen" | "key_gen" | "key-gen" => Ok(OperationKind::KeyGen),
            "encapsulate" | "encaps" | "encapsulation" => Ok(OperationKind::Encapsulate),
            "decapsulate" | "decaps" | "decapsulation" => Ok(OperationKind::Decapsulate),
            "sign" | "signing" => Ok(OperationKind::Sign),
            "verify" | "verifying" => Ok(OperationKind::Verify),
            _ => Err(ConfigError::UnknownOperation(s.to_string())),
        }
    }
}

/// Output of a KEM encapsulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encapsulation {
    pub ciphertext: Vec<u8>,
    pub shared_secret: Vec<u8>,
}

/// Encoded sizes of a generated key pair, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySizes {
    pub public_key_bytes: usize,
    pub secret_key_bytes: usize,
}

/// External cryptography provider.
///
/// Every call is synchronous. Any `Err`, and a `verify` returning `false`,
/// is treated by the harness as fatal to the run.
pub trait CryptoProvider {
    /// Provider-owned key pair. Carries its own variant.
    type KeyPair;

    /// Short provider name (`rustcrypto`, `openssl`, `oqs`).
    fn name(&self) -> &str;

    /// Operations this provider can run for `variant`, in canonical order.
    ///
    /// Returns [`ProviderError::UnsupportedVariant`] for unknown variants.
    fn supported_operations(&self, variant: &Variant) -> Result<Vec<OperationKind>, ProviderError>;

    fn generate_key_pair(&self, variant: &Variant) -> Result<Self::KeyPair, ProviderError>;

    fn encapsulate(&self, key: &Self::KeyPair) -> Result<Encapsulation, ProviderError>;

    fn decapsulate(
        &self,
        key: &Self::KeyPair,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, ProviderError>;

    fn sign(&self, key: &Self::KeyPair, message: &[u8]) -> Result<Vec<u8>, ProviderError>;

    fn verify(
        &self,
        key: &Self::KeyPair,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, ProviderError>;

    fn key_sizes(&self, key: &Self::KeyPair) -> Result<KeySizes, ProviderError>;
}

impl<P: CryptoProvider + ?Sized> CryptoProvider for &P {
    type KeyPair = P::KeyPair;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn supported_operations(&self, variant: &Variant) -> Result<Vec<OperationKind>, ProviderError> {
        (**self).supported_operations(variant)
    }

    fn generate_key_pair(&self, variant: &Variant) -> Result<Self::KeyPair, ProviderError> {
        (**self).generate_key_pair(variant)
    }

    fn encapsulate(&self, key: &Self::KeyPair) -> Result<Encapsulation, ProviderError> {
        (**self).encapsulate(key)
    }

    fn decapsulate(
        &self,
        key: &Self::KeyPair,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, ProviderError> {
        (**self).decapsulate(key, ciphertext)
    }

    fn sign(&self, key: &Self::KeyPair, message: &[u8]) -> Result<Vec<u8>, ProviderError> {
        (**self).sign(key, message)
    }

    fn verify(
        &self,
        key: &Self::KeyPair,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, ProviderError> {
        (**self).verify(key, message, signature)
    }

    fn key_sizes(&self, key: &Self::KeyPair) -> Result<KeySizes, ProviderError> {
        (**self).key_sizes(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_label() {
        assert_eq!(Variant::new("prime256v1").label(), "prime256v1");
        assert_eq!(Variant::with_parameter("RSA", "2048").label(), "RSA-2048");
        assert_eq!(
            Variant::with_parameter("RSA", "4096").to_string(),
            "RSA-4096"
        );
    }

    #[test]
    fn test_operation_parsing_accepts_report_names() {
        assert_eq!(
            "keygen".parse::<OperationKind>().unwrap(),
            OperationKind::KeyGen
        );
        assert_eq!(
            "encapsulation".parse::<OperationKind>().unwrap(),
            OperationKind::Encapsulate
        );
        assert_eq!(
            "Verifying".parse::<OperationKind>().unwrap(),
            OperationKind::Verify
        );
        assert!("derive".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_operation_serde_names() {
        let json = serde_json::to_string(&[OperationKind::KeyGen, OperationKind::Decapsulate])
            .unwrap();
        assert_eq!(json, r#"["keygen","decapsulate"]"#);
    }

    #[test]
    fn test_canonical_order() {
        let mut shuffled = vec![
            OperationKind::Verify,
            OperationKind::KeyGen,
            OperationKind::Sign,
        ];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![
                OperationKind::KeyGen,
                OperationKind::Sign,
                OperationKind::Verify,
            ]
        );
    }
}
