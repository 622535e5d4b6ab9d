//! Encoded artifact sizes per variant
//!
//! Generates one key pair per variant and records key, signature and
//! ciphertext sizes. Nothing here is timed.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{BenchError, ConfigError};
use crate::provider::{CryptoProvider, OperationKind, Variant};

/// Sizes in bytes for one variant. Fields that do not apply are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSizes {
    pub variant: String,
    pub public_key_bytes: usize,
    pub secret_key_bytes: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciphertext_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret_bytes: Option<usize>,
}

/// Measure artifact sizes for every variant, in order.
///
/// A signature over `message` is produced for signature-capable variants and
/// one encapsulation for KEM variants. Any provider failure is fatal.
#[instrument(skip_all, fields(provider = provider.name(), variants = variants.len()))]
pub fn measure_sizes<P: CryptoProvider>(
    provider: &P,
    variants: &[Variant],
    message: &[u8],
) -> Result<Vec<ArtifactSizes>, BenchError> {
    let mut out = Vec::with_capacity(variants.len());

    for variant in variants {
        let supported = provider.supported_operations(variant).map_err(|_| {
            ConfigError::UnsupportedVariant {
                provider: provider.name().to_string(),
                variant: variant.label(),
            }
        })?;

        let setup = |op: OperationKind| {
            move |source| BenchError::ProviderSetup {
                variant: variant.label(),
                operation: op,
                source,
            }
        };

        let key = provider
            .generate_key_pair(variant)
            .map_err(setup(OperationKind::KeyGen))?;
        let keys = provider
            .key_sizes(&key)
            .map_err(setup(OperationKind::KeyGen))?;

        let signature_bytes = if supported.contains(&OperationKind::Sign) {
            let signature = provider
                .sign(&key, message)
                .map_err(setup(OperationKind::Sign))?;
            Some(signature.len())
        } else {
            None
        };

        let (ciphertext_bytes, shared_secret_bytes) =
            if supported.contains(&OperationKind::Encapsulate) {
                let encapsulation = provider
                    .encapsulate(&key)
                    .map_err(setup(OperationKind::Encapsulate))?;
                (
                    Some(encapsulation.ciphertext.len()),
                    Some(encapsulation.shared_secret.len()),
                )
            } else {
                (None, None)
            };

        info!(
            variant = %variant,
            public = keys.public_key_bytes,
            secret = keys.secret_key_bytes,
            "sizes measured"
        );

        out.push(ArtifactSizes {
            variant: variant.label(),
            public_key_bytes: keys.public_key_bytes,
            secret_key_bytes: keys.secret_key_bytes,
            signature_bytes,
            ciphertext_bytes,
            shared_secret_bytes,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::{Encapsulation, KeySizes};

    /// `sig-*` variants sign, `kem-*` variants encapsulate.
    struct Fixed;

    impl CryptoProvider for Fixed {
        type KeyPair = String;

        fn name(&self) -> &str {
            "fixed"
        }

        fn supported_operations(
            &self,
            variant: &Variant,
        ) -> Result<Vec<OperationKind>, ProviderError> {
            if variant.name.starts_with("sig") {
                Ok(OperationKind::SIGNATURE.to_vec())
            } else if variant.name.starts_with("kem") {
                Ok(OperationKind::KEM.to_vec())
            } else {
                Err(ProviderError::UnsupportedVariant(variant.label()))
            }
        }

        fn generate_key_pair(&self, variant: &Variant) -> Result<String, ProviderError> {
            Ok(variant.name.clone())
        }

        fn encapsulate(&self, _: &String) -> Result<Encapsulation, ProviderError> {
            Ok(Encapsulation {
                ciphertext: vec![0; 768],
                shared_secret: vec![0; 32],
            })
        }

        fn decapsulate(&self, _: &String, _: &[u8]) -> Result<Vec<u8>, ProviderError> {
            Ok(vec![0; 32])
        }

        fn sign(&self, _: &String, message: &[u8]) -> Result<Vec<u8>, ProviderError> {
            Ok(vec![0; 64 + message.len() % 2])
        }

        fn verify(&self, _: &String, _: &[u8], _: &[u8]) -> Result<bool, ProviderError> {
            Ok(true)
        }

        fn key_sizes(&self, _: &String) -> Result<KeySizes, ProviderError> {
            Ok(KeySizes {
                public_key_bytes: 800,
                secret_key_bytes: 1632,
            })
        }
    }

    #[test]
    fn test_signature_and_kem_sizes() {
        let sizes = measure_sizes(
            &Fixed,
            &[Variant::new("sig-a"), Variant::new("kem-b")],
            b"message!",
        )
        .unwrap();

        assert_eq!(sizes[0].signature_bytes, Some(64));
        assert_eq!(sizes[0].ciphertext_bytes, None);
        assert_eq!(sizes[1].signature_bytes, None);
        assert_eq!(sizes[1].ciphertext_bytes, Some(768));
        assert_eq!(sizes[1].shared_secret_bytes, Some(32));
        assert_eq!(sizes[1].secret_key_bytes, 1632);
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let variants = [Variant::new("rot13")];
        let err = measure_sizes(&Fixed, &variants, b"").unwrap_err();
        assert!(matches!(
            err,
            BenchError::Config(ConfigError::UnsupportedVariant { .. })
        ));
    }
}
