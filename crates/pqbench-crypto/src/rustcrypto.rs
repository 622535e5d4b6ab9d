//! Pure-Rust NIST curve provider
//!
//! ECDSA over SHA-256 message digests with DER-encoded signatures, and
//! ephemeral-static ECDH framed as a KEM: the ciphertext is the sender's
//! uncompressed ephemeral public key.

use pqbench_harness::{
    CryptoProvider, Encapsulation, KeySizes, OperationKind, ProviderError, Variant,
};
use sha2::{Digest, Sha256};

use crate::normalize;

macro_rules! nist_curve {
    ($module:ident, $krate:ident) => {
        mod $module {
            use super::{Encapsulation, KeySizes, ProviderError};
            use rand_core::OsRng;
            use $krate::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
            use $krate::ecdsa::{Signature, SigningKey, VerifyingKey};
            use $krate::elliptic_curve::sec1::ToEncodedPoint;
            use $krate::{ecdh, PublicKey};

            pub(super) fn generate() -> SigningKey {
                SigningKey::random(&mut OsRng)
            }

            pub(super) fn sign(key: &SigningKey, digest: &[u8]) -> Result<Vec<u8>, ProviderError> {
                let signature: Signature = key
                    .sign_prehash(digest)
                    .map_err(|e| ProviderError::Signing(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }

            /// Malformed DER counts as a rejected signature.
            pub(super) fn verify(key: &SigningKey, digest: &[u8], der: &[u8]) -> bool {
                let verifying_key: &VerifyingKey = key.verifying_key();
                match Signature::from_der(der) {
                    Ok(sig) => verifying_key.verify_prehash(digest, &sig).is_ok(),
                    Err(_) => false,
                }
            }

            pub(super) fn encapsulate(key: &SigningKey) -> Encapsulation {
                let recipient = PublicKey::from(key.verifying_key());
                let ephemeral = ecdh::EphemeralSecret::random(&mut OsRng);
                let shared = ephemeral.diffie_hellman(&recipient);

                Encapsulation {
                    ciphertext: ephemeral
                        .public_key()
                        .to_encoded_point(false)
                        .as_bytes()
                        .to_vec(),
                    shared_secret: shared.raw_secret_bytes().to_vec(),
                }
            }

            pub(super) fn decapsulate(
                key: &SigningKey,
                ciphertext: &[u8],
            ) -> Result<Vec<u8>, ProviderError> {
                let sender = PublicKey::from_sec1_bytes(ciphertext)
                    .map_err(|e| ProviderError::Decapsulation(e.to_string()))?;
                let shared = ecdh::diffie_hellman(key.as_nonzero_scalar(), sender.as_affine());
                Ok(shared.raw_secret_bytes().to_vec())
            }

            /// Uncompressed SEC1 public point and raw scalar.
            pub(super) fn key_sizes(key: &SigningKey) -> KeySizes {
                KeySizes {
                    public_key_bytes: key.verifying_key().to_encoded_point(false).len(),
                    secret_key_bytes: key.to_bytes().len(),
                }
            }
        }
    };
}

nist_curve!(nist_p256, p256);
nist_curve!(nist_p384, p384);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Curve {
    P256,
    P384,
}

impl Curve {
    fn from_variant(variant: &Variant) -> Option<Self> {
        match normalize(&variant.label()).as_str() {
            "prime256v1" | "secp256r1" | "p256" | "nistp256" => Some(Curve::P256),
            "secp384r1" | "p384" | "nistp384" => Some(Curve::P384),
            _ => None,
        }
    }
}

/// Key pair for one of the supported curves.
pub enum EcKeyPair {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
}

/// prime256v1 and secp384r1 via the RustCrypto `p256` / `p384` crates.
#[derive(Debug, Default)]
pub struct RustCryptoProvider {
    _private: (),
}

impl RustCryptoProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CryptoProvider for RustCryptoProvider {
    type KeyPair = EcKeyPair;

    fn name(&self) -> &str {
        "rustcrypto"
    }

    fn supported_operations(&self, variant: &Variant) -> Result<Vec<OperationKind>, ProviderError> {
        Curve::from_variant(variant)
            .map(|_| OperationKind::ALL.to_vec())
            .ok_or_else(|| ProviderError::UnsupportedVariant(variant.label()))
    }

    fn generate_key_pair(&self, variant: &Variant) -> Result<EcKeyPair, ProviderError> {
        match Curve::from_variant(variant) {
            Some(Curve::P256) => Ok(EcKeyPair::P256(nist_p256::generate())),
            Some(Curve::P384) => Ok(EcKeyPair::P384(nist_p384::generate())),
            None => Err(ProviderError::UnsupportedVariant(variant.label())),
        }
    }

    fn encapsulate(&self, key: &EcKeyPair) -> Result<Encapsulation, ProviderError> {
        Ok(match key {
            EcKeyPair::P256(k) => nist_p256::encapsulate(k),
            EcKeyPair::P384(k) => nist_p384::encapsulate(k),
        })
    }

    fn decapsulate(&self, key: &EcKeyPair, ciphertext: &[u8]) -> Result<Vec<u8>, ProviderError> {
        match key {
            EcKeyPair::P256(k) => nist_p256::decapsulate(k, ciphertext),
            EcKeyPair::P384(k) => nist_p384::decapsulate(k, ciphertext),
        }
    }

    fn sign(&self, key: &EcKeyPair, message: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let digest = Sha256::digest(message);
        match key {
            EcKeyPair::P256(k) => nist_p256::sign(k, &digest),
            EcKeyPair::P384(k) => nist_p384::sign(k, &digest),
        }
    }

    fn verify(
        &self,
        key: &EcKeyPair,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, ProviderError> {
        let digest = Sha256::digest(message);
        Ok(match key {
            EcKeyPair::P256(k) => nist_p256::verify(k, &digest, signature),
            EcKeyPair::P384(k) => nist_p384::verify(k, &digest, signature),
        })
    }

    fn key_sizes(&self, key: &EcKeyPair) -> Result<KeySizes, ProviderError> {
        Ok(match key {
            EcKeyPair::P256(k) => nist_p256::key_sizes(k),
            EcKeyPair::P384(k) => nist_p384::key_sizes(k),
        })
    }
}
