//! liboqs provider
//!
//! Post-quantum KEMs and signature schemes from the Open Quantum Safe
//! library. Parameter sets compiled out of the linked liboqs are skipped at
//! load time and reported as unsupported.

use oqs::{kem, sig};
use tracing::{debug, warn};

use pqbench_harness::{
    CryptoProvider, Encapsulation, KeySizes, OperationKind, ProviderError, Variant,
};

use crate::normalize;

const KEMS: [(&str, kem::Algorithm); 6] = [
    ("kyber512", kem::Algorithm::Kyber512),
    ("kyber768", kem::Algorithm::Kyber768),
    ("kyber1024", kem::Algorithm::Kyber1024),
    ("mlkem512", kem::Algorithm::MlKem512),
    ("mlkem768", kem::Algorithm::MlKem768),
    ("mlkem1024", kem::Algorithm::MlKem1024),
];

const SIGNATURES: [(&str, sig::Algorithm); 9] = [
    ("dilithium2", sig::Algorithm::Dilithium2),
    ("dilithium3", sig::Algorithm::Dilithium3),
    ("dilithium5", sig::Algorithm::Dilithium5),
    ("falcon512", sig::Algorithm::Falcon512),
    ("falcon1024", sig::Algorithm::Falcon1024),
    (
        "sphincssha2128fsimple",
        sig::Algorithm::SphincsSha2128fSimple,
    ),
    (
        "sphincssha2128ssimple",
        sig::Algorithm::SphincsSha2128sSimple,
    ),
    (
        "sphincssha2192fsimple",
        sig::Algorithm::SphincsSha2192fSimple,
    ),
    (
        "sphincsshake128fsimple",
        sig::Algorithm::SphincsShake128fSimple,
    ),
];

pub enum OqsKeyPair {
    Kem {
        index: usize,
        public: kem::PublicKey,
        secret: kem::SecretKey,
    },
    Signature {
        index: usize,
        public: sig::PublicKey,
        secret: sig::SecretKey,
    },
}

enum Scheme {
    Kem(usize),
    Signature(usize),
}

/// Provider backed by liboqs.
///
/// Scheme instances are created once in [`OqsProvider::load`] and reused for
/// every call.
pub struct OqsProvider {
    kems: Vec<(&'static str, kem::Kem)>,
    signatures: Vec<(&'static str, sig::Sig)>,
}

impl OqsProvider {
    pub fn load() -> Result<Self, ProviderError> {
        oqs::init();

        let mut kems = Vec::with_capacity(KEMS.len());
        for (name, algorithm) in KEMS {
            match kem::Kem::new(algorithm) {
                Ok(instance) => kems.push((name, instance)),
                Err(e) => warn!(algorithm = name, "KEM not available in liboqs: {}", e),
            }
        }

        let mut signatures = Vec::with_capacity(SIGNATURES.len());
        for (name, algorithm) in SIGNATURES {
            match sig::Sig::new(algorithm) {
                Ok(instance) => signatures.push((name, instance)),
                Err(e) => warn!(
                    algorithm = name,
                    "signature scheme not available in liboqs: {}",
                    e
                ),
            }
        }

        if kems.is_empty() && signatures.is_empty() {
            return Err(ProviderError::Backend(
                "liboqs exposes none of the benchmarked schemes".to_string(),
            ));
        }

        debug!(
            kems = kems.len(),
            signatures = signatures.len(),
            "liboqs provider loaded"
        );
        Ok(Self { kems, signatures })
    }

    fn scheme(&self, variant: &Variant) -> Result<Scheme, ProviderError> {
        let label = normalize(&variant.label());
        if let Some(index) = self.kems.iter().position(|(name, _)| *name == label) {
            return Ok(Scheme::Kem(index));
        }
        if let Some(index) = self.signatures.iter().position(|(name, _)| *name == label) {
            return Ok(Scheme::Signature(index));
        }
        Err(ProviderError::UnsupportedVariant(variant.label()))
    }

    fn kem<'a>(
        &'a self,
        key: &'a OqsKeyPair,
        operation: OperationKind,
    ) -> Result<(&'a kem::Kem, &'a kem::PublicKey, &'a kem::SecretKey), ProviderError> {
        match key {
            OqsKeyPair::Kem {
                index,
                public,
                secret,
            } => Ok((&self.kems[*index].1, public, secret)),
            OqsKeyPair::Signature { index, .. } => Err(ProviderError::UnsupportedOperation {
                variant: self.signatures[*index].0.to_string(),
                operation,
            }),
        }
    }

    fn sig<'a>(
        &'a self,
        key: &'a OqsKeyPair,
        operation: OperationKind,
    ) -> Result<(&'a sig::Sig, &'a sig::PublicKey, &'a sig::SecretKey), ProviderError> {
        match key {
            OqsKeyPair::Signature {
                index,
                public,
                secret,
            } => Ok((&self.signatures[*index].1, public, secret)),
            OqsKeyPair::Kem { index, .. } => Err(ProviderError::UnsupportedOperation {
                variant: self.kems[*index].0.to_string(),
                operation,
            }),
        }
    }
}

impl CryptoProvider for OqsProvider {
    type KeyPair = OqsKeyPair;

    fn name(&self) -> &str {
        "oqs"
    }

    fn supported_operations(&self, variant: &Variant) -> Result<Vec<OperationKind>, ProviderError> {
        Ok(match self.scheme(variant)? {
            Scheme::Kem(_) => OperationKind::KEM.to_vec(),
            Scheme::Signature(_) => OperationKind::SIGNATURE.to_vec(),
        })
    }

    fn generate_key_pair(&self, variant: &Variant) -> Result<OqsKeyPair, ProviderError> {
        let keygen = |e: oqs::Error| ProviderError::KeyGeneration(e.to_string());

        match self.scheme(variant)? {
            Scheme::Kem(index) => {
                let (public, secret) = self.kems[index].1.keypair().map_err(keygen)?;
                Ok(OqsKeyPair::Kem {
                    index,
                    public,
                    secret,
                })
            }
            Scheme::Signature(index) => {
                let (public, secret) = self.signatures[index].1.keypair().map_err(keygen)?;
                Ok(OqsKeyPair::Signature {
                    index,
                    public,
                    secret,
                })
            }
        }
    }

    fn encapsulate(&self, key: &OqsKeyPair) -> Result<Encapsulation, ProviderError> {
        let (kem, public, _) = self.kem(key, OperationKind::Encapsulate)?;
        let (ciphertext, shared_secret) = kem
            .encapsulate(public)
            .map_err(|e| ProviderError::Encapsulation(e.to_string()))?;

        Ok(Encapsulation {
            ciphertext: ciphertext.into_vec(),
            shared_secret: shared_secret.into_vec(),
        })
    }

    fn decapsulate(&self, key: &OqsKeyPair, ciphertext: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let (kem, _, secret) = self.kem(key, OperationKind::Decapsulate)?;
        let ciphertext = kem.ciphertext_from_bytes(ciphertext).ok_or_else(|| {
            ProviderError::Decapsulation(format!(
                "ciphertext is {} bytes, expected {}",
                ciphertext.len(),
                kem.length_ciphertext()
            ))
        })?;

        let shared_secret = kem
            .decapsulate(secret, ciphertext)
            .map_err(|e| ProviderError::Decapsulation(e.to_string()))?;
        Ok(shared_secret.into_vec())
    }

    fn sign(&self, key: &OqsKeyPair, message: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let (scheme, _, secret) = self.sig(key, OperationKind::Sign)?;
        let signature = scheme
            .sign(message, secret)
            .map_err(|e| ProviderError::Signing(e.to_string()))?;
        Ok(signature.into_vec())
    }

    fn verify(
        &self,
        key: &OqsKeyPair,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, ProviderError> {
        let (scheme, public, _) = self.sig(key, OperationKind::Verify)?;
        let Some(signature) = scheme.signature_from_bytes(signature) else {
            return Ok(false);
        };
        // liboqs reports a bad signature and an internal failure the same way
        Ok(scheme.verify(message, signature, public).is_ok())
    }

    fn key_sizes(&self, key: &OqsKeyPair) -> Result<KeySizes, ProviderError> {
        Ok(match key {
            OqsKeyPair::Kem { index, .. } => {
                let kem = &self.kems[*index].1;
                KeySizes {
                    public_key_bytes: kem.length_public_key(),
                    secret_key_bytes: kem.length_secret_key(),
                }
            }
            OqsKeyPair::Signature { index, .. } => {
                let scheme = &self.signatures[*index].1;
                KeySizes {
                    public_key_bytes: scheme.length_public_key(),
                    secret_key_bytes: scheme.length_secret_key(),
                }
            }
        })
    }
}
