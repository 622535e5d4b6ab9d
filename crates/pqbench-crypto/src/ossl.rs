//! OpenSSL provider
//!
//! RSA at any modulus size given as the variant parameter (`RSA-3072`), and
//! the NIST curves prime256v1, secp384r1 and secp521r1. Signatures are over
//! SHA-256. EC variants also support ECDH framed as a KEM. Key sizes are the
//! DER encodings of the private key and SubjectPublicKeyInfo.

use openssl::bn::BigNumContext;
use openssl::derive::Deriver;
use openssl::ec::{EcGroup, EcKey, EcPoint, PointConversionForm};
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{HasPublic, PKey, PKeyRef, Private};
use openssl::rsa::Rsa;
use openssl::sign::{Signer, Verifier};
use tracing::debug;

use pqbench_harness::{
    CryptoProvider, Encapsulation, KeySizes, OperationKind, ProviderError, Variant,
};

use crate::normalize;

const DEFAULT_RSA_BITS: u32 = 2048;
const MIN_RSA_BITS: u32 = 1024;

const CURVES: [(&str, Nid); 3] = [
    ("prime256v1", Nid::X9_62_PRIME256V1),
    ("secp384r1", Nid::SECP384R1),
    ("secp521r1", Nid::SECP521R1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Rsa(u32),
    /// Index into the provider's curve table.
    Ec(usize),
}

pub struct OpenSslKeyPair {
    algorithm: Algorithm,
    key: PKey<Private>,
}

/// Provider backed by the system OpenSSL library.
///
/// Curve groups are built once in [`OpenSslProvider::load`] so key
/// generation does not pay for group construction.
pub struct OpenSslProvider {
    groups: Vec<EcGroup>,
}

impl OpenSslProvider {
    pub fn load() -> Result<Self, ProviderError> {
        openssl::init();
        let groups = CURVES
            .iter()
            .map(|(_, nid)| EcGroup::from_curve_name(*nid))
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;

        debug!(
            version = openssl::version::version(),
            "OpenSSL provider loaded"
        );
        Ok(Self { groups })
    }

    fn algorithm(&self, variant: &Variant) -> Result<Algorithm, ProviderError> {
        let label = normalize(&variant.label());

        if let Some(bits) = label.strip_prefix("rsa") {
            let bits = if bits.is_empty() {
                DEFAULT_RSA_BITS
            } else {
                bits.parse::<u32>()
                    .map_err(|_| ProviderError::UnsupportedVariant(variant.label()))?
            };
            if bits < MIN_RSA_BITS {
                return Err(ProviderError::UnsupportedVariant(variant.label()));
            }
            return Ok(Algorithm::Rsa(bits));
        }

        let alias = match label.as_str() {
            "secp256r1" | "p256" => "prime256v1",
            "p384" => "secp384r1",
            "p521" => "secp521r1",
            other => other,
        };
        CURVES
            .iter()
            .position(|(name, _)| *name == alias)
            .map(Algorithm::Ec)
            .ok_or_else(|| ProviderError::UnsupportedVariant(variant.label()))
    }

    fn group(&self, index: usize) -> Result<&EcGroup, ProviderError> {
        self.groups
            .get(index)
            .ok_or_else(|| ProviderError::Backend(format!("no curve group {index}")))
    }

    fn ec_group(&self, key: &OpenSslKeyPair) -> Result<&EcGroup, ProviderError> {
        match key.algorithm {
            Algorithm::Ec(index) => self.group(index),
            Algorithm::Rsa(bits) => Err(ProviderError::UnsupportedOperation {
                variant: format!("RSA-{bits}"),
                operation: OperationKind::Encapsulate,
            }),
        }
    }
}

fn backend(e: ErrorStack) -> ProviderError {
    ProviderError::Backend(e.to_string())
}

fn derive<T: HasPublic>(own: &PKey<Private>, peer: &PKeyRef<T>) -> Result<Vec<u8>, ErrorStack> {
    let mut deriver = Deriver::new(own)?;
    deriver.set_peer(peer)?;
    deriver.derive_to_vec()
}

fn public_point_bytes(group: &EcGroup, key: &EcKey<Private>) -> Result<Vec<u8>, ErrorStack> {
    let mut ctx = BigNumContext::new()?;
    key.public_key()
        .to_bytes(group, PointConversionForm::UNCOMPRESSED, &mut ctx)
}

impl CryptoProvider for OpenSslProvider {
    type KeyPair = OpenSslKeyPair;

    fn name(&self) -> &str {
        "openssl"
    }

    fn supported_operations(&self, variant: &Variant) -> Result<Vec<OperationKind>, ProviderError> {
        Ok(match self.algorithm(variant)? {
            Algorithm::Rsa(_) => OperationKind::SIGNATURE.to_vec(),
            Algorithm::Ec(_) => OperationKind::ALL.to_vec(),
        })
    }

    fn generate_key_pair(&self, variant: &Variant) -> Result<OpenSslKeyPair, ProviderError> {
        let algorithm = self.algorithm(variant)?;
        let keygen = |e: ErrorStack| ProviderError::KeyGeneration(e.to_string());

        let key = match algorithm {
            Algorithm::Rsa(bits) => Rsa::generate(bits)
                .and_then(PKey::from_rsa)
                .map_err(keygen)?,
            Algorithm::Ec(index) => EcKey::generate(self.group(index)?)
                .and_then(PKey::from_ec_key)
                .map_err(keygen)?,
        };

        Ok(OpenSslKeyPair { algorithm, key })
    }

    fn encapsulate(&self, key: &OpenSslKeyPair) -> Result<Encapsulation, ProviderError> {
        let group = self.ec_group(key)?;
        let failed = |e: ErrorStack| ProviderError::Encapsulation(e.to_string());

        let ephemeral = EcKey::generate(group).map_err(failed)?;
        let ciphertext = public_point_bytes(group, &ephemeral).map_err(failed)?;
        let ephemeral = PKey::from_ec_key(ephemeral).map_err(failed)?;

        let shared_secret = derive(&ephemeral, &key.key).map_err(failed)?;

        Ok(Encapsulation {
            ciphertext,
            shared_secret,
        })
    }

    fn decapsulate(
        &self,
        key: &OpenSslKeyPair,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, ProviderError> {
        let group = self.ec_group(key)?;
        let failed = |e: ErrorStack| ProviderError::Decapsulation(e.to_string());

        let mut ctx = BigNumContext::new().map_err(failed)?;
        let point = EcPoint::from_bytes(group, ciphertext, &mut ctx)
            .map_err(failed)?;
        let sender = EcKey::from_public_key(group, &point)
            .and_then(PKey::from_ec_key)
            .map_err(failed)?;

        derive(&key.key, &sender).map_err(failed)
    }

    fn sign(&self, key: &OpenSslKeyPair, message: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let failed = |e: ErrorStack| ProviderError::Signing(e.to_string());
        let mut signer = Signer::new(MessageDigest::sha256(), &key.key)
            .map_err(failed)?;
        signer.update(message).map_err(failed)?;
        signer.sign_to_vec().map_err(failed)
    }

    fn verify(
        &self,
        key: &OpenSslKeyPair,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, ProviderError> {
        let failed = |e: ErrorStack| ProviderError::Verification(e.to_string());
        let mut verifier = Verifier::new(MessageDigest::sha256(), &key.key)
            .map_err(failed)?;
        verifier.update(message).map_err(failed)?;
        // Malformed signatures count as rejections
        Ok(verifier.verify(signature).unwrap_or(false))
    }

    fn key_sizes(&self, key: &OpenSslKeyPair) -> Result<KeySizes, ProviderError> {
        Ok(KeySizes {
            public_key_bytes: key.key.public_key_to_der().map_err(backend)?.len(),
            secret_key_bytes: key.key.private_key_to_der().map_err(backend)?.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenSslProvider {
        OpenSslProvider::load().unwrap()
    }

    #[test]
    fn test_variant_names() {
        let p = provider();
        let rsa3072 = Variant::with_parameter("RSA", "3072");
        assert_eq!(p.algorithm(&rsa3072).unwrap(), Algorithm::Rsa(3072));
        assert_eq!(p.algorithm(&"rsa".into()).unwrap(), Algorithm::Rsa(2048));
        assert_eq!(p.algorithm(&"secp521r1".into()).unwrap(), Algorithm::Ec(2));
        assert!(p.algorithm(&Variant::new("RSA-512")).is_err());
        assert!(p.algorithm(&Variant::new("ed25519")).is_err());
    }

    #[test]
    fn test_rsa_sign_verify() {
        let p = provider();
        let variant = Variant::with_parameter("RSA", "2048");
        let key = p.generate_key_pair(&variant).unwrap();
        let sig = p.sign(&key, b"document").unwrap();

        assert_eq!(sig.len(), 256);
        assert!(p.verify(&key, b"document", &sig).unwrap());
        assert!(!p.verify(&key, b"other", &sig).unwrap());
    }

    #[test]
    fn test_rsa_has_no_kem_operations() {
        let p = provider();
        let variant = Variant::with_parameter("RSA", "2048");
        assert_eq!(
            p.supported_operations(&variant).unwrap(),
            OperationKind::SIGNATURE.to_vec()
        );

        let key = p.generate_key_pair(&variant).unwrap();
        assert!(p.encapsulate(&key).is_err());
    }

    #[test]
    fn test_ecdh_round_trip() {
        let p = provider();
        for name in ["prime256v1", "secp384r1", "secp521r1"] {
            let key = p.generate_key_pair(&Variant::new(name)).unwrap();
            let enc = p.encapsulate(&key).unwrap();
            assert_eq!(
                p.decapsulate(&key, &enc.ciphertext).unwrap(),
                enc.shared_secret
            );
        }
    }

    #[test]
    fn test_ec_der_sizes() {
        let p = provider();
        let key = p.generate_key_pair(&Variant::new("prime256v1")).unwrap();
        let sizes = p.key_sizes(&key).unwrap();
        // SubjectPublicKeyInfo for an uncompressed P-256 point
        assert_eq!(sizes.public_key_bytes, 91);
        assert!(sizes.secret_key_bytes > 32);
    }
}
