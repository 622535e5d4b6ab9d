//! Cryptography providers for the benchmark harness
//!
//! Each backend implements [`pqbench_harness::CryptoProvider`] and sits behind
//! a cargo feature of the same name:
//!
//! - `rustcrypto` (default): pure-Rust P-256 and P-384 ECDSA and ECDH.
//! - `openssl`: RSA and NIST curves through the system OpenSSL.
//! - `oqs`: Kyber, ML-KEM, Dilithium, Falcon and SPHINCS+ through liboqs.

#[cfg(feature = "oqs")]
pub mod liboqs;
#[cfg(feature = "openssl")]
pub mod ossl;
#[cfg(feature = "rustcrypto")]
pub mod rustcrypto;

#[cfg(feature = "oqs")]
pub use liboqs::OqsProvider;
#[cfg(feature = "openssl")]
pub use ossl::OpenSslProvider;
#[cfg(feature = "rustcrypto")]
pub use rustcrypto::RustCryptoProvider;

/// Provider names this build can open, in preference order.
pub fn enabled_providers() -> Vec<&'static str> {
    let mut names = Vec::new();
    if cfg!(feature = "rustcrypto") {
        names.push("rustcrypto");
    }
    if cfg!(feature = "openssl") {
        names.push("openssl");
    }
    if cfg!(feature = "oqs") {
        names.push("oqs");
    }
    names
}

/// Lowercase with `-`, `_`, `+` and spaces removed, so `ML-KEM-512`,
/// `ml_kem_512` and `mlkem512` all name the same parameter set.
pub(crate) fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | '+' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ignores_separators_and_case() {
        assert_eq!(normalize("ML-KEM-512"), "mlkem512");
        assert_eq!(
            normalize("SPHINCS+-SHA2-128f-simple"),
            "sphincssha2128fsimple"
        );
        assert_eq!(normalize("prime256v1"), "prime256v1");
    }

    #[test]
    fn test_default_build_enables_rustcrypto() {
        if cfg!(feature = "rustcrypto") {
            assert_eq!(enabled_providers().first(), Some(&"rustcrypto"));
        }
    }
}
