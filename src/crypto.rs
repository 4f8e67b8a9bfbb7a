use ring::signature::{self, UnparsedPublicKey};
use tracing::debug;

use crate::trust::{KeyAlgorithm, PublicKey};

/// Checks a signature over the signed payload of a certificate.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, payload: &[u8], signature: &[u8], key: &PublicKey) -> bool;
}

/// ES256 with raw `r || s` signatures, PS256 for RSA signers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RingVerifier;

impl SignatureVerifier for RingVerifier {
    fn verify(&self, payload: &[u8], signature: &[u8], key: &PublicKey) -> bool {
        let algorithm: &'static dyn signature::VerificationAlgorithm = match key.algorithm {
            KeyAlgorithm::Ec => &signature::ECDSA_P256_SHA256_FIXED,
            KeyAlgorithm::Rsa => &signature::RSA_PSS_2048_8192_SHA256,
        };

        match UnparsedPublicKey::new(algorithm, &key.bytes).verify(payload, signature) {
            Ok(()) => true,
            Err(_) => {
                debug!("{:?} signature rejected", key.algorithm);
                false
            }
        }
    }
}
