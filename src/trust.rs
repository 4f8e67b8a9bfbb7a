use std::collections::{HashMap, HashSet};

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;
use tracing::{debug, warn};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey as ParsedKey;

/// Error type for trust list operations.
#[derive(Debug, Error)]
pub enum TrustListError {
    #[error("X.509 error: {0}")]
    X509(#[from] X509Error),

    #[error("Invalid base64 certificate for kid {kid}: {source}")]
    Base64 {
        kid: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Unsupported public key algorithm for kid {0}")]
    UnsupportedKey(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TrustListResult<T> = Result<T, TrustListError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// P-256 point, verified as ES256.
    Ec,
    /// PKCS#1 `RSAPublicKey`, verified as PS256.
    Rsa,
}

/// A signer public key as carried by its certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub algorithm: KeyAlgorithm,
    /// Subject public key bits.
    pub bytes: Vec<u8>,
}

impl PublicKey {
    /// Extracts the subject public key of a DER encoded certificate.
    pub fn from_certificate_der(kid: &str, der: &[u8]) -> TrustListResult<Self> {
        let (_, cert) = X509Certificate::from_der(der).map_err(|e| TrustListError::X509(e.into()))?;
        let spki = cert.public_key();

        let algorithm = match spki.parsed()? {
            ParsedKey::EC(_) => KeyAlgorithm::Ec,
            ParsedKey::RSA(_) => KeyAlgorithm::Rsa,
            _ => return Err(TrustListError::UnsupportedKey(kid.to_string())),
        };

        Ok(Self {
            algorithm,
            bytes: spki.subject_public_key.data.to_vec(),
        })
    }
}

/// Signer keys indexed by key identifier.
#[derive(Debug, Clone, Default)]
pub struct TrustList {
    keys: HashMap<String, PublicKey>,
}

impl TrustList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the list from the cached signer certificates, `{kid: base64(DER)}`.
    ///
    /// Certificates that fail to parse are skipped.
    pub fn from_json(data: &[u8]) -> TrustListResult<Self> {
        let certificates: HashMap<String, String> = serde_json::from_slice(data)?;
        let mut list = Self::new();

        for (kid, encoded) in certificates {
            match Self::decode_entry(&kid, &encoded) {
                Ok(key) => list.insert(kid, key),
                Err(e) => warn!("Skipping signer certificate {}: {}", kid, e),
            }
        }

        debug!("Loaded {} signer keys", list.len());
        Ok(list)
    }

    fn decode_entry(kid: &str, encoded: &str) -> TrustListResult<PublicKey> {
        let der = STANDARD
            .decode(encoded.trim())
            .map_err(|source| TrustListError::Base64 {
                kid: kid.to_string(),
                source,
            })?;
        PublicKey::from_certificate_der(kid, &der)
    }

    /// Parses the signature list index, a JSON array of valid kids.
    pub fn parse_index(data: &[u8]) -> TrustListResult<HashSet<String>> {
        let kids: Vec<String> = serde_json::from_slice(data)?;
        Ok(kids.into_iter().collect())
    }

    /// Drops every key whose kid is missing from the index.
    pub fn retain_listed(&mut self, listed: &HashSet<String>) {
        let before = self.keys.len();
        self.keys.retain(|kid, _| listed.contains(kid));
        if self.keys.len() != before {
            debug!(
                "Dropped {} signer keys absent from the signature list",
                before - self.keys.len()
            );
        }
    }

    pub fn insert(&mut self, kid: impl Into<String>, key: PublicKey) {
        self.keys.insert(kid.into(), key);
    }

    pub fn get(&self, kid: &str) -> Option<&PublicKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
