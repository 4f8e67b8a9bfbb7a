use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use thiserror::Error;

use super::types::{Certificate, Person, RecoveryEntry, TestEntry, VaccinationEntry};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid certificate document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base64 in {field}: {source}")]
    Base64 {
        field: &'static str,
        source: base64::DecodeError,
    },

    #[error("Certificate content does not match the signed payload")]
    PayloadMismatch,
}

/// Turns raw bytes into a [`Certificate`].
///
/// Transport decoding (QR, base45, compression, COSE) happens behind this
/// boundary.
pub trait CertificateDecoder: Send + Sync {
    fn decode(&self, raw: &[u8]) -> Result<Certificate, DecodeError>;
}

/// Decodes certificate documents already unwrapped to JSON.
///
/// ```json
/// { "kid": "...", "payload": "<base64>", "signature": "<base64>", "dcc": { "v": [...] } }
/// ```
///
/// The health certificate is always read from the signed payload. A `dcc`
/// copy, when present, must carry the same content or the document is
/// rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

#[derive(Debug, Deserialize)]
struct CertificateDocument {
    kid: String,
    #[serde(default)]
    payload: String,
    #[serde(default)]
    signature: String,
    #[serde(default)]
    dcc: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct HealthCertificate {
    #[serde(rename = "nam", default)]
    person: Option<Person>,
    #[serde(rename = "dob", default)]
    date_of_birth: Option<String>,
    #[serde(rename = "v", default)]
    vaccinations: Vec<VaccinationEntry>,
    #[serde(rename = "t", default)]
    tests: Vec<TestEntry>,
    #[serde(rename = "r", default)]
    recovery_statements: Vec<RecoveryEntry>,
}

fn decode_base64(field: &'static str, value: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(value)
        .map_err(|source| DecodeError::Base64 { field, source })
}

impl CertificateDecoder for JsonDecoder {
    fn decode(&self, raw: &[u8]) -> Result<Certificate, DecodeError> {
        let document: CertificateDocument = serde_json::from_slice(raw)?;
        let signed_payload = decode_base64("payload", &document.payload)?;
        let content: serde_json::Value = serde_json::from_slice(&signed_payload)?;
        if document.dcc.is_some_and(|dcc| dcc != content) {
            return Err(DecodeError::PayloadMismatch);
        }
        let dcc: HealthCertificate = serde_json::from_value(content)?;

        Ok(Certificate {
            kid: document.kid,
            person: dcc.person,
            date_of_birth: dcc.date_of_birth,
            vaccinations: dcc.vaccinations,
            tests: dcc.tests,
            recovery_statements: dcc.recovery_statements,
            signed_payload,
            signature: decode_base64("signature", &document.signature)?,
        })
    }
}
