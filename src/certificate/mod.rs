//! Decoded EU Digital Green Certificate.
//!
//! The structure follows the EU DCC JSON schema; field names on the wire are
//! the schema's short keys (`v`, `t`, `r`, `dn`, `sd`, ...).

mod decoder;
mod types;

pub use decoder::{CertificateDecoder, DecodeError, JsonDecoder};
pub use types::{
    Certificate, DoseCount, Person, RecoveryEntry, TestEntry, TestResult, VaccinationEntry,
};
