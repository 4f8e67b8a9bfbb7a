#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use dgc_verifier::{
    cache::{Cache, MemoryStore},
    certificate::{
        Certificate, DoseCount, RecoveryEntry, TestEntry, TestResult, VaccinationEntry,
    },
    crl::{CrlSyncEngine, MemoryRevocationStore},
    rules::{RuleEngine, RulePolicy, RuleTable},
};
use ring::rand::SystemRandom;
use ring::signature::{ECDSA_P256_SHA256_FIXED_SIGNING, EcdsaKeyPair};

pub const COMIRNATY: &str = "EU/1/20/1528";
pub const JANSSEN: &str = "EU/1/20/1525";
pub const SPUTNIK: &str = "Sputnik-V";
pub const RAPID_TEST: &str = "LP217198-3";
pub const MOLECULAR_TEST: &str = "LP6464-4";

/// Kid of `test_data/signer_ec.der`.
pub const EC_KID: &str = "xHR6JGSgUPw=";
/// Kid of `test_data/signer_rsa.der`.
pub const RSA_KID: &str = "XM0MEofyWz0=";

pub const RULES_JSON: &[u8] = include_bytes!("../../test_data/rules.json");
pub const SIGNATURES_JSON: &[u8] = include_bytes!("../../test_data/signatures.json");
pub const SIGNATURE_LIST_JSON: &[u8] = include_bytes!("../../test_data/signatureslist.json");

pub fn rule_table() -> RuleTable {
    RuleTable::from_json(RULES_JSON).expect("rules fixture")
}

pub fn rule_engine() -> RuleEngine {
    RuleEngine::new(rule_table(), RulePolicy::default())
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn vaccination(dn: u32, sd: u32, dt: NaiveDate) -> VaccinationEntry {
    vaccination_with(dn.into(), sd.into(), dt)
}

/// Vaccination entry with dose counters exactly as given, malformed or not.
pub fn vaccination_with(dn: DoseCount, sd: DoseCount, dt: NaiveDate) -> VaccinationEntry {
    VaccinationEntry {
        disease: "840539006".to_string(),
        vaccine: "1119349007".to_string(),
        medicinal_product: COMIRNATY.to_string(),
        manufacturer: "ORG-100030215".to_string(),
        dose_number: dn,
        total_series_of_doses: sd,
        date_of_vaccination: dt,
        country_of_vaccination: "IT".to_string(),
        certificate_issuer: "Ministero della Salute".to_string(),
        certificate_identifier: "01ITE7300E1AB2A84C719004F103DCB1F70A#6".to_string(),
    }
}

pub fn test_entry(tt: &str, sc: DateTime<Utc>, tr: TestResult) -> TestEntry {
    TestEntry {
        disease: "840539006".to_string(),
        type_of_test: tt.to_string(),
        test_name: None,
        manufacturer: Some("1232".to_string()),
        sample_collection_time: sc,
        result: tr,
        testing_centre: Some("Farmacia".to_string()),
        country_of_test: "IT".to_string(),
        certificate_issuer: "Ministero della Salute".to_string(),
        certificate_identifier: "01IT053059F7676042D9BEE9F874C4901F9B#3".to_string(),
    }
}

pub fn recovery(fr: NaiveDate) -> RecoveryEntry {
    RecoveryEntry {
        disease: "840539006".to_string(),
        first_positive_test_date: fr,
        country_of_test: "IT".to_string(),
        certificate_issuer: "Ministero della Salute".to_string(),
        valid_from: None,
        valid_until: None,
        certificate_identifier: "01IT0BFC9866D3854EAC82C21654B6F6DE32#1".to_string(),
    }
}

pub fn vaccinated(entries: Vec<VaccinationEntry>) -> Certificate {
    Certificate {
        kid: EC_KID.to_string(),
        vaccinations: entries,
        ..Default::default()
    }
}

pub fn tested(entries: Vec<TestEntry>) -> Certificate {
    Certificate {
        kid: EC_KID.to_string(),
        tests: entries,
        ..Default::default()
    }
}

pub fn recovered(entries: Vec<RecoveryEntry>) -> Certificate {
    Certificate {
        kid: EC_KID.to_string(),
        recovery_statements: entries,
        ..Default::default()
    }
}

/// Signs the certificate's payload with the key of `test_data/signer_ec.der`.
pub fn sign(mut certificate: Certificate) -> Certificate {
    let rng = SystemRandom::new();
    let pair = EcdsaKeyPair::from_pkcs8(
        &ECDSA_P256_SHA256_FIXED_SIGNING,
        include_bytes!("../../test_data/signer_ec.pk8"),
        &rng,
    )
    .unwrap();

    if certificate.signed_payload.is_empty() {
        let dcc = serde_json::json!({
            "v": certificate.vaccinations,
            "t": certificate.tests,
            "r": certificate.recovery_statements,
        });
        certificate.signed_payload = dcc.to_string().into_bytes();
    }
    certificate.kid = EC_KID.to_string();
    certificate.signature = pair
        .sign(&rng, &certificate.signed_payload)
        .unwrap()
        .as_ref()
        .to_vec();
    certificate
}

pub type MemoryEngine = CrlSyncEngine<MemoryStore, MemoryRevocationStore>;

pub async fn memory_engine() -> Arc<MemoryEngine> {
    let engine = CrlSyncEngine::new(Cache::new(MemoryStore::new()), MemoryRevocationStore::new());
    engine.initialize().await.unwrap();
    Arc::new(engine)
}
