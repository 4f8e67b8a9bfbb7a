use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A decoded certificate together with the material needed to check its signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Certificate {
    /// Base64 key identifier of the signer.
    pub kid: String,
    pub person: Option<Person>,
    pub date_of_birth: Option<String>,
    pub vaccinations: Vec<VaccinationEntry>,
    pub tests: Vec<TestEntry>,
    pub recovery_statements: Vec<RecoveryEntry>,
    /// Bytes covered by the signature.
    pub signed_payload: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Certificate {
    /// True when no vaccination, test or recovery entry is present.
    pub fn is_empty(&self) -> bool {
        self.vaccinations.is_empty() && self.tests.is_empty() && self.recovery_statements.is_empty()
    }

    /// Unique certificate identifier, taken from the first entry found.
    pub fn uvci(&self) -> Option<&str> {
        self.vaccinations
            .iter()
            .map(|v| v.certificate_identifier.as_str())
            .chain(self.tests.iter().map(|t| t.certificate_identifier.as_str()))
            .chain(
                self.recovery_statements
                    .iter()
                    .map(|r| r.certificate_identifier.as_str()),
            )
            .find(|ci| !ci.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "fn", default)]
    pub family_name: Option<String>,
    #[serde(rename = "fnt", default)]
    pub standardised_family_name: Option<String>,
    #[serde(rename = "gn", default)]
    pub given_name: Option<String>,
    #[serde(rename = "gnt", default)]
    pub standardised_given_name: Option<String>,
}

/// A dose counter as it appeared in the payload.
///
/// Kept unparsed so that malformed values reach the rule engine and become a
/// verdict instead of a decoding failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DoseCount {
    Number(i64),
    Malformed(serde_json::Value),
}

impl DoseCount {
    /// The counter when it is a positive integer.
    pub fn value(&self) -> Option<u32> {
        match self {
            DoseCount::Number(n) if *n > 0 => u32::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl From<u32> for DoseCount {
    fn from(value: u32) -> Self {
        DoseCount::Number(value.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationEntry {
    #[serde(rename = "tg", default)]
    pub disease: String,
    #[serde(rename = "vp", default)]
    pub vaccine: String,
    #[serde(rename = "mp")]
    pub medicinal_product: String,
    #[serde(rename = "ma", default)]
    pub manufacturer: String,
    #[serde(rename = "dn")]
    pub dose_number: DoseCount,
    #[serde(rename = "sd")]
    pub total_series_of_doses: DoseCount,
    #[serde(rename = "dt")]
    pub date_of_vaccination: NaiveDate,
    #[serde(rename = "co")]
    pub country_of_vaccination: String,
    #[serde(rename = "is", default)]
    pub certificate_issuer: String,
    #[serde(rename = "ci", default)]
    pub certificate_identifier: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestResult {
    #[serde(rename = "260415000")]
    NotDetected,
    #[serde(rename = "260373001")]
    Detected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEntry {
    #[serde(rename = "tg", default)]
    pub disease: String,
    /// Type of test code; only allow-listed values are accepted by the rules.
    #[serde(rename = "tt")]
    pub type_of_test: String,
    #[serde(rename = "nm", default)]
    pub test_name: Option<String>,
    #[serde(rename = "ma", default)]
    pub manufacturer: Option<String>,
    #[serde(rename = "sc")]
    pub sample_collection_time: DateTime<Utc>,
    #[serde(rename = "tr")]
    pub result: TestResult,
    #[serde(rename = "tc", default)]
    pub testing_centre: Option<String>,
    #[serde(rename = "co", default)]
    pub country_of_test: String,
    #[serde(rename = "is", default)]
    pub certificate_issuer: String,
    #[serde(rename = "ci", default)]
    pub certificate_identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryEntry {
    #[serde(rename = "tg", default)]
    pub disease: String,
    #[serde(rename = "fr")]
    pub first_positive_test_date: NaiveDate,
    #[serde(rename = "co", default)]
    pub country_of_test: String,
    #[serde(rename = "is", default)]
    pub certificate_issuer: String,
    /// Start of the validity asserted by the issuer.
    #[serde(rename = "df", default)]
    pub valid_from: Option<NaiveDate>,
    /// End of the validity asserted by the issuer.
    #[serde(rename = "du", default)]
    pub valid_until: Option<NaiveDate>,
    #[serde(rename = "ci", default)]
    pub certificate_identifier: String,
}
