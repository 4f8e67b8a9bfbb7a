use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

const GENERIC: &str = "GENERIC";

/// One entry of the gateway settings list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetting {
    pub name: String,
    /// Medicinal product code, or `GENERIC`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Integer offset; the gateway sends it as a string.
    pub value: serde_json::Value,
}

impl RuleSetting {
    fn offset(&self) -> Option<i64> {
        match &self.value {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Allow-listed test types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestType {
    /// Nucleic acid amplification test.
    Molecular,
    RapidAntigen,
}

impl TestType {
    pub const MOLECULAR_CODE: &'static str = "LP6464-4";
    pub const RAPID_ANTIGEN_CODE: &'static str = "LP217198-3";

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            Self::MOLECULAR_CODE => Some(TestType::Molecular),
            Self::RAPID_ANTIGEN_CODE => Some(TestType::RapidAntigen),
            _ => None,
        }
    }
}

/// Start and end offsets of a validity window, relative to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offsets {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Copy, Default)]
struct PartialOffsets {
    start: Option<i64>,
    end: Option<i64>,
}

impl PartialOffsets {
    /// A window exists once its end is known; a missing start means "immediately".
    fn build(self) -> Option<Offsets> {
        self.end.map(|end| Offsets {
            start: self.start.unwrap_or(0),
            end,
        })
    }
}

/// Closed validity interval `[from, until]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

/// Position of an instant relative to a [`Window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    NotYet,
    Within,
    Expired,
}

impl Window {
    pub fn classify(&self, now: DateTime<Utc>) -> Timing {
        if now < self.from {
            Timing::NotYet
        } else if now > self.until {
            Timing::Expired
        } else {
            Timing::Within
        }
    }

    /// Window in days from a calendar date taken at midnight UTC.
    pub fn days_from(date: NaiveDate, offsets: Offsets) -> Option<Self> {
        let base = midnight(date);
        Some(Self {
            from: base.checked_add_signed(TimeDelta::try_days(offsets.start)?)?,
            until: base.checked_add_signed(TimeDelta::try_days(offsets.end)?)?,
        })
    }

    /// Window in hours from an instant.
    pub fn hours_from(instant: DateTime<Utc>, offsets: Offsets) -> Option<Self> {
        Some(Self {
            from: instant.checked_add_signed(TimeDelta::try_hours(offsets.start)?)?,
            until: instant.checked_add_signed(TimeDelta::try_hours(offsets.end)?)?,
        })
    }
}

pub(crate) fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Day offsets for one medicinal product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaccineRule {
    /// Window for an incomplete series, when the product allows one.
    pub not_complete: Option<Offsets>,
    pub complete: Offsets,
}

#[derive(Debug, Clone, Copy, Default)]
struct PartialVaccineRule {
    not_complete: PartialOffsets,
    complete: PartialOffsets,
}

fn product<'a>(
    vaccines: &'a mut HashMap<String, PartialVaccineRule>,
    kind: &str,
) -> &'a mut PartialVaccineRule {
    vaccines.entry(kind.to_string()).or_default()
}

/// Validity offsets indexed for evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    vaccines: HashMap<String, VaccineRule>,
    molecular_test: Option<Offsets>,
    rapid_test: Option<Offsets>,
    recovery: PartialRecovery,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PartialRecovery {
    start: Option<i64>,
    end: Option<i64>,
}

impl RuleTable {
    /// Parses the settings list as served by the gateway.
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        let settings: Vec<RuleSetting> = serde_json::from_slice(data)?;
        Ok(Self::from_settings(&settings))
    }

    pub fn from_settings(settings: &[RuleSetting]) -> Self {
        let mut vaccines: HashMap<String, PartialVaccineRule> = HashMap::new();
        let mut molecular = PartialOffsets::default();
        let mut rapid = PartialOffsets::default();
        let mut recovery = PartialRecovery::default();

        for setting in settings {
            let Some(value) = setting.offset() else {
                debug!("Ignoring setting {} with non numeric value", setting.name);
                continue;
            };
            let kind = setting.kind.as_str();
            match setting.name.as_str() {
                "vaccine_start_day_not_complete" => {
                    product(&mut vaccines, kind).not_complete.start = Some(value)
                }
                "vaccine_end_day_not_complete" => {
                    product(&mut vaccines, kind).not_complete.end = Some(value)
                }
                "vaccine_start_day_complete" => {
                    product(&mut vaccines, kind).complete.start = Some(value)
                }
                "vaccine_end_day_complete" => product(&mut vaccines, kind).complete.end = Some(value),
                "molecular_test_start_hours" if setting.kind == GENERIC => molecular.start = Some(value),
                "molecular_test_end_hours" if setting.kind == GENERIC => molecular.end = Some(value),
                "rapid_test_start_hours" if setting.kind == GENERIC => rapid.start = Some(value),
                "rapid_test_end_hours" if setting.kind == GENERIC => rapid.end = Some(value),
                "recovery_cert_start_day" if setting.kind == GENERIC => recovery.start = Some(value),
                "recovery_cert_end_day" if setting.kind == GENERIC => recovery.end = Some(value),
                _ => {}
            }
        }

        let vaccines = vaccines
            .into_iter()
            .filter_map(|(product, rule)| {
                rule.complete.build().map(|complete| {
                    (
                        product,
                        VaccineRule {
                            not_complete: rule.not_complete.build(),
                            complete,
                        },
                    )
                })
            })
            .collect();

        Self {
            vaccines,
            molecular_test: molecular.build(),
            rapid_test: rapid.build(),
            recovery,
        }
    }

    /// Rule for a listed product. Products without a complete-cycle end are unlisted.
    pub fn vaccine(&self, product: &str) -> Option<&VaccineRule> {
        self.vaccines.get(product)
    }

    /// Hour offsets for a test type.
    pub fn test(&self, test_type: TestType) -> Option<Offsets> {
        match test_type {
            TestType::Molecular => self.molecular_test,
            TestType::RapidAntigen => self.rapid_test,
        }
    }

    /// Day offset from the first positive test to the start of a recovery.
    pub fn recovery_start_day(&self) -> Option<i64> {
        self.recovery.start
    }

    /// Day offset from the first positive test to the end of a recovery.
    pub fn recovery_end_day(&self) -> Option<i64> {
        self.recovery.end
    }

    pub fn is_empty(&self) -> bool {
        self.vaccines.is_empty() && self.molecular_test.is_none() && self.rapid_test.is_none()
    }
}
