use chrono::{DateTime, Utc};

use crate::certificate::VaccinationEntry;

use super::overlay::{Assessment, Evidence};
use super::policy::RulePolicy;
use super::table::{RuleTable, Timing, Window};
use super::types::Verdict;
use super::OUT_OF_RANGE;

pub(crate) const INVALID_DOSE: &str = "Invalid dose number";
pub(crate) const NOT_IN_LIST: &str = "Vaccine Type is not in list";

const DATE_FORMAT: &str = "%Y-%m-%d";

struct Dose<'a> {
    entry: &'a VaccinationEntry,
    number: u32,
    total: u32,
}

impl Dose<'_> {
    fn is_complete(&self) -> bool {
        self.number >= self.total
    }

    fn is_booster(&self) -> bool {
        self.number > self.total || self.number >= 3
    }

    fn label(&self) -> String {
        format!("Doses {}/{}", self.number, self.total)
    }
}

/// Picks the most advanced dose. Any malformed counter rejects the certificate.
fn latest_dose(entries: &[VaccinationEntry]) -> Option<Dose<'_>> {
    let doses = entries
        .iter()
        .map(|entry| {
            Some(Dose {
                entry,
                number: entry.dose_number.value()?,
                total: entry.total_series_of_doses.value()?,
            })
        })
        .collect::<Option<Vec<_>>>()?;

    doses
        .into_iter()
        .max_by_key(|dose| (dose.number, dose.entry.date_of_vaccination))
}

pub(crate) fn assess(
    entries: &[VaccinationEntry],
    table: &RuleTable,
    policy: &RulePolicy,
    now: DateTime<Utc>,
) -> Assessment {
    let Some(dose) = latest_dose(entries) else {
        return Assessment::terminal(Verdict::not_valid(INVALID_DOSE));
    };
    let entry = dose.entry;
    let product = entry.medicinal_product.as_str();
    let country = entry.country_of_vaccination.as_str();

    let Some(rule) = table.vaccine(product) else {
        return Assessment::terminal(Verdict::not_valid(NOT_IN_LIST));
    };
    if !policy.accepts_product_in(product, country) {
        return Assessment::terminal(Verdict::not_valid(format!(
            "Vaccine Type is not valid in {country}"
        )));
    }

    let complete = dose.is_complete();
    let offsets = if complete {
        rule.complete
    } else {
        match rule.not_complete {
            Some(offsets) => offsets,
            None => {
                return Assessment::terminal(Verdict::not_valid(format!(
                    "{} - Vaccination is not valid",
                    dose.label()
                )));
            }
        }
    };
    let Some(window) = Window::days_from(entry.date_of_vaccination, offsets) else {
        return Assessment::terminal(Verdict::not_valid(OUT_OF_RANGE));
    };

    let evidence = Evidence::Vaccination {
        complete,
        booster: dose.is_booster(),
    };
    let from = window.from.format(DATE_FORMAT);
    let until = window.until.format(DATE_FORMAT);

    if !complete && !policy.accepts_partial_series(country) {
        return Assessment::new(
            evidence,
            Verdict::not_valid(format!(
                "{} - Vaccination is not valid in {country} [ {from} - {until} ]",
                dose.label()
            )),
        );
    }

    let verdict = match window.classify(now) {
        Timing::NotYet => Verdict::not_valid_yet(format!(
            "{} - Vaccination is not valid yet, starts at {from}",
            dose.label()
        )),
        Timing::Expired => Verdict::not_valid(format!(
            "{} - Vaccination is expired at {until}",
            dose.label()
        )),
        Timing::Within => Verdict::valid(format!(
            "{} - Vaccination is valid [ {from} - {until} ]",
            dose.label()
        )),
    };
    Assessment::new(evidence, verdict)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::certificate::DoseCount;
    use crate::rules::{RuleSetting, VerdictCode};

    fn entry(dn: DoseCount, sd: DoseCount, dt: NaiveDate) -> VaccinationEntry {
        VaccinationEntry {
            disease: "840539006".to_string(),
            vaccine: "1119349007".to_string(),
            medicinal_product: "EU/1/20/1528".to_string(),
            manufacturer: "ORG-100030215".to_string(),
            dose_number: dn,
            total_series_of_doses: sd,
            date_of_vaccination: dt,
            country_of_vaccination: "IT".to_string(),
            certificate_issuer: "Ministero della Salute".to_string(),
            certificate_identifier: "01ITE7300E1AB2A84C719004F103DCB1F70A#6".to_string(),
        }
    }

    fn table() -> RuleTable {
        let setting = |name: &str, value: i64| RuleSetting {
            name: name.to_string(),
            kind: "EU/1/20/1528".to_string(),
            value: value.into(),
        };
        RuleTable::from_settings(&[
            setting("vaccine_start_day_not_complete", 15),
            setting("vaccine_end_day_not_complete", 42),
            setting("vaccine_start_day_complete", 0),
            setting("vaccine_end_day_complete", 270),
        ])
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_highest_dose_is_evaluated() {
        let entries = vec![
            entry(DoseCount::Number(1), DoseCount::Number(2), day(2021, 5, 1)),
            entry(DoseCount::Number(2), DoseCount::Number(2), day(2021, 6, 1)),
        ];
        let now = Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap();
        let assessment = assess(&entries, &table(), &RulePolicy::default(), now);

        assert!(assessment.verdict.is_valid());
        assert_eq!(
            assessment.verdict.message,
            "Doses 2/2 - Vaccination is valid [ 2021-06-01 - 2022-02-26 ]"
        );
        assert_eq!(
            assessment.evidence,
            Evidence::Vaccination {
                complete: true,
                booster: false
            }
        );
    }

    #[test]
    fn test_malformed_dose_anywhere_is_rejected() {
        let entries = vec![
            entry(DoseCount::Number(2), DoseCount::Number(2), day(2021, 6, 1)),
            entry(DoseCount::Number(-1), DoseCount::Number(2), day(2021, 5, 1)),
        ];
        let assessment = assess(&entries, &table(), &RulePolicy::default(), Utc::now());

        assert_eq!(assessment.evidence, Evidence::Terminal);
        assert_eq!(assessment.verdict.code, VerdictCode::NotValid);
        assert_eq!(assessment.verdict.message, INVALID_DOSE);
    }

    #[test]
    fn test_partial_series_outside_exception_country() {
        let mut first = entry(DoseCount::Number(1), DoseCount::Number(2), day(2021, 6, 1));
        first.country_of_vaccination = "FR".to_string();
        let now = Utc.with_ymd_and_hms(2021, 6, 20, 0, 0, 0).unwrap();
        let assessment = assess(&[first], &table(), &RulePolicy::default(), now);

        assert_eq!(assessment.verdict.code, VerdictCode::NotValid);
        assert_eq!(
            assessment.verdict.message,
            "Doses 1/2 - Vaccination is not valid in FR [ 2021-06-16 - 2021-07-13 ]"
        );
    }

    #[test]
    fn test_partial_dose_without_partial_window() {
        let complete_only = RuleTable::from_settings(&[
            RuleSetting {
                name: "vaccine_start_day_complete".to_string(),
                kind: "EU/1/20/1528".to_string(),
                value: serde_json::json!(0),
            },
            RuleSetting {
                name: "vaccine_end_day_complete".to_string(),
                kind: "EU/1/20/1528".to_string(),
                value: serde_json::json!(270),
            },
        ]);
        let first = entry(DoseCount::Number(1), DoseCount::Number(2), day(2021, 6, 1));
        let now = Utc.with_ymd_and_hms(2021, 6, 20, 0, 0, 0).unwrap();
        let assessment = assess(&[first], &complete_only, &RulePolicy::default(), now);

        assert_eq!(assessment.evidence, Evidence::Terminal);
        assert_eq!(assessment.verdict.code, VerdictCode::NotValid);
        assert_eq!(
            assessment.verdict.message,
            "Doses 1/2 - Vaccination is not valid"
        );
    }

    #[test]
    fn test_booster_detection() {
        let third = entry(DoseCount::Number(3), DoseCount::Number(3), day(2021, 12, 1));
        let now = Utc.with_ymd_and_hms(2021, 12, 2, 0, 0, 0).unwrap();
        let assessment = assess(&[third], &table(), &RulePolicy::default(), now);

        assert_eq!(
            assessment.evidence,
            Evidence::Vaccination {
                complete: true,
                booster: true
            }
        );
    }
}
