mod common;

use chrono::Duration;
use common::*;
use dgc_verifier::{
    certificate::{Certificate, DoseCount, TestResult},
    rules::{RuleEngine, RulePolicy, VerdictCode, VerificationMode},
};

const MODES: [VerificationMode; 3] = [
    VerificationMode::NormalDgp,
    VerificationMode::BoosterDgp,
    VerificationMode::SuperDgp,
];

#[test]
fn test_completed_cycle_window() {
    let engine = rule_engine();
    let d = day(2021, 6, 1);
    let certificate = vaccinated(vec![vaccination(2, 2, d)]);
    let start = at(2021, 6, 1, 0);

    let valid = engine.evaluate(&certificate, start + Duration::days(1), VerificationMode::NormalDgp);
    assert_eq!(valid.code, VerdictCode::Valid);
    assert!(valid.result);
    assert!(valid.message.starts_with("Doses 2/2 - Vaccination is valid"));

    let early = engine.evaluate(&certificate, start - Duration::days(1), VerificationMode::NormalDgp);
    assert_eq!(early.code, VerdictCode::NotValidYet);
    assert!(!early.result);
    assert!(early.message.starts_with("Doses 2/2 - Vaccination is not valid yet"));

    let late = engine.evaluate(&certificate, start + Duration::days(271), VerificationMode::NormalDgp);
    assert_eq!(late.code, VerdictCode::NotValid);
    assert_eq!(late.message, "Doses 2/2 - Vaccination is expired at 2022-02-26");
}

#[test]
fn test_windows_sweep_monotonically() {
    let engine = rule_engine();
    let certificate = vaccinated(vec![vaccination(2, 2, day(2021, 6, 1))]);
    let from = at(2021, 6, 1, 0);
    let until = from + Duration::days(270);

    let code = |now| engine.evaluate(&certificate, now, VerificationMode::NormalDgp).code;
    assert_eq!(code(from - Duration::seconds(1)), VerdictCode::NotValidYet);
    assert_eq!(code(from), VerdictCode::Valid);
    assert_eq!(code(until), VerdictCode::Valid);
    assert_eq!(code(until + Duration::seconds(1)), VerdictCode::NotValid);

    // Hourly sweep visits each region once, in order
    let mut seen = Vec::new();
    let mut now = from - Duration::days(2);
    while now <= until + Duration::days(2) {
        let current = code(now);
        if seen.last() != Some(&current) {
            seen.push(current);
        }
        now += Duration::hours(1);
    }
    assert_eq!(
        seen,
        vec![VerdictCode::NotValidYet, VerdictCode::Valid, VerdictCode::NotValid]
    );
}

#[test]
fn test_single_dose_regimen() {
    let engine = rule_engine();
    let mut entry = vaccination(1, 1, day(2021, 6, 1));
    entry.medicinal_product = JANSSEN.to_string();
    let certificate = vaccinated(vec![entry]);

    let early = engine.evaluate(&certificate, at(2021, 6, 10, 0), VerificationMode::NormalDgp);
    assert_eq!(early.code, VerdictCode::NotValidYet);
    assert_eq!(
        early.message,
        "Doses 1/1 - Vaccination is not valid yet, starts at 2021-06-16"
    );

    let valid = engine.evaluate(&certificate, at(2021, 7, 1, 0), VerificationMode::NormalDgp);
    assert!(valid.message.starts_with("Doses 1/1 - Vaccination is valid"));
}

#[test]
fn test_partial_series_only_in_exception_country() {
    let engine = rule_engine();
    let now = at(2021, 6, 20, 0);

    let italian = vaccinated(vec![vaccination(1, 2, day(2021, 6, 1))]);
    let verdict = engine.evaluate(&italian, now, VerificationMode::NormalDgp);
    assert_eq!(verdict.code, VerdictCode::Valid);
    assert_eq!(
        verdict.message,
        "Doses 1/2 - Vaccination is valid [ 2021-06-16 - 2021-07-13 ]"
    );

    let mut entry = vaccination(1, 2, day(2021, 6, 1));
    entry.country_of_vaccination = "DE".to_string();
    let verdict = engine.evaluate(&vaccinated(vec![entry]), now, VerificationMode::NormalDgp);
    assert_eq!(verdict.code, VerdictCode::NotValid);
    assert_eq!(
        verdict.message,
        "Doses 1/2 - Vaccination is not valid in DE [ 2021-06-16 - 2021-07-13 ]"
    );
}

#[test]
fn test_partial_series_outside_exception_country_checked_before_dates() {
    let engine = rule_engine();
    let mut entry = vaccination(1, 2, day(2021, 6, 1));
    entry.country_of_vaccination = "FR".to_string();

    // Before the window opens: still rejected, never "not valid yet"
    let verdict = engine.evaluate(&vaccinated(vec![entry]), at(2021, 6, 2, 0), VerificationMode::NormalDgp);
    assert_eq!(verdict.code, VerdictCode::NotValid);
    assert!(verdict.message.contains("is not valid in FR"));
}

#[test]
fn test_partial_series_not_yet_valid() {
    let engine = rule_engine();
    let certificate = vaccinated(vec![vaccination(1, 2, day(2021, 6, 1))]);
    let verdict = engine.evaluate(&certificate, at(2021, 6, 10, 0), VerificationMode::NormalDgp);

    assert_eq!(verdict.code, VerdictCode::NotValidYet);
    assert!(verdict.message.starts_with("Doses 1/2 - Vaccination is not valid yet, "));
}

#[test]
fn test_unlisted_vaccine() {
    let engine = rule_engine();
    let mut entry = vaccination(2, 2, day(2021, 6, 1));
    entry.medicinal_product = "Fake-Vax".to_string();
    let verdict = engine.evaluate(&vaccinated(vec![entry]), at(2021, 7, 1, 0), VerificationMode::NormalDgp);

    assert_eq!(verdict.code, VerdictCode::NotValid);
    assert_eq!(verdict.message, "Vaccine Type is not in list");
}

#[test]
fn test_restricted_product_country() {
    let engine = rule_engine();
    let now = at(2021, 7, 1, 0);

    let mut san_marino = vaccination(2, 2, day(2021, 6, 1));
    san_marino.medicinal_product = SPUTNIK.to_string();
    san_marino.country_of_vaccination = "SM".to_string();
    let verdict = engine.evaluate(&vaccinated(vec![san_marino.clone()]), now, VerificationMode::NormalDgp);
    assert_eq!(verdict.code, VerdictCode::Valid);

    let mut italy = san_marino;
    italy.country_of_vaccination = "IT".to_string();
    let verdict = engine.evaluate(&vaccinated(vec![italy]), now, VerificationMode::NormalDgp);
    assert_eq!(verdict.code, VerdictCode::NotValid);
    assert_eq!(verdict.message, "Vaccine Type is not valid in IT");
}

#[test]
fn test_malformed_dose_number() {
    let engine = rule_engine();
    let now = at(2021, 7, 1, 0);
    let malformed = [
        DoseCount::Number(-1),
        DoseCount::Number(0),
        DoseCount::Malformed(serde_json::json!("a")),
        DoseCount::Malformed(serde_json::json!(1.5)),
    ];

    for dn in malformed {
        let certificate = vaccinated(vec![vaccination_with(dn.clone(), DoseCount::Number(2), day(2021, 6, 1))]);
        for mode in MODES {
            let verdict = engine.evaluate(&certificate, now, mode);
            assert_eq!(verdict.code, VerdictCode::NotValid, "{dn:?} in {mode}");
            assert!(!verdict.result);
        }
    }
}

#[test]
fn test_empty_certificate_is_not_eu_dcc() {
    let engine = rule_engine();
    for mode in MODES {
        for now in [at(2000, 1, 1, 0), at(2021, 7, 1, 0), at(2099, 1, 1, 0)] {
            let verdict = engine.evaluate(&Certificate::default(), now, mode);
            assert_eq!(verdict.code, VerdictCode::NotEuDcc);
            assert!(!verdict.result);
            assert_eq!(
                verdict.message,
                "No vaccination, test or recovery statement found in payload"
            );
        }
    }
}

#[test]
fn test_booster_mode() {
    let engine = rule_engine();
    let now = at(2021, 7, 1, 0);

    let completed = vaccinated(vec![vaccination(2, 2, day(2021, 6, 1))]);
    let verdict = engine.evaluate(&completed, now, VerificationMode::BoosterDgp);
    assert_eq!(verdict.code, VerdictCode::TestNeeded);
    assert_eq!(verdict.message, "Test needed");
    assert!(!verdict.result);

    let boosted = vaccinated(vec![vaccination(3, 3, day(2021, 6, 1))]);
    let verdict = engine.evaluate(&boosted, now, VerificationMode::BoosterDgp);
    assert_eq!(verdict.code, VerdictCode::Valid);

    let extra_dose = vaccinated(vec![vaccination(2, 1, day(2021, 6, 1))]);
    let verdict = engine.evaluate(&extra_dose, now, VerificationMode::BoosterDgp);
    assert_eq!(verdict.code, VerdictCode::Valid);

    let partial = vaccinated(vec![vaccination(1, 2, day(2021, 6, 1))]);
    let verdict = engine.evaluate(&partial, at(2021, 6, 20, 0), VerificationMode::BoosterDgp);
    assert_eq!(verdict.code, VerdictCode::NotValid);
    assert_eq!(verdict.message, "Vaccine is not valid in Booster mode");
}

#[test]
fn test_tests() {
    let engine = rule_engine();
    let sc = at(2021, 10, 20, 9);
    let rapid = tested(vec![test_entry(RAPID_TEST, sc, TestResult::NotDetected)]);

    let valid = engine.evaluate(&rapid, sc + Duration::hours(24), VerificationMode::NormalDgp);
    assert_eq!(valid.code, VerdictCode::Valid);
    assert!(valid.message.starts_with("Test Result is valid"));

    let expired = engine.evaluate(&rapid, sc + Duration::hours(49), VerificationMode::NormalDgp);
    assert_eq!(expired.code, VerdictCode::NotValid);
    assert!(expired.message.starts_with("Test Result is expired at"));

    let molecular = tested(vec![test_entry(MOLECULAR_TEST, sc, TestResult::NotDetected)]);
    let valid = engine.evaluate(&molecular, sc + Duration::hours(60), VerificationMode::NormalDgp);
    assert_eq!(valid.code, VerdictCode::Valid);

    let unlisted = tested(vec![test_entry("LP1234-5", sc, TestResult::NotDetected)]);
    let verdict = engine.evaluate(&unlisted, sc + Duration::hours(1), VerificationMode::NormalDgp);
    assert_eq!(verdict.code, VerdictCode::NotValid);
    assert_eq!(verdict.message, "Test type is not valid");

    let positive = tested(vec![test_entry(RAPID_TEST, sc, TestResult::Detected)]);
    let verdict = engine.evaluate(&positive, sc + Duration::hours(1), VerificationMode::NormalDgp);
    assert_eq!(verdict.code, VerdictCode::NotValid);
    assert_eq!(verdict.message, "Test Result is positive");
}

#[test]
fn test_tests_in_strict_modes() {
    let engine = rule_engine();
    let sc = at(2021, 10, 20, 9);
    let rapid = tested(vec![test_entry(RAPID_TEST, sc, TestResult::NotDetected)]);

    for mode in [VerificationMode::BoosterDgp, VerificationMode::SuperDgp] {
        let verdict = engine.evaluate(&rapid, sc + Duration::hours(1), mode);
        assert_eq!(verdict.code, VerdictCode::NotValid);
        assert_eq!(verdict.message, "Not valid. Super DGP or Booster required.");
    }
}

#[test]
fn test_recovery() {
    let engine = rule_engine();
    let certificate = recovered(vec![recovery(day(2021, 4, 1))]);

    let valid = engine.evaluate(&certificate, at(2021, 5, 1, 0), VerificationMode::NormalDgp);
    assert_eq!(valid.code, VerdictCode::Valid);
    assert!(valid.message.starts_with("Recovery statement is valid"));

    let super_mode = engine.evaluate(&certificate, at(2021, 5, 1, 0), VerificationMode::SuperDgp);
    assert_eq!(super_mode.code, VerdictCode::Valid);

    let expired = engine.evaluate(&certificate, at(2021, 12, 1, 0), VerificationMode::NormalDgp);
    assert_eq!(expired.code, VerdictCode::NotValid);
    assert!(expired.message.starts_with("Recovery statement is expired at"));

    let mut future = recovery(day(2021, 4, 1));
    future.valid_from = Some(day(2021, 4, 20));
    let early = engine.evaluate(&recovered(vec![future]), at(2021, 4, 10, 0), VerificationMode::NormalDgp);
    assert_eq!(early.code, VerdictCode::NotValidYet);
    assert_eq!(
        early.message,
        "Recovery statement is not valid yet, starts at 2021-04-20"
    );
}

#[test]
fn test_recovery_in_booster_mode() {
    let now = at(2021, 5, 1, 0);
    let certificate = recovered(vec![recovery(day(2021, 4, 1))]);

    let verdict = rule_engine().evaluate(&certificate, now, VerificationMode::BoosterDgp);
    assert_eq!(verdict.code, VerdictCode::TestNeeded);

    let mut policy = RulePolicy::default();
    policy.booster_recovery_kids.insert(EC_KID.to_string());
    let engine = RuleEngine::new(rule_table(), policy);
    let verdict = engine.evaluate(&certificate, now, VerificationMode::BoosterDgp);
    assert_eq!(verdict.code, VerdictCode::Valid);
}

#[test]
fn test_vaccination_takes_precedence() {
    let engine = rule_engine();
    let sc = at(2021, 10, 20, 9);
    let certificate = Certificate {
        vaccinations: vec![vaccination(2, 2, day(2019, 1, 1))],
        tests: vec![test_entry(RAPID_TEST, sc, TestResult::NotDetected)],
        ..Default::default()
    };

    let verdict = engine.evaluate(&certificate, sc + Duration::hours(1), VerificationMode::NormalDgp);
    assert_eq!(verdict.code, VerdictCode::NotValid);
    assert!(verdict.message.starts_with("Doses 2/2 - Vaccination is expired"));
}

#[test]
fn test_evaluation_is_idempotent() {
    let engine = rule_engine();
    let certificate = vaccinated(vec![vaccination(2, 2, day(2021, 6, 1))]);
    let now = at(2021, 7, 1, 0);

    for mode in MODES {
        let first = engine.evaluate(&certificate, now, mode);
        let second = engine.evaluate(&certificate, now, mode);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }
}

#[test]
fn test_strict_modes_never_promote() {
    let engine = rule_engine();
    let sc = at(2021, 10, 20, 9);
    let mut foreign_partial = vaccination(1, 2, day(2021, 10, 1));
    foreign_partial.country_of_vaccination = "ES".to_string();

    let certificates = [
        vaccinated(vec![vaccination(2, 2, day(2021, 10, 25))]),
        vaccinated(vec![vaccination(3, 3, day(2020, 1, 1))]),
        vaccinated(vec![vaccination(1, 2, day(2021, 10, 19))]),
        vaccinated(vec![foreign_partial]),
        tested(vec![test_entry(RAPID_TEST, sc + Duration::hours(5), TestResult::NotDetected)]),
        tested(vec![test_entry(RAPID_TEST, sc - Duration::days(5), TestResult::NotDetected)]),
        recovered(vec![recovery(day(2020, 1, 1))]),
    ];

    for certificate in &certificates {
        let base = engine.evaluate(certificate, sc, VerificationMode::NormalDgp);
        assert!(!base.is_valid(), "fixture should not be valid: {base:?}");
        for mode in [VerificationMode::BoosterDgp, VerificationMode::SuperDgp] {
            let verdict = engine.evaluate(certificate, sc, mode);
            assert!(!verdict.is_valid(), "{mode} promoted {base:?} to {verdict:?}");
        }
    }
}
