use chrono::{DateTime, SecondsFormat, Utc};

use crate::certificate::{TestEntry, TestResult};

use super::overlay::{Assessment, Evidence};
use super::table::{RuleTable, TestType, Timing, Window};
use super::types::Verdict;
use super::OUT_OF_RANGE;

pub(crate) const INVALID_TYPE: &str = "Test type is not valid";
pub(crate) const POSITIVE: &str = "Test Result is positive";

fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn assess(entries: &[TestEntry], table: &RuleTable, now: DateTime<Utc>) -> Assessment {
    let Some(entry) = entries.iter().max_by_key(|t| t.sample_collection_time) else {
        return Assessment::terminal(Verdict::not_valid(INVALID_TYPE));
    };

    let Some(offsets) = TestType::from_code(&entry.type_of_test).and_then(|kind| table.test(kind))
    else {
        return Assessment::terminal(Verdict::not_valid(INVALID_TYPE));
    };
    if entry.result == TestResult::Detected {
        return Assessment::new(Evidence::Test, Verdict::not_valid(POSITIVE));
    }
    let Some(window) = Window::hours_from(entry.sample_collection_time, offsets) else {
        return Assessment::terminal(Verdict::not_valid(OUT_OF_RANGE));
    };

    let verdict = match window.classify(now) {
        Timing::NotYet => Verdict::not_valid_yet(format!(
            "Test Result is not valid yet, starts at {}",
            timestamp(window.from)
        )),
        Timing::Expired => Verdict::not_valid(format!(
            "Test Result is expired at {}",
            timestamp(window.until)
        )),
        Timing::Within => Verdict::valid(format!(
            "Test Result is valid [ {} - {} ]",
            timestamp(window.from),
            timestamp(window.until)
        )),
    };
    Assessment::new(Evidence::Test, verdict)
}
