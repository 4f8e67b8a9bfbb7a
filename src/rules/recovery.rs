use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::certificate::RecoveryEntry;

use super::overlay::{Assessment, Evidence};
use super::table::{RuleTable, Timing, Window, midnight};
use super::types::Verdict;
use super::OUT_OF_RANGE;

pub(crate) const NOT_VALID: &str = "Recovery statement is not valid";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

/// Issuer dates win over the table; the table fills whatever is missing.
fn resolve(entry: &RecoveryEntry, table: &RuleTable) -> Result<Window, &'static str> {
    let fr = entry.first_positive_test_date;
    let bound = |issued: Option<NaiveDate>, offset: Option<i64>| -> Result<NaiveDate, &'static str> {
        match issued {
            Some(date) => Ok(date),
            None => shift(fr, offset.ok_or(NOT_VALID)?).ok_or(OUT_OF_RANGE),
        }
    };
    let from = bound(entry.valid_from, table.recovery_start_day())?;
    let until = bound(entry.valid_until, table.recovery_end_day())?;
    Ok(Window {
        from: midnight(from),
        until: midnight(until),
    })
}

pub(crate) fn assess(entries: &[RecoveryEntry], table: &RuleTable, now: DateTime<Utc>) -> Assessment {
    let Some(entry) = entries.iter().max_by_key(|r| r.first_positive_test_date) else {
        return Assessment::terminal(Verdict::not_valid(NOT_VALID));
    };

    let window = match resolve(entry, table) {
        Ok(window) => window,
        Err(message) => return Assessment::terminal(Verdict::not_valid(message)),
    };
    let from = window.from.format(DATE_FORMAT);
    let until = window.until.format(DATE_FORMAT);

    let verdict = match window.classify(now) {
        Timing::NotYet => {
            Verdict::not_valid_yet(format!("Recovery statement is not valid yet, starts at {from}"))
        }
        Timing::Expired => Verdict::not_valid(format!("Recovery statement is expired at {until}")),
        Timing::Within => {
            Verdict::valid(format!("Recovery statement is valid [ {from} - {until} ]"))
        }
    };
    Assessment::new(Evidence::Recovery, verdict)
}
