//! Due-window computation at minute resolution.

use {
    chrono::{DateTime, Duration},
    chrono_tz::Tz,
    cron::Schedule,
};

use crate::error::{Error, Result};

/// Parse a cron expression.
///
/// The `cron` crate requires 7 fields (sec min hour dom month dow year).
/// Stored jobs carry the standard 5 fields (min hour dom month dow), so a
/// failed parse is retried with "0" prepended for seconds and "*" appended
/// for year.
pub fn parse_expression(expr: &str) -> Result<Schedule> {
    expr.parse::<Schedule>()
        .or_else(|_| format!("0 {expr} *").parse::<Schedule>())
        .map_err(|e| Error::invalid_expression(expr, e.to_string()))
}

/// Check an expression against the cron grammar without evaluating it.
pub fn validate_expression(expr: &str) -> Result<()> {
    parse_expression(expr).map(|_| ())
}

/// Whether a job with this expression is due at `now`.
///
/// Matching is at minute resolution: the expression's previous-or-current
/// fire (found by anchoring one minute back) and its next fire are both
/// compared against `now`'s minute, so a tick landing anywhere within a
/// scheduled minute still matches. Best-effort only — a skipped tick misses
/// its window and an overlapping tick can in principle double-fire.
pub fn is_due(expr: &str, now: DateTime<Tz>) -> Result<bool> {
    let schedule = parse_expression(expr)?;
    let minute = minute_key(&now);

    let lookback = now - Duration::seconds(60);
    let previous = schedule.after(&lookback).next();
    let next = schedule.after(&now).next();

    Ok(previous
        .into_iter()
        .chain(next)
        .any(|t| minute_key(&t) == minute))
}

fn minute_key(t: &DateTime<Tz>) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {chrono::TimeZone, chrono_tz::Europe::Lisbon};

    use super::*;

    #[test]
    fn due_exactly_on_the_minute() {
        let now = Lisbon.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert!(is_due("0 12 * * *", now).unwrap());
    }

    #[test]
    fn due_mid_minute() {
        // Ticks rarely land on second zero; anywhere in the minute matches.
        let now = Lisbon.with_ymd_and_hms(2024, 1, 1, 12, 0, 37).unwrap();
        assert!(is_due("0 12 * * *", now).unwrap());
    }

    #[test]
    fn not_due_one_minute_early() {
        let now = Lisbon.with_ymd_and_hms(2024, 1, 1, 11, 59, 30).unwrap();
        assert!(!is_due("0 12 * * *", now).unwrap());
    }

    #[test]
    fn not_due_one_minute_late() {
        let now = Lisbon.with_ymd_and_hms(2024, 1, 1, 12, 1, 30).unwrap();
        assert!(!is_due("0 12 * * *", now).unwrap());
    }

    #[test]
    fn weekly_matches_weekday() {
        // 2024-01-01 was a Monday.
        let monday = Lisbon.with_ymd_and_hms(2024, 1, 1, 12, 0, 15).unwrap();
        assert!(is_due("0 12 * * 1", monday).unwrap());

        let tuesday = Lisbon.with_ymd_and_hms(2024, 1, 2, 12, 0, 15).unwrap();
        assert!(!is_due("0 12 * * 1", tuesday).unwrap());
    }

    #[test]
    fn every_minute_is_always_due() {
        let now = Lisbon.with_ymd_and_hms(2024, 6, 15, 9, 41, 22).unwrap();
        assert!(is_due("* * * * *", now).unwrap());
    }

    #[test]
    fn custom_weekday_set() {
        // 2024-01-03 was a Wednesday (weekday 3).
        let wednesday = Lisbon.with_ymd_and_hms(2024, 1, 3, 9, 30, 10).unwrap();
        assert!(is_due("30 9 * * 1,3,5", wednesday).unwrap());

        let thursday = Lisbon.with_ymd_and_hms(2024, 1, 4, 9, 30, 10).unwrap();
        assert!(!is_due("30 9 * * 1,3,5", thursday).unwrap());
    }

    #[test]
    fn invalid_expression_is_an_error() {
        let now = Lisbon.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let err = is_due("not a cron", now).unwrap_err();
        assert!(matches!(err, Error::InvalidExpression { .. }));
    }

    #[test]
    fn validate_accepts_five_field() {
        assert!(validate_expression("0 12 * * *").is_ok());
        assert!(validate_expression("59 23 * * 0,6").is_ok());
    }

    #[test]
    fn validate_rejects_garbage() {
        assert!(validate_expression("every day at noon").is_err());
        assert!(validate_expression("").is_err());
    }
}
