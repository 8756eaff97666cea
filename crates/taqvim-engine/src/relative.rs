//! Free-text date expression resolution and relative-modify arithmetic.
//!
//! This is the host layer under the date engine: it turns an already
//! back-translated expression into an absolute instant, or applies a
//! sequence of relative clauses to an existing instant. If an expression
//! cannot be parsed unambiguously, we return an error rather than guessing.
//!
//! # Supported input
//!
//! **Absolute**: RFC 3339, `Y-m-d H:M[:S]`, `Y/m/d H:M[:S]`, `Y-m-d`, `Y/m/d`
//! (numeric fields may be unpadded).
//!
//! **Relative clauses**, composable in one expression:
//! `+2 hours`, `-1 day`, `3 months` (sign optional), `next week`,
//! `last year`, `previous month`, `tomorrow`, `yesterday`, `today`,
//! `midnight`, `noon`.
//!
//! Month and year arithmetic keeps the day number and lets an overflow past
//! the target month's length spill into the following month (Jan 31 + 1
//! month = Mar 3), matching the C `mktime` normalization the original
//! behavior contract is written against. Day and week arithmetic preserves
//! wall-clock time across DST transitions.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;

use crate::error::{CalendarError, Result};

// ── Expression resolution ───────────────────────────────────────────────────

/// Resolve a free-text expression to an instant in `tz`.
///
/// Absolute forms are tried first; anything else is treated as a sequence of
/// relative clauses applied to `anchor`. An empty expression resolves to the
/// anchor itself.
pub(crate) fn resolve_expression(
    expression: &str,
    tz: Tz,
    anchor: DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Ok(anchor);
    }

    if let Some(dt) = try_absolute(trimmed, tz) {
        return Ok(dt);
    }

    apply_modify(anchor, trimmed)
}

/// Try the absolute datetime formats, most specific first.
fn try_absolute(s: &str, tz: Tz) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&tz));
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return bind_local(tz, naive).ok();
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return bind_local(tz, naive).ok();
        }
    }

    None
}

// ── Relative modification ───────────────────────────────────────────────────

/// Calendar units a relative clause can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

fn parse_unit(s: &str) -> Option<Unit> {
    match s.to_ascii_lowercase().as_str() {
        "year" | "years" => Some(Unit::Year),
        "month" | "months" => Some(Unit::Month),
        "week" | "weeks" => Some(Unit::Week),
        "day" | "days" => Some(Unit::Day),
        "hour" | "hours" => Some(Unit::Hour),
        "minute" | "minutes" | "min" | "mins" => Some(Unit::Minute),
        "second" | "seconds" | "sec" | "secs" => Some(Unit::Second),
        _ => None,
    }
}

fn clause_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:([+-]?\d+)\s*(years?|months?|weeks?|days?|hours?|minutes?|mins?|seconds?|secs?)\b|(next|last|previous)\s+(year|month|week|day|hour|minute|second)s?\b|\b(tomorrow|yesterday|today|midnight|noon)\b)",
        )
        .expect("clause pattern is valid")
    })
}

/// Apply a sequence of relative clauses to `dt`.
///
/// Every non-whitespace character of `expr` must belong to some clause;
/// leftover text is a parse error, never silently dropped.
pub(crate) fn apply_modify(dt: DateTime<Tz>, expr: &str) -> Result<DateTime<Tz>> {
    let re = clause_pattern();
    let mut result = dt;
    let mut matched_any = false;
    let mut last_end = 0;

    for caps in re.captures_iter(expr) {
        let whole = caps.get(0).expect("group 0 always present");
        if !is_filler(&expr[last_end..whole.start()]) {
            return Err(parse_error(expr));
        }
        last_end = whole.end();
        matched_any = true;

        result = if let (Some(n), Some(unit)) = (caps.get(1), caps.get(2)) {
            let n: i64 = n.as_str().parse().map_err(|_| parse_error(expr))?;
            let unit = parse_unit(unit.as_str()).ok_or_else(|| parse_error(expr))?;
            apply_clause(result, n, unit)?
        } else if let (Some(word), Some(unit)) = (caps.get(3), caps.get(4)) {
            let n = if word.as_str().eq_ignore_ascii_case("next") {
                1
            } else {
                -1
            };
            let unit = parse_unit(unit.as_str()).ok_or_else(|| parse_error(expr))?;
            apply_clause(result, n, unit)?
        } else if let Some(word) = caps.get(5) {
            apply_keyword(result, &word.as_str().to_ascii_lowercase())?
        } else {
            return Err(parse_error(expr));
        };
    }

    if !matched_any || !is_filler(&expr[last_end..]) {
        return Err(parse_error(expr));
    }

    Ok(result)
}

fn parse_error(expr: &str) -> CalendarError {
    CalendarError::Parse(format!("'{}'", expr.trim()))
}

/// Only whitespace and commas may separate clauses.
fn is_filler(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace() || c == ',')
}

fn apply_clause(dt: DateTime<Tz>, n: i64, unit: Unit) -> Result<DateTime<Tz>> {
    match unit {
        Unit::Year => shift_months(dt, n * 12),
        Unit::Month => shift_months(dt, n),
        Unit::Week => shift_days(dt, n * 7),
        Unit::Day => shift_days(dt, n),
        Unit::Hour => Ok(dt + Duration::seconds(n * 3600)),
        Unit::Minute => Ok(dt + Duration::seconds(n * 60)),
        Unit::Second => Ok(dt + Duration::seconds(n)),
    }
}

fn apply_keyword(dt: DateTime<Tz>, word: &str) -> Result<DateTime<Tz>> {
    match word {
        "tomorrow" => at_time(shift_days(dt, 1)?, 0, 0, 0),
        "yesterday" => at_time(shift_days(dt, -1)?, 0, 0, 0),
        "today" | "midnight" => at_time(dt, 0, 0, 0),
        "noon" => at_time(dt, 12, 0, 0),
        _ => Err(parse_error(word)),
    }
}

// ── Date arithmetic ─────────────────────────────────────────────────────────

/// Build a date from possibly out-of-range month and day values, mktime
/// style: month 0 is December of the previous year, month 13 is January of
/// the next, and a day past the month's length carries forward.
pub(crate) fn normalized_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    let carry = (month - 1).div_euclid(12);
    let month0 = (month - 1).rem_euclid(12);
    let year = i32::try_from(year + carry).ok()?;
    let first = NaiveDate::from_ymd_opt(year, (month0 + 1) as u32, 1)?;
    first.checked_add_signed(Duration::days(day - 1))
}

/// Shift by whole months, keeping the day number (overflow carries forward).
fn shift_months(dt: DateTime<Tz>, months: i64) -> Result<DateTime<Tz>> {
    let date = normalized_date(
        dt.year() as i64,
        dt.month() as i64 + months,
        dt.day() as i64,
    )
    .ok_or_else(|| CalendarError::Parse("date out of range after month shift".to_string()))?;
    rebind_local(dt, date)
}

/// Shift by whole days, preserving wall-clock time across DST transitions.
fn shift_days(dt: DateTime<Tz>, days: i64) -> Result<DateTime<Tz>> {
    let date = dt
        .date_naive()
        .checked_add_signed(Duration::days(days))
        .ok_or_else(|| CalendarError::Parse("date out of range after day shift".to_string()))?;
    rebind_local(dt, date)
}

/// Keep `dt`'s wall-clock time but move it to `date`.
pub(crate) fn rebind_local(dt: DateTime<Tz>, date: NaiveDate) -> Result<DateTime<Tz>> {
    bind_local(dt.timezone(), date.and_time(dt.time()))
}

/// Set the wall-clock time on `dt`'s current date.
fn at_time(dt: DateTime<Tz>, h: u32, m: u32, s: u32) -> Result<DateTime<Tz>> {
    let naive = dt
        .date_naive()
        .and_hms_opt(h, m, s)
        .ok_or_else(|| CalendarError::Parse("invalid time of day".to_string()))?;
    bind_local(dt.timezone(), naive)
}

/// Bind a naive local datetime in `tz`. A DST fold resolves to its first
/// occurrence; a DST gap normalizes forward to the first valid wall time
/// after the transition. Timezones whose transitions fall at midnight
/// (Iran's did, through 2022) skip the entire first day's midnight, so gap
/// handling is load-bearing for plain date input, not just odd hours.
fn bind_local(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(first, _) => Ok(first),
        LocalResult::None => {
            // Walk forward in minute steps until the wall clock resumes.
            // Real gaps are 30 minutes to 2 hours; 3 hours bounds the scan.
            let mut probe = naive + Duration::minutes(1);
            let limit = naive + Duration::hours(3);
            while probe <= limit {
                match tz.from_local_datetime(&probe) {
                    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => return Ok(dt),
                    LocalResult::None => probe += Duration::minutes(1),
                }
            }
            Err(CalendarError::Parse(format!(
                "no valid local time near {naive}"
            )))
        }
    }
}

/// Parse an IANA timezone identifier into `Tz`.
pub(crate) fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| CalendarError::InvalidTimezone(format!("'{}'", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Tz> {
        Tz::UTC.with_ymd_and_hms(y, m, d, h, min, s).single().unwrap()
    }

    #[test]
    fn absolute_formats() {
        let anchor = utc(2000, 1, 1, 0, 0, 0);
        let dt = resolve_expression("2013-03-21 10:30:00", Tz::UTC, anchor).unwrap();
        assert_eq!(dt, utc(2013, 3, 21, 10, 30, 0));

        // Unpadded fields, slash separator, bare date.
        let dt = resolve_expression("2013/3/21", Tz::UTC, anchor).unwrap();
        assert_eq!(dt, utc(2013, 3, 21, 0, 0, 0));
    }

    #[test]
    fn empty_expression_is_the_anchor() {
        let anchor = utc(2020, 5, 6, 7, 8, 9);
        assert_eq!(resolve_expression("  ", Tz::UTC, anchor).unwrap(), anchor);
    }

    #[test]
    fn signed_and_worded_clauses() {
        let dt = utc(2013, 3, 21, 10, 0, 0);
        assert_eq!(
            apply_modify(dt, "+2 days").unwrap(),
            utc(2013, 3, 23, 10, 0, 0)
        );
        assert_eq!(
            apply_modify(dt, "-1 week").unwrap(),
            utc(2013, 3, 14, 10, 0, 0)
        );
        assert_eq!(
            apply_modify(dt, "next year").unwrap(),
            utc(2014, 3, 21, 10, 0, 0)
        );
        assert_eq!(
            apply_modify(dt, "previous month").unwrap(),
            utc(2013, 2, 21, 10, 0, 0)
        );
    }

    #[test]
    fn clauses_compose_left_to_right() {
        let dt = utc(2013, 3, 21, 10, 0, 0);
        assert_eq!(
            apply_modify(dt, "1 day 3600 seconds").unwrap(),
            utc(2013, 3, 22, 11, 0, 0)
        );
        assert_eq!(
            apply_modify(dt, "tomorrow noon").unwrap(),
            utc(2013, 3, 22, 12, 0, 0)
        );
    }

    #[test]
    fn month_overflow_carries_like_mktime() {
        let dt = utc(2013, 1, 31, 9, 0, 0);
        assert_eq!(
            apply_modify(dt, "+1 month").unwrap(),
            utc(2013, 3, 3, 9, 0, 0)
        );
    }

    #[test]
    fn day_shift_preserves_wall_clock_across_dst() {
        // US DST starts 2026-03-08; 09:00 local stays 09:00 local.
        let tz: Tz = "America/New_York".parse().unwrap();
        let dt = tz.with_ymd_and_hms(2026, 3, 7, 9, 0, 0).single().unwrap();
        let shifted = apply_modify(dt, "+1 day").unwrap();
        assert_eq!(shifted.hour(), 9);
        assert_eq!(shifted.day(), 8);
    }

    #[test]
    fn midnight_dst_gap_normalizes_forward() {
        // Tehran's clocks jumped 00:00 -> 01:00 on 2013-03-22, so that
        // day's midnight never existed on the wall clock. A bare date must
        // still resolve, landing on the first valid wall time.
        let tz: Tz = "Asia/Tehran".parse().unwrap();
        let anchor = tz.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).single().unwrap();
        let dt = resolve_expression("2013-03-22", tz, anchor).unwrap();
        assert_eq!((dt.day(), dt.hour(), dt.minute()), (22, 1, 0));

        // A day shift from the previous midnight lands in the same gap.
        let base = tz.with_ymd_and_hms(2013, 3, 21, 0, 0, 0).single().unwrap();
        let shifted = apply_modify(base, "+1 day").unwrap();
        assert_eq!((shifted.day(), shifted.hour()), (22, 1));
    }

    #[test]
    fn dst_fold_binds_to_first_occurrence() {
        use chrono::Offset;
        // Tehran's clocks fell back 00:00 -> 23:00 ending 2013-09-21; the
        // repeated hour resolves to its first (daylight, +04:30) pass.
        let tz: Tz = "Asia/Tehran".parse().unwrap();
        let anchor = tz.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).single().unwrap();
        let dt = resolve_expression("2013-09-21 23:30:00", tz, anchor).unwrap();
        assert_eq!(dt.offset().fix().local_minus_utc(), 4 * 3600 + 30 * 60);
    }

    #[test]
    fn leftover_text_is_rejected() {
        let dt = utc(2013, 3, 21, 0, 0, 0);
        assert!(apply_modify(dt, "2 fortnights").is_err());
        assert!(apply_modify(dt, "+1 day banana").is_err());
        assert!(apply_modify(dt, "").is_err());
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
        assert!(parse_timezone("Asia/Tehran").is_ok());
    }

    #[test]
    fn normalized_date_handles_out_of_range_fields() {
        // Month 0 is December of the previous year.
        assert_eq!(
            normalized_date(2013, 0, 5),
            NaiveDate::from_ymd_opt(2012, 12, 5)
        );
        // Day overflow carries forward.
        assert_eq!(
            normalized_date(2013, 2, 30),
            NaiveDate::from_ymd_opt(2013, 3, 2)
        );
    }
}
