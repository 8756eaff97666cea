//! The Jalali (Persian) calendar plugin.
//!
//! [`JalaliDateTime`] wraps the core [`ExtDateTime`] engine: the canonical
//! instant stays Gregorian underneath, and every Jalali coordinate is derived
//! through the pure day-count conversions in this module. Formatting, date
//! setting, and relative modification are reinterpreted in Jalali units;
//! everything else (timezones, timestamps, translation) is the base engine's.
//!
//! # Conversion algorithm
//!
//! Both directions go through an absolute day index over a shared epoch
//! (offset 79 days between the two calendars' year-1600/979 origins), using
//! the Jalali 33-year leap cycle (12053 days = 33·365 + 8 leap days,
//! 1461 = 4·365 + 1) and the Gregorian 400-year cycle (146097 days). The
//! conversions perform **no input validation** — out-of-range fields flow
//! through the arithmetic and normalize as day counts. Callers needing
//! validity checks use [`jalali_check_date`].

use std::sync::OnceLock;

use chrono::Datelike;
use regex::Regex;
use serde::Serialize;

use crate::datetime::{is_epoch_text, ExtDateTime, TimeSpec, TzSpec};
use crate::error::Result;
use crate::translate::Translator;

// ── Calendar data ───────────────────────────────────────────────────────────

const GREGORIAN_MONTH_DAYS: [i64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Months 1–11 have fixed lengths; month 12 has 29 days, or 30 in a leap year.
const JALALI_MONTH_DAYS: [i64; 12] = [31, 31, 31, 31, 31, 31, 30, 30, 30, 30, 30, 29];

/// Canonical Jalali month names. There is no abbreviated form; the `M` and
/// `F` directives both render the full name.
pub const JALALI_MONTHS: [&str; 12] = [
    "Farvardin",
    "Ordibehesht",
    "Khordad",
    "Tir",
    "Mordad",
    "Shahrivar",
    "Mehr",
    "Aban",
    "Azar",
    "Dey",
    "Bahman",
    "Esfand",
];

/// A Jalali calendar coordinate, derived from a canonical instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JalaliDate {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

// ── Pure conversions ────────────────────────────────────────────────────────

/// Jalali leap year test over the 33-year cycle.
pub fn is_jalali_leap(year: i32) -> bool {
    (year - 979) % 33 % 4 == 0
}

/// Validate a Jalali (month, day, year) triple. Month 12 allows day 30 only
/// in a leap year.
pub fn jalali_check_date(month: i32, day: i32, year: i32) -> bool {
    if !(0..=32767).contains(&year) || !(1..=12).contains(&month) || day < 1 {
        return false;
    }
    let mut max = JALALI_MONTH_DAYS[(month - 1) as usize];
    if month == 12 && is_jalali_leap(year) {
        max += 1;
    }
    (day as i64) <= max
}

/// Convert a Jalali date to its Gregorian (year, month, day) equivalent.
pub fn jalali_to_gregorian(jy: i32, jm: i32, jd: i32) -> (i32, i32, i32) {
    let y = (jy - 979) as i64;
    let months_before: i64 = JALALI_MONTH_DAYS
        .iter()
        .take((jm - 1).max(0) as usize)
        .sum();
    let j_day_no = 365 * y + (y / 33) * 8 + (y % 33 + 3) / 4 + months_before + (jd - 1) as i64;

    let mut g_day_no = j_day_no + 79;

    let mut gy = 1600 + 400 * (g_day_no / 146097); // 146097 = 365*400 + 400/4 - 400/100 + 400/400
    g_day_no %= 146097;

    let mut leap = true;
    if g_day_no >= 36525 {
        // 36525 = 365*100 + 100/4
        g_day_no -= 1;
        gy += 100 * (g_day_no / 36524); // 36524 = 365*100 + 100/4 - 100/100
        g_day_no %= 36524;

        if g_day_no >= 365 {
            g_day_no += 1;
        } else {
            leap = false;
        }
    }

    gy += 4 * (g_day_no / 1461); // 1461 = 365*4 + 4/4
    g_day_no %= 1461;

    if g_day_no >= 366 {
        leap = false;
        g_day_no -= 1;
        gy += g_day_no / 365;
        g_day_no %= 365;
    }

    let mut month = 0usize;
    loop {
        let len = GREGORIAN_MONTH_DAYS[month] + (month == 1 && leap) as i64;
        if g_day_no < len {
            break;
        }
        g_day_no -= len;
        month += 1;
    }

    (gy as i32, (month + 1) as i32, (g_day_no + 1) as i32)
}

/// Convert a Gregorian date to its Jalali (year, month, day) equivalent.
pub fn gregorian_to_jalali(gy: i32, gm: i32, gd: i32) -> (i32, i32, i32) {
    let y = (gy - 1600) as i64;
    let mut g_day_no = 365 * y + (y + 3) / 4 - (y + 99) / 100 + (y + 399) / 400;

    g_day_no += GREGORIAN_MONTH_DAYS
        .iter()
        .take((gm - 1).max(0) as usize)
        .sum::<i64>();
    if gm > 2 && (y % 4 == 0 && y % 100 != 0 || y % 400 == 0) {
        // leap year, date is after February
        g_day_no += 1;
    }
    g_day_no += (gd - 1) as i64;

    let mut j_day_no = g_day_no - 79;

    let cycles = j_day_no / 12053; // 12053 = 33*365 + 33/4
    j_day_no %= 12053;

    let mut jy = 979 + 33 * cycles + 4 * (j_day_no / 1461);
    j_day_no %= 1461;

    if j_day_no >= 366 {
        jy += (j_day_no - 1) / 365;
        j_day_no = (j_day_no - 1) % 365;
    }

    let mut month = 0usize;
    while month < 11 && j_day_no >= JALALI_MONTH_DAYS[month] {
        j_day_no -= JALALI_MONTH_DAYS[month];
        month += 1;
    }

    (jy as i32, (month + 1) as i32, (j_day_no + 1) as i32)
}

// ── Embedded-date rewriting ─────────────────────────────────────────────────

/// Numeric triples must share one separator on both sides.
fn numeric_date_patterns() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        ["-", r"\\", "/"]
            .iter()
            .map(|sep| {
                Regex::new(&format!(r"(\d{{2,4}}){sep}(\d{{1,2}}){sep}(\d{{1,2}})"))
                    .expect("numeric date pattern is valid")
            })
            .collect()
    })
}

/// Day–month-name–year form, again with one shared separator.
fn named_date_patterns() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        let names = JALALI_MONTHS.join("|");
        ["-", " "]
            .iter()
            .map(|sep| {
                Regex::new(&format!(r"(?i)(\d{{1,2}}){sep}({names}){sep}(\d{{2,4}})"))
                    .expect("named date pattern is valid")
            })
            .collect()
    })
}

/// A two-digit Jalali year lives in the 1300s.
fn promote_year(s: &str) -> i32 {
    let promoted = if s.len() == 2 {
        format!("13{s}")
    } else {
        s.to_string()
    };
    promoted.parse().unwrap_or(0)
}

/// Find an embedded Jalali-looking date in `s` and rewrite it in place to a
/// `-`-joined Gregorian triple. Numeric triples take precedence over the
/// day–month-name–year form; within a form the earliest match wins. Strings
/// without a recognizable date pass through unchanged.
pub(crate) fn jalali_to_gregorian_str(s: &str) -> String {
    let jalali = numeric_date_patterns()
        .iter()
        .filter_map(|re| re.captures(s))
        .min_by_key(|caps| caps.get(0).map(|m| m.start()))
        .map(|caps| {
            let year = promote_year(&caps[1]);
            let month: i32 = caps[2].parse().unwrap_or(0);
            let day: i32 = caps[3].parse().unwrap_or(0);
            (caps.get(0).expect("group 0").range(), year, month, day)
        })
        .or_else(|| {
            named_date_patterns()
                .iter()
                .filter_map(|re| re.captures(s))
                .min_by_key(|caps| caps.get(0).map(|m| m.start()))
                .map(|caps| {
                    let day: i32 = caps[1].parse().unwrap_or(0);
                    let month = JALALI_MONTHS
                        .iter()
                        .position(|name| name.eq_ignore_ascii_case(&caps[2]))
                        .map(|idx| idx as i32 + 1)
                        .unwrap_or(0);
                    let year = promote_year(&caps[3]);
                    (caps.get(0).expect("group 0").range(), year, month, day)
                })
        });

    match jalali {
        Some((range, jy, jm, jd)) => {
            let (gy, gm, gd) = jalali_to_gregorian(jy, jm, jd);
            format!("{}{gy}-{gm}-{gd}{}", &s[..range.start], &s[range.end..])
        }
        None => s.to_string(),
    }
}

// ── Relative year/month phrases ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YearMonth {
    Year,
    Month,
}

fn year_month_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)((?:[+-]?\d+)|next|last|previous)\s*(years?|months?)\b")
            .expect("year/month pattern is valid")
    })
}

/// Split out the calendar-unit relative phrases the host parser must never
/// see, returning them in order plus the expression with the phrases removed.
fn split_year_month_phrases(s: &str) -> (Vec<(i32, YearMonth)>, String) {
    let re = year_month_pattern();
    let mut phrases = Vec::new();
    let mut remainder = String::new();
    let mut last_end = 0;

    for caps in re.captures_iter(s) {
        let whole = caps.get(0).expect("group 0 always present");
        remainder.push_str(&s[last_end..whole.start()]);
        last_end = whole.end();

        let word = caps.get(1).expect("change group").as_str();
        let delta = if word.eq_ignore_ascii_case("next") {
            1
        } else if word.eq_ignore_ascii_case("last") || word.eq_ignore_ascii_case("previous") {
            -1
        } else {
            word.parse().unwrap_or(0)
        };
        let unit = if caps
            .get(2)
            .expect("unit group")
            .as_str()
            .to_ascii_lowercase()
            .starts_with("year")
        {
            YearMonth::Year
        } else {
            YearMonth::Month
        };
        phrases.push((delta, unit));
    }
    remainder.push_str(&s[last_end..]);

    (phrases, remainder)
}

// ── The plugin engine ───────────────────────────────────────────────────────

/// A date engine that reads and writes Jalali calendar coordinates over the
/// core engine's canonical instant.
#[derive(Debug, Clone)]
pub struct JalaliDateTime {
    base: ExtDateTime,
}

impl JalaliDateTime {
    /// Create a Jalali engine. Free text may embed a Jalali date (numeric
    /// triple or `day month-name year`) and relative `year`/`month` phrases;
    /// the date is rewritten to Gregorian before the host parser sees it and
    /// the phrases are re-applied afterwards in Jalali units, because the
    /// host has no notion of calendar-specific months.
    pub fn new(
        time: Option<TimeSpec>,
        timezone: Option<TzSpec>,
        translator: Option<Translator>,
    ) -> Result<Self> {
        match time {
            Some(TimeSpec::Text(text)) if !is_epoch_text(text.trim()) => {
                let scratch = ExtDateTime::with_keywords(
                    None,
                    timezone.clone(),
                    translator.clone(),
                    &JALALI_MONTHS,
                )?;
                let text = scratch.back_translate(&text);
                let text = jalali_to_gregorian_str(&text);
                let (phrases, remainder) = split_year_month_phrases(&text);

                let base = ExtDateTime::with_keywords(
                    Some(TimeSpec::Text(remainder)),
                    timezone,
                    translator,
                    &JALALI_MONTHS,
                )?;
                let mut engine = Self { base };
                for (delta, unit) in phrases {
                    engine.apply_year_month(delta, unit)?;
                }
                Ok(engine)
            }
            other => Ok(Self {
                base: ExtDateTime::with_keywords(other, timezone, translator, &JALALI_MONTHS)?,
            }),
        }
    }

    /// The current Jalali coordinate.
    pub fn jalali_date(&self) -> JalaliDate {
        let dt = self.base.instant();
        let (year, month, day) =
            gregorian_to_jalali(dt.year(), dt.month() as i32, dt.day() as i32);
        JalaliDate { year, month, day }
    }

    /// Re-point the engine; free text goes through the full Jalali
    /// construction pipeline.
    pub fn set(&mut self, time: Option<TimeSpec>, timezone: Option<TzSpec>) -> Result<&mut Self> {
        match time {
            Some(TimeSpec::Text(text)) if !is_epoch_text(text.trim()) => {
                let tz = match &timezone {
                    Some(spec) => spec.resolve()?,
                    None => self.base.timezone(),
                };
                let probe = Self::new(
                    Some(TimeSpec::Text(text)),
                    Some(tz.into()),
                    self.base.translator(),
                )?;
                self.base.set_timestamp(probe.get_timestamp())?;
                Ok(self)
            }
            other => {
                self.base.set(other, timezone)?;
                Ok(self)
            }
        }
    }

    /// Set the Jalali calendar date, keeping the time of day. The triple is
    /// converted and committed through the core engine's date-setting path.
    /// No validation happens here; see [`jalali_check_date`].
    pub fn set_date(&mut self, year: i32, month: i32, day: i32) -> Result<&mut Self> {
        let (gy, gm, gd) = jalali_to_gregorian(year, month, day);
        self.base.set_date(gy, gm, gd)?;
        Ok(self)
    }

    /// Apply a free-text relative expression. Year and month phrases are
    /// applied in Jalali units with overflow/underflow carried into the
    /// year; everything else delegates to the base engine.
    pub fn modify(&mut self, expression: &str) -> Result<&mut Self> {
        let expression = self.base.back_translate(expression);
        let (phrases, remainder) = split_year_month_phrases(&expression);
        for (delta, unit) in phrases {
            self.apply_year_month(delta, unit)?;
        }
        if !remainder.trim().is_empty() {
            self.base.modify(remainder.trim())?;
        }
        Ok(self)
    }

    /// The calendar-aware relative callback: shift the current Jalali
    /// coordinate by `delta` years or months and commit through
    /// [`Self::set_date`].
    ///
    /// The day component is held fixed — no clamping to the target month's
    /// length. A day past the end of the resulting month normalizes
    /// arithmetically in the conversion (1400-06-31 plus one month lands on
    /// 1400-08-01, not 1400-07-30). Long-standing contract; keep it.
    fn apply_year_month(&mut self, delta: i32, unit: YearMonth) -> Result<()> {
        let JalaliDate {
            mut year,
            mut month,
            day,
        } = self.jalali_date();

        match unit {
            YearMonth::Year => year += delta,
            YearMonth::Month => {
                month += delta;
                if month > 12 {
                    year += month / 12;
                    month %= 12;
                } else if month < 1 {
                    year += month / 12 - 1;
                    month = month % 12 + 12;
                }
            }
        }

        self.set_date(year, month, day)?;
        Ok(())
    }

    /// Render `format` with Jalali directive overrides; any directive not
    /// overridden here delegates to the base engine (translation hook
    /// included). A `timezone` override is scoped to this call.
    pub fn format(&self, format: &str, timezone: Option<TzSpec>) -> Result<String> {
        let dt = self.base.effective_instant(timezone)?;
        let (jy, jm, jd) = gregorian_to_jalali(dt.year(), dt.month() as i32, dt.day() as i32);

        let mut out = String::new();
        let mut chars = format.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => out.push(chars.next().unwrap_or('\\')),
                'y' => out.push_str(&format!("{jy:04}")[2..]),
                'Y' => out.push_str(&jy.to_string()),
                // No abbreviated month names exist in the Jalali calendar.
                'F' | 'M' => {
                    out.push_str(&self.base.translate(JALALI_MONTHS[(jm - 1) as usize]))
                }
                'm' => out.push_str(&format!("{jm:02}")),
                'n' => out.push_str(&jm.to_string()),
                'd' => out.push_str(&format!("{jd:02}")),
                'j' => out.push_str(&jd.to_string()),
                // Jalali weeks start on Saturday: 0 = Saturday … 6 = Friday.
                'w' => out.push_str(&jalali_weekday(&dt).to_string()),
                't' => out.push_str(&month_length(jy, jm).to_string()),
                'z' => out.push_str(&day_of_year(jm, jd).to_string()),
                'L' => out.push(if is_jalali_leap(jy) { '1' } else { '0' }),
                'W' => out.push_str(&week_of_year(jy, jm, jd, jalali_weekday(&dt)).to_string()),
                other => out.push_str(&self.base.render_directive(&dt, other)),
            }
        }
        Ok(out)
    }

    // ── Base-engine passthroughs ────────────────────────────────────────────

    pub fn set_timezone(&mut self, timezone: impl Into<TzSpec>) -> Result<&mut Self> {
        self.base.set_timezone(timezone)?;
        Ok(self)
    }

    pub fn set_translator(&mut self, translator: Option<Translator>) {
        self.base.set_translator(translator);
    }

    pub fn get_timestamp(&self) -> i64 {
        self.base.get_timestamp()
    }

    pub fn set_timestamp(&mut self, target: i64) -> Result<&mut Self> {
        self.base.set_timestamp(target)?;
        Ok(self)
    }

    pub fn timezone(&self) -> chrono_tz::Tz {
        self.base.timezone()
    }
}

impl From<&JalaliDateTime> for TimeSpec {
    fn from(engine: &JalaliDateTime) -> Self {
        TimeSpec::from(&engine.base)
    }
}

/// Weekday with Saturday as day 0 (the host counts from Sunday).
fn jalali_weekday(dt: &chrono::DateTime<chrono_tz::Tz>) -> i64 {
    (dt.weekday().num_days_from_sunday() as i64 + 1) % 7
}

/// Length of a Jalali month; month 12 depends on the leap test.
fn month_length(jy: i32, jm: i32) -> i64 {
    if jm < 12 {
        JALALI_MONTH_DAYS[(jm - 1) as usize]
    } else if jalali_check_date(12, 30, jy) {
        30
    } else {
        29
    }
}

/// Zero-based day of the Jalali year.
fn day_of_year(jm: i32, jd: i32) -> i64 {
    JALALI_MONTH_DAYS
        .iter()
        .take((jm - 1) as usize)
        .sum::<i64>()
        + (jd - 1) as i64
}

/// Week number, weeks starting on Saturday. Days before the year's first
/// Saturday roll back into the previous year's final week.
fn week_of_year(jy: i32, jm: i32, jd: i32, weekday: i64) -> i64 {
    let mut z = day_of_year(jm, jd);
    let mut first_saturday = (z - weekday + 7) % 7;
    let mut days = z - first_saturday;
    if days < 0 {
        // Range-checked leap test: a previous year outside [0, 32767] never
        // counts as leap, even when the bare cycle formula says otherwise.
        z += if jalali_check_date(12, 30, jy - 1) { 366 } else { 365 };
        first_saturday = (z - weekday + 7) % 7;
        days = z - first_saturday;
    }
    days / 7 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;
    use proptest::prelude::*;

    use crate::directive::days_in_gregorian_month;

    fn jalali(time: &str) -> JalaliDateTime {
        JalaliDateTime::new(Some(time.into()), Some(Tz::UTC.into()), None).unwrap()
    }

    #[test]
    fn fixed_points() {
        assert_eq!(gregorian_to_jalali(2013, 3, 21), (1392, 1, 1));
        assert_eq!(jalali_to_gregorian(1392, 1, 1), (2013, 3, 21));
        assert_eq!(gregorian_to_jalali(1979, 2, 11), (1357, 11, 22));
        assert_eq!(jalali_to_gregorian(1357, 11, 22), (1979, 2, 11));
    }

    #[test]
    fn leap_rule_matches_check_date() {
        for year in 1300..1500 {
            assert_eq!(
                jalali_check_date(12, 30, year),
                (year - 979) % 33 % 4 == 0,
                "year {year}"
            );
        }
    }

    #[test]
    fn check_date_bounds() {
        assert!(jalali_check_date(1, 31, 1392));
        assert!(!jalali_check_date(7, 31, 1392));
        assert!(jalali_check_date(7, 30, 1392));
        assert!(!jalali_check_date(0, 1, 1392));
        assert!(!jalali_check_date(13, 1, 1392));
        assert!(!jalali_check_date(1, 0, 1392));
        assert!(!jalali_check_date(1, 1, -1));
        assert!(!jalali_check_date(1, 1, 32768));
    }

    proptest! {
        #[test]
        fn gregorian_round_trip(
            year in 1700i32..=2700,
            month in 1i32..=12,
            day_seed in 1u32..=31,
        ) {
            let day = day_seed.min(days_in_gregorian_month(year, month as u32)) as i32;
            let (jy, jm, jd) = gregorian_to_jalali(year, month, day);
            prop_assert!(jalali_check_date(jm, jd, jy));
            prop_assert_eq!(jalali_to_gregorian(jy, jm, jd), (year, month, day));
        }

        #[test]
        fn jalali_round_trip(
            year in 1100i32..=2100,
            month in 1i32..=12,
            day_seed in 1i64..=31,
        ) {
            let day = day_seed.min(if month == 12 && is_jalali_leap(year) {
                30
            } else {
                JALALI_MONTH_DAYS[(month - 1) as usize]
            }) as i32;
            prop_assert!(jalali_check_date(month, day, year));
            let (gy, gm, gd) = jalali_to_gregorian(year, month, day);
            prop_assert_eq!(gregorian_to_jalali(gy, gm, gd), (year, month, day));
        }
    }

    #[test]
    fn embedded_date_rewriting() {
        assert_eq!(jalali_to_gregorian_str("1392/1/1"), "2013-3-21");
        assert_eq!(jalali_to_gregorian_str("92-1-1"), "2013-3-21");
        assert_eq!(jalali_to_gregorian_str("1 Farvardin 1392"), "2013-3-21");
        assert_eq!(jalali_to_gregorian_str("22-Bahman-57"), "1979-2-11");
        assert_eq!(
            jalali_to_gregorian_str("due 1392/1/1 sharp"),
            "due 2013-3-21 sharp"
        );
        // Mixed separators never form a date.
        assert_eq!(jalali_to_gregorian_str("1392-1/1"), "1392-1/1");
        assert_eq!(jalali_to_gregorian_str("no date here"), "no date here");
    }

    #[test]
    fn constructs_from_jalali_text() {
        let gregorian = crate::ExtDateTime::new(Some("2013-03-21".into()), None, None).unwrap();

        assert_eq!(jalali("1392/1/1").get_timestamp(), gregorian.get_timestamp());
        assert_eq!(
            jalali("1 Farvardin 1392").get_timestamp(),
            gregorian.get_timestamp()
        );
        assert_eq!(jalali("92/1/1").get_timestamp(), gregorian.get_timestamp());
    }

    #[test]
    fn construction_applies_relative_phrases_in_jalali_units() {
        let e = jalali("1392/1/1 +2 month");
        assert_eq!(e.format("Y-m-d", None).unwrap(), "1392-03-01");

        let e = jalali("1392/1/1 next year");
        assert_eq!(e.format("Y-m-d", None).unwrap(), "1393-01-01");
    }

    #[test]
    fn format_directives() {
        // 1392-01-01 = Thursday 2013-03-21.
        let e = jalali("1392/1/1");
        assert_eq!(e.format("Y-m-d", None).unwrap(), "1392-01-01");
        assert_eq!(e.format("y", None).unwrap(), "92");
        assert_eq!(e.format("n/j", None).unwrap(), "1/1");
        assert_eq!(e.format("F", None).unwrap(), "Farvardin");
        assert_eq!(e.format("M", None).unwrap(), "Farvardin");
        assert_eq!(e.format("w", None).unwrap(), "5");
        assert_eq!(e.format("z", None).unwrap(), "0");
        assert_eq!(e.format("t", None).unwrap(), "31");
        assert_eq!(e.format("L", None).unwrap(), "0");
        // Day 1 of 1392 precedes the year's first Saturday, so it belongs
        // to the closing week of leap year 1391.
        assert_eq!(e.format("W", None).unwrap(), "52");
        // Escapes and non-Jalali directives delegate.
        assert_eq!(e.format(r"\Y Y", None).unwrap(), "Y 1392");
        assert_eq!(e.format("l", None).unwrap(), "Thursday");
        assert_eq!(e.format("H:i", None).unwrap(), "00:00");
    }

    #[test]
    fn month_twelve_length_follows_leap_cycle() {
        // 1391 is leap, 1392 is not.
        let mut e = jalali("1392/1/1");
        e.set_date(1391, 12, 1).unwrap();
        assert_eq!(e.format("t", None).unwrap(), "30");
        e.set_date(1392, 12, 1).unwrap();
        assert_eq!(e.format("t", None).unwrap(), "29");
    }

    #[test]
    fn relative_month_carry_across_year() {
        let mut e = jalali("1392/1/1");
        e.set_date(1400, 11, 15).unwrap();
        e.modify("+3 month").unwrap();
        assert_eq!(e.format("Y-m-d", None).unwrap(), "1401-02-15");

        // Underflow carries the other way.
        e.modify("-2 month").unwrap();
        assert_eq!(e.format("Y-m-d", None).unwrap(), "1400-12-15");
    }

    #[test]
    fn day_is_not_clamped_on_month_carry() {
        // Month 6 has 31 days, month 7 only 30: the held day 31 normalizes
        // arithmetically into 7/31 -> 8/1 instead of clamping to 7/30.
        let mut e = jalali("1392/1/1");
        e.set_date(1400, 6, 31).unwrap();
        e.modify("+1 month").unwrap();
        assert_eq!(e.format("Y-m-d", None).unwrap(), "1400-08-01");
    }

    #[test]
    fn mixed_modify_splits_units() {
        let mut e = jalali("1392/1/1");
        e.modify("+1 month +1 day").unwrap();
        assert_eq!(e.format("Y-m-d", None).unwrap(), "1392-02-02");

        e.modify("next year 2 hours").unwrap();
        assert_eq!(e.format("Y-m-d H:i", None).unwrap(), "1393-02-02 02:00");
    }

    #[test]
    fn new_year_dates_resolve_in_tehran() {
        // Tehran's DST switch fell at midnight of 1392-01-02 (2013-03-22),
        // swallowing that day's midnight entirely. The calendar's own
        // new-year dates must still resolve, normalized to the first valid
        // wall time.
        let e = JalaliDateTime::new(Some("1392/1/2".into()), Some("Asia/Tehran".into()), None)
            .unwrap();
        assert_eq!(e.format("Y-m-d H:i", None).unwrap(), "1392-01-02 01:00");

        let mut e = JalaliDateTime::new(Some("1392/1/1".into()), Some("Asia/Tehran".into()), None)
            .unwrap();
        e.modify("+1 day").unwrap();
        assert_eq!(e.format("Y-m-d H:i", None).unwrap(), "1392-01-02 01:00");

        e.set_date(1392, 1, 2).unwrap();
        assert_eq!(e.format("Y-m-d", None).unwrap(), "1392-01-02");
    }

    #[test]
    fn set_resolves_jalali_text() {
        let mut e = jalali("1392/1/1");
        e.set(Some("1357/11/22".into()), None).unwrap();
        assert_eq!(e.format("Y-m-d", None).unwrap(), "1357-11-22");

        // Timestamps bypass the text pipeline.
        e.set(Some(0.into()), None).unwrap();
        assert_eq!(e.format("Y-m-d", None).unwrap(), "1348-10-11");
    }

    #[test]
    fn jalali_month_names_back_translate_in_input() {
        use std::sync::Arc;
        let translator: Translator = Arc::new(|s: &str| {
            if s == "Farvardin" {
                "فروردین".to_string()
            } else {
                s.to_string()
            }
        });
        let e = JalaliDateTime::new(
            Some("1 فروردین 1392".into()),
            Some(Tz::UTC.into()),
            Some(translator),
        )
        .unwrap();
        assert_eq!(e.format("Y-m-d", None).unwrap(), "1392-01-01");
    }

    #[test]
    fn week_rollback_uses_range_checked_leap_test() {
        // Year -15 satisfies the bare 33-year cycle formula but fails the
        // range check, so rolling week numbering back into it must count
        // 365 days, not 366.
        assert!(is_jalali_leap(-15));
        assert!(!jalali_check_date(12, 30, -15));
        assert_eq!(week_of_year(-14, 1, 1, 2), 52);
    }

    #[test]
    fn jalali_date_accessor() {
        let e = jalali("1357/11/22");
        assert_eq!(
            e.jalali_date(),
            JalaliDate {
                year: 1357,
                month: 11,
                day: 22
            }
        );
    }
}
