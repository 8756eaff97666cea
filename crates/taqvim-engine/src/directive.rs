//! Single-character format directive rendering over the Gregorian calendar.
//!
//! The format engine walks a format string one character at a time and asks
//! this module to render each one from the effective instant. Characters
//! outside the directive set emit themselves, which is what lets separators
//! like `-` and `:` pass through a format string untouched.

use chrono::{DateTime, Datelike, Offset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Directives whose rendering is a human-readable name, subject to the
/// translation hook: month name (full/abbreviated), weekday name
/// (full/abbreviated), ordinal suffix, and meridiem marker.
pub(crate) const TRANSLATED: &[char] = &['M', 'F', 'D', 'l', 'S', 'a', 'A'];

/// Render one directive character from `dt`.
pub(crate) fn render(dt: &DateTime<Tz>, ch: char) -> String {
    match ch {
        // Day
        'd' => format!("{:02}", dt.day()),
        'j' => dt.day().to_string(),
        'D' => dt.format("%a").to_string(),
        'l' => dt.format("%A").to_string(),
        'N' => dt.weekday().number_from_monday().to_string(),
        'S' => ordinal_suffix(dt.day()).to_string(),
        'w' => dt.weekday().num_days_from_sunday().to_string(),
        'z' => dt.ordinal0().to_string(),

        // Week
        'W' => format!("{:02}", dt.iso_week().week()),
        'o' => dt.iso_week().year().to_string(),

        // Month
        'F' => dt.format("%B").to_string(),
        'M' => dt.format("%b").to_string(),
        'm' => format!("{:02}", dt.month()),
        'n' => dt.month().to_string(),
        't' => days_in_gregorian_month(dt.year(), dt.month()).to_string(),

        // Year
        'L' => if is_gregorian_leap(dt.year()) { "1" } else { "0" }.to_string(),
        'Y' => dt.year().to_string(),
        'y' => format!("{:02}", dt.year().rem_euclid(100)),

        // Time
        'a' => if dt.hour12().0 { "pm" } else { "am" }.to_string(),
        'A' => if dt.hour12().0 { "PM" } else { "AM" }.to_string(),
        'g' => dt.hour12().1.to_string(),
        'h' => format!("{:02}", dt.hour12().1),
        'G' => dt.hour().to_string(),
        'H' => format!("{:02}", dt.hour()),
        'i' => format!("{:02}", dt.minute()),
        's' => format!("{:02}", dt.second()),
        'u' => format!("{:06}", dt.timestamp_subsec_micros()),
        'v' => format!("{:03}", dt.timestamp_subsec_millis()),

        // Timezone
        'e' => dt.timezone().name().to_string(),
        'I' => if is_dst_active(dt) { "1" } else { "0" }.to_string(),
        'O' => format_utc_offset(dt, false),
        'P' => format_utc_offset(dt, true),
        'T' => dt.format("%Z").to_string(),
        'Z' => dt.offset().fix().local_minus_utc().to_string(),

        // Full date/time
        'c' => dt.to_rfc3339(),
        'r' => dt.to_rfc2822(),
        'U' => dt.timestamp().to_string(),

        other => other.to_string(),
    }
}

/// English ordinal suffix for a day of the month (1st, 2nd, 3rd, 4th, …, 11th–13th).
fn ordinal_suffix(day: u32) -> &'static str {
    match day % 100 {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

/// Gregorian leap rule: divisible by 4 and (not by 100 or by 400).
pub(crate) fn is_gregorian_leap(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in a Gregorian month.
pub(crate) fn days_in_gregorian_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_gregorian_leap(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Determine if DST is active for a datetime in its timezone.
fn is_dst_active(dt: &DateTime<Tz>) -> bool {
    // Compare January 1 offset (winter / standard) with the current offset.
    // If they differ, DST is active.
    let tz = dt.timezone();
    let utc = dt.with_timezone(&Utc);

    let jan1 = Utc
        .with_ymd_and_hms(utc.year(), 1, 1, 12, 0, 0)
        .single()
        .unwrap_or(utc);
    let jan1_local = jan1.with_timezone(&tz);

    let current_offset = dt.offset().fix().local_minus_utc();
    let jan_offset = jan1_local.offset().fix().local_minus_utc();

    current_offset != jan_offset
}

/// Format the UTC offset as a string ("+0330" or "+03:30").
fn format_utc_offset(dt: &DateTime<Tz>, colon: bool) -> String {
    let offset_secs = dt.offset().fix().local_minus_utc();
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    if colon {
        format!("{sign}{hours:02}:{minutes:02}")
    } else {
        format!("{sign}{hours:02}{minutes:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(tz: Tz, y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Tz> {
        tz.with_ymd_and_hms(y, m, d, h, min, s).single().unwrap()
    }

    #[test]
    fn day_and_month_directives() {
        let dt = at(Tz::UTC, 2013, 3, 21, 14, 5, 9);
        assert_eq!(render(&dt, 'd'), "21");
        assert_eq!(render(&dt, 'j'), "21");
        assert_eq!(render(&dt, 'n'), "3");
        assert_eq!(render(&dt, 'm'), "03");
        assert_eq!(render(&dt, 'F'), "March");
        assert_eq!(render(&dt, 'M'), "Mar");
        assert_eq!(render(&dt, 'S'), "st");
        assert_eq!(render(&dt, 't'), "31");
    }

    #[test]
    fn weekday_convention_is_sunday_zero() {
        // 2013-03-21 was a Thursday.
        let dt = at(Tz::UTC, 2013, 3, 21, 0, 0, 0);
        assert_eq!(render(&dt, 'w'), "4");
        assert_eq!(render(&dt, 'N'), "4");
        assert_eq!(render(&dt, 'D'), "Thu");
        assert_eq!(render(&dt, 'l'), "Thursday");
    }

    #[test]
    fn time_directives() {
        let dt = at(Tz::UTC, 2013, 3, 21, 14, 5, 9);
        assert_eq!(render(&dt, 'H'), "14");
        assert_eq!(render(&dt, 'G'), "14");
        assert_eq!(render(&dt, 'g'), "2");
        assert_eq!(render(&dt, 'h'), "02");
        assert_eq!(render(&dt, 'a'), "pm");
        assert_eq!(render(&dt, 'A'), "PM");
        assert_eq!(render(&dt, 'i'), "05");
        assert_eq!(render(&dt, 's'), "09");
    }

    #[test]
    fn offset_directives() {
        let dt = at(Tz::Asia__Tehran, 2013, 1, 15, 12, 0, 0);
        assert_eq!(render(&dt, 'O'), "+0330");
        assert_eq!(render(&dt, 'P'), "+03:30");
        assert_eq!(render(&dt, 'Z'), "12600");
        assert_eq!(render(&dt, 'e'), "Asia/Tehran");
    }

    #[test]
    fn non_directive_characters_emit_themselves() {
        let dt = at(Tz::UTC, 2013, 3, 21, 0, 0, 0);
        assert_eq!(render(&dt, '-'), "-");
        assert_eq!(render(&dt, ':'), ":");
        assert_eq!(render(&dt, 'q'), "q");
    }

    #[test]
    fn ordinal_suffix_teens() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(2), "nd");
        assert_eq!(ordinal_suffix(3), "rd");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(12), "th");
        assert_eq!(ordinal_suffix(13), "th");
        assert_eq!(ordinal_suffix(21), "st");
    }
}
