//! Calendar plugin selection.
//!
//! [`factory`] maps a calendar name to a concrete engine behind the
//! [`CalendarDateTime`] enum. The variant set is closed: adding a calendar
//! means adding a variant and its match arms, and the compiler walks every
//! dispatch site for you. Callers that know the calendar at compile time can
//! construct [`ExtDateTime`] or [`JalaliDateTime`] directly and skip the
//! enum entirely.

use chrono_tz::Tz;

use crate::datetime::{ExtDateTime, TimeSpec, TzSpec};
use crate::error::{CalendarError, Result};
use crate::jalali::JalaliDateTime;
use crate::translate::Translator;

/// A date engine for a calendar chosen at runtime.
#[derive(Debug, Clone)]
pub enum CalendarDateTime {
    Gregorian(ExtDateTime),
    Jalali(JalaliDateTime),
}

/// Build an engine for the named calendar. Names are matched ASCII
/// case-insensitively; `"persian"` is an alias for `"jalali"`.
///
/// # Errors
///
/// [`CalendarError::PluginNotFound`] for an unrecognized name, plus whatever
/// the chosen engine's constructor rejects.
pub fn factory(
    calendar: &str,
    time: Option<TimeSpec>,
    timezone: Option<TzSpec>,
    translator: Option<Translator>,
) -> Result<CalendarDateTime> {
    match calendar.to_ascii_lowercase().as_str() {
        "gregorian" => Ok(CalendarDateTime::Gregorian(ExtDateTime::new(
            time, timezone, translator,
        )?)),
        "jalali" | "persian" => Ok(CalendarDateTime::Jalali(JalaliDateTime::new(
            time, timezone, translator,
        )?)),
        other => Err(CalendarError::PluginNotFound(other.to_string())),
    }
}

impl CalendarDateTime {
    pub fn set(&mut self, time: Option<TimeSpec>, timezone: Option<TzSpec>) -> Result<&mut Self> {
        match self {
            CalendarDateTime::Gregorian(e) => {
                e.set(time, timezone)?;
            }
            CalendarDateTime::Jalali(e) => {
                e.set(time, timezone)?;
            }
        }
        Ok(self)
    }

    pub fn set_timezone(&mut self, timezone: impl Into<TzSpec>) -> Result<&mut Self> {
        match self {
            CalendarDateTime::Gregorian(e) => {
                e.set_timezone(timezone)?;
            }
            CalendarDateTime::Jalali(e) => {
                e.set_timezone(timezone)?;
            }
        }
        Ok(self)
    }

    pub fn modify(&mut self, expression: &str) -> Result<&mut Self> {
        match self {
            CalendarDateTime::Gregorian(e) => {
                e.modify(expression)?;
            }
            CalendarDateTime::Jalali(e) => {
                e.modify(expression)?;
            }
        }
        Ok(self)
    }

    /// Set the calendar date in the active calendar's own coordinates.
    pub fn set_date(&mut self, year: i32, month: i32, day: i32) -> Result<&mut Self> {
        match self {
            CalendarDateTime::Gregorian(e) => {
                e.set_date(year, month, day)?;
            }
            CalendarDateTime::Jalali(e) => {
                e.set_date(year, month, day)?;
            }
        }
        Ok(self)
    }

    pub fn format(&self, format: &str, timezone: Option<TzSpec>) -> Result<String> {
        match self {
            CalendarDateTime::Gregorian(e) => e.format(format, timezone),
            CalendarDateTime::Jalali(e) => e.format(format, timezone),
        }
    }

    pub fn get_timestamp(&self) -> i64 {
        match self {
            CalendarDateTime::Gregorian(e) => e.get_timestamp(),
            CalendarDateTime::Jalali(e) => e.get_timestamp(),
        }
    }

    pub fn set_timestamp(&mut self, target: i64) -> Result<&mut Self> {
        match self {
            CalendarDateTime::Gregorian(e) => {
                e.set_timestamp(target)?;
            }
            CalendarDateTime::Jalali(e) => {
                e.set_timestamp(target)?;
            }
        }
        Ok(self)
    }

    pub fn set_translator(&mut self, translator: Option<Translator>) {
        match self {
            CalendarDateTime::Gregorian(e) => e.set_translator(translator),
            CalendarDateTime::Jalali(e) => e.set_translator(translator),
        }
    }

    pub fn timezone(&self) -> Tz {
        match self {
            CalendarDateTime::Gregorian(e) => e.timezone(),
            CalendarDateTime::Jalali(e) => e.timezone(),
        }
    }
}
