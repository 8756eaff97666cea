//! # taqvim-engine
//!
//! An extensible date/time value object over multiple calendar systems.
//!
//! The core engine ([`ExtDateTime`]) holds one canonical timezone-aware
//! instant and layers three things over it: a per-directive format renderer
//! in the classic `date()` style (with `\` escaping), a free-text relative
//! modification pipeline (`"+2 months"`, `"next week"`, `"tomorrow noon"`),
//! and an optional translation hook that localizes rendered names and
//! canonicalizes localized input before parsing. Calendar plugins such as
//! [`JalaliDateTime`] wrap the engine and reinterpret dates, month names,
//! and year/month arithmetic in their own calendar while sharing everything
//! else. [`factory`] picks a plugin by name at runtime.
//!
//! ## Modules
//!
//! - [`datetime`] — The core Gregorian engine and its input specs
//! - [`calendar`] — Runtime calendar selection ([`factory`], [`CalendarDateTime`])
//! - [`jalali`] — The Jalali (Persian) calendar plugin and pure day-count conversions
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```
//! use taqvim_engine::{factory, TzSpec};
//!
//! let mut dt = factory(
//!     "jalali",
//!     Some("1392/1/1".into()),
//!     Some(TzSpec::from("Asia/Tehran")),
//!     None,
//! )?;
//! assert_eq!(dt.format("Y-m-d", None)?, "1392-01-01");
//! dt.modify("+2 months 1 day")?;
//! assert_eq!(dt.format("j F Y", None)?, "2 Khordad 1392");
//! # Ok::<(), taqvim_engine::CalendarError>(())
//! ```

pub mod calendar;
pub mod datetime;
pub mod error;
pub mod jalali;

mod directive;
mod relative;
mod translate;

pub use calendar::{factory, CalendarDateTime};
pub use datetime::{ExtDateTime, TimeSpec, TzSpec};
pub use error::CalendarError;
pub use jalali::{
    gregorian_to_jalali, is_jalali_leap, jalali_check_date, jalali_to_gregorian, JalaliDate,
    JalaliDateTime,
};
pub use translate::Translator;
