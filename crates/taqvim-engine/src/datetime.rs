//! The core date engine: a timezone-aware value object over a canonical
//! instant, with translated formatting and free-text modification.
//!
//! `ExtDateTime` owns exactly one piece of time state — the canonical
//! [`DateTime<Tz>`] instant — and derives everything else on demand. Calendar
//! plugins (see [`crate::jalali`]) wrap this engine by composition and reuse
//! its resolution, translation, and directive paths.

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::directive;
use crate::error::{CalendarError, Result};
use crate::relative;
use crate::translate::{is_plain_numeric, TranslationTable, Translator, BASE_KEYWORDS};

// ── Input specs ─────────────────────────────────────────────────────────────

/// A time argument: epoch seconds, free text, or an existing instant.
///
/// Text consisting solely of an optionally signed integer resolves as epoch
/// seconds, the way the original host treats `"1234567890"`.
#[derive(Debug, Clone)]
pub enum TimeSpec {
    Timestamp(i64),
    Text(String),
    Instant(DateTime<Utc>),
}

impl From<i64> for TimeSpec {
    fn from(ts: i64) -> Self {
        TimeSpec::Timestamp(ts)
    }
}

impl From<&str> for TimeSpec {
    fn from(s: &str) -> Self {
        TimeSpec::Text(s.to_string())
    }
}

impl From<String> for TimeSpec {
    fn from(s: String) -> Self {
        TimeSpec::Text(s)
    }
}

impl From<DateTime<Utc>> for TimeSpec {
    fn from(dt: DateTime<Utc>) -> Self {
        TimeSpec::Instant(dt)
    }
}

impl From<&ExtDateTime> for TimeSpec {
    fn from(engine: &ExtDateTime) -> Self {
        TimeSpec::Instant(engine.instant.with_timezone(&Utc))
    }
}

/// A timezone argument: an IANA identifier or an already resolved [`Tz`].
#[derive(Debug, Clone)]
pub enum TzSpec {
    Name(String),
    Tz(Tz),
}

impl TzSpec {
    pub(crate) fn resolve(&self) -> Result<Tz> {
        match self {
            TzSpec::Name(name) => relative::parse_timezone(name),
            TzSpec::Tz(tz) => Ok(*tz),
        }
    }
}

impl From<&str> for TzSpec {
    fn from(s: &str) -> Self {
        TzSpec::Name(s.to_string())
    }
}

impl From<String> for TzSpec {
    fn from(s: String) -> Self {
        TzSpec::Name(s)
    }
}

impl From<Tz> for TzSpec {
    fn from(tz: Tz) -> Self {
        TzSpec::Tz(tz)
    }
}

fn resolve_tz(spec: Option<&TzSpec>, fallback: Tz) -> Result<Tz> {
    match spec {
        Some(spec) => spec.resolve(),
        None => Ok(fallback),
    }
}

/// True for `[+-]?\d+`, the epoch-seconds text form.
pub(crate) fn is_epoch_text(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

// ── Core engine ─────────────────────────────────────────────────────────────

/// The Gregorian date engine.
#[derive(Clone)]
pub struct ExtDateTime {
    /// The canonical absolute time. Every derived coordinate is computed
    /// from this; nothing else in the struct holds time state.
    instant: DateTime<Tz>,
    translator: Option<Translator>,
    /// Lazily built on first back-translation, dropped whenever the
    /// translator reference changes.
    translations: OnceCell<TranslationTable>,
    /// Calendar plugins extend the fixed keyword set (month names).
    extra_keywords: &'static [&'static str],
}

impl ExtDateTime {
    /// Create an engine. An absent `time` means now, an absent `timezone`
    /// means UTC.
    ///
    /// # Errors
    ///
    /// [`CalendarError::InvalidTimezone`] for an unknown identifier,
    /// [`CalendarError::Parse`] when free text is rejected by the
    /// expression parser.
    pub fn new(
        time: Option<TimeSpec>,
        timezone: Option<TzSpec>,
        translator: Option<Translator>,
    ) -> Result<Self> {
        Self::with_keywords(time, timezone, translator, &[])
    }

    pub(crate) fn with_keywords(
        time: Option<TimeSpec>,
        timezone: Option<TzSpec>,
        translator: Option<Translator>,
        extra_keywords: &'static [&'static str],
    ) -> Result<Self> {
        let tz = resolve_tz(timezone.as_ref(), Tz::UTC)?;
        let mut engine = Self {
            instant: Utc::now().with_timezone(&tz),
            translator: None,
            translations: OnceCell::new(),
            extra_keywords,
        };
        engine.set_translator(translator);

        match time {
            None => {}
            Some(TimeSpec::Timestamp(ts)) => engine.instant = instant_at(ts, tz)?,
            Some(TimeSpec::Instant(dt)) => engine.instant = dt.with_timezone(&tz),
            Some(TimeSpec::Text(text)) if is_epoch_text(text.trim()) => {
                let ts: i64 = text
                    .trim()
                    .parse()
                    .map_err(|_| CalendarError::Parse(format!("'{}'", text)))?;
                engine.instant = instant_at(ts, tz)?;
            }
            Some(TimeSpec::Text(text)) => {
                let text = engine.back_translate(&text);
                engine.instant = relative::resolve_expression(&text, tz, engine.instant)?;
            }
        }

        Ok(engine)
    }

    /// The canonical instant in the engine's timezone.
    pub fn instant(&self) -> DateTime<Tz> {
        self.instant
    }

    /// The engine's timezone.
    pub fn timezone(&self) -> Tz {
        self.instant.timezone()
    }

    pub(crate) fn translator(&self) -> Option<Translator> {
        self.translator.clone()
    }

    // ── Mutation ────────────────────────────────────────────────────────────

    /// Re-point the engine at a new time. Free text and absent `time` are
    /// resolved through a throwaway engine (in `timezone` if given, else the
    /// current one) and committed through [`Self::set_timestamp`].
    pub fn set(&mut self, time: Option<TimeSpec>, timezone: Option<TzSpec>) -> Result<&mut Self> {
        let ts = match time {
            Some(TimeSpec::Timestamp(ts)) => ts,
            Some(TimeSpec::Instant(dt)) => dt.timestamp(),
            Some(TimeSpec::Text(ref text)) if is_epoch_text(text.trim()) => text
                .trim()
                .parse()
                .map_err(|_| CalendarError::Parse(format!("'{}'", text)))?,
            other => {
                let tz = resolve_tz(timezone.as_ref(), self.timezone())?;
                let probe = Self::with_keywords(
                    other,
                    Some(TzSpec::Tz(tz)),
                    self.translator.clone(),
                    self.extra_keywords,
                )?;
                probe.get_timestamp()
            }
        };
        self.set_timestamp(ts)
    }

    /// Switch the engine's timezone, keeping the instant.
    pub fn set_timezone(&mut self, timezone: impl Into<TzSpec>) -> Result<&mut Self> {
        let tz = timezone.into().resolve()?;
        self.instant = self.instant.with_timezone(&tz);
        Ok(self)
    }

    /// Apply a free-text relative expression (after back-translation).
    pub fn modify(&mut self, expression: &str) -> Result<&mut Self> {
        let expression = self.back_translate(expression);
        self.instant = relative::apply_modify(self.instant, &expression)?;
        Ok(self)
    }

    /// Set the Gregorian calendar date, keeping the time of day.
    ///
    /// Out-of-range month and day values normalize arithmetically (month 0
    /// is December of the previous year, day overflow carries forward).
    pub fn set_date(&mut self, year: i32, month: i32, day: i32) -> Result<&mut Self> {
        let date = relative::normalized_date(year as i64, month as i64, day as i64)
            .ok_or_else(|| {
                CalendarError::Parse(format!("date out of range: {year}-{month}-{day}"))
            })?;
        self.instant = relative::rebind_local(self.instant, date)?;
        Ok(self)
    }

    /// Epoch seconds of the canonical instant.
    pub fn get_timestamp(&self) -> i64 {
        self.instant.timestamp()
    }

    /// Move the engine to `target` epoch seconds.
    ///
    /// The move is expressed as a whole-day plus remaining-second relative
    /// shift and applied through the modify pipeline rather than an absolute
    /// set; an extended engine only has to interpose on one mutation path.
    pub fn set_timestamp(&mut self, target: i64) -> Result<&mut Self> {
        let diff = target - self.get_timestamp();
        let days = diff.div_euclid(86400);
        let seconds = diff - days * 86400;
        self.instant = relative::apply_modify(self.instant, &format!("{days} days {seconds} seconds"))?;
        Ok(self)
    }

    // ── Formatting ──────────────────────────────────────────────────────────

    /// Render `format` directive by directive. A `\` emits the next
    /// character literally. Name-rendering directives (`M F D l S a A`) pass
    /// through the translation hook.
    ///
    /// A `timezone` override applies to this call only; the engine's own
    /// timezone is untouched on every exit path.
    pub fn format(&self, format: &str, timezone: Option<TzSpec>) -> Result<String> {
        let dt = self.effective_instant(timezone)?;
        Ok(self.format_at(&dt, format))
    }

    /// The instant viewed through an optional timezone override. The stored
    /// instant is never mutated, which is what makes override scoping safe.
    pub(crate) fn effective_instant(&self, timezone: Option<TzSpec>) -> Result<DateTime<Tz>> {
        let tz = resolve_tz(timezone.as_ref(), self.timezone())?;
        Ok(self.instant.with_timezone(&tz))
    }

    pub(crate) fn format_at(&self, dt: &DateTime<Tz>, format: &str) -> String {
        let mut out = String::new();
        let mut chars = format.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                // A trailing backslash emits itself.
                out.push(chars.next().unwrap_or('\\'));
            } else {
                out.push_str(&self.render_directive(dt, ch));
            }
        }
        out
    }

    pub(crate) fn render_directive(&self, dt: &DateTime<Tz>, ch: char) -> String {
        let rendered = directive::render(dt, ch);
        if directive::TRANSLATED.contains(&ch) {
            self.translate(&rendered)
        } else {
            rendered
        }
    }

    // ── Translation ─────────────────────────────────────────────────────────

    /// Swap the translator. The translation table is invalidated only when
    /// the reference actually changes.
    pub fn set_translator(&mut self, translator: Option<Translator>) {
        let changed = match (&self.translator, &translator) {
            (None, None) => false,
            (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
            _ => true,
        };
        if changed {
            self.translator = translator;
            self.translations = OnceCell::new();
        }
    }

    /// Localize a string through the translator, if one is set.
    pub fn translate(&self, s: &str) -> String {
        match &self.translator {
            Some(translator) => translator(s),
            None => s.to_string(),
        }
    }

    /// Canonicalize localized keywords in `s` before expression parsing.
    ///
    /// A no-op without a translator, for empty input, and for input that is
    /// purely digits, separators, and whitespace.
    pub fn back_translate(&self, s: &str) -> String {
        let Some(translator) = &self.translator else {
            return s.to_string();
        };
        if s.is_empty() || is_plain_numeric(s) {
            return s.to_string();
        }
        let table = self.translations.get_or_init(|| {
            TranslationTable::build(
                BASE_KEYWORDS
                    .iter()
                    .copied()
                    .chain(self.extra_keywords.iter().copied()),
                translator,
            )
        });
        table.back_substitute(s)
    }
}

impl fmt::Debug for ExtDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtDateTime")
            .field("instant", &self.instant)
            .field("translator", &self.translator.is_some())
            .finish()
    }
}

fn instant_at(ts: i64, tz: Tz) -> Result<DateTime<Tz>> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.with_timezone(&tz))
        .ok_or_else(|| CalendarError::Parse(format!("timestamp out of range: {ts}")))
}
