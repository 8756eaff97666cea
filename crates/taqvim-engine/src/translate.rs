//! Keyword translation between canonical (English) and localized forms.
//!
//! Formatting localizes on output by running a user-supplied translator over
//! the handful of directives that render human-readable names. Free-text
//! input goes the other way: before an expression reaches the parser, every
//! localized keyword is substituted back to its canonical form so the parser
//! only ever sees English. The keyword set is fixed — this is a substitution
//! table, not a locale framework.

use std::sync::Arc;

/// A translator callback (gettext-style): canonical keyword in, localized
/// form out. Unknown inputs should be returned unchanged.
pub type Translator = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Every keyword the parser understands and the formatter can emit:
/// weekday and month names with their abbreviations, relative-date words,
/// unit words, ordinal suffixes, and meridiem markers.
pub(crate) const BASE_KEYWORDS: &[&str] = &[
    "Friday", "Fri", "Saturday", "Sat", "Sunday", "Sun", "Monday", "Mon",
    "Tuesday", "Tue", "Wednesday", "Wed", "Thursday", "Thu",
    "August", "Aug", "September", "Sep", "October", "Oct", "November", "Nov",
    "December", "Dec", "January", "Jan", "February", "Feb", "March", "Mar",
    "April", "Apr", "May", "June", "Jun", "July", "Jul", "Today",
    "Yesterday", "Tomorrow", "Next", "Last", "Previous", "Year",
    "Month", "Week", "Day", "Hour", "Minute", "Second",
    "st", "nd", "rd", "th", "am", "AM", "pm", "PM",
];

/// Canonical/localized keyword pairs, ordered for back-substitution.
#[derive(Debug, Clone)]
pub(crate) struct TranslationTable {
    /// `(canonical, localized)` pairs sorted by localized length, longest
    /// first, so an abbreviation that is a prefix of a full name can never
    /// clip the full name's substitution.
    entries: Vec<(String, String)>,
}

impl TranslationTable {
    /// Run `translator` over every keyword and record the pairs.
    pub(crate) fn build<'a, I>(keywords: I, translator: &Translator) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut entries: Vec<(String, String)> = keywords
            .into_iter()
            .map(|kw| (kw.to_string(), translator(kw)))
            .collect();
        entries.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        Self { entries }
    }

    /// Substitute every localized keyword in `input` back to its canonical
    /// form, longest localized form first.
    pub(crate) fn back_substitute(&self, input: &str) -> String {
        let mut out = input.to_string();
        for (canonical, localized) in &self.entries {
            if localized != canonical {
                out = out.replace(localized.as_str(), canonical);
            }
        }
        out
    }
}

/// True when the string carries no translatable text: only digits,
/// date separators, and whitespace. Pure numeric dates skip back-translation.
pub(crate) fn is_plain_numeric(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_digit() || c == '-' || c == '\\' || c == '/' || c.is_whitespace())
}
