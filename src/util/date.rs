//! Date display helpers: fixed-format dates and "time ago" strings.
//!
//! Naive timestamps (no offset) are read in the display offset, date-only
//! values as UTC midnight. Anything unparseable renders as an empty string.

use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

const DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const DATE_TIME: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const NAIVE_FORMATS: [&[BorrowedFormatItem<'_>]; 4] = [
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateInput {
    Text(String),
    /// Milliseconds since the Unix epoch.
    Millis(i64),
    At(OffsetDateTime),
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for DateInput {
    fn from(value: i64) -> Self {
        Self::Millis(value)
    }
}

impl From<OffsetDateTime> for DateInput {
    fn from(value: OffsetDateTime) -> Self {
        Self::At(value)
    }
}

/// Interpret `input` as an instant. Empty text and a zero timestamp count as
/// missing.
#[must_use]
pub fn parse_date(input: &DateInput, offset: UtcOffset) -> Option<OffsetDateTime> {
    match input {
        DateInput::At(at) => Some(*at),
        DateInput::Millis(0) => None,
        DateInput::Millis(ms) => OffsetDateTime::from_unix_timestamp_nanos(i128::from(*ms) * 1_000_000).ok(),
        DateInput::Text(text) => parse_text(text.trim(), offset),
    }
}

fn parse_text(text: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    if text.is_empty() {
        return None;
    }
    if let Ok(at) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(at);
    }
    if let Some(naive) = NAIVE_FORMATS.iter().find_map(|f| PrimitiveDateTime::parse(text, f).ok()) {
        return Some(naive.assume_offset(offset));
    }
    Date::parse(text, DATE).ok().map(|d| d.midnight().assume_utc())
}

/// `YYYY-MM-DD`, or `YYYY-MM-DD HH:MM:SS` with `show_time`, in `offset`.
#[must_use]
pub fn format_date(input: impl Into<DateInput>, show_time: bool, offset: UtcOffset) -> String {
    let Some(at) = parse_date(&input.into(), offset) else {
        return String::new();
    };
    let format = if show_time { DATE_TIME } else { DATE };
    at.to_offset(offset).format(format).unwrap_or_default()
}

/// Coarse "time ago" relative to `now`: 刚刚, N分钟前, N小时前, N天前, and
/// the plain date from a week on. Future instants count as just now.
#[must_use]
pub fn relative_time(input: impl Into<DateInput>, now: OffsetDateTime, offset: UtcOffset) -> String {
    let input = input.into();
    let Some(at) = parse_date(&input, offset) else {
        return String::new();
    };

    let elapsed = now - at;
    if elapsed < Duration::MINUTE {
        "刚刚".to_owned()
    } else if elapsed < Duration::HOUR {
        format!("{}分钟前", elapsed.whole_minutes())
    } else if elapsed < Duration::DAY {
        format!("{}小时前", elapsed.whole_hours())
    } else if elapsed < Duration::WEEK {
        format!("{}天前", elapsed.whole_days())
    } else {
        format_date(input, false, offset)
    }
}

#[cfg(test)]
#[path = "date_test.rs"]
mod tests;
