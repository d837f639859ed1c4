//! Race time parsing.
//!
//! Accepted representations:
//!
//! - already-typed times (spreadsheet time cells), passed through
//! - `H:MM:SS`, `HH:MM:SS` and `HH:MM:SS.fff` text
//! - numeric seconds, either as a number cell or as plain decimal text
//!
//! Everything else is a [`TimeParseError`] that keeps the raw value for
//! diagnostics. Parsing never panics.

use crate::models::{CanonicalTime, RawCell};

/// Why a time could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseErrorKind {
    #[error("empty value")]
    Empty,
    #[error("expected H:MM:SS, HH:MM:SS or HH:MM:SS.fff")]
    Format,
    #[error("component out of range")]
    OutOfRange,
    #[error("not a time value")]
    WrongType,
}

/// A time cell that could not be converted into a [`CanonicalTime`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse time {raw:?}: {kind}")]
pub struct TimeParseError {
    pub raw: String,
    pub kind: TimeParseErrorKind,
}

impl TimeParseError {
    fn new(raw: impl Into<String>, kind: TimeParseErrorKind) -> Self {
        Self {
            raw: raw.into(),
            kind,
        }
    }
}

/// Parse a raw cell into a canonical time.
pub fn parse_time(cell: &RawCell) -> Result<CanonicalTime, TimeParseError> {
    match cell {
        RawCell::Time(t) => Ok(*t),
        RawCell::Number(seconds) => CanonicalTime::from_seconds(*seconds)
            .ok_or_else(|| TimeParseError::new(seconds.to_string(), TimeParseErrorKind::OutOfRange)),
        RawCell::Text(text) => parse_time_str(text),
        RawCell::Empty => Err(TimeParseError::new("", TimeParseErrorKind::Empty)),
        RawCell::Bool(b) => Err(TimeParseError::new(
            b.to_string(),
            TimeParseErrorKind::WrongType,
        )),
    }
}

/// Parse a textual time.
pub fn parse_time_str(raw: &str) -> Result<CanonicalTime, TimeParseError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(TimeParseError::new(raw, TimeParseErrorKind::Empty));
    }

    if !text.contains(':') {
        return parse_numeric_seconds(raw, text);
    }

    let parts: Vec<&str> = text.split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return Err(TimeParseError::new(raw, TimeParseErrorKind::Format));
    };

    let hours = parse_digits(hours, 1, 2).ok_or_else(|| format_error(raw))?;
    let minutes = parse_digits(minutes, 2, 2).ok_or_else(|| format_error(raw))?;

    let (whole, fraction) = match seconds.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (*seconds, None),
    };
    let seconds = parse_digits(whole, 2, 2).ok_or_else(|| format_error(raw))?;
    let nanos = match fraction {
        Some(f) => parse_fraction_nanos(f).ok_or_else(|| format_error(raw))?,
        None => 0,
    };

    CanonicalTime::from_hms_nano(hours, minutes, seconds, nanos)
        .ok_or_else(|| TimeParseError::new(raw, TimeParseErrorKind::OutOfRange))
}

fn format_error(raw: &str) -> TimeParseError {
    TimeParseError::new(raw, TimeParseErrorKind::Format)
}

fn parse_numeric_seconds(raw: &str, text: &str) -> Result<CanonicalTime, TimeParseError> {
    let looks_numeric = text.chars().all(|c| c.is_ascii_digit() || c == '.')
        && text.chars().any(|c| c.is_ascii_digit())
        && text.matches('.').count() <= 1;
    if !looks_numeric {
        return Err(format_error(raw));
    }
    let seconds: f64 = text.parse().map_err(|_| format_error(raw))?;
    CanonicalTime::from_seconds(seconds)
        .ok_or_else(|| TimeParseError::new(raw, TimeParseErrorKind::OutOfRange))
}

/// ASCII digits only, with a length between `min` and `max`.
fn parse_digits(s: &str, min: usize, max: usize) -> Option<u32> {
    if s.len() < min || s.len() > max || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Fractional seconds (1 to 9 digits) as nanoseconds.
fn parse_fraction_nanos(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 9 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = s.parse().ok()?;
    Some(value * 10u32.pow(9 - s.len() as u32))
}
