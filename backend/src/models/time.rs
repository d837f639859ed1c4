use chrono::{NaiveTime, Timelike};
use serde::{Serialize, Serializer};
use std::fmt;

const SECONDS_PER_DAY: f64 = 86_400.0;
const MICROS_PER_DAY: f64 = SECONDS_PER_DAY * 1e6;

/// Canonical race time.
///
/// A time-of-day value (`00:00:00` .. `23:59:59.999999999`) with at least
/// second precision. The fractional part is kept for display, while ranking
/// only ever looks at whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalTime(NaiveTime);

impl CanonicalTime {
    /// Build a time from hours, minutes and seconds.
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hours, minutes, seconds).map(Self)
    }

    /// Build a time from hours, minutes, seconds and a sub-second nanosecond part.
    pub fn from_hms_nano(hours: u32, minutes: u32, seconds: u32, nanos: u32) -> Option<Self> {
        if nanos >= 1_000_000_000 {
            return None;
        }
        NaiveTime::from_hms_nano_opt(hours, minutes, seconds, nanos).map(Self)
    }

    /// Build a time from a number of seconds since midnight.
    ///
    /// Returns `None` for negative, non-finite or out-of-day values.
    pub fn from_seconds(seconds: f64) -> Option<Self> {
        if !seconds.is_finite() || !(0.0..SECONDS_PER_DAY).contains(&seconds) {
            return None;
        }
        let whole = seconds.trunc();
        let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(whole as u32, nanos).map(Self)
    }

    /// Build from a fraction of a day, as spreadsheets store times.
    ///
    /// `secs / 86400` rarely multiplies back to an exact whole second, so the
    /// value is rounded to whole microseconds before it is split.
    pub fn from_day_fraction(fraction: f64) -> Option<Self> {
        if !fraction.is_finite() || fraction < 0.0 {
            return None;
        }
        let micros = (fraction * MICROS_PER_DAY).round();
        if micros >= MICROS_PER_DAY {
            return None;
        }
        let micros = micros as u64;
        NaiveTime::from_num_seconds_from_midnight_opt(
            (micros / 1_000_000) as u32,
            (micros % 1_000_000) as u32 * 1_000,
        )
        .map(Self)
    }

    pub fn hours(&self) -> u32 {
        self.0.hour()
    }

    pub fn minutes(&self) -> u32 {
        self.0.minute()
    }

    pub fn seconds(&self) -> u32 {
        self.0.second()
    }

    /// Sub-second part in nanoseconds.
    pub fn subsec_nanos(&self) -> u32 {
        self.0.nanosecond()
    }

    /// Total elapsed seconds, fraction included.
    pub fn total_seconds(&self) -> f64 {
        self.ranking_seconds() as f64 + self.subsec_nanos() as f64 / 1e9
    }

    /// Whole seconds since midnight; the fractional part is truncated.
    pub fn ranking_seconds(&self) -> u32 {
        self.0.num_seconds_from_midnight()
    }

    /// `HH:MM:SS` followed by the retained fraction, if any (`HH:MM:SS.fff`).
    pub fn display_precise(&self) -> String {
        let nanos = self.subsec_nanos();
        if nanos == 0 {
            return self.to_string();
        }
        let fraction = format!("{:09}", nanos);
        format!("{}.{}", self, fraction.trim_end_matches('0'))
    }

    /// Underlying chrono value.
    pub fn as_naive_time(&self) -> NaiveTime {
        self.0
    }
}

impl From<NaiveTime> for CanonicalTime {
    fn from(time: NaiveTime) -> Self {
        Self(time)
    }
}

impl fmt::Display for CanonicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}

impl Serialize for CanonicalTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display_precise())
    }
}
