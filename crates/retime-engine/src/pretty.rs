//! Parsing of "pretty" schedule datetimes.
//!
//! Schedules carry their arrival time as a wall-clock string such as
//! `"4/4/2026 23:58:00"`. The wall clock is always read in the schedule's
//! civil timezone ([`SCHEDULE_TZ`]), including its daylight-saving rules for
//! the given date, and turned into an absolute instant.
//!
//! # Accepted format
//!
//! `M/D/YYYY H:MM:SS`: month, day and hour take one or two digits, the year
//! exactly four, minute and second exactly two. Fields are separated by `/`,
//! a single space and `:`. Anything else (signs, whitespace padding, two-digit
//! years, leap second `60`, missing or extra fields) is rejected with
//! [`RetimeError::InvalidDatetime`]. The parser never guesses.

use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::error::{Result, RetimeError};

/// The civil timezone every pretty datetime is interpreted in.
pub const SCHEDULE_TZ: Tz = chrono_tz::America::New_York;

/// `strftime`-style pattern of the pretty field.
pub const PRETTY_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Parse a pretty datetime string into an instant in [`SCHEDULE_TZ`].
///
/// # Daylight saving
///
/// - A wall-clock time that occurs twice (the fall-back hour) resolves to the
///   earlier instant, i.e. the daylight-time reading.
/// - A wall-clock time that does not exist (the spring-forward gap) is read
///   with the offset in force just before the gap, so `3/8/2026 2:30:00`
///   lands on 07:30 UTC.
///
/// # Errors
///
/// Returns [`RetimeError::InvalidDatetime`] if the string does not match
/// `M/D/YYYY H:MM:SS` or names a date that does not exist.
///
/// # Examples
///
/// ```
/// use retime_engine::pretty::parse_pretty_datetime;
///
/// let dt = parse_pretty_datetime("4/5/2026 0:00:00").unwrap();
/// // April is EDT (UTC-4)
/// assert_eq!(dt.to_rfc3339(), "2026-04-05T00:00:00-04:00");
/// ```
pub fn parse_pretty_datetime(pretty: &str) -> Result<DateTime<Tz>> {
    parse_pretty_datetime_in(pretty, &SCHEDULE_TZ)
}

/// Parse a pretty datetime string into whole seconds since the Unix epoch.
///
/// # Errors
///
/// Same as [`parse_pretty_datetime`].
///
/// # Examples
///
/// ```
/// use retime_engine::pretty::pretty_to_unix;
///
/// assert_eq!(pretty_to_unix("4/4/2026 23:58:00").unwrap(), 1_775_361_480);
/// ```
pub fn pretty_to_unix(pretty: &str) -> Result<i64> {
    parse_pretty_datetime(pretty).map(|dt| dt.timestamp())
}

fn parse_pretty_datetime_in(pretty: &str, tz: &Tz) -> Result<DateTime<Tz>> {
    let invalid = |reason: &dyn std::fmt::Display| {
        RetimeError::InvalidDatetime(format!(
            "'{pretty}': {reason} (expected M/D/YYYY H:MM:SS, e.g. 4/4/2026 23:58:00)"
        ))
    };

    if !has_pretty_shape(pretty) {
        return Err(invalid(&"malformed fields"));
    }
    let naive = NaiveDateTime::parse_from_str(pretty, PRETTY_FORMAT).map_err(|e| invalid(&e))?;
    // chrono encodes second 60 as an extra second of nanoseconds
    if naive.nanosecond() >= 1_000_000_000 {
        return Err(invalid(&"leap second"));
    }

    localize(&naive, tz).ok_or_else(|| {
        RetimeError::InvalidDatetime(format!("'{pretty}': cannot be placed in {}", tz.name()))
    })
}

/// `M/D/YYYY H:MM:SS` with plain ASCII digits and nothing around them.
fn has_pretty_shape(pretty: &str) -> bool {
    let Some((date, time)) = pretty.split_once(' ') else {
        return false;
    };
    let date: Vec<&str> = date.split('/').collect();
    let time: Vec<&str> = time.split(':').collect();

    matches!(
        date.as_slice(),
        [month, day, year] if digits(month, 1..=2) && digits(day, 1..=2) && digits(year, 4..=4)
    ) && matches!(
        time.as_slice(),
        [hour, minute, second]
            if digits(hour, 1..=2) && digits(minute, 2..=2) && digits(second, 2..=2)
    )
}

fn digits(field: &str, width: RangeInclusive<usize>) -> bool {
    width.contains(&field.len()) && field.bytes().all(|b| b.is_ascii_digit())
}

/// Attach `tz` to a wall-clock value, resolving DST folds and gaps.
fn localize(naive: &NaiveDateTime, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Some(dt) = tz.from_local_datetime(naive).earliest() {
        return Some(dt);
    }

    // Inside a gap: step back over it, then forward again in absolute time,
    // which keeps the pre-transition offset.
    let gap = TimeDelta::hours(1);
    let before = tz.from_local_datetime(&(*naive - gap)).earliest()?;
    Some(before + gap)
}
