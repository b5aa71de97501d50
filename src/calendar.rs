//! Conversion between [`DateTime`] and millisecond Unix timestamps.
//!
//! Both directions use integer-only Julian day arithmetic on the proleptic
//! Gregorian calendar. January and February are treated as months 13 and
//! 14 of the previous year so that the leap day falls at the end of the
//! counting year.

use crate::datetime::DateTime;

const MS_PER_SECOND: u64 = 1000;
const SECONDS_PER_DAY: i64 = 86_400;

// Day number of 1970-01-01 in the shifted-month day count below.
const UNIX_EPOCH_DAY: i64 = 719_561;

/// Converts a date/time (taken as UTC) to milliseconds since the Unix epoch.
///
/// `day_of_week` is ignored. Dates before 1970-01-01 clamp to 0.
#[must_use]
pub fn to_unix_ms(datetime: &DateTime) -> u64 {
    let days = days_from_civil(datetime.year, datetime.month, datetime.day);
    let seconds = days * SECONDS_PER_DAY
        + 3600 * i64::from(datetime.hour)
        + 60 * i64::from(datetime.minute)
        + i64::from(datetime.second);

    u64::try_from(seconds).map_or(0, |s| s * MS_PER_SECOND)
}

/// Converts milliseconds since the Unix epoch to a date/time in UTC.
///
/// Sub-second precision is truncated. `day_of_week` is derived from the
/// day count with 1 = Sunday.
#[must_use]
pub fn from_unix_ms(timestamp_ms: u64) -> DateTime {
    let mut seconds = timestamp_ms / MS_PER_SECOND;
    let second = (seconds % 60) as u8;
    seconds /= 60;
    let minute = (seconds % 60) as u8;
    seconds /= 60;
    let hour = (seconds % 24) as u8;
    let days = seconds / 24;

    let a = (4 * days + 102_032) / 146_097 + 15;
    let b = days + 2_442_113 + a - a / 4;
    let c = (20 * b - 2442) / 7305;
    let dd = b - 365 * c - c / 4;
    let e = dd * 1000 / 30_601;
    let f = dd - e * 30 - e * 601 / 1000;

    let (year, month) = if e <= 13 {
        (c - 4716, e - 1)
    } else {
        (c - 4715, e - 13)
    };

    DateTime {
        year: u16::try_from(year).unwrap_or(u16::MAX),
        month: month as u8,
        day: f as u8,
        hour,
        minute,
        second,
        day_of_week: day_of_week(days),
    }
}

/// Day of week (1 = Sunday) for a count of days since 1970-01-01, a Thursday.
#[must_use]
pub const fn day_of_week(days_since_epoch: u64) -> u8 {
    ((days_since_epoch + 4) % 7 + 1) as u8
}

/// Signed day count since 1970-01-01 for a calendar date.
pub(crate) const fn days_from_civil(year: u16, month: u8, day: u8) -> i64 {
    let mut y = year as i64;
    let mut m = month as i64;
    let d = day as i64;

    if m <= 2 {
        m += 12;
        y -= 1;
    }

    365 * y + y / 4 - y / 100 + y / 400 + 30 * m + 3 * (m + 1) / 5 + d - UNIX_EPOCH_DAY
}

/// Like [`day_of_week`], but also defined before the epoch.
pub(crate) const fn weekday_from_days(days_since_epoch: i64) -> u8 {
    ((days_since_epoch + 4).rem_euclid(7) + 1) as u8
}
