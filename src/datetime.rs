//! Date/time value type and the DS3231M date/time register block.
//!
//! [`DateTime`] is the decoded, binary form the rest of the crate works with.
//! The crate-internal [`DS3231DateTime`] is the wire form: the 7 BCD
//! registers starting at [`RegAddr::Seconds`](crate::RegAddr::Seconds), in
//! the order second, minute, hour, day of week, date, month, year.
//!
//! # Error Handling
//!
//! Conversions from chrono report out-of-range years via
//! [`DS3231DateTimeError`]. Conversions to and from the register block never
//! fail; values are assumed to be in range.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::bcd::{decode_bcd, encode_bcd};
use crate::calendar::{days_from_civil, weekday_from_days};
use crate::registers::{
    CENTURY_FLAG, DATETIME_LENGTH, DATE_MASK, DAY_MASK, HOURS_MASK, MINUTES_MASK, MONTH_MASK,
    SECONDS_MASK, TWELVE_HOUR_FLAG,
};

/// First year representable by the two-digit year register.
pub const BASE_YEAR: u16 = 2000;

/// Last year representable by the two-digit year register.
pub const LAST_YEAR: u16 = 2099;

/// A calendar date and time of day as kept by the DS3231M.
///
/// All fields are plain binary values. No time zone is implied; the chip is
/// normally kept in UTC so that [`to_unix_ms`](crate::to_unix_ms) yields a
/// Unix timestamp.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// Year, 2000-2099
    pub year: u16,
    /// Month, 1-12
    pub month: u8,
    /// Day of month, 1-31
    pub day: u8,
    /// Hour, 0-23
    pub hour: u8,
    /// Minute, 0-59
    pub minute: u8,
    /// Second, 0-59
    pub second: u8,
    /// Day of week, 1-7. The numbering is up to the user; values derived by
    /// this crate use 1 = Sunday.
    pub day_of_week: u8,
}

impl DateTime {
    /// Creates a date/time, deriving `day_of_week` from the date with
    /// 1 = Sunday.
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            day_of_week: weekday_from_days(days_from_civil(year, month, day)),
        }
    }

    /// Returns a copy with the given day of week, for chips kept with a
    /// different weekday numbering.
    #[must_use]
    pub const fn with_day_of_week(mut self, day_of_week: u8) -> Self {
        self.day_of_week = day_of_week;
        self
    }

    /// Converts to a chrono `NaiveDateTime`, or `None` if any field is out
    /// of range for a real calendar date.
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second),
            )
        })
    }
}

impl TryFrom<&NaiveDateTime> for DateTime {
    type Error = DS3231DateTimeError;

    fn try_from(datetime: &NaiveDateTime) -> Result<Self, Self::Error> {
        let year = u16::try_from(datetime.year())
            .ok()
            .filter(|y| (BASE_YEAR..=LAST_YEAR).contains(y))
            .ok_or(DS3231DateTimeError::YearOutOfRange)?;
        // chrono components are range checked already, so the narrowing
        // below is lossless.
        Ok(DateTime {
            year,
            month: datetime.month() as u8,
            day: datetime.day() as u8,
            hour: datetime.hour() as u8,
            minute: datetime.minute() as u8,
            second: datetime.second() as u8,
            day_of_week: datetime.weekday().number_from_sunday() as u8,
        })
    }
}

impl TryFrom<NaiveDateTime> for DateTime {
    type Error = DS3231DateTimeError;

    fn try_from(datetime: NaiveDateTime) -> Result<Self, Self::Error> {
        Self::try_from(&datetime)
    }
}

/// Errors that can occur when converting into a [`DateTime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DS3231DateTimeError {
    /// The year is outside 2000-2099, the range of the year register
    YearOutOfRange,
}

impl core::fmt::Display for DS3231DateTimeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DS3231DateTimeError::YearOutOfRange => {
                write!(f, "year outside {}-{}", BASE_YEAR, LAST_YEAR)
            }
        }
    }
}

/// Internal representation of the DS3231M date/time registers.
///
/// Holds the raw BCD bytes exactly as they travel over the bus.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct DS3231DateTime([u8; DATETIME_LENGTH]);

impl DS3231DateTime {
    /// Encodes a date/time for writing. Hours are written in 24-hour mode
    /// and the century bit is left clear.
    pub(crate) fn from_datetime(datetime: &DateTime) -> Self {
        // Years outside the register range wrap into 00-99.
        let year = (datetime.year.saturating_sub(BASE_YEAR) % 100) as u8;
        let raw = DS3231DateTime([
            encode_bcd(datetime.second),
            encode_bcd(datetime.minute),
            encode_bcd(datetime.hour),
            encode_bcd(datetime.day_of_week),
            encode_bcd(datetime.day),
            encode_bcd(datetime.month),
            encode_bcd(year),
        ]);
        debug!("raw={:?}", raw.0);
        raw
    }

    /// Decodes the register block.
    pub(crate) fn into_datetime(self) -> DateTime {
        let [seconds, minutes, hours, day, date, month, year] = self.0;
        if hours & TWELVE_HOUR_FLAG != 0 {
            warn!("hours register in 12-hour mode: {}", hours);
        }
        if month & CENTURY_FLAG != 0 {
            warn!("century flag set, year register has rolled over");
        }
        DateTime {
            second: decode_bcd(seconds & SECONDS_MASK),
            minute: decode_bcd(minutes & MINUTES_MASK),
            hour: decode_bcd(hours & HOURS_MASK),
            day_of_week: decode_bcd(day & DAY_MASK),
            day: decode_bcd(date & DATE_MASK),
            month: decode_bcd(month & MONTH_MASK),
            year: BASE_YEAR + u16::from(decode_bcd(year)),
        }
    }
}

impl From<[u8; DATETIME_LENGTH]> for DS3231DateTime {
    fn from(data: [u8; DATETIME_LENGTH]) -> Self {
        DS3231DateTime(data)
    }
}

impl From<&DS3231DateTime> for [u8; DATETIME_LENGTH] {
    fn from(dt: &DS3231DateTime) -> [u8; DATETIME_LENGTH] {
        dt.0
    }
}
