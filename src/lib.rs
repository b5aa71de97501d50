//! A platform-agnostic driver for the DS3231M real-time clock.
//!
//! The driver talks to the chip through any `embedded-hal` I²C bus (or any
//! other [`RegisterBus`]) and converts between the chip's BCD calendar
//! registers, a plain [`DateTime`], and millisecond Unix timestamps.
//!
//! # Features
//!
//! - Read and set the date/time; setting the time clears the oscillator stop flag
//! - Integer-only conversion between [`DateTime`] and Unix milliseconds
//! - Temperature reads with 0.25°C resolution, refused while a conversion is busy
//! - Blocking driver, plus an async one behind the `async` feature
//! - Optional logging through `log` or `defmt`
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3231m::{Config, DS3231, DateTime};
//!
//! let mut rtc = DS3231::new(i2c, Config::default());
//! rtc.probe()?;
//!
//! rtc.set_datetime(&DateTime::new(2019, 2, 12, 5, 18, 39).with_day_of_week(3))?;
//! let now_ms = rtc.timestamp_ms()?;
//! let celsius = rtc.temperature()?;
//! ```

#![no_std]

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}
#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

#[cfg(all(feature = "log", not(feature = "defmt")))]
macro_rules! debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}
#[cfg(all(feature = "log", not(feature = "defmt")))]
macro_rules! warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}
#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "async")]
pub mod asynch;
pub mod bcd;
pub mod calendar;
pub mod datetime;
pub mod registers;
pub mod temperature;
#[cfg(test)]
mod test_bus;

use embedded_hal::i2c::{ErrorKind, I2c, Operation};
use paste::paste;

pub use crate::bcd::{decode_bcd, encode_bcd};
pub use crate::calendar::{from_unix_ms, to_unix_ms};
pub use crate::datetime::{DS3231DateTimeError, DateTime};
use crate::datetime::DS3231DateTime;
pub use crate::registers::{Control, RegAddr, Status, DATETIME_LENGTH, TEMPERATURE_LENGTH};
pub use crate::temperature::{decode_temperature, is_conversion_busy, quarter_degrees};

/// Fixed I²C address of the DS3231M.
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Driver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// 7-bit I²C address of the device
    pub address: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
        }
    }
}

/// Errors returned by the driver.
#[derive(Debug, PartialEq)]
pub enum DS3231Error<E> {
    /// The bus reported an error (timeout, NACK, ...); passed through unchanged
    I2c(E),
    /// Nothing acknowledged the probe at the configured address
    ProbeFailed(E),
    /// A temperature conversion is in progress (BSY set)
    Busy,
}

impl<E> From<E> for DS3231Error<E> {
    fn from(e: E) -> Self {
        DS3231Error::I2c(e)
    }
}

impl<E: embedded_hal::i2c::Error> DS3231Error<E> {
    /// Classifies the underlying bus error, if there is one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            DS3231Error::I2c(e) | DS3231Error::ProbeFailed(e) => Some(e.kind()),
            DS3231Error::Busy => None,
        }
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for DS3231Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DS3231Error::I2c(e) => write!(f, "bus error: {:?}", e),
            DS3231Error::ProbeFailed(e) => write!(f, "device did not respond to probe: {:?}", e),
            DS3231Error::Busy => write!(f, "temperature conversion in progress"),
        }
    }
}

/// Register-level access to a device on a two-wire bus.
///
/// Implemented for every [`embedded_hal::i2c::I2c`] bus. Implement it by hand
/// to run the driver over something else, such as a test double.
pub trait RegisterBus {
    /// Bus error type, reported to callers unchanged.
    type Error: embedded_hal::i2c::Error;

    /// Checks that a device acknowledges `address`.
    fn probe(&mut self, address: u8) -> Result<(), Self::Error>;

    /// Reads `buffer.len()` consecutive registers starting at `register` in
    /// one transaction.
    fn read_registers(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Writes all of `data` to consecutive registers starting at `register`
    /// in one transaction.
    fn write_registers(&mut self, address: u8, register: u8, data: &[u8])
        -> Result<(), Self::Error>;
}

impl<I2C: I2c> RegisterBus for I2C {
    type Error = I2C::Error;

    fn probe(&mut self, address: u8) -> Result<(), Self::Error> {
        I2c::write(self, address, &[])
    }

    fn read_registers(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        I2c::write_read(self, address, &[register], buffer)
    }

    fn write_registers(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        // Adjacent writes go out as one transfer without a repeated start.
        I2c::transaction(
            self,
            address,
            &mut [Operation::Write(&[register]), Operation::Write(data)],
        )
    }
}

/// DS3231M Real-Time Clock driver.
///
/// Every call runs its bus transactions to completion before returning and
/// the driver holds the bus exclusively, so there is never more than one
/// transaction in flight.
pub struct DS3231<B: RegisterBus> {
    bus: B,
    address: u8,
}

impl<B: RegisterBus> DS3231<B> {
    /// Creates a new driver instance.
    ///
    /// # Arguments
    /// * `bus` - The bus the device is attached to
    /// * `config` - Device address and other settings
    pub fn new(bus: B, config: Config) -> Self {
        Self {
            bus,
            address: config.address,
        }
    }

    /// Destroys the driver and returns the bus.
    pub fn release(self) -> B {
        self.bus
    }

    /// Checks that the device answers at its address.
    ///
    /// # Returns
    /// * `Ok(())` if the device acknowledged
    /// * `Err(DS3231Error::ProbeFailed)` with the bus error otherwise
    pub fn probe(&mut self) -> Result<(), DS3231Error<B::Error>> {
        self.bus
            .probe(self.address)
            .map_err(DS3231Error::ProbeFailed)
    }

    fn read_raw_datetime(&mut self) -> Result<DS3231DateTime, DS3231Error<B::Error>> {
        let mut data = [0; DATETIME_LENGTH];
        self.bus
            .read_registers(self.address, RegAddr::Seconds as u8, &mut data)?;
        Ok(data.into())
    }

    fn write_raw_datetime(&mut self, datetime: &DS3231DateTime) -> Result<(), DS3231Error<B::Error>> {
        let data: [u8; DATETIME_LENGTH] = datetime.into();
        self.bus
            .write_registers(self.address, RegAddr::Seconds as u8, &data)?;
        Ok(())
    }

    /// Reads the current date and time.
    ///
    /// All 7 registers are read in one transaction. On a bus error nothing
    /// is decoded and the error is returned unchanged.
    pub fn datetime(&mut self) -> Result<DateTime, DS3231Error<B::Error>> {
        let raw = self.read_raw_datetime()?;
        Ok(raw.into_datetime())
    }

    /// Sets the date and time, then clears the oscillator stop flag.
    ///
    /// If the date/time write fails the status register is not touched.
    /// Otherwise the error of the first failing status read or write is
    /// returned.
    pub fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), DS3231Error<B::Error>> {
        let raw = DS3231DateTime::from_datetime(datetime);
        self.write_raw_datetime(&raw)?;
        self.clear_oscillator_stop_flag()
    }

    /// Reads the current time as milliseconds since the Unix epoch.
    pub fn timestamp_ms(&mut self) -> Result<u64, DS3231Error<B::Error>> {
        let datetime = self.datetime()?;
        Ok(to_unix_ms(&datetime))
    }

    /// Sets the clock from milliseconds since the Unix epoch.
    ///
    /// The day of week register is set with 1 = Sunday.
    pub fn set_timestamp_ms(&mut self, timestamp_ms: u64) -> Result<(), DS3231Error<B::Error>> {
        let datetime = from_unix_ms(timestamp_ms);
        debug!("DS3231M: setting time from timestamp {}", timestamp_ms);
        self.set_datetime(&datetime)
    }

    /// Returns true if the oscillator has stopped since the flag was last
    /// cleared, meaning the time is not trustworthy.
    pub fn oscillator_stopped(&mut self) -> Result<bool, DS3231Error<B::Error>> {
        Ok(self.status()?.oscillator_stop_flag())
    }

    /// Clears the oscillator stop flag, leaving the other status bits as read.
    pub fn clear_oscillator_stop_flag(&mut self) -> Result<(), DS3231Error<B::Error>> {
        let mut status = self.status()?;
        status.set_oscillator_stop_flag(false);
        debug!("DS3231M: writing status: {:?}", status);
        self.set_status(status)
    }

    /// Reads the die temperature in degrees Celsius.
    ///
    /// # Returns
    /// * `Ok(f32)` - Temperature with 0.25°C resolution
    /// * `Err(DS3231Error::Busy)` if a conversion is in progress; the
    ///   temperature registers are not read in that case
    /// * `Err(DS3231Error::I2c)` on a bus error
    pub fn temperature(&mut self) -> Result<f32, DS3231Error<B::Error>> {
        let status = self.status()?;
        if status.busy() {
            debug!("DS3231M: temperature conversion busy");
            return Err(DS3231Error::Busy);
        }
        let mut data = [0; TEMPERATURE_LENGTH];
        self.bus
            .read_registers(self.address, RegAddr::MSBTemp as u8, &mut data)?;
        Ok(decode_temperature(data[0], data[1]))
    }

    /// Starts a temperature conversion outside the chip's automatic cycle.
    ///
    /// Fails with [`DS3231Error::Busy`] while a conversion is running.
    pub fn start_temperature_conversion(&mut self) -> Result<(), DS3231Error<B::Error>> {
        if self.status()?.busy() {
            return Err(DS3231Error::Busy);
        }
        let mut control = self.control()?;
        control.set_convert_temperature(true);
        self.set_control(control)
    }
}

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl<B: RegisterBus> DS3231<B> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    pub fn $name(&mut self) -> Result<$typ, DS3231Error<B::Error>> {
                        let mut data = [0];
                        self.bus
                            .read_registers(self.address, $regaddr as u8, &mut data)?;
                        Ok(<$typ>::from(data[0]))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register.")]
                    pub fn [<set_ $name>](&mut self, value: $typ) -> Result<(), DS3231Error<B::Error>> {
                        self.bus
                            .write_registers(self.address, $regaddr as u8, &[u8::from(value)])?;
                        Ok(())
                    }
                }
            )+
        }
    }
}

impl_register_access!(
    (control, RegAddr::Control, Control),
    (status, RegAddr::ControlStatus, Status)
);
