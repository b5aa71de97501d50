//! Async implementation of the DS3231M driver.
//!
//! This module provides an async interface to the DS3231M RTC device using
//! `embedded-hal-async` traits. It is only available when the `async` feature
//! is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3231m::{asynch::DS3231, Config};
//!
//! let mut rtc = DS3231::new(i2c, Config::default());
//! rtc.probe().await?;
//! let now_ms = rtc.timestamp_ms().await?;
//! ```

use embedded_hal_async::i2c::{I2c, Operation};
use paste::paste;

use crate::datetime::DS3231DateTime;
use crate::{
    decode_temperature, from_unix_ms, to_unix_ms, Config, Control, DS3231Error, DateTime, RegAddr,
    Status, DATETIME_LENGTH, TEMPERATURE_LENGTH,
};

/// DS3231M Real-Time Clock async driver.
///
/// Same operations as [`crate::DS3231`], over an `embedded-hal-async` bus.
pub struct DS3231<I2C: I2c> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> DS3231<I2C> {
    /// Creates a new DS3231M async driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The async I2C bus implementation
    /// * `config` - Device address and other settings
    pub fn new(i2c: I2C, config: Config) -> Self {
        Self {
            i2c,
            address: config.address,
        }
    }

    /// Destroys the driver and returns the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    async fn read_registers(
        &mut self,
        register: u8,
        buffer: &mut [u8],
    ) -> Result<(), DS3231Error<I2C::Error>> {
        self.i2c
            .write_read(self.address, &[register], buffer)
            .await?;
        Ok(())
    }

    async fn write_registers(
        &mut self,
        register: u8,
        data: &[u8],
    ) -> Result<(), DS3231Error<I2C::Error>> {
        self.i2c
            .transaction(
                self.address,
                &mut [Operation::Write(&[register]), Operation::Write(data)],
            )
            .await?;
        Ok(())
    }

    /// Checks that the device answers at its address.
    pub async fn probe(&mut self) -> Result<(), DS3231Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[])
            .await
            .map_err(DS3231Error::ProbeFailed)
    }

    /// Reads the current date and time.
    pub async fn datetime(&mut self) -> Result<DateTime, DS3231Error<I2C::Error>> {
        let mut data = [0; DATETIME_LENGTH];
        self.read_registers(RegAddr::Seconds as u8, &mut data)
            .await?;
        Ok(DS3231DateTime::from(data).into_datetime())
    }

    /// Sets the date and time, then clears the oscillator stop flag.
    pub async fn set_datetime(
        &mut self,
        datetime: &DateTime,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let raw = DS3231DateTime::from_datetime(datetime);
        let data: [u8; DATETIME_LENGTH] = (&raw).into();
        self.write_registers(RegAddr::Seconds as u8, &data).await?;
        self.clear_oscillator_stop_flag().await
    }

    /// Reads the current time as milliseconds since the Unix epoch.
    pub async fn timestamp_ms(&mut self) -> Result<u64, DS3231Error<I2C::Error>> {
        let datetime = self.datetime().await?;
        Ok(to_unix_ms(&datetime))
    }

    /// Sets the clock from milliseconds since the Unix epoch.
    pub async fn set_timestamp_ms(
        &mut self,
        timestamp_ms: u64,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        self.set_datetime(&from_unix_ms(timestamp_ms)).await
    }

    /// Returns true if the oscillator has stopped since the flag was last cleared.
    pub async fn oscillator_stopped(&mut self) -> Result<bool, DS3231Error<I2C::Error>> {
        Ok(self.status().await?.oscillator_stop_flag())
    }

    /// Clears the oscillator stop flag, leaving the other status bits as read.
    pub async fn clear_oscillator_stop_flag(&mut self) -> Result<(), DS3231Error<I2C::Error>> {
        let mut status = self.status().await?;
        status.set_oscillator_stop_flag(false);
        debug!("DS3231M: writing status: {:?}", status);
        self.set_status(status).await
    }

    /// Reads the die temperature in degrees Celsius.
    ///
    /// Fails with [`DS3231Error::Busy`] without reading the temperature
    /// registers while a conversion is in progress.
    pub async fn temperature(&mut self) -> Result<f32, DS3231Error<I2C::Error>> {
        if self.status().await?.busy() {
            return Err(DS3231Error::Busy);
        }
        let mut data = [0; TEMPERATURE_LENGTH];
        self.read_registers(RegAddr::MSBTemp as u8, &mut data)
            .await?;
        Ok(decode_temperature(data[0], data[1]))
    }

    /// Starts a temperature conversion outside the chip's automatic cycle.
    pub async fn start_temperature_conversion(&mut self) -> Result<(), DS3231Error<I2C::Error>> {
        if self.status().await?.busy() {
            return Err(DS3231Error::Busy);
        }
        let mut control = self.control().await?;
        control.set_convert_temperature(true);
        self.set_control(control).await
    }
}

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl<I2C: I2c> DS3231<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    pub async fn $name(&mut self) -> Result<$typ, DS3231Error<I2C::Error>> {
                        let mut data = [0];
                        self.read_registers($regaddr as u8, &mut data).await?;
                        Ok(<$typ>::from(data[0]))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register.")]
                    pub async fn [<set_ $name>](&mut self, value: $typ) -> Result<(), DS3231Error<I2C::Error>> {
                        self.write_registers($regaddr as u8, &[u8::from(value)]).await
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

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use crate::test_bus::{RegisterFile, REGISTER_COUNT};
    use alloc::vec;
    use alloc::vec::Vec;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const DEVICE_ADDRESS: u8 = 0x68;

    async fn setup_mock(expectations: &[I2cTrans]) -> I2cMock {
        I2cMock::new(expectations)
    }

    fn register_write(register: RegAddr, data: &[u8]) -> Vec<I2cTrans> {
        vec![
            I2cTrans::transaction_start(DEVICE_ADDRESS),
            I2cTrans::write(DEVICE_ADDRESS, vec![register as u8]),
            I2cTrans::write(DEVICE_ADDRESS, data.to_vec()),
            I2cTrans::transaction_end(DEVICE_ADDRESS),
        ]
    }

    #[tokio::test]
    async fn test_async_probe() {
        let mock = setup_mock(&[I2cTrans::write(DEVICE_ADDRESS, vec![])]).await;
        let mut dev = DS3231::new(mock, Config::default());
        dev.probe().await.unwrap();
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_probe_failure() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        let mock = setup_mock(&[I2cTrans::write(DEVICE_ADDRESS, vec![]).with_error(nack)]).await;
        let mut dev = DS3231::new(mock, Config::default());
        assert_eq!(dev.probe().await, Err(DS3231Error::ProbeFailed(nack)));
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_read_datetime() {
        // 2024-03-14 15:30:00
        let datetime_registers = [
            0x00, // seconds
            0x30, // minutes
            0x15, // hours (24-hour mode)
            0x05, // day (Thursday)
            0x14, // date
            0x03, // month
            0x24, // year
        ];

        let mock = setup_mock(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![RegAddr::Seconds as u8],
            datetime_registers.to_vec(),
        )])
        .await;
        let mut dev = DS3231::new(mock, Config::default());

        let dt = dev.datetime().await.unwrap();
        assert_eq!(dt, DateTime::new(2024, 3, 14, 15, 30, 0).with_day_of_week(5));
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_read_datetime_error() {
        let mock = setup_mock(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![RegAddr::Seconds as u8],
            vec![0; 7],
        )
        .with_error(ErrorKind::Other)])
        .await;
        let mut dev = DS3231::new(mock, Config::default());

        assert_eq!(
            dev.datetime().await,
            Err(DS3231Error::I2c(ErrorKind::Other))
        );
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_set_datetime() {
        let dt = DateTime::new(2024, 3, 14, 15, 30, 0).with_day_of_week(5);

        let mock = setup_mock(
            &[
                register_write(
                    RegAddr::Seconds,
                    &[
                        0x00, // seconds
                        0x30, // minutes
                        0x15, // hours
                        0x05, // day
                        0x14, // date
                        0x03, // month
                        0x24, // year
                    ],
                ),
                vec![I2cTrans::write_read(
                    DEVICE_ADDRESS,
                    vec![RegAddr::ControlStatus as u8],
                    vec![0x83],
                )],
                register_write(RegAddr::ControlStatus, &[0x03]),
            ]
            .concat(),
        )
        .await;
        let mut dev = DS3231::new(mock, Config::default());

        dev.set_datetime(&dt).await.unwrap();
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_set_datetime_write_failure() {
        let bus = RegisterFile::new([0; REGISTER_COUNT]).failing_at(0, ErrorKind::Bus);
        let mut dev = DS3231::new(bus, Config::default());

        let dt = DateTime::new(2000, 1, 1, 0, 0, 0);
        assert_eq!(
            dev.set_datetime(&dt).await,
            Err(DS3231Error::I2c(ErrorKind::Bus))
        );
        assert_eq!(dev.release().transactions, 1);
    }

    #[tokio::test]
    async fn test_async_set_datetime_status_read_failure() {
        let mock = setup_mock(
            &[
                register_write(RegAddr::Seconds, &[0, 0, 0, 7, 1, 1, 0]),
                vec![I2cTrans::write_read(
                    DEVICE_ADDRESS,
                    vec![RegAddr::ControlStatus as u8],
                    vec![0x80],
                )
                .with_error(ErrorKind::Other)],
            ]
            .concat(),
        )
        .await;
        let mut dev = DS3231::new(mock, Config::default());

        let dt = DateTime::new(2000, 1, 1, 0, 0, 0);
        assert_eq!(
            dev.set_datetime(&dt).await,
            Err(DS3231Error::I2c(ErrorKind::Other))
        );
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_set_datetime_status_write_failure() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data);
        let mut registers = [0u8; REGISTER_COUNT];
        registers[RegAddr::ControlStatus as usize] = 0x88;
        let bus = RegisterFile::new(registers).failing_at(2, nack);
        let mut dev = DS3231::new(bus, Config::default());

        let dt = DateTime::new(2000, 1, 1, 0, 0, 0);
        assert_eq!(dev.set_datetime(&dt).await, Err(DS3231Error::I2c(nack)));

        let bus = dev.release();
        assert_eq!(bus.transactions, 3);
        assert_eq!(&bus.registers[..7], &[0, 0, 0, 7, 1, 1, 0]);
        assert_eq!(bus.registers[RegAddr::ControlStatus as usize], 0x88);
    }

    #[tokio::test]
    async fn test_async_write_sends_whole_payload() {
        let payload: Vec<u8> = (1..=8).collect();
        let mock = setup_mock(&register_write(RegAddr::Year, &payload)).await;
        let mut dev = DS3231::new(mock, Config::default());
        dev.write_registers(RegAddr::Year as u8, &payload)
            .await
            .unwrap();
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_timestamp_ms() {
        let mock = setup_mock(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![RegAddr::Seconds as u8],
            vec![0x23, 0x38, 0x14, 0x05, 0x26, 0x09, 0x19],
        )])
        .await;
        let mut dev = DS3231::new(mock, Config::default());

        assert_eq!(dev.timestamp_ms().await.unwrap(), 1_569_508_703_000);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_read_temperature() {
        let mock = setup_mock(&[
            I2cTrans::write_read(
                DEVICE_ADDRESS,
                vec![RegAddr::ControlStatus as u8],
                vec![0x00],
            ),
            I2cTrans::write_read(
                DEVICE_ADDRESS,
                vec![RegAddr::MSBTemp as u8],
                vec![0xFF, 0xC0],
            ),
        ])
        .await;
        let mut dev = DS3231::new(mock, Config::default());

        assert_eq!(dev.temperature().await.unwrap(), -0.25);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_read_temperature_busy() {
        let mock = setup_mock(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![RegAddr::ControlStatus as u8],
            vec![0x84],
        )])
        .await;
        let mut dev = DS3231::new(mock, Config::default());

        assert_eq!(dev.temperature().await, Err(DS3231Error::Busy));
        dev.i2c.done();
    }
}
