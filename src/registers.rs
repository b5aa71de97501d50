//! Register map and bitfield structures for the DS3231M RTC.
//!
//! This module contains the register addresses, the masks used when decoding
//! the date/time block, and typed views of the control and status registers.

use bitfield::bitfield;

/// Register addresses for the DS3231M RTC.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register (0-59)
    Seconds = 0x00,
    /// Minutes register (0-59)
    Minutes = 0x01,
    /// Hours register (0-23, 24-hour mode)
    Hours = 0x02,
    /// Day of week register (1-7)
    Day = 0x03,
    /// Date register (1-31)
    Date = 0x04,
    /// Month register (1-12) with century bit
    Month = 0x05,
    /// Year register (0-99)
    Year = 0x06,
    /// Control register
    Control = 0x0E,
    /// Control/Status register
    ControlStatus = 0x0F,
    /// Aging offset register
    AgingOffset = 0x10,
    /// Temperature MSB register
    MSBTemp = 0x11,
    /// Temperature LSB register
    LSBTemp = 0x12,
}

/// Number of registers in the date/time block starting at [`RegAddr::Seconds`].
pub const DATETIME_LENGTH: usize = 7;

/// Number of registers in the temperature pair starting at [`RegAddr::MSBTemp`].
pub const TEMPERATURE_LENGTH: usize = 2;

pub(crate) const SECONDS_MASK: u8 = 0x7F;
pub(crate) const MINUTES_MASK: u8 = 0x7F;
// Drops the 12/24 select bit; the driver always writes 24-hour mode.
pub(crate) const HOURS_MASK: u8 = 0x3F;
pub(crate) const DAY_MASK: u8 = 0x07;
pub(crate) const DATE_MASK: u8 = 0x3F;
// Drops the century bit.
pub(crate) const MONTH_MASK: u8 = 0x1F;
pub(crate) const TWELVE_HOUR_FLAG: u8 = 0x40;
pub(crate) const CENTURY_FLAG: u8 = 0x80;

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                Self(v)
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Control register for device configuration.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control(u8);
    impl Debug;
    /// Oscillator disabled while on battery (EOSC)
    pub oscillator_disabled, set_oscillator_disabled: 7;
    /// Enable square wave output on battery power
    pub battery_backed_square_wave, set_battery_backed_square_wave: 6;
    /// Force temperature conversion
    pub convert_temperature, set_convert_temperature: 5;
    /// Square wave rate select
    pub rate_select, set_rate_select: 4, 3;
    /// INT/SQW pin outputs alarm interrupts instead of the square wave
    pub interrupt_control, set_interrupt_control: 2;
    /// Enable alarm 2 interrupt
    pub alarm2_interrupt_enable, set_alarm2_interrupt_enable: 1;
    /// Enable alarm 1 interrupt
    pub alarm1_interrupt_enable, set_alarm1_interrupt_enable: 0;
}
from_register_u8!(Control);

#[cfg(feature = "defmt")]
impl defmt::Format for Control {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Control(EOSC={} BBSQW={} CONV={} RS={} INTCN={} A2IE={} A1IE={})",
            self.oscillator_disabled(),
            self.battery_backed_square_wave(),
            self.convert_temperature(),
            self.rate_select(),
            self.interrupt_control(),
            self.alarm2_interrupt_enable(),
            self.alarm1_interrupt_enable()
        );
    }
}

bitfield! {
    /// Status register for device state and flags.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Status(u8);
    impl Debug;
    /// Oscillator stop flag
    pub oscillator_stop_flag, set_oscillator_stop_flag: 7;
    /// Enable 32kHz output
    pub enable_32khz_output, set_enable_32khz_output: 3;
    /// Temperature conversion busy flag
    pub busy, set_busy: 2;
    /// Alarm 2 triggered flag
    pub alarm2_flag, set_alarm2_flag: 1;
    /// Alarm 1 triggered flag
    pub alarm1_flag, set_alarm1_flag: 0;
}
from_register_u8!(Status);

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Status(OSF={} EN32kHz={} BSY={} A2F={} A1F={})",
            self.oscillator_stop_flag(),
            self.enable_32khz_output(),
            self.busy(),
            self.alarm2_flag(),
            self.alarm1_flag()
        );
    }
}
