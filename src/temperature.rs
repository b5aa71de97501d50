//! Temperature register decoding.
//!
//! The DS3231M reports its die temperature as a 10-bit two's-complement
//! value in quarter degrees, left-justified in the MSB/LSB register pair:
//! the MSB holds the signed integer part and bits 7:6 of the LSB hold the
//! fraction.

use crate::registers::Status;

/// Degrees Celsius per count of the temperature register.
pub const DEGREES_PER_COUNT: f32 = 0.25;

/// Returns the signed temperature in quarter degrees Celsius.
#[must_use]
pub const fn quarter_degrees(msb: u8, lsb: u8) -> i16 {
    // Arithmetic shift keeps the sign of the 10-bit value.
    i16::from_be_bytes([msb, lsb]) >> 6
}

/// Decodes the temperature register pair into degrees Celsius.
#[must_use]
pub fn decode_temperature(msb: u8, lsb: u8) -> f32 {
    f32::from(quarter_degrees(msb, lsb)) * DEGREES_PER_COUNT
}

/// Returns true while a temperature conversion is in progress (BSY).
///
/// Only bit 2 of the status byte is considered.
#[must_use]
pub fn is_conversion_busy(status: u8) -> bool {
    Status::from(status).busy()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_positive() {
        assert_eq!(decode_temperature(0x19, 0x40), 25.25);
        assert_eq!(decode_temperature(0x19, 0x00), 25.0);
        assert_eq!(decode_temperature(0x19, 0xC0), 25.75);
        assert_eq!(decode_temperature(0x7F, 0xC0), 127.75);
    }

    #[test]
    fn test_decode_zero() {
        assert_eq!(decode_temperature(0x00, 0x00), 0.0);
    }

    #[test]
    fn test_decode_negative() {
        assert_eq!(decode_temperature(0xE6, 0xC0), -25.25);
        assert_eq!(decode_temperature(0xFF, 0xC0), -0.25);
        assert_eq!(decode_temperature(0x80, 0x00), -128.0);
        assert_eq!(decode_temperature(0xFF, 0x00), -1.0);
    }

    #[test]
    fn test_unused_lsb_bits_are_ignored() {
        assert_eq!(decode_temperature(0x19, 0x7F), 25.25);
        assert_eq!(quarter_degrees(0xE6, 0xFF), -101);
    }

    #[test]
    fn test_quarter_degrees() {
        assert_eq!(quarter_degrees(0x19, 0x40), 101);
        assert_eq!(quarter_degrees(0xE6, 0xC0), -101);
        assert_eq!(quarter_degrees(0x80, 0x00), -512);
        assert_eq!(quarter_degrees(0x7F, 0xC0), 511);
    }

    #[test]
    fn test_conversion_busy_only_looks_at_bit_2() {
        for status in 0..=u8::MAX {
            assert_eq!(is_conversion_busy(status), status & 0x04 != 0);
        }
        assert!(is_conversion_busy(0x84));
        assert!(!is_conversion_busy(0x80));
        assert!(!is_conversion_busy(0xFB));
    }
}
