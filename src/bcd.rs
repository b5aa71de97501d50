//! Binary-coded-decimal helpers for the DS3231M time registers.
//!
//! Every time register except the day of week stores its value as two
//! decimal digits: tens in the high nibble, ones in the low nibble.

/// Decodes a BCD byte into its binary value (0-99).
///
/// Each nibble is expected to be 0-9. Bytes with a nibble above 9 are not
/// valid BCD and decode to an unspecified value; no error is reported.
#[must_use]
pub const fn decode_bcd(value: u8) -> u8 {
    value.wrapping_sub(6u8.wrapping_mul(value >> 4))
}

/// Encodes a binary value (0-99) as a BCD byte.
///
/// The exact inverse of [`decode_bcd`] for inputs in 0-99.
#[must_use]
pub const fn encode_bcd(value: u8) -> u8 {
    value.wrapping_add(6u8.wrapping_mul(value / 10))
}
