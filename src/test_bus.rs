//! In-memory DS3231M register file behind the `embedded-hal` I²C traits.
//!
//! Unlike the `embedded-hal-mock` bus, this can fail a write that is part of
//! an `I2c::transaction`, so it drives the error paths of register writes.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

pub(crate) const REGISTER_COUNT: usize = 0x13;

pub(crate) struct RegisterFile {
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// Number of bus transactions seen so far
    pub(crate) transactions: usize,
    fail_at: Option<(usize, ErrorKind)>,
}

impl RegisterFile {
    pub(crate) fn new(registers: [u8; REGISTER_COUNT]) -> Self {
        Self {
            registers,
            transactions: 0,
            fail_at: None,
        }
    }

    /// Fails the transaction with the given zero-based index.
    pub(crate) fn failing_at(mut self, transaction: usize, error: ErrorKind) -> Self {
        self.fail_at = Some((transaction, error));
        self
    }

    fn run(&mut self, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        let index = self.transactions;
        self.transactions += 1;
        if let Some((at, error)) = self.fail_at {
            if at == index {
                return Err(error);
            }
        }

        // The first byte written sets the register pointer, which then
        // auto-increments on every byte read or written.
        let mut pointer: Option<usize> = None;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        match pointer {
                            None => pointer = Some(usize::from(byte)),
                            Some(p) => {
                                self.registers[p % REGISTER_COUNT] = byte;
                                pointer = Some(p + 1);
                            }
                        }
                    }
                }
                Operation::Read(buffer) => {
                    let mut p = pointer.unwrap_or(0);
                    for byte in buffer.iter_mut() {
                        *byte = self.registers[p % REGISTER_COUNT];
                        p += 1;
                    }
                    pointer = Some(p);
                }
            }
        }
        Ok(())
    }
}

impl ErrorType for RegisterFile {
    type Error = ErrorKind;
}

impl I2c for RegisterFile {
    fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.run(operations)
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::i2c::I2c for RegisterFile {
    async fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.run(operations)
    }
}
