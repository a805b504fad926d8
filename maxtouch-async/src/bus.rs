//! Register-addressed transport to the chip.
//!
//! The core only needs two blocking-in-spirit primitives: read a block of
//! registers and write a block of registers. `I2cBus` provides them on top of
//! any `embedded-hal-async` I2C peripheral.

use core::fmt::Debug;

use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use heapless::Vec;

/// The factory default I2C address of the mXT336UD.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x4A;

/// Largest payload a single register write may carry.
pub const MAX_WRITE_LEN: usize = 64;

/// A bus that can read and write blocks of 16-bit addressed registers.
#[allow(async_fn_in_trait)]
pub trait RegisterBus {
    /// The error reported when a transfer fails.
    type Error: Debug;

    /// Reads `buf.len()` bytes starting at `address`.
    async fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Writes `data` starting at `address`.
    async fn write(&mut self, address: u16, data: &[u8]) -> Result<(), Self::Error>;
}

/// An error from the I2C register transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cBusError<E> {
    /// The underlying I2C transfer failed.
    I2c(E),
    /// The write payload exceeds `MAX_WRITE_LEN`.
    FrameTooLong,
}

/// `RegisterBus` over an async I2C peripheral.
///
/// The register pointer is transmitted LSB first, as the maXTouch expects.
pub struct I2cBus<I2cType> {
    i2c: I2cType,
    address: SevenBitAddress,
}

impl<I2cType: I2c<SevenBitAddress>> I2cBus<I2cType> {
    /// Creates a new `I2cBus` talking to the chip at `address`.
    pub fn new(i2c: I2cType, address: SevenBitAddress) -> Self {
        Self { i2c, address }
    }

    /// Gives back the wrapped I2C peripheral.
    pub fn release(self) -> I2cType {
        self.i2c
    }
}

impl<I2cType: I2c<SevenBitAddress>> RegisterBus for I2cBus<I2cType> {
    type Error = I2cBusError<I2cType::Error>;

    async fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c
            .write_read(self.address, &address.to_le_bytes(), buf)
            .await
            .map_err(I2cBusError::I2c)
    }

    async fn write(&mut self, address: u16, data: &[u8]) -> Result<(), Self::Error> {
        let mut frame: Vec<u8, { MAX_WRITE_LEN + 2 }> = Vec::new();
        frame
            .extend_from_slice(&address.to_le_bytes())
            .map_err(|_| I2cBusError::FrameTooLong)?;
        frame
            .extend_from_slice(data)
            .map_err(|_| I2cBusError::FrameTooLong)?;
        self.i2c
            .write(self.address, &frame)
            .await
            .map_err(I2cBusError::I2c)
    }
}
