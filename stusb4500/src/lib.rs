//! Driver for the STUSB4500 standalone USB-PD sink controller.
//!
//! The STUSB4500 negotiates with an upstream USB-C source on its own; the
//! host only edits the sink profiles (PDOs) it advertises. This crate reads
//! the chip's non-volatile customer configuration over I2C, lets the caller
//! inspect and edit a cached copy of it, and commits the whole image back in
//! one batch, followed by a PD soft reset so the source renegotiates.
//!
//! The [`reconcile`] module builds on this to implement one-shot boot-time
//! configuration: compare the stored PDO2 against a desired target and
//! rewrite it only when they differ.
//!
//! The driver is generic over [`embedded_hal_async::i2c::I2c`] and carries
//! no protocol logic of its own.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

mod fmt;

mod device;
pub mod nvm;
pub mod reconcile;

#[cfg(test)]
mod mock_bus;

pub use device::{DEFAULT_ADDRESS, Stusb4500};
pub use nvm::{ConfigOkMode, GpioMode, NvmImage, PdoChannel};
pub use reconcile::{Outcome, ReconcileConfig, reconcile};

/// Driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The underlying I2C transaction failed.
    #[error("I2C bus error")]
    Bus(E),

    /// The device ID register did not identify an STUSB4500.
    #[error("unexpected device ID {0:#04x}")]
    BadDeviceId(u8),

    /// The NVM controller did not acknowledge a request in time.
    #[error("NVM request timed out")]
    NvmTimeout,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}
