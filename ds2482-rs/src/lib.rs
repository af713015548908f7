#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

/*! # DS2482
 *
 * A driver for the Analog Devices DS2482-100 I2C to 1-Wire bridge,
 * implementing the [`OneWire`] trait from `onewire-core` on top of any
 * [`I2c`](embedded_hal::i2c::I2c) bus.
 */

pub use onewire_core::{OneWire, OneWireError, OneWireResult};
mod error;
mod onewire;
mod registers;
mod traits;

pub use error::Ds2482Error;
pub use registers::{DeviceConfiguration, DeviceStatus, Ds2482Builder};
pub use traits::Register;

/// Results of DS2482-specific function calls.
pub type Ds2482Result<T, E> = Result<T, Ds2482Error<E>>;

/// A DS2482 I2C to 1-Wire bridge device.
///
/// Takes ownership of an I2C bus (implementing the [`I2c`](embedded_hal::i2c::I2c) trait)
/// and a timer object implementing the [`DelayNs`](embedded_hal::delay::DelayNs) trait.
/// The handle owns all bridge state; every operation goes through it, so
/// access to one physical bridge is serialized by `&mut` borrows and two
/// handles never share a register pointer.
pub struct Ds2482<I, D> {
    pub(crate) i2c: I,
    pub(crate) addr: u8,
    pub(crate) delay: D,
    pub(crate) retries: u8,
}

impl<I, D> Ds2482<I, D> {
    /// Creates a new instance of `Ds2482` with the given I2C interface.
    ///
    /// The device is left untouched; use [`Ds2482Builder`] to reset and
    /// configure it in one step.
    pub fn new(i2c: I, delay: D) -> Self {
        Ds2482 {
            i2c,
            addr: 0x18,
            delay,
            retries: 100,
        }
    }

    /// Set the retry count.
    ///
    /// The retry count bounds every status poll loop: how long the host
    /// waits, in 1 ms steps, before an operation on the 1-Wire or I2C bus
    /// times out.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    /// Set the I2C bus address.
    ///
    /// The DS2482-100 answers on 0x18..=0x1b depending on the AD0/AD1 pin
    /// strapping.
    pub fn with_address(mut self, addr: u8) -> Self {
        self.addr = addr;
        self
    }
}
