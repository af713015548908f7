use crate::{Ds2482, Ds2482Result};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

/// A register of the DS2482, addressable for reading and writing.
pub trait Register {
    /// Command byte that writes this register, 0 if the register is read-only.
    const WRITE_CMD: u8;
    /// Read-pointer code selecting this register.
    const READ_PTR: u8;

    /// Read the register value from the DS2482.
    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Ds2482Result<(), I::Error>;
    /// Write the register value to the DS2482.
    fn write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Ds2482Result<(), I::Error>;
}
