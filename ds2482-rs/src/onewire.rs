use crate::{Ds2482, Ds2482Error, registers::DeviceStatus};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use onewire_core::{OneWire, OneWireResult};

pub(crate) const WIRE_RESET_CMD: u8 = 0xb4;
pub(crate) const WIRE_WRITE_BYTE_CMD: u8 = 0xa5;
pub(crate) const WIRE_READ_BYTE_CMD: u8 = 0x96;
pub(crate) const WIRE_SINGLE_BIT_CMD: u8 = 0x87;
pub(crate) const WIRE_TRIPLET_CMD: u8 = 0x78;
pub(crate) const READ_DATA_REG_PTR: u8 = 0xe1;

impl<I2C: I2c<SevenBitAddress>, D: DelayNs> OneWire for Ds2482<I2C, D> {
    type Status = DeviceStatus;

    type BusError = Ds2482Error<I2C::Error>;

    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        self.busy_wait()?;
        self.i2c
            .write(self.addr, &[WIRE_RESET_CMD])
            .map_err(Ds2482Error::from)?;
        // PPD and SD are valid once the reset/presence cycle finished.
        Ok(self.busy_wait()?)
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        self.busy_wait()?;
        self.i2c
            .write(self.addr, &[WIRE_WRITE_BYTE_CMD, byte])
            .map_err(Ds2482Error::from)?;
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        self.busy_wait()?;
        self.i2c
            .write(self.addr, &[WIRE_READ_BYTE_CMD])
            .map_err(Ds2482Error::from)?;
        self.busy_wait()?;
        self.set_read_pointer(READ_DATA_REG_PTR)?;
        Ok(self.read_register()?)
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        self.busy_wait()?;
        self.i2c
            .write(
                self.addr,
                &[WIRE_SINGLE_BIT_CMD, if bit { 0x80 } else { 0x0 }],
            )
            .map_err(Ds2482Error::from)?;
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        self.write_bit(true)?;
        Ok(self.busy_wait()?.single_bit_result())
    }

    fn triplet(&mut self, direction: bool) -> OneWireResult<(bool, bool, bool), Self::BusError> {
        // The chip runs the full three-slot sequence internally; it must be
        // idle before the command and finished before SBR/TSB/DIR are valid.
        self.busy_wait()?;
        self.i2c
            .write(
                self.addr,
                &[WIRE_TRIPLET_CMD, if direction { 0x80 } else { 0x0 }],
            )
            .map_err(Ds2482Error::from)?;
        let status = self.busy_wait()?;
        Ok((
            status.single_bit_result(),
            status.triplet_second_bit(),
            status.branch_dir_taken(),
        ))
    }
}
