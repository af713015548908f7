use crate::{Ds2482, Ds2482Error, Ds2482Result, traits::Register};
use bitfield_struct::bitfield;
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use onewire_core::OneWireStatus;

pub(crate) const SET_READ_PTR_CMD: u8 = 0xe1; // Set the read pointer
pub(crate) const DEVICE_RESET_CMD: u8 = 0xf0; // Reset the bridge
pub(crate) const WRITE_CONFIG_CMD: u8 = 0xd2; // Write the configuration register
pub(crate) const STATUS_REG_PTR: u8 = 0xf0; // Status register
pub(crate) const CONFIG_REG_PTR: u8 = 0xc3; // Configuration register

/// Builder for creating a [`Ds2482`] instance with custom configuration.
pub struct Ds2482Builder {
    retries: u8,
    addr: u8,
    config: DeviceConfiguration,
}

impl Default for Ds2482Builder {
    fn default() -> Self {
        Ds2482Builder {
            retries: 100,
            addr: 0x18,
            config: DeviceConfiguration::new(),
        }
    }
}

impl Ds2482Builder {
    /// Sets the retry count for the device.
    ///
    /// The retry count bounds every status poll loop: how long the host
    /// waits, in 1 ms steps, before an operation on the 1-Wire or I2C bus
    /// times out.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the I2C bus address (0x18..=0x1b per AD0/AD1 strapping).
    pub fn with_address(mut self, addr: u8) -> Self {
        self.addr = addr;
        self
    }

    /// Sets the device configuration.
    pub fn with_config(mut self, config: DeviceConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Builds a new `Ds2482` instance with the specified configuration.
    ///
    /// Resets the bridge and writes the configuration register before
    /// returning the handle.
    pub fn build<I: I2c<SevenBitAddress>, D: DelayNs>(
        self,
        i2c: I,
        delay: D,
    ) -> Ds2482Result<Ds2482<I, D>, I::Error> {
        let mut dev = Ds2482 {
            i2c,
            addr: self.addr,
            delay,
            retries: self.retries,
        };
        dev.device_reset()?;
        let mut config = self.config;
        config.write(&mut dev)?;
        Ok(dev)
    }
}

impl<I2C: I2c<SevenBitAddress>, D: DelayNs> Ds2482<I2C, D> {
    /// Get a fresh status snapshot of the device.
    pub fn get_status(&mut self) -> Ds2482Result<DeviceStatus, I2C::Error> {
        let mut stat = DeviceStatus::default();
        stat.read(self)?;
        Ok(stat)
    }

    /// Reset the device.
    ///
    /// Performs a global reset of device state machine logic and terminates
    /// any ongoing 1-Wire communication, then polls until the RST bit
    /// reports the completed reset cycle.
    pub fn device_reset(&mut self) -> Ds2482Result<DeviceStatus, I2C::Error> {
        self.i2c.write(self.addr, &[DEVICE_RESET_CMD])?;
        // The reset command leaves the read pointer at the status register.
        for _ in 0..=self.retries {
            let status = DeviceStatus::from_bits(self.read_register()?);
            if status.device_reset() {
                return Ok(status);
            }
            self.delay.delay_ms(1);
        }
        Err(Ds2482Error::Timeout)
    }

    /// Select which internal register subsequent [`read_register`](Ds2482::read_register)
    /// calls return.
    pub fn set_read_pointer(&mut self, pointer: u8) -> Ds2482Result<(), I2C::Error> {
        self.i2c.write(self.addr, &[SET_READ_PTR_CMD, pointer])?;
        Ok(())
    }

    /// Read the currently pointed-to register.
    pub fn read_register(&mut self) -> Ds2482Result<u8, I2C::Error> {
        let mut buf = [0u8; 1];
        self.i2c.read(self.addr, &mut buf)?;
        Ok(buf[0])
    }

    /// Poll the status register until the 1-Wire line is idle.
    ///
    /// Returns the last status read. The poll is bounded by the configured
    /// retry count with a 1 ms delay per iteration; exhausting it surfaces
    /// as [`Ds2482Error::Timeout`] instead of spinning forever on an
    /// unresponsive bridge.
    pub fn busy_wait(&mut self) -> Ds2482Result<DeviceStatus, I2C::Error> {
        self.set_read_pointer(STATUS_REG_PTR)?;
        for _ in 0..=self.retries {
            let status = DeviceStatus::from_bits(self.read_register()?);
            if !status.onewire_busy() {
                return Ok(status);
            }
            self.delay.delay_ms(1);
        }
        Err(Ds2482Error::Timeout)
    }
}

/// Status register for the DS2482.
///
/// The read-only Status register is the general means for the DS2482 to
/// report bit-type data from the 1-Wire side, 1-Wire busy status, and its
/// own reset status to the host processor. All 1-Wire communication
/// commands and the Device Reset command position the read pointer at the
/// Status register for the host processor to read with minimal protocol
/// overhead. Status information is updated during the execution of certain
/// commands only, so a snapshot must be read fresh before being interpreted
/// and never cached across operations.
#[bitfield(u8)]
pub struct DeviceStatus {
    /// The 1WB bit reports whether the 1-Wire line is busy. During 1-Wire
    /// communication 1WB is 1; once the command is completed, 1WB returns
    /// to its default 0.
    pub(crate) onewire_busy: bool,
    /// The PPD bit is updated with every 1-Wire Reset command. It is set if
    /// the DS2482 samples a logic 0 on the 1-Wire line at tMSP during the
    /// presence-detect cycle, and returns to 0 if a subsequent reset sees
    /// no presence pulse.
    pub(crate) present_pulse_detect: bool,
    /// The SD bit is updated with every 1-Wire Reset command. It is set if
    /// the DS2482 samples a logic 0 on the 1-Wire line at tSI during the
    /// presence-detect cycle, i.e. the line is shorted low.
    pub(crate) short_detect: bool,
    /// The LL bit reports the logic state of the active 1-Wire line without
    /// initiating any 1-Wire communication. The line is sampled every time
    /// the Status register is read.
    pub logic_level: bool,
    /// If the RST bit is 1, the DS2482 has performed an internal reset
    /// cycle, either caused by a power-on reset or from executing the
    /// Device Reset command. The bit clears when a Write Device
    /// Configuration command restores the 1-Wire feature selection.
    pub device_reset: bool,
    /// The SBR bit reports the logic state of the active 1-Wire line
    /// sampled at tMSR of a 1-Wire Single Bit command or the first bit of a
    /// 1-Wire Triplet command.
    pub(crate) single_bit_result: bool,
    /// The TSB bit reports the logic state of the active 1-Wire line
    /// sampled at tMSR of the second bit of a 1-Wire Triplet command. It is
    /// updated only by the Triplet command.
    pub(crate) triplet_second_bit: bool,
    /// Whenever a 1-Wire Triplet command is executed, the DIR bit reports
    /// the search direction that was chosen by the third bit of the
    /// triplet.
    pub(crate) branch_dir_taken: bool,
}

impl OneWireStatus for DeviceStatus {
    fn presence(&self) -> bool {
        self.present_pulse_detect()
    }

    fn shortcircuit(&self) -> bool {
        self.short_detect()
    }
}

impl Register for DeviceStatus {
    const WRITE_CMD: u8 = 0x0; // read-only register

    const READ_PTR: u8 = STATUS_REG_PTR;

    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Ds2482Result<(), I::Error> {
        let mut buf = [0u8; 1];
        dev.i2c
            .write_read(dev.addr, &[SET_READ_PTR_CMD, Self::READ_PTR], &mut buf)?;
        *self = Self::from_bits(buf[0]);
        Ok(())
    }

    fn write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        _dev: &mut Ds2482<I, D>,
    ) -> Ds2482Result<(), I::Error> {
        Ok(())
    }
}

/// # Device configuration register
///
/// The DS2482 supports three 1-Wire features that are enabled or selected
/// through the Device Configuration register: Active Pullup (APU), Strong
/// Pullup (SPU) and 1-Wire Speed (1WS). The features can be selected in any
/// combination; while APU and 1WS maintain their states, SPU returns to its
/// inactive state as soon as the strong pullup has ended.
///
/// After a device reset (power-up cycle or initiated by the Device Reset
/// command), the register reads 00h.
#[bitfield(u8)]
pub struct DeviceConfiguration {
    /// The APU bit controls whether an active pullup (low impedance
    /// transistor) or a passive pullup (resistor) is used to drive the
    /// 1-Wire line from low to high. Enabling active pullup is generally
    /// recommended for best 1-Wire bus performance.
    pub active_pullup: bool,
    ppm: bool, // presence-pulse masking, early silicon revisions only
    /// The SPU bit activates the strong pullup prior to a 1-Wire Write Byte
    /// or 1-Wire Single Bit command, for slaves that draw extra power
    /// during EEPROM copies or temperature conversions.
    pub strong_pullup: bool,
    /// The 1WS bit selects overdrive timing for all 1-Wire communication
    /// generated by the DS2482. Standard speed when 0.
    pub onewire_speed: bool,
    #[bits(4)]
    reserved: u8,
}

/// The configuration byte is protected on the wire: the upper nibble must
/// carry the one's complement of the lower nibble or the bridge ignores the
/// write.
const fn cfg_to_u8(cfg: u8) -> u8 {
    (cfg & 0x0f) | ((!cfg & 0x0f) << 4)
}

impl Register for DeviceConfiguration {
    const WRITE_CMD: u8 = WRITE_CONFIG_CMD;
    const READ_PTR: u8 = CONFIG_REG_PTR;

    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Ds2482Result<(), I::Error> {
        let mut buf = [0u8; 1];
        dev.i2c
            .write_read(dev.addr, &[SET_READ_PTR_CMD, Self::READ_PTR], &mut buf)?;
        *self = Self::from_bits(buf[0]);
        Ok(())
    }

    fn write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Ds2482Result<(), I::Error> {
        dev.busy_wait()?;
        let mut buf = [0u8; 1];
        dev.i2c.write_read(
            dev.addr,
            &[Self::WRITE_CMD, cfg_to_u8(self.into_bits())],
            &mut buf,
        )?;
        // The bridge echoes the accepted configuration with the protection
        // nibble stripped.
        *self = Self::from_bits(buf[0]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn status_bit_positions() {
        let status = DeviceStatus::from_bits(0x02);
        assert!(status.presence());
        assert!(!status.shortcircuit());
        let status = DeviceStatus::from_bits(0xa0);
        assert!(status.single_bit_result());
        assert!(!status.triplet_second_bit());
        assert!(status.branch_dir_taken());
    }

    #[test]
    fn device_reset_polls_until_rst() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write(0x18, vec![DEVICE_RESET_CMD]),
            I2cTransaction::read(0x18, vec![0x00]),
            I2cTransaction::read(0x18, vec![0x10]),
        ]);
        let mut dev = Ds2482::new(&mut i2c, NoopDelay);
        let status = dev.device_reset().unwrap();
        assert!(status.device_reset());
        drop(dev);
        i2c.done();
    }

    #[test]
    fn busy_wait_times_out_on_a_stuck_bridge() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write(0x18, vec![SET_READ_PTR_CMD, STATUS_REG_PTR]),
            I2cTransaction::read(0x18, vec![0x01]),
            I2cTransaction::read(0x18, vec![0x01]),
        ]);
        let mut dev = Ds2482::new(&mut i2c, NoopDelay).with_retries(1);
        assert!(matches!(dev.busy_wait(), Err(Ds2482Error::Timeout)));
        drop(dev);
        i2c.done();
    }

    #[test]
    fn configuration_write_carries_complement_nibble() {
        let config = DeviceConfiguration::new().with_active_pullup(true);
        assert_eq!(cfg_to_u8(config.into_bits()), 0xe1);

        let mut i2c = I2cMock::new(&[
            // busy check before the register write
            I2cTransaction::write(0x18, vec![SET_READ_PTR_CMD, STATUS_REG_PTR]),
            I2cTransaction::read(0x18, vec![0x00]),
            I2cTransaction::write_read(0x18, vec![WRITE_CONFIG_CMD, 0xe1], vec![0x01]),
        ]);
        let mut dev = Ds2482::new(&mut i2c, NoopDelay);
        let mut config = config;
        config.write(&mut dev).unwrap();
        assert!(config.active_pullup());
        drop(dev);
        i2c.done();
    }

    #[test]
    fn builder_resets_and_configures() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write(0x18, vec![DEVICE_RESET_CMD]),
            I2cTransaction::read(0x18, vec![0x10]),
            I2cTransaction::write(0x18, vec![SET_READ_PTR_CMD, STATUS_REG_PTR]),
            I2cTransaction::read(0x18, vec![0x00]),
            I2cTransaction::write_read(0x18, vec![WRITE_CONFIG_CMD, 0xf0], vec![0x00]),
        ]);
        let dev = Ds2482Builder::default().build(&mut i2c, NoopDelay).unwrap();
        drop(dev);
        i2c.done();
    }
}
