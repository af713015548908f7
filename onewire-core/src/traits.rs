use crate::OneWireResult;

/// Status of the 1-Wire bus as sampled by the bus master.
///
/// Implementations wrap whatever status word the hardware exposes. A status
/// value is a snapshot taken by the operation that returned it; it must be
/// read fresh for every operation and never cached, since the bus master
/// updates it on every command.
pub trait OneWireStatus {
    /// Whether at least one device asserted a presence pulse during the last
    /// bus reset.
    fn presence(&self) -> bool;
    /// Whether a short circuit was detected on the bus.
    fn shortcircuit(&self) -> bool;
}

/// Trait for 1-Wire communication.
///
/// This trait defines the basic operations required for 1-Wire communication,
/// such as resetting the bus, writing and reading bytes and bits, and issuing
/// the triplet primitive used by the ROM search algorithm.
///
/// All operations are explicit about the bus they act on: state lives in the
/// implementing value, and access is serialized by `&mut self` for the full
/// duration of a multi-command sequence such as a search pass.
pub trait OneWire {
    /// The status type returned by the reset operation.
    /// This type must implement the [OneWireStatus] trait.
    type Status: OneWireStatus;
    /// The error type returned by the operations of this trait.
    /// This type is used to indicate errors in the underlying hardware or communication.
    type BusError;

    /// Resets the 1-Wire bus and returns the status of the bus.
    ///
    /// Every sequence of operations that addresses the bus starts with a
    /// reset; the returned status carries the presence-pulse and short-detect
    /// results for the caller to interpret.
    ///
    /// # Errors
    /// This method returns an error if the reset operation fails.
    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError>;

    /// Writes a byte to the 1-Wire bus.
    /// # Arguments
    /// * `byte` - The byte to write to the bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError>;

    /// Reads a byte from the 1-Wire bus.
    /// # Returns
    /// Byte read from the bus.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError>;

    /// Writes a single bit to the 1-Wire bus.
    /// # Arguments
    /// * `bit` - The bit to write.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Reads a single bit from the 1-Wire bus.
    /// # Returns
    /// The bit read from the bus.
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Generates three time slots on the bus: two read slots and one write
    /// slot. A full [ROM search sequence](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html)
    /// issues this command 64 times to resolve one device.
    ///
    /// The devices answer the read slots with their current ROM bit and its
    /// complement. If they disagree about the bit (all devices carry the same
    /// value), the write slot repeats that value and the devices carrying it
    /// stay selected. If both read slots are 0, the population is split and
    /// the write slot transmits `direction`, deselecting every device whose
    /// bit differs. Both read slots returning 1 means no device answered.
    ///
    /// # Arguments
    /// * `direction` - The branch to take when the read slots report a split
    ///   population.
    ///
    /// # Returns
    /// A tuple of three booleans:
    /// * the id bit read from the bus,
    /// * the complement bit read from the bus,
    /// * the branch direction actually written back.
    ///
    /// # Errors
    /// This method returns an error if the triplet operation fails.
    fn triplet(&mut self, direction: bool) -> OneWireResult<(bool, bool, bool), Self::BusError>;
}
