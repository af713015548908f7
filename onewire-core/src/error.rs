#[allow(unused_imports)]
use crate::RomSearch;

/// One wire communication error type.
#[derive(Debug, PartialEq, Eq)]
pub enum OneWireError<E> {
    /// Encapsulates the error type from the underlying bus master hardware.
    Bus(E),
    /// Indicates that no device asserted a presence pulse after a bus reset.
    NoDevicePresent,
    /// Indicates that a short circuit was detected on the bus.
    ShortCircuit,
    /// A search read both the id bit and its complement as 1, a response no
    /// population of devices can produce. The current [RomSearch] pass is
    /// unusable; the condition indicates a wiring fault or bus noise.
    RomConflict,
}

impl<E> From<E> for OneWireError<E> {
    fn from(other: E) -> Self {
        Self::Bus(other)
    }
}
