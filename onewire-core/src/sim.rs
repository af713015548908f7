//! An in-memory 1-Wire bus simulator.
//!
//! [`SimBus`] implements [`OneWire`] over a fixed set of ROM codes with the
//! open-drain semantics of a real bus: during a triplet, every selected
//! device drives its current ROM bit and the complement onto the two read
//! slots (0 wins), and devices whose bit disagrees with the written branch
//! direction drop out until the next reset. This is enough to exercise the
//! ROM search algorithm without a bus master chip attached.

use crate::{OneWire, OneWireResult, OneWireStatus};

/// Bus status reported by [`SimBus`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SimStatus {
    presence: bool,
    short: bool,
}

impl OneWireStatus for SimStatus {
    fn presence(&self) -> bool {
        self.presence
    }

    fn shortcircuit(&self) -> bool {
        self.short
    }
}

/// A simulated 1-Wire bus holding up to `N` devices.
#[derive(Debug)]
pub struct SimBus<const N: usize> {
    roms: [u64; N],
    count: usize,
    active: [bool; N],
    bit: u8,
    short: bool,
    conflict_at: Option<u8>,
    bytes_written: usize,
}

impl<const N: usize> SimBus<N> {
    /// Creates a bus populated with the given ROM codes.
    ///
    /// # Panics
    /// If more than `N` codes are supplied.
    pub fn new(roms: &[u64]) -> Self {
        assert!(roms.len() <= N, "too many devices for this bus");
        let mut stored = [0u64; N];
        stored[..roms.len()].copy_from_slice(roms);
        Self {
            roms: stored,
            count: roms.len(),
            active: [false; N],
            bit: 0,
            short: false,
            conflict_at: None,
            bytes_written: 0,
        }
    }

    /// Reports a short circuit on every reset.
    pub fn with_short(mut self) -> Self {
        self.short = true;
        self
    }

    /// Answers the triplet at the given 1-based bit position with both read
    /// slots set, the response of a bus where no device encoding exists.
    pub fn with_conflict_at(mut self, bit_number: u8) -> Self {
        self.conflict_at = Some(bit_number);
        self
    }

    /// Number of bytes shifted onto the simulated wire so far.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    fn rom_bit(&self, device: usize) -> bool {
        (self.roms[device] >> self.bit) & 1 == 1
    }
}

impl<const N: usize> OneWire for SimBus<N> {
    type Status = SimStatus;
    type BusError = core::convert::Infallible;

    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        for slot in self.active[..self.count].iter_mut() {
            *slot = true;
        }
        self.bit = 0;
        Ok(SimStatus {
            presence: self.count > 0,
            short: self.short,
        })
    }

    fn write_byte(&mut self, _byte: u8) -> OneWireResult<(), Self::BusError> {
        self.bytes_written += 1;
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        // Nothing drives the line; an idle bus reads ones.
        Ok(0xff)
    }

    fn write_bit(&mut self, _bit: bool) -> OneWireResult<(), Self::BusError> {
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        Ok(true)
    }

    fn triplet(&mut self, direction: bool) -> OneWireResult<(bool, bool, bool), Self::BusError> {
        if self.conflict_at == Some(self.bit + 1) {
            self.bit += 1;
            return Ok((true, true, true));
        }
        let mut id_bit = true;
        let mut complement_bit = true;
        for device in 0..self.count {
            if !self.active[device] {
                continue;
            }
            if self.rom_bit(device) {
                complement_bit = false;
            } else {
                id_bit = false;
            }
        }
        let taken = if id_bit == complement_bit {
            // Split population follows the master's direction; an empty bus
            // reads ones and the written slot is a one as well.
            if id_bit { true } else { direction }
        } else {
            id_bit
        };
        for device in 0..self.count {
            if self.active[device] && self.rom_bit(device) != taken {
                self.active[device] = false;
            }
        }
        self.bit += 1;
        Ok((id_bit, complement_bit, taken))
    }
}
