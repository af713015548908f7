use crate::{
    ONEWIRE_SEARCH_CMD, OneWire, OneWireStatus, RomCode, error::OneWireError,
};

/// A structure for searching devices on a 1-Wire bus.
///
/// Implements the [ROM search algorithm](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html)
/// for discovering devices sharing the bus. The state is transient: it lives
/// for one enumeration of the bus and is dropped when the enumeration
/// completes or fails.
pub struct RomSearch<'a, T> {
    onewire: &'a mut T,
    last_device: bool,
    last_discrepancy: u8,
    last_rom: u64,
}

impl<'a, T> RomSearch<'a, T> {
    /// Creates a new [`RomSearch`] instance.
    ///
    /// # Arguments
    /// * `onewire` - A mutable reference to a type that implements the [`OneWire`] trait.
    pub fn new(onewire: &'a mut T) -> Self {
        Self {
            onewire,
            last_device: false,
            last_discrepancy: 0,
            last_rom: 0,
        }
    }

    /// Whether the search tree has been exhausted.
    ///
    /// Once this returns `true`, every device on the bus has been reported
    /// and further [next](RomSearch::next) calls return `None`.
    pub fn finished(&self) -> bool {
        self.last_device
    }
}

impl<T: OneWire> RomSearch<'_, T> {
    /// Finds the next device on the 1-Wire bus.
    ///
    /// Each call performs one full pass: a bus reset, the Search-ROM command
    /// and 64 triplets. The pass replays the previous ROM up to the last
    /// unresolved branch point, forces the high branch there, and guesses 0
    /// beyond it, so that repeated calls walk the whole tree of ROM codes in
    /// a fixed order. Call repeatedly until `None` to enumerate the bus.
    ///
    /// # Returns
    /// The ROM code of the next device, or `None` once the tree is exhausted.
    ///
    /// # Errors
    /// * [`OneWireError::NoDevicePresent`] if the reset detects no presence
    ///   pulse. A bus that had devices on a previous pass and none now is an
    ///   error, not an empty result.
    /// * [`OneWireError::ShortCircuit`] if the reset reports a shorted bus.
    /// * [`OneWireError::RomConflict`] if a triplet returns both the id bit
    ///   and its complement set. No device encoding can produce this; the
    ///   pass yields no code.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<RomCode>, OneWireError<T::BusError>> {
        if self.last_device {
            return Ok(None);
        }
        let status = self.onewire.reset()?;
        if status.shortcircuit() {
            return Err(OneWireError::ShortCircuit);
        }
        if !status.presence() {
            return Err(OneWireError::NoDevicePresent);
        }
        self.onewire.write_byte(ONEWIRE_SEARCH_CMD)?;
        let mut rom: u64 = 0;
        let mut current_discrepancy: u8 = 0;
        for bit_number in 1..=64u8 {
            // Replay the previous ROM below the last branch point, force the
            // unexplored high branch at it, guess 0 beyond it.
            let direction = if bit_number < self.last_discrepancy {
                (self.last_rom >> (bit_number - 1)) & 1 == 1
            } else {
                bit_number == self.last_discrepancy
            };
            let (id_bit, complement_bit, taken) = self.onewire.triplet(direction)?;
            if id_bit && complement_bit {
                return Err(OneWireError::RomConflict);
            }
            if !id_bit && !complement_bit && !direction {
                // Real branch point left on the zero side; the highest such
                // position survives the loop and is revisited next pass.
                current_discrepancy = bit_number;
            }
            if taken {
                rom |= 1 << (bit_number - 1);
            }
        }
        self.last_discrepancy = current_discrepancy;
        self.last_device = current_discrepancy == 0;
        self.last_rom = rom;
        Ok(Some(RomCode::new(rom)))
    }
}

/// Reads the ROM code of the only device on the bus.
///
/// Issues the Search-ROM command and 64 triplets, always guessing 0, and
/// accumulates the taken-branch bits least-significant first. No discrepancy
/// tracking is performed.
///
/// The caller must guarantee that exactly one device is physically present:
/// with more than one, the triplets resolve each split in favor of the zero
/// branch and the result is a merged code belonging to no device, returned
/// without any error indication.
///
/// # Errors
/// [`OneWireError::NoDevicePresent`], [`OneWireError::ShortCircuit`] and
/// [`OneWireError::RomConflict`] as for [`RomSearch::next`].
pub fn search_single<T: OneWire>(
    onewire: &mut T,
) -> Result<RomCode, OneWireError<T::BusError>> {
    let status = onewire.reset()?;
    if status.shortcircuit() {
        return Err(OneWireError::ShortCircuit);
    }
    if !status.presence() {
        return Err(OneWireError::NoDevicePresent);
    }
    onewire.write_byte(ONEWIRE_SEARCH_CMD)?;
    let mut rom: u64 = 0;
    for bit in 0..64 {
        let (id_bit, complement_bit, taken) = onewire.triplet(false)?;
        if id_bit && complement_bit {
            return Err(OneWireError::RomConflict);
        }
        if taken {
            rom |= 1 << bit;
        }
    }
    Ok(RomCode::new(rom))
}

/// Enumerates every device on the bus into `found`.
///
/// Runs [`RomSearch`] passes until the search tree is exhausted or `found`
/// is full. Running out of buffer is not an error: the call returns
/// `Ok(found.len())` and the remaining devices are simply not reported.
/// For a fixed, stable device population the returned sequence is identical
/// on every call.
///
/// # Returns
/// The number of ROM codes written to the front of `found`.
///
/// # Errors
/// As for [`RomSearch::next`]; an error aborts the enumeration.
pub fn search_all<T: OneWire>(
    onewire: &mut T,
    found: &mut [RomCode],
) -> Result<usize, OneWireError<T::BusError>> {
    let mut search = RomSearch::new(onewire);
    let mut count = 0;
    while count < found.len() {
        match search.next()? {
            Some(rom) => {
                found[count] = rom;
                count += 1;
            }
            None => break,
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::{search_all, search_single};
    use crate::{OneWireError, RomCode, sim::SimBus};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn enumerate<const N: usize>(roms: &[u64]) -> ([RomCode; N], usize) {
        let mut bus = SimBus::<16>::new(roms);
        let mut found = [RomCode::default(); N];
        let count = search_all(&mut bus, &mut found).unwrap();
        (found, count)
    }

    #[test]
    fn enumerates_every_device_exactly_once() {
        let roms = [
            0xec000048f3ea902d,
            0x5d000048f3fff42d,
            0x65000048f3a0112d,
        ];
        let (found, count) = enumerate::<8>(&roms);
        assert_eq!(count, 3);
        let mut got = [0u64; 3];
        for (g, rom) in got.iter_mut().zip(&found[..count]) {
            *g = rom.raw();
        }
        got.sort_unstable();
        let mut expected = roms;
        expected.sort_unstable();
        assert_eq!(got, expected);
    }

    #[test]
    fn repeated_enumeration_is_identical() {
        let mut rng = StdRng::seed_from_u64(0x1d6a);
        let mut roms = [0u64; 9];
        for rom in roms.iter_mut() {
            *rom = rng.random();
        }
        let (first, n1) = enumerate::<16>(&roms);
        let (second, n2) = enumerate::<16>(&roms);
        assert_eq!(n1, roms.len());
        assert_eq!(n2, roms.len());
        assert_eq!(first, second);
        let mut got = [0u64; 9];
        for (g, rom) in got.iter_mut().zip(&first[..n1]) {
            *g = rom.raw();
        }
        got.sort_unstable();
        roms.sort_unstable();
        assert_eq!(got, roms);
    }

    #[test]
    fn capacity_exhaustion_is_a_partial_result() {
        let roms = [
            0xec000048f3ea902d,
            0x5d000048f3fff42d,
            0x65000048f3a0112d,
            0xcb000048f3b7232d,
        ];
        let (full, _) = enumerate::<4>(&roms);
        let (truncated, count) = enumerate::<2>(&roms);
        assert_eq!(count, 2);
        assert_eq!(truncated[..2], full[..2]);
    }

    #[test]
    fn branch_points_resolve_low_bits_first() {
        // Four devices differing only in their two lowest bits. The search
        // revisits the highest unresolved branch point on each pass, which
        // walks the tree in ascending order of the wire (LSB-first) bit
        // sequence.
        let base = 0x40000048f3c5a000u64;
        let roms = [base, base | 1, base | 2, base | 3];
        let (found, count) = enumerate::<8>(&roms);
        assert_eq!(count, 4);
        let order: [u64; 4] = [base, base | 2, base | 1, base | 3];
        for (got, want) in found[..4].iter().zip(order) {
            assert_eq!(got.raw(), want);
        }
    }

    #[test]
    fn conflict_aborts_the_pass_with_no_codes() {
        let mut bus =
            SimBus::<4>::new(&[0xec000048f3ea902d, 0x5d000048f3fff42d]).with_conflict_at(23);
        let mut found = [RomCode::default(); 4];
        assert_eq!(
            search_all(&mut bus, &mut found),
            Err(OneWireError::RomConflict)
        );
        assert_eq!(found, [RomCode::default(); 4]);
    }

    #[test]
    fn empty_bus_fails_before_the_search_command() {
        let mut bus = SimBus::<4>::new(&[]);
        let mut found = [RomCode::default(); 4];
        assert_eq!(
            search_all(&mut bus, &mut found),
            Err(OneWireError::NoDevicePresent)
        );
        assert_eq!(bus.bytes_written(), 0);
    }

    #[test]
    fn short_circuit_reported_before_presence() {
        let mut bus = SimBus::<4>::new(&[0xec000048f3ea902d]).with_short();
        assert_eq!(search_single(&mut bus), Err(OneWireError::ShortCircuit));
    }

    #[test]
    fn single_device_rom_read_back_exactly() {
        let mut bus = SimBus::<4>::new(&[0xec000048f3ea902d]);
        let rom = search_single(&mut bus).unwrap();
        assert_eq!(rom.raw(), 0xec000048f3ea902d);
    }
}
