//! Mapping from ROM codes to the unit labels used in reports and logs.

use onewire_core::RomCode;

/// Label returned for a ROM code with no registry entry.
pub const UNKNOWN_UNIT: &str = "unknown";

/// Units known to this deployment, keyed by their 1-Wire ROM code.
const BUILTIN_UNITS: &[(u64, &str)] = &[
    (0xec000048f3ea902d, "T0603-0001"),
    (0x5d000048f3fff42d, "T0603-0002"),
    (0x65000048f3a0112d, "T0603-0003"),
    (0xcb000048f3b7232d, "T0604-0001"),
];

/// A read-only table of known units.
///
/// Lookups are a linear scan; the registry holds a handful of entries and is
/// consulted once per device per poll cycle, so nothing faster is needed.
pub struct DeviceRegistry {
    entries: &'static [(u64, &'static str)],
}

impl DeviceRegistry {
    /// The registry of units built into this firmware revision.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_UNITS,
        }
    }

    /// The unit label for `rom`, or [`UNKNOWN_UNIT`] if it is not listed.
    ///
    /// Never returns an absent value; unknown devices still show up in
    /// reports and logs, just without a name.
    pub fn lookup(&self, rom: RomCode) -> &'static str {
        self.entries
            .iter()
            .find(|(code, _)| *code == rom.raw())
            .map(|(_, label)| *label)
            .unwrap_or(UNKNOWN_UNIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_units_resolve_to_their_label() {
        let registry = DeviceRegistry::builtin();
        assert_eq!(
            registry.lookup(RomCode::new(0x5d000048f3fff42d)),
            "T0603-0002"
        );
        assert_eq!(
            registry.lookup(RomCode::new(0xec000048f3ea902d)),
            "T0603-0001"
        );
    }

    #[test]
    fn unlisted_rom_gets_the_sentinel() {
        let registry = DeviceRegistry::builtin();
        assert_eq!(registry.lookup(RomCode::new(0x1)), UNKNOWN_UNIT);
    }
}
