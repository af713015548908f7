//! The periodic search → label → serialize → publish cycle.

use std::thread;
use std::time::Duration;

use onewire_core::{OneWire, RomCode, search_all};

use crate::publish::Publish;
use crate::registry::DeviceRegistry;
use crate::report::presence_report;

/// Drives the bus on a fixed cadence.
///
/// The poller owns no bus or network state; it borrows the bridge for the
/// full duration of each enumeration pass, which is what serializes access
/// to the stateful search protocol.
pub struct Poller<'a> {
    registry: &'a DeviceRegistry,
    topic: String,
    capacity: usize,
    interval: Duration,
}

impl<'a> Poller<'a> {
    /// Creates a poller reporting at most `capacity` devices per cycle.
    pub fn new(
        registry: &'a DeviceRegistry,
        topic: impl Into<String>,
        capacity: usize,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            topic: topic.into(),
            capacity,
            interval,
        }
    }

    /// Runs one poll cycle and returns the number of devices reported.
    ///
    /// Scan errors are logged and yield an empty cycle; the next scheduled
    /// cycle is the retry. Publish failures are logged and otherwise
    /// ignored.
    pub fn poll_once<T, P>(&self, bus: &mut T, publisher: &mut P) -> usize
    where
        T: OneWire,
        T::BusError: std::fmt::Debug,
        P: Publish + ?Sized,
    {
        let mut found = vec![RomCode::default(); self.capacity];
        let count = match search_all(bus, &mut found) {
            Ok(count) => count,
            Err(e) => {
                log::warn!("bus scan failed: {e:?}; retrying next cycle");
                return 0;
            }
        };
        if count == self.capacity {
            log::warn!("device table full ({count} entries); the report may be truncated");
        }
        let found = &found[..count];
        for (index, rom) in found.iter().enumerate() {
            if !rom.crc_valid() {
                log::warn!("device {index} ROM {rom} fails its CRC check");
            }
            log::info!("device {index}: {rom} ({})", self.registry.lookup(*rom));
        }
        let payload = presence_report(found);
        if let Err(e) = publisher.publish(&self.topic, payload.as_bytes()) {
            log::warn!("publish to {} failed: {e}", self.topic);
        }
        count
    }

    /// Polls forever, sleeping the configured interval between cycles.
    pub fn run<T, P>(&self, bus: &mut T, publisher: &mut P) -> !
    where
        T: OneWire,
        T::BusError: std::fmt::Debug,
        P: Publish + ?Sized,
    {
        loop {
            self.poll_once(bus, publisher);
            thread::sleep(self.interval);
        }
    }
}
