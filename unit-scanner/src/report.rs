//! Serialization of the per-cycle presence report.

use onewire_core::RomCode;
use serde_json::{Map, Value};

/// Builds the JSON presence report for one poll cycle.
///
/// The payload is a flat object mapping the zero-based enumeration index
/// (as a decimal string) to the 16-hex-digit uppercase ROM code, in the
/// order the devices answered the search:
///
/// ```text
/// {"0":"5D000048F3FFF42D","1":"EC000048F3EA902D"}
/// ```
pub fn presence_report(roms: &[RomCode]) -> String {
    let mut map = Map::new();
    for (index, rom) in roms.iter().enumerate() {
        map.insert(index.to_string(), Value::String(rom.to_string()));
    }
    Value::Object(map).to_string()
}

#[cfg(test)]
mod tests {
    use super::presence_report;
    use onewire_core::RomCode;

    #[test]
    fn report_keys_follow_enumeration_order() {
        let roms = [
            RomCode::new(0x5d000048f3fff42d),
            RomCode::new(0xec000048f3ea902d),
        ];
        assert_eq!(
            presence_report(&roms),
            r#"{"0":"5D000048F3FFF42D","1":"EC000048F3EA902D"}"#
        );
    }

    #[test]
    fn empty_bus_reports_an_empty_object() {
        assert_eq!(presence_report(&[]), "{}");
    }

    #[test]
    fn indices_stay_in_order_past_ten_devices() {
        let roms = [RomCode::new(0x1); 11];
        let report = presence_report(&roms);
        let value: serde_json::Value = serde_json::from_str(&report).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys[9], "9");
        assert_eq!(keys[10], "10");
    }
}
