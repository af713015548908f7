//! Named configuration values.
//!
//! The scanner consumes configuration as an opaque read/write string store;
//! on a Linux host that store is a flat JSON file. Only startup wiring
//! (broker host/port, topic, client id) goes through it.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde_json::{Map, Value};

/// A named string-value store.
pub trait ConfigStore {
    /// Reads the value stored under `key`.
    fn read_string(&self, key: &str) -> Result<String, ConfigError>;
    /// Stores `value` under `key`, replacing any previous value.
    fn write_string(&mut self, key: &str, value: &str) -> Result<(), ConfigError>;
}

/// Configuration store errors
#[derive(Debug)]
pub enum ConfigError {
    /// The key has no stored value.
    NotFound,
    /// The backing file could not be read or written.
    Io(io::Error),
    /// The backing file is not a JSON object of strings.
    Malformed(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "no value stored under this key"),
            Self::Io(e) => write!(f, "config file error: {}", e),
            Self::Malformed(e) => write!(f, "config file is not valid JSON: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e)
    }
}

/// A [`ConfigStore`] backed by a JSON file of string values.
///
/// A missing file is an empty store; it is created on the first write.
pub struct FileConfig {
    path: PathBuf,
    values: Map<String, Value>,
}

impl FileConfig {
    /// Opens the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(Self { path, values })
    }
}

impl ConfigStore for FileConfig {
    fn read_string(&self, key: &str) -> Result<String, ConfigError> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(ConfigError::NotFound)
    }

    fn write_string(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.values
            .insert(key.to_owned(), Value::String(value.to_owned()));
        fs::write(&self.path, serde_json::to_string_pretty(&self.values)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("unit-scanner-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let store = FileConfig::open(temp_store("missing")).unwrap();
        assert!(matches!(
            store.read_string("broker_host"),
            Err(ConfigError::NotFound)
        ));
    }

    #[test]
    fn write_then_read_round_trips() {
        let path = temp_store("roundtrip");
        {
            let mut store = FileConfig::open(&path).unwrap();
            store.write_string("broker_host", "mqtt.local").unwrap();
            store.write_string("topic", "onewire/presence").unwrap();
        }
        let reopened = FileConfig::open(&path).unwrap();
        assert_eq!(reopened.read_string("broker_host").unwrap(), "mqtt.local");
        assert_eq!(reopened.read_string("topic").unwrap(), "onewire/presence");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn garbage_file_is_rejected() {
        let path = temp_store("garbage");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileConfig::open(&path),
            Err(ConfigError::Malformed(_))
        ));
        let _ = fs::remove_file(&path);
    }
}
