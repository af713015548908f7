//! Outbound transport for presence reports.
//!
//! The poll loop only knows how to hand a serialized payload to a topic;
//! delivery is best-effort and never blocks a cycle. The MQTT
//! implementation keeps its connection event loop on a background thread
//! and publishes without waiting for acknowledgment.

use std::thread;
use std::time::Duration;

use rumqttc::{Client, Connection, Event, MqttOptions, QoS};

/// A sink for serialized reports.
pub trait Publish {
    /// Hands `payload` to `topic`. Fire-and-forget: an error means the
    /// payload was not accepted locally, not that delivery failed.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// Publish-related errors
#[derive(Debug)]
pub enum PublishError {
    /// The MQTT client rejected the message (e.g. its queue is full).
    Mqtt(String),
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mqtt(e) => write!(f, "MQTT publish error: {}", e),
        }
    }
}

impl std::error::Error for PublishError {}

/// Publishes reports to an MQTT broker, QoS 0.
pub struct MqttPublisher {
    client: Client,
}

impl MqttPublisher {
    /// Connects to the broker and spawns the connection event loop.
    ///
    /// The event loop thread drains broker traffic and reconnects on its
    /// own; the publisher itself never waits on the network.
    pub fn connect(host: &str, port: u16, client_id: &str) -> Self {
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(Duration::from_secs(30));
        let (client, connection) = Client::new(options, 10);
        thread::spawn(move || drain(connection));
        Self { client }
    }
}

fn drain(mut connection: Connection) {
    loop {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(packet)) => log::trace!("mqtt incoming: {packet:?}"),
                Ok(Event::Outgoing(packet)) => log::trace!("mqtt outgoing: {packet:?}"),
                Err(e) => {
                    log::debug!("mqtt connection error: {e}");
                    thread::sleep(Duration::from_secs(5));
                }
            }
        }
    }
}

impl Publish for MqttPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(|e| PublishError::Mqtt(e.to_string()))
    }
}

/// Writes reports to the log when no broker is configured.
pub struct LogPublisher;

impl Publish for LogPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        log::info!("{topic}: {}", String::from_utf8_lossy(payload));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_publisher_always_accepts() {
        let mut publisher = LogPublisher;
        assert!(publisher.publish("onewire/presence", b"{}").is_ok());
    }

    #[test]
    fn publish_error_display() {
        let error = PublishError::Mqtt("queue full".to_string());
        let display = format!("{}", error);
        assert!(display.contains("MQTT publish error"));
        assert!(display.contains("queue full"));
        let _: &dyn std::error::Error = &error;
    }
}
