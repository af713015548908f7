use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use ds2482::Ds2482Builder;

mod config;
mod poll;
mod publish;
mod registry;
mod report;

use config::{ConfigStore, FileConfig};

/// Scans a DS2482-bridged 1-Wire bus and reports which units are present.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to I2C bus (e.g., /dev/i2c-1)
    #[arg(short, long)]
    path: String,
    /// I2C address of the bridge (0x18..=0x1b per AD0/AD1 strapping)
    #[arg(long, default_value_t = 0x18)]
    address: u8,
    /// Seconds to sleep between poll cycles
    #[arg(short, long, default_value_t = 5)]
    interval: u64,
    /// Maximum number of devices reported per cycle
    #[arg(short, long, default_value_t = 16)]
    capacity: usize,
    /// Configuration file holding broker settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// MQTT broker host; overrides the configuration file
    #[arg(long)]
    broker: Option<String>,
    /// MQTT broker port; overrides the configuration file
    #[arg(long)]
    port: Option<u16>,
    /// Topic the presence report is published to
    #[arg(long)]
    topic: Option<String>,
}

struct Settings {
    broker: Option<String>,
    port: u16,
    topic: String,
    client_id: String,
}

/// Command-line flags win over the configuration file, which wins over the
/// built-in defaults.
fn resolve_settings(args: &Args) -> anyhow::Result<Settings> {
    let store = match &args.config {
        Some(path) => Some(
            FileConfig::open(path).with_context(|| format!("reading {}", path.display()))?,
        ),
        None => None,
    };
    let from_store = |key: &str| store.as_ref().and_then(|s| s.read_string(key).ok());

    let broker = args.broker.clone().or_else(|| from_store("broker_host"));
    let port = args
        .port
        .or_else(|| from_store("broker_port").and_then(|p| p.parse().ok()))
        .unwrap_or(1883);
    let topic = args
        .topic
        .clone()
        .or_else(|| from_store("topic"))
        .unwrap_or_else(|| "onewire/presence".to_owned());
    let client_id = from_store("client_id").unwrap_or_else(|| "unit-scanner".to_owned());
    Ok(Settings {
        broker,
        port,
        topic,
        client_id,
    })
}

fn main() -> anyhow::Result<()> {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    let settings = resolve_settings(&args)?;

    // Open the I2C bus and bring up the bridge
    let i2c = linux_embedded_hal::I2cdev::new(&args.path)
        .with_context(|| format!("opening I2C bus {}", args.path))?;
    let delay = linux_embedded_hal::Delay;
    let mut bridge = Ds2482Builder::default()
        .with_address(args.address)
        .build(i2c, delay)
        .map_err(|e| anyhow!("bridge initialization failed: {e:?}"))?;
    let status = bridge
        .get_status()
        .map_err(|e| anyhow!("bridge status read failed: {e:?}"))?;
    log::info!("bridge status: {status:?}");

    let registry = registry::DeviceRegistry::builtin();
    let mut publisher: Box<dyn publish::Publish> = match &settings.broker {
        Some(host) => {
            log::info!(
                "publishing to {host}:{} on topic {}",
                settings.port,
                settings.topic
            );
            Box::new(publish::MqttPublisher::connect(
                host,
                settings.port,
                &settings.client_id,
            ))
        }
        None => {
            log::info!("no broker configured; reports go to the log");
            Box::new(publish::LogPublisher)
        }
    };

    let poller = poll::Poller::new(
        &registry,
        settings.topic,
        args.capacity,
        Duration::from_secs(args.interval),
    );
    poller.run(&mut bridge, publisher.as_mut())
}
