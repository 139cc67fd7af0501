//! peer-device-info
//!
//! Connects to a peer device over BR/EDR or LE through a local controller,
//! reports the features the peer supports, and disconnects.

use anyhow::{Context, Result};
use bluepeer::hci::constants::HCI_REMOTE_USER_TERMINATED_CONNECTION;
use bluepeer::{
    open_transport, AddressType, BdAddr, Device, DeviceConfiguration, OwnAddressType,
    PhysicalTransport, Transport,
};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn, LevelFilter};
use std::path::PathBuf;

const LOG_LEVEL_ENV: &str = "BUMBLE_LOGLEVEL";

#[derive(Parser, Debug)]
#[command(name = "peer-device-info")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Transport of local controller (hci-socket:N, tcp-client:HOST:PORT, file:PATH)
    #[arg(long)]
    controller: String,

    /// Address of peer device
    #[arg(long)]
    address: String,

    /// Address type of peer device
    #[arg(long = "address_type", value_enum, default_value_t = PeerAddressKind::Public)]
    address_type: PeerAddressKind,

    /// The transport to connect to peer device
    #[arg(long, value_enum, default_value_t = TransportKind::BrEdr)]
    transport: TransportKind,

    /// JSON device configuration file
    #[arg(long)]
    device_config: Option<PathBuf>,

    /// Connect and disconnect without reading the peer's features
    #[arg(long)]
    skip_features: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum PeerAddressKind {
    Public,
    Static,
    #[value(name = "random/resolvable")]
    RandomResolvable,
    #[value(name = "random/non-resolvable")]
    RandomNonResolvable,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum TransportKind {
    #[value(name = "BR/EDR")]
    BrEdr,
    #[value(name = "BLE")]
    Ble,
}

/// Everything `Device::connect` needs besides the peer address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConnectPlan {
    transport: PhysicalTransport,
    peer_address_type: AddressType,
    own_address_type: Option<OwnAddressType>,
}

/// Own address type for an `--address_type` name; unknown names mean public
fn own_address_type_from_name(name: &str) -> OwnAddressType {
    match name {
        "public" => OwnAddressType::Public,
        "random" => OwnAddressType::Random,
        "random/resolvable" => OwnAddressType::ResolvableOrPublic,
        "random/non-resolvable" => OwnAddressType::ResolvableOrRandom,
        _ => OwnAddressType::Public,
    }
}

fn connect_plan(
    transport: TransportKind,
    address_kind: PeerAddressKind,
    suffix_type: Option<AddressType>,
) -> ConnectPlan {
    // `--address_type` also picks the peer's LE address type here. Without it
    // a bare address would always be sent as random, even for `public`.
    let peer_address_type = match (address_kind, suffix_type) {
        (_, Some(address_type)) => address_type,
        (PeerAddressKind::Public, None) => AddressType::Public,
        _ => AddressType::Random,
    };

    match transport {
        TransportKind::BrEdr => ConnectPlan {
            transport: PhysicalTransport::BrEdr,
            peer_address_type,
            own_address_type: None,
        },
        TransportKind::Ble => {
            let name = address_kind
                .to_possible_value()
                .map(|value| value.get_name().to_string())
                .unwrap_or_default();
            ConnectPlan {
                transport: PhysicalTransport::Le,
                peer_address_type,
                own_address_type: Some(own_address_type_from_name(&name)),
            }
        }
    }
}

/// Log level for a `BUMBLE_LOGLEVEL` value, defaulting to warnings
fn log_level(value: Option<&str>) -> LevelFilter {
    match value.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
        Some("TRACE") => LevelFilter::Trace,
        Some("DEBUG") => LevelFilter::Debug,
        Some("INFO") => LevelFilter::Info,
        Some("WARNING") | Some("WARN") => LevelFilter::Warn,
        Some("ERROR") | Some("CRITICAL") | Some("FATAL") => LevelFilter::Error,
        Some("OFF") => LevelFilter::Off,
        _ => LevelFilter::Warn,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = log_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .init();

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    println!("<<< connecting to HCI...");
    let transport = open_transport(&cli.controller)
        .with_context(|| format!("Failed to open transport '{}'", cli.controller))?;
    run_with_transport(cli, transport)
}

/// Power on, connect, report features and disconnect over an open transport
fn run_with_transport(cli: &Cli, transport: Box<dyn Transport>) -> Result<()> {
    let (peer_address, suffix_type) = BdAddr::parse_with_type(&cli.address)
        .with_context(|| format!("Invalid peer address '{}'", cli.address))?;

    let mut config = match &cli.device_config {
        Some(path) => DeviceConfiguration::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => DeviceConfiguration::default(),
    };
    config.classic_enabled = true;
    config.le_enabled = true;

    let mut device = Device::from_config_with_transport(config, transport);

    let plan = connect_plan(cli.transport, cli.address_type, suffix_type);

    device.power_on().context("Failed to power on device")?;
    debug!(
        "device: classic_enabled:{}, le_enabled:{}",
        device.classic_enabled(),
        device.le_enabled()
    );
    debug!(
        "connecting to {}, addr_type: {:?}, transport: {}",
        peer_address, plan.own_address_type, plan.transport
    );

    let connection = device
        .connect(
            &peer_address,
            plan.peer_address_type,
            plan.transport,
            plan.own_address_type.unwrap_or_default(),
        )
        .with_context(|| format!("Failed to connect to {}", peer_address))?;
    debug!("connection done, handle: {}", connection.handle);

    if !cli.skip_features {
        match device.read_remote_features(&connection) {
            Ok(features) => {
                info!("read features of {}", peer_address);
                print!("{}", features);
            }
            Err(e) => warn!("failed to read features of {}: {}", peer_address, e),
        }
    }

    debug!("disconnecting");
    device
        .disconnect(connection, HCI_REMOTE_USER_TERMINATED_CONNECTION)
        .context("Failed to disconnect")?;
    debug!("disconnected");

    Ok(())
}
