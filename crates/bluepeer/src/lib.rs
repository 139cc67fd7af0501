//! Bluepeer - a minimal Bluetooth host for connecting to a single peer
//!
//! This library drives a Bluetooth controller over HCI: it opens a
//! transport (Linux HCI socket, TCP or a character device), powers the
//! controller on, creates one classic (BR/EDR) or LE connection, reads the
//! peer's supported features and disconnects.

pub mod device;
pub mod error;
pub mod hci;
pub mod transport;

// Re-export common types for convenience
pub use device::{
    AddressType, BdAddr, Connection, Device, DeviceConfiguration, OwnAddressType,
    PhysicalTransport, RemoteFeatures, Role,
};
pub use error::{Error, HciError};
pub use hci::{HciCommand, HciEvent, HciSocket};
pub use transport::{open_transport, Transport, TransportSpec};
