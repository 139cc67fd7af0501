//! Bluetooth HCI (Host Controller Interface) implementation
//!
//! This module provides the command/event codec and the Linux HCI socket.

pub mod constants;
pub mod events;
pub mod packet;
pub mod socket;


pub use events::{
    CommandComplete, CommandStatus, ConnectionComplete, DisconnectionComplete,
    LeConnectionComplete, LeRemoteFeaturesComplete, RemoteExtendedFeaturesComplete,
    RemoteFeaturesComplete,
};
pub use packet::{HciCommand, HciEvent};
pub use socket::HciSocket;
