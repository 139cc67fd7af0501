//! Typed views over the HCI events the device layer waits for

use crate::hci::constants::*;
use crate::hci::packet::HciEvent;
use byteorder::{ByteOrder, LittleEndian};

fn read_addr(bytes: &[u8]) -> [u8; 6] {
    let mut addr = [0u8; 6];
    addr.copy_from_slice(&bytes[..6]);
    addr
}

fn read_features(bytes: &[u8]) -> u64 {
    LittleEndian::read_u64(&bytes[..8])
}

/// Command Complete event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandComplete {
    pub num_hci_command_packets: u8,
    pub opcode: u16,
    pub return_parameters: Vec<u8>,
}

impl CommandComplete {
    pub fn parse(event: &HciEvent) -> Option<Self> {
        if event.event_code != EVT_CMD_COMPLETE || event.parameters.len() < 3 {
            return None;
        }

        Some(CommandComplete {
            num_hci_command_packets: event.parameters[0],
            opcode: LittleEndian::read_u16(&event.parameters[1..3]),
            return_parameters: event.parameters[3..].to_vec(),
        })
    }

    /// First return parameter, which is the status for every command used here
    pub fn status(&self) -> u8 {
        self.return_parameters.first().copied().unwrap_or(HCI_SUCCESS)
    }
}

/// Command Status event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    pub status: u8,
    pub num_hci_command_packets: u8,
    pub opcode: u16,
}

impl CommandStatus {
    pub fn parse(event: &HciEvent) -> Option<Self> {
        if event.event_code != EVT_CMD_STATUS || event.parameters.len() < 4 {
            return None;
        }

        Some(CommandStatus {
            status: event.parameters[0],
            num_hci_command_packets: event.parameters[1],
            opcode: LittleEndian::read_u16(&event.parameters[2..4]),
        })
    }
}

/// BR/EDR Connection Complete event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionComplete {
    pub status: u8,
    pub connection_handle: u16,
    pub bd_addr: [u8; 6],
    pub link_type: u8,
    pub encryption_enabled: u8,
}

impl ConnectionComplete {
    pub fn parse(event: &HciEvent) -> Option<Self> {
        if event.event_code != EVT_CONN_COMPLETE || event.parameters.len() < 11 {
            return None;
        }

        let p = &event.parameters;
        Some(ConnectionComplete {
            status: p[0],
            connection_handle: LittleEndian::read_u16(&p[1..3]),
            bd_addr: read_addr(&p[3..9]),
            link_type: p[9],
            encryption_enabled: p[10],
        })
    }
}

/// LE Connection Complete, or LE Enhanced Connection Complete folded into the same shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeConnectionComplete {
    pub status: u8,
    pub connection_handle: u16,
    pub role: u8,
    pub peer_address_type: u8,
    pub peer_address: [u8; 6],
    pub conn_interval: u16,
    pub conn_latency: u16,
    pub supervision_timeout: u16,
    pub master_clock_accuracy: u8,
}

impl LeConnectionComplete {
    /// Parse an LE (Enhanced) Connection Complete event from an HCI Meta Event
    pub fn parse(event: &HciEvent) -> Option<Self> {
        let p = &event.parameters;
        // Offset of the connection interval; the enhanced variant carries two RPAs before it.
        let tail = match event.le_subevent_code()? {
            EVT_LE_CONN_COMPLETE if p.len() >= 19 => 12,
            EVT_LE_ENHANCED_CONN_COMPLETE if p.len() >= 31 => 24,
            _ => return None,
        };

        Some(LeConnectionComplete {
            status: p[1],
            connection_handle: LittleEndian::read_u16(&p[2..4]),
            role: p[4],
            peer_address_type: p[5],
            peer_address: read_addr(&p[6..12]),
            conn_interval: LittleEndian::read_u16(&p[tail..tail + 2]),
            conn_latency: LittleEndian::read_u16(&p[tail + 2..tail + 4]),
            supervision_timeout: LittleEndian::read_u16(&p[tail + 4..tail + 6]),
            master_clock_accuracy: p[tail + 6],
        })
    }
}

/// Disconnection Complete event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisconnectionComplete {
    pub status: u8,
    pub connection_handle: u16,
    pub reason: u8,
}

impl DisconnectionComplete {
    /// Parse a Disconnection Complete event
    pub fn parse(event: &HciEvent) -> Option<Self> {
        if event.event_code != EVT_DISCONN_COMPLETE {
            return None;
        }

        if event.parameters.len() < 4 {
            return None;
        }

        let status = event.parameters[0];
        let handle = u16::from_le_bytes([event.parameters[1], event.parameters[2]]);
        let reason = event.parameters[3];

        Some(DisconnectionComplete {
            status,
            connection_handle: handle,
            reason,
        })
    }
}

/// Read Remote Supported Features Complete event (LMP page 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteFeaturesComplete {
    pub status: u8,
    pub connection_handle: u16,
    pub lmp_features: u64,
}

impl RemoteFeaturesComplete {
    pub fn parse(event: &HciEvent) -> Option<Self> {
        if event.event_code != EVT_READ_REMOTE_FEATURES_COMPLETE || event.parameters.len() < 11 {
            return None;
        }

        let p = &event.parameters;
        Some(RemoteFeaturesComplete {
            status: p[0],
            connection_handle: LittleEndian::read_u16(&p[1..3]),
            lmp_features: read_features(&p[3..11]),
        })
    }
}

/// Read Remote Extended Features Complete event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteExtendedFeaturesComplete {
    pub status: u8,
    pub connection_handle: u16,
    pub page_number: u8,
    pub max_page_number: u8,
    pub extended_lmp_features: u64,
}

impl RemoteExtendedFeaturesComplete {
    pub fn parse(event: &HciEvent) -> Option<Self> {
        if event.event_code != EVT_READ_REMOTE_EXT_FEATURES_COMPLETE || event.parameters.len() < 13
        {
            return None;
        }

        let p = &event.parameters;
        Some(RemoteExtendedFeaturesComplete {
            status: p[0],
            connection_handle: LittleEndian::read_u16(&p[1..3]),
            page_number: p[3],
            max_page_number: p[4],
            extended_lmp_features: read_features(&p[5..13]),
        })
    }
}

/// LE Read Remote Features Complete subevent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeRemoteFeaturesComplete {
    pub status: u8,
    pub connection_handle: u16,
    pub le_features: u64,
}

impl LeRemoteFeaturesComplete {
    pub fn parse(event: &HciEvent) -> Option<Self> {
        if event.le_subevent_code()? != EVT_LE_READ_REMOTE_FEATURES_COMPLETE
            || event.parameters.len() < 12
        {
            return None;
        }

        let p = &event.parameters;
        Some(LeRemoteFeaturesComplete {
            status: p[1],
            connection_handle: LittleEndian::read_u16(&p[2..4]),
            le_features: read_features(&p[4..12]),
        })
    }
}
