//! HCI packet structures and parsing
//!
//! This module contains structures and methods for handling HCI packets.

use crate::hci::constants::*;
use byteorder::{ByteOrder, LittleEndian};

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    let mut bytes = [0u8; 2];
    LittleEndian::write_u16(&mut bytes, value);
    buf.extend_from_slice(&bytes);
}

fn put_u64(buf: &mut Vec<u8>, value: u64) {
    let mut bytes = [0u8; 8];
    LittleEndian::write_u64(&mut bytes, value);
    buf.extend_from_slice(&bytes);
}

/// Commands the host issues to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HciCommand {
    // Link Control Commands (OGF: 0x01)
    CreateConnection {
        bd_addr: [u8; 6],
        packet_type: u16,
        page_scan_repetition_mode: u8,
        clock_offset: u16,
        allow_role_switch: u8,
    },
    CreateConnectionCancel { bd_addr: [u8; 6] },
    Disconnect { handle: u16, reason: u8 },
    ReadRemoteSupportedFeatures { handle: u16 },
    ReadRemoteExtendedFeatures { handle: u16, page_number: u8 },

    // Host Controller Commands (OGF: 0x03)
    Reset,
    SetEventMask { event_mask: u64 },
    WriteLocalName { local_name: String },
    WriteLeHostSupport { le_supported_host: bool },

    // Informational Parameters (OGF: 0x04)
    ReadLocalVersionInformation,
    ReadBdAddr,

    // LE Commands (OGF: 0x08)
    LeSetEventMask { le_event_mask: u64 },
    LeSetRandomAddress { random_address: [u8; 6] },
    LeCreateConnection {
        scan_interval: u16,
        scan_window: u16,
        initiator_filter_policy: u8,
        peer_addr_type: u8,
        peer_addr: [u8; 6],
        own_address_type: u8,
        conn_interval_min: u16,
        conn_interval_max: u16,
        conn_latency: u16,
        supervision_timeout: u16,
        min_ce_length: u16,
        max_ce_length: u16,
    },
    LeCreateConnectionCancel,
    LeReadRemoteFeatures { handle: u16 },
}

impl HciCommand {
    /// Get the OGF and OCF for this command
    pub fn opcode_parts(&self) -> (u8, u16) {
        match self {
            // Link Control Commands
            Self::CreateConnection { .. } => (OGF_LINK_CTL, OCF_CREATE_CONNECTION),
            Self::CreateConnectionCancel { .. } => (OGF_LINK_CTL, OCF_CREATE_CONNECTION_CANCEL),
            Self::Disconnect { .. } => (OGF_LINK_CTL, OCF_DISCONNECT),
            Self::ReadRemoteSupportedFeatures { .. } => {
                (OGF_LINK_CTL, OCF_READ_REMOTE_SUPPORTED_FEATURES)
            }
            Self::ReadRemoteExtendedFeatures { .. } => {
                (OGF_LINK_CTL, OCF_READ_REMOTE_EXTENDED_FEATURES)
            }

            // Host Controller Commands
            Self::Reset => (OGF_HOST_CTL, OCF_RESET),
            Self::SetEventMask { .. } => (OGF_HOST_CTL, OCF_SET_EVENT_MASK),
            Self::WriteLocalName { .. } => (OGF_HOST_CTL, OCF_WRITE_LOCAL_NAME),
            Self::WriteLeHostSupport { .. } => (OGF_HOST_CTL, OCF_WRITE_LE_HOST_SUPPORT),

            // Informational Parameters
            Self::ReadLocalVersionInformation => {
                (OGF_INFO_PARAM, OCF_READ_LOCAL_VERSION_INFORMATION)
            }
            Self::ReadBdAddr => (OGF_INFO_PARAM, OCF_READ_BD_ADDR),

            // LE Commands
            Self::LeSetEventMask { .. } => (OGF_LE, OCF_LE_SET_EVENT_MASK),
            Self::LeSetRandomAddress { .. } => (OGF_LE, OCF_LE_SET_RANDOM_ADDRESS),
            Self::LeCreateConnection { .. } => (OGF_LE, OCF_LE_CREATE_CONNECTION),
            Self::LeCreateConnectionCancel => (OGF_LE, OCF_LE_CREATE_CONNECTION_CANCEL),
            Self::LeReadRemoteFeatures { .. } => (OGF_LE, OCF_LE_READ_REMOTE_FEATURES),
        }
    }

    /// The 16-bit opcode carried in the command header
    pub fn opcode(&self) -> u16 {
        let (ogf, ocf) = self.opcode_parts();
        opcode(ogf, ocf)
    }

    /// Convert the command to its raw parameter bytes
    pub fn parameters(&self) -> Vec<u8> {
        let mut params = Vec::new();
        match *self {
            Self::Reset
            | Self::ReadLocalVersionInformation
            | Self::ReadBdAddr
            | Self::LeCreateConnectionCancel => {}

            Self::CreateConnection {
                bd_addr,
                packet_type,
                page_scan_repetition_mode,
                clock_offset,
                allow_role_switch,
            } => {
                params.extend_from_slice(&bd_addr);
                put_u16(&mut params, packet_type);
                params.push(page_scan_repetition_mode);
                params.push(0x00); // reserved
                put_u16(&mut params, clock_offset);
                params.push(allow_role_switch);
            }

            Self::CreateConnectionCancel { bd_addr } => {
                params.extend_from_slice(&bd_addr);
            }

            Self::Disconnect { handle, reason } => {
                put_u16(&mut params, handle);
                params.push(reason);
            }

            Self::ReadRemoteSupportedFeatures { handle } | Self::LeReadRemoteFeatures { handle } => {
                put_u16(&mut params, handle);
            }

            Self::ReadRemoteExtendedFeatures {
                handle,
                page_number,
            } => {
                put_u16(&mut params, handle);
                params.push(page_number);
            }

            Self::SetEventMask { event_mask } => {
                put_u64(&mut params, event_mask);
            }

            Self::WriteLocalName { ref local_name } => {
                // UTF-8 name, truncated and zero padded to 248 bytes
                let name_bytes = local_name.as_bytes();
                let name_len = std::cmp::min(name_bytes.len(), LOCAL_NAME_LEN);
                params.extend_from_slice(&name_bytes[..name_len]);
                params.resize(LOCAL_NAME_LEN, 0);
            }

            Self::WriteLeHostSupport { le_supported_host } => {
                params.push(le_supported_host as u8);
                params.push(0x00); // unused, formerly simultaneous LE host
            }

            Self::LeSetEventMask { le_event_mask } => {
                put_u64(&mut params, le_event_mask);
            }

            Self::LeSetRandomAddress { random_address } => {
                params.extend_from_slice(&random_address);
            }

            Self::LeCreateConnection {
                scan_interval,
                scan_window,
                initiator_filter_policy,
                peer_addr_type,
                peer_addr,
                own_address_type,
                conn_interval_min,
                conn_interval_max,
                conn_latency,
                supervision_timeout,
                min_ce_length,
                max_ce_length,
            } => {
                put_u16(&mut params, scan_interval);
                put_u16(&mut params, scan_window);
                params.push(initiator_filter_policy);
                params.push(peer_addr_type);
                params.extend_from_slice(&peer_addr);
                params.push(own_address_type);
                for value in [
                    conn_interval_min,
                    conn_interval_max,
                    conn_latency,
                    supervision_timeout,
                    min_ce_length,
                    max_ce_length,
                ] {
                    put_u16(&mut params, value);
                }
            }
        }
        params
    }

    /// Convert the command to a raw H4 packet
    pub fn to_packet(&self) -> Vec<u8> {
        let params = self.parameters();
        debug_assert!(params.len() <= HCI_MAX_PARAM_LEN);

        let mut packet = Vec::with_capacity(4 + params.len());
        packet.push(HCI_COMMAND_PKT);
        packet.extend_from_slice(&self.opcode().to_le_bytes());
        packet.push(params.len() as u8);
        packet.extend_from_slice(&params);
        packet
    }
}

/// HCI Event packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HciEvent {
    pub event_code: u8,
    pub parameters: Vec<u8>,
}

impl HciEvent {
    /// Parse an HCI event from raw bytes (without the H4 indicator)
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 2 {
            return None;
        }

        let event_code = data[0];
        let parameter_total_length = data[1];

        if data.len() < (parameter_total_length as usize + 2) {
            return None;
        }

        let parameters = data[2..(parameter_total_length as usize + 2)].to_vec();

        Some(HciEvent {
            event_code,
            parameters,
        })
    }

    /// LE meta subevent code, if this is an LE meta event
    pub fn le_subevent_code(&self) -> Option<u8> {
        if self.event_code == EVT_LE_META_EVENT {
            self.parameters.first().copied()
        } else {
            None
        }
    }
}
