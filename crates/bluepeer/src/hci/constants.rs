//! HCI protocol constants
//!
//! This module contains constants used in the Bluetooth HCI protocol.

use std::time::Duration;

// HCI packet types (H4 indicator byte)
pub const HCI_COMMAND_PKT: u8 = 0x01;
pub const HCI_ACL_PKT: u8 = 0x02;
pub const HCI_SCO_PKT: u8 = 0x03;
pub const HCI_EVENT_PKT: u8 = 0x04;
pub const HCI_ISO_PKT: u8 = 0x05;

// Maximum size of HCI command parameters
pub const HCI_MAX_PARAM_LEN: usize = 255;

// Opcode Group Field values
pub const OGF_LINK_CTL: u8 = 0x01;
pub const OGF_HOST_CTL: u8 = 0x03;
pub const OGF_INFO_PARAM: u8 = 0x04;
pub const OGF_LE: u8 = 0x08;

// Link Control Commands (OGF: 0x01)
pub const OCF_CREATE_CONNECTION: u16 = 0x0005;
pub const OCF_DISCONNECT: u16 = 0x0006;
pub const OCF_CREATE_CONNECTION_CANCEL: u16 = 0x0008;
pub const OCF_READ_REMOTE_SUPPORTED_FEATURES: u16 = 0x001B;
pub const OCF_READ_REMOTE_EXTENDED_FEATURES: u16 = 0x001C;

// Host Controller Commands (OGF: 0x03)
pub const OCF_SET_EVENT_MASK: u16 = 0x0001;
pub const OCF_RESET: u16 = 0x0003;
pub const OCF_WRITE_LOCAL_NAME: u16 = 0x0013;
pub const OCF_WRITE_LE_HOST_SUPPORT: u16 = 0x006D;

// Informational Parameters (OGF: 0x04)
pub const OCF_READ_LOCAL_VERSION_INFORMATION: u16 = 0x0001;
pub const OCF_READ_BD_ADDR: u16 = 0x0009;

// LE Command OCF values (OGF: 0x08)
pub const OCF_LE_SET_EVENT_MASK: u16 = 0x0001;
pub const OCF_LE_SET_RANDOM_ADDRESS: u16 = 0x0005;
pub const OCF_LE_CREATE_CONNECTION: u16 = 0x000D;
pub const OCF_LE_CREATE_CONNECTION_CANCEL: u16 = 0x000E;
pub const OCF_LE_READ_REMOTE_FEATURES: u16 = 0x0016;

// HCI Events
pub const EVT_CONN_COMPLETE: u8 = 0x03;
pub const EVT_DISCONN_COMPLETE: u8 = 0x05;
pub const EVT_READ_REMOTE_FEATURES_COMPLETE: u8 = 0x0B;
pub const EVT_CMD_COMPLETE: u8 = 0x0E;
pub const EVT_CMD_STATUS: u8 = 0x0F;
pub const EVT_READ_REMOTE_EXT_FEATURES_COMPLETE: u8 = 0x23;
pub const EVT_LE_META_EVENT: u8 = 0x3E;

// LE Meta Events
pub const EVT_LE_CONN_COMPLETE: u8 = 0x01;
pub const EVT_LE_READ_REMOTE_FEATURES_COMPLETE: u8 = 0x04;
pub const EVT_LE_ENHANCED_CONN_COMPLETE: u8 = 0x0A;

pub const LOCAL_NAME_LEN: usize = 248;

// Status codes
pub const HCI_SUCCESS: u8 = 0x00;
pub const HCI_REMOTE_USER_TERMINATED_CONNECTION: u8 = 0x13;

// Event masks enabled on power-on
pub const DEFAULT_EVENT_MASK: u64 = 0x3FFF_FFFF_FFFF_FFFF;
pub const DEFAULT_LE_EVENT_MASK: u64 = 0x0000_0000_000F_FFFF;

// BR/EDR connection parameters
pub const ACL_PACKET_TYPES: u16 = 0xCC18; // DM1 DH1 DM3 DH3 DM5 DH5
pub const PAGE_SCAN_REPETITION_MODE_R2: u8 = 0x02;
pub const ALLOW_ROLE_SWITCH: u8 = 0x01;

// LE initiator scan parameters, 0.625 ms units
pub const LE_SCAN_INTERVAL: u16 = 0x0060; // 60 ms
pub const LE_SCAN_WINDOW: u16 = 0x0060; // 60 ms

// LE connection parameters
pub const LE_CONN_INTERVAL_MIN: u16 = 0x0018; // 30 ms
pub const LE_CONN_INTERVAL_MAX: u16 = 0x0028; // 50 ms
pub const LE_CONN_LATENCY: u16 = 0x0000;
pub const LE_SUPERVISION_TIMEOUT: u16 = 0x0048; // 720 ms
pub const LE_MIN_CE_LENGTH: u16 = 0x0000;
pub const LE_MAX_CE_LENGTH: u16 = 0x0000;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a command opcode from its group and command fields
pub const fn opcode(ogf: u8, ocf: u16) -> u16 {
    ((ogf as u16) << 10) | (ocf & 0x03ff)
}
