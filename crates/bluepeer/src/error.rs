//! Error types for the bluepeer library
//!
//! `HciError` covers the transport and packet layer, `Error` everything a
//! device operation can fail with.

use thiserror::Error;

/// Errors that can occur when moving HCI packets over a transport
#[derive(Error, Debug)]
pub enum HciError {
    #[error("Failed to open HCI transport: {0}")]
    SocketError(#[from] std::io::Error),

    #[error("Failed to bind to HCI device: {0}")]
    BindError(std::io::Error),

    #[error("Failed to send HCI packet: {0}")]
    SendError(std::io::Error),

    #[error("Failed to receive HCI packet: {0}")]
    ReceiveError(std::io::Error),

    #[error("Timed out waiting for HCI packet")]
    Timeout,

    #[error("Invalid HCI packet format")]
    InvalidPacketFormat,
}

/// Errors returned by device and connection operations
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Hci(#[from] HciError),

    #[error("Invalid Bluetooth address: {0}")]
    InvalidAddress(String),

    #[error("Invalid transport spec: {0}")]
    InvalidTransport(String),

    #[error("Command 0x{opcode:04X} failed with status 0x{status:02X}")]
    CommandFailed { opcode: u16, status: u8 },

    #[error("Connection failed with status 0x{status:02X}")]
    ConnectionFailed { status: u8 },

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    #[error("Invalid device configuration: {0}")]
    Config(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// True when the error is a deadline expiry rather than a failure
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::Hci(HciError::Timeout))
    }
}
