//! H4 framing over byte streams

use super::{wait_readable, Transport};
use crate::error::HciError;
use crate::hci::constants::*;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use log::trace;
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

/// Read one H4 packet from a byte stream, indicator byte included
pub fn read_h4_packet<R: Read>(reader: &mut R) -> Result<Vec<u8>, HciError> {
    let packet_type = reader.read_u8().map_err(HciError::ReceiveError)?;

    let header_len = match packet_type {
        HCI_COMMAND_PKT | HCI_SCO_PKT => 3,
        HCI_ACL_PKT | HCI_ISO_PKT => 4,
        HCI_EVENT_PKT => 2,
        _ => return Err(HciError::InvalidPacketFormat),
    };

    let mut packet = vec![packet_type; 1 + header_len];
    reader
        .read_exact(&mut packet[1..])
        .map_err(HciError::ReceiveError)?;
    let header = &packet[1..];

    let payload_len = match packet_type {
        HCI_COMMAND_PKT | HCI_SCO_PKT => header[2] as usize,
        HCI_ACL_PKT => LittleEndian::read_u16(&header[2..4]) as usize,
        HCI_ISO_PKT => (LittleEndian::read_u16(&header[2..4]) & 0x3fff) as usize,
        _ => header[1] as usize,
    };

    let start = packet.len();
    packet.resize(start + payload_len, 0);
    reader
        .read_exact(&mut packet[start..])
        .map_err(HciError::ReceiveError)?;

    Ok(packet)
}

/// Transport over any readable/writable stream carrying H4 framed packets
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
}

impl<S> StreamTransport<S>
where
    S: Read + Write + AsRawFd + Send,
{
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: Read + Write + AsRawFd + Send,
{
    fn send_packet(&mut self, packet: &[u8]) -> Result<(), HciError> {
        trace!(">>> {}", hex::encode(packet));
        self.stream
            .write_all(packet)
            .and_then(|_| self.stream.flush())
            .map_err(HciError::SendError)
    }

    fn receive_packet(&mut self, timeout: Option<Duration>) -> Result<Vec<u8>, HciError> {
        // Only the start of a packet is bounded; the rest is read to completion.
        wait_readable(self.stream.as_raw_fd(), timeout)?;
        let packet = read_h4_packet(&mut self.stream)?;
        trace!("<<< {}", hex::encode(&packet));
        Ok(packet)
    }
}
