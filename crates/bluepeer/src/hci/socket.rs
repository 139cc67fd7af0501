//! HCI Socket implementation for Bluetooth communication
//!
//! This module provides a wrapper around the Linux HCI socket interface.
//! The socket is bound to the user channel, which gives this process
//! exclusive access to the controller; the kernel must not be using the
//! device (`hciconfig hciN down`) for the bind to succeed.

use crate::error::HciError;
use crate::transport::{wait_readable, Transport};
use log::trace;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

// Bluetooth socket constants
const AF_BLUETOOTH: i32 = 31;
const BTPROTO_HCI: i32 = 1;
const HCI_CHANNEL_USER: u16 = 1;

// Large enough for any ACL or event packet a controller sends on this channel
const RECEIVE_BUFFER_SIZE: usize = 4096;

/// Represents an HCI socket
#[derive(Debug)]
pub struct HciSocket {
    fd: RawFd,
}

// Define the sockaddr_hci structure
#[repr(C)]
struct SockaddrHci {
    hci_family: libc::sa_family_t,
    hci_dev: u16,
    hci_channel: u16,
}

impl HciSocket {
    /// Opens a new HCI socket
    ///
    /// # Arguments
    ///
    /// * `dev_id` - The device ID to open (0 for hci0)
    pub fn open(dev_id: u16) -> Result<Self, HciError> {
        let fd = unsafe {
            libc::socket(
                AF_BLUETOOTH,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                BTPROTO_HCI,
            )
        };

        if fd < 0 {
            return Err(HciError::SocketError(std::io::Error::last_os_error()));
        }

        let addr = SockaddrHci {
            hci_family: AF_BLUETOOTH as libc::sa_family_t,
            hci_dev: dev_id,
            hci_channel: HCI_CHANNEL_USER,
        };

        let result = unsafe {
            libc::bind(
                fd,
                &addr as *const _ as *const libc::sockaddr,
                std::mem::size_of::<SockaddrHci>() as libc::socklen_t,
            )
        };

        if result < 0 {
            let err = std::io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(HciError::BindError(err));
        }

        Ok(HciSocket { fd })
    }
}

impl Transport for HciSocket {
    fn send_packet(&mut self, packet: &[u8]) -> Result<(), HciError> {
        trace!("hci-socket >>> {}", hex::encode(packet));
        match unsafe {
            libc::write(
                self.fd,
                packet.as_ptr() as *const libc::c_void,
                packet.len(),
            )
        } {
            -1 => Err(HciError::SendError(std::io::Error::last_os_error())),
            _ => Ok(()),
        }
    }

    fn receive_packet(&mut self, timeout: Option<Duration>) -> Result<Vec<u8>, HciError> {
        wait_readable(self.fd, timeout)?;

        // Each read returns exactly one H4 packet on this socket type.
        let mut buffer = [0u8; RECEIVE_BUFFER_SIZE];
        let bytes_read = unsafe {
            libc::read(
                self.fd,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len(),
            )
        };

        if bytes_read < 0 {
            return Err(HciError::ReceiveError(std::io::Error::last_os_error()));
        }
        if bytes_read == 0 {
            return Err(HciError::InvalidPacketFormat);
        }

        let packet = buffer[..bytes_read as usize].to_vec();
        trace!("hci-socket <<< {}", hex::encode(&packet));
        Ok(packet)
    }
}

impl AsRawFd for HciSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for HciSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
