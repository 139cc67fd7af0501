//! HCI transports
//!
//! A transport moves whole H4 packets (packet type indicator followed by
//! the HCI packet) between the host and a controller. The controller is
//! named by a spec string:
//!
//! * `hci-socket[:N]` - Linux Bluetooth socket on `hciN` (default 0)
//! * `tcp-client:HOST:PORT` - H4 stream over TCP
//! * `file:PATH` - H4 stream over a character device or PTY; a serial tty
//!   must already be configured raw (`stty raw`), it is opened as is

mod h4;

pub use h4::{read_h4_packet, StreamTransport};

use crate::error::{Error, HciError};
use crate::hci::HciSocket;
use log::debug;
use std::fmt;
use std::fs::OpenOptions;
use std::net::TcpStream;
use std::os::unix::io::RawFd;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// A bidirectional H4 packet channel to a controller
pub trait Transport: Send {
    /// Write one complete H4 packet
    fn send_packet(&mut self, packet: &[u8]) -> Result<(), HciError>;

    /// Read one complete H4 packet
    ///
    /// With a timeout, fails with [`HciError::Timeout`] if no packet
    /// starts arriving before the deadline.
    fn receive_packet(&mut self, timeout: Option<Duration>) -> Result<Vec<u8>, HciError>;
}

/// Parsed form of a controller spec string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSpec {
    HciSocket(u16),
    TcpClient { host: String, port: u16 },
    File(PathBuf),
}

impl FromStr for TransportSpec {
    type Err = Error;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidTransport(spec.to_string());
        let (scheme, rest) = match spec.split_once(':') {
            Some((scheme, rest)) => (scheme, Some(rest)),
            None => (spec, None),
        };

        match (scheme, rest) {
            ("hci-socket", None) => Ok(TransportSpec::HciSocket(0)),
            ("hci-socket", Some(index)) => index
                .parse()
                .map(TransportSpec::HciSocket)
                .map_err(|_| invalid()),
            ("tcp-client", Some(address)) => {
                let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
                if host.is_empty() {
                    return Err(invalid());
                }
                let port = port.parse().map_err(|_| invalid())?;
                Ok(TransportSpec::TcpClient {
                    host: host.to_string(),
                    port,
                })
            }
            ("file", Some(path)) if !path.is_empty() => Ok(TransportSpec::File(path.into())),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for TransportSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportSpec::HciSocket(index) => write!(f, "hci-socket:{}", index),
            TransportSpec::TcpClient { host, port } => write!(f, "tcp-client:{}:{}", host, port),
            TransportSpec::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

impl TransportSpec {
    /// Open the transport this spec names
    pub fn open(&self) -> Result<Box<dyn Transport>, Error> {
        debug!("opening transport {}", self);
        match self {
            TransportSpec::HciSocket(index) => Ok(Box::new(HciSocket::open(*index)?)),
            TransportSpec::TcpClient { host, port } => {
                let stream =
                    TcpStream::connect((host.as_str(), *port)).map_err(HciError::SocketError)?;
                stream.set_nodelay(true).map_err(HciError::SocketError)?;
                Ok(Box::new(StreamTransport::new(stream)))
            }
            TransportSpec::File(path) => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(path)
                    .map_err(HciError::SocketError)?;
                Ok(Box::new(StreamTransport::new(file)))
            }
        }
    }
}

/// Parse a controller spec string and open it
pub fn open_transport(spec: &str) -> Result<Box<dyn Transport>, Error> {
    spec.parse::<TransportSpec>()?.open()
}

/// Block until `fd` is readable or `timeout` expires
///
/// `None` means wait forever and returns immediately; the caller's read blocks instead.
pub(crate) fn wait_readable(fd: RawFd, timeout: Option<Duration>) -> Result<(), HciError> {
    let Some(timeout) = timeout else {
        return Ok(());
    };

    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

    let result = unsafe { libc::poll(&mut pfd, 1, millis) };

    if result < 0 {
        return Err(HciError::ReceiveError(std::io::Error::last_os_error()));
    }
    if result == 0 {
        return Err(HciError::Timeout);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hci::constants::HCI_EVENT_PKT;

    #[test]
    fn test_parse_hci_socket_spec() {
        assert_eq!(
            "hci-socket".parse::<TransportSpec>().unwrap(),
            TransportSpec::HciSocket(0)
        );
        assert_eq!(
            "hci-socket:2".parse::<TransportSpec>().unwrap(),
            TransportSpec::HciSocket(2)
        );
        assert!("hci-socket:two".parse::<TransportSpec>().is_err());
    }

    #[test]
    fn test_parse_tcp_client_spec() {
        let spec = "tcp-client:127.0.0.1:9001".parse::<TransportSpec>().unwrap();
        assert_eq!(
            spec,
            TransportSpec::TcpClient {
                host: "127.0.0.1".into(),
                port: 9001
            }
        );
        assert_eq!(spec.to_string(), "tcp-client:127.0.0.1:9001");

        assert!("tcp-client:localhost".parse::<TransportSpec>().is_err());
        assert!("tcp-client::9001".parse::<TransportSpec>().is_err());
        assert!("tcp-client:localhost:http".parse::<TransportSpec>().is_err());
    }

    #[test]
    fn test_parse_file_spec() {
        assert_eq!(
            "file:/dev/ttyUSB0".parse::<TransportSpec>().unwrap(),
            TransportSpec::File("/dev/ttyUSB0".into())
        );
        assert!("file:".parse::<TransportSpec>().is_err());
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        match "usb:0".parse::<TransportSpec>() {
            Err(Error::InvalidTransport(spec)) => assert_eq!(spec, "usb:0"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_open_missing_file_fails() {
        let result = open_transport("file:/nonexistent/bluepeer-controller");
        assert!(matches!(result, Err(Error::Hci(HciError::SocketError(_)))));
    }

    #[test]
    fn test_file_transport_reads_bytes_unchanged() {
        use std::io::Write;

        // Bytes a canonical tty would rewrite (CR, NL, ^C).
        let packet = [HCI_EVENT_PKT, 0xFF, 0x03, 0x0D, 0x0A, 0x03];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&packet).unwrap();

        let mut transport = open_transport(&format!("file:{}", file.path().display())).unwrap();
        let received = transport
            .receive_packet(Some(Duration::from_millis(100)))
            .unwrap();
        assert_eq!(received, packet.to_vec());
    }
}
