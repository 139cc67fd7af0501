use crate::device::types::{AddressType, BdAddr, OwnAddressType, PhysicalTransport, Role};
use std::fmt;

/// An established ACL connection to a peer
///
/// Handed out by [`Device::connect`](crate::Device::connect) and consumed by
/// [`Device::disconnect`](crate::Device::disconnect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub handle: u16,
    pub peer_address: BdAddr,
    /// Only reported for LE links
    pub peer_address_type: Option<AddressType>,
    pub transport: PhysicalTransport,
    pub role: Role,
    /// Only meaningful for LE links
    pub own_address_type: Option<OwnAddressType>,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Connection(handle=0x{:04X}, peer={}, transport={}, role={:?})",
            self.handle, self.peer_address, self.transport, self.role
        )
    }
}
