use crate::device::constants::*;
use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Physical transport a connection runs over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalTransport {
    BrEdr,
    Le,
}

impl fmt::Display for PhysicalTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalTransport::BrEdr => f.write_str("BR/EDR"),
            PhysicalTransport::Le => f.write_str("LE"),
        }
    }
}

/// Local role on a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Central,
    Peripheral,
}

impl From<u8> for Role {
    fn from(value: u8) -> Self {
        match value {
            ROLE_CENTRAL => Role::Central,
            _ => Role::Peripheral,
        }
    }
}

/// Peer address type as carried in LE commands and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    Public,
    Random,
    PublicIdentity,
    RandomIdentity,
}

impl From<u8> for AddressType {
    fn from(value: u8) -> Self {
        match value {
            PUBLIC_DEVICE_ADDRESS => AddressType::Public,
            RANDOM_DEVICE_ADDRESS => AddressType::Random,
            PUBLIC_IDENTITY_ADDRESS => AddressType::PublicIdentity,
            RANDOM_IDENTITY_ADDRESS => AddressType::RandomIdentity,
            _ => AddressType::Public,
        }
    }
}

impl From<AddressType> for u8 {
    fn from(value: AddressType) -> Self {
        match value {
            AddressType::Public => PUBLIC_DEVICE_ADDRESS,
            AddressType::Random => RANDOM_DEVICE_ADDRESS,
            AddressType::PublicIdentity => PUBLIC_IDENTITY_ADDRESS,
            AddressType::RandomIdentity => RANDOM_IDENTITY_ADDRESS,
        }
    }
}

/// Address type the local controller uses when initiating over LE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OwnAddressType {
    #[default]
    Public,
    Random,
    ResolvableOrPublic,
    ResolvableOrRandom,
}

impl OwnAddressType {
    /// Whether the controller may fall back to the configured random address
    pub fn uses_random_address(self) -> bool {
        matches!(
            self,
            OwnAddressType::Random | OwnAddressType::ResolvableOrRandom
        )
    }
}

impl From<OwnAddressType> for u8 {
    fn from(value: OwnAddressType) -> Self {
        match value {
            OwnAddressType::Public => OWN_ADDRESS_PUBLIC,
            OwnAddressType::Random => OWN_ADDRESS_RANDOM,
            OwnAddressType::ResolvableOrPublic => OWN_ADDRESS_RESOLVABLE_OR_PUBLIC,
            OwnAddressType::ResolvableOrRandom => OWN_ADDRESS_RESOLVABLE_OR_RANDOM,
        }
    }
}

impl fmt::Display for OwnAddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OwnAddressType::Public => "PUBLIC",
            OwnAddressType::Random => "RANDOM",
            OwnAddressType::ResolvableOrPublic => "RESOLVABLE_OR_PUBLIC",
            OwnAddressType::ResolvableOrRandom => "RESOLVABLE_OR_RANDOM",
        };
        f.write_str(name)
    }
}

/// A Bluetooth device address, stored in wire (little-endian) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr {
    pub bytes: [u8; 6],
}

impl BdAddr {
    pub fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() >= 6 {
            let mut bytes = [0u8; 6];
            bytes.copy_from_slice(&slice[0..6]);
            Some(Self { bytes })
        } else {
            None
        }
    }

    /// Parse an address that may carry a `/P` suffix marking it public
    ///
    /// Returns the address and `Some(AddressType::Public)` when the suffix is present.
    pub fn parse_with_type(s: &str) -> Result<(Self, Option<AddressType>), Error> {
        match s.strip_suffix("/P") {
            Some(address) => Ok((address.parse()?, Some(AddressType::Public))),
            None => Ok((s.parse()?, None)),
        }
    }

    /// A random static address: two most significant bits set, rest random
    pub fn random_static() -> Self {
        let mut bytes: [u8; 6] = rand::random();
        bytes[5] |= 0xC0;
        Self { bytes }
    }

    pub fn is_static_random(&self) -> bool {
        self.bytes[5] & 0xC0 == 0xC0
    }
}

impl FromStr for BdAddr {
    type Err = Error;

    /// Parses `XX:XX:XX:XX:XX:XX`, most significant octet first
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidAddress(s.to_string());

        let octets: Vec<&str> = s.split(':').collect();
        if octets.len() != 6 {
            return Err(invalid());
        }

        let mut bytes = [0u8; 6];
        for (i, octet) in octets.iter().enumerate() {
            if octet.len() != 2 {
                return Err(invalid());
            }
            let mut value = [0u8; 1];
            hex::decode_to_slice(octet, &mut value).map_err(|_| invalid())?;
            bytes[5 - i] = value[0];
        }

        Ok(Self { bytes })
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_round_trip_display() {
        let addr: BdAddr = "00:1A:7d:DA:71:13".parse().unwrap();
        assert_eq!(addr.bytes, [0x13, 0x71, 0xDA, 0x7D, 0x1A, 0x00]);
        assert_eq!(addr.to_string(), "00:1A:7D:DA:71:13");
    }

    #[test]
    fn test_invalid_addresses() {
        for input in [
            "",
            "00:11:22:33:44",
            "00:11:22:33:44:55:66",
            "00:11:22:33:44:GG",
            "0:11:22:33:44:555",
            "00-11-22-33-44-55",
        ] {
            assert!(
                matches!(input.parse::<BdAddr>(), Err(Error::InvalidAddress(_))),
                "{} should not parse",
                input
            );
        }
    }

    #[test]
    fn test_public_suffix() {
        let (addr, kind) = BdAddr::parse_with_type("F0:F1:F2:F3:F4:F5/P").unwrap();
        assert_eq!(addr.to_string(), "F0:F1:F2:F3:F4:F5");
        assert_eq!(kind, Some(AddressType::Public));

        let (_, kind) = BdAddr::parse_with_type("F0:F1:F2:F3:F4:F5").unwrap();
        assert_eq!(kind, None);
    }

    #[test]
    fn test_random_static_address() {
        let addr = BdAddr::random_static();
        assert!(addr.is_static_random());
    }

    #[test]
    fn test_own_address_type_values() {
        assert_eq!(u8::from(OwnAddressType::Public), 0x00);
        assert_eq!(u8::from(OwnAddressType::Random), 0x01);
        assert_eq!(u8::from(OwnAddressType::ResolvableOrPublic), 0x02);
        assert_eq!(u8::from(OwnAddressType::ResolvableOrRandom), 0x03);
        assert!(OwnAddressType::ResolvableOrRandom.uses_random_address());
        assert!(!OwnAddressType::ResolvableOrPublic.uses_random_address());
    }
}
