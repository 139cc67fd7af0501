// Peer address types
pub const PUBLIC_DEVICE_ADDRESS: u8 = 0x00;
pub const RANDOM_DEVICE_ADDRESS: u8 = 0x01;
pub const PUBLIC_IDENTITY_ADDRESS: u8 = 0x02;
pub const RANDOM_IDENTITY_ADDRESS: u8 = 0x03;

// Own address types
pub const OWN_ADDRESS_PUBLIC: u8 = 0x00;
pub const OWN_ADDRESS_RANDOM: u8 = 0x01;
pub const OWN_ADDRESS_RESOLVABLE_OR_PUBLIC: u8 = 0x02;
pub const OWN_ADDRESS_RESOLVABLE_OR_RANDOM: u8 = 0x03;

// Connection roles
pub const ROLE_CENTRAL: u8 = 0x00;
