//! Remote feature masks

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// LMP features, page 0
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LmpFeatures: u64 {
        const THREE_SLOT_PACKETS = 1 << 0;
        const FIVE_SLOT_PACKETS = 1 << 1;
        const ENCRYPTION = 1 << 2;
        const SLOT_OFFSET = 1 << 3;
        const TIMING_ACCURACY = 1 << 4;
        const ROLE_SWITCH = 1 << 5;
        const HOLD_MODE = 1 << 6;
        const SNIFF_MODE = 1 << 7;
        const POWER_CONTROL_REQUESTS = 1 << 9;
        const CHANNEL_QUALITY_DRIVEN_DATA_RATE = 1 << 10;
        const SCO_LINK = 1 << 11;
        const HV2_PACKETS = 1 << 12;
        const HV3_PACKETS = 1 << 13;
        const MU_LAW_LOG_SYNCHRONOUS_DATA = 1 << 14;
        const A_LAW_LOG_SYNCHRONOUS_DATA = 1 << 15;
        const CVSD_SYNCHRONOUS_DATA = 1 << 16;
        const PAGING_PARAMETER_NEGOTIATION = 1 << 17;
        const POWER_CONTROL = 1 << 18;
        const TRANSPARENT_SYNCHRONOUS_DATA = 1 << 19;
        const BROADCAST_ENCRYPTION = 1 << 23;
        const EDR_ACL_2_MBPS_MODE = 1 << 25;
        const EDR_ACL_3_MBPS_MODE = 1 << 26;
        const ENHANCED_INQUIRY_SCAN = 1 << 27;
        const INTERLACED_INQUIRY_SCAN = 1 << 28;
        const INTERLACED_PAGE_SCAN = 1 << 29;
        const RSSI_WITH_INQUIRY_RESULTS = 1 << 30;
        const EXTENDED_SCO_LINK = 1 << 31;
        const EV4_PACKETS = 1 << 32;
        const EV5_PACKETS = 1 << 33;
        const AFH_CAPABLE_PERIPHERAL = 1 << 35;
        const AFH_CLASSIFICATION_PERIPHERAL = 1 << 36;
        const BR_EDR_NOT_SUPPORTED = 1 << 37;
        const LE_SUPPORTED_CONTROLLER = 1 << 38;
        const THREE_SLOT_EDR_ACL_PACKETS = 1 << 39;
        const FIVE_SLOT_EDR_ACL_PACKETS = 1 << 40;
        const SNIFF_SUBRATING = 1 << 41;
        const PAUSE_ENCRYPTION = 1 << 42;
        const AFH_CAPABLE_CENTRAL = 1 << 43;
        const AFH_CLASSIFICATION_CENTRAL = 1 << 44;
        const EDR_ESCO_2_MBPS_MODE = 1 << 45;
        const EDR_ESCO_3_MBPS_MODE = 1 << 46;
        const THREE_SLOT_EDR_ESCO_PACKETS = 1 << 47;
        const EXTENDED_INQUIRY_RESPONSE = 1 << 48;
        const SIMULTANEOUS_LE_AND_BR_EDR_CONTROLLER = 1 << 49;
        const SECURE_SIMPLE_PAIRING_CONTROLLER = 1 << 51;
        const ENCAPSULATED_PDU = 1 << 52;
        const ERRONEOUS_DATA_REPORTING = 1 << 53;
        const NON_FLUSHABLE_PACKET_BOUNDARY_FLAG = 1 << 54;
        const LINK_SUPERVISION_TIMEOUT_CHANGED_EVENT = 1 << 56;
        const VARIABLE_INQUIRY_TX_POWER_LEVEL = 1 << 57;
        const ENHANCED_POWER_CONTROL = 1 << 58;
        const EXTENDED_FEATURES = 1 << 63;
    }
}

bitflags! {
    /// LMP features, page 1 (host supported features)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LmpHostFeatures: u64 {
        const SECURE_SIMPLE_PAIRING_HOST = 1 << 0;
        const LE_SUPPORTED_HOST = 1 << 1;
        const SIMULTANEOUS_LE_AND_BR_EDR_HOST = 1 << 2;
        const SECURE_CONNECTIONS_HOST = 1 << 3;
    }
}

bitflags! {
    /// LE link layer features
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LeFeatures: u64 {
        const LE_ENCRYPTION = 1 << 0;
        const CONNECTION_PARAMETERS_REQUEST = 1 << 1;
        const EXTENDED_REJECT_INDICATION = 1 << 2;
        const PERIPHERAL_INITIATED_FEATURES_EXCHANGE = 1 << 3;
        const LE_PING = 1 << 4;
        const LE_DATA_PACKET_LENGTH_EXTENSION = 1 << 5;
        const LL_PRIVACY = 1 << 6;
        const EXTENDED_SCANNER_FILTER_POLICIES = 1 << 7;
        const LE_2M_PHY = 1 << 8;
        const STABLE_MODULATION_INDEX_TX = 1 << 9;
        const STABLE_MODULATION_INDEX_RX = 1 << 10;
        const LE_CODED_PHY = 1 << 11;
        const LE_EXTENDED_ADVERTISING = 1 << 12;
        const LE_PERIODIC_ADVERTISING = 1 << 13;
        const CHANNEL_SELECTION_ALGORITHM_2 = 1 << 14;
        const LE_POWER_CLASS_1 = 1 << 15;
        const MINIMUM_NUMBER_OF_USED_CHANNELS = 1 << 16;
        const CONNECTION_CTE_REQUEST = 1 << 17;
        const CONNECTION_CTE_RESPONSE = 1 << 18;
        const CONNECTIONLESS_CTE_TRANSMITTER = 1 << 19;
        const CONNECTIONLESS_CTE_RECEIVER = 1 << 20;
        const ANTENNA_SWITCHING_DURING_CTE_TX = 1 << 21;
        const ANTENNA_SWITCHING_DURING_CTE_RX = 1 << 22;
        const RECEIVING_CONSTANT_TONE_EXTENSIONS = 1 << 23;
        const PERIODIC_ADVERTISING_SYNC_TRANSFER_SENDER = 1 << 24;
        const PERIODIC_ADVERTISING_SYNC_TRANSFER_RECIPIENT = 1 << 25;
        const SLEEP_CLOCK_ACCURACY_UPDATES = 1 << 26;
        const REMOTE_PUBLIC_KEY_VALIDATION = 1 << 27;
        const CONNECTED_ISOCHRONOUS_STREAM_CENTRAL = 1 << 28;
        const CONNECTED_ISOCHRONOUS_STREAM_PERIPHERAL = 1 << 29;
        const ISOCHRONOUS_BROADCASTER = 1 << 30;
        const SYNCHRONIZED_RECEIVER = 1 << 31;
        const CONNECTED_ISOCHRONOUS_STREAM_HOST_SUPPORT = 1 << 32;
        const LE_POWER_CONTROL_REQUEST = 1 << 33;
        const PATH_LOSS_MONITORING = 1 << 35;
        const CONNECTION_SUBRATING = 1 << 37;
        const CHANNEL_CLASSIFICATION = 1 << 39;
    }
}

impl LmpFeatures {
    /// Names of the set flags in bit order; unnamed bits are left out
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl LmpHostFeatures {
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl LeFeatures {
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

/// One extended LMP feature page as reported by the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedFeaturesPage {
    pub page_number: u8,
    pub max_page_number: u8,
    pub features: u64,
}

/// Features read from a connected peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFeatures {
    BrEdr {
        lmp_features: LmpFeatures,
        extended_pages: Vec<ExtendedFeaturesPage>,
    },
    Le(LeFeatures),
}

impl fmt::Display for RemoteFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFeatures::BrEdr {
                lmp_features,
                extended_pages,
            } => {
                writeln!(f, "LMP features (page 0): 0x{:016X}", lmp_features.bits())?;
                for name in lmp_features.names() {
                    writeln!(f, "  {}", name)?;
                }
                for page in extended_pages {
                    writeln!(
                        f,
                        "LMP features (page {}/{}): 0x{:016X}",
                        page.page_number, page.max_page_number, page.features
                    )?;
                    if page.page_number == 1 {
                        for name in LmpHostFeatures::from_bits_retain(page.features).names() {
                            writeln!(f, "  {}", name)?;
                        }
                    }
                }
                Ok(())
            }
            RemoteFeatures::Le(le_features) => {
                writeln!(f, "LE features: 0x{:016X}", le_features.bits())?;
                for name in le_features.names() {
                    writeln!(f, "  {}", name)?;
                }
                Ok(())
            }
        }
    }
}
