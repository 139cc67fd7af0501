use crate::device::config::DeviceConfiguration;
use crate::device::connection::Connection;
use crate::device::features::{ExtendedFeaturesPage, LeFeatures, LmpFeatures, RemoteFeatures};
use crate::device::types::*;
use crate::error::{Error, HciError};
use crate::hci::constants::*;
use crate::hci::{
    CommandComplete, CommandStatus, ConnectionComplete, DisconnectionComplete, HciCommand,
    HciEvent, LeConnectionComplete, LeRemoteFeaturesComplete, RemoteExtendedFeaturesComplete,
    RemoteFeaturesComplete,
};
use crate::transport::Transport;
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info, trace, warn};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

// Events nobody asked for are kept this long before the oldest are dropped
const MAX_PENDING_EVENTS: usize = 64;

/// Controller identity read during power-on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVersionInformation {
    pub hci_version: u8,
    pub hci_subversion: u16,
    pub lmp_version: u8,
    pub company_identifier: u16,
    pub lmp_subversion: u16,
}

impl LocalVersionInformation {
    fn parse(return_parameters: &[u8]) -> Option<Self> {
        if return_parameters.len() < 9 {
            return None;
        }
        let p = return_parameters;
        Some(Self {
            hci_version: p[1],
            hci_subversion: LittleEndian::read_u16(&p[2..4]),
            lmp_version: p[4],
            company_identifier: LittleEndian::read_u16(&p[5..7]),
            lmp_subversion: LittleEndian::read_u16(&p[7..9]),
        })
    }
}

/// Local Bluetooth device driving one controller over a transport
pub struct Device {
    transport: Box<dyn Transport>,
    config: DeviceConfiguration,
    pending_events: VecDeque<HciEvent>,
    public_address: Option<BdAddr>,
    random_address: Option<BdAddr>,
    local_version: Option<LocalVersionInformation>,
    powered_on: bool,
}

impl Device {
    /// Creates a device from a configuration and an opened transport
    pub fn from_config_with_transport(
        config: DeviceConfiguration,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            transport,
            random_address: config.address,
            config,
            pending_events: VecDeque::new(),
            public_address: None,
            local_version: None,
            powered_on: false,
        }
    }

    pub fn config(&self) -> &DeviceConfiguration {
        &self.config
    }

    pub fn classic_enabled(&self) -> bool {
        self.config.classic_enabled
    }

    pub fn le_enabled(&self) -> bool {
        self.config.le_enabled
    }

    /// Controller public address, known after power-on
    pub fn public_address(&self) -> Option<BdAddr> {
        self.public_address
    }

    pub fn random_address(&self) -> Option<BdAddr> {
        self.random_address
    }

    pub fn local_version(&self) -> Option<LocalVersionInformation> {
        self.local_version
    }

    pub fn is_powered_on(&self) -> bool {
        self.powered_on
    }

    /// Resets and configures the controller
    pub fn power_on(&mut self) -> Result<(), Error> {
        self.send_command(&HciCommand::Reset)?;

        let response = self.send_command(&HciCommand::ReadLocalVersionInformation)?;
        self.local_version = LocalVersionInformation::parse(&response.return_parameters);
        if let Some(version) = &self.local_version {
            debug!(
                "controller: HCI version {}, LMP version {}, company 0x{:04X}",
                version.hci_version, version.lmp_version, version.company_identifier
            );
        }

        let response = self.send_command(&HciCommand::ReadBdAddr)?;
        let address = response
            .return_parameters
            .get(1..)
            .and_then(BdAddr::from_slice)
            .ok_or_else(|| Error::InvalidPacket("BD_ADDR response too short".into()))?;
        debug!("controller public address: {}", address);
        self.public_address = Some(address);

        self.send_command(&HciCommand::SetEventMask {
            event_mask: DEFAULT_EVENT_MASK,
        })?;

        if self.config.classic_enabled {
            self.send_command(&HciCommand::WriteLocalName {
                local_name: self.config.name.clone(),
            })?;
        }

        if self.config.classic_enabled && self.config.le_enabled {
            self.send_command(&HciCommand::WriteLeHostSupport {
                le_supported_host: true,
            })?;
        }

        if self.config.le_enabled {
            self.send_command(&HciCommand::LeSetEventMask {
                le_event_mask: DEFAULT_LE_EVENT_MASK,
            })?;
            if let Some(random_address) = self.random_address {
                self.set_random_address(random_address)?;
            }
        }

        self.powered_on = true;
        info!("device powered on ({})", address);
        Ok(())
    }

    /// Connects to a peer over the given transport
    ///
    /// `peer_address_type` and `own_address_type` only apply to LE.
    pub fn connect(
        &mut self,
        peer_address: &BdAddr,
        peer_address_type: AddressType,
        transport: PhysicalTransport,
        own_address_type: OwnAddressType,
    ) -> Result<Connection, Error> {
        if !self.powered_on {
            return Err(Error::ProtocolError("device is not powered on".into()));
        }

        match transport {
            PhysicalTransport::BrEdr if !self.config.classic_enabled => {
                Err(Error::Unsupported("classic (BR/EDR) is disabled".into()))
            }
            PhysicalTransport::Le if !self.config.le_enabled => {
                Err(Error::Unsupported("LE is disabled".into()))
            }
            PhysicalTransport::BrEdr => self.connect_classic(peer_address),
            PhysicalTransport::Le => {
                self.connect_le(peer_address, peer_address_type, own_address_type)
            }
        }
    }

    fn connect_classic(&mut self, peer_address: &BdAddr) -> Result<Connection, Error> {
        debug!("creating BR/EDR connection to {}", peer_address);
        self.send_command_expect_status(&HciCommand::CreateConnection {
            bd_addr: peer_address.bytes,
            packet_type: ACL_PACKET_TYPES,
            page_scan_repetition_mode: PAGE_SCAN_REPETITION_MODE_R2,
            clock_offset: 0x0000,
            allow_role_switch: ALLOW_ROLE_SWITCH,
        })?;

        let timeout = self.config.connect_timeout();
        let peer = peer_address.bytes;
        let result = self.wait_for_event(timeout, "connection complete", |event| {
            ConnectionComplete::parse(event).filter(|complete| complete.bd_addr == peer)
        });

        match result {
            Ok(complete) if complete.status == HCI_SUCCESS => Ok(Connection {
                handle: complete.connection_handle,
                peer_address: *peer_address,
                peer_address_type: None,
                transport: PhysicalTransport::BrEdr,
                role: Role::Central,
                own_address_type: None,
            }),
            Ok(complete) => Err(Error::ConnectionFailed {
                status: complete.status,
            }),
            Err(e) if e.is_timeout() => {
                self.cancel_connection(&HciCommand::CreateConnectionCancel { bd_addr: peer });
                Err(Error::Timeout("connection complete"))
            }
            Err(e) => Err(e),
        }
    }

    fn connect_le(
        &mut self,
        peer_address: &BdAddr,
        peer_address_type: AddressType,
        own_address_type: OwnAddressType,
    ) -> Result<Connection, Error> {
        if own_address_type.uses_random_address() && self.random_address.is_none() {
            self.set_random_address(BdAddr::random_static())?;
        }

        debug!(
            "creating LE connection to {} ({:?}), own address type {}",
            peer_address, peer_address_type, own_address_type
        );
        self.send_command_expect_status(&HciCommand::LeCreateConnection {
            scan_interval: LE_SCAN_INTERVAL,
            scan_window: LE_SCAN_WINDOW,
            initiator_filter_policy: 0x00,
            peer_addr_type: u8::from(peer_address_type),
            peer_addr: peer_address.bytes,
            own_address_type: u8::from(own_address_type),
            conn_interval_min: LE_CONN_INTERVAL_MIN,
            conn_interval_max: LE_CONN_INTERVAL_MAX,
            conn_latency: LE_CONN_LATENCY,
            supervision_timeout: LE_SUPERVISION_TIMEOUT,
            min_ce_length: LE_MIN_CE_LENGTH,
            max_ce_length: LE_MAX_CE_LENGTH,
        })?;

        // Only one LE initiation is outstanding, so the first completion is ours.
        let timeout = self.config.connect_timeout();
        let result = self.wait_for_event(timeout, "LE connection complete", |event| {
            LeConnectionComplete::parse(event)
        });

        match result {
            Ok(complete) if complete.status == HCI_SUCCESS => Ok(Connection {
                handle: complete.connection_handle,
                peer_address: BdAddr::new(complete.peer_address),
                peer_address_type: Some(AddressType::from(complete.peer_address_type)),
                transport: PhysicalTransport::Le,
                role: Role::from(complete.role),
                own_address_type: Some(own_address_type),
            }),
            Ok(complete) => Err(Error::ConnectionFailed {
                status: complete.status,
            }),
            Err(e) if e.is_timeout() => {
                self.cancel_connection(&HciCommand::LeCreateConnectionCancel);
                Err(Error::Timeout("LE connection complete"))
            }
            Err(e) => Err(e),
        }
    }

    fn cancel_connection(&mut self, cancel: &HciCommand) {
        warn!("connection attempt timed out, cancelling");
        if let Err(e) = self.send_command(cancel) {
            warn!("failed to cancel connection attempt: {}", e);
        }
    }

    fn set_random_address(&mut self, random_address: BdAddr) -> Result<(), Error> {
        debug!("setting random address {}", random_address);
        self.send_command(&HciCommand::LeSetRandomAddress {
            random_address: random_address.bytes,
        })?;
        self.random_address = Some(random_address);
        Ok(())
    }

    /// Reads the peer's supported features over an established connection
    pub fn read_remote_features(&mut self, connection: &Connection) -> Result<RemoteFeatures, Error> {
        let handle = connection.handle;
        let timeout = self.config.command_timeout();

        match connection.transport {
            PhysicalTransport::BrEdr => {
                let command = HciCommand::ReadRemoteSupportedFeatures { handle };
                let opcode = command.opcode();
                self.send_command_expect_status(&command)?;
                let complete =
                    self.wait_for_event(timeout, "remote features", |event| {
                        RemoteFeaturesComplete::parse(event)
                            .filter(|complete| complete.connection_handle == handle)
                    })?;
                check_status(opcode, complete.status)?;

                let lmp_features = LmpFeatures::from_bits_retain(complete.lmp_features);
                let mut extended_pages = Vec::new();

                if lmp_features.contains(LmpFeatures::EXTENDED_FEATURES) {
                    let mut page_number = 1u8;
                    loop {
                        let page = self.read_remote_extended_features(handle, page_number)?;
                        extended_pages.push(page);
                        if page_number >= page.max_page_number || page_number == u8::MAX {
                            break;
                        }
                        page_number += 1;
                    }
                }

                Ok(RemoteFeatures::BrEdr {
                    lmp_features,
                    extended_pages,
                })
            }
            PhysicalTransport::Le => {
                let command = HciCommand::LeReadRemoteFeatures { handle };
                let opcode = command.opcode();
                self.send_command_expect_status(&command)?;
                let complete =
                    self.wait_for_event(timeout, "LE remote features", |event| {
                        LeRemoteFeaturesComplete::parse(event)
                            .filter(|complete| complete.connection_handle == handle)
                    })?;
                check_status(opcode, complete.status)?;

                Ok(RemoteFeatures::Le(LeFeatures::from_bits_retain(
                    complete.le_features,
                )))
            }
        }
    }

    fn read_remote_extended_features(
        &mut self,
        handle: u16,
        page_number: u8,
    ) -> Result<ExtendedFeaturesPage, Error> {
        let command = HciCommand::ReadRemoteExtendedFeatures {
            handle,
            page_number,
        };
        let opcode = command.opcode();
        self.send_command_expect_status(&command)?;

        let timeout = self.config.command_timeout();
        let complete = self.wait_for_event(timeout, "remote extended features", |event| {
            RemoteExtendedFeaturesComplete::parse(event).filter(|complete| {
                complete.connection_handle == handle && complete.page_number == page_number
            })
        })?;
        check_status(opcode, complete.status)?;

        Ok(ExtendedFeaturesPage {
            page_number: complete.page_number,
            max_page_number: complete.max_page_number,
            features: complete.extended_lmp_features,
        })
    }

    /// Disconnects a connection and waits for the controller to confirm
    pub fn disconnect(&mut self, connection: Connection, reason: u8) -> Result<(), Error> {
        let handle = connection.handle;
        let command = HciCommand::Disconnect { handle, reason };
        let opcode = command.opcode();
        self.send_command_expect_status(&command)?;

        let timeout = self.config.command_timeout();
        let complete = self.wait_for_event(timeout, "disconnection complete", |event| {
            DisconnectionComplete::parse(event)
                .filter(|complete| complete.connection_handle == handle)
        })?;
        check_status(opcode, complete.status)?;

        debug!(
            "disconnected 0x{:04X}, reason 0x{:02X}",
            handle, complete.reason
        );
        Ok(())
    }

    /// Sends a command and waits for its Command Complete
    fn send_command(&mut self, command: &HciCommand) -> Result<CommandComplete, Error> {
        let opcode = command.opcode();
        trace!("sending {:?}", command);
        self.transport.send_packet(&command.to_packet())?;

        let timeout = self.config.command_timeout();
        let response = self.wait_for_event(timeout, "command complete", |event| {
            if let Some(complete) = CommandComplete::parse(event) {
                if complete.opcode == opcode {
                    return Some(Ok(complete));
                }
            }
            match CommandStatus::parse(event) {
                Some(status) if status.opcode == opcode => Some(Err(status.status)),
                _ => None,
            }
        })?;

        match response {
            Ok(complete) => {
                check_status(opcode, complete.status())?;
                Ok(complete)
            }
            Err(status) => Err(Error::CommandFailed { opcode, status }),
        }
    }

    /// Sends a command that is acknowledged with Command Status
    fn send_command_expect_status(&mut self, command: &HciCommand) -> Result<(), Error> {
        let opcode = command.opcode();
        trace!("sending {:?}", command);
        self.transport.send_packet(&command.to_packet())?;

        let timeout = self.config.command_timeout();
        let status = self.wait_for_event(timeout, "command status", |event| {
            CommandStatus::parse(event).filter(|status| status.opcode == opcode)
        })?;
        check_status(opcode, status.status)
    }

    /// Returns the first queued or incoming event `matcher` accepts
    ///
    /// Events it rejects are queued for later waits, in arrival order.
    fn wait_for_event<T, F>(
        &mut self,
        timeout: Duration,
        what: &'static str,
        mut matcher: F,
    ) -> Result<T, Error>
    where
        F: FnMut(&HciEvent) -> Option<T>,
    {
        for i in 0..self.pending_events.len() {
            if let Some(found) = matcher(&self.pending_events[i]) {
                self.pending_events.remove(i);
                return Ok(found);
            }
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout(what));
            }

            let packet = match self.transport.receive_packet(Some(remaining)) {
                Ok(packet) => packet,
                Err(HciError::Timeout) => return Err(Error::Timeout(what)),
                Err(e) => return Err(e.into()),
            };

            if packet.first() != Some(&HCI_EVENT_PKT) {
                debug!(
                    "dropping non-event packet of type {:?}",
                    packet.first()
                );
                continue;
            }

            let Some(event) = HciEvent::parse(&packet[1..]) else {
                warn!("dropping malformed event {}", hex::encode(&packet));
                continue;
            };

            if let Some(found) = matcher(&event) {
                return Ok(found);
            }

            trace!("queueing event 0x{:02X}", event.event_code);
            if self.pending_events.len() == MAX_PENDING_EVENTS {
                self.pending_events.pop_front();
            }
            self.pending_events.push_back(event);
        }
    }
}

fn check_status(opcode: u16, status: u8) -> Result<(), Error> {
    if status == HCI_SUCCESS {
        Ok(())
    } else {
        Err(Error::CommandFailed { opcode, status })
    }
}
