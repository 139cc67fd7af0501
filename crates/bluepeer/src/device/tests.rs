//! Device tests against a scripted controller on a local TCP socket

use super::*;
use crate::error::Error;
use crate::hci::constants::*;
use crate::transport::{open_transport, StreamTransport, Transport};
use pretty_assertions::assert_eq;
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

const CONTROLLER_ADDRESS: [u8; 6] = [0x66, 0x55, 0x44, 0x33, 0x22, 0x11];
const CLASSIC_HANDLE: u16 = 0x000B;
const LE_HANDLE: u16 = 0x0040;

#[derive(Clone, Copy, Default)]
struct Script {
    /// Never answer a connection request
    silent_connect: bool,
    /// Status reported in the connection complete event
    connect_status: u8,
    /// Command rejected with `REJECT_STATUS`
    fail_opcode: Option<u16>,
}

const REJECT_STATUS: u8 = 0x0C; // command disallowed

/// Commands the controller acknowledges with Command Status
const STATUS_OPCODES: [u16; 6] = [0x0405, 0x0406, 0x041B, 0x041C, 0x200D, 0x2016];

fn event(code: u8, params: &[u8]) -> Vec<u8> {
    let mut packet = vec![HCI_EVENT_PKT, code, params.len() as u8];
    packet.extend_from_slice(params);
    packet
}

fn command_complete(opcode: u16, return_parameters: &[u8]) -> Vec<u8> {
    let mut params = vec![1];
    params.extend_from_slice(&opcode.to_le_bytes());
    params.extend_from_slice(return_parameters);
    event(EVT_CMD_COMPLETE, &params)
}

fn command_status(opcode: u16) -> Vec<u8> {
    command_status_with(opcode, HCI_SUCCESS)
}

fn command_status_with(opcode: u16, status: u8) -> Vec<u8> {
    let mut params = vec![status, 1];
    params.extend_from_slice(&opcode.to_le_bytes());
    event(EVT_CMD_STATUS, &params)
}

fn handle_bytes(handle: u16) -> [u8; 2] {
    handle.to_le_bytes()
}

/// Answers one command, returning the packets to send back
fn respond(script: Script, opcode: u16, params: &[u8]) -> Vec<Vec<u8>> {
    if script.fail_opcode == Some(opcode) {
        return if STATUS_OPCODES.contains(&opcode) {
            vec![command_status_with(opcode, REJECT_STATUS)]
        } else {
            vec![command_complete(opcode, &[REJECT_STATUS])]
        };
    }

    match opcode {
        0x1001 => vec![command_complete(
            opcode,
            &[HCI_SUCCESS, 0x0C, 0x00, 0x00, 0x0C, 0x5F, 0x00, 0x00, 0x00],
        )],
        0x1009 => {
            let mut rp = vec![HCI_SUCCESS];
            rp.extend_from_slice(&CONTROLLER_ADDRESS);
            vec![command_complete(opcode, &rp)]
        }
        0x0405 => {
            let mut replies = vec![command_status(opcode)];
            if !script.silent_connect {
                // Something unrelated first, so the device has to queue it.
                replies.push(event(0xFF, &[0x01, 0x02]));
                let mut complete = vec![script.connect_status];
                complete.extend_from_slice(&handle_bytes(CLASSIC_HANDLE));
                complete.extend_from_slice(&params[0..6]);
                complete.extend_from_slice(&[0x01, 0x00]);
                replies.push(event(EVT_CONN_COMPLETE, &complete));
            }
            replies
        }
        0x200D => {
            let mut replies = vec![command_status(opcode)];
            if !script.silent_connect {
                let mut complete = vec![EVT_LE_CONN_COMPLETE, script.connect_status];
                complete.extend_from_slice(&handle_bytes(LE_HANDLE));
                complete.push(0x00); // central
                complete.push(params[5]);
                complete.extend_from_slice(&params[6..12]);
                complete.extend_from_slice(&[0x28, 0x00, 0x00, 0x00, 0x48, 0x00, 0x00]);
                replies.push(event(EVT_LE_META_EVENT, &complete));
            }
            replies
        }
        0x041B => {
            let mut complete = vec![HCI_SUCCESS];
            complete.extend_from_slice(&params[0..2]);
            complete.extend_from_slice(&0x8000_0000_0000_0025u64.to_le_bytes());
            vec![
                command_status(opcode),
                event(EVT_READ_REMOTE_FEATURES_COMPLETE, &complete),
            ]
        }
        0x041C => {
            let mut complete = vec![HCI_SUCCESS];
            complete.extend_from_slice(&params[0..2]);
            complete.push(params[2]); // page
            complete.push(2); // max page
            complete.extend_from_slice(&(params[2] as u64).to_le_bytes());
            vec![
                command_status(opcode),
                event(EVT_READ_REMOTE_EXT_FEATURES_COMPLETE, &complete),
            ]
        }
        0x2016 => {
            let mut complete = vec![EVT_LE_READ_REMOTE_FEATURES_COMPLETE, HCI_SUCCESS];
            complete.extend_from_slice(&params[0..2]);
            complete.extend_from_slice(&0x0000_0000_0000_0101u64.to_le_bytes());
            vec![command_status(opcode), event(EVT_LE_META_EVENT, &complete)]
        }
        0x0406 => {
            let mut complete = vec![HCI_SUCCESS];
            complete.extend_from_slice(&params[0..2]);
            complete.push(0x16);
            vec![command_status(opcode), event(EVT_DISCONN_COMPLETE, &complete)]
        }
        _ => vec![command_complete(opcode, &[HCI_SUCCESS])],
    }
}

/// Starts a fake controller and returns a device connected to it
///
/// The handle yields every opcode the controller received, once the device is dropped.
fn start(script: Script, config: DeviceConfiguration) -> (Device, JoinHandle<Vec<u16>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();

    let controller = thread::spawn(move || {
        let (stream, _): (TcpStream, _) = listener.accept().unwrap();
        let mut controller = StreamTransport::new(stream);
        let mut opcodes = Vec::new();

        while let Ok(packet) = controller.receive_packet(None) {
            assert_eq!(packet[0], HCI_COMMAND_PKT);
            let opcode = u16::from_le_bytes([packet[1], packet[2]]);
            opcodes.push(opcode);
            for reply in respond(script, opcode, &packet[4..]) {
                controller.send_packet(&reply).unwrap();
            }
        }
        opcodes
    });

    let transport = open_transport(&format!("tcp-client:{}", address)).unwrap();
    (Device::from_config_with_transport(config, transport), controller)
}

fn peer() -> BdAddr {
    "00:1A:7D:DA:71:13".parse().unwrap()
}

#[test]
fn test_power_on() {
    let (mut device, controller) = start(Script::default(), DeviceConfiguration::default());

    device.power_on().unwrap();
    assert!(device.is_powered_on());
    assert_eq!(
        device.public_address().unwrap().to_string(),
        "11:22:33:44:55:66"
    );
    let version = device.local_version().unwrap();
    assert_eq!(version.hci_version, 0x0C);
    assert_eq!(version.company_identifier, 0x005F);

    drop(device);
    assert_eq!(
        controller.join().unwrap(),
        vec![0x0C03, 0x1001, 0x1009, 0x0C01, 0x0C13, 0x0C6D, 0x2001]
    );
}

#[test]
fn test_power_on_le_only_with_random_address() {
    let config = DeviceConfiguration {
        classic_enabled: false,
        address: Some("F0:F1:F2:F3:F4:F5".parse().unwrap()),
        ..DeviceConfiguration::default()
    };
    let (mut device, controller) = start(Script::default(), config);

    device.power_on().unwrap();
    assert_eq!(
        device.random_address().unwrap().to_string(),
        "F0:F1:F2:F3:F4:F5"
    );

    drop(device);
    assert_eq!(
        controller.join().unwrap(),
        vec![0x0C03, 0x1001, 0x1009, 0x0C01, 0x2001, 0x2005]
    );
}

#[test]
fn test_classic_connect_features_disconnect() {
    let (mut device, controller) = start(Script::default(), DeviceConfiguration::default());
    device.power_on().unwrap();

    let connection = device
        .connect(
            &peer(),
            AddressType::Public,
            PhysicalTransport::BrEdr,
            OwnAddressType::Public,
        )
        .unwrap();
    assert_eq!(connection.handle, CLASSIC_HANDLE);
    assert_eq!(connection.peer_address, peer());
    assert_eq!(connection.transport, PhysicalTransport::BrEdr);
    assert_eq!(connection.role, Role::Central);

    let features = device.read_remote_features(&connection).unwrap();
    match features {
        RemoteFeatures::BrEdr {
            lmp_features,
            extended_pages,
        } => {
            assert!(lmp_features.contains(LmpFeatures::EXTENDED_FEATURES));
            assert!(lmp_features.contains(LmpFeatures::THREE_SLOT_PACKETS));
            assert!(lmp_features.contains(LmpFeatures::ROLE_SWITCH));
            assert_eq!(
                extended_pages
                    .iter()
                    .map(|page| page.page_number)
                    .collect::<Vec<_>>(),
                vec![1, 2]
            );
        }
        other => panic!("unexpected features {:?}", other),
    }

    device
        .disconnect(connection, HCI_REMOTE_USER_TERMINATED_CONNECTION)
        .unwrap();

    drop(device);
    let opcodes = controller.join().unwrap();
    assert_eq!(
        opcodes[7..].to_vec(),
        vec![0x0405, 0x041B, 0x041C, 0x041C, 0x0406]
    );
}

#[test]
fn test_le_connect_features_disconnect() {
    let (mut device, controller) = start(Script::default(), DeviceConfiguration::default());
    device.power_on().unwrap();

    let connection = device
        .connect(
            &peer(),
            AddressType::Random,
            PhysicalTransport::Le,
            OwnAddressType::ResolvableOrRandom,
        )
        .unwrap();
    assert_eq!(connection.handle, LE_HANDLE);
    assert_eq!(connection.peer_address, peer());
    assert_eq!(connection.peer_address_type, Some(AddressType::Random));
    assert_eq!(
        connection.own_address_type,
        Some(OwnAddressType::ResolvableOrRandom)
    );
    assert!(device.random_address().unwrap().is_static_random());

    let features = device.read_remote_features(&connection).unwrap();
    assert_eq!(
        features,
        RemoteFeatures::Le(LeFeatures::LE_ENCRYPTION | LeFeatures::LE_2M_PHY)
    );

    device
        .disconnect(connection, HCI_REMOTE_USER_TERMINATED_CONNECTION)
        .unwrap();

    drop(device);
    let opcodes = controller.join().unwrap();
    assert_eq!(
        opcodes[7..].to_vec(),
        vec![0x2005, 0x200D, 0x2016, 0x0406]
    );
}

#[test]
fn test_connection_failure_status() {
    let script = Script {
        connect_status: 0x04, // page timeout
        ..Script::default()
    };
    let (mut device, _controller) = start(script, DeviceConfiguration::default());
    device.power_on().unwrap();

    let result = device.connect(
        &peer(),
        AddressType::Public,
        PhysicalTransport::BrEdr,
        OwnAddressType::Public,
    );
    assert!(matches!(result, Err(Error::ConnectionFailed { status: 0x04 })));
}

#[test]
fn test_connect_timeout_cancels() {
    let script = Script {
        silent_connect: true,
        ..Script::default()
    };
    let config = DeviceConfiguration {
        connect_timeout_ms: 100,
        ..DeviceConfiguration::default()
    };
    let (mut device, controller) = start(script, config);
    device.power_on().unwrap();

    let result = device.connect(
        &peer(),
        AddressType::Public,
        PhysicalTransport::Le,
        OwnAddressType::Public,
    );
    assert!(matches!(result, Err(Error::Timeout(_))));

    drop(device);
    let opcodes = controller.join().unwrap();
    assert_eq!(opcodes[7..].to_vec(), vec![0x200D, 0x200E]);
}

#[test]
fn test_connect_requires_power_on_and_enabled_transport() {
    let config = DeviceConfiguration {
        classic_enabled: false,
        ..DeviceConfiguration::default()
    };
    let (mut device, _controller) = start(Script::default(), config);

    let result = device.connect(
        &peer(),
        AddressType::Public,
        PhysicalTransport::Le,
        OwnAddressType::Public,
    );
    assert!(matches!(result, Err(Error::ProtocolError(_))));

    device.power_on().unwrap();
    let result = device.connect(
        &peer(),
        AddressType::Public,
        PhysicalTransport::BrEdr,
        OwnAddressType::Public,
    );
    assert!(matches!(result, Err(Error::Unsupported(_))));
}

#[test]
fn test_power_on_command_failure() {
    let script = Script {
        fail_opcode: Some(0x0C01),
        ..Script::default()
    };
    let (mut device, controller) = start(script, DeviceConfiguration::default());

    let result = device.power_on();
    assert!(matches!(
        result,
        Err(Error::CommandFailed {
            opcode: 0x0C01,
            status: REJECT_STATUS
        })
    ));
    assert!(!device.is_powered_on());

    drop(device);
    assert_eq!(
        controller.join().unwrap(),
        vec![0x0C03, 0x1001, 0x1009, 0x0C01]
    );
}

#[test]
fn test_rejected_command_status() {
    let script = Script {
        fail_opcode: Some(0x0405),
        ..Script::default()
    };
    let (mut device, _controller) = start(script, DeviceConfiguration::default());
    device.power_on().unwrap();

    let result = device.connect(
        &peer(),
        AddressType::Public,
        PhysicalTransport::BrEdr,
        OwnAddressType::Public,
    );
    assert!(matches!(
        result,
        Err(Error::CommandFailed {
            opcode: 0x0405,
            status: REJECT_STATUS
        })
    ));
}

#[test]
fn test_rejected_disconnect() {
    let script = Script {
        fail_opcode: Some(0x0406),
        ..Script::default()
    };
    let (mut device, _controller) = start(script, DeviceConfiguration::default());
    device.power_on().unwrap();

    let connection = device
        .connect(
            &peer(),
            AddressType::Random,
            PhysicalTransport::Le,
            OwnAddressType::Public,
        )
        .unwrap();
    let result = device.disconnect(connection, HCI_REMOTE_USER_TERMINATED_CONNECTION);
    assert!(matches!(
        result,
        Err(Error::CommandFailed {
            opcode: 0x0406,
            status: REJECT_STATUS
        })
    ));
}
