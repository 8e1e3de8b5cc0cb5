//! The beta 1.8.1 to beta 1.7.3 bridge.
//!
//! Beta connections have no handshake or status phase, so every
//! translator here runs in the play phase, list ping included.

use mc_relay_proto::{Direction, FieldValue, PacketData, ProtocolState, ProtocolVersion};

use crate::bridge::VersionBridge;
use crate::ping::beta_ping_line;
use crate::session::Session;
use crate::world::BlockStorage;

mod rotation;
mod tab_list;
mod world;

pub fn bridge() -> VersionBridge {
    let mut bridge = VersionBridge::new(ProtocolVersion::B1_8_1, ProtocolVersion::B1_7_3);
    let table = bridge.table_mut();

    // list ping
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0xFE,
        |session: &mut Session, _packet: PacketData| {
            let line = beta_ping_line(&session.info);
            session.send_packet(
                Direction::ServerToClient,
                PacketData::new(0xFF, vec![FieldValue::String(line)]),
            );
            Ok(PacketData::suppress())
        },
    );

    // login request
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x01,
        |session: &mut Session, packet: PacketData| {
            session.username = Some(packet.string(1)?.to_owned());
            session.store.blocks = Some(BlockStorage::new());
            Ok(PacketData::new(
                0x01,
                vec![
                    FieldValue::Int(14),
                    packet.field_owned(1)?,
                    packet.field_owned(2)?,
                    packet.field_owned(4)?,
                ],
            ))
        },
    );

    // login response
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x01,
        |session: &mut Session, packet: PacketData| {
            tab_list::init_own_entry(session);
            let max_players = session.info.max_players as i8;
            Ok(PacketData::new(
                0x01,
                vec![
                    packet.field_owned(0)?,
                    packet.field_owned(1)?,
                    packet.field_owned(2)?,
                    FieldValue::Int(0),
                    packet.field_owned(3)?,
                    FieldValue::Byte(1),
                    FieldValue::Byte(-128),
                    FieldValue::Byte(max_players),
                ],
            ))
        },
    );

    // keep alive: 1.8.1 carries an id, 1.7.3 none
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x00,
        |_: &mut Session, _| Ok(PacketData::new(0x00, vec![])),
    );
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x00,
        |_: &mut Session, _| Ok(PacketData::new(0x00, vec![FieldValue::Int(0)])),
    );

    // update health
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x08,
        |_: &mut Session, packet: PacketData| {
            Ok(PacketData::new(
                0x08,
                vec![
                    packet.field_owned(0)?,
                    FieldValue::Short(6),
                    FieldValue::Float(0.0),
                ],
            ))
        },
    );

    // respawn
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x09,
        |_: &mut Session, packet: PacketData| {
            Ok(PacketData::new(0x09, vec![packet.field_owned(0)?]))
        },
    );
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x09,
        |_: &mut Session, packet: PacketData| {
            Ok(PacketData::new(
                0x09,
                vec![
                    packet.field_owned(0)?,
                    FieldValue::Byte(0),
                    FieldValue::Byte(0),
                    FieldValue::Short(128),
                    FieldValue::Long(0),
                ],
            ))
        },
    );

    // open window: title widens from String8 to the UTF-16 string
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x64,
        |_: &mut Session, packet: PacketData| {
            let title = packet.string8(2)?.to_owned();
            Ok(PacketData::new(
                0x64,
                vec![
                    packet.field_owned(0)?,
                    packet.field_owned(1)?,
                    FieldValue::String(title),
                    packet.field_owned(3)?,
                ],
            ))
        },
    );

    // game state
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x46,
        |_: &mut Session, packet: PacketData| {
            Ok(PacketData::new(
                0x46,
                vec![packet.field_owned(0)?, FieldValue::Byte(0)],
            ))
        },
    );

    // entity action: sprint start/stop does not exist downstream
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x13,
        |_: &mut Session, packet: PacketData| {
            let action = packet.byte(1)?;
            if action == 4 || action == 5 {
                return Ok(PacketData::suppress());
            }
            Ok(packet)
        },
    );

    bridge.add_group(world::group());
    bridge.add_group(tab_list::group());
    bridge
}
