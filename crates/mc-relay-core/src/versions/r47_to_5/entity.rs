//! Entity interaction and entity data translators.

use mc_relay_proto::position::OptionalPosition;
use mc_relay_proto::{Direction, FieldValue, PacketData, ProtocolState};

use super::items;
use crate::dispatch::TranslatorTable;
use crate::session::Session;

pub(super) fn group() -> TranslatorTable {
    let mut table = TranslatorTable::new();

    // use entity
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x02,
        |_: &mut Session, packet: PacketData| {
            let target = packet.var_int(0)?;
            let action = packet.optional_position(1)?.action;
            // 1.7 has no interact-at packet.
            if action == OptionalPosition::INTERACT_AT {
                return Ok(PacketData::suppress());
            }
            Ok(PacketData::new(
                0x02,
                vec![FieldValue::Int(target), FieldValue::Byte(action as i8)],
            ))
        },
    );

    // animation: 1.8 sends an empty swing, 1.7 wants entity id and kind
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x0A,
        |_: &mut Session, _| {
            Ok(PacketData::new(
                0x0A,
                vec![FieldValue::Int(0), FieldValue::Byte(1)],
            ))
        },
    );

    // entity action: 1.8 renumbered the actions down by one
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x0B,
        |_: &mut Session, packet: PacketData| {
            let entity_id = packet.var_int(0)?;
            let action = packet.var_int(1)?;
            let jump_boost = packet.var_int(2)?;
            Ok(PacketData::new(
                0x0B,
                vec![
                    FieldValue::Int(entity_id),
                    FieldValue::Byte((action + 1) as i8),
                    FieldValue::Int(jump_boost),
                ],
            ))
        },
    );

    // entity equipment
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x04,
        |_: &mut Session, packet: PacketData| {
            let item = packet.item(2)?.cloned().map(items::remap_item);
            Ok(PacketData::new(
                0x04,
                vec![
                    FieldValue::VarInt(packet.int(0)?),
                    packet.field_owned(1)?,
                    FieldValue::Item(item),
                ],
            ))
        },
    );

    // entity velocity
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x12,
        |_: &mut Session, packet: PacketData| {
            Ok(PacketData::new(
                0x12,
                vec![
                    FieldValue::VarInt(packet.int(0)?),
                    packet.field_owned(1)?,
                    packet.field_owned(2)?,
                    packet.field_owned(3)?,
                ],
            ))
        },
    );

    table
}
