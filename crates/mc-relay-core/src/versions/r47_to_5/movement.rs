//! Movement translators.
//!
//! 1.7 carries a redundant "stance" double (head y) in the position
//! packets that 1.8 dropped; it is reconstructed as feet y plus the
//! fixed eye height. The bare ground-flag packet is deduplicated
//! against the tracker so an idle 1.8 client does not flood the 1.7
//! server with identical packets.

use mc_relay_proto::{Direction, FieldValue, PacketData, ProtocolState};

use crate::dispatch::TranslatorTable;
use crate::session::Session;

const EYE_HEIGHT: f64 = 1.62;

/// Record the flag; true when it differs from the previous one.
fn track_ground(session: &mut Session, on_ground: bool) -> bool {
    match session.store.on_ground.as_mut() {
        Some(tracker) => tracker.update(on_ground),
        None => true,
    }
}

pub(super) fn group() -> TranslatorTable {
    let mut table = TranslatorTable::new();

    // player (ground flag only)
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x03,
        |session: &mut Session, packet: PacketData| {
            let on_ground = packet.boolean(0)?;
            if !track_ground(session, on_ground) {
                return Ok(PacketData::suppress());
            }
            Ok(packet)
        },
    );

    // player position
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x04,
        |session: &mut Session, packet: PacketData| {
            let y = packet.double(1)?;
            track_ground(session, packet.boolean(3)?);
            Ok(PacketData::new(
                0x04,
                vec![
                    packet.field_owned(0)?,
                    packet.field_owned(1)?,
                    FieldValue::Double(y + EYE_HEIGHT),
                    packet.field_owned(2)?,
                    packet.field_owned(3)?,
                ],
            ))
        },
    );

    // player look
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x05,
        |session: &mut Session, packet: PacketData| {
            track_ground(session, packet.boolean(2)?);
            Ok(packet)
        },
    );

    // player position and look
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x06,
        |session: &mut Session, packet: PacketData| {
            let y = packet.double(1)?;
            track_ground(session, packet.boolean(5)?);
            Ok(PacketData::new(
                0x06,
                vec![
                    packet.field_owned(0)?,
                    packet.field_owned(1)?,
                    FieldValue::Double(y + EYE_HEIGHT),
                    packet.field_owned(2)?,
                    packet.field_owned(3)?,
                    packet.field_owned(4)?,
                    packet.field_owned(5)?,
                ],
            ))
        },
    );

    // server teleport: the ground flag became a relative-flags byte
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x08,
        |_: &mut Session, packet: PacketData| {
            Ok(PacketData::new(
                0x08,
                vec![
                    packet.field_owned(0)?,
                    packet.field_owned(1)?,
                    packet.field_owned(2)?,
                    packet.field_owned(3)?,
                    packet.field_owned(4)?,
                    FieldValue::Byte(0),
                ],
            ))
        },
    );

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_relay_proto::ProtocolVersion;
    use crate::trackers::OnGroundTracker;

    fn session() -> Session {
        let mut session = Session::new(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6);
        session.state = ProtocolState::Play;
        session.store.on_ground = Some(OnGroundTracker::default());
        session
    }

    fn ground_packet(on_ground: bool) -> PacketData {
        PacketData::new(0x03, vec![FieldValue::Bool(on_ground)])
    }

    #[test]
    fn repeated_ground_flags_are_suppressed() {
        let mut session = session();
        let table = group();
        let out = table
            .dispatch(&mut session, Direction::ClientToServer, ground_packet(true))
            .unwrap();
        assert_eq!(out.opcode, 0x03);

        let out = table
            .dispatch(&mut session, Direction::ClientToServer, ground_packet(true))
            .unwrap();
        assert!(out.is_suppressed());

        let out = table
            .dispatch(&mut session, Direction::ClientToServer, ground_packet(false))
            .unwrap();
        assert_eq!(out.opcode, 0x03);
    }

    #[test]
    fn position_regains_its_stance() {
        let mut session = session();
        let packet = PacketData::new(
            0x04,
            vec![
                FieldValue::Double(10.5),
                FieldValue::Double(64.0),
                FieldValue::Double(-3.25),
                FieldValue::Bool(true),
            ],
        );
        let out = group()
            .dispatch(&mut session, Direction::ClientToServer, packet)
            .unwrap();
        assert_eq!(out.fields.len(), 5);
        assert_eq!(out.field(2).unwrap(), &FieldValue::Double(64.0 + 1.62));
        assert_eq!(out.field(3).unwrap(), &FieldValue::Double(-3.25));
        assert_eq!(
            session.store.on_ground.as_ref().unwrap().last(),
            Some(true)
        );
    }

    #[test]
    fn position_and_look_regains_its_stance() {
        let mut session = session();
        let packet = PacketData::new(
            0x06,
            vec![
                FieldValue::Double(0.0),
                FieldValue::Double(70.0),
                FieldValue::Double(0.0),
                FieldValue::Float(90.0),
                FieldValue::Float(0.0),
                FieldValue::Bool(false),
            ],
        );
        let out = group()
            .dispatch(&mut session, Direction::ClientToServer, packet)
            .unwrap();
        assert_eq!(out.fields.len(), 7);
        assert_eq!(out.field(2).unwrap(), &FieldValue::Double(70.0 + 1.62));
        assert_eq!(out.field(4).unwrap(), &FieldValue::Float(90.0));
    }

    #[test]
    fn teleport_flags_are_absolute() {
        let mut session = session();
        let packet = PacketData::new(
            0x08,
            vec![
                FieldValue::Double(0.0),
                FieldValue::Double(64.0),
                FieldValue::Double(0.0),
                FieldValue::Float(0.0),
                FieldValue::Float(0.0),
                FieldValue::Bool(true),
            ],
        );
        let out = group()
            .dispatch(&mut session, Direction::ServerToClient, packet)
            .unwrap();
        assert_eq!(out.byte(5).unwrap(), 0);
    }
}
