//! The release 1.8 (47) to release 1.7.6 (5) bridge.
//!
//! The bulk of the 1.8 changes are mechanical: block coordinates
//! collapse into one packed long, entity ids widen to VarInts, and sign
//! text becomes chat components. The stateful parts (windows, movement,
//! mining against a beta server) live in the sub-groups.

use mc_relay_proto::tab_list::{GameProfile, PlayerListEntry, TabListEntry};
use mc_relay_proto::{
    BlockLocation, Direction, FieldValue, PacketData, ProtocolState, ProtocolVersion,
    SUPPRESS_OPCODE,
};

use crate::bridge::VersionBridge;
use crate::chat::{ensure_json_component, json_to_legacy, legacy_to_json, strip_color};
use crate::dispatch::TranslatorTable;
use crate::ping::rewrite_status;
use crate::session::Session;
use crate::trackers::{MiningTracker, OnGroundTracker, QuickBarTracker, WindowTypeTracker};

mod entity;
mod hardness;
mod inventory;
mod items;
mod movement;
mod world;

pub fn bridge() -> VersionBridge {
    let mut bridge = VersionBridge::new(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6);

    bridge.on_connect(|session: &mut Session| {
        session.store.on_ground = Some(OnGroundTracker::default());
        session.store.window_types = Some(WindowTypeTracker::default());
        session.store.quick_bar = Some(QuickBarTracker::default());
    });
    // Digging timing only diverges when the far end is beta.
    bridge.on_connect_to(ProtocolVersion::B1_7_3, |session: &mut Session| {
        session.store.mining = Some(MiningTracker::default());
    });

    let table = bridge.table_mut();

    // handshake: pin the downstream protocol number
    table.register(
        ProtocolState::Handshake,
        Direction::ClientToServer,
        0x00,
        |_: &mut Session, packet: PacketData| {
            Ok(PacketData::new(
                0x00,
                vec![
                    FieldValue::VarInt(ProtocolVersion::R1_7_6.protocol_id()),
                    packet.field_owned(1)?,
                    packet.field_owned(2)?,
                    packet.field_owned(3)?,
                ],
            ))
        },
    );

    // status response: advertise the client's own version
    table.register(
        ProtocolState::Status,
        Direction::ServerToClient,
        0x00,
        |session: &mut Session, packet: PacketData| {
            let rewritten = rewrite_status(packet.string(0)?, session.client_version)?;
            Ok(PacketData::new(0x00, vec![FieldValue::String(rewritten)]))
        },
    );

    // login start
    table.register(
        ProtocolState::Login,
        Direction::ClientToServer,
        0x00,
        |session: &mut Session, packet: PacketData| {
            session.username = Some(packet.string(0)?.to_owned());
            Ok(packet)
        },
    );

    register_play_server(table);
    register_play_client(table);

    bridge.add_group(movement::group());
    bridge.add_group(inventory::group());
    bridge.add_group(entity::group());
    bridge.add_group(world::group());
    bridge
}

fn register_play_server(table: &mut TranslatorTable) {
    use Direction::ServerToClient;
    use ProtocolState::Play;

    // keep alive
    table.register(Play, ServerToClient, 0x00, |_: &mut Session, packet: PacketData| {
        Ok(PacketData::new(
            0x00,
            vec![FieldValue::VarInt(packet.int(0)?)],
        ))
    });

    // join game: 1.8 appends the reduced-debug-info flag
    table.register(Play, ServerToClient, 0x01, |_: &mut Session, packet: PacketData| {
        let mut fields = packet.fields.clone();
        fields.push(FieldValue::Bool(false));
        Ok(PacketData::new(0x01, fields))
    });

    // chat: 1.8 appends the message position byte
    table.register(Play, ServerToClient, 0x02, |_: &mut Session, packet: PacketData| {
        Ok(PacketData::new(
            0x02,
            vec![packet.field_owned(0)?, FieldValue::Byte(0)],
        ))
    });

    // spawn position
    table.register(Play, ServerToClient, 0x05, |_: &mut Session, packet: PacketData| {
        let location =
            BlockLocation::new(packet.int(0)?, packet.int(1)?, packet.int(2)?);
        Ok(PacketData::new(0x05, vec![FieldValue::Position(location)]))
    });

    // update health: food counter widens to a VarInt
    table.register(Play, ServerToClient, 0x06, |_: &mut Session, packet: PacketData| {
        Ok(PacketData::new(
            0x06,
            vec![
                packet.field_owned(0)?,
                FieldValue::VarInt(packet.short(1)? as i32),
                packet.field_owned(2)?,
            ],
        ))
    });

    // use bed
    table.register(Play, ServerToClient, 0x0A, |_: &mut Session, packet: PacketData| {
        let location = BlockLocation::new(
            packet.int(1)?,
            packet.byte(2)? as i32,
            packet.int(3)?,
        );
        Ok(PacketData::new(
            0x0A,
            vec![
                FieldValue::VarInt(packet.int(0)?),
                FieldValue::Position(location),
            ],
        ))
    });

    // collect item
    table.register(Play, ServerToClient, 0x0D, |_: &mut Session, packet: PacketData| {
        Ok(PacketData::new(
            0x0D,
            vec![
                FieldValue::VarInt(packet.int(0)?),
                FieldValue::VarInt(packet.int(1)?),
            ],
        ))
    });

    // set experience
    table.register(Play, ServerToClient, 0x1F, |_: &mut Session, packet: PacketData| {
        Ok(PacketData::new(
            0x1F,
            vec![
                packet.field_owned(0)?,
                FieldValue::VarInt(packet.short(1)? as i32),
                FieldValue::VarInt(packet.short(2)? as i32),
            ],
        ))
    });

    // block action
    table.register(Play, ServerToClient, 0x24, |_: &mut Session, packet: PacketData| {
        let location = BlockLocation::new(
            packet.int(0)?,
            packet.short(1)? as i32,
            packet.int(2)?,
        );
        Ok(PacketData::new(
            0x24,
            vec![
                FieldValue::Position(location),
                packet.field_owned(3)?,
                packet.field_owned(4)?,
                packet.field_owned(5)?,
            ],
        ))
    });

    // block break animation
    table.register(Play, ServerToClient, 0x25, |_: &mut Session, packet: PacketData| {
        let location =
            BlockLocation::new(packet.int(1)?, packet.int(2)?, packet.int(3)?);
        Ok(PacketData::new(
            0x25,
            vec![
                packet.field_owned(0)?,
                FieldValue::Position(location),
                packet.field_owned(4)?,
            ],
        ))
    });

    // effect
    table.register(Play, ServerToClient, 0x28, |_: &mut Session, packet: PacketData| {
        let location = BlockLocation::new(
            packet.int(1)?,
            packet.byte(2)? as i32,
            packet.int(3)?,
        );
        Ok(PacketData::new(
            0x28,
            vec![
                packet.field_owned(0)?,
                FieldValue::Position(location),
                packet.field_owned(4)?,
                packet.field_owned(5)?,
            ],
        ))
    });

    // update sign: legacy lines become chat components
    table.register(Play, ServerToClient, 0x33, |_: &mut Session, packet: PacketData| {
        let location = BlockLocation::new(
            packet.int(0)?,
            packet.short(1)? as i32,
            packet.int(2)?,
        );
        let mut fields = vec![FieldValue::Position(location)];
        for i in 0..4 {
            fields.push(FieldValue::String(legacy_to_json(packet.string(3 + i)?)));
        }
        Ok(PacketData::new(0x33, fields))
    });

    // sign editor
    table.register(Play, ServerToClient, 0x36, |_: &mut Session, packet: PacketData| {
        let location =
            BlockLocation::new(packet.int(0)?, packet.int(1)?, packet.int(2)?);
        Ok(PacketData::new(0x36, vec![FieldValue::Position(location)]))
    });

    // tab list item
    table.register(Play, ServerToClient, 0x38, |_: &mut Session, packet: PacketData| {
        let username = strip_color(packet.string(0)?);
        if username.is_empty() {
            // Ping refreshes for players this proxy never named.
            return Ok(PacketData::suppress());
        }
        let online = packet.boolean(1)?;
        let entry = PlayerListEntry::bare(GameProfile::offline(&username));
        let entries = if online {
            TabListEntry::add(vec![entry])
        } else {
            TabListEntry::remove(vec![entry])
        };
        Ok(PacketData::new(
            0x38,
            vec![FieldValue::TabListEntry(entries)],
        ))
    });

    // attributes, chunk bulk and plugin channels have no translatable 1.8 form
    table.register_remap(Play, ServerToClient, 0x20, SUPPRESS_OPCODE);
    table.register_remap(Play, ServerToClient, 0x26, SUPPRESS_OPCODE);
    table.register_remap(Play, ServerToClient, 0x3F, SUPPRESS_OPCODE);
}

fn register_play_client(table: &mut TranslatorTable) {
    use Direction::ClientToServer;
    use ProtocolState::Play;

    // keep alive
    table.register(Play, ClientToServer, 0x00, |_: &mut Session, packet: PacketData| {
        Ok(PacketData::new(
            0x00,
            vec![FieldValue::Int(packet.var_int(0)?)],
        ))
    });

    // player digging
    table.register(Play, ClientToServer, 0x07, |session: &mut Session, packet: PacketData| {
        let action = packet.unsigned_byte(0)?;
        let location = packet.position(1)?;
        let face = packet.byte(2)?;

        if session.store.mining.is_some() && session.store.blocks.is_some() {
            match action {
                0 => {
                    if let Some(mining) = session.store.mining.as_mut() {
                        mining.start(location);
                    }
                }
                1 => {
                    if let Some(mining) = session.store.mining.as_mut() {
                        mining.cancel(location);
                    }
                }
                2 => {
                    let block_id = session
                        .store
                        .blocks
                        .as_ref()
                        .map(|blocks| blocks.block_at(location.x, location.y, location.z))
                        .unwrap_or(0);
                    if let Some(mining) = session.store.mining.as_mut() {
                        mining.finish(location);
                    }
                    // The beta server finishes these on its own clock.
                    if hardness::exists(block_id) {
                        return Ok(PacketData::suppress());
                    }
                }
                _ => {}
            }
        }

        Ok(PacketData::new(
            0x07,
            vec![
                packet.field_owned(0)?,
                FieldValue::Int(location.x),
                FieldValue::UnsignedByte(location.y as u8),
                FieldValue::Int(location.z),
                FieldValue::UnsignedByte(face as u8),
            ],
        ))
    });

    // block placement
    table.register(Play, ClientToServer, 0x08, |_: &mut Session, packet: PacketData| {
        let location = packet.position(0)?;
        Ok(PacketData::new(
            0x08,
            vec![
                FieldValue::Int(location.x),
                FieldValue::UnsignedByte(location.y as u8),
                FieldValue::Int(location.z),
                packet.field_owned(1)?,
                packet.field_owned(2)?,
                packet.field_owned(3)?,
                packet.field_owned(4)?,
                packet.field_owned(5)?,
            ],
        ))
    });

    // update sign: components back to legacy lines
    table.register(Play, ClientToServer, 0x12, |_: &mut Session, packet: PacketData| {
        let location = packet.position(0)?;
        let mut fields = vec![
            FieldValue::Int(location.x),
            FieldValue::Short(location.y as i16),
            FieldValue::Int(location.z),
        ];
        for i in 0..4 {
            let component = ensure_json_component(packet.string(1 + i)?);
            fields.push(FieldValue::String(json_to_legacy(&component)));
        }
        Ok(PacketData::new(0x12, fields))
    });

    // client settings: 1.7 still carries the show-cape flag
    table.register(Play, ClientToServer, 0x15, |_: &mut Session, packet: PacketData| {
        let mut fields = packet.fields.clone();
        fields.push(FieldValue::Bool(false));
        Ok(PacketData::new(0x15, fields))
    });

    // steer vehicle: the flags byte splits into jump/unmount booleans
    table.register(Play, ClientToServer, 0x0C, |_: &mut Session, packet: PacketData| {
        let flags = packet.byte(2)?;
        Ok(PacketData::new(
            0x0C,
            vec![
                packet.field_owned(0)?,
                packet.field_owned(1)?,
                FieldValue::Bool(flags & 1 != 0),
                FieldValue::Bool(flags & 2 != 0),
            ],
        ))
    });

    // client status
    table.register(Play, ClientToServer, 0x16, |_: &mut Session, packet: PacketData| {
        Ok(PacketData::new(
            0x16,
            vec![FieldValue::Byte(packet.var_int(0)? as i8)],
        ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::BlockStorage;

    fn play_session() -> Session {
        let mut session = Session::new(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6);
        session.state = ProtocolState::Play;
        session
    }

    fn dispatch(session: &mut Session, direction: Direction, packet: PacketData) -> PacketData {
        bridge().translate(session, direction, packet).unwrap()
    }

    #[test]
    fn handshake_pins_protocol_five() {
        let mut session = Session::new(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6);
        let out = dispatch(
            &mut session,
            Direction::ClientToServer,
            PacketData::new(
                0x00,
                vec![
                    FieldValue::VarInt(47),
                    FieldValue::String("localhost".to_owned()),
                    FieldValue::UnsignedShort(25565),
                    FieldValue::VarInt(1),
                ],
            ),
        );
        assert_eq!(out.var_int(0).unwrap(), 5);
        assert_eq!(out.var_int(3).unwrap(), 1);
    }

    #[test]
    fn status_response_reports_the_client_version() {
        let mut session = Session::new(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6);
        session.state = ProtocolState::Status;
        let raw = r#"{"version":{"name":"1.7.10","protocol":5},"players":{"max":20,"online":0}}"#;
        let out = dispatch(
            &mut session,
            Direction::ServerToClient,
            PacketData::new(0x00, vec![FieldValue::String(raw.to_owned())]),
        );
        let value: serde_json::Value = serde_json::from_str(out.string(0).unwrap()).unwrap();
        assert_eq!(value["version"]["protocol"], 47);
        assert_eq!(value["players"]["max"], 20);
    }

    #[test]
    fn login_start_captures_the_username() {
        let mut session = Session::new(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6);
        session.state = ProtocolState::Login;
        dispatch(
            &mut session,
            Direction::ClientToServer,
            PacketData::new(0x00, vec![FieldValue::String("Alex".to_owned())]),
        );
        assert_eq!(session.username.as_deref(), Some("Alex"));
    }

    #[test]
    fn connect_hooks_seed_the_store() {
        let b = bridge();
        let mut session = Session::new(ProtocolVersion::R1_8, ProtocolVersion::R1_7_6);
        b.establish(&mut session);
        assert!(session.store.on_ground.is_some());
        assert!(session.store.window_types.is_some());
        assert!(session.store.quick_bar.is_some());
        assert!(session.store.mining.is_none());

        let mut session = Session::new(ProtocolVersion::R1_8, ProtocolVersion::B1_7_3);
        b.establish(&mut session);
        assert!(session.store.mining.is_some());
    }

    #[test]
    fn keep_alive_ids_change_width() {
        let mut session = play_session();
        let out = dispatch(
            &mut session,
            Direction::ServerToClient,
            PacketData::new(0x00, vec![FieldValue::Int(7)]),
        );
        assert_eq!(out.var_int(0).unwrap(), 7);

        let out = dispatch(
            &mut session,
            Direction::ClientToServer,
            PacketData::new(0x00, vec![FieldValue::VarInt(7)]),
        );
        assert_eq!(out.int(0).unwrap(), 7);
    }

    #[test]
    fn spawn_position_packs() {
        let mut session = play_session();
        let out = dispatch(
            &mut session,
            Direction::ServerToClient,
            PacketData::new(
                0x05,
                vec![
                    FieldValue::Int(100),
                    FieldValue::Int(64),
                    FieldValue::Int(-100),
                ],
            ),
        );
        assert_eq!(out.position(0).unwrap(), BlockLocation::new(100, 64, -100));
    }

    #[test]
    fn sign_text_gains_components_downstream_loses_them_upstream() {
        let mut session = play_session();
        let out = dispatch(
            &mut session,
            Direction::ServerToClient,
            PacketData::new(
                0x33,
                vec![
                    FieldValue::Int(0),
                    FieldValue::Short(64),
                    FieldValue::Int(0),
                    FieldValue::String("line1".to_owned()),
                    FieldValue::String(String::new()),
                    FieldValue::String(String::new()),
                    FieldValue::String(String::new()),
                ],
            ),
        );
        assert_eq!(out.string(1).unwrap(), r#"{"text":"line1"}"#);

        let out = dispatch(
            &mut session,
            Direction::ClientToServer,
            PacketData::new(
                0x12,
                vec![
                    FieldValue::Position(BlockLocation::new(0, 64, 0)),
                    FieldValue::String(r#"{"text":"line1"}"#.to_owned()),
                    FieldValue::String("plain".to_owned()),
                    FieldValue::String(String::new()),
                    FieldValue::String(String::new()),
                ],
            ),
        );
        assert_eq!(out.int(0).unwrap(), 0);
        assert_eq!(out.short(1).unwrap(), 64);
        assert_eq!(out.string(3).unwrap(), "line1");
        assert_eq!(out.string(4).unwrap(), "plain");
    }

    #[test]
    fn tab_list_builds_offline_entries() {
        let mut session = play_session();
        let out = dispatch(
            &mut session,
            Direction::ServerToClient,
            PacketData::new(
                0x38,
                vec![
                    FieldValue::String("\u{a7}6Steve".to_owned()),
                    FieldValue::Bool(true),
                    FieldValue::Short(0),
                ],
            ),
        );
        match out.field(0).unwrap() {
            FieldValue::TabListEntry(entry) => {
                assert_eq!(entry.entries[0].profile.name, "Steve");
                assert_eq!(
                    entry.entries[0].profile.uuid,
                    GameProfile::offline("Steve").uuid
                );
            }
            other => panic!("unexpected field {other:?}"),
        }

        // Blank name: nothing to show, nothing forwarded.
        let out = dispatch(
            &mut session,
            Direction::ServerToClient,
            PacketData::new(
                0x38,
                vec![
                    FieldValue::String(String::new()),
                    FieldValue::Bool(true),
                    FieldValue::Short(0),
                ],
            ),
        );
        assert!(out.is_suppressed());
    }

    #[test]
    fn attribute_and_payload_packets_are_suppressed() {
        let mut session = play_session();
        for opcode in [0x20, 0x26, 0x3F] {
            let out = dispatch(
                &mut session,
                Direction::ServerToClient,
                PacketData::new(opcode, vec![FieldValue::RemainingBytes(vec![1, 2, 3])]),
            );
            assert!(out.is_suppressed(), "opcode {opcode:#x}");
        }
    }

    #[test]
    fn digging_finish_is_withheld_for_divergent_blocks() {
        let mut session = play_session();
        session.store.mining = Some(MiningTracker::default());
        let mut blocks = BlockStorage::new();
        blocks.set_block_at(10, 64, 10, 20); // glass
        blocks.set_block_at(11, 64, 10, 1); // stone
        session.store.blocks = Some(blocks);

        let dig = |x: i32, action: u8| {
            PacketData::new(
                0x07,
                vec![
                    FieldValue::UnsignedByte(action),
                    FieldValue::Position(BlockLocation::new(x, 64, 10)),
                    FieldValue::Byte(1),
                ],
            )
        };

        let out = dispatch(&mut session, Direction::ClientToServer, dig(10, 0));
        assert_eq!(out.int(1).unwrap(), 10);
        assert_eq!(out.unsigned_byte(2).unwrap(), 64);

        let out = dispatch(&mut session, Direction::ClientToServer, dig(10, 2));
        assert!(out.is_suppressed());

        // Stone breaks in sync on both sides, so finish is forwarded.
        dispatch(&mut session, Direction::ClientToServer, dig(11, 0));
        let out = dispatch(&mut session, Direction::ClientToServer, dig(11, 2));
        assert_eq!(out.opcode, 0x07);
    }

    #[test]
    fn digging_without_trackers_unpacks_and_forwards() {
        let mut session = play_session();
        let packet = PacketData::new(
            0x07,
            vec![
                FieldValue::UnsignedByte(2),
                FieldValue::Position(BlockLocation::new(-5, 70, 8)),
                FieldValue::Byte(4),
            ],
        );
        let out = dispatch(&mut session, Direction::ClientToServer, packet);
        assert_eq!(out.int(1).unwrap(), -5);
        assert_eq!(out.unsigned_byte(4).unwrap(), 4);
    }

    #[test]
    fn steer_vehicle_splits_the_flag_byte() {
        let mut session = play_session();
        let out = dispatch(
            &mut session,
            Direction::ClientToServer,
            PacketData::new(
                0x0C,
                vec![
                    FieldValue::Float(0.0),
                    FieldValue::Float(1.0),
                    FieldValue::Byte(3),
                ],
            ),
        );
        assert!(out.boolean(2).unwrap());
        assert!(out.boolean(3).unwrap());
    }
}
