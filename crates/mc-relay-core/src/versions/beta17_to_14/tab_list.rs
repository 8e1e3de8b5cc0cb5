//! Tab-list synthesis for the beta bridge.
//!
//! Beta 1.7.3 servers never send player-list packets; the bridge fills
//! the 1.8.1 client's tab from named-entity spawns and destroys.

use mc_relay_proto::{Direction, FieldValue, PacketData, ProtocolState};

use crate::dispatch::TranslatorTable;
use crate::session::Session;
use crate::trackers::TabListCache;

/// Longest name the 0xC9 packet displays.
const MAX_NAME_LEN: usize = 16;

pub(super) fn group() -> TranslatorTable {
    let mut table = TranslatorTable::new();

    // named entity spawn
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x14,
        |session: &mut Session, packet: PacketData| {
            let entity_id = packet.int(0)?;
            let username = packet.string(1)?.to_owned();
            if let Some(cache) = session.store.tab_list.as_mut() {
                cache.insert(entity_id, username.clone());
                session.send_packet(Direction::ServerToClient, entry_packet(&username, true));
            }
            Ok(packet)
        },
    );

    // entity destroy
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x1D,
        |session: &mut Session, packet: PacketData| {
            let entity_id = packet.int(0)?;
            if let Some(username) = session
                .store
                .tab_list
                .as_mut()
                .and_then(|cache| cache.remove(entity_id))
            {
                session.send_packet(Direction::ServerToClient, entry_packet(&username, false));
            }
            Ok(packet)
        },
    );

    table
}

/// Build one 0xC9 player-list row.
pub(super) fn entry_packet(username: &str, online: bool) -> PacketData {
    let name: String = username.chars().take(MAX_NAME_LEN).collect();
    PacketData::new(
        0xC9,
        vec![
            FieldValue::String(name),
            FieldValue::Byte(online as i8),
            FieldValue::Short(0),
        ],
    )
}

/// Seed the cache and announce the connecting player's own row.
pub(super) fn init_own_entry(session: &mut Session) {
    session.store.tab_list = Some(TabListCache::default());
    if let Some(username) = session.username.clone() {
        let colored = format!("\u{a7}6{username}");
        session.send_packet(Direction::ServerToClient, entry_packet(&colored, true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_relay_proto::ProtocolVersion;

    fn session_with_cache() -> Session {
        let mut session = Session::new(ProtocolVersion::B1_8_1, ProtocolVersion::B1_7_3);
        session.store.tab_list = Some(TabListCache::default());
        session
    }

    fn spawn_packet(entity_id: i32, name: &str) -> PacketData {
        PacketData::new(
            0x14,
            vec![
                FieldValue::Int(entity_id),
                FieldValue::String(name.to_owned()),
                FieldValue::Int(0),
                FieldValue::Int(64),
                FieldValue::Int(0),
                FieldValue::Byte(0),
                FieldValue::Byte(0),
                FieldValue::Short(0),
            ],
        )
    }

    #[test]
    fn spawn_adds_a_row_and_caches_the_name() {
        let mut session = session_with_cache();
        let table = group();
        table
            .dispatch(&mut session, Direction::ServerToClient, spawn_packet(7, "Steve"))
            .unwrap();

        assert!(session.store.tab_list.as_ref().unwrap().contains(7));
        let queued = session.drain_outgoing();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].1.opcode, 0xC9);
        assert_eq!(queued[0].1.string(0).unwrap(), "Steve");
        assert_eq!(queued[0].1.byte(1).unwrap(), 1);
    }

    #[test]
    fn destroy_emits_exactly_one_removal_and_evicts() {
        let mut session = session_with_cache();
        let table = group();
        table
            .dispatch(&mut session, Direction::ServerToClient, spawn_packet(7, "Steve"))
            .unwrap();
        session.drain_outgoing();

        let destroy = PacketData::new(0x1D, vec![FieldValue::Int(7)]);
        table
            .dispatch(&mut session, Direction::ServerToClient, destroy.clone())
            .unwrap();

        let queued = session.drain_outgoing();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].1.string(0).unwrap(), "Steve");
        assert_eq!(queued[0].1.byte(1).unwrap(), 0);
        assert!(session.store.tab_list.as_ref().unwrap().is_empty());

        // Unknown entity: no synthesized packet.
        table
            .dispatch(&mut session, Direction::ServerToClient, destroy)
            .unwrap();
        assert!(session.drain_outgoing().is_empty());
    }

    #[test]
    fn names_are_capped_to_the_row_limit() {
        let packet = entry_packet("AVeryLongPlayerNameIndeed", true);
        assert_eq!(packet.string(0).unwrap().chars().count(), MAX_NAME_LEN);
    }
}
