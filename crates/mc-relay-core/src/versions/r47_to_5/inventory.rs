//! Window and slot translators.
//!
//! 1.8 opens windows by a namespaced type name instead of a numeric id,
//! and its enchanting table grew a lapis slot at index 1, which shifts
//! every later slot by one in both directions.

use mc_relay_proto::item::ItemStack;
use mc_relay_proto::{Direction, FieldValue, PacketData, ProtocolState};
use serde_json::json;

use super::items;
use crate::dispatch::TranslatorTable;
use crate::session::Session;
use crate::trackers::QuickBarTracker;

const ENCHANTING_TABLE: u8 = 4;

/// Numeric window type to the 1.8 name.
fn window_type_name(window_type: u8) -> &'static str {
    match window_type {
        1 => "minecraft:crafting_table",
        2 => "minecraft:furnace",
        3 => "minecraft:dispenser",
        4 => "minecraft:enchanting_table",
        5 => "minecraft:brewing_stand",
        6 => "minecraft:villager",
        7 => "minecraft:beacon",
        8 => "minecraft:anvil",
        9 => "minecraft:hopper",
        10 => "minecraft:dropper",
        11 => "EntityHorse",
        _ => "minecraft:container",
    }
}

/// Windows whose slot count must be sent as zero in 1.8.
fn is_non_storage(window_type: u8) -> bool {
    matches!(window_type, 1 | 4 | 7 | 8)
}

/// 1.8 requires the title to be a chat component.
fn title_component(title: &str) -> String {
    json!({ "translate": title }).to_string()
}

fn record_quick_bar(session: &mut Session, slot: i16, item: Option<&ItemStack>) {
    if let Some(quick_bar) = session.store.quick_bar.as_mut() {
        if (QuickBarTracker::FIRST_SLOT..=QuickBarTracker::LAST_SLOT).contains(&slot) {
            quick_bar.add_item(slot, item.map(|i| i.id).unwrap_or(0));
        }
    }
}

fn window_type_of(session: &Session, window_id: i16) -> u8 {
    session
        .store
        .window_types
        .as_ref()
        .map(|tracker| tracker.window_type(window_id))
        .unwrap_or(0)
}

pub(super) fn group() -> TranslatorTable {
    let mut table = TranslatorTable::new();

    // open window
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x2D,
        |session: &mut Session, packet: PacketData| {
            let window_id = packet.unsigned_byte(0)?;
            let window_type = packet.unsigned_byte(1)?;
            let title = packet.string(2)?.to_owned();
            let slots = packet.unsigned_byte(3)?;
            let slots = if is_non_storage(window_type) { 0 } else { slots };

            if let Some(tracker) = session.store.window_types.as_mut() {
                tracker.set_window_type(window_id as i16, window_type);
            }

            Ok(PacketData::new(
                0x2D,
                vec![
                    packet.field_owned(0)?,
                    FieldValue::String(window_type_name(window_type).to_owned()),
                    FieldValue::String(title_component(&title)),
                    FieldValue::UnsignedByte(slots),
                ],
            ))
        },
    );

    // set slot
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x2F,
        |session: &mut Session, packet: PacketData| {
            let window_id = packet.unsigned_byte(0)?;
            let mut slot = packet.short(1)?;
            let Some(item) = packet.item(2)? else {
                return Ok(packet);
            };

            let item = items::remap_item(item.clone());
            if window_type_of(session, window_id as i16) == ENCHANTING_TABLE && slot >= 1 {
                slot += 1;
            }
            record_quick_bar(session, slot, Some(&item));

            Ok(PacketData::new(
                0x2F,
                vec![
                    packet.field_owned(0)?,
                    FieldValue::Short(slot),
                    FieldValue::Item(Some(item)),
                ],
            ))
        },
    );

    // window items
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x30,
        |session: &mut Session, packet: PacketData| {
            let window_id = packet.unsigned_byte(0)?;
            let original = packet.item_array(1)?;

            let mut items: Vec<Option<ItemStack>> =
                if window_type_of(session, window_id as i16) == ENCHANTING_TABLE
                    && !original.is_empty()
                {
                    // Shift past the lapis slot 1.8 added at index 1.
                    let mut shifted = vec![None; original.len() + 1];
                    shifted[0] = original[0].clone();
                    shifted[1] = Some(ItemStack::new(351, 3, 4, None));
                    for (i, item) in original.iter().skip(1).enumerate() {
                        shifted[i + 2] = item.clone();
                    }
                    shifted
                } else {
                    original.to_vec()
                };

            for (i, entry) in items.iter_mut().enumerate() {
                if let Some(item) = entry.take() {
                    *entry = Some(items::remap_item(item));
                }
                record_quick_bar(session, i as i16, entry.as_ref());
            }

            Ok(PacketData::new(
                0x30,
                vec![packet.field_owned(0)?, FieldValue::ItemArray(items)],
            ))
        },
    );

    // window click
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x0E,
        |session: &mut Session, packet: PacketData| {
            let window_id = packet.byte(0)?;
            let mut slot = packet.short(1)?;
            if window_type_of(session, window_id as i16) == ENCHANTING_TABLE && slot > 1 {
                slot -= 1;
            }
            Ok(PacketData::new(
                0x0E,
                vec![
                    packet.field_owned(0)?,
                    FieldValue::Short(slot),
                    packet.field_owned(2)?,
                    packet.field_owned(3)?,
                    packet.field_owned(4)?,
                    packet.field_owned(5)?,
                ],
            ))
        },
    );

    // creative slot set
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x10,
        |_: &mut Session, packet: PacketData| {
            let item = packet.item(1)?.cloned().map(|mut item| {
                if !items::is_creative_item(item.id) {
                    // The 1.7 server would kick on an unknown id.
                    item.id = 1;
                    item.damage = 0;
                }
                item
            });
            Ok(PacketData::new(
                0x10,
                vec![packet.field_owned(0)?, FieldValue::Item(item)],
            ))
        },
    );

    // held item change
    table.register(
        ProtocolState::Play,
        Direction::ClientToServer,
        0x09,
        |session: &mut Session, packet: PacketData| {
            if let Some(quick_bar) = session.store.quick_bar.as_mut() {
                quick_bar.set_current_hot_bar_slot(packet.short(0)?);
            }
            Ok(packet)
        },
    );

    table
}
