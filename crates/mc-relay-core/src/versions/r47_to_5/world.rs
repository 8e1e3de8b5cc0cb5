//! Chunk and block translators.
//!
//! The column payload itself is recoded by the field codec; the chunk
//! translator's own job is to mirror block ids into the world cache
//! (when a downstream bridge installed one) and to evict on the
//! empty-column unload form.

use mc_relay_proto::{BlockLocation, Direction, FieldValue, PacketData, ProtocolState};

use crate::dispatch::TranslatorTable;
use crate::session::Session;

pub(super) fn group() -> TranslatorTable {
    let mut table = TranslatorTable::new();

    // chunk data
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x21,
        |session: &mut Session, packet: PacketData| {
            let column = packet.chunk_column(0)?;
            let Some(blocks) = session.store.blocks.as_mut() else {
                return Ok(packet);
            };

            // A ground-up column with no sections unloads the chunk.
            if column.ground_up && column.primary_bitmask == 0 {
                blocks.remove_chunk(column.chunk_x, column.chunk_z);
                return Ok(packet);
            }

            let base_x = column.chunk_x << 4;
            let base_z = column.chunk_z << 4;
            for (section_index, section) in column.sections.iter().enumerate() {
                let Some(section) = section else { continue };
                let base_y = (section_index << 4) as i32;
                for y in 0..16 {
                    for z in 0..16 {
                        for x in 0..16 {
                            let id = section.block_at(x, y, z);
                            if id != 0 {
                                blocks.set_block_at(
                                    base_x + x as i32,
                                    base_y + y as i32,
                                    base_z + z as i32,
                                    id,
                                );
                            }
                        }
                    }
                }
            }
            Ok(packet)
        },
    );

    // multi block change: raw 1.7 records become explicit 1.8 records
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x22,
        |_: &mut Session, packet: PacketData| {
            let records = packet.multi_block_raw(2)?.records()?;
            Ok(PacketData::new(
                0x22,
                vec![
                    packet.field_owned(0)?,
                    packet.field_owned(1)?,
                    FieldValue::BlockChangeRecords(records),
                ],
            ))
        },
    );

    // block change
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x23,
        |_: &mut Session, packet: PacketData| {
            let location = BlockLocation::new(
                packet.int(0)?,
                packet.unsigned_byte(1)? as i32,
                packet.int(2)?,
            );
            let state = packet.var_int(3)? << 4 | (packet.unsigned_byte(4)? as i32 & 15);
            Ok(PacketData::new(
                0x23,
                vec![
                    FieldValue::Position(location),
                    FieldValue::VarInt(state),
                ],
            ))
        },
    );

    table
}
