//! World translators for the beta bridge: block change, chunk unload,
//! and the full-column scan that seeds the world cache and synthesizes
//! chest orientation.

use mc_relay_proto::chunk::{
    beta_block_index, set_nibble, BetaChunk, BETA_META_OFFSET, BETA_SKY_LIGHT_OFFSET,
};
use mc_relay_proto::{Direction, FieldValue, PacketData, ProtocolState};
use tracing::debug;

use super::rotation::{self, CHEST_ID};
use crate::dispatch::TranslatorTable;
use crate::session::Session;

pub(super) fn group() -> TranslatorTable {
    let mut table = TranslatorTable::new();

    // block change
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x35,
        |session: &mut Session, packet: PacketData| {
            let x = packet.int(0)?;
            let y = packet.byte(1)? as i32;
            let z = packet.int(2)?;
            let block_id = packet.byte(3)? as u8;
            let mut meta = packet.byte(4)?;

            if let Some(blocks) = session.store.blocks.as_mut() {
                blocks.set_block_at(x, y, z, block_id);
                if block_id == CHEST_ID {
                    meta = rotation::chest_facing(blocks, x, y, z) as i8;
                }
            }

            Ok(PacketData::new(
                0x35,
                vec![
                    packet.field_owned(0)?,
                    packet.field_owned(1)?,
                    packet.field_owned(2)?,
                    packet.field_owned(3)?,
                    FieldValue::Byte(meta),
                ],
            ))
        },
    );

    // pre-chunk unload
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x32,
        |session: &mut Session, packet: PacketData| {
            if !packet.boolean(2)? {
                let chunk_x = packet.int(0)?;
                let chunk_z = packet.int(1)?;
                if let Some(blocks) = session.store.blocks.as_mut() {
                    blocks.remove_chunk(chunk_x, chunk_z);
                }
            }
            Ok(packet)
        },
    );

    // chunk data
    table.register(
        ProtocolState::Play,
        Direction::ServerToClient,
        0x33,
        |session: &mut Session, packet: PacketData| {
            let chunk = transcode_column(session, packet.beta_chunk(0)?.clone());
            Ok(PacketData::new(0x33, vec![FieldValue::BetaChunk(chunk)]))
        },
    );

    table
}

/// Scan one full column into the world cache, then rotate every chest it
/// contains by rewriting the metadata nibble (and lighting it fully so
/// the synthesized facing is visible). Partial cuboids pass through.
fn transcode_column(session: &mut Session, mut chunk: BetaChunk) -> BetaChunk {
    if !chunk.is_full_column() {
        debug!(
            x = chunk.x,
            z = chunk.z,
            "partial chunk update passed through untranscoded"
        );
        return chunk;
    }
    let Some(blocks) = session.store.blocks.as_mut() else {
        return chunk;
    };

    let mut chests = Vec::new();
    for x in 0..16 {
        for y in 0..128 {
            for z in 0..16 {
                let Some(&block_id) = chunk.data.get(beta_block_index(x, y, z)) else {
                    // Malformed column data: skip the cell, keep the rest.
                    continue;
                };
                if rotation::is_solid(block_id) {
                    if block_id == CHEST_ID {
                        chests.push((x, y, z));
                    }
                    blocks.set_block_at(chunk.x + x, chunk.y as i32 + y, chunk.z + z, block_id);
                }
            }
        }
    }

    for (x, y, z) in chests {
        let facing = rotation::chest_facing(blocks, chunk.x + x, chunk.y as i32 + y, chunk.z + z);
        set_nibble(&mut chunk.data, x, y, z, facing, BETA_META_OFFSET);
        set_nibble(&mut chunk.data, x, y, z, 15, BETA_SKY_LIGHT_OFFSET);
    }
    chunk
}
