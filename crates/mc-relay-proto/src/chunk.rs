//! Chunk column wire formats and nibble-plane addressing.
//!
//! Two on-wire shapes exist:
//! - [`BetaChunk`]: the beta 0x33 column, one zlib blob holding block
//!   bytes followed by three 4-bit planes (metadata, block light, sky
//!   light), addressed `x<<11 | z<<7 | y`.
//! - [`ChunkColumn`]: the 1.7/1.8 0x21 column of 16-block-high sections.
//!   1.7 sends separate block/metadata arrays inside a zlib blob; 1.8
//!   sends uncompressed u16 little-endian `id<<4 | meta` cells.

use std::io::{Read, Write};

use bytes::{Buf, BufMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::ProtoError;
use crate::types::{ensure, VarInt};

/// Cells in a full beta column (16 x 128 x 16).
pub const BETA_COLUMN_CELLS: usize = 16 * 128 * 16;
/// Bytes in a decompressed full beta column: blocks + 3 nibble planes.
pub const BETA_COLUMN_BYTES: usize = BETA_COLUMN_CELLS + 3 * (BETA_COLUMN_CELLS / 2);
/// Offset of the block metadata nibble plane.
pub const BETA_META_OFFSET: usize = BETA_COLUMN_CELLS;
/// Offset of the block light nibble plane.
pub const BETA_BLOCK_LIGHT_OFFSET: usize = BETA_COLUMN_CELLS + BETA_COLUMN_CELLS / 2;
/// Offset of the sky light nibble plane.
pub const BETA_SKY_LIGHT_OFFSET: usize = BETA_COLUMN_CELLS * 2;

/// Linear cell index within a full beta column.
pub fn beta_block_index(x: i32, y: i32, z: i32) -> usize {
    (x << 11 | z << 7 | y) as usize
}

/// Write a 4-bit value into a nibble plane at `plane_offset`, leaving the
/// other nibble of the shared byte untouched. Even linear indices select
/// the low nibble.
pub fn set_nibble(data: &mut [u8], x: i32, y: i32, z: i32, value: u8, plane_offset: usize) {
    let linear = x << 11 | z << 7 | y;
    let index = plane_offset + (linear >> 1) as usize;
    if index >= data.len() {
        return;
    }
    if linear & 1 == 0 {
        data[index] = data[index] & 0xF0 | value & 0x0F;
    } else {
        data[index] = data[index] & 0x0F | (value & 0x0F) << 4;
    }
}

/// Read a 4-bit value from a nibble plane.
pub fn get_nibble(data: &[u8], x: i32, y: i32, z: i32, plane_offset: usize) -> u8 {
    let linear = x << 11 | z << 7 | y;
    let index = plane_offset + (linear >> 1) as usize;
    let byte = data.get(index).copied().unwrap_or(0);
    if linear & 1 == 0 {
        byte & 0x0F
    } else {
        byte >> 4
    }
}

/// A beta 0x33 map-chunk payload. `x`/`y`/`z` are absolute block
/// coordinates of the cuboid origin; sizes are the cuboid extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetaChunk {
    pub x: i32,
    pub y: i16,
    pub z: i32,
    /// Cuboid extents, 1..=256. The wire stores each as extent minus one
    /// in a single byte, so 256 is representable but 0 is not.
    pub x_size: u16,
    pub y_size: u16,
    pub z_size: u16,
    /// Decompressed payload bytes.
    pub data: Vec<u8>,
}

impl BetaChunk {
    /// Whether this update covers a whole 16x128x16 column. Only full
    /// columns can be transcoded; partial cuboids pass through untouched.
    pub fn is_full_column(&self) -> bool {
        self.x_size as usize * self.y_size as usize * self.z_size as usize == BETA_COLUMN_CELLS
    }

    pub(crate) fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 17)?;
        let x = buf.get_i32();
        let y = buf.get_i16();
        let z = buf.get_i32();
        let x_size = buf.get_u8() as u16 + 1;
        let y_size = buf.get_u8() as u16 + 1;
        let z_size = buf.get_u8() as u16 + 1;
        let compressed_len = buf.get_i32();
        if compressed_len < 0 {
            return Err(ProtoError::NegativeLength(compressed_len));
        }
        ensure(buf, compressed_len as usize)?;
        let compressed = buf.copy_to_bytes(compressed_len as usize);
        let mut data = Vec::new();
        ZlibDecoder::new(&compressed[..])
            .read_to_end(&mut data)
            .map_err(|e| ProtoError::Decompress(e.to_string()))?;

        let expected = x_size as usize * y_size as usize * z_size as usize * 5 / 2;
        if data.len() < expected {
            return Err(ProtoError::BadChunkSize {
                len: data.len(),
                expected,
            });
        }

        Ok(Self {
            x,
            y,
            z,
            x_size,
            y_size,
            z_size,
            data,
        })
    }

    pub(crate) fn encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_i32(self.x);
        buf.put_i16(self.y);
        buf.put_i32(self.z);
        buf.put_u8(self.x_size.saturating_sub(1) as u8);
        buf.put_u8(self.y_size.saturating_sub(1) as u8);
        buf.put_u8(self.z_size.saturating_sub(1) as u8);

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        let compressed = encoder
            .write_all(&self.data)
            .and_then(|_| encoder.finish())
            .map_err(|e| ProtoError::Compress(e.to_string()))?;
        buf.put_i32(compressed.len() as i32);
        buf.put_slice(&compressed);
        Ok(())
    }
}

/// One 16x16x16 section of a modern chunk column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSection {
    /// Block ids, indexed `(y<<8) | (z<<4) | x`.
    pub blocks: Box<[u8; 4096]>,
    /// Block metadata nibbles, same index order.
    pub meta: Box<[u8; 2048]>,
    pub block_light: Box<[u8; 2048]>,
    pub sky_light: Option<Box<[u8; 2048]>>,
}

impl ChunkSection {
    pub fn empty(with_sky_light: bool) -> Self {
        Self {
            blocks: Box::new([0; 4096]),
            meta: Box::new([0; 2048]),
            block_light: Box::new([0; 2048]),
            sky_light: with_sky_light.then(|| Box::new([0; 2048])),
        }
    }

    /// Block id at section-local coordinates.
    pub fn block_at(&self, x: usize, y: usize, z: usize) -> u8 {
        self.blocks[y << 8 | z << 4 | x]
    }

    /// Metadata nibble at section-local coordinates.
    pub fn meta_at(&self, x: usize, y: usize, z: usize) -> u8 {
        let linear = y << 8 | z << 4 | x;
        let byte = self.meta[linear >> 1];
        if linear & 1 == 0 {
            byte & 0x0F
        } else {
            byte >> 4
        }
    }
}

/// A 1.7/1.8 chunk-data column (opcode 0x21).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkColumn {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub ground_up: bool,
    pub primary_bitmask: u16,
    /// 16 section slots, bottom to top; `None` where the bitmask is clear.
    pub sections: Vec<Option<ChunkSection>>,
    pub biomes: Option<Box<[u8; 256]>>,
}

impl ChunkColumn {
    pub fn section_count(&self) -> usize {
        self.primary_bitmask.count_ones() as usize
    }

    pub(crate) fn decode_v1_7(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 17)?;
        let chunk_x = buf.get_i32();
        let chunk_z = buf.get_i32();
        let ground_up = buf.get_u8() != 0;
        let primary_bitmask = buf.get_u16();
        let _add_bitmask = buf.get_u16();
        let compressed_len = buf.get_i32();
        if compressed_len < 0 {
            return Err(ProtoError::NegativeLength(compressed_len));
        }
        ensure(buf, compressed_len as usize)?;
        let compressed = buf.copy_to_bytes(compressed_len as usize);
        let mut data = Vec::new();
        ZlibDecoder::new(&compressed[..])
            .read_to_end(&mut data)
            .map_err(|e| ProtoError::Decompress(e.to_string()))?;

        let count = primary_bitmask.count_ones() as usize;
        let base = count * (4096 + 2048 + 2048);
        let biome_len = if ground_up { 256 } else { 0 };
        let with_sky = data.len() >= base + count * 2048 + biome_len;
        let expected = base + if with_sky { count * 2048 } else { 0 } + biome_len;
        if data.len() < expected {
            return Err(ProtoError::BadChunkSize {
                len: data.len(),
                expected,
            });
        }

        let mut sections: Vec<Option<ChunkSection>> =
            (0..16).map(|_| None).collect();
        for i in 0..16 {
            if primary_bitmask & (1 << i) != 0 {
                sections[i] = Some(ChunkSection::empty(with_sky));
            }
        }

        let mut offset = 0;
        for section in sections.iter_mut().flatten() {
            section.blocks.copy_from_slice(&data[offset..offset + 4096]);
            offset += 4096;
        }
        for section in sections.iter_mut().flatten() {
            section.meta.copy_from_slice(&data[offset..offset + 2048]);
            offset += 2048;
        }
        for section in sections.iter_mut().flatten() {
            section
                .block_light
                .copy_from_slice(&data[offset..offset + 2048]);
            offset += 2048;
        }
        if with_sky {
            for section in sections.iter_mut().flatten() {
                if let Some(sky) = section.sky_light.as_mut() {
                    sky.copy_from_slice(&data[offset..offset + 2048]);
                }
                offset += 2048;
            }
        }
        let biomes = if ground_up {
            let mut biomes = Box::new([0u8; 256]);
            biomes.copy_from_slice(&data[offset..offset + 256]);
            Some(biomes)
        } else {
            None
        };

        Ok(Self {
            chunk_x,
            chunk_z,
            ground_up,
            primary_bitmask,
            sections,
            biomes,
        })
    }

    pub(crate) fn encode_v1_7(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        let mut data = Vec::new();
        for section in self.sections.iter().flatten() {
            data.extend_from_slice(&section.blocks[..]);
        }
        for section in self.sections.iter().flatten() {
            data.extend_from_slice(&section.meta[..]);
        }
        for section in self.sections.iter().flatten() {
            data.extend_from_slice(&section.block_light[..]);
        }
        for section in self.sections.iter().flatten() {
            if let Some(sky) = &section.sky_light {
                data.extend_from_slice(&sky[..]);
            }
        }
        if let Some(biomes) = &self.biomes {
            data.extend_from_slice(&biomes[..]);
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        let compressed = encoder
            .write_all(&data)
            .and_then(|_| encoder.finish())
            .map_err(|e| ProtoError::Compress(e.to_string()))?;

        buf.put_i32(self.chunk_x);
        buf.put_i32(self.chunk_z);
        buf.put_u8(self.ground_up as u8);
        buf.put_u16(self.primary_bitmask);
        buf.put_u16(0); // add bitmask: extended block ids are not carried
        buf.put_i32(compressed.len() as i32);
        buf.put_slice(&compressed);
        Ok(())
    }

    pub(crate) fn decode_v1_8(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 11)?;
        let chunk_x = buf.get_i32();
        let chunk_z = buf.get_i32();
        let ground_up = buf.get_u8() != 0;
        let primary_bitmask = buf.get_u16();
        let len = VarInt::decode(buf)?.0;
        if len < 0 {
            return Err(ProtoError::NegativeLength(len));
        }
        ensure(buf, len as usize)?;
        let data = buf.copy_to_bytes(len as usize);
        let data = &data[..];

        let count = primary_bitmask.count_ones() as usize;
        let base = count * (4096 * 2 + 2048);
        let biome_len = if ground_up { 256 } else { 0 };
        let with_sky = data.len() >= base + count * 2048 + biome_len;
        let expected = base + if with_sky { count * 2048 } else { 0 } + biome_len;
        if data.len() < expected {
            return Err(ProtoError::BadChunkSize {
                len: data.len(),
                expected,
            });
        }

        let mut sections: Vec<Option<ChunkSection>> =
            (0..16).map(|_| None).collect();
        let mut offset = 0;
        for (i, slot) in sections.iter_mut().enumerate() {
            if primary_bitmask & (1 << i) == 0 {
                continue;
            }
            let mut section = ChunkSection::empty(with_sky);
            for cell in 0..4096 {
                let raw =
                    u16::from_le_bytes([data[offset + cell * 2], data[offset + cell * 2 + 1]]);
                section.blocks[cell] = (raw >> 4) as u8;
                let meta = (raw & 0x0F) as u8;
                if cell & 1 == 0 {
                    section.meta[cell >> 1] |= meta;
                } else {
                    section.meta[cell >> 1] |= meta << 4;
                }
            }
            offset += 4096 * 2;
            *slot = Some(section);
        }
        for section in sections.iter_mut().flatten() {
            section
                .block_light
                .copy_from_slice(&data[offset..offset + 2048]);
            offset += 2048;
        }
        if with_sky {
            for section in sections.iter_mut().flatten() {
                if let Some(sky) = section.sky_light.as_mut() {
                    sky.copy_from_slice(&data[offset..offset + 2048]);
                }
                offset += 2048;
            }
        }
        let biomes = if ground_up {
            let mut biomes = Box::new([0u8; 256]);
            biomes.copy_from_slice(&data[offset..offset + 256]);
            Some(biomes)
        } else {
            None
        };

        Ok(Self {
            chunk_x,
            chunk_z,
            ground_up,
            primary_bitmask,
            sections,
            biomes,
        })
    }

    pub(crate) fn encode_v1_8(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        let mut data = Vec::new();
        // Merge block bytes and metadata nibbles into u16 cells.
        for section in self.sections.iter().flatten() {
            for cell in 0..4096 {
                let meta = if cell & 1 == 0 {
                    section.meta[cell >> 1] & 0x0F
                } else {
                    section.meta[cell >> 1] >> 4
                };
                let raw = (section.blocks[cell] as u16) << 4 | meta as u16;
                data.extend_from_slice(&raw.to_le_bytes());
            }
        }
        for section in self.sections.iter().flatten() {
            data.extend_from_slice(&section.block_light[..]);
        }
        for section in self.sections.iter().flatten() {
            if let Some(sky) = &section.sky_light {
                data.extend_from_slice(&sky[..]);
            }
        }
        if let Some(biomes) = &self.biomes {
            data.extend_from_slice(&biomes[..]);
        }

        buf.put_i32(self.chunk_x);
        buf.put_i32(self.chunk_z);
        buf.put_u8(self.ground_up as u8);
        buf.put_u16(self.primary_bitmask);
        VarInt(data.len() as i32).encode(buf);
        buf.put_slice(&data);
        Ok(())
    }
}
