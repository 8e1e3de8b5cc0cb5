//! Item stacks and their era-specific slot formats.
//!
//! Absence of an item is `None`, never an id-0 stack: the wire encodes an
//! empty slot as id -1, and id 0 is a valid (if unusual) stack.

use std::io::{Read, Write};

use bytes::{Buf, BufMut};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::ProtoError;
use crate::types::{ensure, ProtocolEra};

/// One item stack. `nbt` holds the uncompressed, unnamed-root NBT blob
/// exactly as the 1.8 slot format carries it; the 1.7 codec gzips it on
/// the way out and gunzips it on the way in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    pub id: i16,
    pub count: u8,
    pub damage: i16,
    pub nbt: Option<Vec<u8>>,
}

impl ItemStack {
    pub fn new(id: i16, count: u8, damage: i16, nbt: Option<Vec<u8>>) -> Self {
        Self {
            id,
            count,
            damage,
            nbt,
        }
    }
}

/// Decode one slot. `None` means the slot is empty.
pub fn decode_item(era: ProtocolEra, buf: &mut impl Buf) -> Result<Option<ItemStack>, ProtoError> {
    ensure(buf, 2)?;
    let id = buf.get_i16();
    if id < 0 {
        return Ok(None);
    }
    ensure(buf, 3)?;
    let count = buf.get_u8();
    let damage = buf.get_i16();

    let nbt = match era {
        // Beta slots carry no extra data.
        ProtocolEra::Beta => None,
        ProtocolEra::V1_7 => {
            ensure(buf, 2)?;
            let len = buf.get_i16();
            if len < 0 {
                None
            } else {
                ensure(buf, len as usize)?;
                let compressed = buf.copy_to_bytes(len as usize);
                let mut raw = Vec::new();
                GzDecoder::new(&compressed[..])
                    .read_to_end(&mut raw)
                    .map_err(|e| ProtoError::Decompress(e.to_string()))?;
                Some(raw)
            }
        }
        ProtocolEra::V1_8 => {
            ensure(buf, 1)?;
            let chunk = buf.chunk();
            if chunk[0] == 0 {
                buf.advance(1);
                None
            } else {
                // The blob carries no length prefix; walk the tag tree to
                // find where it ends.
                let len = named_tag_len(chunk)?;
                ensure(buf, len)?;
                Some(buf.copy_to_bytes(len).to_vec())
            }
        }
    };

    Ok(Some(ItemStack::new(id, count, damage, nbt)))
}

/// Encode one slot.
pub fn encode_item(
    era: ProtocolEra,
    item: Option<&ItemStack>,
    buf: &mut impl BufMut,
) -> Result<(), ProtoError> {
    let item = match item {
        Some(item) => item,
        None => {
            buf.put_i16(-1);
            return Ok(());
        }
    };

    buf.put_i16(item.id);
    buf.put_u8(item.count);
    buf.put_i16(item.damage);

    match era {
        ProtocolEra::Beta => {}
        ProtocolEra::V1_7 => match &item.nbt {
            None => buf.put_i16(-1),
            Some(raw) => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder
                    .write_all(raw)
                    .and_then(|_| encoder.finish())
                    .map(|compressed| {
                        buf.put_i16(compressed.len() as i16);
                        buf.put_slice(&compressed);
                    })
                    .map_err(|e| ProtoError::Compress(e.to_string()))?;
            }
        },
        ProtocolEra::V1_8 => match &item.nbt {
            None => buf.put_u8(0),
            Some(raw) => buf.put_slice(raw),
        },
    }
    Ok(())
}

/// Deepest list/compound nesting the walker will follow.
const MAX_NBT_DEPTH: u32 = 512;

/// Byte length of one complete named NBT tag starting at `data[0]`.
fn named_tag_len(data: &[u8]) -> Result<usize, ProtoError> {
    named_tag_len_at(data, 0)
}

fn named_tag_len_at(data: &[u8], depth: u32) -> Result<usize, ProtoError> {
    if depth > MAX_NBT_DEPTH {
        return Err(ProtoError::MalformedNbt);
    }
    let ty = *data.first().ok_or(ProtoError::MalformedNbt)?;
    if ty == 0 {
        return Ok(1);
    }
    let name_len = read_u16(data, 1)? as usize;
    let payload_start = 3 + name_len;
    if data.len() < payload_start {
        return Err(ProtoError::MalformedNbt);
    }
    Ok(payload_start + payload_len(ty, &data[payload_start..], depth)?)
}

fn payload_len(ty: u8, data: &[u8], depth: u32) -> Result<usize, ProtoError> {
    if depth > MAX_NBT_DEPTH {
        return Err(ProtoError::MalformedNbt);
    }
    let len = match ty {
        1 => 1,
        2 => 2,
        3 | 5 => 4,
        4 | 6 => 8,
        7 => 4 + read_u32(data, 0)? as usize,
        8 => 2 + read_u16(data, 0)? as usize,
        9 => {
            let elem_ty = *data.first().ok_or(ProtoError::MalformedNbt)?;
            let count = read_u32(data, 1)? as usize;
            let mut offset = 5;
            for _ in 0..count {
                if data.len() < offset {
                    return Err(ProtoError::MalformedNbt);
                }
                offset += payload_len(elem_ty, &data[offset..], depth + 1)?;
            }
            offset
        }
        10 => {
            let mut offset = 0;
            loop {
                if data.len() < offset {
                    return Err(ProtoError::MalformedNbt);
                }
                let entry = named_tag_len_at(&data[offset..], depth + 1)?;
                offset += entry;
                if entry == 1 {
                    break offset; // TAG_End
                }
            }
        }
        11 => 4 + read_u32(data, 0)? as usize * 4,
        12 => 4 + read_u32(data, 0)? as usize * 8,
        _ => return Err(ProtoError::MalformedNbt),
    };
    if data.len() < len {
        return Err(ProtoError::MalformedNbt);
    }
    Ok(len)
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, ProtoError> {
    let bytes = data
        .get(offset..offset + 2)
        .ok_or(ProtoError::MalformedNbt)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, ProtoError> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or(ProtoError::MalformedNbt)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
