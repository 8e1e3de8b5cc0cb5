//! The typed field codec: every wire type a packet field can take, and
//! era-keyed decode/encode for each.
//!
//! Decoding and encoding are symmetric for every tag under the same era.
//! VarInts are the one exception: only the numeric value round-trips,
//! shortest-form encoding being canonical.

use bytes::{Buf, BufMut, BytesMut};

use crate::block_change::{
    decode_records_v1_8, encode_records_v1_8, BlockChangeRecord, MultiBlockRawBatch,
};
use crate::chunk::{BetaChunk, ChunkColumn};
use crate::error::ProtoError;
use crate::item::{decode_item, encode_item, ItemStack};
use crate::position::{BlockLocation, OptionalPosition};
use crate::tab_list::TabListEntry;
use crate::types::{ensure, ProtocolEra, VarInt};

/// Longest string any protocol era accepts, in characters.
pub const MAX_STRING_LENGTH: usize = 32767;

/// Wire type tags. Scalars are era-independent big-endian; composite tags
/// change shape with the era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    Long,
    Float,
    Double,
    Bool,
    VarInt,
    /// Era string: beta = UTF-16BE with char-count prefix, modern = UTF-8
    /// with VarInt byte-length prefix.
    String,
    /// Beta-only secondary string: i16 byte-length prefix + UTF-8.
    String8,
    Item,
    ItemArray,
    /// Block position: packed long in 1.8, three i32s before that.
    Position,
    BetaChunk,
    ChunkColumn,
    MultiBlockRaw,
    BlockChangeRecords,
    TabListEntry,
    OptionalPosition,
    /// The rest of the packet, opaque. Only valid as a final field, for
    /// packets forwarded or suppressed within a single era.
    RemainingBytes,
}

/// One decoded field: a type tag plus its value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Byte(i8),
    UnsignedByte(u8),
    Short(i16),
    UnsignedShort(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    VarInt(i32),
    String(String),
    String8(String),
    Item(Option<ItemStack>),
    ItemArray(Vec<Option<ItemStack>>),
    Position(BlockLocation),
    BetaChunk(BetaChunk),
    ChunkColumn(ChunkColumn),
    MultiBlockRaw(MultiBlockRawBatch),
    BlockChangeRecords(Vec<BlockChangeRecord>),
    TabListEntry(TabListEntry),
    OptionalPosition(OptionalPosition),
    RemainingBytes(Vec<u8>),
}

impl FieldValue {
    /// The tag this value travels under.
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::Byte(_) => TypeTag::Byte,
            Self::UnsignedByte(_) => TypeTag::UnsignedByte,
            Self::Short(_) => TypeTag::Short,
            Self::UnsignedShort(_) => TypeTag::UnsignedShort,
            Self::Int(_) => TypeTag::Int,
            Self::Long(_) => TypeTag::Long,
            Self::Float(_) => TypeTag::Float,
            Self::Double(_) => TypeTag::Double,
            Self::Bool(_) => TypeTag::Bool,
            Self::VarInt(_) => TypeTag::VarInt,
            Self::String(_) => TypeTag::String,
            Self::String8(_) => TypeTag::String8,
            Self::Item(_) => TypeTag::Item,
            Self::ItemArray(_) => TypeTag::ItemArray,
            Self::Position(_) => TypeTag::Position,
            Self::BetaChunk(_) => TypeTag::BetaChunk,
            Self::ChunkColumn(_) => TypeTag::ChunkColumn,
            Self::MultiBlockRaw(_) => TypeTag::MultiBlockRaw,
            Self::BlockChangeRecords(_) => TypeTag::BlockChangeRecords,
            Self::TabListEntry(_) => TypeTag::TabListEntry,
            Self::OptionalPosition(_) => TypeTag::OptionalPosition,
            Self::RemainingBytes(_) => TypeTag::RemainingBytes,
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self.tag() {
            TypeTag::Byte => "Byte",
            TypeTag::UnsignedByte => "UnsignedByte",
            TypeTag::Short => "Short",
            TypeTag::UnsignedShort => "UnsignedShort",
            TypeTag::Int => "Int",
            TypeTag::Long => "Long",
            TypeTag::Float => "Float",
            TypeTag::Double => "Double",
            TypeTag::Bool => "Bool",
            TypeTag::VarInt => "VarInt",
            TypeTag::String => "String",
            TypeTag::String8 => "String8",
            TypeTag::Item => "Item",
            TypeTag::ItemArray => "ItemArray",
            TypeTag::Position => "Position",
            TypeTag::BetaChunk => "BetaChunk",
            TypeTag::ChunkColumn => "ChunkColumn",
            TypeTag::MultiBlockRaw => "MultiBlockRaw",
            TypeTag::BlockChangeRecords => "BlockChangeRecords",
            TypeTag::TabListEntry => "TabListEntry",
            TypeTag::OptionalPosition => "OptionalPosition",
            TypeTag::RemainingBytes => "RemainingBytes",
        }
    }
}

/// Read an era string.
pub fn read_string(era: ProtocolEra, buf: &mut impl Buf) -> Result<String, ProtoError> {
    match era {
        ProtocolEra::Beta => {
            ensure(buf, 2)?;
            let chars = buf.get_i16();
            if chars < 0 {
                return Err(ProtoError::NegativeLength(chars as i32));
            }
            let chars = chars as usize;
            if chars > MAX_STRING_LENGTH {
                return Err(ProtoError::StringTooLong {
                    len: chars,
                    max: MAX_STRING_LENGTH,
                });
            }
            ensure(buf, chars * 2)?;
            let mut units = Vec::with_capacity(chars);
            for _ in 0..chars {
                units.push(buf.get_u16());
            }
            String::from_utf16(&units).map_err(|_| ProtoError::InvalidUtf16)
        }
        ProtocolEra::V1_7 | ProtocolEra::V1_8 => {
            let len = VarInt::decode(buf)?.0;
            if len < 0 {
                return Err(ProtoError::NegativeLength(len));
            }
            let len = len as usize;
            if len > MAX_STRING_LENGTH * 4 {
                return Err(ProtoError::StringTooLong {
                    len,
                    max: MAX_STRING_LENGTH * 4,
                });
            }
            ensure(buf, len)?;
            let data = buf.copy_to_bytes(len);
            String::from_utf8(data.to_vec()).map_err(|_| ProtoError::InvalidUtf8)
        }
    }
}

/// Write an era string.
pub fn write_string(era: ProtocolEra, s: &str, buf: &mut impl BufMut) -> Result<(), ProtoError> {
    match era {
        ProtocolEra::Beta => {
            let units: Vec<u16> = s.encode_utf16().collect();
            if units.len() > MAX_STRING_LENGTH {
                return Err(ProtoError::StringTooLong {
                    len: units.len(),
                    max: MAX_STRING_LENGTH,
                });
            }
            buf.put_i16(units.len() as i16);
            for unit in units {
                buf.put_u16(unit);
            }
        }
        ProtocolEra::V1_7 | ProtocolEra::V1_8 => {
            if s.len() > MAX_STRING_LENGTH * 4 {
                return Err(ProtoError::StringTooLong {
                    len: s.len(),
                    max: MAX_STRING_LENGTH * 4,
                });
            }
            VarInt(s.len() as i32).encode(buf);
            buf.put_slice(s.as_bytes());
        }
    }
    Ok(())
}

fn read_string8(buf: &mut impl Buf) -> Result<String, ProtoError> {
    ensure(buf, 2)?;
    let len = buf.get_i16();
    if len < 0 {
        return Err(ProtoError::NegativeLength(len as i32));
    }
    ensure(buf, len as usize)?;
    let data = buf.copy_to_bytes(len as usize);
    String::from_utf8(data.to_vec()).map_err(|_| ProtoError::InvalidUtf8)
}

fn write_string8(s: &str, buf: &mut impl BufMut) -> Result<(), ProtoError> {
    if s.len() > MAX_STRING_LENGTH {
        return Err(ProtoError::StringTooLong {
            len: s.len(),
            max: MAX_STRING_LENGTH,
        });
    }
    buf.put_i16(s.len() as i16);
    buf.put_slice(s.as_bytes());
    Ok(())
}

/// Decode one field of type `tag` from the cursor, using `era`'s wire
/// shapes.
pub fn decode(era: ProtocolEra, tag: TypeTag, buf: &mut bytes::Bytes) -> Result<FieldValue, ProtoError> {
    Ok(match tag {
        TypeTag::Byte => {
            ensure(buf, 1)?;
            FieldValue::Byte(buf.get_i8())
        }
        TypeTag::UnsignedByte => {
            ensure(buf, 1)?;
            FieldValue::UnsignedByte(buf.get_u8())
        }
        TypeTag::Short => {
            ensure(buf, 2)?;
            FieldValue::Short(buf.get_i16())
        }
        TypeTag::UnsignedShort => {
            ensure(buf, 2)?;
            FieldValue::UnsignedShort(buf.get_u16())
        }
        TypeTag::Int => {
            ensure(buf, 4)?;
            FieldValue::Int(buf.get_i32())
        }
        TypeTag::Long => {
            ensure(buf, 8)?;
            FieldValue::Long(buf.get_i64())
        }
        TypeTag::Float => {
            ensure(buf, 4)?;
            FieldValue::Float(buf.get_f32())
        }
        TypeTag::Double => {
            ensure(buf, 8)?;
            FieldValue::Double(buf.get_f64())
        }
        TypeTag::Bool => {
            ensure(buf, 1)?;
            FieldValue::Bool(buf.get_u8() != 0)
        }
        TypeTag::VarInt => FieldValue::VarInt(VarInt::decode(buf)?.0),
        TypeTag::String => FieldValue::String(read_string(era, buf)?),
        TypeTag::String8 => FieldValue::String8(read_string8(buf)?),
        TypeTag::Item => FieldValue::Item(decode_item(era, buf)?),
        TypeTag::ItemArray => {
            ensure(buf, 2)?;
            let count = buf.get_i16();
            if count < 0 {
                return Err(ProtoError::NegativeLength(count as i32));
            }
            let mut items = Vec::with_capacity(count.min(128) as usize);
            for _ in 0..count {
                items.push(decode_item(era, buf)?);
            }
            FieldValue::ItemArray(items)
        }
        TypeTag::Position => match era {
            ProtocolEra::V1_8 => {
                ensure(buf, 8)?;
                FieldValue::Position(BlockLocation::from_packed(buf.get_i64()))
            }
            _ => {
                ensure(buf, 12)?;
                FieldValue::Position(BlockLocation::new(
                    buf.get_i32(),
                    buf.get_i32(),
                    buf.get_i32(),
                ))
            }
        },
        TypeTag::BetaChunk => FieldValue::BetaChunk(BetaChunk::decode(buf)?),
        TypeTag::ChunkColumn => match era {
            ProtocolEra::V1_8 => FieldValue::ChunkColumn(ChunkColumn::decode_v1_8(buf)?),
            _ => FieldValue::ChunkColumn(ChunkColumn::decode_v1_7(buf)?),
        },
        TypeTag::MultiBlockRaw => FieldValue::MultiBlockRaw(MultiBlockRawBatch::decode(buf)?),
        TypeTag::BlockChangeRecords => {
            FieldValue::BlockChangeRecords(decode_records_v1_8(buf)?)
        }
        TypeTag::TabListEntry => FieldValue::TabListEntry(TabListEntry::decode(buf)?),
        TypeTag::OptionalPosition => FieldValue::OptionalPosition(OptionalPosition::decode(buf)?),
        TypeTag::RemainingBytes => {
            let rest = buf.copy_to_bytes(buf.remaining());
            FieldValue::RemainingBytes(rest.to_vec())
        }
    })
}

/// Encode one field into the sink using `era`'s wire shapes, returning
/// the number of bytes written.
pub fn encode(
    era: ProtocolEra,
    value: &FieldValue,
    buf: &mut BytesMut,
) -> Result<usize, ProtoError> {
    let start = buf.len();
    match value {
        FieldValue::Byte(v) => buf.put_i8(*v),
        FieldValue::UnsignedByte(v) => buf.put_u8(*v),
        FieldValue::Short(v) => buf.put_i16(*v),
        FieldValue::UnsignedShort(v) => buf.put_u16(*v),
        FieldValue::Int(v) => buf.put_i32(*v),
        FieldValue::Long(v) => buf.put_i64(*v),
        FieldValue::Float(v) => buf.put_f32(*v),
        FieldValue::Double(v) => buf.put_f64(*v),
        FieldValue::Bool(v) => buf.put_u8(*v as u8),
        FieldValue::VarInt(v) => {
            VarInt(*v).encode(buf);
        }
        FieldValue::String(s) => write_string(era, s, buf)?,
        FieldValue::String8(s) => write_string8(s, buf)?,
        FieldValue::Item(item) => encode_item(era, item.as_ref(), buf)?,
        FieldValue::ItemArray(items) => {
            buf.put_i16(items.len() as i16);
            for item in items {
                encode_item(era, item.as_ref(), buf)?;
            }
        }
        FieldValue::Position(loc) => match era {
            ProtocolEra::V1_8 => buf.put_i64(loc.to_packed()),
            _ => {
                buf.put_i32(loc.x);
                buf.put_i32(loc.y);
                buf.put_i32(loc.z);
            }
        },
        FieldValue::BetaChunk(chunk) => chunk.encode(buf)?,
        FieldValue::ChunkColumn(column) => match era {
            ProtocolEra::V1_8 => column.encode_v1_8(buf)?,
            _ => column.encode_v1_7(buf)?,
        },
        FieldValue::MultiBlockRaw(batch) => batch.encode(buf),
        FieldValue::BlockChangeRecords(records) => encode_records_v1_8(records, buf),
        FieldValue::TabListEntry(entry) => entry.encode(buf)?,
        FieldValue::OptionalPosition(target) => target.encode(buf),
        FieldValue::RemainingBytes(data) => buf.put_slice(data),
    }
    Ok(buf.len() - start)
}
