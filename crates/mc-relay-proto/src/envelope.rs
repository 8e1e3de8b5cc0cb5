//! Packet envelopes: one decoded packet as an opcode plus an ordered,
//! positionally addressed field list.

use crate::block_change::MultiBlockRawBatch;
use crate::chunk::{BetaChunk, ChunkColumn};
use crate::codec::FieldValue;
use crate::error::ProtoError;
use crate::item::ItemStack;
use crate::position::{BlockLocation, OptionalPosition};

/// Reserved opcode meaning "do not forward this packet".
pub const SUPPRESS_OPCODE: i32 = -1;

/// One decoded packet. Field order is externally meaningful: encoding
/// emits fields in exactly this order.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketData {
    pub opcode: i32,
    pub fields: Vec<FieldValue>,
}

impl PacketData {
    pub fn new(opcode: i32, fields: Vec<FieldValue>) -> Self {
        Self { opcode, fields }
    }

    /// The terminal "drop this packet" envelope.
    pub fn suppress() -> Self {
        Self {
            opcode: SUPPRESS_OPCODE,
            fields: Vec::new(),
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.opcode == SUPPRESS_OPCODE
    }

    /// Positional field access.
    pub fn field(&self, index: usize) -> Result<&FieldValue, ProtoError> {
        self.fields.get(index).ok_or(ProtoError::FieldOutOfRange {
            index,
            len: self.fields.len(),
        })
    }

    /// Clone one field for re-emission in a rebuilt envelope.
    pub fn field_owned(&self, index: usize) -> Result<FieldValue, ProtoError> {
        self.field(index).cloned()
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> ProtoError {
        let actual = self
            .fields
            .get(index)
            .map(|f| f.type_name())
            .unwrap_or("missing");
        ProtoError::FieldTypeMismatch {
            index,
            expected,
            actual,
        }
    }

    pub fn byte(&self, index: usize) -> Result<i8, ProtoError> {
        match self.field(index)? {
            FieldValue::Byte(v) => Ok(*v),
            _ => Err(self.mismatch(index, "Byte")),
        }
    }

    pub fn unsigned_byte(&self, index: usize) -> Result<u8, ProtoError> {
        match self.field(index)? {
            FieldValue::UnsignedByte(v) => Ok(*v),
            _ => Err(self.mismatch(index, "UnsignedByte")),
        }
    }

    pub fn short(&self, index: usize) -> Result<i16, ProtoError> {
        match self.field(index)? {
            FieldValue::Short(v) => Ok(*v),
            _ => Err(self.mismatch(index, "Short")),
        }
    }

    pub fn int(&self, index: usize) -> Result<i32, ProtoError> {
        match self.field(index)? {
            FieldValue::Int(v) => Ok(*v),
            _ => Err(self.mismatch(index, "Int")),
        }
    }

    pub fn long(&self, index: usize) -> Result<i64, ProtoError> {
        match self.field(index)? {
            FieldValue::Long(v) => Ok(*v),
            _ => Err(self.mismatch(index, "Long")),
        }
    }

    pub fn float(&self, index: usize) -> Result<f32, ProtoError> {
        match self.field(index)? {
            FieldValue::Float(v) => Ok(*v),
            _ => Err(self.mismatch(index, "Float")),
        }
    }

    pub fn double(&self, index: usize) -> Result<f64, ProtoError> {
        match self.field(index)? {
            FieldValue::Double(v) => Ok(*v),
            _ => Err(self.mismatch(index, "Double")),
        }
    }

    pub fn boolean(&self, index: usize) -> Result<bool, ProtoError> {
        match self.field(index)? {
            FieldValue::Bool(v) => Ok(*v),
            _ => Err(self.mismatch(index, "Bool")),
        }
    }

    pub fn var_int(&self, index: usize) -> Result<i32, ProtoError> {
        match self.field(index)? {
            FieldValue::VarInt(v) => Ok(*v),
            _ => Err(self.mismatch(index, "VarInt")),
        }
    }

    pub fn string(&self, index: usize) -> Result<&str, ProtoError> {
        match self.field(index)? {
            FieldValue::String(s) => Ok(s),
            _ => Err(self.mismatch(index, "String")),
        }
    }

    pub fn string8(&self, index: usize) -> Result<&str, ProtoError> {
        match self.field(index)? {
            FieldValue::String8(s) => Ok(s),
            _ => Err(self.mismatch(index, "String8")),
        }
    }

    pub fn item(&self, index: usize) -> Result<Option<&ItemStack>, ProtoError> {
        match self.field(index)? {
            FieldValue::Item(item) => Ok(item.as_ref()),
            _ => Err(self.mismatch(index, "Item")),
        }
    }

    pub fn item_array(&self, index: usize) -> Result<&[Option<ItemStack>], ProtoError> {
        match self.field(index)? {
            FieldValue::ItemArray(items) => Ok(items),
            _ => Err(self.mismatch(index, "ItemArray")),
        }
    }

    pub fn position(&self, index: usize) -> Result<BlockLocation, ProtoError> {
        match self.field(index)? {
            FieldValue::Position(loc) => Ok(*loc),
            _ => Err(self.mismatch(index, "Position")),
        }
    }

    pub fn beta_chunk(&self, index: usize) -> Result<&BetaChunk, ProtoError> {
        match self.field(index)? {
            FieldValue::BetaChunk(chunk) => Ok(chunk),
            _ => Err(self.mismatch(index, "BetaChunk")),
        }
    }

    pub fn chunk_column(&self, index: usize) -> Result<&ChunkColumn, ProtoError> {
        match self.field(index)? {
            FieldValue::ChunkColumn(column) => Ok(column),
            _ => Err(self.mismatch(index, "ChunkColumn")),
        }
    }

    pub fn multi_block_raw(&self, index: usize) -> Result<&MultiBlockRawBatch, ProtoError> {
        match self.field(index)? {
            FieldValue::MultiBlockRaw(batch) => Ok(batch),
            _ => Err(self.mismatch(index, "MultiBlockRaw")),
        }
    }

    pub fn optional_position(&self, index: usize) -> Result<OptionalPosition, ProtoError> {
        match self.field(index)? {
            FieldValue::OptionalPosition(v) => Ok(*v),
            _ => Err(self.mismatch(index, "OptionalPosition")),
        }
    }
}
