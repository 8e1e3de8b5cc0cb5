//! Wire-level errors.
//!
//! A `ProtoError` always aborts translation of the current packet only;
//! the connection stays up and the next packet starts from a clean cursor.

use thiserror::Error;

use crate::types::{Direction, ProtocolState, ProtocolVersion};

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("VarInt is too long (more than {max_bytes} bytes)")]
    VarIntTooLong { max_bytes: usize },

    #[error("string length {len} exceeds maximum {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("negative declared length: {0}")]
    NegativeLength(i32),

    #[error("invalid UTF-8 string data")]
    InvalidUtf8,

    #[error("invalid UTF-16 string data")]
    InvalidUtf16,

    #[error("no packet layout for opcode 0x{opcode:02X} ({version}/{state:?}/{direction:?})")]
    UnknownLayout {
        opcode: i32,
        version: ProtocolVersion,
        state: ProtocolState,
        direction: Direction,
    },

    #[error("field index {index} out of range (packet has {len} fields)")]
    FieldOutOfRange { index: usize, len: usize },

    #[error("field {index} is {actual}, expected {expected}")]
    FieldTypeMismatch {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("zlib inflate failed: {0}")]
    Decompress(String),

    #[error("zlib deflate failed: {0}")]
    Compress(String),

    #[error("chunk body has {len} bytes, expected {expected}")]
    BadChunkSize { len: usize, expected: usize },

    #[error("malformed NBT blob in item stack")]
    MalformedNbt,

    #[error("unknown tab list action {0}")]
    UnknownTabListAction(i32),
}
