//! Protocol versions, eras, connection phases and base wire types.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::error::ProtoError;

/// Exact protocol versions the shipped bridges know about.
///
/// Versions form a line, ordered oldest to newest. A bridge always
/// translates between two adjacent entries of this line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolVersion {
    /// Beta 1.7.3 (protocol 14).
    B1_7_3,
    /// Beta 1.8.1 (protocol 17).
    B1_8_1,
    /// Release 1.7.6-1.7.10 (protocol 5).
    R1_7_6,
    /// Release 1.8.x (protocol 47).
    R1_8,
}

impl ProtocolVersion {
    /// Protocol number sent on the wire during login/handshake.
    pub fn protocol_id(self) -> i32 {
        match self {
            Self::B1_7_3 => 14,
            Self::B1_8_1 => 17,
            Self::R1_7_6 => 5,
            Self::R1_8 => 47,
        }
    }

    /// The wire era this version encodes fields in.
    pub fn era(self) -> ProtocolEra {
        match self {
            Self::B1_7_3 | Self::B1_8_1 => ProtocolEra::Beta,
            Self::R1_7_6 => ProtocolEra::V1_7,
            Self::R1_8 => ProtocolEra::V1_8,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::B1_7_3 => "b1.7.3",
            Self::B1_8_1 => "b1.8.1",
            Self::R1_7_6 => "1.7.6",
            Self::R1_8 => "1.8",
        };
        f.write_str(name)
    }
}

/// Wire era: decides length prefixes, string encodings, opcode header
/// width and composite field shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolEra {
    /// Beta protocols: u8 opcodes, UTF-16BE strings, no connection phases.
    Beta,
    /// 1.7.x: VarInt opcodes, UTF-8 strings, zlib chunk columns.
    V1_7,
    /// 1.8.x: packed block positions, u16-cell chunk columns, uuid tab list.
    V1_8,
}

/// Connection phase. A translator registered for one phase is never
/// invoked for another even when opcodes collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolState {
    Handshake,
    Status,
    Login,
    Play,
}

/// Packet flow direction; dispatch keys are direction-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

/// Java-edition VarInt: unsigned LEB128 over the value's two's-complement
/// bits, at most 5 bytes. Shortest-form encoding is canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarInt(pub i32);

impl VarInt {
    /// Maximum bytes a VarInt can occupy.
    pub const MAX_BYTES: usize = 5;

    /// Encode into the buffer and return the number of bytes written.
    pub fn encode(self, buf: &mut impl BufMut) -> usize {
        let mut value = self.0 as u32;
        let mut written = 0;
        loop {
            written += 1;
            if value & !0x7F == 0 {
                buf.put_u8(value as u8);
                return written;
            }
            buf.put_u8((value & 0x7F | 0x80) as u8);
            value >>= 7;
        }
    }

    /// Decode from the buffer, consuming only the VarInt's bytes.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let mut result: u32 = 0;
        let mut shift: u32 = 0;
        for i in 0..Self::MAX_BYTES {
            if !buf.has_remaining() {
                return Err(ProtoError::BufferTooShort {
                    needed: 1,
                    remaining: 0,
                });
            }
            let byte = buf.get_u8();
            result |= ((byte & 0x7F) as u32) << shift;
            if byte & 0x80 == 0 {
                return Ok(VarInt(result as i32));
            }
            shift += 7;
            if i == Self::MAX_BYTES - 1 {
                return Err(ProtoError::VarIntTooLong {
                    max_bytes: Self::MAX_BYTES,
                });
            }
        }
        unreachable!()
    }
}

impl From<i32> for VarInt {
    fn from(v: i32) -> Self {
        VarInt(v)
    }
}

/// Guard that `buf` holds at least `needed` more bytes.
pub(crate) fn ensure(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}
