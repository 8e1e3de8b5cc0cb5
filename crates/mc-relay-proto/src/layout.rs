//! Per-version packet layouts: which typed fields each opcode carries,
//! keyed by protocol state and travel direction.
//!
//! The tables cover the packets the proxy inspects or rewrites plus the
//! fixed-shape packets it forwards untouched. An opcode outside the table
//! decodes to [`ProtoError::UnknownLayout`]; beta streams carry no length
//! framing, so an unknown beta opcode is unrecoverable for the connection.

use bytes::{Buf, Bytes, BytesMut};

use crate::codec::{decode, encode, TypeTag};
use crate::envelope::PacketData;
use crate::error::ProtoError;
use crate::types::{ensure, Direction, ProtocolEra, ProtocolState, ProtocolVersion};

use Direction::{ClientToServer, ServerToClient};
use TypeTag::*;

/// The field layout of one packet, or `None` when the version does not
/// define that opcode in that state and direction.
pub fn packet_layout(
    version: ProtocolVersion,
    state: ProtocolState,
    direction: Direction,
    opcode: i32,
) -> Option<&'static [TypeTag]> {
    match version.era() {
        ProtocolEra::Beta => beta_layout(version, direction, opcode),
        _ => modern_layout(version, state, direction, opcode),
    }
}

/// Beta has no state machine: one table covers the whole connection.
fn beta_layout(
    version: ProtocolVersion,
    direction: Direction,
    opcode: i32,
) -> Option<&'static [TypeTag]> {
    let v18 = version == ProtocolVersion::B1_8_1;
    let layout: &'static [TypeTag] = match (direction, opcode) {
        (_, 0x00) if v18 => &[Int],
        (_, 0x00) => &[],
        (_, 0x01) if v18 => &[Int, String, Long, Int, Byte, Byte, Byte, Byte],
        (_, 0x01) => &[Int, String, Long, Byte],
        (_, 0x02) => &[String],
        (_, 0x03) => &[String],
        (ServerToClient, 0x04) => &[Long],
        (ServerToClient, 0x05) => &[Int, Short, Short, Short],
        (ServerToClient, 0x06) => &[Int, Int, Int],
        (ClientToServer, 0x07) => &[Int, Int, Bool],
        (ServerToClient, 0x08) if v18 => &[Short, Short, Float],
        (ServerToClient, 0x08) => &[Short],
        (_, 0x09) if v18 => &[Byte, Byte, Byte, Short, Long],
        (_, 0x09) => &[Byte],
        (ClientToServer, 0x0A) => &[Bool],
        (ClientToServer, 0x0B) => &[Double, Double, Double, Double, Bool],
        (ClientToServer, 0x0C) => &[Float, Float, Bool],
        (_, 0x0D) => &[Double, Double, Double, Double, Float, Float, Bool],
        (ClientToServer, 0x0E) => &[Byte, Int, Byte, Int, Byte],
        (ClientToServer, 0x0F) => &[Int, Byte, Int, Byte, Item],
        (ClientToServer, 0x10) => &[Short],
        (ServerToClient, 0x11) => &[Int, Byte, Int, Byte, Int],
        (_, 0x12) => &[Int, Byte],
        (ClientToServer, 0x13) => &[Int, Byte],
        (ServerToClient, 0x14) => &[Int, String, Int, Int, Int, Byte, Byte, Short],
        (ServerToClient, 0x15) => {
            &[Int, Short, Byte, Short, Int, Int, Int, Byte, Byte, Byte]
        }
        (ServerToClient, 0x16) => &[Int, Int],
        (ServerToClient, 0x1C) => &[Int, Short, Short, Short],
        (ServerToClient, 0x1D) => &[Int],
        (ServerToClient, 0x1E) => &[Int],
        (ServerToClient, 0x1F) => &[Int, Byte, Byte, Byte],
        (ServerToClient, 0x20) => &[Int, Byte, Byte],
        (ServerToClient, 0x21) => &[Int, Byte, Byte, Byte, Byte, Byte],
        (ServerToClient, 0x22) => &[Int, Int, Int, Int, Byte, Byte],
        (ServerToClient, 0x26) => &[Int, Byte],
        (ServerToClient, 0x27) => &[Int, Int],
        (ServerToClient, 0x32) => &[Int, Int, Bool],
        (ServerToClient, 0x33) => &[BetaChunk],
        (ServerToClient, 0x35) => &[Int, Byte, Int, Byte, Byte],
        (ServerToClient, 0x46) if v18 => &[Byte, Byte],
        (ServerToClient, 0x46) => &[Byte],
        (ServerToClient, 0x47) => &[Int, Bool, Int, Int, Int],
        (ServerToClient, 0x64) if v18 => &[Byte, Byte, String, Byte],
        (ServerToClient, 0x64) => &[Byte, Byte, String8, Byte],
        (_, 0x65) => &[Byte],
        (ClientToServer, 0x66) => &[Byte, Short, Byte, Short, Bool, Item],
        (ServerToClient, 0x67) => &[Byte, Short, Item],
        (ServerToClient, 0x68) => &[Byte, ItemArray],
        (ServerToClient, 0x69) => &[Byte, Short, Short],
        (_, 0x6A) => &[Byte, Short, Bool],
        (ClientToServer, 0x6B) if v18 => &[Short, Short, Short, Short],
        (_, 0x82) => &[Int, Short, Int, String, String, String, String],
        (ServerToClient, 0xC8) => &[Int, Byte],
        (ServerToClient, 0xC9) if v18 => &[String, Byte, Short],
        (ClientToServer, 0xFE) if v18 => &[],
        (_, 0xFF) => &[String],
        _ => return None,
    };
    Some(layout)
}

fn modern_layout(
    version: ProtocolVersion,
    state: ProtocolState,
    direction: Direction,
    opcode: i32,
) -> Option<&'static [TypeTag]> {
    let v8 = version == ProtocolVersion::R1_8;
    let layout: &'static [TypeTag] = match state {
        ProtocolState::Handshake => match (direction, opcode) {
            (ClientToServer, 0x00) => &[VarInt, String, UnsignedShort, VarInt],
            _ => return None,
        },
        ProtocolState::Status => match (direction, opcode) {
            (ClientToServer, 0x00) => &[],
            (_, 0x01) => &[Long],
            (ServerToClient, 0x00) => &[String],
            _ => return None,
        },
        ProtocolState::Login => match (direction, opcode) {
            (ClientToServer, 0x00) => &[String],
            (ServerToClient, 0x00) => &[String],
            (ServerToClient, 0x02) => &[String, String],
            _ => return None,
        },
        ProtocolState::Play => match direction {
            ServerToClient => match opcode {
                0x00 if v8 => &[VarInt],
                0x00 => &[Int],
                0x01 if v8 => {
                    &[Int, UnsignedByte, Byte, UnsignedByte, UnsignedByte, String, Bool]
                }
                0x01 => &[Int, UnsignedByte, Byte, UnsignedByte, UnsignedByte, String],
                0x02 if v8 => &[String, Byte],
                0x02 => &[String],
                0x03 => &[Long, Long],
                0x04 if v8 => &[VarInt, Short, Item],
                0x04 => &[Int, Short, Item],
                0x05 if v8 => &[Position],
                0x05 => &[Int, Int, Int],
                0x06 if v8 => &[Float, VarInt, Float],
                0x06 => &[Float, Short, Float],
                0x07 => &[Int, UnsignedByte, UnsignedByte, String],
                0x08 if v8 => &[Double, Double, Double, Float, Float, Byte],
                0x08 => &[Double, Double, Double, Float, Float, Bool],
                0x09 => &[Byte],
                0x0A if v8 => &[VarInt, Position],
                0x0A => &[Int, Int, Byte, Int],
                0x0B => &[VarInt, UnsignedByte],
                0x0D if v8 => &[VarInt, VarInt],
                0x0D => &[Int, Int],
                0x12 if v8 => &[VarInt, Short, Short, Short],
                0x12 => &[Int, Short, Short, Short],
                0x1F if v8 => &[Float, VarInt, VarInt],
                0x1F => &[Float, Short, Short],
                0x20 if !v8 => &[RemainingBytes],
                0x21 => &[ChunkColumn],
                0x22 if v8 => &[Int, Int, BlockChangeRecords],
                0x22 => &[Int, Int, MultiBlockRaw],
                0x23 if v8 => &[Position, VarInt],
                0x23 => &[Int, UnsignedByte, Int, VarInt, UnsignedByte],
                0x24 if v8 => &[Position, UnsignedByte, UnsignedByte, VarInt],
                0x24 => &[Int, Short, Int, UnsignedByte, UnsignedByte, VarInt],
                0x25 if v8 => &[VarInt, Position, Byte],
                0x25 => &[VarInt, Int, Int, Int, Byte],
                0x26 if !v8 => &[RemainingBytes],
                0x28 if v8 => &[Int, Position, Int, Bool],
                0x28 => &[Int, Int, Byte, Int, Int, Bool],
                0x2D if v8 => &[UnsignedByte, String, String, UnsignedByte],
                0x2D => &[UnsignedByte, UnsignedByte, String, UnsignedByte, Bool],
                0x2F => &[UnsignedByte, Short, Item],
                0x30 => &[UnsignedByte, ItemArray],
                0x33 if v8 => &[Position, String, String, String, String],
                0x33 => &[Int, Short, Int, String, String, String, String],
                0x36 if v8 => &[Position],
                0x36 => &[Int, Int, Int],
                0x38 if v8 => &[TabListEntry],
                0x38 => &[String, Bool, Short],
                0x39 => &[Byte, Float, Float],
                0x3F if !v8 => &[String, RemainingBytes],
                0x40 => &[String],
                _ => return None,
            },
            ClientToServer => match opcode {
                0x00 if v8 => &[VarInt],
                0x00 => &[Int],
                0x01 => &[String],
                0x02 if v8 => &[VarInt, OptionalPosition],
                0x02 => &[Int, Byte],
                0x03 => &[Bool],
                0x04 if v8 => &[Double, Double, Double, Bool],
                0x04 => &[Double, Double, Double, Double, Bool],
                0x05 => &[Float, Float, Bool],
                0x06 if v8 => &[Double, Double, Double, Float, Float, Bool],
                0x06 => &[Double, Double, Double, Double, Float, Float, Bool],
                0x07 if v8 => &[UnsignedByte, Position, Byte],
                0x07 => &[UnsignedByte, Int, UnsignedByte, Int, UnsignedByte],
                0x08 if v8 => &[Position, Byte, Item, Byte, Byte, Byte],
                0x08 => &[Int, UnsignedByte, Int, Byte, Item, Byte, Byte, Byte],
                0x09 => &[Short],
                0x0A if v8 => &[],
                0x0A => &[Int, Byte],
                0x0B if v8 => &[VarInt, VarInt, VarInt],
                0x0B => &[Int, Byte, Int],
                0x0C if v8 => &[Float, Float, Byte],
                0x0C => &[Float, Float, Bool, Bool],
                0x0D => &[Byte],
                0x0E => &[Byte, Short, Byte, Short, Byte, Item],
                0x0F => &[Byte, Short, Bool],
                0x10 => &[Short, Item],
                0x11 => &[Byte, Byte],
                0x12 if v8 => &[Position, String, String, String, String],
                0x12 => &[Int, Short, Int, String, String, String, String],
                0x13 => &[Byte, Float, Float],
                0x15 if v8 => &[String, Byte, Byte, Bool, UnsignedByte],
                0x15 => &[String, Byte, Byte, Bool, UnsignedByte, Bool],
                0x16 if v8 => &[VarInt],
                0x16 => &[Byte],
                _ => return None,
            },
        },
    };
    Some(layout)
}

/// Decode one complete packet body (opcode header included) from the
/// cursor. Beta packets carry a one-byte opcode; modern packets a VarInt
/// opcode, with outer length framing already stripped by the transport.
pub fn read_packet(
    version: ProtocolVersion,
    state: ProtocolState,
    direction: Direction,
    buf: &mut Bytes,
) -> Result<PacketData, ProtoError> {
    let era = version.era();
    let opcode = match era {
        ProtocolEra::Beta => {
            ensure(buf, 1)?;
            buf.get_u8() as i32
        }
        _ => crate::types::VarInt::decode(buf)?.0,
    };
    let layout = packet_layout(version, state, direction, opcode).ok_or(
        ProtoError::UnknownLayout {
            opcode,
            version,
            state,
            direction,
        },
    )?;
    let mut fields = Vec::with_capacity(layout.len());
    for tag in layout {
        fields.push(decode(era, *tag, buf)?);
    }
    Ok(PacketData::new(opcode, fields))
}

/// Encode one packet (opcode header included), returning the bytes
/// written. Suppressed packets must be filtered out before this point.
pub fn write_packet(
    version: ProtocolVersion,
    state: ProtocolState,
    direction: Direction,
    packet: &PacketData,
    buf: &mut BytesMut,
) -> Result<usize, ProtoError> {
    debug_assert!(!packet.is_suppressed(), "suppressed packet reached the encoder");
    if let Some(layout) = packet_layout(version, state, direction, packet.opcode) {
        debug_assert_eq!(
            layout.len(),
            packet.fields.len(),
            "field count diverges from the 0x{:02X} layout",
            packet.opcode,
        );
    }
    let era = version.era();
    let start = buf.len();
    match era {
        ProtocolEra::Beta => buf.extend_from_slice(&[(packet.opcode & 0xFF) as u8]),
        _ => {
            crate::types::VarInt(packet.opcode).encode(buf);
        }
    }
    for field in &packet.fields {
        encode(era, field, buf)?;
    }
    Ok(buf.len() - start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FieldValue;
    use crate::position::BlockLocation;
    use ProtocolVersion::{B1_7_3, B1_8_1, R1_7_6, R1_8};

    #[test]
    fn version_deltas_change_layouts() {
        let b17 = packet_layout(B1_7_3, ProtocolState::Play, ServerToClient, 0x08).unwrap();
        let b18 = packet_layout(B1_8_1, ProtocolState::Play, ServerToClient, 0x08).unwrap();
        assert_eq!(b17, &[Short]);
        assert_eq!(b18, &[Short, Short, Float]);

        let v17 = packet_layout(R1_7_6, ProtocolState::Play, ServerToClient, 0x23).unwrap();
        let v18 = packet_layout(R1_8, ProtocolState::Play, ServerToClient, 0x23).unwrap();
        assert_eq!(v17, &[Int, UnsignedByte, Int, VarInt, UnsignedByte]);
        assert_eq!(v18, &[Position, VarInt]);
    }

    #[test]
    fn unknown_opcode_has_no_layout() {
        assert!(packet_layout(R1_8, ProtocolState::Play, ServerToClient, 0xEE).is_none());
        assert!(packet_layout(B1_7_3, ProtocolState::Play, ServerToClient, 0xC9).is_none());
        assert!(packet_layout(B1_8_1, ProtocolState::Play, ServerToClient, 0xC9).is_some());
    }

    #[test]
    fn beta_roundtrip_uses_byte_opcode() {
        let packet = PacketData::new(
            0x0E,
            vec![
                FieldValue::Byte(0),
                FieldValue::Int(100),
                FieldValue::Byte(64),
                FieldValue::Int(-200),
                FieldValue::Byte(1),
            ],
        );
        let mut buf = BytesMut::new();
        write_packet(B1_7_3, ProtocolState::Play, ClientToServer, &packet, &mut buf).unwrap();
        assert_eq!(buf[0], 0x0E);
        let back =
            read_packet(B1_7_3, ProtocolState::Play, ClientToServer, &mut buf.freeze()).unwrap();
        assert_eq!(back, packet);
    }

    #[test]
    fn modern_roundtrip_uses_varint_opcode() {
        let packet = PacketData::new(
            0x23,
            vec![
                FieldValue::Position(BlockLocation::new(-30, 64, 12)),
                FieldValue::VarInt(54 << 4 | 2),
            ],
        );
        let mut buf = BytesMut::new();
        write_packet(R1_8, ProtocolState::Play, ServerToClient, &packet, &mut buf).unwrap();
        assert_eq!(buf[0], 0x23);
        assert_eq!(buf.len(), 1 + 8 + 2);
        let back =
            read_packet(R1_8, ProtocolState::Play, ServerToClient, &mut buf.freeze()).unwrap();
        assert_eq!(back, packet);
    }

    #[test]
    fn unknown_opcode_fails_to_decode() {
        let mut buf = BytesMut::new();
        crate::types::VarInt(0x77).encode(&mut buf);
        let err = read_packet(R1_8, ProtocolState::Play, ServerToClient, &mut buf.freeze())
            .unwrap_err();
        assert!(matches!(err, ProtoError::UnknownLayout { opcode: 0x77, .. }));
    }

    #[test]
    fn status_handshake_layouts_exist() {
        assert!(packet_layout(R1_8, ProtocolState::Handshake, ClientToServer, 0x00).is_some());
        assert_eq!(
            packet_layout(R1_7_6, ProtocolState::Status, ServerToClient, 0x00).unwrap(),
            &[String]
        );
    }
}
