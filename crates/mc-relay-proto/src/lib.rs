//! Wire layer for the protocol translation proxy: protocol versions and
//! eras, the typed field codec, packet envelopes, and the per-version
//! packet layout registry.

pub mod block_change;
pub mod chunk;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod item;
pub mod layout;
pub mod position;
pub mod tab_list;
pub mod types;

pub use codec::{decode, encode, FieldValue, TypeTag};
pub use envelope::{PacketData, SUPPRESS_OPCODE};
pub use error::ProtoError;
pub use layout::{packet_layout, read_packet, write_packet};
pub use position::BlockLocation;
pub use types::{Direction, ProtocolEra, ProtocolState, ProtocolVersion, VarInt};
