//! Block coordinates and the 1.8 packed position format.

use crate::error::ProtoError;
use crate::types::ensure;
use bytes::{Buf, BufMut};

/// An absolute block coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockLocation {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockLocation {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Pack into the 1.8 single-long form: x in the high 26 bits, y in the
    /// next 12, z in the low 26. x and z are sign-truncated to 26 bits.
    pub fn to_packed(self) -> i64 {
        ((self.x as i64 & 0x3FF_FFFF) << 38)
            | ((self.y as i64 & 0xFFF) << 26)
            | (self.z as i64 & 0x3FF_FFFF)
    }

    /// Unpack a 1.8 position long, sign-extending x and z.
    pub fn from_packed(packed: i64) -> Self {
        Self {
            x: (packed >> 38) as i32,
            y: ((packed >> 26) & 0xFFF) as i32,
            z: ((packed << 38) >> 38) as i32,
        }
    }
}

/// The 1.8 use-entity packet's trailing action: interact, attack, or
/// interact-at with a hit vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionalPosition {
    pub action: i32,
    pub hit: Option<(f32, f32, f32)>,
}

impl OptionalPosition {
    /// Action id carrying a hit vector on the wire.
    pub const INTERACT_AT: i32 = 2;

    pub(crate) fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let action = crate::types::VarInt::decode(buf)?.0;
        let hit = if action == Self::INTERACT_AT {
            ensure(buf, 12)?;
            Some((buf.get_f32(), buf.get_f32(), buf.get_f32()))
        } else {
            None
        };
        Ok(Self { action, hit })
    }

    pub(crate) fn encode(&self, buf: &mut impl BufMut) {
        crate::types::VarInt(self.action).encode(buf);
        if self.action == Self::INTERACT_AT {
            let (x, y, z) = self.hit.unwrap_or((0.0, 0.0, 0.0));
            buf.put_f32(x);
            buf.put_f32(y);
            buf.put_f32(z);
        }
    }
}
