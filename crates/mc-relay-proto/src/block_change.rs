//! Multi-block-change batches.
//!
//! 1.7 carries a raw byte blob of fixed 4-byte records behind a count and
//! a byte size; 1.8 carries explicit records behind a VarInt count. The
//! per-record bit layout is shared: position `x<<12 | z<<8 | y` in one
//! i16, block state `id<<4 | meta` in the other.

use bytes::{Buf, BufMut};

use crate::error::ProtoError;
use crate::types::{ensure, VarInt};

/// One block change within a chunk column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockChangeRecord {
    /// Chunk-local position: `x<<12 | z<<8 | y`.
    pub position: i16,
    /// Block state: `id<<4 | meta`.
    pub state: i16,
}

/// The undecoded 1.7 batch: record count plus the raw record bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiBlockRawBatch {
    pub record_count: i16,
    pub data: Vec<u8>,
}

impl MultiBlockRawBatch {
    /// Parse the raw blob into records. Truncated blobs yield an error
    /// rather than partial data.
    pub fn records(&self) -> Result<Vec<BlockChangeRecord>, ProtoError> {
        let needed = self.record_count.max(0) as usize * 4;
        if self.data.len() < needed {
            return Err(ProtoError::BufferTooShort {
                needed,
                remaining: self.data.len(),
            });
        }
        Ok(self
            .data
            .chunks_exact(4)
            .take(self.record_count.max(0) as usize)
            .map(|chunk| BlockChangeRecord {
                position: i16::from_be_bytes([chunk[0], chunk[1]]),
                state: i16::from_be_bytes([chunk[2], chunk[3]]),
            })
            .collect())
    }

    pub(crate) fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 6)?;
        let record_count = buf.get_i16();
        let size = buf.get_i32();
        if size < 0 {
            return Err(ProtoError::NegativeLength(size));
        }
        ensure(buf, size as usize)?;
        Ok(Self {
            record_count,
            data: buf.copy_to_bytes(size as usize).to_vec(),
        })
    }

    pub(crate) fn encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.record_count);
        buf.put_i32(self.data.len() as i32);
        buf.put_slice(&self.data);
    }
}

pub(crate) fn decode_records_v1_8(buf: &mut impl Buf) -> Result<Vec<BlockChangeRecord>, ProtoError> {
    let count = VarInt::decode(buf)?.0;
    if count < 0 {
        return Err(ProtoError::NegativeLength(count));
    }
    // The count is wire-controlled; reserve only a bounded amount up
    // front and let the per-record reads bound the loop.
    let mut records = Vec::with_capacity(count.min(256) as usize);
    for _ in 0..count {
        ensure(buf, 2)?;
        let position = buf.get_i16();
        let state = VarInt::decode(buf)?.0 as i16;
        records.push(BlockChangeRecord { position, state });
    }
    Ok(records)
}

pub(crate) fn encode_records_v1_8(records: &[BlockChangeRecord], buf: &mut impl BufMut) {
    VarInt(records.len() as i32).encode(buf);
    for record in records {
        buf.put_i16(record.position);
        VarInt(record.state as u16 as i32).encode(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn raw_batch_parses_records() {
        let mut data = Vec::new();
        data.extend_from_slice(&((3i16) << 12 | (7i16) << 8 | 64).to_be_bytes());
        data.extend_from_slice(&((54i16) << 4 | 2).to_be_bytes());
        let batch = MultiBlockRawBatch {
            record_count: 1,
            data,
        };
        let records = batch.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].position, 3 << 12 | 7 << 8 | 64);
        assert_eq!(records[0].state, 54 << 4 | 2);
    }

    #[test]
    fn truncated_raw_batch_is_an_error() {
        let batch = MultiBlockRawBatch {
            record_count: 2,
            data: vec![0; 4],
        };
        assert!(batch.records().is_err());
    }

    #[test]
    fn huge_declared_count_fails_without_allocating() {
        let mut buf = BytesMut::new();
        VarInt(i32::MAX).encode(&mut buf);
        buf.put_i16(0x0123);
        assert!(matches!(
            decode_records_v1_8(&mut buf.freeze()),
            Err(ProtoError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn v1_8_records_roundtrip() {
        let records = vec![
            BlockChangeRecord {
                position: 0x1234,
                state: (54 << 4) | 2,
            },
            BlockChangeRecord {
                position: -1,
                state: 0,
            },
        ];
        let mut buf = BytesMut::new();
        encode_records_v1_8(&records, &mut buf);
        let back = decode_records_v1_8(&mut buf.freeze()).unwrap();
        assert_eq!(back, records);
    }
}
