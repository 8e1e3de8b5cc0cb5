//! Per-connection world cache: block ids by absolute coordinate, at
//! chunk-column granularity.

use std::collections::HashMap;

/// Cells per full column: 16 x 128 x 16.
pub const COLUMN_CELLS: usize = 32768;

/// Sparse block-id cache, populated from chunk and block-change packets
/// and consulted by fixups that need the identity of a block the current
/// packet does not carry.
#[derive(Debug, Default)]
pub struct BlockStorage {
    chunks: HashMap<(i32, i32), Box<[u8; COLUMN_CELLS]>>,
}

impl BlockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column key for a world coordinate. Arithmetic shift floors for
    /// negative coordinates, which truncating division would not.
    fn column_key(x: i32, z: i32) -> (i32, i32) {
        (x >> 4, z >> 4)
    }

    fn cell_index(x: i32, y: i32, z: i32) -> usize {
        (((x & 15) << 11) | ((z & 15) << 7) | y) as usize
    }

    pub fn set_block_at(&mut self, x: i32, y: i32, z: i32, block_id: u8) {
        if !(0..128).contains(&y) {
            return;
        }
        let column = self
            .chunks
            .entry(Self::column_key(x, z))
            .or_insert_with(|| Box::new([0; COLUMN_CELLS]));
        column[Self::cell_index(x, y, z)] = block_id;
    }

    /// Block id at the coordinate, 0 (air) when unknown.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> u8 {
        if !(0..128).contains(&y) {
            return 0;
        }
        self.chunks
            .get(&Self::column_key(x, z))
            .map(|column| column[Self::cell_index(x, y, z)])
            .unwrap_or(0)
    }

    /// Evict one column wholesale, on an explicit unload.
    pub fn remove_chunk(&mut self, chunk_x: i32, chunk_z: i32) {
        self.chunks.remove(&(chunk_x, chunk_z));
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_within_a_column() {
        let mut storage = BlockStorage::new();
        storage.set_block_at(5, 64, 9, 54);
        assert_eq!(storage.block_at(5, 64, 9), 54);
        assert_eq!(storage.block_at(5, 65, 9), 0);
        assert_eq!(storage.chunk_count(), 1);
    }

    #[test]
    fn negative_coordinates_floor_shift() {
        let mut storage = BlockStorage::new();
        storage.set_block_at(-1, 10, -1, 7);
        // -1 >> 4 == -1, not 0: the block lives in column (-1, -1).
        assert_eq!(storage.block_at(-1, 10, -1), 7);
        storage.remove_chunk(-1, -1);
        assert_eq!(storage.block_at(-1, 10, -1), 0);
        assert_eq!(storage.chunk_count(), 0);
    }

    #[test]
    fn out_of_range_height_is_ignored() {
        let mut storage = BlockStorage::new();
        storage.set_block_at(0, 128, 0, 1);
        storage.set_block_at(0, -1, 0, 1);
        assert_eq!(storage.chunk_count(), 0);
        assert_eq!(storage.block_at(0, 200, 0), 0);
    }

    #[test]
    fn eviction_is_per_column() {
        let mut storage = BlockStorage::new();
        storage.set_block_at(0, 5, 0, 1);
        storage.set_block_at(16, 5, 0, 2);
        storage.remove_chunk(0, 0);
        assert_eq!(storage.block_at(0, 5, 0), 0);
        assert_eq!(storage.block_at(16, 5, 0), 2);
    }
}
