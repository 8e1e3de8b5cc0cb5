//! Chest facing synthesis.
//!
//! Beta 1.7.3 stores no orientation for chests; beta 1.8.1 renders them
//! by metadata facing. The facing is derived from which neighbors are
//! solid, so the chest opens toward free space.

use crate::world::BlockStorage;

/// Chest block id in the beta id space.
pub const CHEST_ID: u8 = 54;

/// Block ids treated as solid when deciding a facing. Covers the full
/// cubes a chest can back onto in beta terrain.
const SOLID_BLOCKS: &[u8] = &[
    1, 2, 3, 4, 5, 7, 12, 13, 14, 15, 16, 17, 19, 21, 22, 23, 24, 25, 29, 33, 35, 41, 42, 43, 45,
    46, 47, 48, 49, 52, 54, 56, 57, 58, 60, 61, 62, 73, 74, 79, 80, 82, 84, 86, 87, 88, 89, 91,
];

pub fn is_solid(block_id: u8) -> bool {
    SOLID_BLOCKS.contains(&block_id)
}

/// Facing metadata for a chest at the coordinate: the chest faces away
/// from its first solid horizontal neighbor, checked south, north, east,
/// west; 2 (north) when isolated or surrounded.
pub fn chest_facing(storage: &BlockStorage, x: i32, y: i32, z: i32) -> u8 {
    let neighbors = [
        (x, z + 1, 2), // solid to the south: face north
        (x, z - 1, 3), // solid to the north: face south
        (x + 1, z, 4), // solid to the east: face west
        (x - 1, z, 5), // solid to the west: face east
    ];
    for (nx, nz, facing) in neighbors {
        if is_solid(storage.block_at(nx, y, nz)) {
            return facing;
        }
    }
    2
}
