//! Blocks whose break time differs between beta 1.7.3 and release 1.8.
//!
//! When the downstream server is beta, a 1.8 client finishes digging
//! these blocks earlier than the server expects; forwarding the finish
//! action would get the break rejected, so it is withheld and the server
//! completes the break on its own clock.

const DIVERGENT_HARDNESS: &[u8] = &[
    18, // leaves
    20, // glass
    25, // note block
    47, // bookshelf
    65, // ladder
    79, // ice
    81, // cactus
    85, // fence
    89, // glowstone
];

pub(super) fn exists(block_id: u8) -> bool {
    DIVERGENT_HARDNESS.contains(&block_id)
}
