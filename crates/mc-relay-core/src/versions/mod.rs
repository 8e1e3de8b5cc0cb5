//! The shipped version bridges.

pub mod beta17_to_14;
pub mod r47_to_5;
