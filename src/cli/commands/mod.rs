//! Command implementations.

pub mod collect;
pub mod extract_items;
pub mod merge_roots;
