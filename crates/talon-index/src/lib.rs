//! ART secondary index for TalonDB.
//!
//! This crate provides:
//! - The adaptive radix tree (ART) used for secondary indexes
//! - The row-identifier leaf store (inlined, nested, and deprecated forms)
//! - Arena-based node allocation with relocation/compaction
//! - Backward-compatible serialization of the deprecated leaf block format

pub mod art;

pub use art::{
    ArtIndex, BranchNode, CompactionMap, IndexKey, LegacyLeaf, Node, NodeArena, NodeCounts,
    NodeHandle, NodeKind, PrefixNode, SlotId, LEAF_SIZE, PREFIX_SIZE,
};
