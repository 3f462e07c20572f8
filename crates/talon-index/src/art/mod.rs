//! Adaptive radix tree secondary index.
//!
//! The index maps byte-encoded keys to sets of row identifiers. The hard
//! part is the row-identifier storage at each key, which takes one of three
//! mutually exclusive forms:
//!
//! ## Inlined (the common case)
//!
//! Exactly one row identifier, embedded directly in the node handle:
//!
//! ```text
//! key path ──▶ Inlined(row_id)        (no allocation)
//! ```
//!
//! ## Nested (duplicate keys)
//!
//! Two or more row identifiers, stored as a recursive tree over the row
//! identifiers' own byte encodings. The root handle carries the *gate* bit
//! marking the boundary: below it the tree represents a set of row ids,
//! not key continuation.
//!
//! ```text
//! key path ──▶ [gate] prefix ──▶ branch ──▶ Inlined(row_id_a)
//!                                      └──▶ Inlined(row_id_b)
//! ```
//!
//! ## Deprecated (legacy on-disk compatibility)
//!
//! A singly-linked chain of fixed-capacity blocks, retained only so files
//! written before the nested form existed stay readable and writable:
//!
//! ```text
//! key path ──▶ [count | row_ids[LEAF_SIZE] | next] ──▶ [count | ... | next] ──▶ ∅
//! ```
//!
//! New insert/delete logic never produces the deprecated form; it is
//! upgraded to nested form lazily on first touch and recreated only by an
//! explicit downgrade at checkpoint time.
//!
//! Nodes live in an index-addressed arena ([`NodeArena`]); handles carry a
//! stable slot id plus a kind tag, so compaction hands out a central
//! old-to-new slot map instead of patching raw pointers.

// Submodules
pub mod arena;
pub mod checkpoint;
pub mod index;
pub mod key;
pub mod leaf;
pub mod legacy;
pub mod node;
pub mod prefix;
pub mod tree;

// Re-exports for public API
pub use arena::{CompactionMap, NodeArena, NodeCounts};
pub use index::ArtIndex;
pub use key::IndexKey;
pub use legacy::{LegacyLeaf, LEAF_SIZE};
pub use node::{Node, NodeHandle, NodeKind, SlotId};
pub use prefix::{BranchNode, PrefixNode, PREFIX_SIZE};
