//! Tagged node handles for the ART.

use crate::art::legacy::LegacyLeaf;
use crate::art::prefix::{BranchNode, PrefixNode};
use talon_common::RowId;

/// Stable index of an allocated node within the [`NodeArena`].
///
/// Slot ids survive arena growth; compaction invalidates them and hands
/// out a remap table instead of touching the structures that hold them.
///
/// [`NodeArena`]: crate::art::arena::NodeArena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub(crate) u32);

impl SlotId {
    /// Returns the raw slot index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind tag of an allocated node, also the key for allocation accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeKind {
    /// Compressed run of key bytes with a single child.
    Prefix = 0,
    /// Fan-out node: sorted (byte, child) entries.
    Branch = 1,
    /// Deprecated fixed-capacity row-id block (linked chain).
    LegacyLeaf = 2,
}

impl NodeKind {
    /// Number of node kinds, for counter arrays.
    pub const COUNT: usize = 3;
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeKind::Prefix => "PREFIX",
            NodeKind::Branch => "BRANCH",
            NodeKind::LegacyLeaf => "LEGACY_LEAF",
        };
        write!(f, "{}", name)
    }
}

/// An allocated tree node.
#[derive(Debug, Clone)]
pub enum Node {
    Prefix(PrefixNode),
    Branch(BranchNode),
    LegacyLeaf(LegacyLeaf),
}

impl Node {
    /// Returns the kind tag of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Prefix(_) => NodeKind::Prefix,
            Node::Branch(_) => NodeKind::Branch,
            Node::LegacyLeaf(_) => NodeKind::LegacyLeaf,
        }
    }

    /// Borrows this node as a prefix node. Panics on kind mismatch.
    pub fn as_prefix(&self) -> &PrefixNode {
        match self {
            Node::Prefix(p) => p,
            other => panic!("expected PREFIX node, found {}", other.kind()),
        }
    }

    /// Mutably borrows this node as a prefix node. Panics on kind mismatch.
    pub fn as_prefix_mut(&mut self) -> &mut PrefixNode {
        match self {
            Node::Prefix(p) => p,
            other => panic!("expected PREFIX node, found {}", other.kind()),
        }
    }

    /// Borrows this node as a branch node. Panics on kind mismatch.
    pub fn as_branch(&self) -> &BranchNode {
        match self {
            Node::Branch(b) => b,
            other => panic!("expected BRANCH node, found {}", other.kind()),
        }
    }

    /// Mutably borrows this node as a branch node. Panics on kind mismatch.
    pub fn as_branch_mut(&mut self) -> &mut BranchNode {
        match self {
            Node::Branch(b) => b,
            other => panic!("expected BRANCH node, found {}", other.kind()),
        }
    }

    /// Borrows this node as a legacy leaf block. Panics on kind mismatch.
    pub fn as_legacy(&self) -> &LegacyLeaf {
        match self {
            Node::LegacyLeaf(l) => l,
            other => panic!("expected LEGACY_LEAF node, found {}", other.kind()),
        }
    }

    /// Mutably borrows this node as a legacy leaf block. Panics on kind mismatch.
    pub fn as_legacy_mut(&mut self) -> &mut LegacyLeaf {
        match self {
            Node::LegacyLeaf(l) => l,
            other => panic!("expected LEGACY_LEAF node, found {}", other.kind()),
        }
    }
}

/// A tagged node handle: either empty, an inlined row identifier, or a
/// reference to an allocated node.
///
/// The handle is a small `Copy` value. An `Owned` handle carries the slot
/// of the allocation, its kind tag, and the gate bit marking a subtree
/// boundary (the nested tree below stores row identifiers, not key
/// continuation). An `Inlined` handle owns nothing; an `Owned` handle owns
/// exactly one allocation (which may own further nodes below it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeHandle {
    /// No entry.
    Empty,
    /// A single row identifier, stored with no allocation.
    Inlined(RowId),
    /// A reference to an allocated node.
    Owned {
        slot: SlotId,
        kind: NodeKind,
        gate: bool,
    },
}

impl NodeHandle {
    /// Builds an owned handle for a freshly allocated node.
    pub fn owned(slot: SlotId, kind: NodeKind) -> Self {
        NodeHandle::Owned {
            slot,
            kind,
            gate: false,
        }
    }

    /// Returns true if this handle holds no entry.
    pub fn is_empty(&self) -> bool {
        matches!(self, NodeHandle::Empty)
    }

    /// Returns true if this handle embeds a single row identifier.
    pub fn is_inlined(&self) -> bool {
        matches!(self, NodeHandle::Inlined(_))
    }

    /// Returns true if this handle marks a nested row-id subtree boundary.
    pub fn is_gate(&self) -> bool {
        matches!(self, NodeHandle::Owned { gate: true, .. })
    }

    /// Returns the kind of the referenced allocation, if any.
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            NodeHandle::Owned { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns the arena slot of the referenced allocation, if any.
    pub fn slot(&self) -> Option<SlotId> {
        match self {
            NodeHandle::Owned { slot, .. } => Some(*slot),
            _ => None,
        }
    }

    /// Returns the embedded row identifier, if inlined.
    pub fn as_inlined(&self) -> Option<RowId> {
        match self {
            NodeHandle::Inlined(row_id) => Some(*row_id),
            _ => None,
        }
    }

    /// Sets or clears the gate bit. Panics on a non-allocated handle: the
    /// gate marks an allocated subtree root, never an inlined value.
    pub fn set_gate(&mut self, gate: bool) {
        match self {
            NodeHandle::Owned { gate: g, .. } => *g = gate,
            other => panic!("gate bit on non-allocated handle {:?}", other),
        }
    }

    /// Resets this handle to empty. Does not free the referenced node.
    pub fn clear(&mut self) {
        *self = NodeHandle::Empty;
    }

    /// Returns true if this handle is a row-identifier store terminal:
    /// inlined, a gated nested root, or a deprecated block chain.
    pub fn is_row_id_store(&self) -> bool {
        match self {
            NodeHandle::Inlined(_) => true,
            NodeHandle::Owned { gate, kind, .. } => {
                *gate || *kind == NodeKind::LegacyLeaf
            }
            NodeHandle::Empty => false,
        }
    }
}
