//! Deprecated linked-block row-id storage.
//!
//! Older index files store the row ids of a key as a chain of
//! fixed-capacity blocks. The in-memory form is kept only so those files
//! can be read back and written out again; every structural operation
//! first promotes a chain to the nested form. Chains are append-only and
//! unsorted, matching what the old on-disk layout guarantees.

use crate::art::arena::{CompactionMap, NodeArena, NodeCounts};
use crate::art::node::{Node, NodeHandle, NodeKind};
use std::fmt::Write as _;
use talon_common::RowId;

/// Row-id capacity of a single legacy block.
pub const LEAF_SIZE: usize = 4;

/// One block of a legacy row-id chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyLeaf {
    pub count: u8,
    pub row_ids: [RowId; LEAF_SIZE],
    pub next: NodeHandle,
}

impl LegacyLeaf {
    /// The occupied prefix of the row-id array.
    pub fn as_slice(&self) -> &[RowId] {
        &self.row_ids[..self.count as usize]
    }
}

/// Allocates a single block holding `row_ids` with the given tail.
pub fn new_block(arena: &mut NodeArena, row_ids: &[RowId], next: NodeHandle) -> NodeHandle {
    debug_assert!(!row_ids.is_empty() && row_ids.len() <= LEAF_SIZE);
    let mut block = LegacyLeaf {
        count: row_ids.len() as u8,
        row_ids: [0; LEAF_SIZE],
        next,
    };
    block.row_ids[..row_ids.len()].copy_from_slice(row_ids);
    let slot = arena.alloc(Node::LegacyLeaf(block));
    NodeHandle::owned(slot, NodeKind::LegacyLeaf)
}

/// Builds a chain holding all of `row_ids`, preserving their order.
/// Blocks are allocated back to front so each links to the already-built
/// tail.
pub fn new_chain(arena: &mut NodeArena, row_ids: &[RowId]) -> NodeHandle {
    debug_assert!(!row_ids.is_empty());
    let mut head = NodeHandle::Empty;
    for chunk in row_ids.chunks(LEAF_SIZE).rev() {
        head = new_block(arena, chunk, head);
    }
    head
}

/// Frees every block of the chain and clears the handle. A no-op on an
/// already-empty handle.
pub fn free(arena: &mut NodeArena, node: &mut NodeHandle) {
    let mut current = *node;
    while let NodeHandle::Owned { slot, kind, .. } = current {
        debug_assert_eq!(kind, NodeKind::LegacyLeaf);
        current = arena.get(slot).as_legacy().next;
        arena.free(slot);
    }
    node.clear();
}

/// Appends the chain's row ids to `out`, stopping early when the total
/// would exceed `max_count`. Returns false on early stop.
pub fn collect_up_to(
    arena: &NodeArena,
    node: NodeHandle,
    max_count: usize,
    out: &mut Vec<RowId>,
) -> bool {
    let mut current = node;
    while let NodeHandle::Owned { slot, .. } = current {
        let block = arena.get(slot).as_legacy();
        if out.len() + block.count as usize > max_count {
            return false;
        }
        out.extend_from_slice(block.as_slice());
        current = block.next;
    }
    true
}

/// Patches the head handle and every intra-chain link against a
/// compaction map. Safe to call on handles that did not move.
pub fn compact_in_place(arena: &mut NodeArena, node: &mut NodeHandle, map: &CompactionMap) {
    if let NodeHandle::Owned { slot, kind, gate } = *node {
        if let Some(new_slot) = map.relocated(slot) {
            *node = NodeHandle::Owned {
                slot: new_slot,
                kind,
                gate,
            };
        }
    }
    let mut current = *node;
    while let NodeHandle::Owned { slot, .. } = current {
        let next = arena.get(slot).as_legacy().next;
        if let NodeHandle::Owned {
            slot: next_slot,
            kind,
            gate,
        } = next
        {
            if let Some(new_slot) = map.relocated(next_slot) {
                arena.get_mut(slot).as_legacy_mut().next = NodeHandle::Owned {
                    slot: new_slot,
                    kind,
                    gate,
                };
            }
        }
        current = arena.get(slot).as_legacy().next;
    }
}

/// Adds the chain's per-block allocations to `counts`.
pub fn count_allocations(arena: &NodeArena, node: NodeHandle, counts: &mut NodeCounts) {
    let mut current = node;
    while let NodeHandle::Owned { slot, .. } = current {
        counts.increment(NodeKind::LegacyLeaf);
        current = arena.get(slot).as_legacy().next;
    }
}

/// Renders the chain for debugging, one segment per block.
pub fn debug_dump(arena: &NodeArena, node: NodeHandle) -> String {
    let mut output = String::new();
    let mut current = node;
    while let NodeHandle::Owned { slot, .. } = current {
        let block = arena.get(slot).as_legacy();
        let _ = write!(output, "Leaf [count: {}, row ids: ", block.count);
        for row_id in block.as_slice() {
            let _ = write!(output, "{row_id}-");
        }
        output.push_str("] ");
        current = block.next;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chain_preserves_order_and_block_boundaries() {
        let mut arena = NodeArena::new();
        let ids: Vec<RowId> = (0..10).collect();
        let head = new_chain(&mut arena, &ids);

        // 10 ids at capacity 4 gives blocks of 4, 4, 2.
        assert_eq!(arena.live_count(NodeKind::LegacyLeaf), 3);
        let first = arena.get(head.slot().unwrap()).as_legacy();
        assert_eq!(first.as_slice(), &[0, 1, 2, 3]);

        let mut out = Vec::new();
        assert!(collect_up_to(&arena, head, usize::MAX, &mut out));
        assert_eq!(out, ids);
    }

    #[test]
    fn test_single_block_chain() {
        let mut arena = NodeArena::new();
        let head = new_chain(&mut arena, &[7, 8]);
        assert_eq!(arena.total_live(), 1);

        let block = arena.get(head.slot().unwrap()).as_legacy();
        assert_eq!(block.count, 2);
        assert!(block.next.is_empty());
    }

    #[test]
    fn test_collect_up_to_stops_at_block_granularity() {
        let mut arena = NodeArena::new();
        let ids: Vec<RowId> = (0..8).collect();
        let head = new_chain(&mut arena, &ids);

        let mut out = Vec::new();
        assert!(!collect_up_to(&arena, head, 7, &mut out));
        // The first block fit, the second would have overflowed.
        assert_eq!(out, vec![0, 1, 2, 3]);

        out.clear();
        assert!(collect_up_to(&arena, head, 8, &mut out));
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn test_free_releases_every_block() {
        let mut arena = NodeArena::new();
        let ids: Vec<RowId> = (0..9).collect();
        let mut head = new_chain(&mut arena, &ids);
        assert_eq!(arena.total_live(), 3);

        free(&mut arena, &mut head);
        assert_eq!(arena.total_live(), 0);
        assert!(head.is_empty());

        // Freeing an empty handle is a no-op.
        free(&mut arena, &mut head);
        assert!(head.is_empty());
    }

    #[test]
    fn test_compact_in_place_patches_links() {
        let mut arena = NodeArena::new();
        // Padding allocations create holes once freed, forcing the chain
        // blocks to relocate during compaction.
        let pad_a = new_block(&mut arena, &[100], NodeHandle::Empty);
        let pad_b = new_block(&mut arena, &[200], NodeHandle::Empty);
        let ids: Vec<RowId> = (0..8).collect();
        let mut head = new_chain(&mut arena, &ids);

        arena.free(pad_a.slot().unwrap());
        arena.free(pad_b.slot().unwrap());

        let map = arena.compact();
        assert!(!map.is_empty());
        compact_in_place(&mut arena, &mut head, &map);

        let mut out = Vec::new();
        assert!(collect_up_to(&arena, head, usize::MAX, &mut out));
        assert_eq!(out, ids);
    }

    #[test]
    fn test_count_allocations() {
        let mut arena = NodeArena::new();
        let head = new_chain(&mut arena, &(0..5).collect::<Vec<_>>());

        let mut counts = NodeCounts::default();
        count_allocations(&arena, head, &mut counts);
        assert_eq!(counts.get(NodeKind::LegacyLeaf), 2);
        assert_eq!(counts.get(NodeKind::Prefix), 0);
    }

    #[test]
    fn test_debug_dump_format() {
        let mut arena = NodeArena::new();
        let head = new_chain(&mut arena, &[1, 2]);
        assert_eq!(debug_dump(&arena, head), "Leaf [count: 2, row ids: 1-2-] ");
    }
}
