//! Generic radix-tree operations shared by the key tree and the nested
//! row-id sets.
//!
//! Every function takes the arena and a handle; recursion works on a
//! local copy of the child handle and writes it back afterwards, so a
//! restructured child (split, collapse, splice) replaces the stale link
//! in its parent. `in_gate` selects the terminal behavior: inside a gated
//! subtree keys are unique row-id encodings and terminate in an inlined
//! value, outside they terminate in a full row-id store.
//!
//! Keys are assumed prefix free. A key that runs out mid-path or passes
//! through an inlined handle is a contract violation and panics.

use crate::art::arena::{NodeArena, NodeCounts};
use crate::art::key::IndexKey;
use crate::art::leaf;
use crate::art::legacy;
use crate::art::node::{Node, NodeHandle, NodeKind};
use crate::art::prefix::{self, BranchNode};
use talon_common::RowId;

/// Inserts `row_id` under `key`, descending from `depth`.
pub fn insert(
    arena: &mut NodeArena,
    node: &mut NodeHandle,
    key: &[u8],
    depth: usize,
    row_id: RowId,
    in_gate: bool,
) {
    if depth == key.len() {
        if in_gate {
            match *node {
                NodeHandle::Empty => *node = NodeHandle::Inlined(row_id),
                NodeHandle::Inlined(existing) => {
                    debug_assert_eq!(existing, row_id, "row-id key collision in nested set");
                }
                other => panic!("row-id key terminates at allocated node {other:?}"),
            }
        } else {
            leaf::insert(arena, node, row_id);
        }
        return;
    }

    match *node {
        NodeHandle::Empty => {
            *node = prefix::new_path(arena, &key[depth..], NodeHandle::Inlined(row_id));
        }
        NodeHandle::Inlined(_) => {
            panic!("existing key is a strict prefix of the inserted key");
        }
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Prefix,
            ..
        } => {
            let (run, run_len, old_child) = {
                let p = arena.get(slot).as_prefix();
                (p.bytes, p.count as usize, p.child)
            };
            let remaining = &key[depth..];
            let mismatch = run[..run_len]
                .iter()
                .zip(remaining)
                .position(|(a, b)| a != b);
            match mismatch {
                None if remaining.len() >= run_len => {
                    let mut child = old_child;
                    insert(arena, &mut child, key, depth + run_len, row_id, in_gate);
                    arena.get_mut(slot).as_prefix_mut().child = child;
                }
                None => panic!("inserted key is a strict prefix of an existing key"),
                Some(pos) => {
                    // Split the run at the mismatch: the tail of the old
                    // run and the tail of the new key become the two arms
                    // of a fork, with the matched head (if any) kept as a
                    // shorter prefix above it.
                    let was_gate = node.is_gate();
                    arena.free(slot);
                    let existing_side =
                        prefix::new_path(arena, &run[pos + 1..run_len], old_child);
                    let new_side = prefix::new_path(
                        arena,
                        &key[depth + pos + 1..],
                        NodeHandle::Inlined(row_id),
                    );
                    let fork =
                        prefix::fork(arena, run[pos], existing_side, remaining[pos], new_side);
                    let mut replacement = prefix::new_path(arena, &run[..pos], fork);
                    if was_gate {
                        replacement.set_gate(true);
                    }
                    *node = replacement;
                }
            }
        }
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Branch,
            ..
        } => {
            let byte = key[depth];
            match arena.get(slot).as_branch().find(byte) {
                Some(mut child) => {
                    insert(arena, &mut child, key, depth + 1, row_id, in_gate);
                    arena.get_mut(slot).as_branch_mut().set_child(byte, child);
                }
                None => {
                    let path = prefix::new_path(
                        arena,
                        &key[depth + 1..],
                        NodeHandle::Inlined(row_id),
                    );
                    arena.get_mut(slot).as_branch_mut().insert_child(byte, path);
                }
            }
        }
        NodeHandle::Owned {
            kind: NodeKind::LegacyLeaf,
            ..
        } => panic!("block chain on an interior key path"),
    }
}

/// Walks `key` from `depth` and returns the terminal handle, or `None`
/// when the key is absent.
pub fn lookup(arena: &NodeArena, node: NodeHandle, key: &[u8], depth: usize) -> Option<NodeHandle> {
    if depth == key.len() {
        return if node.is_empty() { None } else { Some(node) };
    }
    match node {
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Prefix,
            ..
        } => {
            let p = arena.get(slot).as_prefix();
            let run = p.as_slice();
            let remaining = &key[depth..];
            if remaining.len() < run.len() || remaining[..run.len()] != *run {
                return None;
            }
            lookup(arena, p.child, key, depth + run.len())
        }
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Branch,
            ..
        } => match arena.get(slot).as_branch().find(key[depth]) {
            Some(child) => lookup(arena, child, key, depth + 1),
            None => None,
        },
        _ => None,
    }
}

/// Builds a subtree for a sorted run of entries in one pass, without
/// per-key descent. Duplicate keys become one row-id store; distinct
/// keys fan out at the first byte past their common prefix.
pub fn construct_from_sorted(
    arena: &mut NodeArena,
    entries: &[(IndexKey, RowId)],
    depth: usize,
    in_gate: bool,
) -> NodeHandle {
    debug_assert!(!entries.is_empty());
    debug_assert!(entries.windows(2).all(|w| w[0].0 <= w[1].0));

    let (first_key, first_row) = &entries[0];
    let (last_key, _) = &entries[entries.len() - 1];

    if first_key == last_key {
        if entries.len() == 1 {
            return prefix::new_path(
                arena,
                &first_key.as_bytes()[depth..],
                NodeHandle::Inlined(*first_row),
            );
        }
        debug_assert!(!in_gate, "duplicate row-id keys in nested set");
        let row_ids: Vec<RowId> = entries.iter().map(|(_, r)| *r).collect();
        let mut store = NodeHandle::Empty;
        leaf::new_nested(arena, &mut store, &row_ids);
        return prefix::new_path(arena, &first_key.as_bytes()[depth..], store);
    }

    let first_bytes = first_key.as_bytes();
    let last_bytes = last_key.as_bytes();
    let mut lcp = depth;
    while lcp < first_bytes.len() && lcp < last_bytes.len() && first_bytes[lcp] == last_bytes[lcp] {
        lcp += 1;
    }
    debug_assert!(
        lcp < first_bytes.len() && lcp < last_bytes.len(),
        "prefix-free key set required"
    );

    // Sorted input keeps each fan-out byte contiguous.
    let mut children = Vec::new();
    let mut start = 0;
    while start < entries.len() {
        let byte = entries[start].0.as_bytes()[lcp];
        let mut end = start + 1;
        while end < entries.len() && entries[end].0.as_bytes()[lcp] == byte {
            end += 1;
        }
        let child = construct_from_sorted(arena, &entries[start..end], lcp + 1, in_gate);
        children.push((byte, child));
        start = end;
    }
    let slot = arena.alloc(Node::Branch(BranchNode { children }));
    let branch = NodeHandle::owned(slot, NodeKind::Branch);
    prefix::new_path(arena, &first_bytes[depth..lcp], branch)
}

/// Appends every row id under `node` to `out` in key order, stopping
/// early when the total would exceed `max_count`. Returns false on early
/// stop.
pub fn collect_row_ids(
    arena: &NodeArena,
    node: NodeHandle,
    max_count: usize,
    out: &mut Vec<RowId>,
) -> bool {
    match node {
        NodeHandle::Empty => true,
        NodeHandle::Inlined(row_id) => {
            if out.len() >= max_count {
                return false;
            }
            out.push(row_id);
            true
        }
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Prefix,
            ..
        } => collect_row_ids(arena, arena.get(slot).as_prefix().child, max_count, out),
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Branch,
            ..
        } => {
            for &(_, child) in &arena.get(slot).as_branch().children {
                if !collect_row_ids(arena, child, max_count, out) {
                    return false;
                }
            }
            true
        }
        NodeHandle::Owned {
            kind: NodeKind::LegacyLeaf,
            ..
        } => legacy::collect_up_to(arena, node, max_count, out),
    }
}

/// Removes `row_id` under `key`, descending from `depth`. Returns true
/// if a row id was removed. Emptied nodes are freed on the way back up
/// and single-child branches are spliced into a prefix run.
pub fn remove(
    arena: &mut NodeArena,
    node: &mut NodeHandle,
    key: &[u8],
    depth: usize,
    row_id: RowId,
    in_gate: bool,
) -> bool {
    if depth == key.len() {
        if in_gate {
            return match *node {
                NodeHandle::Inlined(existing) if existing == row_id => {
                    node.clear();
                    true
                }
                _ => false,
            };
        }
        return leaf::remove(arena, node, row_id);
    }

    match *node {
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Prefix,
            ..
        } => {
            let (run_matches, run_len, old_child) = {
                let p = arena.get(slot).as_prefix();
                let run = p.as_slice();
                let remaining = &key[depth..];
                let matches =
                    remaining.len() >= run.len() && remaining[..run.len()] == *run;
                (matches, run.len(), p.child)
            };
            if !run_matches {
                return false;
            }
            let mut child = old_child;
            let removed = remove(arena, &mut child, key, depth + run_len, row_id, in_gate);
            if child.is_empty() {
                arena.free(slot);
                node.clear();
            } else {
                arena.get_mut(slot).as_prefix_mut().child = child;
            }
            removed
        }
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Branch,
            ..
        } => {
            let byte = key[depth];
            let Some(mut child) = arena.get(slot).as_branch().find(byte) else {
                return false;
            };
            let removed = remove(arena, &mut child, key, depth + 1, row_id, in_gate);
            if !removed {
                return false;
            }
            if child.is_empty() {
                arena.get_mut(slot).as_branch_mut().remove_child(byte);
                if arena.get(slot).as_branch().len() == 1 {
                    // A one-way branch carries no information; splice the
                    // surviving edge byte into a prefix run.
                    let (only_byte, only_child) = arena.get(slot).as_branch().children[0];
                    let was_gate = node.is_gate();
                    arena.free(slot);
                    let mut replacement = prefix::new_path(arena, &[only_byte], only_child);
                    if was_gate {
                        replacement.set_gate(true);
                    }
                    *node = replacement;
                }
            } else {
                arena.get_mut(slot).as_branch_mut().set_child(byte, child);
            }
            true
        }
        _ => false,
    }
}

/// Frees every allocation under `node` and clears the handle.
pub fn free_subtree(arena: &mut NodeArena, node: &mut NodeHandle) {
    match *node {
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Prefix,
            ..
        } => {
            let mut child = arena.get(slot).as_prefix().child;
            free_subtree(arena, &mut child);
            arena.free(slot);
        }
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Branch,
            ..
        } => {
            let children = arena.get(slot).as_branch().children.clone();
            for (_, mut child) in children {
                free_subtree(arena, &mut child);
            }
            arena.free(slot);
        }
        NodeHandle::Owned {
            kind: NodeKind::LegacyLeaf,
            ..
        } => {
            legacy::free(arena, node);
            return;
        }
        NodeHandle::Empty | NodeHandle::Inlined(_) => {}
    }
    node.clear();
}

/// Adds the per-kind allocation counts of the subtree to `counts`.
pub fn count_nodes(arena: &NodeArena, node: NodeHandle, counts: &mut NodeCounts) {
    match node {
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Prefix,
            ..
        } => {
            counts.increment(NodeKind::Prefix);
            count_nodes(arena, arena.get(slot).as_prefix().child, counts);
        }
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Branch,
            ..
        } => {
            counts.increment(NodeKind::Branch);
            for &(_, child) in &arena.get(slot).as_branch().children {
                count_nodes(arena, child, counts);
            }
        }
        NodeHandle::Owned {
            kind: NodeKind::LegacyLeaf,
            ..
        } => legacy::count_allocations(arena, node, counts),
        NodeHandle::Empty | NodeHandle::Inlined(_) => {}
    }
}

/// Invokes `f` on every row-id store terminal in the tree: inlined
/// handles, gated nested roots, and block chains. `f` may replace the
/// handle with a different store form but must not change what keys
/// exist.
pub fn for_each_leaf(
    arena: &mut NodeArena,
    node: &mut NodeHandle,
    f: &mut impl FnMut(&mut NodeArena, &mut NodeHandle),
) {
    if node.is_row_id_store() {
        f(arena, node);
        return;
    }
    match *node {
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Prefix,
            ..
        } => {
            let mut child = arena.get(slot).as_prefix().child;
            for_each_leaf(arena, &mut child, f);
            arena.get_mut(slot).as_prefix_mut().child = child;
        }
        NodeHandle::Owned {
            slot,
            kind: NodeKind::Branch,
            ..
        } => {
            // Fan-out is stable under f, so positional iteration is safe.
            let child_count = arena.get(slot).as_branch().len();
            for i in 0..child_count {
                let mut child = arena.get(slot).as_branch().children[i].1;
                for_each_leaf(arena, &mut child, f);
                arena.get_mut(slot).as_branch_mut().children[i].1 = child;
            }
        }
        _ => {}
    }
}
