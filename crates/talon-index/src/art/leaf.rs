//! Row-identifier storage behind a key.
//!
//! A key's row ids live in one of three forms. A single row id is
//! inlined in the handle itself and costs no allocation. Two or more row
//! ids become a nested radix tree over their fixed-width big-endian
//! encodings, rooted at a gated handle. Chains of fixed-capacity blocks
//! are the deprecated on-disk form; they are promoted to the nested form
//! before any structural operation touches them.
//!
//! All functions here operate on the terminal handle a key resolves to,
//! never on the key tree above it.

use crate::art::arena::NodeArena;
use crate::art::key::IndexKey;
use crate::art::legacy;
use crate::art::node::{NodeHandle, NodeKind};
use crate::art::prefix;
use crate::art::tree;
use talon_common::{is_local_row_id, RowId};

/// Stores a single row id directly in the handle.
pub fn new_inlined(node: &mut NodeHandle, row_id: RowId) {
    debug_assert!(node.is_empty());
    debug_assert!(is_local_row_id(row_id), "row id {row_id} exceeds inline range");
    *node = NodeHandle::Inlined(row_id);
}

/// Reads the row id out of an inlined handle. Panics on any other form.
pub fn read_inlined(node: NodeHandle) -> RowId {
    match node {
        NodeHandle::Inlined(row_id) => row_id,
        other => panic!("expected inlined row id, found {other:?}"),
    }
}

/// Builds a gated nested set over two or more distinct row ids.
pub fn new_nested(arena: &mut NodeArena, node: &mut NodeHandle, row_ids: &[RowId]) {
    debug_assert!(node.is_empty());
    debug_assert!(row_ids.len() > 1);

    let mut entries: Vec<(IndexKey, RowId)> = row_ids
        .iter()
        .map(|&row_id| (IndexKey::from_row_id(row_id), row_id))
        .collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    debug_assert!(
        entries.windows(2).all(|w| w[0].0 != w[1].0),
        "duplicate row ids in nested set"
    );

    let mut root = tree::construct_from_sorted(arena, &entries, 0, true);
    root.set_gate(true);
    *node = root;
}

/// Grows an inlined handle into a two-element nested set. The shared
/// prefix of the two encodings is compressed above a two-way fork; each
/// arm carries the remainder of its encoding down to an inlined value.
fn insert_into_inlined(arena: &mut NodeArena, node: &mut NodeHandle, row_id: RowId) {
    let existing = read_inlined(*node);
    node.clear();

    let existing_key = IndexKey::from_row_id(existing);
    let new_key = IndexKey::from_row_id(row_id);
    let pos = match existing_key.mismatch_pos(&new_key) {
        Some(pos) => pos,
        None => panic!("duplicate row id {row_id} on inlined growth"),
    };
    let existing_bytes = existing_key.as_bytes();
    let new_bytes = new_key.as_bytes();

    let existing_side =
        prefix::new_path(arena, &existing_bytes[pos + 1..], NodeHandle::Inlined(existing));
    let new_side = prefix::new_path(arena, &new_bytes[pos + 1..], NodeHandle::Inlined(row_id));
    let fork = prefix::fork(
        arena,
        existing_bytes[pos],
        existing_side,
        new_bytes[pos],
        new_side,
    );
    let mut root = prefix::new_path(arena, &existing_bytes[..pos], fork);
    root.set_gate(true);
    *node = root;
}

/// Inserts `row_id` into the store, converting between forms as needed.
/// Inserting a row id the store already holds is a no-op.
pub fn insert(arena: &mut NodeArena, node: &mut NodeHandle, row_id: RowId) {
    debug_assert!(is_local_row_id(row_id), "row id {row_id} exceeds inline range");
    match *node {
        NodeHandle::Empty => new_inlined(node, row_id),
        NodeHandle::Inlined(existing) => {
            if existing != row_id {
                insert_into_inlined(arena, node, row_id);
            }
        }
        NodeHandle::Owned {
            kind: NodeKind::LegacyLeaf,
            ..
        } => {
            promote_from_legacy(arena, node);
            insert(arena, node, row_id);
        }
        NodeHandle::Owned { gate: true, .. } => {
            let key = IndexKey::from_row_id(row_id);
            tree::insert(arena, node, key.as_bytes(), 0, row_id, true);
        }
        other => panic!("insert into non-store handle {other:?}"),
    }
}

/// Moves the single row id of `source` into `target` and clears `source`.
pub fn merge_inlined_into(arena: &mut NodeArena, target: &mut NodeHandle, source: &mut NodeHandle) {
    let row_id = read_inlined(*source);
    insert(arena, target, row_id);
    source.clear();
}

/// Removes `row_id` from the store. Returns true if it was present. A
/// nested set left with a single row id collapses back to the inlined
/// form.
pub fn remove(arena: &mut NodeArena, node: &mut NodeHandle, row_id: RowId) -> bool {
    match *node {
        NodeHandle::Empty => false,
        NodeHandle::Inlined(existing) => {
            if existing == row_id {
                node.clear();
                true
            } else {
                false
            }
        }
        NodeHandle::Owned {
            kind: NodeKind::LegacyLeaf,
            ..
        } => {
            promote_from_legacy(arena, node);
            remove(arena, node, row_id)
        }
        NodeHandle::Owned { gate: true, .. } => {
            let key = IndexKey::from_row_id(row_id);
            let removed = tree::remove(arena, node, key.as_bytes(), 0, row_id, true);
            if removed {
                maybe_collapse(arena, node);
            }
            removed
        }
        other => panic!("remove from non-store handle {other:?}"),
    }
}

/// Collapses a nested set holding exactly one row id into an inlined
/// handle.
fn maybe_collapse(arena: &mut NodeArena, node: &mut NodeHandle) {
    let mut remaining = Vec::with_capacity(1);
    if tree::collect_row_ids(arena, *node, 1, &mut remaining) && remaining.len() == 1 {
        tree::free_subtree(arena, node);
        new_inlined(node, remaining[0]);
    }
}

/// Returns true if the store holds `row_id`. The store must not be in
/// the deprecated form.
pub fn contains_row_id(arena: &NodeArena, node: NodeHandle, row_id: RowId) -> bool {
    match node {
        NodeHandle::Empty => false,
        NodeHandle::Inlined(existing) => existing == row_id,
        NodeHandle::Owned {
            kind: NodeKind::LegacyLeaf,
            ..
        } => panic!("membership probe on deprecated block chain"),
        NodeHandle::Owned { gate: true, .. } => {
            let key = IndexKey::from_row_id(row_id);
            matches!(
                tree::lookup(arena, node, key.as_bytes(), 0),
                Some(NodeHandle::Inlined(found)) if found == row_id
            )
        }
        other => panic!("membership probe on non-store handle {other:?}"),
    }
}

/// Appends the store's row ids to `out`, stopping early when the total
/// would exceed `max_count`. Returns false on early stop. Nested sets
/// yield sorted order; block chains yield their stored order.
pub fn collect(
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
            kind: NodeKind::LegacyLeaf,
            ..
        } => legacy::collect_up_to(arena, node, max_count, out),
        NodeHandle::Owned { gate: true, .. } => {
            tree::collect_row_ids(arena, node, max_count, out)
        }
        other => panic!("collect from non-store handle {other:?}"),
    }
}

/// Replaces a deprecated block chain with the live form: inlined for a
/// single row id, a gated nested set otherwise.
pub fn promote_from_legacy(arena: &mut NodeArena, node: &mut NodeHandle) {
    debug_assert_eq!(node.kind(), Some(NodeKind::LegacyLeaf));
    let mut row_ids = Vec::new();
    legacy::collect_up_to(arena, *node, usize::MAX, &mut row_ids);
    legacy::free(arena, node);

    if row_ids.len() == 1 {
        new_inlined(node, row_ids[0]);
    } else {
        new_nested(arena, node, &row_ids);
    }
}

/// Replaces a gated nested set with a deprecated block chain for
/// checkpointing under the old format. Inlined and already-deprecated
/// stores are left alone.
pub fn demote_to_legacy(arena: &mut NodeArena, node: &mut NodeHandle) {
    if !node.is_gate() {
        return;
    }
    let mut row_ids = Vec::new();
    tree::collect_row_ids(arena, *node, usize::MAX, &mut row_ids);
    tree::free_subtree(arena, node);
    debug_assert!(row_ids.len() > 1);
    *node = legacy::new_chain(arena, &row_ids);
}
