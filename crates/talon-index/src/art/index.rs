//! Secondary-index facade over the radix tree.
//!
//! [`ArtIndex`] owns the node arena and the root handle and validates
//! input at the boundary; everything below it works on pre-validated
//! keys and row ids. Keys must be non-empty, prefix free, and no longer
//! than the configured maximum.

use crate::art::arena::{CompactionMap, NodeArena, NodeCounts};
use crate::art::key::IndexKey;
use crate::art::leaf;
use crate::art::legacy;
use crate::art::node::{NodeHandle, NodeKind};
use crate::art::tree;
use talon_common::{is_local_row_id, FormatVersion, IndexConfig, Result, RowId, TalonError};

pub struct ArtIndex {
    arena: NodeArena,
    root: NodeHandle,
    config: IndexConfig,
}

impl ArtIndex {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            arena: NodeArena::with_capacity(config.arena_capacity_hint),
            root: NodeHandle::Empty,
            config,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    fn validate(&self, key: &[u8], row_id: RowId) -> Result<()> {
        if key.is_empty() {
            return Err(TalonError::Internal("empty index key".to_string()));
        }
        if key.len() > self.config.max_key_size {
            return Err(TalonError::KeyTooLarge {
                size: key.len(),
                max: self.config.max_key_size,
            });
        }
        if !is_local_row_id(row_id) {
            return Err(TalonError::RowIdOutOfRange { row_id });
        }
        Ok(())
    }

    /// Inserts a key/row-id pair. Duplicate pairs are absorbed.
    pub fn insert(&mut self, key: &[u8], row_id: RowId) -> Result<()> {
        self.validate(key, row_id)?;
        let mut root = self.root;
        tree::insert(&mut self.arena, &mut root, key, 0, row_id, false);
        self.root = root;
        Ok(())
    }

    /// Bulk-builds the index from entries sorted by key. The index must
    /// be empty. Duplicate keys are allowed and become one row-id store.
    pub fn build_sorted(&mut self, entries: Vec<(IndexKey, RowId)>) -> Result<()> {
        if !self.root.is_empty() {
            return Err(TalonError::Internal(
                "bulk build on a non-empty index".to_string(),
            ));
        }
        if entries.is_empty() {
            return Ok(());
        }
        for (key, row_id) in &entries {
            self.validate(key.as_bytes(), *row_id)?;
        }
        self.root = tree::construct_from_sorted(&mut self.arena, &entries, 0, false);
        Ok(())
    }

    /// Returns the row ids stored under `key` in sorted order, or `None`
    /// when there are more than `max_count` of them. An absent key yields
    /// an empty vector.
    pub fn scan_equal(&self, key: &[u8], max_count: usize) -> Option<Vec<RowId>> {
        let mut out = Vec::new();
        match tree::lookup(&self.arena, self.root, key, 0) {
            None => Some(out),
            Some(store) => {
                if leaf::collect(&self.arena, store, max_count, &mut out) {
                    Some(out)
                } else {
                    None
                }
            }
        }
    }

    /// Returns true if `key` maps to `row_id`.
    pub fn contains(&self, key: &[u8], row_id: RowId) -> bool {
        match tree::lookup(&self.arena, self.root, key, 0) {
            None => false,
            Some(store) if store.kind() == Some(NodeKind::LegacyLeaf) => {
                let mut out = Vec::new();
                legacy::collect_up_to(&self.arena, store, usize::MAX, &mut out);
                out.contains(&row_id)
            }
            Some(store) => leaf::contains_row_id(&self.arena, store, row_id),
        }
    }

    /// Removes one key/row-id pair. Returns true if it was present.
    /// Removing the last row id of a key removes the key.
    pub fn delete(&mut self, key: &[u8], row_id: RowId) -> bool {
        let mut root = self.root;
        let removed = tree::remove(&mut self.arena, &mut root, key, 0, row_id, false);
        self.root = root;
        removed
    }

    /// Total number of stored key/row-id pairs.
    pub fn row_count(&self) -> usize {
        let mut out = Vec::new();
        tree::collect_row_ids(&self.arena, self.root, usize::MAX, &mut out);
        out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Compacts the arena and patches every handle in the tree against
    /// the relocation map.
    pub fn vacuum(&mut self) {
        let map = self.arena.compact();
        if map.is_empty() {
            return;
        }
        let mut root = self.root;
        patch_links(&mut self.arena, &mut root, &map);
        self.root = root;
    }

    /// Checks that the tree reaches exactly the allocations the arena
    /// holds, per node kind.
    pub fn verify_allocations(&self) -> Result<()> {
        let mut reached = NodeCounts::default();
        tree::count_nodes(&self.arena, self.root, &mut reached);
        let live = self.arena.live_counts();
        if reached != live {
            return Err(TalonError::IndexCorrupted(format!(
                "allocation mismatch: tree reaches {reached:?}, arena holds {live:?}"
            )));
        }
        Ok(())
    }

    /// Normalizes every row-id store to the configured on-disk form:
    /// block chains for the legacy format, nested sets otherwise.
    pub fn prepare_checkpoint(&mut self) {
        let mut root = self.root;
        match self.config.format_version {
            FormatVersion::Legacy => {
                tree::for_each_leaf(&mut self.arena, &mut root, &mut |arena, store| {
                    leaf::demote_to_legacy(arena, store);
                });
            }
            FormatVersion::Nested => {
                tree::for_each_leaf(&mut self.arena, &mut root, &mut |arena, store| {
                    if store.kind() == Some(NodeKind::LegacyLeaf) {
                        leaf::promote_from_legacy(arena, store);
                    }
                });
            }
        }
        self.root = root;
    }

    #[cfg(test)]
    pub(crate) fn arena(&self) -> &NodeArena {
        &self.arena
    }
}

fn patch_links(arena: &mut NodeArena, node: &mut NodeHandle, map: &CompactionMap) {
    if node.kind() == Some(NodeKind::LegacyLeaf) {
        legacy::compact_in_place(arena, node, map);
        return;
    }
    if let NodeHandle::Owned { slot, kind, gate } = *node {
        let slot = match map.relocated(slot) {
            Some(new_slot) => {
                *node = NodeHandle::Owned {
                    slot: new_slot,
                    kind,
                    gate,
                };
                new_slot
            }
            None => slot,
        };
        match kind {
            NodeKind::Prefix => {
                let mut child = arena.get(slot).as_prefix().child;
                patch_links(arena, &mut child, map);
                arena.get_mut(slot).as_prefix_mut().child = child;
            }
            NodeKind::Branch => {
                let child_count = arena.get(slot).as_branch().len();
                for i in 0..child_count {
                    let mut child = arena.get(slot).as_branch().children[i].1;
                    patch_links(arena, &mut child, map);
                    arena.get_mut(slot).as_branch_mut().children[i].1 = child;
                }
            }
            NodeKind::LegacyLeaf => unreachable!("handled above"),
        }
    }
}
