//! Slot-based arena allocation for ART nodes.
//!
//! Nodes are addressed by stable [`SlotId`] indices rather than raw
//! pointers. Compaction moves live nodes from the tail of the slot vector
//! into free holes and publishes the moves as a central [`CompactionMap`];
//! owning structures patch their links against the map instead of having
//! pointers rewritten underneath them.

use crate::art::node::{Node, NodeKind, SlotId};
use std::collections::HashMap;

/// Per-kind node counters, used for allocation accounting during index
/// verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCounts {
    counts: [usize; NodeKind::COUNT],
}

impl NodeCounts {
    /// Increments the counter for `kind`.
    pub fn increment(&mut self, kind: NodeKind) {
        self.counts[kind as usize] += 1;
    }

    /// Decrements the counter for `kind`.
    pub fn decrement(&mut self, kind: NodeKind) {
        debug_assert!(self.counts[kind as usize] > 0);
        self.counts[kind as usize] -= 1;
    }

    /// Returns the counter for `kind`.
    pub fn get(&self, kind: NodeKind) -> usize {
        self.counts[kind as usize]
    }

    /// Sum over all kinds.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Central old-to-new slot map published by one [`NodeArena::compact`] run.
#[derive(Debug, Default)]
pub struct CompactionMap {
    remap: HashMap<u32, u32>,
}

impl CompactionMap {
    /// Returns the new slot for a relocated node, or `None` if the slot
    /// did not move (including slots already queried and patched: new
    /// slots are never map keys, so patching is idempotent).
    pub fn relocated(&self, slot: SlotId) -> Option<SlotId> {
        self.remap.get(&slot.0).copied().map(SlotId)
    }

    /// Number of relocated nodes.
    pub fn len(&self) -> usize {
        self.remap.len()
    }

    /// Returns true if no node moved.
    pub fn is_empty(&self) -> bool {
        self.remap.is_empty()
    }
}

/// Arena of tree nodes addressed by stable slot indices.
///
/// The arena is borrowed by every leaf-store operation for the duration of
/// one call; it is owned by the enclosing index. Allocation failure is a
/// process abort (vector growth), never a recoverable error.
#[derive(Debug, Default)]
pub struct NodeArena {
    slots: Vec<Option<Node>>,
    free: Vec<u32>,
    live: NodeCounts,
}

impl NodeArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena with room for `capacity` nodes before regrowth.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: NodeCounts::default(),
        }
    }

    /// Allocates a node, reusing a free slot when one exists.
    pub fn alloc(&mut self, node: Node) -> SlotId {
        self.live.increment(node.kind());
        match self.free.pop() {
            Some(index) => {
                debug_assert!(self.slots[index as usize].is_none());
                self.slots[index as usize] = Some(node);
                SlotId(index)
            }
            None => {
                self.slots.push(Some(node));
                SlotId((self.slots.len() - 1) as u32)
            }
        }
    }

    /// Frees the node in `slot`. Freeing an already-free slot is a caller
    /// bug and panics.
    pub fn free(&mut self, slot: SlotId) {
        match self.slots[slot.index()].take() {
            Some(node) => {
                self.live.decrement(node.kind());
                self.free.push(slot.0);
            }
            None => panic!("double free of arena slot {slot}"),
        }
    }

    /// Borrows the node in `slot`. Panics on a freed slot.
    pub fn get(&self, slot: SlotId) -> &Node {
        match &self.slots[slot.index()] {
            Some(node) => node,
            None => panic!("access to freed arena slot {slot}"),
        }
    }

    /// Mutably borrows the node in `slot`. Panics on a freed slot.
    pub fn get_mut(&mut self, slot: SlotId) -> &mut Node {
        match &mut self.slots[slot.index()] {
            Some(node) => node,
            None => panic!("access to freed arena slot {slot}"),
        }
    }

    /// Number of live nodes of `kind`.
    pub fn live_count(&self, kind: NodeKind) -> usize {
        self.live.get(kind)
    }

    /// Per-kind live counters.
    pub fn live_counts(&self) -> NodeCounts {
        self.live
    }

    /// Total number of live nodes.
    pub fn total_live(&self) -> usize {
        self.live.total()
    }

    /// Number of slots currently backing the arena (live + free holes).
    pub fn slot_span(&self) -> usize {
        self.slots.len()
    }

    /// Compacts the arena: moves live nodes from the tail into free holes,
    /// truncates the slot vector, and returns the old-to-new map. After
    /// this call every previously handed-out slot id for a moved node is
    /// stale until patched against the map.
    pub fn compact(&mut self) -> CompactionMap {
        let mut remap = HashMap::new();
        self.free.sort_unstable();

        let mut tail = self.slots.len();
        for i in 0..self.free.len() {
            let hole = self.free[i] as usize;
            while tail > 0 && self.slots[tail - 1].is_none() {
                tail -= 1;
            }
            if hole >= tail {
                break;
            }
            self.slots[hole] = self.slots[tail - 1].take();
            debug_assert!(self.slots[hole].is_some());
            remap.insert((tail - 1) as u32, hole as u32);
            tail -= 1;
        }
        while tail > 0 && self.slots[tail - 1].is_none() {
            tail -= 1;
        }
        self.slots.truncate(tail);
        self.free.clear();

        debug_assert_eq!(self.slots.len(), self.live.total());
        CompactionMap { remap }
    }
}
