//! Compressed-prefix segments and forking branch nodes.

use crate::art::arena::NodeArena;
use crate::art::node::{Node, NodeHandle, NodeKind};

/// Maximum key bytes held by a single prefix node. Longer runs chain
/// through multiple nodes.
pub const PREFIX_SIZE: usize = 15;

/// A compressed run of key bytes with a single child.
#[derive(Debug, Clone)]
pub struct PrefixNode {
    /// The stored bytes; only the first `count` are meaningful.
    pub bytes: [u8; PREFIX_SIZE],
    /// Number of meaningful bytes (1..=PREFIX_SIZE).
    pub count: u8,
    /// The subtree below this run.
    pub child: NodeHandle,
}

impl PrefixNode {
    /// Returns the meaningful prefix bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.count as usize]
    }
}

/// A fan-out node holding sorted `(byte, child)` entries.
///
/// Children are binary-searched by byte. The node grows in place; there is
/// no fixed fan-out migration between node sizes.
#[derive(Debug, Clone)]
pub struct BranchNode {
    /// Sorted by byte, no duplicates.
    pub children: Vec<(u8, NodeHandle)>,
}

impl BranchNode {
    /// Returns the child handle for `byte`, if present.
    pub fn find(&self, byte: u8) -> Option<NodeHandle> {
        self.children
            .binary_search_by_key(&byte, |(b, _)| *b)
            .ok()
            .map(|i| self.children[i].1)
    }

    /// Replaces the child handle for `byte`. Panics if absent.
    pub fn set_child(&mut self, byte: u8, child: NodeHandle) {
        match self.children.binary_search_by_key(&byte, |(b, _)| *b) {
            Ok(i) => self.children[i].1 = child,
            Err(_) => panic!("no branch entry for byte {byte:#04x}"),
        }
    }

    /// Adds a child handle for `byte`, keeping entries sorted. Panics on a
    /// duplicate byte.
    pub fn insert_child(&mut self, byte: u8, child: NodeHandle) {
        match self.children.binary_search_by_key(&byte, |(b, _)| *b) {
            Ok(_) => panic!("duplicate branch entry for byte {byte:#04x}"),
            Err(i) => self.children.insert(i, (byte, child)),
        }
    }

    /// Removes and returns the child handle for `byte`, if present.
    pub fn remove_child(&mut self, byte: u8) -> Option<NodeHandle> {
        self.children
            .binary_search_by_key(&byte, |(b, _)| *b)
            .ok()
            .map(|i| self.children.remove(i).1)
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the branch has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Builds the path for a run of key bytes ending in `terminal`.
///
/// An empty run returns `terminal` unchanged; a run short enough for one
/// node allocates a single prefix node; longer runs chain.
pub fn new_path(arena: &mut NodeArena, run: &[u8], terminal: NodeHandle) -> NodeHandle {
    let mut node = terminal;
    for chunk in run.chunks(PREFIX_SIZE).rev() {
        let mut bytes = [0u8; PREFIX_SIZE];
        bytes[..chunk.len()].copy_from_slice(chunk);
        let slot = arena.alloc(Node::Prefix(PrefixNode {
            bytes,
            count: chunk.len() as u8,
            child: node,
        }));
        node = NodeHandle::owned(slot, NodeKind::Prefix);
    }
    node
}

/// Builds a 2-way forking branch at a mismatch byte.
pub fn fork(
    arena: &mut NodeArena,
    byte_a: u8,
    child_a: NodeHandle,
    byte_b: u8,
    child_b: NodeHandle,
) -> NodeHandle {
    debug_assert_ne!(byte_a, byte_b, "fork requires distinct branch bytes");
    let mut children = vec![(byte_a, child_a), (byte_b, child_b)];
    children.sort_unstable_by_key(|(b, _)| *b);
    let slot = arena.alloc(Node::Branch(BranchNode { children }));
    NodeHandle::owned(slot, NodeKind::Branch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_path_empty_run() {
        let mut arena = NodeArena::new();
        let terminal = NodeHandle::Inlined(5);
        let node = new_path(&mut arena, &[], terminal);
        assert_eq!(node, terminal);
        assert_eq!(arena.total_live(), 0);
    }

    #[test]
    fn test_new_path_single_node() {
        let mut arena = NodeArena::new();
        let node = new_path(&mut arena, &[1, 2, 3], NodeHandle::Inlined(5));
        assert_eq!(node.kind(), Some(NodeKind::Prefix));
        assert_eq!(arena.live_count(NodeKind::Prefix), 1);

        let NodeHandle::Owned { slot, .. } = node else {
            panic!("expected owned handle");
        };
        let prefix = arena.get(slot).as_prefix();
        assert_eq!(prefix.as_slice(), &[1, 2, 3]);
        assert_eq!(prefix.child, NodeHandle::Inlined(5));
    }

    #[test]
    fn test_new_path_chains_long_runs() {
        let mut arena = NodeArena::new();
        let run: Vec<u8> = (0..PREFIX_SIZE as u8 * 2 + 3).collect();
        let node = new_path(&mut arena, &run, NodeHandle::Inlined(1));
        assert_eq!(arena.live_count(NodeKind::Prefix), 3);

        // Walk the chain and reassemble the run.
        let mut collected = Vec::new();
        let mut cur = node;
        while let NodeHandle::Owned { slot, .. } = cur {
            let prefix = arena.get(slot).as_prefix();
            collected.extend_from_slice(prefix.as_slice());
            cur = prefix.child;
        }
        assert_eq!(collected, run);
        assert_eq!(cur, NodeHandle::Inlined(1));
    }

    #[test]
    fn test_fork_orders_children() {
        let mut arena = NodeArena::new();
        let node = fork(
            &mut arena,
            9,
            NodeHandle::Inlined(90),
            3,
            NodeHandle::Inlined(30),
        );
        let NodeHandle::Owned { slot, .. } = node else {
            panic!("expected owned handle");
        };
        let branch = arena.get(slot).as_branch();
        assert_eq!(branch.len(), 2);
        assert_eq!(branch.children[0].0, 3);
        assert_eq!(branch.children[1].0, 9);
        assert_eq!(branch.find(3), Some(NodeHandle::Inlined(30)));
        assert_eq!(branch.find(9), Some(NodeHandle::Inlined(90)));
        assert_eq!(branch.find(4), None);
    }

    #[test]
    fn test_branch_insert_remove() {
        let mut branch = BranchNode { children: vec![] };
        branch.insert_child(5, NodeHandle::Inlined(50));
        branch.insert_child(1, NodeHandle::Inlined(10));
        branch.insert_child(9, NodeHandle::Inlined(90));
        assert_eq!(branch.len(), 3);
        assert_eq!(branch.children[0].0, 1);
        assert_eq!(branch.children[2].0, 9);

        branch.set_child(5, NodeHandle::Inlined(55));
        assert_eq!(branch.find(5), Some(NodeHandle::Inlined(55)));

        assert_eq!(branch.remove_child(1), Some(NodeHandle::Inlined(10)));
        assert_eq!(branch.remove_child(1), None);
        assert_eq!(branch.len(), 2);
        assert!(!branch.is_empty());
    }

    #[test]
    #[should_panic(expected = "duplicate branch entry")]
    fn test_branch_duplicate_byte_panics() {
        let mut branch = BranchNode { children: vec![] };
        branch.insert_child(5, NodeHandle::Inlined(1));
        branch.insert_child(5, NodeHandle::Inlined(2));
    }
}
