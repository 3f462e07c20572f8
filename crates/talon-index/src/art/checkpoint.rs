//! Serialization of row-id stores at the checkpoint boundary.
//!
//! Files written under the legacy format hold each key's row ids as a
//! sequence of fixed-size block records. A record is a one-byte row
//! count, `LEAF_SIZE` little-endian row-id slots padded with zeros, and a
//! little-endian link that is either the ordinal of the following record
//! or [`NO_NEXT_BLOCK`]. Writing demotes the in-memory store to a block
//! chain first; reading rebuilds the chain exactly as stored so a
//! rewritten file is byte-identical, except that a single-row record
//! loads straight into the inlined form.

use crate::art::arena::NodeArena;
use crate::art::leaf;
use crate::art::legacy::{self, LEAF_SIZE};
use crate::art::node::{NodeHandle, NodeKind};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use talon_common::{Result, RowId, TalonError};

/// On-disk size of one block record.
pub const BLOCK_WIRE_SIZE: usize = 1 + LEAF_SIZE * 8 + 8;

/// Link value marking the last record of a chain.
pub const NO_NEXT_BLOCK: u64 = u64::MAX;

fn put_block(buf: &mut BytesMut, row_ids: &[RowId], next: u64) {
    debug_assert!(!row_ids.is_empty() && row_ids.len() <= LEAF_SIZE);
    buf.put_u8(row_ids.len() as u8);
    for i in 0..LEAF_SIZE {
        buf.put_u64_le(row_ids.get(i).copied().unwrap_or(0));
    }
    buf.put_u64_le(next);
}

/// Writes the store behind `node` as legacy block records, demoting a
/// nested set to a chain first. The handle is left in the demoted form.
pub fn write_legacy_chain(arena: &mut NodeArena, node: &mut NodeHandle, buf: &mut BytesMut) {
    leaf::demote_to_legacy(arena, node);
    match *node {
        NodeHandle::Inlined(row_id) => put_block(buf, &[row_id], NO_NEXT_BLOCK),
        NodeHandle::Owned {
            kind: NodeKind::LegacyLeaf,
            ..
        } => {
            let mut current = *node;
            let mut ordinal: u64 = 0;
            while let NodeHandle::Owned { slot, .. } = current {
                let block = arena.get(slot).as_legacy();
                let next = block.next;
                ordinal += 1;
                let link = if next.is_empty() { NO_NEXT_BLOCK } else { ordinal };
                put_block(buf, block.as_slice(), link);
                current = next;
            }
        }
        other => panic!("checkpoint of non-store handle {other:?}"),
    }
}

/// Reads one chain of legacy block records and rebuilds the in-memory
/// store. A single record holding one row id loads as an inlined handle;
/// anything else reloads as a block chain with the stored boundaries.
pub fn read_legacy_chain(arena: &mut NodeArena, buf: &mut Bytes) -> Result<NodeHandle> {
    let mut blocks: Vec<Vec<RowId>> = Vec::new();
    loop {
        if buf.remaining() < BLOCK_WIRE_SIZE {
            return Err(TalonError::TruncatedBlock {
                expected: BLOCK_WIRE_SIZE,
                actual: buf.remaining(),
            });
        }
        let count = buf.get_u8() as usize;
        if count == 0 || count > LEAF_SIZE {
            return Err(TalonError::IndexCorrupted(format!(
                "block row count {count} out of range"
            )));
        }
        let mut row_ids = Vec::with_capacity(count);
        for i in 0..LEAF_SIZE {
            let value = buf.get_u64_le();
            if i < count {
                row_ids.push(value);
            }
        }
        let link = buf.get_u64_le();
        blocks.push(row_ids);
        if link == NO_NEXT_BLOCK {
            break;
        }
        if link != blocks.len() as u64 {
            return Err(TalonError::IndexCorrupted(format!(
                "block link {link} does not follow block {}",
                blocks.len() - 1
            )));
        }
    }

    if blocks.len() == 1 && blocks[0].len() == 1 {
        return Ok(NodeHandle::Inlined(blocks[0][0]));
    }
    let mut head = NodeHandle::Empty;
    for block in blocks.iter().rev() {
        head = legacy::new_block(arena, block, head);
    }
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::art::leaf;

    #[test]
    fn test_single_row_id_roundtrips_to_inlined() {
        let mut arena = NodeArena::new();
        let mut node = NodeHandle::Empty;
        leaf::insert(&mut arena, &mut node, 42);

        let mut buf = BytesMut::new();
        write_legacy_chain(&mut arena, &mut node, &mut buf);
        assert_eq!(buf.len(), BLOCK_WIRE_SIZE);

        let mut read_arena = NodeArena::new();
        let mut bytes = buf.freeze();
        let loaded = read_legacy_chain(&mut read_arena, &mut bytes).unwrap();
        assert_eq!(loaded, NodeHandle::Inlined(42));
        assert_eq!(read_arena.total_live(), 0);
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_nested_set_roundtrips_through_blocks() {
        let mut arena = NodeArena::new();
        let mut node = NodeHandle::Empty;
        for row_id in [500u64, 100, 300, 200, 400] {
            leaf::insert(&mut arena, &mut node, row_id);
        }

        let mut buf = BytesMut::new();
        write_legacy_chain(&mut arena, &mut node, &mut buf);
        // Five row ids at a block capacity of four gives two records.
        assert_eq!(buf.len(), 2 * BLOCK_WIRE_SIZE);

        let mut read_arena = NodeArena::new();
        let loaded = read_legacy_chain(&mut read_arena, &mut buf.freeze()).unwrap();
        assert_eq!(loaded.kind(), Some(NodeKind::LegacyLeaf));

        let mut out = Vec::new();
        assert!(leaf::collect(&read_arena, loaded, usize::MAX, &mut out));
        assert_eq!(out, vec![100, 200, 300, 400, 500]);
    }

    #[test]
    fn test_full_blocks_write_exact_record_count() {
        let mut arena = NodeArena::new();
        let ids: Vec<RowId> = (0..12).collect();
        let mut node = legacy::new_chain(&mut arena, &ids);

        let mut buf = BytesMut::new();
        write_legacy_chain(&mut arena, &mut node, &mut buf);
        assert_eq!(buf.len(), 3 * BLOCK_WIRE_SIZE);
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let mut arena = NodeArena::new();
        let mut node = NodeHandle::Empty;
        for row_id in 0..7u64 {
            leaf::insert(&mut arena, &mut node, row_id);
        }

        let mut first = BytesMut::new();
        write_legacy_chain(&mut arena, &mut node, &mut first);

        let mut read_arena = NodeArena::new();
        let mut loaded =
            read_legacy_chain(&mut read_arena, &mut first.clone().freeze()).unwrap();

        let mut second = BytesMut::new();
        write_legacy_chain(&mut read_arena, &mut loaded, &mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncated_record_is_rejected() {
        let mut arena = NodeArena::new();
        let mut node = NodeHandle::Empty;
        leaf::insert(&mut arena, &mut node, 1);

        let mut buf = BytesMut::new();
        write_legacy_chain(&mut arena, &mut node, &mut buf);
        buf.truncate(BLOCK_WIRE_SIZE - 3);

        let mut read_arena = NodeArena::new();
        let err = read_legacy_chain(&mut read_arena, &mut buf.freeze()).unwrap_err();
        assert!(matches!(err, TalonError::TruncatedBlock { .. }));
    }

    #[test]
    fn test_zero_count_record_is_rejected() {
        let mut buf = BytesMut::new();
        put_block(&mut buf, &[1], NO_NEXT_BLOCK);
        buf[0] = 0;

        let mut arena = NodeArena::new();
        let err = read_legacy_chain(&mut arena, &mut buf.freeze()).unwrap_err();
        assert!(matches!(err, TalonError::IndexCorrupted(_)));
    }

    #[test]
    fn test_bad_link_is_rejected() {
        let mut buf = BytesMut::new();
        put_block(&mut buf, &[1, 2, 3, 4], 5);
        put_block(&mut buf, &[5], NO_NEXT_BLOCK);

        let mut arena = NodeArena::new();
        let err = read_legacy_chain(&mut arena, &mut buf.freeze()).unwrap_err();
        assert!(matches!(err, TalonError::IndexCorrupted(_)));
    }
}
