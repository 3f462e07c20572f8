//! Byte-encoded index keys.

use talon_common::types::ROW_ID_KEY_LEN;
use talon_common::RowId;

/// An order-preserving byte encoding of an index key.
///
/// The index compares keys bytewise, so the upstream encoder is responsible
/// for producing encodings whose byte order matches the value order, and
/// for making them prefix-free (fixed-width numerics already are;
/// variable-length encodings must be terminated).
///
/// Row identifiers stored as keys inside a gated subtree use the fixed
/// 8-byte big-endian encoding from [`IndexKey::from_row_id`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexKey {
    data: Vec<u8>,
}

impl IndexKey {
    /// Wraps an already-encoded key.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Encodes a row identifier as a fixed-width, order-preserving key.
    pub fn from_row_id(row_id: RowId) -> Self {
        Self {
            data: row_id.to_be_bytes().to_vec(),
        }
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the key length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the key is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the first byte position at which this key and `other`
    /// differ, or `None` if one is a prefix of the other (equal keys
    /// included).
    pub fn mismatch_pos(&self, other: &IndexKey) -> Option<usize> {
        let limit = self.data.len().min(other.data.len());
        (0..limit).find(|&i| self.data[i] != other.data[i])
    }
}

impl AsRef<[u8]> for IndexKey {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
