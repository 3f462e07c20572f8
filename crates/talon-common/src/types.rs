//! Row identifier and file format types for TalonDB indexes.

use serde::{Deserialize, Serialize};

/// The integer identity of a stored record that an index entry points to.
pub type RowId = u64;

/// Upper bound (exclusive) of the locally representable row id range.
///
/// Row ids below this bound fit directly inside an index node handle with
/// the two top bits clear, so an inlined value can never be confused with
/// any tagged-pointer range in the persisted node encoding.
pub const MAX_LOCAL_ROW_ID: RowId = 1 << 62;

/// Number of bytes in the order-preserving encoding of a row id.
pub const ROW_ID_KEY_LEN: usize = 8;

/// On-disk layout version for row-identifier leaf storage.
///
/// Selects which representation the checkpoint writer emits and which the
/// loader expects. Stored in the index file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FormatVersion {
    /// Pre-nested format: duplicate row ids stored as linked chains of
    /// fixed-capacity blocks. Readable and writable for compatibility.
    Legacy = 1,
    /// Current format: duplicate row ids stored as a gated nested tree.
    Nested = 2,
}

impl FormatVersion {
    /// Parses a version byte from an index file header.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(FormatVersion::Legacy),
            2 => Some(FormatVersion::Nested),
            _ => None,
        }
    }

    /// Returns true if this version predates the nested representation.
    pub fn is_legacy(&self) -> bool {
        matches!(self, FormatVersion::Legacy)
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormatVersion::Legacy => "LEGACY",
            FormatVersion::Nested => "NESTED",
        };
        write!(f, "{}", name)
    }
}

/// Returns true if the row id fits the local representable range and may be
/// inlined into a node handle.
#[inline]
pub fn is_local_row_id(row_id: RowId) -> bool {
    row_id < MAX_LOCAL_ROW_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_row_id_bounds() {
        assert!(is_local_row_id(0));
        assert!(is_local_row_id(100));
        assert!(is_local_row_id(MAX_LOCAL_ROW_ID - 1));

        assert!(!is_local_row_id(MAX_LOCAL_ROW_ID));
        assert!(!is_local_row_id(u64::MAX));
    }

    #[test]
    fn test_max_local_row_id_leaves_tag_bits_clear() {
        // The two top bits of any inlinable row id must be zero.
        assert_eq!((MAX_LOCAL_ROW_ID - 1) >> 62, 0);
        assert_eq!(MAX_LOCAL_ROW_ID, 1u64 << 62);
    }

    #[test]
    fn test_format_version_from_u8() {
        assert_eq!(FormatVersion::from_u8(1), Some(FormatVersion::Legacy));
        assert_eq!(FormatVersion::from_u8(2), Some(FormatVersion::Nested));
        assert_eq!(FormatVersion::from_u8(0), None);
        assert_eq!(FormatVersion::from_u8(3), None);
    }

    #[test]
    fn test_format_version_repr_u8_values() {
        assert_eq!(FormatVersion::Legacy as u8, 1);
        assert_eq!(FormatVersion::Nested as u8, 2);
    }

    #[test]
    fn test_format_version_is_legacy() {
        assert!(FormatVersion::Legacy.is_legacy());
        assert!(!FormatVersion::Nested.is_legacy());
    }

    #[test]
    fn test_format_version_display() {
        assert_eq!(FormatVersion::Legacy.to_string(), "LEGACY");
        assert_eq!(FormatVersion::Nested.to_string(), "NESTED");
    }

    #[test]
    fn test_format_version_serde_roundtrip() {
        for version in [FormatVersion::Legacy, FormatVersion::Nested] {
            let serialized = serde_json::to_string(&version).unwrap();
            let deserialized: FormatVersion = serde_json::from_str(&serialized).unwrap();
            assert_eq!(version, deserialized);
        }
    }

    #[test]
    fn test_format_version_clone_copy() {
        let v1 = FormatVersion::Nested;
        let v2 = v1; // Copy
        let v3 = v1.clone(); // Clone
        assert_eq!(v1, v2);
        assert_eq!(v1, v3);
    }

    #[test]
    fn test_row_id_key_len() {
        assert_eq!(ROW_ID_KEY_LEN, std::mem::size_of::<RowId>());
    }
}
