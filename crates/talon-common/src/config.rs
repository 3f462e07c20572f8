//! Configuration structures for TalonDB indexes.

use crate::types::FormatVersion;
use serde::{Deserialize, Serialize};

/// Configuration for an ART secondary index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// On-disk format version to emit at checkpoint time.
    ///
    /// Reading always accepts both versions; writing `Legacy` forces
    /// duplicate-key leaves into the deprecated linked-block layout.
    pub format_version: FormatVersion,
    /// Initial node arena capacity, in slots.
    pub arena_capacity_hint: usize,
    /// Maximum key size in bytes accepted by the index.
    pub max_key_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            format_version: FormatVersion::Nested,
            arena_capacity_hint: 1024,
            max_key_size: 256,
        }
    }
}

impl IndexConfig {
    /// Returns a configuration that emits the deprecated on-disk layout,
    /// for writing files readable by pre-nested releases.
    pub fn legacy_compatible() -> Self {
        Self {
            format_version: FormatVersion::Legacy,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_config_defaults() {
        let config = IndexConfig::default();
        assert_eq!(config.format_version, FormatVersion::Nested);
        assert_eq!(config.arena_capacity_hint, 1024);
        assert_eq!(config.max_key_size, 256);
    }

    #[test]
    fn test_index_config_legacy_compatible() {
        let config = IndexConfig::legacy_compatible();
        assert_eq!(config.format_version, FormatVersion::Legacy);
        assert_eq!(config.arena_capacity_hint, 1024);
    }

    #[test]
    fn test_index_config_custom() {
        let config = IndexConfig {
            format_version: FormatVersion::Legacy,
            arena_capacity_hint: 65536,
            max_key_size: 64,
        };
        assert_eq!(config.format_version, FormatVersion::Legacy);
        assert_eq!(config.arena_capacity_hint, 65536);
        assert_eq!(config.max_key_size, 64);
    }

    #[test]
    fn test_index_config_clone() {
        let config1 = IndexConfig::default();
        let config2 = config1.clone();
        assert_eq!(config1.format_version, config2.format_version);
        assert_eq!(config1.arena_capacity_hint, config2.arena_capacity_hint);
    }

    #[test]
    fn test_index_config_serde_roundtrip() {
        let original = IndexConfig::legacy_compatible();
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: IndexConfig = serde_json::from_str(&serialized).unwrap();

        assert_eq!(original.format_version, deserialized.format_version);
        assert_eq!(original.arena_capacity_hint, deserialized.arena_capacity_hint);
        assert_eq!(original.max_key_size, deserialized.max_key_size);
    }
}
