//! Configuration model.
//!
//! A configuration is a named, identity-bearing binary blob. The store never
//! looks inside the payload.

use std::collections::HashSet;

/// Id value that marks an invalid record. Never surfaced by reads.
pub const SENTINEL_ID: u64 = 0;

/// Name reported for a record that has no row in the name table.
pub const UNKNOWN_NAME: &str = "Unknown";

/// A stored configuration.
///
/// Configurations are never mutated in place; an update is a delete
/// followed by an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Stable identity, unique within a store.
    pub id: u64,

    /// Human-readable label (not unique)
    pub name: String,

    /// Opaque payload bytes
    pub payload: Vec<u8>,
}

impl Configuration {
    /// Create a configuration from its parts.
    pub fn new(id: u64, name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// Whether this is the sentinel (invalid) record.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_ID
    }
}

/// Collect the ids of a set of configurations.
#[must_use]
pub fn id_set(configs: &[Configuration]) -> HashSet<u64> {
    configs.iter().map(|c| c.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel() {
        assert!(Configuration::new(0, "x", vec![]).is_sentinel());
        assert!(!Configuration::new(1, "x", vec![]).is_sentinel());
    }

    #[test]
    fn test_id_set_deduplicates() {
        let configs = vec![
            Configuration::new(3, "a", b"1".to_vec()),
            Configuration::new(3, "b", b"2".to_vec()),
            Configuration::new(u64::MAX, "c", b"3".to_vec()),
        ];
        let ids = id_set(&configs);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&u64::MAX));
    }
}
