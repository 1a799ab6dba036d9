//! Sync types for file-pair export/import.
//!
//! A configuration travels between stores as a file pair: the raw payload in
//! `<base>.bin` and a small JSON metadata document in `<base>.json`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::Configuration;

/// Metadata document stored next to each payload file.
///
/// `id` is always a decimal string: JSON numbers are commonly read as
/// doubles, which cannot hold every u64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileMetadata {
    /// Decimal form of the configuration id.
    pub id: String,
    /// Configuration name, exactly as stored.
    pub name: String,
}

impl From<&Configuration> for FileMetadata {
    fn from(config: &Configuration) -> Self {
        Self {
            id: config.id.to_string(),
            name: config.name.clone(),
        }
    }
}

/// Paths of an encoded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    /// Raw payload file (`.bin`).
    pub bin: PathBuf,
    /// Metadata file (`.json`).
    pub json: PathBuf,
}

impl FilePair {
    /// Returns true if either file of the pair is already on disk.
    #[must_use]
    pub fn any_exists(&self) -> bool {
        self.bin.exists() || self.json.exists()
    }
}

/// Answer from an overwrite policy for one conflicting configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwriteDecision {
    /// Replace the existing files.
    Overwrite,
    /// Leave both existing files untouched and move on.
    Skip,
}

/// A configuration that could not be exported.
#[derive(Debug)]
pub struct ExportFailure {
    /// Id of the configuration.
    pub id: u64,
    /// Name of the configuration.
    pub name: String,
    /// The write failure.
    pub error: SyncError,
}

/// Outcome of an export batch.
#[derive(Debug, Default)]
pub struct ExportStats {
    /// Ids whose file pair was written.
    pub written: Vec<u64>,
    /// Ids skipped because the policy declined to overwrite.
    pub skipped: Vec<u64>,
    /// Ids whose files could not be written.
    pub failed: Vec<ExportFailure>,
}

impl ExportStats {
    /// Total number of configurations processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.written.len() + self.skipped.len() + self.failed.len()
    }
}

/// A payload file that was found during a scan but could not be decoded.
#[derive(Debug)]
pub struct SkippedFile {
    /// The `.bin` file that was skipped.
    pub path: PathBuf,
    /// Why it was skipped.
    pub error: SyncError,
}

/// Result of scanning a directory for file pairs.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Successfully decoded configurations, in file name order.
    pub candidates: Vec<Configuration>,
    /// Payload files that were skipped.
    pub skipped: Vec<SkippedFile>,
}

/// Sync-specific errors.
///
/// Every variant is recoverable: the affected file or configuration is
/// dropped and the surrounding batch continues.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The `.json` sibling of a payload file does not exist.
    #[error("Missing metadata file: {}", path.display())]
    MissingMetadata {
        /// Expected metadata path.
        path: PathBuf,
    },

    /// The metadata file exists but does not have the expected shape.
    #[error("Malformed metadata in {}: {message}", path.display())]
    MalformedMetadata {
        /// Metadata path.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// Reading a candidate file or directory failed.
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        /// File or directory being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Writing a file of an exported pair failed.
    #[error("Cannot write {}: {source}", path.display())]
    Encode {
        /// File being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_from_configuration_uses_string_id() {
        let config = Configuration::new(u64::MAX, "Max", b"x".to_vec());
        let meta = FileMetadata::from(&config);
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["id"], "18446744073709551615");
        assert!(json["id"].is_string());
        assert_eq!(json["name"], "Max");
    }

    #[test]
    fn test_metadata_rejects_numeric_id() {
        let result: Result<FileMetadata, _> = serde_json::from_str(r#"{"id": 5, "name": "Foo"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_metadata_rejects_extra_fields() {
        let result: Result<FileMetadata, _> =
            serde_json::from_str(r#"{"id": "5", "name": "Foo", "extra": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_export_stats_total() {
        let mut stats = ExportStats::default();
        assert_eq!(stats.total(), 0);

        stats.written = vec![1, 2];
        stats.skipped = vec![3];
        assert_eq!(stats.total(), 3);
    }
}
