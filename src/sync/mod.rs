//! File-pair export and import.
//!
//! Configurations leave and enter the store as file pairs:
//!
//! - **Codec**: one configuration ↔ `<base>.bin` + `<base>.json`
//! - **Export**: selected configurations → directory, with an overwrite policy
//! - **Import**: directory → candidates classified as new or existing
//!
//! # Example
//!
//! ```ignore
//! use dtc::sync::{export_configurations, scan_directory, SkipExisting};
//!
//! let stats = export_configurations(selected, &dir, SkipExisting).await?;
//!
//! let scan = scan_directory(&gateway, &dir).await?;
//! gateway.insert(&scan.reconciliation.new).await?;
//! ```

mod codec;
mod export;
mod file;
mod import;
mod reconcile;
mod types;

pub use codec::{base_name, decode, encode, file_pair, scan_dir, FILE_PREFIX, NAME_CHARS};
pub use export::{export_configurations, AlwaysOverwrite, Exporter, OverwritePolicy, SkipExisting};
pub use file::atomic_write;
pub use import::{scan_directory, ImportScan};
pub use reconcile::{classify, Reconciliation};
pub use types::{
    ExportFailure, ExportStats, FileMetadata, FilePair, OverwriteDecision, ScanReport,
    SkippedFile, SyncError, SyncResult,
};
