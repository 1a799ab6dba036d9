//! Import scanning.
//!
//! Importing happens in two steps. [`scan_directory`] decodes a directory
//! and classifies its file pairs against a freshly reloaded snapshot. The
//! caller then commits whichever subset it wants with
//! [`Gateway::insert`](crate::storage::Gateway::insert). Scanning never
//! writes to the store.

use std::path::PathBuf;

use tracing::info;

use crate::error::{Error, Result};
use crate::storage::Gateway;
use crate::sync::codec::scan_dir;
use crate::sync::reconcile::{classify, Reconciliation};
use crate::sync::types::SkippedFile;

/// Result of scanning a directory for import.
#[derive(Debug, Default)]
pub struct ImportScan {
    /// Decoded candidates split into new and existing.
    pub reconciliation: Reconciliation,
    /// Payload files that could not be decoded.
    pub skipped: Vec<SkippedFile>,
}

/// Scan `dir` and classify its file pairs against the store.
///
/// The snapshot is reloaded before classifying, so the result reflects
/// what is stored right now rather than a stale list.
///
/// # Errors
///
/// - [`Error::NotOpen`] or [`Error::Query`] if the snapshot cannot be
///   reloaded
/// - [`Error::Sync`] if the directory itself cannot be read
pub async fn scan_directory(gateway: &Gateway, dir: impl Into<PathBuf>) -> Result<ImportScan> {
    let snapshot = gateway.list_all().await?;
    let dir = dir.into();

    let report = {
        let dir = dir.clone();
        tokio::task::spawn_blocking(move || scan_dir(&dir))
            .await
            .map_err(|e| Error::Other(format!("scan worker failed: {e}")))??
    };

    let reconciliation = classify(report.candidates, &snapshot);
    info!(
        dir = %dir.display(),
        new = reconciliation.new.len(),
        existing = reconciliation.existing.len(),
        skipped = report.skipped.len(),
        "import scan finished"
    );

    Ok(ImportScan {
        reconciliation,
        skipped: report.skipped,
    })
}
