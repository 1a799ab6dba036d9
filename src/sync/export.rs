//! File-pair export.
//!
//! Writes a selection of configurations into a directory, one file pair per
//! configuration.
//!
//! # Conflicts
//!
//! When either file of a pair already exists, the exporter asks an
//! [`OverwritePolicy`] what to do. `Skip` leaves both existing files exactly
//! as they were. The policy is called synchronously and may block, for
//! example on a user prompt.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::Configuration;
use crate::sync::codec::{encode, file_pair};
use crate::sync::types::{ExportFailure, ExportStats, OverwriteDecision, SyncError, SyncResult};

/// Decides whether an existing file pair may be replaced.
pub trait OverwritePolicy {
    /// Called once per conflicting configuration, with its name and id.
    fn decide(&mut self, name: &str, id: u64) -> OverwriteDecision;
}

impl<F> OverwritePolicy for F
where
    F: FnMut(&str, u64) -> OverwriteDecision,
{
    fn decide(&mut self, name: &str, id: u64) -> OverwriteDecision {
        self(name, id)
    }
}

/// Policy that always replaces existing files.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOverwrite;

impl OverwritePolicy for AlwaysOverwrite {
    fn decide(&mut self, _name: &str, _id: u64) -> OverwriteDecision {
        OverwriteDecision::Overwrite
    }
}

/// Policy that never touches existing files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipExisting;

impl OverwritePolicy for SkipExisting {
    fn decide(&mut self, _name: &str, _id: u64) -> OverwriteDecision {
        OverwriteDecision::Skip
    }
}

/// Exporter for file pairs.
pub struct Exporter<P> {
    output_dir: PathBuf,
    policy: P,
}

impl<P: OverwritePolicy> Exporter<P> {
    /// Create an exporter writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, policy: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            policy,
        }
    }

    /// Get the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Export each selected configuration.
    ///
    /// Creates the output directory if needed. A configuration whose files
    /// cannot be written is logged and recorded in
    /// [`ExportStats::failed`]; the remaining configurations are still
    /// exported.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Encode`] only if the output directory cannot be
    /// created.
    pub fn export(&mut self, selected: &[Configuration]) -> SyncResult<ExportStats> {
        fs::create_dir_all(&self.output_dir).map_err(|source| SyncError::Encode {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut stats = ExportStats::default();

        for config in selected {
            let pair = file_pair(config, &self.output_dir);
            if pair.any_exists()
                && self.policy.decide(&config.name, config.id) == OverwriteDecision::Skip
            {
                info!(id = config.id, path = %pair.bin.display(), "keeping existing files");
                stats.skipped.push(config.id);
                continue;
            }

            match encode(config, &self.output_dir) {
                Ok(_) => stats.written.push(config.id),
                Err(error) => {
                    warn!(id = config.id, name = %config.name, %error, "export failed");
                    stats.failed.push(ExportFailure {
                        id: config.id,
                        name: config.name.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            dir = %self.output_dir.display(),
            written = stats.written.len(),
            skipped = stats.skipped.len(),
            failed = stats.failed.len(),
            "export finished"
        );
        Ok(stats)
    }
}

/// Export `selected` into `dir` on the blocking pool.
///
/// # Errors
///
/// Returns an error if the output directory cannot be created or the
/// worker fails. Per-item failures are reported in [`ExportStats`].
pub async fn export_configurations<P>(
    selected: Vec<Configuration>,
    dir: impl Into<PathBuf>,
    policy: P,
) -> Result<ExportStats>
where
    P: OverwritePolicy + Send + 'static,
{
    let mut exporter = Exporter::new(dir, policy);
    tokio::task::spawn_blocking(move || exporter.export(&selected))
        .await
        .map_err(|e| Error::Other(format!("export worker failed: {e}")))?
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::codec::decode;
    use tempfile::TempDir;

    fn config(id: u64, name: &str, payload: &[u8]) -> Configuration {
        Configuration::new(id, name, payload.to_vec())
    }

    #[test]
    fn test_export_without_conflicts_never_asks() {
        let temp_dir = TempDir::new().unwrap();
        let mut asked = 0;
        let mut exporter = Exporter::new(temp_dir.path(), |_: &str, _: u64| {
            asked += 1;
            OverwriteDecision::Skip
        });

        let stats = exporter
            .export(&[config(5, "Foo", b"AB"), config(9, "Bar", b"C")])
            .unwrap();

        assert_eq!(stats.written, vec![5, 9]);
        assert!(stats.skipped.is_empty());
        drop(exporter);
        assert_eq!(asked, 0);
    }

    #[test]
    fn test_export_creates_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("exports").join("today");

        let mut exporter = Exporter::new(&out, SkipExisting);
        assert_eq!(exporter.output_dir(), out.as_path());
        exporter.export(&[config(1, "one", b"1")]).unwrap();

        assert!(out.join("DTC_one_1.bin").exists());
        assert!(out.join("DTC_one_1.json").exists());
    }

    #[test]
    fn test_skip_leaves_existing_files_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("DTC_Foo_5.bin"), b"original payload").unwrap();
        fs::write(dir.join("DTC_Foo_5.json"), b"{ hand edited }").unwrap();

        let mut exporter = Exporter::new(dir, SkipExisting);
        let stats = exporter
            .export(&[config(5, "Foo", b"replacement"), config(6, "New", b"n")])
            .unwrap();

        assert_eq!(stats.skipped, vec![5]);
        assert_eq!(stats.written, vec![6]);
        assert_eq!(fs::read(dir.join("DTC_Foo_5.bin")).unwrap(), b"original payload");
        assert_eq!(fs::read(dir.join("DTC_Foo_5.json")).unwrap(), b"{ hand edited }");
    }

    #[test]
    fn test_metadata_alone_counts_as_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("DTC_Foo_5.json"), b"stale").unwrap();

        let mut seen = Vec::new();
        let mut exporter = Exporter::new(dir, |name: &str, id: u64| {
            seen.push((name.to_string(), id));
            OverwriteDecision::Skip
        });
        exporter.export(&[config(5, "Foo", b"AB")]).unwrap();
        drop(exporter);

        assert_eq!(seen, vec![("Foo".to_string(), 5)]);
        assert!(!dir.join("DTC_Foo_5.bin").exists());
    }

    #[test]
    fn test_overwrite_replaces_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("DTC_Foo_5.bin"), b"old").unwrap();

        let mut exporter = Exporter::new(dir, AlwaysOverwrite);
        let stats = exporter.export(&[config(5, "Foo", b"new")]).unwrap();

        assert_eq!(stats.written, vec![5]);
        assert_eq!(
            decode(&dir.join("DTC_Foo_5.bin")).unwrap(),
            config(5, "Foo", b"new")
        );
    }

    #[test]
    fn test_policy_decides_per_configuration() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let first = config(1, "keep", b"v2");
        let second = config(2, "replace", b"v2");
        encode(&config(1, "keep", b"v1"), dir).unwrap();
        encode(&config(2, "replace", b"v1"), dir).unwrap();

        let mut exporter = Exporter::new(dir, |name: &str, _: u64| {
            if name == "keep" {
                OverwriteDecision::Skip
            } else {
                OverwriteDecision::Overwrite
            }
        });
        let stats = exporter.export(&[first, second]).unwrap();

        assert_eq!(stats.skipped, vec![1]);
        assert_eq!(stats.written, vec![2]);
        assert_eq!(fs::read(dir.join("DTC_keep_1.bin")).unwrap(), b"v1");
        assert_eq!(fs::read(dir.join("DTC_replace_2.bin")).unwrap(), b"v2");
    }

    #[test]
    fn test_write_failure_does_not_abort_batch() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        // A directory where the payload file should go cannot be replaced
        fs::create_dir(dir.join("DTC_Blocked_3.bin")).unwrap();

        let mut exporter = Exporter::new(dir, AlwaysOverwrite);
        let stats = exporter
            .export(&[config(3, "Blocked", b"x"), config(4, "Fine", b"y")])
            .unwrap();

        assert_eq!(stats.failed.len(), 1);
        assert_eq!(stats.failed[0].id, 3);
        assert!(matches!(stats.failed[0].error, SyncError::Encode { .. }));
        assert_eq!(stats.written, vec![4]);
        assert!(dir.join("DTC_Fine_4.json").exists());
    }

    #[tokio::test]
    async fn test_export_configurations_runs_on_worker() {
        let temp_dir = TempDir::new().unwrap();
        let stats = export_configurations(
            vec![config(u64::MAX, "max", b"m")],
            temp_dir.path(),
            SkipExisting,
        )
        .await
        .unwrap();

        assert_eq!(stats.written, vec![u64::MAX]);
        let bin = temp_dir.path().join(format!("DTC_max_{}.bin", u64::MAX));
        assert_eq!(decode(&bin).unwrap().id, u64::MAX);
    }
}
