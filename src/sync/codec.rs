//! File-pair codec.
//!
//! A configuration is written as two files sharing a base name:
//!
//! ```text
//! DTC_<first 12 chars of name>_<id>.bin   raw payload bytes
//! DTC_<first 12 chars of name>_<id>.json  {"id": "<decimal id>", "name": "<name>"}
//! ```
//!
//! The file name is only a label. Decoding trusts the metadata document for
//! identity and name, never the file name.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::model::Configuration;
use crate::sync::file::atomic_write;
use crate::sync::types::{
    FileMetadata, FilePair, ScanReport, SkippedFile, SyncError, SyncResult,
};

/// Fixed prefix of every exported file name.
pub const FILE_PREFIX: &str = "DTC";

/// Number of name characters kept in the file name.
pub const NAME_CHARS: usize = 12;

/// Extension of payload files.
pub const BIN_EXTENSION: &str = "bin";

/// Extension of metadata files.
pub const JSON_EXTENSION: &str = "json";

/// Characters that cannot appear in a file name on common platforms.
const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Base file name (without extension) for a configuration.
///
/// Keeps the first [`NAME_CHARS`] characters of the name, with path
/// separators and other unsafe characters replaced by `_`.
#[must_use]
pub fn base_name(config: &Configuration) -> String {
    let label: String = config
        .name
        .chars()
        .take(NAME_CHARS)
        .map(|c| {
            if c.is_control() || UNSAFE_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("{FILE_PREFIX}_{label}_{}", config.id)
}

/// Target paths of a configuration's file pair inside `dir`.
#[must_use]
pub fn file_pair(config: &Configuration, dir: &Path) -> FilePair {
    let base = base_name(config);
    FilePair {
        bin: dir.join(format!("{base}.{BIN_EXTENSION}")),
        json: dir.join(format!("{base}.{JSON_EXTENSION}")),
    }
}

/// Write a configuration as a file pair in `dir`.
///
/// Existing files are replaced; conflict handling belongs to the caller.
///
/// # Errors
///
/// Returns [`SyncError::Encode`] if either file cannot be written.
pub fn encode(config: &Configuration, dir: &Path) -> SyncResult<FilePair> {
    let pair = file_pair(config, dir);

    atomic_write(&pair.bin, &config.payload).map_err(|source| SyncError::Encode {
        path: pair.bin.clone(),
        source,
    })?;

    let metadata = serde_json::to_vec_pretty(&FileMetadata::from(config)).map_err(|e| {
        SyncError::Encode {
            path: pair.json.clone(),
            source: e.into(),
        }
    })?;
    atomic_write(&pair.json, &metadata).map_err(|source| SyncError::Encode {
        path: pair.json.clone(),
        source,
    })?;

    debug!(id = config.id, path = %pair.bin.display(), "encoded configuration");
    Ok(pair)
}

/// Read a configuration back from its payload file.
///
/// The metadata file is the payload path with its extension replaced by
/// `.json`.
///
/// # Errors
///
/// - [`SyncError::MissingMetadata`] if the metadata file does not exist
/// - [`SyncError::MalformedMetadata`] if it is not `{"id": "<u64>", "name": "<text>"}`
/// - [`SyncError::Io`] if either file cannot be read
pub fn decode(bin: &Path) -> SyncResult<Configuration> {
    let json = bin.with_extension(JSON_EXTENSION);
    if !json.is_file() {
        return Err(SyncError::MissingMetadata { path: json });
    }

    let raw = fs::read(&json).map_err(|source| SyncError::Io {
        path: json.clone(),
        source,
    })?;
    let metadata: FileMetadata =
        serde_json::from_slice(&raw).map_err(|e| SyncError::MalformedMetadata {
            path: json.clone(),
            message: e.to_string(),
        })?;
    let id = parse_id(&metadata.id).ok_or_else(|| SyncError::MalformedMetadata {
        path: json.clone(),
        message: format!("id is not an unsigned 64-bit decimal: {:?}", metadata.id),
    })?;

    let payload = fs::read(bin).map_err(|source| SyncError::Io {
        path: bin.to_path_buf(),
        source,
    })?;

    Ok(Configuration {
        id,
        name: metadata.name,
        payload,
    })
}

/// Parse a plain decimal u64 (digits only, no sign or whitespace).
fn parse_id(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Decode every file pair in `dir`.
///
/// Payload files are visited in file name order. A file that fails to
/// decode is logged and listed in [`ScanReport::skipped`]; it never aborts
/// the scan.
///
/// # Errors
///
/// Returns [`SyncError::Io`] only if the directory itself cannot be read.
pub fn scan_dir(dir: &Path) -> SyncResult<ScanReport> {
    let io_err = |source| SyncError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut bins: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == BIN_EXTENSION) {
            bins.push(path);
        }
    }
    bins.sort();

    let mut report = ScanReport::default();
    for bin in bins {
        match decode(&bin) {
            Ok(config) => report.candidates.push(config),
            Err(error) => {
                warn!(path = %bin.display(), %error, "skipping file");
                report.skipped.push(SkippedFile { path: bin, error });
            }
        }
    }

    debug!(
        dir = %dir.display(),
        candidates = report.candidates.len(),
        skipped = report.skipped.len(),
        "scan finished"
    );
    Ok(report)
}
