//! Scan command implementation.
//!
//! Read-only preview of an import: lists which file pairs in a directory
//! are new to the store and which ids are already stored.

use super::list::ConfigurationRow;
use super::{open_gateway, runtime};
use crate::error::Result;
use crate::model::Configuration;
use crate::sync::{scan_directory, ImportScan};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Execute the scan command.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the directory cannot be
/// listed.
pub fn execute(dir: &Path, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let rt = runtime()?;
    let scan = rt.block_on(async {
        let gateway = open_gateway(db_path).await?;
        let scan = scan_directory(&gateway, dir).await;
        gateway.close();
        scan
    })?;

    if json {
        println!("{}", serde_json::to_string(&scan_json(&scan))?);
    } else {
        print_scan(&scan, dir);
    }
    Ok(())
}

fn rows(configs: &[Configuration]) -> Vec<ConfigurationRow<'_>> {
    configs.iter().map(ConfigurationRow::from).collect()
}

fn scan_json(scan: &ImportScan) -> serde_json::Value {
    serde_json::json!({
        "new": rows(&scan.reconciliation.new),
        "existing": rows(&scan.reconciliation.existing),
        "skipped": scan.skipped.iter().map(|s| serde_json::json!({
            "path": s.path.display().to_string(),
            "error": s.error.to_string(),
        })).collect::<Vec<_>>(),
    })
}

fn print_scan(scan: &ImportScan, dir: &Path) {
    let new = &scan.reconciliation.new;
    let existing = &scan.reconciliation.existing;

    println!("Scanned: {}", dir.display());
    println!();

    println!("{}", format!("New ({})", new.len()).green().bold());
    for config in new {
        println!("  {:>20}  {}", config.id, config.name);
    }

    if !existing.is_empty() {
        println!("{}", format!("Already stored ({})", existing.len()).yellow().bold());
        for config in existing {
            println!("  {:>20}  {}", config.id, config.name);
        }
    }

    if !scan.skipped.is_empty() {
        println!("{}", format!("Skipped ({})", scan.skipped.len()).red().bold());
        for skipped in &scan.skipped {
            println!("  {}", skipped.error);
        }
    }
}
