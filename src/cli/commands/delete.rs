//! Delete command implementation.

use super::{open_gateway, runtime};
use crate::error::Result;
use crate::model::Configuration;
use crate::storage::ItemFailure;
use colored::Colorize;
use std::path::PathBuf;

/// Execute the delete command.
///
/// Ids that are not stored are reported per item; the others are still
/// deleted.
///
/// # Errors
///
/// Returns the first per-item error if any id could not be deleted, or an
/// error if the store cannot be opened.
pub fn execute(ids: &[u64], db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let rt = runtime()?;
    let report = rt.block_on(async {
        let gateway = open_gateway(db_path).await?;
        let stored = gateway.snapshot();

        // Names only label log lines and output
        let targets: Vec<Configuration> = ids
            .iter()
            .map(|&id| {
                stored
                    .iter()
                    .find(|c| c.id == id)
                    .cloned()
                    .unwrap_or_else(|| Configuration::new(id, "", Vec::new()))
            })
            .collect();

        let report = gateway.delete(&targets).await;
        gateway.close();
        report
    })?;

    if json {
        let output = serde_json::json!({
            "deleted": report.succeeded.iter().map(u64::to_string).collect::<Vec<_>>(),
            "failed": report.failed.iter().map(|f| serde_json::json!({
                "id": f.id.to_string(),
                "error": f.error.to_string(),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        for id in &report.succeeded {
            println!("{} {id}", "Deleted".green());
        }
        for failure in &report.failed {
            println!("{} {}: {}", "Failed".red().bold(), failure.id, failure.error);
        }
    }

    match report.failed.into_iter().next() {
        Some(ItemFailure { error, .. }) => Err(error),
        None => Ok(()),
    }
}
