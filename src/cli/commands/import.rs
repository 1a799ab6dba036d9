//! Import command implementation.
//!
//! Scans a directory, then inserts either every new file pair
//! (`--all-new`) or the new ones named by `--ids`. Ids that are already
//! stored are never imported.

use super::{open_gateway, runtime};
use crate::cli::ImportArgs;
use crate::error::{Error, Result};
use crate::model::Configuration;
use crate::storage::BatchReport;
use crate::sync::scan_directory;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

/// Pick the configurations to import from the scan's new partition.
fn select(
    new: &[Configuration],
    existing: &[Configuration],
    args: &ImportArgs,
) -> Result<Vec<Configuration>> {
    if args.all_new {
        return Ok(new.to_vec());
    }

    args.ids
        .iter()
        .map(|&id| {
            if let Some(config) = new.iter().find(|c| c.id == id) {
                Ok(config.clone())
            } else if existing.iter().any(|c| c.id == id) {
                Err(Error::InvalidArgument(format!(
                    "Configuration {id} is already stored; delete it first to re-import"
                )))
            } else {
                Err(Error::InvalidArgument(format!(
                    "No file pair with id {id} in {}",
                    args.dir.display()
                )))
            }
        })
        .collect()
}

/// Execute the import command.
///
/// # Errors
///
/// Returns an error if the store or directory cannot be read, or a
/// requested id is not among the new file pairs. Nothing is inserted in
/// that case.
pub fn execute(args: &ImportArgs, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let rt = runtime()?;
    let (report, skipped) = rt.block_on(async {
        let gateway = open_gateway(db_path).await?;
        let scan = scan_directory(&gateway, &args.dir).await?;
        let selected = select(
            &scan.reconciliation.new,
            &scan.reconciliation.existing,
            args,
        )?;
        debug!(count = selected.len(), "importing selected configurations");

        let report = gateway.insert(&selected).await?;
        gateway.close();
        Ok::<_, Error>((report, scan.skipped.len()))
    })?;

    if json {
        let output = serde_json::json!({
            "imported": report.succeeded.iter().map(u64::to_string).collect::<Vec<_>>(),
            "failed": report.failed.iter().map(|f| serde_json::json!({
                "id": f.id.to_string(),
                "name": f.name,
                "error": f.error.to_string(),
            })).collect::<Vec<_>>(),
            "skipped_files": skipped,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_report(&report, skipped);
    }

    Ok(())
}

fn print_report(report: &BatchReport, skipped_files: usize) {
    if report.succeeded.is_empty() && report.failed.is_empty() {
        println!("Nothing to import.");
    } else {
        println!(
            "Imported {} configuration(s)",
            report.succeeded.len().to_string().green()
        );
    }
    for failure in &report.failed {
        println!(
            "  {} {} ({}): {}",
            "Failed".red().bold(),
            failure.name,
            failure.id,
            failure.error
        );
    }
    if skipped_files > 0 {
        println!("  {skipped_files} unreadable file(s) ignored; run 'dtc scan' for details");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(ids: Vec<u64>, all_new: bool) -> ImportArgs {
        ImportArgs {
            dir: PathBuf::from("in"),
            ids,
            all_new,
        }
    }

    #[test]
    fn test_select_from_new_only() {
        let new = vec![Configuration::new(9, "Bar", b"C".to_vec())];
        let existing = vec![Configuration::new(5, "Foo", b"AB".to_vec())];

        assert_eq!(select(&new, &existing, &args(vec![], true)).unwrap(), new);
        assert_eq!(select(&new, &existing, &args(vec![9], false)).unwrap(), new);
        assert!(matches!(
            select(&new, &existing, &args(vec![5], false)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            select(&new, &existing, &args(vec![9, 11], false)),
            Err(Error::InvalidArgument(_))
        ));
    }
}
