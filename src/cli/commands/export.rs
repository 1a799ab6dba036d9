//! Export command implementation.
//!
//! Writes stored configurations to a directory as file pairs. Conflicts
//! with existing files are resolved by `--overwrite`, `--skip-existing`,
//! or a y/n prompt when stdin is a terminal. Without a terminal the
//! existing files are kept.

use super::{open_gateway, runtime};
use crate::cli::ExportArgs;
use crate::error::{Error, Result};
use crate::model::Configuration;
use crate::sync::{
    export_configurations, AlwaysOverwrite, ExportStats, OverwriteDecision, OverwritePolicy,
    SkipExisting,
};
use colored::Colorize;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

/// Conflict handling chosen from the command line.
enum CliPolicy {
    Overwrite,
    Skip,
    Prompt,
}

impl CliPolicy {
    fn from_args(args: &ExportArgs) -> Self {
        if args.overwrite {
            Self::Overwrite
        } else if args.skip_existing || !io::stdin().is_terminal() {
            Self::Skip
        } else {
            Self::Prompt
        }
    }
}

impl OverwritePolicy for CliPolicy {
    fn decide(&mut self, name: &str, id: u64) -> OverwriteDecision {
        match self {
            Self::Overwrite => AlwaysOverwrite.decide(name, id),
            Self::Skip => SkipExisting.decide(name, id),
            Self::Prompt => prompt(name, id),
        }
    }
}

/// Ask on stderr; anything but `y`/`yes` keeps the existing files.
fn prompt(name: &str, id: u64) -> OverwriteDecision {
    eprint!("Files for '{name}' ({id}) already exist. Overwrite? [y/N] ");
    let _ = io::stderr().flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return OverwriteDecision::Skip;
    }
    parse_answer(&answer)
}

fn parse_answer(answer: &str) -> OverwriteDecision {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => OverwriteDecision::Overwrite,
        _ => OverwriteDecision::Skip,
    }
}

/// Pick the configurations named by `ids`, or all of them.
fn select(stored: &[Configuration], ids: &[u64]) -> Result<Vec<Configuration>> {
    if ids.is_empty() {
        return Ok(stored.to_vec());
    }
    ids.iter()
        .map(|&id| {
            stored
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or(Error::ConfigurationNotFound { id })
        })
        .collect()
}

/// Execute the export command.
///
/// # Errors
///
/// Returns an error if the store cannot be read, a requested id is not
/// stored, or the output directory cannot be created.
pub fn execute(args: &ExportArgs, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let policy = CliPolicy::from_args(args);
    let rt = runtime()?;

    let stats = rt.block_on(async {
        let gateway = open_gateway(db_path).await?;
        let stored = gateway.list_all().await?;
        gateway.close();

        let selected = select(&stored, &args.ids)?;
        export_configurations(selected, args.dir.clone(), policy).await
    })?;

    if json {
        let output = serde_json::json!({
            "dir": args.dir.display().to_string(),
            "written": ids_json(&stats.written),
            "skipped": ids_json(&stats.skipped),
            "failed": stats.failed.iter().map(|f| serde_json::json!({
                "id": f.id.to_string(),
                "name": f.name,
                "error": f.error.to_string(),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_stats(&stats, &args.dir);
    }

    Ok(())
}

fn ids_json(ids: &[u64]) -> Vec<String> {
    ids.iter().map(u64::to_string).collect()
}

fn print_stats(stats: &ExportStats, dir: &std::path::Path) {
    if stats.total() == 0 {
        println!("No configurations to export.");
        return;
    }

    println!("Export complete: {}", dir.display());
    println!("  Written: {}", stats.written.len().to_string().green());
    if !stats.skipped.is_empty() {
        println!("  Skipped: {}", stats.skipped.len().to_string().yellow());
    }
    for failure in &stats.failed {
        println!(
            "  {} {} ({}): {}",
            "Failed".red().bold(),
            failure.name,
            failure.id,
            failure.error
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y\n"), OverwriteDecision::Overwrite);
        assert_eq!(parse_answer(" YES "), OverwriteDecision::Overwrite);
        assert_eq!(parse_answer("n\n"), OverwriteDecision::Skip);
        assert_eq!(parse_answer("\n"), OverwriteDecision::Skip);
        assert_eq!(parse_answer("maybe"), OverwriteDecision::Skip);
    }

    #[test]
    fn test_select_all_or_by_id() {
        let stored = vec![
            Configuration::new(1, "a", b"1".to_vec()),
            Configuration::new(2, "b", b"2".to_vec()),
        ];

        assert_eq!(select(&stored, &[]).unwrap(), stored);
        assert_eq!(select(&stored, &[2]).unwrap(), vec![stored[1].clone()]);
        assert!(matches!(
            select(&stored, &[2, 7]),
            Err(Error::ConfigurationNotFound { id: 7 })
        ));
    }
}
