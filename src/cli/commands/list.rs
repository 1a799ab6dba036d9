//! List command implementation.

use super::{open_gateway, runtime};
use crate::error::Result;
use crate::model::Configuration;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// One row of `dtc list --json`.
///
/// Ids are rendered as decimal strings, like the file-pair metadata.
#[derive(Serialize)]
pub(crate) struct ConfigurationRow<'a> {
    id: String,
    name: &'a str,
    size: usize,
}

impl<'a> From<&'a Configuration> for ConfigurationRow<'a> {
    fn from(config: &'a Configuration) -> Self {
        Self {
            id: config.id.to_string(),
            name: &config.name,
            size: config.payload.len(),
        }
    }
}

#[derive(Serialize)]
struct ListOutput<'a> {
    configurations: Vec<ConfigurationRow<'a>>,
    count: usize,
}

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or queried.
pub fn execute(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let rt = runtime()?;
    let configs = rt.block_on(async {
        let gateway = open_gateway(db_path).await?;
        let configs = gateway.list_all().await;
        gateway.close();
        configs
    })?;

    if json {
        let output = ListOutput {
            configurations: configs.iter().map(ConfigurationRow::from).collect(),
            count: configs.len(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if configs.is_empty() {
        println!("No configurations stored.");
        return Ok(());
    }

    println!("{}", format!("Configurations ({})", configs.len()).cyan().bold());
    for config in configs.iter() {
        println!(
            "  {}  {}  {}",
            format!("{:>20}", config.id).bold(),
            config.name,
            format!("({} bytes)", config.payload.len()).dimmed()
        );
    }

    Ok(())
}
