//! Command implementations.

pub mod completions;
pub mod delete;
pub mod export;
pub mod import;
pub mod init;
pub mod list;
pub mod scan;
pub mod version;

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::Gateway;
use std::path::PathBuf;

/// Create the tokio runtime that drives a command.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}

/// Open the store at the resolved database path.
async fn open_gateway(db_path: Option<&PathBuf>) -> Result<Gateway> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    let gateway = Gateway::new();
    gateway.open(&db_path).await?;
    Ok(gateway)
}
