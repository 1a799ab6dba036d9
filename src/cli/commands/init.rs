//! Initialize a configuration store.
//!
//! Creates the database file and both tables at the resolved path. Other
//! commands only open existing stores and report `NOT_INITIALIZED`
//! otherwise.

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct InitOutput<'a> {
    database: &'a Path,
    created: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// - [`Error::AlreadyInitialized`] if the file exists and `force` is not set
/// - [`Error::Database`] if the file cannot be created or is not a database
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or_else(|| {
        Error::Config("Could not determine a data directory for the store".to_string())
    })?;

    let existed = db_path.exists();
    if existed && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    SqliteStorage::create(&db_path)?;

    if json {
        let output = InitOutput {
            database: &db_path,
            created: !existed,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
    } else if existed {
        println!("Schema verified: {}", db_path.display());
    } else {
        println!("Initialized configuration store");
        println!("  Database: {}", db_path.display());
    }

    Ok(())
}
