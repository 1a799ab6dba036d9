//! Configuration management.
//!
//! Resolves where the configuration store lives. There is no configuration
//! file; the only setting is the database path.

use std::path::{Path, PathBuf};

/// Environment variable that overrides the default database path.
pub const DB_ENV_VAR: &str = "DTC_DB";

/// File name of the store inside the data directory.
pub const DB_FILE_NAME: &str = "configurations.db";

/// Get the platform data directory for the store.
///
/// Linux: `~/.local/share/dtc`, macOS: `~/Library/Application Support/dtc`.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "dtc").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Default database path inside [`data_dir`].
#[must_use]
pub fn default_db_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(DB_FILE_NAME))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `DTC_DB` environment variable
/// 3. Platform data directory: `<data dir>/configurations.db`
///
/// # Returns
///
/// Returns the path to the database file, or `None` if no location found.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    resolve_with_env(explicit_path, std::env::var(DB_ENV_VAR).ok())
}

fn resolve_with_env(explicit_path: Option<&Path>, env_value: Option<String>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Some(db_path) = env_value {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    default_db_path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let explicit = PathBuf::from("/custom/path/store.db");
        let result = resolve_with_env(Some(&explicit), Some("/from/env.db".to_string()));
        assert_eq!(result, Some(explicit));
    }

    #[test]
    fn test_env_beats_default() {
        let result = resolve_with_env(None, Some("/from/env.db".to_string()));
        assert_eq!(result, Some(PathBuf::from("/from/env.db")));
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let result = resolve_with_env(None, Some("   ".to_string()));
        assert_eq!(result, default_db_path());
    }

    #[test]
    fn test_default_path_is_in_data_dir() {
        let path = resolve_with_env(None, None).unwrap();
        assert!(path.ends_with(DB_FILE_NAME));
        assert_eq!(path.parent(), data_dir().as_deref());
    }
}
