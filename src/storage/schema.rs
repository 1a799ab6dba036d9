//! Database schema definitions.
//!
//! A configuration is split across two tables that share a row reference:
//! the record table holds identity and payload, the name table holds the
//! display name. There is no migration logic; existing tables are never
//! altered.

use rusqlite::{Connection, Result};

/// Record table name.
pub const RECORD_TABLE: &str = "configurations";

/// Name table name.
pub const NAME_TABLE: &str = "configuration_names";

/// The complete SQL schema for a configuration store.
///
/// `id` holds the bit pattern of the unsigned identity in a signed INTEGER
/// column; see `storage::sqlite::id_to_sql`.
pub const SCHEMA_SQL: &str = r"
-- Record table: identity and payload
CREATE TABLE IF NOT EXISTS configurations (
    ref INTEGER PRIMARY KEY,
    id INTEGER NOT NULL UNIQUE,
    payload BLOB NOT NULL
);

-- Name table: display name keyed by the record's row reference
CREATE TABLE IF NOT EXISTS configuration_names (
    ref INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);
";

/// Apply the schema to a database connection.
///
/// Idempotent: safe to call on a store that already has both tables.
///
/// # Errors
///
/// Returns an error if the SQL execution fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// Check whether both configuration tables exist.
///
/// This is also the first statement run against a freshly opened file, so
/// a file that is not a SQLite database fails here.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
pub fn has_schema(conn: &Connection) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (?1, ?2)",
        [RECORD_TABLE, NAME_TABLE],
        |row| row.get(0),
    )?;
    Ok(count == 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_applies_cleanly() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        assert!(has_schema(&conn).unwrap());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();
        assert!(has_schema(&conn).unwrap());
    }

    #[test]
    fn test_empty_database_has_no_schema() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!has_schema(&conn).unwrap());
    }
}
