//! SQLite storage implementation.
//!
//! `SqliteStorage` wraps a single connection and performs the CRUD
//! primitives. It is not shared between threads; the gateway serializes
//! access to it.

use crate::error::{Error, Result};
use crate::model::configuration::{SENTINEL_ID, UNKNOWN_NAME};
use crate::model::Configuration;
use crate::storage::schema::{apply_schema, has_schema};
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default busy timeout when another process holds the database lock.
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Reinterpret an unsigned identity as the signed value stored in SQLite.
///
/// Bit-pattern conversion: ids at or above 2^63 become negative integers
/// and come back unchanged through [`id_from_sql`]. rusqlite's own `u64`
/// binding is range-checked and rejects those ids, so it is never used.
#[must_use]
pub const fn id_to_sql(id: u64) -> i64 {
    i64::from_ne_bytes(id.to_ne_bytes())
}

/// Reinterpret a stored signed integer as the unsigned identity.
#[must_use]
pub const fn id_from_sql(raw: i64) -> u64 {
    u64::from_ne_bytes(raw.to_ne_bytes())
}

/// SQLite-based configuration storage.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open an existing configuration store.
    ///
    /// The file must already exist, be a SQLite database and contain both
    /// configuration tables. Nothing is created or altered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the file is missing, unreadable, not a
    /// database, or lacks the configuration tables.
    pub fn open(path: &Path) -> Result<Self> {
        let open_err = |message: String| Error::Open {
            path: path.to_path_buf(),
            message,
        };

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| open_err(e.to_string()))?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)
            .map_err(|e| open_err(e.to_string()))?;

        match has_schema(&conn) {
            Ok(true) => {}
            Ok(false) => return Err(open_err("configuration tables are missing".to_string())),
            Err(e) => return Err(open_err(e.to_string())),
        }

        debug!(path = %path.display(), "opened configuration store");
        Ok(Self { conn })
    }

    /// Create a configuration store at `path`, or reuse an existing one.
    ///
    /// Creates the file if needed and ensures both tables exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the schema fails.
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        apply_schema(&conn)?;
        debug!(path = %path.display(), "created configuration store");
        Ok(Self { conn })
    }

    /// Open an in-memory store (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside an IMMEDIATE transaction.
    ///
    /// Commits if `f` succeeds. On any error the transaction is dropped,
    /// which rolls it back.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or a database error from begin/commit.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let result = f(&tx)?;

        tx.commit()?;
        debug!(op, "committed");

        Ok(result)
    }

    // ==================
    // Configuration Operations
    // ==================

    /// List every stored configuration except the sentinel.
    ///
    /// Joins the record and name tables on their shared row reference. A
    /// record without a name row is reported as `"Unknown"`. Rows come back
    /// in insertion (row reference) order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if preparing or stepping the query fails.
    pub fn list_configurations(&self) -> Result<Vec<Configuration>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT c.id, COALESCE(n.name, ?1), c.payload
                 FROM configurations c
                 LEFT JOIN configuration_names n ON n.ref = c.ref
                 WHERE c.id != ?2
                 ORDER BY c.ref",
            )
            .map_err(Error::Query)?;

        let rows = stmt
            .query_map(
                rusqlite::params![UNKNOWN_NAME, id_to_sql(SENTINEL_ID)],
                |row| {
                    let payload: Option<Vec<u8>> = row.get(2)?;
                    Ok(Configuration {
                        id: id_from_sql(row.get(0)?),
                        name: row.get(1)?,
                        payload: payload.unwrap_or_default(),
                    })
                },
            )
            .map_err(Error::Query)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::Query)
    }

    /// Insert one configuration into both tables.
    ///
    /// The record row and its name row are written in one transaction; if
    /// either write fails neither row remains. This is a plain insert: an
    /// id that is already stored violates the `UNIQUE` constraint. An
    /// orphaned name row at the new row reference is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReservedId`] for id 0 and [`Error::Write`] if either
    /// statement fails.
    pub fn insert_configuration(&mut self, config: &Configuration) -> Result<()> {
        if config.is_sentinel() {
            return Err(Error::ReservedId);
        }

        self.mutate("insert_configuration", |tx| {
            tx.execute(
                "INSERT INTO configurations (id, payload) VALUES (?1, ?2)",
                rusqlite::params![id_to_sql(config.id), config.payload],
            )?;

            // A name row left behind without its record would collide
            let row_ref = tx.last_insert_rowid();
            tx.execute("DELETE FROM configuration_names WHERE ref = ?1", [row_ref])?;
            tx.execute(
                "INSERT INTO configuration_names (ref, name) VALUES (?1, ?2)",
                rusqlite::params![row_ref, config.name],
            )?;

            Ok(())
        })
        .map_err(|e| write_error(config.id, e))
    }

    /// Delete one configuration from both tables by id.
    ///
    /// The name row is located through a sub-query on the record table, so
    /// it must be removed before the record row. Both deletes share one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReservedId`] for id 0,
    /// [`Error::ConfigurationNotFound`] if no record has this id and
    /// [`Error::Write`] if either statement fails.
    pub fn delete_configuration(&mut self, id: u64) -> Result<()> {
        if id == SENTINEL_ID {
            return Err(Error::ReservedId);
        }
        let raw = id_to_sql(id);

        self.mutate("delete_configuration", |tx| {
            tx.execute(
                "DELETE FROM configuration_names
                 WHERE ref IN (SELECT ref FROM configurations WHERE id = ?1)",
                [raw],
            )?;

            let rows = tx.execute("DELETE FROM configurations WHERE id = ?1", [raw])?;
            if rows == 0 {
                return Err(Error::ConfigurationNotFound { id });
            }

            Ok(())
        })
        .map_err(|e| write_error(id, e))
    }
}

/// Attach the configuration id to raw database failures.
fn write_error(id: u64, err: Error) -> Error {
    match err {
        Error::Database(source) => Error::Write { id, source },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(id: u64, name: &str, payload: &[u8]) -> Configuration {
        Configuration::new(id, name, payload.to_vec())
    }

    #[test]
    fn test_open_memory() {
        let storage = SqliteStorage::open_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_id_reinterpretation_is_bit_exact() {
        assert_eq!(id_to_sql(0), 0);
        assert_eq!(id_to_sql(1), 1);
        assert_eq!(id_to_sql(u64::MAX), -1);
        assert_eq!(id_to_sql(1 << 63), i64::MIN);

        for id in [0, 1, 5, i64::MAX as u64, 1 << 63, u64::MAX - 1, u64::MAX] {
            assert_eq!(id_from_sql(id_to_sql(id)), id);
        }
    }

    #[test]
    fn test_configuration_crud() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        storage
            .insert_configuration(&config(5, "Foo", b"AB"))
            .unwrap();
        storage
            .insert_configuration(&config(9, "Bar", &[0, 255, 7]))
            .unwrap();

        let all = storage.list_configurations().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], config(5, "Foo", b"AB"));
        assert_eq!(all[1], config(9, "Bar", &[0, 255, 7]));

        storage.delete_configuration(5).unwrap();
        let all = storage.list_configurations().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, 9);

        // Name row went with it
        let names: i64 = storage
            .conn()
            .query_row("SELECT COUNT(*) FROM configuration_names", [], |r| r.get(0))
            .unwrap();
        assert_eq!(names, 1);
    }

    #[test]
    fn test_high_bit_ids_round_trip_through_storage() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let big = config(u64::MAX, "max", b"x");
        let half = config(1 << 63, "half", b"y");

        storage.insert_configuration(&big).unwrap();
        storage.insert_configuration(&half).unwrap();

        let all = storage.list_configurations().unwrap();
        assert_eq!(all, vec![big, half]);

        // Stored as the signed bit pattern
        let raw: i64 = storage
            .conn()
            .query_row("SELECT id FROM configurations ORDER BY ref LIMIT 1", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(raw, -1);

        storage.delete_configuration(u64::MAX).unwrap();
        assert_eq!(storage.list_configurations().unwrap().len(), 1);
    }

    #[test]
    fn test_sentinel_rows_are_never_listed() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .conn()
            .execute(
                "INSERT INTO configurations (id, payload) VALUES (0, X'00')",
                [],
            )
            .unwrap();
        storage.insert_configuration(&config(1, "one", b"1")).unwrap();

        let all = storage.list_configurations().unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.iter().all(|c| c.id != 0));
    }

    #[test]
    fn test_insert_sentinel_is_rejected() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let result = storage.insert_configuration(&config(0, "zero", b""));
        assert!(matches!(result, Err(Error::ReservedId)));
    }

    #[test]
    fn test_delete_sentinel_is_rejected() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .conn()
            .execute(
                "INSERT INTO configurations (id, payload) VALUES (0, X'00')",
                [],
            )
            .unwrap();

        let result = storage.delete_configuration(0);
        assert!(matches!(result, Err(Error::ReservedId)));

        let records: i64 = storage
            .conn()
            .query_row("SELECT COUNT(*) FROM configurations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(records, 1);
    }

    #[test]
    fn test_orphan_name_row_does_not_block_insert() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .conn()
            .execute(
                "INSERT INTO configuration_names (ref, name) VALUES (1, 'stale')",
                [],
            )
            .unwrap();

        storage.insert_configuration(&config(42, "fresh", b"42")).unwrap();
        storage.insert_configuration(&config(43, "next", b"43")).unwrap();

        let all = storage.list_configurations().unwrap();
        assert_eq!(all, vec![config(42, "fresh", b"42"), config(43, "next", b"43")]);

        let names: i64 = storage
            .conn()
            .query_row("SELECT COUNT(*) FROM configuration_names", [], |r| r.get(0))
            .unwrap();
        assert_eq!(names, 2);
    }

    #[test]
    fn test_missing_name_row_reads_as_unknown() {
        let storage = SqliteStorage::open_memory().unwrap();
        storage
            .conn()
            .execute(
                "INSERT INTO configurations (id, payload) VALUES (77, X'0102')",
                [],
            )
            .unwrap();

        let all = storage.list_configurations().unwrap();
        assert_eq!(all, vec![config(77, "Unknown", &[1, 2])]);
    }

    #[test]
    fn test_duplicate_insert_fails_without_orphans() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.insert_configuration(&config(3, "first", b"a")).unwrap();

        let result = storage.insert_configuration(&config(3, "second", b"b"));
        assert!(matches!(result, Err(Error::Write { id: 3, .. })));

        let all = storage.list_configurations().unwrap();
        assert_eq!(all, vec![config(3, "first", b"a")]);

        let names: i64 = storage
            .conn()
            .query_row("SELECT COUNT(*) FROM configuration_names", [], |r| r.get(0))
            .unwrap();
        assert_eq!(names, 1);
    }

    #[test]
    fn test_failed_name_write_rolls_back_record() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        // Make every name insert fail
        storage
            .conn()
            .execute_batch(
                "CREATE TRIGGER reject_names BEFORE INSERT ON configuration_names
                 BEGIN SELECT RAISE(ABORT, 'names are read-only'); END;",
            )
            .unwrap();

        let result = storage.insert_configuration(&config(8, "eight", b"8"));
        assert!(matches!(result, Err(Error::Write { id: 8, .. })));

        let records: i64 = storage
            .conn()
            .query_row("SELECT COUNT(*) FROM configurations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(records, 0);
    }

    #[test]
    fn test_delete_missing_id() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let result = storage.delete_configuration(404);
        assert!(matches!(result, Err(Error::ConfigurationNotFound { id: 404 })));
    }

    #[test]
    fn test_open_requires_existing_store() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.db");

        let result = SqliteStorage::open(&missing);
        assert!(matches!(result, Err(Error::Open { .. })));
        assert!(!missing.exists());
    }

    #[test]
    fn test_open_rejects_non_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("garbage.db");
        std::fs::write(&path, vec![b'A'; 4096]).unwrap();

        let result = SqliteStorage::open(&path);
        assert!(matches!(result, Err(Error::Open { .. })));
    }

    #[test]
    fn test_open_rejects_database_without_tables() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE other (x INTEGER);")
            .unwrap();

        let result = SqliteStorage::open(&path);
        assert!(matches!(result, Err(Error::Open { .. })));
    }

    #[test]
    fn test_create_then_open() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.db");

        {
            let mut storage = SqliteStorage::create(&path).unwrap();
            storage.insert_configuration(&config(12, "twelve", b"12")).unwrap();
        }

        let storage = SqliteStorage::open(&path).unwrap();
        let all = storage.list_configurations().unwrap();
        assert_eq!(all, vec![config(12, "twelve", b"12")]);
    }
}
