//! Persistence gateway: connection lifecycle and the configuration snapshot.
//!
//! The gateway owns at most one open [`SqliteStorage`] and the in-memory
//! snapshot of every stored configuration. All store work runs on tokio's
//! blocking pool behind a single mutex, so only one operation touches the
//! connection at a time.
//!
//! # Late results
//!
//! There is no cancellation. A read that is still running when [`Gateway::close`]
//! is called completes normally, but its result is dropped: every open and
//! close bumps a generation counter, and a snapshot is only published if the
//! generation it started under is still current.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::Configuration;
use crate::storage::sqlite::SqliteStorage;

/// Shared, immutable view of the stored configurations.
pub type Snapshot = Arc<Vec<Configuration>>;

/// A single failed item in an insert or delete batch.
#[derive(Debug)]
pub struct ItemFailure {
    /// Id of the configuration that failed.
    pub id: u64,
    /// Name of the configuration that failed.
    pub name: String,
    /// Why it failed.
    pub error: Error,
}

/// Per-item outcome of an insert or delete batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Ids that were written (or removed).
    pub succeeded: Vec<u64>,
    /// Items that failed; the rest of the batch still ran.
    pub failed: Vec<ItemFailure>,
}

impl BatchReport {
    /// Returns true if every item succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Handle to a configuration store.
///
/// Cloning is cheap and yields another handle to the same store. Separate
/// [`Gateway::new`] instances share nothing.
#[derive(Debug, Clone, Default)]
pub struct Gateway {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    storage: Mutex<Option<SqliteStorage>>,
    path: Mutex<Option<PathBuf>>,
    snapshot: RwLock<Snapshot>,
    generation: AtomicU64,
}

impl Inner {
    fn lock_storage(&self) -> MutexGuard<'_, Option<SqliteStorage>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_path(&self) -> MutexGuard<'_, Option<PathBuf>> {
        self.path.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Gateway {
    /// Create a closed gateway with an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an existing store at `path` and load its configurations.
    ///
    /// Any store that is already open is closed first. If opening fails the
    /// gateway stays closed. A failing initial load is logged and leaves an
    /// empty snapshot; the store is still open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the file is missing or not a valid store.
    pub async fn open(&self, path: impl AsRef<Path>) -> Result<()> {
        self.attach(path.as_ref().to_path_buf(), SqliteStorage::open)
            .await
    }

    /// Create a store at `path` (or reuse an existing one) and open it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or schema cannot be created.
    pub async fn create(&self, path: impl AsRef<Path>) -> Result<()> {
        self.attach(path.as_ref().to_path_buf(), SqliteStorage::create)
            .await
    }

    /// Switch to another store: close, then open `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the new store cannot be opened. The
    /// previous store is closed either way.
    pub async fn set_path(&self, path: impl AsRef<Path>) -> Result<()> {
        self.open(path).await
    }

    async fn attach(
        &self,
        path: PathBuf,
        opener: fn(&Path) -> Result<SqliteStorage>,
    ) -> Result<()> {
        self.close();

        let target = path.clone();
        let storage = tokio::task::spawn_blocking(move || opener(&target))
            .await
            .map_err(|e| Error::Other(format!("store worker failed: {e}")))??;

        *self.inner.lock_storage() = Some(storage);
        *self.inner.lock_path() = Some(path.clone());
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        debug!(path = %path.display(), "gateway opened");

        if let Err(e) = self.list_all().await {
            warn!(error = %e, "initial configuration load failed");
        }

        Ok(())
    }

    /// Release the connection and clear the snapshot.
    ///
    /// Idempotent. A read still in flight finishes, but its result is
    /// discarded.
    pub fn close(&self) {
        {
            let mut snapshot = self
                .inner
                .snapshot
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            *snapshot = Arc::default();
        }

        let closed = self.inner.lock_storage().take().is_some();
        self.inner.lock_path().take();

        if closed {
            debug!("gateway closed");
        }
    }

    /// Whether a store is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.lock_storage().is_some()
    }

    /// Path of the open store, if any.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        self.inner.lock_path().clone()
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(
            &self
                .inner
                .snapshot
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Reload every configuration and publish the result as the snapshot.
    ///
    /// The query runs on the blocking pool. The snapshot is replaced in one
    /// step, so readers see either the old or the new list, never a mix.
    ///
    /// # Errors
    ///
    /// - [`Error::Query`] if the query fails; the snapshot is emptied.
    /// - [`Error::NotOpen`] if no store is open, or the store was closed
    ///   while the query ran (the result is discarded).
    pub async fn list_all(&self) -> Result<Snapshot> {
        let generation = self.inner.generation.load(Ordering::SeqCst);

        match self.with_storage(|s| s.list_configurations()).await {
            Ok(rows) => {
                let rows = Arc::new(rows);
                if self.publish(generation, Arc::clone(&rows)) {
                    debug!(count = rows.len(), "snapshot published");
                    Ok(rows)
                } else {
                    debug!("discarding configuration list from a closed store");
                    Err(Error::NotOpen)
                }
            }
            Err(e @ Error::Query(_)) => {
                warn!(error = %e, "configuration query failed");
                self.publish(generation, Arc::default());
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Insert configurations, one transaction per configuration.
    ///
    /// A failure affects only that configuration; it is logged and recorded
    /// in the report while the rest of the batch proceeds. The snapshot is
    /// refreshed afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOpen`] if no store is open. Per-item failures are
    /// reported through [`BatchReport`], not as an error.
    pub async fn insert(&self, configs: &[Configuration]) -> Result<BatchReport> {
        let configs = configs.to_vec();

        let report = self
            .with_storage(move |storage| {
                let mut report = BatchReport::default();
                for config in configs {
                    match storage.insert_configuration(&config) {
                        Ok(()) => report.succeeded.push(config.id),
                        Err(error) => {
                            warn!(id = config.id, name = %config.name, %error, "insert failed");
                            report.failed.push(ItemFailure {
                                id: config.id,
                                name: config.name,
                                error,
                            });
                        }
                    }
                }
                Ok(report)
            })
            .await?;

        info!(
            inserted = report.succeeded.len(),
            failed = report.failed.len(),
            "insert batch finished"
        );
        self.refresh_after_write().await;
        Ok(report)
    }

    /// Delete configurations by id, one transaction per configuration.
    ///
    /// Same isolation as [`Gateway::insert`]; an id that is not stored is
    /// reported as [`Error::ConfigurationNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOpen`] if no store is open.
    pub async fn delete(&self, configs: &[Configuration]) -> Result<BatchReport> {
        let targets: Vec<(u64, String)> = configs.iter().map(|c| (c.id, c.name.clone())).collect();

        let report = self
            .with_storage(move |storage| {
                let mut report = BatchReport::default();
                for (id, name) in targets {
                    match storage.delete_configuration(id) {
                        Ok(()) => report.succeeded.push(id),
                        Err(error) => {
                            warn!(id, name = %name, %error, "delete failed");
                            report.failed.push(ItemFailure { id, name, error });
                        }
                    }
                }
                Ok(report)
            })
            .await?;

        info!(
            deleted = report.succeeded.len(),
            failed = report.failed.len(),
            "delete batch finished"
        );
        self.refresh_after_write().await;
        Ok(report)
    }

    async fn refresh_after_write(&self) {
        if let Err(e) = self.list_all().await {
            warn!(error = %e, "snapshot refresh failed");
        }
    }

    /// Run `f` against the open storage on the blocking pool.
    async fn with_storage<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut SqliteStorage) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = inner.lock_storage();
            let storage = guard.as_mut().ok_or(Error::NotOpen)?;
            f(storage)
        })
        .await
        .map_err(|e| Error::Other(format!("store worker failed: {e}")))?
    }

    /// Replace the snapshot if no open/close happened since `generation`.
    fn publish(&self, generation: u64, rows: Snapshot) -> bool {
        let mut snapshot = self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if self.inner.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        *snapshot = rows;
        true
    }
}
