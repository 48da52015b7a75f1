//! Concurrent access coordination over the table.

use parking_lot::RwLock;
use serde_json::Map;
use tracing::{error, info};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::persistence::PersistenceAdapter;
use crate::query::{self, Page, SearchTerms};
use crate::record::Record;
use crate::table::Table;

/// Owns the table behind a fair read-write lock and keeps the backing
/// file in step with every acknowledged mutation.
///
/// Readers share the lock. A mutation holds it exclusively across the
/// in-memory edit and the synchronous write-back, so no reader ever
/// observes a partially applied or unpersisted change, and mutations
/// are totally ordered. parking_lot's task-fair policy serves waiters
/// in arrival order, so writers cannot starve under read-heavy load.
#[derive(Debug)]
pub struct Store {
    table: RwLock<Option<Table>>,
    persistence: PersistenceAdapter,
    config: StoreConfig,
}

impl Store {
    /// Loads the backing file and builds the store.
    ///
    /// A failed load leaves the store in a degraded state where every
    /// operation reports `Unavailable`, instead of aborting startup.
    pub fn open(config: StoreConfig) -> Self {
        let persistence = PersistenceAdapter::new(&config);
        let table = match persistence.load() {
            Ok(table) => {
                info!(
                    "loaded {} characters from {}",
                    table.len(),
                    persistence.path().display()
                );
                Some(table)
            }
            Err(e) => {
                error!("failed to load {}: {}", persistence.path().display(), e);
                error!("store starting without data; requests will fail until restart");
                None
            }
        };
        Self {
            table: RwLock::new(table),
            persistence,
            config,
        }
    }

    /// True when the initial load succeeded.
    pub fn is_available(&self) -> bool {
        self.table.read().is_some()
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn read_table<T>(
        &self,
        f: impl FnOnce(&Table) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self.table.read();
        let table = guard.as_ref().ok_or(StoreError::Unavailable)?;
        f(table)
    }

    /// Runs a mutation under the exclusive lock and persists the
    /// result before acknowledging it.
    ///
    /// The write-back happens inside the lock; if it fails the
    /// previous table state is restored, so memory never diverges
    /// from the file.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Table) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.table.write();
        let table = guard.as_mut().ok_or(StoreError::Unavailable)?;
        let before = table.clone();
        let result = match f(table) {
            Ok(value) => value,
            Err(e) => {
                *table = before;
                return Err(e);
            }
        };
        if let Err(e) = self.persistence.save(table) {
            error!("write-back failed, rolling back mutation: {}", e);
            *table = before;
            return Err(e);
        }
        Ok(result)
    }

    /// Snapshot of every record in row order.
    pub fn get_all(&self) -> Result<Vec<Record>, StoreError> {
        self.read_table(|table| Ok(table.all()))
    }

    /// Looks up one record by id.
    pub fn get_by_id(&self, id: i64) -> Result<Record, StoreError> {
        self.read_table(|table| table.get(id))
    }

    /// One page of the listing.
    pub fn paginate(&self, page: usize, limit: usize) -> Result<Page, StoreError> {
        self.read_table(|table| query::paginate(table.rows(), page, limit))
    }

    /// Case-insensitive OR-search over the name columns.
    pub fn search(&self, terms: &SearchTerms) -> Result<Vec<Record>, StoreError> {
        self.read_table(|table| query::search(table.rows(), terms))
    }

    /// Appends a new record and writes the snapshot back.
    pub fn insert(
        &self,
        fields: &Map<String, serde_json::Value>,
    ) -> Result<Record, StoreError> {
        self.mutate(|table| table.insert(fields))
    }

    /// Overwrites fields on a record and writes the snapshot back.
    pub fn update(
        &self,
        id: i64,
        partial: &Map<String, serde_json::Value>,
    ) -> Result<Record, StoreError> {
        self.mutate(|table| table.update(id, partial))
    }

    /// Removes a record and writes the snapshot back.
    pub fn delete(&self, id: i64) -> Result<Record, StoreError> {
        self.mutate(|table| table.delete(id))
    }
}
