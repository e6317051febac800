//! Cache table: source id → latest list of items.
//!
//! Entries are derived data. Misses are normal and deletes never fail on an
//! absent key.

use std::sync::Arc;

use newsnow_common::{CacheInfo, NewsItem};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::SharedClock;
use crate::config::Config;
use crate::db::record::{Record, RecordStore};
use crate::db::Database;
use crate::error::Result;

pub const CACHE_TABLE: &str = "cache";

pub struct CacheTable<T = NewsItem> {
    store: RecordStore<Vec<T>>,
}

impl<T> Clone for CacheTable<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<T> std::fmt::Debug for CacheTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheTable").field("store", &self.store).finish()
    }
}

fn into_info<T>(record: Record<Vec<T>>) -> CacheInfo<T> {
    CacheInfo {
        id: record.id,
        updated: record.updated,
        items: record.payload,
    }
}

impl<T> CacheTable<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            store: RecordStore::new(db, CACHE_TABLE)?,
        })
    }

    pub fn with_clock(self, clock: SharedClock) -> Self {
        Self {
            store: self.store.with_clock(clock),
        }
    }

    /// Opens the configured database and creates the table unless
    /// `cache.enabled` is off.
    pub fn connect(config: &Config) -> Result<Self> {
        let db = Arc::new(Database::open(&config.database.url)?);
        let table = Self::new(db)?;
        if config.cache.enabled {
            table.init()?;
        }
        Ok(table)
    }

    pub fn init(&self) -> Result<()> {
        self.store.init_schema()?;
        tracing::info!("init cache table");
        Ok(())
    }

    /// Replaces the items stored at `key`, creating the entry if needed.
    pub fn set(&self, key: &str, items: &[T]) -> Result<()> {
        self.store.put(key, items)?;
        tracing::info!("set {} cache", key);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<CacheInfo<T>>> {
        let info = self.store.get(key)?.map(into_info);
        if info.is_some() {
            tracing::debug!("get {} cache", key);
        }
        Ok(info)
    }

    /// Returns the entries among `keys` that exist. Empty input yields an empty list.
    pub fn get_entire<K: AsRef<str>>(&self, keys: &[K]) -> Result<Vec<CacheInfo<T>>> {
        let records = self.store.get_many(keys)?;
        Ok(records.into_iter().map(into_info).collect())
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key)?;
        Ok(())
    }
}

/// Startup helper: `None` means the cache is disabled.
///
/// Failures are logged rather than returned so that a missing database
/// degrades the caller to uncached operation.
pub fn connect_cache_table(config: &Config) -> Option<CacheTable> {
    match CacheTable::connect(config) {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::error!("failed to init database: {}", e);
            None
        }
    }
}
