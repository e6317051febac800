//! SQLite-backed tables.
//!
//! One [`Database`] owns a single connection. Tables borrow it through an
//! `Arc` and issue one parameterized statement per operation.

pub mod cache;
pub mod record;
pub mod user;

pub use cache::{connect_cache_table, CacheTable};
pub use record::{Record, RecordStore};
pub use user::{AddUserOutcome, UserTable};

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, Params, Row};

use crate::error::{Result, StoreError};

/// Shared connection handle.
pub struct Database {
    conn: Mutex<Connection>,
    location: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.location)
            .finish()
    }
}

/// Strips the optional `sqlite:` scheme. `sqlite::memory:` maps to `:memory:`.
pub fn resolve_path(database_url: &str) -> &str {
    database_url.strip_prefix("sqlite:").unwrap_or(database_url)
}

fn is_memory(path: &str) -> bool {
    path == ":memory:" || path == "memory"
}

impl Database {
    /// Opens (creating if needed) the database at `database_url`.
    pub fn open(database_url: &str) -> Result<Self> {
        let path = resolve_path(database_url);

        let opened = if is_memory(path) {
            Connection::open_in_memory()
        } else {
            // Create parent directories if needed
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| StoreError::Io(format!("{}: {}", parent.display(), e)))?;
                }
            }
            Connection::open(path)
        };
        let conn = opened.map_err(|e| StoreError::Connection(format!("{}: {}", path, e)))?;

        tracing::info!("Database opened: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            location: path.to_string(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Runs one statement and returns the number of rows it changed.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(conn.execute(sql, params)?)
    }

    /// Runs `f` with the connection held for its whole duration, so a
    /// read and the write that depends on it see no interleaved writers.
    pub fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&conn)
    }

    /// Runs a batch of `;`-separated statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(conn.execute_batch(sql)?)
    }

    /// Runs a query and maps every returned row.
    pub fn query<T, P, F>(&self, sql: &str, params: P, map_row: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, map_row)?;
        let values = rows.collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(values)
    }

    /// Runs a query expected to match at most one row.
    pub fn query_optional<T, P, F>(&self, sql: &str, params: P, map_row: F) -> Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let result = conn.query_row(sql, params, map_row);
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
