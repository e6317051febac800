//! Generic key → JSON record table.
//!
//! Every table built on [`RecordStore`] has the same three columns:
//! `id TEXT PRIMARY KEY`, `updated INTEGER` (epoch ms) and `data TEXT`
//! (the JSON-encoded payload).

use std::marker::PhantomData;
use std::sync::Arc;

use rusqlite::{params, params_from_iter};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::{self, SharedClock};
use crate::db::Database;
use crate::error::{Result, StoreError};

/// Keys bound per `IN (...)` lookup. SQLite builds older than 3.32 cap a
/// statement at 999 parameters; newer ones at 32766.
pub const MAX_KEYS_PER_QUERY: usize = 999;

/// A stored record with its payload decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    pub id: String,
    pub updated: i64,
    pub payload: T,
}

pub struct RecordStore<T> {
    db: Arc<Database>,
    table: String,
    clock: SharedClock,
    _payload: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordStore<T> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            table: self.table.clone(),
            clock: Arc::clone(&self.clock),
            _payload: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for RecordStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("table", &self.table)
            .field("db", &self.db)
            .finish()
    }
}

/// Table names are spliced into SQL text, so only plain identifiers are accepted.
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTableName(name.to_string()))
    }
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(db: Arc<Database>, table: &str) -> Result<Self> {
        validate_table_name(table)?;
        Ok(Self {
            db,
            table: table.to_string(),
            clock: clock::system(),
            _payload: PhantomData,
        })
    }

    /// Replaces the clock used to stamp `updated`.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Creates the backing table if it does not exist yet.
    pub fn init_schema(&self) -> Result<()> {
        self.db.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    updated INTEGER,
                    data TEXT
                )",
                self.table
            ),
            [],
        )?;
        Ok(())
    }

    /// Inserts or overwrites the record at `key`. Returns the `updated` stamp written.
    ///
    /// Accepts any value that serializes to the same JSON as `T`, so slices
    /// can be stored into a `Vec` table without copying.
    pub fn put<P>(&self, key: &str, payload: &P) -> Result<i64>
    where
        P: Serialize + ?Sized,
    {
        let data = serde_json::to_string(payload)?;
        let now = self.clock.now_millis();
        self.db.execute(
            &format!(
                "INSERT INTO {} (id, data, updated) VALUES (?1, ?2, ?3)
                 ON CONFLICT (id) DO UPDATE SET data = excluded.data, updated = excluded.updated",
                self.table
            ),
            params![key, data, now],
        )?;
        Ok(now)
    }

    /// Point lookup. A missing key is `Ok(None)`.
    pub fn get(&self, key: &str) -> Result<Option<Record<T>>> {
        let row = self.db.query_optional(
            &format!("SELECT id, data, updated FROM {} WHERE id = ?1", self.table),
            params![key],
            raw_row,
        )?;
        row.map(decode).transpose()
    }

    /// Batch lookup. Keys that are not stored are left out; result order is unspecified.
    pub fn get_many<K: AsRef<str>>(&self, keys: &[K]) -> Result<Vec<Record<T>>> {
        let mut records = Vec::new();
        for chunk in keys.chunks(MAX_KEYS_PER_QUERY) {
            let placeholders = (1..=chunk.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ");
            let rows = self.db.query(
                &format!(
                    "SELECT id, data, updated FROM {} WHERE id IN ({})",
                    self.table, placeholders
                ),
                params_from_iter(chunk.iter().map(|k| k.as_ref())),
                raw_row,
            )?;
            for row in rows {
                records.push(decode(row)?);
            }
        }
        Ok(records)
    }

    /// Removes the record. Returns whether a row was deleted.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.db.execute(
            &format!("DELETE FROM {} WHERE id = ?1", self.table),
            params![key],
        )?;
        Ok(removed > 0)
    }
}

type RawRow = (String, String, i64);

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn decode<T: DeserializeOwned>((id, data, updated): RawRow) -> Result<Record<T>> {
    let payload = serde_json::from_str(&data)?;
    Ok(Record {
        id,
        updated,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{memory_database, StepClock};
    use rstest::rstest;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        tags: Vec<String>,
    }

    fn profile(name: &str) -> Profile {
        Profile {
            name: name.to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
        }
    }

    fn store() -> RecordStore<Profile> {
        let store = RecordStore::new(memory_database(), "profiles")
            .unwrap()
            .with_clock(StepClock::shared(1_000, 10));
        store.init_schema().unwrap();
        store
    }

    #[rstest]
    #[case("cache")]
    #[case("user_data")]
    #[case("_private")]
    #[case("T2")]
    fn test_valid_table_names(#[case] name: &str) {
        assert!(validate_table_name(name).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("2cache")]
    #[case("cache; DROP TABLE user")]
    #[case("cache-table")]
    #[case("\"user\"")]
    fn test_invalid_table_names(#[case] name: &str) {
        let err = validate_table_name(name).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTableName(_)));
    }

    #[test]
    fn test_new_rejects_bad_table() {
        let result = RecordStore::<Profile>::new(memory_database(), "bad name");
        assert!(result.is_err());
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let store = store();
        store.init_schema().unwrap();
        store.init_schema().unwrap();
    }

    #[test]
    fn test_put_then_get() {
        let store = store();
        let written = store.put("k", &profile("alice")).unwrap();
        let record = store.get("k").unwrap().unwrap();
        assert_eq!(record.id, "k");
        assert_eq!(record.updated, written);
        assert_eq!(record.payload, profile("alice"));
    }

    #[test]
    fn test_put_overwrites_and_restamps() {
        let store = store();
        let first = store.put("k", &profile("alice")).unwrap();
        let second = store.put("k", &profile("bob")).unwrap();
        assert!(second > first);

        let record = store.get("k").unwrap().unwrap();
        assert_eq!(record.payload, profile("bob"));
        assert_eq!(record.updated, second);

        let count: Vec<i64> = store
            .database()
            .query("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, vec![1]);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = store();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_get_many_subset() {
        let store = store();
        store.put("k1", &profile("one")).unwrap();
        store.put("k3", &profile("three")).unwrap();

        let mut records = store.get_many(&["k1", "k2", "k3"]).unwrap();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["k1", "k3"]);
        assert_eq!(records[1].payload, profile("three"));
    }

    #[test]
    fn test_get_many_empty_input() {
        let store = store();
        let keys: [&str; 0] = [];
        assert!(store.get_many(&keys).unwrap().is_empty());
    }

    #[test]
    fn test_get_many_spans_several_chunks() {
        let store = store();
        let keys: Vec<String> = (0..MAX_KEYS_PER_QUERY * 2 + 10)
            .map(|i| format!("k{}", i))
            .collect();
        store.put("k3", &profile("early")).unwrap();
        store.put(&keys[MAX_KEYS_PER_QUERY + 5], &profile("middle")).unwrap();
        store.put(keys.last().unwrap(), &profile("late")).unwrap();

        let mut names: Vec<String> = store
            .get_many(&keys)
            .unwrap()
            .into_iter()
            .map(|r| r.payload.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["early", "late", "middle"]);
    }

    #[test]
    fn test_get_many_beyond_sqlite_variable_limit() {
        let store = store();
        store.put("present", &profile("p")).unwrap();
        let mut keys: Vec<String> = (0..40_000).map(|i| format!("missing-{}", i)).collect();
        keys.push("present".to_string());

        let records = store.get_many(&keys).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "present");
    }

    #[test]
    fn test_get_many_duplicate_keys() {
        let store = store();
        store.put("k1", &profile("one")).unwrap();
        let records = store.get_many(&["k1", "k1"]).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_delete_reports_removal() {
        let store = store();
        store.put("k", &profile("alice")).unwrap();
        assert!(store.delete("k").unwrap());
        assert!(!store.delete("k").unwrap());
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn test_malformed_blob_is_serialization_error() {
        let store = store();
        store
            .database()
            .execute(
                "INSERT INTO profiles (id, data, updated) VALUES (?1, ?2, ?3)",
                params!["broken", "{not json", 5],
            )
            .unwrap();
        let err = store.get("broken").unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn test_stores_share_one_database() {
        let db = memory_database();
        let a = RecordStore::<Profile>::new(Arc::clone(&db), "a").unwrap();
        let b = RecordStore::<Vec<u32>>::new(db, "b").unwrap();
        a.init_schema().unwrap();
        b.init_schema().unwrap();
        a.put("x", &profile("x")).unwrap();
        b.put("x", &vec![1, 2, 3]).unwrap();
        assert_eq!(b.get("x").unwrap().unwrap().payload, vec![1, 2, 3]);
        assert_eq!(a.get("x").unwrap().unwrap().payload, profile("x"));
    }
}
