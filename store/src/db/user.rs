//! User table: identity subject id → profile and sync payload.
//!
//! Unlike the cache, user rows are authoritative. Mutating, reading the
//! payload of, or deleting a user that does not exist is an error.
//!
//! This table does not sit on [`RecordStore`](crate::db::RecordStore): its
//! rows carry `email`, `type` and `created` as separate columns next to the
//! opaque `data` blob, and `add_user` compares those columns before deciding
//! whether to write. `RecordStore` only knows `id`, `updated` and one JSON
//! blob, so the user shape keeps its own statements over the same
//! [`Database`] handle.

use std::sync::Arc;

use newsnow_common::{AccountType, UserData, UserInfo};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::{self, SharedClock};
use crate::config::Config;
use crate::db::Database;
use crate::error::{Result, StoreError};

/// What [`UserTable::add_user`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddUserOutcome {
    Inserted,
    /// An existing row had a different email or account type.
    /// Only `email` and `updated` were written.
    EmailUpdated,
    Unchanged,
}

#[derive(Clone)]
pub struct UserTable {
    db: Arc<Database>,
    clock: SharedClock,
}

impl std::fmt::Debug for UserTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserTable").field("db", &self.db).finish()
    }
}

impl UserTable {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            clock: clock::system(),
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Opens the configured database and creates the table unless
    /// `cache.enabled` is off.
    pub fn connect(config: &Config) -> Result<Self> {
        let db = Arc::new(Database::open(&config.database.url)?);
        let table = Self::new(db);
        if config.cache.enabled {
            table.init()?;
        }
        Ok(table)
    }

    pub fn init(&self) -> Result<()> {
        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS "user" (
                id TEXT PRIMARY KEY,
                email TEXT,
                data TEXT,
                type TEXT,
                created INTEGER,
                updated INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_user_id ON "user"(id);
            "#,
        )?;
        tracing::info!("init user table");
        Ok(())
    }

    /// Records a sign-in.
    ///
    /// New users are inserted with an empty payload. For existing users a
    /// changed email or account type rewrites `email` and `updated` only; the
    /// stored `type` is left as it was. The lookup and the write run under one
    /// connection lock, so concurrent first sign-ins insert exactly once.
    pub fn add_user(
        &self,
        id: &str,
        email: &str,
        account_type: AccountType,
    ) -> Result<AddUserOutcome> {
        self.db.with_conn(|conn| {
            let existing = read_user(conn, id)?;
            let now = self.clock.now_millis();

            match existing {
                None => {
                    conn.execute(
                        r#"INSERT INTO "user" (id, email, data, type, created, updated)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                        params![id, email, "", account_type.as_str(), now, now],
                    )?;
                    tracing::info!("add user {}", id);
                    Ok(AddUserOutcome::Inserted)
                }
                Some(user) if user.email != email || user.account_type != account_type => {
                    if user.account_type != account_type {
                        tracing::warn!(
                            user_id = %id,
                            stored = %user.account_type,
                            requested = %account_type,
                            "account type changed; stored type is not rewritten"
                        );
                    }
                    conn.execute(
                        r#"UPDATE "user" SET email = ?1, updated = ?2 WHERE id = ?3"#,
                        params![email, now, id],
                    )?;
                    tracing::info!("update user {} email", id);
                    Ok(AddUserOutcome::EmailUpdated)
                }
                Some(_) => {
                    tracing::debug!("user {} already exists", id);
                    Ok(AddUserOutcome::Unchanged)
                }
            }
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserInfo>> {
        self.db.with_conn(|conn| read_user(conn, id))
    }

    /// Overwrites the sync payload, stamping `updated` with the given time.
    pub fn set_data(&self, id: &str, value: &str, updated: i64) -> Result<()> {
        let changed = self.db.execute(
            r#"UPDATE "user" SET data = ?1, updated = ?2 WHERE id = ?3"#,
            params![value, updated, id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("set user {} data failed", id)));
        }
        tracing::info!("set {} data", id);
        Ok(())
    }

    /// [`set_data`](Self::set_data) stamped with the current time.
    pub fn set_data_now(&self, id: &str, value: &str) -> Result<()> {
        self.set_data(id, value, self.clock.now_millis())
    }

    pub fn get_data(&self, id: &str) -> Result<UserData> {
        let row = self.db.query_optional(
            r#"SELECT data, updated FROM "user" WHERE id = ?1"#,
            params![id],
            |row| {
                Ok(UserData {
                    data: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    updated: row.get::<_, Option<i64>>(1)?.unwrap_or_default(),
                })
            },
        )?;
        let data = row.ok_or_else(|| StoreError::NotFound(format!("user {} not found", id)))?;
        tracing::debug!("get {} data", id);
        Ok(data)
    }

    /// Serializes `value` as JSON and stores it as the sync payload.
    pub fn set_data_json<T: Serialize>(&self, id: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        self.set_data_now(id, &encoded)
    }

    /// Decodes the sync payload as JSON. An empty payload is `None`.
    pub fn get_data_json<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        let stored = self.get_data(id)?;
        if stored.data.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&stored.data)?))
    }

    pub fn delete_user(&self, id: &str) -> Result<()> {
        let removed = self
            .db
            .execute(r#"DELETE FROM "user" WHERE id = ?1"#, params![id])?;
        if removed == 0 {
            return Err(StoreError::NotFound(format!("delete user {} failed", id)));
        }
        tracing::info!("delete user {}", id);
        Ok(())
    }
}

type UserRow = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i64>,
    Option<i64>,
);

/// Reads one user row. Columns other than `id` are nullable in the schema;
/// missing text and stamps read as empty / zero, a missing type is rejected.
fn read_user(conn: &Connection, id: &str) -> Result<Option<UserInfo>> {
    let row: Option<UserRow> = conn
        .query_row(
            r#"SELECT id, email, data, type, created, updated FROM "user" WHERE id = ?1"#,
            params![id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, email, data, account_type, created, updated)| -> Result<UserInfo> {
        Ok(UserInfo {
            id,
            email: email.unwrap_or_default(),
            data: data.unwrap_or_default(),
            account_type: account_type.unwrap_or_default().parse()?,
            created: created.unwrap_or_default(),
            updated: updated.unwrap_or_default(),
        })
    })
    .transpose()
}
