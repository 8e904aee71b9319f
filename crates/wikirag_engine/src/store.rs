use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use wikirag_core::{HistoryEntry, HistoryStatus, QueueEntry, RunStatus};

pub const SCHEMA_VERSION: i64 = 1;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid timestamp: {0}")]
    Timestamp(String),
    #[error("unsupported schema version {found} (supported: {supported})")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },
    #[error("unknown history status `{0}`")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub scope: String,
    pub owner_id: String,
    pub acquired_at: DateTime<Utc>,
    pub heartbeat_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Durable queue and history tables plus drain leases, on SQLite.
pub struct QueueStore {
    conn: Connection,
}

impl QueueStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn schema_version(&self) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    pub fn migrate(&self) -> Result<(), StoreError> {
        let current = self.schema_version()?;
        if current > SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchemaVersion {
                found: current,
                supported: SCHEMA_VERSION,
            });
        }

        if current < 1 {
            let sql = include_str!("../migrations/0001_export_schema.sql");
            self.conn.execute_batch(sql)?;
            self.conn
                .execute("PRAGMA user_version = 1", [])
                .map(|_| ())?;
        }

        Ok(())
    }

    /// Delete rows of `clear_keys` and insert fresh rows for `insert_keys`,
    /// atomically, for one page.
    pub fn replace_entries(
        &mut self,
        namespace: i32,
        title: &str,
        clear_keys: &[String],
        insert_keys: &[String],
        scheduled_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let scheduled_at = format_timestamp(scheduled_at);
        let tx = self.conn.transaction()?;
        {
            let mut delete = tx.prepare(
                "DELETE FROM export_queue
                 WHERE namespace = ?1 AND title = ?2 AND pipeline_key = ?3",
            )?;
            for key in clear_keys.iter().chain(insert_keys) {
                delete.execute(params![namespace, title, key])?;
            }
            let mut insert = tx.prepare(
                "INSERT INTO export_queue (namespace, title, pipeline_key, scheduled_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for key in insert_keys {
                insert.execute(params![namespace, title, key, scheduled_at])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn clear_entries(
        &self,
        namespace: i32,
        title: &str,
        keys: &[String],
    ) -> Result<usize, StoreError> {
        let mut delete = self.conn.prepare(
            "DELETE FROM export_queue
             WHERE namespace = ?1 AND title = ?2 AND pipeline_key = ?3",
        )?;
        let mut removed = 0;
        for key in keys {
            removed += delete.execute(params![namespace, title, key])?;
        }
        Ok(removed)
    }

    pub fn clear_all(&self) -> Result<usize, StoreError> {
        Ok(self.conn.execute("DELETE FROM export_queue", [])?)
    }

    /// All queue rows, oldest first.
    pub fn queue_entries(&self) -> Result<Vec<QueueEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT namespace, title, pipeline_key, scheduled_at
             FROM export_queue
             ORDER BY scheduled_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(QueueEntry {
                namespace: row.get(0)?,
                title: row.get(1)?,
                pipeline_key: row.get(2)?,
                scheduled_at: timestamp_column(row, 3)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Replace history and queue rows of every provider the run touched;
    /// successes and failures leave a history row, skips do not.
    pub fn store_outcome(
        &mut self,
        status: &RunStatus,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let page = status.page();
        let namespace = page.namespace();
        let title = page.title();
        let timestamp = format_timestamp(status.timestamp().unwrap_or(recorded_at));
        let touched = status.touched_providers();

        let tx = self.conn.transaction()?;
        {
            let mut delete_history = tx.prepare(
                "DELETE FROM export_history
                 WHERE namespace = ?1 AND title = ?2 AND pipeline_key = ?3",
            )?;
            let mut delete_queue = tx.prepare(
                "DELETE FROM export_queue
                 WHERE namespace = ?1 AND title = ?2 AND pipeline_key = ?3",
            )?;
            for key in &touched {
                delete_history.execute(params![namespace, title, key])?;
                delete_queue.execute(params![namespace, title, key])?;
            }

            let mut insert = tx.prepare(
                "INSERT INTO export_history
                    (namespace, title, pipeline_key, status, error_message, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for key in status.success() {
                insert.execute(params![
                    namespace,
                    title,
                    key,
                    HistoryStatus::Success.as_str(),
                    Option::<String>::None,
                    timestamp,
                ])?;
            }
            for (key, message) in status.failed() {
                insert.execute(params![
                    namespace,
                    title,
                    key,
                    HistoryStatus::Fail.as_str(),
                    message,
                    timestamp,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn history_for_page(
        &self,
        namespace: i32,
        title: &str,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT pipeline_key, status, error_message, timestamp
             FROM export_history
             WHERE namespace = ?1 AND title = ?2
             ORDER BY pipeline_key ASC",
        )?;
        let rows = stmt.query_map(params![namespace, title], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                timestamp_column(row, 3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (pipeline_key, status, error_message, timestamp) = row?;
            let status =
                HistoryStatus::parse(&status).ok_or(StoreError::UnknownStatus(status))?;
            entries.push(HistoryEntry {
                pipeline_key,
                status,
                error_message,
                timestamp,
            });
        }
        Ok(entries)
    }

    /// Take the lease for `scope` when it is free or expired. A live lease
    /// is never re-entered, not even by the same owner id.
    pub fn try_acquire_lease(
        &self,
        scope: &str,
        owner_id: &str,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Result<bool, StoreError> {
        let now_text = format_timestamp(now);
        let expires_text = format_timestamp(lease_expiry(now, ttl)?);

        let changes = self.conn.execute(
            "
            INSERT INTO export_leases (scope, owner_id, acquired_at, heartbeat_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(scope) DO UPDATE SET
                owner_id = excluded.owner_id,
                acquired_at = excluded.acquired_at,
                heartbeat_at = excluded.heartbeat_at,
                expires_at = excluded.expires_at
            WHERE export_leases.expires_at <= excluded.acquired_at
            ",
            params![scope, owner_id, now_text, now_text, expires_text],
        )?;

        Ok(changes > 0)
    }

    /// Extend our lease; `false` when it was lost to another owner.
    pub fn heartbeat_lease(
        &self,
        scope: &str,
        owner_id: &str,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Result<bool, StoreError> {
        let changes = self.conn.execute(
            "
            UPDATE export_leases
            SET heartbeat_at = ?3,
                expires_at = ?4
            WHERE scope = ?1
              AND owner_id = ?2
            ",
            params![
                scope,
                owner_id,
                format_timestamp(now),
                format_timestamp(lease_expiry(now, ttl)?)
            ],
        )?;

        Ok(changes > 0)
    }

    pub fn release_lease(&self, scope: &str, owner_id: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM export_leases WHERE scope = ?1 AND owner_id = ?2",
            params![scope, owner_id],
        )?;
        Ok(())
    }

    pub fn lease(&self, scope: &str) -> Result<Option<Lease>, StoreError> {
        let lease = self
            .conn
            .query_row(
                "
                SELECT scope, owner_id, acquired_at, heartbeat_at, expires_at
                FROM export_leases
                WHERE scope = ?1
                ",
                [scope],
                |row| {
                    Ok(Lease {
                        scope: row.get(0)?,
                        owner_id: row.get(1)?,
                        acquired_at: timestamp_column(row, 2)?,
                        heartbeat_at: timestamp_column(row, 3)?,
                        expires_at: timestamp_column(row, 4)?,
                    })
                },
            )
            .optional()?;

        Ok(lease)
    }
}

/// Millisecond RFC 3339 in UTC, so text order matches time order.
fn lease_expiry(now: DateTime<Utc>, ttl: chrono::Duration) -> Result<DateTime<Utc>, StoreError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| StoreError::Timestamp(format!("lease expiry {now} + {ttl} is out of range")))
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|err| StoreError::Timestamp(err.to_string()))
}

fn timestamp_column(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    parse_timestamp(row.get::<_, String>(index)?).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(err))
    })
}
