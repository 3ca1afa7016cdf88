//! SQLite-backed observation store.
//!
//! One async connection serializes the engine's writes with report and prune
//! reads, which covers the single-writer-plus-readers contract. Timestamps
//! are stored as RFC 3339 UTC text; chrono emits fixed subsecond widths, so
//! lexicographic comparison in SQL matches chronological order.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::CheckRecord;

pub struct CheckStore {
    conn: Connection,
}

impl CheckStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(path).await?;
        let store = Self { conn };
        store.init_schema().await?;
        Ok(store)
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        let store = Self { conn };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    r#"
                    CREATE TABLE IF NOT EXISTS uptime_checks (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        timestamp TEXT NOT NULL,
                        url TEXT NOT NULL,
                        is_up INTEGER NOT NULL,
                        response_time REAL,
                        status_code INTEGER,
                        error_message TEXT,
                        created_at TEXT DEFAULT CURRENT_TIMESTAMP
                    );
                    CREATE INDEX IF NOT EXISTS idx_timestamp_url
                        ON uptime_checks(timestamp, url);
                    CREATE INDEX IF NOT EXISTS idx_url_timestamp
                        ON uptime_checks(url, timestamp DESC);
                    "#,
                )?;
                Ok(())
            })
            .await?;
        debug!("observation store schema ready");
        Ok(())
    }

    /// Durably append one observation. The connection autocommits, so the
    /// record is on disk when this returns.
    pub async fn record(&self, record: &CheckRecord) -> Result<(), StoreError> {
        let record = record.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO uptime_checks
                     (timestamp, url, is_up, response_time, status_code, error_message)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        record.timestamp.to_rfc3339(),
                        record.url,
                        record.is_up,
                        record.response_time,
                        record.status_code,
                        record.error_message,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// All observations for `url` with `start <= timestamp < end`, ascending.
    pub async fn query_range(
        &self,
        url: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CheckRecord>, StoreError> {
        let url = url.to_string();
        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT timestamp, url, is_up, response_time, status_code, error_message
                     FROM uptime_checks
                     WHERE url = ?1 AND timestamp >= ?2 AND timestamp < ?3
                     ORDER BY timestamp ASC",
                )?;
                let rows = stmt.query_map(
                    rusqlite::params![url, start.to_rfc3339(), end.to_rfc3339()],
                    record_from_row,
                )?;
                let mut records = Vec::new();
                for row in rows {
                    records.push(row?);
                }
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    /// The most recent observations for `url`, newest first.
    pub async fn recent(&self, url: &str, limit: u32) -> Result<Vec<CheckRecord>, StoreError> {
        let url = url.to_string();
        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT timestamp, url, is_up, response_time, status_code, error_message
                     FROM uptime_checks
                     WHERE url = ?1
                     ORDER BY timestamp DESC
                     LIMIT ?2",
                )?;
                let rows = stmt.query_map(rusqlite::params![url, limit], record_from_row)?;
                let mut records = Vec::new();
                for row in rows {
                    records.push(row?);
                }
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    /// Delete observations older than `days_to_keep` days. Idempotent;
    /// returns the number of rows removed.
    pub async fn prune_older_than(&self, days_to_keep: u32) -> Result<usize, StoreError> {
        let cutoff = Utc::now() - Duration::days(i64::from(days_to_keep));
        let removed = self
            .conn
            .call(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM uptime_checks WHERE timestamp < ?1",
                    rusqlite::params![cutoff.to_rfc3339()],
                )?;
                Ok(removed)
            })
            .await?;
        if removed > 0 {
            info!(removed, "pruned old observations");
        }
        Ok(removed)
    }
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CheckRecord> {
    let raw: String = row.get(0)?;
    let timestamp = DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
    Ok(CheckRecord {
        timestamp,
        url: row.get(1)?,
        is_up: row.get(2)?,
        response_time: row.get(3)?,
        status_code: row.get(4)?,
        error_message: row.get(5)?,
    })
}
