// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed key-value store.
//!
//! All statements run on tokio-rusqlite's single background thread, so one
//! [`SqliteKv`] never contends with itself. Several processes may open the
//! same file; WAL mode plus a busy timeout keeps them from failing each
//! other's writes.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::OptionalExtension;
use serde_json::Value;
use switchboard_core::{
    AdapterType, HealthStatus, KvStore, PluginAdapter, SwitchboardError, now_millis,
};
use tokio_rusqlite::Connection;
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A [`KvStore`] persisted in a single SQLite table.
pub struct SqliteKv {
    conn: Connection,
}

fn storage_err(context: &str, err: impl std::fmt::Display) -> SwitchboardError {
    SwitchboardError::Storage {
        source: format!("{context}: {err}").into(),
    }
}

impl SqliteKv {
    /// Opens (creating if needed) the database file at `path`.
    pub async fn open(path: &str) -> Result<Self, SwitchboardError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(SwitchboardError::storage)?;
        }
        let conn = Connection::open(path)
            .await
            .map_err(|e| storage_err("failed to open database", e))?;
        let kv = Self { conn };
        kv.prepare(true).await?;
        debug!(path, "sqlite key-value store opened");
        Ok(kv)
    }

    /// Opens a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, SwitchboardError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| storage_err("failed to open database", e))?;
        let kv = Self { conn };
        kv.prepare(false).await?;
        Ok(kv)
    }

    async fn prepare(&self, wal: bool) -> Result<(), SwitchboardError> {
        self.conn
            .call(move |conn| {
                conn.busy_timeout(BUSY_TIMEOUT)?;
                if wal {
                    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                }
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| {
                storage_err("failed to initialize schema", e)
            })
    }
}

#[async_trait]
impl PluginAdapter for SqliteKv {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        let result = self
            .conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await;
        Ok(match result {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| storage_err("checkpoint failed", e))?;
        debug!("sqlite key-value store checkpointed");
        Ok(())
    }
}

#[async_trait]
impl KvStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<Value>, SwitchboardError> {
        let key = key.to_string();
        let raw = self
            .conn
            .call(move |conn| {
                let value = conn
                    .query_row(
                        "SELECT value FROM kv WHERE key = ?1",
                        rusqlite::params![key],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| storage_err("read failed", e))?;

        raw.map(|text| serde_json::from_str(&text).map_err(SwitchboardError::storage))
            .transpose()
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SwitchboardError> {
        let key = key.to_string();
        let text = serde_json::to_string(&value).map_err(SwitchboardError::storage)?;
        let now = now_millis();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
                    rusqlite::params![key, text, now],
                )?;
                Ok(())
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| storage_err("write failed", e))
    }
}
