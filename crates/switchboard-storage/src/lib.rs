// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared-state persistence for Switchboard.
//!
//! Three [`KvStore`] backends are provided:
//! - [`MemoryKv`]: process-local, for tests and single-process demos
//! - [`SqliteKv`]: a local SQLite file, shared by processes on one host
//! - [`RestKv`]: an Upstash-compatible REST service, shared across hosts
//!
//! Callers normally go through [`Persistence`], which turns every backend
//! failure into "nothing stored" or a logged, swallowed write.

pub mod keys;
pub mod memory;
pub mod persistence;
pub mod rest;
pub mod sqlite;

use std::sync::Arc;

use switchboard_config::model::{StorageBackend, StorageConfig};
use switchboard_core::{KvStore, SwitchboardError};

pub use memory::MemoryKv;
pub use persistence::Persistence;
pub use rest::RestKv;
pub use sqlite::SqliteKv;

/// Opens the backend selected by configuration.
pub async fn open_backend(config: &StorageConfig) -> Result<Arc<dyn KvStore>, SwitchboardError> {
    let kv: Arc<dyn KvStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryKv::new()),
        StorageBackend::Sqlite => Arc::new(SqliteKv::open(&config.database_path).await?),
        StorageBackend::Rest => {
            let url = config.rest_url.as_deref().ok_or_else(|| {
                SwitchboardError::Config("storage.rest_url is required for the rest backend".into())
            })?;
            Arc::new(RestKv::new(url, config.rest_token.clone())?)
        }
    };
    tracing::info!(backend = kv.name(), "persistence backend opened");
    Ok(kv)
}
