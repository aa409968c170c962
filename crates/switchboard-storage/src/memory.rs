// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process key-value store.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use switchboard_core::{AdapterType, HealthStatus, KvStore, PluginAdapter, SwitchboardError};

/// A [`KvStore`] backed by a concurrent map.
///
/// Clones of the map are not shared; wrap the store in an `Arc` to hand the
/// same state to several consumers.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: DashMap<String, Value>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PluginAdapter for MemoryKv {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        Ok(())
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Value>, SwitchboardError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SwitchboardError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}
