// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A key-value backend that is always down.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use switchboard_core::{AdapterType, HealthStatus, KvStore, PluginAdapter, SwitchboardError};

/// Fails every read and write, counting attempts.
#[derive(Debug, Default)]
pub struct FailingKv {
    calls: AtomicUsize,
}

impl FailingKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get`/`set` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail(&self) -> SwitchboardError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SwitchboardError::Storage {
            source: "backend unavailable".into(),
        }
    }
}

#[async_trait]
impl PluginAdapter for FailingKv {
    fn name(&self) -> &str {
        "failing"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        Ok(HealthStatus::Unhealthy("backend unavailable".into()))
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        Ok(())
    }
}

#[async_trait]
impl KvStore for FailingKv {
    async fn get(&self, _key: &str) -> Result<Option<Value>, SwitchboardError> {
        Err(self.fail())
    }

    async fn set(&self, _key: &str, _value: Value) -> Result<(), SwitchboardError> {
        Err(self.fail())
    }
}
