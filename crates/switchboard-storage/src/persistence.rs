// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort typed access to the shared key-value store.
//!
//! A failed read is indistinguishable from an empty key and a failed write
//! is logged and reported as `false`. State is rebuilt additively, so the
//! next successful write repairs a missed one. Callers that must not
//! mistake an outage for an empty key use [`Persistence::try_get`].

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use switchboard_core::{HealthStatus, KvStore, SwitchboardError};
use tracing::warn;

/// Swallowing facade over a [`KvStore`].
#[derive(Clone)]
pub struct Persistence {
    kv: Arc<dyn KvStore>,
}

impl Persistence {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub fn backend(&self) -> &Arc<dyn KvStore> {
        &self.kv
    }

    /// Reads and decodes `key`. Missing, unreadable and undecodable all yield `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.kv.get(key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!(key, error = %e, "stored value has unexpected shape, ignoring");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "persistence read failed, treating as empty");
                None
            }
        }
    }

    /// Like [`Persistence::get`], but a backend failure is returned instead of
    /// read as empty. An undecodable value still yields `Ok(None)`.
    pub async fn try_get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, SwitchboardError> {
        let Some(value) = self.kv.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => {
                warn!(key, error = %e, "stored value has unexpected shape, ignoring");
                Ok(None)
            }
        }
    }

    /// Encodes and writes `value`. Returns whether the write landed.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let encoded = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                warn!(key, error = %e, "failed to encode value for persistence");
                return false;
            }
        };
        match self.kv.set(key, encoded).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "persistence write failed, continuing");
                false
            }
        }
    }

    /// Backend health, with errors folded into `Unhealthy`.
    pub async fn health(&self) -> HealthStatus {
        self.kv
            .health_check()
            .await
            .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()))
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("backend", &self.kv.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryKv;
    use serde_json::json;
    use switchboard_core::types::ResetEpoch;

    #[tokio::test]
    async fn typed_round_trip() {
        let persistence = Persistence::new(Arc::new(MemoryKv::new()));
        assert!(
            persistence
                .set("epoch", &ResetEpoch { reset_at: 99 })
                .await
        );
        let epoch: Option<ResetEpoch> = persistence.get("epoch").await;
        assert_eq!(epoch, Some(ResetEpoch { reset_at: 99 }));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn wrong_shape_reads_as_none() {
        let kv = Arc::new(MemoryKv::new());
        kv.set("epoch", json!("not an object")).await.unwrap();
        let persistence = Persistence::new(kv);
        let epoch: Option<ResetEpoch> = persistence.get("epoch").await;
        assert!(epoch.is_none());
        assert!(logs_contain("unexpected shape"));
    }

    #[tokio::test]
    async fn try_get_separates_missing_from_present() {
        let persistence = Persistence::new(Arc::new(MemoryKv::new()));
        let missing: Option<ResetEpoch> = persistence.try_get("epoch").await.unwrap();
        assert!(missing.is_none());

        persistence.set("epoch", &ResetEpoch { reset_at: 7 }).await;
        let present: Option<ResetEpoch> = persistence.try_get("epoch").await.unwrap();
        assert_eq!(present, Some(ResetEpoch { reset_at: 7 }));
    }
}
