// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value persistence trait.

use async_trait::async_trait;

use crate::error::SwitchboardError;
use crate::traits::adapter::PluginAdapter;

/// A shared key-value store holding JSON documents.
///
/// No transactions and no compare-and-swap: callers that need to combine
/// concurrent writers re-read and merge before every write. Implementations
/// report failures honestly; the swallowing policy lives one layer up.
#[async_trait]
pub trait KvStore: PluginAdapter {
    /// Returns the stored document, or `None` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, SwitchboardError>;

    /// Replaces the document stored under `key`.
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), SwitchboardError>;
}
