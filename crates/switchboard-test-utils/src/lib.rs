// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Switchboard.
//!
//! - [`MockGateway`]: captures outbound requests, scripted failures
//! - [`FailingKv`]: a backend where every call fails
//! - [`fixtures`]: contact lists and webhook payload builders

pub mod failing_kv;
pub mod fixtures;
pub mod mock_gateway;

use std::sync::Arc;

use switchboard_storage::{MemoryKv, Persistence};

pub use failing_kv::FailingKv;
pub use mock_gateway::MockGateway;

/// A fresh in-memory backend and a facade over it. Hand the same backend
/// to several stores to simulate independent instances.
pub fn memory_persistence() -> (Arc<MemoryKv>, Persistence) {
    let kv = Arc::new(MemoryKv::new());
    (kv.clone(), Persistence::new(kv))
}
