// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Persistence backends and messaging gateways both extend the
//! [`PluginAdapter`] base trait and use `#[async_trait]` so they can sit
//! behind `Arc<dyn ...>`.

pub mod adapter;
pub mod gateway;
pub mod storage;

pub use adapter::PluginAdapter;
pub use gateway::MessagingGateway;
pub use storage::KvStore;
