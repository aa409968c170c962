// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk dispatch for Switchboard.
//!
//! [`BulkDispatcher`] walks a contact list sequentially with a fixed delay
//! between sends and checks a stop signal between contacts.
//! [`BulkController`] owns the job lifecycle: it launches a dispatcher run
//! in the background and reports progress through the shared store, where
//! any process can poll it or raise the stop flag.

pub mod controller;
pub mod dispatcher;

pub use controller::{BulkController, BulkSettings, StartRequest, ValidationReport};
pub use dispatcher::{BulkDispatcher, DispatchDefaults, DispatchHooks, DispatchSummary};
