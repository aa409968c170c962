// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring for the `switchboard` binary.
//!
//! Kept as a library so integration tests can assemble the same
//! application state the server runs with.

pub mod app;
pub mod serve;
pub mod shutdown;

pub use app::build_state;
