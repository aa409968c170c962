// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API gateway for Switchboard.
//!
//! [`CloudApiClient`] implements [`MessagingGateway`](switchboard_core::MessagingGateway)
//! over the Graph API: text and template sends, contact validation and
//! account probes for the health endpoint.

pub mod client;
pub mod types;

pub use client::CloudApiClient;
