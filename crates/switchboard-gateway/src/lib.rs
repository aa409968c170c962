// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface for Switchboard.
//!
//! Public routes: `GET /health`, `GET /webhook` (subscription handshake) and
//! `POST /webhook` (event ingestion). Everything under `/api` requires the
//! operator bearer token and is rejected outright when none is configured.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod signature;

pub use auth::AuthConfig;
pub use error::ApiError;
pub use server::{AppState, WebhookSettings, build_router, start_server};
