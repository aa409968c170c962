// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Switchboard inbox bridge.

use thiserror::Error;

/// The primary error type used across all Switchboard crates.
#[derive(Debug, Error)]
pub enum SwitchboardError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence backend errors (store unreachable, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging gateway errors, carrying whatever the provider reported.
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        /// HTTP status returned by the provider, if a response was received.
        status: Option<u16>,
        /// Provider-specific numeric error code.
        code: Option<i64>,
        /// Provider-specific error type (e.g. `OAuthException`).
        error_type: Option<String>,
        /// Provider trace identifier for support requests.
        trace_id: Option<String>,
    },

    /// A contact address could not be normalized.
    #[error("invalid address: `{0}`")]
    InvalidAddress(String),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation conflicts with current state (e.g. a bulk job is already running).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A bulk run was stopped by an operator before finishing.
    #[error("interrupted by user after {processed} contact(s)")]
    Interrupted { processed: usize },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SwitchboardError {
    /// Builds a gateway error with only a message (transport failures, bad bodies).
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
            status: None,
            code: None,
            error_type: None,
            trace_id: None,
        }
    }

    /// Wraps any error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Returns `true` for the cooperative-cancellation outcome of a bulk run.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }

    /// The bare provider message for gateway errors, the display string otherwise.
    ///
    /// Used when recording a per-contact failure reason.
    pub fn reason(&self) -> String {
        match self {
            Self::Gateway { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
