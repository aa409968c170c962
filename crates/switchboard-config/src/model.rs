// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is a
//! startup error instead of a silently ignored setting.

use serde::{Deserialize, Serialize};

/// Top-level Switchboard configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchboardConfig {
    /// HTTP listener and operator API authentication.
    #[serde(default)]
    pub server: ServerConfig,

    /// WhatsApp Cloud API credentials and endpoint.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Persistence backend selection.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Conversation store tuning and auto-reply rules.
    #[serde(default)]
    pub inbox: InboxConfig,

    /// Bulk dispatch pacing and status retention.
    #[serde(default)]
    pub bulk: BulkConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret for the operator APIs. `None` rejects every operator request.
    #[serde(default)]
    pub api_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// WhatsApp Cloud API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Graph API access token.
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub phone_number_id: Option<String>,

    #[serde(default)]
    pub business_account_id: Option<String>,

    /// Token echoed back during the webhook subscription handshake.
    #[serde(default)]
    pub webhook_verify_token: Option<String>,

    /// App secret for `X-Hub-Signature-256` verification. `None` accepts unsigned payloads.
    #[serde(default)]
    pub app_secret: Option<String>,

    /// Graph API major version (`v18.0` is `18`).
    #[serde(default = "default_api_version")]
    pub api_version: u32,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            business_account_id: None,
            webhook_verify_token: None,
            app_secret: None,
            api_version: default_api_version(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl WhatsAppConfig {
    /// Names of the credentials required to send messages that are unset.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.access_token) {
            missing.push("access_token");
        }
        if is_blank(&self.phone_number_id) {
            missing.push("phone_number_id");
        }
        if is_blank(&self.business_account_id) {
            missing.push("business_account_id");
        }
        if is_blank(&self.webhook_verify_token) {
            missing.push("webhook_verify_token");
        }
        missing
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

fn default_api_version() -> u32 {
    18
}

fn default_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Which key-value backend holds shared state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local; state is lost on restart and not shared.
    Memory,
    /// A local SQLite file.
    #[default]
    Sqlite,
    /// An Upstash-compatible REST key-value service.
    Rest,
}

/// Persistence backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite database file, used by the `sqlite` backend.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Base URL of the REST key-value service, used by the `rest` backend.
    #[serde(default)]
    pub rest_url: Option<String>,

    /// Bearer token for the REST key-value service.
    #[serde(default)]
    pub rest_token: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_path: default_database_path(),
            rest_url: None,
            rest_token: None,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("switchboard").join("switchboard.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("switchboard.db"))
        .to_string_lossy()
        .into_owned()
}

/// Conversation store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InboxConfig {
    /// Minimum age of the cached view before it is re-read from storage.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Messages returned when a single conversation is read.
    #[serde(default = "default_message_tail")]
    pub message_tail: usize,

    /// Prefixed to addresses that lack it.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,

    #[serde(default)]
    pub auto_reply: Vec<AutoReplyRule>,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            message_tail: default_message_tail(),
            default_country_code: default_country_code(),
            auto_reply: Vec::new(),
        }
    }
}

fn default_refresh_interval_ms() -> u64 {
    1000
}

fn default_message_tail() -> usize {
    50
}

fn default_country_code() -> String {
    "55".to_string()
}

/// Sends a fixed reply to inbound messages from the listed addresses.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutoReplyRule {
    pub addresses: Vec<String>,
    pub reply: String,
}

/// Bulk dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BulkConfig {
    /// Pause between consecutive sends.
    #[serde(default = "default_delay_between_messages_ms")]
    pub delay_between_messages_ms: u64,

    #[serde(default = "default_recent_limit")]
    pub recent_errors_limit: usize,

    #[serde(default = "default_recent_limit")]
    pub recent_requests_limit: usize,

    /// Template language used when neither the run nor the contact names one.
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            delay_between_messages_ms: default_delay_between_messages_ms(),
            recent_errors_limit: default_recent_limit(),
            recent_requests_limit: default_recent_limit(),
            default_language: default_language(),
        }
    }
}

fn default_delay_between_messages_ms() -> u64 {
    100
}

fn default_recent_limit() -> usize {
    10
}

fn default_language() -> String {
    "pt_BR".to_string()
}

/// Logging configuration. `RUST_LOG` overrides `level` when set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
