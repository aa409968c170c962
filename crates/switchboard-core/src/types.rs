// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Switchboard crates.
//!
//! Everything here is persisted as JSON in the key-value backend, so field
//! names follow the camelCase wire format the operator UI reads.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Current wall-clock time in unix milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Gateway,
}

// --- Conversations ---

/// Which side of the conversation produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// A single message in a conversation.
///
/// Immutable once created, except for `status` on outbound records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    pub direction: Direction,
    pub text: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_timestamp: Option<i64>,
}

/// Ordering rank of provider delivery statuses.
///
/// Unknown statuses rank with `sent`; `failed` outranks everything because
/// the provider only reports it after giving up.
pub fn status_rank(status: &str) -> u8 {
    match status {
        "delivered" => 2,
        "read" => 3,
        "failed" => 4,
        _ => 1,
    }
}

/// Generates a collision-resistant id for an outbound message the gateway
/// did not assign one to.
pub fn local_message_id(timestamp: i64) -> String {
    let suffix = random_suffix();
    format!("local-{timestamp}-{suffix}")
}

fn random_suffix() -> String {
    use rand::Rng;
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// The message history and metadata for one contact address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Normalized contact address.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<i64>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub is_human: bool,
    /// Ascending by timestamp.
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
}

impl Conversation {
    /// Creates an empty conversation for a normalized address.
    pub fn new(address: &str) -> Self {
        Self {
            id: address.to_string(),
            name: None,
            phone_number: address.to_string(),
            last_message: None,
            last_timestamp: None,
            unread_count: 0,
            is_human: false,
            messages: Vec::new(),
        }
    }

    pub fn find_message(&self, id: &str) -> Option<&MessageRecord> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn find_message_mut(&mut self, id: &str) -> Option<&mut MessageRecord> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Re-sorts messages by timestamp (id breaks ties) and recomputes
    /// `last_message`/`last_timestamp` from the tail.
    pub fn normalize(&mut self) {
        self.messages
            .sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        match self.messages.last() {
            Some(last) => {
                self.last_message = Some(last.text.clone());
                self.last_timestamp = Some(last.timestamp);
            }
            None => {
                self.last_message = None;
                self.last_timestamp = None;
            }
        }
    }

    /// A copy holding at most the newest `limit` messages.
    pub fn with_tail(&self, limit: usize) -> Self {
        let skip = self.messages.len().saturating_sub(limit);
        Self {
            messages: self.messages[skip..].to_vec(),
            ..self.clone()
        }
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            phone_number: self.phone_number.clone(),
            last_message: self.last_message.clone(),
            last_timestamp: self.last_timestamp,
            unread_count: self.unread_count,
            is_human: self.is_human,
        }
    }
}

/// List-view projection of a conversation (no messages).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: String,
    pub name: Option<String>,
    pub phone_number: String,
    pub last_message: Option<String>,
    pub last_timestamp: Option<i64>,
    pub unread_count: u32,
    pub is_human: bool,
}

/// Global marker of the last "delete all conversations" event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetEpoch {
    pub reset_at: i64,
}

// --- Bulk dispatch ---

/// Lifecycle of a contact within a bulk run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactStatus {
    #[default]
    #[serde(rename = "pending", alias = "pendente")]
    Pending,
    #[serde(rename = "enviado", alias = "sent")]
    Sent,
    #[serde(rename = "erro", alias = "failed")]
    Failed,
}

impl ContactStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One recipient of a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(alias = "numero", alias = "telefone", alias = "phone")]
    pub address: String,
    #[serde(default, alias = "mensagem", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Outcome of a prior address validation; `Some(false)` excludes the contact from a run.
    #[serde(default, alias = "valido", skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
}

impl Contact {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            message: None,
            link: None,
            template: None,
            language: None,
            status: ContactStatus::Pending,
            send_id: None,
            error: None,
            valid: None,
        }
    }

    pub fn mark_sent(&mut self, send_id: Option<String>) {
        self.status = ContactStatus::Sent;
        self.send_id = send_id;
        self.error = None;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = ContactStatus::Failed;
        self.error = Some(error.into());
    }
}

/// A failed send kept in the job's recent-errors ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentError {
    pub contact: String,
    pub error: String,
    pub at: i64,
}

/// An outbound request kept in the job's audit ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentRequest {
    pub url: String,
    pub payload: serde_json::Value,
    pub at: i64,
}

/// Progress record of one bulk dispatch run, polled by operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkJob {
    /// Distinguishes runs so a late write from an old run is recognizable.
    pub id: String,
    pub active: bool,
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub template: String,
    pub language: String,
    pub timestamp: i64,
    /// Newest first.
    pub recent_errors: VecDeque<RecentError>,
    /// Newest first.
    pub recent_requests: VecDeque<RecentRequest>,
    pub interrupted: bool,
    pub message: String,
}

impl Default for BulkJob {
    fn default() -> Self {
        Self {
            id: String::new(),
            active: false,
            total: 0,
            sent: 0,
            failed: 0,
            template: String::new(),
            language: String::new(),
            timestamp: 0,
            recent_errors: VecDeque::new(),
            recent_requests: VecDeque::new(),
            interrupted: false,
            message: String::new(),
        }
    }
}

impl BulkJob {
    pub fn record_error(&mut self, entry: RecentError, limit: usize) {
        push_bounded(&mut self.recent_errors, entry, limit);
    }

    pub fn record_request(&mut self, entry: RecentRequest, limit: usize) {
        push_bounded(&mut self.recent_requests, entry, limit);
    }
}

fn push_bounded<T>(ring: &mut VecDeque<T>, entry: T, limit: usize) {
    ring.push_front(entry);
    ring.truncate(limit);
}

/// Externally-set request to halt the running bulk job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopFlag {
    pub stop: bool,
    pub at: i64,
}

// --- Gateway ---

/// Content of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundBody {
    Text { body: String },
    Template { name: String, language: String },
}

/// A message to deliver through the messaging gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRequest {
    /// Normalized recipient address.
    pub to: String,
    #[serde(flatten)]
    pub body: OutboundBody,
}

impl OutboundRequest {
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            body: OutboundBody::Text { body: body.into() },
        }
    }

    pub fn template(
        to: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            body: OutboundBody::Template {
                name: name.into(),
                language: language.into(),
            },
        }
    }

    /// The text to record in the conversation history for this request.
    pub fn display_text(&self) -> String {
        match &self.body {
            OutboundBody::Text { body } => body.clone(),
            OutboundBody::Template { name, .. } => format!("[template: {name}]"),
        }
    }
}

/// What the gateway reported after accepting a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

/// Validation outcome for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressCheck {
    pub input: String,
    /// `None` when the provider could not be asked.
    pub valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wa_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Result of validating a batch of addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressValidation {
    pub results: Vec<AddressCheck>,
    /// `false` when the provider does not support validation for this account.
    pub available: bool,
}

/// Outcome of one live gateway probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Live probes of the provider account backing the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayProbe {
    pub phone_number: ProbeResult,
    pub business_account: ProbeResult,
}
