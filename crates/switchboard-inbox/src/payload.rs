// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Defensive decoding of provider webhook payloads into events.
//!
//! Payloads nest `entry[] -> changes[] -> value`, and any level may be
//! missing or malformed. Each array item is decoded on its own: an item
//! that does not decode is skipped, it never fails the payload.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use switchboard_core::types::Direction;
use tracing::warn;

/// A unit of work extracted from a webhook payload.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    /// A live inbound message.
    Message(InboundEvent),
    /// A delivery status for an outbound message.
    Status(StatusEvent),
    /// A backfilled message from a history sync.
    History(HistoryEvent),
    /// An error the provider reported about the account or webhook.
    ProviderError(ProviderErrorEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub from: String,
    pub contact_name: Option<String>,
    pub id: Option<String>,
    /// Unix milliseconds.
    pub timestamp: Option<i64>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub recipient: String,
    pub message_id: String,
    pub status: String,
    /// Unix milliseconds.
    pub timestamp: Option<i64>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEvent {
    /// Contact address the thread belongs to.
    pub thread: String,
    pub direction: Direction,
    pub id: Option<String>,
    /// Unix milliseconds.
    pub timestamp: Option<i64>,
    pub text: String,
    /// Delivery status recorded with the message, lowercased.
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderErrorEvent {
    pub code: Option<i64>,
    pub title: String,
}

// --- wire shapes ---

#[derive(Debug, Default, Deserialize)]
struct RawText {
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawReply {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawInteractive {
    #[serde(default)]
    button_reply: Option<RawReply>,
    #[serde(default)]
    list_reply: Option<RawReply>,
}

#[derive(Debug, Default, Deserialize)]
struct RawButton {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLocation {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHistoryContext {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    from_me: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMessage {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default, deserialize_with = "seconds_as_millis")]
    timestamp: Option<i64>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    text: Option<RawText>,
    #[serde(default)]
    interactive: Option<RawInteractive>,
    #[serde(default)]
    button: Option<RawButton>,
    #[serde(default)]
    location: Option<RawLocation>,
    #[serde(default)]
    from_me: Option<bool>,
    #[serde(default)]
    history_context: Option<RawHistoryContext>,
}

#[derive(Debug, Default, Deserialize)]
struct RawError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RawError {
    fn describe(&self) -> String {
        let text = self
            .message
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("unknown error");
        match self.code {
            Some(code) => format!("{code}: {text}"),
            None => text.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawStatus {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    recipient_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, deserialize_with = "seconds_as_millis")]
    timestamp: Option<i64>,
    #[serde(default)]
    errors: Vec<RawError>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProfile {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawContact {
    #[serde(default)]
    wa_id: Option<String>,
    #[serde(default)]
    profile: Option<RawProfile>,
}

/// Accepts unix seconds as a string or a number; anything else is absent.
fn seconds_as_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let seconds = match raw {
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    };
    Ok(seconds.and_then(|s| s.checked_mul(1000)))
}

/// Best display text for a message.
///
/// Plain text body, then an interactive reply title, then a quick-reply
/// button, then a formatted location, then a `[type]` placeholder.
fn display_text(message: &RawMessage) -> String {
    let non_empty = |s: &Option<String>| s.as_deref().filter(|t| !t.is_empty()).map(str::to_string);

    if let Some(body) = message.text.as_ref().and_then(|t| non_empty(&t.body)) {
        return body;
    }
    if let Some(interactive) = &message.interactive {
        let title = interactive
            .button_reply
            .as_ref()
            .and_then(|r| non_empty(&r.title))
            .or_else(|| interactive.list_reply.as_ref().and_then(|r| non_empty(&r.title)));
        if let Some(title) = title {
            return title;
        }
    }
    if let Some(text) = message.button.as_ref().and_then(|b| non_empty(&b.text)) {
        return text;
    }
    if let Some(location) = &message.location {
        let coord = |v: Option<f64>| v.map_or_else(|| "?".to_string(), |v| v.to_string());
        let (lat, lng) = (coord(location.latitude), coord(location.longitude));
        return match non_empty(&location.name) {
            Some(name) => format!("📍 {name} ({lat}, {lng})"),
            None => format!("📍 Localização ({lat}, {lng})"),
        };
    }
    format!("[{}]", message.kind.as_deref().unwrap_or("unknown"))
}

fn items<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn decode<T: DeserializeOwned>(value: &Value, what: &str) -> Option<T> {
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(kind = what, error = %e, "skipping malformed webhook item");
            None
        }
    }
}

/// Extracts every event from a payload, in array order.
pub fn decode_events(payload: &Value) -> Vec<WebhookEvent> {
    let mut events = Vec::new();
    for entry in items(payload, "entry") {
        for change in items(entry, "changes") {
            if let Some(value) = change.get("value") {
                decode_value(value, &mut events);
            }
        }
    }
    events
}

fn decode_value(value: &Value, events: &mut Vec<WebhookEvent>) {
    let contacts: Vec<RawContact> = items(value, "contacts")
        .filter_map(|c| decode(c, "contact"))
        .collect();
    let name_for = |from: &str| {
        contacts
            .iter()
            .find(|c| c.wa_id.as_deref() == Some(from))
            .or(match contacts.as_slice() {
                [only] if only.wa_id.is_none() => Some(only),
                _ => None,
            })
            .and_then(|c| c.profile.as_ref())
            .and_then(|p| p.name.clone())
    };

    for block in items(value, "history") {
        for thread in items(block, "threads") {
            let Some(thread_id) = thread.get("id").and_then(Value::as_str) else {
                continue;
            };
            for raw in items(thread, "messages") {
                let Some(message) = decode::<RawMessage>(raw, "history message") else {
                    continue;
                };
                let context = message.history_context.as_ref();
                let from_me = message.from_me.or(context.and_then(|c| c.from_me));
                let direction = match from_me {
                    Some(true) => Direction::Out,
                    Some(false) => Direction::In,
                    None if message.from.as_deref() == Some(thread_id) => Direction::In,
                    None => Direction::Out,
                };
                events.push(WebhookEvent::History(HistoryEvent {
                    thread: thread_id.to_string(),
                    direction,
                    id: message.id.clone(),
                    timestamp: message.timestamp,
                    text: display_text(&message),
                    status: context
                        .and_then(|c| c.status.as_deref())
                        .map(str::to_lowercase),
                }));
            }
        }
    }

    for raw in items(value, "messages") {
        let Some(message) = decode::<RawMessage>(raw, "message") else {
            continue;
        };
        let Some(from) = message.from.clone().filter(|f| !f.is_empty()) else {
            warn!(message_id = ?message.id, "inbound message without sender skipped");
            continue;
        };
        events.push(WebhookEvent::Message(InboundEvent {
            contact_name: name_for(&from),
            from,
            id: message.id.clone(),
            timestamp: message.timestamp,
            text: display_text(&message),
        }));
    }

    for raw in items(value, "statuses") {
        let Some(status) = decode::<RawStatus>(raw, "status") else {
            continue;
        };
        let (Some(recipient), Some(message_id), Some(state)) =
            (status.recipient_id, status.id, status.status)
        else {
            continue;
        };
        events.push(WebhookEvent::Status(StatusEvent {
            recipient,
            message_id,
            status: state.to_lowercase(),
            timestamp: status.timestamp,
            errors: status.errors.iter().map(RawError::describe).collect(),
        }));
    }

    for raw in items(value, "errors") {
        if let Some(error) = decode::<RawError>(raw, "error") {
            events.push(WebhookEvent::ProviderError(ProviderErrorEvent {
                code: error.code,
                title: error.describe(),
            }));
        }
    }
}
