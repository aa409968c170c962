// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook ingestion.
//!
//! Drives the conversation store from decoded webhook events. Processing
//! never fails outward: the provider retries payloads that are not
//! acknowledged, and a partially applied payload must not be replayed.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::payload::{WebhookEvent, decode_events};
use crate::responder::{AutoResponder, NoopResponder};
use crate::store::{ConversationStore, NewMessage};

/// Counts of what a payload contained and how it went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WebhookAck {
    pub messages: usize,
    pub statuses: usize,
    pub history: usize,
    pub provider_errors: usize,
    /// Events that could not be applied.
    pub failures: usize,
}

/// Applies webhook payloads to a [`ConversationStore`].
pub struct WebhookPipeline {
    store: Arc<ConversationStore>,
    responder: Arc<dyn AutoResponder>,
}

impl WebhookPipeline {
    pub fn new(store: Arc<ConversationStore>) -> Self {
        Self {
            store,
            responder: Arc::new(NoopResponder),
        }
    }

    pub fn with_responder(mut self, responder: Arc<dyn AutoResponder>) -> Self {
        self.responder = responder;
        self
    }

    /// Processes one payload. Always returns; problems are logged and counted.
    pub async fn process(&self, payload: &Value) -> WebhookAck {
        match AssertUnwindSafe(self.apply(payload)).catch_unwind().await {
            Ok(ack) => {
                info!(
                    messages = ack.messages,
                    statuses = ack.statuses,
                    history = ack.history,
                    failures = ack.failures,
                    "webhook processed"
                );
                ack
            }
            Err(_) => {
                error!("webhook processing panicked, acknowledging anyway");
                WebhookAck {
                    failures: 1,
                    ..WebhookAck::default()
                }
            }
        }
    }

    async fn apply(&self, payload: &Value) -> WebhookAck {
        let mut ack = WebhookAck::default();

        for event in decode_events(payload) {
            match event {
                WebhookEvent::Message(message) => {
                    ack.messages += 1;
                    let text = message.text.clone();
                    let appended = self
                        .store
                        .append_message(
                            NewMessage::inbound(message.from.as_str(), message.text)
                                .with_id(message.id)
                                .at(message.timestamp)
                                .from_contact(message.contact_name),
                        )
                        .await;
                    let address = match appended {
                        Ok(_) => self.store.normalize(&message.from).ok(),
                        Err(e) => {
                            warn!(from = %message.from, error = %e, "inbound message not stored");
                            ack.failures += 1;
                            None
                        }
                    };
                    if let Some(address) = address
                        && let Err(e) = self.responder.respond(&address, &text).await
                    {
                        warn!(address = %address, error = %e, "auto-reply failed");
                    }
                }
                WebhookEvent::Status(status) => {
                    ack.statuses += 1;
                    if !status.errors.is_empty() {
                        warn!(
                            message_id = %status.message_id,
                            errors = ?status.errors,
                            "provider reported delivery errors"
                        );
                    }
                    self.store
                        .update_message_status(
                            &status.recipient,
                            &status.message_id,
                            &status.status,
                            status.timestamp,
                        )
                        .await;
                }
                WebhookEvent::History(item) => {
                    ack.history += 1;
                    let id = item.id.clone();
                    let stored = self
                        .store
                        .append_message(
                            NewMessage::new(item.thread.as_str(), item.direction, item.text)
                                .with_id(item.id)
                                .at(item.timestamp),
                        )
                        .await;
                    match stored {
                        Ok(record) => {
                            if let Some(status) = item.status {
                                self.store
                                    .update_message_status(
                                        &item.thread,
                                        &record.id,
                                        &status,
                                        item.timestamp,
                                    )
                                    .await;
                            }
                        }
                        Err(e) => {
                            warn!(thread = %item.thread, message_id = ?id, error = %e, "history message not stored");
                            ack.failures += 1;
                        }
                    }
                }
                WebhookEvent::ProviderError(err) => {
                    ack.provider_errors += 1;
                    warn!(code = ?err.code, error = %err.title, "provider reported an error");
                }
            }
        }

        ack
    }
}
