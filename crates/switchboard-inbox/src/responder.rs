// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automated replies to inbound messages.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use switchboard_config::model::AutoReplyRule;
use switchboard_core::types::{MessageRecord, OutboundRequest};
use switchboard_core::{MessagingGateway, SwitchboardError, normalize_address};
use tracing::{debug, info, warn};

use crate::store::ConversationStore;

/// Hook invoked after each live inbound message is stored.
#[async_trait]
pub trait AutoResponder: Send + Sync {
    /// Reacts to `text` received from the normalized `address`. Returns the
    /// recorded reply, if one was sent.
    async fn respond(
        &self,
        address: &str,
        text: &str,
    ) -> Result<Option<MessageRecord>, SwitchboardError>;
}

/// Never replies.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResponder;

#[async_trait]
impl AutoResponder for NoopResponder {
    async fn respond(
        &self,
        _address: &str,
        _text: &str,
    ) -> Result<Option<MessageRecord>, SwitchboardError> {
        Ok(None)
    }
}

/// Sends a fixed reply to configured addresses, unless an operator has
/// taken the conversation over.
pub struct AddressRules {
    replies: HashMap<String, String>,
    gateway: Arc<dyn MessagingGateway>,
    store: Arc<ConversationStore>,
}

impl AddressRules {
    pub fn new(
        rules: &[AutoReplyRule],
        gateway: Arc<dyn MessagingGateway>,
        store: Arc<ConversationStore>,
    ) -> Self {
        let country_code = store.settings().country_code.clone();
        let mut replies = HashMap::new();
        for rule in rules {
            for raw in &rule.addresses {
                match normalize_address(raw, &country_code) {
                    Some(address) => {
                        replies.insert(address, rule.reply.clone());
                    }
                    None => warn!(address = %raw, "auto-reply address cannot be normalized, skipped"),
                }
            }
        }
        Self {
            replies,
            gateway,
            store,
        }
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}

#[async_trait]
impl AutoResponder for AddressRules {
    async fn respond(
        &self,
        address: &str,
        _text: &str,
    ) -> Result<Option<MessageRecord>, SwitchboardError> {
        let Some(reply) = self.replies.get(address) else {
            return Ok(None);
        };
        if self.store.peek(address).await.is_some_and(|c| c.is_human) {
            debug!(address, "conversation under manual control, auto-reply skipped");
            return Ok(None);
        }

        let receipt = self
            .gateway
            .send(&OutboundRequest::text(address, reply.as_str()))
            .await?;
        let record = self
            .store
            .record_outbound(address, reply, receipt.message_id)
            .await?;
        info!(address, message_id = %record.id, "auto-reply sent");
        Ok(Some(record))
    }
}
