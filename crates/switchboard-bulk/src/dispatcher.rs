// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequential, rate-limited dispatch over a contact list.
//!
//! The fixed delay between sends is the only rate limiting. Contacts are
//! processed strictly in input order, so progress is always the prefix of
//! the list that carries a terminal status. Contacts already `Sent` are
//! skipped, which makes re-running a partially finished list a resume.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use switchboard_core::types::{Contact, ContactStatus, OutboundRequest};
use switchboard_core::{MessagingGateway, SwitchboardError, normalize_address};

/// Callbacks the dispatcher drives while it runs.
#[async_trait]
pub trait DispatchHooks: Send + Sync {
    /// Called after each contact receives a terminal status.
    async fn on_progress(&self, contact: &Contact, index: usize, total: usize);

    /// Called with every request right before it is sent.
    async fn on_request(&self, url: &str, payload: &Value, contact: &Contact);

    /// Polled before each send. Returning `true` ends the run as interrupted.
    async fn should_stop(&self) -> bool;
}

/// Run-wide message settings; per-contact fields override them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchDefaults {
    pub template: Option<String>,
    pub language: String,
}

/// Outcome counts of a run that was not interrupted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
    /// Contacts already sent before this run.
    pub skipped: usize,
}

/// Sends to a contact list one at a time through a [`MessagingGateway`].
pub struct BulkDispatcher {
    gateway: Arc<dyn MessagingGateway>,
    delay: Duration,
    country_code: String,
}

impl BulkDispatcher {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        delay: Duration,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            delay,
            country_code: country_code.into(),
        }
    }

    /// Dispatches to every pending or failed contact, updating each in place.
    ///
    /// Per-contact failures are recorded on the contact and never end the
    /// run. A stop signal ends it with [`SwitchboardError::Interrupted`],
    /// leaving the remaining contacts untouched.
    pub async fn run(
        &self,
        contacts: &mut [Contact],
        defaults: &DispatchDefaults,
        hooks: &dyn DispatchHooks,
    ) -> Result<DispatchSummary, SwitchboardError> {
        let total = contacts.len();
        let mut summary = DispatchSummary::default();

        for index in 0..total {
            if contacts[index].status == ContactStatus::Sent {
                debug!(address = %contacts[index].address, "already sent, skipping");
                summary.skipped += 1;
                continue;
            }

            if hooks.should_stop().await {
                let processed = summary.sent + summary.failed;
                info!(processed, remaining = total - index, "bulk run stopped");
                return Err(SwitchboardError::Interrupted { processed });
            }

            let called_gateway = self.dispatch_one(&mut contacts[index], defaults, hooks).await;

            match contacts[index].status {
                ContactStatus::Sent => summary.sent += 1,
                _ => summary.failed += 1,
            }
            hooks.on_progress(&contacts[index], index, total).await;

            let more_to_send = contacts[index + 1..]
                .iter()
                .any(|c| c.status != ContactStatus::Sent);
            if called_gateway && more_to_send && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            "bulk run finished"
        );
        Ok(summary)
    }

    /// Sends to one contact and records the outcome on it. Returns whether
    /// the gateway was called.
    async fn dispatch_one(
        &self,
        contact: &mut Contact,
        defaults: &DispatchDefaults,
        hooks: &dyn DispatchHooks,
    ) -> bool {
        let Some(to) = normalize_address(&contact.address, &self.country_code) else {
            warn!(address = %contact.address, "invalid address, not sending");
            contact.mark_failed(SwitchboardError::InvalidAddress(contact.address.clone()).to_string());
            return false;
        };

        let request = match build_request(contact, to, defaults) {
            Ok(request) => request,
            Err(reason) => {
                warn!(address = %contact.address, reason, "nothing to send");
                contact.mark_failed(reason);
                return false;
            }
        };

        let payload = serde_json::to_value(&request).unwrap_or_default();
        hooks
            .on_request(&self.gateway.endpoint(), &payload, contact)
            .await;

        match self.gateway.send(&request).await {
            Ok(receipt) => {
                debug!(to = %request.to, message_id = ?receipt.message_id, "sent");
                contact.mark_sent(receipt.message_id);
            }
            Err(e) => {
                warn!(to = %request.to, error = %e, "send failed");
                contact.mark_failed(e.reason());
            }
        }
        true
    }
}

/// Free text (plus link) when the contact carries a message, otherwise the
/// contact's or the run's template.
fn build_request(
    contact: &Contact,
    to: String,
    defaults: &DispatchDefaults,
) -> Result<OutboundRequest, &'static str> {
    if let Some(message) = non_empty(contact.message.as_deref()) {
        let body = match non_empty(contact.link.as_deref()) {
            Some(link) => format!("{message}\n\n{link}"),
            None => message.to_string(),
        };
        return Ok(OutboundRequest::text(to, body));
    }

    let template = non_empty(contact.template.as_deref())
        .or_else(|| non_empty(defaults.template.as_deref()))
        .ok_or("no message or template for contact")?;
    let language = non_empty(contact.language.as_deref()).unwrap_or(&defaults.language);
    Ok(OutboundRequest::template(to, template, language))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
