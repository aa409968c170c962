// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembles the shared application state from configuration.

use std::sync::Arc;

use tracing::info;

use switchboard_bulk::{BulkController, BulkSettings};
use switchboard_config::SwitchboardConfig;
use switchboard_core::{KvStore, MessagingGateway};
use switchboard_gateway::{AppState, AuthConfig, WebhookSettings};
use switchboard_inbox::{AddressRules, ConversationStore, StoreSettings, WebhookPipeline};
use switchboard_storage::Persistence;

/// Builds the state every route handler shares.
///
/// The conversation store, webhook pipeline and bulk controller all go
/// through one [`Persistence`] facade over `kv`.
pub fn build_state(
    config: &SwitchboardConfig,
    kv: Arc<dyn KvStore>,
    gateway: Arc<dyn MessagingGateway>,
) -> AppState {
    let persistence = Persistence::new(kv);
    let store = Arc::new(ConversationStore::new(
        persistence.clone(),
        StoreSettings::from_config(&config.inbox),
    ));

    let mut pipeline = WebhookPipeline::new(store.clone());
    if !config.inbox.auto_reply.is_empty() {
        let rules = AddressRules::new(&config.inbox.auto_reply, gateway.clone(), store.clone());
        info!(addresses = rules.len(), "auto-reply rules enabled");
        pipeline = pipeline.with_responder(Arc::new(rules));
    }

    let bulk = Arc::new(BulkController::new(
        persistence.clone(),
        gateway.clone(),
        BulkSettings::from_config(&config.bulk, &config.inbox),
    ));

    AppState {
        store,
        pipeline: Arc::new(pipeline),
        bulk,
        gateway,
        persistence,
        webhook: WebhookSettings {
            verify_token: config.whatsapp.webhook_verify_token.clone(),
            app_secret: config.whatsapp.app_secret.clone(),
        },
        auth: AuthConfig {
            bearer_token: config.server.api_token.clone(),
        },
        missing_credentials: config.whatsapp.missing_credentials(),
    }
}
