// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `switchboard serve` and the other subcommand implementations.

use std::sync::Arc;

use tracing::{info, warn};

use switchboard_config::SwitchboardConfig;
use switchboard_core::types::BulkJob;
use switchboard_core::{MessagingGateway, PluginAdapter, SwitchboardError};
use switchboard_inbox::{ConversationStore, StoreSettings};
use switchboard_storage::{Persistence, keys, open_backend};
use switchboard_whatsapp::CloudApiClient;

use crate::app::build_state;
use crate::shutdown;

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(log_level: &str, json: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("switchboard={log_level},warn")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Runs the HTTP server until SIGINT or SIGTERM.
pub async fn run_serve(config: SwitchboardConfig) -> Result<(), SwitchboardError> {
    info!(version = env!("CARGO_PKG_VERSION"), "starting switchboard serve");

    let missing = config.whatsapp.missing_credentials();
    if !missing.is_empty() {
        warn!(missing = ?missing, "whatsapp configuration incomplete, sends will fail");
    }
    if config.server.api_token.is_none() {
        warn!("server.api_token is not set, operator APIs will reject every request");
    }

    let kv = open_backend(&config.storage).await?;
    let gateway: Arc<dyn MessagingGateway> = Arc::new(CloudApiClient::new(&config.whatsapp)?);
    let state = build_state(&config, kv.clone(), gateway);
    let bulk = state.bulk.clone();

    let cancel = shutdown::install_signal_handler();
    let served =
        switchboard_gateway::start_server(&config.server.host, config.server.port, state, cancel)
            .await;

    bulk.shutdown().await;
    if let Err(e) = kv.shutdown().await {
        warn!(error = %e, "persistence backend did not shut down cleanly");
    }
    info!("switchboard serve shutdown complete");
    served
}

/// Clears every conversation for every instance.
pub async fn run_reset(config: &SwitchboardConfig) -> Result<i64, SwitchboardError> {
    let kv = open_backend(&config.storage).await?;
    let store = ConversationStore::new(
        Persistence::new(kv.clone()),
        StoreSettings::from_config(&config.inbox),
    );
    let epoch = store.reset_all().await;
    kv.shutdown().await?;
    Ok(epoch)
}

/// Reads the last written bulk job status.
pub async fn run_bulk_status(config: &SwitchboardConfig) -> Result<BulkJob, SwitchboardError> {
    let kv = open_backend(&config.storage).await?;
    let job = Persistence::new(kv.clone())
        .get(keys::BULK_STATUS)
        .await
        .unwrap_or_default();
    kv.shutdown().await?;
    Ok(job)
}
