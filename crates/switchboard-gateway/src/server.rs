// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use switchboard_bulk::BulkController;
use switchboard_core::{MessagingGateway, SwitchboardError};
use switchboard_inbox::{ConversationStore, WebhookPipeline};
use switchboard_storage::Persistence;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Contact lists for bulk runs can be large.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Webhook handshake and signature settings.
#[derive(Clone, Default)]
pub struct WebhookSettings {
    pub verify_token: Option<String>,
    /// Enables `X-Hub-Signature-256` checks when set.
    pub app_secret: Option<String>,
}

impl std::fmt::Debug for WebhookSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSettings")
            .field("verify_token", &self.verify_token.as_ref().map(|_| "[redacted]"))
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConversationStore>,
    pub pipeline: Arc<WebhookPipeline>,
    pub bulk: Arc<BulkController>,
    pub gateway: Arc<dyn MessagingGateway>,
    pub persistence: Persistence,
    pub webhook: WebhookSettings,
    pub auth: AuthConfig,
    /// WhatsApp settings absent from configuration, reported by `/health`.
    pub missing_credentials: Vec<&'static str>,
}

/// Builds the full router.
///
/// - `GET /health`, `GET|POST /webhook`: public
/// - `/api/...`: bearer token required
pub fn build_router(state: AppState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route(
            "/webhook",
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        )
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/api/conversations",
            get(handlers::list_conversations)
                .post(handlers::create_conversation)
                .delete(handlers::reset_conversations),
        )
        .route("/api/conversations/{id}", get(handlers::get_conversation))
        .route(
            "/api/conversations/{id}/control",
            post(handlers::set_control),
        )
        .route("/api/messages", post(handlers::send_message))
        .route("/api/bulk/start", post(handlers::bulk_start))
        .route("/api/bulk/status", get(handlers::bulk_status))
        .route("/api/bulk/stop", post(handlers::bulk_stop))
        .route("/api/bulk/validate", post(handlers::bulk_validate))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}

/// Binds `host:port` and serves until `shutdown` is cancelled.
pub async fn start_server(
    host: &str,
    port: u16,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), SwitchboardError> {
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SwitchboardError::Internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!(%addr, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| SwitchboardError::Internal(format!("http server error: {e}")))?;

    tracing::info!("http server stopped");
    Ok(())
}
