// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.

use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use switchboard_bulk::{StartRequest, ValidationReport};
use switchboard_core::SwitchboardError;
use switchboard_core::types::{
    BulkJob, Conversation, ConversationSummary, GatewayProbe, HealthStatus, OutboundRequest,
};

use crate::error::ApiError;
use crate::server::AppState;
use crate::signature::{SIGNATURE_HEADER, verify_signature};

// --- health ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub version: &'static str,
    pub missing_config: Vec<&'static str>,
    pub storage: HealthStatus,
    pub gateway: GatewayProbe,
}

/// GET /health
///
/// Configuration completeness, backend health and live provider probes.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = state.persistence.health().await;
    let gateway = state.gateway.probe().await;
    let ok = state.missing_credentials.is_empty()
        && storage.is_healthy()
        && gateway.phone_number.ok
        && gateway.business_account.ok;

    Json(HealthResponse {
        ok,
        version: env!("CARGO_PKG_VERSION"),
        missing_config: state.missing_credentials.clone(),
        storage,
        gateway,
    })
}

// --- webhook ---

/// GET /webhook
///
/// Subscription handshake: echoes `hub.challenge` when `hub.verify_token`
/// matches the configured token.
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);
    let challenge = params.get("hub.challenge").filter(|c| !c.is_empty());

    match (mode, token, state.webhook.verify_token.as_deref(), challenge) {
        (Some("subscribe"), Some(token), Some(expected), Some(challenge)) if token == expected => {
            info!("webhook subscription verified");
            (StatusCode::OK, challenge.clone()).into_response()
        }
        _ => {
            warn!(mode = ?mode, "webhook verification rejected");
            (
                StatusCode::FORBIDDEN,
                Json(json!({"ok": false, "error": "invalid verify token or missing parameters"})),
            )
                .into_response()
        }
    }
}

/// POST /webhook
///
/// Acknowledges every delivery that passes the signature check, whether or
/// not its events could be applied.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = state.webhook.app_secret.as_deref() {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if let Err(reason) = verify_signature(secret, header, &body) {
            warn!(reason, "webhook signature rejected");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"ok": false, "error": reason})),
            )
                .into_response();
        }
    }

    match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => {
            state.pipeline.process(&payload).await;
        }
        Err(e) => warn!(error = %e, "webhook body is not JSON, acknowledging anyway"),
    }
    Json(json!({"ok": true})).into_response()
}

// --- conversations ---

/// GET /api/conversations
pub async fn list_conversations(State(state): State<AppState>) -> Json<Vec<ConversationSummary>> {
    Json(state.store.list_conversations().await)
}

/// GET /api/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, ApiError> {
    state
        .store
        .get_conversation(&id)
        .await
        .map(Json)
        .ok_or_else(|| SwitchboardError::NotFound(format!("conversation {id}")).into())
}

#[derive(Debug, Deserialize)]
pub struct CreateConversation {
    #[serde(alias = "phoneNumber", alias = "telefone")]
    pub phone: String,
    #[serde(default, alias = "nome")]
    pub name: Option<String>,
}

/// POST /api/conversations
pub async fn create_conversation(
    State(state): State<AppState>,
    Json(body): Json<CreateConversation>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state
        .store
        .ensure_conversation(&body.phone, body.name.as_deref())
        .await?;
    Ok(Json(conversation))
}

/// DELETE /api/conversations
pub async fn reset_conversations(State(state): State<AppState>) -> Json<Value> {
    let epoch = state.store.reset_all().await;
    Json(json!({"ok": true, "resetAt": epoch}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlRequest {
    pub is_human: bool,
}

/// POST /api/conversations/{id}/control
pub async fn set_control(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ControlRequest>,
) -> Result<Json<Value>, ApiError> {
    // Loads the shared state so conversations created elsewhere are found.
    if state.store.peek(&id).await.is_none()
        || !state.store.set_manual_control(&id, body.is_human).await
    {
        return Err(SwitchboardError::NotFound(format!("conversation {id}")).into());
    }
    Ok(Json(json!({"ok": true, "isHuman": body.is_human})))
}

// --- messages ---

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub to: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub ok: bool,
    pub message_id: Option<String>,
}

/// POST /api/messages
///
/// Sends free text and records it in the conversation.
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let to = state.store.normalize(&body.to)?;
    let receipt = state
        .gateway
        .send(&OutboundRequest::text(to.as_str(), body.text.as_str()))
        .await
        .inspect_err(|e| warn!(to = %to, error = %e, "send failed"))?;

    state
        .store
        .record_outbound(&to, &body.text, receipt.message_id.clone())
        .await?;

    Ok(Json(SendResponse {
        ok: true,
        message_id: receipt.message_id,
    }))
}

// --- bulk ---

/// POST /api/bulk/start
pub async fn bulk_start(
    State(state): State<AppState>,
    Json(body): Json<StartRequest>,
) -> Result<(StatusCode, Json<BulkJob>), ApiError> {
    let job = state.bulk.start(body).await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// GET /api/bulk/status
pub async fn bulk_status(State(state): State<AppState>) -> Json<BulkJob> {
    Json(state.bulk.status().await)
}

/// POST /api/bulk/stop
pub async fn bulk_stop(State(state): State<AppState>) -> Json<BulkJob> {
    Json(state.bulk.stop().await)
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(alias = "numeros", alias = "numbers")]
    pub addresses: Vec<String>,
}

/// POST /api/bulk/validate
pub async fn bulk_validate(
    State(state): State<AppState>,
    Json(body): Json<ValidateRequest>,
) -> Json<ValidationReport> {
    Json(state.bulk.validate(&body.addresses).await)
}
