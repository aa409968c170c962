// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end flows through the assembled application.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use switchboard::build_state;
use switchboard_config::SwitchboardConfig;
use switchboard_config::model::AutoReplyRule;
use switchboard_core::KvStore;
use switchboard_inbox::{ConversationStore, NewMessage, StoreSettings};
use switchboard_storage::{MemoryKv, Persistence, SqliteKv};
use switchboard_test_utils::{MockGateway, fixtures};

const TOKEN: &str = "e2e-token";
const ADDR: &str = "5585999990000";

fn config() -> SwitchboardConfig {
    let mut config = SwitchboardConfig::default();
    config.server.api_token = Some(TOKEN.into());
    config.inbox.refresh_interval_ms = 0;
    config.bulk.delay_between_messages_ms = 0;
    config
}

fn api(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"))
        .header("content-type", "application/json");
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn sqlite_path(dir: &tempfile::TempDir) -> String {
    dir.path().join("shared.db").display().to_string()
}

#[tokio::test]
async fn two_instances_share_one_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = sqlite_path(&dir);
    let first_kv: Arc<dyn KvStore> = Arc::new(SqliteKv::open(&path).await.unwrap());
    let second_kv: Arc<dyn KvStore> = Arc::new(SqliteKv::open(&path).await.unwrap());

    let settings = StoreSettings {
        refresh_interval: std::time::Duration::ZERO,
        ..StoreSettings::default()
    };
    let first = ConversationStore::new(Persistence::new(first_kv), settings.clone());
    let second = ConversationStore::new(Persistence::new(second_kv), settings);

    first
        .append_message(NewMessage::inbound(ADDR, "from first").with_id(Some("a".into())))
        .await
        .unwrap();
    second
        .append_message(NewMessage::inbound(ADDR, "from second").with_id(Some("b".into())))
        .await
        .unwrap();

    let conv = first.get_conversation(ADDR).await.unwrap();
    let ids: Vec<_> = conv.messages.iter().map(|m| m.id.as_str()).collect();
    assert!(ids.contains(&"a"));
    assert!(ids.contains(&"b"));

    let epoch = second.reset_all().await;
    assert!(epoch > 0);
    assert!(first.list_conversations().await.is_empty());
    assert!(first.get_conversation(ADDR).await.is_none());
}

#[tokio::test]
async fn webhook_message_reaches_the_operator_api() {
    let mut config = config();
    config.inbox.auto_reply = vec![AutoReplyRule {
        addresses: vec![ADDR.into()],
        reply: "We will get back to you soon.".into(),
    }];
    let gateway = Arc::new(MockGateway::new());
    let state = build_state(&config, Arc::new(MemoryKv::new()), gateway.clone());
    let app = switchboard_gateway::build_router(state);

    let delivery = fixtures::webhook(fixtures::text_message(ADDR, "wamid.in", "hello", 1_700_000_000));
    let request = Request::post("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(delivery.to_string()))
        .unwrap();
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, list) = call(&app, api("GET", "/api/conversations", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["id"], ADDR);
    assert_eq!(list[0]["unreadCount"], 1);

    let (status, conv) = call(&app, api("GET", &format!("/api/conversations/{ADDR}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    let messages = conv["messages"].as_array().unwrap();
    assert_eq!(messages[0]["text"], "hello");
    assert_eq!(messages.len(), 2);
    assert_eq!(gateway.sent_to().await, vec![ADDR.to_string()]);

    let (_, list) = call(&app, api("GET", "/api/conversations", None)).await;
    assert_eq!(list[0]["unreadCount"], 0);
}

#[tokio::test]
async fn bulk_run_completes_through_the_api() {
    let gateway = Arc::new(MockGateway::new());
    let state = build_state(&config(), Arc::new(MemoryKv::new()), gateway.clone());
    let bulk = state.bulk.clone();
    let app = switchboard_gateway::build_router(state);

    let start = json!({
        "template": "promo",
        "language": "pt_BR",
        "contacts": [
            {"numero": "5585999990001"},
            {"numero": "5585999990002", "mensagem": "custom text"}
        ]
    });
    let (status, job) = call(&app, api("POST", "/api/bulk/start", Some(start))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(job["total"], 2);

    bulk.wait().await;

    let (_, finished) = call(&app, api("GET", "/api/bulk/status", None)).await;
    assert_eq!(finished["id"], job["id"]);
    assert_eq!(finished["active"], false);
    assert_eq!(finished["sent"], 2);
    assert_eq!(finished["failed"], 0);
    assert_eq!(gateway.sent_count().await, 2);
}

#[tokio::test]
async fn missing_credentials_degrade_health() {
    let gateway = Arc::new(MockGateway::new());
    let state = build_state(&config(), Arc::new(MemoryKv::new()), gateway);
    assert!(!state.missing_credentials.is_empty());
    let app = switchboard_gateway::build_router(state);

    let (status, body) = call(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert!(!body["missingConfig"].as_array().unwrap().is_empty());
}
