// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook payloads driving the conversation store.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use switchboard_config::model::AutoReplyRule;
use switchboard_core::types::Direction;
use switchboard_inbox::{AddressRules, ConversationStore, StoreSettings, WebhookPipeline};
use switchboard_test_utils::{MockGateway, fixtures, memory_persistence};

const ADDR: &str = "5585999990000";

fn store() -> Arc<ConversationStore> {
    let (_, persistence) = memory_persistence();
    Arc::new(ConversationStore::new(
        persistence,
        StoreSettings {
            refresh_interval: Duration::ZERO,
            ..StoreSettings::default()
        },
    ))
}

#[tokio::test]
async fn inbound_text_creates_conversation() {
    let store = store();
    let pipeline = WebhookPipeline::new(store.clone());

    let ack = pipeline
        .process(&fixtures::text_message(ADDR, "wamid.1", "Olá", 1_700_000_000))
        .await;
    assert_eq!(ack.messages, 1);
    assert_eq!(ack.failures, 0);

    let conv = store.get_conversation(ADDR).await.unwrap();
    assert_eq!(conv.name.as_deref(), Some("Test Contact"));
    assert_eq!(conv.messages[0].id, "wamid.1");
    assert_eq!(conv.messages[0].timestamp, 1_700_000_000_000);
    assert_eq!(conv.last_message.as_deref(), Some("Olá"));
}

#[tokio::test]
async fn status_callback_updates_outbound_record() {
    let store = store();
    let pipeline = WebhookPipeline::new(store.clone());
    store
        .record_outbound(ADDR, "hello", Some("wamid.out".into()))
        .await
        .unwrap();

    let ack = pipeline
        .process(&fixtures::status_update(ADDR, "wamid.out", "delivered", 1_700_000_100))
        .await;
    assert_eq!(ack.statuses, 1);

    let conv = store.get_conversation(ADDR).await.unwrap();
    let record = conv.find_message("wamid.out").unwrap();
    assert_eq!(record.status.as_deref(), Some("delivered"));
    assert_eq!(record.status_timestamp, Some(1_700_000_100_000));
}

#[tokio::test]
async fn status_racing_ahead_of_message_is_harmless() {
    let store = store();
    let pipeline = WebhookPipeline::new(store.clone());
    let ack = pipeline
        .process(&fixtures::status_update(ADDR, "wamid.never", "read", 1))
        .await;
    assert_eq!(ack.statuses, 1);
    assert!(store.list_conversations().await.is_empty());
}

#[tokio::test]
async fn history_backfill_sorts_into_place() {
    let store = store();
    let pipeline = WebhookPipeline::new(store.clone());
    pipeline
        .process(&fixtures::text_message(ADDR, "live", "live message", 2_000))
        .await;

    let history = fixtures::webhook(json!({
        "history": [{"threads": [{"id": ADDR, "messages": [
            {"from": ADDR, "id": "h-in", "timestamp": "1000", "type": "text", "text": {"body": "old question"}},
            {"from": "15550000000", "id": "h-out", "timestamp": "1001", "type": "text",
             "text": {"body": "old answer"}, "history_context": {"status": "READ"}}
        ]}]}]
    }));
    let ack = pipeline.process(&history).await;
    assert_eq!(ack.history, 2);

    let conv = store.get_conversation(ADDR).await.unwrap();
    let ids: Vec<_> = conv.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["h-in", "h-out", "live"]);
    assert_eq!(conv.messages[1].direction, Direction::Out);
    assert_eq!(conv.messages[1].status.as_deref(), Some("read"));
    assert_eq!(conv.last_message.as_deref(), Some("live message"));
}

#[tokio::test]
async fn garbage_is_acknowledged() {
    let pipeline = WebhookPipeline::new(store());
    for payload in [json!(null), json!("text"), json!({"entry": 5}), json!({"entry": [{"changes": [{}]}]})] {
        let ack = pipeline.process(&payload).await;
        assert_eq!(ack.messages + ack.statuses + ack.history, 0);
    }
}

#[tokio::test]
async fn invalid_sender_is_counted_not_raised() {
    let pipeline = WebhookPipeline::new(store());
    let ack = pipeline
        .process(&fixtures::text_message("12", "wamid.x", "hi", 1))
        .await;
    assert_eq!(ack.messages, 1);
    assert_eq!(ack.failures, 1);
}

#[tokio::test]
async fn address_rules_reply_and_record() {
    let store = store();
    let gateway = Arc::new(MockGateway::new());
    let rules = vec![AutoReplyRule {
        addresses: vec!["(85) 99999-0000".into()],
        reply: "We will get back to you soon.".into(),
    }];
    let responder = AddressRules::new(&rules, gateway.clone(), store.clone());
    assert_eq!(responder.len(), 1);
    let pipeline = WebhookPipeline::new(store.clone()).with_responder(Arc::new(responder));

    pipeline
        .process(&fixtures::text_message(ADDR, "wamid.1", "hi", 10))
        .await;
    pipeline
        .process(&fixtures::text_message("5511911110000", "wamid.2", "hi", 11))
        .await;

    assert_eq!(gateway.sent_to().await, [ADDR]);
    let conv = store.get_conversation(ADDR).await.unwrap();
    assert_eq!(conv.messages.len(), 2);
    assert_eq!(conv.messages[1].direction, Direction::Out);
    assert_eq!(conv.messages[1].text, "We will get back to you soon.");
}

#[tokio::test]
async fn manual_control_silences_auto_reply() {
    let store = store();
    let gateway = Arc::new(MockGateway::new());
    let rules = vec![AutoReplyRule {
        addresses: vec![ADDR.into()],
        reply: "auto".into(),
    }];
    let pipeline = WebhookPipeline::new(store.clone()).with_responder(Arc::new(
        AddressRules::new(&rules, gateway.clone(), store.clone()),
    ));

    pipeline
        .process(&fixtures::text_message(ADDR, "wamid.1", "hi", 10))
        .await;
    assert!(store.set_manual_control(ADDR, true).await);
    pipeline
        .process(&fixtures::text_message(ADDR, "wamid.2", "still there?", 20))
        .await;

    assert_eq!(gateway.sent_count().await, 1);
}
