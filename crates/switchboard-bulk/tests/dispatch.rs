// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatcher behavior with scripted hooks and a mock gateway.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use switchboard_bulk::{BulkDispatcher, DispatchDefaults, DispatchHooks};
use switchboard_core::SwitchboardError;
use switchboard_core::types::{Contact, ContactStatus};
use switchboard_test_utils::{MockGateway, fixtures};

const A: &str = "5585999990001";
const B: &str = "5585999990002";
const C: &str = "5585999990003";

#[derive(Default)]
struct RecordingHooks {
    stop_after: Option<usize>,
    progressed: AtomicUsize,
    progress: Mutex<Vec<(String, usize, usize)>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl RecordingHooks {
    fn stopping_after(n: usize) -> Self {
        Self {
            stop_after: Some(n),
            ..Self::default()
        }
    }
}

#[async_trait]
impl DispatchHooks for RecordingHooks {
    async fn on_progress(&self, contact: &Contact, index: usize, total: usize) {
        self.progressed.fetch_add(1, Ordering::SeqCst);
        self.progress
            .lock()
            .await
            .push((contact.address.clone(), index, total));
    }

    async fn on_request(&self, url: &str, payload: &Value, _contact: &Contact) {
        self.requests
            .lock()
            .await
            .push((url.to_string(), payload.clone()));
    }

    async fn should_stop(&self) -> bool {
        self.stop_after
            .is_some_and(|n| self.progressed.load(Ordering::SeqCst) >= n)
    }
}

fn dispatcher(gateway: &Arc<MockGateway>, delay: Duration) -> BulkDispatcher {
    BulkDispatcher::new(gateway.clone(), delay, "55")
}

fn defaults() -> DispatchDefaults {
    DispatchDefaults {
        template: Some("promo".into()),
        language: "pt_BR".into(),
    }
}

#[tokio::test(start_paused = true)]
async fn resume_skips_already_sent_contacts() {
    let gateway = Arc::new(MockGateway::new());
    let hooks = RecordingHooks::default();
    let mut contacts = vec![Contact::new(A), fixtures::sent_contact(B), Contact::new(C)];
    let before = contacts[1].clone();

    let summary = dispatcher(&gateway, Duration::from_secs(1))
        .run(&mut contacts, &defaults(), &hooks)
        .await
        .unwrap();

    assert_eq!(gateway.sent_to().await, [A, C]);
    assert_eq!(contacts[1], before);
    assert_eq!(contacts[0].status, ContactStatus::Sent);
    assert_eq!(contacts[2].status, ContactStatus::Sent);
    assert!(contacts[0].send_id.as_deref().unwrap().starts_with("mock-msg-"));
    assert_eq!((summary.sent, summary.failed, summary.skipped), (2, 0, 1));

    let progress = hooks.progress.lock().await.clone();
    assert_eq!(progress, [(A.to_string(), 0, 3), (C.to_string(), 2, 3)]);
}

#[tokio::test(start_paused = true)]
async fn stop_leaves_the_tail_pending() {
    let gateway = Arc::new(MockGateway::new());
    let hooks = RecordingHooks::stopping_after(2);
    let mut contacts = fixtures::contacts(&[A, B, C, "5585999990004", "5585999990005"]);

    let err = dispatcher(&gateway, Duration::from_millis(100))
        .run(&mut contacts, &defaults(), &hooks)
        .await
        .unwrap_err();

    assert!(matches!(err, SwitchboardError::Interrupted { processed: 2 }));
    assert_eq!(gateway.sent_count().await, 2);
    let statuses: Vec<_> = contacts.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        [
            ContactStatus::Sent,
            ContactStatus::Sent,
            ContactStatus::Pending,
            ContactStatus::Pending,
            ContactStatus::Pending
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn provider_errors_do_not_end_the_run() {
    let gateway = Arc::new(MockGateway::new());
    gateway
        .fail_for(B, "Recipient phone number not in allowed list", Some(131030))
        .await;
    let hooks = RecordingHooks::default();
    let mut contacts = fixtures::contacts(&[A, B, C]);

    let summary = dispatcher(&gateway, Duration::from_millis(10))
        .run(&mut contacts, &defaults(), &hooks)
        .await
        .unwrap();

    assert_eq!((summary.sent, summary.failed), (2, 1));
    assert_eq!(contacts[1].status, ContactStatus::Failed);
    assert_eq!(
        contacts[1].error.as_deref(),
        Some("Recipient phone number not in allowed list")
    );
    assert_eq!(contacts[2].status, ContactStatus::Sent);
}

#[tokio::test(start_paused = true)]
async fn invalid_address_fails_without_a_call_or_delay() {
    let gateway = Arc::new(MockGateway::new());
    let hooks = RecordingHooks::default();
    let mut contacts = fixtures::contacts(&["n/a", A, B]);

    let started = tokio::time::Instant::now();
    dispatcher(&gateway, Duration::from_secs(1))
        .run(&mut contacts, &defaults(), &hooks)
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(contacts[0].status, ContactStatus::Failed);
    assert_eq!(gateway.sent_to().await, [A, B]);
    // One delay between A and B; none after the invalid contact or the last one.
    assert!(elapsed >= Duration::from_secs(1), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
}

#[tokio::test]
async fn every_request_is_audited_before_sending() {
    let gateway = Arc::new(MockGateway::new());
    let hooks = RecordingHooks::default();
    let mut contacts = fixtures::contacts(&["(85) 99999-0001"]);
    contacts[0].message = Some("Olá".into());
    contacts[0].link = Some("https://example.com".into());

    dispatcher(&gateway, Duration::ZERO)
        .run(&mut contacts, &defaults(), &hooks)
        .await
        .unwrap();

    let requests = hooks.requests.lock().await.clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "mock://gateway/messages");
    assert_eq!(requests[0].1["to"], A);
    assert_eq!(requests[0].1["type"], "text");
    assert_eq!(requests[0].1["body"], "Olá\n\nhttps://example.com");
}
