// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graph API client against a mock server.

use serde_json::json;
use switchboard_config::model::WhatsAppConfig;
use switchboard_core::types::OutboundRequest;
use switchboard_core::{MessagingGateway, PluginAdapter, SwitchboardError};
use switchboard_whatsapp::CloudApiClient;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CloudApiClient {
    CloudApiClient::new(&WhatsAppConfig {
        access_token: Some("test-token".into()),
        phone_number_id: Some("pn-1".into()),
        business_account_id: Some("waba-1".into()),
        base_url: server.uri(),
        ..WhatsAppConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn text_send_returns_message_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v18/pn-1/messages"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": "5585999990000",
            "type": "text",
            "text": {"preview_url": false, "body": "hello"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messaging_product": "whatsapp",
            "contacts": [{"input": "5585999990000", "wa_id": "5585999990000"}],
            "messages": [{"id": "wamid.ABC"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client(&server)
        .send(&OutboundRequest::text("5585999990000", "hello"))
        .await
        .unwrap();
    assert_eq!(receipt.message_id.as_deref(), Some("wamid.ABC"));
}

#[tokio::test]
async fn provider_error_is_structured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v18/pn-1/messages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "(#131030) Recipient phone number not in allowed list",
                "type": "OAuthException",
                "code": 131030,
                "fbtrace_id": "A1b2C3"
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .send(&OutboundRequest::template("5585999990000", "promo", "pt_BR"))
        .await
        .unwrap_err();
    match err {
        SwitchboardError::Gateway {
            message,
            status,
            code,
            error_type,
            trace_id,
        } => {
            assert_eq!(message, "(#131030) Recipient phone number not in allowed list");
            assert_eq!(status, Some(400));
            assert_eq!(code, Some(131030));
            assert_eq!(error_type.as_deref(), Some("OAuthException"));
            assert_eq!(trace_id.as_deref(), Some("A1b2C3"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_credentials_fail_without_a_request() {
    let server = MockServer::start().await;
    let client = CloudApiClient::new(&WhatsAppConfig {
        base_url: server.uri(),
        ..WhatsAppConfig::default()
    })
    .unwrap();

    let err = client
        .send(&OutboundRequest::text("5585999990000", "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchboardError::Config(_)));
    assert!(!client.health_check().await.unwrap().is_healthy());

    let validation = client
        .validate_addresses(&["5585999990000".to_string()])
        .await
        .unwrap();
    assert!(!validation.available);
    assert_eq!(validation.results[0].valid, None);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn contact_validation_maps_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v18/pn-1/contacts"))
        .and(body_json(json!({
            "blocking": "wait",
            "contacts": ["5585999990001", "5585999990002", "5585999990003"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contacts": [
                {"input": "5585999990001", "status": "valid", "wa_id": "5585999990001"},
                {"input": "5585999990002", "status": "invalid"}
            ]
        })))
        .mount(&server)
        .await;

    let addresses: Vec<String> = ["5585999990001", "5585999990002", "5585999990003"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let validation = client(&server).validate_addresses(&addresses).await.unwrap();

    assert!(validation.available);
    let valid: Vec<_> = validation.results.iter().map(|r| r.valid).collect();
    assert_eq!(valid, [Some(true), Some(false), Some(false)]);
    assert_eq!(validation.results[0].wa_id.as_deref(), Some("5585999990001"));
    assert_eq!(validation.results[2].reason.as_deref(), Some("not verified"));
}

#[tokio::test]
async fn unsupported_validation_marks_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v18/pn-1/contacts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Unsupported post request. Object with ID 'pn-1' does not exist",
                "type": "GraphMethodException",
                "code": 100
            }
        })))
        .mount(&server)
        .await;

    let validation = client(&server)
        .validate_addresses(&["5585999990001".to_string()])
        .await
        .unwrap();
    assert!(!validation.available);
    assert_eq!(validation.results[0].valid, None);
}

#[tokio::test]
async fn probes_report_account_details() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v18/pn-1"))
        .and(query_param("fields", "display_phone_number,verified_name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "display_phone_number": "+55 85 99999-0000",
            "verified_name": "Acme",
            "id": "pn-1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v18/waba-1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Invalid OAuth access token.", "type": "OAuthException", "code": 190}
        })))
        .mount(&server)
        .await;

    let probe = client(&server).probe().await;
    assert!(probe.phone_number.ok);
    assert_eq!(probe.phone_number.detail.as_deref(), Some("+55 85 99999-0000 (Acme)"));
    assert!(!probe.business_account.ok);
    assert_eq!(
        probe.business_account.error.as_deref(),
        Some("Invalid OAuth access token.")
    );
}
