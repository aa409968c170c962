// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graph API wire types.

use serde::{Deserialize, Serialize};
use switchboard_core::types::{OutboundBody, OutboundRequest};

/// Body of `POST /{phone-number-id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePayload<'a> {
    pub messaging_product: &'static str,
    pub recipient_type: &'static str,
    pub to: &'a str,
    #[serde(flatten)]
    pub content: MessageContent<'a>,
}

impl<'a> MessagePayload<'a> {
    pub fn from_request(request: &'a OutboundRequest) -> Self {
        let content = match &request.body {
            OutboundBody::Text { body } => MessageContent::Text {
                text: TextContent {
                    preview_url: body.contains("http"),
                    body,
                },
            },
            OutboundBody::Template { name, language } => MessageContent::Template {
                template: TemplateContent {
                    name,
                    language: LanguageCode { code: language },
                },
            },
        };
        Self {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: &request.to,
            content,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent<'a> {
    Text { text: TextContent<'a> },
    Template { template: TemplateContent<'a> },
}

#[derive(Debug, Clone, Serialize)]
pub struct TextContent<'a> {
    pub preview_url: bool,
    pub body: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateContent<'a> {
    pub name: &'a str,
    pub language: LanguageCode<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageCode<'a> {
    pub code: &'a str,
}

/// Response to a successful send.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub messages: Vec<MessageId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageId {
    pub id: String,
}

/// Body of `POST /{phone-number-id}/contacts`.
#[derive(Debug, Clone, Serialize)]
pub struct ContactsPayload<'a> {
    pub blocking: &'static str,
    pub contacts: &'a [String],
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactsResponse {
    #[serde(default)]
    pub contacts: Vec<ContactStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactStatus {
    pub input: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub wa_id: Option<String>,
}

/// Error envelope returned on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

/// Phone number node, as requested with `fields=display_phone_number,verified_name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhoneNumberNode {
    #[serde(default)]
    pub display_phone_number: Option<String>,
    #[serde(default)]
    pub verified_name: Option<String>,
}

/// Business account node, as requested with `fields=name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessAccountNode {
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_payload_shape() {
        let request = OutboundRequest::text("5585999990000", "see https://example.com");
        let json = serde_json::to_value(MessagePayload::from_request(&request)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": "5585999990000",
                "type": "text",
                "text": {"preview_url": true, "body": "see https://example.com"}
            })
        );
    }

    #[test]
    fn template_payload_shape() {
        let request = OutboundRequest::template("5585999990000", "promo", "pt_BR");
        let json = serde_json::to_value(MessagePayload::from_request(&request)).unwrap();
        assert_eq!(json["type"], "template");
        assert_eq!(json["template"]["name"], "promo");
        assert_eq!(json["template"]["language"]["code"], "pt_BR");
        assert!(json.get("text").is_none());
    }

    #[test]
    fn error_envelope_parses() {
        let body = r#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190,"fbtrace_id":"AbC"}}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.code, Some(190));
        assert_eq!(parsed.error.type_.as_deref(), Some("OAuthException"));
        assert_eq!(parsed.error.fbtrace_id.as_deref(), Some("AbC"));
    }
}
