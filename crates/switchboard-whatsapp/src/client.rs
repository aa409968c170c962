// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Cloud API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use switchboard_config::model::WhatsAppConfig;
use switchboard_core::types::{
    AdapterType, AddressCheck, AddressValidation, GatewayProbe, HealthStatus, OutboundRequest,
    ProbeResult, SendReceipt,
};
use switchboard_core::{MessagingGateway, PluginAdapter, SwitchboardError};

use crate::types::{
    ApiErrorResponse, BusinessAccountNode, ContactsPayload, ContactsResponse, MessagePayload,
    MessageResponse, PhoneNumberNode,
};

const INCOMPLETE_CONFIG: &str = "WhatsApp configuration incomplete";

/// Graph API client bound to one business phone number.
///
/// Can be built without credentials so the server still starts and the
/// health endpoint can report what is missing; sends then fail with a
/// configuration error.
#[derive(Clone)]
pub struct CloudApiClient {
    client: reqwest::Client,
    base_url: String,
    api_version: u32,
    phone_number_id: Option<String>,
    business_account_id: Option<String>,
    has_token: bool,
}

impl CloudApiClient {
    pub fn new(config: &WhatsAppConfig) -> Result<Self, SwitchboardError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = config.access_token.as_deref() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| SwitchboardError::Config(format!("invalid access token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SwitchboardError::gateway(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version,
            phone_number_id: config.phone_number_id.clone(),
            business_account_id: config.business_account_id.clone(),
            has_token: config.access_token.is_some(),
        })
    }

    fn node_url(&self, node: &str) -> String {
        format!("{}/v{}/{}", self.base_url, self.api_version, node)
    }

    fn phone_number_id(&self) -> Result<&str, SwitchboardError> {
        match (self.has_token, self.phone_number_id.as_deref()) {
            (true, Some(id)) => Ok(id),
            _ => Err(SwitchboardError::Config(INCOMPLETE_CONFIG.into())),
        }
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, SwitchboardError>
    where
        B: serde::Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| SwitchboardError::gateway(format!("HTTP request failed: {e}")))?;
        read_response(response).await
    }

    async fn get<R: DeserializeOwned>(&self, url: &str) -> Result<R, SwitchboardError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SwitchboardError::gateway(format!("HTTP request failed: {e}")))?;
        read_response(response).await
    }

    async fn probe_phone_number(&self) -> ProbeResult {
        let Some(id) = self.phone_number_id.as_deref().filter(|_| self.has_token) else {
            return not_configured();
        };
        let url = format!(
            "{}?fields=display_phone_number,verified_name",
            self.node_url(id)
        );
        match self.get::<PhoneNumberNode>(&url).await {
            Ok(node) => {
                let detail = match (node.display_phone_number, node.verified_name) {
                    (Some(number), Some(name)) => Some(format!("{number} ({name})")),
                    (number, name) => number.or(name),
                };
                ProbeResult {
                    ok: true,
                    detail,
                    error: None,
                }
            }
            Err(e) => probe_failed(e),
        }
    }

    async fn probe_business_account(&self) -> ProbeResult {
        let Some(id) = self.business_account_id.as_deref().filter(|_| self.has_token) else {
            return not_configured();
        };
        let url = format!("{}?fields=name", self.node_url(id));
        match self.get::<BusinessAccountNode>(&url).await {
            Ok(node) => ProbeResult {
                ok: true,
                detail: node.name,
                error: None,
            },
            Err(e) => probe_failed(e),
        }
    }
}

impl std::fmt::Debug for CloudApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudApiClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("phone_number_id", &self.phone_number_id)
            .field("has_token", &self.has_token)
            .finish()
    }
}

/// Decodes a success body, or turns the Graph error envelope into a
/// [`SwitchboardError::Gateway`].
async fn read_response<R: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<R, SwitchboardError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SwitchboardError::gateway(format!("failed to read response body: {e}")))?;
    debug!(status = %status, "graph api response received");

    if status.is_success() {
        return serde_json::from_str(&body)
            .map_err(|e| SwitchboardError::gateway(format!("failed to parse API response: {e}")));
    }

    Err(api_error(status, &body))
}

fn api_error(status: StatusCode, body: &str) -> SwitchboardError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => SwitchboardError::Gateway {
            message: parsed.error.message,
            status: Some(status.as_u16()),
            code: parsed.error.code,
            error_type: parsed.error.type_,
            trace_id: parsed.error.fbtrace_id,
        },
        Err(_) => SwitchboardError::Gateway {
            message: format!("API returned {status}: {body}"),
            status: Some(status.as_u16()),
            code: None,
            error_type: None,
            trace_id: None,
        },
    }
}

/// Errors meaning the account cannot use the contacts endpoint at all.
fn validation_unsupported(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("unsupported post request") || lower.contains("does not exist")
}

fn not_configured() -> ProbeResult {
    ProbeResult {
        ok: false,
        detail: None,
        error: Some("not configured".to_string()),
    }
}

fn probe_failed(e: SwitchboardError) -> ProbeResult {
    ProbeResult {
        ok: false,
        detail: None,
        error: Some(e.reason()),
    }
}

fn unverified(addresses: &[String], reason: &str) -> Vec<AddressCheck> {
    addresses
        .iter()
        .map(|input| AddressCheck {
            input: input.clone(),
            valid: None,
            wa_id: None,
            reason: Some(reason.to_string()),
        })
        .collect()
}

#[async_trait]
impl PluginAdapter for CloudApiClient {
    fn name(&self) -> &str {
        "whatsapp-cloud"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        if self.phone_number_id().is_err() {
            return Ok(HealthStatus::Degraded(INCOMPLETE_CONFIG.into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for CloudApiClient {
    fn endpoint(&self) -> String {
        self.node_url(&format!(
            "{}/messages",
            self.phone_number_id.as_deref().unwrap_or("unconfigured")
        ))
    }

    async fn send(&self, request: &OutboundRequest) -> Result<SendReceipt, SwitchboardError> {
        self.phone_number_id()?;
        let payload = MessagePayload::from_request(request);
        let response: MessageResponse = self.post(&self.endpoint(), &payload).await?;
        let message_id = response.messages.into_iter().next().map(|m| m.id);
        debug!(to = %request.to, message_id = ?message_id, "message accepted");
        Ok(SendReceipt { message_id })
    }

    async fn validate_addresses(
        &self,
        addresses: &[String],
    ) -> Result<AddressValidation, SwitchboardError> {
        let Ok(id) = self.phone_number_id() else {
            return Ok(AddressValidation {
                results: unverified(addresses, INCOMPLETE_CONFIG),
                available: false,
            });
        };

        let url = self.node_url(&format!("{id}/contacts"));
        let payload = ContactsPayload {
            blocking: "wait",
            contacts: addresses,
        };

        match self.post::<_, ContactsResponse>(&url, &payload).await {
            Ok(response) => {
                let results = addresses
                    .iter()
                    .map(|input| {
                        let returned = response.contacts.iter().find(|c| &c.input == input);
                        match returned {
                            Some(c) if c.status.as_deref() == Some("valid") => AddressCheck {
                                input: input.clone(),
                                valid: Some(true),
                                wa_id: c.wa_id.clone(),
                                reason: None,
                            },
                            Some(c) => AddressCheck {
                                input: input.clone(),
                                valid: Some(false),
                                wa_id: None,
                                reason: Some(c.status.clone().unwrap_or_else(|| "invalid".into())),
                            },
                            None => AddressCheck {
                                input: input.clone(),
                                valid: Some(false),
                                wa_id: None,
                                reason: Some("not verified".into()),
                            },
                        }
                    })
                    .collect();
                Ok(AddressValidation {
                    results,
                    available: true,
                })
            }
            Err(e @ SwitchboardError::Gateway { status: Some(_), .. }) => {
                let reason = e.reason();
                if validation_unsupported(&reason) {
                    warn!(error = %reason, "contact validation unsupported for this account");
                    return Ok(AddressValidation {
                        results: unverified(addresses, &reason),
                        available: false,
                    });
                }
                Ok(AddressValidation {
                    results: addresses
                        .iter()
                        .map(|input| AddressCheck {
                            input: input.clone(),
                            valid: Some(false),
                            wa_id: None,
                            reason: Some(reason.clone()),
                        })
                        .collect(),
                    available: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn probe(&self) -> GatewayProbe {
        GatewayProbe {
            phone_number: self.probe_phone_number().await,
            business_account: self.probe_business_account().await,
        }
    }
}
