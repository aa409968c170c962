// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging gateway for deterministic tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use switchboard_core::types::{
    AddressCheck, AddressValidation, AdapterType, GatewayProbe, HealthStatus, OutboundRequest,
    ProbeResult, SendReceipt,
};
use switchboard_core::{MessagingGateway, PluginAdapter, SwitchboardError};

/// Scripted provider rejection for one address.
#[derive(Debug, Clone)]
struct ScriptedFailure {
    message: String,
    code: Option<i64>,
}

/// A gateway that records every request instead of sending it.
///
/// Sends succeed with a `mock-msg-<uuid>` id unless a failure was scripted
/// for the recipient. Validation reports every address valid except the
/// ones marked invalid.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    sent: Arc<Mutex<Vec<OutboundRequest>>>,
    failures: Arc<Mutex<HashMap<String, ScriptedFailure>>>,
    invalid: Arc<Mutex<HashSet<String>>>,
    validated: Arc<Mutex<Vec<Vec<String>>>>,
    omit_ids: Arc<AtomicBool>,
    validation_unavailable: Arc<AtomicBool>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sends to `address` fail with a provider error.
    pub async fn fail_for(&self, address: &str, message: &str, code: Option<i64>) {
        self.failures.lock().await.insert(
            address.to_string(),
            ScriptedFailure {
                message: message.to_string(),
                code,
            },
        );
    }

    /// Marks `address` as unable to receive messages.
    pub async fn mark_invalid(&self, address: &str) {
        self.invalid.lock().await.insert(address.to_string());
    }

    /// Successful sends report no message id.
    pub fn omit_message_ids(&self) {
        self.omit_ids.store(true, Ordering::SeqCst);
    }

    /// Validation reports the feature as unsupported.
    pub fn disable_validation(&self) {
        self.validation_unavailable.store(true, Ordering::SeqCst);
    }

    pub async fn sent_requests(&self) -> Vec<OutboundRequest> {
        self.sent.lock().await.clone()
    }

    /// Recipients of every accepted or rejected send, in order.
    pub async fn sent_to(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|r| r.to.clone()).collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Batches passed to `validate_addresses`, in order.
    pub async fn validation_batches(&self) -> Vec<Vec<String>> {
        self.validated.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockGateway {
    fn name(&self) -> &str {
        "mock-gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for MockGateway {
    fn endpoint(&self) -> String {
        "mock://gateway/messages".to_string()
    }

    async fn send(&self, request: &OutboundRequest) -> Result<SendReceipt, SwitchboardError> {
        self.sent.lock().await.push(request.clone());

        if let Some(failure) = self.failures.lock().await.get(&request.to) {
            return Err(SwitchboardError::Gateway {
                message: failure.message.clone(),
                status: Some(400),
                code: failure.code,
                error_type: Some("OAuthException".to_string()),
                trace_id: Some("mock-trace".to_string()),
            });
        }

        let message_id = if self.omit_ids.load(Ordering::SeqCst) {
            None
        } else {
            Some(format!("mock-msg-{}", uuid::Uuid::new_v4()))
        };
        Ok(SendReceipt { message_id })
    }

    async fn validate_addresses(
        &self,
        addresses: &[String],
    ) -> Result<AddressValidation, SwitchboardError> {
        self.validated.lock().await.push(addresses.to_vec());

        if self.validation_unavailable.load(Ordering::SeqCst) {
            return Ok(AddressValidation {
                results: addresses
                    .iter()
                    .map(|a| AddressCheck {
                        input: a.clone(),
                        valid: None,
                        wa_id: None,
                        reason: Some("validation unavailable".to_string()),
                    })
                    .collect(),
                available: false,
            });
        }

        let invalid = self.invalid.lock().await;
        let results = addresses
            .iter()
            .map(|a| {
                let valid = !invalid.contains(a);
                AddressCheck {
                    input: a.clone(),
                    valid: Some(valid),
                    wa_id: valid.then(|| a.clone()),
                    reason: (!valid).then(|| "not a WhatsApp user".to_string()),
                }
            })
            .collect();
        Ok(AddressValidation {
            results,
            available: true,
        })
    }

    async fn probe(&self) -> GatewayProbe {
        let ok = ProbeResult {
            ok: true,
            detail: Some("mock".to_string()),
            error: None,
        };
        GatewayProbe {
            phone_number: ok.clone(),
            business_account: ok,
        }
    }
}
