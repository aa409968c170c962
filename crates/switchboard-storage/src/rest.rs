// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store over an Upstash-compatible REST API.
//!
//! `GET {base}/get/{key}` answers `{"result": "<string>" | null}` and
//! `POST {base}/set/{key}` stores the request body verbatim. Documents are
//! stored as JSON text, so a read parses the `result` string once more.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use switchboard_core::{AdapterType, HealthStatus, KvStore, PluginAdapter, SwitchboardError};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ResultEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// A [`KvStore`] that talks to a remote REST key-value service.
#[derive(Debug, Clone)]
pub struct RestKv {
    client: reqwest::Client,
    base_url: String,
}

fn rest_err(message: impl Into<String>) -> SwitchboardError {
    SwitchboardError::Storage {
        source: message.into().into(),
    }
}

impl RestKv {
    /// Builds a client for `base_url`, authenticating with `token` when given.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, SwitchboardError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                SwitchboardError::Config(format!("invalid storage.rest_token header value: {e}"))
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SwitchboardError::storage)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn envelope(&self, response: reqwest::Response) -> Result<Option<Value>, SwitchboardError> {
        let status = response.status();
        let body = response.text().await.map_err(SwitchboardError::storage)?;
        let envelope: ResultEnvelope = serde_json::from_str(&body)
            .map_err(|_| rest_err(format!("unexpected response ({status}): {body}")))?;

        if let Some(error) = envelope.error {
            return Err(rest_err(format!("{status}: {error}")));
        }
        if !status.is_success() {
            return Err(rest_err(format!("unexpected status {status}")));
        }
        Ok(envelope.result)
    }
}

#[async_trait]
impl PluginAdapter for RestKv {
    fn name(&self) -> &str {
        "rest"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        let url = format!("{}/ping", self.base_url);
        Ok(match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => HealthStatus::Healthy,
            Ok(resp) => HealthStatus::Degraded(format!("ping returned {}", resp.status())),
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        Ok(())
    }
}

#[async_trait]
impl KvStore for RestKv {
    async fn get(&self, key: &str) -> Result<Option<Value>, SwitchboardError> {
        let url = format!("{}/get/{key}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(SwitchboardError::storage)?;

        match self.envelope(response).await? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => serde_json::from_str(&text)
                .map(Some)
                .map_err(SwitchboardError::storage),
            // Some services decode JSON values themselves.
            Some(other) => Ok(Some(other)),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SwitchboardError> {
        let url = format!("{}/set/{key}", self.base_url);
        let body = serde_json::to_string(&value).map_err(SwitchboardError::storage)?;
        let bytes = body.len();
        let response = self
            .client
            .post(&url)
            .body(body)
            .send()
            .await
            .map_err(SwitchboardError::storage)?;
        self.envelope(response).await?;
        debug!(key, bytes, "rest key-value write");
        Ok(())
    }
}
