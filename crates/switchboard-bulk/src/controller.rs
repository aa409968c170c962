// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk job lifecycle.
//!
//! A job's status record and stop flag live in the shared store, so a
//! process other than the one running the job can poll it or stop it.
//! Within this process the running job also holds a cancellation token,
//! which `stop` cancels alongside raising the flag.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchboard_config::model::{BulkConfig, InboxConfig};
use switchboard_core::types::{
    AddressCheck, BulkJob, Contact, ContactStatus, RecentError, RecentRequest, StopFlag,
};
use switchboard_core::{MessagingGateway, SwitchboardError, normalize_address, now_millis};
use switchboard_storage::{Persistence, keys};

use crate::dispatcher::{BulkDispatcher, DispatchDefaults, DispatchHooks};

/// Addresses per provider validation call.
const VALIDATION_CHUNK: usize = 100;

const INTERRUPTED_MESSAGE: &str = "interrupted by user";

/// Tunables for bulk runs.
#[derive(Debug, Clone)]
pub struct BulkSettings {
    pub delay: Duration,
    pub recent_errors_limit: usize,
    pub recent_requests_limit: usize,
    pub default_language: String,
    pub country_code: String,
}

impl BulkSettings {
    pub fn from_config(bulk: &BulkConfig, inbox: &InboxConfig) -> Self {
        Self {
            delay: Duration::from_millis(bulk.delay_between_messages_ms),
            recent_errors_limit: bulk.recent_errors_limit,
            recent_requests_limit: bulk.recent_requests_limit,
            default_language: bulk.default_language.clone(),
            country_code: inbox.default_country_code.clone(),
        }
    }
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self::from_config(&BulkConfig::default(), &InboxConfig::default())
    }
}

/// Body of a start request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StartRequest {
    pub template: Option<String>,
    pub language: Option<String>,
    pub contacts: Vec<Contact>,
}

/// Result of validating a batch of addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub unverified: usize,
    pub available: bool,
    pub results: Vec<AddressCheck>,
}

struct RunningJob {
    id: String,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

/// Starts, tracks and stops bulk jobs.
pub struct BulkController {
    persistence: Persistence,
    gateway: Arc<dyn MessagingGateway>,
    settings: BulkSettings,
    running: Mutex<Option<RunningJob>>,
}

impl BulkController {
    pub fn new(
        persistence: Persistence,
        gateway: Arc<dyn MessagingGateway>,
        settings: BulkSettings,
    ) -> Self {
        Self {
            persistence,
            gateway,
            settings,
            running: Mutex::new(None),
        }
    }

    /// Launches a job in the background and returns its initial status.
    ///
    /// Fails with [`SwitchboardError::Conflict`] while another job is active.
    /// Contacts flagged invalid by a prior validation are left out.
    pub async fn start(&self, request: StartRequest) -> Result<BulkJob, SwitchboardError> {
        let current = self.status().await;
        if current.active {
            return Err(SwitchboardError::Conflict(format!(
                "bulk job {} is already running",
                current.id
            )));
        }

        let mut contacts: Vec<Contact> = request
            .contacts
            .into_iter()
            .filter(|c| c.valid != Some(false))
            .collect();
        let already_sent = contacts
            .iter()
            .filter(|c| c.status == ContactStatus::Sent)
            .count();

        let defaults = DispatchDefaults {
            template: request.template.filter(|t| !t.trim().is_empty()),
            language: request
                .language
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| self.settings.default_language.clone()),
        };

        let job = BulkJob {
            id: uuid::Uuid::new_v4().to_string(),
            active: true,
            total: contacts.len(),
            sent: already_sent,
            template: defaults.template.clone().unwrap_or_default(),
            language: defaults.language.clone(),
            timestamp: now_millis(),
            message: "running".to_string(),
            ..BulkJob::default()
        };

        self.persistence
            .set(
                keys::BULK_STOP,
                &StopFlag {
                    stop: false,
                    at: now_millis(),
                },
            )
            .await;
        self.persistence.set(keys::BULK_STATUS, &job).await;

        let cancel = CancellationToken::new();
        let hooks = JobHooks {
            persistence: self.persistence.clone(),
            job_id: job.id.clone(),
            cancel: cancel.clone(),
            errors_limit: self.settings.recent_errors_limit,
            requests_limit: self.settings.recent_requests_limit,
        };
        let dispatcher = BulkDispatcher::new(
            self.gateway.clone(),
            self.settings.delay,
            self.settings.country_code.clone(),
        );

        info!(job_id = %job.id, total = job.total, skipped = already_sent, "bulk job started");

        let handle = tokio::spawn(async move {
            let outcome = dispatcher.run(&mut contacts, &defaults, &hooks).await;
            hooks
                .update(|job| {
                    job.active = false;
                    match &outcome {
                        Ok(summary) if !job.interrupted => {
                            job.message = format!(
                                "finished: {} sent, {} failed",
                                summary.sent, summary.failed
                            );
                        }
                        Ok(_) => {}
                        Err(e) if e.is_interrupted() => {
                            job.interrupted = true;
                            job.message = INTERRUPTED_MESSAGE.to_string();
                        }
                        Err(e) => job.message = format!("failed: {e}"),
                    }
                })
                .await;
            let interrupted = outcome.as_ref().is_err_and(|e| e.is_interrupted());
            info!(job_id = %hooks.job_id, interrupted, "bulk job ended");
        });

        *self.running.lock().await = Some(RunningJob {
            id: job.id.clone(),
            cancel,
            handle: Some(handle),
        });

        Ok(job)
    }

    /// The last written job status, or an idle default.
    pub async fn status(&self) -> BulkJob {
        self.persistence
            .get(keys::BULK_STATUS)
            .await
            .unwrap_or_default()
    }

    /// Raises the stop flag and marks the current job interrupted right away.
    ///
    /// The run itself notices at its next contact boundary.
    pub async fn stop(&self) -> BulkJob {
        self.persistence
            .set(
                keys::BULK_STOP,
                &StopFlag {
                    stop: true,
                    at: now_millis(),
                },
            )
            .await;

        let mut job = self.status().await;
        if job.active {
            job.active = false;
            job.interrupted = true;
            job.message = INTERRUPTED_MESSAGE.to_string();
            self.persistence.set(keys::BULK_STATUS, &job).await;
        }

        if let Some(running) = self.running.lock().await.as_ref() {
            debug!(job_id = %running.id, "cancelling in-process bulk job");
            running.cancel.cancel();
        }

        info!(job_id = %job.id, "bulk job stop requested");
        job
    }

    /// Waits for the job started by this controller, if any, to finish.
    pub async fn wait(&self) {
        let handle = self
            .running
            .lock()
            .await
            .as_mut()
            .and_then(|running| running.handle.take());
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "bulk job task ended abnormally");
        }
    }

    /// Cancels the job running in this process, if any, and waits for it to
    /// record itself as interrupted.
    pub async fn shutdown(&self) {
        if let Some(running) = self.running.lock().await.as_ref() {
            running.cancel.cancel();
        }
        self.wait().await;
    }

    /// Checks which addresses can receive messages.
    ///
    /// Addresses are normalized and de-duplicated first; malformed ones are
    /// reported invalid without asking the provider. A provider failure
    /// leaves its chunk unverified rather than failing the whole batch.
    pub async fn validate(&self, addresses: &[String]) -> ValidationReport {
        let mut results = Vec::with_capacity(addresses.len());
        let mut seen = HashSet::new();
        let mut normalized = Vec::new();

        for raw in addresses {
            match normalize_address(raw, &self.settings.country_code) {
                Some(address) => {
                    if seen.insert(address.clone()) {
                        normalized.push(address);
                    }
                }
                None => results.push(AddressCheck {
                    input: raw.clone(),
                    valid: Some(false),
                    wa_id: None,
                    reason: Some("invalid format".to_string()),
                }),
            }
        }

        let mut available = true;
        for chunk in normalized.chunks(VALIDATION_CHUNK) {
            match self.gateway.validate_addresses(chunk).await {
                Ok(validation) => {
                    available &= validation.available;
                    results.extend(validation.results);
                }
                Err(e) => {
                    warn!(error = %e, size = chunk.len(), "address validation failed");
                    let reason = e.reason();
                    results.extend(chunk.iter().map(|address| AddressCheck {
                        input: address.clone(),
                        valid: None,
                        wa_id: None,
                        reason: Some(reason.clone()),
                    }));
                }
            }
        }

        let count = |want: Option<bool>| results.iter().filter(|r| r.valid == want).count();
        ValidationReport {
            total: results.len(),
            valid: count(Some(true)),
            invalid: count(Some(false)),
            unverified: count(None),
            available,
            results,
        }
    }
}

/// Writes a running job's progress through to the shared store.
struct JobHooks {
    persistence: Persistence,
    job_id: String,
    cancel: CancellationToken,
    errors_limit: usize,
    requests_limit: usize,
}

impl JobHooks {
    /// Read-modify-write of the stored status. Writes belonging to a job
    /// that is no longer the stored one are dropped, and an interruption
    /// recorded by `stop` is never undone.
    async fn update(&self, apply: impl FnOnce(&mut BulkJob)) {
        let Some(mut job) = self.persistence.get::<BulkJob>(keys::BULK_STATUS).await else {
            debug!(job_id = %self.job_id, "no stored job status, skipping update");
            return;
        };
        if job.id != self.job_id {
            debug!(job_id = %self.job_id, stored = %job.id, "job status belongs to another run");
            return;
        }
        let interrupted = job.interrupted;
        apply(&mut job);
        if interrupted {
            job.interrupted = true;
            job.active = false;
            job.message = INTERRUPTED_MESSAGE.to_string();
        }
        self.persistence.set(keys::BULK_STATUS, &job).await;
    }
}

#[async_trait]
impl DispatchHooks for JobHooks {
    async fn on_progress(&self, contact: &Contact, index: usize, total: usize) {
        let at = now_millis();
        self.update(|job| {
            match contact.status {
                ContactStatus::Sent => job.sent += 1,
                ContactStatus::Failed => {
                    job.failed += 1;
                    job.record_error(
                        RecentError {
                            contact: contact.address.clone(),
                            error: contact.error.clone().unwrap_or_default(),
                            at,
                        },
                        self.errors_limit,
                    );
                }
                ContactStatus::Pending => {}
            }
            job.message = format!("processed {}/{}", index + 1, total);
        })
        .await;
    }

    async fn on_request(&self, url: &str, payload: &Value, _contact: &Contact) {
        let entry = RecentRequest {
            url: url.to_string(),
            payload: payload.clone(),
            at: now_millis(),
        };
        self.update(|job| job.record_request(entry, self.requests_limit))
            .await;
    }

    async fn should_stop(&self) -> bool {
        if self.cancel.is_cancelled() {
            return true;
        }
        self.persistence
            .get::<StopFlag>(keys::BULK_STOP)
            .await
            .is_some_and(|flag| flag.stop)
    }
}
