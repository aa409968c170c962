// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation store.
//!
//! Holds this process's view of every conversation and keeps it in step
//! with the shared backend. Each public operation runs the same sequence:
//!
//! 1. epoch check: if the stored reset epoch is newer than ours, drop the
//!    local view entirely
//! 2. refresh: re-read the backend if the cache is older than the refresh
//!    interval; the stored map replaces the local view, except for local
//!    changes whose write has not landed yet
//! 3. mutate the local view
//! 4. merge-write: re-read the backend, merge in only the conversations
//!    changed here, write the result back, and adopt it as the new local view
//!
//! The in-process mutex only serializes this instance's own operations.
//! Other processes are reconciled by the merge, never by locking.

use std::collections::BTreeSet;
use std::time::Duration;

use switchboard_config::model::InboxConfig;
use switchboard_core::types::{
    Conversation, ConversationSummary, Direction, MessageRecord, ResetEpoch, local_message_id,
    status_rank,
};
use switchboard_core::{SwitchboardError, normalize_address, now_millis};
use switchboard_storage::{Persistence, keys};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::merge::{ConversationMap, ConversationPatch, merge_conversation};

/// Tuning for a [`ConversationStore`].
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Minimum cache age before the backend is re-read.
    pub refresh_interval: Duration,
    /// Messages returned by [`ConversationStore::get_conversation`].
    pub message_tail: usize,
    /// Prefixed to addresses that lack it.
    pub country_code: String,
}

impl StoreSettings {
    pub fn from_config(config: &InboxConfig) -> Self {
        Self {
            refresh_interval: Duration::from_millis(config.refresh_interval_ms),
            message_tail: config.message_tail,
            country_code: config.default_country_code.clone(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from_config(&InboxConfig::default())
    }
}

/// A message to append to a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub address: String,
    pub direction: Direction,
    pub text: String,
    /// Provider message id; a local id is generated when absent.
    pub id: Option<String>,
    /// Unix milliseconds; "now" when absent.
    pub timestamp: Option<i64>,
    /// Profile name reported by the provider; fills an empty conversation name.
    pub contact_name: Option<String>,
}

impl NewMessage {
    pub fn inbound(address: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(address, Direction::In, text)
    }

    pub fn outbound(address: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(address, Direction::Out, text)
    }

    pub fn new(address: impl Into<String>, direction: Direction, text: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            direction,
            text: text.into(),
            id: None,
            timestamp: None,
            contact_name: None,
        }
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    pub fn at(mut self, timestamp: Option<i64>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn from_contact(mut self, name: Option<String>) -> Self {
        self.contact_name = name;
        self
    }
}

#[derive(Debug, Default)]
struct StoreState {
    conversations: ConversationMap,
    /// Conversations changed here whose last write did not land.
    pending: BTreeSet<String>,
    /// Reset epoch this view was built under.
    epoch: i64,
    last_load: Option<Instant>,
}

impl StoreState {
    /// `base` with every unpersisted local change merged back in.
    fn overlay_pending(&self, mut base: ConversationMap) -> ConversationMap {
        for key in &self.pending {
            let Some(local) = self.conversations.get(key) else {
                continue;
            };
            let merged = match base.get(key) {
                Some(stored) => merge_conversation(stored, local),
                None => local.clone(),
            };
            base.insert(key.clone(), merged);
        }
        base
    }
}

/// Conversation state shared through the persistence backend.
#[derive(Debug)]
pub struct ConversationStore {
    persistence: Persistence,
    settings: StoreSettings,
    state: Mutex<StoreState>,
}

impl ConversationStore {
    pub fn new(persistence: Persistence, settings: StoreSettings) -> Self {
        Self {
            persistence,
            settings,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Normalizes a raw address with the configured country code.
    pub fn normalize(&self, raw: &str) -> Result<String, SwitchboardError> {
        normalize_address(raw, &self.settings.country_code)
            .ok_or_else(|| SwitchboardError::InvalidAddress(raw.to_string()))
    }

    fn lookup_key(&self, id: &str) -> String {
        normalize_address(id, &self.settings.country_code).unwrap_or_else(|| id.to_string())
    }

    // --- synchronization ---

    async fn stored_epoch(&self) -> i64 {
        self.persistence
            .get::<ResetEpoch>(keys::RESET_EPOCH)
            .await
            .map_or(0, |e| e.reset_at)
    }

    /// Drops the local view if a reset happened since it was built.
    /// Returns whether it did.
    async fn check_epoch(&self, state: &mut StoreState) -> bool {
        let stored = self.stored_epoch().await;
        if stored <= state.epoch {
            return false;
        }
        if !state.conversations.is_empty() {
            info!(
                stored_epoch = stored,
                local_epoch = state.epoch,
                discarded = state.conversations.len(),
                "conversations were reset elsewhere, discarding local view"
            );
        }
        state.conversations.clear();
        state.pending.clear();
        state.epoch = stored;
        state.last_load = None;
        true
    }

    /// The stored map, or `None` when the backend cannot be read.
    async fn load_map(&self) -> Option<ConversationMap> {
        match self.persistence.try_get(keys::CONVERSATIONS).await {
            Ok(map) => Some(map.unwrap_or_default()),
            Err(e) => {
                warn!(error = %e, "conversation map unreadable, keeping local view");
                None
            }
        }
    }

    /// Replaces the view with the stored map. The backend is authoritative
    /// for everything except local changes still waiting to be written.
    async fn load_if_stale(&self, state: &mut StoreState) {
        let fresh = state
            .last_load
            .is_some_and(|at| at.elapsed() < self.settings.refresh_interval);
        if fresh {
            debug!("serving conversations from cache");
            return;
        }
        let Some(base) = self.load_map().await else {
            return;
        };
        state.conversations = state.overlay_pending(base);
        state.last_load = Some(Instant::now());
    }

    async fn sync(&self, state: &mut StoreState) {
        self.check_epoch(state).await;
        self.load_if_stale(state).await;
    }

    /// Re-reads the backend, merges the local version of `changed` (and any
    /// earlier unwritten changes) into it, applies `patch`, writes the result
    /// and adopts it locally. Returns whether the write landed.
    async fn merge_write(
        &self,
        state: &mut StoreState,
        changed: &str,
        patch: Option<ConversationPatch>,
    ) -> bool {
        if self.check_epoch(state).await {
            warn!("conversations were reset during this operation, local change dropped");
            return false;
        }
        state.pending.insert(changed.to_string());
        let Some(base) = self.load_map().await else {
            return false;
        };

        let mut merged = state.overlay_pending(base);
        if let Some(patch) = patch {
            patch.apply(&mut merged);
        }
        let written = self.persistence.set(keys::CONVERSATIONS, &merged).await;
        if written {
            state.pending.clear();
        }
        state.conversations = merged;
        state.last_load = Some(Instant::now());
        written
    }

    // --- operations ---

    /// Summaries of every conversation, most recent first.
    pub async fn list_conversations(&self) -> Vec<ConversationSummary> {
        let mut state = self.state.lock().await;
        self.sync(&mut state).await;

        let mut list: Vec<_> = state
            .conversations
            .values()
            .map(Conversation::summary)
            .collect();
        list.sort_by(|a, b| {
            b.last_timestamp
                .unwrap_or(0)
                .cmp(&a.last_timestamp.unwrap_or(0))
                .then_with(|| a.id.cmp(&b.id))
        });
        list
    }

    /// One conversation with its most recent messages. Marks it read.
    pub async fn get_conversation(&self, id: &str) -> Option<Conversation> {
        let key = self.lookup_key(id);
        let mut state = self.state.lock().await;
        self.sync(&mut state).await;

        let conv = state.conversations.get_mut(&key)?;
        if conv.unread_count > 0 {
            conv.unread_count = 0;
            self.merge_write(&mut state, &key, Some(ConversationPatch::mark_read(&key)))
                .await;
        }
        state
            .conversations
            .get(&key)
            .map(|c| c.with_tail(self.settings.message_tail))
    }

    /// Summary of one conversation, without the mark-as-read side effect.
    pub async fn peek(&self, id: &str) -> Option<ConversationSummary> {
        let key = self.lookup_key(id);
        let mut state = self.state.lock().await;
        self.sync(&mut state).await;
        state.conversations.get(&key).map(Conversation::summary)
    }

    /// Appends a message, creating the conversation if needed.
    ///
    /// A message id already present in the conversation is not appended
    /// again; the existing record is returned.
    pub async fn append_message(
        &self,
        message: NewMessage,
    ) -> Result<MessageRecord, SwitchboardError> {
        let address = self.normalize(&message.address)?;
        let mut state = self.state.lock().await;
        self.sync(&mut state).await;

        let timestamp = message.timestamp.unwrap_or_else(now_millis);
        let id = message
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| local_message_id(timestamp));

        if let Some(existing) = state
            .conversations
            .get(&address)
            .and_then(|c| c.find_message(&id))
        {
            debug!(address = %address, message_id = %id, "duplicate message ignored");
            return Ok(existing.clone());
        }

        let conv = state
            .conversations
            .entry(address.clone())
            .or_insert_with(|| Conversation::new(&address));
        if let Some(name) = message.contact_name.filter(|n| !n.is_empty())
            && conv.name.as_deref().is_none_or(str::is_empty)
        {
            conv.name = Some(name);
        }

        let record = MessageRecord {
            id,
            direction: message.direction,
            text: message.text,
            timestamp,
            status: None,
            status_timestamp: None,
        };
        conv.messages.push(record.clone());
        if record.direction == Direction::In {
            conv.unread_count += 1;
        }
        conv.normalize();

        let persisted = self.merge_write(&mut state, &address, None).await;
        debug!(
            address = %address,
            message_id = %record.id,
            direction = ?record.direction,
            persisted,
            "message appended"
        );
        Ok(record)
    }

    /// Records an operator or automated reply.
    pub async fn record_outbound(
        &self,
        address: &str,
        text: &str,
        message_id: Option<String>,
    ) -> Result<MessageRecord, SwitchboardError> {
        self.append_message(NewMessage::outbound(address, text).with_id(message_id))
            .await
    }

    /// Applies a delivery status to an outbound message.
    ///
    /// Returns `false` without writing when the message is unknown here
    /// (status callbacks can outrun the cache), is inbound, or the status
    /// would move backwards.
    pub async fn update_message_status(
        &self,
        address: &str,
        message_id: &str,
        status: &str,
        timestamp: Option<i64>,
    ) -> bool {
        let Ok(address) = self.normalize(address) else {
            warn!(address, "status update for unparseable address ignored");
            return false;
        };
        let mut state = self.state.lock().await;
        self.sync(&mut state).await;

        let Some(record) = state
            .conversations
            .get_mut(&address)
            .and_then(|c| c.find_message_mut(message_id))
            .filter(|r| r.direction == Direction::Out)
        else {
            debug!(address = %address, message_id, status, "status for unknown message, ignoring");
            return false;
        };

        let current = record.status.as_deref().map_or(0, status_rank);
        if status_rank(status) < current {
            debug!(message_id, status, "stale status ignored");
            return false;
        }
        record.status = Some(status.to_string());
        record.status_timestamp = Some(timestamp.unwrap_or_else(now_millis));

        self.merge_write(&mut state, &address, None).await;
        true
    }

    /// Sets the manual-takeover flag on a conversation already in the local view.
    pub async fn set_manual_control(&self, id: &str, is_human: bool) -> bool {
        let key = self.lookup_key(id);
        let mut state = self.state.lock().await;
        self.check_epoch(&mut state).await;

        let Some(conv) = state.conversations.get_mut(&key) else {
            return false;
        };
        conv.is_human = is_human;
        self.merge_write(
            &mut state,
            &key,
            Some(ConversationPatch::manual_control(&key, is_human)),
        )
            .await;
        info!(conversation = %key, is_human, "manual control changed");
        true
    }

    /// Returns the conversation for `phone`, creating an empty one if needed.
    pub async fn ensure_conversation(
        &self,
        phone: &str,
        name: Option<&str>,
    ) -> Result<Conversation, SwitchboardError> {
        let address = self.normalize(phone)?;
        let mut state = self.state.lock().await;
        self.sync(&mut state).await;

        let mut changed = false;
        let conv = state.conversations.entry(address.clone()).or_insert_with(|| {
            changed = true;
            Conversation::new(&address)
        });
        if let Some(name) = name.filter(|n| !n.trim().is_empty())
            && conv.name.as_deref().is_none_or(str::is_empty)
        {
            conv.name = Some(name.trim().to_string());
            changed = true;
        }
        if changed {
            self.merge_write(&mut state, &address, None).await;
        }

        state
            .conversations
            .get(&address)
            .map(|c| c.with_tail(self.settings.message_tail))
            .ok_or_else(|| SwitchboardError::NotFound(address))
    }

    /// Deletes every conversation for every instance. Returns the new epoch.
    pub async fn reset_all(&self) -> i64 {
        let mut state = self.state.lock().await;
        let epoch = now_millis().max(self.stored_epoch().await + 1);

        // Empty the map before advancing the epoch, so an instance that
        // reloads after seeing the new epoch finds nothing to resurrect.
        self.persistence
            .set(keys::CONVERSATIONS, &ConversationMap::new())
            .await;
        self.persistence
            .set(keys::RESET_EPOCH, &ResetEpoch { reset_at: epoch })
            .await;

        let discarded = state.conversations.len();
        state.conversations.clear();
        state.pending.clear();
        state.epoch = epoch;
        state.last_load = Some(Instant::now());
        info!(epoch, discarded, "all conversations reset");
        epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_test_utils::memory_persistence;

    const ADDR: &str = "5585999990000";

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn unknown_status_is_logged_and_skipped() {
        let (_, persistence) = memory_persistence();
        let store = ConversationStore::new(persistence, StoreSettings::default());
        store
            .record_outbound(ADDR, "hello", Some("wamid.out".into()))
            .await
            .unwrap();

        assert!(!store.update_message_status(ADDR, "wamid.gone", "read", None).await);
        assert!(logs_contain("status for unknown message"));
    }

    #[tokio::test]
    async fn pending_changes_overlay_the_stored_map() {
        let mut state = StoreState::default();
        let mut local = Conversation::new(ADDR);
        local.unread_count = 2;
        state.conversations.insert(ADDR.to_string(), local);

        let mut stored = Conversation::new("5511911110000");
        stored.is_human = true;
        let mut base = ConversationMap::new();
        base.insert(stored.id.clone(), stored);

        // Not pending: the stored map is taken as-is.
        assert!(!state.overlay_pending(base.clone()).contains_key(ADDR));

        state.pending.insert(ADDR.to_string());
        let view = state.overlay_pending(base);
        assert_eq!(view[ADDR].unread_count, 2);
        assert!(view["5511911110000"].is_human);
    }
}
