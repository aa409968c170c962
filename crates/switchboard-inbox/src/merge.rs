// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic merge of two views of the conversation map.
//!
//! Used by every write: the persisted map ("base") is re-read and combined
//! with the local view ("update") so that concurrent writers that never saw
//! each other both keep their messages.
//!
//! Rules per conversation present on both sides:
//! - messages: union by id, sorted by `(timestamp, id)`; on collision the
//!   update's record wins but keeps the more advanced delivery status
//! - `name` / `phone_number`: a non-empty value beats an empty one; when
//!   both are set and differ, the side with the newer `last_timestamp` wins
//!   (ties go to the update)
//! - `is_human`: OR
//! - `unread_count`: max
//! - `last_message` / `last_timestamp`: recomputed from the merged tail
//!
//! The result is independent of argument order for everything except the
//! scalar tiebreak, and merging a result with either input is a no-op.

use std::collections::{BTreeMap, HashMap};

use switchboard_core::types::{Conversation, MessageRecord, status_rank};

/// Conversations keyed by normalized address. Ordered so serialized output is stable.
pub type ConversationMap = BTreeMap<String, Conversation>;

/// Merges two whole maps.
pub fn merge_maps(base: &ConversationMap, update: &ConversationMap) -> ConversationMap {
    let mut merged = base.clone();
    for (id, conv) in update {
        let combined = match base.get(id) {
            Some(existing) => merge_conversation(existing, conv),
            None => {
                let mut conv = conv.clone();
                conv.normalize();
                conv
            }
        };
        merged.insert(id.clone(), combined);
    }
    merged
}

/// Merges one conversation present on both sides.
pub fn merge_conversation(base: &Conversation, update: &Conversation) -> Conversation {
    let base_newer =
        base.last_timestamp.unwrap_or(i64::MIN) > update.last_timestamp.unwrap_or(i64::MIN);

    let mut out = Conversation {
        id: update.id.clone(),
        name: pick_name(base.name.as_deref(), update.name.as_deref(), base_newer),
        phone_number: pick_name(
            Some(base.phone_number.as_str()),
            Some(update.phone_number.as_str()),
            base_newer,
        )
        .unwrap_or_default(),
        last_message: None,
        last_timestamp: None,
        unread_count: base.unread_count.max(update.unread_count),
        is_human: base.is_human || update.is_human,
        messages: merge_messages(&base.messages, &update.messages),
    };
    out.normalize();
    out
}

fn pick_name(base: Option<&str>, update: Option<&str>, base_newer: bool) -> Option<String> {
    let base = base.filter(|s| !s.is_empty());
    let update = update.filter(|s| !s.is_empty());
    match (base, update) {
        (Some(b), Some(u)) if b != u && base_newer => Some(b.to_string()),
        (_, Some(u)) => Some(u.to_string()),
        (Some(b), None) => Some(b.to_string()),
        (None, None) => None,
    }
}

fn merge_messages(base: &[MessageRecord], update: &[MessageRecord]) -> Vec<MessageRecord> {
    let mut by_id: HashMap<&str, MessageRecord> =
        base.iter().map(|m| (m.id.as_str(), m.clone())).collect();

    for record in update {
        let merged = match by_id.get(record.id.as_str()) {
            Some(existing) => merge_record(existing, record),
            None => record.clone(),
        };
        by_id.insert(record.id.as_str(), merged);
    }

    // Sorted by the caller's normalize().
    by_id.into_values().collect()
}

fn merge_record(base: &MessageRecord, update: &MessageRecord) -> MessageRecord {
    let mut out = update.clone();
    if rank(base) > rank(update) {
        out.status = base.status.clone();
        out.status_timestamp = base.status_timestamp;
    }
    out
}

fn rank(record: &MessageRecord) -> u8 {
    record.status.as_deref().map_or(0, status_rank)
}

/// An operator override applied on top of a merge.
///
/// Max/OR never lower `unread_count` or clear `is_human`; mark-as-read and
/// releasing a takeover need to, so they are carried as explicit patches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationPatch {
    pub id: String,
    pub unread_count: Option<u32>,
    pub is_human: Option<bool>,
}

impl ConversationPatch {
    pub fn mark_read(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            unread_count: Some(0),
            ..Self::default()
        }
    }

    pub fn manual_control(id: impl Into<String>, is_human: bool) -> Self {
        Self {
            id: id.into(),
            is_human: Some(is_human),
            ..Self::default()
        }
    }

    pub fn apply(&self, map: &mut ConversationMap) {
        if let Some(conv) = map.get_mut(&self.id) {
            if let Some(unread) = self.unread_count {
                conv.unread_count = unread;
            }
            if let Some(is_human) = self.is_human {
                conv.is_human = is_human;
            }
        }
    }
}
