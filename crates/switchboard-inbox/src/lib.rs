// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Switchboard inbox: conversation state shared across stateless
//! instances, and the webhook pipeline that feeds it.

pub mod merge;
pub mod payload;
pub mod pipeline;
pub mod responder;
pub mod store;

pub use merge::{ConversationMap, ConversationPatch, merge_conversation, merge_maps};
pub use payload::{WebhookEvent, decode_events};
pub use pipeline::{WebhookAck, WebhookPipeline};
pub use responder::{AddressRules, AutoResponder, NoopResponder};
pub use store::{ConversationStore, NewMessage, StoreSettings};
