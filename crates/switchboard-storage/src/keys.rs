// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keys under which shared state is stored.

/// Map of normalized address to conversation.
pub const CONVERSATIONS: &str = "switchboard:conversations";

/// The global reset epoch.
pub const RESET_EPOCH: &str = "switchboard:reset_epoch";

/// Progress of the current or last bulk run.
pub const BULK_STATUS: &str = "switchboard:bulk_status";

/// Operator request to halt the bulk run.
pub const BULK_STOP: &str = "switchboard:bulk_stop";
