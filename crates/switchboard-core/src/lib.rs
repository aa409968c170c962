// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Switchboard inbox bridge.
//!
//! This crate provides the domain types shared by every other crate
//! (conversations, message records, bulk jobs, contacts), the error type,
//! contact address normalization, and the adapter traits implemented by
//! persistence backends and messaging gateways.

pub mod address;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use address::normalize_address;
pub use error::SwitchboardError;
pub use types::{AdapterType, HealthStatus, now_millis};

// Re-export all adapter traits at crate root.
pub use traits::{KvStore, MessagingGateway, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switchboard_error_has_all_variants() {
        let _config = SwitchboardError::Config("test".into());
        let _storage = SwitchboardError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _gateway = SwitchboardError::gateway("test");
        let _address = SwitchboardError::InvalidAddress("abc".into());
        let _not_found = SwitchboardError::NotFound("conversation".into());
        let _conflict = SwitchboardError::Conflict("job running".into());
        let _interrupted = SwitchboardError::Interrupted { processed: 2 };
        let _internal = SwitchboardError::Internal("test".into());
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [AdapterType::Storage, AdapterType::Gateway] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_kv_store<T: KvStore>() {}
        fn _assert_messaging_gateway<T: MessagingGateway>() {}
    }
}
