// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::{StorageBackend, SwitchboardConfig};

/// Longest allowed cache refresh interval.
const MAX_REFRESH_INTERVAL_MS: u64 = 60_000;

/// Validates a deserialized configuration, collecting every error.
pub fn validate_config(config: &SwitchboardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    }

    if config.inbox.refresh_interval_ms > MAX_REFRESH_INTERVAL_MS {
        errors.push(ConfigError::validation(format!(
            "inbox.refresh_interval_ms must be at most {MAX_REFRESH_INTERVAL_MS}, got {}",
            config.inbox.refresh_interval_ms
        )));
    }

    if config.inbox.message_tail == 0 {
        errors.push(ConfigError::validation(
            "inbox.message_tail must be at least 1",
        ));
    }

    let cc = &config.inbox.default_country_code;
    if cc.is_empty() || !cc.chars().all(|c| c.is_ascii_digit()) {
        errors.push(ConfigError::validation(format!(
            "inbox.default_country_code must be digits only, got `{cc}`"
        )));
    }

    for (i, rule) in config.inbox.auto_reply.iter().enumerate() {
        if rule.addresses.is_empty() {
            errors.push(ConfigError::validation(format!(
                "inbox.auto_reply[{i}] must list at least one address"
            )));
        }
        if rule.reply.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "inbox.auto_reply[{i}].reply must not be empty"
            )));
        }
    }

    match config.storage.backend {
        StorageBackend::Sqlite if config.storage.database_path.trim().is_empty() => {
            errors.push(ConfigError::validation(
                "storage.database_path is required for the sqlite backend",
            ));
        }
        StorageBackend::Rest
            if config
                .storage
                .rest_url
                .as_deref()
                .is_none_or(|u| u.trim().is_empty()) =>
        {
            errors.push(ConfigError::validation(
                "storage.rest_url is required for the rest backend",
            ));
        }
        _ => {}
    }

    if config.whatsapp.api_version == 0 {
        errors.push(ConfigError::validation(
            "whatsapp.api_version must be at least 1",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AutoReplyRule;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&SwitchboardConfig::default()).is_ok());
    }

    #[test]
    fn rest_backend_requires_url() {
        let mut config = SwitchboardConfig::default();
        config.storage.backend = StorageBackend::Rest;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "rest_url"));
    }

    #[test]
    fn sqlite_backend_requires_path() {
        let mut config = SwitchboardConfig::default();
        config.storage.database_path = " ".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = SwitchboardConfig::default();
        config.server.host = String::new();
        config.inbox.message_tail = 0;
        config.inbox.default_country_code = "+55".into();
        config.inbox.refresh_interval_ms = 120_000;
        config.inbox.auto_reply.push(AutoReplyRule {
            addresses: vec![],
            reply: "".into(),
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
    }
}
