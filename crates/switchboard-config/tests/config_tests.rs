// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading.

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use switchboard_config::diagnostic::ConfigError;
use switchboard_config::model::{StorageBackend, SwitchboardConfig};
use switchboard_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn full_config_deserializes() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
api_token = "secret"

[whatsapp]
access_token = "EAAG"
phone_number_id = "1234"
business_account_id = "5678"
webhook_verify_token = "verify-me"
api_version = 19

[storage]
backend = "rest"
rest_url = "https://kv.example.com"
rest_token = "kv-token"

[inbox]
refresh_interval_ms = 500
message_tail = 20
default_country_code = "1"

[[inbox.auto_reply]]
addresses = ["5585999990000"]
reply = "Thanks, we'll be in touch."

[bulk]
delay_between_messages_ms = 250
default_language = "en_US"

[logging]
level = "debug"
json = true
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.api_token.as_deref(), Some("secret"));
    assert_eq!(config.whatsapp.api_version, 19);
    assert_eq!(config.storage.backend, StorageBackend::Rest);
    assert_eq!(config.inbox.message_tail, 20);
    assert_eq!(config.inbox.auto_reply.len(), 1);
    assert_eq!(config.bulk.delay_between_messages_ms, 250);
    assert_eq!(config.bulk.recent_errors_limit, 10);
    assert!(config.logging.json);
}

#[test]
fn empty_config_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
    assert!(config.server.api_token.is_none());
    assert_eq!(config.whatsapp.api_version, 18);
    assert_eq!(config.whatsapp.base_url, "https://graph.facebook.com");
    assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    assert_eq!(config.inbox.refresh_interval_ms, 1000);
    assert_eq!(config.inbox.default_country_code, "55");
    assert_eq!(config.bulk.delay_between_messages_ms, 100);
    assert_eq!(config.bulk.default_language, "pt_BR");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[whatsapp]
acess_token = "EAAG"
"#;
    let errors = load_and_validate_str(toml).expect_err("unknown key must fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. }
            if key == "acess_token" && s == "access_token"
    )));
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[server]\nport = \"eighty\"\n").expect_err("bad type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_)))
    );
}

#[test]
fn validation_errors_surface_from_loader() {
    let errors = load_and_validate_str("[storage]\nbackend = \"rest\"\n").expect_err("no url");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("rest_url")))
    );
}

#[test]
fn dotted_override_reaches_nested_field() {
    let config: SwitchboardConfig = Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::string("[whatsapp]\naccess_token = \"from-file\"\n"))
        .merge(("whatsapp.access_token", "from-env"))
        .extract()
        .expect("override should merge");
    assert_eq!(config.whatsapp.access_token.as_deref(), Some("from-env"));
}

#[test]
fn missing_config_file_is_skipped() {
    let config: SwitchboardConfig = Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::file("/nonexistent/switchboard.toml"))
        .extract()
        .expect("missing file should be skipped");
    assert_eq!(config.server.port, 3000);
}

#[test]
#[serial_test::serial]
fn explicit_path_applies_env_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("switchboard.toml");
    std::fs::write(&path, "[server]\nport = 4000\n").unwrap();

    // SAFETY: serialized with every other env-touching test in this binary.
    unsafe { std::env::set_var("SWITCHBOARD_BULK_DELAY_BETWEEN_MESSAGES_MS", "5") };
    let result = load_and_validate_path(&path);
    unsafe { std::env::remove_var("SWITCHBOARD_BULK_DELAY_BETWEEN_MESSAGES_MS") };

    let config = result.expect("valid config");
    assert_eq!(config.server.port, 4000);
    assert_eq!(config.bulk.delay_between_messages_ms, 5);
}
