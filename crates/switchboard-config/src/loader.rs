// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-based layered loading.
//!
//! `./switchboard.toml` > `~/.config/switchboard/switchboard.toml` >
//! `/etc/switchboard/switchboard.toml`, with `SWITCHBOARD_*` env vars on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SwitchboardConfig;

pub const SYSTEM_CONFIG: &str = "/etc/switchboard/switchboard.toml";
pub const LOCAL_CONFIG: &str = "switchboard.toml";

/// Sections recognized in `SWITCHBOARD_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &["server", "whatsapp", "storage", "inbox", "bulk", "logging"];

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("switchboard").join(LOCAL_CONFIG))
}

/// Loads configuration from the standard hierarchy.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/switchboard/switchboard.toml`
/// 3. `~/.config/switchboard/switchboard.toml`
/// 4. `./switchboard.toml`
/// 5. `SWITCHBOARD_*` environment variables
pub fn load_config() -> Result<SwitchboardConfig, figment::Error> {
    build_figment().extract()
}

/// Loads from a TOML string over defaults, without env overrides.
pub fn load_config_from_str(toml_content: &str) -> Result<SwitchboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Loads from an explicit file path with env overrides.
pub fn load_config_from_path(path: &Path) -> Result<SwitchboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Maps `SWITCHBOARD_WHATSAPP_ACCESS_TOKEN` to `whatsapp.access_token`.
///
/// Only the first underscore after a known section name becomes a dot;
/// `split("_")` would turn `access_token` into `access.token`.
fn env_provider() -> Env {
    Env::prefixed("SWITCHBOARD_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
