// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./switchboard.toml` > `~/.config/switchboard/switchboard.toml`
//! > `/etc/switchboard/switchboard.toml`, with `SWITCHBOARD_` overrides and the
//! carriers' own `TWILIO_*` / `SIGNALWIRE_*` variables on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SwitchboardConfig;

const SYSTEM_CONFIG: &str = "/etc/switchboard/switchboard.toml";
const LOCAL_CONFIG: &str = "switchboard.toml";

/// Top-level sections reachable through `SWITCHBOARD_<SECTION>_<FIELD>`.
const SECTIONS: &[&str] = &["app", "server", "outbound", "twilio", "signalwire", "bot"];

/// Keys honored from `TWILIO_*` variables.
const TWILIO_KEYS: &[&str] = &[
    "account_sid",
    "primary_token",
    "callback_token",
    "callback_app_id",
    "address_sid",
    "migrate_account_sid",
    "migrate_address_sid",
];

/// Keys honored from `SIGNALWIRE_*` variables.
const SIGNALWIRE_KEYS: &[&str] = &[
    "space",
    "account_sid",
    "account_token",
    "primary_token",
    "callback_token",
    "callback_app_id",
    "address_sid",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/switchboard/switchboard.toml` (system-wide)
/// 3. `~/.config/switchboard/switchboard.toml` (user XDG config)
/// 4. `./switchboard.toml` (local directory)
/// 5. `SWITCHBOARD_*` environment variables
/// 6. `TWILIO_*` and `SIGNALWIRE_*` environment variables
pub fn load_config() -> Result<SwitchboardConfig, figment::Error> {
    tracing::debug!(paths = ?search_paths(), "loading configuration");
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<SwitchboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SwitchboardConfig, figment::Error> {
    tracing::debug!(path = %path.display(), "loading configuration");
    with_env(
        Figment::new()
            .merge(Serialized::defaults(SwitchboardConfig::default()))
            .merge(Toml::file(path)),
    )
    .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    with_env(
        Figment::new()
            .merge(Serialized::defaults(SwitchboardConfig::default()))
            .merge(Toml::file(SYSTEM_CONFIG))
            .merge(Toml::file(user_config_path().unwrap_or_default()))
            .merge(Toml::file(LOCAL_CONFIG)),
    )
}

/// Location of the per-user config file, if the platform has a config dir.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("switchboard/switchboard.toml"))
}

/// Paths searched by [`load_config`], lowest precedence first.
pub fn search_paths() -> Vec<std::path::PathBuf> {
    let mut paths = vec![std::path::PathBuf::from(SYSTEM_CONFIG)];
    paths.extend(user_config_path());
    paths.push(std::path::PathBuf::from(LOCAL_CONFIG));
    paths
}

fn with_env(figment: Figment) -> Figment {
    figment
        .merge(env_provider())
        .merge(twilio_env_provider())
        .merge(signalwire_env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` because key names contain underscores:
/// `SWITCHBOARD_TWILIO_CALLBACK_TOKEN` must map to `twilio.callback_token`.
fn env_provider() -> Env {
    Env::prefixed("SWITCHBOARD_").map(|key| {
        // Keys reach `map` uppercase; figment lowercases them afterwards.
        let key = key.as_str().to_ascii_lowercase();
        let mapped = SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or(key);
        mapped.into()
    })
}

/// The variable names Twilio's own tooling uses, e.g. `TWILIO_ACCOUNT_SID`.
fn twilio_env_provider() -> Env {
    Env::prefixed("TWILIO_")
        .only(TWILIO_KEYS)
        .map(|key| format!("twilio.{}", key.as_str().to_ascii_lowercase()).into())
}

/// `SIGNALWIRE_PRIMARY_TOKEN` is accepted as an alias for `SIGNALWIRE_ACCOUNT_TOKEN`.
fn signalwire_env_provider() -> Env {
    Env::prefixed("SIGNALWIRE_")
        .only(SIGNALWIRE_KEYS)
        .map(|key| {
            let key = key.as_str().to_ascii_lowercase();
            let name = match key.as_str() {
                "primary_token" => "account_token",
                other => other,
            };
            format!("signalwire.{name}").into()
        })
}
