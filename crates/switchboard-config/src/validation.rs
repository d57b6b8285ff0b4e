// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: non-empty bind address, a sane
//! timeout, and complete credentials for every configured carrier.

use crate::diagnostic::ConfigError;
use crate::model::SwitchboardConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &SwitchboardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    if !config.server.webhook_path.starts_with('/') {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.webhook_path must start with `/`, got `{}`",
                config.server.webhook_path
            ),
        });
    }

    if config.outbound.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "outbound.timeout_secs must be greater than 0".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "app.log_level `{}` is not one of {}",
                config.app.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let twilio = &config.twilio;
    if twilio.is_configured() {
        require(&mut errors, "twilio", "primary_token", &twilio.primary_token, "TWILIO_PRIMARY_TOKEN");
        require(&mut errors, "twilio", "callback_token", &twilio.callback_token, "TWILIO_CALLBACK_TOKEN");
    }

    let signalwire = &config.signalwire;
    if signalwire.is_configured() {
        require(
            &mut errors,
            "signalwire",
            "account_token",
            &signalwire.account_token,
            "SIGNALWIRE_ACCOUNT_TOKEN",
        );
        require(
            &mut errors,
            "signalwire",
            "callback_token",
            &signalwire.callback_token,
            "SIGNALWIRE_CALLBACK_TOKEN",
        );
        if signalwire.base_url().is_none() {
            errors.push(ConfigError::MissingCredential {
                provider: "signalwire".to_string(),
                key: "space".to_string(),
                env_var: "SIGNALWIRE_SPACE".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn require(
    errors: &mut Vec<ConfigError>,
    provider: &str,
    key: &str,
    value: &Option<String>,
    env_var: &str,
) {
    let present = value.as_deref().is_some_and(|v| !v.trim().is_empty());
    if !present {
        errors.push(ConfigError::MissingCredential {
            provider: provider.to_string(),
            key: key.to_string(),
            env_var: env_var.to_string(),
        });
    }
}
