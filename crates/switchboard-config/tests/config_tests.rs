// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Switchboard configuration system.

use switchboard_config::diagnostic::ConfigError;
use switchboard_config::model::{RunMode, SwitchboardConfig};
use switchboard_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[app]
name = "carrier-bot"
log_level = "debug"
mode = "development"

[server]
host = "0.0.0.0"
port = 8080
webhook_path = "/carrier"

[outbound]
timeout_secs = 5

[twilio]
account_sid = "AC123"
primary_token = "primary"
callback_token = "callback"
callback_app_id = "AP123"
address_sid = "AD123"

[signalwire]
space = "example.signalwire.com"
account_sid = "sw-project"
account_token = "sw-token"
callback_token = "sw-callback"

[bot]
auto_reply = "thanks!"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.name, "carrier-bot");
    assert_eq!(config.app.mode, RunMode::Development);
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.webhook_path, "/carrier");
    assert_eq!(config.outbound.timeout_secs, 5);
    assert_eq!(config.twilio.account_sid.as_deref(), Some("AC123"));
    assert_eq!(config.twilio.callback_app_id.as_deref(), Some("AP123"));
    assert_eq!(
        config.signalwire.service_url().as_deref(),
        Some("https://example.signalwire.com/api/laml/2010-04-01")
    );
    assert_eq!(config.bot.auto_reply.as_deref(), Some("thanks!"));
}

/// Missing optional sections use defaults without error.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.app.name, "switchboard");
    assert_eq!(config.app.log_level, "info");
    assert_eq!(config.app.mode, RunMode::Production);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.webhook_path, "/client/v1.0.0/carrier/api");
    assert_eq!(config.outbound.timeout_secs, 10);
    assert!(!config.twilio.is_configured());
    assert!(!config.signalwire.is_configured());
    assert_eq!(config.twilio.service_url(), "https://api.twilio.com/2010-04-01");
}

/// Unknown field in [twilio] is rejected by deny_unknown_fields.
#[test]
fn unknown_field_in_twilio_produces_error() {
    let toml = r#"
[twilio]
calback_token = "abc"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("calback_token"),
        "error should mention the unknown field, got: {err_str}"
    );
}

/// Diagnostics carry a "did you mean" suggestion for typos.
#[test]
fn unknown_key_diagnostic_suggests_correction() {
    let toml = r#"
[server]
webhok_path = "/carrier"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("webhook_path"));
}

/// A configured carrier with a missing secret fails validation.
#[test]
fn configured_provider_without_callback_token_fails() {
    let toml = r#"
[twilio]
account_sid = "AC123"
primary_token = "primary"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::MissingCredential { provider, key, .. }
            if provider == "twilio" && key == "callback_token"
    )));
}

/// Wrong value type is reported as InvalidType.
#[test]
fn wrong_type_reports_invalid_type() {
    let toml = r#"
[server]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { .. })));
}

/// Dot-notation overrides land in the right section.
#[test]
fn dotted_override_sets_nested_key() {
    use figment::{providers::Serialized, Figment};

    let config: SwitchboardConfig = Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(("signalwire.callback_token", "from-env"))
        .extract()
        .expect("should set callback_token via dot notation");

    assert_eq!(
        config.signalwire.callback_token.as_deref(),
        Some("from-env")
    );
}
