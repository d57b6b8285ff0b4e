// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Switchboard carrier adapter.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default REST host for Twilio.
pub const TWILIO_BASE_URL: &str = "https://api.twilio.com";

/// REST API version shared by both carriers.
pub const API_VERSION: &str = "2010-04-01";

/// Path under a SignalWire space that speaks the Twilio-compatible API.
pub const SIGNALWIRE_API_PATH: &str = "/api/laml/2010-04-01";

/// Default path the carriers post webhooks to.
pub const DEFAULT_WEBHOOK_PATH: &str = "/client/v1.0.0/carrier/api";

/// Top-level Switchboard configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchboardConfig {
    /// Process identity and execution mode.
    #[serde(default)]
    pub app: AppConfig,

    /// Webhook listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Outbound carrier API settings.
    #[serde(default)]
    pub outbound: OutboundConfig,

    /// Twilio account settings.
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// SignalWire account settings.
    #[serde(default)]
    pub signalwire: SignalWireConfig,

    /// Settings for the bundled demo bot.
    #[serde(default)]
    pub bot: BotConfig,
}

/// Execution mode. Everything except `Production` counts as non-production.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Production,
    Development,
    Test,
    Localhost,
}

impl RunMode {
    pub fn is_production(self) -> bool {
        matches!(self, RunMode::Production)
    }
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Name reported by the health endpoint.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Execution mode.
    #[serde(default)]
    pub mode: RunMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
            mode: RunMode::default(),
        }
    }
}

fn default_app_name() -> String {
    "switchboard".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Webhook listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Route the carriers post webhooks to.
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_path: default_webhook_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3978
}

fn default_webhook_path() -> String {
    DEFAULT_WEBHOOK_PATH.to_string()
}

/// Outbound carrier API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutboundConfig {
    /// Hard timeout for one HTTP attempt against a carrier API.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

/// Twilio account configuration.
///
/// The account is considered configured once `account_sid` is set.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Token used to sign requests sent to Twilio.
    #[serde(default)]
    pub primary_token: Option<String>,

    /// Shared secret Twilio echoes back in `callback_token`.
    #[serde(default)]
    pub callback_token: Option<String>,

    /// Application the send and provisioning calls bind callbacks to.
    #[serde(default)]
    pub callback_app_id: Option<String>,

    /// Address registered for number purchases.
    #[serde(default)]
    pub address_sid: Option<String>,

    /// Subaccount that `migrate_incoming_number` moves numbers into.
    #[serde(default)]
    pub migrate_account_sid: Option<String>,

    /// Address registered on the migration target account.
    #[serde(default)]
    pub migrate_address_sid: Option<String>,

    #[serde(default = "default_twilio_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            primary_token: None,
            callback_token: None,
            callback_app_id: None,
            address_sid: None,
            migrate_account_sid: None,
            migrate_address_sid: None,
            base_url: default_twilio_base_url(),
            api_version: default_api_version(),
        }
    }
}

impl TwilioConfig {
    pub fn is_configured(&self) -> bool {
        self.account_sid.is_some()
    }

    /// Base for the versioned REST API, e.g. `https://api.twilio.com/2010-04-01`.
    pub fn service_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }
}

impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("primary_token", &redact(&self.primary_token))
            .field("callback_token", &redact(&self.callback_token))
            .field("callback_app_id", &self.callback_app_id)
            .field("address_sid", &self.address_sid)
            .field("migrate_account_sid", &self.migrate_account_sid)
            .field("migrate_address_sid", &self.migrate_address_sid)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

fn default_twilio_base_url() -> String {
    TWILIO_BASE_URL.to_string()
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

/// SignalWire space configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SignalWireConfig {
    /// Space host, e.g. `example.signalwire.com`.
    #[serde(default)]
    pub space: Option<String>,

    #[serde(default)]
    pub account_sid: Option<String>,

    /// Token used to sign requests sent to the space.
    #[serde(default)]
    pub account_token: Option<String>,

    /// Shared secret SignalWire echoes back in `callback_token`.
    #[serde(default)]
    pub callback_token: Option<String>,

    #[serde(default)]
    pub callback_app_id: Option<String>,

    /// Not sent to SignalWire; kept for parity with Twilio settings.
    #[serde(default)]
    pub address_sid: Option<String>,

    /// Overrides the `https://{space}` base.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_signalwire_api_path")]
    pub api_path: String,
}

impl Default for SignalWireConfig {
    fn default() -> Self {
        Self {
            space: None,
            account_sid: None,
            account_token: None,
            callback_token: None,
            callback_app_id: None,
            address_sid: None,
            base_url: None,
            api_path: default_signalwire_api_path(),
        }
    }
}

impl SignalWireConfig {
    pub fn is_configured(&self) -> bool {
        self.account_sid.is_some()
    }

    /// Explicit `base_url`, else `https://{space}`.
    pub fn base_url(&self) -> Option<String> {
        match (&self.base_url, &self.space) {
            (Some(url), _) => Some(url.trim_end_matches('/').to_string()),
            (None, Some(space)) => Some(format!("https://{}", space.trim_end_matches('/'))),
            (None, None) => None,
        }
    }

    pub fn service_url(&self) -> Option<String> {
        self.base_url().map(|base| {
            format!("{base}/{}", self.api_path.trim_matches('/'))
        })
    }
}

impl fmt::Debug for SignalWireConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalWireConfig")
            .field("space", &self.space)
            .field("account_sid", &self.account_sid)
            .field("account_token", &redact(&self.account_token))
            .field("callback_token", &redact(&self.callback_token))
            .field("callback_app_id", &self.callback_app_id)
            .field("address_sid", &self.address_sid)
            .field("base_url", &self.base_url)
            .field("api_path", &self.api_path)
            .finish()
    }
}

fn default_signalwire_api_path() -> String {
    SIGNALWIRE_API_PATH.to_string()
}

/// Demo bot behavior for the bundled binary.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Text sent back for every inbound message when set.
    #[serde(default)]
    pub auto_reply: Option<String>,
}

fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "[redacted]")
}
