// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-carrier endpoints and credentials.
//!
//! The table is built once at startup and handed to the carrier by `Arc`;
//! nothing looks providers up through globals.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use switchboard_auth::{SimpleCredentialProvider, TrustedHosts};
use switchboard_config::SwitchboardConfig;
use switchboard_core::{CredentialProvider, Provider, SwitchboardError};

/// Endpoints and credentials for one carrier account.
#[derive(Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    /// REST host root, e.g. `https://api.twilio.com`.
    pub base_url: String,
    /// Versioned API root stamped on every inbound activity.
    pub service_url: String,
    pub account_sid: String,
    /// Signs requests this process sends to the carrier.
    pub outbound_credentials: Arc<dyn CredentialProvider>,
    /// Validates webhooks the carrier sends to this process.
    pub inbound_credentials: Arc<dyn CredentialProvider>,
    /// Application receiving SMS and voice callbacks for managed numbers.
    pub callback_app_id: Option<String>,
    pub address_sid: Option<String>,
    /// Account that incoming numbers are migrated into (Twilio only).
    pub migrate_account_sid: Option<String>,
    pub migrate_address_sid: Option<String>,
}

impl ProviderConfig {
    pub fn new(
        provider: Provider,
        base_url: impl Into<String>,
        service_url: impl Into<String>,
        account_sid: impl Into<String>,
        outbound_credentials: Arc<dyn CredentialProvider>,
        inbound_credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            provider,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_url: service_url.into().trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            outbound_credentials,
            inbound_credentials,
            callback_app_id: None,
            address_sid: None,
            migrate_account_sid: None,
            migrate_address_sid: None,
        }
    }

    pub fn with_callback_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.callback_app_id = Some(app_id.into());
        self
    }

    pub fn with_address_sid(mut self, address_sid: impl Into<String>) -> Self {
        self.address_sid = Some(address_sid.into());
        self
    }

    /// SignalWire rejects `AddressSid` and `InLocality`.
    pub fn supports_address_sid(&self) -> bool {
        self.provider != Provider::SignalWire
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("service_url", &self.service_url)
            .field("account_sid", &self.account_sid)
            .field("outbound_credentials", &self.outbound_credentials.app_id())
            .field("inbound_credentials", &self.inbound_credentials.app_id())
            .field("callback_app_id", &self.callback_app_id)
            .field("address_sid", &self.address_sid)
            .field("migrate_account_sid", &self.migrate_account_sid)
            .field("migrate_address_sid", &self.migrate_address_sid)
            .finish()
    }
}

/// Configured carriers, keyed by provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderTable {
    providers: HashMap<Provider, Arc<ProviderConfig>>,
}

impl ProviderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from every carrier whose `account_sid` is set.
    ///
    /// All carriers share one [`TrustedHosts`] table seeded with
    /// `api.twilio.com`, the SignalWire space, and each configured base URL.
    pub fn from_config(config: &SwitchboardConfig) -> Result<Self, SwitchboardError> {
        let mode = config.app.mode;
        let trusted = TrustedHosts::carrier_defaults(config.signalwire.space.as_deref());
        let mut table = Self::new();

        let twilio = &config.twilio;
        if let Some(account_sid) = &twilio.account_sid {
            trusted.trust_url(&twilio.base_url, DateTime::<Utc>::MAX_UTC);
            let mut entry = ProviderConfig::new(
                Provider::Twilio,
                twilio.base_url.clone(),
                twilio.service_url(),
                account_sid.clone(),
                Arc::new(SimpleCredentialProvider::new(
                    account_sid.clone(),
                    twilio.primary_token.clone(),
                    mode,
                    trusted.clone(),
                )),
                Arc::new(SimpleCredentialProvider::new(
                    account_sid.clone(),
                    twilio.callback_token.clone(),
                    mode,
                    trusted.clone(),
                )),
            );
            entry.callback_app_id = twilio.callback_app_id.clone();
            entry.address_sid = twilio.address_sid.clone();
            entry.migrate_account_sid = twilio.migrate_account_sid.clone();
            entry.migrate_address_sid = twilio.migrate_address_sid.clone();
            table.insert(entry);
        }

        let signalwire = &config.signalwire;
        if let Some(account_sid) = &signalwire.account_sid {
            let (Some(base_url), Some(service_url)) =
                (signalwire.base_url(), signalwire.service_url())
            else {
                return Err(SwitchboardError::Config(
                    "signalwire.space or signalwire.base_url is required".to_string(),
                ));
            };
            trusted.trust_url(&base_url, DateTime::<Utc>::MAX_UTC);
            let mut entry = ProviderConfig::new(
                Provider::SignalWire,
                base_url,
                service_url,
                account_sid.clone(),
                Arc::new(SimpleCredentialProvider::new(
                    account_sid.clone(),
                    signalwire.account_token.clone(),
                    mode,
                    trusted.clone(),
                )),
                Arc::new(SimpleCredentialProvider::new(
                    account_sid.clone(),
                    signalwire.callback_token.clone(),
                    mode,
                    trusted.clone(),
                )),
            );
            entry.callback_app_id = signalwire.callback_app_id.clone();
            entry.address_sid = signalwire.address_sid.clone();
            table.insert(entry);
        }

        Ok(table)
    }

    pub fn insert(&mut self, config: ProviderConfig) {
        self.providers.insert(config.provider, Arc::new(config));
    }

    /// Looks up a configured carrier.
    pub fn get(&self, provider: Provider) -> Result<Arc<ProviderConfig>, SwitchboardError> {
        self.providers
            .get(&provider)
            .cloned()
            .ok_or_else(|| SwitchboardError::UnsupportedProvider(provider.to_string()))
    }

    pub fn contains(&self, provider: Provider) -> bool {
        self.providers.contains_key(&provider)
    }

    /// Configured carriers in a stable order.
    pub fn configured(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = self.providers.keys().copied().collect();
        providers.sort_by_key(|p| p.to_string());
        providers
    }
}
