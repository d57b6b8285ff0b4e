// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-account credential provider with trusted-host request signing.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

use switchboard_config::RunMode;
use switchboard_core::CredentialProvider;

/// Twilio's REST host, trusted for signing without expiry.
pub const TWILIO_API_HOST: &str = "api.twilio.com";

/// How far past its expiry a trust record is still honored.
const TRUST_STALENESS_MINUTES: i64 = 5;

/// Hosts that may receive signed requests, each with a trust expiry.
///
/// Keys are URL authorities: the host name, plus `:port` when the URL names
/// an explicit port. Clones share the same table.
#[derive(Clone, Default)]
pub struct TrustedHosts {
    inner: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl TrustedHosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding `api.twilio.com` and, when given, the SignalWire space,
    /// both trusted indefinitely.
    pub fn carrier_defaults(signalwire_space: Option<&str>) -> Self {
        let hosts = Self::new();
        hosts.trust_host(TWILIO_API_HOST, DateTime::<Utc>::MAX_UTC);
        if let Some(space) = signalwire_space.filter(|s| !s.is_empty()) {
            hosts.trust_host(space, DateTime::<Utc>::MAX_UTC);
        }
        hosts
    }

    /// Trusts `authority` until `until`, replacing any earlier record.
    pub fn trust_host(&self, authority: &str, until: DateTime<Utc>) {
        let mut table = self.inner.write().unwrap_or_else(|e| e.into_inner());
        table.insert(authority.to_ascii_lowercase(), until);
    }

    /// Trusts the authority of `url` until `until`. Unparsable URLs are ignored.
    pub fn trust_url(&self, url: &str, until: DateTime<Utc>) {
        if let Some(authority) = authority_of(url) {
            self.trust_host(&authority, until);
        }
    }

    /// True if the authority of `service_url` is trusted at this moment.
    ///
    /// Malformed URLs are never trusted.
    pub fn is_trusted_service_url(&self, service_url: &str) -> bool {
        match authority_of(service_url) {
            Some(authority) => self.is_trusted_authority(&authority, Utc::now()),
            None => {
                tracing::debug!(url = service_url, "could not parse service url, not trusted");
                false
            }
        }
    }

    fn is_trusted_authority(&self, authority: &str, now: DateTime<Utc>) -> bool {
        let table = self.inner.read().unwrap_or_else(|e| e.into_inner());
        table.get(authority).is_some_and(|expiry| {
            let horizon = now
                .checked_sub_signed(Duration::minutes(TRUST_STALENESS_MINUTES))
                .unwrap_or(now);
            *expiry > horizon
        })
    }
}

impl fmt::Debug for TrustedHosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut hosts: Vec<&String> = table.keys().collect();
        hosts.sort();
        f.debug_struct("TrustedHosts").field("hosts", &hosts).finish()
    }
}

fn authority_of(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}

/// Credential provider holding one account identifier and its secret.
///
/// Used twice per carrier: once with the primary token to sign outbound
/// requests, once with the callback token to check inbound webhooks.
#[derive(Clone)]
pub struct SimpleCredentialProvider {
    app_id: String,
    app_secret: Option<String>,
    mode: RunMode,
    trusted: TrustedHosts,
}

impl SimpleCredentialProvider {
    pub fn new(
        app_id: impl Into<String>,
        app_secret: Option<String>,
        mode: RunMode,
        trusted: TrustedHosts,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret,
            mode,
            trusted,
        }
    }

    pub fn trusted_hosts(&self) -> &TrustedHosts {
        &self.trusted
    }

    fn basic_credentials(&self, secret: &str) -> Option<HeaderValue> {
        let token = STANDARD.encode(format!("{}:{}", self.app_id, secret));
        let mut value = HeaderValue::from_str(&format!("Basic {token}")).ok()?;
        value.set_sensitive(true);
        Some(value)
    }
}

impl fmt::Debug for SimpleCredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleCredentialProvider")
            .field("app_id", &self.app_id)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[redacted]"))
            .field("mode", &self.mode)
            .field("trusted", &self.trusted)
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for SimpleCredentialProvider {
    fn app_id(&self) -> &str {
        &self.app_id
    }

    async fn is_valid_app_id(&self, app_id: &str) -> bool {
        self.app_id == app_id
    }

    async fn get_app_secret(&self, app_id: &str) -> Option<String> {
        if self.app_id == app_id {
            self.app_secret.clone()
        } else {
            None
        }
    }

    async fn is_authentication_disabled(&self) -> bool {
        !self.mode.is_production()
    }

    async fn sign_request(&self, url: &str, headers: &mut HeaderMap) {
        if !self.trusted.is_trusted_service_url(url) {
            return;
        }
        let Some(secret) = self.app_secret.as_deref() else {
            return;
        };
        if let Some(value) = self.basic_credentials(secret) {
            headers.insert(AUTHORIZATION, value);
        }
    }
}
