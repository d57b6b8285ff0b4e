// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook authentication.
//!
//! Both carriers echo a shared secret back in the `callback_token` query
//! parameter of every webhook. The secret registered for the account named
//! in the body must match it exactly.

use std::str::FromStr;

use subtle::ConstantTimeEq;

use switchboard_core::{CredentialProvider, Provider, SwitchboardError};

/// Header Twilio signs its webhooks with. Only its presence is recorded.
pub const TWILIO_SIGNATURE_HEADER: &str = "x-twilio-signature";

/// The authentication-relevant parts of one inbound webhook.
#[derive(Debug, Clone, Copy)]
pub struct CallbackRequest<'a> {
    /// `provider` query parameter.
    pub provider: Option<&'a str>,
    /// `callback_token` query parameter.
    pub callback_token: Option<&'a str>,
    /// `AccountSid` from the body, after defaulting.
    pub account_sid: &'a str,
    /// Value of `X-Twilio-Signature`, if sent.
    pub signature: Option<&'a str>,
}

/// Identity established for an authenticated webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedCaller {
    pub provider: Provider,
    pub account_sid: String,
}

/// Resolves the `provider` query parameter.
pub fn parse_provider(selector: Option<&str>) -> Result<Provider, SwitchboardError> {
    let raw = selector.unwrap_or_default();
    Provider::from_str(raw).map_err(|_| SwitchboardError::UnsupportedProvider(raw.to_string()))
}

/// Checks `request.callback_token` against the secret `credentials` holds for
/// `request.account_sid`.
///
/// A missing token, an empty token, or an account without a secret is always
/// rejected.
pub async fn authenticate(
    request: &CallbackRequest<'_>,
    credentials: &dyn CredentialProvider,
) -> Result<AuthenticatedCaller, SwitchboardError> {
    let provider = parse_provider(request.provider)?;

    if provider == Provider::Twilio {
        tracing::debug!(
            signature_present = request.signature.is_some(),
            "twilio webhook signature header"
        );
    }

    let secret = credentials.get_app_secret(request.account_sid).await;
    let accepted = match (secret.as_deref(), request.callback_token) {
        (Some(secret), Some(token)) if !secret.is_empty() && !token.is_empty() => {
            bool::from(secret.as_bytes().ct_eq(token.as_bytes()))
        }
        _ => false,
    };

    if !accepted {
        tracing::warn!(
            provider = %provider,
            account_sid = request.account_sid,
            token_present = request.callback_token.is_some(),
            "callback token rejected"
        );
        return Err(SwitchboardError::Unauthorized {
            provider: provider.to_string(),
        });
    }

    Ok(AuthenticatedCaller {
        provider,
        account_sid: request.account_sid.to_string(),
    })
}
