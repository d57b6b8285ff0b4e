// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook body decoding and mapping to [`Activity`].

use serde_json::{Map, Value};
use strum::{Display, EnumString};

use switchboard_core::{
    Activity, ActivityType, ChannelAccount, ConversationAccount, Provider, SwitchboardError,
};

/// Decoded webhook body: the carrier's flat field map.
pub type WebhookBody = Map<String, Value>;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The `type` query selector carriers are configured to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum WebhookKind {
    Message,
    Voice,
    MessageStatus,
    VoiceStatus,
}

impl WebhookKind {
    pub fn activity_type(self) -> ActivityType {
        match self {
            WebhookKind::Message => ActivityType::Message,
            WebhookKind::Voice => ActivityType::Call,
            WebhookKind::MessageStatus => ActivityType::MessageStatus,
            WebhookKind::VoiceStatus => ActivityType::CallStatus,
        }
    }
}

/// Maps the `type` selector, failing when it is absent or unknown.
pub fn parse_webhook_kind(selector: Option<&str>) -> Result<WebhookKind, SwitchboardError> {
    let raw = selector.ok_or_else(|| {
        SwitchboardError::Validation("missing type on webhook query".to_string())
    })?;
    raw.parse()
        .map_err(|_| SwitchboardError::Validation(format!("invalid webhook type `{raw}`")))
}

/// Decodes a webhook body as a form or a JSON object.
///
/// Without a content type, JSON is tried first and form decoding only
/// applies to bytes shaped like `key=value` pairs. Anything that is not a
/// field map is rejected.
pub fn decode_body(content_type: Option<&str>, raw: &[u8]) -> Result<WebhookBody, SwitchboardError> {
    let media_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());

    match media_type.as_deref() {
        Some(FORM_CONTENT_TYPE) => decode_form(raw),
        Some(ct) if ct.ends_with("json") => decode_json(raw),
        _ => decode_json(raw).or_else(|json_err| {
            if is_form_shaped(raw) {
                decode_form(raw)
            } else {
                Err(json_err)
            }
        }),
    }
}

/// Every `&`-separated segment is a `key=value` pair with a non-empty key.
fn is_form_shaped(raw: &[u8]) -> bool {
    !raw.is_empty()
        && raw
            .split(|b| *b == b'&')
            .all(|pair| pair.iter().position(|b| *b == b'=').is_some_and(|eq| eq > 0))
}

fn decode_form(raw: &[u8]) -> Result<WebhookBody, SwitchboardError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(raw)
        .map_err(|e| SwitchboardError::Validation(format!("invalid request body: {e}")))?;
    Ok(pairs
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect())
}

fn decode_json(raw: &[u8]) -> Result<WebhookBody, SwitchboardError> {
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SwitchboardError::Validation(
            "invalid request body: expected an object".to_string(),
        )),
        Err(e) => Err(SwitchboardError::Validation(format!("invalid request body: {e}"))),
    }
}

/// Fills in `AccountSid` with the carrier's configured account when the
/// body lacks a string value. Returns true when a default was applied.
///
/// Activities from callers that omit the field are attributed to the
/// configured tenant; the callback token is still checked against it.
pub fn default_account_sid(body: &mut WebhookBody, provider: Provider, account_sid: &str) -> bool {
    if body.get("AccountSid").is_some_and(Value::is_string) {
        return false;
    }
    tracing::info!(
        provider = %provider,
        account_sid,
        "webhook body missing AccountSid, defaulted to configured account"
    );
    body.insert("AccountSid".to_string(), Value::String(account_sid.to_string()));
    true
}

fn field<'a>(body: &'a WebhookBody, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str).filter(|v| !v.is_empty())
}

/// Builds the canonical activity for an authenticated webhook.
///
/// `recipient` prefers `CalledVia` over `To` so forwarded calls are
/// addressed to the number that was actually dialed. `id` comes from
/// `MessageSid`, then `SmsSid`, and may be absent.
pub fn normalize(
    provider: Provider,
    kind: WebhookKind,
    body: WebhookBody,
    service_url: &str,
) -> Activity {
    let tenant_id = field(&body, "AccountSid").unwrap_or_default().to_string();
    let from = field(&body, "From").unwrap_or_default().to_string();
    let recipient = field(&body, "CalledVia")
        .or_else(|| field(&body, "To"))
        .unwrap_or_default()
        .to_string();
    let text = body.get("Body").and_then(Value::as_str).map(str::to_string);
    let id = field(&body, "MessageSid")
        .or_else(|| field(&body, "SmsSid"))
        .map(str::to_string);

    Activity {
        activity_type: kind.activity_type(),
        id,
        channel_id: Some(provider.to_string()),
        conversation: Some(ConversationAccount::new(tenant_id)),
        from: Some(ChannelAccount::new(from)),
        recipient: Some(ChannelAccount::new(recipient)),
        text,
        service_url: Some(service_url.to_string()),
        channel_data: Value::Object(body),
        ..Activity::default()
    }
}
