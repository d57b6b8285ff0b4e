// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook bodies in the shape Twilio and SignalWire send them.

use std::collections::HashMap;

use serde_json::{json, Value};

pub const TEST_ACCOUNT_SID: &str = "AC00000000000000000000000000000001";
pub const TEST_PRIMARY_TOKEN: &str = "primary-token";
pub const TEST_CALLBACK_TOKEN: &str = "callback-token";
pub const TEST_SIGNALWIRE_PROJECT: &str = "5f4f0bd6-0000-4c3a-9000-000000000001";
pub const TEST_SIGNALWIRE_CALLBACK_TOKEN: &str = "sw-callback-token";
pub const TEST_CALLBACK_APP_ID: &str = "AP00000000000000000000000000000001";
pub const TEST_ADDRESS_SID: &str = "AD00000000000000000000000000000001";
pub const TEST_MIGRATE_ACCOUNT_SID: &str = "AC00000000000000000000000000000002";
pub const TEST_MIGRATE_ADDRESS_SID: &str = "AD00000000000000000000000000000002";

/// The subscriber texting or calling in.
pub const USER_NUMBER: &str = "+15551234567";
/// Our managed number.
pub const BOT_NUMBER: &str = "+15557654321";

/// Inbound SMS as delivered to the `type=message` webhook.
pub fn sms_body(account_sid: &str, text: &str) -> Value {
    json!({
        "ToCountry": "US",
        "ToState": "WA",
        "SmsMessageSid": "SM00000000000000000000000000000001",
        "NumMedia": "0",
        "ToCity": "SEATTLE",
        "FromZip": "98101",
        "SmsSid": "SM00000000000000000000000000000001",
        "FromState": "WA",
        "SmsStatus": "received",
        "FromCity": "SEATTLE",
        "Body": text,
        "FromCountry": "US",
        "To": BOT_NUMBER,
        "ToZip": "98101",
        "NumSegments": "1",
        "MessageSid": "SM00000000000000000000000000000001",
        "AccountSid": account_sid,
        "From": USER_NUMBER,
        "ApiVersion": "2010-04-01"
    })
}

/// Inbound call as delivered to the `type=voice` webhook.
pub fn voice_body(account_sid: &str, call_status: &str) -> Value {
    json!({
        "AccountSid": account_sid,
        "ApiVersion": "2010-04-01",
        "CallSid": "CA00000000000000000000000000000001",
        "CallStatus": call_status,
        "Called": BOT_NUMBER,
        "CalledCountry": "US",
        "Caller": USER_NUMBER,
        "CallerCountry": "US",
        "Direction": "inbound",
        "From": USER_NUMBER,
        "FromCountry": "US",
        "To": BOT_NUMBER,
        "ToCountry": "US"
    })
}

/// Delivery callback for a message we sent.
pub fn message_status_body(account_sid: &str, status: &str) -> Value {
    json!({
        "AccountSid": account_sid,
        "ApiVersion": "2010-04-01",
        "MessageSid": "SM00000000000000000000000000000002",
        "SmsSid": "SM00000000000000000000000000000002",
        "MessageStatus": status,
        "SmsStatus": status,
        "From": BOT_NUMBER,
        "To": USER_NUMBER
    })
}

/// Query parameters of a webhook configured for `provider` and `kind`.
pub fn webhook_query(provider: &str, kind: &str, callback_token: Option<&str>) -> HashMap<String, String> {
    let mut query = HashMap::from([
        ("provider".to_string(), provider.to_string()),
        ("type".to_string(), kind.to_string()),
    ]);
    if let Some(token) = callback_token {
        query.insert("callback_token".to_string(), token.to_string());
    }
    query
}

/// `path?provider=..&type=..&callback_token=..` with the values form-encoded.
pub fn webhook_uri(path: &str, provider: &str, kind: &str, callback_token: Option<&str>) -> String {
    let mut pairs = vec![("provider", provider), ("type", kind)];
    if let Some(token) = callback_token {
        pairs.push(("callback_token", token));
    }
    let query = serde_urlencoded::to_string(&pairs).unwrap_or_default();
    format!("{path}?{query}")
}

/// Flattens a JSON fixture into a form body.
pub fn form_encode(body: &Value) -> String {
    let pairs: Vec<(String, String)> = body
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(k, v)| (k.clone(), v.as_str().map_or_else(|| v.to_string(), str::to_string)))
                .collect()
        })
        .unwrap_or_default();
    serde_urlencoded::to_string(&pairs).unwrap_or_default()
}
