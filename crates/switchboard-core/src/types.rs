// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical activity model shared by the inbound and outbound paths.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Default suspension for a `delay` pseudo-activity without a numeric value.
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Channel id under which trace activities are actually transmitted.
pub const EMULATOR_CHANNEL: &str = "emulator";

/// Supported telephony carriers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Twilio,
    SignalWire,
}

/// Kind of an [`Activity`].
///
/// Unknown strings survive a round trip through [`ActivityType::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    #[default]
    Message,
    Call,
    MessageStatus,
    CallStatus,
    Trace,
    Event,
    /// Outbound-only pseudo activity that suspends the batch.
    Delay,
    Unrecognized(String),
}

impl ActivityType {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::Message => "message",
            ActivityType::Call => "call",
            ActivityType::MessageStatus => "messageStatus",
            ActivityType::CallStatus => "callStatus",
            ActivityType::Trace => "trace",
            ActivityType::Event => "event",
            ActivityType::Delay => "delay",
            ActivityType::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for ActivityType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "message" => ActivityType::Message,
            "call" => ActivityType::Call,
            "messageStatus" => ActivityType::MessageStatus,
            "callStatus" => ActivityType::CallStatus,
            "trace" => ActivityType::Trace,
            "event" => ActivityType::Event,
            "delay" => ActivityType::Delay,
            _ => ActivityType::Unrecognized(raw),
        }
    }
}

impl From<ActivityType> for String {
    fn from(kind: ActivityType) -> Self {
        match kind {
            ActivityType::Unrecognized(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An address on a channel (an E.164 number for SMS and voice).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// The carrier account a conversation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccount {
    pub tenant_id: String,
}

impl ConversationAccount {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
        }
    }
}

/// One inbound or outbound conversational event.
///
/// Outbound activities may be partial; the conversation reference fills in
/// addressing before delivery.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type", default)]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub channel_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Activity {
    /// A text message with no addressing yet.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Message,
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// A trace activity; only transmitted on the emulator channel.
    pub fn trace(text: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Trace,
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// A `delay` pseudo-activity suspending the batch for `ms` milliseconds.
    pub fn delay(ms: u64) -> Self {
        Self {
            activity_type: ActivityType::Delay,
            value: Some(Value::from(ms)),
            ..Self::default()
        }
    }

    /// A zero-content event, used for synthetic proactive turns.
    pub fn event(name: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Event,
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn from_id(&self) -> Option<&str> {
        self.from.as_ref().map(|a| a.id.as_str())
    }

    pub fn recipient_id(&self) -> Option<&str> {
        self.recipient
            .as_ref()
            .map(|a| a.id.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.conversation.as_ref().map(|c| c.tenant_id.as_str())
    }

    /// Reads a string field from the provider passthrough payload.
    pub fn channel_field(&self, key: &str) -> Option<&str> {
        self.channel_data.get(key).and_then(Value::as_str)
    }

    /// Suspension requested by a `delay` activity.
    pub fn delay_duration(&self) -> Duration {
        let ms = self
            .value
            .as_ref()
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_DELAY_MS);
        Duration::from_millis(ms)
    }

    /// Status callback value carried in the provider payload, if any.
    pub fn message_status(&self) -> Option<MessageStatus> {
        self.channel_field("MessageStatus")
            .or_else(|| self.channel_field("SmsStatus"))
            .map(MessageStatus::from)
    }
}

/// Delivery state reported by a `message_status` callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageStatus {
    Queued,
    Sent,
    Delivered,
    Undelivered,
    Failed,
    Other(String),
}

impl From<&str> for MessageStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "queued" => MessageStatus::Queued,
            "sent" => MessageStatus::Sent,
            "delivered" => MessageStatus::Delivered,
            "undelivered" => MessageStatus::Undelivered,
            "failed" => MessageStatus::Failed,
            other => MessageStatus::Other(other.to_string()),
        }
    }
}

/// Portable addressing snapshot for replies and proactive conversations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
}

/// Acknowledgment for one outbound activity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ResourceResponse {
    /// Synthetic acknowledgment for activities that never reach the network.
    pub fn empty() -> Self {
        Self { id: None }
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}
