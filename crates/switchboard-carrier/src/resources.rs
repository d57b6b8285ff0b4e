// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carrier REST resources (Twilio 2010-04-01 shape, shared by SignalWire LaML).

use serde::{Deserialize, Serialize};

/// Result of `POST /Accounts/{sid}/Messages.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageResource {
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
}

/// Result of `POST /Accounts/{sid}/Calls.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallResource {
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberCapabilities {
    #[serde(default, alias = "SMS")]
    pub sms: bool,
    #[serde(default, alias = "MMS")]
    pub mms: bool,
    #[serde(default)]
    pub voice: bool,
}

/// One number offered by `AvailablePhoneNumbers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailablePhoneNumber {
    pub phone_number: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub capabilities: NumberCapabilities,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AvailablePhoneNumberPage {
    #[serde(default)]
    pub available_phone_numbers: Vec<AvailablePhoneNumber>,
}

/// A number owned by the account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingPhoneNumber {
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub sms_application_sid: Option<String>,
    #[serde(default)]
    pub voice_application_sid: Option<String>,
    #[serde(default)]
    pub address_sid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct IncomingPhoneNumberPage {
    #[serde(default)]
    pub incoming_phone_numbers: Vec<IncomingPhoneNumber>,
}

/// Error document returned with non-success statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}
