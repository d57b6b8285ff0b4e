// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio and SignalWire carrier adapter.
//!
//! [`Carrier`] turns authenticated webhooks into [`Activity`] turns, runs
//! them through ordered handlers, and delivers replies through the
//! carrier's REST API.
//!
//! [`Activity`]: switchboard_core::Activity

pub mod carrier;
pub mod client;
pub mod context;
pub mod conversation;
pub mod events;
pub mod normalize;
pub mod provider;
pub mod provisioning;
pub mod resources;
mod send;

pub use carrier::{
    topic_for, BufferedResponse, Carrier, CarrierOptions, ResponseSink, TurnErrorHandler,
    WebhookRequest, EMPTY_RESPONSE, RESPONSE_CONTENT_TYPE,
};
pub use client::{CarrierApiClient, CarrierRequest, CarrierResponse, OutboundMessage, DEFAULT_TIMEOUT};
pub use context::{TurnContext, TurnSource};
pub use conversation::{CONTINUE_CONVERSATION_EVENT, CREATE_CONVERSATION_EVENT};
pub use events::{DispatchResult, Emission, EventDispatcher, Next, Topic};
pub use normalize::{WebhookBody, WebhookKind};
pub use provider::{ProviderConfig, ProviderTable};
pub use provisioning::{ClickToCall, CALLBACK_DIAL_SUBTYPE};
pub use resources::{AvailablePhoneNumber, CallResource, IncomingPhoneNumber, MessageResource};
