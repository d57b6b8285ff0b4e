// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for carrier webhooks.
//!
//! The gateway owns no turn logic. It lifts the raw request parts that
//! [`Carrier::invoke_activity`] reads out of axum, then writes back exactly
//! what the orchestrator put in its response sink.
//!
//! [`Carrier::invoke_activity`]: switchboard_carrier::Carrier::invoke_activity

pub mod handlers;
pub mod server;

pub use server::{router, start_server, GatewayState, HealthState};
