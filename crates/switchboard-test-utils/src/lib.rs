// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Switchboard integration tests.
//!
//! - [`fixtures`] - webhook bodies and query strings in carrier shape
//! - [`CarrierHarness`] - a carrier configured against a wiremock REST API

pub mod fixtures;
pub mod harness;

pub use harness::{mock_config, CarrierHarness, TurnOutcome};
