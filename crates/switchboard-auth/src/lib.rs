// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carrier credentials for Switchboard.
//!
//! [`SimpleCredentialProvider`] signs requests to trusted carrier hosts with
//! HTTP Basic credentials; [`authenticate`] checks the shared callback token
//! every inbound webhook carries.

pub mod callback;
pub mod credentials;

pub use callback::{
    authenticate, parse_provider, AuthenticatedCaller, CallbackRequest, TWILIO_SIGNATURE_HEADER,
};
pub use credentials::{SimpleCredentialProvider, TrustedHosts, TWILIO_API_HOST};
