// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the carrier engine and its collaborators.

pub mod credentials;

pub use credentials::CredentialProvider;
