// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Switchboard carrier adapter.
//!
//! This crate provides the canonical activity model, the conversation
//! reference bookkeeping, the error taxonomy, and the credential provider
//! trait shared by the authentication, carrier, and gateway crates.

pub mod error;
pub mod reference;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SwitchboardError;
pub use reference::{
    apply_conversation_reference, get_conversation_reference, get_reply_conversation_reference,
};
pub use traits::CredentialProvider;
pub use types::{
    Activity, ActivityType, ChannelAccount, ConversationAccount, ConversationReference,
    MessageStatus, Provider, ResourceResponse,
};
