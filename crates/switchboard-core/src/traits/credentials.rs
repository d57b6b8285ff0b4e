// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential provider trait for inbound validation and outbound signing.

use async_trait::async_trait;
use http::HeaderMap;

/// Supplies the identity and shared secret for one carrier account.
///
/// One instance signs requests this system originates; another validates
/// callbacks this system receives. Implementations backed by a remote
/// service can make the lookups asynchronous.
#[async_trait]
pub trait CredentialProvider: Send + Sync + 'static {
    /// The application (account) identifier this provider speaks for.
    fn app_id(&self) -> &str;

    /// Returns true if `app_id` is the identity this provider holds.
    async fn is_valid_app_id(&self, app_id: &str) -> bool;

    /// Secret for `app_id`, or `None` when the id is not recognized.
    async fn get_app_secret(&self, app_id: &str) -> Option<String>;

    /// True only in non-production execution modes.
    async fn is_authentication_disabled(&self) -> bool;

    /// Adds credentials to `headers` when `url` targets a trusted host.
    ///
    /// Never fails: untrusted or malformed URLs leave the headers untouched.
    async fn sign_request(&self, url: &str, headers: &mut HeaderMap);
}
