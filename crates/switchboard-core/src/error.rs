// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Switchboard carrier adapter.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across turn processing and the outbound send path.
#[derive(Debug, Error)]
pub enum SwitchboardError {
    /// Malformed webhook body, unknown activity type selector, or an outbound
    /// activity missing its delivery address.
    #[error("validation error: {0}")]
    Validation(String),

    /// The callback token did not match the provider's registered secret.
    #[error("unauthorized: callback token rejected for provider {provider}")]
    Unauthorized { provider: String },

    /// The provider selector is unknown or the provider is not configured.
    #[error("provider {0} not supported")]
    UnsupportedProvider(String),

    /// The carrier REST API answered with a non-success status.
    #[error("upstream error ({status}): {message}")]
    Upstream {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    /// An outbound HTTP attempt exceeded its timeout guard.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Transport failure before any response status was received.
    #[error("http error: {message}")]
    Http {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An application handler failed during dispatch and no turn-error hook was registered.
    #[error("turn error: {message}")]
    Turn {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Raised after the webhook response has been written for an outcome >= 400.
    /// `source` is the error that decided the outcome.
    #[error("carrier turn failed with status {status}: {cause}")]
    TurnFailed {
        status: u16,
        cause: String,
        #[source]
        source: Box<SwitchboardError>,
    },

    /// Configuration errors (missing provider credentials, invalid URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SwitchboardError {
    /// HTTP status a webhook turn resolves to when this error ends it.
    pub fn status_code(&self) -> u16 {
        match self {
            SwitchboardError::Validation(_) => 400,
            SwitchboardError::Unauthorized { .. } | SwitchboardError::UnsupportedProvider(_) => 401,
            SwitchboardError::TurnFailed { status, .. } => *status,
            _ => 500,
        }
    }

    /// Wraps an arbitrary handler failure as an unhandled turn error.
    pub fn turn<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SwitchboardError::Turn {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Ends a turn with `err`, keeping it as the source.
    pub fn turn_failed(status: u16, err: SwitchboardError) -> Self {
        SwitchboardError::TurnFailed {
            status,
            cause: err.to_string(),
            source: Box::new(err),
        }
    }

    /// True for the authentication family (token mismatch, unsupported provider).
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            SwitchboardError::Unauthorized { .. } | SwitchboardError::UnsupportedProvider(_)
        )
    }
}
