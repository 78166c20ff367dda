// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Conclave routing core.

use thiserror::Error;

/// The error type shared by every Conclave component.
///
/// Only three classes ever reach a caller of the decision components:
/// unknown tier names, aggregation in an unusable state, and unrecognized
/// arguments. Everything else degrades inside the component that hit it.
#[derive(Debug, Error)]
pub enum ConclaveError {
    /// A tier name passed as an override is not in the active roster.
    #[error("invalid tier: `{name}` is not in the active tier roster")]
    InvalidTier { name: String },

    /// A component was invoked while disabled or without usable input.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An argument value was not recognized.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration errors (bad values, unparsable files).
    #[error("configuration error: {0}")]
    Config(String),

    /// Completion endpoint errors (transport failure, non-2xx, bad body).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConclaveError {
    /// Shorthand for an [`ConclaveError::InvalidTier`] naming `name`.
    pub fn invalid_tier(name: impl Into<String>) -> Self {
        Self::InvalidTier { name: name.into() }
    }
}
