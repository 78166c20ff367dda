// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion backend trait used by the LLM complexity scorer.

use async_trait::async_trait;

use crate::error::ConclaveError;

/// A single-turn text completion endpoint.
///
/// Implementations must bound their own latency; a slow backend is
/// reported as [`ConclaveError::Timeout`], never waited on indefinitely.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short identifier used in logs (e.g. the model name).
    fn name(&self) -> &str;

    /// Send `prompt` as a single user message and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, ConclaveError>;
}
