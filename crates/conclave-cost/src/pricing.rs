// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request cost estimation from tier pricing.
//!
//! Token counts are approximated at four characters per token, which is close
//! enough to feed a budget check before the real usage is known.

use conclave_core::ModelTier;

/// Characters per token used for prompt size estimates.
pub const CHARS_PER_TOKEN: usize = 4;

/// Approximate token count of `text`, rounded up.
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = text.chars().count();
    u32::try_from(chars.div_ceil(CHARS_PER_TOKEN)).unwrap_or(u32::MAX)
}

/// Estimated USD cost of sending `prompt` to `tier` and receiving
/// `expected_output_tokens` back.
pub fn estimate_request_cost(tier: &ModelTier, prompt: &str, expected_output_tokens: u32) -> f64 {
    tier.estimate_cost(estimate_tokens(prompt), expected_output_tokens)
}
