// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query complexity scoring.
//!
//! The primary path asks a chat-completion backend for the five dimensions as
//! JSON. Any failure on that path (transport, status, timeout, bad JSON)
//! degrades to deterministic keyword heuristics, so scoring always yields a
//! [`ComplexityScore`].

use std::sync::Arc;
use std::time::Duration;

use conclave_config::model::ClassifierConfig;
use conclave_core::{CompletionBackend, ComplexityScore, ConclaveError};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::llm::ChatCompletionClient;

/// Upper bound on a single LLM scoring call.
pub const DEFAULT_SCORING_TIMEOUT: Duration = Duration::from_secs(30);

const REASONING_KEYWORDS: &[&str] = &[
    "why", "how", "explain", "analyze", "compare", "evaluate", "reason", "step by step",
];

const DOMAIN_KEYWORDS: &[&str] = &[
    "algorithm", "architecture", "database", "protocol", "legal", "medical", "financial",
    "statistical", "compliance", "kubernetes",
];

const CREATIVITY_KEYWORDS: &[&str] = &[
    "create", "design", "write", "imagine", "brainstorm", "story", "poem", "invent",
];

const LENGTH_KEYWORDS: &[&str] = &[
    "detailed", "comprehensive", "essay", "report", "in depth", "thorough", "full", "list",
];

const SCORING_INSTRUCTIONS: &str = "\
Rate the complexity of the following user query on five dimensions, each a number from 0 to 10:
- reasoning_depth: how much multi-step reasoning is required
- domain_specificity: how much specialist knowledge is required
- creativity: how much original or generative work is required
- context_dependency: how much the answer depends on earlier conversation
- output_length: how long a complete answer needs to be

Respond with only a JSON object with exactly these keys and numeric values.";

/// Dimensions as returned by the classifier model.
#[derive(Debug, Deserialize)]
struct LlmDimensions {
    reasoning_depth: f64,
    domain_specificity: f64,
    creativity: f64,
    context_dependency: f64,
    output_length: f64,
}

impl From<LlmDimensions> for ComplexityScore {
    fn from(d: LlmDimensions) -> Self {
        ComplexityScore::new(
            d.reasoning_depth,
            d.domain_specificity,
            d.creativity,
            d.context_dependency,
            d.output_length,
        )
    }
}

/// Scores queries on the five complexity dimensions.
///
/// Holds no mutable state; one instance can be shared across tasks.
#[derive(Clone)]
pub struct ComplexityScorer {
    backend: Option<Arc<dyn CompletionBackend>>,
    timeout: Duration,
}

impl std::fmt::Debug for ComplexityScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplexityScorer")
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ComplexityScorer {
    /// A scorer that only uses keyword heuristics.
    pub fn heuristic() -> Self {
        Self {
            backend: None,
            timeout: DEFAULT_SCORING_TIMEOUT,
        }
    }

    /// A scorer that asks `backend` first and falls back to heuristics.
    pub fn with_backend(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend: Some(backend),
            timeout: DEFAULT_SCORING_TIMEOUT,
        }
    }

    /// Overrides the per-call bound on the backend request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds a scorer from the `[classifier]` section.
    ///
    /// A disabled classifier, or one whose client cannot be built, yields a
    /// heuristic-only scorer.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        if !config.enabled {
            return Self::heuristic();
        }
        match ChatCompletionClient::from_config(config) {
            Ok(client) => Self::with_backend(Arc::new(client))
                .with_timeout(Duration::from_secs(config.timeout_secs)),
            Err(e) => {
                warn!(error = %e, "classifier client unavailable, using heuristic scoring");
                Self::heuristic()
            }
        }
    }

    /// Whether an LLM backend is configured.
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Score `query`. Never fails.
    ///
    /// `history` is the prior conversation, oldest first. `agent_context` is an
    /// opaque map forwarded to the classifier prompt.
    pub async fn score(
        &self,
        query: &str,
        history: &[String],
        agent_context: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> ComplexityScore {
        let Some(backend) = &self.backend else {
            return heuristic_score(query, history.len());
        };

        let prompt = build_prompt(query, history.len(), agent_context);
        match self.llm_score(backend.as_ref(), &prompt).await {
            Ok(score) => {
                debug!(
                    backend = backend.name(),
                    total = score.weighted_total(),
                    "llm complexity score"
                );
                score
            }
            Err(e) => {
                warn!(
                    backend = backend.name(),
                    error = %e,
                    "llm complexity scoring failed, falling back to heuristics"
                );
                heuristic_score(query, history.len())
            }
        }
    }

    async fn llm_score(
        &self,
        backend: &dyn CompletionBackend,
        prompt: &str,
    ) -> Result<ComplexityScore, ConclaveError> {
        let reply = tokio::time::timeout(self.timeout, backend.complete(prompt))
            .await
            .map_err(|_| ConclaveError::Timeout {
                duration: self.timeout,
            })??;
        parse_llm_reply(&reply)
    }
}

fn build_prompt(
    query: &str,
    history_len: usize,
    agent_context: Option<&serde_json::Map<String, serde_json::Value>>,
) -> String {
    let mut prompt = format!("{SCORING_INSTRUCTIONS}\n\nQuery: {query}");
    if history_len > 0 {
        prompt.push_str(&format!(
            "\n\nContext: conversation history length: {history_len} messages"
        ));
    }
    if let Some(context) = agent_context.filter(|c| !c.is_empty()) {
        if let Ok(json) = serde_json::to_string(context) {
            prompt.push_str(&format!("\n\nAgent context: {json}"));
        }
    }
    prompt
}

/// Parses a classifier reply, tolerating a surrounding code fence.
fn parse_llm_reply(reply: &str) -> Result<ComplexityScore, ConclaveError> {
    let dims: LlmDimensions =
        serde_json::from_str(strip_code_fence(reply)).map_err(|e| ConclaveError::Provider {
            message: format!("classifier reply is not valid score JSON: {e}"),
            source: Some(Box::new(e)),
        })?;
    Ok(dims.into())
}

/// Removes a leading ```` ``` ```` or ```` ```json ```` fence and its closing fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Deterministic keyword-based scoring.
pub fn heuristic_score(query: &str, history_len: usize) -> ComplexityScore {
    let lower = query.to_lowercase();

    let length_hits = count_keywords(&lower, LENGTH_KEYWORDS) as f64;
    let size_bonus = (query.chars().count() as f64 / 200.0).min(5.0);

    ComplexityScore::new(
        keyword_dimension(&lower, REASONING_KEYWORDS),
        keyword_dimension(&lower, DOMAIN_KEYWORDS),
        keyword_dimension(&lower, CREATIVITY_KEYWORDS),
        context_dependency(history_len),
        (3.0 * length_hits + size_bonus).min(10.0),
    )
}

fn count_keywords(lower: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| lower.contains(*kw)).count()
}

fn keyword_dimension(lower: &str, keywords: &[&str]) -> f64 {
    let hits = count_keywords(lower, keywords) as f64;
    (hits * 10.0 / keywords.len() as f64).min(10.0)
}

fn context_dependency(history_len: usize) -> f64 {
    match history_len {
        0 => 0.0,
        1..=3 => 3.0,
        4..=10 => 6.0,
        _ => 8.0,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use proptest::prelude::*;
    use tracing_test::traced_test;

    use super::*;

    struct ScriptedBackend {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, prompt: &str) -> Result<String, ConclaveError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(|message| ConclaveError::Provider {
                message,
                source: None,
            })
        }
    }

    struct StalledBackend;

    #[async_trait]
    impl CompletionBackend for StalledBackend {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ConclaveError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("{}".into())
        }
    }

    #[test]
    fn reasoning_keyword_scores_one_of_eight() {
        let score = heuristic_score("why is the sky blue", 0);
        assert!((score.reasoning_depth - 1.25).abs() < 1e-9);
        assert_eq!(score.domain_specificity, 0.0);
        assert_eq!(score.creativity, 0.0);
        assert!(score.reasoning_depth > score.domain_specificity);
        assert!(score.reasoning_depth > score.creativity);
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        let score = heuristic_score("EXPLAIN the DATABASE Architecture", 0);
        assert!((score.reasoning_depth - 1.25).abs() < 1e-9);
        assert!((score.domain_specificity - 2.0).abs() < 1e-9);
    }

    #[test]
    fn context_dependency_buckets() {
        assert_eq!(heuristic_score("q", 0).context_dependency, 0.0);
        assert_eq!(heuristic_score("q", 1).context_dependency, 3.0);
        assert_eq!(heuristic_score("q", 3).context_dependency, 3.0);
        assert_eq!(heuristic_score("q", 4).context_dependency, 6.0);
        assert_eq!(heuristic_score("q", 10).context_dependency, 6.0);
        assert_eq!(heuristic_score("q", 11).context_dependency, 8.0);
    }

    #[test]
    fn output_length_combines_keywords_and_size() {
        // two length keywords, 400 chars => 3*2 + 2
        let mut query = String::from("a detailed report ");
        query.push_str(&"x".repeat(400 - query.len()));
        let score = heuristic_score(&query, 0);
        assert!((score.output_length - 8.0).abs() < 1e-9);
    }

    #[test]
    fn output_length_size_bonus_caps_at_five() {
        let score = heuristic_score(&"x".repeat(5000), 0);
        assert!((score.output_length - 5.0).abs() < 1e-9);
    }

    #[test]
    fn strips_code_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn heuristic_scorer_ignores_network() {
        let scorer = ComplexityScorer::heuristic();
        assert!(!scorer.has_backend());
        let score = scorer.score("why is the sky blue", &[], None).await;
        assert_eq!(score, heuristic_score("why is the sky blue", 0));
    }

    #[tokio::test]
    async fn llm_reply_is_parsed_and_clamped() {
        let backend = ScriptedBackend::ok(
            "```json\n{\"reasoning_depth\": 12, \"domain_specificity\": 4.5, \"creativity\": -1, \
             \"context_dependency\": 2, \"output_length\": 6}\n```",
        );
        let scorer = ComplexityScorer::with_backend(backend);
        let score = scorer.score("anything", &[], None).await;
        assert_eq!(score, ComplexityScore::new(10.0, 4.5, 0.0, 2.0, 6.0));
    }

    #[tokio::test]
    async fn prompt_carries_history_hint_and_context() {
        let backend = ScriptedBackend::ok(
            r#"{"reasoning_depth":1,"domain_specificity":1,"creativity":1,"context_dependency":1,"output_length":1}"#,
        );
        let scorer = ComplexityScorer::with_backend(backend.clone());
        let history = vec!["hi".to_string(), "hello".to_string()];
        let mut context = serde_json::Map::new();
        context.insert("team".into(), serde_json::json!("support"));

        scorer.score("reset my password", &history, Some(&context)).await;

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Query: reset my password"));
        assert!(prompts[0].contains("conversation history length: 2 messages"));
        assert!(prompts[0].contains("\"team\":\"support\""));
    }

    #[tokio::test]
    async fn prompt_omits_history_hint_without_history() {
        let backend = ScriptedBackend::ok(
            r#"{"reasoning_depth":1,"domain_specificity":1,"creativity":1,"context_dependency":1,"output_length":1}"#,
        );
        let scorer = ComplexityScorer::with_backend(backend.clone());
        scorer.score("hi", &[], None).await;
        assert!(!backend.prompts.lock().unwrap()[0].contains("history length"));
    }

    #[tokio::test]
    #[traced_test]
    async fn unparsable_reply_falls_back_to_heuristics() {
        let scorer = ComplexityScorer::with_backend(ScriptedBackend::ok("I think it's a 7"));
        let score = scorer.score("why is the sky blue", &[], None).await;
        assert_eq!(score, heuristic_score("why is the sky blue", 0));
        assert!(logs_contain("falling back to heuristics"));
    }

    #[tokio::test]
    #[traced_test]
    async fn backend_error_falls_back_to_heuristics() {
        let scorer = ComplexityScorer::with_backend(ScriptedBackend::failing("502 bad gateway"));
        let history = vec!["a".to_string(); 5];
        let score = scorer.score("compare two options", &history, None).await;
        assert_eq!(score, heuristic_score("compare two options", 5));
        assert!(logs_contain("502 bad gateway"));
    }

    #[tokio::test]
    async fn stalled_backend_times_out_to_heuristics() {
        let scorer = ComplexityScorer::with_backend(Arc::new(StalledBackend))
            .with_timeout(Duration::from_millis(100));
        let score = scorer.score("write a poem", &[], None).await;
        assert_eq!(score, heuristic_score("write a poem", 0));
    }

    #[test]
    fn disabled_classifier_config_is_heuristic() {
        let scorer = ComplexityScorer::from_config(&ClassifierConfig::default());
        assert!(!scorer.has_backend());
    }

    proptest! {
        #[test]
        fn heuristic_total_stays_in_range(query in ".{0,600}", history in 0usize..40) {
            let total = heuristic_score(&query, history).weighted_total();
            prop_assert!((0.0..=10.0).contains(&total));
        }
    }
}
