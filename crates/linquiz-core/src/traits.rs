//! Seams between the quiz core and its external collaborators.
//!
//! `TextGenerator` is implemented by `linquiz-providers`; `DocumentStore`
//! and `GuideSource` have filesystem implementations in [`crate::report`].
//! Grading and sessions never touch any of them.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::Level;

// ---------------------------------------------------------------------------
// Text generation
// ---------------------------------------------------------------------------

/// A hosted language model that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable provider name (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Generate text for a prompt. Fails with a `ProviderError` on
    /// network, auth or quota problems.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;
}

/// Request to generate text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "claude-sonnet-4-20250514").
    pub model: String,
    /// The user message.
    pub prompt: String,
    /// Optional system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw text, unparsed.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

// ---------------------------------------------------------------------------
// Document store and guide source
// ---------------------------------------------------------------------------

/// Kind of generated study document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Review,
    Supplement,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Review => "review",
            DocumentKind::Supplement => "supplement",
        }
    }
}

/// Durable storage for generated markdown, keyed by (level, kind).
pub trait DocumentStore: Send + Sync {
    /// Persist `content` as-is and return where it went.
    fn save_document(
        &self,
        level: Level,
        kind: DocumentKind,
        content: &str,
    ) -> anyhow::Result<PathBuf>;
}

/// Supplies the study guide text for a level. Missing guides are empty.
pub trait GuideSource: Send + Sync {
    fn load_guide(&self, level: Level) -> String;
}

// ---------------------------------------------------------------------------
// Code fence stripping
// ---------------------------------------------------------------------------

/// Remove a markdown code fence wrapped around a whole response.
///
/// If the trimmed text starts with a triple-backtick line, that first line
/// is dropped, along with everything from the last closing fence onward.
/// Text without a leading fence is returned trimmed but otherwise as-is.
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let body = match trimmed.split_once('\n') {
        Some((_, rest)) => rest,
        None => return "",
    };

    let body = match body.rfind("```") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim()
}
