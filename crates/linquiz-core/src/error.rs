//! Error types shared across linquiz crates.
//!
//! `ProviderError` lives here rather than in `linquiz-providers` so the
//! remediation pipeline can classify generation failures without string
//! matching.

use thiserror::Error;

/// Errors that can occur when calling a text generation service.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` for failures caused by the credential or model setup
    /// rather than the service being temporarily unavailable.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }
}

/// Structural problems that make a question bank unusable.
#[derive(Debug, Error)]
pub enum BankError {
    /// Question ids must run 1..=n with no gaps or repeats.
    #[error("question ids must be 1..={expected_last}, found id {found} at position {position}")]
    NonContiguousIds {
        expected_last: u32,
        found: u32,
        position: usize,
    },

    /// A question has an empty accepted-answer list.
    #[error("question {0} has no accepted answers")]
    NoAnswers(u32),

    /// The bank declares a different level than the one requested.
    #[error("bank declares level '{found}' but '{expected}' was requested")]
    LevelMismatch { expected: String, found: String },
}

/// Why generated retest output could not become a question list.
#[derive(Debug, Error)]
pub enum RetestParseError {
    /// The text was not valid JSON, or not an array of objects.
    #[error("retest output is not a JSON array of objects: {0}")]
    Malformed(String),

    /// An object was missing `q`, `a` or `h`, or one of them was blank.
    #[error("retest item {index} is missing a non-empty '{field}' field")]
    MissingField { index: usize, field: &'static str },

    /// The array held no questions at all.
    #[error("retest output contained no questions")]
    Empty,
}

/// A remediation phase that did not produce its artifact.
#[derive(Debug, Error)]
pub enum RemediationError {
    /// The generation service call failed.
    #[error("generation failed: {0:#}")]
    Generation(anyhow::Error),

    /// The retest response could not be parsed.
    #[error(transparent)]
    Retest(#[from] RetestParseError),

    /// The generated document could not be stored.
    #[error("failed to save {kind}: {source:#}")]
    Persist {
        kind: &'static str,
        source: anyhow::Error,
    },
}

impl RemediationError {
    /// The underlying provider failure, if the generation call produced one.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            RemediationError::Generation(e) => e.downcast_ref::<ProviderError>(),
            _ => None,
        }
    }

    /// `true` when retrying later cannot help: the credential or model is wrong.
    pub fn is_configuration(&self) -> bool {
        self.provider_error().is_some_and(ProviderError::is_configuration)
    }
}
