//! Mock provider for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use linquiz_core::error::ProviderError;
use linquiz_core::traits::{GenerateRequest, GenerateResponse, TextGenerator, TokenUsage};

enum Reply {
    Text(String),
    Fail(String),
}

/// A mock text generator for exercising the remediation pipeline without
/// real API calls.
///
/// Replies are chosen by prompt substring, checked in insertion order.
pub struct MockProvider {
    /// Prompt substring → reply.
    replies: Vec<(String, Reply)>,
    /// Reply if no prompt matches.
    default_reply: Reply,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Every request received, oldest first.
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockProvider {
    /// Create a mock that always returns the same text.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            replies: Vec::new(),
            default_reply: Reply::Text(response.to_string()),
            call_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock whose every call fails with a network error.
    pub fn failing(message: &str) -> Self {
        Self {
            replies: Vec::new(),
            default_reply: Reply::Fail(message.to_string()),
            call_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `response` when the prompt contains `needle`.
    pub fn respond_to(mut self, needle: &str, response: &str) -> Self {
        self.replies
            .push((needle.to_string(), Reply::Text(response.to_string())));
        self
    }

    /// Fail with a network error when the prompt contains `needle`.
    pub fn fail_on(mut self, needle: &str, message: &str) -> Self {
        self.replies
            .push((needle.to_string(), Reply::Fail(message.to_string())));
        self
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get every request made to this provider.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let reply = self
            .replies
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.default_reply);

        let content = match reply {
            Reply::Text(text) => text.clone(),
            Reply::Fail(message) => {
                return Err(ProviderError::NetworkError(message.clone()).into());
            }
        };

        Ok(GenerateResponse {
            token_usage: TokenUsage {
                input_tokens: (request.prompt.len() / 4) as u32,
                output_tokens: (content.len() / 4) as u32,
            },
            content,
            model: request.model.clone(),
            latency_ms: 1,
        })
    }
}
