//! The language-model boundary.
//!
//! [`LanguageModel`] is the only way the summarizer talks to a model. The
//! handle is passed in explicitly at construction so tests can substitute an
//! in-memory double and production code can share one HTTP client across
//! summarizers.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`LanguageModel::complete`].
pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;

/// A single-prompt completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Full prompt text. Sent as one user message by chat-style backends.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Model identifier understood by the backend.
    pub model: String,
    /// Upper bound on the response length.
    pub max_tokens: u32,
}

/// An opaque, possibly slow, possibly failing completion endpoint.
///
/// # Example
///
/// ```
/// use promptfold::api::model::{CompletionFuture, CompletionRequest, LanguageModel};
///
/// struct Echo;
///
/// impl LanguageModel for Echo {
///     fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_> {
///         Box::pin(async move { Ok(request.prompt) })
///     }
/// }
/// ```
pub trait LanguageModel: Send + Sync {
    fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_>;
}

/// Errors returned by a [`LanguageModel`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    /// Non-success HTTP status from the endpoint.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (connection reset, DNS, TLS...).
    #[error("request failed: {0}")]
    Request(String),

    /// The call exceeded the configured per-call timeout.
    #[error("model call timed out")]
    Timeout,

    /// The response body could not be parsed.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The endpoint reported an error inside a successful response.
    #[error("API error: {0}")]
    Api(String),

    /// The model returned no text (or only whitespace).
    #[error("empty response")]
    EmptyResponse,
}

impl LlmError {
    /// Whether retrying the same request might succeed.
    ///
    /// Rate limits, 5xx responses, timeouts and transport failures are
    /// transient. 4xx client errors and malformed or empty output are not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            LlmError::Request(_) | LlmError::Timeout => true,
            LlmError::Malformed(_) | LlmError::Api(_) | LlmError::EmptyResponse => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_gateway_errors_are_transient() {
        for status in [429, 500, 502, 503, 504] {
            let err = LlmError::Http {
                status,
                body: String::new(),
            };
            assert!(err.is_transient(), "status {status} should be transient");
        }
    }

    #[test]
    fn client_errors_are_permanent() {
        for status in [400, 401, 403, 404, 422] {
            let err = LlmError::Http {
                status,
                body: String::new(),
            };
            assert!(!err.is_transient(), "status {status} should be permanent");
        }
        assert!(!LlmError::EmptyResponse.is_transient());
        assert!(!LlmError::Malformed("eof".into()).is_transient());
    }

    #[test]
    fn transport_failures_are_transient() {
        assert!(LlmError::Request("connection reset".into()).is_transient());
        assert!(LlmError::Timeout.is_transient());
    }
}
