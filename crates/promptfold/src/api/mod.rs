//! Model boundary: the [`LanguageModel`] trait, its error type, and retry.
//!
//! - [`model`]: [`LanguageModel`] / [`CompletionRequest`] / [`LlmError`].
//!   [`OpenRouterClient`](crate::OpenRouterClient) implements the trait over
//!   HTTP; tests implement it in memory.
//! - [`retry`]: transient error retry with configurable exponential backoff
//!   and jitter. Never retries 4xx errors.

pub mod model;
pub mod retry;

pub use model::{CompletionFuture, CompletionRequest, LanguageModel, LlmError};
pub use retry::RetryConfig;
