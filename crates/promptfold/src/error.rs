//! Error taxonomy for prompt assembly and summarization.
//!
//! Every failure surfaces to the caller through [`Error`]. The only local
//! recovery the crate performs is evicting optional code context and
//! re-summarizing over-budget combines; neither is reported as an error.

use crate::api::model::LlmError;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration or caller input (unknown mode, bad schema, zero limits).
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The mandatory part of the prompt does not fit the token budget.
    ///
    /// Raised instead of silently truncating instructions, goals, the tool
    /// catalogue, the step record, or the user input.
    #[error(
        "prompt budget exceeded: mandatory content needs {mandatory} tokens but the budget is {budget}"
    )]
    BudgetExceeded { mandatory: usize, budget: usize },

    /// The injected length function failed.
    #[error(transparent)]
    Tokenization(#[from] TokenizationError),

    /// A language-model call made on behalf of the summarizer failed.
    #[error("summarization failed during {stage}: {source}")]
    Summarization {
        stage: SummaryStage,
        #[source]
        source: LlmError,
    },

    /// The caller cancelled a summarization before it finished.
    #[error("summarization cancelled")]
    Cancelled,
}

/// Configuration problems detected before any work is done.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid summary mode '{0}' (expected 'command-output' or 'step-log')")]
    InvalidMode(String),

    #[error("invalid summary strategy '{0}' (expected 'map-reduce' or 'refine')")]
    InvalidStrategy(String),

    #[error(
        "invalid eviction order '{0}' (expected 'insertion-order', 'least-recent-first' or 'largest-first')"
    )]
    InvalidEvictionOrder(String),

    #[error("tool '{tool}' has an invalid argument schema: {reason}")]
    InvalidToolSchema { tool: String, reason: String },

    #[error("response format could not be rendered as JSON: {0}")]
    InvalidResponseFormat(String),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}

/// Failure reported by a [`Tokenizer`](crate::context::tokens::Tokenizer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tokenization failed: {0}")]
pub struct TokenizationError(pub String);

impl TokenizationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Which part of the summarization protocol a model call belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStage {
    /// Per-chunk summary (map stage), with the chunk index.
    Map { chunk: usize },
    /// Running-summary update (refine strategy), with the chunk index.
    Refine { chunk: usize },
    /// Re-summarizing a group of summaries that exceeded the ceiling.
    Collapse { round: usize },
    /// The final combine pass.
    Combine,
}

impl std::fmt::Display for SummaryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryStage::Map { chunk } => write!(f, "map of chunk {chunk}"),
            SummaryStage::Refine { chunk } => write!(f, "refine with chunk {chunk}"),
            SummaryStage::Collapse { round } => write!(f, "collapse round {round}"),
            SummaryStage::Combine => write!(f, "final combine"),
        }
    }
}
