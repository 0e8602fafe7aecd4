//! Convenience re-exports for common `promptfold` types.
//!
//! ```ignore
//! use promptfold::prelude::*;
//! ```
//!
//! Pulls in the assembler, summarizer, tokenizers, the model boundary and
//! the error type. Lower-level helpers (chunking, eviction, retry) are left
//! in their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{Message, MessageMetadata, MessageRole, OpenRouterClient, json_schema_for};

// ── Prompt assembly ─────────────────────────────────────────────────
pub use crate::prompt::{
    AssembledPrompt, AssemblerConfig, AssemblyReport, InstructionSet, PromptAssembler, TurnInput,
};

// ── Context and summarization ───────────────────────────────────────
pub use crate::context::{
    CharRatioTokenizer, ChunkedSummarizer, EvictionOrder, FnTokenizer, SummarizerConfig,
    SummaryMode, SummaryStrategy, Tokenizer,
};

// ── Model boundary ──────────────────────────────────────────────────
pub use crate::api::{CompletionFuture, CompletionRequest, LanguageModel, LlmError, RetryConfig};

// ── Tools and errors ────────────────────────────────────────────────
pub use crate::error::{ConfigError, Error, Result};
pub use crate::tools::ToolSpec;
