//! Token accounting, transcript-derived context, and summarization.
//!
//! 1. **[`tokens`]**: the injected [`Tokenizer`] length function and the
//!    [`CharRatioTokenizer`] heuristic.
//!
//! 2. **[`budget`]**: [`TokenBudget`] ceiling and [`BudgetUsage`] snapshots.
//!
//! 3. **[`code_context`]**: [`CodeContextMap`] and [`StepRecord`], derived by
//!    scanning the transcript newest to oldest.
//!
//! 4. **[`eviction`]**: drops whole code-context entries until they fit,
//!    in the order chosen by [`EvictionOrder`].
//!
//! 5. **[`chunking`]**: lossless token-bounded splitting and trimming.
//!
//! 6. **[`summarizer`]**: [`ChunkedSummarizer`], map-reduce or refine under a
//!    token ceiling, with per-mode templates from [`summary_prompts`].

pub mod budget;
pub mod chunking;
pub mod code_context;
pub mod eviction;
pub mod summarizer;
pub mod summary_prompts;
pub mod tokens;

pub use budget::{BudgetUsage, TokenBudget};
pub use code_context::{CodeContextMap, NONE_PLACEHOLDER, StepRecord};
pub use eviction::{EvictionOrder, EvictionReport};
pub use summarizer::{ChunkedSummarizer, SummarizerConfig};
pub use summary_prompts::{SummaryMode, SummaryStrategy};
pub use tokens::{CharRatioTokenizer, DEFAULT_CHARS_PER_TOKEN, FnTokenizer, Tokenizer};
