//! TDD agent configuration with sensible defaults.
//!
//! [`TddConfig`] captures the settings the React TDD agent needs and turns
//! them into promptfold types via [`build_assembler`](TddConfig::build_assembler)
//! and [`build_summarizer`](TddConfig::build_summarizer).

use std::path::PathBuf;
use std::sync::Arc;

use promptfold::api::LanguageModel;
use promptfold::context::{
    ChunkedSummarizer, EvictionOrder, SummarizerConfig, SummaryMode, Tokenizer,
};
use promptfold::error::Result;
use promptfold::prompt::{AssemblerConfig, InstructionSet, PromptAssembler};
use tracing::debug;

use crate::profile::tdd_instructions;

/// Configuration for one TDD agent session.
#[derive(Debug, Clone)]
pub struct TddConfig {
    /// Model identifier. Default: `"openai/gpt-3.5-turbo-16k"`.
    pub model: String,
    /// Token budget of each assembled prompt. Default: `4096`.
    pub send_token_limit: usize,
    /// Maximum tokens per summarized chunk. Default: `1000`.
    pub chunk_size: usize,
    /// Maximum tokens of a step-log summary. Default: `4000`.
    pub token_ceiling: usize,
    /// Sampling temperature. Default: `0.0`.
    pub temperature: f32,
    /// Directory new React apps are created in. Default: `"."`.
    pub output_dir: PathBuf,
    pub eviction_order: EvictionOrder,
}

impl Default for TddConfig {
    fn default() -> Self {
        Self {
            model: promptfold::context::summarizer::DEFAULT_SUMMARY_MODEL.to_string(),
            send_token_limit: 4096,
            chunk_size: 1000,
            token_ceiling: 4000,
            temperature: 0.0,
            output_dir: PathBuf::from("."),
            eviction_order: EvictionOrder::default(),
        }
    }
}

impl TddConfig {
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_send_token_limit(mut self, limit: usize) -> Self {
        self.send_token_limit = limit;
        self
    }

    /// The instruction set, with `output_dir` made absolute.
    pub fn build_instructions(&self) -> Result<InstructionSet> {
        let dir = std::path::absolute(&self.output_dir).unwrap_or_else(|_| self.output_dir.clone());
        debug!("TDD apps will be created in {}", dir.display());
        Ok(tdd_instructions(&dir)?)
    }

    pub fn build_assembler(&self, tokenizer: Arc<dyn Tokenizer>) -> Result<PromptAssembler> {
        let instructions = self.build_instructions()?;
        Ok(PromptAssembler::new(tokenizer, instructions)
            .with_config(AssemblerConfig::default().with_eviction_order(self.eviction_order)))
    }

    pub fn build_summarizer(
        &self,
        model: Arc<dyn LanguageModel>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> ChunkedSummarizer {
        let config = SummarizerConfig::new(self.model.clone()).with_temperature(self.temperature);
        ChunkedSummarizer::new(model, tokenizer, config)
    }

    /// Summarize the agent's step log with this session's limits.
    pub async fn summarize_steps(&self, summarizer: &ChunkedSummarizer, log: &str) -> Result<String> {
        summarizer
            .summarize(log, SummaryMode::StepLog, self.chunk_size, self.token_ceiling)
            .await
    }
}
