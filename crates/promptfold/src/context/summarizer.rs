//! Chunked summarization under a token ceiling.
//!
//! [`ChunkedSummarizer`] folds an arbitrarily long text into one summary of
//! at most `token_ceiling` tokens:
//!
//! 1. Split into chunks of at most `chunk_size` tokens
//!    ([`split_into_chunks`]).
//! 2. Summarize the chunks. [`SummaryStrategy::MapReduce`] summarizes each
//!    chunk independently, up to `max_concurrency` calls in flight, results
//!    kept in chunk order. [`SummaryStrategy::Refine`] carries one running
//!    summary through the chunks sequentially.
//! 3. While the joined summaries exceed the ceiling, pack them greedily into
//!    groups that fit and collapse each group with the combine template.
//! 4. Map-reduce finishes with one combine pass over what is left.
//!
//! If the model keeps overshooting after `max_collapse_rounds`, the result is
//! trimmed to the ceiling and a warning is logged.

use crate::api::model::{CompletionRequest, LanguageModel, LlmError};
use crate::api::retry::{RetryConfig, retry_call};
use crate::context::chunking::{split_into_chunks, truncate_to_tokens};
use crate::context::summary_prompts::{SummaryMode, SummaryStrategy};
use crate::context::tokens::Tokenizer;
use crate::error::{ConfigError, Error, Result, SummaryStage};
use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Model used for summarization when none is configured.
pub const DEFAULT_SUMMARY_MODEL: &str = "openai/gpt-3.5-turbo-16k";

/// Configuration for [`ChunkedSummarizer`].
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Model identifier passed to the [`LanguageModel`].
    pub model: String,
    /// Sampling temperature. Summaries should be reproducible, so 0.
    pub temperature: f32,
    /// Upper bound on the length of any single model response.
    pub max_summary_tokens: u32,
    pub strategy: SummaryStrategy,
    /// Parallel model calls during the map and collapse stages.
    pub max_concurrency: usize,
    /// Collapse rounds before falling back to trimming.
    pub max_collapse_rounds: usize,
    /// Per-call timeout. `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
    pub retry: RetryConfig,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_SUMMARY_MODEL.to_string(),
            temperature: 0.0,
            max_summary_tokens: 2048,
            strategy: SummaryStrategy::default(),
            max_concurrency: 4,
            max_collapse_rounds: 5,
            call_timeout: None,
            retry: RetryConfig::default(),
        }
    }
}

impl SummarizerConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_summary_tokens(mut self, tokens: u32) -> Self {
        self.max_summary_tokens = tokens;
        self
    }

    pub fn with_strategy(mut self, strategy: SummaryStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    pub fn with_max_collapse_rounds(mut self, rounds: usize) -> Self {
        self.max_collapse_rounds = rounds;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Reduces long texts to bounded summaries through a [`LanguageModel`].
///
/// Holds no per-call state; one instance can serve concurrent summaries.
pub struct ChunkedSummarizer {
    model: Arc<dyn LanguageModel>,
    tokenizer: Arc<dyn Tokenizer>,
    config: SummarizerConfig,
}

impl ChunkedSummarizer {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        tokenizer: Arc<dyn Tokenizer>,
        config: SummarizerConfig,
    ) -> Self {
        Self {
            model,
            tokenizer,
            config,
        }
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// Summarize `text` into at most `token_ceiling` tokens.
    ///
    /// Text that is empty or only whitespace yields `""` without a model call.
    pub async fn summarize(
        &self,
        text: &str,
        mode: SummaryMode,
        chunk_size: usize,
        token_ceiling: usize,
    ) -> Result<String> {
        self.summarize_with_cancel(text, mode, chunk_size, token_ceiling, &CancellationToken::new())
            .await
    }

    /// Like [`summarize`](Self::summarize), aborting with
    /// [`Error::Cancelled`] as soon as `cancel` fires.
    pub async fn summarize_with_cancel(
        &self,
        text: &str,
        mode: SummaryMode,
        chunk_size: usize,
        token_ceiling: usize,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if chunk_size == 0 {
            return Err(ConfigError::ZeroLimit("chunk_size").into());
        }
        if token_ceiling == 0 {
            return Err(ConfigError::ZeroLimit("token_ceiling").into());
        }
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let chunks = split_into_chunks(text, chunk_size, self.tokenizer.as_ref())?;
        info!(
            "Summarizing {} chunk(s) as {mode} ({}, ceiling {token_ceiling})",
            chunks.len(),
            self.config.strategy,
        );

        let max_tokens = self.response_limit(token_ceiling);
        let summaries = match self.config.strategy {
            SummaryStrategy::MapReduce => {
                let calls = chunks
                    .iter()
                    .enumerate()
                    .map(|(chunk, text)| (mode.chunk_prompt(text), SummaryStage::Map { chunk }))
                    .collect();
                self.call_ordered(calls, max_tokens, cancel).await?
            }
            SummaryStrategy::Refine => {
                vec![self.refine(&chunks, mode, max_tokens, cancel).await?]
            }
        };

        let summaries = self.collapse(summaries, mode, token_ceiling, cancel).await?;

        let summary = match (self.config.strategy, summaries.as_slice()) {
            (SummaryStrategy::Refine, [single]) => single.clone(),
            _ => {
                self.call(
                    mode.combine_prompt(&summaries),
                    SummaryStage::Combine,
                    max_tokens,
                    cancel,
                )
                .await?
            }
        };

        self.enforce_ceiling(summary, token_ceiling)
    }

    /// Sequential running-summary pass over all chunks.
    async fn refine(
        &self,
        chunks: &[String],
        mode: SummaryMode,
        max_tokens: u32,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let mut summary = String::new();
        for (chunk, text) in chunks.iter().enumerate() {
            let prompt = if chunk == 0 {
                mode.chunk_prompt(text)
            } else {
                mode.refine_prompt(&summary, text)
            };
            summary = self
                .call(prompt, SummaryStage::Refine { chunk }, max_tokens, cancel)
                .await?;
            debug!("Refined summary with chunk {chunk}");
        }
        Ok(summary)
    }

    /// Collapse summaries until their joined form fits `ceiling`.
    async fn collapse(
        &self,
        mut summaries: Vec<String>,
        mode: SummaryMode,
        ceiling: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let max_tokens = self.response_limit(ceiling);
        let mut round = 0;

        while self.joined_tokens(&summaries)? > ceiling {
            if round >= self.config.max_collapse_rounds {
                warn!(
                    "Summaries still exceed the {ceiling}-token ceiling after {round} collapse round(s)"
                );
                break;
            }
            round += 1;

            let groups = self.group_to_fit(summaries, ceiling)?;
            debug!("Collapse round {round}: {} group(s)", groups.len());
            let calls = groups
                .iter()
                .map(|group| (mode.combine_prompt(group), SummaryStage::Collapse { round }))
                .collect();
            summaries = self.call_ordered(calls, max_tokens, cancel).await?;
        }

        Ok(summaries)
    }

    /// Pack consecutive summaries into groups whose joined form fits `ceiling`.
    ///
    /// A summary that alone exceeds the ceiling forms its own group and is
    /// re-summarized by itself.
    fn group_to_fit(&self, summaries: Vec<String>, ceiling: usize) -> Result<Vec<Vec<String>>> {
        let mut groups = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for summary in summaries {
            current.push(summary);
            if current.len() > 1 && self.joined_tokens(&current)? > ceiling {
                let overflow = current.pop();
                groups.push(std::mem::take(&mut current));
                current.extend(overflow);
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }
        Ok(groups)
    }

    fn joined_tokens(&self, summaries: &[String]) -> Result<usize> {
        Ok(self.tokenizer.count_tokens(&summaries.join("\n\n"))?)
    }

    fn response_limit(&self, ceiling: usize) -> u32 {
        let ceiling = u32::try_from(ceiling).unwrap_or(u32::MAX);
        self.config.max_summary_tokens.min(ceiling)
    }

    fn enforce_ceiling(&self, summary: String, ceiling: usize) -> Result<String> {
        let tokens = self.tokenizer.count_tokens(&summary)?;
        if tokens <= ceiling {
            return Ok(summary);
        }
        warn!("Summary is {tokens} tokens, trimming to the {ceiling}-token ceiling");
        Ok(truncate_to_tokens(&summary, ceiling, self.tokenizer.as_ref())?)
    }

    /// Run independent calls with bounded concurrency, results in input order.
    ///
    /// The first failure drops the calls still in flight.
    async fn call_ordered(
        &self,
        calls: Vec<(String, SummaryStage)>,
        max_tokens: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        stream::iter(calls)
            .map(|(prompt, stage)| self.call(prompt, stage, max_tokens, cancel))
            .buffered(self.config.max_concurrency.max(1))
            .try_collect()
            .await
    }

    /// One model call with retry, timeout, blank-output check, and cancellation.
    async fn call(
        &self,
        prompt: String,
        stage: SummaryStage,
        max_tokens: u32,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let request = CompletionRequest {
            prompt,
            temperature: self.config.temperature,
            model: self.config.model.clone(),
            max_tokens,
        };

        let attempt = retry_call(&self.config.retry, || {
            let request = request.clone();
            async move {
                let completion = self.model.complete(request);
                let text = match self.config.call_timeout {
                    Some(limit) => tokio::time::timeout(limit, completion)
                        .await
                        .map_err(|_| LlmError::Timeout)??,
                    None => completion.await?,
                };
                let text = text.trim();
                if text.is_empty() {
                    return Err(LlmError::EmptyResponse);
                }
                Ok(text.to_string())
            }
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = attempt => result.map_err(|source| Error::Summarization { stage, source }),
        }
    }
}
