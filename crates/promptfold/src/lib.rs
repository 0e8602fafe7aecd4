//! Token-budgeted prompt assembly and chunked summarization for coding agents.
//!
//! `promptfold` sits between an agent loop and its language model. It does
//! two things:
//!
//! - **Assemble** each turn's prompt under a hard token budget. The
//!   [`PromptAssembler`](prompt::PromptAssembler) renders static
//!   instructions, goals and the tool catalogue, then fills the remaining
//!   space with the most recent code of every file the agent has written,
//!   evicting whole files until the prompt fits. The step record and user
//!   input are never dropped.
//!
//! - **Summarize** long command output or step history into a bounded
//!   summary. The [`ChunkedSummarizer`](context::ChunkedSummarizer) splits
//!   the text into token-bounded chunks, summarizes them (map-reduce or
//!   refine), and re-combines until the result fits a token ceiling.
//!
//! ```ignore
//! use promptfold::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let tokenizer: Arc<dyn Tokenizer> = Arc::new(CharRatioTokenizer::default());
//!     let assembler = PromptAssembler::new(
//!         tokenizer.clone(),
//!         InstructionSet::new("You are a seasoned full stack developer."),
//!     );
//!     let prompt = assembler.assemble(&[], &[], &[], "start", 4096)?;
//!     println!("{}", prompt.report.total_tokens);
//!
//!     let key = std::env::var("OPENROUTER_KEY").unwrap();
//!     let model: Arc<dyn LanguageModel> = Arc::new(OpenRouterClient::new(key).unwrap());
//!     let summarizer = ChunkedSummarizer::new(model, tokenizer, SummarizerConfig::default());
//!     let summary = summarizer
//!         .summarize("npm test output...", SummaryMode::CommandOutput, 1000, 300)
//!         .await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`prompt`] | [`PromptAssembler`](prompt::PromptAssembler), instruction sections, tool catalogue, turn files |
//! | [`context`] | Tokenizers, budgets, code context and eviction, chunking, [`ChunkedSummarizer`](context::ChunkedSummarizer) |
//! | [`api`] | [`LanguageModel`](api::LanguageModel) boundary and retry |
//! | [`tools`] | [`ToolSpec`](tools::ToolSpec) command descriptions |
//! | [`error`] | [`Error`](error::Error) taxonomy |

pub mod api;
pub mod context;
pub mod error;
pub mod prelude;
pub mod prompt;
pub mod tools;

use api::model::{CompletionFuture, CompletionRequest, LanguageModel, LlmError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// Re-export schemars for downstream crates.
pub use schemars;

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// # Example
///
/// ```
/// use promptfold::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct CliArgs {
///     commands: String,
///     #[serde(default)]
///     cwd: Option<String>,
/// }
///
/// let schema = json_schema_for::<CliArgs>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"commands".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the transcript.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Structured data the agent loop attaches to a system message.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageMetadata {
    /// Full text of a file written or read during the step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Path of that file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Human-readable status of the completed step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

/// A message in the transcript.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(content.into()),
            metadata: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
            metadata: None,
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(content.into()),
            metadata: None,
        }
    }

    /// Attach the current contents of a file.
    pub fn with_code(mut self, file_path: impl Into<String>, code: impl Into<String>) -> Self {
        let meta = self.metadata.get_or_insert_with(MessageMetadata::default);
        meta.file_path = Some(file_path.into());
        meta.code = Some(code.into());
        self
    }

    /// Attach the step record.
    pub fn with_step(mut self, metadata: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(MessageMetadata::default)
            .metadata = Some(metadata.into());
        self
    }
}

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Unused optional fields are omitted from
/// serialization.
#[derive(Serialize, Debug, Default)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

// ── Response types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from `OpenRouterClient::chat()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the OpenRouter chat completions API.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    /// Create a new client with the given API key and default headers.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_headers(api_key, "https://github.com/promptfold", "promptfold")
    }

    /// Create a new client with custom Referer and X-Title headers.
    pub fn with_headers(
        api_key: impl Into<String>,
        referer: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .user_agent("promptfold/0.1")
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            referer: referer.into(),
            title: title.into(),
        })
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, LlmError> {
        debug!(
            "LLM request: model={}, messages={}, max_tokens={}, temp={:?}",
            body.model.as_deref().unwrap_or("(none)"),
            body.messages.len(),
            body.max_tokens,
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(OPENROUTER_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(body)
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        let text = resp.text().await.map_err(request_error)?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        parse_completion(status.as_u16(), &text)
    }
}

impl LanguageModel for OpenRouterClient {
    fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_> {
        Box::pin(async move {
            let body = ChatRequest {
                model: Some(request.model),
                messages: vec![Message::user(request.prompt)],
                max_tokens: request.max_tokens,
                temperature: Some(request.temperature),
            };
            self.chat(&body)
                .await?
                .content
                .ok_or(LlmError::EmptyResponse)
        })
    }
}

fn request_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Request(e.to_string())
    }
}

/// Turn an HTTP status and body into a completion or a typed error.
fn parse_completion(status: u16, text: &str) -> Result<ChatCompletion, LlmError> {
    if !(200..300).contains(&status) {
        return Err(LlmError::Http {
            status,
            body: text.to_string(),
        });
    }

    let parsed: RawChatResponse =
        serde_json::from_str(text).map_err(|e| LlmError::Malformed(e.to_string()))?;

    if let Some(err) = parsed.error {
        return Err(LlmError::Api(err.message));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    let choice = parsed.choices.and_then(|c| c.into_iter().next());
    match choice {
        Some(c) => {
            debug!(
                "LLM output: {} chars",
                c.message.content.as_ref().map_or(0, |s| s.len())
            );
            Ok(ChatCompletion {
                content: c.message.content,
                usage: parsed.usage,
                finish_reason: c.finish_reason,
            })
        }
        None => {
            debug!("LLM output: empty (no choices)");
            Ok(ChatCompletion {
                content: None,
                usage: parsed.usage,
                finish_reason: None,
            })
        }
    }
}
