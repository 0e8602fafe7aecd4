//! Assemble a budgeted prompt or summarize text from the command line.
//!
//! Summarization reads the API key from the `OPENROUTER_KEY` environment
//! variable. Logs go to stderr; set `RUST_LOG=debug` to see eviction and
//! chunking decisions.
//!
//! # Examples
//!
//! ```sh
//! # Assemble one turn into a 4096-token prompt
//! promptfold assemble --turn turn.json --budget 4096
//!
//! # Same, with custom instructions and a JSON report
//! promptfold assemble --turn turn.json --instructions tdd.json --json
//!
//! # Summarize npm output into at most 300 tokens
//! npm test 2>&1 | promptfold summarize --mode command-output --ceiling 300
//!
//! # Summarize a step log with the refine strategy
//! promptfold summarize --mode step-log --strategy refine --input steps.log
//! ```

use clap::{Parser, Subcommand};
use promptfold::api::RetryConfig;
use promptfold::context::summarizer::DEFAULT_SUMMARY_MODEL;
use promptfold::context::{
    CharRatioTokenizer, ChunkedSummarizer, EvictionOrder, SummarizerConfig, SummaryMode,
    SummaryStrategy, Tokenizer,
};
use promptfold::error::Error;
use promptfold::prompt::{AssemblerConfig, InstructionSet, PromptAssembler, TurnInput};
use promptfold::OpenRouterClient;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "promptfold", version)]
struct Cli {
    /// Characters per token for the built-in token estimator
    #[arg(long, global = true, default_value_t = promptfold::context::DEFAULT_CHARS_PER_TOKEN)]
    chars_per_token: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the system and user messages for one agent turn.
    Assemble {
        /// JSON file with goals, tools, transcript and user_input
        #[arg(long)]
        turn: PathBuf,

        /// JSON file with the static instruction sections
        #[arg(long)]
        instructions: Option<PathBuf>,

        /// Token budget for the whole prompt
        #[arg(long, default_value_t = 4096)]
        budget: usize,

        /// Tokens held back for the model's reply
        #[arg(long, default_value_t = 0)]
        output_reserve: usize,

        /// insertion-order, least-recent-first or largest-first
        #[arg(long, default_value = "insertion-order")]
        eviction_order: String,

        /// Print messages and the token report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize text from a file or stdin under a token ceiling.
    Summarize {
        /// command-output (alias cli) or step-log (alias memory)
        #[arg(long)]
        mode: String,

        /// map-reduce or refine
        #[arg(long, default_value = "map-reduce")]
        strategy: String,

        /// Read input from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,

        /// Maximum tokens per chunk
        #[arg(long, default_value_t = 1000)]
        chunk_size: usize,

        /// Maximum tokens of the final summary
        #[arg(long, default_value_t = 4000)]
        ceiling: usize,

        #[arg(long, default_value = DEFAULT_SUMMARY_MODEL)]
        model: String,

        #[arg(long, default_value_t = 0.0)]
        temperature: f32,

        /// Parallel model calls
        #[arg(long, default_value_t = 4)]
        concurrency: usize,

        /// Retries for transient model errors
        #[arg(long, default_value_t = 0)]
        retries: u32,

        /// Per-call timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_instructions(path: Option<&Path>) -> Result<InstructionSet, String> {
    let Some(path) = path else {
        return Ok(InstructionSet::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid instructions {}: {e}", path.display()))
}

fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            Ok(buf)
        }
    }
}

fn parse<T>(value: &str) -> Result<T, String>
where
    T: std::str::FromStr<Err = promptfold::error::ConfigError>,
{
    value.parse().map_err(|e: promptfold::error::ConfigError| Error::from(e).to_string())
}

async fn run(cli: Cli) -> Result<String, String> {
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(CharRatioTokenizer::new(cli.chars_per_token));

    match cli.command {
        Command::Assemble {
            turn,
            instructions,
            budget,
            output_reserve,
            eviction_order,
            json,
        } => {
            let order: EvictionOrder = parse(&eviction_order)?;
            let turn = TurnInput::from_path(&turn)?;
            let instructions = load_instructions(instructions.as_deref())?;

            let assembler = PromptAssembler::new(tokenizer, instructions).with_config(
                AssemblerConfig::default()
                    .with_eviction_order(order)
                    .with_output_reserve(output_reserve),
            );
            let prompt = assembler
                .assemble(
                    &turn.goals,
                    &turn.tools,
                    &turn.transcript,
                    &turn.user_input,
                    budget,
                )
                .map_err(|e| e.to_string())?;

            info!(
                "Assembled {} of {} tokens ({} file(s) kept, {} evicted)",
                prompt.report.total_tokens,
                prompt.report.budget,
                prompt.report.retained.len(),
                prompt.report.evicted.len(),
            );

            if json {
                serde_json::to_string_pretty(&prompt).map_err(|e| e.to_string())
            } else {
                Ok(format!(
                    "[system]\n{}\n[user]\n{}\n",
                    prompt.system.content.unwrap_or_default(),
                    prompt.user.content.unwrap_or_default(),
                ))
            }
        }

        Command::Summarize {
            mode,
            strategy,
            input,
            chunk_size,
            ceiling,
            model,
            temperature,
            concurrency,
            retries,
            timeout_secs,
        } => {
            let mode: SummaryMode = parse(&mode)?;
            let strategy: SummaryStrategy = parse(&strategy)?;
            let text = read_input(input.as_deref())?;

            let api_key = std::env::var("OPENROUTER_KEY")
                .map_err(|_| "OPENROUTER_KEY not set".to_string())?;
            let client = OpenRouterClient::new(api_key).map_err(|e| e.to_string())?;

            let mut config = SummarizerConfig::new(model)
                .with_temperature(temperature)
                .with_strategy(strategy)
                .with_max_concurrency(concurrency)
                .with_retry(RetryConfig::with_retries(retries));
            if let Some(secs) = timeout_secs {
                config = config.with_call_timeout(Duration::from_secs(secs));
            }
            let summarizer = ChunkedSummarizer::new(Arc::new(client), tokenizer, config);

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            let summary = summarizer
                .summarize_with_cancel(&text, mode, chunk_size, ceiling, &cancel)
                .await
                .map_err(|e| e.to_string())?;
            Ok(format!("{summary}\n"))
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
