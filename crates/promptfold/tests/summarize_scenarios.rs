//! End-to-end summarization scenarios against in-memory models.

use std::future::pending;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use proptest::prelude::*;
use promptfold::context::DEFAULT_CHARS_PER_TOKEN;
use promptfold::error::SummaryStage;
use promptfold::prelude::*;
use tokio_util::sync::CancellationToken;

/// The text between a template's delimiters, or the whole prompt.
fn payload(prompt: &str) -> &str {
    for (open, close) in [
        ("<output>\n", "\n</output>"),
        ("<summaries>\n", "\n</summaries>"),
        ("------------\n", "\n------------"),
    ] {
        if let Some((_, rest)) = prompt.split_once(open)
            && let Some((body, _)) = rest.split_once(close)
        {
            return body;
        }
    }
    prompt
}

/// Pretends to be a careful summarizer of npm output: reports the failing
/// test location if the output or an earlier summary mentions one.
struct NpmLogModel {
    calls: AtomicUsize,
}

impl NpmLogModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

impl LanguageModel for NpmLogModel {
    fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request.prompt;
        Box::pin(async move {
            if let Some(line) = prompt.lines().find(|l| l.starts_with("The cli command was failed")) {
                return Ok(line.to_string());
            }
            Ok(match prompt.lines().find(|l| l.contains(".test.js:")) {
                Some(at) => format!("The cli command was failed {}", at.trim()),
                None => "The cli command was successful with all listed tests passing".to_string(),
            })
        })
    }
}

/// Echoes the first `n` words of its payload, often more than the ceiling.
struct EchoModel(usize);

impl LanguageModel for EchoModel {
    fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_> {
        let reply = payload(&request.prompt)
            .split_whitespace()
            .take(self.0)
            .collect::<Vec<_>>()
            .join(" ");
        Box::pin(async move { Ok(reply) })
    }
}

/// Never answers.
struct HangingModel;

impl LanguageModel for HangingModel {
    fn complete(&self, _request: CompletionRequest) -> CompletionFuture<'_> {
        Box::pin(pending())
    }
}

fn tokenizer() -> Arc<dyn Tokenizer> {
    Arc::new(CharRatioTokenizer::default())
}

/// About `tokens` tokens of passing jest output with one failure in the middle.
fn npm_test_log(tokens: usize) -> String {
    let target_chars = (tokens as f64 * DEFAULT_CHARS_PER_TOKEN) as usize;
    let mut log = String::from("> todo-app@0.1.0 test\n> react-scripts test --watchAll=false\n\n");
    let mut i = 0;
    let mut failure_written = false;
    while log.chars().count() < target_chars {
        if !failure_written && log.len() > target_chars / 2 {
            log.push_str(
                " FAIL  src/App.test.js\n\
                 \x20 ● App › adds a todo when the form is submitted\n\n\
                 \x20   TestingLibraryElementError: Unable to find an element with the text: Buy milk\n\n\
                 \x20     40 |   fireEvent.click(screen.getByText('Add'));\n\
                 \x20   > 42 |   expect(screen.getByText('Buy milk')).toBeInTheDocument();\n\n\
                 \x20     at Object.<anonymous> (src/App.test.js:42:18)\n\n",
            );
            failure_written = true;
        }
        log.push_str(&format!(
            " PASS  src/tests/TodoItem{i}.test.js\n  ✓ renders todo item {i} (3 ms)\n\n"
        ));
        i += 1;
    }
    log.push_str("Tests:       1 failed, many passed\n");
    log
}

// ── Scenarios ────────────────────────────────────────────────────────

#[tokio::test]
async fn npm_failure_log_is_reduced_under_the_ceiling() {
    let model = NpmLogModel::new();
    let tok = tokenizer();
    let summarizer = ChunkedSummarizer::new(model.clone(), tok.clone(), SummarizerConfig::default());

    let log = npm_test_log(5_000);
    assert!(tok.count_tokens(&log).unwrap() >= 5_000);

    let summary = summarizer
        .summarize(&log, SummaryMode::CommandOutput, 1_000, 300)
        .await
        .unwrap();

    assert!(tok.count_tokens(&summary).unwrap() <= 300);
    assert!(summary.contains("failed"), "{summary}");
    assert!(summary.contains("src/App.test.js:42"), "{summary}");
    // At least five map calls plus the final combine.
    assert!(model.calls.load(Ordering::SeqCst) >= 6);
}

#[tokio::test]
async fn refine_strategy_carries_the_failure_forward() {
    let model = NpmLogModel::new();
    let summarizer = ChunkedSummarizer::new(
        model.clone(),
        tokenizer(),
        SummarizerConfig::default().with_strategy(SummaryStrategy::Refine),
    );
    let summary = summarizer
        .summarize(&npm_test_log(3_000), SummaryMode::CommandOutput, 1_000, 300)
        .await
        .unwrap();
    assert!(summary.contains("src/App.test.js:42"), "{summary}");
}

#[test]
fn unknown_mode_is_a_configuration_error() {
    let err: Error = "foo".parse::<SummaryMode>().unwrap_err().into();
    assert!(matches!(
        err,
        Error::Configuration(ConfigError::InvalidMode(ref m)) if m == "foo"
    ));
}

#[tokio::test]
async fn cancellation_stops_in_flight_calls() {
    let summarizer = ChunkedSummarizer::new(
        Arc::new(HangingModel),
        tokenizer(),
        SummarizerConfig::default(),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = summarizer
        .summarize_with_cancel(&npm_test_log(2_000), SummaryMode::StepLog, 500, 300, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn slow_model_calls_time_out() {
    let summarizer = ChunkedSummarizer::new(
        Arc::new(HangingModel),
        tokenizer(),
        SummarizerConfig::default().with_call_timeout(Duration::from_millis(20)),
    );
    let err = summarizer
        .summarize("npm test", SummaryMode::CommandOutput, 100, 100)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Summarization {
            stage: SummaryStage::Map { chunk: 0 },
            source: LlmError::Timeout,
        }
    ));
}

// ── Properties ───────────────────────────────────────────────────────

fn words_text(tokens: usize) -> String {
    let target_chars = (tokens as f64 * DEFAULT_CHARS_PER_TOKEN) as usize;
    let mut text = String::with_capacity(target_chars + 16);
    let mut i = 0usize;
    while text.len() < target_chars {
        text.push_str(&format!("line{i} ok"));
        text.push(if i % 7 == 6 { '\n' } else { ' ' });
        i += 1;
    }
    text
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn summary_never_exceeds_ceiling(
        input_tokens in prop::sample::select(vec![10usize, 1_000, 100_000]),
        ceiling in 5usize..400,
        reply_words in 1usize..200,
        refine in any::<bool>(),
    ) {
        let strategy = if refine { SummaryStrategy::Refine } else { SummaryStrategy::MapReduce };
        let summarizer = ChunkedSummarizer::new(
            Arc::new(EchoModel(reply_words)),
            tokenizer(),
            SummarizerConfig::default().with_strategy(strategy).with_max_concurrency(8),
        );
        let text = words_text(input_tokens);
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let summary = runtime
            .block_on(summarizer.summarize(&text, SummaryMode::StepLog, 1_000, ceiling))
            .unwrap();

        prop_assert!(!summary.is_empty());
        prop_assert!(tokenizer().count_tokens(&summary).unwrap() <= ceiling);
    }
}
