//! Token-budgeted prompt assembly.
//!
//! [`PromptAssembler::assemble`] turns one agent turn into exactly two
//! messages, a system message and a user message, whose combined token
//! count never exceeds the budget:
//!
//! ```text
//! {role}
//!
//! Specifications:
//! {goals}
//!
//! ...instruction sections, Commands, Response Format...
//!
//! Code Context:
//! >>>>
//! {code of retained files, or None}
//! <<<<
//!
//! Last Step:
//! >>>>
//! {step record, or None}
//! <<<<
//! ```
//!
//! Everything except the code context is mandatory. If the mandatory part
//! alone does not fit, assembly fails with [`Error::BudgetExceeded`] rather
//! than truncating instructions or user input.

use crate::context::budget::{TokenBudget, WARNING_THRESHOLD};
use crate::context::code_context::{CodeContextMap, NONE_PLACEHOLDER, StepRecord};
use crate::context::eviction::{EvictionOrder, EvictionReport, evict_code_context};
use crate::context::tokens::Tokenizer;
use crate::error::{Error, Result};
use crate::prompt::builder::PromptBuilder;
use crate::prompt::catalogue::render_catalogue;
use crate::prompt::instructions::InstructionSet;
use crate::tools::ToolSpec;
use crate::Message;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration for [`PromptAssembler`].
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub eviction_order: EvictionOrder,
    /// Rendered for an empty code context or a missing step record.
    pub placeholder: String,
    /// Usage fraction at which a budget-pressure warning is logged.
    pub warning_threshold: f64,
    /// Tokens of the budget held back for the model's reply.
    pub output_reserve: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            eviction_order: EvictionOrder::default(),
            placeholder: NONE_PLACEHOLDER.to_string(),
            warning_threshold: WARNING_THRESHOLD,
            output_reserve: 0,
        }
    }
}

impl AssemblerConfig {
    pub fn with_eviction_order(mut self, order: EvictionOrder) -> Self {
        self.eviction_order = order;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_warning_threshold(mut self, threshold: f64) -> Self {
        self.warning_threshold = threshold;
        self
    }

    pub fn with_output_reserve(mut self, tokens: usize) -> Self {
        self.output_reserve = tokens;
        self
    }
}

/// Token accounting for one assembled turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssemblyReport {
    /// Effective budget after the output reserve.
    pub budget: usize,
    /// Role, goals, instructions, catalogue and response format.
    pub instruction_tokens: usize,
    /// The catalogue section alone (included in `instruction_tokens`).
    pub catalogue_tokens: usize,
    /// Code of the retained files, summed per file.
    pub code_context_tokens: usize,
    pub step_tokens: usize,
    pub user_tokens: usize,
    /// The whole rendered system message.
    pub system_tokens: usize,
    /// `system_tokens + user_tokens`.
    pub total_tokens: usize,
    /// Retained file paths, in rendered order.
    pub retained: Vec<String>,
    /// Evicted file paths, in eviction order.
    pub evicted: Vec<String>,
}

/// The two messages sent to the model, plus how they were sized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledPrompt {
    pub system: Message,
    pub user: Message,
    pub report: AssemblyReport,
}

impl AssembledPrompt {
    /// `[system, user]`, ready for a chat request.
    pub fn into_messages(self) -> Vec<Message> {
        vec![self.system, self.user]
    }
}

/// Builds bounded prompts from the static instructions and the transcript.
///
/// Stateless across calls: transcript-derived state is recomputed on every
/// [`assemble`](Self::assemble).
pub struct PromptAssembler {
    tokenizer: Arc<dyn Tokenizer>,
    instructions: InstructionSet,
    config: AssemblerConfig,
}

impl PromptAssembler {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, instructions: InstructionSet) -> Self {
        Self {
            tokenizer,
            instructions,
            config: AssemblerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AssemblerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub fn instructions(&self) -> &InstructionSet {
        &self.instructions
    }

    /// Assemble the system and user messages for one turn.
    ///
    /// Whole code-context files are evicted until the prompt fits
    /// `token_budget`. Nothing else is ever dropped or truncated.
    pub fn assemble(
        &self,
        goals: &[String],
        tools: &[ToolSpec],
        transcript: &[Message],
        user_input: &str,
        token_budget: usize,
    ) -> Result<AssembledPrompt> {
        let budget =
            TokenBudget::new(token_budget)?.with_output_reserve(self.config.output_reserve);
        let limit = budget.effective_max_tokens();
        let tok = self.tokenizer.as_ref();

        let catalogue = render_catalogue(tools)?;
        let static_text = self.instructions.render(goals, &catalogue);

        let mut code = CodeContextMap::from_transcript(transcript);
        let step = StepRecord::from_transcript(transcript);
        let step_text = step.text_or(&self.config.placeholder);

        let user_tokens = tok.count_tokens(user_input)?;
        let mandatory_system = self.render_system(&static_text, &self.config.placeholder, step_text);
        let mandatory = tok.count_tokens(&mandatory_system)? + user_tokens;
        let Some(available) = budget.remaining(mandatory) else {
            return Err(Error::BudgetExceeded {
                mandatory,
                budget: limit,
            });
        };

        let found = code.len();
        let mut report = evict_code_context(&mut code, available, self.config.eviction_order, tok)?;

        // Joins and delimiters may cost tokens the per-file sums do not see.
        let (system, system_tokens) = loop {
            let system = self.render_system(&static_text, &self.code_text(&code), step_text);
            let system_tokens = tok.count_tokens(&system)?;
            let total = system_tokens + user_tokens;
            if total <= limit || code.is_empty() {
                break (system, system_tokens);
            }
            let current = code.total_tokens(tok)?;
            let target = current.saturating_sub(total - limit);
            let pass = evict_code_context(&mut code, target, self.config.eviction_order, tok)?;
            if pass.is_empty() {
                report.extend(evict_all(&mut code));
            } else {
                report.extend(pass);
            }
        };

        if !report.is_empty() {
            debug!(
                "Evicted {} of {found} code context file(s) ({} tokens): {}",
                report.evicted.len(),
                report.freed_tokens,
                report.evicted.join(", "),
            );
        }

        let total_tokens = system_tokens + user_tokens;
        let usage = budget.usage(total_tokens);
        if usage.usage_pct >= self.config.warning_threshold {
            warn!("Prompt budget pressure: {}", usage.to_log_string());
        }

        let report = AssemblyReport {
            budget: limit,
            instruction_tokens: tok.count_tokens(&static_text)?,
            catalogue_tokens: tok.count_tokens(&catalogue)?,
            code_context_tokens: code.total_tokens(tok)?,
            step_tokens: if step.is_present() {
                tok.count_tokens(step_text)?
            } else {
                0
            },
            user_tokens,
            system_tokens,
            total_tokens,
            retained: code.paths().into_iter().map(str::to_string).collect(),
            evicted: report.evicted,
        };

        Ok(AssembledPrompt {
            system: Message::system(system),
            user: Message::user(user_input),
            report,
        })
    }

    fn code_text(&self, code: &CodeContextMap) -> String {
        code.render_or(&self.config.placeholder)
    }

    fn render_system(&self, static_text: &str, code: &str, step: &str) -> String {
        let suffix = PromptBuilder::default()
            .delimited("Code Context", code)
            .delimited("Last Step", step)
            .build();
        format!("{static_text}\n\n{suffix}\n")
    }
}

/// Drop every remaining entry. Used when a tokenizer prices code at zero
/// but the rendered prompt still overflows.
fn evict_all(code: &mut CodeContextMap) -> EvictionReport {
    let evicted = code
        .take_all()
        .into_iter()
        .map(|entry| entry.file_path)
        .collect();
    EvictionReport {
        evicted,
        freed_tokens: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tokens::FnTokenizer;
    use serde_json::json;

    fn words() -> Arc<dyn Tokenizer> {
        Arc::new(FnTokenizer::new(|s: &str| s.split_whitespace().count()))
    }

    fn assembler() -> PromptAssembler {
        PromptAssembler::new(
            words(),
            InstructionSet::new("You are a developer.").with_general(["Use full paths."]),
        )
    }

    fn edit(path: &str, code: &str) -> Message {
        Message::system(format!("wrote {path}")).with_code(path, code)
    }

    fn filler(n: usize) -> String {
        vec!["tok"; n].join(" ")
    }

    #[test]
    fn renders_code_and_step_blocks_last() {
        let transcript = vec![
            edit("src/App.js", "export default App;"),
            Message::system("ran tests").with_step("Step 1: tests passed"),
        ];
        let prompt = assembler()
            .assemble(&[], &[], &transcript, "next", 1000)
            .unwrap();
        let system = prompt.system.content.as_deref().unwrap();
        assert!(system.ends_with(
            "Code Context:\n>>>>\nexport default App;\n<<<<\n\nLast Step:\n>>>>\nStep 1: tests passed\n<<<<\n"
        ));
        assert_eq!(prompt.user.content.as_deref(), Some("next"));
        assert!(prompt.user.metadata.is_none());
    }

    #[test]
    fn mandatory_overflow_is_an_error() {
        let err = assembler()
            .assemble(&[], &[], &[], &filler(50), 20)
            .unwrap_err();
        assert!(matches!(err, Error::BudgetExceeded { budget: 20, .. }));
    }

    #[test]
    fn zero_budget_is_a_configuration_error() {
        let err = assembler().assemble(&[], &[], &[], "start", 0).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn invalid_tool_schema_is_a_configuration_error() {
        let tools = vec![ToolSpec::new("bad", "Broken", json!({"type": 1}))];
        let err = assembler().assemble(&[], &tools, &[], "start", 1000).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn evicts_until_the_prompt_fits() {
        let transcript = vec![
            edit("a.js", &filler(30)),
            edit("b.js", &filler(30)),
            edit("c.js", &filler(30)),
        ];
        let a = assembler();
        let base = a.assemble(&[], &[], &[], "go", 10_000).unwrap();
        let budget = base.report.total_tokens + 65;

        let prompt = a.assemble(&[], &[], &transcript, "go", budget).unwrap();
        assert!(prompt.report.total_tokens <= budget);
        // Insertion order: c.js (newest edit) was inserted first, so it goes first.
        assert_eq!(prompt.report.evicted, vec!["c.js"]);
        assert_eq!(prompt.report.retained, vec!["b.js", "a.js"]);
        assert_eq!(prompt.report.code_context_tokens, 60);
    }

    #[test]
    fn eviction_order_is_configurable() {
        let transcript = vec![edit("a.js", &filler(10)), edit("b.js", &filler(40))];
        let a = assembler().with_config(
            AssemblerConfig::default().with_eviction_order(EvictionOrder::LargestFirst),
        );
        let base = a.assemble(&[], &[], &[], "go", 10_000).unwrap();
        let budget = base.report.total_tokens + 20;
        let prompt = a.assemble(&[], &[], &transcript, "go", budget).unwrap();
        assert_eq!(prompt.report.evicted, vec!["b.js"]);
        assert_eq!(prompt.report.retained, vec!["a.js"]);
    }

    #[test]
    fn non_additive_tokenizer_is_rechecked() {
        // Every line costs one extra token, so joining files costs more than
        // the per-file sums.
        let lines: Arc<dyn Tokenizer> = Arc::new(FnTokenizer::new(|s: &str| {
            s.split_whitespace().count() + s.lines().count()
        }));
        let a = PromptAssembler::new(lines.clone(), InstructionSet::new("Role"));
        let transcript: Vec<Message> = (0..5)
            .map(|i| edit(&format!("f{i}.js"), "one\ntwo\nthree"))
            .collect();
        for budget in 40..120 {
            if let Ok(prompt) = a.assemble(&[], &[], &transcript, "go", budget) {
                let system = prompt.system.content.unwrap();
                let total = lines.count_tokens(&system).unwrap() + lines.count_tokens("go").unwrap();
                assert!(total <= budget, "budget {budget}: {total}");
            }
        }
    }

    #[test]
    fn custom_placeholder_is_rendered() {
        let a = assembler()
            .with_config(AssemblerConfig::default().with_placeholder("(nothing yet)"));
        let prompt = a.assemble(&[], &[], &[], "start", 1000).unwrap();
        let system = prompt.system.content.unwrap();
        assert!(system.contains("Code Context:\n>>>>\n(nothing yet)\n<<<<"));
        assert!(system.contains("Last Step:\n>>>>\n(nothing yet)\n<<<<"));
    }

    #[test]
    fn output_reserve_shrinks_the_budget() {
        let a = assembler();
        let base = a.assemble(&[], &[], &[], "start", 10_000).unwrap();
        let exact = base.report.total_tokens;
        assert!(a.assemble(&[], &[], &[], "start", exact).is_ok());

        let reserved = assembler()
            .with_config(AssemblerConfig::default().with_output_reserve(1));
        let err = reserved.assemble(&[], &[], &[], "start", exact).unwrap_err();
        assert!(matches!(err, Error::BudgetExceeded { .. }));
    }
}
