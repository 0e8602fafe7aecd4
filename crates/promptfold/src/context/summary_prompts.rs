//! Summary modes, strategies and their prompt templates.
//!
//! Each [`SummaryMode`] carries a per-chunk template and a combine template.
//! The refine template is shared and ends with the mode's instruction so the
//! running summary keeps its shape.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const COMMAND_OUTPUT_INSTRUCTION: &str = "\
Please summarize it in one paragraph and highlight the errors. Skip any warnings, security \
vulnerabilities, dependencies or audit issues. For npm test output, describe the error in detail \
and quote the exact lines of code where the error occurred, including the file name and line \
number. For file reads, include the relevant lines of code as is. \
Start with 'The cli command was <status>'.";

const STEP_LOG_INSTRUCTION: &str = "\
Summarize each step one by one and mention its success/failure status. Skip any warnings, \
vulnerabilities, dependencies or audit issues. For npm test output, describe the error in detail \
and quote the exact lines of code where the error occurred. For file reads, include the relevant \
lines of code as is. Start with 'Step <num>: '";

/// What kind of text is being summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryMode {
    /// Output of one or more CLI commands.
    CommandOutput,
    /// Log of steps the agent already completed.
    StepLog,
}

impl SummaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryMode::CommandOutput => "command-output",
            SummaryMode::StepLog => "step-log",
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            SummaryMode::CommandOutput => COMMAND_OUTPUT_INSTRUCTION,
            SummaryMode::StepLog => STEP_LOG_INSTRUCTION,
        }
    }

    fn chunk_intro(&self) -> &'static str {
        match self {
            SummaryMode::CommandOutput => "The following is the output of a cli command:",
            SummaryMode::StepLog => "The following is the log of steps already completed.",
        }
    }

    fn combine_intro(&self) -> &'static str {
        match self {
            SummaryMode::CommandOutput => "The following is a set of summaries from CLI commands:",
            SummaryMode::StepLog => "The following is a set of summaries from memory logs:",
        }
    }

    /// Prompt summarizing one chunk on its own.
    pub fn chunk_prompt(&self, chunk: &str) -> String {
        format!(
            "{}\n\n<output>\n{chunk}\n</output>\n\n{}\n",
            self.chunk_intro(),
            self.instruction()
        )
    }

    /// Prompt merging several summaries into one.
    pub fn combine_prompt(&self, summaries: &[String]) -> String {
        format!(
            "{}\n\n<summaries>\n{}\n</summaries>\n\n{}\n",
            self.combine_intro(),
            summaries.join("\n\n"),
            self.instruction()
        )
    }

    /// Prompt updating a running summary with one more chunk.
    pub fn refine_prompt(&self, existing: &str, chunk: &str) -> String {
        format!(
            "Your job is to produce a final summary.\n\
             We have provided an existing summary up to a certain point:\n\
             <summary>\n{existing}\n</summary>\n\
             We have the opportunity to refine the existing summary (only if needed) with some \
             more context below.\n\
             ------------\n{chunk}\n------------\n\
             Given the new context, refine the original summary. If the context isn't useful, \
             return the original summary.\n\n{}\n",
            self.instruction()
        )
    }
}

impl fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "command-output" | "cli" => Ok(Self::CommandOutput),
            "step-log" | "memory" => Ok(Self::StepLog),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

/// How chunk summaries are folded together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryStrategy {
    /// Summarize every chunk independently, then combine.
    #[default]
    MapReduce,
    /// Carry one running summary through the chunks in order.
    Refine,
}

impl SummaryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStrategy::MapReduce => "map-reduce",
            SummaryStrategy::Refine => "refine",
        }
    }
}

impl fmt::Display for SummaryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "map-reduce" | "map_reduce" => Ok(Self::MapReduce),
            "refine" => Ok(Self::Refine),
            other => Err(ConfigError::InvalidStrategy(other.to_string())),
        }
    }
}
