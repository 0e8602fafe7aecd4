//! Prompt assembly for a single agent turn.
//!
//! - [`assembler`]: [`PromptAssembler`], which fits the system and user
//!   messages into a token budget by evicting code context.
//! - [`instructions`]: [`InstructionSet`], the static sections.
//! - [`catalogue`]: the numbered tool list.
//! - [`builder`]: [`PromptBuilder`] for `Heading:` sections.
//! - [`turn`]: [`TurnInput`], per-turn inputs loaded from JSON.

pub mod assembler;
pub mod builder;
pub mod catalogue;
pub mod instructions;
pub mod turn;

pub use assembler::{AssembledPrompt, AssemblerConfig, AssemblyReport, PromptAssembler};
pub use builder::PromptBuilder;
pub use catalogue::render_catalogue;
pub use instructions::{DomainInstructions, InstructionSet};
pub use turn::TurnInput;
