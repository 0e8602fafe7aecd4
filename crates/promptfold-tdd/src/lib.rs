//! Test-driven React app agent profile for promptfold.
//!
//! `promptfold-tdd` packages the instructions, reply format and session
//! limits of an agent that builds React apps test first, on top of the
//! promptfold assembler and summarizer.
//!
//! ```no_run
//! use promptfold::Message;
//! use promptfold::context::CharRatioTokenizer;
//! use promptfold_tdd::TddConfig;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), promptfold::error::Error> {
//! let config = TddConfig::default().with_output_dir("/work/apps");
//! let assembler = config.build_assembler(Arc::new(CharRatioTokenizer::default()))?;
//!
//! let goals = vec!["Build a todo app".to_string()];
//! let transcript = vec![Message::system("Ran npm test").with_step("Step 1: tests failed")];
//! let prompt = assembler.assemble(
//!     &goals,
//!     &[],
//!     &transcript,
//!     "Determine which next command to use",
//!     config.send_token_limit,
//! )?;
//! assert!(prompt.report.total_tokens <= config.send_token_limit);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod profile;

pub use config::TddConfig;
pub use profile::{ResponseFormat, tdd_instructions};
