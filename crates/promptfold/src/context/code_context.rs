//! Code context and step record derived from the transcript.
//!
//! Both are computed by scanning the caller-owned transcript newest to
//! oldest, once per assembled turn:
//!
//! - [`CodeContextMap`] keeps the most recent non-blank code seen for each
//!   file path, in the order paths were first met during that scan.
//! - [`StepRecord`] is the `metadata` of the most recent system message that
//!   carries any.

use crate::context::tokens::Tokenizer;
use crate::error::TokenizationError;
use crate::{Message, MessageRole};
use std::collections::HashSet;

/// Rendered in place of an empty code context or a missing step record.
pub const NONE_PLACEHOLDER: &str = "None";

/// One file's current contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    pub file_path: String,
    pub code: String,
    /// Index in the transcript of the message this version came from.
    pub source_index: usize,
}

/// File path → most recent code, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeContextMap {
    entries: Vec<CodeEntry>,
}

impl CodeContextMap {
    /// Build the map from a transcript.
    ///
    /// Only system messages with both `code` and `file_path` metadata count.
    /// Blank code is skipped before the path is claimed, so an empty write
    /// never hides an older real version.
    pub fn from_transcript(transcript: &[Message]) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut entries = Vec::new();

        for (index, msg) in transcript.iter().enumerate().rev() {
            if msg.role != MessageRole::System {
                continue;
            }
            let Some(meta) = &msg.metadata else {
                continue;
            };
            let (Some(path), Some(code)) = (meta.file_path.as_deref(), meta.code.as_deref())
            else {
                continue;
            };
            if code.trim().is_empty() || !seen.insert(path) {
                continue;
            }
            entries.push(CodeEntry {
                file_path: path.to_string(),
                code: code.to_string(),
                source_index: index,
            });
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[CodeEntry] {
        &self.entries
    }

    pub fn get(&self, file_path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.file_path == file_path)
            .map(|e| e.code.as_str())
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.file_path.as_str()).collect()
    }

    /// Remove an entry, keeping the order of the rest.
    pub fn remove(&mut self, file_path: &str) -> Option<CodeEntry> {
        let idx = self.entries.iter().position(|e| e.file_path == file_path)?;
        Some(self.entries.remove(idx))
    }

    /// Sum of the token counts of every entry's code.
    pub fn total_tokens(&self, tokenizer: &dyn Tokenizer) -> Result<usize, TokenizationError> {
        tokenizer.count_all(&mut self.entries.iter().map(|e| e.code.as_str()))
    }

    /// Remove and return every entry.
    pub fn take_all(&mut self) -> Vec<CodeEntry> {
        std::mem::take(&mut self.entries)
    }

    /// The code of every entry joined by newlines, or [`NONE_PLACEHOLDER`].
    pub fn render(&self) -> String {
        self.render_or(NONE_PLACEHOLDER)
    }

    /// Like [`render`](Self::render) with a custom placeholder.
    pub fn render_or(&self, placeholder: &str) -> String {
        if self.entries.is_empty() {
            return placeholder.to_string();
        }
        let joined = self
            .entries
            .iter()
            .map(|e| e.code.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        joined.trim().to_string()
    }
}

/// The last completed step's human-readable status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepRecord {
    metadata: Option<String>,
}

impl StepRecord {
    /// Most recent system message with non-empty `metadata`.
    pub fn from_transcript(transcript: &[Message]) -> Self {
        let metadata = transcript
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::System)
            .filter_map(|m| m.metadata.as_ref()?.metadata.as_deref())
            .find(|s| !s.is_empty())
            .map(str::to_string);
        Self { metadata }
    }

    pub fn is_present(&self) -> bool {
        self.metadata.is_some()
    }

    /// The recorded text, or [`NONE_PLACEHOLDER`].
    pub fn text(&self) -> &str {
        self.text_or(NONE_PLACEHOLDER)
    }

    pub fn text_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.metadata.as_deref().unwrap_or(placeholder)
    }
}
