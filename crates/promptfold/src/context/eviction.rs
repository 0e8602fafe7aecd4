//! Code-context eviction: drop whole files until the rest fits.
//!
//! Code context is the only part of an assembled prompt that may shrink.
//! Entries are removed one at a time, in an order chosen by
//! [`EvictionOrder`], until their summed token count fits the space left
//! after the mandatory sections. A file is never partially kept.

use crate::context::code_context::CodeContextMap;
use crate::context::tokens::Tokenizer;
use crate::error::{ConfigError, TokenizationError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which code-context entry is removed first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionOrder {
    /// Oldest insertion first. The map is filled newest-first, so this drops
    /// the file whose latest edit is the most recent.
    #[default]
    InsertionOrder,
    /// File whose latest edit is the oldest goes first.
    LeastRecentFirst,
    /// Biggest file goes first; ties fall back to insertion order.
    LargestFirst,
}

impl FromStr for EvictionOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insertion" | "insertion-order" => Ok(Self::InsertionOrder),
            "least-recent" | "least-recent-first" => Ok(Self::LeastRecentFirst),
            "largest" | "largest-first" => Ok(Self::LargestFirst),
            other => Err(ConfigError::InvalidEvictionOrder(other.to_string())),
        }
    }
}

/// What an eviction pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Paths removed, in removal order.
    pub evicted: Vec<String>,
    /// Tokens of code removed.
    pub freed_tokens: usize,
}

impl EvictionReport {
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty()
    }

    /// Fold a later pass into this one.
    pub fn extend(&mut self, other: EvictionReport) {
        self.evicted.extend(other.evicted);
        self.freed_tokens += other.freed_tokens;
    }
}

/// Remove entries from `map` until its code totals at most `available` tokens.
///
/// Returns without touching the map when it already fits. When every entry
/// has to go the map ends up empty, which always fits.
pub fn evict_code_context(
    map: &mut CodeContextMap,
    available: usize,
    order: EvictionOrder,
    tokenizer: &dyn Tokenizer,
) -> Result<EvictionReport, TokenizationError> {
    let mut sized = Vec::with_capacity(map.len());
    for (position, entry) in map.entries().iter().enumerate() {
        let tokens = tokenizer.count_tokens(&entry.code)?;
        sized.push((position, entry.source_index, tokens, entry.file_path.clone()));
    }
    let mut total: usize = sized.iter().map(|(_, _, tokens, _)| tokens).sum();

    let mut report = EvictionReport::default();
    if total <= available {
        return Ok(report);
    }

    // Stable sorts: equal keys keep insertion order.
    match order {
        EvictionOrder::InsertionOrder => {}
        EvictionOrder::LeastRecentFirst => sized.sort_by_key(|(_, source, _, _)| *source),
        EvictionOrder::LargestFirst => {
            sized.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
        }
    }

    for (_, _, tokens, path) in sized {
        if total <= available {
            break;
        }
        map.remove(&path);
        total -= tokens;
        report.freed_tokens += tokens;
        report.evicted.push(path);
    }

    Ok(report)
}
