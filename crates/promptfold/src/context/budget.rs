//! Token budget for a single assembled prompt.
//!
//! [`TokenBudget`] is the ceiling the assembler fits the prompt into. Usage
//! is reported as a [`BudgetUsage`] snapshot so callers can log how close a
//! turn came to the limit; the assembler warns once usage crosses
//! [`WARNING_THRESHOLD`].

use crate::error::ConfigError;

/// Usage fraction at which assembly logs a budget-pressure warning.
pub const WARNING_THRESHOLD: f64 = 0.80;

/// A positive token ceiling, optionally minus a reserve for the model's reply.
///
/// # Example
///
/// ```
/// use promptfold::context::TokenBudget;
///
/// let budget = TokenBudget::new(4096).unwrap().with_output_reserve(512);
/// assert_eq!(budget.effective_max_tokens(), 3584);
/// assert_eq!(budget.remaining(3000), Some(584));
/// assert_eq!(budget.remaining(4000), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    /// Maximum prompt size in tokens.
    max_tokens: usize,
    /// Tokens held back for the model's response.
    output_reserve: usize,
}

impl TokenBudget {
    /// Create a budget. Zero is rejected: nothing could ever fit.
    pub fn new(max_tokens: usize) -> Result<Self, ConfigError> {
        if max_tokens == 0 {
            return Err(ConfigError::ZeroLimit("token_budget"));
        }
        Ok(Self {
            max_tokens,
            output_reserve: 0,
        })
    }

    /// Set tokens reserved for model output.
    pub fn with_output_reserve(mut self, tokens: usize) -> Self {
        self.output_reserve = tokens;
        self
    }

    /// Prompt ceiling after subtracting the output reserve.
    pub fn effective_max_tokens(&self) -> usize {
        self.max_tokens.saturating_sub(self.output_reserve)
    }

    /// Tokens left after `consumed`, or `None` if `consumed` already overflows.
    pub fn remaining(&self, consumed: usize) -> Option<usize> {
        self.effective_max_tokens().checked_sub(consumed)
    }

    /// Snapshot the usage for `used` tokens.
    pub fn usage(&self, used: usize) -> BudgetUsage {
        let effective = self.effective_max_tokens();
        let usage_pct = if effective > 0 {
            used as f64 / effective as f64
        } else {
            1.0
        };
        BudgetUsage {
            used_tokens: used,
            max_tokens: effective,
            usage_pct,
        }
    }
}

/// Snapshot of budget consumption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetUsage {
    /// Tokens consumed.
    pub used_tokens: usize,
    /// Effective ceiling.
    pub max_tokens: usize,
    /// Usage as a fraction (0.0 to 1.0+).
    pub usage_pct: f64,
}

impl BudgetUsage {
    /// Whether usage has crossed [`WARNING_THRESHOLD`].
    pub fn is_under_pressure(&self) -> bool {
        self.usage_pct >= WARNING_THRESHOLD
    }

    /// Format as a short log-friendly string.
    pub fn to_log_string(&self) -> String {
        format!(
            "prompt: {} tokens ({:.0}% of {})",
            self.used_tokens,
            self.usage_pct * 100.0,
            self.max_tokens,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_is_rejected() {
        assert_eq!(
            TokenBudget::new(0),
            Err(ConfigError::ZeroLimit("token_budget"))
        );
    }

    #[test]
    fn remaining_subtracts_consumed() {
        let budget = TokenBudget::new(100).unwrap();
        assert_eq!(budget.remaining(40), Some(60));
        assert_eq!(budget.remaining(100), Some(0));
        assert_eq!(budget.remaining(101), None);
    }

    #[test]
    fn output_reserve_shrinks_effective_budget() {
        let budget = TokenBudget::new(1000).unwrap().with_output_reserve(1200);
        assert_eq!(budget.effective_max_tokens(), 0);
        assert_eq!(budget.remaining(0), Some(0));
        assert_eq!(budget.remaining(1), None);
    }

    #[test]
    fn usage_reports_pressure() {
        let budget = TokenBudget::new(1000).unwrap();
        assert!(!budget.usage(500).is_under_pressure());
        assert!(budget.usage(800).is_under_pressure());
    }

    #[test]
    fn usage_log_string_format() {
        let log = TokenBudget::new(4096).unwrap().usage(2048).to_log_string();
        assert_eq!(log, "prompt: 2048 tokens (50% of 4096)");
    }
}
