//! Pluggable token counting.
//!
//! Budgeting is only as accurate as the length function, so it is injected
//! by the caller and should match the tokenizer of the model the prompt is
//! sent to. [`CharRatioTokenizer`] is the heuristic fallback used across the
//! crate when no model-specific tokenizer is available.

use crate::error::TokenizationError;

/// Characters per token assumed by [`CharRatioTokenizer::default`].
///
/// Budgets computed with it are estimates; pass a model tokenizer when the
/// exact count matters.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.5;

/// A length function measuring text in model tokens.
pub trait Tokenizer: Send + Sync {
    /// Count the tokens in `text`.
    fn count_tokens(&self, text: &str) -> Result<usize, TokenizationError>;

    /// Sum the token counts of several texts.
    fn count_all<'a>(
        &self,
        texts: &mut dyn Iterator<Item = &'a str>,
    ) -> Result<usize, TokenizationError> {
        let mut total = 0;
        for text in texts {
            total += self.count_tokens(text)?;
        }
        Ok(total)
    }
}

/// Estimates tokens from the character count.
///
/// Rounds up, so any non-empty text costs at least one token and a one-token
/// limit always admits a single character.
#[derive(Debug, Clone, Copy)]
pub struct CharRatioTokenizer {
    chars_per_token: f64,
}

impl CharRatioTokenizer {
    pub fn new(chars_per_token: f64) -> Self {
        Self { chars_per_token }
    }
}

impl Default for CharRatioTokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_CHARS_PER_TOKEN)
    }
}

impl Tokenizer for CharRatioTokenizer {
    fn count_tokens(&self, text: &str) -> Result<usize, TokenizationError> {
        if !(self.chars_per_token.is_finite() && self.chars_per_token > 0.0) {
            return Err(TokenizationError::new(format!(
                "chars_per_token must be a positive number, got {}",
                self.chars_per_token
            )));
        }
        let chars = text.chars().count();
        Ok((chars as f64 / self.chars_per_token).ceil() as usize)
    }
}

/// Adapts an infallible closure into a [`Tokenizer`].
///
/// ```
/// use promptfold::context::tokens::{FnTokenizer, Tokenizer};
///
/// let words = FnTokenizer::new(|s: &str| s.split_whitespace().count());
/// assert_eq!(words.count_tokens("npm test failed").unwrap(), 3);
/// ```
pub struct FnTokenizer<F> {
    f: F,
}

impl<F> FnTokenizer<F>
where
    F: Fn(&str) -> usize + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Tokenizer for FnTokenizer<F>
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn count_tokens(&self, text: &str) -> Result<usize, TokenizationError> {
        Ok((self.f)(text))
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for std::sync::Arc<T> {
    fn count_tokens(&self, text: &str) -> Result<usize, TokenizationError> {
        (**self).count_tokens(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_ratio_rounds_up() {
        let tok = CharRatioTokenizer::default();
        assert_eq!(tok.count_tokens("").unwrap(), 0);
        assert_eq!(tok.count_tokens("a").unwrap(), 1);
        assert_eq!(tok.count_tokens("abcdefg").unwrap(), 2);
        assert_eq!(tok.count_tokens("abcdefgh").unwrap(), 3);
    }

    #[test]
    fn char_ratio_counts_chars_not_bytes() {
        let tok = CharRatioTokenizer::new(1.0);
        assert_eq!(tok.count_tokens("héllo").unwrap(), 5);
    }

    #[test]
    fn invalid_ratio_is_a_tokenization_error() {
        let tok = CharRatioTokenizer::new(0.0);
        assert!(tok.count_tokens("abc").is_err());
    }

    #[test]
    fn custom_ratio_changes_estimate() {
        let default = CharRatioTokenizer::default();
        let coarse = CharRatioTokenizer::new(4.0);
        let text = "a".repeat(40_000);
        assert!(coarse.count_tokens(&text).unwrap() < default.count_tokens(&text).unwrap());
    }

    #[test]
    fn count_all_sums() {
        let words = FnTokenizer::new(|s: &str| s.split_whitespace().count());
        let total = words
            .count_all(&mut ["one two", "three", ""].into_iter())
            .unwrap();
        assert_eq!(total, 3);
    }
}
