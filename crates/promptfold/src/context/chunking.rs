//! Token-bounded splitting and trimming.
//!
//! [`split_into_chunks`] cuts a text into consecutive, non-overlapping chunks
//! of at most `chunk_size` tokens. It prefers paragraph breaks, then line
//! breaks, then spaces, and only cuts inside a word when a single word is
//! larger than a chunk. Separators stay attached to the piece they end, so
//! concatenating the chunks reproduces the input exactly.
//!
//! [`truncate_to_tokens`] is the last-resort trim used to enforce a hard
//! ceiling on model output.

use crate::context::tokens::Tokenizer;
use crate::error::TokenizationError;

/// Boundaries tried in order, coarsest first.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Split `text` into ordered chunks of at most `chunk_size` tokens.
///
/// Returns an empty list for empty input and a single chunk when the whole
/// text already fits. A single character that alone exceeds `chunk_size`
/// is emitted as its own chunk rather than looping forever.
pub fn split_into_chunks(
    text: &str,
    chunk_size: usize,
    tokenizer: &dyn Tokenizer,
) -> Result<Vec<String>, TokenizationError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    if tokenizer.count_tokens(text)? <= chunk_size {
        return Ok(vec![text.to_string()]);
    }

    let mut pieces = Vec::new();
    split_pieces(text, &SEPARATORS, chunk_size, tokenizer, &mut pieces)?;
    merge_pieces(&pieces, chunk_size, tokenizer)
}

/// Trim `text` to the longest prefix that fits in `limit` tokens.
///
/// Trailing whitespace left by the cut is removed.
pub fn truncate_to_tokens(
    text: &str,
    limit: usize,
    tokenizer: &dyn Tokenizer,
) -> Result<String, TokenizationError> {
    if tokenizer.count_tokens(text)? <= limit {
        return Ok(text.to_string());
    }
    let cut = longest_prefix_within(text, limit, tokenizer)?;
    let (head, _) = text.split_at(cut);
    Ok(head.trim_end().to_string())
}

/// Recursively break `text` into pieces that each fit `limit`.
fn split_pieces<'a>(
    text: &'a str,
    separators: &[&str],
    limit: usize,
    tokenizer: &dyn Tokenizer,
    out: &mut Vec<&'a str>,
) -> Result<(), TokenizationError> {
    let Some((sep, finer)) = separators.split_first() else {
        return hard_split(text, limit, tokenizer, out);
    };

    for piece in text.split_inclusive(*sep) {
        if tokenizer.count_tokens(piece)? <= limit {
            out.push(piece);
        } else {
            split_pieces(piece, finer, limit, tokenizer, out)?;
        }
    }
    Ok(())
}

/// Cut a separator-free run into the largest prefixes that fit.
fn hard_split<'a>(
    text: &'a str,
    limit: usize,
    tokenizer: &dyn Tokenizer,
    out: &mut Vec<&'a str>,
) -> Result<(), TokenizationError> {
    let mut rest = text;
    while !rest.is_empty() {
        let mut cut = longest_prefix_within(rest, limit, tokenizer)?;
        if cut == 0 {
            cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (head, tail) = rest.split_at(cut);
        out.push(head);
        rest = tail;
    }
    Ok(())
}

/// Greedily pack consecutive pieces into chunks without exceeding `limit`.
fn merge_pieces(
    pieces: &[&str],
    limit: usize,
    tokenizer: &dyn Tokenizer,
) -> Result<Vec<String>, TokenizationError> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in pieces {
        if current.is_empty() {
            current.push_str(piece);
            continue;
        }
        let before = current.len();
        current.push_str(piece);
        if tokenizer.count_tokens(&current)? > limit {
            current.truncate(before);
            chunks.push(std::mem::take(&mut current));
            current.push_str(piece);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    Ok(chunks)
}

/// Byte length of the longest char-aligned prefix of `text` within `limit`.
///
/// Binary search over prefix lengths; assumes the token count of a prefix
/// never exceeds that of a longer prefix.
fn longest_prefix_within(
    text: &str,
    limit: usize,
    tokenizer: &dyn Tokenizer,
) -> Result<usize, TokenizationError> {
    // ends[k - 1] is the byte offset just past the k-th char.
    let ends: Vec<usize> = text
        .char_indices()
        .skip(1)
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    let (mut lo, mut hi) = (0usize, ends.len());
    while lo < hi {
        let mid = (lo + hi).div_ceil(2);
        let (prefix, _) = text.split_at(ends[mid - 1]);
        if tokenizer.count_tokens(prefix)? <= limit {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(if lo == 0 { 0 } else { ends[lo - 1] })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tokens::{CharRatioTokenizer, FnTokenizer};
    use proptest::prelude::*;

    fn words() -> FnTokenizer<impl Fn(&str) -> usize + Send + Sync> {
        FnTokenizer::new(|s: &str| s.split_whitespace().count())
    }

    #[test]
    fn empty_text_has_no_chunks() {
        let chunks = split_into_chunks("", 10, &words()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn small_text_is_one_chunk() {
        let chunks = split_into_chunks("npm test passed", 10, &words()).unwrap();
        assert_eq!(chunks, vec!["npm test passed".to_string()]);
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let text = "one two three\n\nfour five six\n\nseven";
        let chunks = split_into_chunks(text, 3, &words()).unwrap();
        assert_eq!(
            chunks,
            vec![
                "one two three\n\n".to_string(),
                "four five six\n\n".to_string(),
                "seven".to_string(),
            ]
        );
    }

    #[test]
    fn falls_back_to_lines_then_words() {
        let text = "a b c d e f\ng h";
        let chunks = split_into_chunks(text, 4, &words()).unwrap();
        assert_eq!(chunks.concat(), text);
        for chunk in &chunks {
            assert!(words().count_tokens(chunk).unwrap() <= 4, "{chunk:?}");
        }
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn hard_splits_oversized_words() {
        let tok = CharRatioTokenizer::new(1.0);
        let text = "x".repeat(25);
        let chunks = split_into_chunks(&text, 10, &tok).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[2].len(), 5);
    }

    #[test]
    fn hard_split_respects_char_boundaries() {
        let tok = CharRatioTokenizer::new(1.0);
        let text = "é".repeat(7);
        let chunks = split_into_chunks(&text, 3, &tok).unwrap();
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 3));
    }

    #[test]
    fn truncate_keeps_text_that_fits() {
        let out = truncate_to_tokens("short text", 10, &words()).unwrap();
        assert_eq!(out, "short text");
    }

    #[test]
    fn truncate_cuts_to_limit() {
        let out = truncate_to_tokens("one two three four five", 3, &words()).unwrap();
        assert_eq!(out, "one two three");
    }

    proptest! {
        #[test]
        fn chunks_are_lossless_and_bounded(
            lines in proptest::collection::vec("[a-z]{1,12}( [a-z]{1,12}){0,15}", 1..200),
            chunk_size in 1usize..60,
        ) {
            let text = lines.join("\n");
            let tok = words();
            let chunks = split_into_chunks(&text, chunk_size, &tok).unwrap();
            prop_assert_eq!(chunks.concat(), text.clone());
            for chunk in &chunks {
                prop_assert!(tok.count_tokens(chunk).unwrap() <= chunk_size);
            }
        }
    }
}
