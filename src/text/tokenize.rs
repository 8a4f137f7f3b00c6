// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tokenizers.
//!
//! [`simple_tokens`] feeds the embedding engine: lowercase alphabetic runs,
//! so punctuation and numerals never reach the vocabulary lookup.
//! [`word_tokens`] feeds post-retrieval processing: whole words that are
//! purely ASCII alphabetic, in original case.

/// Minimum token length (in characters) kept by [`simple_tokens`].
pub const MIN_TOKEN_CHARS: usize = 2;

/// Maximum token length (in characters) kept by [`simple_tokens`].
pub const MAX_TOKEN_CHARS: usize = 15;

/// Splits text into lowercase alphabetic tokens of 2 to 15 characters.
pub fn simple_tokens(text: &str) -> Vec<String> {
    alphabetic_runs(text, char::is_alphabetic)
        .filter(|run| {
            let len = run.chars().count();
            (MIN_TOKEN_CHARS..=MAX_TOKEN_CHARS).contains(&len)
        })
        .map(str::to_lowercase)
        .collect()
}

/// Splits text into words and keeps those made only of ASCII letters,
/// preserving case.
///
/// Words are runs of alphanumerics and apostrophes, so accented or
/// numbered words are dropped whole rather than cut into fragments.
pub fn word_tokens(text: &str) -> Vec<String> {
    alphabetic_runs(text, |c| c.is_alphanumeric() || c == '\'')
        .filter(|word| word.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_string)
        .collect()
}

fn alphabetic_runs<'a, F>(text: &'a str, is_word: F) -> impl Iterator<Item = &'a str> + 'a
where
    F: Fn(char) -> bool + 'a,
{
    text.split(move |c: char| !is_word(c))
        .filter(|run| !run.is_empty())
}
