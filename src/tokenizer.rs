//! Splits text into sentences and sentences into tokens.
//!
//! Word tokenization keeps every character of the input: whitespace becomes tokens of its own,
//! so the concatenated token texts always reconstruct the input exactly.

use crate::{
    types::{Position, Span},
    utils::{self, regex::Regex},
};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

pub mod disambiguate;
pub mod multiword;
pub mod sentence;
pub mod tag;

// see https://stackoverflow.com/a/40296745
fn split<F>(text: &str, split_func: F) -> Vec<&str>
where
    F: Fn(char) -> bool,
{
    let mut result = Vec::new();
    let mut last = 0;
    for (index, matched) in text.match_indices(split_func) {
        if last != index {
            result.push(&text[last..index]);
        }
        result.push(matched);
        last = index + matched.len();
    }
    if last < text.len() {
        result.push(&text[last..]);
    }

    result
}

lazy_static! {
    // see https://stackoverflow.com/a/17773849
    static ref URL_REGEX: Regex = Regex::new(r"(https?:\/\/(?:www\.|(?!www))[a-zA-Z0-9][a-zA-Z0-9-]+[a-zA-Z0-9]\.[^\s]{2,}|www\.[a-zA-Z0-9][a-zA-Z0-9-]+[a-zA-Z0-9]\.[^\s]{2,}|https?:\/\/(?:www\.|(?!www))[a-zA-Z0-9]+\.[^\s]{2,}|www\.[a-zA-Z0-9]+\.[^\s]{2,})")
        .expect("static regex is valid");
    static ref EMAIL_REGEX: Regex = Regex::new(r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}")
        .expect("static regex is valid");
}

/// Whether the token is (or contains) a URL or an e-mail address.
pub(crate) fn is_url_or_email(text: &str) -> bool {
    URL_REGEX.is_match(text) || EMAIL_REGEX.is_match(text)
}

fn default_split_chars() -> String {
    utils::splitting_chars().to_owned()
}

fn default_true() -> bool {
    true
}

/// Options of the word tokenizer of one language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Chars which always form a token on their own. Whitespace is always split on.
    #[serde(default = "default_split_chars")]
    pub split_chars: String,
    /// Language specific chars split on in addition to `split_chars`.
    #[serde(default)]
    pub extra_split_chars: String,
    /// Whether URLs and e-mail addresses are kept as one token.
    #[serde(default = "default_true")]
    pub join_urls: bool,
    /// Additional regexes whose matches are kept as one token, e.g. for apostrophe-internal words.
    #[serde(default)]
    pub extra_join_regexes: Vec<Regex>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            split_chars: default_split_chars(),
            extra_split_chars: String::new(),
            join_urls: true,
            extra_join_regexes: Vec::new(),
        }
    }
}

/// A token before tagging: a slice of the tokenized text with its span relative to the start of that text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken<'t> {
    pub text: &'t str,
    pub span: Span,
}

impl<'t> RawToken<'t> {
    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

/// Splits text into words, punctuation and whitespace.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Tokenizer { config }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    fn is_split_char(&self, c: char) -> bool {
        c.is_whitespace()
            || self.config.split_chars.contains(c)
            || self.config.extra_split_chars.contains(c)
    }

    /// Byte ranges which must not be split, sorted and non-overlapping.
    fn joined_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        let mut ranges: Vec<(usize, usize)> = Vec::new();

        if self.config.join_urls {
            ranges.extend(URL_REGEX.find_iter(text));
            ranges.extend(EMAIL_REGEX.find_iter(text));
        }
        for regex in &self.config.extra_join_regexes {
            ranges.extend(regex.find_iter(text));
        }

        ranges.retain(|(start, end)| end > start);
        // longest first among ranges with the same start
        ranges.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)));

        let mut output: Vec<(usize, usize)> = Vec::new();
        for range in ranges {
            if output.last().map_or(true, |last| range.0 >= last.1) {
                output.push(range);
            }
        }
        output
    }

    fn token_strs<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut tokens = Vec::new();
        let mut prev = 0;
        let split_func = |c: char| self.is_split_char(c);

        for (start, end) in self.joined_ranges(text) {
            tokens.extend(split(&text[prev..start], split_func));
            tokens.push(&text[start..end]);
            prev = end;
        }

        tokens.extend(split(&text[prev..], split_func));
        tokens
    }

    /// Tokenizes `text`. The returned tokens include whitespace and cover the text without gaps.
    pub fn tokenize<'t>(&self, text: &'t str) -> Vec<RawToken<'t>> {
        let mut position = Position::default();

        self.token_strs(text)
            .into_iter()
            .map(|token| {
                let span = Span::from_str_at(token, position);
                position = span.end();

                RawToken { text: token, span }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn texts(text: &str) -> Vec<&str> {
        Tokenizer::default()
            .tokenize(text)
            .into_iter()
            .map(|x| x.text)
            .collect()
    }

    #[test]
    fn splits_words_punctuation_and_whitespace() {
        assert_eq!(
            texts("Hello, world!"),
            vec!["Hello", ",", " ", "world", "!"]
        );
    }

    #[test]
    fn keeps_urls_and_emails_together() {
        assert_eq!(
            texts("See https://example.com/a?b=c or mail me@example.org."),
            vec![
                "See",
                " ",
                "https://example.com/a?b=c",
                " ",
                "or",
                " ",
                "mail",
                " ",
                "me@example.org",
                "."
            ]
        );
    }

    #[test]
    fn url_joining_can_be_disabled() {
        let tokenizer = Tokenizer::new(TokenizerConfig {
            join_urls: false,
            ..TokenizerConfig::default()
        });

        let tokens = tokenizer.tokenize("a me@example.org");
        assert!(tokens.iter().all(|x| x.text != "me@example.org"));
    }

    #[test]
    fn spans_are_char_based() {
        let tokens = Tokenizer::default().tokenize("Grüße an");

        assert_eq!(tokens[2].text, "an");
        assert_eq!(tokens[2].span.char(), &(6..8));
        assert_eq!(tokens[2].span.byte(), &(8..10));
    }

    #[quickcheck]
    fn tokens_reconstruct_input(text: String) -> bool {
        let tokens = Tokenizer::default().tokenize(&text);

        tokens.iter().map(|x| x.text).collect::<String>() == text
            && tokens
                .windows(2)
                .all(|pair| pair[0].span.end() == pair[1].span.start())
    }
}
