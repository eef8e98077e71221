//! Sentence segmentation on top of the Unicode sentence boundaries with abbreviation and paragraph handling.

use std::iter::Peekable;

use crate::types::{DefaultHashSet, Position, Span};
use serde::{Deserialize, Serialize};
use unicode_segmentation::{USentenceBoundIndices, UnicodeSegmentation};

/// Options of the sentence splitter of one language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentenceConfig {
    /// Words ending with a period which do not end a sentence, e.g. `"Dr."`.
    #[serde(default)]
    pub abbreviations: Vec<String>,
    /// Whether a single line break already ends a paragraph (and thus a sentence).
    /// If false, only two consecutive line breaks do.
    #[serde(default)]
    pub single_line_break_is_paragraph: bool,
}

/// One sentence of a text. Adjacent sentences cover the text without gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSentence<'t> {
    pub text: &'t str,
    /// The position of the sentence in the split text.
    pub start: Position,
}

impl<'t> RawSentence<'t> {
    pub fn span(&self) -> Span {
        Span::from_str_at(self.text, self.start)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentenceSplitter {
    abbreviations: DefaultHashSet<String>,
    single_line_break_is_paragraph: bool,
}

impl SentenceSplitter {
    pub fn new(config: &SentenceConfig) -> Self {
        SentenceSplitter {
            abbreviations: config
                .abbreviations
                .iter()
                .map(|x| x.trim_end_matches('.').to_lowercase())
                .collect(),
            single_line_break_is_paragraph: config.single_line_break_is_paragraph,
        }
    }

    /// Lazily splits the text into sentences. The iterator can be cloned to restart from its current position.
    pub fn split<'t>(&'t self, text: &'t str) -> SentenceIter<'t> {
        SentenceIter {
            text,
            bounds: text.split_sentence_bound_indices().peekable(),
            position: Position::default(),
            splitter: self,
        }
    }

    fn ends_with_abbreviation(&self, sentence: &str) -> bool {
        let trimmed = sentence.trim_end();
        if !trimmed.ends_with('.') {
            return false;
        }

        let last_word = trimmed
            .rsplit(|c: char| c.is_whitespace() || c == '(' || c == '"')
            .next()
            .unwrap_or("");
        let last_word = last_word.trim_end_matches('.').to_lowercase();

        !last_word.is_empty() && self.abbreviations.contains(&last_word)
    }

    /// Whether the sentence ends with a line break which does not end a paragraph.
    fn ends_with_soft_line_break(&self, sentence: &str) -> bool {
        if self.single_line_break_is_paragraph {
            return false;
        }

        let trailing: String = sentence
            .chars()
            .rev()
            .take_while(|c| c.is_whitespace())
            .collect();
        let n_breaks = trailing.chars().filter(|c| *c == '\n').count();
        if n_breaks != 1 {
            return false;
        }

        !sentence
            .trim_end()
            .ends_with(|c: char| matches!(c, '.' | '!' | '?' | '…' | ':'))
    }

    fn should_merge(&self, sentence: &str) -> bool {
        if sentence.trim().is_empty() {
            return true;
        }

        let trailing_newlines = sentence
            .chars()
            .rev()
            .take_while(|c| c.is_whitespace())
            .filter(|c| *c == '\n')
            .count();

        // an abbreviation never joins sentences across a paragraph break
        let ends_paragraph = trailing_newlines >= 2
            || (trailing_newlines == 1 && self.single_line_break_is_paragraph);

        (!ends_paragraph && self.ends_with_abbreviation(sentence))
            || self.ends_with_soft_line_break(sentence)
    }
}

#[derive(Clone)]
pub struct SentenceIter<'t> {
    text: &'t str,
    bounds: Peekable<USentenceBoundIndices<'t>>,
    position: Position,
    splitter: &'t SentenceSplitter,
}

impl<'t> Iterator for SentenceIter<'t> {
    type Item = RawSentence<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, first) = self.bounds.next()?;
        let mut end = start + first.len();

        while let Some((next_start, next)) = self.bounds.peek() {
            let current = &self.text[start..end];
            let next_is_whitespace = next.trim().is_empty();

            if next_is_whitespace || self.splitter.should_merge(current) {
                end = next_start + next.len();
                self.bounds.next();
            } else {
                break;
            }
        }

        let text = &self.text[start..end];
        let sentence = RawSentence {
            text,
            start: self.position,
        };
        self.position += Position::of_str(text);

        Some(sentence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn sentences(config: &SentenceConfig, text: &str) -> Vec<String> {
        SentenceSplitter::new(config)
            .split(text)
            .map(|x| x.text.to_owned())
            .collect()
    }

    #[test]
    fn splits_simple_sentences() {
        assert_eq!(
            sentences(&SentenceConfig::default(), "Hello there. How are you? Fine."),
            vec!["Hello there. ", "How are you? ", "Fine."]
        );
    }

    #[test]
    fn respects_abbreviations() {
        let config = SentenceConfig {
            abbreviations: vec!["Dr.".into()],
            ..SentenceConfig::default()
        };

        assert_eq!(
            sentences(&config, "I met Dr. Smith. He was nice."),
            vec!["I met Dr. Smith. ", "He was nice."]
        );
    }

    #[test]
    fn single_line_break_is_configurable() {
        let text = "This is\na sentence.\n\nNew paragraph";

        assert_eq!(
            sentences(&SentenceConfig::default(), text),
            vec!["This is\na sentence.\n\n", "New paragraph"]
        );

        let config = SentenceConfig {
            single_line_break_is_paragraph: true,
            ..SentenceConfig::default()
        };
        assert_eq!(
            sentences(&config, text),
            vec!["This is\n", "a sentence.\n\n", "New paragraph"]
        );
    }

    #[test]
    fn iteration_is_restartable() {
        let splitter = SentenceSplitter::default();
        let mut iter = splitter.split("One. Two. Three.");
        iter.next();

        let rest: Vec<_> = iter.clone().collect();
        assert_eq!(rest, iter.collect::<Vec<_>>());
        assert_eq!(rest[0].start, Position { byte: 5, char: 5 });
    }

    #[quickcheck]
    fn sentences_partition_text(text: String) -> bool {
        let splitter = SentenceSplitter::default();
        let mut position = Position::default();

        for sentence in splitter.split(&text) {
            if sentence.start != position {
                return false;
            }
            position += Position::of_str(sentence.text);
        }

        position == Position::of_str(&text)
    }
}
