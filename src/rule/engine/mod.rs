//! Matches token patterns against analyzed sentences.

use std::ops::Range;

use crate::types::*;

pub mod composition;

use composition::{Composition, MatchGraph};

/// A pattern together with its antipatterns.
/// A match of the pattern is discarded if it shares a token with any match of an antipattern.
#[derive(Debug, Clone)]
pub struct TokenEngine {
    pub(crate) composition: Composition,
    pub(crate) antipatterns: Vec<Composition>,
}

impl TokenEngine {
    pub fn new(composition: Composition, antipatterns: Vec<Composition>) -> Self {
        TokenEngine {
            composition,
            antipatterns,
        }
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// Token ranges of all antipattern matches in the sentence, computed once per sentence.
    fn blocked_ranges(&self, tokens: &[Token]) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();

        for antipattern in &self.antipatterns {
            for i in 0..tokens.len() {
                if let Some(graph) = antipattern.apply(tokens, i) {
                    ranges.push(graph.range());
                }
            }
        }

        ranges
    }

    /// Finds the matches in the sentence.
    ///
    /// Start positions are scanned left to right. Without `find_all`, scanning continues after the end of
    /// each match, so the matches do not overlap. With `find_all`, every start position is tried.
    pub fn get_matches<'t>(&'t self, sentence: &'t AnalyzedSentence, find_all: bool) -> Vec<MatchGraph<'t>> {
        let tokens = sentence.tokens();
        let blocked = self.blocked_ranges(tokens);
        let mut graphs = Vec::new();

        let mut i = 0;
        while i < tokens.len() {
            let graph = match self.composition.apply(tokens, i) {
                Some(graph) => graph,
                None => {
                    i += 1;
                    continue;
                }
            };

            let range = graph.range();
            if blocked
                .iter()
                .any(|x| x.start < range.end && range.start < x.end)
            {
                i += 1;
                continue;
            }

            i = if find_all { i + 1 } else { range.end.max(i + 1) };
            graphs.push(graph);
        }

        graphs
    }
}

#[cfg(test)]
mod tests {
    use super::composition::{concrete::TextAtom, Matcher, Part, Quantifier};
    use super::*;

    fn sentence(text: &str) -> AnalyzedSentence {
        let mut position = Position::default();
        let tokens = text
            .split(' ')
            .map(|word| {
                let span = Span::from_str_at(word, position);
                position = span.end() + Position { byte: 1, char: 1 };
                Token::new(Word::new_with_tags(word, Vec::new()), span, true)
            })
            .collect();

        AnalyzedSentence::new(tokens, text.to_owned(), Position::default())
    }

    fn words(words: &[&str]) -> Composition {
        Composition::new(
            words
                .iter()
                .map(|x| {
                    Part::new(
                        TextAtom::new(Matcher::new_string((*x).into(), false, false)).into(),
                        Quantifier::one(),
                        true,
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn leftmost_first_without_overlaps() {
        let sentence = sentence("a a a");
        let engine = TokenEngine::new(words(&["a", "a"]), Vec::new());

        let ranges: Vec<_> = engine
            .get_matches(&sentence, false)
            .iter()
            .map(|x| x.range())
            .collect();
        assert_eq!(ranges, vec![1..3]);

        let ranges: Vec<_> = engine
            .get_matches(&sentence, true)
            .iter()
            .map(|x| x.range())
            .collect();
        assert_eq!(ranges, vec![1..3, 2..4]);
    }

    #[test]
    fn antipatterns_block_overlapping_matches() {
        let sentence = sentence("a b c a b");
        let engine = TokenEngine::new(words(&["a", "b"]), vec![words(&["b", "c"])]);

        let ranges: Vec<_> = engine
            .get_matches(&sentence, false)
            .iter()
            .map(|x| x.range())
            .collect();
        assert_eq!(ranges, vec![4..6]);
    }
}
