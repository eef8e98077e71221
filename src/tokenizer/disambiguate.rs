//! Reduces the ambiguity of token readings before rules are checked.

use super::multiword::MultiwordChunker;
use crate::{rule::DisambiguationRule, types::AnalyzedSentence};

/// A disambiguation strategy. Never changes the number or the text of tokens.
#[derive(Debug, Clone)]
pub enum Disambiguator {
    /// Leaves the sentence unchanged.
    Null,
    /// Marks fixed multi-word phrases.
    Multiword(MultiwordChunker),
    /// Applies rules in order, each rule sees the changes of the rules before it.
    Rules(Vec<DisambiguationRule>),
    /// Runs disambiguators in a fixed order.
    Hybrid(Vec<Disambiguator>),
}

impl Default for Disambiguator {
    fn default() -> Self {
        Disambiguator::Null
    }
}

impl Disambiguator {
    fn apply(&self, sentence: &mut AnalyzedSentence) {
        match self {
            Disambiguator::Null => {}
            Disambiguator::Multiword(chunker) => chunker.apply(sentence.tokens_mut()),
            Disambiguator::Rules(rules) => {
                for rule in rules {
                    rule.apply(sentence);
                }
            }
            Disambiguator::Hybrid(disambiguators) => {
                for disambiguator in disambiguators {
                    disambiguator.apply(sentence);
                }
            }
        }
    }

    /// Returns the disambiguated sentence. The input stays untouched, so one tagged sentence
    /// can be shared between disambiguators.
    pub fn disambiguate(&self, sentence: &AnalyzedSentence) -> AnalyzedSentence {
        let mut output = sentence.clone();
        self.apply(&mut output);
        output
    }
}
