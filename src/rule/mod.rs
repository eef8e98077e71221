//! Implementations related to single rules.

use crate::{
    analyzer::Analyzer,
    rules::{apply_suggestions, RuleMeta},
    tokenizer::tag::Tagger,
    types::*,
    utils,
};
use log::{debug, warn};
use std::ops::Range;

pub mod disambiguation;
pub mod engine;
pub mod from_structure;
pub mod grammar;
pub mod id;
pub mod programmatic;
pub mod spelling;

use disambiguation::Disambiguation;
use engine::TokenEngine;
use grammar::{Example, Synthesizer};

/// A disambiguation rule. Changes the readings of the marked tokens wherever its pattern matches.
#[derive(Debug, Clone)]
pub struct DisambiguationRule {
    pub(crate) id: String,
    pub(crate) engine: TokenEngine,
    pub(crate) disambiguation: Disambiguation,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl DisambiguationRule {
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Applies the rule to all matches in the sentence. Returns whether any token changed.
    pub fn apply(&self, sentence: &mut AnalyzedSentence) -> bool {
        if matches!(self.disambiguation, Disambiguation::Nop) {
            return false;
        }

        let ranges: Vec<Range<usize>> = self
            .engine
            .get_matches(sentence, false)
            .iter()
            .filter_map(|graph| graph.token_range(self.start..self.end))
            .collect();

        if ranges.is_empty() {
            return false;
        }

        let mut changed = false;
        for range in ranges {
            let tokens = &mut sentence.tokens_mut()[range];
            let before: Vec<Token> = tokens.to_vec();

            self.disambiguation.apply(tokens);
            changed |= before.as_slice() != &*tokens;
        }

        if changed {
            debug!("disambiguation rule {} changed \"{}\"", self.id, sentence.text());
        }

        changed
    }
}

/// A rule defined by a token pattern.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub(crate) meta: RuleMeta,
    pub(crate) engine: TokenEngine,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) message: Synthesizer,
    pub(crate) short_message: String,
    pub(crate) suggesters: Vec<Synthesizer>,
    pub(crate) find_all: bool,
    pub(crate) examples: Vec<Example>,
}

impl PatternRule {
    pub fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    pub fn engine(&self) -> &TokenEngine {
        &self.engine
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// Finds all matches of this rule in the sentence. Spans are relative to the sentence.
    pub fn apply(&self, sentence: &AnalyzedSentence, tagger: &Tagger) -> Vec<RuleMatch> {
        let mut matches = Vec::new();
        let text = sentence.text();

        for graph in self.engine.get_matches(sentence, self.find_all) {
            let range = match graph.token_range(self.start..self.end) {
                Some(range) => range,
                None => continue,
            };
            let mut span = match graph.span(range.clone()) {
                Some(span) if !span.is_empty() => span,
                _ => continue,
            };

            let marked_text = &text[span.byte().clone()];
            let mut replacements: Vec<String> = Vec::new();
            for suggester in &self.suggesters {
                if let Some(replacement) = suggester.apply(&graph, text, tagger, self.start..self.end) {
                    // fix e.g. "Super , dass"
                    let replacement = utils::fix_nospace_chars(&replacement);

                    if replacement != marked_text && !replacements.contains(&replacement) {
                        replacements.push(replacement);
                    }
                }
            }

            // punctuation suggestions also replace the whitespace in front of the marked tokens
            if !replacements.is_empty()
                && replacements
                    .iter()
                    .all(|x| utils::no_space_chars().chars().any(|c| x.starts_with(c)))
                && range.start > 1
            {
                let previous = &sentence.tokens()[range.start - 1];
                span = Span::new(
                    previous.span().byte().end..span.byte().end,
                    previous.span().char().end..span.char().end,
                );
            }

            let message = self
                .message
                .apply(&graph, text, tagger, self.start..self.end)
                .unwrap_or_else(|| self.meta.description().to_owned());

            matches.push(RuleMatch::new(
                self.meta.id().clone(),
                span,
                message,
                self.short_message.clone(),
                replacements,
                self.meta.issue_type(),
            ));
        }

        matches
    }

    /// Checks the rule against its examples. Failures are logged.
    pub fn test(&self, analyzer: &Analyzer) -> bool {
        let mut passes = Vec::new();

        for example in &self.examples {
            let matches: Vec<RuleMatch> = analyzer
                .analyze(example.text())
                .flat_map(|sentence| {
                    let start = sentence.start();
                    self.apply(&sentence, analyzer.tagger())
                        .into_iter()
                        .map(move |x| x.rshift(start))
                })
                .collect();

            let pass = match example.correction() {
                Some(correction) => {
                    matches.len() == 1 && apply_suggestions(example.text(), &matches) == correction
                }
                None => matches.is_empty(),
            };

            if !pass {
                warn!(
                    "Rule {}: example \"{}\" failed. Expected: {:?}. Found: {:#?}.",
                    self.meta.id(),
                    example.text(),
                    example.correction(),
                    matches
                );
            }

            passes.push(pass);
        }

        passes.iter().all(|x| *x)
    }
}
