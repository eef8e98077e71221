use super::engine::composition::{MatchGraph, Matcher};
use crate::types::*;
use crate::{
    tokenizer::tag::Tagger,
    utils::{self, regex::Regex},
};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Nop,
    AllLower,
    StartLower,
    AllUpper,
    StartUpper,
}

impl Conversion {
    fn convert(&self, input: &str) -> String {
        match &self {
            Conversion::Nop => input.to_string(),
            Conversion::AllLower => input.to_lowercase(),
            Conversion::StartLower => utils::apply_to_first(input, |c| c.to_lowercase().collect()),
            Conversion::AllUpper => input.to_uppercase(),
            Conversion::StartUpper => utils::apply_to_first(input, |c| c.to_uppercase().collect()),
        }
    }
}

/// An example associated with a [PatternRule][super::PatternRule].
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub(crate) text: String,
    pub(crate) correction: Option<String>,
}

impl Example {
    pub fn new(text: String, correction: Option<String>) -> Self {
        Example { text, correction }
    }

    /// Gets the text of this example.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Gets the corrected text.
    /// * If this is `None`, the associated rule should not trigger for this example.
    /// * If it is `Some`, the rule should match once, and applying its first replacement gives this text.
    pub fn correction(&self) -> Option<&str> {
        self.correction.as_deref()
    }
}

/// Replaces a word by the form of its lemma with a matching part-of-speech tag, e.g. "go" -> "goes" for `VBZ`.
#[derive(Debug, Clone)]
pub struct PosReplacer {
    pub(crate) matcher: Matcher,
}

impl PosReplacer {
    fn apply(&self, token: &Token, tagger: &Tagger) -> Option<String> {
        let mut lemmas: Vec<&str> = token.tags().iter().filter_map(|x| x.lemma()).collect();
        lemmas.dedup();

        for lemma in lemmas {
            for form in tagger.dictionary().forms(lemma) {
                let is_match = tagger
                    .get_tags(&form, false)
                    .iter()
                    .any(|x| x.lemma() == Some(lemma) && self.matcher.is_match(x.pos()));

                if is_match {
                    return Some(utils::transfer_case(token.text(), &form));
                }
            }
        }

        None
    }
}

/// A reference to the text of a matched group, `\N` in rule definitions.
#[derive(Debug, Clone)]
pub struct Match {
    pub(crate) id: usize,
    pub(crate) conversion: Conversion,
    pub(crate) use_lemma: bool,
    pub(crate) pos_replacer: Option<PosReplacer>,
    pub(crate) regex_replacer: Option<(Regex, String)>,
}

impl Match {
    pub fn new(id: usize) -> Self {
        Match {
            id,
            conversion: Conversion::Nop,
            use_lemma: false,
            pos_replacer: None,
            regex_replacer: None,
        }
    }

    fn group_text<'a>(&self, graph: &MatchGraph, text: &'a str) -> &'a str {
        graph
            .token_range(self.id..self.id + 1)
            .and_then(|range| graph.span(range))
            .map_or("", |span| &text[span.byte().clone()])
    }

    fn apply(&self, graph: &MatchGraph, text: &str, tagger: &Tagger) -> Option<String> {
        let first_token = graph
            .token_range(self.id..self.id + 1)
            .map(|range| &graph.tokens()[range.start]);

        let mut output = match (first_token, &self.pos_replacer) {
            (Some(token), Some(replacer)) => replacer.apply(token, tagger)?,
            (Some(token), None) if self.use_lemma => token
                .tags()
                .iter()
                .find_map(|x| x.lemma())
                .unwrap_or_else(|| token.text())
                .to_owned(),
            _ => self.group_text(graph, text).to_owned(),
        };

        if let Some((regex, replacement)) = &self.regex_replacer {
            output = regex.replace_all(&output, replacement);
        }

        Some(self.conversion.convert(&output))
    }

    fn has_conversion(&self) -> bool {
        !matches!(self.conversion, Conversion::Nop)
    }
}

#[derive(Debug, Clone)]
pub enum SynthesizerPart {
    Text(String),
    Match(Match),
}

/// Builds a message or a suggestion from literal text and the text of matched groups.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    pub(crate) use_titlecase_adjust: bool,
    pub(crate) parts: Vec<SynthesizerPart>,
}

impl Synthesizer {
    pub fn new(parts: Vec<SynthesizerPart>, use_titlecase_adjust: bool) -> Self {
        Synthesizer {
            use_titlecase_adjust,
            parts,
        }
    }

    /// The highest group id referenced.
    pub fn max_id(&self) -> usize {
        self.parts
            .iter()
            .filter_map(|x| match x {
                SynthesizerPart::Match(m) => Some(m.id),
                SynthesizerPart::Text(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Synthesizes the text. `None` if a part could not be synthesized (e.g. no word form with the requested tag exists).
    /// * `text`: the text of the sentence.
    /// * `ids`: the group ids of the marked tokens.
    pub fn apply(
        &self,
        graph: &MatchGraph,
        text: &str,
        tagger: &Tagger,
        ids: Range<usize>,
    ) -> Option<String> {
        let mut output = Vec::new();

        let starts_with_conversion = match &self.parts[..] {
            [SynthesizerPart::Match(m), ..] => m.has_conversion(),
            _ => false,
        };

        for part in &self.parts {
            match part {
                SynthesizerPart::Text(t) => output.push(t.clone()),
                SynthesizerPart::Match(m) => {
                    output.push(m.apply(graph, text, tagger)?);
                }
            }
        }

        let synthesized = utils::normalize_whitespace(&output.join(""));

        if !self.use_titlecase_adjust || starts_with_conversion {
            return Some(synthesized);
        }

        // make it title case if the replaced text is title case or at sentence start
        let make_uppercase = graph
            .token_range(ids)
            .map(|range| {
                let first_token = &graph.tokens()[range.start];
                let at_sentence_start = graph.tokens()[..range.start]
                    .iter()
                    .all(|x| x.is_sentence_start());

                at_sentence_start
                    || first_token
                        .text()
                        .chars()
                        .next()
                        .map_or(false, char::is_uppercase)
            })
            .unwrap_or(false);

        if make_uppercase {
            Some(utils::apply_to_first(&synthesized, |x| {
                x.to_uppercase().collect()
            }))
        } else {
            Some(synthesized)
        }
    }
}
