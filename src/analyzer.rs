//! The analysis pipeline: sentence splitting, tokenization, tagging and disambiguation.

use std::sync::Arc;

use crate::{
    tokenizer::{
        disambiguate::Disambiguator,
        sentence::{RawSentence, SentenceSplitter},
        tag::Tagger,
        Tokenizer,
    },
    types::*,
};

/// Turns text into [AnalyzedSentence]s.
#[derive(Debug, Clone)]
pub struct Analyzer {
    tokenizer: Tokenizer,
    sentence_splitter: SentenceSplitter,
    tagger: Arc<Tagger>,
    disambiguator: Disambiguator,
}

impl Analyzer {
    pub fn new(
        tokenizer: Tokenizer,
        sentence_splitter: SentenceSplitter,
        tagger: Arc<Tagger>,
        disambiguator: Disambiguator,
    ) -> Self {
        Analyzer {
            tokenizer,
            sentence_splitter,
            tagger,
            disambiguator,
        }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn sentence_splitter(&self) -> &SentenceSplitter {
        &self.sentence_splitter
    }

    pub fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    pub fn disambiguator(&self) -> &Disambiguator {
        &self.disambiguator
    }

    /// Tokenizes and tags one sentence without disambiguation.
    /// `start` is the position of the sentence in the whole text.
    pub fn tag_sentence(&self, text: &str, start: Position) -> AnalyzedSentence {
        let raw_tokens = self.tokenizer.tokenize(text);

        let mut words = Vec::new();
        let mut spans = Vec::new();
        let mut spaces_before = Vec::new();

        for (i, raw) in raw_tokens.iter().enumerate() {
            if raw.is_whitespace() {
                continue;
            }

            words.push(raw.text);
            spans.push(raw.span.clone());
            spaces_before.push(i > 0 && raw_tokens[i - 1].is_whitespace());
        }

        let mut tokens: Vec<Token> = self
            .tagger
            .tag(&words)
            .into_iter()
            .zip(spans)
            .zip(spaces_before)
            .map(|((word, span), has_space_before)| Token::new(word, span, has_space_before))
            .collect();

        if let Some(last) = tokens.last_mut() {
            let data = WordData::new(last.text(), SENT_END);
            last.word_mut().tags_mut().push(data);
        }

        AnalyzedSentence::new(tokens, text.to_owned(), start)
    }

    fn analyze_raw(&self, sentence: RawSentence) -> AnalyzedSentence {
        let tagged = self.tag_sentence(sentence.text, sentence.start);
        self.disambiguator.disambiguate(&tagged)
    }

    /// Lazily analyzes the text sentence by sentence.
    pub fn analyze<'t>(&'t self, text: &'t str) -> impl Iterator<Item = AnalyzedSentence> + 't {
        self.sentence_splitter
            .split(text)
            .map(move |sentence| self.analyze_raw(sentence))
    }

    /// Analyzes a text which is known to be a single sentence.
    pub fn analyze_sentence(&self, text: &str) -> AnalyzedSentence {
        self.analyze_raw(RawSentence {
            text,
            start: Position::default(),
        })
    }
}
