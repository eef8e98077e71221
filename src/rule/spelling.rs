use std::{fmt, sync::Arc};

use crate::{
    rules::{Check, RuleMeta},
    spell::Speller,
    tokenizer::{is_url_or_email, tag::Tagger},
    types::*,
    utils::is_word,
    RuleError,
};

/// Flags words the speller does not know and suggests corrections.
/// Tokens which are immunized, marked to ignore spelling, part of a multiword, URLs or e-mail addresses are skipped.
#[derive(Clone)]
pub struct SpellingRule {
    meta: RuleMeta,
    speller: Arc<dyn Speller>,
}

impl fmt::Debug for SpellingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpellingRule").field("meta", &self.meta).finish()
    }
}

impl SpellingRule {
    pub fn new(meta: RuleMeta, speller: Arc<dyn Speller>) -> Self {
        SpellingRule { meta, speller }
    }

    pub fn speller(&self) -> &dyn Speller {
        self.speller.as_ref()
    }

    fn skip(token: &Token) -> bool {
        token.is_sentence_start()
            || token.is_immunized()
            || token.ignores_spelling()
            || token.multiword().is_some()
            || !is_word(token.text())
            || is_url_or_email(token.text())
    }
}

impl Check for SpellingRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn check(&self, sentence: &AnalyzedSentence, _tagger: &Tagger) -> Result<Vec<RuleMatch>, RuleError> {
        Ok(sentence
            .tokens()
            .iter()
            .filter(|token| !Self::skip(token) && !self.speller.is_correct(token.text()))
            .map(|token| {
                RuleMatch::new(
                    self.meta.id().clone(),
                    token.span().clone(),
                    "Possible spelling mistake found.".to_owned(),
                    "Spelling mistake".to_owned(),
                    self.speller.suggestions(token.text()),
                    self.meta.issue_type(),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rule::{
            id::Category,
            programmatic::tests::{sentence, tagger},
        },
        spell::{FstSpeller, SpellConfig, SpellDictionary},
    };

    fn rule() -> SpellingRule {
        let dictionary = SpellDictionary::from_word_list("this\nis\ngood\nword\n".as_bytes()).unwrap();
        let speller = FstSpeller::new(dictionary, SpellConfig::default()).unwrap();

        SpellingRule::new(
            RuleMeta::new(Category::new("TYPOS").join("SPELLING").join(0), "Spelling")
                .with_issue_type(IssueType::Misspelling),
            Arc::new(speller),
        )
    }

    #[test]
    fn flags_unknown_words() {
        let matches = rule().check(&sentence(&["This", "is", "gdoo", "."]), &tagger()).unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].span().char(), &(8..12));
        assert_eq!(matches[0].replacements(), &["good".to_owned()]);
        assert_eq!(matches[0].issue_type(), IssueType::Misspelling);
    }

    #[test]
    fn skips_ignored_tokens() {
        let mut sentence = sentence(&["Zolw", "www.example.com", "gdoo"]);
        sentence.tokens_mut()[3].ignore_spelling = true;

        let matches = rule().check(&sentence, &tagger()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].span().char(), &(0..4));
    }
}
