//! Rules implemented in code rather than by a pattern.

use std::{
    fmt,
    io::{BufRead, BufReader, Read},
    sync::Arc,
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    rules::{Check, RuleMeta},
    tokenizer::tag::Tagger,
    types::*,
    utils::{is_word, transfer_case},
    Error, RuleError,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WordRepeatConfig {
    /// Words which may be repeated, compared case-insensitively (e.g. "had had").
    pub ignore: Vec<String>,
}

/// Flags a word directly followed by the same word, e.g. "the the".
#[derive(Debug, Clone)]
pub struct WordRepeatRule {
    meta: RuleMeta,
    ignore: DefaultHashSet<String>,
}

impl WordRepeatRule {
    pub fn new(meta: RuleMeta, config: &WordRepeatConfig) -> Self {
        WordRepeatRule {
            meta,
            ignore: config.ignore.iter().map(|x| x.to_lowercase()).collect(),
        }
    }

    fn is_repetition(&self, previous: &Token, token: &Token) -> bool {
        if previous.is_sentence_start() || !is_word(token.text()) {
            return false;
        }

        let lower = token.text().to_lowercase();
        lower == previous.text().to_lowercase() && !self.ignore.contains(&lower)
    }
}

impl Check for WordRepeatRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn check(&self, sentence: &AnalyzedSentence, _tagger: &Tagger) -> Result<Vec<RuleMatch>, RuleError> {
        let tokens = sentence.tokens();
        let mut matches = Vec::new();
        let mut i = 1;

        while i + 1 < tokens.len() {
            let (previous, token) = (&tokens[i], &tokens[i + 1]);

            if self.is_repetition(previous, token) {
                matches.push(RuleMatch::new(
                    self.meta.id().clone(),
                    previous.span().join(token.span()),
                    "Possible typo: you repeated a word.".to_owned(),
                    "Word repetition".to_owned(),
                    vec![previous.text().to_owned()],
                    self.meta.issue_type(),
                ));
                // "the the the" is one match followed by another, not two overlapping ones
                i += 2;
            } else {
                i += 1;
            }
        }

        Ok(matches)
    }
}

/// Reads `wrong=right1|right2` lines. Empty lines and lines starting with `#` are ignored.
pub fn read_replacements<R: Read>(reader: R) -> Result<DefaultHashMap<String, Vec<String>>, Error> {
    let mut replacements = DefaultHashMap::default();

    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (wrong, right) = match line.split_once('=') {
            Some((wrong, right)) if !wrong.trim().is_empty() && !right.trim().is_empty() => {
                (wrong.trim(), right)
            }
            _ => {
                return Err(Error::InvalidEntry {
                    line: i + 1,
                    reason: format!("expected `wrong=right`, found \"{}\"", line),
                })
            }
        };

        replacements.insert(
            wrong.to_owned(),
            right.split('|').map(|x| x.trim().to_owned()).collect(),
        );
    }

    Ok(replacements)
}

/// Flags words from a fixed list and suggests their replacements.
#[derive(Debug, Clone)]
pub struct SimpleReplaceRule {
    meta: RuleMeta,
    replacements: DefaultHashMap<String, Vec<String>>,
}

impl SimpleReplaceRule {
    pub fn new(meta: RuleMeta, replacements: DefaultHashMap<String, Vec<String>>) -> Self {
        SimpleReplaceRule {
            meta,
            replacements: replacements
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
        }
    }

    /// Reads a replacement list, see [read_replacements].
    pub fn from_reader<R: Read>(meta: RuleMeta, reader: R) -> Result<Self, Error> {
        Ok(Self::new(meta, read_replacements(reader)?))
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }
}

impl Check for SimpleReplaceRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn check(&self, sentence: &AnalyzedSentence, _tagger: &Tagger) -> Result<Vec<RuleMatch>, RuleError> {
        let mut matches = Vec::new();

        for token in sentence.tokens().iter().skip(1) {
            let replacements = match self.replacements.get(&token.text().to_lowercase()) {
                Some(replacements) => replacements,
                None => continue,
            };

            let replacements: Vec<String> = replacements
                .iter()
                .map(|x| transfer_case(token.text(), x))
                .collect();

            let message = format!(
                "Did you mean {}?",
                replacements.iter().map(|x| format!("\"{}\"", x)).join(" or ")
            );

            matches.push(RuleMatch::new(
                self.meta.id().clone(),
                token.span().clone(),
                message,
                "Possible typo".to_owned(),
                replacements,
                self.meta.issue_type(),
            ));
        }

        Ok(matches)
    }
}

pub type CheckFn =
    dyn Fn(&AnalyzedSentence, &RuleMeta) -> Result<Vec<RuleMatch>, RuleError> + Send + Sync;

/// A rule backed by a user-supplied function.
#[derive(Clone)]
pub struct CustomRule {
    meta: RuleMeta,
    check: Arc<CheckFn>,
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRule").field("meta", &self.meta).finish()
    }
}

impl CustomRule {
    pub fn new<F>(meta: RuleMeta, check: F) -> Self
    where
        F: Fn(&AnalyzedSentence, &RuleMeta) -> Result<Vec<RuleMatch>, RuleError> + Send + Sync + 'static,
    {
        CustomRule {
            meta,
            check: Arc::new(check),
        }
    }
}

impl Check for CustomRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn check(&self, sentence: &AnalyzedSentence, _tagger: &Tagger) -> Result<Vec<RuleMatch>, RuleError> {
        (self.check)(sentence, &self.meta)
    }
}
