//! Part-of-speech tagging by dictionary lookup.

use crate::{
    components::Component,
    types::*,
    utils::{apply_to_first, is_title_case, is_uppercase},
    Error,
};
use serde::{Deserialize, Serialize};
use std::{
    io::{BufRead, BufReader, Read},
    sync::Arc,
};

/// A read-only store mapping words to their readings.
pub trait Dictionary: Send + Sync {
    /// All readings of the exact word. Empty if the word is unknown.
    fn lookup(&self, word: &str) -> Vec<WordData>;

    /// All known word forms with the given lemma.
    fn forms(&self, _lemma: &str) -> Vec<String> {
        Vec::new()
    }
}

/// A dictionary held in memory, read from a tab-separated dump of `word\tlemma\ttag` lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordDictionary {
    tags: DefaultHashMap<String, Vec<WordData>>,
    groups: DefaultHashMap<String, Vec<String>>,
}

impl WordDictionary {
    /// Reads a dump. Empty lines and lines starting with `#` are ignored.
    pub fn from_dump<R: Read>(reader: R) -> Result<Self, Error> {
        let mut dictionary = WordDictionary::default();

        for (i, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<_> = line.split('\t').collect();
            match parts.as_slice() {
                [word, lemma, tag] => dictionary.insert(word, lemma, tag),
                _ => {
                    return Err(Error::InvalidEntry {
                        line: i + 1,
                        reason: format!("expected three tab-separated fields, found {}", parts.len()),
                    })
                }
            }
        }

        Ok(dictionary)
    }

    pub fn insert(&mut self, word: &str, lemma: &str, tag: &str) {
        let group = self.groups.entry(lemma.to_owned()).or_insert_with(Vec::new);
        if !group.iter().any(|x| x == word) {
            group.push(word.to_owned());
        }

        let data = WordData::new(lemma, tag);
        let tags = self.tags.entry(word.to_owned()).or_insert_with(Vec::new);
        if !tags.contains(&data) {
            tags.push(data);
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Dictionary for WordDictionary {
    fn lookup(&self, word: &str) -> Vec<WordData> {
        self.tags.get(word).cloned().unwrap_or_else(Vec::new)
    }

    fn forms(&self, lemma: &str) -> Vec<String> {
        self.groups.get(lemma).cloned().unwrap_or_else(Vec::new)
    }
}

impl Component for WordDictionary {
    fn name() -> &'static str {
        "tags"
    }
}

/// Guesses a reading for unknown words ending with `suffix`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuffixGuess {
    pub suffix: String,
    pub pos: String,
    /// Replaces the suffix to form the lemma.
    #[serde(default)]
    pub lemma_suffix: String,
}

/// Options of the tagger of one language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Whether to add the readings of the lowercase variant of title or upper case words even if they are known.
    #[serde(default)]
    pub always_add_lower_tags: bool,
    /// Whether to tag unknown long words by their longest known suffix (compounds).
    #[serde(default)]
    pub use_compound_split_heuristic: bool,
    /// Readings guessed for words which are still unknown, checked in order.
    #[serde(default)]
    pub suffix_guesses: Vec<SuffixGuess>,
}

/// Assigns readings to words.
#[derive(Clone)]
pub struct Tagger {
    dictionary: Arc<dyn Dictionary>,
    config: TaggerConfig,
}

impl std::fmt::Debug for Tagger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tagger")
            .field("config", &self.config)
            .finish()
    }
}

impl Tagger {
    pub fn new(dictionary: Arc<dyn Dictionary>, config: TaggerConfig) -> Self {
        Tagger { dictionary, config }
    }

    pub fn dictionary(&self) -> &dyn Dictionary {
        self.dictionary.as_ref()
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    fn get_strict_tags(&self, word: &str, add_lower: bool, add_lower_if_empty: bool) -> Vec<WordData> {
        let mut tags = self.dictionary.lookup(word);
        let lower = word.to_lowercase();

        if (add_lower || (add_lower_if_empty && tags.is_empty()))
            && (word != lower && (is_title_case(word) || is_uppercase(word)))
        {
            for data in self.dictionary.lookup(&lower) {
                if !tags.contains(&data) {
                    tags.push(data);
                }
            }
        }

        tags
    }

    fn guess_tags(&self, word: &str) -> Vec<WordData> {
        for guess in &self.config.suffix_guesses {
            // at least two chars of stem
            if word.ends_with(guess.suffix.as_str())
                && word.chars().count() >= guess.suffix.chars().count() + 2
            {
                let stem = &word[..word.len() - guess.suffix.len()];
                let lemma = format!("{}{}", stem.to_lowercase(), guess.lemma_suffix);

                return vec![WordData::new(lemma, guess.pos.as_str())];
            }
        }

        Vec::new()
    }

    /// All readings of a word. Empty if the word is unknown.
    /// * `add_lower`: also adds the readings of the lowercase word, e.g. at sentence start.
    pub fn get_tags(&self, word: &str, add_lower: bool) -> Vec<WordData> {
        let mut tags =
            self.get_strict_tags(word, add_lower || self.config.always_add_lower_tags, true);

        // compound splitting heuristic
        if self.config.use_compound_split_heuristic && tags.is_empty() {
            let n_chars = word.chars().count();

            if n_chars >= 7 {
                let starts_uppercase = word.chars().next().map_or(false, char::is_uppercase);
                let indices = word
                    .char_indices()
                    .take(n_chars.saturating_sub(4))
                    .skip(1)
                    .map(|x| x.0);

                for i in indices {
                    let next = if starts_uppercase {
                        apply_to_first(&word[i..], |c| c.to_uppercase().collect())
                    } else {
                        word[i..].to_owned()
                    };

                    let next_tags = self.get_strict_tags(&next, false, false);

                    if !next_tags.is_empty() {
                        tags = next_tags
                            .into_iter()
                            .filter_map(|x| {
                                let lemma = x.lemma()?.to_lowercase();
                                let pos = x.pos()?;
                                Some(WordData::new(format!("{}{}", &word[..i], lemma), pos))
                            })
                            .collect();
                        break;
                    }
                }
            }
        }

        if tags.is_empty() {
            tags = self.guess_tags(word);
        }

        tags
    }

    /// Tags the words of one sentence, one [Word] per input in the same order.
    /// Unknown words get the null reading. The first word is treated as sentence-initial.
    pub fn tag(&self, words: &[&str]) -> Vec<Word> {
        words
            .iter()
            .enumerate()
            .map(|(i, word)| Word::new_with_tags(*word, self.get_tags(word, i == 0)))
            .collect()
    }

    /// Creates a token for an unknown word.
    pub fn create_null_token(&self, text: &str, span: Span, has_space_before: bool) -> Token {
        Token::new(
            Word::new_with_tags(text, vec![WordData::null()]),
            span,
            has_space_before,
        )
    }

    /// Creates a token with the given readings. Without readings, the token gets the null reading.
    pub fn create_token(
        &self,
        text: &str,
        readings: Vec<WordData>,
        span: Span,
        has_space_before: bool,
    ) -> Token {
        Token::new(Word::new_with_tags(text, readings), span, has_space_before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagger(config: TaggerConfig) -> Tagger {
        let dump = "# test dictionary\nhouse\thouse\tNN\nhouse\thouse\tVB\nboat\tboat\tNN\nthe\tthe\tDT\n";
        let dictionary = WordDictionary::from_dump(dump.as_bytes()).unwrap();

        Tagger::new(Arc::new(dictionary), config)
    }

    #[test]
    fn looks_up_all_readings() {
        let tags = tagger(TaggerConfig::default()).get_tags("house", false);

        assert_eq!(
            tags,
            vec![WordData::new("house", "NN"), WordData::new("house", "VB")]
        );
    }

    #[test]
    fn falls_back_to_lowercase() {
        let tagger = tagger(TaggerConfig::default());

        assert_eq!(tagger.get_tags("The", false), vec![WordData::new("the", "DT")]);
        assert_eq!(tagger.get_tags("THE", false), vec![WordData::new("the", "DT")]);
    }

    #[test]
    fn unknown_words_get_the_null_reading() {
        let words = tagger(TaggerConfig::default()).tag(&["Zolw", "house"]);

        assert_eq!(words[0].tags(), &[WordData::null()]);
        assert_eq!(words[1].tags().len(), 2);
    }

    #[test]
    fn splits_compounds() {
        let tagger = tagger(TaggerConfig {
            use_compound_split_heuristic: true,
            ..TaggerConfig::default()
        });

        assert_eq!(
            tagger.get_tags("shiphouse", false),
            vec![
                WordData::new("shiphouse", "NN"),
                WordData::new("shiphouse", "VB")
            ]
        );
        assert!(tagger.get_tags("boat", false).len() == 1);
    }

    #[test]
    fn guesses_by_suffix() {
        let tagger = tagger(TaggerConfig {
            suffix_guesses: vec![SuffixGuess {
                suffix: "ly".into(),
                pos: "RB".into(),
                lemma_suffix: String::new(),
            }],
            ..TaggerConfig::default()
        });

        assert_eq!(tagger.get_tags("zorkly", false), vec![WordData::new("zork", "RB")]);
        assert!(tagger.get_tags("ly", false).is_empty());
    }

    #[test]
    fn creates_tokens() {
        let tagger = tagger(TaggerConfig::default());
        let start = Position { byte: 4, char: 4 };

        let token = tagger.create_null_token("Zolw", Span::from_str_at("Zolw", start), true);
        assert_eq!(token.text(), "Zolw");
        assert_eq!(token.tags(), &[WordData::null()]);
        assert_eq!(token.span().char(), &(4..8));
        assert!(token.has_space_before());

        let readings = tagger.get_tags("house", false);
        let token = tagger.create_token("house", readings.clone(), Span::from_str_at("house", start), false);
        assert_eq!(token.tags(), readings.as_slice());
        assert_eq!(token.span().byte(), &(4..9));
        assert!(!token.has_space_before());

        let token = tagger.create_token("Zolw", Vec::new(), Span::from_str_at("Zolw", start), true);
        assert_eq!(token.tags(), &[WordData::null()]);
    }

    #[test]
    fn bad_dump_line_is_an_error() {
        assert!(matches!(
            WordDictionary::from_dump("house\tNN".as_bytes()),
            Err(Error::InvalidEntry { line: 1, .. })
        ));
    }
}
