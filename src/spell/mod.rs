//! Structures and implementations related to spellchecking.

use fst::{IntoStreamer, Map, MapBuilder, Streamer};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BinaryHeap},
    fmt,
    io::{BufRead, BufReader, Read},
};
use unicode_categories::UnicodeCategories;

use crate::{
    components::Component,
    types::*,
    utils::{apply_to_first, is_title_case},
    Error,
};

mod levenshtein;

/// A spellchecking backend.
pub trait Speller: Send + Sync {
    fn is_correct(&self, word: &str) -> bool;

    /// Corrections for the word, best first.
    fn suggestions(&self, word: &str) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    distance: usize,
    freq: u64,
    term: String,
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // better candidates are smaller: lower distance, then higher frequency, then the term
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| other.freq.cmp(&self.freq))
            .then_with(|| self.term.cmp(&other.term))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Options to configure the spellchecker.
pub struct SpellConfig {
    /// The maximum edit distance to consider for corrections. Optimal String Alignment distance is used.
    pub max_distance: usize,
    /// A fixed prefix length for which to consider only edits with a distance of 1. This speeds up the search by pruning the tree early.
    pub prefix_length: usize,
    /// The maximum number of correction candidates to return.
    pub top_n: usize,
    /// Words which are always correct.
    pub ignore: DefaultHashSet<String>,
    /// Whether a hyphenated word is correct if all its parts are.
    pub split_hyphens: bool,
}

impl Default for SpellConfig {
    fn default() -> Self {
        SpellConfig {
            max_distance: 2,
            prefix_length: 2,
            top_n: 10,
            ignore: DefaultHashSet::default(),
            split_hyphens: true,
        }
    }
}

/// The known words of a language with their frequencies, stored as an FST.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SpellDictionary {
    fst: Vec<u8>,
    max_freq: u64,
}

impl fmt::Debug for SpellDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpellDictionary")
            .field("fst_bytes", &self.fst.len())
            .field("max_freq", &self.max_freq)
            .finish()
    }
}

impl Component for SpellDictionary {
    fn name() -> &'static str {
        "spelling"
    }
}

impl SpellDictionary {
    /// Reads a word list with one `word` or `word\tfrequency` entry per line.
    /// Empty lines and lines starting with `#` are ignored.
    pub fn from_word_list<R: Read>(reader: R) -> Result<Self, Error> {
        let mut words: BTreeMap<String, u64> = BTreeMap::new();

        for (i, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split('\t');
            let word = parts.next().unwrap_or_default();
            let freq = match parts.next() {
                Some(freq) => freq.trim().parse().map_err(|_| Error::InvalidEntry {
                    line: i + 1,
                    reason: format!("invalid frequency \"{}\"", freq),
                })?,
                None => 0,
            };

            let entry = words.entry(word.to_owned()).or_insert(0);
            *entry = (*entry).max(freq);
        }

        Self::from_words(words)
    }

    /// Builds the dictionary from words with their frequencies.
    pub fn from_words<I: IntoIterator<Item = (String, u64)>>(words: I) -> Result<Self, Error> {
        let words: BTreeMap<String, u64> = words.into_iter().collect();
        let max_freq = words.values().copied().max().unwrap_or(0);

        let mut builder = MapBuilder::memory();
        builder.extend_iter(words.into_iter())?;

        Ok(SpellDictionary {
            fst: builder.into_inner()?,
            max_freq,
        })
    }

    pub fn max_freq(&self) -> u64 {
        self.max_freq
    }
}

/// A [Speller] searching an FST with an edit-distance automaton.
#[derive(Clone)]
pub struct FstSpeller {
    map: Map<Vec<u8>>,
    config: SpellConfig,
}

impl fmt::Debug for FstSpeller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FstSpeller")
            .field("n_words", &self.map.len())
            .field("config", &self.config)
            .finish()
    }
}

impl FstSpeller {
    /// # Errors
    /// - If the dictionary does not contain a valid FST, e.g. because a stored file is corrupt.
    pub fn new(dictionary: SpellDictionary, config: SpellConfig) -> Result<Self, Error> {
        Ok(FstSpeller {
            map: Map::new(dictionary.fst)?,
            config,
        })
    }

    pub fn config(&self) -> &SpellConfig {
        &self.config
    }

    fn check_word(&self, word: &str, recurse: bool) -> bool {
        word.is_empty()
            || self.map.contains_key(word)
            || self.config.ignore.contains(word)
            || word
                .chars()
                .all(|x| x.is_symbol() || x.is_punctuation() || x.is_numeric())
            || (recurse
                // for title case words it is enough if the lowercase variant is known
                && is_title_case(word)
                && self.check_word(&apply_to_first(word, |x| x.to_lowercase().collect()), false))
    }

    fn search(&self, word: &str) -> Vec<Candidate> {
        let query = levenshtein::EditAutomaton::new(word, self.config.max_distance, self.config.prefix_length);
        let mut out = BinaryHeap::with_capacity(self.config.top_n + 1);

        let mut stream = self.map.search_with_state(query).into_stream();
        while let Some((k, freq, state)) = stream.next() {
            let state = match state {
                Some(state) => state,
                None => continue,
            };
            let term = match std::str::from_utf8(k) {
                Ok(term) => term.to_owned(),
                Err(_) => continue,
            };

            out.push(Candidate {
                distance: state.distance(),
                freq,
                term,
            });
            // the heap is a max-heap, so this drops the worst candidate
            if out.len() > self.config.top_n {
                out.pop();
            }
        }

        out.into_sorted_vec()
    }
}

impl Speller for FstSpeller {
    fn is_correct(&self, word: &str) -> bool {
        if self.check_word(word, true) {
            return true;
        }

        // there exist multiple valid hyphens, see https://jkorpela.fi/dashes.html
        let hyphens = &['-', '\u{2010}', '\u{2011}'][..];
        self.config.split_hyphens
            && word.contains(hyphens)
            && word.split(hyphens).all(|x| self.check_word(x, true))
    }

    fn suggestions(&self, word: &str) -> Vec<String> {
        if self.config.top_n == 0 {
            return Vec::new();
        }

        if is_title_case(word) {
            let lower = apply_to_first(word, |x| x.to_lowercase().collect());
            let mut candidates = self.search(word);
            candidates.extend(self.search(&lower).into_iter().map(|mut x| {
                x.term = apply_to_first(&x.term, |c| c.to_uppercase().collect());
                x
            }));
            candidates.sort();

            let mut terms: Vec<String> = Vec::new();
            for candidate in candidates {
                if !terms.contains(&candidate.term) && candidate.term != word {
                    terms.push(candidate.term);
                }
            }
            terms.truncate(self.config.top_n);
            terms
        } else {
            self.search(word)
                .into_iter()
                .map(|x| x.term)
                .filter(|x| x != word)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speller(config: SpellConfig) -> FstSpeller {
        let dictionary = SpellDictionary::from_word_list(
            "house\t100\nhorse\t50\nhouses\t10\nmouse\t80\nwell\t30\nknown\t30\n".as_bytes(),
        )
        .unwrap();
        FstSpeller::new(dictionary, config).unwrap()
    }

    #[test]
    fn known_words_are_correct() {
        let speller = speller(SpellConfig::default());

        assert!(speller.is_correct("house"));
        assert!(speller.is_correct("House"));
        assert!(!speller.is_correct("HOUSE"));
        assert!(speller.is_correct("1984"));
        assert!(speller.is_correct("..."));
        assert!(!speller.is_correct("hosue"));
    }

    #[test]
    fn hyphenated_words() {
        assert!(speller(SpellConfig::default()).is_correct("well-known"));

        let config = SpellConfig {
            split_hyphens: false,
            ..SpellConfig::default()
        };
        assert!(!speller(config).is_correct("well-known"));
    }

    #[test]
    fn ignored_words_are_correct() {
        let mut config = SpellConfig::default();
        config.ignore.insert("langrule".to_owned());

        assert!(speller(config).is_correct("langrule"));
    }

    #[test]
    fn suggestions_are_ranked() {
        let speller = speller(SpellConfig::default());

        // distance first, then frequency
        assert_eq!(
            speller.suggestions("hose")[..4],
            ["house".to_owned(), "horse".to_owned(), "mouse".to_owned(), "houses".to_owned()]
        );
        assert_eq!(speller.suggestions("Hosue")[0], "House");
    }

    #[test]
    fn top_n_limits_suggestions() {
        let config = SpellConfig {
            top_n: 1,
            ..SpellConfig::default()
        };

        assert_eq!(speller(config).suggestions("hose"), vec!["house".to_owned()]);
    }

    #[test]
    fn invalid_frequency_is_an_error() {
        assert!(matches!(
            SpellDictionary::from_word_list("house\tmany\n".as_bytes()),
            Err(Error::InvalidEntry { line: 1, .. })
        ));
    }
}
