//! English, built into the crate.

use super::{Language, LanguageResources};
use crate::{
    rule::{
        from_structure::{read_disambiguation_rules, read_grammar_rules},
        programmatic::read_replacements,
    },
    spell::SpellDictionary,
    tokenizer::{multiword::MultiwordChunker, tag::WordDictionary},
    Error,
};

const CONFIG: &str = include_str!("../../data/en/config.json");
const TAGS: &str = include_str!("../../data/en/tags.txt");
const MULTIWORDS: &str = include_str!("../../data/en/multiwords.txt");
const DISAMBIGUATION: &str = include_str!("../../data/en/disambiguation.json");
const GRAMMAR: &str = include_str!("../../data/en/grammar.json");
const SPELLING: &str = include_str!("../../data/en/spelling.txt");
const REPLACEMENTS: &str = include_str!("../../data/en/replacements.txt");

/// Parses the embedded English resources.
pub fn resources() -> Result<LanguageResources, Error> {
    Ok(LanguageResources {
        config: serde_json::from_str(CONFIG)?,
        dictionary: WordDictionary::from_dump(TAGS.as_bytes())?,
        multiwords: MultiwordChunker::from_lines(MULTIWORDS)?,
        disambiguation_rules: read_disambiguation_rules(DISAMBIGUATION)?,
        grammar_rules: read_grammar_rules(GRAMMAR)?,
        spelling: Some(SpellDictionary::from_word_list(SPELLING.as_bytes())?),
        replacements: read_replacements(REPLACEMENTS.as_bytes())?,
    })
}

/// Builds the English language.
/// # Errors
/// - [Error::LanguageSetup] if the embedded resources are invalid.
pub fn language() -> Result<Language, Error> {
    resources()
        .and_then(Language::from_resources)
        .map_err(|err| err.into_setup("en"))
}
