//! Rule-based grammar, style and spell checking.
//!
//! # Overview
//!
//! langrule runs every text through one pipeline per language:
//! - An [Analyzer][analyzer::Analyzer] splits the text into sentences and tokens, looks up readings with a
//!   [Tagger][tokenizer::tag::Tagger] and reduces ambiguity with a [Disambiguator][tokenizer::disambiguate::Disambiguator].
//! - A set of [Rules][rules::Rules] (pattern rules, hand-written rules and a speller rule) is checked against every sentence.
//! - The [aggregate] module merges the matches of all rules into one ordered list with offsets into the checked text.
//!
//! A [Language][lang::Language] bundles the pipeline and the rules of one language, a
//! [LanguageRegistry][lang::LanguageRegistry] loads languages lazily and shares them between threads.
//!
//! # Examples
//!
//! ```no_run
//! use langrule::{aggregate::CheckOptions, lang::LanguageRegistry};
//!
//! let registry = LanguageRegistry::with_builtin();
//! let english = registry.get_or_load("en")?;
//!
//! let result = english.check("And the the house.", &CheckOptions::default());
//!
//! for rule_match in result.matches() {
//!     println!("{}: {}", rule_match.rule_id(), rule_match.message());
//! }
//! # Ok::<(), langrule::Error>(())
//! ```

use std::io;
use thiserror::Error;

pub mod aggregate;
pub mod analyzer;
pub mod components;
pub mod lang;
pub mod rule;
pub mod rules;
pub mod spell;
pub mod tokenizer;
pub mod types;
pub(crate) mod utils;

pub use aggregate::{CheckOptions, CheckResult};
pub use lang::{Language, LanguageRegistry};
pub use rules::{apply_suggestions, Rules};
pub use types::RuleMatch;

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Binary (de)serialization error of a compiled component.
    #[error(transparent)]
    Serialization(#[from] bincode::Error),
    /// Error reading a JSON rule definition or configuration.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Fst(#[from] fst::Error),
    #[error("invalid regex `{pattern}`: {message}")]
    Regex { pattern: String, message: String },
    #[error("invalid pattern in rule {id}: {reason}")]
    InvalidPattern { id: String, reason: String },
    #[error("invalid dictionary entry in line {line}: {reason}")]
    InvalidEntry { line: usize, reason: String },
    #[error(transparent)]
    IdError(#[from] rule::id::Error),
    #[error("unknown language: {0}")]
    UnknownLanguage(String),
    /// A language could not be set up. No check can run for this language until the cause is fixed.
    #[error("error setting up language {lang_code}: {source}")]
    LanguageSetup {
        lang_code: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Marks the error as a setup failure of the language, unless it already is one.
    pub(crate) fn into_setup(self, lang_code: &str) -> Error {
        match self {
            Error::LanguageSetup { .. } => self,
            source => Error::LanguageSetup {
                lang_code: lang_code.to_owned(),
                source: Box::new(source),
            },
        }
    }
}

/// An error raised by a rule while checking one sentence.
/// The aggregator drops the contribution of the failing rule and continues with the others.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("rule {rule_id} failed: {message}")]
pub struct RuleError {
    pub rule_id: String,
    pub message: String,
}

impl RuleError {
    pub fn new<S1: Into<String>, S2: Into<String>>(rule_id: S1, message: S2) -> Self {
        RuleError {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }
}
