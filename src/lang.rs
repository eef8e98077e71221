//! Languages and the registry loading them.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use fs_err as fs;
use log::info;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{self, CheckOptions, CheckResult},
    analyzer::Analyzer,
    components::Component,
    rule::{
        from_structure::{read_disambiguation_rules, read_grammar_rules},
        id::Category,
        programmatic::{read_replacements, SimpleReplaceRule, WordRepeatConfig, WordRepeatRule},
        spelling::SpellingRule,
        DisambiguationRule, PatternRule,
    },
    rules::{Rule, RuleMeta, Rules},
    spell::{FstSpeller, SpellConfig, SpellDictionary},
    tokenizer::{
        disambiguate::Disambiguator,
        multiword::MultiwordChunker,
        sentence::{SentenceConfig, SentenceSplitter},
        tag::{Tagger, TaggerConfig, WordDictionary},
        Tokenizer, TokenizerConfig,
    },
    types::*,
    Error,
};

pub mod en;

/// A step of the disambiguation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisambiguationStage {
    /// The multiword chunker.
    Multiwords,
    /// The disambiguation rules.
    Rules,
}

fn default_stages() -> Vec<DisambiguationStage> {
    vec![DisambiguationStage::Multiwords, DisambiguationStage::Rules]
}

/// Everything that differs between languages apart from the data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    #[serde(default)]
    pub sentences: SentenceConfig,
    #[serde(default)]
    pub tagger: TaggerConfig,
    /// The order in which disambiguators run.
    #[serde(default = "default_stages")]
    pub disambiguation: Vec<DisambiguationStage>,
    /// Enables the speller rule.
    #[serde(default)]
    pub spelling: Option<SpellConfig>,
    /// Enables the word repetition rule.
    #[serde(default)]
    pub word_repeat: Option<WordRepeatConfig>,
}

/// The parsed data of a language.
#[derive(Debug, Clone)]
pub struct LanguageResources {
    pub config: LanguageConfig,
    pub dictionary: WordDictionary,
    pub multiwords: MultiwordChunker,
    pub disambiguation_rules: Vec<DisambiguationRule>,
    pub grammar_rules: Vec<PatternRule>,
    /// Required if spelling is enabled in the config.
    pub spelling: Option<SpellDictionary>,
    pub replacements: DefaultHashMap<String, Vec<String>>,
}

fn read_optional(path: &Path) -> Result<Option<String>, Error> {
    if path.exists() {
        Ok(Some(fs::read_to_string(path)?))
    } else {
        Ok(None)
    }
}

impl LanguageResources {
    /// Reads the resources from a language directory. Next to `config.json`, the directory may contain
    /// `tags.txt` (or the compiled `tags.bin`), `multiwords.txt`, `disambiguation.json`, `grammar.json`,
    /// `spelling.txt` (or `spelling.bin`) and `replacements.txt`. Only the config and the tag dictionary are required.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let config: LanguageConfig = serde_json::from_str(&fs::read_to_string(dir.join("config.json"))?)?;

        let dictionary = if dir.join("tags.bin").exists() {
            WordDictionary::new(dir.join("tags.bin"))?
        } else {
            WordDictionary::from_dump(fs::File::open(dir.join("tags.txt"))?)?
        };

        let multiwords = match read_optional(&dir.join("multiwords.txt"))? {
            Some(text) => MultiwordChunker::from_lines(&text)?,
            None => MultiwordChunker::default(),
        };

        let disambiguation_rules = match read_optional(&dir.join("disambiguation.json"))? {
            Some(json) => read_disambiguation_rules(&json)?,
            None => Vec::new(),
        };

        let grammar_rules = match read_optional(&dir.join("grammar.json"))? {
            Some(json) => read_grammar_rules(&json)?,
            None => Vec::new(),
        };

        let spelling = if config.spelling.is_none() {
            None
        } else if dir.join("spelling.bin").exists() {
            Some(SpellDictionary::new(dir.join("spelling.bin"))?)
        } else {
            Some(SpellDictionary::from_word_list(fs::File::open(dir.join("spelling.txt"))?)?)
        };

        let replacements = match read_optional(&dir.join("replacements.txt"))? {
            Some(text) => read_replacements(text.as_bytes())?,
            None => DefaultHashMap::default(),
        };

        Ok(LanguageResources {
            config,
            dictionary,
            multiwords,
            disambiguation_rules,
            grammar_rules,
            spelling,
            replacements,
        })
    }
}

/// The analysis pipeline and the rules of one language. Immutable once built and safe to share between threads.
#[derive(Debug, Clone)]
pub struct Language {
    config: LanguageConfig,
    analyzer: Analyzer,
    rules: Rules,
}

impl Language {
    /// Builds a language from already constructed parts.
    pub fn from_parts(config: LanguageConfig, analyzer: Analyzer, rules: Rules) -> Self {
        Language {
            config,
            analyzer,
            rules,
        }
    }

    /// Builds the pipeline and the rules from parsed resources.
    /// # Errors
    /// - If spelling is enabled but no spelling dictionary is given, or the dictionary is invalid.
    pub fn from_resources(resources: LanguageResources) -> Result<Self, Error> {
        let LanguageResources {
            config,
            dictionary,
            multiwords,
            disambiguation_rules,
            grammar_rules,
            spelling,
            replacements,
        } = resources;

        let tagger = Arc::new(Tagger::new(Arc::new(dictionary), config.tagger.clone()));
        let n_disambiguation_rules = disambiguation_rules.len();

        let mut stages = Vec::new();
        for stage in &config.disambiguation {
            match stage {
                DisambiguationStage::Multiwords if !multiwords.is_empty() => {
                    stages.push(Disambiguator::Multiword(multiwords.clone()))
                }
                DisambiguationStage::Rules if !disambiguation_rules.is_empty() => {
                    stages.push(Disambiguator::Rules(disambiguation_rules.clone()))
                }
                _ => {}
            }
        }
        let disambiguator = match stages.len() {
            0 => Disambiguator::Null,
            1 => stages.remove(0),
            _ => Disambiguator::Hybrid(stages),
        };

        let analyzer = Analyzer::new(
            Tokenizer::new(config.tokenizer.clone()),
            SentenceSplitter::new(&config.sentences),
            tagger,
            disambiguator,
        );

        let mut rules: Rules = grammar_rules.into_iter().collect();

        if let Some(word_repeat) = &config.word_repeat {
            let meta = RuleMeta::new(
                Category::new("MISC").join("WORD_REPEAT_RULE").join(0),
                "Word repetition (e.g. 'will will')",
            );
            rules.push(WordRepeatRule::new(meta, word_repeat));
        }

        if !replacements.is_empty() {
            let meta = RuleMeta::new(
                Category::new("TYPOS").join("SIMPLE_REPLACE").join(0),
                "Commonly confused words",
            )
            .with_issue_type(IssueType::Misspelling);
            rules.push(SimpleReplaceRule::new(meta, replacements));
        }

        if let Some(spell_config) = &config.spelling {
            let dictionary = spelling.ok_or_else(|| {
                Error::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    "spelling is enabled, but there is no spelling dictionary",
                ))
            })?;
            let meta = RuleMeta::new(
                Category::new("TYPOS").join("SPELLING_RULE").join(0),
                "Possible spelling mistake",
            )
            .with_issue_type(IssueType::Misspelling);
            let speller = FstSpeller::new(dictionary, spell_config.clone())?;

            rules.push(SpellingRule::new(meta, Arc::new(speller)));
        }

        info!(
            "loaded language {} with {} rules and {} disambiguation rules",
            config.code,
            rules.len(),
            n_disambiguation_rules
        );

        Ok(Language::from_parts(config, analyzer, rules))
    }

    /// Loads a language directory, see [LanguageResources::from_dir].
    /// # Errors
    /// - [Error::LanguageSetup] naming the directory if any resource is missing or invalid.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        let dir = dir.as_ref();

        LanguageResources::from_dir(dir)
            .and_then(Language::from_resources)
            .map_err(|err| {
                let name = dir.file_name().unwrap_or_else(|| dir.as_os_str());
                err.into_setup(&name.to_string_lossy())
            })
    }

    pub fn code(&self) -> &str {
        self.config.code.as_str()
    }

    pub fn name(&self) -> &str {
        self.config.name.as_str()
    }

    pub fn config(&self) -> &LanguageConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Lazily analyzes the text sentence by sentence.
    pub fn analyze<'t>(&'t self, text: &'t str) -> impl Iterator<Item = AnalyzedSentence> + 't {
        self.analyzer.analyze(text)
    }

    /// Checks the text. Match offsets are char offsets into `text`.
    pub fn check(&self, text: &str, options: &CheckOptions) -> CheckResult {
        self.check_with_cancel(text, options, &|| false)
    }

    /// Checks the text, stopping early once `cancel` returns `true`. See [aggregate::check].
    pub fn check_with_cancel(
        &self,
        text: &str,
        options: &CheckOptions,
        cancel: &(dyn Fn() -> bool + Sync),
    ) -> CheckResult {
        aggregate::check(
            self.analyzer.analyze(text),
            &self.rules,
            self.analyzer.tagger(),
            options,
            cancel,
        )
    }

    /// Checks every pattern rule against its examples. Returns whether all passed, failures are logged.
    pub fn test(&self) -> bool {
        let mut passes = true;

        for rule in self.rules.iter() {
            if let Rule::PatternRule(rule) = rule {
                passes &= rule.test(&self.analyzer);
            }
        }

        passes
    }
}

type Loader = Arc<dyn Fn() -> Result<Language, Error> + Send + Sync>;

/// Loads languages on first use and shares them between threads.
///
/// Concurrent first requests for the same language wait for one load instead of loading twice.
/// A failed load is not remembered: the next request tries again.
pub struct LanguageRegistry {
    loaders: RwLock<DefaultHashMap<String, Loader>>,
    cache: Mutex<DefaultHashMap<String, Arc<OnceCell<Arc<Language>>>>>,
}

impl std::fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("codes", &self.codes())
            .finish()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        LanguageRegistry::new()
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

impl LanguageRegistry {
    /// Creates a registry without any languages.
    pub fn new() -> Self {
        LanguageRegistry {
            loaders: RwLock::new(DefaultHashMap::default()),
            cache: Mutex::new(DefaultHashMap::default()),
        }
    }

    /// Creates a registry with the languages built into this crate.
    pub fn with_builtin() -> Self {
        let registry = LanguageRegistry::new();
        registry.register("en", en::language);
        registry
    }

    /// Registers a loader for the language code. Replaces a previous loader and its loaded language.
    pub fn register<F>(&self, code: &str, loader: F)
    where
        F: Fn() -> Result<Language, Error> + Send + Sync + 'static,
    {
        let code = normalize_code(code);
        self.cache.lock().remove(&code);
        self.loaders.write().insert(code, Arc::new(loader));
    }

    /// Registers a language directory, see [LanguageResources::from_dir].
    pub fn register_dir<P: Into<PathBuf>>(&self, code: &str, dir: P) {
        let dir = dir.into();
        // the registry labels failures with `code`, not the directory name
        self.register(code, move || {
            LanguageResources::from_dir(&dir).and_then(Language::from_resources)
        });
    }

    /// The registered language codes, sorted.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<_> = self.loaders.read().keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Whether the language is loaded.
    pub fn is_loaded(&self, code: &str) -> bool {
        self.cache
            .lock()
            .get(&normalize_code(code))
            .map_or(false, |cell| cell.get().is_some())
    }

    /// Gets the language, loading it if needed.
    /// # Errors
    /// - [Error::UnknownLanguage] if no loader is registered for the code.
    /// - [Error::LanguageSetup] if loading failed.
    pub fn get_or_load(&self, code: &str) -> Result<Arc<Language>, Error> {
        let code = normalize_code(code);
        let loader = self
            .loaders
            .read()
            .get(&code)
            .cloned()
            .ok_or_else(|| Error::UnknownLanguage(code.clone()))?;

        // the cache lock is only held to get the cell, loading happens outside of it
        let cell = self
            .cache
            .lock()
            .entry(code.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        cell.get_or_try_init(|| {
            loader()
                .map(Arc::new)
                .map_err(|err| err.into_setup(&code))
        })
        .map(Arc::clone)
    }

    /// Drops all loaded languages. Languages in use stay alive until their last reference is dropped.
    pub fn reset(&self) {
        self.cache.lock().clear();
    }
}
