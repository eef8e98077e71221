use std::{
    convert::TryFrom,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use lazy_static::lazy_static;
use langrule::{
    apply_suggestions,
    components::Component,
    lang::en,
    rule::id::{Category, Selector},
    spell::SpellDictionary,
    tokenizer::{
        tag::{Dictionary, WordDictionary},
        Tokenizer,
    },
    CheckOptions, Error, Language, LanguageRegistry,
};
use quickcheck_macros::quickcheck;
use tempfile::tempdir;

lazy_static! {
    static ref LANGUAGE: Language = en::language().unwrap();
}

fn rule_ids(text: &str) -> Vec<String> {
    LANGUAGE
        .check(text, &CheckOptions::default())
        .matches()
        .iter()
        .map(|x| x.rule_id().to_owned())
        .collect()
}

#[test]
fn can_check_empty_text() {
    assert!(LANGUAGE.check("", &CheckOptions::default()).matches().is_empty());
}

#[test]
fn correct_sentence_has_no_matches() {
    assert!(rule_ids("This is a good sentence.").is_empty());
}

#[test]
fn contractions_are_single_words() {
    assert!(rule_ids("I don't know.").is_empty());
    assert!(rule_ids("It's a good idea.").is_empty());
    assert!(rule_ids("I saw the dog’s house.").is_empty());

    let sentence = LANGUAGE.analyze("They're here, aren't they?").next().unwrap();
    let texts: Vec<&str> = sentence.tokens().iter().map(|x| x.text()).collect();
    assert_eq!(texts, vec!["", "They're", "here", ",", "aren't", "they", "?"]);
}

#[test]
fn repeated_word_is_found() {
    let text = "And the the";
    let result = LANGUAGE.check(text, &CheckOptions::default());

    assert_eq!(result.matches().len(), 1);
    let rule_match = &result.matches()[0];
    assert_eq!(rule_match.rule_id(), "WORD_REPEAT_RULE");
    // covers the second "the"
    assert!(rule_match.from_pos() <= 8 && rule_match.to_pos() >= 11);
    assert_eq!(apply_suggestions(text, result.matches()), "And the");
}

#[test]
fn unknown_word_is_a_spelling_mistake() {
    let result = LANGUAGE.check("Zolw", &CheckOptions::default());

    assert_eq!(result.matches().len(), 1);
    let rule_match = &result.matches()[0];
    assert_eq!(rule_match.rule_id(), "SPELLING_RULE");
    assert_eq!((rule_match.from_pos(), rule_match.to_pos()), (0, 4));
}

#[test]
fn replace_list_wins_over_speller() {
    let result = LANGUAGE.check("I saw teh dog.", &CheckOptions::default());

    assert_eq!(result.matches().len(), 1);
    assert_eq!(result.matches()[0].rule_id(), "SIMPLE_REPLACE");
    assert_eq!(result.matches()[0].replacements(), &["the".to_owned()]);
}

#[test]
fn multiword_interior_is_not_matched() {
    assert!(rule_ids("We went out in spite of the rain.").is_empty());
    assert_eq!(rule_ids("We went out spite of the rain."), vec!["SPITE_OF"]);
}

#[test]
fn matches_are_offset_into_the_whole_text() {
    let text = "This is good. She ate a apple. He can goes home.";
    let result = LANGUAGE.check(text, &CheckOptions::default());

    let flagged: Vec<String> = result
        .matches()
        .iter()
        .map(|x| text.chars().skip(x.from_pos()).take(x.to_pos() - x.from_pos()).collect())
        .collect();
    assert_eq!(flagged, vec!["a", "goes"]);
    assert_eq!(
        apply_suggestions(text, result.matches()),
        "This is good. She ate an apple. He can go home."
    );
}

#[test]
fn skip_reaches_the_last_match() {
    let result = LANGUAGE.check(
        "You can take either the bus nor the car nor the train.",
        &CheckOptions::default(),
    );

    assert_eq!(result.matches().len(), 1);
    let rule_match = &result.matches()[0];
    assert_eq!(rule_match.rule_id(), "EITHER_NOR");
    assert_eq!((rule_match.from_pos(), rule_match.to_pos()), (40, 43));
}

#[test]
fn offsets_count_chars() {
    let text = "Ünïcödé wörds. She ate a apple.";
    let result = LANGUAGE.check(text, &CheckOptions::default());

    let a_an = result
        .matches()
        .iter()
        .find(|x| x.rule_id() == "EN_A_VS_AN")
        .unwrap();
    assert_eq!(a_an.from_pos(), 23);
    assert_eq!(&text[a_an.span().byte().clone()], "a");
}

#[test]
fn rules_can_be_enabled_and_disabled() {
    let text = "This is a very good idea.";
    assert!(rule_ids(text).is_empty());

    let options = CheckOptions::default().enable_category("style");
    let result = LANGUAGE.check(text, &options);
    assert_eq!(result.matches().len(), 1);
    assert_eq!(result.matches()[0].rule_id(), "VERY_GOOD");

    let options = CheckOptions::default().disable_rule("WORD_REPEAT_RULE");
    assert!(LANGUAGE.check("And the the", &options).matches().is_empty());
}

#[test]
fn rules_can_be_selected() {
    let selector = Selector::try_from("grammar/en_a_vs_an").unwrap();
    assert_eq!(LANGUAGE.rules().select(&selector).count(), 3);

    let selector: Selector = Category::new("PUNCTUATION").into();
    assert_eq!(LANGUAGE.rules().select(&selector).count(), 1);
}

#[test]
fn rule_examples_pass() {
    assert!(LANGUAGE.test());
}

#[test]
fn cancelled_check_is_partial() {
    let text = "She ate a apple. He can goes home. And the the house.";
    let polls = AtomicUsize::new(0);
    let n_rules = LANGUAGE
        .rules()
        .iter()
        .filter(|x| CheckOptions::default().is_enabled(x))
        .count();
    // completes the first sentence only
    let cancel = || polls.fetch_add(1, Ordering::SeqCst) > n_rules;

    let result = LANGUAGE.check_with_cancel(text, &CheckOptions::default(), &cancel);
    assert!(result.is_partial());
    assert_eq!(result.matches().len(), 1);
    assert_eq!(result.matches()[0].rule_id(), "EN_A_VS_AN");

    let result = LANGUAGE.check(text, &CheckOptions::default());
    assert!(!result.is_partial());
    assert_eq!(result.matches().len(), 3);
}

#[test]
fn disambiguation_is_idempotent() {
    let analyzer = LANGUAGE.analyzer();

    for sentence in analyzer.analyze("He can take the train in spite of the rain. The house is old.") {
        let again = analyzer.disambiguator().disambiguate(&sentence);
        assert_eq!(sentence, again);
    }
}

#[test]
fn registry_loads_once_across_threads() {
    let loads = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(LanguageRegistry::new());

    let counter = loads.clone();
    registry.register("en", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        en::language()
    });

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                let language = registry.get_or_load("en").unwrap();
                language.check("And the the", &CheckOptions::default()).into_matches()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|x| x.join().unwrap()).collect();
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(results.windows(2).all(|x| x[0] == x[1]));

    registry.reset();
    registry.get_or_load("en").unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

fn english_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join("en")
}

fn copy_english(target: &Path) {
    for entry in fs::read_dir(english_dir()).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), target.join(entry.file_name())).unwrap();
    }
}

#[test]
fn language_dir_loads_through_registry() {
    let registry = LanguageRegistry::new();
    registry.register_dir("en", english_dir());

    let language = registry.get_or_load("en").unwrap();
    let text = "And the the house. I recieve an house.";

    assert_eq!(language.rules().len(), LANGUAGE.rules().len());
    assert_eq!(
        language.check(text, &CheckOptions::default()),
        LANGUAGE.check(text, &CheckOptions::default())
    );
}

#[test]
fn compiled_dictionaries_are_preferred() {
    let dir = tempdir().unwrap();
    copy_english(dir.path());

    let tags = WordDictionary::from_dump(fs::File::open(dir.path().join("tags.txt")).unwrap()).unwrap();
    tags.save(dir.path().join("tags.bin")).unwrap();
    fs::remove_file(dir.path().join("tags.txt")).unwrap();

    let spelling =
        SpellDictionary::from_word_list(fs::File::open(dir.path().join("spelling.txt")).unwrap()).unwrap();
    spelling.save(dir.path().join("spelling.bin")).unwrap();
    fs::remove_file(dir.path().join("spelling.txt")).unwrap();

    let loaded = WordDictionary::new(dir.path().join("tags.bin")).unwrap();
    assert_eq!(loaded.len(), tags.len());
    assert_eq!(loaded.lookup("house"), tags.lookup("house"));
    assert_eq!(loaded.forms("be"), tags.forms("be"));

    let loaded = SpellDictionary::new(dir.path().join("spelling.bin")).unwrap();
    assert_eq!(loaded.max_freq(), spelling.max_freq());

    // the text sources are gone, so this only works with the compiled files
    let language = Language::from_dir(dir.path()).unwrap();
    for text in &["Zolw", "And the the", "It's a good idea."] {
        assert_eq!(
            language.check(text, &CheckOptions::default()),
            LANGUAGE.check(text, &CheckOptions::default())
        );
    }
}

#[test]
fn broken_resources_are_setup_errors() {
    let dir = tempdir().unwrap();
    copy_english(dir.path());

    let tags = WordDictionary::from_dump(fs::File::open(dir.path().join("tags.txt")).unwrap()).unwrap();
    let mut bytes = Vec::new();
    tags.to_writer(&mut bytes).unwrap();
    fs::write(dir.path().join("tags.bin"), &bytes[..bytes.len() / 2]).unwrap();

    let registry = LanguageRegistry::new();
    registry.register_dir("en", dir.path());

    match registry.get_or_load("en") {
        Err(Error::LanguageSetup { lang_code, source }) => {
            assert_eq!(lang_code, "en");
            assert!(matches!(*source, Error::Serialization(_)));
        }
        other => panic!("expected a setup error, got {:?}", other.map(|_| ())),
    }
    assert!(!registry.is_loaded("en"));

    // a spelling dictionary is required when spelling is configured
    let dir = tempdir().unwrap();
    copy_english(dir.path());
    fs::remove_file(dir.path().join("spelling.txt")).unwrap();

    match Language::from_dir(dir.path()) {
        Err(Error::LanguageSetup { source, .. }) => assert!(matches!(*source, Error::Io(_))),
        other => panic!("expected a setup error, got {:?}", other.map(|_| ())),
    }
}

#[quickcheck]
fn tokens_reconstruct_text(text: String) -> bool {
    let tokens = Tokenizer::default().tokenize(&text);
    tokens.iter().map(|x| x.text).collect::<String>() == text
}

#[quickcheck]
fn match_offsets_are_within_text(text: String) -> bool {
    let n_chars = text.chars().count();

    LANGUAGE
        .check(&text, &CheckOptions::default())
        .matches()
        .iter()
        .all(|x| x.from_pos() <= x.to_pos() && x.to_pos() <= n_chars)
}

#[quickcheck]
fn checks_are_deterministic(text: String) -> bool {
    let options = CheckOptions::default();
    LANGUAGE.check(&text, &options) == LANGUAGE.check(&text, &options)
}
