//! Runs the rules of a language over analyzed sentences and merges their matches.

use std::{
    convert::TryFrom,
    panic::{catch_unwind, AssertUnwindSafe},
};

use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::{
    rule::id::{Index, Selector},
    rules::{Check, Rule, Rules},
    tokenizer::tag::Tagger,
    types::*,
    utils::parallelism::*,
};

/// Per-call options of a check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    /// Rules restricted to a mother tongue only run if it equals this.
    pub mother_tongue: Option<String>,
    /// Rules to enable, even if they are off by default.
    /// Either a rule name (e.g. `A_AN`) or a selector (e.g. `GRAMMAR/A_AN/0`), compared case-insensitively.
    pub enabled_rule_ids: DefaultHashSet<String>,
    /// Rules to disable. Takes precedence over every kind of enabling.
    pub disabled_rule_ids: DefaultHashSet<String>,
    pub enabled_categories: DefaultHashSet<String>,
    pub disabled_categories: DefaultHashSet<String>,
    /// Only run explicitly enabled rules and rules of enabled categories.
    pub enabled_only: bool,
}

fn matches_id(pattern: &str, id: &Index) -> bool {
    if pattern.contains('/') {
        Selector::try_from(pattern).map_or(false, |selector| selector.is_match(id))
    } else {
        id.parent().is(pattern)
    }
}

impl CheckOptions {
    pub fn enable_rule<S: Into<String>>(mut self, id: S) -> Self {
        self.enabled_rule_ids.insert(id.into());
        self
    }

    pub fn disable_rule<S: Into<String>>(mut self, id: S) -> Self {
        self.disabled_rule_ids.insert(id.into());
        self
    }

    pub fn enable_category<S: Into<String>>(mut self, category: S) -> Self {
        self.enabled_categories.insert(category.into());
        self
    }

    pub fn disable_category<S: Into<String>>(mut self, category: S) -> Self {
        self.disabled_categories.insert(category.into());
        self
    }

    pub fn with_mother_tongue<S: Into<String>>(mut self, mother_tongue: S) -> Self {
        self.mother_tongue = Some(mother_tongue.into());
        self
    }

    pub fn with_enabled_only(mut self, enabled_only: bool) -> Self {
        self.enabled_only = enabled_only;
        self
    }

    /// Whether the rule runs with these options.
    pub fn is_enabled(&self, rule: &Rule) -> bool {
        let meta = rule.meta();
        let id = meta.id();

        if let Some(mother_tongue) = meta.mother_tongue() {
            let same = self
                .mother_tongue
                .as_deref()
                .map_or(false, |x| x.eq_ignore_ascii_case(mother_tongue));
            if !same {
                return false;
            }
        }

        if self.disabled_rule_ids.iter().any(|x| matches_id(x, id))
            || self.disabled_categories.iter().any(|x| id.category().is(x))
        {
            return false;
        }

        if self.enabled_rule_ids.iter().any(|x| matches_id(x, id))
            || self.enabled_categories.iter().any(|x| id.category().is(x))
        {
            return true;
        }

        !self.enabled_only && meta.is_enabled_by_default()
    }
}

/// The matches of one check, ordered by start position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    matches: Vec<RuleMatch>,
    partial: bool,
}

impl CheckResult {
    pub fn matches(&self) -> &[RuleMatch] {
        &self.matches
    }

    /// Whether the check was cancelled. The matches of all sentences completed before cancellation are kept.
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub fn into_matches(self) -> Vec<RuleMatch> {
        self.matches
    }
}

struct Candidate {
    rule_index: usize,
    priority: i32,
    rule_match: RuleMatch,
}

fn run_rule(rule: &Rule, sentence: &AnalyzedSentence, tagger: &Tagger) -> Vec<RuleMatch> {
    match catch_unwind(AssertUnwindSafe(|| rule.check(sentence, tagger))) {
        Ok(Ok(matches)) => matches,
        Ok(Err(err)) => {
            warn!("{}, dropping its matches for \"{}\"", err, sentence.text());
            Vec::new()
        }
        Err(_) => {
            error!(
                "rule {} panicked, dropping its matches for \"{}\"",
                rule.id(),
                sentence.text()
            );
            Vec::new()
        }
    }
}

/// Keeps the matches of higher priority (then earlier registered) rules where matches of different rules overlap.
fn resolve_overlaps(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.rule_index.cmp(&b.rule_index))
            .then_with(|| a.rule_match.from_pos().cmp(&b.rule_match.from_pos()))
    });

    let mut accepted: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let blocked = accepted.iter().any(|x| {
            x.rule_index != candidate.rule_index && x.rule_match.span().overlaps(candidate.rule_match.span())
        });

        if !blocked {
            accepted.push(candidate);
        }
    }

    accepted.sort_by(|a, b| {
        a.rule_match
            .from_pos()
            .cmp(&b.rule_match.from_pos())
            .then_with(|| a.rule_match.to_pos().cmp(&b.rule_match.to_pos()))
            .then_with(|| a.rule_index.cmp(&b.rule_index))
    });
    accepted
}

/// Checks one sentence. Returns `None` if cancelled before all rules ran.
fn check_sentence(
    sentence: &AnalyzedSentence,
    rules: &[(usize, &Rule)],
    tagger: &Tagger,
    cancel: &(dyn Fn() -> bool + Sync),
) -> Option<Vec<Candidate>> {
    let outputs: Vec<Option<Vec<Candidate>>> = rules
        .maybe_par_iter()
        .map(|(i, rule)| {
            if cancel() {
                return None;
            }

            let priority = rule.meta().priority();
            Some(
                run_rule(rule, sentence, tagger)
                    .into_iter()
                    .map(|rule_match| Candidate {
                        rule_index: *i,
                        priority,
                        rule_match,
                    })
                    .collect(),
            )
        })
        .collect();

    let mut candidates = Vec::new();
    for output in outputs {
        candidates.extend(output?);
    }

    let immunized: Vec<&Span> = sentence
        .tokens()
        .iter()
        .filter(|x| x.is_immunized())
        .map(|x| x.span())
        .collect();

    candidates.retain(|x| !immunized.iter().any(|span| span.overlaps(x.rule_match.span())));

    Some(resolve_overlaps(candidates))
}

/// Checks all sentences with the enabled rules.
///
/// `cancel` is polled before every sentence and every rule. Once it returns `true`, the check stops and the result
/// is marked as partial. It contains the matches of the sentences completed up to that point.
pub fn check<I: IntoIterator<Item = AnalyzedSentence>>(
    sentences: I,
    rules: &Rules,
    tagger: &Tagger,
    options: &CheckOptions,
    cancel: &(dyn Fn() -> bool + Sync),
) -> CheckResult {
    let enabled: Vec<(usize, &Rule)> = rules
        .rules()
        .iter()
        .enumerate()
        .filter(|(_, rule)| options.is_enabled(rule))
        .collect();

    let mut result = CheckResult::default();

    for sentence in sentences {
        if cancel() {
            result.partial = true;
            break;
        }

        match check_sentence(&sentence, &enabled, tagger, cancel) {
            Some(candidates) => {
                let start = sentence.start();
                result
                    .matches
                    .extend(candidates.into_iter().map(|x| x.rule_match.rshift(start)));
            }
            None => {
                result.partial = true;
                break;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rule::{
            from_structure::read_grammar_rules,
            id::Category,
            programmatic::{
                tests::{sentence, tagger},
                CustomRule, WordRepeatConfig, WordRepeatRule,
            },
        },
        rules::RuleMeta,
        RuleError,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn grammar() -> Rules {
        read_grammar_rules(
            r#"{"categories": [
                {"id": "GRAMMAR", "rules": [
                    {"id": "AB", "pattern": ["a", "b"], "message": "ab"},
                    {"id": "B", "pattern": ["b"], "message": "b", "priority": 10},
                    {"id": "OFF", "pattern": ["c"], "message": "c", "default_on": false},
                    {"id": "GERMAN_ONLY", "pattern": ["c"], "message": "c", "mother_tongue": "de"}
                ]},
                {"id": "STYLE", "rules": [{"id": "C", "pattern": ["c"], "message": "c"}]}
            ]}"#,
        )
        .unwrap()
        .into_iter()
        .collect()
    }

    fn rule_ids(result: &CheckResult) -> Vec<&str> {
        result.matches().iter().map(|x| x.rule_id()).collect()
    }

    fn run(rules: &Rules, words: &[&str], options: &CheckOptions) -> CheckResult {
        check(vec![sentence(words)], rules, &tagger(), options, &|| false)
    }

    #[test]
    fn higher_priority_wins_overlaps() {
        let result = run(&grammar(), &["a", "b", "c"], &CheckOptions::default());

        assert_eq!(rule_ids(&result), vec!["B", "C"]);
        assert!(!result.is_partial());
    }

    #[test]
    fn options_select_rules() {
        let rules = grammar();
        let words = &["a", "b", "c"];

        let options = CheckOptions::default().disable_rule("b");
        assert_eq!(rule_ids(&run(&rules, words, &options)), vec!["AB", "C"]);

        let options = CheckOptions::default().enable_rule("GRAMMAR/OFF").disable_category("style");
        assert_eq!(rule_ids(&run(&rules, words, &options)), vec!["B", "OFF"]);

        let options = CheckOptions::default().enable_category("STYLE").with_enabled_only(true);
        assert_eq!(rule_ids(&run(&rules, words, &options)), vec!["C"]);

        let options = CheckOptions::default().with_mother_tongue("de").disable_category("STYLE");
        assert_eq!(rule_ids(&run(&rules, words, &options)), vec!["B", "GERMAN_ONLY"]);
    }

    fn meta(name: &str) -> RuleMeta {
        RuleMeta::new(Category::new("MISC").join(name).join(0), name)
    }

    #[test]
    fn failing_rules_are_dropped() {
        let mut rules = Rules::default();
        rules.push(CustomRule::new(meta("FAILS"), |_, meta| {
            Err(RuleError::new(meta.id().to_string(), "broken"))
        }));
        rules.push(CustomRule::new(meta("PANICS"), |_, _| panic!("rule bug")));
        rules.push(WordRepeatRule::new(meta("WORD_REPEAT_RULE"), &WordRepeatConfig::default()));

        let result = run(&rules, &["the", "the"], &CheckOptions::default());
        assert_eq!(rule_ids(&result), vec!["WORD_REPEAT_RULE"]);
    }

    #[test]
    fn immunized_tokens_suppress_matches() {
        let mut sentence = sentence(&["a", "b"]);
        sentence.tokens_mut()[1].immunized = true;

        let result = check(vec![sentence], &grammar(), &tagger(), &CheckOptions::default(), &|| false);
        assert_eq!(rule_ids(&result), vec!["B"]);
    }

    #[test]
    fn cancellation_yields_partial_result() {
        let polls = AtomicUsize::new(0);
        let rules = grammar();
        let enabled = rules.iter().filter(|x| CheckOptions::default().is_enabled(x)).count();
        // one poll per sentence plus one per rule
        let budget = 1 + enabled;
        let cancel = || polls.fetch_add(1, Ordering::SeqCst) >= budget;

        let result = check(
            vec![sentence(&["b"]), sentence(&["b"])],
            &rules,
            &tagger(),
            &CheckOptions::default(),
            &cancel,
        );

        assert!(result.is_partial());
        assert_eq!(result.matches().len(), 1);
    }

    #[test]
    fn matches_are_shifted_to_text_positions() {
        let first = sentence(&["b"]);
        let second = AnalyzedSentence::new(
            sentence(&["b"]).tokens()[1..].to_vec(),
            "b".to_owned(),
            Position { byte: 2, char: 2 },
        );

        let result = check(vec![first, second], &grammar(), &tagger(), &CheckOptions::default(), &|| false);
        let positions: Vec<_> = result.matches().iter().map(|x| (x.from_pos(), x.to_pos())).collect();
        assert_eq!(positions, vec![(0, 1), (2, 3)]);
    }
}
