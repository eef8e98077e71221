//! Sets of rules and the interface shared by all of them.

use crate::{
    rule::{
        id::{Index, Selector},
        programmatic::{CustomRule, SimpleReplaceRule, WordRepeatRule},
        spelling::SpellingRule,
        PatternRule,
    },
    tokenizer::tag::Tagger,
    types::*,
    RuleError,
};
use enum_dispatch::enum_dispatch;
use std::iter::FromIterator;

/// Metadata every rule carries.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMeta {
    id: Index,
    description: String,
    enabled_by_default: bool,
    priority: i32,
    issue_type: IssueType,
    mother_tongue: Option<String>,
}

impl RuleMeta {
    pub fn new<S: Into<String>>(id: Index, description: S) -> Self {
        RuleMeta {
            id,
            description: description.into(),
            enabled_by_default: true,
            priority: 0,
            issue_type: IssueType::default(),
            mother_tongue: None,
        }
    }

    pub fn with_enabled_by_default(mut self, enabled: bool) -> Self {
        self.enabled_by_default = enabled;
        self
    }

    /// Matches of rules with higher priority win when matches overlap.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_issue_type(mut self, issue_type: IssueType) -> Self {
        self.issue_type = issue_type;
        self
    }

    /// Restricts the rule to checks with this mother tongue.
    pub fn with_mother_tongue(mut self, mother_tongue: Option<String>) -> Self {
        self.mother_tongue = mother_tongue;
        self
    }

    pub fn id(&self) -> &Index {
        &self.id
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn is_enabled_by_default(&self) -> bool {
        self.enabled_by_default
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn issue_type(&self) -> IssueType {
        self.issue_type
    }

    pub fn mother_tongue(&self) -> Option<&str> {
        self.mother_tongue.as_deref()
    }
}

/// The contract shared by all rules. Rules never modify the sentence and can be used from multiple threads.
#[enum_dispatch]
pub trait Check {
    fn meta(&self) -> &RuleMeta;

    /// Finds the matches of the rule in one sentence. Spans are relative to the sentence.
    fn check(&self, sentence: &AnalyzedSentence, tagger: &Tagger) -> Result<Vec<RuleMatch>, RuleError>;
}

impl Check for PatternRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn check(&self, sentence: &AnalyzedSentence, tagger: &Tagger) -> Result<Vec<RuleMatch>, RuleError> {
        Ok(self.apply(sentence, tagger))
    }
}

/// A rule of any kind.
#[enum_dispatch(Check)]
#[derive(Debug, Clone)]
pub enum Rule {
    PatternRule,
    WordRepeatRule,
    SimpleReplaceRule,
    SpellingRule,
    CustomRule,
}

impl Rule {
    pub fn id(&self) -> &Index {
        self.meta().id()
    }
}

/// An ordered set of rules. The order is the registration order used to break ties between matches.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    rules: Vec<Rule>,
}

impl Rules {
    pub fn new(rules: Vec<Rule>) -> Self {
        Rules { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn push<R: Into<Rule>>(&mut self, rule: R) {
        self.rules.push(rule.into());
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over all rules.
    pub fn iter(&self) -> RulesIter {
        RulesIter {
            selector: None,
            inner: self.rules.iter(),
        }
    }

    /// Iterates over all rules matching the selector.
    pub fn select<'a>(&'a self, selector: &'a Selector) -> RulesIter<'a> {
        RulesIter {
            selector: Some(selector),
            inner: self.rules.iter(),
        }
    }

    /// Finds the rule with the given full id.
    pub fn get(&self, id: &Index) -> Option<&Rule> {
        self.rules.iter().find(|x| x.id() == id)
    }
}

/// A wrapping helper iterator.
pub struct RulesIter<'a> {
    selector: Option<&'a Selector>,
    inner: std::slice::Iter<'a, Rule>,
}

impl<'a> Iterator for RulesIter<'a> {
    type Item = &'a Rule;

    fn next(&mut self) -> Option<Self::Item> {
        let selector = self.selector;

        self.inner
            .find(|rule| selector.map_or(true, |s| s.is_match(rule.id())))
    }
}

impl<'a> IntoIterator for &'a Rules {
    type Item = &'a Rule;
    type IntoIter = RulesIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<R: Into<Rule>> FromIterator<R> for Rules {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Rules {
            rules: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Extend<Rule> for Rules {
    fn extend<I: IntoIterator<Item = Rule>>(&mut self, iter: I) {
        self.rules.extend(iter);
    }
}

/// Corrects the text by applying the first replacement of each match.
/// Matches without replacements, and matches overlapping a previously applied one, are skipped.
pub fn apply_suggestions(text: &str, matches: &[RuleMatch]) -> String {
    let mut sorted: Vec<&RuleMatch> = matches.iter().filter(|x| !x.replacements().is_empty()).collect();
    sorted.sort_by_key(|x| (x.from_pos(), x.to_pos()));

    let mut offset: isize = 0;
    let mut last_end = 0;
    let mut chars: Vec<_> = text.chars().collect();

    for rule_match in sorted {
        let (start, end) = (rule_match.from_pos(), rule_match.to_pos());
        if start < last_end || end > text.chars().count() {
            continue;
        }

        let replacement: Vec<_> = rule_match.replacements()[0].chars().collect();
        chars.splice(
            (start as isize + offset) as usize..(end as isize + offset) as usize,
            replacement.iter().cloned(),
        );
        offset = offset + replacement.len() as isize - (end - start) as isize;
        last_end = end;
    }

    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::id::Category;
    use std::convert::TryFrom;

    fn rule_match(start: usize, end: usize, replacements: &[&str]) -> RuleMatch {
        RuleMatch::new(
            Category::new("TEST").join("RULE").join(0),
            Span::new(start..end, start..end),
            String::new(),
            String::new(),
            replacements.iter().map(|x| x.to_string()).collect(),
            IssueType::Grammar,
        )
    }

    #[test]
    fn applies_first_replacements() {
        let matches = vec![
            rule_match(8, 11, &["the", "a"]),
            rule_match(0, 1, &["A"]),
            rule_match(4, 6, &[]),
        ];

        assert_eq!(apply_suggestions("a is ok teh end", &matches), "A is ok the end");
    }

    #[test]
    fn skips_overlapping_matches() {
        let matches = vec![rule_match(0, 3, &["x"]), rule_match(2, 4, &["y"])];

        assert_eq!(apply_suggestions("abcd", &matches), "xd");
    }

    #[test]
    fn selects_rules() {
        let rules = crate::rule::from_structure::read_grammar_rules(
            r#"{"categories": [
                {"id": "GRAMMAR", "rules": [{"id": "A", "pattern": ["a"], "message": "a"}, {"id": "B", "pattern": ["b"], "message": "b"}]},
                {"id": "STYLE", "rules": [{"id": "C", "pattern": ["c"], "message": "c"}]}
            ]}"#,
        )
        .unwrap();
        let rules: Rules = rules.into_iter().collect();

        let selector = Selector::try_from("grammar").unwrap();
        assert_eq!(rules.select(&selector).count(), 2);

        let selector = Selector::try_from("STYLE/C").unwrap();
        let selected: Vec<_> = rules.select(&selector).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id().parent().name(), "C");
        assert_eq!(rules.iter().count(), 3);
    }
}
