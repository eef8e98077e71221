//! Serde structures of the JSON rule definition format.

use crate::types::IssueType;
use serde::Deserialize;

fn one() -> usize {
    1
}

fn one_signed() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

/// Conditions on one token shared by pattern tokens and exceptions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConstraintDef {
    /// The surface form, or a regex for it if `regex` is set.
    pub text: Option<String>,
    pub regex: bool,
    /// The part-of-speech tag, or a regex for it if `postag_regex` is set.
    pub postag: Option<String>,
    pub postag_regex: bool,
    /// The lemma (LanguageTool's `inflected`).
    pub lemma: Option<String>,
    pub negate: bool,
    pub negate_pos: bool,
    pub case_sensitive: bool,
    pub match_all_readings: bool,
    pub space_before: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Current,
    Next,
    Previous,
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Current
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExceptionDef {
    #[serde(flatten)]
    pub constraint: ConstraintDef,
    #[serde(default)]
    pub scope: Scope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FullTokenDef {
    #[serde(flatten)]
    pub constraint: ConstraintDef,
    #[serde(default = "one")]
    pub min: usize,
    /// `-1` for unbounded repetition.
    #[serde(default = "one_signed")]
    pub max: i64,
    /// How many tokens may be skipped after this token, `-1` for any number.
    #[serde(default)]
    pub skip: i64,
    #[serde(default)]
    pub exceptions: Vec<ExceptionDef>,
    /// Marked tokens are the reported part of a match.
    #[serde(default)]
    pub mark: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TokenDefRepr {
    Text(String),
    Full(FullTokenDef),
}

/// One token of a pattern. A plain string is shorthand for a case-insensitive text match.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "TokenDefRepr")]
pub struct TokenDef(pub FullTokenDef);

impl From<TokenDefRepr> for TokenDef {
    fn from(repr: TokenDefRepr) -> Self {
        TokenDef(match repr {
            TokenDefRepr::Full(def) => def,
            TokenDefRepr::Text(text) => FullTokenDef {
                constraint: ConstraintDef {
                    text: Some(text),
                    ..ConstraintDef::default()
                },
                min: 1,
                max: 1,
                skip: 0,
                exceptions: Vec::new(),
                mark: false,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseConversionDef {
    Preserve,
    AllLower,
    StartLower,
    AllUpper,
    StartUpper,
}

/// Options for one `\N` reference in a suggestion template.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchDef {
    pub no: usize,
    #[serde(default)]
    pub case_conversion: Option<CaseConversionDef>,
    #[serde(default)]
    pub regex_match: Option<String>,
    #[serde(default)]
    pub regex_replace: String,
    /// Synthesizes the form of the lemma with a tag matching this regex.
    #[serde(default)]
    pub postag: Option<String>,
    /// Uses the lemma instead of the surface form.
    #[serde(default)]
    pub lemma: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SuggestionDef {
    Plain(String),
    Template {
        template: String,
        #[serde(default)]
        matches: Vec<MatchDef>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExampleDef {
    pub text: String,
    #[serde(default)]
    pub correction: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleBodyDef {
    pub pattern: Vec<TokenDef>,
    pub antipatterns: Vec<Vec<TokenDef>>,
    pub message: Option<String>,
    pub short_message: String,
    pub suggestions: Vec<SuggestionDef>,
    pub examples: Vec<ExampleDef>,
    pub find_all: bool,
}

/// A rule. Either has a body itself or consists of several sub-rules in `rules`.
/// Antipatterns and the message of a rule with sub-rules apply to every sub-rule.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDef {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_on: Option<bool>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub issue_type: Option<IssueType>,
    #[serde(default)]
    pub mother_tongue: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleBodyDef>,
    #[serde(flatten)]
    pub body: RuleBodyDef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDef {
    pub id: String,
    #[serde(default = "default_true")]
    pub default_on: bool,
    #[serde(default)]
    pub issue_type: IssueType,
    #[serde(default)]
    pub priority: i32,
    pub rules: Vec<RuleDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrammarDef {
    #[serde(default)]
    pub categories: Vec<CategoryDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadingDef {
    #[serde(default)]
    pub lemma: Option<String>,
    pub postag: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionDef {
    /// `postag` is a regex.
    Filter { postag: String },
    /// `postag` is a regex.
    Remove { postag: String },
    Add { readings: Vec<ReadingDef> },
    Replace { readings: Vec<ReadingDef> },
    Immunize,
    IgnoreSpelling,
    Nop,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisambiguationRuleDef {
    pub id: String,
    pub pattern: Vec<TokenDef>,
    #[serde(default)]
    pub antipatterns: Vec<Vec<TokenDef>>,
    #[serde(flatten)]
    pub action: ActionDef,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisambiguationDef {
    #[serde(default)]
    pub rules: Vec<DisambiguationRuleDef>,
}
