//! Load-time conversion of rule definitions into rules. All validation happens here,
//! so malformed patterns never reach the matching code.

use std::convert::TryFrom;

use crate::{
    rule::{
        disambiguation::{Disambiguation, PosFilter},
        engine::{
            composition::{
                concrete::{SpaceBeforeAtom, TextAtom, WordDataAtom},
                AndAtom, Atom, Composition, Matcher, NotAtom, OffsetAtom, OrAtom, Part, Quantifier,
                WordDataMatcher,
            },
            TokenEngine,
        },
        grammar::{Conversion, Example, Match, PosReplacer, Synthesizer, SynthesizerPart},
        id::Category,
        DisambiguationRule, PatternRule,
    },
    rules::RuleMeta,
    types::*,
    utils::regex::Regex,
    Error,
};

pub mod structure;

use structure::*;

fn invalid<S: Into<String>>(id: &str, reason: S) -> Error {
    Error::InvalidPattern {
        id: id.to_owned(),
        reason: reason.into(),
    }
}

fn matcher(text: &str, is_regex: bool, negate: bool, case_sensitive: bool) -> Result<Matcher, Error> {
    Ok(if is_regex {
        Matcher::new_regex(Regex::with_options(text, true, case_sensitive)?, negate)
    } else {
        Matcher::new_string(text.to_owned(), negate, case_sensitive)
    })
}

fn constraint_atom(def: &ConstraintDef) -> Result<Atom, Error> {
    let mut atoms = Vec::new();

    if let Some(text) = &def.text {
        atoms.push(TextAtom::new(matcher(text, def.regex, def.negate, def.case_sensitive)?).into());
    }

    if def.postag.is_some() || def.lemma.is_some() {
        let pos_matcher = def
            .postag
            .as_ref()
            .map(|x| matcher(x, def.postag_regex, false, true))
            .transpose()?;
        let lemma_matcher = def
            .lemma
            .as_ref()
            .map(|x| matcher(x, false, false, def.case_sensitive))
            .transpose()?;

        // without text, `negate` applies to the readings
        let negate = def.negate_pos || (def.text.is_none() && def.negate);

        atoms.push(
            WordDataAtom::new(
                WordDataMatcher::new(pos_matcher, lemma_matcher),
                def.match_all_readings,
                negate,
            )
            .into(),
        );
    }

    if let Some(value) = def.space_before {
        atoms.push(SpaceBeforeAtom::new(value).into());
    }

    Ok(AndAtom::and(atoms))
}

fn exceptions_atom(exceptions: &[&ExceptionDef], with_offset: bool) -> Result<Atom, Error> {
    let atoms = exceptions
        .iter()
        .map(|exception| {
            let atom = constraint_atom(&exception.constraint)?;

            Ok(match (exception.scope, with_offset) {
                (Scope::Next, true) => OffsetAtom::new(atom, 1).into(),
                (Scope::Previous, true) => OffsetAtom::new(atom, -1).into(),
                _ => atom,
            })
        })
        .collect::<Result<Vec<Atom>, Error>>()?;

    Ok(OrAtom::or(atoms))
}

fn bound(id: &str, name: &str, value: i64) -> Result<usize, Error> {
    match value {
        -1 => Ok(usize::MAX),
        x if x >= 0 => Ok(x as usize),
        x => Err(invalid(id, format!("{} must be -1 or at least 0, found {}", name, x))),
    }
}

fn parts_from_tokens(id: &str, tokens: &[TokenDef]) -> Result<Vec<Part>, Error> {
    if tokens.is_empty() {
        return Err(invalid(id, "pattern is empty"));
    }

    let mut parts = Vec::new();

    for TokenDef(token) in tokens {
        let main = constraint_atom(&token.constraint)?;
        let exceptions: Vec<_> = token.exceptions.iter().collect();

        // a matching exception disqualifies the token
        let atom = AndAtom::and(vec![main, NotAtom::not(exceptions_atom(&exceptions, true)?)]);

        let max = bound(id, "max", token.max)?;
        if max == 0 {
            return Err(invalid(id, "max must be at least 1"));
        }
        let quantifier = Quantifier::new(token.min, max).map_err(|reason| invalid(id, reason))?;
        parts.push(Part::new(atom, quantifier, true));

        let skip = bound(id, "skip", token.skip)?;
        if skip > 0 {
            // skipped tokens must not match the exceptions scoped to the next token
            let next_exceptions: Vec<_> = token
                .exceptions
                .iter()
                .filter(|x| x.scope == Scope::Next)
                .collect();
            let skip_atom = NotAtom::not(exceptions_atom(&next_exceptions, false)?);

            parts.push(Part::new(skip_atom, Quantifier { min: 0, max: skip }, false));
        }
    }

    Ok(parts)
}

fn composition(id: &str, tokens: &[TokenDef]) -> Result<Composition, Error> {
    Ok(Composition::new(parts_from_tokens(id, tokens)?))
}

fn engine(id: &str, pattern: &[TokenDef], antipatterns: &[&Vec<TokenDef>]) -> Result<TokenEngine, Error> {
    let antipatterns = antipatterns
        .iter()
        .map(|x| composition(id, x))
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(TokenEngine::new(composition(id, pattern)?, antipatterns))
}

/// The group ids of the marked tokens. Without marks, every token is marked.
fn marker(id: &str, tokens: &[TokenDef]) -> Result<(usize, usize), Error> {
    let marked: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, x)| x.0.mark)
        .map(|(i, _)| i)
        .collect();

    match (marked.first(), marked.last()) {
        (Some(first), Some(last)) => {
            if last - first + 1 != marked.len() {
                return Err(invalid(id, "marked tokens must be contiguous"));
            }
            Ok((first + 1, last + 2))
        }
        _ => Ok((1, tokens.len() + 1)),
    }
}

fn conversion(def: Option<CaseConversionDef>) -> Conversion {
    match def {
        None | Some(CaseConversionDef::Preserve) => Conversion::Nop,
        Some(CaseConversionDef::AllLower) => Conversion::AllLower,
        Some(CaseConversionDef::StartLower) => Conversion::StartLower,
        Some(CaseConversionDef::AllUpper) => Conversion::AllUpper,
        Some(CaseConversionDef::StartUpper) => Conversion::StartUpper,
    }
}

fn parse_match(id: &str, no: usize, defs: &[MatchDef], n_groups: usize) -> Result<Match, Error> {
    if no == 0 || no > n_groups {
        return Err(invalid(id, format!("unknown group reference \\{}", no)));
    }

    let mut output = Match::new(no);

    if let Some(def) = defs.iter().find(|x| x.no == no) {
        output.conversion = conversion(def.case_conversion);
        output.use_lemma = def.lemma;
        output.pos_replacer = def
            .postag
            .as_ref()
            .map(|x| {
                Ok::<_, Error>(PosReplacer {
                    matcher: matcher(x, true, false, true)?,
                })
            })
            .transpose()?;
        output.regex_replacer = def
            .regex_match
            .as_ref()
            .map(|x| Ok::<_, Error>((Regex::new(x)?, def.regex_replace.clone())))
            .transpose()?;
    }

    Ok(output)
}

/// Parses a template with `\N` references to matched groups.
fn synthesizer(
    id: &str,
    template: &str,
    defs: &[MatchDef],
    n_groups: usize,
    use_titlecase_adjust: bool,
) -> Result<Synthesizer, Error> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek().map_or(false, |x| x.is_ascii_digit()) {
            let mut digits = String::new();
            while let Some(digit) = chars.peek().filter(|x| x.is_ascii_digit()) {
                digits.push(*digit);
                chars.next();
            }

            if !text.is_empty() {
                parts.push(SynthesizerPart::Text(std::mem::take(&mut text)));
            }
            let no = digits
                .parse()
                .map_err(|_| invalid(id, format!("invalid group reference \\{}", digits)))?;
            parts.push(SynthesizerPart::Match(parse_match(id, no, defs, n_groups)?));
        } else {
            text.push(c);
        }
    }

    if !text.is_empty() {
        parts.push(SynthesizerPart::Text(text));
    }

    Ok(Synthesizer::new(parts, use_titlecase_adjust))
}

fn suggester(id: &str, def: &SuggestionDef, n_groups: usize) -> Result<Synthesizer, Error> {
    match def {
        SuggestionDef::Plain(template) => synthesizer(id, template, &[], n_groups, true),
        SuggestionDef::Template { template, matches } => {
            synthesizer(id, template, matches, n_groups, true)
        }
    }
}

struct RuleContext<'a> {
    category: &'a CategoryDef,
    rule: &'a RuleDef,
}

fn pattern_rule(
    context: &RuleContext,
    body: &RuleBodyDef,
    index: usize,
    shared_antipatterns: &[Vec<TokenDef>],
) -> Result<PatternRule, Error> {
    let RuleContext { category, rule } = context;
    let id = rule.id.as_str();

    let antipatterns: Vec<_> = body
        .antipatterns
        .iter()
        .chain(shared_antipatterns.iter())
        .collect();
    let engine = engine(id, &body.pattern, &antipatterns)?;
    let n_groups = engine.composition().n_visible();
    let (start, end) = marker(id, &body.pattern)?;

    let message = body
        .message
        .as_ref()
        .or_else(|| rule.body.message.as_ref())
        .ok_or_else(|| invalid(id, "message is missing"))?;
    let message = synthesizer(id, message, &[], n_groups, false)?;
    let short_message = if body.short_message.is_empty() {
        rule.body.short_message.clone()
    } else {
        body.short_message.clone()
    };

    let suggesters = body
        .suggestions
        .iter()
        .map(|x| suggester(id, x, n_groups))
        .collect::<Result<Vec<_>, Error>>()?;

    let meta = RuleMeta::new(Category::new(category.id.as_str()).join(id).join(index), rule.description.as_str())
        .with_enabled_by_default(rule.default_on.unwrap_or(category.default_on))
        .with_priority(rule.priority.unwrap_or(category.priority))
        .with_issue_type(rule.issue_type.unwrap_or(category.issue_type))
        .with_mother_tongue(rule.mother_tongue.clone());

    Ok(PatternRule {
        meta,
        engine,
        start,
        end,
        message,
        short_message,
        suggesters,
        find_all: body.find_all,
        examples: body
            .examples
            .iter()
            .map(|x| Example::new(x.text.clone(), x.correction.clone()))
            .collect(),
    })
}

impl TryFrom<&GrammarDef> for Vec<PatternRule> {
    type Error = Error;

    fn try_from(def: &GrammarDef) -> Result<Self, Self::Error> {
        let mut rules = Vec::new();
        let mut ids = DefaultHashSet::default();

        for category in &def.categories {
            for rule in &category.rules {
                if !ids.insert(rule.id.to_lowercase()) {
                    return Err(invalid(&rule.id, "duplicate rule id"));
                }

                let context = RuleContext { category, rule };

                if rule.rules.is_empty() {
                    rules.push(pattern_rule(&context, &rule.body, 0, &[])?);
                } else {
                    if !rule.body.pattern.is_empty() {
                        return Err(invalid(&rule.id, "a rule with sub-rules can not have its own pattern"));
                    }

                    for (i, body) in rule.rules.iter().enumerate() {
                        rules.push(pattern_rule(&context, body, i, &rule.body.antipatterns)?);
                    }
                }
            }
        }

        Ok(rules)
    }
}

fn reading(def: &ReadingDef) -> WordData {
    match &def.lemma {
        Some(lemma) => WordData::new(lemma.as_str(), def.postag.as_str()),
        None => WordData::from_pos(def.postag.as_str()),
    }
}

impl TryFrom<&DisambiguationRuleDef> for DisambiguationRule {
    type Error = Error;

    fn try_from(def: &DisambiguationRuleDef) -> Result<Self, Self::Error> {
        let id = def.id.as_str();
        let antipatterns: Vec<_> = def.antipatterns.iter().collect();
        let (start, end) = marker(id, &def.pattern)?;

        let pos_filter = |postag: &str| -> Result<PosFilter, Error> {
            Ok(PosFilter::new(matcher(postag, true, false, true)?))
        };

        let disambiguation = match &def.action {
            ActionDef::Filter { postag } => Disambiguation::Filter(pos_filter(postag)?),
            ActionDef::Remove { postag } => Disambiguation::Remove(pos_filter(postag)?),
            ActionDef::Add { readings } => Disambiguation::Add(readings.iter().map(reading).collect()),
            ActionDef::Replace { readings } => {
                if readings.is_empty() {
                    return Err(invalid(id, "replace needs at least one reading"));
                }
                Disambiguation::Replace(readings.iter().map(reading).collect())
            }
            ActionDef::Immunize => Disambiguation::Immunize,
            ActionDef::IgnoreSpelling => Disambiguation::IgnoreSpelling,
            ActionDef::Nop => Disambiguation::Nop,
        };

        Ok(DisambiguationRule {
            id: def.id.clone(),
            engine: engine(id, &def.pattern, &antipatterns)?,
            disambiguation,
            start,
            end,
        })
    }
}

/// Reads pattern rules from their JSON definition.
pub fn read_grammar_rules(json: &str) -> Result<Vec<PatternRule>, Error> {
    let def: GrammarDef = serde_json::from_str(json)?;
    Vec::<PatternRule>::try_from(&def)
}

/// Reads disambiguation rules from their JSON definition, in order of application.
pub fn read_disambiguation_rules(json: &str) -> Result<Vec<DisambiguationRule>, Error> {
    let def: DisambiguationDef = serde_json::from_str(json)?;
    def.rules.iter().map(DisambiguationRule::try_from).collect()
}
