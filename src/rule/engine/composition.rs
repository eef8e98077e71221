use std::ops::Range;

use crate::{
    types::*,
    utils::regex::Regex,
};
use enum_dispatch::enum_dispatch;
use unicase::UniCase;

/// Upper bound of backtracking steps when matching from one start position.
/// Beyond it, the start position counts as not matching.
pub const MAX_BACKTRACK_STEPS: usize = 4096;

#[derive(Debug, Clone)]
pub struct Matcher {
    matcher: either::Either<String, Regex>,
    negate: bool,
    case_sensitive: bool,
}

impl Matcher {
    /// A matcher which must match the complete input.
    pub fn new_regex(regex: Regex, negate: bool) -> Self {
        Matcher {
            matcher: either::Right(regex),
            negate,
            case_sensitive: true, // handled by regex
        }
    }

    pub fn new_string(string: String, negate: bool, case_sensitive: bool) -> Self {
        Matcher {
            matcher: either::Left(string),
            negate,
            case_sensitive,
        }
    }

    /// Checks the input. Missing input (e.g. the tag of an unknown word) only matches negated matchers.
    pub fn is_match(&self, input: Option<&str>) -> bool {
        let input = match input {
            Some(input) if !input.is_empty() => input,
            _ => return self.negate,
        };

        let matches = match &self.matcher {
            either::Left(string) => {
                if self.case_sensitive {
                    string.as_str() == input
                } else {
                    UniCase::new(string.as_str()) == UniCase::new(input)
                }
            }
            either::Right(regex) => regex.is_match(input),
        };

        matches != self.negate
    }
}

/// Matches the lemma and part-of-speech tag of a single reading.
#[derive(Debug, Clone, Default)]
pub struct WordDataMatcher {
    pub(crate) pos_matcher: Option<Matcher>,
    pub(crate) lemma_matcher: Option<Matcher>,
}

impl WordDataMatcher {
    pub fn new(pos_matcher: Option<Matcher>, lemma_matcher: Option<Matcher>) -> Self {
        WordDataMatcher {
            pos_matcher,
            lemma_matcher,
        }
    }

    pub fn is_match(&self, data: &WordData) -> bool {
        // matching the POS tag is cheaper, check it first
        self.pos_matcher
            .as_ref()
            .map_or(true, |m| m.is_match(data.pos()))
            && self
                .lemma_matcher
                .as_ref()
                .map_or(true, |m| m.is_match(data.lemma()))
    }
}

/// A repetition range. `max` may be `usize::MAX` for unbounded repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantifier {
    pub min: usize,
    pub max: usize,
}

impl Quantifier {
    pub fn new(min: usize, max: usize) -> Result<Self, String> {
        if max < min {
            return Err(format!("min ({}) is larger than max ({})", min, max));
        }
        Ok(Quantifier { min, max })
    }

    pub fn one() -> Self {
        Quantifier { min: 1, max: 1 }
    }
}

#[enum_dispatch]
pub trait Atomable: Send + Sync {
    fn is_match(&self, tokens: &[Token], position: usize) -> bool;
}

#[enum_dispatch(Atomable)]
#[derive(Debug, Clone)]
pub enum Atom {
    SpaceBeforeAtom(concrete::SpaceBeforeAtom),
    TextAtom(concrete::TextAtom),
    WordDataAtom(concrete::WordDataAtom),
    TrueAtom,
    FalseAtom,
    AndAtom,
    OrAtom,
    NotAtom,
    OffsetAtom,
}

pub mod concrete {
    use super::{Atomable, Matcher, Token, WordDataMatcher};

    /// Matches the surface form of a token.
    #[derive(Debug, Clone)]
    pub struct TextAtom {
        matcher: Matcher,
    }

    impl Atomable for TextAtom {
        fn is_match(&self, tokens: &[Token], position: usize) -> bool {
            self.matcher.is_match(Some(tokens[position].text()))
        }
    }

    impl TextAtom {
        pub fn new(matcher: Matcher) -> Self {
            TextAtom { matcher }
        }
    }

    #[derive(Debug, Clone)]
    pub struct SpaceBeforeAtom {
        value: bool,
    }

    impl Atomable for SpaceBeforeAtom {
        fn is_match(&self, tokens: &[Token], position: usize) -> bool {
            tokens[position].has_space_before() == self.value
        }
    }

    impl SpaceBeforeAtom {
        pub fn new(value: bool) -> Self {
            SpaceBeforeAtom { value }
        }
    }

    /// Matches the readings of a token.
    /// * With `match_all` every reading must match, otherwise one is enough.
    /// * With `negate` the token matches iff the readings do not.
    #[derive(Debug, Clone)]
    pub struct WordDataAtom {
        matcher: WordDataMatcher,
        match_all: bool,
        negate: bool,
    }

    impl Atomable for WordDataAtom {
        fn is_match(&self, tokens: &[Token], position: usize) -> bool {
            let tags = tokens[position].tags();

            let matches = if self.match_all {
                let mut relevant = tags.iter().filter(|x| !x.is_sentence_end()).peekable();

                if relevant.peek().is_none() {
                    tags.iter().all(|x| self.matcher.is_match(x))
                } else {
                    relevant.all(|x| self.matcher.is_match(x))
                }
            } else {
                tags.iter().any(|x| self.matcher.is_match(x))
            };

            matches != self.negate
        }
    }

    impl WordDataAtom {
        pub fn new(matcher: WordDataMatcher, match_all: bool, negate: bool) -> Self {
            WordDataAtom {
                matcher,
                match_all,
                negate,
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrueAtom {}

impl Atomable for TrueAtom {
    fn is_match(&self, _tokens: &[Token], _position: usize) -> bool {
        true
    }
}

impl TrueAtom {
    pub fn new() -> Self {
        TrueAtom {}
    }
}

#[derive(Debug, Clone, Default)]
pub struct FalseAtom {}

impl Atomable for FalseAtom {
    fn is_match(&self, _tokens: &[Token], _position: usize) -> bool {
        false
    }
}

impl FalseAtom {
    pub fn new() -> Self {
        FalseAtom {}
    }
}

#[derive(Debug, Clone)]
pub struct AndAtom {
    atoms: Vec<Atom>,
}

impl AndAtom {
    pub fn and(atoms: Vec<Atom>) -> Atom {
        let mut atoms: Vec<_> = atoms
            .into_iter()
            .filter(|x| !matches!(x, Atom::TrueAtom { .. }))
            .collect();

        if atoms.is_empty() {
            (TrueAtom {}).into()
        } else if atoms.len() == 1 {
            atoms.remove(0)
        } else {
            (AndAtom { atoms }).into()
        }
    }
}

impl Atomable for AndAtom {
    fn is_match(&self, tokens: &[Token], position: usize) -> bool {
        self.atoms.iter().all(|x| x.is_match(tokens, position))
    }
}

#[derive(Debug, Clone)]
pub struct OrAtom {
    atoms: Vec<Atom>,
}

impl OrAtom {
    pub fn or(atoms: Vec<Atom>) -> Atom {
        let mut atoms: Vec<_> = atoms
            .into_iter()
            .filter(|x| !matches!(x, Atom::FalseAtom { .. }))
            .collect();

        if atoms.is_empty() {
            (FalseAtom {}).into()
        } else if atoms.len() == 1 {
            atoms.remove(0)
        } else {
            (OrAtom { atoms }).into()
        }
    }
}

impl Atomable for OrAtom {
    fn is_match(&self, tokens: &[Token], position: usize) -> bool {
        self.atoms.iter().any(|x| x.is_match(tokens, position))
    }
}

#[derive(Debug, Clone)]
pub struct NotAtom {
    atom: Box<Atom>,
}

impl NotAtom {
    pub fn not(atom: Atom) -> Atom {
        match atom {
            Atom::TrueAtom { .. } => FalseAtom::new().into(),
            Atom::FalseAtom { .. } => TrueAtom::new().into(),
            x => (NotAtom { atom: Box::new(x) }).into(),
        }
    }
}

impl Atomable for NotAtom {
    fn is_match(&self, tokens: &[Token], position: usize) -> bool {
        !self.atom.is_match(tokens, position)
    }
}

/// Checks the token `offset` positions away. Never matches outside the sentence.
#[derive(Debug, Clone)]
pub struct OffsetAtom {
    atom: Box<Atom>,
    offset: isize,
}

impl Atomable for OffsetAtom {
    fn is_match(&self, tokens: &[Token], position: usize) -> bool {
        let new_position = position as isize + self.offset;

        if new_position < 0 || (new_position as usize) >= tokens.len() {
            false
        } else {
            self.atom.is_match(tokens, new_position as usize)
        }
    }
}

impl OffsetAtom {
    pub fn new(atom: Atom, offset: isize) -> Self {
        OffsetAtom {
            atom: Box::new(atom),
            offset,
        }
    }
}

/// The token ranges matched by each part of a [Composition].
/// Group 0 covers the whole match; the visible parts are numbered from 1 in order.
#[derive(Debug, Clone)]
pub struct MatchGraph<'t> {
    groups: Vec<Range<usize>>,
    id_to_idx: &'t DefaultHashMap<usize, usize>,
    tokens: &'t [Token],
}

impl<'t> MatchGraph<'t> {
    pub fn by_index(&self, index: usize) -> &Range<usize> {
        &self.groups[index]
    }

    pub fn by_id(&self, id: usize) -> Option<&Range<usize>> {
        Some(&self.groups[*self.id_to_idx.get(&id)?])
    }

    /// The number of group ids, including group 0.
    pub fn n_ids(&self) -> usize {
        self.id_to_idx.len()
    }

    pub fn tokens(&self) -> &'t [Token] {
        self.tokens
    }

    /// The token range of the whole match.
    pub fn range(&self) -> Range<usize> {
        self.groups[0].clone()
    }

    /// The token range from the start of group `start` up to the end of group `end - 1`.
    /// Empty groups are skipped. `None` if all groups in the range are empty.
    pub fn token_range(&self, ids: Range<usize>) -> Option<Range<usize>> {
        let ranges: Vec<_> = ids
            .filter_map(|id| self.by_id(id))
            .filter(|x| !x.is_empty())
            .collect();

        Some(ranges.first()?.start..ranges.last()?.end)
    }

    /// The sentence-relative span of the tokens. The sentence start token does not contribute to it.
    pub fn span(&self, range: Range<usize>) -> Option<Span> {
        self.tokens[range]
            .iter()
            .filter(|x| !x.is_sentence_start())
            .map(|x| x.span().clone())
            .fold(None, |acc: Option<Span>, span| {
                Some(acc.map_or(span.clone(), |acc| acc.join(&span)))
            })
    }
}

#[derive(Debug, Clone)]
pub struct Part {
    pub atom: Atom,
    pub quantifier: Quantifier,
    pub visible: bool,
}

impl Part {
    pub fn new(atom: Atom, quantifier: Quantifier, visible: bool) -> Self {
        Part {
            atom,
            quantifier,
            visible,
        }
    }
}

/// A sequence of [Part]s matched against consecutive tokens.
///
/// Matching is greedy with backtracking: each part first consumes as many tokens as it can (up to its maximum),
/// then gives back one token at a time if the rest of the sequence does not match.
#[derive(Debug, Clone)]
pub struct Composition {
    pub(crate) parts: Vec<Part>,
    group_ids_to_idx: DefaultHashMap<usize, usize>,
}

struct MatchState {
    groups: Vec<Range<usize>>,
    steps: usize,
}

impl Composition {
    pub fn new(parts: Vec<Part>) -> Self {
        let mut group_ids_to_idx = DefaultHashMap::default();
        group_ids_to_idx.insert(0, 0);
        let mut current_id = 1;

        for (i, part) in parts.iter().enumerate() {
            if part.visible {
                group_ids_to_idx.insert(current_id, i + 1);
                current_id += 1;
            }
        }

        Composition {
            parts,
            group_ids_to_idx,
        }
    }

    /// The number of visible parts.
    pub fn n_visible(&self) -> usize {
        self.group_ids_to_idx.len() - 1
    }

    fn is_multiword_interior_start(token: &Token) -> bool {
        token.multiword().map_or(false, |x| !x.is_start)
    }

    fn is_multiword_interior_end(token: &Token) -> bool {
        token.multiword().map_or(false, |x| !x.is_end)
    }

    fn match_from(
        &self,
        tokens: &[Token],
        index: usize,
        position: usize,
        start: usize,
        state: &mut MatchState,
    ) -> Option<usize> {
        if index == self.parts.len() {
            // a match must consume tokens and must not end inside a multi-word phrase
            let is_valid = position > start && !Self::is_multiword_interior_end(&tokens[position - 1]);
            return if is_valid { Some(position) } else { None };
        }

        if state.steps >= MAX_BACKTRACK_STEPS {
            return None;
        }
        state.steps += 1;

        let part = &self.parts[index];

        let mut count = 0;
        while count < part.quantifier.max
            && position + count < tokens.len()
            && part.atom.is_match(tokens, position + count)
        {
            count += 1;
        }

        if count < part.quantifier.min {
            return None;
        }

        for n in (part.quantifier.min..=count).rev() {
            state.groups[index + 1] = position..position + n;

            if let Some(end) = self.match_from(tokens, index + 1, position + n, start, state) {
                return Some(end);
            }
            if state.steps >= MAX_BACKTRACK_STEPS {
                return None;
            }
        }

        None
    }

    /// Tries to match the composition starting exactly at token `start`.
    pub fn apply<'t>(&'t self, tokens: &'t [Token], start: usize) -> Option<MatchGraph<'t>> {
        if start >= tokens.len() || Self::is_multiword_interior_start(&tokens[start]) {
            return None;
        }

        // the first part must match the start token unless it is optional
        let first = &self.parts[0];
        if first.quantifier.min > 0 && !first.atom.is_match(tokens, start) {
            return None;
        }

        let mut state = MatchState {
            groups: vec![start..start; self.parts.len() + 1],
            steps: 0,
        };

        let end = self.match_from(tokens, 0, start, start, &mut state)?;
        state.groups[0] = start..end;

        Some(MatchGraph {
            groups: state.groups,
            id_to_idx: &self.group_ids_to_idx,
            tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(words: &[(&str, &str)]) -> AnalyzedSentence {
        let mut position = Position::default();
        let mut text = String::new();
        let tokens = words
            .iter()
            .map(|(word, pos)| {
                if !text.is_empty() {
                    text.push(' ');
                    position += Position { byte: 1, char: 1 };
                }
                text.push_str(word);
                let span = Span::from_str_at(word, position);
                position = span.end();
                Token::new(
                    Word::new_with_tags(*word, vec![WordData::new(*word, *pos)]),
                    span,
                    true,
                )
            })
            .collect();

        AnalyzedSentence::new(tokens, text, Position::default())
    }

    fn text_atom(text: &str) -> Atom {
        concrete::TextAtom::new(Matcher::new_string(text.into(), false, false)).into()
    }

    #[test]
    fn repetition_is_greedy() {
        let sentence = sentence(&[("FOO", "X"), ("FOO", "X"), ("FOO", "X"), ("BAR", "X")]);
        let composition = Composition::new(vec![Part::new(
            text_atom("FOO"),
            Quantifier::new(1, 3).unwrap(),
            true,
        )]);

        let graph = composition.apply(sentence.tokens(), 1).unwrap();
        assert_eq!(graph.range(), 1..4);
        assert_eq!(graph.span(graph.range()).unwrap().char(), &(0..11));
    }

    #[test]
    fn backtracks_into_repetition() {
        // [a]{1,3} [a] must give one token back
        let sentence = sentence(&[("a", "X"), ("a", "X"), ("a", "X")]);
        let composition = Composition::new(vec![
            Part::new(text_atom("a"), Quantifier::new(1, 3).unwrap(), true),
            Part::new(text_atom("a"), Quantifier::one(), true),
        ]);

        let graph = composition.apply(sentence.tokens(), 1).unwrap();
        assert_eq!(graph.range(), 1..4);
        assert_eq!(graph.by_id(1), Some(&(1..3)));
        assert_eq!(graph.by_id(2), Some(&(3..4)));
    }

    #[test]
    fn skips_tokens() {
        let sentence = sentence(&[("either", "CC"), ("red", "JJ"), ("blue", "JJ"), ("or", "CC")]);
        let composition = Composition::new(vec![
            Part::new(text_atom("either"), Quantifier::one(), true),
            Part::new(TrueAtom::new().into(), Quantifier::new(0, 5).unwrap(), false),
            Part::new(text_atom("or"), Quantifier::one(), true),
        ]);

        let graph = composition.apply(sentence.tokens(), 1).unwrap();
        assert_eq!(graph.by_id(2), Some(&(4..5)));
        assert_eq!(graph.n_ids(), 3);
    }

    #[test]
    fn skip_is_greedy() {
        let words = ["either", "the", "bus", "nor", "the", "car", "nor", "the", "train"];
        let sentence = sentence(&words.iter().map(|x| (*x, "X")).collect::<Vec<_>>());
        let composition = Composition::new(vec![
            Part::new(text_atom("either"), Quantifier::one(), true),
            Part::new(TrueAtom::new().into(), Quantifier::new(0, 5).unwrap(), false),
            Part::new(text_atom("nor"), Quantifier::one(), true),
        ]);

        // the longest skip wins, so the last reachable "nor" is matched
        let graph = composition.apply(sentence.tokens(), 1).unwrap();
        assert_eq!(graph.by_id(2), Some(&(7..8)));
        assert_eq!(graph.range(), 1..8);
    }

    #[test]
    fn optional_only_pattern_never_matches_empty() {
        let sentence = sentence(&[("b", "X")]);
        let composition = Composition::new(vec![Part::new(
            text_atom("a"),
            Quantifier::new(0, 1).unwrap(),
            true,
        )]);

        assert!(composition.apply(sentence.tokens(), 1).is_none());
    }

    #[test]
    fn reading_modes() {
        let mut sentence = sentence(&[("house", "NN")]);
        sentence.tokens_mut()[1]
            .word_mut()
            .tags_mut()
            .push(WordData::new("house", "VB"));

        let nn = || {
            WordDataMatcher::new(
                Some(Matcher::new_string("NN".into(), false, true)),
                None,
            )
        };

        let any = concrete::WordDataAtom::new(nn(), false, false);
        let all = concrete::WordDataAtom::new(nn(), true, false);
        let none = concrete::WordDataAtom::new(nn(), false, true);

        assert!(any.is_match(sentence.tokens(), 1));
        assert!(!all.is_match(sentence.tokens(), 1));
        assert!(!none.is_match(sentence.tokens(), 1));
    }

    #[test]
    fn min_larger_than_max_is_rejected() {
        assert!(Quantifier::new(2, 1).is_err());
    }
}
