//! Fundamental types used by this crate.

use crate::rule::id::Index;
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    hash::BuildHasherDefault,
    ops::{Add, AddAssign, Range, Sub},
};

pub type DefaultHasher = fnv::FnvHasher;
pub type DefaultHashMap<K, V> = HashMap<K, V, BuildHasherDefault<DefaultHasher>>;
pub type DefaultHashSet<T> = HashSet<T, BuildHasherDefault<DefaultHasher>>;

/// The part-of-speech tag of the synthetic token at the start of every sentence.
pub const SENT_START: &str = "SENT_START";
/// The part-of-speech tag added to the last token of every sentence.
pub const SENT_END: &str = "SENT_END";

/// A position in a text, in bytes and in chars.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub byte: usize,
    pub char: usize,
}

impl Add for Position {
    type Output = Position;

    fn add(self, other: Position) -> Position {
        Position {
            byte: self.byte + other.byte,
            char: self.char + other.char,
        }
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, other: Position) {
        self.byte += other.byte;
        self.char += other.char;
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, other: Position) -> Position {
        Position {
            byte: self.byte - other.byte,
            char: self.char - other.char,
        }
    }
}

impl Position {
    /// The position right after `text`.
    pub fn of_str(text: &str) -> Self {
        Position {
            byte: text.len(),
            char: text.chars().count(),
        }
    }
}

/// A range in a text, in bytes and in chars.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    byte: Range<usize>,
    char: Range<usize>,
}

impl Span {
    pub fn new(byte: Range<usize>, char: Range<usize>) -> Self {
        Span { byte, char }
    }

    /// The span covering `text` when it starts at `start`.
    pub fn from_str_at(text: &str, start: Position) -> Self {
        let end = start + Position::of_str(text);
        Span::new(start.byte..end.byte, start.char..end.char)
    }

    /// An empty span at the position.
    pub fn empty_at(position: Position) -> Self {
        Span::new(position.byte..position.byte, position.char..position.char)
    }

    pub fn byte(&self) -> &Range<usize> {
        &self.byte
    }

    pub fn char(&self) -> &Range<usize> {
        &self.char
    }

    pub fn start(&self) -> Position {
        Position {
            byte: self.byte.start,
            char: self.char.start,
        }
    }

    pub fn end(&self) -> Position {
        Position {
            byte: self.byte.end,
            char: self.char.end,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.char.start >= self.char.end
    }

    /// The smallest span covering both spans.
    pub fn join(&self, other: &Span) -> Span {
        Span::new(
            self.byte.start.min(other.byte.start)..self.byte.end.max(other.byte.end),
            self.char.start.min(other.char.start)..self.char.end.max(other.char.end),
        )
    }

    /// Whether the spans share at least one char. Empty spans overlap spans strictly containing them.
    pub fn overlaps(&self, other: &Span) -> bool {
        if self.is_empty() || other.is_empty() {
            let (empty, full) = if self.is_empty() {
                (self, other)
            } else {
                (other, self)
            };
            return full.char.start < empty.char.start && empty.char.start < full.char.end;
        }

        self.char.start < other.char.end && other.char.start < self.char.end
    }

    /// Moves the span right by `position`.
    pub fn rshift(mut self, position: Position) -> Self {
        self.byte = self.byte.start + position.byte..self.byte.end + position.byte;
        self.char = self.char.start + position.char..self.char.end + position.char;
        self
    }

    /// Moves the span left by `position`.
    pub fn lshift(mut self, position: Position) -> Self {
        self.byte = self.byte.start - position.byte..self.byte.end - position.byte;
        self.char = self.char.start - position.char..self.char.end - position.char;
        self
    }
}

/// One reading of a token: a lemma and a part-of-speech tag.
/// Both are `None` for the *null reading* of a word which is not in the dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordData {
    lemma: Option<String>,
    pos: Option<String>,
}

impl WordData {
    pub fn new<S1: Into<String>, S2: Into<String>>(lemma: S1, pos: S2) -> Self {
        WordData {
            lemma: Some(lemma.into()),
            pos: Some(pos.into()),
        }
    }

    /// A reading with only a part-of-speech tag.
    pub fn from_pos<S: Into<String>>(pos: S) -> Self {
        WordData {
            lemma: None,
            pos: Some(pos.into()),
        }
    }

    /// The reading of an unknown word.
    pub fn null() -> Self {
        WordData {
            lemma: None,
            pos: None,
        }
    }

    pub fn lemma(&self) -> Option<&str> {
        self.lemma.as_deref()
    }

    pub fn pos(&self) -> Option<&str> {
        self.pos.as_deref()
    }

    pub fn is_null(&self) -> bool {
        self.lemma.is_none() && self.pos.is_none()
    }

    /// Whether this is the reading marking the last token of a sentence.
    pub fn is_sentence_end(&self) -> bool {
        self.pos() == Some(SENT_END)
    }
}

/// The surface form of a token and all of its readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    text: String,
    tags: Vec<WordData>,
}

impl Word {
    pub fn new_with_tags<S: Into<String>>(text: S, tags: Vec<WordData>) -> Self {
        let mut word = Word {
            text: text.into(),
            tags,
        };
        word.ensure_reading();
        word
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn tags(&self) -> &[WordData] {
        &self.tags
    }

    /// A word always has a reading besides the sentence end marker. Without one it gets the null reading.
    pub(crate) fn ensure_reading(&mut self) {
        if self.tags.iter().all(WordData::is_sentence_end) {
            self.tags.insert(0, WordData::null());
        }
    }

    pub(crate) fn tags_mut(&mut self) -> &mut Vec<WordData> {
        &mut self.tags
    }
}

/// Marks a token as part of a multi-word phrase found by the [MultiwordChunker][crate::tokenizer::multiword::MultiwordChunker].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiwordMark {
    pub tag: String,
    pub is_start: bool,
    pub is_end: bool,
}

/// A token with all of its readings at one position of a sentence.
/// Spans are relative to the start of the sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    word: Word,
    span: Span,
    has_space_before: bool,
    is_sentence_start: bool,
    pub(crate) multiword: Option<MultiwordMark>,
    pub(crate) immunized: bool,
    pub(crate) ignore_spelling: bool,
}

impl Token {
    pub fn new(word: Word, span: Span, has_space_before: bool) -> Self {
        Token {
            word,
            span,
            has_space_before,
            is_sentence_start: false,
            multiword: None,
            immunized: false,
            ignore_spelling: false,
        }
    }

    /// Gets the special sentence start token.
    pub fn sent_start() -> Self {
        Token {
            word: Word::new_with_tags("", vec![WordData::from_pos(SENT_START)]),
            span: Span::default(),
            has_space_before: false,
            is_sentence_start: true,
            multiword: None,
            immunized: false,
            ignore_spelling: false,
        }
    }

    pub fn word(&self) -> &Word {
        &self.word
    }

    pub fn text(&self) -> &str {
        self.word.text()
    }

    pub fn tags(&self) -> &[WordData] {
        self.word.tags()
    }

    pub(crate) fn word_mut(&mut self) -> &mut Word {
        &mut self.word
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn has_space_before(&self) -> bool {
        self.has_space_before
    }

    /// Whether this is the synthetic token at the start of a sentence.
    pub fn is_sentence_start(&self) -> bool {
        self.is_sentence_start
    }

    pub fn multiword(&self) -> Option<&MultiwordMark> {
        self.multiword.as_ref()
    }

    pub fn is_immunized(&self) -> bool {
        self.immunized
    }

    pub fn ignores_spelling(&self) -> bool {
        self.ignore_spelling
    }

    pub fn has_pos(&self, pos: &str) -> bool {
        self.tags().iter().any(|x| x.pos() == Some(pos))
    }

    /// Whether no dictionary reading is known for the token.
    pub fn is_unknown(&self) -> bool {
        self.tags()
            .iter()
            .all(|x| x.is_null() || x.is_sentence_end())
    }
}

/// A tokenized, tagged and disambiguated sentence. The first token is always [Token::sent_start].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedSentence {
    tokens: Vec<Token>,
    text: String,
    start: Position,
}

impl AnalyzedSentence {
    /// Creates a sentence from its non-whitespace tokens, prepending the sentence start token.
    /// `start` is the position of the sentence in the checked text.
    pub fn new(tokens: Vec<Token>, text: String, start: Position) -> Self {
        let mut all_tokens = Vec::with_capacity(tokens.len() + 1);
        all_tokens.push(Token::sent_start());
        all_tokens.extend(tokens);

        AnalyzedSentence {
            tokens: all_tokens,
            text,
            start,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut [Token] {
        &mut self.tokens
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// The position of the sentence in the checked text.
    pub fn start(&self) -> Position {
        self.start
    }

    /// The span of the sentence in the checked text.
    pub fn span(&self) -> Span {
        Span::from_str_at(&self.text, self.start)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }
}

/// The kind of problem a rule detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Misspelling,
    Grammar,
    Style,
    Typographical,
    Other,
}

impl Default for IssueType {
    fn default() -> Self {
        IssueType::Grammar
    }
}

/// A located violation of a rule, with a message and suggested replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub(crate) source: Index,
    pub(crate) span: Span,
    pub(crate) message: String,
    pub(crate) short_message: String,
    pub(crate) replacements: Vec<String>,
    pub(crate) issue_type: IssueType,
}

impl RuleMatch {
    pub fn new(
        source: Index,
        span: Span,
        message: String,
        short_message: String,
        replacements: Vec<String>,
        issue_type: IssueType,
    ) -> Self {
        RuleMatch {
            source,
            span,
            message,
            short_message,
            replacements,
            issue_type,
        }
    }

    /// The ID of the rule (without category or sub-rule index) this match is from.
    pub fn rule_id(&self) -> &str {
        self.source.parent().name()
    }

    /// The full identifier of the rule this match is from.
    pub fn source(&self) -> &Index {
        &self.source
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// The start char index (inclusive).
    pub fn from_pos(&self) -> usize {
        self.span.char().start
    }

    /// The end char index (exclusive).
    pub fn to_pos(&self) -> usize {
        self.span.char().end
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    pub fn short_message(&self) -> &str {
        self.short_message.as_str()
    }

    pub fn replacements(&self) -> &[String] {
        &self.replacements
    }

    pub fn issue_type(&self) -> IssueType {
        self.issue_type
    }

    pub(crate) fn rshift(mut self, position: Position) -> Self {
        self.span = self.span.rshift(position);
        self
    }
}
