use crate::types::*;
use crate::Error;
use serde::{Deserialize, Serialize};

/// Marks fixed multi-word phrases (e.g. "in spite of") so that they act as one unit.
/// Every token of a phrase gets an additional reading with the phrase as lemma and a [MultiwordMark].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiwordChunker {
    /// Phrases indexed by their first word, longest first.
    multiwords: DefaultHashMap<String, Vec<(Vec<String>, String)>>,
}

impl MultiwordChunker {
    /// Reads lines of `phrase\ttag`. Empty lines and lines starting with `#` are ignored.
    pub fn from_lines(text: &str) -> Result<Self, Error> {
        let mut chunker = MultiwordChunker::default();

        for (i, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            match line.split('\t').collect::<Vec<_>>().as_slice() {
                [phrase, tag] if !phrase.trim().is_empty() => {
                    chunker.insert(phrase.split_whitespace().collect(), tag);
                }
                _ => {
                    return Err(Error::InvalidEntry {
                        line: i + 1,
                        reason: "expected `phrase<TAB>tag`".into(),
                    })
                }
            }
        }

        Ok(chunker)
    }

    pub fn insert(&mut self, words: Vec<&str>, tag: &str) {
        let first = words[0].to_owned();
        let words: Vec<String> = words.into_iter().map(|x| x.to_owned()).collect();

        let entry = self.multiwords.entry(first).or_insert_with(Vec::new);
        entry.push((words, tag.to_owned()));
        entry.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    pub fn is_empty(&self) -> bool {
        self.multiwords.is_empty()
    }

    fn find(&self, tokens: &[Token]) -> Option<&(Vec<String>, String)> {
        let first = tokens.get(0)?.text();
        let candidates = self
            .multiwords
            .get(first)
            .or_else(|| self.multiwords.get(&first.to_lowercase()))?;

        candidates.iter().find(|(words, _)| {
            words.len() <= tokens.len()
                && words
                    .iter()
                    .zip(tokens)
                    .enumerate()
                    .all(|(i, (word, token))| {
                        // the first word may be capitalized at sentence start
                        token.text() == word
                            || (i == 0 && token.text().to_lowercase() == word.to_lowercase())
                    })
        })
    }

    /// Annotates all phrases in the tokens. Token count and texts stay unchanged.
    /// Phrases are found left to right, the longest phrase at a position wins.
    pub fn apply(&self, tokens: &mut [Token]) {
        let mut i = 0;

        while i < tokens.len() {
            let (words, tag) = match self.find(&tokens[i..]) {
                Some(found) if found.0.len() > 1 => found,
                _ => {
                    i += 1;
                    continue;
                }
            };

            let n = words.len();
            let phrase = words.join(" ");
            for (j, token) in tokens[i..i + n].iter_mut().enumerate() {
                let data = WordData::new(phrase.as_str(), tag.as_str());
                let tags = token.word_mut().tags_mut();
                if !tags.contains(&data) {
                    tags.push(data);
                }

                token.multiword = Some(MultiwordMark {
                    tag: tag.clone(),
                    is_start: j == 0,
                    is_end: j == n - 1,
                });
            }

            i += n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<Token> {
        let mut position = Position::default();
        words
            .iter()
            .map(|word| {
                let span = Span::from_str_at(word, position);
                position = span.end() + Position { byte: 1, char: 1 };
                Token::new(Word::new_with_tags(*word, Vec::new()), span, true)
            })
            .collect()
    }

    #[test]
    fn marks_longest_phrase() {
        let chunker = MultiwordChunker::from_lines("in spite\tX\nin spite of\tPREP\n").unwrap();
        let mut tokens = tokens(&["In", "spite", "of", "it"]);

        chunker.apply(&mut tokens);

        let marks: Vec<_> = tokens.iter().map(|x| x.multiword().cloned()).collect();
        assert_eq!(marks[0].as_ref().unwrap().tag, "PREP");
        assert!(marks[0].as_ref().unwrap().is_start);
        assert!(!marks[1].as_ref().unwrap().is_start && !marks[1].as_ref().unwrap().is_end);
        assert!(marks[2].as_ref().unwrap().is_end);
        assert!(marks[3].is_none());
        assert!(tokens[1].has_pos("PREP"));
    }

    #[test]
    fn applying_twice_changes_nothing() {
        let chunker = MultiwordChunker::from_lines("a priori\tRB").unwrap();
        let mut once = tokens(&["a", "priori"]);
        chunker.apply(&mut once);

        let mut twice = once.clone();
        chunker.apply(&mut twice);

        assert_eq!(once, twice);
    }
}
