use crate::types::*;

use super::engine::composition::Matcher;

/// Selects readings by their part-of-speech tag.
#[derive(Debug, Clone)]
pub struct PosFilter {
    pub matcher: Matcher,
}

impl PosFilter {
    pub fn new(matcher: Matcher) -> Self {
        PosFilter { matcher }
    }

    fn is_word_data_match(&self, data: &WordData) -> bool {
        self.matcher.is_match(data.pos())
    }

    /// Keeps the matching readings. Leaves the readings unchanged if none matches.
    /// The sentence end reading is never touched.
    fn keep(&self, data: &mut Vec<WordData>) {
        let any_match = data
            .iter()
            .any(|x| !x.is_sentence_end() && self.is_word_data_match(x));

        if any_match {
            data.retain(|x| x.is_sentence_end() || self.is_word_data_match(x))
        }
    }

    /// Removes the matching readings. Removing every reading leaves the null reading.
    fn remove(&self, data: &mut Vec<WordData>) {
        data.retain(|x| x.is_sentence_end() || !self.is_word_data_match(x))
    }
}

/// What a disambiguation rule does to the marked tokens.
#[derive(Debug, Clone)]
pub enum Disambiguation {
    /// Keeps only the readings matching the filter.
    Filter(PosFilter),
    Remove(PosFilter),
    /// Adds readings. A reading without lemma gets the token text as lemma.
    Add(Vec<WordData>),
    /// Replaces all readings.
    Replace(Vec<WordData>),
    /// Suppresses every rule match overlapping the tokens.
    Immunize,
    /// Excludes the tokens from spell checking.
    IgnoreSpelling,
    Nop,
}

impl Disambiguation {
    fn complete(data: &WordData, token: &Token) -> WordData {
        match (data.lemma(), data.pos()) {
            (Some(_), _) | (None, None) => data.clone(),
            (None, Some(pos)) => WordData::new(token.text(), pos),
        }
    }

    pub fn apply(&self, tokens: &mut [Token]) {
        for token in tokens.iter_mut() {
            match self {
                Disambiguation::Filter(filter) => {
                    filter.keep(token.word_mut().tags_mut());
                }
                Disambiguation::Remove(filter) => {
                    filter.remove(token.word_mut().tags_mut());
                }
                Disambiguation::Add(datas) => {
                    let datas: Vec<_> = datas.iter().map(|x| Self::complete(x, token)).collect();
                    let tags = token.word_mut().tags_mut();

                    // the null reading is only a placeholder for missing readings
                    if !datas.is_empty() {
                        tags.retain(|x| !x.is_null());
                    }
                    for data in datas {
                        if !tags.contains(&data) {
                            tags.push(data);
                        }
                    }
                }
                Disambiguation::Replace(datas) => {
                    let mut datas: Vec<_> = datas.iter().map(|x| Self::complete(x, token)).collect();
                    let tags = token.word_mut().tags_mut();

                    datas.extend(tags.drain(..).filter(WordData::is_sentence_end));
                    *tags = datas;
                }
                Disambiguation::Immunize => token.immunized = true,
                Disambiguation::IgnoreSpelling => token.ignore_spelling = true,
                Disambiguation::Nop => {}
            }

            token.word_mut().ensure_reading();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::regex::Regex;

    fn token() -> Token {
        Token::new(
            Word::new_with_tags(
                "house",
                vec![WordData::new("house", "NN"), WordData::new("house", "VB")],
            ),
            Span::new(0..5, 0..5),
            false,
        )
    }

    fn filter(regex: &str) -> PosFilter {
        PosFilter::new(Matcher::new_regex(
            Regex::with_options(regex, true, true).unwrap(),
            false,
        ))
    }

    #[test]
    fn filter_keeps_matching_readings() {
        let mut tokens = vec![token()];
        Disambiguation::Filter(filter("NN.*")).apply(&mut tokens);

        assert_eq!(tokens[0].tags(), &[WordData::new("house", "NN")]);
    }

    #[test]
    fn filter_without_match_changes_nothing() {
        let mut tokens = vec![token()];
        Disambiguation::Filter(filter("JJ")).apply(&mut tokens);

        assert_eq!(tokens[0].tags().len(), 2);
    }

    #[test]
    fn removing_everything_leaves_null_reading() {
        let mut tokens = vec![token()];
        Disambiguation::Remove(filter("NN|VB")).apply(&mut tokens);

        assert_eq!(tokens[0].tags(), &[WordData::null()]);
    }

    #[test]
    fn add_is_idempotent() {
        let mut tokens = vec![token()];
        let add = Disambiguation::Add(vec![WordData::from_pos("JJ")]);
        add.apply(&mut tokens);
        let once = tokens.clone();
        add.apply(&mut tokens);

        assert_eq!(once, tokens);
        assert!(tokens[0].tags().contains(&WordData::new("house", "JJ")));
    }

    #[test]
    fn sentence_end_reading_survives() {
        let last = || {
            let mut token = token();
            token
                .word_mut()
                .tags_mut()
                .push(WordData::new("house", SENT_END));
            token
        };

        let mut tokens = vec![last()];
        Disambiguation::Filter(filter("NN")).apply(&mut tokens);
        assert_eq!(
            tokens[0].tags(),
            &[WordData::new("house", "NN"), WordData::new("house", SENT_END)]
        );

        let mut tokens = vec![last()];
        Disambiguation::Remove(filter(".*")).apply(&mut tokens);
        assert_eq!(
            tokens[0].tags(),
            &[WordData::null(), WordData::new("house", SENT_END)]
        );

        let mut tokens = vec![last()];
        Disambiguation::Replace(vec![WordData::from_pos("VB")]).apply(&mut tokens);
        assert_eq!(
            tokens[0].tags(),
            &[WordData::new("house", "VB"), WordData::new("house", SENT_END)]
        );
    }

    #[test]
    fn flags() {
        let mut tokens = vec![token()];
        Disambiguation::Immunize.apply(&mut tokens);
        Disambiguation::IgnoreSpelling.apply(&mut tokens);

        assert!(tokens[0].is_immunized());
        assert!(tokens[0].ignores_spelling());
    }
}
