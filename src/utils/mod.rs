use lazy_static::lazy_static;
use onig::Captures;

pub mod parallelism;
pub mod regex;

// see https://stackoverflow.com/questions/38406793/why-is-capitalizing-the-first-letter-of-a-string-so-convoluted-in-rust
pub fn apply_to_first<F>(string: &str, func: F) -> String
where
    F: Fn(char) -> String,
{
    let mut c = string.chars();
    match c.next() {
        None => String::new(),
        Some(first) => func(first) + c.as_str(),
    }
}

pub fn is_title_case(string: &str) -> bool {
    let mut char_case = string.chars().map(|x| x.is_uppercase());

    char_case.next().unwrap_or(false) && !char_case.any(|x| x)
}

pub fn is_uppercase(string: &str) -> bool {
    !string.chars().any(|x| x.is_lowercase())
}

/// Whether the string contains at least one alphabetic char.
pub fn is_word(string: &str) -> bool {
    string.chars().any(char::is_alphabetic)
}

/// Adjusts the case of `replacement` to the case of `original`: all-caps stays all-caps, title case stays title case.
pub fn transfer_case(original: &str, replacement: &str) -> String {
    if original.chars().count() > 1 && is_uppercase(original) && is_word(original) {
        replacement.to_uppercase()
    } else if original.chars().next().map_or(false, char::is_uppercase) {
        apply_to_first(replacement, |c| c.to_uppercase().collect())
    } else {
        replacement.to_owned()
    }
}

// see https://github.com/rust-onig/rust-onig/issues/59#issuecomment-340160520
pub fn dollar_replace(mut replacement: String, caps: &Captures) -> String {
    for i in 1..caps.len() {
        replacement = replacement.replace(&format!("${}", i), caps.at(i).unwrap_or(""));
    }
    replacement
}

// remove duplicate whitespaces
pub fn normalize_whitespace(string: &str) -> String {
    lazy_static! {
        static ref REGEX: onig::Regex = onig::Regex::new(r"(\s)\s+").expect("static regex is valid");
    }

    REGEX.replace_all(string, |caps: &Captures| caps.at(1).unwrap_or(" ").to_string())
}

#[inline]
pub fn splitting_chars() -> &'static str {
    r##"«»'’`´‘],.:;!?/\()<=>„“”"+#…*"##
}

#[inline]
pub fn no_space_chars() -> &'static str {
    r##",.;:!?"##
}

/// Removes whitespace in front of chars which are never preceded by whitespace e.g. "Super , dass".
pub fn fix_nospace_chars(text: &str) -> String {
    text.char_indices()
        .filter(|(i, c)| {
            if c.is_whitespace() {
                !no_space_chars()
                    .chars()
                    .any(|nospace_c| text[(i + c.len_utf8())..].starts_with(nospace_c))
            } else {
                true
            }
        })
        .map(|x| x.1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_case() {
        assert!(is_title_case("Hello"));
        assert!(!is_title_case("HeLLo"));
        assert!(is_uppercase("HELLO"));
        assert!(!is_uppercase("Hello"));
    }

    #[test]
    fn transfers_case() {
        assert_eq!(transfer_case("Teh", "the"), "The");
        assert_eq!(transfer_case("TEH", "the"), "THE");
        assert_eq!(transfer_case("teh", "the"), "the");
    }

    #[test]
    fn whitespace_is_normalized() {
        assert_eq!(normalize_whitespace("a  b   c"), "a b c");
        assert_eq!(fix_nospace_chars("Super , dass"), "Super, dass");
    }
}
