//! A thin wrapper around [onig] regexes which keeps the source string around for
//! (de)serialization and reports compile errors as [crate::Error]s.

use onig::{Captures, RegexOptions};
use serde::{Deserialize, Serialize, Serializer};
use std::{
    convert::TryFrom,
    fmt,
    hash::{Hash, Hasher},
};

/// A compiled regex using Java syntax, the syntax rule definitions are written in.
pub struct Regex {
    regex_str: String,
    case_sensitive: bool,
    regex: onig::Regex,
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Regex")
            .field("regex_str", &self.regex_str)
            .field("case_sensitive", &self.case_sensitive)
            .finish()
    }
}

impl Regex {
    fn compile(regex_str: &str, case_sensitive: bool) -> Result<onig::Regex, crate::Error> {
        onig::Regex::with_options(
            regex_str,
            if case_sensitive {
                RegexOptions::REGEX_OPTION_NONE
            } else {
                RegexOptions::REGEX_OPTION_IGNORECASE
            },
            onig::Syntax::java(),
        )
        .map_err(|err| crate::Error::Regex {
            pattern: regex_str.to_owned(),
            message: err.to_string(),
        })
    }

    /// Compiles a regex which matches anywhere in the input.
    /// A leading `(?i)` or `(?iu)` makes it case insensitive.
    pub fn new(regex_str: &str) -> Result<Self, crate::Error> {
        Regex::with_options(regex_str, false, true)
    }

    /// Compiles a regex.
    /// * `must_fully_match`: anchors the regex so that it has to match the complete input.
    /// * `case_sensitive`: the default case sensitivity, inline `(?i)` flags override it.
    pub fn with_options(
        regex_str: &str,
        must_fully_match: bool,
        case_sensitive: bool,
    ) -> Result<Self, crate::Error> {
        let mut fixed = regex_str.to_owned();
        let mut case_sensitive = case_sensitive;

        for pattern in &["(?iu)", "(?i)"] {
            if fixed.contains(pattern) {
                case_sensitive = false;
                fixed = fixed.replace(pattern, "");
            }
        }

        let fixed = if must_fully_match {
            format!("^(?:{})$", fixed)
        } else {
            fixed
        };

        Ok(Regex {
            regex: Regex::compile(&fixed, case_sensitive)?,
            regex_str: fixed,
            case_sensitive,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex_str.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.find(text).is_some()
    }

    /// Byte ranges of all non-overlapping matches.
    pub fn find_iter<'a>(&'a self, text: &'a str) -> impl Iterator<Item = (usize, usize)> + 'a {
        self.regex.find_iter(text)
    }

    /// Replaces all matches, expanding `$1`.. in the replacement with the capture groups.
    pub fn replace_all(&self, text: &str, replacement: &str) -> String {
        self.regex.replace_all(text, |caps: &Captures| {
            super::dollar_replace(replacement.to_owned(), caps)
        })
    }
}

impl Clone for Regex {
    fn clone(&self) -> Self {
        Regex {
            regex: Regex::compile(&self.regex_str, self.case_sensitive)
                .expect("regex compiled successfully before"),
            regex_str: self.regex_str.clone(),
            case_sensitive: self.case_sensitive,
        }
    }
}

impl TryFrom<String> for Regex {
    type Error = crate::Error;

    fn try_from(string: String) -> Result<Self, Self::Error> {
        Regex::new(&string)
    }
}

impl<'de> Deserialize<'de> for Regex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        Regex::try_from(string).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Regex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.regex_str)
    }
}

impl Hash for Regex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.regex_str.hash(state);
        self.case_sensitive.hash(state);
    }
}

impl PartialEq for Regex {
    fn eq(&self, other: &Self) -> bool {
        self.regex_str == other.regex_str && self.case_sensitive == other.case_sensitive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_match_is_anchored() {
        let regex = Regex::with_options("fo+", true, true).unwrap();

        assert!(regex.is_match("foo"));
        assert!(!regex.is_match("foobar"));
        assert!(!regex.is_match("FOO"));
    }

    #[test]
    fn inline_flag_disables_case_sensitivity() {
        let regex = Regex::with_options("(?i)fo+", true, true).unwrap();

        assert!(regex.is_match("FOO"));
    }

    #[test]
    fn invalid_regex_is_an_error() {
        assert!(matches!(
            Regex::new("(unclosed"),
            Err(crate::Error::Regex { .. })
        ));
    }

    #[test]
    fn replace_all_expands_groups() {
        let regex = Regex::new("(\\w+)s$").unwrap();

        assert_eq!(regex.replace_all("cats", "$1"), "cat");
    }
}
