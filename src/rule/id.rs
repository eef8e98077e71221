//! Rule identifiers and selectors over them.
//!
//! Every rule is addressed as `CATEGORY/RULE/N`, where `N` is the position of the sub-rule inside
//! its rule (0 for rules without sub-rules). All names compare case-insensitively, so options and
//! selectors can be written as `grammar/en_a_vs_an`.

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt, num::ParseIntError, str::FromStr};
use unicase::UniCase;

#[derive(Debug, Clone, thiserror::Error)]
#[allow(missing_docs)]
pub enum Error {
    #[error("empty rule selector")]
    Empty,
    #[error("invalid sub-rule number in selector: {0}")]
    BadIndex(#[from] ParseIntError),
    #[error("rule selector `{0}` has more than three parts")]
    TooManyParts(String),
}

fn same_name(a: &str, b: &str) -> bool {
    UniCase::new(a) == UniCase::new(b)
}

/// The name of a rule category, e.g. `GRAMMAR`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category(String);

impl Category {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Category(name.into())
    }

    /// The rule `name` in this category.
    pub fn join<S: Into<String>>(&self, name: S) -> Group {
        Group {
            category: self.clone(),
            name: name.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is(&self, name: &str) -> bool {
        same_name(&self.0, name)
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Category) -> bool {
        self.is(&other.0)
    }
}

impl Eq for Category {}

/// A rule inside a category. This is what users refer to as the rule id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Group {
    category: Category,
    name: String,
}

impl Group {
    /// The sub-rule at position `index`.
    pub fn join(&self, index: usize) -> Index {
        Index {
            group: self.clone(),
            index,
        }
    }

    pub fn parent(&self) -> &Category {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is(&self, name: &str) -> bool {
        same_name(&self.name, name)
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Group) -> bool {
        self.category == other.category && self.is(&other.name)
    }
}

impl Eq for Group {}

/// The full id of one executable rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    group: Group,
    index: usize,
}

impl Index {
    pub fn parent(&self) -> &Group {
        &self.group
    }

    pub fn category(&self) -> &Category {
        &self.group.category
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.index)
    }
}

/// Selects rules by a prefix of their id: a whole category, one rule or one sub-rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    category: String,
    rule: Option<String>,
    index: Option<usize>,
}

impl Selector {
    pub fn is_match(&self, id: &Index) -> bool {
        id.category().is(&self.category)
            && self.rule.as_deref().map_or(true, |rule| id.parent().is(rule))
            && self.index.map_or(true, |index| id.index() == index)
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.trim().split('/');

        let category = match parts.next() {
            Some(x) if !x.is_empty() => x.to_owned(),
            _ => return Err(Error::Empty),
        };
        let rule = parts.next().map(str::to_owned);
        let index = parts.next().map(str::parse).transpose()?;

        if parts.next().is_some() {
            return Err(Error::TooManyParts(value.to_owned()));
        }

        Ok(Selector {
            category,
            rule,
            index,
        })
    }
}

impl TryFrom<&str> for Selector {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for Selector {
    fn from(category: Category) -> Self {
        Selector {
            category: category.0,
            rule: None,
            index: None,
        }
    }
}

impl From<Group> for Selector {
    fn from(group: Group) -> Self {
        Selector {
            category: group.category.0,
            rule: Some(group.name),
            index: None,
        }
    }
}

impl From<Index> for Selector {
    fn from(id: Index) -> Self {
        Selector {
            index: Some(id.index),
            ..Selector::from(id.group)
        }
    }
}
