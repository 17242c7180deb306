use crate::error::{Error, Result};
use crate::model::table::Selection;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// How deep the issue (expense) side of the graph is broken down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IssueLevel {
    /// Main categories only.
    Main,
    /// Main categories with one level of subcategories.
    Sub,
}

impl IssueLevel {
    pub fn depth(&self) -> u8 {
        match self {
            IssueLevel::Main => 1,
            IssueLevel::Sub => 2,
        }
    }
}

impl TryFrom<u8> for IssueLevel {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(IssueLevel::Main),
            2 => Ok(IssueLevel::Sub),
            bad => Err(Error::config(format!("issue_level must be 1 or 2, got {bad}"))),
        }
    }
}

impl From<IssueLevel> for u8 {
    fn from(value: IssueLevel) -> Self {
        value.depth()
    }
}

impl Display for IssueLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.depth())
    }
}

/// A main category observed in the issues subset, with the subcategories observed for it.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Category {
    name: String,
    sub_categories: Vec<String>,
}

impl Category {
    pub fn new<S, I, V>(name: S, sub_categories: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            sub_categories: sub_categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sub_categories(&self) -> &[String] {
        &self.sub_categories
    }
}

/// Collects the distinct values of `main_column` in first-seen order. At `IssueLevel::Sub` each
/// category also gets the distinct values of `sub_column` among its own rows.
///
/// # Errors
/// - `Error::Config` if `level` is `IssueLevel::Sub` and no `sub_column` is given.
/// - `Error::FileFormat` if a column is missing from the export.
pub fn extract_categories(
    issues: &Selection<'_>,
    main_column: &str,
    sub_column: Option<&str>,
    level: IssueLevel,
) -> Result<Vec<Category>> {
    let sub_column = match level {
        IssueLevel::Main => None,
        IssueLevel::Sub => Some(sub_column.ok_or_else(|| {
            Error::config("A sub category column must be configured for issue level 2")
        })?),
    };

    let mut categories = Vec::new();
    for name in issues.distinct(main_column)? {
        let sub_categories = match sub_column {
            Some(sub_column) => issues
                .where_equals(main_column, name)?
                .distinct(sub_column)?,
            None => Vec::new(),
        };
        categories.push(Category::new(name, sub_categories));
    }
    Ok(categories)
}
