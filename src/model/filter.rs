use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Keeps the rows whose value in `column` is one of `values`.
///
/// A list of filters is applied as a conjunction: a row survives only if it matches every filter.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    column: String,
    values: BTreeSet<String>,
}

impl ColumnFilter {
    pub fn new<S, I, V>(column: S, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.values.contains(value)
    }
}

/// Defines one income source: rows whose `column` contains `value` (case-insensitive) are summed
/// into a flow node labelled `label`.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SourceFilter {
    label: String,
    column: String,
    value: String,
}

impl SourceFilter {
    pub fn new(label: impl Into<String>, column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The match value in the lowercase form that cells are compared against.
    pub fn needle(&self) -> String {
        self.value.to_lowercase()
    }
}
