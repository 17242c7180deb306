//! The parse pipeline: load the export, select the period, split it into the income and issues
//! subsets, extract the categories and build the flow graph.

use crate::aggregate::{assemble, build_category_nodes, build_income_nodes};
use crate::error::{Error, Result};
use crate::model::{
    extract_categories, ColumnFilter, IssueLevel, Period, RootNode, SourceFilter,
    TransactionTable,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The column names of the export that the parser reads.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Columns {
    /// Holds the year of a transaction, e.g. `2024`.
    pub year: String,
    /// Holds the `YYYY-MM` month tag of a transaction. Needed to parse a single month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    pub main_category: String,
    /// Needed for issue level 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    /// Holds the signed, locale-formatted amount.
    pub amount: String,
}

/// The labels of the synthetic nodes of the graph.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Labels {
    /// The root node.
    pub income: String,
    /// The income residual that no income source claimed.
    pub other_income: String,
    /// The unused income node and, for issue level 2, its pass-through child.
    pub unused_income: Vec<String>,
}

impl Labels {
    /// The unused income labels as `(node, child)`.
    pub fn unused(&self) -> (&str, Option<&str>) {
        let mut labels = self.unused_income.iter().map(String::as_str);
        (labels.next().unwrap_or_default(), labels.next())
    }
}

/// Parses an export into a flow graph using a fixed set of column bindings and filters.
#[derive(Debug, Clone)]
pub struct FlowParser {
    input_file: PathBuf,
    columns: Columns,
    labels: Labels,
    income_sources: Vec<SourceFilter>,
    income_filters: Vec<ColumnFilter>,
    issues_filters: Vec<ColumnFilter>,
}

impl FlowParser {
    pub fn new(input_file: impl Into<PathBuf>, columns: Columns, labels: Labels) -> Self {
        Self {
            input_file: input_file.into(),
            columns,
            labels,
            income_sources: Vec::new(),
            income_filters: Vec::new(),
            issues_filters: Vec::new(),
        }
    }

    pub fn with_income_sources(mut self, sources: Vec<SourceFilter>) -> Self {
        self.income_sources = sources;
        self
    }

    pub fn with_income_filters(mut self, filters: Vec<ColumnFilter>) -> Self {
        self.income_filters = filters;
        self
    }

    pub fn with_issues_filters(mut self, filters: Vec<ColumnFilter>) -> Self {
        self.issues_filters = filters;
        self
    }

    pub fn input_file(&self) -> &Path {
        &self.input_file
    }

    /// Parses the export for `year` (and `month`, if given) with `issue_level` 1 or 2.
    ///
    /// The file is read anew on every call.
    ///
    /// # Errors
    /// - `Error::Config` if `issue_level` is not 1 or 2, the month is invalid, or a column or
    ///   label the request needs is not configured. These are reported before the file is
    ///   opened.
    /// - `Error::FileFormat` if the file is missing or lacks a column.
    /// - `Error::AmountFormat` if an amount that is summed does not parse.
    pub fn parse(&self, year: i32, month: Option<u32>, issue_level: u8) -> Result<RootNode> {
        let level = IssueLevel::try_from(issue_level)?;
        let period = Period::new(year, month)?;
        self.parse_period(period, level)
    }

    /// Typed variant of [`FlowParser::parse`].
    pub fn parse_period(&self, period: Period, level: IssueLevel) -> Result<RootNode> {
        self.check(&period, level)?;

        let required = self.required_columns(&period, level);
        let table = TransactionTable::load(&self.input_file, &required)?;

        let selected =
            table.select_period(&self.columns.year, self.columns.month.as_deref(), &period)?;
        let income = selected.apply_filters(&self.income_filters)?;
        let issues = selected.apply_filters(&self.issues_filters)?;
        debug!(
            period = %period,
            selected = selected.len(),
            income = income.len(),
            issues = issues.len(),
            "Split the period into income and issues"
        );

        let categories = extract_categories(
            &issues,
            &self.columns.main_category,
            self.columns.sub_category.as_deref(),
            level,
        )?;

        let (mut income_nodes, other_income) = build_income_nodes(
            &income,
            &self.income_sources,
            &self.columns.amount,
            &self.labels.other_income,
        )?;
        income_nodes.push(other_income);

        let category_nodes = build_category_nodes(
            &issues,
            &categories,
            &self.columns.main_category,
            self.columns.sub_category.as_deref(),
            level,
            &self.columns.amount,
        )?;

        let root = assemble(
            &self.labels.income,
            income_nodes,
            category_nodes,
            self.labels.unused(),
            level,
        )?;
        info!(
            period = %period,
            level = %level,
            income = %root.income_amount(),
            issues = %root.issues_amount(),
            "Parsed {}",
            self.input_file.display()
        );
        Ok(root)
    }

    /// Validates the configuration the request needs without touching the file.
    fn check(&self, period: &Period, level: IssueLevel) -> Result<()> {
        if period.month().is_some() && self.columns.month.is_none() {
            return Err(Error::config(
                "A month was requested but no month column is configured",
            ));
        }
        let (unused, unused_sub) = self.labels.unused();
        if unused.is_empty() {
            return Err(Error::config("An unused income label must be configured"));
        }
        if level == IssueLevel::Sub {
            if self.columns.sub_category.is_none() {
                return Err(Error::config(
                    "A sub category column must be configured for issue level 2",
                ));
            }
            if self.labels.unused_income.len() != 2 || unused_sub.is_none() {
                return Err(Error::config(
                    "Exactly two unused income labels must be configured for issue level 2",
                ));
            }
        }
        Ok(())
    }

    fn required_columns(&self, period: &Period, level: IssueLevel) -> Vec<&str> {
        let mut required = vec![
            self.columns.amount.as_str(),
            self.columns.main_category.as_str(),
        ];
        match (period.month(), self.columns.month.as_deref()) {
            (Some(_), Some(month)) => required.push(month),
            _ => required.push(self.columns.year.as_str()),
        }
        if let (IssueLevel::Sub, Some(sub)) = (level, self.columns.sub_category.as_deref()) {
            required.push(sub);
        }
        required
    }
}
