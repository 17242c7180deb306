//! Configuration file handling.
//!
//! The configuration file is a JSON document, by default `$HOME/sankey/config.json`. It binds the
//! column names of the export, defines the income sources and the income/issues filters, holds
//! the labels of the synthetic nodes and remembers the last used period. It is validated when it
//! is loaded so that a parse never starts from an incomplete configuration.

use crate::error::{Error, Result};
use crate::model::{ColumnFilter, IssueLevel, Period, SourceFilter};
use crate::parser::{Columns, FlowParser, Labels};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "sankey";
const CONFIG_VERSION: u8 = 1;
pub(crate) const CONFIG_JSON: &str = "config.json";
const DEFAULT_OUTPUT_FILE: &str = "output_files/sankey.html";

/// The `Config` object represents the loaded and validated configuration file. Relative paths in
/// the file are resolved against the directory that holds it.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Writes a default configuration file to `config_path` and returns it.
    ///
    /// # Arguments
    /// - `config_path` - Where the configuration file will be written, e.g.
    ///   `$HOME/sankey/config.json`. Missing parent directories are created.
    /// - `input_file` - The export to parse.
    /// - `output_file` - Where the HTML diagram is written, defaults to
    ///   `output_files/sankey.html` next to the configuration file.
    /// - `force` - Overwrite an existing configuration file.
    ///
    /// # Errors
    /// - Returns an error if the file exists and `force` is not set, or if writing fails.
    pub fn create(
        config_path: impl Into<PathBuf>,
        input_file: &Path,
        output_file: Option<&Path>,
        force: bool,
    ) -> Result<Self> {
        let config_path = config_path.into();
        if config_path.exists() && !force {
            return Err(Error::config(format!(
                "The config file '{}' already exists",
                config_path.display()
            )));
        }
        let root = parent_dir(&config_path);
        std::fs::create_dir_all(&root).map_err(|e| {
            Error::config(format!("Unable to create directory {}: {e}", root.display()))
        })?;

        let config_file = ConfigFile {
            input_file: input_file.to_path_buf(),
            output_file: output_file
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
            ..ConfigFile::default()
        };
        config_file.save(&config_path)?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    /// Loads and validates the configuration file at `config_path`.
    pub fn load(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        if !config_path.is_file() {
            return Err(Error::config(format!(
                "The config file is missing '{}'",
                config_path.display()
            )));
        }
        let config_file = ConfigFile::load(&config_path)?;
        Ok(Self {
            root: parent_dir(&config_path),
            config_path,
            config_file,
        })
    }

    /// Writes the current state back to the configuration file.
    pub fn save(&self) -> Result<()> {
        self.config_file.save(&self.config_path)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The export to parse, resolved against the config directory.
    pub fn input_file(&self) -> PathBuf {
        self.resolve(&self.config_file.input_file)
    }

    /// Where the HTML diagram goes, resolved against the config directory.
    pub fn output_file(&self) -> PathBuf {
        self.resolve(&self.config_file.output_file)
    }

    pub fn columns(&self) -> &Columns {
        &self.config_file.columns
    }

    pub fn labels(&self) -> &Labels {
        &self.config_file.labels
    }

    pub fn income_sources(&self) -> &[SourceFilter] {
        &self.config_file.income_sources
    }

    pub fn income_filters(&self) -> &[ColumnFilter] {
        &self.config_file.income_filters
    }

    pub fn issues_filters(&self) -> &[ColumnFilter] {
        &self.config_file.issues_filters
    }

    pub fn default_issue_level(&self) -> IssueLevel {
        self.config_file.default_issue_level
    }

    pub fn last_used(&self) -> Option<&LastUsed> {
        self.config_file.last_used.as_ref()
    }

    /// Remembers `period` and `level` and saves the configuration file.
    pub fn save_last_used(&mut self, period: Period, level: IssueLevel) -> Result<()> {
        self.config_file.last_used = Some(LastUsed {
            year: period.year(),
            month: period.month(),
            issue_level: level,
        });
        self.save()
    }

    /// A parser bound to the input file, columns, labels and filters of this configuration.
    pub fn parser(&self) -> FlowParser {
        FlowParser::new(
            self.input_file(),
            self.config_file.columns.clone(),
            self.config_file.labels.clone(),
        )
        .with_income_sources(self.config_file.income_sources.clone())
        .with_income_filters(self.config_file.income_filters.clone())
        .with_issues_filters(self.config_file.issues_filters.clone())
    }

    /// Returns `p` unchanged if it is absolute, otherwise joins it onto the config directory.
    fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            return p.to_path_buf();
        }
        self.root.join(p)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// The period and issue level of the last generated diagram.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct LastUsed {
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    pub issue_level: IssueLevel,
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "sankey",
///   "config_version": 1,
///   "input_file": "input_files/export.csv",
///   "output_file": "output_files/sankey.html",
///   "columns": {
///     "year": "Analyse-Jahr",
///     "month": "Analyse-Monat",
///     "main_category": "Analyse-Hauptkategorie",
///     "sub_category": "Analyse-Unterkategorie",
///     "amount": "Betrag"
///   },
///   "labels": {
///     "income": "Income",
///     "other_income": "Other income",
///     "unused_income": ["Unused", "Unused income"]
///   },
///   "income_sources": [
///     { "label": "Salary", "column": "Beguenstigter/Auftraggeber", "value": "acme" }
///   ],
///   "income_filters": [{ "column": "Analyse-Hauptkategorie", "values": ["Einnahmen"] }],
///   "issues_filters": [],
///   "default_issue_level": 2,
///   "last_used": { "year": 2024, "month": 3, "issue_level": 2 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub(crate) struct ConfigFile {
    /// Application name, should always be "sankey"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Path to the export (relative to config.json or absolute)
    input_file: PathBuf,

    /// Path of the generated HTML diagram (relative to config.json or absolute)
    output_file: PathBuf,

    columns: Columns,

    labels: Labels,

    #[serde(default)]
    income_sources: Vec<SourceFilter>,

    #[serde(default)]
    income_filters: Vec<ColumnFilter>,

    #[serde(default)]
    issues_filters: Vec<ColumnFilter>,

    default_issue_level: IssueLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_used: Option<LastUsed>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            input_file: PathBuf::new(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            columns: Columns {
                year: "Analyse-Jahr".to_string(),
                month: Some("Analyse-Monat".to_string()),
                main_category: "Analyse-Hauptkategorie".to_string(),
                sub_category: Some("Analyse-Unterkategorie".to_string()),
                amount: "Betrag".to_string(),
            },
            labels: Labels {
                income: "Income".to_string(),
                other_income: "Other income".to_string(),
                unused_income: vec!["Unused".to_string(), "Unused income".to_string()],
            },
            income_sources: Vec::new(),
            income_filters: Vec::new(),
            issues_filters: Vec::new(),
            default_issue_level: IssueLevel::Sub,
            last_used: None,
        }
    }
}

impl ConfigFile {
    /// Loads and validates a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns `Error::Config` if the file cannot be read, parsed, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file at {}: {e}", path.display()))
        })?;

        let config: ConfigFile = serde_json::from_str(&content).map_err(|e| {
            Error::config(format!("Failed to parse config file at {}: {e}", path.display()))
        })?;
        config.validate()?;
        debug!("Loaded config file {}", path.display());
        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Unable to serialize config: {e}")))?;
        std::fs::write(p, data).map_err(|e| {
            Error::config(format!("Unable to write config file {}: {e}", p.display()))
        })
    }

    /// Checks that every field a parse relies on is present and consistent.
    pub fn validate(&self) -> Result<()> {
        ensure(
            self.app_name == APP_NAME,
            format!(
                "Invalid app_name in config file: expected '{}', got '{}'",
                APP_NAME, self.app_name
            ),
        )?;
        ensure(
            self.config_version <= CONFIG_VERSION,
            format!(
                "Config version {} is newer than the supported version {}",
                self.config_version, CONFIG_VERSION
            ),
        )?;
        ensure(
            !self.input_file.as_os_str().is_empty(),
            "input_file must not be empty",
        )?;
        ensure(
            !self.output_file.as_os_str().is_empty(),
            "output_file must not be empty",
        )?;

        let columns = &self.columns;
        for (name, value) in [
            ("columns.year", Some(&columns.year)),
            ("columns.month", columns.month.as_ref()),
            ("columns.main_category", Some(&columns.main_category)),
            ("columns.sub_category", columns.sub_category.as_ref()),
            ("columns.amount", Some(&columns.amount)),
        ] {
            if let Some(value) = value {
                ensure(!value.trim().is_empty(), format!("{name} must not be empty"))?;
            }
        }

        let labels = &self.labels;
        ensure(!labels.income.is_empty(), "labels.income must not be empty")?;
        ensure(
            !labels.other_income.is_empty(),
            "labels.other_income must not be empty",
        )?;
        ensure(
            (1..=2).contains(&labels.unused_income.len()),
            "labels.unused_income must have one or two entries",
        )?;
        ensure(
            labels.unused_income.iter().all(|l| !l.is_empty()),
            "labels.unused_income must not contain empty labels",
        )?;

        if self.default_issue_level == IssueLevel::Sub {
            ensure(
                columns.sub_category.is_some(),
                "columns.sub_category is required when default_issue_level is 2",
            )?;
            ensure(
                labels.unused_income.len() == 2,
                "labels.unused_income needs two entries when default_issue_level is 2",
            )?;
        }

        for (ix, source) in self.income_sources.iter().enumerate() {
            ensure(
                !source.label().is_empty()
                    && !source.column().is_empty()
                    && !source.value().is_empty(),
                format!("income_sources[{ix}] needs a label, a column and a value"),
            )?;
        }

        for (name, filters) in [
            ("income_filters", &self.income_filters),
            ("issues_filters", &self.issues_filters),
        ] {
            for (ix, filter) in filters.iter().enumerate() {
                ensure(
                    !filter.column().is_empty() && !filter.values().is_empty(),
                    format!("{name}[{ix}] needs a column and at least one value"),
                )?;
            }
        }

        if let Some(last_used) = &self.last_used {
            Period::new(last_used.year, last_used.month)?;
            if last_used.month.is_some() {
                ensure(
                    columns.month.is_some(),
                    "last_used has a month but columns.month is not configured",
                )?;
            }
        }
        Ok(())
    }

    #[cfg(test)]
    #[allow(clippy::too_many_arguments)]
    /// Creates a new ConfigFile with the specified settings.
    pub fn new(
        input_file: PathBuf,
        output_file: PathBuf,
        columns: Columns,
        labels: Labels,
        income_sources: Vec<SourceFilter>,
        income_filters: Vec<ColumnFilter>,
        issues_filters: Vec<ColumnFilter>,
        default_issue_level: IssueLevel,
    ) -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            input_file,
            output_file,
            columns,
            labels,
            income_sources,
            income_filters,
            issues_filters,
            default_issue_level,
            last_used: None,
        }
    }
}

fn ensure(condition: bool, message: impl Into<String>) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::config(message))
    }
}
