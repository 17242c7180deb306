//! Command handlers for the sankey CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod generate;
mod init;
mod inspect;

use crate::args::PeriodArgs;
use crate::model::{IssueLevel, Period};
use crate::Config;
use anyhow::Context;
use chrono::Datelike;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use generate::{generate, Generated};
pub use init::init;
pub use inspect::inspect;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Fills in what `args` leaves open: the year and month of the last run (or the current year),
/// and the issue level of the last run (or the configured default).
///
/// A year given on the command line is taken as is, the month of the last run is only reused
/// when no year is given either.
pub(crate) fn resolve_period(
    config: &Config,
    args: &PeriodArgs,
) -> anyhow::Result<(Period, IssueLevel)> {
    let last_used = config.last_used();
    let (year, month) = match (args.year(), last_used) {
        (Some(year), _) => (year, args.month()),
        (None, Some(last)) => (last.year, args.month().or(last.month)),
        (None, None) => (chrono::Local::now().year(), args.month()),
    };
    let period = Period::new(year, month).context("Invalid period")?;

    let level = match args.issue_level() {
        Some(level) => IssueLevel::try_from(level).context("Invalid issue level")?,
        None => last_used
            .map(|last| last.issue_level)
            .unwrap_or_else(|| config.default_issue_level()),
    };
    debug!(period = %period, level = %level, "Resolved the request");
    Ok((period, level))
}
