//! These structs provide the CLI interface for the sankey CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// sankey: Turn a personal-finance export into a Sankey diagram of your cash flow.
///
/// The program reads a semicolon separated transaction export (for example from Finanzguru),
/// selects a year or a month, sums the income sources and the expense categories and writes an
/// HTML page with a Sankey diagram: income sources flow into your total income, which flows into
/// expense categories, their subcategories and whatever income was left unused.
///
/// Run `sankey init --input-file <export.csv>` first to create the configuration file, then
/// adjust the column names, filters and income sources in it to match your export.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the configuration file.
    ///
    /// The file is written to --config (by default $HOME/sankey/config.json) and holds default
    /// column names for a Finanzguru export. Edit it afterwards to bind your own columns, to
    /// define which rows count as income and which as expenses, and to name your income sources.
    Init(InitArgs),
    /// Parse the export and write the Sankey diagram as an HTML page.
    ///
    /// Omitted arguments fall back to the period and issue level of the last run, then to the
    /// current year and the configured default issue level.
    Generate(GenerateArgs),
    /// Parse the export and print the flow graph.
    Inspect(InspectArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The configuration file. Defaults to ~/sankey/config.json
    #[arg(long, env = "SANKEY_CONFIG", default_value_t = default_config_path())]
    config: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, config: PathBuf) -> Self {
        Self {
            log_level,
            config: config.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn config(&self) -> &DisplayPath {
        &self.config
    }
}

/// Args for the `sankey init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The export to parse. A relative path is resolved against the directory of the
    /// configuration file.
    #[arg(long)]
    input_file: PathBuf,

    /// Where the HTML diagram is written. Defaults to output_files/sankey.html next to the
    /// configuration file.
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Overwrite an existing configuration file.
    #[arg(long)]
    force: bool,
}

impl InitArgs {
    pub fn new(input_file: impl Into<PathBuf>, output_file: Option<PathBuf>, force: bool) -> Self {
        Self {
            input_file: input_file.into(),
            output_file,
            force,
        }
    }

    pub fn input_file(&self) -> &Path {
        &self.input_file
    }

    pub fn output_file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }

    pub fn force(&self) -> bool {
        self.force
    }
}

/// Selects what is parsed: a year, optionally a month of it, and the depth of the issues side.
#[derive(Debug, Default, Parser, Clone, Copy)]
pub struct PeriodArgs {
    /// The year to parse, e.g. 2024.
    #[arg(long)]
    year: Option<i32>,

    /// The month to parse, 1 to 12. Without it the whole year is parsed.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    /// 1 shows only the expense categories, 2 also their subcategories.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
    issue_level: Option<u8>,
}

impl PeriodArgs {
    pub fn new(year: Option<i32>, month: Option<u32>, issue_level: Option<u8>) -> Self {
        Self {
            year,
            month,
            issue_level,
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn issue_level(&self) -> Option<u8> {
        self.issue_level
    }
}

/// Args for the `sankey generate` command.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    #[clap(flatten)]
    period: PeriodArgs,

    /// Write the HTML page here instead of the configured output file.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl GenerateArgs {
    pub fn new(period: PeriodArgs, output: Option<PathBuf>) -> Self {
        Self { period, output }
    }

    pub fn period(&self) -> &PeriodArgs {
        &self.period
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

/// Args for the `sankey inspect` command.
#[derive(Debug, Parser, Clone)]
pub struct InspectArgs {
    #[clap(flatten)]
    period: PeriodArgs,

    /// Print the flow graph as JSON instead of a tree.
    #[arg(long)]
    json: bool,
}

impl InspectArgs {
    pub fn new(period: PeriodArgs, json: bool) -> Self {
        Self { period, json }
    }

    pub fn period(&self) -> &PeriodArgs {
        &self.period
    }

    pub fn json(&self) -> bool {
        self.json
    }
}

fn default_config_path() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("sankey").join(crate::config::CONFIG_JSON),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --config or SANKEY_CONFIG instead of relying on the default \
                location of the configuration file.",
            );
            PathBuf::from(crate::config::CONFIG_JSON)
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
