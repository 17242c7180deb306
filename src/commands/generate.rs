use crate::args::GenerateArgs;
use crate::commands::{resolve_period, Out};
use crate::sankey::render_html;
use crate::{fs, Config};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;

/// What `generate` wrote.
#[derive(Debug, Clone, Serialize)]
pub struct Generated {
    pub output_file: PathBuf,
    pub period: String,
    pub issue_level: u8,
    pub income: Decimal,
    pub issues: Decimal,
}

/// Parses the export for the requested period, writes the HTML diagram and remembers the period
/// in the configuration file.
///
/// # Errors
/// - Returns an error if the request is invalid, the export cannot be parsed, or the output or
///   configuration file cannot be written.
pub fn generate(mut config: Config, args: &GenerateArgs) -> Result<Out<Generated>> {
    let (period, level) = resolve_period(&config, args.period())?;
    let root = config
        .parser()
        .parse_period(period, level)
        .with_context(|| format!("Unable to parse {}", config.input_file().display()))?;

    let html = render_html(&root, &period, &config.columns().amount)
        .context("Unable to render the diagram")?;
    let output_file = args
        .output()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.output_file());
    fs::write_all(&output_file, &html)?;

    config
        .save_last_used(period, level)
        .context("Unable to remember the period")?;

    Ok(Out::new(
        format!(
            "Wrote the Sankey diagram for {period} to {}",
            output_file.display()
        ),
        Generated {
            output_file,
            period: period.to_string(),
            issue_level: level.into(),
            income: root.income_amount(),
            issues: root.issues_amount(),
        },
    ))
}
