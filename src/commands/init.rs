use crate::commands::Out;
use crate::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// Creates the configuration file with default column names and labels.
///
/// # Arguments
/// - `config_path` - Where the configuration file is written, e.g. `$HOME/sankey/config.json`.
/// - `input_file` - The export to parse. Relative paths are resolved against the directory of
///   the configuration file.
/// - `output_file` - Where the HTML diagram is written, defaults to `output_files/sankey.html`.
/// - `force` - Overwrite an existing configuration file.
///
/// # Errors
/// - Returns an error if the file exists and `force` is not set, or if writing fails.
pub fn init(
    config_path: &Path,
    input_file: &Path,
    output_file: Option<&Path>,
    force: bool,
) -> Result<Out<()>> {
    let config = Config::create(config_path, input_file, output_file, force)
        .context("Unable to create the configuration file")?;
    if !config.input_file().is_file() {
        tracing::warn!(
            "The input file {} does not exist yet",
            config.input_file().display()
        );
    }
    Ok(format!(
        "Created {}, edit it to match the columns of your export",
        config.config_path().display()
    )
    .into())
}
