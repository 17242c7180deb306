use anyhow::Result;
use cashflow_sankey::args::{Args, Command};
use cashflow_sankey::{commands, Config};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let config_path = args.common().config().path();

    // Route to appropriate command handler
    match args.command() {
        Command::Init(init_args) => commands::init(
            config_path,
            init_args.input_file(),
            init_args.output_file(),
            init_args.force(),
        )?
        .print(),

        Command::Generate(generate_args) => {
            let config = Config::load(config_path)?;
            commands::generate(config, generate_args)?.print()
        }

        Command::Inspect(inspect_args) => {
            let config = Config::load(config_path)?;
            let out = commands::inspect(&config, inspect_args)?;
            println!("{}", out.message());
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
