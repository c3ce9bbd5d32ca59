//! colorbench CLI entry point.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use colorbench::cli::{self, commands, Cli, Commands, Verdict};
use colorbench::infrastructure::config::ConfigLoader;
use colorbench::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let code = match run(cli.command, cli.config.as_deref(), cli.json).await {
        Ok(verdict) => verdict.exit_code(),
        Err(err) => cli::handle_error(&err, cli.json),
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn run(
    command: Commands,
    config_path: Option<&std::path::Path>,
    json: bool,
) -> anyhow::Result<Verdict> {
    let config = ConfigLoader::load(config_path).context("Failed to load configuration")?;
    // Held until exit so the file writer flushes.
    let _logger = LoggerImpl::init(&config.logging).context("Failed to initialize logging")?;

    match command {
        Commands::Run(args) => commands::run::execute(args, &config, json).await,
        Commands::Parse(args) => commands::parse::execute(args, &config, json).await,
        Commands::Compare(args) => commands::compare::execute(args, json).await,
        Commands::Verify(args) => commands::verify::execute(args, json).await,
        Commands::Merge(args) => commands::merge::execute(args, json).await,
    }
}
