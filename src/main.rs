//! cloudsight - multi-cloud cost CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use cloudsight::cli::{Cli, Commands};
use cloudsight::core::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(|| logging::parse_log_level_from_env().map(logging::LogLevel::from_tracing_level))
        .unwrap_or_default();
    let log_format = logging::parse_log_format_from_env().unwrap_or_default();
    logging::init(log_level, log_format, cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {e}");
            if let Some(remediation) = e.remediation() {
                eprintln!("{remediation}");
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> cloudsight::Result<()> {
    let format = cli.effective_format();
    let pretty = cli.pretty;
    let no_color = cli.no_color;

    match cli.command {
        // Default: show the stored snapshot, same as `show`
        None | Some(Commands::Show) => cloudsight::cli::show::execute(format, pretty, no_color).await,

        Some(Commands::Refresh) => cloudsight::cli::refresh::execute(format, pretty, no_color).await,

        Some(Commands::Watch(args)) => {
            cloudsight::cli::watch::execute(&args, format, pretty, no_color).await
        }

        Some(Commands::Test) => cloudsight::cli::test::execute(format, pretty, no_color).await,

        Some(Commands::Creds(cmd)) => cloudsight::cli::creds::execute(cmd).await,

        Some(Commands::Config(args)) => cloudsight::cli::config::execute(&args).await,
    }
}
