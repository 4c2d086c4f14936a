mod cli;
mod commands;
mod completions;
mod config;
mod error;
mod output;
mod setup;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::CliConfig;
use setup::prepare_stores;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if cli.verbose {
                    "info,ephemera_storage=debug".into()
                } else {
                    "warn".into()
                }
            }),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        completions::generate_completions(shell);
        return Ok(());
    }

    let config = CliConfig::load(cli.config.as_deref())?.with_overrides(&cli.connection);
    let format = cli.format;

    if let Commands::Ping = cli.command {
        return commands::ping::run(&config, format).await;
    }

    let stores = prepare_stores(&config).await?;
    let result = match cli.command {
        Commands::Secret { command } => commands::secret::run(&stores, command, format).await,
        Commands::User { command } => commands::user::run(&stores, command, format).await,
        Commands::RateLimit { command } => commands::rate_limit::run(&stores, command, format).await,
        Commands::Ping | Commands::Completions { .. } => Ok(()),
    };
    stores.close();
    result
}
