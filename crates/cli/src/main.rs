//! Agent config reloader - agent-reloader command

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod daemon;
mod logging;
mod settings;

use settings::Overrides;

/// Watch a config directory and reload the node agent when it changes
#[derive(Parser)]
#[command(name = "agent-reloader")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the config directory and reload on change (default)
    Watch,
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Print an example configuration file
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => {
            let config = cli.overrides.resolve()?;
            let _log_guard = logging::init(&config.log)?;
            daemon::run(config).await
        }
        Commands::Config(ConfigCommands::Show) => {
            let config = cli.overrides.resolve()?;
            cmd::config::run_show(&config, cli.overrides.config.as_deref()).await
        }
        Commands::Config(ConfigCommands::Example) => cmd::config::run_example().await,
    }
}
