use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qms::cli::{Cli, Commands, ConfigCommands};
use qms::config::Config;
use qms::AppState;

fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // `config check` reports on a broken file instead of failing to load it
    if let Commands::Config(ConfigCommands::Check) = &cli.command {
        init_logging(cli.log_level.as_deref().unwrap_or("warn"));
        return qms::cli::cmd_config_check(&cli);
    }

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();
    init_logging(&log_level);

    tracing::debug!("Starting QMS v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config)?;
    qms::cli::run_command(&cli, &state)
}
