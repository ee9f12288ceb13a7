//! `estate-office` command-line client.

mod cli;
mod commands;
mod config;
mod logging;

use clap::Parser;

use crate::cli::Cli;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format)?;

    let cfg = AppConfig::load(cli.config.as_deref())?;
    tracing::debug!(
        base_url = %cfg.backend.base_url,
        offline_roles = cli.offline_roles,
        "configuration loaded"
    );

    commands::run(cli, &cfg).await
}
