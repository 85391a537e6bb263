mod cli;
mod commands;
mod compare;
mod config;
mod report;
mod walk;

use clap::Parser;
use config::ResolvedRunConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("imgdiff=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let config = ResolvedRunConfig::new(cli.into())?;
    let code = commands::run(config).await?;
    std::process::exit(code);
}
