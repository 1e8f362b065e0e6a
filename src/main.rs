//! Quieter CLI
//!
//! Command-line interface for the noise-reduction pipeline.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use quieter::cli::{commands, Cli, Commands};
use quieter::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Quieter v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Some(Commands::Denoise {
            input,
            region,
            intensity,
            output,
        }) => {
            commands::denoise(config, &input, region, intensity, output.as_deref())
                .await
                .map_err(|e| anyhow::anyhow!("{} ({})", e.friendly_message(), e))
                .with_context(|| format!("could not denoise {}", input.display()))?;
        }
        Some(Commands::Params { intensity }) => commands::params(&config, intensity)?,
        Some(Commands::Info { input }) => commands::info(&input)
            .with_context(|| format!("could not read {}", input.display()))?,
        None => {
            println!("Quieter v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
        }
    }

    Ok(())
}
