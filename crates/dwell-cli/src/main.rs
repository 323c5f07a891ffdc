use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dwell_cli::commands::{init, replay, status, track};
use dwell_cli::{Cli, Commands, Config, identity};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // stdout is a data channel for track/replay, so logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Init) => {
            let config = load_config(cli.config.as_deref())?;
            init::run(&mut io::stdout().lock(), &config)?;
        }
        Some(Commands::Track { user_id }) => {
            let config = load_config(cli.config.as_deref())?;
            let user_id = identity::resolve(&config.identity_path, user_id.as_deref())?;
            track::run(io::stdin().lock(), &mut io::stdout().lock(), &config, user_id)?;
        }
        Some(Commands::Replay { input, user_id }) => {
            let config = load_config(cli.config.as_deref())?;
            let user_id = identity::resolve(&config.identity_path, user_id.as_deref())?;
            let stdout = io::stdout().lock();
            if let Some(path) = input {
                let file = File::open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                replay::run(BufReader::new(file), stdout, &config, user_id)?;
            } else {
                replay::run(io::stdin().lock(), stdout, &config, user_id)?;
            }
        }
        Some(Commands::Status) => {
            let config = load_config(cli.config.as_deref())?;
            status::run(&mut io::stdout().lock(), &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
