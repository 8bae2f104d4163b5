#![allow(clippy::exit)]

mod cli;
mod commands;
mod config;
mod output;
mod timing;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use tracing::{debug, instrument};

use crate::cli::{Cli, Commands};
use crate::commands::{run_accounts, run_demo, run_forget, run_login};
use crate::config::Config;

/// Resolves the config file and applies `KEYHOLE_*` overrides on top of its
/// `[login]` section.
#[instrument(skip_all, name = "load_config")]
fn load_config(path: Option<PathBuf>) -> Result<(PathBuf, Config)> {
    let path = match path {
        Some(path) => path,
        None => Config::default_path()?,
    };
    debug!("Using config file {}", path.display());

    let mut config = Config::load(&path)?;
    config.login = config
        .login
        .with_env_overrides(std::env::vars())
        .with_context(|| format!("Invalid login settings in {}", path.display()))?;
    Ok((path, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    timing::init_tracing(cli.verbose, cli.timing);

    let (config_path, config) = load_config(cli.config)?;

    match cli.command.unwrap_or_default() {
        Commands::Login {
            email,
            show_password,
        } => {
            if !run_login(&config.login, &config_path, email, show_password).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Accounts { show_passwords } => {
            run_accounts(&config.login.directory(), show_passwords);
            Ok(())
        }
        Commands::Forget => run_forget(&config_path),
        Commands::Demo => run_demo(&config.login).await,
    }
}
