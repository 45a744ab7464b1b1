//! Command-line front end.

pub mod commands;
pub mod interactive;
pub mod watch;

use std::process::ExitCode;

use anyhow::Result;

use crate::config::{Command, Config};

/// Parse arguments, set up logging and dispatch the requested command
pub async fn run() -> Result<ExitCode> {
    let (config, args) = Config::from_args_and_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();
    if let Some(path) = &config.config_path {
        log::info!("using settings from {}", path.display());
    }

    match args.command {
        None => commands::unextrude(&config, args.unextrude).await,
        Some(Command::Unextrude(unextrude)) => commands::unextrude(&config, unextrude).await,
        Some(Command::Inspect { file, json, .. }) => commands::inspect(&config, &file, json),
        Some(Command::Validate { file, .. }) => commands::validate(&config, &file),
        Some(Command::Watch { dir }) => watch::watch(&config, &dir).await,
    }
}
