mod cli;
mod commands;
mod config;
mod deployer;
mod paths;
mod progress;
mod ui;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config_path: Option<PathBuf>,
    pub overrides: config::Overrides,
}

impl Context {
    /// Load the deploy config for this invocation
    pub fn load_config(&self) -> Result<config::DeployConfig> {
        config::DeployConfig::load(self.config_path.as_deref(), self.overrides.clone())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let destination = cli
        .destination
        .as_deref()
        .map(str::parse::<objstore::Destination>)
        .transpose()
        .context("Invalid --destination")?;

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_path: cli.config,
        overrides: config::Overrides {
            site_root: cli.site_root,
            destination,
            exclude: cli.exclude,
        },
    };

    match cli.command {
        Command::Deploy(args) => commands::deploy::run(&ctx, &args),
        Command::Plan(args) => commands::plan::run(&ctx, &args),
        Command::Diff => commands::diff::run(&ctx),
        Command::Manifest(args) => commands::manifest::run(&ctx, &args),
        Command::Doctor => commands::doctor::run(&ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "sitepush", &mut io::stdout());
            Ok(())
        }
    }
}
