use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sitepush")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Deploy a static site to object storage, new content first", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./sitepush.toml, then the user config dir)
    #[arg(short, long, global = true, env = "SITEPUSH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the built site
    #[arg(long, global = true)]
    pub site_root: Option<PathBuf>,

    /// Deploy destination: s3://bucket[/prefix] or file:///dir
    #[arg(long, global = true)]
    pub destination: Option<String>,

    /// Glob pattern to exclude (repeatable; replaces the config list)
    #[arg(long = "exclude", global = true, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy the site: upload new content, then updates, then delete stale files
    Deploy(DeployArgs),

    /// Show the stages the next deploy would run
    Plan(PlanArgs),

    /// Show what changed since the last deploy
    Diff,

    /// Hash the local site and print or write the checksum manifest
    Manifest(ManifestArgs),

    /// Check configuration, site root and backend availability
    Doctor,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct DeployArgs {
    /// Show what would happen without making changes
    #[arg(long)]
    pub dry_run: bool,

    /// Ignore the remote manifest and upload everything
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// Plan a full deploy regardless of the remote manifest
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Write the manifest to this file instead of stdout
    #[arg(short, long, conflicts_with = "write")]
    pub output: Option<PathBuf>,

    /// Write the manifest into the site root
    #[arg(long)]
    pub write: bool,
}
