//! gtf CLI - plans Git commits as pending server changes

use anyhow::Result;
use clap::{Parser, Subcommand};
use gtf_checkin::RenameMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

/// gtf - check Git history into a centralized server
#[derive(Parser)]
#[command(name = "gtf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Repository to operate on
    #[arg(short = 'C', long, global = true, default_value = ".")]
    repo: PathBuf,

    /// More logging (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the changes a checkin of TO would pend
    Analyze {
        /// Revision the server already has (omit for an initial import)
        #[arg(long)]
        from: Option<String>,
        /// Revision to check in
        #[arg(default_value = "HEAD")]
        to: String,
        /// Rename detection: none, file-only or all
        #[arg(long)]
        renames: Option<RenameMode>,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Walk through the pend calls a checkin of TO would make, without a server
    Pend {
        /// Revision the server already has (omit for an initial import)
        #[arg(long)]
        from: Option<String>,
        /// Revision to check in
        #[arg(default_value = "HEAD")]
        to: String,
        /// Rename detection: none, file-only or all
        #[arg(long)]
        renames: Option<RenameMode>,
        /// Folder to extract blobs into (default: configured or temporary)
        #[arg(long)]
        working_folder: Option<PathBuf>,
    },
    /// View or edit checkin configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Print one configuration value
    Get {
        key: String,
    },
    /// Set one configuration value
    Set {
        key: String,
        value: String,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze { from, to, renames, json } => {
            cmd::analyze::run(&cli.repo, from.as_deref(), &to, renames, json)
        }
        Commands::Pend { from, to, renames, working_folder } => {
            cmd::pend::run(&cli.repo, from.as_deref(), &to, renames, working_folder)
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list(&cli.repo),
            ConfigCommands::Get { key } => cmd::config::run_get(&cli.repo, &key),
            ConfigCommands::Set { key, value } => cmd::config::run_set(&cli.repo, &key, &value),
        },
    }
}
