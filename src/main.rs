mod archive;
mod client;
mod fetcher;
mod message;
mod partition;
mod relocate;
mod timestamp;
mod utils;

use clap::Parser;
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Download the complete message history of your Slack workspace —
/// public channels, private channels and direct messages — to per-day
/// JSON files.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to export JSON files into.
    /// Defaults to ./slack-export if not set in config.
    #[arg(value_name = "TARGET_DIR")]
    target_dir: Option<PathBuf>,

    /// Slack user API token.
    /// Falls back to the config file, then the SLACK_TOKEN environment variable.
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/slack-history-export/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Only list the conversations that would be archived; fetch and write nothing.
    #[arg(long)]
    dry_run: bool,

    /// Skip fetching history for public channels.
    #[arg(long)]
    skip_channels: bool,

    /// Skip fetching history for private channels.
    #[arg(long)]
    skip_private_channels: bool,

    /// Skip fetching history for direct messages.
    #[arg(long)]
    skip_direct_messages: bool,

    /// Print each conversation as it is archived.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress standard output (progress bars).
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    target_dir: Option<PathBuf>,
    token: Option<String>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        // Search: XDG/OS config dir, then nothing
        dirs::config_dir()
            .map(|d| d.join("slack-history-export/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    // 2. Resolve target_dir (CLI > Config > Default)
    let target_dir = cli
        .target_dir
        .or(file_cfg.target_dir)
        .unwrap_or_else(|| PathBuf::from("slack-export"));

    // 3. Resolve token (CLI > Config > Environment)
    let token = cli
        .token
        .or(file_cfg.token)
        .or_else(|| std::env::var("SLACK_TOKEN").ok())
        .ok_or_else(|| {
            eyre!(
                "No API token given.\nUse --token, set token in config.toml, or export SLACK_TOKEN."
            )
        })?;

    // 4. Build the Export Config
    let config = utils::ExportConfig {
        target_dir,
        token,
        dry_run: cli.dry_run,
        skip_channels: cli.skip_channels,
        skip_private_channels: cli.skip_private_channels,
        skip_direct_messages: cli.skip_direct_messages,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    // 5. Run the Business Logic
    archive::execute(config)
}
