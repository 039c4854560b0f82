mod check_cmd;
mod run_cmd;
mod settings;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "slashforge")]
#[command(about = "Slashforge — Discord slash commands with hot reload")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and serve slash commands
    Run {
        /// Directory holding slashforge.yaml, token.txt and the commands folder
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,
        /// Config file path (defaults to <base-dir>/slashforge.yaml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Watch command modules and republish on change
        #[arg(long, overrides_with = "no_hot_reload")]
        hot_reload: bool,
        /// Load command modules once and never watch them
        #[arg(long, overrides_with = "hot_reload")]
        no_hot_reload: bool,
    },
    /// Load every command module offline and report the result
    Check {
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the registration payload and findings as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Collapse a `--flag` / `--no-flag` pair; `None` when neither was given.
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { base_dir, config, hot_reload, no_hot_reload } => {
            run_cmd::run(base_dir, config, flag_pair(hot_reload, no_hot_reload)).await?;
        }
        Commands::Check { base_dir, config, json } => {
            if !check_cmd::run(base_dir, config, json).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
