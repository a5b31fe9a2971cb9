//! `td`: command-line entry point for taskdeck.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskdeck::cli::Cli;
use taskdeck::cmd::{self, Commands};
use taskdeck::manager::TaskManager;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    if should_install_tracing(&cli.command) {
        install_tracing(cli.verbose);
    }

    // Completions need no task file.
    if let Commands::Completions { shell } = cli.command {
        cmd::cmd_completions(shell);
        return Ok(());
    }

    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let mut mgr = TaskManager::open(db_path);
    cmd::run(cli.command, &mut mgr)
}

/// `~/.taskdeck/tasks.json`, creating the directory on first use.
fn default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let dir = PathBuf::from(home).join(".taskdeck");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create task directory {}", dir.display()))?;
    Ok(dir.join("tasks.json"))
}

/// The UI owns the terminal; log lines on stderr would tear through it.
const fn should_install_tracing(cmd: &Commands) -> bool {
    !matches!(cmd, Commands::Ui)
}

fn install_tracing(verbose: bool) {
    // RUST_LOG wins; otherwise warnings only, or info with --verbose.
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
