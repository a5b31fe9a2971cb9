use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Personal, file-backed task tracker.
/// Storage defaults to ~/.taskdeck/tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "td", version, about = "Personal task tracker")]
pub struct Cli {
    /// Path to the JSON task file.
    #[arg(long, global = true, env = "TASKDECK_DB")]
    pub db: Option<PathBuf>,

    /// Log store and manager activity to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// One line typed at the interactive shell, parsed with the same commands.
#[derive(Parser)]
#[command(name = "td", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Commands,
}
