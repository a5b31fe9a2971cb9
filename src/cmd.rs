//! Command implementations for the CLI interface.
//!
//! Each handler turns one parsed subcommand into calls on the task manager
//! and prints the result. The interactive shell dispatches through the same
//! `run` function, so both surfaces behave identically.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::display::*;
use crate::export::export_csv_file;
use crate::fields::*;
use crate::manager::TaskManager;
use crate::query::TaskFilter;
use crate::summarize;
use crate::task::{split_tags, NewTask, TaskPatch};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Priority: low | medium | high (default medium).
        #[arg(long)]
        priority: Option<Priority>,
        /// Initial status: pending | in_progress | completed | cancelled.
        #[arg(long)]
        status: Option<Status>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Project name.
        #[arg(long)]
        project: Option<String>,
        /// Due date: YYYY-MM-DD, today, tomorrow, +Nd, +Nw, "next week" or "next month".
        #[arg(long)]
        due: Option<String>,
        /// Ask the summarisation service for a shorter title based on --desc.
        #[arg(long)]
        suggest_title: bool,
    },

    /// List tasks with optional filters.
    #[command(visible_alias = "ls")]
    List {
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Id)]
        sort: SortKey,
        /// Filter by status.
        #[arg(long)]
        status: Option<Status>,
        /// Filter by priority.
        #[arg(long)]
        priority: Option<Priority>,
        /// Filter by tag (exact, case-sensitive).
        #[arg(long)]
        tag: Option<String>,
        /// Filter by project (case-insensitive substring).
        #[arg(long)]
        project: Option<String>,
        /// Only overdue tasks.
        #[arg(long)]
        overdue: bool,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task.
    View {
        id: u64,
    },

    /// Update fields on a task.
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long, conflicts_with = "clear_project")]
        project: Option<String>,
        /// Remove the project.
        #[arg(long)]
        clear_project: bool,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
        /// Replace the tags. May be repeated and comma-separated.
        #[arg(long = "tag", conflicts_with = "clear_tags")]
        tags: Vec<String>,
        /// Remove every tag.
        #[arg(long)]
        clear_tags: bool,
    },

    /// Set a task's status.
    Status {
        id: u64,
        status: Status,
    },

    /// Mark a task completed.
    Done {
        id: u64,
    },

    /// Delete a task.
    #[command(visible_alias = "rm")]
    Delete {
        id: u64,
    },

    /// Search titles and descriptions (case-insensitive).
    Search {
        query: String,
    },

    /// Show task statistics.
    Stats,

    /// List distinct tags and counts.
    Tags,

    /// Export tasks to CSV.
    Export {
        /// Output file path (default: tasks.csv)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Remove every completed task.
    ClearCompleted,

    /// Delete every task and the task file.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Start an interactive command shell.
    Shell,

    /// Launch the terminal user interface.
    Ui,
}

/// Execute one command against the manager, answering prompts from stdin.
pub fn run(command: Commands, mgr: &mut TaskManager) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    run_with_input(command, mgr, &mut input)
}

/// Execute one command, reading any y/n answers and shell lines from `input`.
pub fn run_with_input(
    command: Commands,
    mgr: &mut TaskManager,
    input: &mut dyn BufRead,
) -> Result<()> {
    match command {
        Commands::Add { title, desc, priority, status, tags, project, due, suggest_title } => {
            let new = NewTask {
                title,
                description: desc,
                priority,
                status,
                tags: split_tags(&tags),
                project,
                due,
            };
            cmd_add(mgr, new, suggest_title, input)
        }
        Commands::List { sort, status, priority, tag, project, overdue, limit } => {
            let filter = TaskFilter { status, priority, tag, project, overdue_only: overdue };
            cmd_list(mgr, sort, &filter, limit);
            Ok(())
        }
        Commands::View { id } => cmd_view(mgr, id),
        Commands::Update {
            id, title, desc, priority, status, project, clear_project, due, clear_due, tags,
            clear_tags,
        } => {
            let patch = TaskPatch {
                title,
                description: desc,
                priority,
                status,
                tags: if clear_tags {
                    Some(Vec::new())
                } else if tags.is_empty() {
                    None
                } else {
                    Some(split_tags(&tags))
                },
                project: if clear_project { Some(None) } else { project.map(Some) },
                due: if clear_due { Some(None) } else { due.map(Some) },
            };
            let task = mgr.update(id, patch)?;
            println!("Updated task {}", task.id());
            Ok(())
        }
        Commands::Status { id, status } => {
            let task = mgr.set_status(id, status)?;
            println!("Task {} is now {}", task.id(), task.status());
            Ok(())
        }
        Commands::Done { id } => {
            mgr.set_status(id, Status::Completed)?;
            println!("Completed task {id}");
            Ok(())
        }
        Commands::Delete { id } => {
            let task = mgr.delete(id)?;
            println!("Deleted task {} ({})", task.id(), task.title());
            Ok(())
        }
        Commands::Search { query } => {
            let found = mgr.query().search(&query);
            print!("{}", render_table(&found, mgr.today()));
            Ok(())
        }
        Commands::Stats => {
            print!("{}", render_statistics(&mgr.query().statistics()));
            Ok(())
        }
        Commands::Tags => {
            cmd_tags(mgr);
            Ok(())
        }
        Commands::Export { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from("tasks.csv"));
            let tasks = mgr.query().list(SortKey::Id);
            let n = export_csv_file(&tasks, &path)
                .with_context(|| format!("failed to export to {}", path.display()))?;
            println!("Exported {n} task(s) to {}", path.display());
            Ok(())
        }
        Commands::ClearCompleted => {
            let n = mgr.clear_completed()?;
            println!("Removed {n} completed task(s)");
            Ok(())
        }
        Commands::Reset { yes } => {
            let prompt = format!("Delete all tasks and {}?", mgr.path().display());
            if !yes && !confirm(&prompt, input)? {
                println!("Nothing deleted.");
                return Ok(());
            }
            mgr.clear()?;
            println!("All tasks deleted.");
            Ok(())
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
        Commands::Shell => crate::shell::run_shell(mgr, input).context("shell failed"),
        Commands::Ui => crate::tui::run::run_tui(mgr).context("UI error"),
    }
}

/// Add a new task, optionally swapping in a suggested title first.
fn cmd_add(
    mgr: &mut TaskManager,
    mut new: NewTask,
    suggest_title: bool,
    input: &mut dyn BufRead,
) -> Result<()> {
    if suggest_title {
        let summarizer = summarize::from_env();
        let description = new.description.as_deref().unwrap_or_default();
        match summarize::suggest_title(summarizer.as_ref(), description) {
            Some(suggestion) => {
                println!("Suggested title: {suggestion}");
                if confirm("Use suggestion?", input)? {
                    new.title = suggestion;
                }
            }
            None => println!("No title suggestion available, keeping '{}'.", new.title),
        }
    }

    let task = mgr.add(new)?;
    println!("Added task {}", task.id());
    Ok(())
}

/// List tasks with optional filtering and sorting.
fn cmd_list(mgr: &TaskManager, sort: SortKey, filter: &TaskFilter, limit: Option<usize>) {
    let query = mgr.query();
    let mut tasks = query.filter(filter);
    crate::query::sort_tasks(&mut tasks, sort);
    if let Some(n) = limit {
        tasks.truncate(n);
    }
    print!("{}", render_table(&tasks, query.today()));
}

/// View detailed information about a specific task.
fn cmd_view(mgr: &TaskManager, id: u64) -> Result<()> {
    let task = mgr.get(id).ok_or(crate::error::TaskError::TaskNotFound(id))?;
    print!("{}", render_task(task, mgr.today()));
    Ok(())
}

/// List distinct tags with the number of tasks carrying each.
fn cmd_tags(mgr: &TaskManager) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for t in mgr.tasks() {
        for tag in t.tags() {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    if counts.is_empty() {
        println!("No tags in use.");
    }
    for (tag, n) in counts {
        println!("{tag:<20} {n}");
    }
}

/// Print a completion script for `shell` to stdout.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "td", &mut io::stdout());
}

/// Ask a yes/no question. Anything but y/yes, including end of input, is a no.
pub fn confirm(prompt: &str, input: &mut dyn BufRead) -> io::Result<bool> {
    print!("{prompt} (y/n): ");
    io::stdout().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn confirm_reads_the_given_input() {
        assert!(confirm("ok?", &mut Cursor::new("Y\n")).unwrap());
        assert!(confirm("ok?", &mut Cursor::new(" yes \n")).unwrap());
        assert!(!confirm("ok?", &mut Cursor::new("n\n")).unwrap());
        assert!(!confirm("ok?", &mut Cursor::new("")).unwrap());
    }
}
