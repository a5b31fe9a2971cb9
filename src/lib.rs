//! # taskdeck
//!
//! A personal, file-backed task tracker. Tasks carry a title, description,
//! priority, status, tags, an optional project and an optional due date.
//! Due dates may be given as calendar dates or as relative expressions such
//! as `tomorrow`, `+3d` or `next week`, resolved against the current day.
//!
//! The collection lives in one JSON file (by default
//! `~/.taskdeck/tasks.json`) and is rewritten atomically on every change.
//!
//! ## Layout
//!
//! - [`task`], [`fields`]: the task record and its enumerations
//! - [`due`]: relative due-date expressions
//! - [`db`]: the JSON store
//! - [`query`]: ordering, filtering, search and statistics
//! - [`manager`]: the owner of the collection; every mutation goes through it
//! - [`cmd`], [`shell`], [`tui`]: the command line, the interactive shell and
//!   the terminal UI
//!
//! ```bash
//! td add "Pay rent" --priority high --due +3d --tag home
//! td list --sort due --overdue
//! td done 1
//! td ui
//! ```

pub mod cli;
pub mod clock;
pub mod cmd;
pub mod db;
pub mod display;
pub mod due;
pub mod error;
pub mod export;
pub mod fields;
pub mod manager;
pub mod query;
pub mod shell;
pub mod summarize;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod input;
    pub mod run;
}
