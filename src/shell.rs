//! Interactive command shell: the CLI commands in a read-eval loop.
//!
//! Lines are split with shell quoting rules and parsed by the same clap
//! definitions as the command line, so `add "Pay rent" --due +3d` works in
//! both places. A failing command prints its error and the loop continues.

use std::io::{self, BufRead, Write};

use clap::Parser;
use tracing::debug;

use crate::cli::ShellLine;
use crate::cmd::{self, Commands};
use crate::manager::TaskManager;

const PROMPT: &str = "td> ";

/// What the loop should do with one input line.
#[derive(Debug)]
enum Step {
    Skip,
    Quit,
    Run(Commands),
    /// Message to print (help text or a parse error).
    Print(String),
}

fn parse_line(line: &str) -> Step {
    let line = line.trim();
    match line {
        "" => return Step::Skip,
        "exit" | "quit" | "q" => return Step::Quit,
        _ => {}
    }
    let Some(words) = shlex::split(line) else {
        return Step::Print("error: unbalanced quotes".into());
    };
    match ShellLine::try_parse_from(words) {
        Ok(ShellLine { command: Commands::Shell }) => {
            Step::Print("already in the shell".into())
        }
        Ok(ShellLine { command: Commands::Ui }) => {
            Step::Print("the UI cannot start inside the shell; exit and run 'td ui'".into())
        }
        Ok(ShellLine { command }) => Step::Run(command),
        Err(e) => Step::Print(e.render().to_string()),
    }
}

/// Run the shell until `exit`, `quit` or end of input. Commands that ask
/// for confirmation read their answer from the same `input`.
pub fn run_shell(mgr: &mut TaskManager, input: &mut dyn BufRead) -> io::Result<()> {
    let stats = mgr.query().statistics();
    println!(
        "taskdeck shell: {} task(s), {} overdue. Type 'help' for commands, 'exit' to leave.",
        stats.total, stats.overdue
    );

    let mut line = String::new();
    loop {
        print!("{PROMPT}");
        io::stdout().flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }
        match parse_line(&line) {
            Step::Skip => {}
            Step::Quit => return Ok(()),
            Step::Print(msg) => println!("{}", msg.trim_end()),
            Step::Run(command) => {
                debug!(line = line.trim(), "shell command");
                if let Err(e) = cmd::run_with_input(command, mgr, input) {
                    eprintln!("error: {e:#}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::fields::Priority;
    use chrono::{TimeZone, Utc};
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn blank_lines_and_exit_words() {
        assert!(matches!(parse_line("   \n"), Step::Skip));
        for word in ["exit", "quit", "q", " exit \n"] {
            assert!(matches!(parse_line(word), Step::Quit));
        }
    }

    #[test]
    fn quoted_arguments_stay_together() {
        match parse_line("add \"Pay the rent\" --priority high --due '+3d'\n") {
            Step::Run(Commands::Add { title, priority, due, .. }) => {
                assert_eq!(title, "Pay the rent");
                assert_eq!(priority, Some(Priority::High));
                assert_eq!(due.as_deref(), Some("+3d"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    fn manager(dir: &TempDir) -> TaskManager {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap());
        TaskManager::open_with_clock(dir.path().join("tasks.json"), Box::new(clock))
    }

    #[test]
    fn confirmation_answers_come_from_the_shell_input() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager(&dir);

        let mut input = Cursor::new("add one\nadd two\nreset\nn\nlist\n");
        run_shell(&mut mgr, &mut input).unwrap();
        assert_eq!(mgr.tasks().len(), 2);

        let mut input = Cursor::new("reset\ny\nadd three\nexit\nadd never\n");
        run_shell(&mut mgr, &mut input).unwrap();
        let titles: Vec<&str> = mgr.tasks().iter().map(|t| t.title()).collect();
        assert_eq!(titles, vec!["three"]);
    }

    #[test]
    fn failing_commands_do_not_end_the_session() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager(&dir);
        let mut input = Cursor::new("done 42\nadd \"  \"\nadd kept --due +2d\n");
        run_shell(&mut mgr, &mut input).unwrap();
        assert_eq!(mgr.tasks().len(), 1);
        assert_eq!(mgr.get(1).unwrap().title(), "kept");
    }

    #[test]
    fn bad_lines_produce_messages() {
        assert!(matches!(parse_line("add \"unterminated"), Step::Print(_)));
        assert!(matches!(parse_line("frobnicate"), Step::Print(_)));
        assert!(matches!(parse_line("shell"), Step::Print(_)));
        match parse_line("ui") {
            Step::Print(text) => assert!(text.contains("td ui")),
            other => panic!("unexpected {other:?}"),
        }
        match parse_line("help") {
            Step::Print(text) => assert!(text.contains("add")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
