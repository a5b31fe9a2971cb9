//! Plain-terminal rendering of tasks and statistics.
//!
//! Everything here builds strings; the command layer decides where they go.

use chrono::NaiveDate;
use crossterm::style::{Color, Stylize};

use crate::fields::*;
use crate::query::Statistics;
use crate::task::Task;

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            if delta == 0 {
                "today".into()
            } else if delta == 1 {
                "tomorrow".into()
            } else if delta > 1 {
                format!("in {delta}d")
            } else {
                format!("{}d late", -delta)
            }
        }
    }
}

pub fn priority_color(p: Priority) -> Color {
    match p {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

pub fn status_color(s: Status) -> Color {
    match s {
        Status::Pending => Color::Grey,
        Status::InProgress => Color::Blue,
        Status::Completed => Color::Green,
        Status::Cancelled => Color::DarkRed,
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// One line per entry, each terminated by a newline.
fn join_lines(lines: Vec<String>) -> String {
    lines.into_iter().map(|l| l + "\n").collect()
}

/// Render tasks as a table, one row per task.
pub fn render_table(tasks: &[&Task], today: NaiveDate) -> String {
    if tasks.is_empty() {
        return "No tasks found.\n".to_string();
    }
    let header = format!(
        "{:<5} {:<12} {:<7} {:<10} {:<14} {}",
        "ID", "Status", "Pri", "Due", "Project", "Title [tags]"
    );
    let mut lines = vec![header.bold().to_string()];
    for t in tasks {
        let tags = if t.tags().is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags().join(","))
        };
        let due = format!("{:<10}", format_due_relative(t.due_date(), today));
        let due = if t.is_overdue(today) { due.red().to_string() } else { due };
        lines.push(format!(
            "{:<5} {} {} {} {:<14} {}{}",
            t.id(),
            format!("{:<12}", t.status().as_str()).with(status_color(t.status())),
            format!("{:<7}", t.priority().as_str()).with(priority_color(t.priority())),
            due,
            truncate(t.project().unwrap_or("-"), 14),
            t.title(),
            tags.dark_grey()
        ));
    }
    join_lines(lines)
}

/// Render every field of one task.
pub fn render_task(t: &Task, today: NaiveDate) -> String {
    let due = match t.due_date() {
        Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
        None => "-".into(),
    };
    let tags = if t.tags().is_empty() { "-".into() } else { t.tags().join(", ") };

    let mut lines = vec![
        format!("[#{}] {}", t.id(), t.title()).bold().to_string(),
        format!("Status:       {}", t.status().as_str().with(status_color(t.status()))),
        format!("Priority:     {}", t.priority().as_str().with(priority_color(t.priority()))),
        format!("Project:      {}", t.project().unwrap_or("-")),
        format!("Due:          {due}"),
    ];
    if t.is_overdue(today) {
        lines.push(format!("              {}", "OVERDUE".red().bold()));
    }
    lines.push(format!("Tags:         {tags}"));
    lines.push(format!("Created:      {}", t.created_at().to_rfc3339()));
    lines.push(format!("Updated:      {}", t.updated_at().to_rfc3339()));
    if let Some(c) = t.completed_at() {
        lines.push(format!("Completed:    {}", c.to_rfc3339()));
    }
    let description = if t.description().is_empty() { "-" } else { t.description() };
    lines.push(format!("Description:\n{description}"));
    join_lines(lines)
}

fn percent(stats: &Statistics, count: usize) -> String {
    stats
        .percentage(count)
        .map(|p| format!(" ({p:.1}%)"))
        .unwrap_or_default()
}

/// Render a statistics summary.
pub fn render_statistics(stats: &Statistics) -> String {
    let mut lines = vec![
        "Task statistics".bold().to_string(),
        format!("Total:        {}", stats.total),
    ];
    if stats.total == 0 {
        return join_lines(lines);
    }

    lines.push("\nBy status:".into());
    for s in Status::ALL {
        let n = stats.status_count(s);
        let label = format!("{:<12}", s.as_str()).with(status_color(s));
        lines.push(format!("  {label} {n}{}", percent(stats, n)));
    }
    lines.push("\nBy priority:".into());
    for p in [Priority::High, Priority::Medium, Priority::Low] {
        let n = stats.priority_count(p);
        let label = format!("{:<12}", p.as_str()).with(priority_color(p));
        lines.push(format!("  {label} {n}{}", percent(stats, n)));
    }
    if stats.overdue > 0 {
        let warning = format!("{} task(s) overdue", stats.overdue).red().bold();
        lines.push(format!("\n{warning}"));
    }
    if !stats.tags.is_empty() {
        let tags: Vec<&str> = stats.tags.iter().map(String::as_str).collect();
        lines.push(format!("\nTags in use:  {}", tags.join(", ")));
    }
    join_lines(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use crate::task::NewTask;
    use chrono::{TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn due_dates_relative_to_today() {
        let today = day(2025, 1, 10);
        assert_eq!(format_due_relative(None, today), "-");
        assert_eq!(format_due_relative(Some(today), today), "today");
        assert_eq!(format_due_relative(Some(day(2025, 1, 11)), today), "tomorrow");
        assert_eq!(format_due_relative(Some(day(2025, 1, 13)), today), "in 3d");
        assert_eq!(format_due_relative(Some(day(2025, 1, 8)), today), "2d late");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer project", 6), "a lon…");
    }

    #[test]
    fn table_and_detail_mention_the_task() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let new = NewTask {
            tags: vec!["home".into()],
            ..NewTask::new("Water plants")
        };
        let task = Task::create(7, &new, None, now).unwrap();

        let table = render_table(&[&task], now.date_naive());
        assert!(table.contains("Water plants"));
        assert!(table.contains("home"));

        let detail = render_task(&task, now.date_naive());
        assert!(detail.contains("[#7] Water plants"));
        assert!(render_table(&[], now.date_naive()).contains("No tasks"));
    }

    #[test]
    fn empty_statistics_skip_breakdowns() {
        let stats = Query::new(&[], day(2025, 1, 10)).statistics();
        let text = render_statistics(&stats);
        assert!(text.contains("Total:        0"));
        assert!(!text.contains('%'));
    }

    #[test]
    fn statistics_and_detail_lines() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let late = NewTask {
            tags: vec!["home".into()],
            ..NewTask::new("Pay rent")
        };
        let tasks = vec![
            Task::create(1, &late, Some(day(2025, 1, 5)), now).unwrap(),
            Task::create(2, &NewTask::new("Read"), None, now).unwrap(),
        ];
        let today = now.date_naive();

        let text = render_statistics(&Query::new(&tasks, today).statistics());
        assert!(text.contains("Total:        2"));
        assert!(text.contains("2 (100.0%)"));
        assert!(text.contains("1 task(s) overdue"));
        assert!(text.contains("Tags in use:  home"));
        assert!(text.ends_with('\n'));

        let detail = render_task(&tasks[0], today);
        assert!(detail.contains("OVERDUE"));
        assert!(detail.contains("Due:          2025-01-05 (5d late)"));
        assert!(detail.ends_with("Description:\n-\n"));
    }
}
