//! Main application logic for the terminal user interface.
//!
//! `App` borrows the task manager for the lifetime of the UI, so every change
//! made here goes through the same validation and persistence path as the
//! CLI. The visible rows are a list of ids recomputed after each change.

use std::collections::HashSet;
use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::display::format_due_relative;
use crate::fields::*;
use crate::manager::TaskManager;
use crate::query::{sort_tasks, TaskFilter};
use crate::tui::colors::{priority_style, status_style, BAR_BG, DARK_RED};
use crate::tui::input::InputField;

/// What keystrokes currently mean.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Search,
    Confirm,
}

pub struct App<'a> {
    mgr: &'a mut TaskManager,
    mode: Mode,
    table_state: TableState,
    visible: Vec<u64>,
    sort: SortKey,
    status_filter: Option<Status>,
    overdue_only: bool,
    search: InputField,
    status_message: String,
}

impl<'a> App<'a> {
    pub fn new(mgr: &'a mut TaskManager) -> Self {
        let status_message = mgr
            .take_load_warning()
            .map(|w| format!("Warning: {w}"))
            .unwrap_or_default();
        let mut app = App {
            mgr,
            mode: Mode::Browse,
            table_state: TableState::default(),
            visible: Vec::new(),
            sort: SortKey::default(),
            status_filter: None,
            overdue_only: false,
            search: InputField::new(),
            status_message,
        };
        app.refresh();
        app
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Ids of the rows on screen, top to bottom.
    pub fn visible(&self) -> &[u64] {
        &self.visible
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.table_state
            .selected()
            .and_then(|i| self.visible.get(i))
            .copied()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Recompute the visible rows, keeping the selection on the same task
    /// when it is still shown.
    fn refresh(&mut self) {
        let previous = self.selected_id();

        let query = self.mgr.query();
        let filter = TaskFilter {
            status: self.status_filter,
            overdue_only: self.overdue_only,
            ..TaskFilter::default()
        };
        let mut tasks = query.filter(&filter);
        let needle = self.search.value.trim();
        if !needle.is_empty() {
            let hits: HashSet<u64> = query.search(needle).iter().map(|t| t.id()).collect();
            tasks.retain(|t| hits.contains(&t.id()));
        }
        sort_tasks(&mut tasks, self.sort);
        self.visible = tasks.iter().map(|t| t.id()).collect();

        let index = previous
            .and_then(|id| self.visible.iter().position(|&v| v == id))
            .or(if self.visible.is_empty() { None } else { Some(0) });
        self.table_state.select(index);
    }

    fn move_selection(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() as isize - 1;
        let current = self.table_state.selected().unwrap_or(0) as isize;
        self.table_state
            .select(Some((current + delta).clamp(0, last) as usize));
    }

    fn set_selected_status(&mut self, status: Status) {
        let Some(id) = self.selected_id() else {
            return;
        };
        self.status_message = match self.mgr.set_status(id, status) {
            Ok(task) => format!("Task {} is now {}", task.id(), task.status()),
            Err(e) => format!("Error: {e}"),
        };
        self.refresh();
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        self.status_message = match self.mgr.delete(id) {
            Ok(task) => format!("Deleted task {} ({})", task.id(), task.title()),
            Err(e) => format!("Error: {e}"),
        };
        self.refresh();
    }

    fn cycle_status_filter(&mut self) {
        self.status_filter = match self.status_filter {
            None => Some(Status::Pending),
            Some(Status::Pending) => Some(Status::InProgress),
            Some(Status::InProgress) => Some(Status::Completed),
            Some(Status::Completed) => Some(Status::Cancelled),
            Some(Status::Cancelled) => None,
        };
        self.refresh();
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.search.value.is_empty() {
                    return true;
                }
                self.search.clear();
                self.refresh();
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('g') | KeyCode::Home => self.move_selection(isize::MIN / 2),
            KeyCode::Char('G') | KeyCode::End => self.move_selection(isize::MAX / 2),
            KeyCode::Char('s') => {
                self.sort = self.sort.next();
                self.status_message = format!("Sorted by {}", self.sort.as_str());
                self.refresh();
            }
            KeyCode::Char('f') => self.cycle_status_filter(),
            KeyCode::Char('o') => {
                self.overdue_only = !self.overdue_only;
                self.refresh();
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Search;
                self.search.active = true;
            }
            KeyCode::Char('c') => self.set_selected_status(Status::Completed),
            KeyCode::Char('p') => self.set_selected_status(Status::InProgress),
            KeyCode::Char('r') => self.set_selected_status(Status::Pending),
            KeyCode::Char('d') => {
                if self.selected_id().is_some() {
                    self.mode = Mode::Confirm;
                }
            }
            _ => {}
        }
        false
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.search.active = false;
                self.mode = Mode::Browse;
            }
            KeyCode::Esc => {
                self.search.clear();
                self.search.active = false;
                self.mode = Mode::Browse;
                self.refresh();
            }
            KeyCode::Backspace => {
                self.search.handle_backspace();
                self.refresh();
            }
            KeyCode::Delete => {
                self.search.handle_delete();
                self.refresh();
            }
            KeyCode::Left => self.search.move_cursor_left(),
            KeyCode::Right => self.search.move_cursor_right(),
            KeyCode::Char(c) => {
                self.search.handle_char(c);
                self.refresh();
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.delete_selected();
                self.mode = Mode::Browse;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.status_message = "Delete cancelled".into();
                self.mode = Mode::Browse;
            }
            _ => {}
        }
    }

    /// Apply one key press. Returns true when the UI should close.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if self.mode == Mode::Browse {
            self.status_message.clear();
        }
        match self.mode {
            Mode::Browse => return self.handle_browse_key(key),
            Mode::Search => self.handle_search_key(key),
            Mode::Confirm => self.handle_confirm_key(key),
        }
        false
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let filter = self.status_filter.map_or("all", Status::as_str);
        let mut spans = vec![
            Span::styled("TASKDECK", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("sort: {}  status: {filter}", self.sort.as_str()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ];
        if self.overdue_only {
            spans.push(Span::styled(
                "  overdue only",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }
        if !self.search.value.is_empty() {
            spans.push(Span::raw(format!("  search: '{}'", self.search.value)));
        }
        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_table(&mut self, f: &mut Frame, area: Rect) {
        let today = self.mgr.today();
        let header = Row::new(
            ["ID", "Status", "Pri", "Due", "Project", "Title"]
                .iter()
                .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))),
        )
        .style(Style::default().bg(BAR_BG).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = self
            .visible
            .iter()
            .filter_map(|&id| self.mgr.get(id))
            .map(|task| {
                let tags = if task.tags().is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", task.tags().join(","))
                };
                let due_style = if task.is_overdue(today) {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let row_style = match task.status() {
                    Status::Completed | Status::Cancelled => Style::default().fg(Color::DarkGray),
                    _ => Style::default().fg(Color::White),
                };
                Row::new(vec![
                    Cell::from(task.id().to_string()),
                    Cell::from(task.status().as_str())
                        .style(status_style(task.status())),
                    Cell::from(task.priority().as_str())
                        .style(priority_style(task.priority())),
                    Cell::from(format_due_relative(task.due_date(), today)).style(due_style),
                    Cell::from(task.project().unwrap_or("-").to_string()),
                    Cell::from(format!("{}{tags}", task.title())),
                ])
                .style(row_style)
            })
            .collect();

        let widths = [
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Length(7),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Min(20),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}/{})",
                self.visible.len(),
                self.mgr.tasks().len()
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_stats(&self, f: &mut Frame, area: Rect) {
        let stats = self.mgr.query().statistics();
        let mut lines = vec![Line::from(format!("Total      {}", stats.total)), Line::from("")];
        for s in Status::ALL {
            lines.push(Line::from(Span::styled(
                format!("{:<11}{}", s.as_str(), stats.status_count(s)),
                status_style(s),
            )));
        }
        lines.push(Line::from(""));
        for p in [Priority::High, Priority::Medium, Priority::Low] {
            lines.push(Line::from(Span::styled(
                format!("{:<11}{}", p.as_str(), stats.priority_count(p)),
                priority_style(p),
            )));
        }
        lines.push(Line::from(""));
        let overdue_style = if stats.overdue > 0 {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("overdue    {}", stats.overdue),
            overdue_style,
        )));
        if let Some(rate) = stats.completion_rate() {
            lines.push(Line::from(format!("done       {rate:.0}%")));
        }

        let panel = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Stats"));
        f.render_widget(panel, area);
    }

    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let title = self
            .selected_id()
            .and_then(|id| self.mgr.get(id))
            .map(|t| format!("#{} {}", t.id(), t.title()))
            .unwrap_or_default();
        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Delete this task?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(title),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .title("Confirm")
                    .borders(Borders::ALL)
                    .style(Style::default().bg(DARK_RED)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        const SEARCH_PROMPT: &str = "Search: ";
        let text = match self.mode {
            Mode::Search => format!("{SEARCH_PROMPT}{}", self.search.value),
            Mode::Confirm => "Confirm delete (y/n)".to_string(),
            Mode::Browse if !self.status_message.is_empty() => self.status_message.clone(),
            Mode::Browse => "j/k move  s sort  f status  o overdue  / search  \
                             c done  p in progress  r reopen  d delete  q quit"
                .to_string(),
        };
        let bar = Paragraph::new(text).style(Style::default().bg(BAR_BG).fg(Color::White));
        f.render_widget(bar, area);

        if self.mode == Mode::Search {
            let x = area.x + (SEARCH_PROMPT.len() + self.search.cursor) as u16;
            f.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
        }
    }

    fn render(&mut self, f: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(24)])
            .split(rows[1]);

        self.render_header(f, rows[0]);
        self.render_table(f, body[0]);
        self.render_stats(f, body[1]);
        if self.mode == Mode::Confirm {
            self.render_confirm(f, rows[1]);
        }
        self.render_status_bar(f, rows[2]);
    }

    /// Main event loop: draw, wait briefly for a key, repeat until quit.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(key) {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// A rectangle of `percent_x` by `percent_y` centered in `r`.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
