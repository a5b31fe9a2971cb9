//! Read-only views over a task collection: ordering, filtering, search and
//! statistics.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::fields::*;
use crate::task::Task;

/// Conjunctive filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    /// Exact, case-sensitive tag match.
    pub tag: Option<String>,
    /// Case-insensitive substring of the project.
    pub project: Option<String>,
    pub overdue_only: bool,
}

impl TaskFilter {
    fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if let Some(s) = self.status {
            if task.status() != s {
                return false;
            }
        }
        if let Some(p) = self.priority {
            if task.priority() != p {
                return false;
            }
        }
        if let Some(ref tag) = self.tag {
            if !task.tags().iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(ref project) = self.project {
            let needle = project.to_lowercase();
            match task.project() {
                Some(p) if p.to_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }
        if self.overdue_only && !task.is_overdue(today) {
            return false;
        }
        true
    }
}

/// Aggregate counts over a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub total: usize,
    /// Every status is present, including those with a zero count.
    pub by_status: BTreeMap<Status, usize>,
    /// Every priority is present, including those with a zero count.
    pub by_priority: BTreeMap<Priority, usize>,
    pub overdue: usize,
    pub tags: BTreeSet<String>,
}

impl Statistics {
    pub fn status_count(&self, status: Status) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn priority_count(&self, priority: Priority) -> usize {
        self.by_priority.get(&priority).copied().unwrap_or(0)
    }

    /// `count` as a percentage of the total; `None` for an empty collection.
    pub fn percentage(&self, count: usize) -> Option<f64> {
        (self.total > 0).then(|| count as f64 / self.total as f64 * 100.0)
    }

    pub fn completion_rate(&self) -> Option<f64> {
        self.percentage(self.status_count(Status::Completed))
    }
}

/// A snapshot of the collection as of `today`.
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    tasks: &'a [Task],
    today: NaiveDate,
}

impl<'a> Query<'a> {
    pub fn new(tasks: &'a [Task], today: NaiveDate) -> Self {
        Self { tasks, today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Every task in the requested order.
    pub fn list(&self, order: SortKey) -> Vec<&'a Task> {
        let mut out: Vec<&Task> = self.tasks.iter().collect();
        sort_tasks(&mut out, order);
        out
    }

    /// Tasks matching every set predicate, in id order.
    pub fn filter(&self, filter: &TaskFilter) -> Vec<&'a Task> {
        let mut out: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| filter.matches(t, self.today))
            .collect();
        out.sort_by_key(|t| t.id());
        out
    }

    /// Tasks whose title or description contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&'a Task> {
        let needle = query.to_lowercase();
        let mut out: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| {
                t.title().to_lowercase().contains(&needle)
                    || t.description().to_lowercase().contains(&needle)
            })
            .collect();
        out.sort_by_key(|t| t.id());
        out
    }

    pub fn statistics(&self) -> Statistics {
        let mut by_status: BTreeMap<Status, usize> = Status::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_priority: BTreeMap<Priority, usize> =
            Priority::ALL.iter().map(|p| (*p, 0)).collect();
        let mut overdue = 0;
        let mut tags = BTreeSet::new();

        for task in self.tasks {
            *by_status.entry(task.status()).or_default() += 1;
            *by_priority.entry(task.priority()).or_default() += 1;
            if task.is_overdue(self.today) {
                overdue += 1;
            }
            tags.extend(task.tags().iter().cloned());
        }

        Statistics {
            total: self.tasks.len(),
            by_status,
            by_priority,
            overdue,
            tags,
        }
    }
}

/// Sort in place. Every ordering falls back to ascending id on ties.
pub fn sort_tasks(tasks: &mut [&Task], order: SortKey) {
    match order {
        SortKey::Id => tasks.sort_by_key(|t| t.id()),
        SortKey::Priority => tasks.sort_by_key(|t| (t.priority().rank(), t.id())),
        // Undated tasks sort last.
        SortKey::Due => tasks.sort_by_key(|t| (t.due_date().is_none(), t.due_date(), t.id())),
        SortKey::Created => tasks.sort_by_key(|t| (t.created_at(), t.id())),
    }
}
