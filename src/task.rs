//! Task record and its field-level validation.
//!
//! A `Task` can only be built through [`Task::create`] (or deserialised from
//! the store and then checked with [`Task::check`]), so every task in memory
//! has a non-empty title, clean tags, and a `completed_at` that agrees with
//! its status. Fields are read through accessors; mutation goes through the
//! task manager.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::due;
use crate::error::{Result, TaskError};
use crate::fields::*;

/// A single unit of tracked work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: u64,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    status: Status,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

/// Input for a new task. Only `title` is required.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub tags: Vec<String>,
    pub project: Option<String>,
    /// A due-date expression, resolved by the manager.
    pub due: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// A partial update. `None` leaves a field untouched; for the optional
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    /// Replaces the whole tag set.
    pub tags: Option<Vec<String>>,
    pub project: Option<Option<String>>,
    /// A due-date expression, or `Some(None)` to clear the due date.
    pub due: Option<Option<String>>,
}

impl TaskPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// True when the patch supplies no field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.tags.is_none()
            && self.project.is_none()
            && self.due.is_none()
    }
}

impl Task {
    /// Build a validated task. `due_date` must already be resolved.
    pub fn create(id: u64, new: &NewTask, due_date: Option<NaiveDate>, now: DateTime<Utc>) -> Result<Task> {
        let status = new.status.unwrap_or_default();
        Ok(Task {
            id,
            title: normalise_title(&new.title)?,
            description: new.description.clone().unwrap_or_default(),
            priority: new.priority.unwrap_or_default(),
            status,
            tags: normalise_tags(&new.tags),
            project: normalise_project(new.project.as_deref()),
            due_date,
            created_at: now,
            updated_at: now,
            completed_at: (status == Status::Completed).then_some(now),
        })
    }

    /// Apply a patch whose due expression (if any) has been resolved into
    /// `due_date`. Validation happens before any field changes, so an error
    /// leaves the task untouched.
    pub(crate) fn apply(&mut self, patch: &TaskPatch, due_date: Option<Option<NaiveDate>>, now: DateTime<Utc>) -> Result<()> {
        let title = patch.title.as_deref().map(normalise_title).transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(tags) = &patch.tags {
            self.tags = normalise_tags(tags);
        }
        if let Some(project) = &patch.project {
            self.project = normalise_project(project.as_deref());
        }
        if let Some(due_date) = due_date {
            self.due_date = due_date;
        }
        if let Some(status) = patch.status {
            self.transition(status, now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Move to `status`, stamping `completed_at` on the way into completed
    /// (keeping an earlier stamp) and clearing it on the way out.
    fn transition(&mut self, status: Status, now: DateTime<Utc>) {
        if status == Status::Completed {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
        self.status = status;
    }

    /// Check the invariants of a record that did not come through `create`,
    /// e.g. one read back from disk.
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.id == 0 {
            return Err("task id must be positive".into());
        }
        match normalise_title(&self.title) {
            Ok(title) if title == self.title => {}
            Ok(_) => return Err(format!("task {} has a padded title", self.id)),
            Err(_) => return Err(format!("task {} has an empty title", self.id)),
        }
        if normalise_project(self.project.as_deref()) != self.project {
            return Err(format!("task {} has a blank or padded project", self.id));
        }
        if normalise_tags(&self.tags) != self.tags {
            return Err(format!("task {} has empty, padded or duplicate tags", self.id));
        }
        if (self.status == Status::Completed) != self.completed_at.is_some() {
            return Err(format!(
                "task {} has status {} but completed_at is {}",
                self.id,
                self.status,
                if self.completed_at.is_some() { "set" } else { "missing" }
            ));
        }
        Ok(())
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        due::is_overdue(self.due_date, self.status, today)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

/// Trim a title, rejecting it if nothing is left.
pub fn normalise_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::InvalidTitle);
    }
    Ok(title.to_string())
}

/// Trim each tag, drop empties, and de-duplicate keeping first-seen order.
/// Comparison is case-sensitive.
pub fn normalise_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Split comma-separated tag arguments, as typed on the command line.
pub fn split_tags(inputs: &[String]) -> Vec<String> {
    let parts: Vec<&str> = inputs.iter().flat_map(|raw| raw.split(',')).collect();
    normalise_tags(&parts)
}

fn normalise_project(project: Option<&str>) -> Option<String> {
    project.map(str::trim).filter(|p| !p.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap()
    }

    #[test]
    fn create_applies_defaults() {
        let task = Task::create(1, &NewTask::new("  Write report  "), None, now()).unwrap();
        assert_eq!(task.title(), "Write report");
        assert_eq!(task.description(), "");
        assert_eq!(task.priority(), Priority::Medium);
        assert_eq!(task.status(), Status::Pending);
        assert!(task.tags().is_empty());
        assert_eq!(task.project(), None);
        assert_eq!(task.created_at(), task.updated_at());
        assert_eq!(task.completed_at(), None);
    }

    #[test]
    fn blank_title_is_rejected() {
        for title in ["", "   ", "\t\n"] {
            assert!(matches!(
                Task::create(1, &NewTask::new(title), None, now()),
                Err(TaskError::InvalidTitle)
            ));
        }
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated_in_order() {
        let tags = normalise_tags(&[" work", "urgent", "", "work", "Work", "  "]);
        assert_eq!(tags, vec!["work", "urgent", "Work"]);
    }

    #[test]
    fn split_tags_accepts_commas() {
        let tags = split_tags(&["a, b".to_string(), "b,c,".to_string()]);
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn created_completed_task_is_stamped() {
        let new = NewTask {
            status: Some(Status::Completed),
            ..NewTask::new("done already")
        };
        let task = Task::create(1, &new, None, now()).unwrap();
        assert_eq!(task.completed_at(), Some(now()));
        assert!(task.check().is_ok());
    }

    #[test]
    fn blank_project_becomes_absent() {
        let new = NewTask {
            project: Some("   ".into()),
            ..NewTask::new("t")
        };
        assert_eq!(Task::create(1, &new, None, now()).unwrap().project(), None);
    }

    #[test]
    fn completion_stamp_is_kept_until_leaving_completed() {
        let mut task = Task::create(1, &NewTask::new("t"), None, now()).unwrap();
        let later = now() + chrono::Duration::hours(1);
        let even_later = now() + chrono::Duration::hours(2);

        task.apply(&TaskPatch::status(Status::Completed), None, later).unwrap();
        assert_eq!(task.completed_at(), Some(later));

        task.apply(&TaskPatch::status(Status::Completed), None, even_later).unwrap();
        assert_eq!(task.completed_at(), Some(later));

        task.apply(&TaskPatch::status(Status::Pending), None, even_later).unwrap();
        assert_eq!(task.completed_at(), None);
    }

    #[test]
    fn invalid_patch_leaves_task_untouched() {
        let mut task = Task::create(1, &NewTask::new("t"), None, now()).unwrap();
        let before = task.clone();
        let patch = TaskPatch {
            title: Some("  ".into()),
            priority: Some(Priority::High),
            ..TaskPatch::default()
        };
        assert!(matches!(task.apply(&patch, None, now()), Err(TaskError::InvalidTitle)));
        assert_eq!(task, before);
    }

    #[test]
    fn check_flags_inconsistent_records() {
        let json = r#"{
            "id": 3, "title": "x", "status": "completed",
            "created_at": "2025-01-10T09:30:00Z", "updated_at": "2025-01-10T09:30:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.check().is_err());

        let json = r#"{
            "id": 3, "title": "x", "tags": ["a", "a"],
            "created_at": "2025-01-10T09:30:00Z", "updated_at": "2025-01-10T09:30:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.check().is_err());
    }

    #[test]
    fn check_requires_trimmed_title_and_project() {
        let record = |fields: &str| -> Task {
            let json = format!(
                r#"{{"id": 4, {fields},
                    "created_at": "2025-01-10T09:30:00Z", "updated_at": "2025-01-10T09:30:00Z"}}"#
            );
            serde_json::from_str(&json).unwrap()
        };
        assert!(record(r#""title": "x", "project": "home""#).check().is_ok());
        assert!(record(r#""title": "  x  ""#).check().is_err());
        assert!(record(r#""title": "x", "project": """#).check().is_err());
        assert!(record(r#""title": "x", "project": " home ""#).check().is_err());
    }
}
