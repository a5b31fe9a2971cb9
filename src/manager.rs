//! The task manager: sole owner of the task collection.
//!
//! Every mutation validates, resolves due dates against the manager's clock,
//! and saves before returning. If the save fails the in-memory collection is
//! put back the way it was, so nothing is visible to later queries unless it
//! is also on disk.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::db::Store;
use crate::due;
use crate::error::{Result, TaskError};
use crate::fields::Status;
use crate::query::Query;
use crate::task::{NewTask, Task, TaskPatch};

pub struct TaskManager {
    store: Store,
    tasks: Vec<Task>,
    clock: Box<dyn Clock>,
    load_warning: Option<TaskError>,
}

impl TaskManager {
    /// Open the task file at `path` using the wall clock.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with_clock(path, Box::new(SystemClock))
    }

    pub fn open_with_clock(path: impl Into<PathBuf>, clock: Box<dyn Clock>) -> Self {
        let store = Store::new(path);
        let loaded = store.load();
        TaskManager {
            store,
            tasks: loaded.tasks,
            clock,
            load_warning: loaded.warning,
        }
    }

    /// The recoverable problem hit while loading, if any. Returned once.
    pub fn take_load_warning(&mut self) -> Option<TaskError> {
        self.load_warning.take()
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Read-only queries over the current collection, as of today.
    pub fn query(&self) -> Query<'_> {
        Query::new(&self.tasks, self.clock.today())
    }

    /// One more than the highest id in the collection, or 1 when empty.
    pub fn next_id(&self) -> Result<u64> {
        let max = self.tasks.iter().map(|t| t.id()).max().unwrap_or(0);
        max.checked_add(1).ok_or(TaskError::IdsExhausted(max))
    }

    fn position(&self, id: u64) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id() == id)
            .ok_or(TaskError::TaskNotFound(id))
    }

    /// Validate, stamp and persist a new task.
    pub fn add(&mut self, new: NewTask) -> Result<Task> {
        let due_date = new
            .due
            .as_deref()
            .map(|expr| due::resolve(expr, self.clock.today()))
            .transpose()?;
        let task = Task::create(self.next_id()?, &new, due_date, self.clock.now())?;

        self.tasks.push(task.clone());
        if let Err(e) = self.store.save(&self.tasks) {
            self.tasks.pop();
            return Err(e);
        }
        info!(id = task.id(), title = task.title(), "added task");
        Ok(task)
    }

    /// Change only the fields present in `patch`. `updated_at` is refreshed
    /// even when the patch is empty.
    pub fn update(&mut self, id: u64, patch: TaskPatch) -> Result<Task> {
        let idx = self.position(id)?;
        let due_date = match &patch.due {
            Some(Some(expr)) => Some(Some(due::resolve(expr, self.clock.today())?)),
            Some(None) => Some(None),
            None => None,
        };

        let mut updated = self.tasks[idx].clone();
        updated.apply(&patch, due_date, self.clock.now())?;

        let previous = std::mem::replace(&mut self.tasks[idx], updated.clone());
        if let Err(e) = self.store.save(&self.tasks) {
            self.tasks[idx] = previous;
            return Err(e);
        }
        info!(id, status = %updated.status(), "updated task");
        Ok(updated)
    }

    pub fn set_status(&mut self, id: u64, status: Status) -> Result<Task> {
        self.update(id, TaskPatch::status(status))
    }

    /// Remove a task. Remaining ids are not renumbered.
    pub fn delete(&mut self, id: u64) -> Result<Task> {
        let idx = self.position(id)?;
        let removed = self.tasks.remove(idx);
        if let Err(e) = self.store.save(&self.tasks) {
            self.tasks.insert(idx, removed);
            return Err(e);
        }
        info!(id, "deleted task");
        Ok(removed)
    }

    /// Remove every completed task in one save. Returns how many went.
    pub fn clear_completed(&mut self) -> Result<usize> {
        let before = self.tasks.clone();
        self.tasks.retain(|t| t.status() != Status::Completed);
        let removed = before.len() - self.tasks.len();
        if removed == 0 {
            return Ok(0);
        }
        if let Err(e) = self.store.save(&self.tasks) {
            self.tasks = before;
            return Err(e);
        }
        info!(removed, "cleared completed tasks");
        Ok(removed)
    }

    /// Forget every task and delete the backing file.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()?;
        self.tasks.clear();
        info!(path = %self.store.path().display(), "cleared task store");
        Ok(())
    }
}
