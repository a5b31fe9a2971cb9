//! File-backed storage for the task collection.
//!
//! The store is a single JSON file holding an array of task records. Loading
//! never fails: a missing file is a first run and yields no tasks, and an
//! unreadable or corrupted file yields no tasks plus a warning, after being
//! copied to `<name>.corrupt`. Saving goes through a temporary file and a
//! rename so the previous content survives a failed write.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, TaskError};
use crate::task::Task;

/// Outcome of reading the store.
#[derive(Debug, Default)]
pub struct Loaded {
    pub tasks: Vec<Task>,
    /// Set when the file existed but had to be discarded.
    pub warning: Option<TaskError>,
}

fn write_json(path: &Path, tasks: &[Task]) -> io::Result<()> {
    let mut f = File::create(path)?;
    let data = serde_json::to_string_pretty(tasks)?;
    f.write_all(data.as_bytes())?;
    f.sync_all()
}

/// Location of the task file on disk.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every task, falling back to an empty collection when the file is
    /// absent or any part of it is unusable.
    pub fn load(&self) -> Loaded {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no task store yet, starting empty");
            return Loaded::default();
        }
        match self.read_tasks() {
            Ok(tasks) => {
                debug!(path = %self.path.display(), count = tasks.len(), "loaded tasks");
                Loaded { tasks, warning: None }
            }
            Err(reason) => {
                warn!(path = %self.path.display(), %reason, "task store unusable, starting fresh");
                self.keep_corrupt_copy();
                Loaded {
                    tasks: Vec::new(),
                    warning: Some(TaskError::PersistenceReadFailure {
                        path: self.path.clone(),
                        reason,
                    }),
                }
            }
        }
    }

    fn read_tasks(&self) -> std::result::Result<Vec<Task>, String> {
        let buf = fs::read_to_string(&self.path).map_err(|e| e.to_string())?;
        let tasks: Vec<Task> = serde_json::from_str(&buf).map_err(|e| e.to_string())?;

        let mut seen = HashSet::with_capacity(tasks.len());
        for task in &tasks {
            task.check()?;
            if !seen.insert(task.id()) {
                return Err(format!("task id {} appears more than once", task.id()));
            }
        }
        Ok(tasks)
    }

    /// Write the full collection, replacing the file only once the new
    /// content is completely on disk.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        self.write_atomically(tasks)
            .map_err(|source| TaskError::PersistenceWriteFailure {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), count = tasks.len(), "saved tasks");
        Ok(())
    }

    fn write_atomically(&self, tasks: &[Task]) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.sibling(".tmp");
        let result = write_json(&tmp, tasks).and_then(|()| fs::rename(&tmp, &self.path));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    /// Copy an unreadable store aside so the next save cannot destroy it.
    fn keep_corrupt_copy(&self) {
        let backup = self.sibling(".corrupt");
        match fs::copy(&self.path, &backup) {
            Ok(_) => warn!(backup = %backup.display(), "kept a copy of the unreadable store"),
            Err(e) => warn!(error = %e, "could not copy the unreadable store"),
        }
    }

    /// `tasks.json` -> `tasks.json<suffix>` in the same directory.
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Delete the backing file if present.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TaskError::PersistenceWriteFailure {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, Status};
    use crate::task::NewTask;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_tasks() -> Vec<Task> {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap();
        let full = NewTask {
            description: Some("quarterly numbers".into()),
            priority: Some(Priority::High),
            status: Some(Status::Completed),
            tags: vec!["work".into(), "finance".into()],
            project: Some("reports".into()),
            ..NewTask::new("Write report")
        };
        let due = NaiveDate::from_ymd_opt(2025, 2, 1);
        vec![
            Task::create(1, &full, due, now).unwrap(),
            Task::create(2, &NewTask::new("bare"), None, now).unwrap(),
        ]
    }

    #[test]
    fn missing_file_loads_empty_without_warning() {
        let dir = TempDir::new().unwrap();
        let loaded = Store::new(dir.path().join("tasks.json")).load();
        assert!(loaded.tasks.is_empty());
        assert!(loaded.warning.is_none());
    }

    #[test]
    fn save_then_load_round_trips_every_field() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("tasks.json"));
        let tasks = sample_tasks();

        store.save(&tasks).unwrap();
        let loaded = store.load();

        assert!(loaded.warning.is_none());
        assert_eq!(loaded.tasks, tasks);
        assert!(loaded.tasks[1].tags().is_empty());
        assert_eq!(loaded.tasks[1].due_date(), None);
    }

    #[test]
    fn record_fields_use_plain_names_and_string_dates() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("tasks.json"));
        store.save(&sample_tasks()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        let first = &raw[0];
        assert_eq!(first["due_date"], "2025-02-01");
        assert_eq!(first["priority"], "high");
        assert_eq!(first["status"], "completed");
        assert!(first["created_at"].is_string());
        assert!(first["completed_at"].is_string());
        assert!(raw[1]["due_date"].is_null());
    }

    #[test]
    fn corrupted_file_loads_empty_with_warning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ this is not json").unwrap();

        let loaded = Store::new(&path).load();
        assert!(loaded.tasks.is_empty());
        assert!(matches!(
            loaded.warning,
            Some(TaskError::PersistenceReadFailure { .. })
        ));
    }

    #[test]
    fn unreadable_store_is_copied_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "[{]").unwrap();

        let store = Store::new(&path);
        store.load();
        store.save(&sample_tasks()).unwrap();

        let backup = dir.path().join("tasks.json.corrupt");
        assert_eq!(fs::read_to_string(backup).unwrap(), "[{]");
    }

    #[test]
    fn one_invalid_record_discards_the_whole_file() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("tasks.json"));
        store.save(&sample_tasks()).unwrap();

        let mut raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        raw[1]["title"] = serde_json::Value::String("   ".into());
        fs::write(store.path(), raw.to_string()).unwrap();

        let loaded = store.load();
        assert!(loaded.tasks.is_empty());
        assert!(loaded.warning.is_some());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("tasks.json"));
        let tasks = sample_tasks();
        store.save(&[tasks[1].clone(), tasks[1].clone()]).unwrap();
        assert!(store.load().warning.is_some());
    }

    #[test]
    fn unknown_priority_in_file_is_a_read_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(
            &path,
            r#"[{"id":1,"title":"x","priority":"urgent",
                "created_at":"2025-01-10T09:30:00Z","updated_at":"2025-01-10T09:30:00Z"}]"#,
        )
        .unwrap();
        assert!(Store::new(&path).load().warning.is_some());
    }

    #[test]
    fn failed_save_reports_write_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "a file, not a directory").unwrap();

        let store = Store::new(blocker.join("tasks.json"));
        assert!(matches!(
            store.save(&sample_tasks()),
            Err(TaskError::PersistenceWriteFailure { .. })
        ));
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("tasks.json"));
        store.save(&sample_tasks()).unwrap();
        assert!(!dir.path().join("tasks.json.tmp").exists());
    }

    #[test]
    fn clear_removes_file_and_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("tasks.json"));
        store.save(&sample_tasks()).unwrap();

        store.clear().unwrap();
        assert!(!store.path().exists());
        store.clear().unwrap();
    }
}
