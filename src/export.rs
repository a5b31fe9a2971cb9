//! CSV export of the task collection.

use std::io;
use std::path::Path;

use crate::task::Task;

const HEADER: [&str; 11] = [
    "id",
    "title",
    "description",
    "priority",
    "status",
    "project",
    "tags",
    "due_date",
    "created_at",
    "updated_at",
    "completed_at",
];

/// Write `tasks` as CSV with a header row. Tags are flattened into one
/// comma-separated cell; absent values are empty cells.
pub fn export_csv<W: io::Write>(tasks: &[&Task], out: W) -> csv::Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADER)?;
    for task in tasks {
        writer.write_record([
            task.id().to_string(),
            task.title().to_string(),
            task.description().to_string(),
            task.priority().to_string(),
            task.status().to_string(),
            task.project().unwrap_or_default().to_string(),
            task.tags().join(","),
            task.due_date().map(|d| d.to_string()).unwrap_or_default(),
            task.created_at().to_rfc3339(),
            task.updated_at().to_rfc3339(),
            task.completed_at().map(|d| d.to_rfc3339()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(tasks.len())
}

/// Export to a file, replacing it if it exists.
pub fn export_csv_file(tasks: &[&Task], path: &Path) -> csv::Result<usize> {
    let file = std::fs::File::create(path)?;
    export_csv(tasks, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;
    use crate::task::NewTask;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn tasks() -> Vec<Task> {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let tagged = NewTask {
            description: Some("has a, comma".into()),
            tags: vec!["a".into(), "b".into()],
            project: Some("home".into()),
            status: Some(Status::Completed),
            ..NewTask::new("Tagged")
        };
        vec![
            Task::create(1, &tagged, NaiveDate::from_ymd_opt(2025, 1, 12), now).unwrap(),
            Task::create(2, &NewTask::new("Bare"), None, now).unwrap(),
        ]
    }

    #[test]
    fn writes_header_and_flattened_rows() {
        let tasks = tasks();
        let refs: Vec<&Task> = tasks.iter().collect();
        let mut buf = Vec::new();
        assert_eq!(export_csv(&refs, &mut buf).unwrap(), 2);

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), HEADER.to_vec());

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][2], "has a, comma");
        assert_eq!(&rows[0][6], "a,b");
        assert_eq!(&rows[0][7], "2025-01-12");
        assert_eq!(&rows[0][10], "2025-01-10T09:00:00+00:00");
        assert_eq!(&rows[1][5], "");
        assert_eq!(&rows[1][6], "");
        assert_eq!(&rows[1][10], "");
    }
}
