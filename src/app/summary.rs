use std::path::Path;

use crate::config::Options;
use crate::db::{Database, DirectoryRecord, FileState, Status};
use crate::error::Error;

use super::files::{enumerate, enumerate_dirs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Summary {
    /// No sidecar record exists yet.
    Unindexed,
    Counts { playing: usize, new: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DirSummary {
    pub(crate) name: String,
    pub(crate) summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TodoEntry {
    pub(crate) dir: String,
    pub(crate) playing: usize,
    pub(crate) new: usize,
}

#[derive(Debug, Default)]
pub(crate) struct TodoReport {
    pub(crate) entries: Vec<TodoEntry>,
    /// Known directories that are gone or unreadable.
    pub(crate) ignored: Vec<String>,
}

pub(crate) fn count_outstanding(names: &[String], record: &DirectoryRecord) -> (usize, usize) {
    names.iter().fold((0, 0), |(playing, new), name| {
        match record.status(name) {
            Status::Playing => (playing + 1, new),
            Status::New => (playing, new + 1),
            Status::Done | Status::Skip => (playing, new),
        }
    })
}

pub(crate) fn summarize(db: &Database, dir: &Path, opts: &Options) -> Result<Summary, Error> {
    if !db.is_indexed(dir) {
        return Ok(Summary::Unindexed);
    }
    let record = db.load(dir)?;
    let names = enumerate(dir, opts)?;
    let (playing, new) = count_outstanding(&names, &record);
    Ok(Summary::Counts { playing, new })
}

pub(crate) fn list_dirs(db: &Database, dir: &Path, opts: &Options) -> Result<Vec<DirSummary>, Error> {
    enumerate_dirs(dir, opts)?
        .into_iter()
        .map(|name| {
            let summary = summarize(db, &dir.join(&name), opts)?;
            Ok(DirSummary { name, summary })
        })
        .collect()
}

/// Directories with playing or new files, counted against the records as
/// given rather than reloaded from disk.
///
/// New files have no entry in a record, so each directory's current media
/// listing is still needed to count them.
pub(crate) fn todo_directories<F>(
    records: &[DirectoryRecord],
    opts: &Options,
    exists: F,
) -> TodoReport
where
    F: Fn(&Path) -> bool,
{
    let mut report = TodoReport::default();
    for record in records {
        let dir = Path::new(&record.dir);
        if !exists(dir) {
            report.ignored.push(record.dir.clone());
            continue;
        }
        let names = match enumerate(dir, opts) {
            Ok(names) => names,
            Err(_) => {
                report.ignored.push(record.dir.clone());
                continue;
            }
        };
        let (playing, new) = count_outstanding(&names, record);
        if playing + new > 0 {
            report.entries.push(TodoEntry {
                dir: record.dir.clone(),
                playing,
                new,
            });
        }
    }
    report
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StateEntry {
    pub(crate) dir: String,
    pub(crate) file: String,
    pub(crate) state: FileState,
}

/// Every stored file with the given status across all records.
pub(crate) fn files_with_status(records: &[DirectoryRecord], status: Status) -> Vec<StateEntry> {
    records
        .iter()
        .flat_map(|record| {
            record
                .files
                .iter()
                .filter(move |(_, state)| Status::of(Some(*state)) == status)
                .map(move |(file, state)| StateEntry {
                    dir: record.dir.clone(),
                    file: file.clone(),
                    state: *state,
                })
        })
        .collect()
}
