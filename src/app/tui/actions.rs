use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use ratatui::widgets::TableState;

use crate::config::Options;
use crate::db::{Database, FileState, Status, Update};

use super::super::files::{CONTINUE_EXCLUDES, enumerate, first_outstanding};
use super::super::tracking::Tracker;
use super::super::outcome_message;
use super::TuiAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TuiRow {
    pub(crate) name: String,
    pub(crate) status: Status,
    pub(crate) resume: Option<u64>,
}

pub(crate) fn load_rows(db: &Database, dir: &Path, opts: &Options) -> Result<Vec<TuiRow>> {
    let names = enumerate(dir, opts)?;
    let record = db.load(dir)?;
    Ok(names
        .into_iter()
        .map(|name| TuiRow {
            status: record.status(&name),
            resume: record.resume_seconds(&name),
            name,
        })
        .collect())
}

pub(super) fn refresh_items(
    db: &Database,
    dir: &Path,
    opts: &Options,
    items: &mut Vec<TuiRow>,
    table_state: &mut TableState,
    preferred: Option<&str>,
) -> Result<()> {
    *items = load_rows(db, dir, opts)?;
    if items.is_empty() {
        table_state.select(None);
        return Ok(());
    }

    if let Some(name) = preferred
        && let Some(idx) = items.iter().position(|item| item.name == name)
    {
        table_state.select(Some(idx));
        return Ok(());
    }

    match table_state.selected() {
        Some(selected) => table_state.select(Some(selected.min(items.len() - 1))),
        None => table_state.select(Some(0)),
    }
    Ok(())
}

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

/// File an action applies to: the next unfinished one for `Next`, the
/// highlighted row otherwise.
pub(crate) fn action_target(
    items: &[TuiRow],
    selected: Option<usize>,
    action: TuiAction,
) -> Option<String> {
    if action == TuiAction::Next {
        return first_outstanding(
            items.iter().map(|item| (item.name.as_str(), item.status)),
            CONTINUE_EXCLUDES,
        )
        .map(str::to_string);
    }
    selected
        .and_then(|idx| items.get(idx))
        .map(|item| item.name.clone())
}

pub(super) fn play_file(tracker: &Tracker<'_>, dir: &Path, name: &str) -> Result<String> {
    let outcome = tracker.play(dir, name)?;
    Ok(outcome_message(name, outcome))
}

pub(super) fn set_state(db: &Database, dir: &Path, name: &str, update: Update) -> Result<String> {
    let verb = match update {
        Update::Set(FileState::Done) => "Marked",
        Update::Set(FileState::Skip) => "Skipped",
        Update::Set(FileState::Playing(_)) | Update::Unmark => "Unmarked",
    };
    db.update(dir, BTreeMap::from([(name.to_string(), update)]))?;
    Ok(format!("{verb} {name}."))
}
