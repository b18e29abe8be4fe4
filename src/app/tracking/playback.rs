use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::Path;

use tracing::info;

use crate::db::{Database, FileState, Update};
use crate::error::Error;

use super::super::display::format_time;

/// Seconds rewound before a stored resume point.
pub(crate) const RESUME_BACKOFF: u64 = 5;
/// Positions this close to the end count as finished.
pub(crate) const COMPLETION_MARGIN: u64 = 5;

/// What the player could tell us once it exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayerReport {
    /// Position from the player's own recent-files record, if listed there.
    Recorded(Option<u64>),
    /// Last `elapsed / total` status printed by the player.
    Status { elapsed: u64, total: u64 },
    /// No recognizable status output.
    NoStatus,
}

pub(crate) trait Player {
    /// Play `file` from `offset` seconds, blocking until the player exits.
    fn launch(&self, file: &Path, offset: u64) -> Result<PlayerReport, Error>;
}

pub(crate) trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Asks on stdin; anything not starting with `n` means yes.
#[derive(Debug, Default)]
pub(crate) struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [Yn]? ");
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return true;
        }
        !answer.trim().to_lowercase().starts_with('n')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reconciled {
    Continuing(u64),
    Finished,
    Unmarked,
}

impl Reconciled {
    pub(crate) fn update(self) -> Update {
        match self {
            Self::Continuing(seconds) => Update::playing(seconds),
            Self::Finished => Update::Set(FileState::Done),
            Self::Unmarked => Update::Unmark,
        }
    }
}

pub(crate) fn compute_start_offset(stored: Option<u64>, backoff: u64) -> u64 {
    stored.map_or(0, |seconds| seconds.saturating_sub(backoff))
}

pub(crate) fn reconcile(report: PlayerReport, confirm: &dyn Confirm) -> Reconciled {
    match report {
        PlayerReport::Recorded(Some(seconds)) if seconds > 0 => Reconciled::Continuing(seconds),
        // Finished and barely started look the same in VLC's record.
        PlayerReport::Recorded(_) => {
            if confirm.confirm("Done") {
                Reconciled::Finished
            } else {
                Reconciled::Unmarked
            }
        }
        PlayerReport::Status { elapsed, total }
            if total > 0 && elapsed.saturating_add(COMPLETION_MARGIN) > total =>
        {
            Reconciled::Finished
        }
        PlayerReport::Status { elapsed: 0, .. } => Reconciled::Unmarked,
        PlayerReport::Status { elapsed, .. } => Reconciled::Continuing(elapsed),
        PlayerReport::NoStatus => Reconciled::Finished,
    }
}

/// Plays files and records where playback stopped.
pub(crate) struct Tracker<'a> {
    db: &'a Database,
    player: &'a dyn Player,
    confirm: &'a dyn Confirm,
}

impl<'a> Tracker<'a> {
    pub(crate) fn new(db: &'a Database, player: &'a dyn Player, confirm: &'a dyn Confirm) -> Self {
        Self {
            db,
            player,
            confirm,
        }
    }

    /// Launch, then reconcile. A failed launch leaves the record untouched.
    pub(crate) fn play(&self, dir: &Path, name: &str) -> Result<Reconciled, Error> {
        let record = self.db.load(dir)?;
        let stored = record.resume_seconds(name);
        match stored {
            Some(seconds) => println!("Playing {name} from {}...", format_time(seconds)),
            None => println!("Playing {name}..."),
        }

        let offset = compute_start_offset(stored, RESUME_BACKOFF);
        let report = self.player.launch(&dir.join(name), offset)?;
        let outcome = reconcile(report, self.confirm);
        info!(file = name, ?report, ?outcome, "playback reconciled");

        self.db
            .update(dir, BTreeMap::from([(name.to_string(), outcome.update())]))?;
        Ok(outcome)
    }
}
