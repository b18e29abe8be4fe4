mod actions;
mod render;
mod session;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;

use crate::config::Options;
use crate::db::{Database, FileState, Update};

use super::tracking::Tracker;

#[cfg(test)]
pub(crate) use self::actions::{TuiRow, action_target};
use self::actions::{
    load_rows, play_file, refresh_items, set_state, status_error, status_info,
};
use self::render::draw_tui;
use self::session::TuiSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TuiAction {
    Play,
    Next,
    Mark,
    Skip,
    Unmark,
}

impl TuiAction {
    pub(crate) fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Enter | KeyCode::Char('p') => Some(Self::Play),
            KeyCode::Char('n') => Some(Self::Next),
            KeyCode::Char('m') => Some(Self::Mark),
            KeyCode::Char('s') => Some(Self::Skip),
            KeyCode::Char('u') => Some(Self::Unmark),
            _ => None,
        }
    }

    /// The record change this action makes directly; `None` for actions
    /// that launch the player.
    pub(crate) fn state_change(self) -> Option<Update> {
        match self {
            Self::Mark => Some(Update::Set(FileState::Done)),
            Self::Skip => Some(Update::Set(FileState::Skip)),
            Self::Unmark => Some(Update::Unmark),
            Self::Play | Self::Next => None,
        }
    }
}

pub(crate) fn run_tui(
    db: &Database,
    tracker: &Tracker<'_>,
    dir: &Path,
    opts: &Options,
) -> Result<()> {
    let mut session = TuiSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let mut items = load_rows(db, dir, opts)?;
    let mut table_state = TableState::default();
    table_state.select((!items.is_empty()).then_some(0));
    let mut status = if items.is_empty() {
        status_info("No media files in this directory.")
    } else {
        status_info("Ready.")
    };

    loop {
        terminal.draw(|frame| draw_tui(frame, dir, &items, &mut table_state, &status))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(selected) = table_state.selected() {
                    table_state.select(Some(selected.saturating_sub(1)));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(selected) = table_state.selected()
                    && !items.is_empty()
                {
                    let next = (selected + 1).min(items.len().saturating_sub(1));
                    table_state.select(Some(next));
                }
            }
            KeyCode::Char('r') => {
                refresh_items(db, dir, opts, &mut items, &mut table_state, None)?;
                status = status_info("Refreshed.");
            }
            code => {
                let Some(action) = TuiAction::from_key(code) else {
                    continue;
                };
                let Some(name) = actions::action_target(&items, table_state.selected(), action)
                else {
                    status = status_info("No files to play.");
                    continue;
                };

                let result = match action.state_change() {
                    Some(update) => set_state(db, dir, &name, update),
                    None => {
                        let result = session.suspended(|| play_file(tracker, dir, &name))?;
                        terminal.clear()?;
                        result
                    }
                };
                status = match result {
                    Ok(msg) => status_info(&msg),
                    Err(err) => status_error(&format!("{name}: {err:#}")),
                };
                refresh_items(db, dir, opts, &mut items, &mut table_state, Some(&name))?;
            }
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}
