use std::env;
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, Stdio};

use tracing::{debug, warn};

use crate::config::PlayerKind;
use crate::error::Error;
use crate::paths::vlc_recents_file;

use super::history::{parse_mpv_status, read_vlc_recents};
use super::playback::{Player, PlayerReport};
use super::process::{run_interactive_cmd, with_sigint_ignored};

/// VLC or mpv, launched as a child process.
#[derive(Debug, Clone)]
pub(crate) struct ExternalPlayer {
    kind: PlayerKind,
    bin: PathBuf,
    recents: Option<PathBuf>,
}

impl ExternalPlayer {
    pub(crate) fn new(kind: PlayerKind) -> Self {
        Self::with_paths(
            kind,
            resolve_player_bin_from_env(kind, env::var_os("MTRACK_PLAYER_BIN")),
            vlc_recents_file(),
        )
    }

    pub(crate) fn with_paths(kind: PlayerKind, bin: PathBuf, recents: Option<PathBuf>) -> Self {
        Self { kind, bin, recents }
    }
}

pub(crate) fn resolve_player_bin_from_env(kind: PlayerKind, env_value: Option<OsString>) -> PathBuf {
    match env_value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(kind.command()),
    }
}

pub(crate) fn player_args(kind: PlayerKind, file: &Path, offset: u64) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--fullscreen".into()];
    match kind {
        PlayerKind::Vlc => {
            args.push("--play-and-exit".into());
            if offset > 0 {
                args.push("--start-time".into());
                args.push(offset.to_string().into());
            }
        }
        PlayerKind::Mpv => {
            if offset > 0 {
                args.push(format!("--start={offset}").into());
            }
        }
    }
    args.push("--".into());
    args.push(file.as_os_str().to_os_string());
    args
}

impl Player for ExternalPlayer {
    fn launch(&self, file: &Path, offset: u64) -> Result<PlayerReport, Error> {
        let mut cmd = ProcessCommand::new(&self.bin);
        cmd.args(player_args(self.kind, file, offset))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit());
        match self.kind {
            PlayerKind::Vlc => cmd.stderr(Stdio::inherit()),
            PlayerKind::Mpv => cmd.stderr(Stdio::piped()),
        };
        debug!(player = %self.bin.display(), file = %file.display(), offset, "launching player");

        let finished = with_sigint_ignored(|| run_interactive_cmd(cmd)).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                Error::PlayerNotFound {
                    player: self.bin.clone(),
                }
            } else {
                Error::io(&self.bin, err)
            }
        })?;
        // A player killed by a signal has no exit code; its last position
        // is still reconciled like a normal exit.
        match finished.status.code() {
            Some(0) => {}
            Some(_) => {
                return Err(Error::PlayerExitedAbnormally {
                    file: display_name(file),
                    status: finished.status,
                });
            }
            None => debug!(status = %finished.status, "player terminated by signal"),
        }

        Ok(match self.kind {
            PlayerKind::Vlc => {
                let Some(recents) = self.recents.as_deref() else {
                    return Ok(PlayerReport::Recorded(None));
                };
                let read = read_vlc_recents(recents);
                for warning in &read.warnings {
                    warn!("{warning}");
                }
                PlayerReport::Recorded(read.times.get(&*file.to_string_lossy()).copied())
            }
            PlayerKind::Mpv => match finished.stderr_tail.as_deref().and_then(parse_mpv_status) {
                Some((elapsed, total)) => PlayerReport::Status { elapsed, total },
                None => PlayerReport::NoStatus,
            },
        })
    }
}

fn display_name(file: &Path) -> String {
    file.file_name()
        .unwrap_or_else(|| OsStr::new(""))
        .to_string_lossy()
        .into_owned()
}
