use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub fn config_dir() -> Result<PathBuf> {
    match config_dir_from_env(env::var_os("MTRACK_HOME")) {
        Some(dir) => Ok(dir),
        None => {
            let home = dirs::home_dir().context("unable to resolve home directory")?;
            Ok(home.join(".mtrack"))
        }
    }
}

pub fn config_dir_from_env(env_value: Option<OsString>) -> Option<PathBuf> {
    match env_value {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

pub fn config_file(config_dir: &std::path::Path) -> PathBuf {
    config_dir.join("config.json")
}

/// Directory the user is looking at in their shell.
///
/// `$PWD` keeps symlinked components that `current_dir` resolves away; it is
/// only trusted when it points at the same directory.
pub fn working_dir() -> Result<PathBuf> {
    let cwd = env::current_dir().context("unable to resolve current directory")?;
    Ok(working_dir_from_env(env::var_os("PWD"), cwd))
}

pub fn working_dir_from_env(pwd: Option<OsString>, cwd: PathBuf) -> PathBuf {
    let Some(pwd) = pwd.filter(|value| !value.is_empty()).map(PathBuf::from) else {
        return cwd;
    };
    if !pwd.is_absolute() {
        return cwd;
    }
    let same = match (fs::canonicalize(&pwd), fs::canonicalize(&cwd)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    };
    if same { pwd } else { cwd }
}

pub fn vlc_recents_file() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("vlc").join("vlc-qt-interface.conf"))
}

pub fn kodi_database_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".kodi").join("userdata").join("Database"))
}
