use std::collections::BTreeSet;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_EXTS: &[&str] = &[
    ".avi", ".flac", ".m4a", ".m4v", ".mkv", ".mov", ".mp3", ".mp4", ".mpg", ".ogg", ".ogv",
    ".opus", ".wav", ".webm", ".wmv",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Vlc,
    Mpv,
}

impl PlayerKind {
    pub fn command(self) -> &'static str {
        match self {
            Self::Vlc => "vlc",
            Self::Mpv => "mpv",
        }
    }
}

/// Contents of `config.json`; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub exts: Option<Vec<String>>,
    pub player: Option<PlayerKind>,
    pub colour: Option<bool>,
    pub ignorecase: Option<bool>,
    pub numeric: Option<bool>,
    pub show_hidden: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }
}

/// Toggles given on the command line; `None` defers to the config file.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub player: Option<PlayerKind>,
    pub colour: Option<bool>,
    pub ignore_case: Option<bool>,
    pub numeric_sort: Option<bool>,
    pub show_hidden: Option<bool>,
}

/// Settings for a single command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub exts: BTreeSet<String>,
    pub player: PlayerKind,
    pub colour: bool,
    pub ignore_case: bool,
    pub numeric_sort: bool,
    pub show_hidden: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            exts: DEFAULT_EXTS.iter().map(|ext| ext.to_string()).collect(),
            player: PlayerKind::Vlc,
            colour: false,
            ignore_case: false,
            numeric_sort: false,
            show_hidden: false,
        }
    }
}

impl Options {
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Self {
        let defaults = Self::default();
        let exts = match file.exts {
            Some(exts) => exts.iter().map(|ext| normalize_ext(ext)).collect(),
            None => defaults.exts,
        };
        Self {
            exts,
            player: overrides.player.or(file.player).unwrap_or(defaults.player),
            colour: overrides
                .colour
                .or(file.colour)
                .unwrap_or_else(|| io::stdout().is_terminal()),
            ignore_case: overrides.ignore_case.or(file.ignorecase).unwrap_or(false),
            numeric_sort: overrides.numeric_sort.or(file.numeric).unwrap_or(false),
            show_hidden: overrides.show_hidden.or(file.show_hidden).unwrap_or(false),
        }
    }

    /// Whether `name` ends in one of the configured media extensions.
    pub fn is_media_name(&self, name: &str) -> bool {
        match name.rfind('.') {
            Some(idx) if idx > 0 => self.exts.contains(&name[idx..].to_lowercase()),
            _ => false,
        }
    }
}

pub fn normalize_ext(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}
