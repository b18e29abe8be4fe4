use std::collections::BTreeMap;
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::db::{Database, FileState, Update};
use crate::error::Error;

/// A path with either an implicit done state or a resume point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceRecord {
    pub(crate) path: String,
    pub(crate) seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImportKind {
    Watched,
    Playing,
}

#[derive(Debug, Clone)]
pub(crate) struct Rewrite {
    pub(crate) pattern: Regex,
    pub(crate) replacement: String,
    pub(crate) all: bool,
}

impl Rewrite {
    pub(crate) fn new(pattern: &str, replacement: &str, all: bool) -> Result<Self, Error> {
        Ok(Self {
            pattern: compile(pattern)?,
            replacement: replacement.to_string(),
            all,
        })
    }

    fn apply(&self, path: &str) -> String {
        if self.all {
            self.pattern
                .replace_all(path, self.replacement.as_str())
                .into_owned()
        } else {
            self.pattern
                .replace(path, self.replacement.as_str())
                .into_owned()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ImportFilter {
    pub(crate) include: Option<Regex>,
    pub(crate) exclude: Option<Regex>,
    pub(crate) rewrites: Vec<Rewrite>,
}

impl ImportFilter {
    pub(crate) fn new(
        include: Option<&str>,
        exclude: Option<&str>,
        mut rewrites: Vec<Rewrite>,
    ) -> Result<Self, Error> {
        // First-occurrence rewrites before replace-all ones, each group in order.
        rewrites.sort_by_key(|rewrite| rewrite.all);
        Ok(Self {
            include: include.map(compile).transpose()?,
            exclude: exclude.map(compile).transpose()?,
            rewrites,
        })
    }

    pub(crate) fn accepts(&self, path: &str) -> bool {
        if self.exclude.as_ref().is_some_and(|re| re.is_match(path)) {
            return false;
        }
        self.include.as_ref().is_none_or(|re| re.is_match(path))
    }

    pub(crate) fn rewrite(&self, path: &str) -> String {
        self.rewrites
            .iter()
            .fold(path.to_string(), |current, rewrite| rewrite.apply(&current))
    }
}

fn compile(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ImportSummary {
    pub(crate) files: usize,
    pub(crate) dirs: usize,
}

pub(crate) type Staged = BTreeMap<PathBuf, BTreeMap<String, Update>>;

/// Filter and rewrite records, grouping the resulting updates by directory.
pub(crate) fn stage_records<I>(records: I, filter: &ImportFilter) -> Result<Staged, Error>
where
    I: IntoIterator<Item = SourceRecord>,
{
    let mut staged = Staged::new();
    for record in records {
        if !filter.accepts(&record.path) {
            debug!(path = %record.path, "import record filtered out");
            continue;
        }
        let rewritten = PathBuf::from(filter.rewrite(&record.path));
        if !rewritten.is_absolute() {
            return Err(Error::RelativePath { path: rewritten });
        }
        let (Some(parent), Some(name)) = (rewritten.parent(), rewritten.file_name()) else {
            return Err(Error::NotAFile { path: rewritten });
        };
        let update = match record.seconds {
            None => Update::Set(FileState::Done),
            Some(seconds) => Update::playing(seconds),
        };
        staged
            .entry(parent.to_path_buf())
            .or_default()
            .insert(name.to_string_lossy().into_owned(), update);
    }
    Ok(staged)
}

/// One database update per directory.
pub(crate) fn import_records<I>(
    db: &Database,
    records: I,
    filter: &ImportFilter,
) -> Result<ImportSummary, Error>
where
    I: IntoIterator<Item = SourceRecord>,
{
    let staged = stage_records(records, filter)?;
    let mut summary = ImportSummary { files: 0, dirs: 0 };
    for (dir, changes) in staged {
        summary.files += changes.len();
        summary.dirs += 1;
        db.update(&dir, changes)?;
    }
    Ok(summary)
}

/// `PATH` lines for watched, `SECONDS PATH` lines for playing; blank lines
/// are ignored.
pub(crate) fn parse_text_records<R: BufRead>(
    reader: R,
    kind: ImportKind,
) -> Result<Vec<SourceRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("failed to read import input")?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        let record = match kind {
            ImportKind::Watched => SourceRecord {
                path: line.to_string(),
                seconds: None,
            },
            ImportKind::Playing => {
                let (seconds, path) = line
                    .trim_start()
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("line {}: expected 'SECONDS PATH'", idx + 1))?;
                let seconds = parse_seconds(seconds)
                    .ok_or_else(|| anyhow!("line {}: invalid seconds '{seconds}'", idx + 1))?;
                SourceRecord {
                    path: path.trim_start().to_string(),
                    seconds: Some(seconds),
                }
            }
        };
        records.push(record);
    }
    Ok(records)
}

/// Whole or fractional seconds, truncated.
fn parse_seconds(raw: &str) -> Option<u64> {
    let value = raw.parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0).then(|| value as u64)
}

const KODI_WATCHED_SQL: &str = r#"
    SELECT p.strPath || f.strFileName AS fp
    FROM files f
    JOIN path p ON p.idPath = f.idPath
    WHERE f.playCount > 0
    ORDER BY fp
"#;

const KODI_PLAYING_SQL: &str = r#"
    SELECT p.strPath || f.strFileName AS fp, b.timeInSeconds
    FROM bookmark b
    JOIN files f ON f.idFile = b.idFile
    JOIN path p ON p.idPath = f.idPath
    WHERE b.type = 1
    ORDER BY fp
"#;

/// Newest `MyVideos<N>.db` in `dir`.
pub(crate) fn find_kodi_database(dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read Kodi database dir {}", dir.display()))?;
    let mut best = None::<(u32, PathBuf)>;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(version) = name
            .to_str()
            .and_then(|name| name.strip_prefix("MyVideos"))
            .and_then(|rest| rest.strip_suffix(".db"))
            .and_then(|version| version.parse::<u32>().ok())
        else {
            continue;
        };
        if best.as_ref().is_none_or(|(current, _)| version > *current) {
            best = Some((version, entry.path()));
        }
    }
    best.map(|(_, path)| path)
        .ok_or_else(|| anyhow!("no MyVideos database found in {}", dir.display()))
}

pub(crate) fn kodi_records(db_path: &Path, kind: ImportKind) -> Result<Vec<SourceRecord>> {
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open Kodi database at {}", db_path.display()))?;
    let records = match kind {
        ImportKind::Watched => {
            let mut stmt = conn.prepare(KODI_WATCHED_SQL)?;
            let rows = stmt.query_map([], |row| {
                Ok(SourceRecord {
                    path: row.get(0)?,
                    seconds: None,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
        ImportKind::Playing => {
            let mut stmt = conn.prepare(KODI_PLAYING_SQL)?;
            let rows = stmt.query_map([], |row| {
                let seconds: f64 = row.get(1)?;
                Ok(SourceRecord {
                    path: row.get(0)?,
                    seconds: Some(seconds.max(0.0) as u64),
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
    };
    Ok(records)
}
