use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::error::Error;

const SKIP_SENTINEL: i64 = -1;
const READABLE_NAME_MAX: usize = 200;

/// Stored state of a file; a file without an entry is new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Done,
    Skip,
    /// Resume point in seconds, always > 0.
    Playing(u64),
}

impl FileState {
    pub fn playing(seconds: u64) -> Option<Self> {
        (seconds > 0).then_some(Self::Playing(seconds))
    }

    pub fn resume_seconds(self) -> Option<u64> {
        match self {
            Self::Playing(seconds) => Some(seconds),
            Self::Done | Self::Skip => None,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(true) => Some(Self::Done),
            Value::Number(number) => match (number.as_u64(), number.as_i64()) {
                (Some(seconds), _) if seconds > 0 => Some(Self::Playing(seconds)),
                (_, Some(SKIP_SENTINEL)) => Some(Self::Skip),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Serialize for FileState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Done => serializer.serialize_bool(true),
            Self::Skip => serializer.serialize_i64(SKIP_SENTINEL),
            Self::Playing(seconds) => serializer.serialize_u64(*seconds),
        }
    }
}

impl<'de> Deserialize<'de> for FileState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid file state {value}")))
    }
}

/// Classification of a file against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    New,
    Playing,
    Done,
    Skip,
}

impl Status {
    pub fn of(state: Option<&FileState>) -> Self {
        match state {
            None => Self::New,
            Some(FileState::Playing(_)) => Self::Playing,
            Some(FileState::Done) => Self::Done,
            Some(FileState::Skip) => Self::Skip,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Playing => "playing",
            Self::Done => "done",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "new" => Ok(Self::New),
            "playing" => Ok(Self::Playing),
            "done" => Ok(Self::Done),
            "skip" => Ok(Self::Skip),
            _ => Err(()),
        }
    }
}

/// A change applied by [`Database::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Set(FileState),
    /// Drop the entry so the file reverts to new.
    Unmark,
}

impl Update {
    /// A resume point; zero collapses to [`Update::Unmark`].
    pub fn playing(seconds: u64) -> Self {
        FileState::playing(seconds).map_or(Self::Unmark, Self::Set)
    }
}

/// Watch state for one directory, as stored in its sidecar file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryRecord {
    pub dir: String,
    pub files: BTreeMap<String, FileState>,
}

impl DirectoryRecord {
    pub fn empty(dir: &Path) -> Self {
        Self {
            dir: dir_key(dir),
            files: BTreeMap::new(),
        }
    }

    pub fn status(&self, name: &str) -> Status {
        Status::of(self.files.get(name))
    }

    pub fn resume_seconds(&self, name: &str) -> Option<u64> {
        self.files.get(name).and_then(|state| state.resume_seconds())
    }
}

#[derive(Debug, Default)]
pub struct RecordScan {
    pub records: Vec<DirectoryRecord>,
    pub warnings: Vec<String>,
}

/// Sidecar files of every tracked directory, kept in one config directory.
#[derive(Debug, Clone)]
pub struct Database {
    root: PathBuf,
}

impl Database {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sidecar_path(&self, dir: &Path) -> PathBuf {
        self.root.join(sidecar_file_name(&dir_key(dir)))
    }

    /// Whether `dir` has a sidecar entry of its own, aliased or not.
    pub fn is_indexed(&self, dir: &Path) -> bool {
        fs::symlink_metadata(self.sidecar_path(dir)).is_ok()
    }

    pub fn load(&self, dir: &Path) -> Result<DirectoryRecord, Error> {
        let sidecar = self.sidecar_path(dir);
        let meta = match fs::symlink_metadata(&sidecar) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(DirectoryRecord::empty(dir));
            }
            Err(err) => return Err(Error::io(&sidecar, err)),
        };

        if meta.file_type().is_symlink() {
            let target = self.alias_target(&sidecar)?;
            debug!(alias = %sidecar.display(), target = %target.display(), "loading aliased record");
            return self.read_record(&target);
        }

        let record = self.read_record(&sidecar)?;
        if record.dir != dir_key(dir) {
            return Err(Error::corrupt(
                &sidecar,
                format!("declares '{}' instead of '{}'", record.dir, dir.display()),
            ));
        }
        Ok(record)
    }

    /// Merge `changes` into the stored record and write it back to the file
    /// that owns it, which is the alias target when `dir` is an alias.
    pub fn update(&self, dir: &Path, changes: BTreeMap<String, Update>) -> Result<(), Error> {
        let mut record = self.load(dir)?;
        for (name, change) in changes {
            match change {
                Update::Set(state) => {
                    record.files.insert(name, state);
                }
                Update::Unmark => {
                    record.files.remove(&name);
                }
            }
        }

        let owner = self.root.join(sidecar_file_name(&record.dir));
        check_file_names(&owner, &record)?;

        fs::create_dir_all(&self.root).map_err(|err| Error::io(&self.root, err))?;
        let mut raw = serde_json::to_string_pretty(&record)
            .map_err(|err| Error::corrupt(&owner, err.to_string()))?;
        raw.push('\n');

        let tmp = self.root.join(format!(".tmp-{}", std::process::id()));
        fs::write(&tmp, raw).map_err(|err| Error::io(&tmp, err))?;
        fs::rename(&tmp, &owner).map_err(|err| Error::io(&owner, err))?;
        debug!(dir = %record.dir, file = %owner.display(), entries = record.files.len(), "record saved");
        Ok(())
    }

    /// Make `source` share the record of `target`, which must be the same
    /// physical directory reached through a different path.
    pub fn create_alias(&self, source: &Path, target: &Path) -> Result<(), Error> {
        if !target.is_dir() {
            return Err(Error::NotADirectory {
                path: target.to_path_buf(),
            });
        }
        if !target.is_absolute() {
            return Err(Error::RelativePath {
                path: target.to_path_buf(),
            });
        }
        let source_real = fs::canonicalize(source).map_err(|err| Error::io(source, err))?;
        let target_real = fs::canonicalize(target).map_err(|err| Error::io(target, err))?;
        if source_real != target_real {
            return Err(Error::PathMismatch {
                source_dir: source.to_path_buf(),
                target_dir: target.to_path_buf(),
            });
        }
        if self.is_indexed(source) {
            return Err(Error::AlreadyExists {
                path: source.to_path_buf(),
            });
        }
        if !self.is_indexed(target) {
            return Err(Error::NotIndexed {
                path: target.to_path_buf(),
            });
        }

        let target_sidecar = self.sidecar_path(target);
        let owner = if fs::symlink_metadata(&target_sidecar)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false)
        {
            self.alias_target(&target_sidecar)?
        } else {
            target_sidecar
        };
        let link_name = owner
            .file_name()
            .ok_or_else(|| Error::corrupt(&owner, "sidecar has no file name"))?;
        let link = self.sidecar_path(source);
        symlink(Path::new(link_name), &link).map_err(|err| Error::io(&link, err))?;
        debug!(alias = %link.display(), target = %owner.display(), "alias created");
        Ok(())
    }

    /// Every stored record that is not an alias. Unreadable records become
    /// warnings so one bad file does not hide the rest.
    pub fn all_directory_records(&self) -> Result<RecordScan, Error> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(RecordScan::default()),
            Err(err) => return Err(Error::io(&self.root, err)),
        };

        let mut scan = RecordScan::default();
        for entry in entries {
            let entry = entry.map_err(|err| Error::io(&self.root, err))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with("dir__") || !name.ends_with(".json") {
                continue;
            }
            let file_type = entry
                .file_type()
                .map_err(|err| Error::io(entry.path(), err))?;
            if file_type.is_symlink() {
                continue;
            }
            match self.read_record(&entry.path()) {
                Ok(record) => scan.records.push(record),
                Err(err) => scan.warnings.push(err.to_string()),
            }
        }
        scan.records.sort_by(|left, right| left.dir.cmp(&right.dir));
        Ok(scan)
    }

    fn alias_target(&self, link: &Path) -> Result<PathBuf, Error> {
        let target = fs::read_link(link).map_err(|err| Error::io(link, err))?;
        if target.components().count() != 1 {
            return Err(Error::corrupt(
                link,
                format!("alias points outside the config directory: {}", target.display()),
            ));
        }
        Ok(self.root.join(target))
    }

    fn read_record(&self, file: &Path) -> Result<DirectoryRecord, Error> {
        let raw = fs::read_to_string(file).map_err(|err| Error::io(file, err))?;
        let record: DirectoryRecord =
            serde_json::from_str(&raw).map_err(|err| Error::corrupt(file, err.to_string()))?;

        let expected = sidecar_file_name(&record.dir);
        if file.file_name().and_then(|name| name.to_str()) != Some(expected.as_str()) {
            return Err(Error::corrupt(
                file,
                format!("declared directory '{}' does not own this file", record.dir),
            ));
        }
        check_file_names(file, &record)?;
        Ok(record)
    }
}

fn check_file_names(file: &Path, record: &DirectoryRecord) -> Result<(), Error> {
    if let Some(bad) = record
        .files
        .keys()
        .find(|name| name.is_empty() || name.contains('/'))
    {
        return Err(Error::corrupt(file, format!("invalid file name '{bad}'")));
    }
    Ok(())
}

pub fn dir_key(dir: &Path) -> String {
    dir.to_string_lossy().into_owned()
}

/// `dir__<path with '/' as '|', at most 200 chars>__<sha1 of path>.json`;
/// stays below the usual 255 byte name limit.
pub fn sidecar_file_name(dir: &str) -> String {
    let readable: String = dir
        .replace('/', "|")
        .chars()
        .take(READABLE_NAME_MAX)
        .collect();
    let digest = hex::encode(Sha1::digest(dir.as_bytes()));
    format!("dir__{readable}__{digest}.json")
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(not(unix))]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    let _ = (original, link);
    Err(std::io::Error::new(
        ErrorKind::Unsupported,
        "aliases require symbolic links",
    ))
}
