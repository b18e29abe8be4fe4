use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::Options;
use crate::db::{DirectoryRecord, Status};
use crate::error::Error;

/// Media files directly inside `dir`, in display order.
pub(crate) fn enumerate(dir: &Path, opts: &Options) -> Result<Vec<String>, Error> {
    let mut names = list_entries(dir, opts, |path| path.is_file())?
        .into_iter()
        .filter(|name| opts.is_media_name(name))
        .collect::<Vec<_>>();
    sort_names(&mut names, opts);
    Ok(names)
}

/// Subdirectories directly inside `dir`, in display order.
pub(crate) fn enumerate_dirs(dir: &Path, opts: &Options) -> Result<Vec<String>, Error> {
    let mut names = list_entries(dir, opts, |path| path.is_dir())?;
    sort_names(&mut names, opts);
    Ok(names)
}

fn list_entries<F>(dir: &Path, opts: &Options, keep: F) -> Result<Vec<String>, Error>
where
    F: Fn(&Path) -> bool,
{
    let entries = fs::read_dir(dir).map_err(|err| Error::io(dir, err))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| Error::io(dir, err))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') && !opts.show_hidden {
            continue;
        }
        if keep(&entry.path()) {
            names.push(name);
        }
    }
    Ok(names)
}

pub(crate) fn sort_names(names: &mut [String], opts: &Options) {
    names.sort_by(|left, right| compare_names(left, right, opts));
}

pub(crate) fn compare_names(left: &str, right: &str, opts: &Options) -> Ordering {
    let primary = match (opts.ignore_case, opts.numeric_sort) {
        (false, false) => left.cmp(right),
        (true, false) => left.to_lowercase().cmp(&right.to_lowercase()),
        (false, true) => natural_cmp(left, right),
        (true, true) => natural_cmp(&left.to_lowercase(), &right.to_lowercase()),
    };
    primary.then_with(|| left.cmp(right))
}

/// Compares runs of ASCII digits by value, everything else by character.
pub(crate) fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut a = left;
    let mut b = right;
    loop {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        let a_digits = leading_digits(a);
        let b_digits = leading_digits(b);
        let ordering = if !a_digits.is_empty() && !b_digits.is_empty() {
            let a_num = a_digits.trim_start_matches('0');
            let b_num = b_digits.trim_start_matches('0');
            a_num
                .len()
                .cmp(&b_num.len())
                .then_with(|| a_num.cmp(b_num))
                .then_with(|| a_digits.len().cmp(&b_digits.len()))
        } else {
            Ordering::Equal
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
        if !a_digits.is_empty() && !b_digits.is_empty() {
            a = &a[a_digits.len()..];
            b = &b[b_digits.len()..];
            continue;
        }

        let mut a_chars = a.chars();
        let mut b_chars = b.chars();
        match (a_chars.next(), b_chars.next()) {
            (Some(x), Some(y)) if x == y => {
                a = a_chars.as_str();
                b = b_chars.as_str();
            }
            (Some(x), Some(y)) => return x.cmp(&y),
            _ => return Ordering::Equal,
        }
    }
}

fn leading_digits(s: &str) -> &str {
    let end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map(|(idx, _)| idx)
        .unwrap_or(s.len());
    &s[..end]
}

pub(crate) fn classify(name: &str, record: &DirectoryRecord) -> Status {
    record.status(name)
}

/// Whether the target of a filename must already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Existence {
    Required,
    /// Unmarking may clear entries for files that are gone.
    Tolerated,
}

/// Resolve `candidate` against `dir` into a bare file name of that directory.
pub(crate) fn validate_filename(
    dir: &Path,
    candidate: &str,
    existence: Existence,
) -> Result<String, Error> {
    let joined = normalize(&dir.join(candidate));
    let base = normalize(dir);
    let relative = joined
        .strip_prefix(&base)
        .map_err(|_| Error::PathEscape {
            path: PathBuf::from(candidate),
            dir: dir.to_path_buf(),
        })?
        .to_path_buf();

    let mut parts = relative.components();
    let name = match (parts.next(), parts.next()) {
        (Some(Component::Normal(name)), None) => name.to_string_lossy().into_owned(),
        (None, _) => {
            return Err(Error::NotAFile {
                path: PathBuf::from(candidate),
            });
        }
        _ => {
            return Err(Error::NotInDirectory {
                path: relative,
                dir: dir.to_path_buf(),
            });
        }
    };

    if existence == Existence::Required && !dir.join(&name).is_file() {
        return Err(Error::NotAFile {
            path: PathBuf::from(name),
        });
    }
    Ok(name)
}

/// Lexical normalization; `..` never climbs above the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Turn a selection expression into file names, in enumeration order for
/// keyword and index forms.
///
/// Indices refer to the order of `names`, so they only stay meaningful while
/// the sort toggles are unchanged.
pub(crate) fn resolve_selection(
    dir: &Path,
    names: &[String],
    record: &DirectoryRecord,
    expression: &str,
    opts: &Options,
    existence: Existence,
) -> Result<Vec<String>, Error> {
    let expression = expression.trim();
    if expression == "all" {
        return Ok(names.to_vec());
    }
    if let Ok(status) = expression.parse::<Status>() {
        return Ok(names
            .iter()
            .filter(|name| classify(name, record) == status)
            .cloned()
            .collect());
    }
    if opts.is_media_name(expression) {
        return validate_filename(dir, expression, existence).map(|name| vec![name]);
    }

    let indices = parse_indices(expression, names.len())?;
    Ok(indices
        .into_iter()
        .map(|index| names[index - 1].clone())
        .collect())
}

/// 1-based, deduplicated and ascending.
pub(crate) fn parse_indices(expression: &str, count: usize) -> Result<BTreeSet<usize>, Error> {
    let invalid = |token: &str| Error::InvalidSelection {
        token: token.to_string(),
    };
    let checked = |index: usize| {
        if (1..=count).contains(&index) {
            Ok(index)
        } else {
            Err(Error::OutOfRange { index, count })
        }
    };

    let mut indices = BTreeSet::new();
    for token in expression.split(',') {
        let token = token.trim();
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_index(start).ok_or_else(|| invalid(token))?;
                let end = parse_index(end).ok_or_else(|| invalid(token))?;
                if start > end {
                    return Err(invalid(token));
                }
                checked(start)?;
                checked(end)?;
                indices.extend(start..=end);
            }
            None => {
                let index = parse_index(token).ok_or_else(|| invalid(token))?;
                indices.insert(checked(index)?);
            }
        }
    }
    Ok(indices)
}

/// Digit runs too long for `usize` saturate so they report as out of range.
fn parse_index(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(raw.parse().unwrap_or(usize::MAX))
}

/// Statuses skipped when looking for the next file to play.
pub(crate) const CONTINUE_EXCLUDES: &[Status] = &[Status::Done, Status::Skip];
pub(crate) const NEW_ONLY_EXCLUDES: &[Status] = &[Status::Done, Status::Skip, Status::Playing];

pub(crate) fn next_unfinished(
    names: &[String],
    record: &DirectoryRecord,
    excluded: &[Status],
) -> Option<String> {
    first_outstanding(
        names.iter().map(|name| (name.as_str(), classify(name, record))),
        excluded,
    )
    .map(str::to_string)
}

/// First name whose status is not in `excluded`.
pub(crate) fn first_outstanding<'a, I>(entries: I, excluded: &[Status]) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, Status)>,
{
    entries
        .into_iter()
        .find(|(_, status)| !excluded.contains(status))
        .map(|(name, _)| name)
}
