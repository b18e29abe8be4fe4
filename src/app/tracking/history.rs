use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static MPV_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:AV|A|V): (-?\d+:\d{2}:\d{2}) / (\d+:\d{2}:\d{2})")
        .expect("mpv status pattern is valid")
});

#[derive(Debug, Default)]
pub(crate) struct RecentsRead {
    pub(crate) times: HashMap<String, u64>,
    pub(crate) warnings: Vec<String>,
}

/// Last known positions from VLC's Qt interface config.
pub(crate) fn read_vlc_recents(path: &Path) -> RecentsRead {
    if !path.exists() {
        return RecentsRead::default();
    }
    match fs::read_to_string(path) {
        Ok(raw) => parse_vlc_recents(&raw),
        Err(err) => RecentsRead {
            times: HashMap::new(),
            warnings: vec![format!(
                "failed to read VLC recents at {}: {}",
                path.display(),
                err
            )],
        },
    }
}

pub(crate) fn parse_vlc_recents(raw: &str) -> RecentsRead {
    let mut in_section = false;
    let mut list = None::<Vec<&str>>;
    let mut times = None::<Vec<&str>>;
    for line in raw.lines().map(str::trim) {
        if line == "[RecentsMRL]" {
            in_section = true;
        } else if in_section {
            if line.is_empty() || line.starts_with('[') {
                break;
            } else if let Some(rest) = line.strip_prefix("list=") {
                list = Some(rest.split(", ").collect());
            } else if let Some(rest) = line.strip_prefix("times=") {
                times = Some(rest.split(", ").collect());
            }
        }
    }

    let mut read = RecentsRead::default();
    let (Some(list), Some(times)) = (list, times) else {
        return read;
    };
    if list.len() != times.len() {
        read.warnings.push(format!(
            "VLC recents list has {} entries but {} times",
            list.len(),
            times.len()
        ));
    }
    for (mrl, millis) in list.iter().zip(times.iter()) {
        let Some(encoded) = mrl.trim_matches('"').strip_prefix("file://") else {
            continue;
        };
        let Ok(path) = urlencoding::decode(encoded) else {
            read.warnings.push(format!("undecodable VLC recent entry {mrl}"));
            continue;
        };
        let Ok(millis) = millis.trim().parse::<i64>() else {
            read.warnings.push(format!("unparseable VLC recent time {millis}"));
            continue;
        };
        read.times
            .insert(path.into_owned(), (millis.max(0) / 1000) as u64);
    }
    read
}

/// Elapsed and total seconds from the last mpv status line in `output`.
pub(crate) fn parse_mpv_status(output: &str) -> Option<(u64, u64)> {
    let captures = MPV_STATUS.captures_iter(output).last()?;
    let elapsed = parse_clock(captures.get(1)?.as_str())?;
    let total = parse_clock(captures.get(2)?.as_str())?;
    Some((elapsed, total))
}

/// `HH:MM:SS` to seconds; negative clocks read as zero.
pub(crate) fn parse_clock(raw: &str) -> Option<u64> {
    if raw.starts_with('-') {
        return Some(0);
    }
    let mut parts = raw.split(':');
    let hours = parts.next()?.parse::<u64>().ok()?;
    let minutes = parts.next()?.parse::<u64>().ok()?;
    let seconds = parts.next()?.parse::<u64>().ok()?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)
}
