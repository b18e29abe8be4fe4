use crossterm::style::{Color, Stylize};

use crate::db::{FileState, Status};

use super::summary::Summary;

pub(crate) fn format_time(seconds: u64) -> String {
    let s = seconds % 60;
    let m = seconds / 60 % 60;
    let h = seconds / 3600;
    format!("{h:02}:{m:02}:{s:02}")
}

pub(crate) fn status_marker(status: Status) -> char {
    match status {
        Status::Playing => '>',
        Status::Done => 'x',
        Status::New => ' ',
        Status::Skip => '*',
    }
}

fn status_color(status: Status) -> Option<Color> {
    match status {
        Status::Playing => Some(Color::Yellow),
        Status::Done => Some(Color::Green),
        Status::Skip => Some(Color::DarkGrey),
        Status::New => None,
    }
}

fn paint(text: String, color: Option<Color>, colour: bool) -> String {
    match color {
        Some(color) if colour => text.with(color).to_string(),
        _ => text,
    }
}

/// One line of `list`: index, marker, name and resume time.
pub(crate) fn file_line(
    index: usize,
    width: usize,
    status: Status,
    name: &str,
    resume: Option<u64>,
    colour: bool,
) -> String {
    let mut line = format!("{index:>width$} [{}] {name}", status_marker(status));
    if let Some(seconds) = resume {
        line.push(' ');
        line.push_str(&format_time(seconds));
    }
    paint(line, status_color(status), colour)
}

pub(crate) fn summary_label(summary: Summary) -> String {
    match summary {
        Summary::Unindexed => "[   ?   ]".to_string(),
        Summary::Counts { playing, new } => format!("[{playing:>3}|{new:>3}]"),
    }
}

pub(crate) fn dir_line(name: &str, summary: Summary, colour: bool) -> String {
    let color = match summary {
        Summary::Unindexed => Some(Color::DarkGrey),
        Summary::Counts { playing, .. } if playing > 0 => Some(Color::Yellow),
        Summary::Counts { new, .. } if new > 0 => Some(Color::Cyan),
        Summary::Counts { .. } => Some(Color::Green),
    };
    paint(format!("{} {name}/", summary_label(summary)), color, colour)
}

pub(crate) fn state_line(dir: &str, file: &str, state: FileState, colour: bool) -> String {
    let status = Status::of(Some(&state));
    let mut line = format!("[{}] {dir}/{file}", status_marker(status));
    if let Some(seconds) = state.resume_seconds() {
        line.push(' ');
        line.push_str(&format_time(seconds));
    }
    paint(line, status_color(status), colour)
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}
