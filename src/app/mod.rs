mod display;
mod files;
mod import;
mod summary;
mod tracking;
mod tui;


use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::cli::{Cli, Command, ImportArgs};
use crate::config::{ConfigFile, Options};
use crate::db::{Database, FileState, Status, Update};
use crate::paths::{config_dir, config_file, kodi_database_dir, working_dir};

use self::display::{dir_line, file_line, format_time, state_line, summary_label};
use self::files::{
    CONTINUE_EXCLUDES, Existence, NEW_ONLY_EXCLUDES, enumerate, next_unfinished,
    resolve_selection,
};
use self::import::{
    ImportFilter, ImportKind, Rewrite, find_kodi_database, import_records, kodi_records,
    parse_text_records,
};
use self::summary::{files_with_status, list_dirs, todo_directories};
use self::tracking::{ExternalPlayer, Reconciled, StdinConfirm, Tracker};

pub fn run(cli: Cli) -> Result<()> {
    let cfg_dir = config_dir()?;
    let file = ConfigFile::load(&config_file(&cfg_dir))?;
    let opts = Options::resolve(file, cli.display.overrides());
    let db = Database::open(cfg_dir);
    let dir = working_dir()?;

    let player = ExternalPlayer::new(opts.player);
    let confirm = StdinConfirm;
    let tracker = Tracker::new(&db, &player, &confirm);

    match cli.command {
        Some(Command::List) | None => run_list(&db, &dir, &opts)?,
        Some(Command::ListDirs) => run_list_dirs(&db, &dir, &opts)?,
        Some(Command::Next { new_only }) => run_next(&db, &tracker, &dir, &opts, new_only)?,
        Some(Command::Play { selection }) => run_play(&db, &tracker, &dir, &opts, &selection)?,
        Some(Command::Mark { selections }) => run_set(
            &db,
            &dir,
            &opts,
            &selections,
            Update::Set(FileState::Done),
        )?,
        Some(Command::Unmark { selections }) => {
            run_set(&db, &dir, &opts, &selections, Update::Unmark)?
        }
        Some(Command::Skip { selections }) => run_set(
            &db,
            &dir,
            &opts,
            &selections,
            Update::Set(FileState::Skip),
        )?,
        Some(Command::Alias { target }) => run_alias(&db, &dir, &target)?,
        Some(Command::Todo) => run_todo(&db, &opts)?,
        Some(Command::Playing) => run_state_listing(&db, &opts, Status::Playing)?,
        Some(Command::Watched) => run_state_listing(&db, &opts, Status::Done)?,
        Some(Command::Skipped) => run_state_listing(&db, &opts, Status::Skip)?,
        Some(Command::ImportWatched(args)) => run_import(&db, ImportKind::Watched, &args)?,
        Some(Command::ImportPlaying(args)) => run_import(&db, ImportKind::Playing, &args)?,
        Some(Command::Tui) => tui::run_tui(&db, &tracker, &dir, &opts)?,
    }

    Ok(())
}

fn run_list(db: &Database, dir: &Path, opts: &Options) -> Result<()> {
    let names = enumerate(dir, opts)?;
    let record = db.load(dir)?;
    if names.is_empty() {
        println!("No files.");
        return Ok(());
    }

    let width = names.len().to_string().len();
    for (idx, name) in names.iter().enumerate() {
        println!(
            "{}",
            file_line(
                idx + 1,
                width,
                record.status(name),
                name,
                record.resume_seconds(name),
                opts.colour,
            )
        );
    }
    Ok(())
}

fn run_list_dirs(db: &Database, dir: &Path, opts: &Options) -> Result<()> {
    let dirs = list_dirs(db, dir, opts)?;
    if dirs.is_empty() {
        println!("No directories.");
        return Ok(());
    }
    for entry in dirs {
        println!("{}", dir_line(&entry.name, entry.summary, opts.colour));
    }
    Ok(())
}

fn run_next(
    db: &Database,
    tracker: &Tracker<'_>,
    dir: &Path,
    opts: &Options,
    new_only: bool,
) -> Result<()> {
    let names = enumerate(dir, opts)?;
    let record = db.load(dir)?;
    let excluded = if new_only {
        NEW_ONLY_EXCLUDES
    } else {
        CONTINUE_EXCLUDES
    };
    match next_unfinished(&names, &record, excluded) {
        Some(name) => play_one(tracker, dir, &name),
        None => {
            println!("No files to play.");
            Ok(())
        }
    }
}

fn run_play(
    db: &Database,
    tracker: &Tracker<'_>,
    dir: &Path,
    opts: &Options,
    selection: &str,
) -> Result<()> {
    let names = enumerate(dir, opts)?;
    let record = db.load(dir)?;
    let selected = resolve_selection(dir, &names, &record, selection, opts, Existence::Required)?;
    if selected.is_empty() {
        println!("No files selected.");
    }
    for name in selected {
        play_one(tracker, dir, &name)?;
    }
    Ok(())
}

fn play_one(tracker: &Tracker<'_>, dir: &Path, name: &str) -> Result<()> {
    let outcome = tracker
        .play(dir, name)
        .with_context(|| format!("failed to play '{name}'"))?;
    println!("{}", outcome_message(name, outcome));
    Ok(())
}

fn outcome_message(name: &str, outcome: Reconciled) -> String {
    match outcome {
        Reconciled::Continuing(seconds) => {
            format!("Stopped {name} at {}.", format_time(seconds))
        }
        Reconciled::Finished => format!("Marked {name} as done."),
        Reconciled::Unmarked => format!("Unmarked {name}."),
    }
}

fn run_set(
    db: &Database,
    dir: &Path,
    opts: &Options,
    selections: &[String],
    update: Update,
) -> Result<()> {
    let existence = match update {
        Update::Unmark => Existence::Tolerated,
        Update::Set(_) => Existence::Required,
    };
    let names = enumerate(dir, opts)?;
    let record = db.load(dir)?;

    let mut changes = BTreeMap::new();
    for selection in selections {
        for name in resolve_selection(dir, &names, &record, selection, opts, existence)? {
            changes.insert(name, update);
        }
    }
    let count = changes.len();
    db.update(dir, changes)?;

    let verb = match update {
        Update::Set(FileState::Done) => "Marked",
        Update::Set(FileState::Skip) => "Skipped",
        Update::Set(FileState::Playing(_)) | Update::Unmark => "Unmarked",
    };
    println!("{verb} {count} file(s).");
    Ok(())
}

fn run_alias(db: &Database, dir: &Path, target: &Path) -> Result<()> {
    db.create_alias(dir, target)
        .with_context(|| format!("cannot alias '{}'", dir.display()))?;
    println!("{} now shares the record of {}.", dir.display(), target.display());
    Ok(())
}

fn emit_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("Warning: {warning}");
    }
}

fn run_todo(db: &Database, opts: &Options) -> Result<()> {
    let scan = db.all_directory_records()?;
    emit_warnings(&scan.warnings);
    let report = todo_directories(&scan.records, opts, |path| path.is_dir());
    for dir in &report.ignored {
        eprintln!("Warning: ignoring missing directory {dir}");
    }
    if report.entries.is_empty() {
        println!("Nothing to watch.");
        return Ok(());
    }
    for entry in report.entries {
        let summary = summary::Summary::Counts {
            playing: entry.playing,
            new: entry.new,
        };
        println!("{} {}", summary_label(summary), entry.dir);
    }
    Ok(())
}

fn run_state_listing(db: &Database, opts: &Options, status: Status) -> Result<()> {
    let scan = db.all_directory_records()?;
    emit_warnings(&scan.warnings);
    let entries = files_with_status(&scan.records, status);
    if entries.is_empty() {
        println!("No {status} files.");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}",
            state_line(&entry.dir, &entry.file, entry.state, opts.colour)
        );
    }
    Ok(())
}

fn run_import(db: &Database, kind: ImportKind, args: &ImportArgs) -> Result<()> {
    let mut rewrites = Vec::new();
    for (pairs, all) in [(&args.replace, false), (&args.replace_all, true)] {
        for pair in pairs.chunks(2) {
            let [pattern, replacement] = pair else {
                bail!("rewrite needs a pattern and a replacement");
            };
            rewrites.push(Rewrite::new(pattern, replacement, all)?);
        }
    }
    let filter = ImportFilter::new(args.include.as_deref(), args.exclude.as_deref(), rewrites)?;

    let records = if args.kodi {
        let db_path = match &args.kodi_db {
            Some(path) => path.clone(),
            None => {
                let dir = kodi_database_dir().context("unable to resolve Kodi directory")?;
                find_kodi_database(&dir)?
            }
        };
        kodi_records(&db_path, kind)?
    } else {
        parse_text_records(io::stdin().lock(), kind)?
    };

    let summary = import_records(db, records, &filter)?;
    println!(
        "Imported {} file(s) in {} director{}.",
        summary.files,
        summary.dirs,
        if summary.dirs == 1 { "y" } else { "ies" }
    );
    Ok(())
}
