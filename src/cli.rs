use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Overrides, PlayerKind};

#[derive(Debug, Parser)]
#[command(
    name = "mtrack",
    version,
    about = "Play media files in order and remember where you stopped"
)]
pub struct Cli {
    #[command(flatten)]
    pub display: DisplayArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Args)]
pub struct DisplayArgs {
    /// Include hidden files and directories
    #[arg(short = 'a', long, global = true)]
    pub show_hidden: bool,

    /// Sort names case-insensitively
    #[arg(short = 'i', long, global = true)]
    pub ignore_case: bool,

    /// Compare digit runs by value ("ep2" before "ep10")
    #[arg(short = 'N', long, global = true)]
    pub numeric_sort: bool,

    #[arg(long, global = true, conflicts_with = "no_colour")]
    pub colour: bool,

    #[arg(long, global = true)]
    pub no_colour: bool,

    #[arg(long, global = true, conflicts_with = "mpv")]
    pub vlc: bool,

    #[arg(long, global = true)]
    pub mpv: bool,
}

impl DisplayArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            player: if self.vlc {
                Some(PlayerKind::Vlc)
            } else if self.mpv {
                Some(PlayerKind::Mpv)
            } else {
                None
            },
            colour: if self.colour {
                Some(true)
            } else if self.no_colour {
                Some(false)
            } else {
                None
            },
            ignore_case: self.ignore_case.then_some(true),
            numeric_sort: self.numeric_sort.then_some(true),
            show_hidden: self.show_hidden.then_some(true),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List files with their state
    #[command(visible_aliases = ["l", "ls"])]
    List,
    /// List subdirectories with playing/new counts
    #[command(name = "list-dirs", visible_alias = "ld")]
    ListDirs,
    /// Play the next file that is not done or skipped
    #[command(visible_alias = "n")]
    Next {
        /// Only consider files never started
        #[arg(long)]
        new_only: bool,
    },
    /// Play selected files
    #[command(visible_alias = "p")]
    Play { selection: String },
    /// Mark selected files as done
    #[command(visible_alias = "m")]
    Mark {
        #[arg(required = true)]
        selections: Vec<String>,
    },
    /// Forget the state of selected files
    #[command(visible_alias = "u")]
    Unmark {
        #[arg(required = true)]
        selections: Vec<String>,
    },
    /// Mark selected files as skipped
    #[command(visible_alias = "s")]
    Skip {
        #[arg(required = true)]
        selections: Vec<String>,
    },
    /// Share the record of TARGET, the same directory under another path
    Alias { target: PathBuf },
    /// Directories with playing or new files
    Todo,
    /// Files in progress, in every known directory
    Playing,
    /// Finished files, in every known directory
    Watched,
    /// Skipped files, in every known directory
    Skipped,
    /// Import finished files from stdin (one path per line) or Kodi
    ImportWatched(ImportArgs),
    /// Import resume points from stdin ("SECONDS PATH" lines) or Kodi
    ImportPlaying(ImportArgs),
    /// Browse the current directory interactively
    Tui,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Read from the Kodi video database instead of stdin
    #[arg(long)]
    pub kodi: bool,

    /// Kodi database to read (default: newest MyVideos*.db)
    #[arg(long, requires = "kodi")]
    pub kodi_db: Option<PathBuf>,

    /// Only import paths matching this regex
    #[arg(long)]
    pub include: Option<String>,

    /// Skip paths matching this regex
    #[arg(long)]
    pub exclude: Option<String>,

    /// Replace the first match of PATTERN
    #[arg(long, num_args = 2, value_names = ["PATTERN", "REPLACEMENT"], action = clap::ArgAction::Append)]
    pub replace: Vec<String>,

    /// Replace every match of PATTERN
    #[arg(long, num_args = 2, value_names = ["PATTERN", "REPLACEMENT"], action = clap::ArgAction::Append)]
    pub replace_all: Vec<String>,
}
