use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised by the tracking core.
///
/// Every variant aborts only the operation that produced it; nothing is written
/// to a sidecar file once one of these has been returned.
#[derive(Debug, Error)]
pub enum Error {
    #[error("corrupt database {}: {reason}", path.display())]
    CorruptDatabase { path: PathBuf, reason: String },

    #[error("'{}' is not inside '{}'", path.display(), dir.display())]
    PathEscape { path: PathBuf, dir: PathBuf },

    #[error("'{}' is not a file in '{}'", path.display(), dir.display())]
    NotInDirectory { path: PathBuf, dir: PathBuf },

    #[error("'{}' is not a file", path.display())]
    NotAFile { path: PathBuf },

    #[error("invalid selection '{token}'")]
    InvalidSelection { token: String },

    #[error("index {index} out of range (1-{count})")]
    OutOfRange { index: usize, count: usize },

    #[error("'{}' is already indexed", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("'{}' is not indexed", path.display())]
    NotIndexed { path: PathBuf },

    #[error("'{}' and '{}' are not the same directory", source_dir.display(), target_dir.display())]
    PathMismatch {
        source_dir: PathBuf,
        target_dir: PathBuf,
    },

    #[error("'{}' is not an absolute path", path.display())]
    RelativePath { path: PathBuf },

    #[error("'{}' is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("player '{}' not found", player.display())]
    PlayerNotFound { player: PathBuf },

    #[error("player exited with {status} while playing '{file}'")]
    PlayerExitedAbnormally { file: String, status: ExitStatus },

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptDatabase {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
