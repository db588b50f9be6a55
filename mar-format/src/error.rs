use std::path::PathBuf;

use crate::path::IntoMarPathError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on the archive stream")]
    Io(#[from] std::io::Error),

    #[error("Reading file failed. Path: '{}'", .1.display())]
    ReadFailed(#[source] std::io::Error, PathBuf),

    #[error("Listing directory failed. Path: '{}'", .1.display())]
    ListDirFailed(#[source] std::io::Error, PathBuf),

    #[error("Creating directory failed. Path: '{}'", .1.display())]
    CreateDirFailed(#[source] std::io::Error, PathBuf),

    #[error("Creating file failed. Path: '{}'", .1.display())]
    CreateFileFailed(#[source] std::io::Error, PathBuf),

    #[error("Writing file failed. Path: '{}'", .1.display())]
    WriteFailed(#[source] std::io::Error, PathBuf),

    #[error("Refusing path that escapes its root. Path: '{}'", .0.display())]
    PathTraversalRejected(PathBuf),

    #[error("Refusing to archive the filesystem root or an empty path. Path: '{}'", .0.display())]
    InvalidRoot(PathBuf),

    #[error("Path is {len} bytes long, the limit is {}. Path: '{}'", crate::path::MAX_PATH_LEN, .path.display())]
    PathTooLong { path: PathBuf, len: usize },

    #[error("File is {size} bytes long, larger than an archive record can hold. Path: '{}'", .path.display())]
    FileTooLarge { path: PathBuf, size: u64 },

    #[error("Corrupt archive at byte offset {offset}: {reason}")]
    CorruptArchive { offset: u64, reason: Corruption },
}

/// Why a stream could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Corruption {
    #[error("stream is empty, the version tag is missing")]
    MissingVersion,

    #[error("stream ended early, expected {expected} more bytes but found {actual}")]
    Truncated { expected: u64, actual: u64 },

    #[error("invalid record path ({0})")]
    InvalidPath(#[source] IntoMarPathError),
}

impl Error {
    /// Maps a path construction failure for `path` onto the matching error kind.
    pub(crate) fn from_path_error(err: IntoMarPathError, path: PathBuf) -> Error {
        match err {
            IntoMarPathError::ParentDir | IntoMarPathError::Absolute => {
                Error::PathTraversalRejected(path)
            }
            IntoMarPathError::TooLong(len) => Error::PathTooLong { path, len },
            IntoMarPathError::EmptyPath
            | IntoMarPathError::NulByte
            | IntoMarPathError::UnrepresentableStr => Error::InvalidRoot(path),
        }
    }
}
