//! Filesystem utilities for classifying entries and telling files apart.

use std::fs::Metadata;
use std::path::Path;

/// What `lstat` says an entry is, as far as the archive is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Devices, sockets, fifos and anything else.
    Other,
}

impl EntryKind {
    /// Classifies metadata obtained without following symlinks.
    pub fn of(meta: &Metadata) -> EntryKind {
        let file_type = meta.file_type();
        if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
            EntryKind::Other => "special file",
        };
        f.write_str(s)
    }
}

/// Identifies a file independently of the path used to reach it.
///
/// On Unix: device and inode number
/// Elsewhere: the canonical path
#[cfg(unix)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId {
    dev: u64,
    ino: u64,
}

#[cfg(not(unix))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(std::path::PathBuf);

impl FileId {
    #[cfg(unix)]
    pub fn from_metadata(meta: &Metadata, _path: &Path) -> Option<FileId> {
        use std::os::unix::fs::MetadataExt;

        Some(FileId {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_meta: &Metadata, path: &Path) -> Option<FileId> {
        path.canonicalize().ok().map(FileId)
    }

    /// The identity of whatever `path` names, following symlinks.
    pub fn of<P: AsRef<Path>>(path: P) -> std::io::Result<Option<FileId>> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path)?;
        Ok(FileId::from_metadata(&meta, path))
    }
}
