use std::ffi::OsStr;
use std::fs::{self, File, Metadata};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{
    counting::CountingWriter,
    error::{Error, Result},
    fs::{EntryKind, FileId},
    header::MarHeader,
    path::{IntoMarPathError, MarPath, RootPath},
    record::{DirectoryRecord, FileRecord, Record},
    ser::{EndMarker, Serialize},
};

use super::{transfer, transfer_buf, TransferError};

#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// Files that make up the archive itself, such as the file being written
    /// and the one it will replace. A regular file with any of these
    /// identities is never archived.
    pub exclude: Vec<FileId>,
}

/// Something skipped while archiving that did not stop the archive.
#[derive(Debug, thiserror::Error)]
pub enum Warning {
    #[error("Cannot stat '{}', skipping: {error}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Not a regular file or directory ({kind}), skipping: '{}'", .path.display())]
    Unsupported { path: PathBuf, kind: EntryKind },

    #[error("Archive would include itself, skipping: '{}'", .path.display())]
    SelfInclusionSkipped { path: PathBuf },
}

#[derive(Debug, Default)]
pub struct ArchiveStats {
    /// Directory records written.
    pub dirs: u64,
    /// File records written.
    pub files: u64,
    /// Content bytes written across all file records.
    pub bytes: u64,
    /// Total size of the uncompressed archive stream.
    pub archive_bytes: u64,
    pub warnings: Vec<Warning>,
}

/// Streams root paths into an archive.
///
/// The version tag is written on construction; `finish` writes the end marker.
/// Dropping a writer without calling `finish` leaves the archive without its
/// end marker, which readers still accept.
pub struct ArchiveWriter<W: Write> {
    sink: CountingWriter<W>,
    options: ArchiveOptions,
    buf: Box<[u8]>,
    stats: ArchiveStats,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(sink: W, options: ArchiveOptions) -> Result<ArchiveWriter<W>> {
        let mut sink = CountingWriter::new(sink);
        MarHeader::default().write(&mut sink)?;

        Ok(ArchiveWriter {
            sink,
            options,
            buf: transfer_buf(),
            stats: ArchiveStats::default(),
        })
    }

    pub fn stats(&self) -> &ArchiveStats {
        &self.stats
    }

    /// Archives one root path: a file, or a directory and everything below it.
    ///
    /// A root that cannot be stat'ed is reported as a warning and skipped.
    pub fn append<P: AsRef<Path>>(&mut self, root: P) -> Result<()> {
        let root = root.as_ref();
        let parsed =
            RootPath::new(root).map_err(|e| Error::from_path_error(e, root.to_path_buf()))?;

        if parsed.path_start_index > 0 {
            tracing::info!(path = %root.display(), "removing leading '/' from member names");
        }

        let meta = match fs::symlink_metadata(&parsed.fs_path) {
            Ok(v) => v,
            Err(error) => {
                self.warn(Warning::Unreadable {
                    path: root.to_path_buf(),
                    error,
                });
                return Ok(());
            }
        };

        match (EntryKind::of(&meta), parsed.archived) {
            (EntryKind::Directory, archived) => self.append_dir(&parsed.fs_path, archived),
            (EntryKind::File, Some(path)) => self.append_file(&parsed.fs_path, path, &meta),
            (EntryKind::File, None) => Err(Error::InvalidRoot(root.to_path_buf())),
            (kind, _) => {
                self.warn(Warning::Unsupported {
                    path: root.to_path_buf(),
                    kind,
                });
                Ok(())
            }
        }
    }

    /// Writes the end marker and hands back the sink.
    pub fn finish(mut self) -> Result<(W, ArchiveStats)> {
        EndMarker.write(&mut self.sink)?;
        self.sink.flush()?;
        self.stats.archive_bytes = self.sink.bytes_written();

        tracing::debug!(
            dirs = self.stats.dirs,
            files = self.stats.files,
            bytes = self.stats.bytes,
            archive_bytes = self.stats.archive_bytes,
            "finished archive"
        );

        Ok((self.sink.into_inner(), self.stats))
    }

    fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.stats.warnings.push(warning);
    }

    fn write_record(&mut self, record: &Record) -> Result<()> {
        let start = self.sink.bytes_written();
        record.write(&mut self.sink)?;
        let end = self.sink.bytes_written();
        tracing::debug!(
            start = format_args!("{:#x}", start),
            end = format_args!("{:#x}", end),
            bytes = end - start,
            path = %record.path(),
            "serialized Record"
        );
        Ok(())
    }

    /// Pre-order: the directory's own record, then its entries, recursing into
    /// subdirectories as they are met. `path` is `None` for a root whose
    /// contents go at the top level.
    fn append_dir(&mut self, fs_path: &Path, path: Option<MarPath>) -> Result<()> {
        if let Some(path) = &path {
            self.write_record(&Record::Directory(DirectoryRecord { path: path.clone() }))?;
            self.stats.dirs += 1;
        }

        let entries =
            fs::read_dir(fs_path).map_err(|e| Error::ListDirFailed(e, fs_path.to_path_buf()))?;

        for entry in entries {
            let entry = entry.map_err(|e| Error::ListDirFailed(e, fs_path.to_path_buf()))?;
            let name = entry.file_name();
            let child_fs_path = fs_path.join(&name);
            let child = child_path(path.as_ref(), &name)
                .map_err(|e| Error::from_path_error(e, child_fs_path.clone()))?;

            // DirEntry::metadata does not follow symlinks.
            let meta = match entry.metadata() {
                Ok(v) => v,
                Err(error) => {
                    self.warn(Warning::Unreadable {
                        path: child_fs_path,
                        error,
                    });
                    continue;
                }
            };

            match EntryKind::of(&meta) {
                EntryKind::Directory => self.append_dir(&child_fs_path, Some(child))?,
                EntryKind::File => self.append_file(&child_fs_path, child, &meta)?,
                kind => self.warn(Warning::Unsupported {
                    path: child_fs_path,
                    kind,
                }),
            }
        }

        Ok(())
    }

    fn append_file(&mut self, fs_path: &Path, path: MarPath, meta: &Metadata) -> Result<()> {
        if !self.options.exclude.is_empty() {
            let excluded = FileId::from_metadata(meta, fs_path)
                .map_or(false, |id| self.options.exclude.contains(&id));
            if excluded {
                self.warn(Warning::SelfInclusionSkipped {
                    path: fs_path.to_path_buf(),
                });
                return Ok(());
            }
        }

        let size = meta.len();
        let record_size = u32::try_from(size).map_err(|_| Error::FileTooLarge {
            path: fs_path.to_path_buf(),
            size,
        })?;

        let mut file =
            File::open(fs_path).map_err(|e| Error::ReadFailed(e, fs_path.to_path_buf()))?;

        self.write_record(&Record::File(FileRecord {
            path,
            size: record_size,
        }))?;

        let copied = transfer(&mut file, &mut self.sink, size, &mut self.buf).map_err(|e| match e {
            TransferError::Read(e, _) => Error::ReadFailed(e, fs_path.to_path_buf()),
            TransferError::Write(e) => Error::Io(e),
        })?;

        if copied < size {
            return Err(Error::ReadFailed(
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("file shrank from {} to {} bytes while archiving", size, copied),
                ),
                fs_path.to_path_buf(),
            ));
        }

        self.stats.files += 1;
        self.stats.bytes += size;
        Ok(())
    }
}

fn child_path(
    parent: Option<&MarPath>,
    name: &OsStr,
) -> std::result::Result<MarPath, IntoMarPathError> {
    match parent {
        Some(parent) => parent.join(name),
        None => MarPath::new(Path::new(name)),
    }
}

/// Archives every root in `roots` into `sink` and closes the archive.
pub fn write_archive<I, P, W>(roots: I, sink: W, options: ArchiveOptions) -> Result<ArchiveStats>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
    W: Write,
{
    let mut writer = ArchiveWriter::new(sink, options)?;
    for root in roots {
        writer.append(root)?;
    }
    let (_, stats) = writer.finish()?;
    Ok(stats)
}
