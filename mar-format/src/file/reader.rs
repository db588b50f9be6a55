use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::{
    counting::CountingReader,
    de::{read_record, truncated, Deserialize},
    error::{Error, Result},
    header::{MarHeader, VERSION},
    path::bytes_to_path_buf,
    record::{FileRecord, Record},
};

use super::{transfer, transfer_buf, TransferError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub files_extracted: u64,
    pub dirs_created: u64,
    pub bytes_written: u64,
}

/// Decodes an archive stream one record at a time.
///
/// After a file record is returned its content can be taken with
/// `read_content`; otherwise it is skipped by the next call to `next_record`.
/// Once the record sequence ends or an error is returned, the reader yields
/// no further records.
pub struct ArchiveReader<R: Read> {
    source: CountingReader<R>,
    header: MarHeader,
    buf: Box<[u8]>,
    pending: u64,
    finished: bool,
}

impl<R: Read> ArchiveReader<R> {
    /// Reads the version tag. Any version is accepted; one this crate did not
    /// write is only logged.
    pub fn new(source: R) -> Result<ArchiveReader<R>> {
        let mut source = CountingReader::new(source);
        let header = MarHeader::read(&mut source)?;

        if header.version != VERSION {
            tracing::warn!(
                version = header.version,
                expected = VERSION,
                "unexpected archive version, continuing anyway"
            );
        }

        Ok(ArchiveReader {
            source,
            header,
            buf: transfer_buf(),
            pending: 0,
            finished: false,
        })
    }

    #[inline(always)]
    pub fn version(&self) -> u16 {
        self.header.version
    }

    /// Offset into the uncompressed stream of the next byte to be read.
    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    /// The next record, or `None` once the end marker (or a clean end of
    /// stream) is reached.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        if self.finished {
            return Ok(None);
        }

        let result = self.skip_content().and_then(|_| read_record(&mut self.source));

        match result {
            Ok(Some(record)) => {
                if let Record::File(file) = &record {
                    self.pending = u64::from(file.size);
                }
                Ok(Some(record))
            }
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    /// Copies the content of the file record last returned into `writer`,
    /// returning how many bytes were written. Returns 0 if there is nothing
    /// left to copy.
    pub fn read_content<W: Write>(&mut self, writer: &mut W) -> Result<u64> {
        self.copy_content(writer, None)
    }

    /// An iterator over the remaining records. Content is skipped.
    pub fn entries(&mut self) -> Entries<'_, R> {
        Entries { reader: self }
    }

    /// Recreates every remaining record below `root`, which is created if
    /// missing. Nothing is ever written outside `root`: symlinks already on
    /// disk are only followed when they resolve to somewhere inside it.
    pub fn extract_all<P: AsRef<Path>>(&mut self, root: P) -> Result<ExtractStats> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| Error::CreateDirFailed(e, root.to_path_buf()))?;
        let root = root
            .canonicalize()
            .map_err(|e| Error::CreateDirFailed(e, root.to_path_buf()))?;

        let mut stats = ExtractStats::default();

        while let Some(record) = self.next_record()? {
            match record {
                Record::Directory(dir) => {
                    let segments = dir.path.iter().collect::<Vec<_>>();
                    ensure_dirs(&root, &segments, &mut stats)?;
                }
                Record::File(file) => {
                    self.extract_file(&root, &file, &mut stats)?;
                }
            }
        }

        tracing::debug!(
            files = stats.files_extracted,
            dirs = stats.dirs_created,
            bytes = stats.bytes_written,
            "finished extraction"
        );

        Ok(stats)
    }

    fn extract_file(&mut self, root: &Path, file: &FileRecord, stats: &mut ExtractStats) -> Result<()> {
        let segments = file.path.iter().collect::<Vec<_>>();
        // A valid path always has at least one meaningful segment.
        let (name, parents) = match segments.split_last() {
            Some(v) => v,
            None => return Err(Error::PathTraversalRejected(file.path.to_path_buf())),
        };

        let parent = ensure_dirs(root, parents, stats)?;
        let target = parent.join(bytes_to_path_buf(name));

        match fs::symlink_metadata(&target) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(Error::PathTraversalRejected(target));
            }
            Ok(meta) if meta.is_dir() => {
                return Err(Error::CreateFileFailed(
                    std::io::Error::new(ErrorKind::AlreadyExists, "a directory is in the way"),
                    target,
                ));
            }
            _ => {}
        }

        let mut out = File::create(&target).map_err(|e| Error::CreateFileFailed(e, target.clone()))?;

        let written = match self.copy_content(&mut out, Some(&target)) {
            Ok(v) => v,
            Err(e) => {
                drop(out);
                if let Err(remove_err) = fs::remove_file(&target) {
                    tracing::warn!(path = %target.display(), error = %remove_err, "could not remove partial file");
                }
                return Err(e);
            }
        };

        tracing::debug!(path = %target.display(), bytes = written, "extracted file");
        stats.files_extracted += 1;
        stats.bytes_written += written;
        Ok(())
    }

    fn skip_content(&mut self) -> Result<()> {
        if self.pending > 0 {
            self.copy_content(&mut std::io::sink(), None)?;
        }
        Ok(())
    }

    fn copy_content<W: Write>(&mut self, writer: &mut W, dest: Option<&Path>) -> Result<u64> {
        let offset = self.source.position();
        let expected = std::mem::take(&mut self.pending);

        let copied =
            transfer(&mut self.source, writer, expected, &mut self.buf).map_err(|e| match e {
                TransferError::Read(e, copied) if e.kind() == ErrorKind::UnexpectedEof => {
                    truncated(offset, expected, copied)
                }
                TransferError::Read(e, _) => Error::Io(e),
                TransferError::Write(e) => match dest {
                    Some(path) => Error::WriteFailed(e, path.to_path_buf()),
                    None => Error::Io(e),
                },
            });

        let copied = match copied {
            Ok(v) => v,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        if copied < expected {
            self.finished = true;
            return Err(truncated(offset, expected, copied));
        }

        Ok(copied)
    }
}

/// Walks `segments` below `root`, creating each missing directory. An
/// existing symlink is only walked through if it resolves to a directory
/// inside `root`. Returns the deepest directory.
fn ensure_dirs(root: &Path, segments: &[&[u8]], stats: &mut ExtractStats) -> Result<PathBuf> {
    let mut current = root.to_path_buf();

    for segment in segments {
        current.push(bytes_to_path_buf(segment));

        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.is_dir() => {}
            Ok(meta) if meta.file_type().is_symlink() => {
                let target = current
                    .canonicalize()
                    .map_err(|_| Error::PathTraversalRejected(current.clone()))?;
                if !target.starts_with(root) {
                    return Err(Error::PathTraversalRejected(current));
                }
                if !target.is_dir() {
                    return Err(Error::CreateDirFailed(
                        std::io::Error::new(ErrorKind::AlreadyExists, "not a directory"),
                        current,
                    ));
                }
            }
            Ok(_) => {
                return Err(Error::CreateDirFailed(
                    std::io::Error::new(ErrorKind::AlreadyExists, "not a directory"),
                    current,
                ));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => match fs::create_dir(&current) {
                Ok(()) => {
                    tracing::debug!(path = %current.display(), "created directory");
                    stats.dirs_created += 1;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists && current.is_dir() => {}
                Err(e) => return Err(Error::CreateDirFailed(e, current)),
            },
            Err(e) => return Err(Error::CreateDirFailed(e, current)),
        }
    }

    Ok(current)
}

/// Iterator returned by [`ArchiveReader::entries`]. Ends after the first error.
pub struct Entries<'a, R: Read> {
    reader: &'a mut ArchiveReader<R>,
}

impl<R: Read> Iterator for Entries<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_record().transpose()
    }
}

/// Extracts the whole archive in `source` below `root`.
pub fn read_archive<R: Read, P: AsRef<Path>>(source: R, root: P) -> Result<ExtractStats> {
    ArchiveReader::new(source)?.extract_all(root)
}
