use std::io::{ErrorKind, Read};
use std::path::PathBuf;

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    counting::CountingReader,
    error::{Corruption, Error, Result},
    header::MarHeader,
    path::{validate, IntoMarPathError, MarPath, MAX_PATH_LEN},
    record::{DirectoryRecord, FileRecord, Record, DIR_MARK_BIT, END_MARKER},
};

/// Reads until `buf` is full or the stream ends, returning how many bytes
/// were read. Short reads are retried.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> std::io::Result<Option<[u8; N]>> {
    let mut buf = [0u8; N];
    match read_full(reader, &mut buf)? {
        0 => Ok(None),
        n if n == N => Ok(Some(buf)),
        n => Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("stream ended after {} of {} bytes", n, N),
        )),
    }
}

/// Read a u16 in little-endian format, or `None` if the stream is exhausted.
pub fn read_u16_le<R: Read>(reader: &mut R) -> std::io::Result<Option<u16>> {
    Ok(read_array::<R, 2>(reader)?.map(|buf| LittleEndian::read_u16(&buf)))
}

/// Read a u32 in little-endian format, or `None` if the stream is exhausted.
pub fn read_u32_le<R: Read>(reader: &mut R) -> std::io::Result<Option<u32>> {
    Ok(read_array::<R, 4>(reader)?.map(|buf| LittleEndian::read_u32(&buf)))
}

pub(crate) fn truncated(offset: u64, expected: u64, actual: u64) -> Error {
    Error::CorruptArchive {
        offset,
        reason: Corruption::Truncated { expected, actual },
    }
}

/// Maps a failure reading a fixed-size field at `offset` onto an archive error.
fn field_error(e: std::io::Error, offset: u64, expected: u64) -> Error {
    if e.kind() == ErrorKind::UnexpectedEof {
        truncated(offset, expected, 0)
    } else {
        Error::Io(e)
    }
}

pub(crate) trait Deserialize: Sized {
    fn read<R: Read>(reader: &mut CountingReader<R>) -> Result<Self>;
}

impl Deserialize for MarHeader {
    fn read<R: Read>(reader: &mut CountingReader<R>) -> Result<Self> {
        let start = reader.position();
        let version = read_u16_le(reader)
            .map_err(|e| field_error(e, start, 2))?
            .ok_or(Error::CorruptArchive {
                offset: start,
                reason: Corruption::MissingVersion,
            })?;

        tracing::debug!(
            start = format_args!("{:#x}", start),
            end = format_args!("{:#x}", reader.position()),
            version,
            "deserialized MarHeader"
        );

        Ok(MarHeader { version })
    }
}

fn read_path<R: Read>(reader: &mut CountingReader<R>, len: usize) -> Result<MarPath> {
    debug_assert!(len <= MAX_PATH_LEN);
    let offset = reader.position();
    let mut buf = vec![0u8; len];
    let n = read_full(reader, &mut buf).map_err(|e| field_error(e, offset, len as u64))?;
    if n < len {
        return Err(truncated(offset, len as u64, n as u64));
    }

    match validate(&buf) {
        Ok(()) => Ok(MarPath(buf)),
        Err(IntoMarPathError::ParentDir | IntoMarPathError::Absolute) => Err(
            Error::PathTraversalRejected(PathBuf::from(String::from_utf8_lossy(&buf).as_ref())),
        ),
        Err(e) => Err(Error::CorruptArchive {
            offset,
            reason: Corruption::InvalidPath(e),
        }),
    }
}

/// Decodes the next record header. `None` means the record sequence is over,
/// either through an end marker or because the stream ended between records.
pub(crate) fn read_record<R: Read>(reader: &mut CountingReader<R>) -> Result<Option<Record>> {
    let start = reader.position();
    let path_len = match read_u16_le(reader).map_err(|e| field_error(e, start, 2))? {
        None => {
            tracing::debug!(
                start = format_args!("{:#x}", start),
                "stream ended without an end marker"
            );
            return Ok(None);
        }
        Some(END_MARKER) => {
            tracing::debug!(start = format_args!("{:#x}", start), "deserialized end marker");
            return Ok(None);
        }
        Some(v) => v,
    };

    let is_dir = path_len & DIR_MARK_BIT != 0;
    let len = (path_len & !DIR_MARK_BIT) as usize;
    let path = read_path(reader, len)?;

    let record = if is_dir {
        Record::Directory(DirectoryRecord { path })
    } else {
        let offset = reader.position();
        let size = read_u32_le(reader)
            .map_err(|e| field_error(e, offset, 4))?
            .ok_or_else(|| truncated(offset, 4, 0))?;
        Record::File(FileRecord { path, size })
    };

    let end = reader.position();
    tracing::debug!(
        start = format_args!("{:#x}", start),
        end = format_args!("{:#x}", end),
        bytes = end - start,
        path = %record.path(),
        dir = is_dir,
        "deserialized Record"
    );

    Ok(Some(record))
}
