use std::io::{ErrorKind, Read, Write};

#[cfg(feature = "reader")]
pub mod reader;
#[cfg(feature = "writer")]
pub mod writer;

/// Size of the buffer file contents are streamed through, in both directions.
pub const TRANSFER_BUF_SIZE: usize = 32 * 1024;

pub(crate) fn transfer_buf() -> Box<[u8]> {
    vec![0u8; TRANSFER_BUF_SIZE].into_boxed_slice()
}

/// Which side of a `transfer` failed. A read failure carries how many bytes
/// had been copied before it.
#[derive(Debug)]
pub(crate) enum TransferError {
    Read(std::io::Error, u64),
    Write(std::io::Error),
}

/// Copies exactly `len` bytes from `reader` to `writer` through `buf`, unless
/// `reader` runs dry first. Short reads are retried. Returns the number of
/// bytes copied, which is less than `len` only if the reader was exhausted.
pub(crate) fn transfer<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    len: u64,
    buf: &mut [u8],
) -> Result<u64, TransferError> {
    let mut copied = 0u64;

    while copied < len {
        let want = std::cmp::min(buf.len() as u64, len - copied) as usize;
        let n = match reader.read(&mut buf[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransferError::Read(e, copied)),
        };
        writer.write_all(&buf[..n]).map_err(TransferError::Write)?;
        copied += n as u64;
    }

    Ok(copied)
}
