//! Byte offset tracking for the archive stream, so records can be logged and
//! corruption reported at the position it was found.

use std::io::{Read, Result, Write};

/// Counts what actually reached the inner writer, which may be less than
/// was offered on a short write.
pub struct CountingWriter<W> {
    inner: W,
    bytes_written: u64,
}

impl<W> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

/// A reader wrapper that counts bytes read through it, so decode errors can
/// name the offset they happened at.
pub struct CountingReader<R> {
    inner: R,
    bytes_read: u64,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
        }
    }

    /// Offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.bytes_read
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts at most two bytes per call.
    struct Narrow(Vec<u8>);

    impl Write for Narrow {
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            let n = buf.len().min(2);
            self.0.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn short_writes_are_counted_as_written() {
        let mut writer = CountingWriter::new(Narrow(vec![]));
        assert_eq!(writer.write(b"abcde").unwrap(), 2);
        assert_eq!(writer.bytes_written(), 2);

        writer.write_all(b"cde").unwrap();
        assert_eq!(writer.bytes_written(), 5);
        assert_eq!(writer.into_inner().0, b"abcde");
    }

    #[test]
    fn position_tracks_reads() {
        let mut reader = CountingReader::new(&b"0123456789"[..]);
        let mut buf = [0u8; 4];

        reader.read_exact(&mut buf).unwrap();
        assert_eq!(reader.position(), 4);

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(reader.position(), 10);
        assert_eq!(reader.into_inner(), b"");
    }
}
