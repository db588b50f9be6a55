use std::fmt;
use std::io::{BufRead, Read, Result, Write};

#[cfg(feature = "gzip")]
use flate2::{bufread::MultiGzDecoder, write::GzEncoder};

pub mod constants {
    /// Leading bytes of a gzip member.
    pub const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
    /// Leading bytes of a zstd frame.
    pub const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];

    pub const DEFAULT_GZIP_LEVEL: u32 = 6;
    pub const DEFAULT_ZSTD_LEVEL: i32 = 3;
}

use self::constants::*;

/// How the archive stream as a whole is compressed.
#[derive(Clone, Copy, Eq, PartialEq, Default)]
pub enum Compression {
    Stored,
    #[default]
    Gzip,
    Zstd,
}

impl Compression {
    pub const fn available_variants() -> &'static [&'static str] {
        &["stored", "gzip", "zstd"]
    }

    /// Guesses the compression of a stream from its magic number without
    /// consuming anything. Anything unrecognised is taken to be stored.
    pub fn detect<R: BufRead>(reader: &mut R) -> Result<Compression> {
        let head = reader.fill_buf()?;

        let compression = if head.starts_with(ZSTD_MAGIC) {
            Compression::Zstd
        } else if head.starts_with(GZIP_MAGIC) {
            Compression::Gzip
        } else {
            Compression::Stored
        };

        tracing::debug!(%compression, "detected stream compression");
        Ok(compression)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Compression::Stored => "stored",
            Compression::Gzip => "gzip",
            Compression::Zstd => "Zstandard",
        };

        write!(f, "{}", s)
    }
}

impl fmt::Debug for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::str::FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "stored" | "none" => Ok(Compression::Stored),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "zstd" | "zstandard" => Ok(Compression::Zstd),
            _ => Err(format!("Unknown compression method: {}", s)),
        }
    }
}

/// A compression method plus its optional level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressionConfig {
    pub compression: Compression,
    pub level: Option<i32>,
}

impl CompressionConfig {
    pub fn new(compression: Compression) -> Self {
        Self {
            compression,
            level: None,
        }
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }
}

fn unsupported(compression: Compression) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("Compiled without support for {:?}", compression),
    )
}

/// A sink that transparently compresses everything written to it.
pub enum Encoder<W: Write> {
    Stored(W),
    #[cfg(feature = "gzip")]
    Gzip(GzEncoder<W>),
    #[cfg(feature = "zstd")]
    Zstd(zstd::Encoder<'static, W>),
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W, config: &CompressionConfig) -> Result<Encoder<W>> {
        match config.compression {
            Compression::Stored => Ok(Encoder::Stored(writer)),
            #[cfg(feature = "gzip")]
            Compression::Gzip => {
                let level = config
                    .level
                    .map(|l| l.clamp(0, 9) as u32)
                    .unwrap_or(DEFAULT_GZIP_LEVEL);
                Ok(Encoder::Gzip(GzEncoder::new(
                    writer,
                    flate2::Compression::new(level),
                )))
            }
            #[cfg(feature = "zstd")]
            Compression::Zstd => {
                let level = config.level.unwrap_or(DEFAULT_ZSTD_LEVEL);
                Ok(Encoder::Zstd(zstd::Encoder::new(writer, level)?))
            }
            #[allow(unreachable_patterns)]
            missing => Err(unsupported(missing)),
        }
    }

    /// Writes any trailing frame data and hands back the inner writer.
    pub fn finish(self) -> Result<W> {
        match self {
            Encoder::Stored(mut w) => {
                w.flush()?;
                Ok(w)
            }
            #[cfg(feature = "gzip")]
            Encoder::Gzip(e) => e.finish(),
            #[cfg(feature = "zstd")]
            Encoder::Zstd(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match self {
            Encoder::Stored(w) => w.write(buf),
            #[cfg(feature = "gzip")]
            Encoder::Gzip(e) => e.write(buf),
            #[cfg(feature = "zstd")]
            Encoder::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self {
            Encoder::Stored(w) => w.flush(),
            #[cfg(feature = "gzip")]
            Encoder::Gzip(e) => e.flush(),
            #[cfg(feature = "zstd")]
            Encoder::Zstd(e) => e.flush(),
        }
    }
}

/// A source that transparently decompresses everything read from it.
pub enum Decoder<R: BufRead> {
    Stored(R),
    #[cfg(feature = "gzip")]
    Gzip(MultiGzDecoder<R>),
    #[cfg(feature = "zstd")]
    Zstd(zstd::Decoder<'static, R>),
}

impl<R: BufRead> Decoder<R> {
    pub fn new(reader: R, compression: Compression) -> Result<Decoder<R>> {
        match compression {
            Compression::Stored => Ok(Decoder::Stored(reader)),
            #[cfg(feature = "gzip")]
            Compression::Gzip => Ok(Decoder::Gzip(MultiGzDecoder::new(reader))),
            #[cfg(feature = "zstd")]
            Compression::Zstd => Ok(Decoder::Zstd(zstd::Decoder::with_buffer(reader)?)),
            #[allow(unreachable_patterns)]
            missing => Err(unsupported(missing)),
        }
    }

    /// Sniffs the compression of `reader` and wraps it accordingly.
    pub fn detect(mut reader: R) -> Result<Decoder<R>> {
        let compression = Compression::detect(&mut reader)?;
        Decoder::new(reader, compression)
    }
}

impl<R: BufRead> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Decoder::Stored(r) => r.read(buf),
            #[cfg(feature = "gzip")]
            Decoder::Gzip(d) => d.read(buf),
            #[cfg(feature = "zstd")]
            Decoder::Zstd(d) => d.read(buf),
        }
    }
}
