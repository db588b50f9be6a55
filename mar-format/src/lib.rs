//! Reading and writing `mar` archives: a version tag followed by directory
//! and file records, closed by a zero-length end marker. Every integer is
//! little-endian.

pub mod compression;
mod counting;
mod de;
mod error;
mod file;
pub mod fs;
mod header;
pub mod path;
mod record;
mod ser;

pub use compression::{Compression, CompressionConfig, Decoder, Encoder};
pub use de::{read_u16_le, read_u32_le};
pub use error::{Corruption, Error, Result};
pub use file::TRANSFER_BUF_SIZE;
#[cfg(feature = "reader")]
pub use file::reader::{read_archive, ArchiveReader, Entries, ExtractStats};
#[cfg(feature = "writer")]
pub use file::writer::{write_archive, ArchiveOptions, ArchiveStats, ArchiveWriter, Warning};
pub use fs::{EntryKind, FileId};
pub use header::{MarHeader, VERSION};
pub use path::{IntoMarPathError, MarPath, RootPath, MAX_PATH_LEN};
pub use record::{DirectoryRecord, FileRecord, Record};
pub use ser::{write_u16_le, write_u32_le};
