use crate::path::MarPath;

/// Set in `pathLen` to mark a directory record.
pub(crate) const DIR_MARK_BIT: u16 = 0x8000;

/// A `pathLen` of zero closes the record sequence.
pub(crate) const END_MARKER: u16 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    File(FileRecord),
    Directory(DirectoryRecord),
}

impl Record {
    #[inline(always)]
    pub fn as_file(&self) -> Option<&FileRecord> {
        match self {
            Record::File(file) => Some(file),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_directory(&self) -> Option<&DirectoryRecord> {
        match self {
            Record::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn path(&self) -> &MarPath {
        match self {
            Record::File(file) => file.path(),
            Record::Directory(dir) => dir.path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    /// The path of the directory. A path is always relative (no leading separator),
    /// always delimited by `/`, and may not contain any `..` path chunks.
    pub path: MarPath,
}

impl DirectoryRecord {
    #[inline(always)]
    pub fn path(&self) -> &MarPath {
        &self.path
    }
}

/// The header of a file record. Exactly `size` content bytes follow it in the
/// stream and must be consumed before the next record is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// The path of the file. A path is always relative (no leading separator),
    /// always delimited by `/`, and may not contain any `..` path chunks.
    pub path: MarPath,

    /// The exact length of the content, as captured when the file was archived.
    pub size: u32,
}

impl FileRecord {
    #[inline(always)]
    pub fn path(&self) -> &MarPath {
        &self.path
    }

    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.size
    }
}
