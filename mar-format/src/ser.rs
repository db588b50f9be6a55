use std::io::{Result, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::{
    header::MarHeader,
    path::MarPath,
    record::{DirectoryRecord, FileRecord, Record, DIR_MARK_BIT, END_MARKER},
};

/// Write a u16 in little-endian format
pub fn write_u16_le<W: Write>(writer: &mut W, value: u16) -> Result<()> {
    writer.write_u16::<LittleEndian>(value)
}

/// Write a u32 in little-endian format
pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_u32::<LittleEndian>(value)
}

pub(crate) trait Serialize {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()>;
}

/// The zero-length record that terminates an archive.
pub(crate) struct EndMarker;

#[inline(always)]
fn path_len(path: &MarPath) -> u16 {
    // MarPath never exceeds MAX_PATH_LEN, which fits in 15 bits.
    path.len() as u16
}

impl Serialize for MarPath {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.as_bytes())
    }
}

impl Serialize for DirectoryRecord {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_u16_le(writer, path_len(&self.path) | DIR_MARK_BIT)?;
        self.path.write(writer)
    }
}

/// Writes the header only; the caller streams `size` content bytes after it.
impl Serialize for FileRecord {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_u16_le(writer, path_len(&self.path))?;
        self.path.write(writer)?;
        write_u32_le(writer, self.size)
    }
}

impl Serialize for Record {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Record::File(file) => file.write(writer),
            Record::Directory(directory) => directory.write(writer),
        }
    }
}

impl Serialize for EndMarker {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_u16_le(writer, END_MARKER)
    }
}

impl Serialize for MarHeader {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_u16_le(writer, self.version)
    }
}
