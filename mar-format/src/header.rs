/// The format version written by this crate.
pub const VERSION: u16 = 1;

/// The version tag that opens every archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarHeader {
    pub version: u16,
}

impl MarHeader {
    pub fn new(version: u16) -> MarHeader {
        MarHeader { version }
    }
}

impl Default for MarHeader {
    fn default() -> Self {
        MarHeader::new(VERSION)
    }
}
