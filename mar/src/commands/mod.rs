mod create;
mod extract;
mod list;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use mar_format::Decoder;

use crate::error::{Error, Result};
use crate::util::is_stdio;

pub use create::run as create;
pub use extract::run as extract;
pub use list::run as list;

/// Opens `path` (or stdin for `-`) and wraps it in a decoder for whatever
/// compression the stream starts with.
pub(crate) fn open_archive(path: &Path) -> Result<Decoder<Box<dyn BufRead>>> {
    let source: Box<dyn BufRead> = if is_stdio(path) {
        Box::new(std::io::stdin().lock())
    } else {
        let file = File::open(path).map_err(|source| Error::OpenArchive {
            path: path.to_path_buf(),
            source,
        })?;
        Box::new(BufReader::new(file))
    };

    Decoder::detect(source).map_err(|source| Error::OpenArchive {
        path: path.to_path_buf(),
        source,
    })
}
