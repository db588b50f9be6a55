use std::path::PathBuf;

use miette::Diagnostic;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error("Cannot open archive `{}`", .path.display())]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create archive `{}`", path.display())]
    CreateArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive already exists: `{}`", path.display())]
    #[diagnostic(help("Use -f/--force to overwrite"))]
    ArchiveExists { path: PathBuf },

    #[error("Cannot write archive `{}`", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: mar_format::Error,
    },

    #[error("Cannot extract archive `{}`", path.display())]
    #[diagnostic(help("Is this a valid mar archive?"))]
    Extract {
        path: PathBuf,
        #[source]
        source: mar_format::Error,
    },

    #[error("Cannot list archive `{}`", path.display())]
    #[diagnostic(help("Is this a valid mar archive?"))]
    List {
        path: PathBuf,
        #[source]
        source: mar_format::Error,
    },

    #[error("Cannot write output")]
    Output {
        #[source]
        source: std::io::Error,
    },
}
