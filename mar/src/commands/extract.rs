use std::path::PathBuf;

use mar_format::ArchiveReader;

use crate::cli::ExtractArgs;
use crate::commands::open_archive;
use crate::error::{Error, Result};
use crate::util::format_size;

pub fn run(args: ExtractArgs) -> Result<()> {
    let output_path = args.output.unwrap_or_else(|| PathBuf::from("."));

    let extract_error = |source| Error::Extract {
        path: args.archive.clone(),
        source,
    };

    let source = open_archive(&args.archive)?;
    let mut reader = ArchiveReader::new(source).map_err(extract_error)?;
    let stats = reader.extract_all(&output_path).map_err(extract_error)?;

    if !args.quiet {
        // Keep stdout free for whatever the archive was piped alongside.
        eprintln!(
            "Extracted {} files ({}) to {}",
            stats.files_extracted,
            format_size(stats.bytes_written),
            output_path.display()
        );
    }

    Ok(())
}
