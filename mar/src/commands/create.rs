use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use mar_format::{ArchiveOptions, ArchiveStats, ArchiveWriter, CompressionConfig, Encoder, FileId};

use crate::cli::CreateArgs;
use crate::error::{Error, Result};
use crate::util::{format_size, is_stdio};

pub fn run(args: CreateArgs) -> Result<()> {
    let config = args.compression_config();

    let stats = if is_stdio(&args.archive) {
        create_to_stdout(&args, &config)?
    } else {
        create_to_file(&args, &config)?
    };

    if !args.quiet {
        // stdout may be carrying the archive itself.
        eprintln!(
            "Archived {} files and {} directories ({}) with {}",
            stats.files,
            stats.dirs,
            format_size(stats.bytes),
            config.compression
        );
        if !stats.warnings.is_empty() {
            eprintln!("{} entries were skipped", stats.warnings.len());
        }
    }

    Ok(())
}

fn write_all<W: Write>(
    sink: W,
    paths: &[PathBuf],
    config: &CompressionConfig,
    options: ArchiveOptions,
    archive: &Path,
) -> Result<(W, ArchiveStats)> {
    let encoder = Encoder::new(sink, config).map_err(|source| Error::CreateArchive {
        path: archive.to_path_buf(),
        source,
    })?;

    let archive_error = |source| Error::Archive {
        path: archive.to_path_buf(),
        source,
    };

    let mut writer = ArchiveWriter::new(encoder, options).map_err(archive_error)?;
    for path in paths {
        writer.append(path).map_err(archive_error)?;
    }
    let (encoder, stats) = writer.finish().map_err(archive_error)?;

    let sink = encoder.finish().map_err(|source| Error::CreateArchive {
        path: archive.to_path_buf(),
        source,
    })?;

    Ok((sink, stats))
}

fn create_to_file(args: &CreateArgs, config: &CompressionConfig) -> Result<ArchiveStats> {
    let archive_path = &args.archive;

    if archive_path.exists() && !args.force {
        return Err(Error::ArchiveExists {
            path: archive_path.clone(),
        });
    }

    let create_error = |source| Error::CreateArchive {
        path: archive_path.clone(),
        source,
    };

    // The archive is built next to its destination and renamed into place, so
    // a failure never leaves a half-written archive behind.
    let dir = match archive_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let temp = tempfile::Builder::new()
        .prefix(".mar-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(create_error)?;

    // With --force the archive being replaced may sit inside a root too.
    let mut exclude = Vec::with_capacity(2);
    exclude.extend(FileId::of(temp.path()).map_err(create_error)?);
    if archive_path.exists() {
        exclude.extend(FileId::of(archive_path).map_err(create_error)?);
    }
    let options = ArchiveOptions { exclude };

    let (sink, stats) = write_all(
        BufWriter::new(temp.as_file()),
        &args.paths,
        config,
        options,
        archive_path,
    )?;
    sink.into_inner()
        .map_err(|e| create_error(e.into_error()))?
        .sync_all()
        .map_err(create_error)?;

    temp.persist(archive_path)
        .map_err(|e| create_error(e.error))?;

    tracing::info!(path = %archive_path.display(), "archive written");
    Ok(stats)
}

fn create_to_stdout(args: &CreateArgs, config: &CompressionConfig) -> Result<ArchiveStats> {
    let stdout = std::io::stdout();
    let options = ArchiveOptions {
        exclude: stdout_id(&stdout).into_iter().collect(),
    };

    let (mut sink, stats) = write_all(
        BufWriter::new(stdout.lock()),
        &args.paths,
        config,
        options,
        &args.archive,
    )?;
    sink.flush().map_err(|source| Error::Output { source })?;

    Ok(stats)
}

/// When stdout is redirected into a regular file, that file is the archive and
/// must not be archived into itself.
#[cfg(unix)]
fn stdout_id(stdout: &std::io::Stdout) -> Option<FileId> {
    use std::os::fd::AsFd;

    let fd = stdout.as_fd().try_clone_to_owned().ok()?;
    let meta = std::fs::File::from(fd).metadata().ok()?;
    if meta.is_file() {
        FileId::from_metadata(&meta, Path::new("-"))
    } else {
        None
    }
}

#[cfg(not(unix))]
fn stdout_id(_stdout: &std::io::Stdout) -> Option<FileId> {
    None
}
