use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mar_format::{Compression, CompressionConfig};

#[derive(Debug, Parser)]
#[command(
    name = "mar",
    about = "Create, list and extract mar archives.",
    version
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins if set.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(visible_alias = "c", about = "Create a new archive")]
    Create(CreateArgs),

    #[command(visible_alias = "x", about = "Extract files from an archive")]
    Extract(ExtractArgs),

    #[command(visible_aliases = ["l", "ls"], about = "List files in an archive")]
    List(ListArgs),
}

#[derive(Debug, clap::Args)]
#[command(after_help = "\
\x1b[1m\x1b[4mExamples:\x1b[0m
  mar create backup.mar src/ README.md
  mar create --zstd -l 19 backup.mar src/
  mar create - . | ssh host mar extract - -o restore/")]
pub struct CreateArgs {
    /// Output archive path, or `-` for stdout
    pub archive: PathBuf,

    /// Files and directories to archive
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Gzip compression (default)
    #[arg(long, group = "compression")]
    pub gzip: bool,

    /// Zstandard compression
    #[arg(long, group = "compression")]
    pub zstd: bool,

    /// No compression
    #[arg(long, group = "compression")]
    pub stored: bool,

    /// Compression level (gzip: 0-9, zstd: 1-22)
    #[arg(short = 'l', long)]
    pub level: Option<i32>,

    /// Overwrite existing archive
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Suppress output
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl CreateArgs {
    pub fn compression_config(&self) -> CompressionConfig {
        let compression = if self.stored {
            Compression::Stored
        } else if self.zstd {
            Compression::Zstd
        } else {
            Compression::Gzip
        };

        let config = CompressionConfig::new(compression);
        match self.level {
            Some(level) => config.with_level(level),
            None => config,
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct ExtractArgs {
    /// Path to the archive to extract, or `-` for stdin
    pub archive: PathBuf,

    /// Output directory (defaults to current directory)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    /// Path to the archive, or `-` for stdin
    pub archive: PathBuf,

    /// Output in JSON format
    #[arg(short = 'j', long)]
    pub json: bool,
}
