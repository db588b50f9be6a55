use std::io::Write;

use mar_format::{ArchiveReader, Record};
use serde::Serialize;

use crate::cli::ListArgs;
use crate::commands::open_archive;
use crate::error::{Error, Result};
use crate::util::{format_path, format_size};

#[derive(Serialize)]
struct JsonEntry {
    path: String,
    #[serde(rename = "type")]
    entry_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
}

impl From<&Record> for JsonEntry {
    fn from(record: &Record) -> Self {
        match record {
            Record::File(file) => JsonEntry {
                path: file.path.to_string(),
                entry_type: "file",
                size: Some(u64::from(file.size)),
            },
            Record::Directory(dir) => JsonEntry {
                path: dir.path.to_string(),
                entry_type: "directory",
                size: None,
            },
        }
    }
}

pub fn run(args: ListArgs) -> Result<()> {
    let list_error = |source| Error::List {
        path: args.archive.clone(),
        source,
    };

    let source = open_archive(&args.archive)?;
    let mut reader = ArchiveReader::new(source).map_err(list_error)?;
    let records = reader
        .entries()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(list_error)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        list_json(&mut out, &records)
    } else {
        list_compact(&mut out, &records)
    }
    .map_err(|source| Error::Output { source })
}

fn list_json<W: Write>(out: &mut W, records: &[Record]) -> std::io::Result<()> {
    let entries = records.iter().map(JsonEntry::from).collect::<Vec<_>>();
    serde_json::to_writer_pretty(&mut *out, &entries)?;
    writeln!(out)
}

fn list_compact<W: Write>(out: &mut W, records: &[Record]) -> std::io::Result<()> {
    writeln!(out, "{:>12}  Path", "Size")?;
    writeln!(out, "{}", "-".repeat(40))?;

    let mut total_size = 0u64;
    let mut file_count = 0u64;

    for record in records {
        match record {
            Record::Directory(dir) => {
                writeln!(out, "{:>12}  {}", "-", format_path(&dir.path, true))?;
            }
            Record::File(file) => {
                let size = u64::from(file.size);
                total_size += size;
                file_count += 1;
                writeln!(out, "{:>12}  {}", format_size(size), format_path(&file.path, false))?;
            }
        }
    }

    writeln!(out, "{}", "-".repeat(40))?;
    writeln!(out, "{:>12}  {} files", format_size(total_size), file_count)
}
