use std::fs;
use std::io::{BufReader, Cursor, Write};
use std::path::Path;

use mar_format::{
    read_archive, write_archive, ArchiveOptions, ArchiveReader, ArchiveWriter, Compression,
    CompressionConfig, Corruption, Decoder, Encoder, Error, FileId, Record, Warning,
};

fn build_tree(root: &Path) {
    fs::create_dir_all(root.join("src/nested/deeper")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("README"), b"hello\n").unwrap();
    fs::write(root.join("src/zero"), b"").unwrap();
    fs::write(root.join("src/nested/big"), (0..200_000u32).map(|i| i as u8).collect::<Vec<_>>())
        .unwrap();
    fs::write(root.join("src/nested/deeper/leaf.txt"), b"leaf").unwrap();
}

fn assert_same_tree(a: &Path, b: &Path) {
    for entry in fs::read_dir(a).unwrap() {
        let entry = entry.unwrap();
        let other = b.join(entry.file_name());
        let kind = entry.file_type().unwrap();
        if kind.is_dir() {
            assert!(other.is_dir(), "missing directory {}", other.display());
            assert_same_tree(&entry.path(), &other);
        } else {
            assert_eq!(
                fs::read(entry.path()).unwrap(),
                fs::read(&other).unwrap(),
                "content differs for {}",
                other.display()
            );
        }
    }
}

fn archive_tree(src: &Path) -> Vec<u8> {
    let mut writer = ArchiveWriter::new(Vec::new(), ArchiveOptions::default()).unwrap();
    writer.append(src).unwrap();
    writer.finish().unwrap().0
}

/// Where an absolute root ends up once extracted below `out`.
fn extracted(out: &Path, src: &Path) -> std::path::PathBuf {
    out.join(src.strip_prefix("/").unwrap_or(src))
}

#[test]
fn tree_roundtrips() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    build_tree(src.path());

    let bytes = archive_tree(src.path());
    let stats = read_archive(&bytes[..], out.path()).unwrap();

    assert_eq!(stats.files_extracted, 4);
    assert_eq!(stats.bytes_written, 6 + 200_000 + 4);
    let dest = extracted(out.path(), src.path());
    assert!(dest.join("empty").is_dir());
    assert_same_tree(src.path(), &dest);
}

#[test]
fn extraction_is_repeatable() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    build_tree(src.path());
    let bytes = archive_tree(src.path());

    let dest = extracted(out.path(), src.path());

    read_archive(&bytes[..], out.path()).unwrap();
    fs::write(dest.join("README"), b"changed").unwrap();
    let stats = read_archive(&bytes[..], out.path()).unwrap();

    assert_eq!(stats.dirs_created, 0);
    assert_same_tree(src.path(), &dest);
}

#[test]
fn documented_example_layout() {
    // version 1, dir "a", file "a/b.txt" = "hi", dir "a/c", end marker
    let expected: Vec<u8> = [
        &[0x01, 0x00][..],
        &[0x01, 0x80],
        b"a",
        &[0x07, 0x00],
        b"a/b.txt",
        &[0x02, 0x00, 0x00, 0x00],
        b"hi",
        &[0x03, 0x80],
        b"a/c",
        &[0x00, 0x00],
    ]
    .concat();

    let mut reader = ArchiveReader::new(&expected[..]).unwrap();
    let mut seen = vec![];
    while let Some(record) = reader.next_record().unwrap() {
        let mut content = vec![];
        reader.read_content(&mut content).unwrap();
        seen.push((record.path().to_string(), content));
    }
    assert_eq!(
        seen,
        [
            ("a".to_string(), vec![]),
            ("a/b.txt".to_string(), b"hi".to_vec()),
            ("a/c".to_string(), vec![]),
        ]
    );

    let out = tempfile::tempdir().unwrap();
    read_archive(&expected[..], out.path()).unwrap();
    assert_eq!(fs::read(out.path().join("a/b.txt")).unwrap(), b"hi");
    assert!(out.path().join("a/c").is_dir());
}

#[test]
fn crafted_traversal_writes_nothing() {
    let parent = tempfile::tempdir().unwrap();
    let out = parent.path().join("out");
    let bytes: Vec<u8> = [
        &[0x01, 0x00][..],
        &[0x0a, 0x00],
        b"../escaped",
        &[0x01, 0x00, 0x00, 0x00],
        b"x",
        &[0x00, 0x00],
    ]
    .concat();

    let err = read_archive(&bytes[..], &out).unwrap_err();
    assert!(matches!(err, Error::PathTraversalRejected(_)));
    assert!(!parent.path().join("escaped").exists());
}

#[test]
fn truncated_archive_reports_offset() {
    let out = tempfile::tempdir().unwrap();
    let bytes: Vec<u8> = [
        &[0x01, 0x00][..],
        &[0x04, 0x00],
        b"half",
        &[0x08, 0x00, 0x00, 0x00],
        b"1234",
    ]
    .concat();

    let err = read_archive(&bytes[..], out.path()).unwrap_err();
    assert!(matches!(
        err,
        Error::CorruptArchive {
            offset: 12,
            reason: Corruption::Truncated {
                expected: 8,
                actual: 4
            }
        }
    ));
    assert!(!out.path().join("half").exists());
}

#[test]
fn empty_stream_is_corrupt() {
    let out = tempfile::tempdir().unwrap();
    let err = read_archive(&b""[..], out.path()).unwrap_err();
    assert!(matches!(
        err,
        Error::CorruptArchive {
            reason: Corruption::MissingVersion,
            ..
        }
    ));
}

#[test]
fn archive_inside_its_own_root_skips_itself() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("data"), b"data").unwrap();
    let archive_path = src.path().join("self.mar");
    let file = fs::File::create(&archive_path).unwrap();

    let options = ArchiveOptions {
        exclude: FileId::of(&archive_path).unwrap().into_iter().collect(),
    };
    let stats = write_archive([src.path()], &file, options).unwrap();
    drop(file);

    assert_eq!(stats.files, 1);
    assert!(stats
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::SelfInclusionSkipped { .. })));

    let bytes = fs::read(&archive_path).unwrap();
    let mut reader = ArchiveReader::new(&bytes[..]).unwrap();
    let names = reader
        .entries()
        .map(|r| r.unwrap())
        .filter_map(|r| match r {
            Record::File(f) => Some(f.path.to_string()),
            Record::Directory(_) => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with("data"));
}

fn compressed_roundtrip(compression: Compression) {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    build_tree(src.path());

    let encoder = Encoder::new(Vec::new(), &CompressionConfig::new(compression)).unwrap();
    let mut writer = ArchiveWriter::new(encoder, ArchiveOptions::default()).unwrap();
    writer.append(src.path()).unwrap();
    let (encoder, _) = writer.finish().unwrap();
    let mut compressed = encoder.finish().unwrap();
    compressed.flush().unwrap();

    let decoder = Decoder::detect(BufReader::new(Cursor::new(compressed))).unwrap();
    read_archive(decoder, out.path()).unwrap();

    assert_same_tree(src.path(), &extracted(out.path(), src.path()));
}

#[test]
fn stored_stream_roundtrips() {
    compressed_roundtrip(Compression::Stored);
}

#[cfg(feature = "gzip")]
#[test]
fn gzip_stream_roundtrips() {
    compressed_roundtrip(Compression::Gzip);
}

#[cfg(feature = "zstd")]
#[test]
fn zstd_stream_roundtrips() {
    compressed_roundtrip(Compression::Zstd);
}

fn truncated_compressed_stream(compression: Compression) {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    // Poorly compressible content, so half the stream cuts well inside it.
    let mut state = 0x2545_f491_u32;
    let content = (0..300_000)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect::<Vec<_>>();
    fs::write(src.path().join("payload"), &content).unwrap();

    let encoder = Encoder::new(Vec::new(), &CompressionConfig::new(compression)).unwrap();
    let mut writer = ArchiveWriter::new(encoder, ArchiveOptions::default()).unwrap();
    writer.append(src.path()).unwrap();
    let (encoder, _) = writer.finish().unwrap();
    let mut compressed = encoder.finish().unwrap();
    compressed.truncate(compressed.len() / 2);

    let decoder = Decoder::detect(BufReader::new(Cursor::new(compressed))).unwrap();
    let err = read_archive(decoder, out.path()).unwrap_err();
    assert!(
        matches!(
            err,
            Error::CorruptArchive {
                reason: Corruption::Truncated { .. },
                ..
            }
        ),
        "unexpected error: {:?}",
        err
    );
    assert!(!extracted(out.path(), src.path()).join("payload").exists());
}

#[cfg(feature = "gzip")]
#[test]
fn truncated_gzip_stream_is_corrupt() {
    truncated_compressed_stream(Compression::Gzip);
}

#[cfg(feature = "zstd")]
#[test]
fn truncated_zstd_stream_is_corrupt() {
    truncated_compressed_stream(Compression::Zstd);
}
