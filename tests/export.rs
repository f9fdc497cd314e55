use std::fs;
use std::path::{Path, PathBuf};

use mac_collection::{
    build_collection, export_collection, write_collection, AudioTags, ExportStamp, ScanConfig,
    ScanError, ScanErrorKind, TagExtractor,
};

/// Stream properties keyed by extension; the byte size is the real one.
struct FixedExtractor;

impl TagExtractor for FixedExtractor {
    fn extract(&self, path: &Path) -> Result<AudioTags, ScanError> {
        let size = fs::metadata(path)
            .map_err(|e| ScanError::extraction(path.to_path_buf(), e.to_string()))?
            .len();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        if name.starts_with("broken") {
            return Err(ScanError::extraction(path.to_path_buf(), "unreadable header"));
        }
        let tags = if name.ends_with(".flac") {
            AudioTags::new(size, 200.9, 44100)
                .with_channels(2)
                .with_bit_depth(16)
        } else {
            AudioTags::new(size, 120.4, 44100)
                .with_channels(2)
                .with_title("T")
        };
        Ok(tags)
    }
}

fn write_file(path: PathBuf, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![7u8; len]).unwrap();
}

fn lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8(bytes.to_vec())
        .unwrap()
        .split_terminator('\n')
        .map(str::to_string)
        .collect()
}

#[test]
fn exports_single_volume_collection() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("R");
    write_file(root.join("V1/song.mp3"), 4096);
    let output = dir.path().join("out.col");

    let config = ScanConfig::builder()
        .root(root)
        .output(output.clone())
        .build();
    let summary = export_collection(&config, &FixedExtractor).unwrap();
    assert_eq!(summary.files, 1);
    assert_eq!(summary.volumes, 1);

    let lines = lines(&fs::read(&output).unwrap());
    assert_eq!(
        lines,
        vec![
            "\x014\x02120\x030\x041\x0545641\x06",
            "\tV1\x014\x02120\x030\x041\x0545641\x06-1832560112\x072\x08",
            "\t\tsong.mp3\x014\x02120\x034410\x041\x051\x060\x07\x15T\x16\x17\x18\x19\x1a\x1b\x1c",
        ]
    );
}

#[test]
fn root_as_volume_counts_the_subdirectory_as_folder() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("R");
    write_file(root.join("V1/song.mp3"), 4096);
    let output = dir.path().join("out.col");

    let config = ScanConfig::builder()
        .root(root)
        .output(output.clone())
        .root_as_volume()
        .build();
    let summary = export_collection(&config, &FixedExtractor).unwrap();
    assert_eq!(summary.folders, 1);
    assert_eq!(summary.files, 1);

    let lines = lines(&fs::read(&output).unwrap());
    assert_eq!(lines[0], "\x014\x02120\x031\x041\x0545641\x06");
    assert!(lines[1].starts_with("\tR\x014\x02120\x031\x041\x05"));
    assert_eq!(lines[2], "\t\tV1\x014\x02120\x030\x041\x05");
    assert!(lines[3].starts_with("\t\t\tsong.mp3\x014\x02120\x034410\x041\x05"));
}

#[test]
fn flac_duration_is_negative() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path().join("lib/V/Album/a.flac"), 2048);
    let tree = build_collection(&dir.path().join("lib"), &FixedExtractor).unwrap();

    let output = dir.path().join("out.col");
    write_collection(&tree, &output, &ExportStamp::default()).unwrap();
    let lines = lines(&fs::read(&output).unwrap());
    assert_eq!(
        lines[3],
        "\t\t\ta.flac\x012\x02-200\x034410\x041\x0535\x0616\x07\x15\x16\x17\x18\x19\x1a\x1b\x1c"
    );
    // Aggregates keep the unsigned duration
    assert_eq!(lines[2], "\t\tAlbum\x012\x02200\x030\x041\x05");
}

#[test]
fn serializing_twice_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("lib");
    write_file(root.join("V1/A/a.mp3"), 5000);
    write_file(root.join("V1/A/B/b.flac"), 7000);
    write_file(root.join("V2/c.mp3"), 100);
    let tree = build_collection(&root, &FixedExtractor).unwrap();

    let first = dir.path().join("1.col");
    let second = dir.path().join("2.col");
    write_collection(&tree, &first, &ExportStamp::default()).unwrap();
    write_collection(&tree, &second, &ExportStamp::default()).unwrap();
    assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
}

#[test]
fn existing_output_is_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path().join("lib/V1/song.mp3"), 4096);
    let output = dir.path().join("out.col");
    fs::write(&output, b"previous export").unwrap();

    let config = ScanConfig::builder()
        .root(dir.path().join("lib"))
        .output(output.clone())
        .build();
    let err = export_collection(&config, &FixedExtractor).unwrap_err();
    assert_eq!(err.kind, ScanErrorKind::IoError);
    assert_eq!(fs::read(&output).unwrap(), b"previous export");
}

#[test]
fn extraction_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path().join("lib/V1/good.mp3"), 10);
    write_file(dir.path().join("lib/V1/broken.mp3"), 10);
    let output = dir.path().join("out.col");

    let config = ScanConfig::builder()
        .root(dir.path().join("lib"))
        .output(output.clone())
        .build();
    let err = export_collection(&config, &FixedExtractor).unwrap_err();
    assert_eq!(err.kind, ScanErrorKind::Extraction);
    assert_eq!(err.path, Some(dir.path().join("lib/V1/broken.mp3")));
    assert!(!output.exists());
}

#[cfg(unix)]
#[test]
fn broken_symlink_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("lib");
    write_file(root.join("V1/A/a.mp3"), 10);
    std::os::unix::fs::symlink(root.join("nowhere"), root.join("V1/A/dead")).unwrap();
    let output = dir.path().join("out.col");

    let config = ScanConfig::builder().root(root.clone()).output(output.clone()).build();
    let err = export_collection(&config, &FixedExtractor).unwrap_err();
    assert_eq!(err.kind, ScanErrorKind::UnexpectedEntry);
    assert_eq!(err.path, Some(root.join("V1/A/dead")));
    assert!(!output.exists());
}

#[test]
fn missing_output_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = ScanConfig::new(dir.path().to_path_buf());
    let err = export_collection(&config, &FixedExtractor).unwrap_err();
    assert_eq!(err.kind, ScanErrorKind::IoError);
}
