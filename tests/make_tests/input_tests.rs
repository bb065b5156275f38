//! Tests for make-format input
//!
//! These tests verify:
//! - Parsing of well-formed `+klen,dlen:key->data` records
//! - Keys and data containing separators and newlines
//! - Rejection of malformed input with the failing record number
//! - Building a file from an input file

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use mcdb::make::input::{make_file, make_from_reader};
use mcdb::{Config, Mcdb, McdbBuilder, McdbError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.mcdb");
    (temp_dir, path)
}

/// Parse `text` into an in-memory container
fn build_from_text(text: &[u8]) -> mcdb::Result<Mcdb> {
    let mut builder = McdbBuilder::new(Cursor::new(Vec::new()))?;
    make_from_reader(text, &mut builder)?;
    builder.finish()?;
    Mcdb::from_bytes(builder.into_inner()?.into_inner())
}

/// Record number reported by a parse failure
fn failing_record(text: &[u8]) -> u64 {
    match build_from_text(text) {
        Err(McdbError::Input { record, .. }) => record,
        other => panic!("expected input error, got {:?}", other.map(|db| db.len())),
    }
}

// =============================================================================
// Well-Formed Input
// =============================================================================

#[test]
fn test_parse_records() {
    let db = build_from_text(b"+3,10:123->0123456789\n+3,3:abc->def\n\n").unwrap();

    assert_eq!(db.len(), 2);
    assert_eq!(db.get(b"123").unwrap(), Some(&b"0123456789"[..]));
    assert_eq!(db.get(b"abc").unwrap(), Some(&b"def"[..]));
}

#[test]
fn test_parse_empty_input() {
    let db = build_from_text(b"\n").unwrap();
    assert!(db.is_empty());
}

#[test]
fn test_parse_binary_fields() {
    // Fields are length-delimited, so separators inside them are data
    let db = build_from_text(b"+4,5:a->b->->\n:,\n+0,0:->\n\n").unwrap();

    assert_eq!(db.len(), 2);
    assert_eq!(db.get(b"a->b").unwrap(), Some(&b"->\n:,"[..]));
    assert_eq!(db.get(b"").unwrap(), Some(&b""[..]));
}

#[test]
fn test_parse_counts_records() {
    let mut builder = McdbBuilder::new(Cursor::new(Vec::new())).unwrap();
    let count = make_from_reader(&b"+1,1:a->1\n+1,1:a->2\n+1,1:b->3\n\n"[..], &mut builder).unwrap();
    assert_eq!(count, 3);
    assert_eq!(builder.record_count(), 3);
}

#[test]
fn test_trailing_bytes_after_blank_line_are_ignored() {
    let db = build_from_text(b"+1,1:k->v\n\ngarbage").unwrap();
    assert_eq!(db.len(), 1);
}

// =============================================================================
// Malformed Input
// =============================================================================

#[test]
fn test_missing_blank_line() {
    assert_eq!(failing_record(b"+1,1:k->v\n"), 1);
    assert_eq!(failing_record(b""), 0);
}

#[test]
fn test_bad_record_start() {
    assert_eq!(failing_record(b"+1,1:k->v\n-1,1:k->v\n\n"), 1);
}

#[test]
fn test_bad_length_fields() {
    assert_eq!(failing_record(b"+,1:k->v\n\n"), 0);
    assert_eq!(failing_record(b"+1x,1:k->v\n\n"), 0);
    assert_eq!(failing_record(b"+1,-1:k->v\n\n"), 0);
    assert_eq!(failing_record(b"+1;1:k->v\n\n"), 0);
    assert_eq!(failing_record(b"+12345678901,1:k->v\n\n"), 0);
    assert_eq!(failing_record(b"+4294967295,1:k->v\n\n"), 0);
}

#[test]
fn test_bad_separators() {
    assert_eq!(failing_record(b"+1,1:k-v\n\n"), 0);
    assert_eq!(failing_record(b"+1,1:k=>v\n\n"), 0);
    assert_eq!(failing_record(b"+1,1:k->vv\n\n"), 0);
}

#[test]
fn test_truncated_data() {
    assert_eq!(failing_record(b"+1,1:k->v\n+1,10:k->short"), 1);
}

// =============================================================================
// File Input
// =============================================================================

#[test]
fn test_make_file_from_path() {
    let (temp, db_path) = setup_temp_dir();
    let input = temp.path().join("input.txt");
    fs::write(&input, b"+5,5:hello->world\n+3,3:foo->bar\n\n").unwrap();

    let config = Config::builder().fsync_on_finish(false).build();
    let summary = make_file(Some(&input), &db_path, &config).unwrap();
    assert_eq!(summary.records, 2);

    let db = Mcdb::open(&db_path).unwrap();
    assert_eq!(db.get(b"hello").unwrap(), Some(&b"world"[..]));
}

#[test]
fn test_make_file_bad_input_leaves_no_container() {
    let (temp, db_path) = setup_temp_dir();
    let input = temp.path().join("input.txt");
    fs::write(&input, b"+5,5:hello->world\n+oops\n\n").unwrap();

    let config = Config::builder().fsync_on_finish(false).build();
    let err = make_file(Some(&input), &db_path, &config).unwrap_err();
    assert!(matches!(err, McdbError::Input { record: 1, .. }));

    assert!(!db_path.exists());
    // Only the input file remains
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}
