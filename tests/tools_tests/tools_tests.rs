//! Tests for whole-container tools
//!
//! These tests verify:
//! - dump output feeds back into make and reproduces the container
//! - stats reaches every record and its histogram sums to the record count
//! - stats reports records the index cannot reach
//! - uniq keeps the first or last value of duplicated keys
//! - get prints the selected value(s) and reports misses

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use mcdb::make::input::make_from_reader;
use mcdb::tools::{self, has_unique_keys, Keep, Seq};
use mcdb::{Config, Mcdb, McdbBuilder, McdbError, McdbMake};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_db() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.mcdb");
    (temp_dir, path)
}

fn test_config() -> Config {
    Config::builder().fsync_on_finish(false).build()
}

fn create_db(path: &PathBuf, records: &[(&[u8], &[u8])]) -> Mcdb {
    let mut make = McdbMake::create(path, &test_config()).unwrap();
    for (key, value) in records {
        make.add(key, value).unwrap();
    }
    make.finish().unwrap();
    Mcdb::open(path).unwrap()
}

/// A (key, value) pair of byte strings
fn rec<'a>(key: &'a [u8], value: &'a [u8]) -> (&'a [u8], &'a [u8]) {
    (key, value)
}

fn sample_records() -> Vec<(&'static [u8], &'static [u8])> {
    vec![
        rec(b"123", b"0123456789"),
        rec(b"abc", b"def"),
        rec(b"123", b"repeat"),
        rec(b"alphabet", b"soup"),
        rec(b"123", b"again"),
    ]
}

fn collect_items(db: &Mcdb) -> Vec<(Vec<u8>, Vec<u8>)> {
    db.items()
        .map(|r| {
            let (k, v) = r.unwrap();
            (k.to_vec(), v.to_vec())
        })
        .collect()
}

// =============================================================================
// Dump Tests
// =============================================================================

#[test]
fn test_dump_round_trip() {
    let (_temp, path) = setup_temp_db();
    let mut records = sample_records();
    records.push(rec(b"line\nbreak", b"+1,1:x->y\n"));
    let db = create_db(&path, &records);

    let mut text = Vec::new();
    let written = tools::dump(&db, &mut text).unwrap();
    assert_eq!(written, 6);
    assert!(text.starts_with(b"+3,10:123->0123456789\n"));
    assert!(text.ends_with(b"\n\n"));

    let mut builder = McdbBuilder::new(Cursor::new(Vec::new())).unwrap();
    assert_eq!(make_from_reader(&text[..], &mut builder).unwrap(), 6);
    builder.finish().unwrap();
    let rebuilt = Mcdb::from_bytes(builder.into_inner().unwrap().into_inner()).unwrap();

    assert_eq!(collect_items(&rebuilt), collect_items(&db));
    // Same records in the same order give the same bytes
    assert_eq!(rebuilt.as_bytes(), db.as_bytes());
}

#[test]
fn test_dump_empty() {
    let (_temp, path) = setup_temp_db();
    let db = create_db(&path, &[]);

    let mut text = Vec::new();
    assert_eq!(tools::dump(&db, &mut text).unwrap(), 0);
    assert_eq!(text, b"\n");
}

// =============================================================================
// Stats Tests
// =============================================================================

#[test]
fn test_stats_sample() {
    let (_temp, path) = setup_temp_db();
    let db = create_db(&path, &sample_records());

    let stats = tools::stats(&db).unwrap();
    assert_eq!(stats.records, 5);
    assert_eq!(stats.distances.iter().sum::<u64>(), 5);
    // "123" sits at slots 4, 5, 0 of its table: distances 0, 1, 2
    assert!(stats.distances[1] >= 1);
    assert!(stats.distances[2] >= 1);

    let text = stats.to_string();
    assert!(text.starts_with("records 5\n"));
    assert!(text.contains("\n>9      0\n"));
}

#[test]
fn test_stats_many_records() {
    let (_temp, path) = setup_temp_db();
    let mut make = McdbMake::create(&path, &test_config()).unwrap();
    for i in 0..5000 {
        make.add(format!("key{}", i).as_bytes(), b"v").unwrap();
    }
    make.finish().unwrap();
    let db = Mcdb::open(&path).unwrap();

    let stats = tools::stats(&db).unwrap();
    assert_eq!(stats.records, 5000);
    assert_eq!(stats.distances.iter().sum::<u64>(), 5000);
    // Tables are half full: most records land at or next to their probe
    assert!(stats.direct_hits() > 2500);
}

#[test]
fn test_stats_detects_unreachable_record() {
    let (_temp, path) = setup_temp_db();
    drop(create_db(&path, &[rec(b"abc", b"def"), rec(b"xyz", b"uvw")]));

    // Rename the first key in place; its slot still carries the old hash
    let mut bytes = fs::read(&path).unwrap();
    bytes[16 + 8] = b'A';
    fs::write(&path, bytes).unwrap();

    let db = Mcdb::open(&path).unwrap();
    assert!(matches!(tools::stats(&db), Err(McdbError::Format(_))));
}

// =============================================================================
// Get Tests
// =============================================================================

/// Run `tools::get`, returning whether it matched and what it printed
fn run_get(db: &Mcdb, key: &[u8], seq: Seq) -> (bool, Vec<u8>) {
    let mut out = Vec::new();
    let found = tools::get(db, key, seq, &mut out).unwrap();
    (found, out)
}

#[test]
fn test_get_selects_duplicates() {
    let (_temp, path) = setup_temp_db();
    let db = create_db(&path, &sample_records());

    assert_eq!(run_get(&db, b"123", Seq::default()), (true, b"0123456789\n".to_vec()));
    assert_eq!(run_get(&db, b"123", Seq::Nth(2)), (true, b"again\n".to_vec()));
    assert_eq!(
        run_get(&db, b"123", Seq::All),
        (true, b"0123456789\nrepeat\nagain\n".to_vec())
    );
}

#[test]
fn test_get_misses() {
    let (_temp, path) = setup_temp_db();
    let db = create_db(&path, &sample_records());

    assert_eq!(run_get(&db, b"non-existent", Seq::default()), (false, Vec::new()));
    assert_eq!(run_get(&db, b"non-existent", Seq::All), (false, Vec::new()));
    assert_eq!(run_get(&db, b"123", Seq::Nth(3)), (false, Vec::new()));
}

#[test]
fn test_get_non_utf8_key() {
    let (_temp, path) = setup_temp_db();
    let db = create_db(&path, &[rec(&[0xff, 0xfe, b'k'], b"raw")]);

    assert_eq!(run_get(&db, &[0xff, 0xfe, b'k'], Seq::default()), (true, b"raw\n".to_vec()));
}

#[test]
fn test_seq_parsing() {
    assert_eq!("all".parse::<Seq>(), Ok(Seq::All));
    assert_eq!("0".parse::<Seq>(), Ok(Seq::Nth(0)));
    assert_eq!("12".parse::<Seq>(), Ok(Seq::Nth(12)));
    assert!("-1".parse::<Seq>().is_err());
    assert!("first".parse::<Seq>().is_err());
    assert_eq!(Seq::All.to_string(), "all");
    assert_eq!(Seq::default().to_string(), "0");
}

// =============================================================================
// Uniq Tests
// =============================================================================

#[test]
fn test_has_unique_keys() {
    let (temp, path) = setup_temp_db();
    let db = create_db(&path, &sample_records());
    assert!(!has_unique_keys(&db).unwrap());

    let other = temp.path().join("unique.mcdb");
    let db = create_db(&other, &[rec(b"a", b"1"), rec(b"b", b"2")]);
    assert!(has_unique_keys(&db).unwrap());
}

#[test]
fn test_uniq_keep_first() {
    let (_temp, path) = setup_temp_db();
    drop(create_db(&path, &sample_records()));

    assert!(tools::uniq(&path, Keep::First, &test_config()).unwrap());

    let db = Mcdb::open(&path).unwrap();
    assert_eq!(db.len(), 3);
    assert!(has_unique_keys(&db).unwrap());
    assert_eq!(db.get(b"123").unwrap(), Some(&b"0123456789"[..]));
    assert_eq!(db.get(b"abc").unwrap(), Some(&b"def"[..]));
    // Surviving records keep their relative order
    let keys: Vec<Vec<u8>> = db.keys().map(|k| k.unwrap().to_vec()).collect();
    assert_eq!(keys, vec![b"123".to_vec(), b"abc".to_vec(), b"alphabet".to_vec()]);
}

#[test]
fn test_uniq_keep_last() {
    let (_temp, path) = setup_temp_db();
    drop(create_db(&path, &sample_records()));

    assert!(tools::uniq(&path, Keep::Last, &test_config()).unwrap());

    let db = Mcdb::open(&path).unwrap();
    assert_eq!(db.len(), 3);
    assert_eq!(db.get(b"123").unwrap(), Some(&b"again"[..]));
    // Each key stays at its first position, carrying the final value
    let keys: Vec<Vec<u8>> = db.keys().map(|k| k.unwrap().to_vec()).collect();
    assert_eq!(keys, vec![b"123".to_vec(), b"abc".to_vec(), b"alphabet".to_vec()]);
}

#[test]
fn test_uniq_keep_last_preserves_record_order() {
    let (_temp, path) = setup_temp_db();
    drop(create_db(&path, &[rec(b"a", b"1"), rec(b"b", b"2"), rec(b"a", b"3")]));

    assert!(tools::uniq(&path, Keep::Last, &test_config()).unwrap());

    let db = Mcdb::open(&path).unwrap();
    assert_eq!(
        collect_items(&db),
        vec![
            (b"a".to_vec(), b"3".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
        ]
    );
}

#[test]
fn test_uniq_keep_first_preserves_record_order() {
    let (_temp, path) = setup_temp_db();
    drop(create_db(&path, &[rec(b"a", b"1"), rec(b"b", b"2"), rec(b"a", b"3")]));

    assert!(tools::uniq(&path, Keep::First, &test_config()).unwrap());

    let db = Mcdb::open(&path).unwrap();
    assert_eq!(
        collect_items(&db),
        vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
        ]
    );
}

#[cfg(unix)]
#[test]
fn test_uniq_keeps_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, path) = setup_temp_db();
    drop(create_db(&path, &sample_records()));
    fs::set_permissions(&path, fs::Permissions::from_mode(0o400)).unwrap();

    assert!(tools::uniq(&path, Keep::First, &test_config()).unwrap());

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o400);
}

#[test]
fn test_uniq_already_unique_is_noop() {
    let (_temp, path) = setup_temp_db();
    drop(create_db(&path, &[rec(b"a", b"1"), rec(b"b", b"2")]));
    let before = fs::read(&path).unwrap();

    assert!(!tools::uniq(&path, Keep::Last, &test_config()).unwrap());
    assert_eq!(fs::read(&path).unwrap(), before);
}
