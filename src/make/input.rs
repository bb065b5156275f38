//! Make-format input
//!
//! Reads records in the cdbmake text format:
//!
//! ```text
//! +3,10:123->0123456789
//! +3,3:abc->def
//!
//! ```
//!
//! Each record is `+klen,dlen:key->data` followed by a newline; lengths are
//! decimal and the key/data bytes are taken verbatim, so they may contain
//! separators or newlines. A blank line ends the input.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::error::{McdbError, Result};
use crate::format::MAX_FIELD_LEN;

use super::{BuildSummary, McdbMake, RecordSink};

/// Longest decimal length field accepted
const MAX_DIGITS: usize = 10;

/// Feed every record in `input` to `sink`. Returns the number of records.
pub fn make_from_reader<R, S>(mut input: R, sink: &mut S) -> Result<u64>
where
    R: BufRead,
    S: RecordSink + ?Sized,
{
    let mut key = Vec::new();
    let mut data = Vec::new();
    let mut record = 0u64;

    loop {
        match read_byte(&mut input, record)? {
            b'\n' => break,
            b'+' => {}
            other => {
                return Err(bad(
                    record,
                    format!("expected '+' or blank line, got {:?}", other as char),
                ))
            }
        }

        let klen = read_len(&mut input, b',', record)?;
        let dlen = read_len(&mut input, b':', record)?;

        read_exact_into(&mut input, klen, &mut key, record)?;
        expect(&mut input, b'-', record)?;
        expect(&mut input, b'>', record)?;
        read_exact_into(&mut input, dlen, &mut data, record)?;
        expect(&mut input, b'\n', record)?;

        sink.add(&key, &data)?;
        record += 1;
    }

    Ok(record)
}

/// Build the container at `db` from the make-format file at `input`,
/// or from stdin when `input` is `None`.
pub fn make_file(input: Option<&Path>, db: &Path, config: &Config) -> Result<BuildSummary> {
    let mut make = McdbMake::create(db, config)?;

    let records = match input {
        Some(path) => make_from_reader(BufReader::new(File::open(path)?), &mut make)?,
        None => make_from_reader(io::stdin().lock(), &mut make)?,
    };
    debug!(records, dest = %db.display(), "input consumed");

    make.finish()
}

fn bad(record: u64, reason: impl Into<String>) -> McdbError {
    McdbError::Input {
        record,
        reason: reason.into(),
    }
}

fn read_byte<R: BufRead>(input: &mut R, record: u64) -> Result<u8> {
    let mut byte = [0u8; 1];
    match input.read_exact(&mut byte) {
        Ok(()) => Ok(byte[0]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(bad(record, "unexpected end of input (missing blank line?)"))
        }
        Err(e) => Err(e.into()),
    }
}

fn expect<R: BufRead>(input: &mut R, want: u8, record: u64) -> Result<()> {
    let got = read_byte(input, record)?;
    if got != want {
        return Err(bad(
            record,
            format!("expected {:?}, got {:?}", want as char, got as char),
        ));
    }
    Ok(())
}

/// Decimal length terminated by `terminator`
fn read_len<R: BufRead>(input: &mut R, terminator: u8, record: u64) -> Result<usize> {
    let mut value: u64 = 0;
    let mut digits = 0;

    loop {
        let b = read_byte(input, record)?;
        if b == terminator && digits > 0 {
            break;
        }
        if !b.is_ascii_digit() || digits == MAX_DIGITS {
            return Err(bad(
                record,
                format!("invalid length field before {:?}", terminator as char),
            ));
        }
        value = value * 10 + u64::from(b - b'0');
        digits += 1;
    }

    if value > u64::from(MAX_FIELD_LEN) {
        return Err(bad(
            record,
            format!("length {} exceeds maximum {}", value, MAX_FIELD_LEN),
        ));
    }
    Ok(value as usize)
}

fn read_exact_into<R: BufRead>(
    input: &mut R,
    len: usize,
    buf: &mut Vec<u8>,
    record: u64,
) -> Result<()> {
    buf.clear();
    input.by_ref().take(len as u64).read_to_end(buf)?;
    if buf.len() != len {
        return Err(bad(
            record,
            format!("expected {} bytes, input ended after {}", len, buf.len()),
        ));
    }
    Ok(())
}
