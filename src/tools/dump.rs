//! Make-format dump
//!
//! Writes every record as `+klen,dlen:key->data\n` in physical order and
//! terminates the listing with a blank line. The output feeds straight back
//! into `input::make_from_reader`.

use std::io::Write;

use crate::error::Result;
use crate::read::Mcdb;

/// Dump all records of `db` to `out`. Returns the number written.
pub fn dump<W: Write>(db: &Mcdb, out: &mut W) -> Result<u64> {
    let mut written = 0u64;

    for item in db.items() {
        let (key, value) = item?;
        write!(out, "+{},{}:", key.len(), value.len())?;
        out.write_all(key)?;
        out.write_all(b"->")?;
        out.write_all(value)?;
        out.write_all(b"\n")?;
        written += 1;
    }

    out.write_all(b"\n")?;
    out.flush()?;
    Ok(written)
}
