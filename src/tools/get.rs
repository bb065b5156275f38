//! Value printing for `mcdbctl get`

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::error::Result;
use crate::read::Mcdb;

/// Which value(s) of a key to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seq {
    /// The n-th (0-based) value in insertion order
    Nth(usize),
    /// Every value, one per line
    All,
}

impl Default for Seq {
    fn default() -> Self {
        Seq::Nth(0)
    }
}

impl FromStr for Seq {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Seq::All);
        }
        s.parse()
            .map(Seq::Nth)
            .map_err(|_| format!("expected a number or \"all\", got {:?}", s))
    }
}

impl fmt::Display for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seq::Nth(n) => write!(f, "{}", n),
            Seq::All => f.write_str("all"),
        }
    }
}

/// Write the selected value(s) of `key` to `out`, each followed by a
/// newline. Returns `false` if nothing matched.
pub fn get<W: Write>(db: &Mcdb, key: &[u8], seq: Seq, out: &mut W) -> Result<bool> {
    let mut found = false;

    match seq {
        Seq::Nth(n) => {
            if let Some(value) = db.lookup_nth(key, n)? {
                out.write_all(value)?;
                out.write_all(b"\n")?;
                found = true;
            }
        }
        Seq::All => {
            for value in db.all_matches(key) {
                out.write_all(value?)?;
                out.write_all(b"\n")?;
                found = true;
            }
        }
    }

    out.flush()?;
    Ok(found)
}
