//! Duplicate-key removal
//!
//! Rebuilds a container so every key maps to exactly one value, written at
//! the position of the key's first occurrence. Which value survives is
//! decided through the index: probe order for a key is its insertion order.

use std::path::Path;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::make::McdbMake;
use crate::read::{Mcdb, Record};

/// Which value of a duplicated key survives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Keep {
    #[default]
    First,
    Last,
}

/// Whether no key occurs more than once
pub fn has_unique_keys(db: &Mcdb) -> Result<bool> {
    for record in db.cursor() {
        let record = record?;
        let mut finder = db.finder();
        finder.lookup_first(record.key)?;
        if finder.record_offset() != Some(record.offset) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Rebuild the container at `path` with one value per key.
///
/// Returns `false` without touching the file if the keys are already unique.
pub fn uniq(path: impl AsRef<Path>, keep: Keep, config: &Config) -> Result<bool> {
    let path = path.as_ref();
    let db = Mcdb::open_with(path, config)?;

    if has_unique_keys(&db)? {
        debug!(path = %path.display(), "keys already unique");
        return Ok(false);
    }

    let mut make = McdbMake::create(path, config)?;
    for record in db.cursor() {
        let record = record?;
        if let Some(value) = surviving_value(&db, &record, keep)? {
            make.add(record.key, value)?;
        }
    }
    let summary = make.finish()?;

    info!(
        path = %path.display(),
        before = db.len(),
        after = summary.records,
        "duplicate keys removed"
    );
    Ok(true)
}

/// The value to emit at `record`, if `record` is the first occurrence of
/// its key. Each key is written at its first position so record order is
/// kept; `Keep::Last` substitutes the value of the final occurrence.
fn surviving_value<'a>(
    db: &'a Mcdb,
    record: &Record<'a>,
    keep: Keep,
) -> Result<Option<&'a [u8]>> {
    let mut finder = db.finder();
    let mut found = finder.lookup_first(record.key)?;
    if finder.record_offset() != Some(record.offset) {
        return Ok(None);
    }

    let mut value = record.value;
    if keep == Keep::Last {
        while let Some(v) = found {
            value = v;
            found = finder.lookup_next()?;
        }
    }
    Ok(Some(value))
}
