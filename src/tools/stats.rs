//! Probe-distance statistics
//!
//! Looks every record up through the index and records how far from its
//! initial probe slot it was found. A record the index cannot reach means
//! the container is corrupt.

use std::fmt;

use crate::error::{McdbError, Result};
use crate::read::{Mcdb, Record};

/// Histogram buckets: distances 0 through 9, then everything above
pub const DISTANCE_BUCKETS: usize = 11;

/// Result of [`stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub records: u64,
    /// `distances[d]` counts records found `d` slots past the initial probe;
    /// the last entry counts everything further than 9
    pub distances: [u64; DISTANCE_BUCKETS],
}

impl Stats {
    /// Records found at their initial probe slot
    pub fn direct_hits(&self) -> u64 {
        self.distances[0]
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "records {}", self.records)?;
        for (d, count) in self.distances[..DISTANCE_BUCKETS - 1].iter().enumerate() {
            writeln!(f, "d{}      {}", d, count)?;
        }
        writeln!(f, ">9      {}", self.distances[DISTANCE_BUCKETS - 1])
    }
}

/// Verify every record is reachable and collect the distance histogram
pub fn stats(db: &Mcdb) -> Result<Stats> {
    let mut stats = Stats::default();

    for record in db.cursor() {
        let record = record?;
        let distance = probe_distance(db, &record)?;
        stats.records += 1;
        stats.distances[(distance as usize).min(DISTANCE_BUCKETS - 1)] += 1;
    }

    Ok(stats)
}

/// Slots walked past the initial probe before `record` was found
fn probe_distance(db: &Mcdb, record: &Record<'_>) -> Result<u32> {
    let mut finder = db.finder();
    let mut found = finder.lookup_first(record.key)?;

    while found.is_some() {
        if finder.record_offset() == Some(record.offset) {
            return Ok(finder.probes() - 1);
        }
        found = finder.lookup_next()?;
    }

    Err(McdbError::format(format!(
        "record at offset {} is not reachable through the index",
        record.offset
    )))
}
