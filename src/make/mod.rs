//! Make Module
//!
//! Two-phase container construction.
//!
//! ## Responsibilities
//! - Append length-prefixed records in insertion order
//! - Accumulate (hash, offset) pairs per bucket in memory
//! - Finalize: write 256 bucket descriptors and linear-probe slot tables
//! - Publish files atomically (temp file + rename)
//! - Build from the textual `+klen,dlen:key->data` format

mod builder;
mod file;
mod index;
pub mod input;

pub use builder::McdbBuilder;
pub use file::McdbMake;

use crate::error::Result;

/// Outcome of a successful `finish`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    /// Records written
    pub records: u64,
    /// Start of the descriptor block (end of the record area)
    pub index_offset: u32,
    /// Total container size in bytes
    pub size: u64,
}

/// Anything records can be appended to
pub trait RecordSink {
    fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()>;
}
