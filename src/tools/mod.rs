//! Tools Module
//!
//! Whole-container operations built on the reader and the make path.
//!
//! ## Responsibilities
//! - Dump a container in make-format text
//! - Print selected values of one key
//! - Verify every record is reachable and report probe distances
//! - Detect duplicate keys and rebuild keeping the first or last value

mod dump;
mod get;
mod stats;
mod uniq;

pub use dump::dump;
pub use get::{get, Seq};
pub use stats::{stats, Stats, DISTANCE_BUCKETS};
pub use uniq::{has_unique_keys, uniq, Keep};
