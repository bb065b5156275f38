//! Read Module
//!
//! Read-only access to finished containers.
//!
//! ## Responsibilities
//! - Map the container and validate header, descriptors and table layout
//! - Point lookups through the 256-bucket linear-probe index
//! - Duplicate-key iteration with explicit per-search cursors
//! - Sequential scans of the record area
//! - Follow atomic replacements of a container file

mod cursor;
mod finder;
mod reader;
mod shared;
mod source;

pub use cursor::{Items, Keys, Record, RecordCursor, Values};
pub use finder::{Finder, Matches};
pub use reader::Mcdb;
pub use shared::SharedMcdb;
