//! # mcdb
//!
//! A constant database: build once, then serve read-only lookups from a
//! memory-mapped file.
//! - Two-phase construction with atomic temp + rename publishing
//! - 256-bucket DJB hash index with linear-probe slot tables
//! - Duplicate keys, iterated in insertion order
//! - Zero-copy reads shareable across threads
//!
//! ## Architecture Overview
//!
//! ```text
//!   make-format text          McdbMake / McdbBuilder
//!  ┌──────────────────┐      ┌──────────────────────────────┐
//!  │ +3,3:abc->def    │─────▶│ add()   records, in order    │
//!  │ ...              │      │ finish() descriptors + slots │
//!  └──────────────────┘      └──────────────┬───────────────┘
//!                                           │ rename
//!                                           ▼
//!                            ┌──────────────────────────────┐
//!                            │        container file        │
//!                            └──────────────┬───────────────┘
//!                                           │ mmap
//!                          ┌────────────────┼────────────────┐
//!                          ▼                ▼                ▼
//!                   ┌────────────┐   ┌────────────┐   ┌────────────┐
//!                   │   Finder   │   │   Cursor   │   │ SharedMcdb │
//!                   │  (lookups) │   │  (scans)   │   │ (refresh)  │
//!                   └────────────┘   └────────────┘   └────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod hash;
pub mod format;
pub mod make;
pub mod read;
pub mod tools;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{McdbError, Result};
pub use config::{Config, ConfigBuilder};
pub use make::{BuildSummary, McdbBuilder, McdbMake, RecordSink};
pub use read::{Finder, Matches, Mcdb, Record, SharedMcdb};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mcdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
