//! Container Reader
//!
//! Opens a finished container and answers point lookups through the hash
//! index in O(1) expected time. Values are borrowed straight from the map.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::format::{BucketDescriptor, Index};

use super::cursor::{Items, Keys, RecordCursor, Values};
use super::finder::{Finder, Matches};
use super::source::{FileStamp, Source};

/// Read-only handle on a finished container
///
/// `Mcdb` is `Send + Sync`: lookups keep their probe state in a
/// caller-owned [`Finder`] or iterator, never in the handle.
pub struct Mcdb {
    source: Source,
    /// Validated descriptors, decoded once
    index: Index,
    /// Where the container came from, if it was a file
    path: Option<PathBuf>,
    stamp: Option<FileStamp>,
}

impl Mcdb {
    /// Open a container file with the default config (memory-mapped)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &Config::default())
    }

    /// Open a container file
    pub fn open_with(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let (source, stamp) = Source::open(path, config)?;
        let index = Index::parse(&source)?;

        debug!(
            path = %path.display(),
            records = index.record_count(),
            mapped = matches!(source, Source::Mapped(_)),
            "container opened"
        );

        Ok(Self {
            source,
            index,
            path: Some(path.to_path_buf()),
            stamp: Some(stamp),
        })
    }

    /// Use an in-memory container
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let index = Index::parse(&bytes)?;
        Ok(Self {
            source: Source::Owned(bytes),
            index,
            path: None,
            stamp: None,
        })
    }

    /// Release the container. Equivalent to dropping it.
    pub fn close(self) {}

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Number of records
    pub fn len(&self) -> u64 {
        self.index.record_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Container size in bytes
    pub fn size(&self) -> u64 {
        self.source.len() as u64
    }

    /// Path the container was opened from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The 256 bucket descriptors
    pub fn buckets(&self) -> &[BucketDescriptor] {
        &self.index.buckets
    }

    /// Raw container bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.source
    }

    /// End of the record area (start of the descriptor block)
    pub(crate) fn records_end(&self) -> usize {
        self.index.header.index_offset as usize
    }

    pub(crate) fn stamp(&self) -> Option<&FileStamp> {
        self.stamp.as_ref()
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// A fresh search cursor for `lookup_first` / `lookup_next`
    pub fn finder(&self) -> Finder<'_> {
        Finder::new(self)
    }

    /// First value stored under `key`, in slot-table order
    pub fn lookup_first(&self, key: &[u8]) -> Result<Option<&[u8]>> {
        self.finder().lookup_first(key)
    }

    /// Alias of [`lookup_first`](Self::lookup_first)
    pub fn get(&self, key: &[u8]) -> Result<Option<&[u8]>> {
        self.lookup_first(key)
    }

    /// First value stored under `tag` followed by `key`
    pub fn lookup_first_tagged(&self, tag: u8, key: &[u8]) -> Result<Option<&[u8]>> {
        self.finder().lookup_first_tagged(tag, key)
    }

    /// The `n`-th (0-based) value stored under `key`
    pub fn lookup_nth(&self, key: &[u8], n: usize) -> Result<Option<&[u8]>> {
        let mut finder = self.finder();
        let mut found = finder.lookup_first(key)?;
        for _ in 0..n {
            if found.is_none() {
                break;
            }
            found = finder.lookup_next()?;
        }
        Ok(found)
    }

    pub fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.lookup_first(key)?.is_some())
    }

    /// Every value stored under `key`, in slot-table order
    pub fn all_matches<'a>(&'a self, key: &[u8]) -> Matches<'a> {
        Matches::new(self.finder(), key)
    }

    // =========================================================================
    // Sequential Access
    // =========================================================================

    /// Cursor over raw records in physical order
    pub fn cursor(&self) -> RecordCursor<'_> {
        RecordCursor::new(self.as_bytes(), self.records_end())
    }

    /// All keys in physical order, duplicates included
    pub fn keys(&self) -> Keys<'_> {
        Keys::new(self.cursor())
    }

    /// All values in physical order
    pub fn values(&self) -> Values<'_> {
        Values::new(self.cursor())
    }

    /// All (key, value) pairs in physical order
    pub fn items(&self) -> Items<'_> {
        Items::new(self.cursor())
    }
}

impl fmt::Debug for Mcdb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mcdb")
            .field("path", &self.path)
            .field("size", &self.size())
            .field("records", &self.len())
            .field("mapped", &matches!(self.source, Source::Mapped(_)))
            .finish()
    }
}
