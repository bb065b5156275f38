//! Duplicate-aware key search
//!
//! A [`Finder`] owns the probe state of one search: the key, its hash, the
//! bucket being walked and the next slot to examine. `lookup_next` resumes
//! exactly where the previous match left off, so every record stored under
//! a key is visited once, in slot-table order.

use crate::error::{McdbError, Result};
use crate::format::{read_record, BucketDescriptor, Slot};
use crate::hash::{bucket_of, djb_hash, djb_tagged, initial_probe};

use super::cursor::Record;
use super::reader::Mcdb;

/// State of an in-progress search
#[derive(Debug, Clone)]
struct Probe {
    key: Vec<u8>,
    tag: Option<u8>,
    hash: u32,
    bucket: BucketDescriptor,
    /// Next slot index to examine
    pos: u32,
    /// Non-empty slots examined so far
    examined: u32,
    /// Hit an empty slot; no further matches possible
    exhausted: bool,
    /// Offset of the record returned last
    last_offset: Option<u32>,
}

impl Probe {
    fn matches(&self, stored: &[u8]) -> bool {
        match self.tag {
            None => stored == self.key.as_slice(),
            Some(tag) => stored.split_first() == Some((&tag, self.key.as_slice())),
        }
    }
}

/// Search cursor over one container
#[derive(Debug, Clone)]
pub struct Finder<'a> {
    db: &'a Mcdb,
    probe: Option<Probe>,
}

impl<'a> Finder<'a> {
    pub(crate) fn new(db: &'a Mcdb) -> Self {
        Self { db, probe: None }
    }

    /// Start a search for `key` and return its first value
    pub fn lookup_first(&mut self, key: &[u8]) -> Result<Option<&'a [u8]>> {
        self.start(None, key);
        Ok(self.next_record()?.map(|r| r.value))
    }

    /// Start a search for `tag` followed by `key`
    pub fn lookup_first_tagged(&mut self, tag: u8, key: &[u8]) -> Result<Option<&'a [u8]>> {
        self.start(Some(tag), key);
        Ok(self.next_record()?.map(|r| r.value))
    }

    /// Next value stored under the key of the current search.
    ///
    /// `State` error if no search was started on this finder.
    pub fn lookup_next(&mut self) -> Result<Option<&'a [u8]>> {
        Ok(self.next_record()?.map(|r| r.value))
    }

    /// Non-empty slots examined by the current search, including the match
    pub fn probes(&self) -> u32 {
        self.probe.as_ref().map_or(0, |p| p.examined)
    }

    /// Offset of the record returned last, if the last call found one
    pub fn record_offset(&self) -> Option<u32> {
        self.probe.as_ref().and_then(|p| p.last_offset)
    }

    fn start(&mut self, tag: Option<u8>, key: &[u8]) {
        let hash = match tag {
            Some(t) => djb_tagged(t, key),
            None => djb_hash(key),
        };
        let bucket = self.db.buckets()[bucket_of(hash)];
        let pos = if bucket.slot_count == 0 {
            0
        } else {
            initial_probe(hash, bucket.slot_count)
        };

        // Reuse the key buffer across searches
        let mut buf = self.probe.take().map(|p| p.key).unwrap_or_default();
        buf.clear();
        buf.extend_from_slice(key);

        self.probe = Some(Probe {
            key: buf,
            tag,
            hash,
            bucket,
            pos,
            examined: 0,
            exhausted: bucket.slot_count == 0,
            last_offset: None,
        });
    }

    /// Walk the bucket's slots from the saved position to the next record
    /// whose hash and full key both match.
    pub(crate) fn next_record(&mut self) -> Result<Option<Record<'a>>> {
        let db: &'a Mcdb = self.db;
        let probe = self
            .probe
            .as_mut()
            .ok_or_else(|| McdbError::state("lookup_next called before lookup_first"))?;

        let data = db.as_bytes();
        let end = db.records_end();
        probe.last_offset = None;

        while !probe.exhausted && probe.examined < probe.bucket.slot_count {
            let slot = Slot::read(data, probe.bucket.slot_offset(probe.pos));
            probe.pos += 1;
            if probe.pos == probe.bucket.slot_count {
                probe.pos = 0;
            }
            if slot.is_empty() {
                probe.exhausted = true;
                break;
            }
            probe.examined += 1;

            if slot.hash != probe.hash {
                continue;
            }
            // Equal hashes prove nothing; compare the stored key
            let (key, value) = read_record(data, slot.record_offset as usize, end)?;
            if probe.matches(key) {
                probe.last_offset = Some(slot.record_offset);
                return Ok(Some(Record {
                    offset: slot.record_offset,
                    key,
                    value,
                }));
            }
        }

        Ok(None)
    }
}

/// Iterator over every value stored under one key
pub struct Matches<'a> {
    finder: Finder<'a>,
    key: Option<Vec<u8>>,
    done: bool,
}

impl<'a> Matches<'a> {
    pub(crate) fn new(finder: Finder<'a>, key: &[u8]) -> Self {
        Self {
            finder,
            key: Some(key.to_vec()),
            done: false,
        }
    }
}

impl<'a> Iterator for Matches<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let found = match self.key.take() {
            Some(key) => self.finder.lookup_first(&key),
            None => self.finder.lookup_next(),
        };

        match found {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
