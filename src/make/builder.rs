//! Container Builder
//!
//! Appends records to any seekable sink and writes the index on `finish`.

use std::io::{Seek, SeekFrom, Write};

use tracing::debug;

use crate::error::{McdbError, Result};
use crate::format::{record_header, Header, HEADER_SIZE, MAX_FIELD_LEN, RECORD_HEADER_SIZE};
use crate::hash::{djb_hash, djb_tagged};

use super::index::IndexBuilder;
use super::{BuildSummary, RecordSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    Open,
    Finished,
    /// A write failed; the sink holds a partial container
    Failed,
}

/// Builder for creating a container in a `Write + Seek` sink
///
/// Writes a zeroed header immediately; call `add()` for every record, then
/// `finish()` to write the index and the real header.
pub struct McdbBuilder<W: Write + Seek> {
    /// Output sink
    writer: W,
    /// Per-bucket (hash, offset) accumulator
    index: IndexBuilder,
    /// Offset at which the next record starts
    position: u64,
    state: BuildState,
}

impl<W: Write + Seek> McdbBuilder<W> {
    /// Start a build at the beginning of `writer`
    pub fn new(mut writer: W) -> Result<Self> {
        writer.seek(SeekFrom::Start(0))?;
        // Placeholder; the real header goes in last
        writer.write_all(&[0u8; HEADER_SIZE as usize])?;

        Ok(Self {
            writer,
            index: IndexBuilder::new(),
            position: u64::from(HEADER_SIZE),
            state: BuildState::Open,
        })
    }

    /// Append a record. Duplicate keys are kept.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.append(None, key, value)
    }

    /// Append a record whose stored key is `tag` followed by `key`
    pub fn add_tagged(&mut self, tag: u8, key: &[u8], value: &[u8]) -> Result<()> {
        self.append(Some(tag), key, value)
    }

    /// Number of records added so far
    pub fn record_count(&self) -> u64 {
        self.index.record_count()
    }

    /// Whether `finish()` has completed
    pub fn is_finished(&self) -> bool {
        self.state == BuildState::Finished
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Recover the sink of a finished build
    pub fn into_inner(self) -> Result<W> {
        match self.state {
            BuildState::Finished => Ok(self.writer),
            _ => Err(McdbError::state("container not finished")),
        }
    }

    fn check_open(&self) -> Result<()> {
        match self.state {
            BuildState::Open => Ok(()),
            BuildState::Finished => Err(McdbError::state("container already finished")),
            BuildState::Failed => Err(McdbError::state("build aborted by an earlier write error")),
        }
    }

    fn append(&mut self, tag: Option<u8>, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_open()?;

        let key_len = key.len() as u64 + u64::from(tag.is_some());
        let val_len = value.len() as u64;
        if key_len > u64::from(MAX_FIELD_LEN) {
            return Err(McdbError::Value(format!(
                "key length {} exceeds maximum {}",
                key_len, MAX_FIELD_LEN
            )));
        }
        if val_len > u64::from(MAX_FIELD_LEN) {
            return Err(McdbError::Value(format!(
                "value length {} exceeds maximum {}",
                val_len, MAX_FIELD_LEN
            )));
        }

        // Offsets are 32-bit: the finished container must fit below 4 GiB
        let record_len = u64::from(RECORD_HEADER_SIZE) + key_len + val_len;
        let projected = self.position
            + record_len
            + IndexBuilder::size_for(self.index.record_count() + 1);
        if projected > u64::from(u32::MAX) {
            return Err(McdbError::Value(format!(
                "container would grow to {} bytes, past the 32-bit offset limit",
                projected
            )));
        }

        let hash = match tag {
            Some(t) => djb_tagged(t, key),
            None => djb_hash(key),
        };

        if let Err(e) = self.write_record(tag, key, value, key_len as u32, val_len as u32) {
            self.state = BuildState::Failed;
            return Err(e);
        }

        self.index.push(hash, self.position as u32);
        self.position += record_len;
        Ok(())
    }

    fn write_record(
        &mut self,
        tag: Option<u8>,
        key: &[u8],
        value: &[u8],
        key_len: u32,
        val_len: u32,
    ) -> Result<()> {
        self.writer.write_all(&record_header(key_len, val_len))?;
        if let Some(t) = tag {
            self.writer.write_all(&[t])?;
        }
        self.writer.write_all(key)?;
        self.writer.write_all(value)?;
        Ok(())
    }

    /// Finish building: write descriptors, slot tables and the header.
    ///
    /// May be called once; a second call is a `State` error.
    pub fn finish(&mut self) -> Result<BuildSummary> {
        self.check_open()?;

        match self.write_index() {
            Ok(summary) => {
                self.state = BuildState::Finished;
                debug!(
                    records = summary.records,
                    size = summary.size,
                    "container finalized"
                );
                Ok(summary)
            }
            Err(e) => {
                self.state = BuildState::Failed;
                Err(e)
            }
        }
    }

    fn write_index(&mut self) -> Result<BuildSummary> {
        // Record area ends where the index begins
        let index_offset = self.position as u32;
        let index = self.index.write_to(index_offset, &mut self.writer)?;

        let header = Header {
            index_offset,
            index_crc: index.crc,
        };
        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.write_all(&header.encode())?;
        self.writer.flush()?;

        Ok(BuildSummary {
            records: self.index.record_count(),
            index_offset,
            size: u64::from(index_offset) + index.size,
        })
    }
}

impl<W: Write + Seek> RecordSink for McdbBuilder<W> {
    fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        McdbBuilder::add(self, key, value)
    }
}
