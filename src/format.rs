//! Container format
//!
//! Constants and fixed-width codecs shared by the builder and the reader.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (16 bytes)                                       │
//! │   Magic "MCDB" (4) | Version u16 (2) | Reserved u16 (2) │
//! │   IndexOffset u32 (4) | IndexCRC u32 (4)                │
//! ├─────────────────────────────────────────────────────────┤
//! │ Records (variable)                                      │
//! │   [KeyLen: u32][ValLen: u32][Key][Value]                │
//! │   ... repeated in insertion order ...                   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Bucket Descriptors (256 x 8 bytes, at IndexOffset)      │
//! │   [TableOffset: u32][SlotCount: u32]                    │
//! ├─────────────────────────────────────────────────────────┤
//! │ Slot Tables (variable, bucket order, contiguous)        │
//! │   [Hash: u32][RecordOffset: u32]                        │
//! │   (RecordOffset 0 marks an empty slot)                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. A build in progress carries an all-zero
//! header; the real one is written last, so an unfinished file never opens.

use bytes::{Buf, BufMut};

use crate::error::{McdbError, Result};

// =============================================================================
// Shared Constants
// =============================================================================

/// Magic bytes identifying a finished container
pub const MAGIC: &[u8; 4] = b"MCDB";

/// Current format version
pub const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + Reserved (2) + IndexOffset (4) + IndexCRC (4)
pub const HEADER_SIZE: u32 = 16;

/// log2 of the bucket count
pub const SLOT_BITS: u32 = 8;

/// Number of buckets (fixed by the format, never tunable)
pub const SLOTS: usize = 1 << SLOT_BITS;

/// Mask selecting the bucket bits of a hash
pub const SLOT_MASK: u32 = (SLOTS as u32) - 1;

/// Bucket descriptor size: TableOffset (4) + SlotCount (4)
pub const DESCRIPTOR_SIZE: u32 = 8;

/// Size of the whole descriptor block
pub const INDEX_SIZE: u32 = SLOTS as u32 * DESCRIPTOR_SIZE;

/// Slot size: Hash (4) + RecordOffset (4)
pub const SLOT_SIZE: u32 = 8;

/// Record header size: KeyLen (4) + ValLen (4)
pub const RECORD_HEADER_SIZE: u32 = 8;

/// Smallest possible container: header plus an all-empty index
pub const MIN_CONTAINER_SIZE: u32 = HEADER_SIZE + INDEX_SIZE;

/// Largest key or value length accepted
pub const MAX_FIELD_LEN: u32 = i32::MAX as u32 - 8;

/// Record offset marking an empty slot; the header makes it unreachable
pub const EMPTY_SLOT: u32 = 0;

// =============================================================================
// Header
// =============================================================================

/// Fixed container header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Start of the descriptor block, equal to the end of the record area
    pub index_offset: u32,
    /// CRC32 of the descriptor block
    pub index_crc: u32,
}

impl Header {
    pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        let mut out = [0u8; HEADER_SIZE as usize];
        let mut buf = &mut out[..];
        buf.put_slice(MAGIC);
        buf.put_u16_le(VERSION);
        buf.put_u16_le(0);
        buf.put_u32_le(self.index_offset);
        buf.put_u32_le(self.index_crc);
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE as usize {
            return Err(McdbError::format(format!(
                "header truncated: {} bytes",
                data.len()
            )));
        }

        let mut buf = &data[..HEADER_SIZE as usize];
        if &buf[..4] != MAGIC {
            return Err(McdbError::format(format!(
                "invalid magic: expected MCDB, got {:?}",
                &buf[..4]
            )));
        }
        buf.advance(4);

        let version = buf.get_u16_le();
        if version != VERSION {
            return Err(McdbError::format(format!(
                "unsupported version: {}",
                version
            )));
        }
        let _reserved = buf.get_u16_le();

        Ok(Self {
            index_offset: buf.get_u32_le(),
            index_crc: buf.get_u32_le(),
        })
    }
}

// =============================================================================
// Bucket Descriptors and Slots
// =============================================================================

/// Location and size of one bucket's slot table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketDescriptor {
    /// Absolute offset of the slot table
    pub table_offset: u32,
    /// Number of slots (twice the records hashed into the bucket)
    pub slot_count: u32,
}

impl BucketDescriptor {
    pub fn put(&self, buf: &mut impl BufMut) {
        buf.put_u32_le(self.table_offset);
        buf.put_u32_le(self.slot_count);
    }

    pub fn get(buf: &mut impl Buf) -> Self {
        Self {
            table_offset: buf.get_u32_le(),
            slot_count: buf.get_u32_le(),
        }
    }

    /// Offset of the slot at `index` within this table
    #[inline]
    pub fn slot_offset(&self, index: u32) -> usize {
        self.table_offset as usize + (index * SLOT_SIZE) as usize
    }

    /// One past the last byte of the table
    #[inline]
    pub fn end(&self) -> u64 {
        u64::from(self.table_offset) + u64::from(self.slot_count) * u64::from(SLOT_SIZE)
    }
}

/// One entry of a slot table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub hash: u32,
    pub record_offset: u32,
}

impl Slot {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.record_offset == EMPTY_SLOT
    }

    pub fn put(&self, buf: &mut impl BufMut) {
        buf.put_u32_le(self.hash);
        buf.put_u32_le(self.record_offset);
    }

    /// Decode the slot at `pos`; the caller guarantees 8 bytes are available
    #[inline]
    pub fn read(data: &[u8], pos: usize) -> Self {
        let mut buf = &data[pos..pos + SLOT_SIZE as usize];
        Self {
            hash: buf.get_u32_le(),
            record_offset: buf.get_u32_le(),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// Encode a record header
pub fn record_header(key_len: u32, val_len: u32) -> [u8; RECORD_HEADER_SIZE as usize] {
    let mut out = [0u8; RECORD_HEADER_SIZE as usize];
    let mut buf = &mut out[..];
    buf.put_u32_le(key_len);
    buf.put_u32_le(val_len);
    out
}

/// Split the record at `offset` into (key, value), checking that it lies
/// entirely below `end`.
pub fn read_record(data: &[u8], offset: usize, end: usize) -> Result<(&[u8], &[u8])> {
    let header_end = offset + RECORD_HEADER_SIZE as usize;
    if offset < HEADER_SIZE as usize || header_end > end {
        return Err(McdbError::format(format!(
            "record header at {} outside record area ..{}",
            offset, end
        )));
    }

    let mut buf = &data[offset..header_end];
    let key_len = buf.get_u32_le() as usize;
    let val_len = buf.get_u32_le() as usize;

    let key_end = header_end + key_len;
    let val_end = key_end + val_len;
    if val_end > end {
        return Err(McdbError::format(format!(
            "record at {} ({} + {} bytes) overruns record area ..{}",
            offset, key_len, val_len, end
        )));
    }

    Ok((&data[header_end..key_end], &data[key_end..val_end]))
}

// =============================================================================
// Index Validation
// =============================================================================

/// Decoded, validated index of a container
#[derive(Debug, Clone)]
pub struct Index {
    pub header: Header,
    pub buckets: Vec<BucketDescriptor>,
}

impl Index {
    /// Validate the header and descriptor block of `data`.
    ///
    /// Checks that the container is large enough, that the descriptor block
    /// matches its checksum, and that the slot tables are laid out back to
    /// back after it, ending exactly at the end of the container.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let size = data.len() as u64;
        if size < u64::from(MIN_CONTAINER_SIZE) {
            return Err(McdbError::format(format!(
                "container too small: {} bytes, need at least {}",
                size, MIN_CONTAINER_SIZE
            )));
        }
        if size > u64::from(u32::MAX) {
            return Err(McdbError::format(format!(
                "container too large for 32-bit offsets: {} bytes",
                size
            )));
        }

        let header = Header::decode(data)?;
        let index_offset = header.index_offset as usize;
        let index_end = index_offset as u64 + u64::from(INDEX_SIZE);
        if index_offset < HEADER_SIZE as usize || index_end > size {
            return Err(McdbError::format(format!(
                "index offset {} outside container of {} bytes",
                index_offset, size
            )));
        }

        let block = &data[index_offset..index_end as usize];
        let crc = crc32fast::hash(block);
        if crc != header.index_crc {
            return Err(McdbError::format(format!(
                "index checksum mismatch: expected {:08x}, got {:08x}",
                header.index_crc, crc
            )));
        }

        let mut buf = block;
        let mut buckets = Vec::with_capacity(SLOTS);
        let mut next = index_end;
        for i in 0..SLOTS {
            let bucket = BucketDescriptor::get(&mut buf);
            if u64::from(bucket.table_offset) != next {
                return Err(McdbError::format(format!(
                    "bucket {} table at {}, expected {}",
                    i, bucket.table_offset, next
                )));
            }
            if bucket.slot_count % 2 != 0 {
                return Err(McdbError::format(format!(
                    "bucket {} has odd slot count {}",
                    i, bucket.slot_count
                )));
            }
            next = bucket.end();
            if next > size {
                return Err(McdbError::format(format!(
                    "bucket {} table ends at {}, past container end {}",
                    i, next, size
                )));
            }
            buckets.push(bucket);
        }

        if next != size {
            return Err(McdbError::format(format!(
                "slot tables end at {}, container is {} bytes",
                next, size
            )));
        }

        Ok(Self { header, buckets })
    }

    /// Number of records (each record owns two slots)
    pub fn record_count(&self) -> u64 {
        self.buckets
            .iter()
            .map(|b| u64::from(b.slot_count))
            .sum::<u64>()
            / 2
    }
}
