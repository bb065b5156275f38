//! Index Finalizer
//!
//! Collects (hash, offset) pairs per bucket while records are appended, then
//! lays out the descriptor block and the linear-probe slot tables.

use std::io::Write;

use crate::error::Result;
use crate::format::{BucketDescriptor, Slot, EMPTY_SLOT, INDEX_SIZE, SLOTS, SLOT_SIZE};
use crate::hash::{bucket_of, initial_probe};

/// What the finalizer wrote
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndexSummary {
    /// CRC32 of the descriptor block
    pub crc: u32,
    /// Bytes written (descriptors + tables)
    pub size: u64,
}

/// Per-bucket accumulator of slot entries
pub(crate) struct IndexBuilder {
    buckets: Vec<Vec<Slot>>,
    count: u64,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self {
            buckets: (0..SLOTS).map(|_| Vec::new()).collect(),
            count: 0,
        }
    }

    /// Record that a key hashing to `hash` starts at `record_offset`
    pub fn push(&mut self, hash: u32, record_offset: u32) {
        self.buckets[bucket_of(hash)].push(Slot {
            hash,
            record_offset,
        });
        self.count += 1;
    }

    pub fn record_count(&self) -> u64 {
        self.count
    }

    /// Size of the index for `records` records
    pub fn size_for(records: u64) -> u64 {
        u64::from(INDEX_SIZE) + records * 2 * u64::from(SLOT_SIZE)
    }

    /// Descriptors for an index starting at `index_offset`. Empty buckets
    /// point at the position the next table would start at.
    pub fn descriptors(&self, index_offset: u32) -> Vec<BucketDescriptor> {
        let mut next = index_offset + INDEX_SIZE;
        self.buckets
            .iter()
            .map(|entries| {
                let slot_count = entries.len() as u32 * 2;
                let descriptor = BucketDescriptor {
                    table_offset: next,
                    slot_count,
                };
                next += slot_count * SLOT_SIZE;
                descriptor
            })
            .collect()
    }

    /// Write descriptors, then every bucket's slot table in bucket order
    pub fn write_to<W: Write>(&self, index_offset: u32, out: &mut W) -> Result<IndexSummary> {
        let mut block = Vec::with_capacity(INDEX_SIZE as usize);
        for descriptor in self.descriptors(index_offset) {
            descriptor.put(&mut block);
        }
        let crc = crc32fast::hash(&block);
        out.write_all(&block)?;

        let mut table = Vec::new();
        let mut encoded = Vec::new();
        for entries in &self.buckets {
            if entries.is_empty() {
                continue;
            }
            build_table(entries, &mut table);

            encoded.clear();
            encoded.reserve(table.len() * SLOT_SIZE as usize);
            for slot in &table {
                slot.put(&mut encoded);
            }
            out.write_all(&encoded)?;
        }

        Ok(IndexSummary {
            crc,
            size: Self::size_for(self.count),
        })
    }
}

/// Place `entries` into a table of `2 * entries.len()` slots by linear
/// probing from each entry's initial probe, wrapping at the end.
pub(crate) fn build_table(entries: &[Slot], table: &mut Vec<Slot>) {
    let slots = entries.len() as u32 * 2;
    table.clear();
    table.resize(
        slots as usize,
        Slot {
            hash: 0,
            record_offset: EMPTY_SLOT,
        },
    );

    for entry in entries {
        let mut pos = initial_probe(entry.hash, slots);
        while !table[pos as usize].is_empty() {
            pos += 1;
            if pos == slots {
                pos = 0;
            }
        }
        table[pos as usize] = *entry;
    }
}
