//! DJB string hash
//!
//! `h = 5381; h = (h * 33) ^ byte` over wrapping u32. The same function places
//! records at build time and probes for them at lookup time, so it must never
//! change for an existing container.

use crate::format::{SLOT_BITS, SLOT_MASK};

/// Initial hash value (the seed)
pub const DJB_INIT: u32 = 5381;

/// Mix one byte into a running hash
#[inline]
pub fn djb_byte(h: u32, b: u8) -> u32 {
    h.wrapping_add(h << 5) ^ u32::from(b)
}

/// Continue a hash from `seed` over `bytes`
#[inline]
pub fn djb_update(seed: u32, bytes: &[u8]) -> u32 {
    bytes.iter().fold(seed, |h, &b| djb_byte(h, b))
}

/// Hash a key from the standard seed
#[inline]
pub fn djb_hash(key: &[u8]) -> u32 {
    djb_update(DJB_INIT, key)
}

/// Hash of `tag` followed by `key`, i.e. `djb_hash([tag] ++ key)`
#[inline]
pub fn djb_tagged(tag: u8, key: &[u8]) -> u32 {
    djb_update(djb_byte(DJB_INIT, tag), key)
}

/// Bucket a hash falls into (`hash mod 256`)
#[inline]
pub fn bucket_of(hash: u32) -> usize {
    (hash & SLOT_MASK) as usize
}

/// First slot probed in a table of `slots` entries. `slots` must be non-zero.
#[inline]
pub fn initial_probe(hash: u32, slots: u32) -> u32 {
    (hash >> SLOT_BITS) % slots
}
