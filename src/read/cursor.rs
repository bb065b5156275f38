//! Sequential Cursor
//!
//! Forward-only iteration over the record area, independent of the hash
//! index. Used for dumps, listings and full scans.

use crate::error::Result;
use crate::format::{read_record, HEADER_SIZE, RECORD_HEADER_SIZE};

/// A record borrowed from the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Offset of the record header
    pub offset: u32,
    pub key: &'a [u8],
    pub value: &'a [u8],
}

/// Iterator over records in physical (append) order
#[derive(Debug, Clone)]
pub struct RecordCursor<'a> {
    data: &'a [u8],
    /// Current position in the container
    pos: usize,
    /// Stop reading at this offset (start of the index)
    end: usize,
}

impl<'a> RecordCursor<'a> {
    pub(crate) fn new(data: &'a [u8], end: usize) -> Self {
        Self {
            data,
            pos: HEADER_SIZE as usize,
            end,
        }
    }
}

impl<'a> Iterator for RecordCursor<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }

        match read_record(self.data, self.pos, self.end) {
            Ok((key, value)) => {
                let offset = self.pos as u32;
                self.pos += RECORD_HEADER_SIZE as usize + key.len() + value.len();
                Some(Ok(Record { offset, key, value }))
            }
            Err(e) => {
                // Nothing after a broken record can be trusted
                self.pos = self.end;
                Some(Err(e))
            }
        }
    }
}

/// Keys in physical order
pub struct Keys<'a>(RecordCursor<'a>);

impl<'a> Keys<'a> {
    pub(crate) fn new(cursor: RecordCursor<'a>) -> Self {
        Self(cursor)
    }
}

impl<'a> Iterator for Keys<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|r| r.map(|rec| rec.key))
    }
}

/// Values in physical order
pub struct Values<'a>(RecordCursor<'a>);

impl<'a> Values<'a> {
    pub(crate) fn new(cursor: RecordCursor<'a>) -> Self {
        Self(cursor)
    }
}

impl<'a> Iterator for Values<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|r| r.map(|rec| rec.value))
    }
}

/// (key, value) pairs in physical order
pub struct Items<'a>(RecordCursor<'a>);

impl<'a> Items<'a> {
    pub(crate) fn new(cursor: RecordCursor<'a>) -> Self {
        Self(cursor)
    }
}

impl<'a> Iterator for Items<'a> {
    type Item = Result<(&'a [u8], &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|r| r.map(|rec| (rec.key, rec.value)))
    }
}
