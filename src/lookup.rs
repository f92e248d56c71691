//! Lookup list decoding
//!
//! Each trie node names a record in the lookup list. The record covers a
//! contiguous range of input byte values and maps each to the index of the
//! child to follow:
//!
//! ```text
//! [lowest: u8][highest: u8][table: u8; highest - lowest + 1]
//! ```
//!
//! Bytes and bounds compare as unsigned 0-255. Matchers that compare them as
//! signed `char` never match bytes >= 0x80 against the same file, so non-ASCII
//! user agents can resolve deeper here.

use crate::format::{LookupHeader, LOOKUP_HEADER_SIZE};
use zerocopy::FromBytes;

/// Borrowed view over the lookup list segment
#[derive(Debug, Clone, Copy)]
pub struct LookupList<'a> {
    bytes: &'a [u8],
}

impl<'a> LookupList<'a> {
    /// Wrap the raw lookup list segment
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Size of the segment in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the segment holds no records
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Child index for `value` using the record at `offset`.
    ///
    /// Returns `None` (the no-match sentinel) when `value` falls outside the
    /// record's range, or when the record does not fit inside the segment.
    #[inline]
    pub fn child_index(&self, value: u8, offset: u32) -> Option<u8> {
        let (header, table) = self.record(offset)?;
        if value < header.lowest || value > header.highest {
            return None;
        }
        table.get((value - header.lowest) as usize).copied()
    }

    /// Header and table of the record at `offset`, bounds-checked
    pub fn record(&self, offset: u32) -> Option<(&'a LookupHeader, &'a [u8])> {
        let tail = self.bytes.get(offset as usize..)?;
        let (header, rest) = LookupHeader::ref_from_prefix(tail).ok()?;
        let table = rest.get(..header.table_len()?)?;
        Some((header, table))
    }

    /// Byte offset just past the record at `offset`, if it is well formed
    pub fn record_end(&self, offset: u32) -> Option<usize> {
        let (_, table) = self.record(offset)?;
        Some(offset as usize + LOOKUP_HEADER_SIZE + table.len())
    }
}
