//! Segment table parsing
//!
//! Splits a data file into its six segments without copying anything. The
//! result is a [`SegmentTable`] of byte ranges into the file buffer; the
//! [`crate::dataset::Dataset`] keeps the buffer and hands out bounds-checked
//! views from these ranges.

use crate::error::{Result, TrieError};
use crate::format::{Segment, FORMAT_VERSION, LENGTH_PREFIX_SIZE, NODE_HEADER_SIZE, VERSION_SIZE};
use log::debug;
use std::ops::Range;

/// Byte ranges of each segment within a data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTable {
    version: u16,
    ranges: [Range<usize>; 6],
    trailing: usize,
}

impl SegmentTable {
    /// Format version read from the file
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Range occupied by a segment's payload (length prefix excluded)
    pub fn range(&self, segment: Segment) -> Range<usize> {
        self.ranges[segment.index()].clone()
    }

    /// Payload length of a segment
    pub fn len(&self, segment: Segment) -> usize {
        self.ranges[segment.index()].len()
    }

    /// Number of unread bytes after the node tree
    pub fn trailing_bytes(&self) -> usize {
        self.trailing
    }
}

/// Forward-only reader over the file buffer
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Option<Range<usize>> {
        if len > self.remaining() {
            return None;
        }
        let start = self.pos;
        self.pos += len;
        Some(start..self.pos)
    }

    fn read_u16(&mut self) -> Option<u16> {
        let range = self.take(2)?;
        Some(u16::from_le_bytes([self.data[range.start], self.data[range.start + 1]]))
    }

    fn read_u32(&mut self) -> Option<u32> {
        let range = self.take(4)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[range]);
        Some(u32::from_le_bytes(bytes))
    }
}

/// Read the version header and the six segment ranges from `data`.
///
/// # Errors
///
/// - [`TrieError::UnsupportedVersion`] when the version is not
///   [`FORMAT_VERSION`]
/// - [`TrieError::CorruptSegment`] on any short read, or when a fixed-width
///   segment has a length that does not divide into whole entries
pub fn parse_segments(data: &[u8]) -> Result<SegmentTable> {
    let mut cursor = Cursor::new(data);

    let version = cursor.read_u16().ok_or_else(|| {
        TrieError::corrupt(
            "header",
            format!("file is {} bytes, need {} for the version", data.len(), VERSION_SIZE),
        )
    })?;
    if version != FORMAT_VERSION {
        return Err(TrieError::UnsupportedVersion {
            found: version,
            expected: FORMAT_VERSION,
        });
    }

    let mut ranges: [Range<usize>; 6] = Default::default();
    for segment in Segment::ALL {
        let len = cursor.read_u32().ok_or_else(|| {
            TrieError::corrupt(
                segment.name(),
                format!(
                    "length prefix truncated ({} of {} bytes present)",
                    cursor.remaining(),
                    LENGTH_PREFIX_SIZE
                ),
            )
        })? as usize;
        let range = cursor.take(len).ok_or_else(|| {
            TrieError::corrupt(
                segment.name(),
                format!("declares {} bytes but only {} remain", len, cursor.remaining()),
            )
        })?;
        debug!("segment {}: {} bytes at offset {}", segment.name(), len, range.start);
        ranges[segment.index()] = range;
    }

    let table = SegmentTable {
        version,
        ranges,
        trailing: cursor.remaining(),
    };
    check_shapes(&table)?;

    if table.trailing > 0 {
        debug!("ignoring {} trailing bytes after node tree", table.trailing);
    }
    Ok(table)
}

/// Fixed-width segments must hold whole entries and the tree needs a root.
fn check_shapes(table: &SegmentTable) -> Result<()> {
    let properties_len = table.len(Segment::Properties);
    if properties_len % 4 != 0 {
        return Err(TrieError::corrupt(
            Segment::Properties.name(),
            format!("length {} is not a multiple of 4", properties_len),
        ));
    }

    let devices_len = table.len(Segment::Devices);
    let row_bytes = properties_len;
    if devices_len % 4 != 0 || (row_bytes > 0 && devices_len % row_bytes != 0) {
        return Err(TrieError::corrupt(
            Segment::Devices.name(),
            format!(
                "length {} is not a whole number of {}-byte rows",
                devices_len, row_bytes
            ),
        ));
    }

    let tree_len = table.len(Segment::NodeTree);
    if tree_len < NODE_HEADER_SIZE {
        return Err(TrieError::corrupt(
            Segment::NodeTree.name(),
            format!("{} bytes cannot hold the root node", tree_len),
        ));
    }

    Ok(())
}
