//! Binary layout of trie data files
//!
//! A data file is a 2-byte version followed by six length-prefixed segments:
//!
//! ```text
//! u16 version                      (must equal FORMAT_VERSION)
//! u32 len, u8[len]  copyright      (opaque text)
//! u32 len, u8[len]  strings        (NUL-terminated strings, referenced by offset)
//! u32 len, u8[len]  properties     (u32[] offsets into strings)
//! u32 len, u8[len]  devices        (u32[] offsets, device-major rows)
//! u32 len, u8[len]  lookup list    (LookupHeader + u8 table records)
//! u32 len, u8[len]  node tree      (NodeHeader + u32 children records)
//! ```
//!
//! All multi-byte integers are little-endian. Records inside the lookup list
//! and node tree are packed with no alignment padding, so the structs below
//! use zerocopy's unaligned little-endian integer types and can be read
//! directly out of a memory-mapped file.

use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// The only data file version this crate reads
pub const FORMAT_VERSION: u16 = 1;

/// Size of the version field at the start of the file
pub const VERSION_SIZE: usize = 2;

/// Size of each segment's length prefix
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Packed size of a node header (4 + 2 + 1 bytes)
pub const NODE_HEADER_SIZE: usize = 7;

/// Packed size of a lookup record header
pub const LOOKUP_HEADER_SIZE: usize = 2;

/// Size of one child offset in a node's child array
pub const CHILD_OFFSET_SIZE: usize = 4;

/// Child index value the lookup decoder reports for "no match"
pub const NO_MATCH: u8 = u8::MAX;

/// The six segments of a data file, in on-disk order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Copyright notice
    Copyright,
    /// Strings pool
    Strings,
    /// Property name offsets
    Properties,
    /// Device value matrix
    Devices,
    /// Child selection tables
    LookupList,
    /// Trie nodes
    NodeTree,
}

impl Segment {
    /// All segments in the order they appear in the file
    pub const ALL: [Segment; 6] = [
        Segment::Copyright,
        Segment::Strings,
        Segment::Properties,
        Segment::Devices,
        Segment::LookupList,
        Segment::NodeTree,
    ];

    /// Human readable segment name used in errors and reports
    pub fn name(self) -> &'static str {
        match self {
            Segment::Copyright => "copyright",
            Segment::Strings => "strings",
            Segment::Properties => "properties",
            Segment::Devices => "devices",
            Segment::LookupList => "lookup list",
            Segment::NodeTree => "node tree",
        }
    }

    /// Position of this segment in [`Segment::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Fixed part of a trie node (7 bytes, unaligned)
///
/// Followed in the node tree by `child_count` little-endian `u32` offsets,
/// each relative to the start of the node tree segment.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct NodeHeader {
    /// Offset of this node's record in the lookup list segment
    pub lookup_offset: U32,
    /// Device reported when matching stops at this node
    pub fallback_device: U16,
    /// Number of entries in the child offset array
    pub child_count: u8,
}

impl NodeHeader {
    /// Build a header from native integers
    pub fn new(lookup_offset: u32, fallback_device: u16, child_count: u8) -> Self {
        Self {
            lookup_offset: U32::new(lookup_offset),
            fallback_device: U16::new(fallback_device),
            child_count,
        }
    }

    /// Total packed size of a node with this header, children included
    pub fn record_size(&self) -> usize {
        NODE_HEADER_SIZE + self.child_count as usize * CHILD_OFFSET_SIZE
    }
}

/// Fixed part of a lookup record (2 bytes)
///
/// Followed by `highest - lowest + 1` child index bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct LookupHeader {
    /// Smallest input byte covered by the table
    pub lowest: u8,
    /// Largest input byte covered by the table
    pub highest: u8,
}

impl LookupHeader {
    /// Number of table entries following the header, or `None` when the
    /// range is inverted
    pub fn table_len(&self) -> Option<usize> {
        if self.highest < self.lowest {
            return None;
        }
        Some((self.highest - self.lowest) as usize + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_packed_sizes() {
        assert_eq!(size_of::<NodeHeader>(), NODE_HEADER_SIZE);
        assert_eq!(size_of::<LookupHeader>(), LOOKUP_HEADER_SIZE);
    }

    #[test]
    fn test_node_header_layout() {
        let header = NodeHeader::new(0x0102_0304, 0x0506, 3);
        assert_eq!(header.as_bytes(), &[0x04, 0x03, 0x02, 0x01, 0x06, 0x05, 3]);
        assert_eq!(header.record_size(), 7 + 12);

        let (parsed, rest) = NodeHeader::ref_from_prefix(&[9, 0, 0, 0, 2, 0, 0, 0xFF][..]).unwrap();
        assert_eq!(parsed.lookup_offset.get(), 9);
        assert_eq!(parsed.fallback_device.get(), 2);
        assert_eq!(parsed.child_count, 0);
        assert_eq!(rest, &[0xFF]);
    }

    #[test]
    fn test_lookup_table_len() {
        assert_eq!(LookupHeader { lowest: b'a', highest: b'a' }.table_len(), Some(1));
        assert_eq!(LookupHeader { lowest: 0, highest: 255 }.table_len(), Some(256));
        assert_eq!(LookupHeader { lowest: 10, highest: 9 }.table_len(), None);
    }

    #[test]
    fn test_segment_order() {
        let names: Vec<_> = Segment::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            ["copyright", "strings", "properties", "devices", "lookup list", "node tree"]
        );
        assert_eq!(Segment::NodeTree.index(), 5);
    }
}
