//! Trie traversal
//!
//! Walks the node tree one input byte at a time. Every node carries a
//! fallback device, so matching always ends with an answer: when the input
//! runs out, or the next byte has no child, the current node's fallback is
//! the best match.
//!
//! Node records are packed back to back in the node tree segment:
//!
//! ```text
//! [lookup_offset: u32][fallback_device: u16][child_count: u8][children: u32; child_count]
//! ```
//!
//! Child offsets are relative to the start of the segment and the root is
//! the record at offset 0.

use crate::format::{NodeHeader, CHILD_OFFSET_SIZE};
use crate::lookup::LookupList;
use zerocopy::little_endian::U32;
use zerocopy::FromBytes;

/// Offset of the root node within the node tree segment
pub const ROOT_OFFSET: u32 = 0;

/// A decoded node borrowed from the node tree segment
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    offset: u32,
    header: &'a NodeHeader,
    children: &'a [U32],
}

impl<'a> Node<'a> {
    /// Offset of this node within the node tree segment
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Offset of this node's record in the lookup list
    pub fn lookup_offset(&self) -> u32 {
        self.header.lookup_offset.get()
    }

    /// Device reported when matching stops here
    pub fn fallback_device(&self) -> u16 {
        self.header.fallback_device.get()
    }

    /// Number of children
    pub fn child_count(&self) -> u8 {
        self.header.child_count
    }

    /// Offset of the child at `index`, if it exists
    #[inline]
    pub fn child_offset(&self, index: u8) -> Option<u32> {
        self.children.get(index as usize).map(|c| c.get())
    }

    /// Offsets of all children in index order
    pub fn child_offsets(&self) -> impl Iterator<Item = u32> + 'a {
        self.children.iter().map(|c| c.get())
    }

    /// Packed size of this node's record
    pub fn record_size(&self) -> usize {
        self.header.record_size()
    }
}

/// Borrowed view over the node tree and the lookup list it references
#[derive(Debug, Clone, Copy)]
pub struct NodeTree<'a> {
    nodes: &'a [u8],
    lookups: LookupList<'a>,
}

impl<'a> NodeTree<'a> {
    /// Create a tree view over the two segments
    pub fn new(nodes: &'a [u8], lookups: LookupList<'a>) -> Self {
        Self { nodes, lookups }
    }

    /// Size of the node tree segment in bytes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the segment is empty (never the case for a loaded dataset)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The lookup list backing child selection
    pub fn lookups(&self) -> LookupList<'a> {
        self.lookups
    }

    /// The root node, if the segment holds one
    pub fn root(&self) -> Option<Node<'a>> {
        self.node_at(ROOT_OFFSET)
    }

    /// Decode the node at `offset`.
    ///
    /// Returns `None` unless both the header and the full child array lie
    /// inside the segment.
    #[inline]
    pub fn node_at(&self, offset: u32) -> Option<Node<'a>> {
        let tail = self.nodes.get(offset as usize..)?;
        let (header, rest) = NodeHeader::ref_from_prefix(tail).ok()?;
        let count = header.child_count as usize;
        if rest.len() < count * CHILD_OFFSET_SIZE {
            return None;
        }
        let (children, _) = <[U32]>::ref_from_prefix_with_elems(rest, count).ok()?;
        Some(Node {
            offset,
            header,
            children,
        })
    }

    /// Child of `node` selected by input byte `value`, or `None` when the
    /// byte has no usable child.
    #[inline]
    pub fn next(&self, node: &Node<'a>, value: u8) -> Option<Node<'a>> {
        let index = self.lookups.child_index(value, node.lookup_offset())?;
        if index >= node.child_count() {
            return None;
        }
        self.node_at(node.child_offset(index)?)
    }

    /// Deepest node reached by `input` and the number of bytes consumed.
    ///
    /// Runs at most `input.len()` steps, so cyclic or hostile trees cannot
    /// make it loop. A child offset that does not address a whole node ends
    /// the walk at the current node.
    pub fn walk(&self, input: &[u8]) -> Option<(Node<'a>, usize)> {
        let mut node = self.root()?;
        for (depth, &byte) in input.iter().enumerate() {
            match self.next(&node, byte) {
                Some(child) => node = child,
                None => return Some((node, depth)),
            }
        }
        Some((node, input.len()))
    }

    /// Device index for `input`: the fallback of the deepest matching node.
    ///
    /// An empty tree resolves everything to device 0.
    pub fn resolve_device(&self, input: &[u8]) -> u16 {
        self.walk(input)
            .map(|(node, _)| node.fallback_device())
            .unwrap_or(0)
    }
}
