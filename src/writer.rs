//! Data file writer
//!
//! Serialises an explicitly described trie into the on-disk layout. The
//! caller decides the tree shape; the writer only lays out strings, lookup
//! records and node records and fixes up the offsets between them.
//!
//! # Example
//!
//! ```
//! use uatrie::{Dataset, DatasetWriter};
//!
//! let mut w = DatasetWriter::new("(c) example");
//! w.add_property("BrowserName")?;
//! let unknown = w.add_device(&["Unknown"])?;
//! let safari = w.add_device(&["Safari"])?;
//!
//! let root = w.root();
//! w.set_fallback(root, unknown);
//! let m = w.add_node(safari);
//! w.link(root, b'M', m);
//!
//! let dataset = Dataset::from_bytes(w.build()?)?;
//! assert_eq!(dataset.resolve_device(b"Mozilla"), safari);
//! assert_eq!(dataset.resolve_device(b"curl"), unknown);
//! # Ok::<(), uatrie::TrieError>(())
//! ```

use crate::error::{Result, TrieError};
use crate::format::{
    LookupHeader, NodeHeader, Segment, CHILD_OFFSET_SIZE, FORMAT_VERSION, NODE_HEADER_SIZE,
    NO_MATCH,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use zerocopy::IntoBytes;

/// Handle to a node added to a [`DatasetWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Default)]
struct PendingNode {
    fallback: u16,
    edges: BTreeMap<u8, NodeId>,
}

/// Builder producing data file bytes
#[derive(Debug)]
pub struct DatasetWriter {
    version: u16,
    copyright: Vec<u8>,
    strings: Vec<u8>,
    string_offsets: FxHashMap<Vec<u8>, u32>,
    properties: Vec<u32>,
    devices: Vec<u32>,
    nodes: Vec<PendingNode>,
}

impl DatasetWriter {
    /// Start a dataset with the given copyright notice and an empty root
    pub fn new(copyright: &str) -> Self {
        Self {
            version: FORMAT_VERSION,
            copyright: copyright.as_bytes().to_vec(),
            strings: Vec::new(),
            string_offsets: FxHashMap::default(),
            properties: Vec::new(),
            devices: Vec::new(),
            nodes: vec![PendingNode::default()],
        }
    }

    /// Override the version written in the header
    pub fn with_version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    /// Intern a string in the pool and return its offset.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::CorruptSegment`] once the pool no longer fits a
    /// `u32` offset.
    pub fn add_string(&mut self, value: &str) -> Result<u32> {
        if let Some(&offset) = self.string_offsets.get(value.as_bytes()) {
            return Ok(offset);
        }
        let offset = to_u32(self.strings.len(), Segment::Strings)?;
        self.strings.extend_from_slice(value.as_bytes());
        self.strings.push(0);
        self.string_offsets.insert(value.as_bytes().to_vec(), offset);
        Ok(offset)
    }

    /// Append a property column and return its index
    pub fn add_property(&mut self, name: &str) -> Result<usize> {
        let offset = self.add_string(name)?;
        self.properties.push(offset);
        Ok(self.properties.len() - 1)
    }

    /// Append a device row and return its index.
    ///
    /// Missing trailing values are written as empty strings; extra values
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::CorruptSegment`] when the row index would not
    /// fit the `u16` device numbers stored in nodes.
    pub fn add_device(&mut self, values: &[&str]) -> Result<u16> {
        let index = u16::try_from(self.device_count()).map_err(|_| {
            TrieError::corrupt(
                Segment::Devices.name(),
                format!("at most {} devices can be addressed", u16::MAX as usize + 1),
            )
        })?;
        for column in 0..self.properties.len() {
            let offset = self.add_string(values.get(column).copied().unwrap_or(""))?;
            self.devices.push(offset);
        }
        Ok(index)
    }

    /// Number of device rows added so far
    pub fn device_count(&self) -> usize {
        match self.properties.len() {
            0 => 0,
            n => self.devices.len() / n,
        }
    }

    /// The root node, always written at offset 0
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a detached node with the given fallback device
    pub fn add_node(&mut self, fallback: u16) -> NodeId {
        self.nodes.push(PendingNode {
            fallback,
            edges: BTreeMap::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Change a node's fallback device
    pub fn set_fallback(&mut self, node: NodeId, device: u16) {
        self.nodes[node.0].fallback = device;
    }

    /// Make `child` the transition from `parent` on input byte `byte`,
    /// replacing any previous transition for that byte
    pub fn link(&mut self, parent: NodeId, byte: u8, child: NodeId) {
        self.nodes[parent.0].edges.insert(byte, child);
    }

    /// Add a chain of nodes spelling `path` below `from`, reusing existing
    /// transitions, and give the last node `device` as its fallback.
    pub fn insert_path(&mut self, from: NodeId, path: &[u8], device: u16) -> NodeId {
        let mut node = from;
        for &byte in path {
            node = match self.nodes[node.0].edges.get(&byte) {
                Some(&next) => next,
                None => {
                    let fallback = self.nodes[node.0].fallback;
                    let next = self.add_node(fallback);
                    self.link(node, byte, next);
                    next
                }
            };
        }
        self.set_fallback(node, device);
        node
    }

    /// Serialise everything into data file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::CorruptSegment`] if a node has more than 255
    /// children (the count is a single byte and index 255 means "no match")
    /// or a segment exceeds 4 GiB.
    pub fn build(&self) -> Result<Vec<u8>> {
        // Node offsets follow from the child counts alone
        let mut node_offsets = Vec::with_capacity(self.nodes.len());
        let mut tree_len = 0usize;
        for node in &self.nodes {
            if node.edges.len() > u8::MAX as usize {
                return Err(TrieError::corrupt(
                    Segment::NodeTree.name(),
                    format!("node has {} children, at most 255 allowed", node.edges.len()),
                ));
            }
            node_offsets.push(to_u32(tree_len, Segment::NodeTree)?);
            tree_len += NODE_HEADER_SIZE + node.edges.len() * CHILD_OFFSET_SIZE;
        }

        let mut lookups = Vec::new();
        let mut lookup_offsets: FxHashMap<Vec<u8>, u32> = FxHashMap::default();
        let mut tree = Vec::with_capacity(tree_len);

        for node in &self.nodes {
            let lookup_offset = match lookup_record(node) {
                Some(record) => match lookup_offsets.get(&record) {
                    Some(&offset) => offset,
                    None => {
                        let offset = to_u32(lookups.len(), Segment::LookupList)?;
                        lookups.extend_from_slice(&record);
                        lookup_offsets.insert(record, offset);
                        offset
                    }
                },
                None => 0,
            };

            let header = NodeHeader::new(lookup_offset, node.fallback, node.edges.len() as u8);
            tree.extend_from_slice(header.as_bytes());
            for child in node.edges.values() {
                tree.extend_from_slice(&node_offsets[child.0].to_le_bytes());
            }
        }

        let properties: Vec<u8> = self.properties.iter().flat_map(|o| o.to_le_bytes()).collect();
        let devices: Vec<u8> = self.devices.iter().flat_map(|o| o.to_le_bytes()).collect();

        let segments: [&[u8]; 6] = [
            &self.copyright,
            &self.strings,
            &properties,
            &devices,
            &lookups,
            &tree,
        ];

        let mut out = Vec::with_capacity(2 + segments.iter().map(|s| s.len() + 4).sum::<usize>());
        out.extend_from_slice(&self.version.to_le_bytes());
        for (segment, payload) in Segment::ALL.iter().zip(segments) {
            out.extend_from_slice(&to_u32(payload.len(), *segment)?.to_le_bytes());
            out.extend_from_slice(payload);
        }
        Ok(out)
    }
}

/// Lookup record covering a node's transitions, gaps filled with NO_MATCH
fn lookup_record(node: &PendingNode) -> Option<Vec<u8>> {
    let lowest = *node.edges.keys().next()?;
    let highest = *node.edges.keys().next_back()?;

    let header = LookupHeader { lowest, highest };
    let mut record = header.as_bytes().to_vec();
    let mut table = vec![NO_MATCH; (highest - lowest) as usize + 1];
    for (index, byte) in node.edges.keys().enumerate() {
        table[(byte - lowest) as usize] = index as u8;
    }
    record.extend_from_slice(&table);
    Some(record)
}

fn to_u32(len: usize, segment: Segment) -> Result<u32> {
    u32::try_from(len).map_err(|_| TrieError::corrupt(segment.name(), "exceeds 4 GiB"))
}
