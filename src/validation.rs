//! Structural validation of trie datasets
//!
//! Matching never fails on a malformed file (it stops at the deepest node it
//! can decode), but a broken file silently returns wrong devices. This module
//! walks everything reachable from the root and reports what is wrong:
//!
//! - node headers and child arrays that run past the end of the node tree
//! - lookup records that are missing, truncated, or shorter than the node's
//!   child count
//! - fallback devices outside the devices matrix
//! - property names and matrix cells pointing outside the strings pool
//!
//! # Usage
//!
//! ```rust,no_run
//! use uatrie::validation::validate_file;
//!
//! let report = validate_file("devices.trie")?;
//! if !report.is_valid() {
//!     for error in &report.errors {
//!         eprintln!("  ERROR: {}", error);
//!     }
//! }
//! # Ok::<(), uatrie::TrieError>(())
//! ```

use crate::dataset::Dataset;
use crate::error::Result;
use crate::format::Segment;
use crate::options::LoadOptions;
use crate::tree::ROOT_OFFSET;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Errors reported per check before the rest are only counted
const MAX_REPORTED: usize = 20;

/// A structural error tied to the segment it was found in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Segment containing the problem
    #[serde(serialize_with = "serialize_segment")]
    pub segment: Segment,
    /// Description of the problem
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.segment.name(), self.message)
    }
}

fn serialize_segment<S>(segment: &Segment, s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(segment.name())
}

/// Statistics gathered while walking the tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    /// Distinct nodes reachable from the root
    pub reachable_nodes: usize,
    /// Nodes without children
    pub leaf_nodes: usize,
    /// Longest input prefix the tree can consume
    pub max_depth: usize,
    /// Sum of child counts over reachable nodes
    pub total_children: usize,
    /// Distinct lookup records referenced
    pub lookup_records: usize,
    /// Node tree bytes not covered by any reachable node
    pub unreachable_bytes: usize,
}

/// Validation report with detailed findings
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Problems that make lookups return wrong or undefined results
    pub errors: Vec<ValidationIssue>,
    /// Suspicious but harmless findings
    pub warnings: Vec<String>,
    /// Informational notes
    pub info: Vec<String>,
    /// Tree statistics
    pub stats: TreeStats,
}

impl ValidationReport {
    /// True when no errors were found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, segment: Segment, message: String) {
        self.errors.push(ValidationIssue { segment, message });
    }
}

/// Bounded error collector for one check
struct Budget {
    segment: Segment,
    reported: usize,
    suppressed: usize,
}

impl Budget {
    fn new(segment: Segment) -> Self {
        Self {
            segment,
            reported: 0,
            suppressed: 0,
        }
    }

    fn report(&mut self, report: &mut ValidationReport, message: impl FnOnce() -> String) {
        if self.reported < MAX_REPORTED {
            report.error(self.segment, message());
            self.reported += 1;
        } else {
            self.suppressed += 1;
        }
    }

    fn finish(self, report: &mut ValidationReport) {
        if self.suppressed > 0 {
            report.error(
                self.segment,
                format!("{} further error(s) not listed", self.suppressed),
            );
        }
    }
}

/// Load `path` without verification and validate it.
///
/// Parse failures (bad version, truncated segments) are returned as errors;
/// everything past the segment table ends up in the report.
pub fn validate_file<P: AsRef<Path>>(path: P) -> Result<ValidationReport> {
    let dataset = Dataset::open_with(path, &LoadOptions::new().verify(false))?;
    Ok(validate_dataset(&dataset))
}

/// Validate an already parsed dataset
pub fn validate_dataset(dataset: &Dataset) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_properties(dataset, &mut report);
    check_devices(dataset, &mut report);
    check_tree(dataset, &mut report);

    if dataset.copyright().is_empty() {
        report.info.push("copyright notice is empty".to_string());
    }
    if dataset.trailing_bytes() > 0 {
        report.info.push(format!(
            "{} bytes follow the node tree segment",
            dataset.trailing_bytes()
        ));
    }
    report
}

fn check_properties(dataset: &Dataset, report: &mut ValidationReport) {
    let table = dataset.properties();
    let mut budget = Budget::new(Segment::Properties);
    let mut seen = FxHashSet::default();

    for index in 0..table.len() {
        match table.name_bytes(index) {
            None => budget.report(report, || {
                format!(
                    "property {} name offset {} is outside the strings pool",
                    index,
                    table.name_offset(index).unwrap_or_default()
                )
            }),
            Some(name) if name.is_empty() => {
                report.warnings.push(format!("property {} has an empty name", index))
            }
            Some(name) => {
                if !seen.insert(name) {
                    report.warnings.push(format!(
                        "property name '{}' appears more than once; only the first is addressable by name",
                        String::from_utf8_lossy(name)
                    ));
                }
            }
        }
    }
    budget.finish(report);

    if table.is_empty() {
        report.warnings.push("dataset defines no properties".to_string());
    }
}

fn check_devices(dataset: &Dataset, report: &mut ValidationReport) {
    let pool = dataset.strings();
    let properties = dataset.property_count().max(1);
    let mut budget = Budget::new(Segment::Devices);

    for (cell, offset) in dataset.device_cells().iter().enumerate() {
        if pool.get(offset.get()).is_none() {
            budget.report(report, || {
                format!(
                    "device {} property {} value offset {} is outside the strings pool",
                    cell / properties,
                    cell % properties,
                    offset.get()
                )
            });
        }
    }
    budget.finish(report);
}

fn check_tree(dataset: &Dataset, report: &mut ValidationReport) {
    let tree = dataset.tree();
    let lookups = tree.lookups();
    let device_count = dataset.device_count();
    let check_devices = dataset.property_count() > 0;

    let mut nodes = Budget::new(Segment::NodeTree);
    let mut records = Budget::new(Segment::LookupList);
    let mut visited: FxHashSet<u32> = FxHashSet::default();
    let mut used_lookups: FxHashSet<u32> = FxHashSet::default();
    let mut covered = 0usize;
    let mut stack = vec![(ROOT_OFFSET, 0usize)];

    while let Some((offset, depth)) = stack.pop() {
        if !visited.insert(offset) {
            continue;
        }
        let node = match tree.node_at(offset) {
            Some(node) => node,
            None => {
                nodes.report(report, || {
                    format!(
                        "node at offset {} does not fit in {} bytes",
                        offset,
                        tree.len()
                    )
                });
                continue;
            }
        };

        report.stats.reachable_nodes += 1;
        report.stats.max_depth = report.stats.max_depth.max(depth);
        covered += node.record_size();

        let fallback = node.fallback_device() as usize;
        if check_devices && fallback >= device_count {
            nodes.report(report, || {
                format!(
                    "node at offset {} falls back to device {} but only {} devices exist",
                    offset, fallback, device_count
                )
            });
        }

        let children = node.child_count() as usize;
        if children == 0 {
            report.stats.leaf_nodes += 1;
            continue;
        }
        report.stats.total_children += children;

        match lookups.record(node.lookup_offset()) {
            None => records.report(report, || {
                format!(
                    "node at offset {} references lookup record {} which is missing or truncated",
                    offset,
                    node.lookup_offset()
                )
            }),
            Some((_, table)) => {
                used_lookups.insert(node.lookup_offset());
                if table.len() < children {
                    records.report(report, || {
                        format!(
                            "lookup record {} has {} entries but node at offset {} has {} children",
                            node.lookup_offset(),
                            table.len(),
                            offset,
                            children
                        )
                    });
                }
            }
        }

        for child in node.child_offsets() {
            stack.push((child, depth + 1));
        }
    }

    nodes.finish(report);
    records.finish(report);

    report.stats.lookup_records = used_lookups.len();
    report.stats.unreachable_bytes = tree.len().saturating_sub(covered);
    if report.stats.unreachable_bytes > 0 {
        report.info.push(format!(
            "{} node tree bytes are not reachable from the root",
            report.stats.unreachable_bytes
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::DatasetWriter;

    fn unverified(bytes: Vec<u8>) -> Dataset {
        Dataset::from_bytes_with(bytes, &LoadOptions::new().verify(false)).unwrap()
    }

    fn raw_file(segments: [&[u8]; 6]) -> Vec<u8> {
        let mut out = 1u16.to_le_bytes().to_vec();
        for payload in segments {
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(payload);
        }
        out
    }

    #[test]
    fn test_valid_tree_stats() {
        let mut w = DatasetWriter::new("(c)");
        w.add_property("Name").unwrap();
        let generic = w.add_device(&["Generic"]).unwrap();
        let phone = w.add_device(&["Phone"]).unwrap();
        let root = w.root();
        w.set_fallback(root, generic);
        w.insert_path(root, b"ab", phone);
        w.insert_path(root, b"ac", phone);

        let report = validate_dataset(&unverified(w.build().unwrap()));
        assert!(report.is_valid(), "{:?}", report.errors);
        assert_eq!(report.stats.reachable_nodes, 4);
        assert_eq!(report.stats.leaf_nodes, 2);
        assert_eq!(report.stats.max_depth, 2);
        assert_eq!(report.stats.unreachable_bytes, 0);
    }

    #[test]
    fn test_dangling_child_reported() {
        // Root: lookup 0, device 0, one child at offset 500
        let mut root = vec![0, 0, 0, 0, 0, 0, 1];
        root.extend_from_slice(&500u32.to_le_bytes());
        let bytes = raw_file([b"", b"v\0", &[0, 0, 0, 0], &[0, 0, 0, 0], &[b'a', b'a', 0], &root]);

        let report = validate_dataset(&unverified(bytes));
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].segment, Segment::NodeTree);
        assert!(report.errors[0].message.contains("offset 500"));
    }

    #[test]
    fn test_short_lookup_table_reported() {
        // Root claims two children but its lookup record covers one byte
        let mut root = vec![0, 0, 0, 0, 0, 0, 2];
        root.extend_from_slice(&15u32.to_le_bytes());
        root.extend_from_slice(&15u32.to_le_bytes());
        root.extend_from_slice(&[3, 0, 0, 0, 0, 0, 0]);
        let bytes = raw_file([b"", b"v\0", &[0, 0, 0, 0], &[0, 0, 0, 0], &[b'a', b'a', 0], &root]);

        let report = validate_dataset(&unverified(bytes));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].segment, Segment::LookupList);
    }

    #[test]
    fn test_bad_string_offsets_reported() {
        let bytes = raw_file([
            b"",
            b"v\0",
            &99u32.to_le_bytes(),
            &77u32.to_le_bytes(),
            b"",
            &[0, 0, 0, 0, 0, 0, 0],
        ]);
        let report = validate_dataset(&unverified(bytes));
        let segments: Vec<_> = report.errors.iter().map(|e| e.segment).collect();
        assert_eq!(segments, vec![Segment::Properties, Segment::Devices]);
    }

    #[test]
    fn test_error_budget() {
        let mut props = Vec::new();
        for _ in 0..30 {
            props.extend_from_slice(&1000u32.to_le_bytes());
        }
        let bytes = raw_file([b"", b"", &props, b"", b"", &[0, 0, 0, 0, 0, 0, 0]]);
        let report = validate_dataset(&unverified(bytes));
        let property_errors: Vec<_> = report
            .errors
            .iter()
            .filter(|e| e.segment == Segment::Properties)
            .collect();
        assert_eq!(property_errors.len(), MAX_REPORTED + 1);
        assert!(property_errors[MAX_REPORTED].message.contains("10 further"));
    }

    #[test]
    fn test_unreachable_bytes_noted() {
        let mut tree = vec![0, 0, 0, 0, 0, 0, 0];
        tree.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0]);
        let bytes = raw_file([b"(c)", b"v\0", &[0, 0, 0, 0], &[0, 0, 0, 0], b"", &tree]);
        let report = validate_dataset(&unverified(bytes));
        assert!(report.is_valid());
        assert_eq!(report.stats.unreachable_bytes, 7);
        assert_eq!(report.info.len(), 1);
    }

    #[test]
    fn test_trailing_bytes_noted() {
        let mut bytes = raw_file([b"(c)", b"v\0", &[0, 0, 0, 0], &[0, 0, 0, 0], b"", &[0; 7]]);
        bytes.extend_from_slice(b"pad");
        let report = validate_dataset(&unverified(bytes));
        assert!(report.is_valid());
        assert_eq!(report.info, vec!["3 bytes follow the node tree segment".to_string()]);
    }
}
