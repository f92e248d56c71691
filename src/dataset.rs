//! Loaded trie datasets
//!
//! A [`Dataset`] owns the bytes of one data file (memory-mapped or in a
//! `Vec`) together with the segment table describing where each segment
//! lives. It never changes after construction; every accessor returns a
//! bounds-checked view borrowed from it.
//!
//! # Example
//!
//! ```no_run
//! use uatrie::Dataset;
//!
//! let dataset = Dataset::open("devices.trie")?;
//! let row = dataset.device_row_offset("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)");
//! if let Some(index) = dataset.property_index("IsMobile") {
//!     let value = dataset.value(row, index).unwrap_or_default();
//!     println!("IsMobile = {}", String::from_utf8_lossy(value));
//! }
//! # Ok::<(), uatrie::TrieError>(())
//! ```

use crate::error::{Result, TrieError};
use crate::format::Segment;
use crate::lookup::LookupList;
use crate::options::LoadOptions;
use crate::pool::StringsPool;
use crate::properties::PropertyTable;
use crate::segments::{parse_segments, SegmentTable};
use crate::tree::NodeTree;
use crate::validation::validate_dataset;
use log::{debug, info};
use memmap2::Mmap;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh64::xxh64;
use zerocopy::little_endian::U32;
use zerocopy::FromBytes;

/// Storage for dataset bytes - either owned or memory-mapped
enum DatasetStorage {
    Owned(Vec<u8>),
    Mmap(Mmap),
}

impl DatasetStorage {
    fn as_slice(&self) -> &[u8] {
        match self {
            DatasetStorage::Owned(v) => v.as_slice(),
            DatasetStorage::Mmap(m) => &m[..],
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            DatasetStorage::Owned(_) => "owned",
            DatasetStorage::Mmap(_) => "mmap",
        }
    }
}

/// Summary of a loaded dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetInfo {
    /// File the dataset was loaded from, if any
    pub source: Option<String>,
    /// Format version
    pub version: u16,
    /// Copyright notice embedded in the file
    pub copyright: String,
    /// Number of properties (matrix columns)
    pub property_count: usize,
    /// Number of devices (matrix rows)
    pub device_count: usize,
    /// Size of the strings pool in bytes
    pub strings_bytes: usize,
    /// Size of the lookup list in bytes
    pub lookup_list_bytes: usize,
    /// Size of the node tree in bytes
    pub node_tree_bytes: usize,
    /// Size of the whole file in bytes
    pub file_bytes: usize,
    /// XXH64 of the whole file, hex encoded
    pub checksum: String,
    /// "mmap" or "owned"
    pub storage: &'static str,
}

/// One immutable, fully loaded trie dataset
pub struct Dataset {
    storage: DatasetStorage,
    segments: SegmentTable,
    property_count: usize,
    device_count: usize,
    source: Option<PathBuf>,
}

impl Dataset {
    /// Open and verify a data file with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &LoadOptions::default())
    }

    /// Open a data file.
    ///
    /// # Errors
    ///
    /// - [`TrieError::FileNotFound`] if the path does not exist
    /// - [`TrieError::UnsupportedVersion`] / [`TrieError::CorruptSegment`] for
    ///   files that cannot be parsed, or that fail verification when
    ///   [`LoadOptions::verify`] is on
    pub fn open_with<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| open_error(path, e))?;

        let storage = if options.mmap_enabled() {
            // SAFETY: the mapping is read-only and owned by the dataset; the
            // data file is expected not to be truncated while it is in use.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| open_error(path, e))?;
            DatasetStorage::Mmap(mmap)
        } else {
            let mut bytes = Vec::new();
            (&file)
                .read_to_end(&mut bytes)
                .map_err(|e| open_error(path, e))?;
            DatasetStorage::Owned(bytes)
        };

        let mut dataset = Self::from_storage(storage, options)?;
        dataset.source = Some(path.to_path_buf());
        info!(
            "loaded {}: {} properties, {} devices, {} tree bytes ({})",
            path.display(),
            dataset.property_count,
            dataset.device_count,
            dataset.segments.len(Segment::NodeTree),
            dataset.storage.kind()
        );
        Ok(dataset)
    }

    /// Build a verified dataset from raw file bytes
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with(data, &LoadOptions::default())
    }

    /// Build a dataset from raw file bytes (the mmap option is ignored)
    pub fn from_bytes_with(data: Vec<u8>, options: &LoadOptions) -> Result<Self> {
        Self::from_storage(DatasetStorage::Owned(data), options)
    }

    fn from_storage(storage: DatasetStorage, options: &LoadOptions) -> Result<Self> {
        let segments = parse_segments(storage.as_slice())?;
        let property_count = segments.len(Segment::Properties) / 4;
        let device_count = match property_count {
            0 => 0,
            n => segments.len(Segment::Devices) / 4 / n,
        };

        let dataset = Self {
            storage,
            segments,
            property_count,
            device_count,
            source: None,
        };

        if options.verify_enabled() {
            let report = validate_dataset(&dataset);
            if let Some(issue) = report.errors.first() {
                return Err(TrieError::corrupt(
                    issue.segment.name(),
                    format!(
                        "{} ({} structural error(s) in total)",
                        issue.message,
                        report.errors.len()
                    ),
                ));
            }
            debug!(
                "verified {} reachable nodes, max depth {}",
                report.stats.reachable_nodes, report.stats.max_depth
            );
        }

        Ok(dataset)
    }

    /// Raw bytes of one segment
    pub fn segment_bytes(&self, segment: Segment) -> &[u8] {
        &self.storage.as_slice()[self.segments.range(segment)]
    }

    fn words(&self, segment: Segment) -> &[U32] {
        // Lengths are checked to be multiples of 4 when the table is parsed
        <[U32]>::ref_from_bytes(self.segment_bytes(segment)).unwrap_or(&[])
    }

    /// Format version of the file
    pub fn version(&self) -> u16 {
        self.segments.version()
    }

    /// Copyright notice embedded in the file
    pub fn copyright(&self) -> Cow<'_, str> {
        let bytes = self.segment_bytes(Segment::Copyright);
        let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end])
    }

    /// Bytes after the node tree segment
    pub fn trailing_bytes(&self) -> usize {
        self.segments.trailing_bytes()
    }

    /// File this dataset was opened from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Whether the bytes are memory-mapped
    pub fn is_mmap(&self) -> bool {
        matches!(self.storage, DatasetStorage::Mmap(_))
    }

    /// Number of properties (columns of the devices matrix)
    pub fn property_count(&self) -> usize {
        self.property_count
    }

    /// Number of devices (rows of the devices matrix)
    pub fn device_count(&self) -> usize {
        self.device_count
    }

    /// Strings pool view
    pub fn strings(&self) -> StringsPool<'_> {
        StringsPool::new(self.segment_bytes(Segment::Strings))
    }

    /// Property table view
    pub fn properties(&self) -> PropertyTable<'_> {
        PropertyTable::new(self.words(Segment::Properties), self.strings())
    }

    /// Lookup list view
    pub fn lookups(&self) -> LookupList<'_> {
        LookupList::new(self.segment_bytes(Segment::LookupList))
    }

    /// Node tree view
    pub fn tree(&self) -> NodeTree<'_> {
        NodeTree::new(self.segment_bytes(Segment::NodeTree), self.lookups())
    }

    /// Flattened devices matrix of pool offsets
    pub fn device_cells(&self) -> &[U32] {
        self.words(Segment::Devices)
    }

    /// Index of the property named exactly `name`
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties().index_of(name)
    }

    /// Names of all properties in file order
    pub fn property_names(&self) -> Vec<Cow<'_, str>> {
        let table = self.properties();
        (0..table.len())
            .map(|i| String::from_utf8_lossy(table.name_bytes(i).unwrap_or_default()))
            .collect()
    }

    /// Device index matched by a raw user agent
    pub fn resolve_device(&self, user_agent: &[u8]) -> u16 {
        self.tree().resolve_device(user_agent)
    }

    /// Base offset of the matched device's row in the devices matrix
    pub fn device_row_offset(&self, user_agent: &str) -> usize {
        self.row_offset_of(self.resolve_device(user_agent.as_bytes()))
    }

    /// Base offset of `device`'s row in the devices matrix
    pub fn row_offset_of(&self, device: u16) -> usize {
        device as usize * self.property_count
    }

    /// Pool offset of the value in the given matrix cell
    pub fn value_offset(&self, row_offset: usize, property: usize) -> Option<u32> {
        if property >= self.property_count {
            return None;
        }
        self.device_cells()
            .get(row_offset.checked_add(property)?)
            .map(|cell| cell.get())
    }

    /// Raw value of `property` for the device whose row starts at `row_offset`
    pub fn value(&self, row_offset: usize, property: usize) -> Option<&[u8]> {
        self.strings().get(self.value_offset(row_offset, property)?)
    }

    /// XXH64 of the complete file bytes
    pub fn checksum(&self) -> u64 {
        xxh64(self.storage.as_slice(), 0)
    }

    /// Summary suitable for display or JSON output
    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            source: self.source.as_ref().map(|p| p.display().to_string()),
            version: self.version(),
            copyright: self.copyright().into_owned(),
            property_count: self.property_count,
            device_count: self.device_count,
            strings_bytes: self.segments.len(Segment::Strings),
            lookup_list_bytes: self.segments.len(Segment::LookupList),
            node_tree_bytes: self.segments.len(Segment::NodeTree),
            file_bytes: self.storage.as_slice().len(),
            checksum: format!("{:016x}", self.checksum()),
            storage: self.storage.kind(),
        }
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("source", &self.source)
            .field("version", &self.version())
            .field("property_count", &self.property_count)
            .field("device_count", &self.device_count)
            .field("storage", &self.storage.kind())
            .finish()
    }
}

fn open_error(path: &Path, err: io::Error) -> TrieError {
    if err.kind() == io::ErrorKind::NotFound {
        TrieError::FileNotFound(path.display().to_string())
    } else {
        TrieError::Io(format!("{}: {}", path.display(), err))
    }
}
