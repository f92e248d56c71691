//! uatrie - User-Agent Device Detection over a Byte Trie
//!
//! uatrie maps a user-agent string to a device profile by walking a
//! precompiled byte trie stored in a single binary data file, then renders
//! the selected properties of that device as `name|value` lines.
//!
//! # Quick Start
//!
//! ```rust
//! use uatrie::{Detector, DatasetWriter};
//!
//! // Build a tiny data file: one property, two devices, one transition
//! let mut writer = DatasetWriter::new("(c) example");
//! writer.add_property("Id")?;
//! writer.add_property("IsMobile")?;
//! let desktop = writer.add_device(&["1", "False"])?;
//! let phone = writer.add_device(&["2", "True"])?;
//! let root = writer.root();
//! writer.set_fallback(root, desktop);
//! writer.insert_path(root, b"iPhone", phone);
//! # let tmp_path = std::env::temp_dir().join("uatrie_doctest_lib.trie");
//! # std::fs::write(&tmp_path, writer.build()?).unwrap();
//!
//! let detector = Detector::new();
//! # /*
//! detector.init("devices.trie", Some("IsMobile"))?;
//! # */
//! # detector.init(&tmp_path, Some("IsMobile"))?;
//!
//! let device = detector.lookup("iPhone; CPU iPhone OS 17_0")?;
//! assert_eq!(device.to_csv_string()?, "IsMobile|True\n");
//! # let _ = std::fs::remove_file(&tmp_path);
//! # Ok::<(), uatrie::TrieError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  Data File (little-endian)           │
//! ├──────────────────────────────────────┤
//! │  u16 version                         │
//! │  1. Copyright                        │
//! │  2. Strings pool (NUL-terminated)    │
//! │  3. Properties (u32 name offsets)    │
//! │  4. Devices (u32 value matrix)       │
//! │  5. Lookup list (byte -> child idx)  │
//! │  6. Node tree (root at offset 0)     │
//! └──────────────────────────────────────┘
//!          ↓ mmap() + segment table
//! ┌──────────────────────────────────────┐
//! │  Dataset (immutable, shareable)      │
//! │  Detector (atomic snapshot swap)     │
//! └──────────────────────────────────────┘
//! ```
//!
//! Each byte of the user agent selects a child through the current node's
//! lookup record; the walk stops at the end of input or on the first byte
//! with no transition, and the node reached names the device.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Loaded, immutable datasets
pub mod dataset;
/// Detector lifecycle and device handles
pub mod detector;
/// Error types for dataset operations
pub mod error;
/// On-disk record layouts and constants
pub mod format;
/// Lookup record decoding
pub mod lookup;
pub mod options;
/// `name|value` rendering
pub mod output;
/// Strings pool access
pub mod pool;
pub mod properties;
/// Segment table parsing
pub mod segments;
pub mod tree;
/// Structural validation of data files
pub mod validation;
pub mod writer;

// Re-exports for Rust consumers

pub use crate::dataset::{Dataset, DatasetInfo};
pub use crate::detector::{Detector, DeviceHandle, Snapshot};
pub use crate::error::{Result, TrieError};
pub use crate::format::{Segment, FORMAT_VERSION};
pub use crate::options::LoadOptions;
pub use crate::output::{encode_csv, encode_csv_to_vec, render_to_string};
pub use crate::properties::{PropertyRef, RequiredProperties};
pub use crate::validation::{validate_dataset, validate_file, ValidationReport};
pub use crate::writer::{DatasetWriter, NodeId};

// Version information
/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
