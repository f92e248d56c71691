//! Error types for the uatrie library

use std::fmt;
use std::io;

/// Result type alias for trie operations
pub type Result<T> = std::result::Result<T, TrieError>;

/// Main error type for loading, matching and rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// The data file does not exist
    FileNotFound(String),

    /// The data file declares a format version this crate cannot read
    UnsupportedVersion {
        /// Version read from the file header
        found: u16,
        /// Version this crate understands
        expected: u16,
    },

    /// A segment is truncated or structurally malformed
    CorruptSegment {
        /// Name of the offending segment
        segment: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// The destination buffer cannot hold the rendered output
    BufferTooSmall {
        /// Bytes needed for the complete output
        required: usize,
        /// Bytes available in the destination
        capacity: usize,
    },

    /// No property carries the requested name
    PropertyNotFound(String),

    /// No dataset is active (before `init` or after `teardown`)
    NotInitialized,

    /// Any other I/O failure
    Io(String),
}

impl TrieError {
    pub(crate) fn corrupt(segment: &'static str, reason: impl Into<String>) -> Self {
        TrieError::CorruptSegment {
            segment,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TrieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrieError::FileNotFound(path) => write!(f, "Data file not found: {}", path),
            TrieError::UnsupportedVersion { found, expected } => write!(
                f,
                "Unsupported data file version {} (expected {})",
                found, expected
            ),
            TrieError::CorruptSegment { segment, reason } => {
                write!(f, "Corrupt {} segment: {}", segment, reason)
            }
            TrieError::BufferTooSmall { required, capacity } => write!(
                f,
                "Buffer too small: {} bytes required, {} available",
                required, capacity
            ),
            TrieError::PropertyNotFound(name) => write!(f, "Property not found: {}", name),
            TrieError::NotInitialized => write!(f, "No dataset has been initialised"),
            TrieError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for TrieError {}

impl From<io::Error> for TrieError {
    fn from(err: io::Error) -> Self {
        TrieError::Io(err.to_string())
    }
}
