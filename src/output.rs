//! Delimited text rendering of matched devices
//!
//! Each selected property becomes one line:
//!
//! ```text
//! BrowserName|Mobile Safari
//! IsMobile|True
//! ```
//!
//! [`encode_csv`] writes into a caller-supplied fixed buffer and reports
//! [`TrieError::BufferTooSmall`] (with the size actually needed) rather than
//! truncating. [`encode_csv_to_vec`] grows its own buffer.

use crate::dataset::Dataset;
use crate::error::{Result, TrieError};
use crate::format::Segment;
use crate::properties::RequiredProperties;

/// Separator between a property name and its value
pub const FIELD_SEPARATOR: u8 = b'|';

/// Terminator after each property line
pub const LINE_TERMINATOR: u8 = b'\n';

/// `(name, value)` pairs for the selected properties of one device row,
/// in render order.
///
/// Yields [`TrieError::CorruptSegment`] for a name or value whose offset lies
/// outside the strings pool (only possible for unverified datasets).
pub fn property_values<'d>(
    dataset: &'d Dataset,
    row_offset: usize,
    required: &'d RequiredProperties,
) -> impl Iterator<Item = Result<(&'d [u8], &'d [u8])>> + 'd {
    let pool = dataset.strings();
    required.as_slice().iter().map(move |p| {
        let name = pool.get(p.name_offset).ok_or_else(|| {
            TrieError::corrupt(
                Segment::Properties.name(),
                format!("name of property {} is outside the strings pool", p.index),
            )
        })?;
        let value = dataset.value(row_offset, p.index).ok_or_else(|| {
            TrieError::corrupt(
                Segment::Devices.name(),
                format!(
                    "no value for property {} in the row at offset {}",
                    p.index, row_offset
                ),
            )
        })?;
        Ok((name, value))
    })
}

/// Bytes needed to render the selected properties of one row
pub fn encoded_len(
    dataset: &Dataset,
    row_offset: usize,
    required: &RequiredProperties,
) -> Result<usize> {
    property_values(dataset, row_offset, required).try_fold(0, |total, pair| {
        let (name, value) = pair?;
        Ok(total + line_len(name, value))
    })
}

/// Render `name|value\n` lines into `buf`.
///
/// Returns the number of bytes written. Nothing past the returned length is
/// meaningful. On [`TrieError::BufferTooSmall`] the buffer contents are
/// unspecified and `required` holds the size that would have succeeded.
/// An empty property set renders nothing and returns `Ok(0)`.
pub fn encode_csv(
    dataset: &Dataset,
    row_offset: usize,
    required: &RequiredProperties,
    buf: &mut [u8],
) -> Result<usize> {
    let mut writer = BoundedWriter::new(buf);
    for pair in property_values(dataset, row_offset, required) {
        let (name, value) = pair?;
        if !writer.write_line(name, value) {
            return Err(TrieError::BufferTooSmall {
                required: encoded_len(dataset, row_offset, required)?,
                capacity: writer.capacity(),
            });
        }
    }
    Ok(writer.position())
}

/// Render into a freshly allocated buffer of exactly the right size
pub fn encode_csv_to_vec(
    dataset: &Dataset,
    row_offset: usize,
    required: &RequiredProperties,
) -> Result<Vec<u8>> {
    let mut out = vec![0u8; encoded_len(dataset, row_offset, required)?];
    let written = encode_csv(dataset, row_offset, required, &mut out)?;
    out.truncate(written);
    Ok(out)
}

/// Render into a `String`, replacing invalid UTF-8 in names or values
pub fn render_to_string(
    dataset: &Dataset,
    row_offset: usize,
    required: &RequiredProperties,
) -> Result<String> {
    let bytes = encode_csv_to_vec(dataset, row_offset, required)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

#[inline]
fn line_len(name: &[u8], value: &[u8]) -> usize {
    name.len() + value.len() + 2
}

/// Capacity-checked writer over a fixed slice
struct BoundedWriter<'b> {
    buf: &'b mut [u8],
    pos: usize,
}

impl<'b> BoundedWriter<'b> {
    fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn position(&self) -> usize {
        self.pos
    }

    /// Append one whole line, or nothing if it does not fit
    fn write_line(&mut self, name: &[u8], value: &[u8]) -> bool {
        let end = self.pos + line_len(name, value);
        if end > self.buf.len() {
            return false;
        }
        let line = &mut self.buf[self.pos..end];
        let (name_part, rest) = line.split_at_mut(name.len());
        name_part.copy_from_slice(name);
        rest[0] = FIELD_SEPARATOR;
        rest[1..1 + value.len()].copy_from_slice(value);
        rest[1 + value.len()] = LINE_TERMINATOR;
        self.pos = end;
        true
    }
}
