//! Strings pool access
//!
//! Every piece of text in a data file (property names, property values) lives
//! in one shared pool and is referenced by byte offset. A string runs from its
//! offset up to the next NUL byte, or to the end of the pool when none follows.

use std::borrow::Cow;

/// Borrowed view over the strings segment
#[derive(Debug, Clone, Copy)]
pub struct StringsPool<'a> {
    bytes: &'a [u8],
}

impl<'a> StringsPool<'a> {
    /// Wrap the raw strings segment
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Size of the pool in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the pool holds no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw bytes of the string at `offset`, terminator excluded.
    ///
    /// Returns `None` when the offset lies outside the pool.
    #[inline]
    pub fn get(&self, offset: u32) -> Option<&'a [u8]> {
        let tail = self.bytes.get(offset as usize..)?;
        let end = memchr::memchr(0, tail).unwrap_or(tail.len());
        Some(&tail[..end])
    }

    /// String at `offset`, with invalid UTF-8 replaced
    pub fn get_str(&self, offset: u32) -> Option<Cow<'a, str>> {
        self.get(offset).map(String::from_utf8_lossy)
    }

    /// True when the string at `offset` is byte-for-byte equal to `name`
    #[inline]
    pub fn equals(&self, offset: u32, name: &[u8]) -> bool {
        self.get(offset) == Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminated_strings() {
        let pool = StringsPool::new(b"BrowserName\0Chrome\0");
        assert_eq!(pool.get(0), Some(&b"BrowserName"[..]));
        assert_eq!(pool.get(12), Some(&b"Chrome"[..]));
        assert_eq!(pool.get(11), Some(&b""[..]));
    }

    #[test]
    fn test_unterminated_tail() {
        let pool = StringsPool::new(b"abc\0def");
        assert_eq!(pool.get(4), Some(&b"def"[..]));
        // An offset equal to the length is an empty string at the very end
        assert_eq!(pool.get(7), Some(&b""[..]));
        assert_eq!(pool.get(8), None);
    }

    #[test]
    fn test_equals_is_exact() {
        let pool = StringsPool::new(b"BrowserName\0");
        assert!(pool.equals(0, b"BrowserName"));
        assert!(!pool.equals(0, b"Browser"));
        assert!(!pool.equals(0, b"browsername"));
        assert!(!pool.equals(100, b"BrowserName"));
    }

    #[test]
    fn test_lossy_utf8() {
        let pool = StringsPool::new(b"ok\0\xFF\0");
        assert_eq!(pool.get_str(0).unwrap(), "ok");
        assert_eq!(pool.get_str(3).unwrap(), "\u{FFFD}");
    }
}
