//! Property resolution
//!
//! Maps property names to their column in the devices matrix and builds the
//! ordered set of properties a caller wants rendered. Property names live in
//! the strings pool; nothing here copies them.

use crate::pool::StringsPool;
use log::warn;
use zerocopy::little_endian::U32;

/// Separators accepted between names in a property filter
pub const FILTER_SEPARATORS: [char; 2] = ['|', ','];

/// One selected property: its column and where its name lives in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyRef {
    /// Column index in the devices matrix
    pub index: usize,
    /// Offset of the property name in the strings pool
    pub name_offset: u32,
}

/// Ordered list of properties to render for each match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredProperties {
    entries: Vec<PropertyRef>,
}

impl RequiredProperties {
    /// Selected properties in render order
    pub fn as_slice(&self) -> &[PropertyRef] {
        &self.entries
    }

    /// Number of selected properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is selected
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Column indexes in render order
    pub fn indexes(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|p| p.index)
    }
}

/// Borrowed view over the properties segment
#[derive(Debug, Clone, Copy)]
pub struct PropertyTable<'a> {
    offsets: &'a [U32],
    pool: StringsPool<'a>,
}

impl<'a> PropertyTable<'a> {
    /// Create a table view from the decoded offset array and the pool
    pub fn new(offsets: &'a [U32], pool: StringsPool<'a>) -> Self {
        Self { offsets, pool }
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True when the dataset defines no properties
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Pool offset of the name of property `index`
    pub fn name_offset(&self, index: usize) -> Option<u32> {
        self.offsets.get(index).map(|o| o.get())
    }

    /// Raw name of property `index`
    pub fn name_bytes(&self, index: usize) -> Option<&'a [u8]> {
        self.pool.get(self.name_offset(index)?)
    }

    /// Index of the property named exactly `name` (case-sensitive).
    ///
    /// Linear scan in file order; the first match wins.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let name = name.as_bytes();
        self.offsets
            .iter()
            .position(|offset| self.pool.equals(offset.get(), name))
    }

    /// Every property, in file order
    pub fn resolve_all(&self) -> RequiredProperties {
        let entries = self
            .offsets
            .iter()
            .enumerate()
            .map(|(index, offset)| PropertyRef {
                index,
                name_offset: offset.get(),
            })
            .collect();
        RequiredProperties { entries }
    }

    /// Properties named in `filter`, in the caller's order.
    ///
    /// Names are separated by `|` or `,`. Unknown and empty names are
    /// skipped. Names resolving to property 0 are skipped too unless
    /// `keep_first` is set. This preserves the long-standing exclusion of
    /// property 0 from filters; whether it was ever intended is unknown.
    pub fn resolve_subset(&self, filter: &str, keep_first: bool) -> RequiredProperties {
        let mut entries = Vec::new();
        let mut unknown = Vec::new();

        for token in filter.split(FILTER_SEPARATORS) {
            if token.is_empty() {
                continue;
            }
            match self.index_of(token) {
                Some(0) if !keep_first => {}
                Some(index) => entries.push(PropertyRef {
                    index,
                    name_offset: self.offsets[index].get(),
                }),
                None => unknown.push(token),
            }
        }

        if !unknown.is_empty() {
            warn!("ignoring unknown properties in filter: {}", unknown.join(", "));
        }
        RequiredProperties { entries }
    }

    /// [`resolve_subset`](Self::resolve_subset) for a non-empty filter,
    /// [`resolve_all`](Self::resolve_all) otherwise
    pub fn resolve(&self, filter: Option<&str>, keep_first: bool) -> RequiredProperties {
        match filter {
            Some(f) if !f.is_empty() => self.resolve_subset(f, keep_first),
            _ => self.resolve_all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::FromBytes;

    const POOL: &[u8] = b"Id\0BrowserName\0ScreenWidth\0IsMobile\0";

    fn offsets() -> Vec<u8> {
        [0u32, 3, 15, 27].iter().flat_map(|o| o.to_le_bytes()).collect()
    }

    fn with_table<R>(f: impl FnOnce(PropertyTable<'_>) -> R) -> R {
        let raw = offsets();
        let words = <[U32]>::ref_from_bytes(&raw).unwrap();
        f(PropertyTable::new(words, StringsPool::new(POOL)))
    }

    fn names(table: &PropertyTable<'_>, set: &RequiredProperties) -> Vec<String> {
        set.as_slice()
            .iter()
            .map(|p| String::from_utf8_lossy(table.name_bytes(p.index).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn test_index_of() {
        with_table(|table| {
            assert_eq!(table.index_of("Id"), Some(0));
            assert_eq!(table.index_of("ScreenWidth"), Some(2));
            assert_eq!(table.index_of("screenwidth"), None);
            assert_eq!(table.index_of("Screen"), None);
            assert_eq!(table.index_of(""), None);
        });
    }

    #[test]
    fn test_resolve_all_in_file_order() {
        with_table(|table| {
            let all = table.resolve_all();
            assert_eq!(all.indexes().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
            assert_eq!(all.as_slice()[1].name_offset, 3);
        });
    }

    #[test]
    fn test_subset_drops_unknown_and_keeps_caller_order() {
        with_table(|table| {
            let set = table.resolve_subset("BrowserName,UnknownToken,ScreenWidth", false);
            assert_eq!(names(&table, &set), ["BrowserName", "ScreenWidth"]);

            let set = table.resolve_subset("IsMobile|BrowserName", false);
            assert_eq!(names(&table, &set), ["IsMobile", "BrowserName"]);
        });
    }

    #[test]
    fn test_subset_skips_first_property() {
        with_table(|table| {
            let set = table.resolve_subset("Id,BrowserName", false);
            assert_eq!(names(&table, &set), ["BrowserName"]);

            let set = table.resolve_subset("Id,BrowserName", true);
            assert_eq!(names(&table, &set), ["Id", "BrowserName"]);
        });
    }

    #[test]
    fn test_subset_empty_tokens() {
        with_table(|table| {
            let set = table.resolve_subset(",,ScreenWidth||", false);
            assert_eq!(names(&table, &set), ["ScreenWidth"]);
            assert!(table.resolve_subset("Nope", false).is_empty());
        });
    }

    #[test]
    fn test_resolve_empty_filter_means_all() {
        with_table(|table| {
            assert_eq!(table.resolve(Some(""), false).len(), 4);
            assert_eq!(table.resolve(None, false).len(), 4);
            assert_eq!(table.resolve(Some("IsMobile"), false).len(), 1);
        });
    }
}
