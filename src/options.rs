//! Load-time configuration

/// Options controlling how a data file is loaded and which properties are
/// rendered for each match.
///
/// # Example
///
/// ```
/// use uatrie::LoadOptions;
///
/// let options = LoadOptions::new()
///     .properties("BrowserName|IsMobile")
///     .use_mmap(false);
/// assert_eq!(options.property_filter(), Some("BrowserName|IsMobile"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    properties: Option<String>,
    use_mmap: bool,
    verify: bool,
    keep_first_property: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            properties: None,
            use_mmap: true,
            verify: true,
            keep_first_property: false,
        }
    }
}

impl LoadOptions {
    /// Default options: all properties, memory-mapped, verified
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict rendering to the named properties (`|` or `,` separated).
    /// An empty string selects every property.
    pub fn properties(mut self, filter: impl Into<String>) -> Self {
        self.properties = Some(filter.into());
        self
    }

    /// Set or clear the property filter
    pub fn property_filter_opt(mut self, filter: Option<&str>) -> Self {
        self.properties = filter.map(str::to_string);
        self
    }

    /// Memory-map the file (default) or read it into an owned buffer
    pub fn use_mmap(mut self, enabled: bool) -> Self {
        self.use_mmap = enabled;
        self
    }

    /// Walk the whole tree at load time and reject structurally broken files
    pub fn verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    /// Allow the first property to be selected through a filter.
    ///
    /// Off by default, which preserves the long-standing exclusion of
    /// property 0 from filters. Whether that exclusion was intended is
    /// unknown.
    pub fn keep_first_property(mut self, enabled: bool) -> Self {
        self.keep_first_property = enabled;
        self
    }

    /// Configured property filter, if any
    pub fn property_filter(&self) -> Option<&str> {
        self.properties.as_deref()
    }

    /// Whether the file is memory-mapped
    pub fn mmap_enabled(&self) -> bool {
        self.use_mmap
    }

    /// Whether structural verification runs at load time
    pub fn verify_enabled(&self) -> bool {
        self.verify
    }

    /// Whether filters may select property 0
    pub fn keeps_first_property(&self) -> bool {
        self.keep_first_property
    }
}
