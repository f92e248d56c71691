//! Detector lifecycle
//!
//! A [`Detector`] holds at most one active [`Snapshot`]: a loaded
//! [`Dataset`] plus the property set resolved for it. Initialising again
//! builds the replacement first and then swaps it in, so readers observe
//! either the old snapshot or the new one, never a partial state.
//!
//! ```no_run
//! use uatrie::Detector;
//!
//! let detector = Detector::new();
//! detector.init("devices.trie", Some("BrowserName|IsMobile"))?;
//!
//! let device = detector.lookup("Mozilla/5.0 (Linux; Android 14)")?;
//! let mut buf = [0u8; 256];
//! let n = detector.render_properties(&device, &mut buf)?;
//! print!("{}", String::from_utf8_lossy(&buf[..n]));
//!
//! detector.teardown();
//! # Ok::<(), uatrie::TrieError>(())
//! ```

use crate::dataset::Dataset;
use crate::error::{Result, TrieError};
use crate::options::LoadOptions;
use crate::output::{encode_csv, property_values, render_to_string};
use crate::properties::RequiredProperties;
use log::{debug, warn};
use std::borrow::Cow;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// A dataset together with the properties selected for rendering
#[derive(Debug)]
pub struct Snapshot {
    dataset: Dataset,
    required: RequiredProperties,
}

impl Snapshot {
    /// Resolve the property filter in `options` against `dataset`
    pub fn new(dataset: Dataset, options: &LoadOptions) -> Self {
        let required = dataset
            .properties()
            .resolve(options.property_filter(), options.keeps_first_property());
        Self { dataset, required }
    }

    /// Load a data file and resolve its property set
    pub fn load<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        let dataset = Dataset::open_with(path, options)?;
        Ok(Self::new(dataset, options))
    }

    /// The loaded dataset
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Properties rendered for every match, in output order
    pub fn required(&self) -> &RequiredProperties {
        &self.required
    }
}

/// Thread-safe holder of the active snapshot
#[derive(Debug, Default)]
pub struct Detector {
    active: RwLock<Option<Arc<Snapshot>>>,
}

impl Detector {
    /// A detector with nothing loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` and make it the active dataset.
    ///
    /// `property_filter` selects the rendered properties (`|` or `,`
    /// separated); `None` or an empty string selects all of them.
    pub fn init<P: AsRef<Path>>(&self, path: P, property_filter: Option<&str>) -> Result<()> {
        self.init_with(path, &LoadOptions::default().property_filter_opt(property_filter))
    }

    /// Load `path` with explicit options and make it the active dataset.
    ///
    /// On failure the previously active snapshot, if any, stays in place.
    pub fn init_with<P: AsRef<Path>>(&self, path: P, options: &LoadOptions) -> Result<()> {
        let path = path.as_ref();
        match Snapshot::load(path, options) {
            Ok(snapshot) => {
                self.activate(snapshot);
                Ok(())
            }
            Err(e) => {
                if self.is_initialized() {
                    warn!(
                        "reload of {} failed, keeping current dataset: {}",
                        path.display(),
                        e
                    );
                }
                Err(e)
            }
        }
    }

    /// Install an already built snapshot, replacing the current one
    pub fn activate(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        let previous = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(snapshot);
        debug!(
            "activated dataset snapshot (replaced previous: {})",
            previous.is_some()
        );
        // `previous` drops here, outside the lock
    }

    /// The active snapshot, if any
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a dataset is currently loaded
    pub fn is_initialized(&self) -> bool {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn require_snapshot(&self) -> Result<Arc<Snapshot>> {
        self.snapshot().ok_or(TrieError::NotInitialized)
    }

    /// Match a user agent against the active dataset
    pub fn lookup(&self, user_agent: &str) -> Result<DeviceHandle> {
        self.lookup_bytes(user_agent.as_bytes())
    }

    /// Match raw user agent bytes against the active dataset
    pub fn lookup_bytes(&self, user_agent: &[u8]) -> Result<DeviceHandle> {
        let snapshot = self.require_snapshot()?;
        let device = snapshot.dataset.resolve_device(user_agent);
        Ok(DeviceHandle { snapshot, device })
    }

    /// Index of the property named exactly `name`
    pub fn property_index(&self, name: &str) -> Result<usize> {
        self.require_snapshot()?
            .dataset
            .property_index(name)
            .ok_or_else(|| TrieError::PropertyNotFound(name.to_string()))
    }

    /// Render the selected properties of `device` into `buf`.
    ///
    /// Fails with [`TrieError::NotInitialized`] once the detector has been
    /// torn down, even though the handle still holds its data; use
    /// [`DeviceHandle::render`] to render regardless of detector state.
    pub fn render_properties(&self, device: &DeviceHandle, buf: &mut [u8]) -> Result<usize> {
        if !self.is_initialized() {
            return Err(TrieError::NotInitialized);
        }
        device.render(buf)
    }

    /// Drop the active dataset. Outstanding handles stay usable.
    pub fn teardown(&self) {
        let previous = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            debug!("detector torn down");
        }
    }
}

/// Result of a lookup, bound to the snapshot it was matched in
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    snapshot: Arc<Snapshot>,
    device: u16,
}

impl DeviceHandle {
    /// Matched device index
    pub fn device_index(&self) -> u16 {
        self.device
    }

    /// Base offset of the device's row in the devices matrix
    pub fn row_offset(&self) -> usize {
        self.snapshot.dataset.row_offset_of(self.device)
    }

    /// The snapshot this handle renders from
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// The dataset this handle renders from
    pub fn dataset(&self) -> &Dataset {
        &self.snapshot.dataset
    }

    /// Raw value of any property, selected or not
    pub fn value_bytes(&self, property: usize) -> Option<&[u8]> {
        self.snapshot.dataset.value(self.row_offset(), property)
    }

    /// Value of any property, selected or not, lossily decoded as UTF-8
    pub fn value(&self, property: usize) -> Option<Cow<'_, str>> {
        self.value_bytes(property).map(String::from_utf8_lossy)
    }

    /// `(name, value)` pairs of the selected properties in output order
    pub fn properties(&self) -> impl Iterator<Item = Result<(Cow<'_, str>, Cow<'_, str>)>> + '_ {
        property_values(
            &self.snapshot.dataset,
            self.row_offset(),
            &self.snapshot.required,
        )
        .map(|pair| {
            pair.map(|(name, value)| {
                (
                    String::from_utf8_lossy(name),
                    String::from_utf8_lossy(value),
                )
            })
        })
    }

    /// Render the selected properties as `name|value\n` lines into `buf`
    pub fn render(&self, buf: &mut [u8]) -> Result<usize> {
        encode_csv(
            &self.snapshot.dataset,
            self.row_offset(),
            &self.snapshot.required,
            buf,
        )
    }

    /// Render the selected properties into a new string
    pub fn to_csv_string(&self) -> Result<String> {
        render_to_string(
            &self.snapshot.dataset,
            self.row_offset(),
            &self.snapshot.required,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::DatasetWriter;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_dataset(browser: &str) -> NamedTempFile {
        let mut w = DatasetWriter::new("test");
        w.add_property("Id").unwrap();
        w.add_property("BrowserName").unwrap();
        w.add_property("IsMobile").unwrap();
        let unknown = w.add_device(&["0", "Unknown", "False"]).unwrap();
        let matched = w.add_device(&["1", browser, "True"]).unwrap();
        let root = w.root();
        w.set_fallback(root, unknown);
        let a = w.add_node(matched);
        w.link(root, b'a', a);

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&w.build().unwrap()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_not_initialized() {
        let detector = Detector::new();
        assert!(!detector.is_initialized());
        assert_eq!(detector.lookup("apple").unwrap_err(), TrieError::NotInitialized);
        assert_eq!(
            detector.property_index("Id").unwrap_err(),
            TrieError::NotInitialized
        );
    }

    #[test]
    fn test_lookup_and_render() {
        let file = write_dataset("Safari");
        let detector = Detector::new();
        detector.init(file.path(), None).unwrap();

        let apple = detector.lookup("apple").unwrap();
        assert_eq!(apple.device_index(), 1);
        assert_eq!(apple.row_offset(), 3);
        assert_eq!(detector.lookup("xyz").unwrap().row_offset(), 0);

        let mut buf = [0u8; 64];
        let n = detector.render_properties(&apple, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"Id|1\nBrowserName|Safari\nIsMobile|True\n");
    }

    #[test]
    fn test_filter_skips_first_property() {
        let file = write_dataset("Safari");
        let detector = Detector::new();
        detector.init(file.path(), Some("Id|IsMobile")).unwrap();
        let device = detector.lookup("a").unwrap();
        assert_eq!(device.to_csv_string().unwrap(), "IsMobile|True\n");

        // Unselected properties remain readable by index
        let id = detector.property_index("Id").unwrap();
        assert_eq!(device.value(id).as_deref(), Some("1"));
    }

    #[test]
    fn test_property_not_found() {
        let file = write_dataset("Safari");
        let detector = Detector::new();
        detector.init(file.path(), None).unwrap();
        assert_eq!(
            detector.property_index("browsername"),
            Err(TrieError::PropertyNotFound("browsername".to_string()))
        );
    }

    #[test]
    fn test_reinit_swaps_and_old_handles_survive() {
        let first = write_dataset("Safari");
        let second = write_dataset("Chrome");
        let detector = Detector::new();

        detector.init(first.path(), None).unwrap();
        let old = detector.lookup("a").unwrap();

        detector.init(second.path(), None).unwrap();
        let new = detector.lookup("a").unwrap();

        assert_eq!(old.value(1).as_deref(), Some("Safari"));
        assert_eq!(new.value(1).as_deref(), Some("Chrome"));
    }

    #[test]
    fn test_failed_reinit_keeps_current() {
        let good = write_dataset("Safari");
        let mut bad = NamedTempFile::new().unwrap();
        let mut bytes = DatasetWriter::new("").build().unwrap();
        bytes[0] = 2;
        bad.write_all(&bytes).unwrap();
        bad.flush().unwrap();

        let detector = Detector::new();
        detector.init(good.path(), None).unwrap();
        assert_eq!(
            detector.init(bad.path(), None),
            Err(TrieError::UnsupportedVersion {
                found: 2,
                expected: 1
            })
        );
        assert_eq!(detector.lookup("a").unwrap().value(1).as_deref(), Some("Safari"));
    }

    #[test]
    fn test_teardown() {
        let file = write_dataset("Safari");
        let detector = Detector::new();
        detector.init(file.path(), None).unwrap();
        let handle = detector.lookup("a").unwrap();

        detector.teardown();
        assert_eq!(detector.lookup("a").unwrap_err(), TrieError::NotInitialized);

        let mut buf = [0u8; 64];
        assert_eq!(
            detector.render_properties(&handle, &mut buf),
            Err(TrieError::NotInitialized)
        );
        assert!(handle.render(&mut buf).is_ok());

        // A second teardown is harmless
        detector.teardown();
    }

    #[test]
    fn test_concurrent_lookups_during_reinit() {
        let first = write_dataset("Safari");
        let second = write_dataset("Chrome");
        let detector = Arc::new(Detector::new());
        detector.init(first.path(), None).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let detector = Arc::clone(&detector);
                scope.spawn(move || {
                    for _ in 0..200 {
                        let value = detector.lookup("a").unwrap().value(1).unwrap().into_owned();
                        assert!(value == "Safari" || value == "Chrome");
                    }
                });
            }
            for _ in 0..20 {
                detector.init(second.path(), None).unwrap();
                detector.init(first.path(), None).unwrap();
            }
        });
    }

    #[test]
    fn test_properties_iterator() {
        let file = write_dataset("Safari");
        let detector = Detector::new();
        detector.init(file.path(), Some("BrowserName,IsMobile")).unwrap();
        let pairs: Vec<_> = detector
            .lookup("a")
            .unwrap()
            .properties()
            .map(|p| p.map(|(n, v)| format!("{}={}", n, v)))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(pairs, vec!["BrowserName=Safari", "IsMobile=True"]);
    }
}
