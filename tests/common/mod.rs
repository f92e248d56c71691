//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;
use uatrie::DatasetWriter;

pub const PROPERTIES: [&str; 5] = ["Id", "BrowserName", "PlatformName", "IsMobile", "ScreenWidth"];

pub const UNKNOWN: u16 = 0;
pub const IPHONE: u16 = 1;
pub const WINDOWS_DESKTOP: u16 = 2;
pub const ANDROID: u16 = 3;
pub const OPERA: u16 = 4;

pub const IPHONE_UA: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
pub const WINDOWS_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0";
pub const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36";
pub const OPERA_UA: &str = "Opera/9.80 (X11; Linux x86_64) Presto/2.12.388";

fn add_properties(w: &mut DatasetWriter) {
    for name in PROPERTIES {
        w.add_property(name).unwrap();
    }
}

/// Root falls back to device 0 and has a single transition on 'a' to a
/// node falling back to device 1.
pub fn single_edge_bytes() -> Vec<u8> {
    let mut w = DatasetWriter::new("(c) single edge");
    add_properties(&mut w);
    let unknown = w.add_device(&["0", "Unknown", "Unknown", "False", "0"]).unwrap();
    let a_device = w.add_device(&["1", "Safari", "iOS", "True", "390"]).unwrap();
    let root = w.root();
    w.set_fallback(root, unknown);
    let a = w.add_node(a_device);
    w.link(root, b'a', a);
    w.build().expect("fixture builds")
}

/// A small browser trie keyed on well-known user-agent prefixes
pub fn browser_bytes() -> Vec<u8> {
    browser_writer("(c) uatrie test data").build().expect("fixture builds")
}

pub fn browser_writer(copyright: &str) -> DatasetWriter {
    let mut w = DatasetWriter::new(copyright);
    add_properties(&mut w);
    w.add_device(&["0", "Unknown", "Unknown", "False", "0"]).unwrap();
    w.add_device(&["1", "Mobile Safari", "iOS", "True", "390"]).unwrap();
    w.add_device(&["2", "Chrome", "Windows", "False", "1920"]).unwrap();
    w.add_device(&["3", "Chrome Mobile", "Android", "True", "412"]).unwrap();
    w.add_device(&["4", "Opera", "Linux", "False", "1366"]).unwrap();

    let root = w.root();
    w.set_fallback(root, UNKNOWN);
    let mozilla = w.insert_path(root, b"Mozilla/5.0 (", UNKNOWN);
    w.insert_path(mozilla, b"iPhone", IPHONE);
    w.insert_path(mozilla, b"Windows", WINDOWS_DESKTOP);
    w.insert_path(mozilla, b"Linux; Android", ANDROID);
    w.insert_path(root, b"Opera", OPERA);
    w
}

/// Write bytes to a temporary data file
pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".trie").expect("temp file");
    file.write_all(bytes).expect("write fixture");
    file.flush().expect("flush fixture");
    file
}
