#![no_main]
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use uatrie::{Dataset, DatasetWriter};

fn dataset() -> &'static Dataset {
    static DATASET: OnceLock<Dataset> = OnceLock::new();
    DATASET.get_or_init(|| {
        let mut w = DatasetWriter::new("fuzz");
        w.add_property("Id").unwrap();
        w.add_property("Name").unwrap();
        let unknown = w.add_device(&["0", "Unknown"]).unwrap();
        let root = w.root();
        w.set_fallback(root, unknown);
        for (i, prefix) in ["Mozilla/5.0 (", "Opera/", "curl/", "Dalvik/"].into_iter().enumerate() {
            let id = (i + 1).to_string();
            let device = w.add_device(&[id.as_str(), prefix]).unwrap();
            w.insert_path(root, prefix.as_bytes(), device);
        }
        Dataset::from_bytes(w.build().expect("fuzz dataset")).expect("fuzz dataset")
    })
}

fuzz_target!(|data: &[u8]| {
    let dataset = dataset();
    let device = dataset.resolve_device(data);
    assert!((device as usize) < dataset.device_count());
    let required = dataset.properties().resolve_all();
    let _ = uatrie::encode_csv_to_vec(dataset, dataset.row_offset_of(device), &required);
});
