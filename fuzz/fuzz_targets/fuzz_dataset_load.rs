#![no_main]
use libfuzzer_sys::fuzz_target;
use uatrie::{Dataset, LoadOptions};

fuzz_target!(|data: &[u8]| {
    // Verified or not, loading garbage must fail cleanly
    let _ = Dataset::from_bytes(data.to_vec());

    let options = LoadOptions::new().verify(false);
    if let Ok(dataset) = Dataset::from_bytes_with(data.to_vec(), &options) {
        let _ = uatrie::validate_dataset(&dataset);
        let required = dataset.properties().resolve_all();
        let mut buf = [0u8; 512];
        let row = dataset.device_row_offset("Mozilla/5.0");
        let _ = uatrie::encode_csv(&dataset, row, &required, &mut buf);
    }
});
