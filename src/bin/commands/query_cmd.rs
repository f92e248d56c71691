use anyhow::{Context, Result};
use serde_json::json;
use std::path::PathBuf;
use uatrie::{Detector, LoadOptions};

pub fn cmd_query(
    data: PathBuf,
    user_agent: String,
    properties: Option<String>,
    keep_first_property: bool,
    json_output: bool,
) -> Result<()> {
    let options = LoadOptions::new()
        .property_filter_opt(properties.as_deref())
        .keep_first_property(keep_first_property);

    let detector = Detector::new();
    detector
        .init_with(&data, &options)
        .with_context(|| format!("Failed to load data file: {}", data.display()))?;

    let device = detector
        .lookup(&user_agent)
        .with_context(|| format!("Lookup failed for: {}", user_agent))?;

    if json_output {
        let mut values = serde_json::Map::new();
        for pair in device.properties() {
            let (name, value) = pair.context("Failed to read device properties")?;
            values.insert(name.into_owned(), json!(value));
        }
        let output = json!({
            "user_agent": user_agent,
            "device": device.device_index(),
            "row_offset": device.row_offset(),
            "properties": values,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let text = device
            .to_csv_string()
            .context("Failed to render device properties")?;
        print!("{}", text);
    }

    detector.teardown();
    Ok(())
}
