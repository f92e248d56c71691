use anyhow::{Context, Result};
use serde_json::json;
use std::path::PathBuf;
use uatrie::Dataset;

pub fn cmd_properties(data: PathBuf, json_output: bool) -> Result<()> {
    let dataset = Dataset::open(&data)
        .with_context(|| format!("Failed to load data file: {}", data.display()))?;
    let names = dataset.property_names();

    if json_output {
        let entries: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(index, name)| json!({ "index": index, "name": name }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        let width = names.len().saturating_sub(1).to_string().len();
        for (index, name) in names.iter().enumerate() {
            println!("{:>width$}  {}", index, name, width = width);
        }
    }

    Ok(())
}
