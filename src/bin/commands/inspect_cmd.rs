use anyhow::{Context, Result};
use std::path::PathBuf;
use uatrie::Dataset;

use crate::cli_utils::{format_bytes, format_number};

pub fn cmd_inspect(data: PathBuf, json_output: bool) -> Result<()> {
    let dataset = Dataset::open(&data)
        .with_context(|| format!("Failed to load data file: {}", data.display()))?;
    let info = dataset.info();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Data file: {}", data.display());
    println!("Version:   {}", info.version);
    if info.copyright.is_empty() {
        println!("Copyright: (none)");
    } else {
        println!("Copyright: {}", info.copyright);
    }
    println!();
    println!("Contents:");
    println!("  Properties:    {}", format_number(info.property_count));
    println!("  Devices:       {}", format_number(info.device_count));
    println!();
    println!("Sizes:");
    println!("  Strings pool:  {}", format_bytes(info.strings_bytes));
    println!("  Lookup list:   {}", format_bytes(info.lookup_list_bytes));
    println!("  Node tree:     {}", format_bytes(info.node_tree_bytes));
    println!("  File:          {}", format_bytes(info.file_bytes));
    println!();
    println!("Storage:   {}", info.storage);
    println!("XXH64:     {}", info.checksum);

    Ok(())
}
