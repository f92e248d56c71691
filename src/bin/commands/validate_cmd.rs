use anyhow::{Context, Result};
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;
use uatrie::validate_file;

pub fn cmd_validate(data: PathBuf, json_output: bool, verbose: bool) -> Result<()> {
    let start = Instant::now();
    let report = validate_file(&data)
        .with_context(|| format!("Validation failed: {}", data.display()))?;
    let duration = start.elapsed();

    if json_output {
        let output = json!({
            "data_file": data.display().to_string(),
            "is_valid": report.is_valid(),
            "duration_ms": duration.as_millis(),
            "errors": report.errors,
            "warnings": report.warnings,
            "info": report.info,
            "stats": report.stats,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Validating: {}", data.display());
        println!();

        let stats = &report.stats;
        println!("Statistics:");
        println!(
            "  {} reachable nodes ({} leaves), max depth {}, {} lookup records",
            stats.reachable_nodes, stats.leaf_nodes, stats.max_depth, stats.lookup_records
        );
        println!("  Validation time: {:.2}ms", duration.as_secs_f64() * 1000.0);
        println!();

        if !report.errors.is_empty() {
            println!("❌ ERRORS ({}):", report.errors.len());
            for error in &report.errors {
                println!("  • {}", error);
            }
            println!();
        }

        if !report.warnings.is_empty() && verbose {
            println!("⚠️  WARNINGS ({}):", report.warnings.len());
            for warning in &report.warnings {
                println!("  • {}", warning);
            }
            println!();
        } else if !report.warnings.is_empty() {
            println!(
                "⚠️  {} warning(s) (use --verbose to show)",
                report.warnings.len()
            );
            println!();
        }

        if verbose && !report.info.is_empty() {
            println!("ℹ️  INFORMATION ({}):", report.info.len());
            for info in &report.info {
                println!("  • {}", info);
            }
            println!();
        }

        if report.is_valid() {
            println!("✅ VALIDATION PASSED");
        } else {
            println!("❌ VALIDATION FAILED");
            println!("   Data file has {} structural error(s).", report.errors.len());
        }
    }

    if report.is_valid() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
