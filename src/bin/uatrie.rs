mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{cmd_inspect, cmd_match, cmd_properties, cmd_query, cmd_validate};

#[derive(Parser)]
#[command(name = "uatrie")]
#[command(
    about = "User-agent device detection over a precompiled byte trie",
    long_about = "uatrie - Match user-agent strings to device profiles\n\n\
    Loads a trie data file (memory-mapped), walks it one byte of the user agent\n\
    at a time and prints the selected properties of the matched device as\n\
    name|value lines.\n\n\
    Examples:\n\
      uatrie query devices.trie 'Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)'\n\
      uatrie query devices.trie \"$UA\" --properties 'BrowserName|IsMobile'\n\
      uatrie match devices.trie access-uas.txt.gz --format csv -j 8\n\
      uatrie inspect devices.trie --json\n\
      uatrie validate devices.trie --verbose"
)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short = 'v', long = "verbosity", global = true, action = clap::ArgAction::Count)]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a single user agent and print its properties
    Query {
        /// Path to the trie data file
        #[arg(value_name = "DATA")]
        data: PathBuf,

        /// User-agent string to match
        #[arg(value_name = "USER_AGENT")]
        user_agent: String,

        /// Properties to print, separated by '|' or ',' (default: all)
        #[arg(short, long)]
        properties: Option<String>,

        /// Allow the filter to select the first property
        #[arg(long)]
        keep_first_property: bool,

        /// Output as a JSON object
        #[arg(short, long)]
        json: bool,
    },

    /// Match user agents read from files or stdin (one per line)
    Match {
        /// Path to the trie data file
        #[arg(value_name = "DATA")]
        data: PathBuf,

        /// Input files (.gz is decompressed), or "-" for stdin
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Properties to output, separated by '|' or ',' (default: all)
        #[arg(short, long)]
        properties: Option<String>,

        /// Allow the filter to select the first property
        #[arg(long)]
        keep_first_property: bool,

        /// Output format: csv (default) or json (one object per line)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Number of worker threads (default: 1, "auto" or "0" for all cores)
        #[arg(short = 'j', long)]
        threads: Option<String>,

        /// LRU cache capacity per worker (default: 10000, use 0 to disable)
        #[arg(long, default_value = "10000")]
        cache_size: usize,

        /// Print throughput statistics to stderr
        #[arg(short, long)]
        stats: bool,
    },

    /// Show data file header, sizes and checksum
    Inspect {
        /// Path to the trie data file
        #[arg(value_name = "DATA")]
        data: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Check a data file for structural errors (exit code 1 when invalid)
    Validate {
        /// Path to the trie data file
        #[arg(value_name = "DATA")]
        data: PathBuf,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,

        /// Show warnings and informational findings
        #[arg(long)]
        verbose: bool,
    },

    /// List property names with their indexes
    Properties {
        /// Path to the trie data file
        #[arg(value_name = "DATA")]
        data: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli_utils::init_logging(cli.verbosity);

    match cli.command {
        Commands::Query {
            data,
            user_agent,
            properties,
            keep_first_property,
            json,
        } => cmd_query(data, user_agent, properties, keep_first_property, json),
        Commands::Match {
            data,
            inputs,
            properties,
            keep_first_property,
            format,
            threads,
            cache_size,
            stats,
        } => cmd_match(
            data,
            inputs,
            properties,
            keep_first_property,
            format,
            threads,
            cache_size,
            stats,
        ),
        Commands::Inspect { data, json } => cmd_inspect(data, json),
        Commands::Validate {
            data,
            json,
            verbose,
        } => cmd_validate(data, json, verbose),
        Commands::Properties { data, json } => cmd_properties(data, json),
    }
}
