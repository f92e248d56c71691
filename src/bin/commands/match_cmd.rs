use anyhow::{Context, Result};
use lru::LruCache;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde_json::json;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use uatrie::{Dataset, LoadOptions, RequiredProperties, Snapshot};

use crate::cli_utils::{format_number, format_qps, open_input, parse_threads, LineScanner};

/// User agents matched per batch
const BATCH_LINES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    fn parse(format: &str) -> Result<Self> {
        match format.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid output format: '{}'. Must be: csv or json", format),
        }
    }
}

/// Per-worker resolver with an optional UA -> device cache
struct Matcher<'d> {
    dataset: &'d Dataset,
    cache: Option<LruCache<Vec<u8>, u16>>,
    hits: usize,
}

impl<'d> Matcher<'d> {
    fn new(dataset: &'d Dataset, cache_size: usize) -> Self {
        Self {
            dataset,
            cache: NonZeroUsize::new(cache_size).map(LruCache::new),
            hits: 0,
        }
    }

    fn resolve(&mut self, user_agent: &[u8]) -> u16 {
        let Some(cache) = self.cache.as_mut() else {
            return self.dataset.resolve_device(user_agent);
        };
        if let Some(&device) = cache.get(user_agent) {
            self.hits += 1;
            return device;
        }
        let device = self.dataset.resolve_device(user_agent);
        cache.put(user_agent.to_vec(), device);
        device
    }
}

/// Resolves batches either inline or on a rayon pool, one matcher per worker
struct MatchEngine<'d> {
    workers: Vec<Mutex<Matcher<'d>>>,
    pool: Option<rayon::ThreadPool>,
}

impl<'d> MatchEngine<'d> {
    fn new(dataset: &'d Dataset, threads: usize, cache_size: usize) -> Result<Self> {
        let threads = threads.max(1);
        let pool = if threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .context("Failed to start worker threads")?,
            )
        } else {
            None
        };
        let workers = (0..threads)
            .map(|_| Mutex::new(Matcher::new(dataset, cache_size)))
            .collect();
        Ok(Self { workers, pool })
    }

    fn resolve_batch(&self, batch: &[Vec<u8>]) -> Vec<u16> {
        match &self.pool {
            None => {
                let mut matcher = self.workers[0]
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                batch.iter().map(|ua| matcher.resolve(ua)).collect()
            }
            Some(pool) => pool.install(|| {
                batch
                    .par_iter()
                    .map(|ua| {
                        let worker = rayon::current_thread_index().unwrap_or(0) % self.workers.len();
                        self.workers[worker]
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .resolve(ua)
                    })
                    .collect()
            }),
        }
    }

    fn cache_hits(&self) -> usize {
        self.workers
            .iter()
            .map(|w| w.lock().unwrap_or_else(PoisonError::into_inner).hits)
            .sum()
    }
}

/// Writes one record per matched user agent
enum RecordSink<W: Write> {
    Csv(csv::Writer<W>),
    Json(io::BufWriter<W>),
}

impl<W: Write> RecordSink<W> {
    fn new(out: W, format: OutputFormat, names: &[String]) -> Result<Self> {
        match format {
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(out);
                let mut header = vec!["user_agent", "device"];
                header.extend(names.iter().map(String::as_str));
                writer.write_record(&header)?;
                Ok(Self::Csv(writer))
            }
            OutputFormat::Json => Ok(Self::Json(io::BufWriter::new(out))),
        }
    }

    fn write(
        &mut self,
        dataset: &Dataset,
        required: &RequiredProperties,
        names: &[String],
        user_agent: &[u8],
        device: u16,
    ) -> Result<()> {
        let row = dataset.row_offset_of(device);
        match self {
            Self::Csv(writer) => {
                let device_text = device.to_string();
                let mut record = csv::ByteRecord::new();
                record.push_field(user_agent);
                record.push_field(device_text.as_bytes());
                for index in required.indexes() {
                    record.push_field(dataset.value(row, index).unwrap_or_default());
                }
                writer.write_byte_record(&record)?;
            }
            Self::Json(out) => {
                let mut properties = serde_json::Map::new();
                for (name, index) in names.iter().zip(required.indexes()) {
                    let value = dataset.value(row, index).unwrap_or_default();
                    properties.insert(name.clone(), json!(String::from_utf8_lossy(value)));
                }
                let record = json!({
                    "user_agent": String::from_utf8_lossy(user_agent),
                    "device": device,
                    "properties": properties,
                });
                serde_json::to_writer(&mut *out, &record)?;
                out.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        match self {
            Self::Csv(mut writer) => writer.flush()?,
            Self::Json(mut out) => out.flush()?,
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MatchStats {
    lines: usize,
    files_processed: usize,
    files_failed: usize,
    devices: FxHashSet<u16>,
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_match(
    data: PathBuf,
    inputs: Vec<PathBuf>,
    properties: Option<String>,
    keep_first_property: bool,
    format: String,
    threads_arg: Option<String>,
    cache_size: usize,
    show_stats: bool,
) -> Result<()> {
    let format = OutputFormat::parse(&format)?;
    let threads = parse_threads(threads_arg.as_deref())?;

    let load_start = Instant::now();
    let options = LoadOptions::new()
        .property_filter_opt(properties.as_deref())
        .keep_first_property(keep_first_property);
    let snapshot = Snapshot::load(&data, &options)
        .with_context(|| format!("Failed to load data file: {}", data.display()))?;
    let load_time = load_start.elapsed();

    let dataset = snapshot.dataset();
    let required = snapshot.required();
    let table = dataset.properties();
    let names: Vec<String> = required
        .indexes()
        .map(|i| String::from_utf8_lossy(table.name_bytes(i).unwrap_or_default()).into_owned())
        .collect();

    if show_stats {
        eprintln!("[INFO] Loaded data file: {}", data.display());
        eprintln!("[INFO] Load time: {:.2}ms", load_time.as_secs_f64() * 1000.0);
        if threads == 1 {
            eprintln!("[INFO] Mode: Sequential (single-threaded)");
        } else {
            eprintln!("[INFO] Mode: Parallel ({} worker threads)", threads);
        }
        eprintln!(
            "[INFO] Cache: {}",
            if cache_size == 0 {
                "disabled".to_string()
            } else {
                format!("{} entries per worker", cache_size)
            }
        );
    }

    let engine = MatchEngine::new(dataset, threads, cache_size)?;
    let stdout = io::stdout();
    let mut sink = RecordSink::new(stdout.lock(), format, &names)?;
    let mut stats = MatchStats::default();
    let mut stdin_seen = false;
    let start = Instant::now();

    for input in &inputs {
        if input.to_str() == Some("-") {
            if stdin_seen {
                if show_stats {
                    eprintln!("[WARN] Skipping duplicate stdin argument");
                }
                continue;
            }
            stdin_seen = true;
        }

        let reader = match open_input(input) {
            Ok(reader) => reader,
            Err(e) => {
                eprintln!("[ERROR] Failed to open {}: {}", input.display(), e);
                stats.files_failed += 1;
                continue;
            }
        };

        let mut scanner = LineScanner::new(reader);
        let mut batch: Vec<Vec<u8>> = Vec::with_capacity(BATCH_LINES);
        let mut line = Vec::new();
        loop {
            let more = scanner
                .read_line(&mut line)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            if more {
                batch.push(std::mem::take(&mut line));
            }
            if batch.len() == BATCH_LINES || (!more && !batch.is_empty()) {
                let devices = engine.resolve_batch(&batch);
                for (ua, &device) in batch.iter().zip(&devices) {
                    sink.write(dataset, required, &names, ua, device)?;
                    stats.devices.insert(device);
                }
                stats.lines += batch.len();
                batch.clear();
            }
            if !more {
                break;
            }
        }
        stats.files_processed += 1;
    }

    sink.finish()?;
    let elapsed = start.elapsed();

    if show_stats {
        let secs = elapsed.as_secs_f64();
        eprintln!();
        eprintln!("[INFO] === Processing Complete ===");
        eprintln!("[INFO] Files processed: {}", stats.files_processed);
        if stats.files_failed > 0 {
            eprintln!("[INFO] Files failed: {}", stats.files_failed);
        }
        eprintln!("[INFO] User agents: {}", format_number(stats.lines));
        eprintln!("[INFO] Distinct devices: {}", format_number(stats.devices.len()));
        if cache_size > 0 && stats.lines > 0 {
            let hits = engine.cache_hits();
            eprintln!(
                "[INFO] Cache hits: {} ({:.1}%)",
                format_number(hits),
                hits as f64 / stats.lines as f64 * 100.0
            );
        }
        eprintln!("[INFO] Time: {:.2}s", secs);
        if secs > 0.0 {
            eprintln!(
                "[INFO] Throughput: {} UA/s",
                format_qps(stats.lines as f64 / secs)
            );
        }
    }

    if stats.files_failed > 0 && stats.files_processed == 0 {
        anyhow::bail!("No input could be read");
    }
    Ok(())
}
