use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use std::time::Duration;
use uatrie::{encode_csv, Dataset, DatasetWriter, LoadOptions};

const TOKENS: [&str; 12] = [
    "Mozilla/5.0 (",
    "Windows NT 10.0; ",
    "Macintosh; Intel Mac OS X 10_15_7",
    "iPhone; CPU iPhone OS 17_0",
    "Linux; Android 14; ",
    "AppleWebKit/537.36 ",
    "(KHTML, like Gecko) ",
    "Chrome/120.0.0.0 ",
    "Safari/537.36",
    "Mobile ",
    "Opera/9.80 ",
    "Firefox/121.0",
];

fn random_user_agent(rng: &mut StdRng) -> String {
    let parts = rng.random_range(2..8);
    (0..parts)
        .map(|_| TOKENS[rng.random_range(0..TOKENS.len())])
        .collect()
}

/// A trie with `devices` random user-agent paths
fn build_dataset(devices: usize, seed: u64) -> (Vec<u8>, Vec<String>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut w = DatasetWriter::new("(c) bench");
    for name in ["Id", "HardwareVendor", "PlatformName", "BrowserName", "IsMobile"] {
        w.add_property(name).unwrap();
    }
    let unknown = w.add_device(&["0", "Unknown", "Unknown", "Unknown", "False"]).unwrap();
    let root = w.root();
    w.set_fallback(root, unknown);

    let mut user_agents = Vec::with_capacity(devices);
    for i in 1..=devices {
        let ua = random_user_agent(&mut rng);
        let id = i.to_string();
        let device = w.add_device(&[id.as_str(), "Vendor", "Platform", "Browser", "True"]).unwrap();
        w.insert_path(root, ua.as_bytes(), device);
        user_agents.push(ua);
    }
    (w.build().unwrap(), user_agents)
}

fn bench_resolve_device(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_device");
    group.measurement_time(Duration::from_secs(5));

    for devices in [100, 1_000, 10_000] {
        let (bytes, known) = build_dataset(devices, 42);
        let dataset = Dataset::from_bytes(bytes).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let queries: Vec<String> = (0..1_000)
            .map(|i| {
                if i % 2 == 0 {
                    format!("{} extra", known[rng.random_range(0..known.len())])
                } else {
                    random_user_agent(&mut rng)
                }
            })
            .collect();

        group.throughput(Throughput::Elements(queries.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(devices), &queries, |b, queries| {
            b.iter(|| {
                for ua in queries {
                    black_box(dataset.resolve_device(black_box(ua.as_bytes())));
                }
            })
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let (bytes, known) = build_dataset(1_000, 42);
    let dataset = Dataset::from_bytes(bytes).unwrap();
    let required = dataset.properties().resolve_all();
    let row = dataset.device_row_offset(&known[0]);
    let mut buf = [0u8; 1024];

    c.bench_function("encode_csv", |b| {
        b.iter(|| encode_csv(&dataset, black_box(row), &required, &mut buf).unwrap())
    });
}

fn bench_load(c: &mut Criterion) {
    let (bytes, _) = build_dataset(10_000, 42);
    let mut group = c.benchmark_group("load");
    group.bench_function("verified", |b| {
        b.iter(|| Dataset::from_bytes(black_box(bytes.clone())).unwrap())
    });
    group.bench_function("unverified", |b| {
        let options = LoadOptions::new().verify(false);
        b.iter(|| Dataset::from_bytes_with(black_box(bytes.clone()), &options).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_resolve_device, bench_render, bench_load);
criterion_main!(benches);
