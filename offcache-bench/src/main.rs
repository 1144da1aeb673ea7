// Copyright 2026 foyer Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Load generator for the offcache off-heap cache.

mod analyze;
mod text;

use std::{
    ops::Range,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use analyze::{analyze, monitor, Metrics};
use clap::Parser;
use itertools::Itertools;
use offcache::{BytesSerializer, CacheLoader, EvictionConfig, FifoConfig, LruConfig, OffHeapCache, OffHeapCacheBuilder};
use rand::{rngs::StdRng, Rng, SeedableRng};
use text::text;
use tokio::sync::broadcast;

const MIB: usize = 1024 * 1024;

/// Load generator for the offcache off-heap cache.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Byte store buffer count.
    #[arg(long, default_value_t = 4)]
    buffers: usize,

    /// Byte store buffer capacity. (MiB)
    #[arg(long, default_value_t = 64)]
    buffer_capacity: usize,

    /// Entry count bound.
    #[arg(long, default_value_t = 100_000)]
    capacity: usize,

    /// Lock stripes of the key directory.
    #[arg(long, default_value_t = 64)]
    concurrency_level: usize,

    /// available values: "lru", "fifo"
    #[arg(long, default_value = "lru")]
    eviction: String,

    /// Compact buffers whose free space ratio exceeds the threshold.
    #[arg(long, default_value_t = 0.5)]
    cleaner_threshold: f64,

    #[arg(long, default_value = "1s")]
    cleaner_period: humantime::Duration,

    #[arg(long, default_value = "1s")]
    eviction_period: humantime::Duration,

    /// Time-to-live of written entries. `0s` means no expiry.
    #[arg(long, default_value = "0s")]
    ttl: humantime::Duration,

    #[arg(short, long, default_value = "60s")]
    time: humantime::Duration,

    #[arg(long, default_value = "2s")]
    report_interval: humantime::Duration,

    #[arg(long, default_value = "2s")]
    warm_up: humantime::Duration,

    /// Writer count.
    #[arg(long, default_value_t = 4)]
    writers: usize,

    /// Reader count.
    #[arg(long, default_value_t = 4)]
    readers: usize,

    /// Min entry size (B).
    #[arg(long, default_value_t = 64)]
    entry_size_min: usize,

    /// Max entry size (B).
    #[arg(long, default_value_t = 4096)]
    entry_size_max: usize,

    /// Reader lookup key range.
    #[arg(long, default_value_t = 10000)]
    get_range: u64,

    /// Share of reader operations that invalidate instead of get.
    #[arg(long, default_value_t = 0.0)]
    invalidate_ratio: f64,

    /// Regenerate missed entries with a loader.
    #[arg(long, default_value_t = false)]
    loader: bool,

    /// Print the final report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

struct Context {
    counts: Vec<AtomicU64>,
    entry_size_range: Range<usize>,
    get_range: u64,
    ttl: Option<Duration>,
    invalidate_ratio: f64,
    time: Duration,
    warm_up: Duration,
    metrics: Arc<Metrics>,
}

/// Regenerates the payload of a missed key.
struct Regenerate {
    size: usize,
}

impl CacheLoader for Regenerate {
    type Key = u64;
    type Value = Vec<u8>;

    fn load(&self, key: &u64) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(Some(text(*key, self.size)))
    }
}

fn init_logger() {
    use tracing_subscriber::{prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_line_number(true))
        .with(EnvFilter::from_default_env())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();
    println!("{:#?}", args);
    anyhow::ensure!(args.get_range > 0, "\"--get-range\" value must be greater than 0");
    anyhow::ensure!(args.writers > 0, "\"--writers\" value must be greater than 0");
    anyhow::ensure!(
        args.entry_size_min <= args.entry_size_max,
        "\"--entry-size-min\" must not exceed \"--entry-size-max\""
    );
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.invalidate_ratio),
        "\"--invalidate-ratio\" must be within [0, 1]"
    );

    let eviction: EvictionConfig = match args.eviction.as_str() {
        "lru" => LruConfig::default().into(),
        "fifo" => FifoConfig::default().into(),
        other => anyhow::bail!("unsupported eviction algorithm: {other}"),
    };

    let mut builder = OffHeapCacheBuilder::<u64, Vec<u8>>::new(BytesSerializer)
        .with_name("offcache-bench")
        .with_buffer_count(args.buffers)
        .with_buffer_capacity(args.buffer_capacity * MIB)
        .with_capacity(args.capacity)
        .with_concurrency_level(args.concurrency_level)
        .with_cleaner_threshold(args.cleaner_threshold)
        .with_cleaner_period(*args.cleaner_period)
        .with_eviction_period(*args.eviction_period)
        .with_eviction_config(eviction);
    if args.loader {
        builder = builder.with_loader(Arc::new(Regenerate {
            size: args.entry_size_min,
        }));
    }
    let cache = builder.build()?;

    let metrics = Arc::new(Metrics::new()?);
    let context = Arc::new(Context {
        counts: (0..args.writers).map(|_| AtomicU64::default()).collect_vec(),
        entry_size_range: args.entry_size_min..args.entry_size_max + 1,
        get_range: args.get_range,
        ttl: Some(*args.ttl).filter(|ttl| !ttl.is_zero()),
        invalidate_ratio: args.invalidate_ratio,
        time: *args.time,
        warm_up: *args.warm_up,
        metrics: metrics.clone(),
    });

    let (stop_tx, _) = broadcast::channel(4);

    let handle_monitor = tokio::spawn(monitor(metrics.clone(), *args.report_interval, stop_tx.subscribe()));
    let handle_signal = tokio::spawn({
        let stop_tx = stop_tx.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(?e, "[bench]: listen for CTRL-C failed");
                return;
            }
            tracing::warn!("offcache-bench is cancelled with CTRL-C");
            let _ = stop_tx.send(());
        }
    });

    let start = Instant::now();

    let writers = (0..args.writers).map(|id| {
        let (cache, context, stop) = (cache.clone(), context.clone(), stop_tx.subscribe());
        tokio::task::spawn_blocking(move || write(id as u64, cache, context, stop))
    });
    let readers = (0..args.readers).map(|id| {
        let (cache, context, stop) = (cache.clone(), context.clone(), stop_tx.subscribe());
        tokio::task::spawn_blocking(move || read(id as u64, cache, context, stop))
    });
    for handle in writers.chain(readers).collect_vec() {
        handle.await?;
    }

    let analysis = analyze(
        start.elapsed().saturating_sub(*args.warm_up),
        &metrics,
        cache.stats(),
        &cache.store_usage(),
    );

    let _ = stop_tx.send(());
    handle_monitor.await?;
    handle_signal.abort();
    cache.close();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("\nTotal:\n{}", analysis);
    }
    Ok(())
}

fn stopped(stop: &mut broadcast::Receiver<()>) -> bool {
    !matches!(stop.try_recv(), Err(broadcast::error::TryRecvError::Empty))
}

fn write(id: u64, cache: OffHeapCache<u64, Vec<u8>>, context: Arc<Context>, mut stop: broadcast::Receiver<()>) {
    let start = Instant::now();
    let step = context.counts.len() as u64;
    let mut rng = StdRng::seed_from_u64(id);

    let mut c = 0;
    while !stopped(&mut stop) && start.elapsed() < context.time + context.warm_up {
        let idx = id + step * c;
        let entry_size = rng.random_range(context.entry_size_range.clone());
        let data = text(idx, entry_size);

        let time = Instant::now();
        let res = match context.ttl {
            Some(ttl) => cache.put_with_ttl(idx, data, ttl),
            None => cache.put(idx, data),
        };
        let lat = time.elapsed().as_micros() as u64;
        context.counts[id as usize].fetch_add(1, Ordering::Relaxed);
        c += 1;

        if let Err(e) = res {
            tracing::debug!(?e, idx, "[bench]: insert failed");
            context.metrics.errors.fetch_add(1, Ordering::Relaxed);
            continue;
        }
        if start.elapsed() > context.warm_up {
            Metrics::record(&context.metrics.insert_lats, lat);
            context.metrics.insert_ios.fetch_add(1, Ordering::Relaxed);
            context.metrics.insert_bytes.fetch_add(entry_size, Ordering::Relaxed);
        }
    }
}

fn read(id: u64, cache: OffHeapCache<u64, Vec<u8>>, context: Arc<Context>, mut stop: broadcast::Receiver<()>) {
    let start = Instant::now();
    let step = context.counts.len() as u64;
    let window = (context.get_range / step).max(1);
    let mut rng = StdRng::seed_from_u64(u64::MAX - id);

    while !stopped(&mut stop) && start.elapsed() < context.time + context.warm_up {
        // pick a writer to read from
        let w = rng.random_range(0..step);
        let c_w = context.counts[w as usize].load(Ordering::Relaxed);
        if c_w == 0 {
            std::thread::sleep(Duration::from_millis(1));
            continue;
        }
        let c = rng.random_range(c_w.saturating_sub(window)..c_w);
        let idx = w + c * step;
        let record = start.elapsed() > context.warm_up;

        if context.invalidate_ratio > 0.0 && rng.random_bool(context.invalidate_ratio) {
            if let Err(e) = cache.invalidate(&idx) {
                tracing::debug!(?e, idx, "[bench]: invalidate failed");
                context.metrics.errors.fetch_add(1, Ordering::Relaxed);
            } else if record {
                context.metrics.invalidate_ios.fetch_add(1, Ordering::Relaxed);
            }
            continue;
        }

        let time = Instant::now();
        let res = cache.get(&idx);
        let lat = time.elapsed().as_micros() as u64;

        match res {
            Ok(Some(value)) => {
                assert_eq!(value, text(idx, value.len()), "corrupted value of key {idx}");
                if record {
                    Metrics::record(&context.metrics.get_hit_lats, lat);
                    context.metrics.get_bytes.fetch_add(value.len(), Ordering::Relaxed);
                }
            }
            Ok(None) => {
                if record {
                    Metrics::record(&context.metrics.get_miss_lats, lat);
                    context.metrics.get_miss_ios.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                tracing::debug!(?e, idx, "[bench]: get failed");
                context.metrics.errors.fetch_add(1, Ordering::Relaxed);
                continue;
            }
        }
        if record {
            context.metrics.get_ios.fetch_add(1, Ordering::Relaxed);
        }
    }
}
