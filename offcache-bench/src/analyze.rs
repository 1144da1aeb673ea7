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

use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use hdrhistogram::Histogram;
use offcache::{BufferUsage, StatsSnapshot};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;

/// Highest recordable latency in microseconds.
const MAX_LATENCY_US: u64 = 60_000_000;

#[derive(Debug)]
pub struct Metrics {
    pub insert_ios: AtomicUsize,
    pub insert_bytes: AtomicUsize,
    pub insert_lats: RwLock<Histogram<u64>>,

    pub get_ios: AtomicUsize,
    pub get_miss_ios: AtomicUsize,
    pub get_bytes: AtomicUsize,
    pub get_hit_lats: RwLock<Histogram<u64>>,
    pub get_miss_lats: RwLock<Histogram<u64>>,

    pub invalidate_ios: AtomicUsize,
    pub errors: AtomicUsize,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let lats = || Histogram::new_with_bounds(1, MAX_LATENCY_US, 3).map(RwLock::new);
        Ok(Self {
            insert_ios: AtomicUsize::default(),
            insert_bytes: AtomicUsize::default(),
            insert_lats: lats()?,
            get_ios: AtomicUsize::default(),
            get_miss_ios: AtomicUsize::default(),
            get_bytes: AtomicUsize::default(),
            get_hit_lats: lats()?,
            get_miss_lats: lats()?,
            invalidate_ios: AtomicUsize::default(),
            errors: AtomicUsize::default(),
        })
    }

    pub fn record(histogram: &RwLock<Histogram<u64>>, lat: u64) {
        if let Err(e) = histogram.write().record(lat.clamp(1, MAX_LATENCY_US)) {
            tracing::error!(?e, lat, "[bench]: record latency failed");
        }
    }

    fn counters(&self) -> (usize, usize, usize) {
        (
            self.insert_ios.load(Ordering::Relaxed),
            self.get_ios.load(Ordering::Relaxed),
            self.get_miss_ios.load(Ordering::Relaxed),
        )
    }
}

/// Latency percentiles in microseconds.
#[derive(Debug, Default, Serialize)]
pub struct Percentiles {
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub p999: u64,
    pub max: u64,
}

impl Percentiles {
    fn of(histogram: &Histogram<u64>) -> Self {
        if histogram.is_empty() {
            return Self::default();
        }
        Self {
            p50: histogram.value_at_quantile(0.5),
            p90: histogram.value_at_quantile(0.9),
            p99: histogram.value_at_quantile(0.99),
            p999: histogram.value_at_quantile(0.999),
            max: histogram.max(),
        }
    }
}

impl Display for Percentiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "p50 {}us, p90 {}us, p99 {}us, p999 {}us, max {}us",
            self.p50, self.p90, self.p99, self.p999, self.max
        )
    }
}

#[derive(Debug, Serialize)]
pub struct Analysis {
    pub secs: f64,

    pub insert_iops: f64,
    pub insert_throughput_mib: f64,
    pub insert_lat_us: Percentiles,

    pub get_iops: f64,
    pub get_miss_ratio: f64,
    pub get_throughput_mib: f64,
    pub get_hit_lat_us: Percentiles,
    pub get_miss_lat_us: Percentiles,

    pub invalidate_iops: f64,
    pub errors: usize,

    pub stats: StatsSnapshot,
    pub entries: usize,
    pub live_bytes: usize,
    pub free_bytes: usize,
}

pub fn analyze(elapsed: Duration, metrics: &Metrics, stats: StatsSnapshot, usage: &[BufferUsage]) -> Analysis {
    const MIB: f64 = 1024.0 * 1024.0;

    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    let per_sec = |v: usize| v as f64 / secs;

    let get_ios = metrics.get_ios.load(Ordering::Relaxed);
    let get_miss_ios = metrics.get_miss_ios.load(Ordering::Relaxed);

    Analysis {
        secs,
        insert_iops: per_sec(metrics.insert_ios.load(Ordering::Relaxed)),
        insert_throughput_mib: per_sec(metrics.insert_bytes.load(Ordering::Relaxed)) / MIB,
        insert_lat_us: Percentiles::of(&metrics.insert_lats.read()),
        get_iops: per_sec(get_ios),
        get_miss_ratio: if get_ios == 0 {
            0.0
        } else {
            get_miss_ios as f64 / get_ios as f64
        },
        get_throughput_mib: per_sec(metrics.get_bytes.load(Ordering::Relaxed)) / MIB,
        get_hit_lat_us: Percentiles::of(&metrics.get_hit_lats.read()),
        get_miss_lat_us: Percentiles::of(&metrics.get_miss_lats.read()),
        invalidate_iops: per_sec(metrics.invalidate_ios.load(Ordering::Relaxed)),
        errors: metrics.errors.load(Ordering::Relaxed),
        stats,
        entries: usage.iter().map(|u| u.entries).sum(),
        live_bytes: usage.iter().map(|u| u.live).sum(),
        free_bytes: usage.iter().map(|u| u.capacity - u.live).sum(),
    }
}

impl Display for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "elapsed: {:.3}s", self.secs)?;
        writeln!(
            f,
            "insert: {:.0} iops, {:.3} MiB/s, {}",
            self.insert_iops, self.insert_throughput_mib, self.insert_lat_us
        )?;
        writeln!(
            f,
            "get: {:.0} iops, {:.3} MiB/s, miss ratio {:.2}%",
            self.get_iops,
            self.get_throughput_mib,
            self.get_miss_ratio * 100.0
        )?;
        writeln!(f, "get hit: {}", self.get_hit_lat_us)?;
        writeln!(f, "get miss: {}", self.get_miss_lat_us)?;
        writeln!(f, "invalidate: {:.0} iops", self.invalidate_iops)?;
        writeln!(f, "errors: {}", self.errors)?;
        writeln!(
            f,
            "cache: hit {}, miss {}, load {}, eviction {}, hit ratio {:.2}%",
            self.stats.hit,
            self.stats.miss,
            self.stats.load,
            self.stats.eviction,
            self.stats.hit_ratio() * 100.0
        )?;
        write!(
            f,
            "store: {} entries, {} live bytes, {} free bytes",
            self.entries, self.live_bytes, self.free_bytes
        )
    }
}

/// Print throughput every `interval` until stopped.
pub async fn monitor(metrics: Arc<Metrics>, interval: Duration, mut stop: broadcast::Receiver<()>) {
    let start = Instant::now();
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    let mut last = metrics.counters();
    loop {
        tokio::select! {
            _ = stop.recv() => return,
            _ = ticker.tick() => {}
        }
        let now = metrics.counters();
        let secs = interval.as_secs_f64();
        let gets = now.1 - last.1;
        let misses = now.2 - last.2;
        println!(
            "[{:>6.1}s] insert: {:.0} iops, get: {:.0} iops, miss ratio: {:.2}%",
            start.elapsed().as_secs_f64(),
            (now.0 - last.0) as f64 / secs,
            gets as f64 / secs,
            if gets == 0 { 0.0 } else { misses as f64 / gets as f64 * 100.0 }
        );
        last = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze() {
        let metrics = Metrics::new().unwrap();
        metrics.get_ios.store(10, Ordering::Relaxed);
        metrics.get_miss_ios.store(4, Ordering::Relaxed);
        metrics.insert_ios.store(20, Ordering::Relaxed);
        Metrics::record(&metrics.insert_lats, 100);
        Metrics::record(&metrics.insert_lats, 0);

        let usage = [BufferUsage {
            id: 0,
            capacity: 1000,
            watermark: 600,
            live: 400,
            free: 200,
            entries: 4,
        }];
        let analysis = analyze(Duration::from_secs(2), &metrics, StatsSnapshot::default(), &usage);
        assert_eq!(analysis.insert_iops, 10.0);
        assert_eq!(analysis.get_iops, 5.0);
        assert_eq!(analysis.get_miss_ratio, 0.4);
        assert_eq!(analysis.entries, 4);
        assert_eq!(analysis.free_bytes, 600);
        assert_eq!(analysis.insert_lat_us.max, 100);
        assert_eq!(Percentiles::of(&metrics.get_hit_lats.read()).max, 0);
    }
}
