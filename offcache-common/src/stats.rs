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

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Per-cache operation counters.
///
/// Counters only grow and never block writers.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// get hits
    hit: AtomicU64,
    /// get misses
    miss: AtomicU64,
    /// values stored by the loader after a miss
    load: AtomicU64,
    /// entries removed by invalidation, expiry or capacity eviction
    eviction: AtomicU64,
}

impl CacheStats {
    /// Record a get hit.
    pub fn record_hit(&self) {
        self.hit.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a get miss.
    pub fn record_miss(&self) {
        self.miss.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a loaded value.
    pub fn record_load(&self) {
        self.load.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a removed entry.
    pub fn record_eviction(&self) {
        self.eviction.fetch_add(1, Ordering::Relaxed);
    }

    /// Get hit count.
    pub fn hit(&self) -> u64 {
        self.hit.load(Ordering::Relaxed)
    }

    /// Get miss count.
    pub fn miss(&self) -> u64 {
        self.miss.load(Ordering::Relaxed)
    }

    /// Get load count.
    pub fn load(&self) -> u64 {
        self.load.load(Ordering::Relaxed)
    }

    /// Get eviction count.
    pub fn eviction(&self) -> u64 {
        self.eviction.load(Ordering::Relaxed)
    }

    /// Take a point-in-time copy of all counters.
    ///
    /// The counters are read one by one, so a snapshot taken under concurrent traffic is not atomic as a whole.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hit: self.hit(),
            miss: self.miss(),
            load: self.load(),
            eviction: self.eviction(),
        }
    }
}

/// A copy of [`CacheStats`] counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// get hits
    pub hit: u64,
    /// get misses
    pub miss: u64,
    /// loaded values
    pub load: u64,
    /// removed entries
    pub eviction: u64,
}

impl StatsSnapshot {
    /// Ratio of hits over all gets, `0.0` if nothing was requested yet.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hit + self.miss;
        if total == 0 {
            return 0.0;
        }
        self.hit as f64 / total as f64
    }
}
