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

use std::fmt::Debug;

use lru::LruCache;
use offcache_common::code::Key;
use serde::{Deserialize, Serialize};

/// Lru eviction algorithm config.
///
/// Both inserts and hits move a key to the most recently used end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LruConfig {}

/// Fifo eviction algorithm config.
///
/// Keys leave in insertion order. Hits and overwrites do not change the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoConfig {}

/// Eviction algorithm config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionConfig {
    /// Least recently used.
    Lru(LruConfig),
    /// First in, first out.
    Fifo(FifoConfig),
}

impl Default for EvictionConfig {
    fn default() -> Self {
        LruConfig::default().into()
    }
}

impl From<LruConfig> for EvictionConfig {
    fn from(value: LruConfig) -> EvictionConfig {
        EvictionConfig::Lru(value)
    }
}

impl From<FifoConfig> for EvictionConfig {
    fn from(value: FifoConfig) -> EvictionConfig {
        EvictionConfig::Fifo(value)
    }
}

impl EvictionConfig {
    pub(crate) fn build<K: Key>(&self) -> Box<dyn Eviction<K>> {
        match self {
            EvictionConfig::Lru(_) => Box::new(Lru::default()),
            EvictionConfig::Fifo(_) => Box::new(Fifo::default()),
        }
    }
}

/// Victim ordering of the keys of one stripe.
///
/// The cache owns the entries, the policy only orders their keys. Every insert and access carries a tick from a
/// counter shared by all stripes, so the heads of different stripes can be compared.
pub(crate) trait Eviction<K>: Send + Sync + Debug + 'static {
    /// A key is inserted or overwritten.
    fn insert(&mut self, key: &K, tick: u64);

    /// A key is read.
    fn access(&mut self, key: &K, tick: u64);

    /// A key is removed from the cache.
    fn remove(&mut self, key: &K);

    /// Tick of the next victim.
    fn peek(&self) -> Option<u64>;

    /// Take the next victim.
    fn pop(&mut self) -> Option<K>;

    /// Forget all keys.
    fn clear(&mut self);
}

pub(crate) struct Lru<K: Key> {
    order: LruCache<K, u64>,
}

impl<K: Key> Default for Lru<K> {
    fn default() -> Self {
        Self {
            order: LruCache::unbounded(),
        }
    }
}

impl<K: Key> Debug for Lru<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lru").field("len", &self.order.len()).finish()
    }
}

impl<K: Key> Eviction<K> for Lru<K> {
    fn insert(&mut self, key: &K, tick: u64) {
        self.order.put(key.clone(), tick);
    }

    fn access(&mut self, key: &K, tick: u64) {
        if let Some(last) = self.order.get_mut(key) {
            *last = tick;
        }
    }

    fn remove(&mut self, key: &K) {
        self.order.pop(key);
    }

    fn peek(&self) -> Option<u64> {
        self.order.peek_lru().map(|(_, tick)| *tick)
    }

    fn pop(&mut self) -> Option<K> {
        self.order.pop_lru().map(|(key, _)| key)
    }

    fn clear(&mut self) {
        self.order.clear();
    }
}

pub(crate) struct Fifo<K: Key> {
    order: LruCache<K, u64>,
}

impl<K: Key> Default for Fifo<K> {
    fn default() -> Self {
        Self {
            order: LruCache::unbounded(),
        }
    }
}

impl<K: Key> Debug for Fifo<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fifo").field("len", &self.order.len()).finish()
    }
}

impl<K: Key> Eviction<K> for Fifo<K> {
    fn insert(&mut self, key: &K, tick: u64) {
        if !self.order.contains(key) {
            self.order.put(key.clone(), tick);
        }
    }

    fn access(&mut self, _: &K, _: u64) {}

    fn remove(&mut self, key: &K) {
        self.order.pop(key);
    }

    fn peek(&self) -> Option<u64> {
        self.order.peek_lru().map(|(_, tick)| *tick)
    }

    fn pop(&mut self) -> Option<K> {
        self.order.pop_lru().map(|(key, _)| key)
    }

    fn clear(&mut self) {
        self.order.clear();
    }
}
