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

use std::{sync::Arc, time::Duration};

use offcache_common::{
    code::{BincodeSerializer, Key, Serializer, Value},
    error::Result,
    event::EvictionListener,
    loader::CacheLoader,
};
use offcache_search::{IndexHandler, NoopIndexHandler};
use serde::{de::DeserializeOwned, Serialize};

use super::{
    cache::{Collaborators, OffHeapCache},
    config::OffHeapCacheConfig,
    eviction::EvictionConfig,
};

/// Off-heap cache builder.
pub struct OffHeapCacheBuilder<K, V> {
    config: OffHeapCacheConfig,
    serializer: Arc<dyn Serializer<V>>,
    loader: Option<Arc<dyn CacheLoader<Key = K, Value = V>>>,
    listener: Option<Arc<dyn EvictionListener<Key = K, Value = V>>>,
    index: Option<Arc<dyn IndexHandler<K, V>>>,
}

impl<K, V> OffHeapCacheBuilder<K, V>
where
    K: Key,
    V: Value + Serialize + DeserializeOwned,
{
    /// Create a builder that serializes values with `bincode`.
    pub fn bincode() -> Self {
        Self::new(BincodeSerializer::<V>::default())
    }
}

impl<K, V> OffHeapCacheBuilder<K, V>
where
    K: Key,
    V: Value,
{
    /// Create a builder with the value serializer and the default config.
    pub fn new(serializer: impl Serializer<V>) -> Self {
        Self {
            config: OffHeapCacheConfig::default(),
            serializer: Arc::new(serializer),
            loader: None,
            listener: None,
            index: None,
        }
    }

    /// Replace the whole config.
    pub fn with_config(mut self, config: OffHeapCacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the name of the cache instance.
    ///
    /// Default: `offcache`.
    pub fn with_name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    /// Set the count of byte store buffers.
    ///
    /// Default: `1`.
    pub fn with_buffer_count(mut self, buffer_count: usize) -> Self {
        self.config.buffer_count = buffer_count;
        self
    }

    /// Set the capacity of each byte store buffer in bytes.
    ///
    /// Default: 64 MiB.
    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.config.buffer_capacity = buffer_capacity;
        self
    }

    /// Set the period of the buffer cleaner.
    ///
    /// Default: 10s.
    pub fn with_cleaner_period(mut self, period: Duration) -> Self {
        self.config.cleaner_period = period;
        self
    }

    /// Set the fragmentation ratio over which a buffer is compacted, within `[0, 1]`.
    ///
    /// Default: `0.5`.
    pub fn with_cleaner_threshold(mut self, threshold: f64) -> Self {
        self.config.cleaner_threshold = threshold;
        self
    }

    /// Set the count of lock stripes. Operations on keys of different stripes never contend.
    ///
    /// Default: `16`.
    pub fn with_concurrency_level(mut self, concurrency_level: usize) -> Self {
        self.config.concurrency_level = concurrency_level;
        self
    }

    /// Set the period of the expiry and capacity sweep.
    ///
    /// Default: 5s.
    pub fn with_eviction_period(mut self, period: Duration) -> Self {
        self.config.eviction_period = period;
        self
    }

    /// Set the maximum count of entries.
    ///
    /// Default: `10000`.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the eviction algorithm.
    ///
    /// Default: Lru.
    pub fn with_eviction_config(mut self, eviction_config: impl Into<EvictionConfig>) -> Self {
        self.config.eviction = eviction_config.into();
        self
    }

    /// Set the loader called on misses.
    ///
    /// Default: No loader, misses return `None`.
    pub fn with_loader(mut self, loader: Arc<dyn CacheLoader<Key = K, Value = V>>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the listener called when entries are invalidated, expired or evicted.
    ///
    /// Default: No listener.
    pub fn with_eviction_listener(mut self, listener: Arc<dyn EvictionListener<Key = K, Value = V>>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Set the index handler.
    ///
    /// Default: [`NoopIndexHandler`], nothing is indexed and queries return nothing.
    pub fn with_index_handler(mut self, index: Arc<dyn IndexHandler<K, V>>) -> Self {
        self.index = Some(index);
        self
    }

    /// Current config.
    pub fn config(&self) -> &OffHeapCacheConfig {
        &self.config
    }

    /// Validate the config, reserve the byte store and start the background tasks.
    pub fn build(self) -> Result<OffHeapCache<K, V>> {
        let index: Arc<dyn IndexHandler<K, V>> = match self.index {
            Some(index) => index,
            None => Arc::new(NoopIndexHandler::default()),
        };
        OffHeapCache::open(
            &self.config,
            Collaborators {
                serializer: self.serializer,
                loader: self.loader,
                listener: self.listener,
                index,
            },
        )
    }
}
