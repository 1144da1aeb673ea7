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

use std::time::Duration;

use offcache_common::error::{Error, Result};
use offcache_storage::ByteStoreConfig;
use serde::{Deserialize, Serialize};

use super::eviction::EvictionConfig;

/// Construction options of an off-heap cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffHeapCacheConfig {
    /// Cache name, used in logs and as the background thread name prefix.
    pub name: String,
    /// Count of byte store buffers.
    pub buffer_count: usize,
    /// Capacity of each buffer in bytes.
    pub buffer_capacity: usize,
    /// Period of the buffer cleaner.
    pub cleaner_period: Duration,
    /// A buffer is compacted once its free bytes over its capacity exceeds this ratio.
    pub cleaner_threshold: f64,
    /// Count of lock stripes.
    pub concurrency_level: usize,
    /// Period of the expiry and capacity sweep.
    pub eviction_period: Duration,
    /// Maximum count of entries.
    pub capacity: usize,
    /// Victim ordering once the capacity is exceeded.
    pub eviction: EvictionConfig,
}

impl Default for OffHeapCacheConfig {
    fn default() -> Self {
        Self {
            name: "offcache".to_string(),
            buffer_count: 1,
            buffer_capacity: 64 * 1024 * 1024,
            cleaner_period: Duration::from_secs(10),
            cleaner_threshold: 0.5,
            concurrency_level: 16,
            eviction_period: Duration::from_secs(5),
            capacity: 10_000,
            eviction: EvictionConfig::default(),
        }
    }
}

impl OffHeapCacheConfig {
    /// Check the options before anything is reserved.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: &str| Err(Error::config(message.to_string()).with_context("cache", &self.name));

        if self.buffer_count == 0 {
            return fail("buffer count must be positive");
        }
        if self.buffer_capacity == 0 {
            return fail("buffer capacity must be positive");
        }
        if self.concurrency_level == 0 {
            return fail("concurrency level must be positive");
        }
        if self.capacity == 0 {
            return fail("capacity must be positive");
        }
        if !(0.0..=1.0).contains(&self.cleaner_threshold) {
            return fail("cleaner threshold must be within [0, 1]");
        }
        if self.cleaner_period.is_zero() || self.eviction_period.is_zero() {
            return fail("background periods must be positive");
        }
        Ok(())
    }

    pub(crate) fn store_config(&self) -> ByteStoreConfig {
        ByteStoreConfig {
            buffer_count: self.buffer_count,
            buffer_capacity: self.buffer_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use offcache_common::error::ErrorKind;

    use super::*;
    use crate::offheap::eviction::FifoConfig;

    #[test]
    fn test_default_is_valid() {
        OffHeapCacheConfig::default().validate().unwrap();
    }

    #[test]
    fn test_invalid() {
        let cases: Vec<Box<dyn Fn(&mut OffHeapCacheConfig)>> = vec![
            Box::new(|c| c.buffer_count = 0),
            Box::new(|c| c.buffer_capacity = 0),
            Box::new(|c| c.concurrency_level = 0),
            Box::new(|c| c.capacity = 0),
            Box::new(|c| c.cleaner_threshold = 1.5),
            Box::new(|c| c.cleaner_threshold = f64::NAN),
            Box::new(|c| c.eviction_period = Duration::ZERO),
        ];
        for case in cases {
            let mut config = OffHeapCacheConfig::default();
            case(&mut config);
            assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Config, "{config:?}");
        }
    }

    #[test]
    fn test_partial_json() {
        let config: OffHeapCacheConfig = serde_json::from_str(
            r#"{
                "name": "users",
                "buffer_count": 4,
                "capacity": 2,
                "eviction": { "Fifo": {} }
            }"#,
        )
        .unwrap();
        assert_eq!(config.name, "users");
        assert_eq!(config.buffer_count, 4);
        assert_eq!(config.capacity, 2);
        assert_eq!(config.eviction, EvictionConfig::Fifo(FifoConfig::default()));
        assert_eq!(config.concurrency_level, 16);
        config.validate().unwrap();
    }
}
