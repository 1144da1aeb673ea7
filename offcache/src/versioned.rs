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

use std::{fmt::Debug, sync::Arc, time::Duration};

use bytes::{Buf, BufMut};
use offcache_common::{
    code::{Key, Serializer, Value},
    error::{Error, ErrorKind, Result},
    event::{Event, EvictionListener},
    loader::CacheLoader,
    stats::StatsSnapshot,
    striped::StripedRwLock,
};
use offcache_search::{Accessor, IndexType, Query};
use serde::{Deserialize, Serialize};

use crate::{
    offheap::{builder::OffHeapCacheBuilder, cache::OffHeapCache},
    traits::{Cache, SearchableCache},
};

const VERSION_LEN: usize = std::mem::size_of::<i32>();

/// A value tagged with a version.
///
/// For a key, the version of the stored item never decreases across successful writes of a
/// [`VersionedOffHeapCache`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionedItem<V> {
    version: i32,
    value: V,
}

impl<V> VersionedItem<V> {
    /// Tag `value` with `version`.
    pub fn new(version: i32, value: V) -> Self {
        Self { version, value }
    }

    /// Item version.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Item value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Unwrap the value.
    pub fn into_value(self) -> V {
        self.value
    }
}

/// Serializes [`VersionedItem`]s as the inner payload followed by a 4-byte big-endian version.
#[derive(Debug, Clone, Default)]
pub struct VersionedSerializer<S> {
    inner: S,
}

impl<S> VersionedSerializer<S> {
    /// Wrap the value serializer.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<V, S> Serializer<VersionedItem<V>> for VersionedSerializer<S>
where
    S: Serializer<V>,
{
    fn serialize(&self, item: &VersionedItem<V>) -> Result<Vec<u8>> {
        let mut payload = self.inner.serialize(&item.value)?;
        payload.reserve_exact(VERSION_LEN);
        payload.put_i32(item.version);
        Ok(payload)
    }

    fn deserialize(&self, payload: &[u8]) -> Result<VersionedItem<V>> {
        let Some(split) = payload.len().checked_sub(VERSION_LEN) else {
            return Err(Error::new(ErrorKind::Coding, "versioned payload too short").with_context("len", payload.len()));
        };
        let (body, mut suffix) = payload.split_at(split);
        let version = suffix.get_i32();
        let value = self.inner.deserialize(body)?;
        Ok(VersionedItem { version, value })
    }
}

/// Adapts a loader of bare values. Loaded values get version `0`.
pub struct VersionedLoader<K, V> {
    inner: Arc<dyn CacheLoader<Key = K, Value = V>>,
}

impl<K, V> VersionedLoader<K, V> {
    /// Wrap a loader of bare values.
    pub fn new(inner: Arc<dyn CacheLoader<Key = K, Value = V>>) -> Self {
        Self { inner }
    }
}

impl<K, V> CacheLoader for VersionedLoader<K, V>
where
    K: Key,
    V: Value,
{
    type Key = K;
    type Value = VersionedItem<V>;

    fn load(&self, key: &K) -> anyhow::Result<Option<VersionedItem<V>>> {
        Ok(self.inner.load(key)?.map(|value| VersionedItem::new(0, value)))
    }
}

/// Adapts a listener of bare values. The listener never sees versions.
pub struct VersionedEvictionListener<K, V> {
    inner: Arc<dyn EvictionListener<Key = K, Value = V>>,
}

impl<K, V> VersionedEvictionListener<K, V> {
    /// Wrap a listener of bare values.
    pub fn new(inner: Arc<dyn EvictionListener<Key = K, Value = V>>) -> Self {
        Self { inner }
    }
}

impl<K, V> EvictionListener for VersionedEvictionListener<K, V>
where
    K: Key,
    V: Value,
{
    type Key = K;
    type Value = VersionedItem<V>;

    fn on_eviction(&self, reason: Event, key: &K, item: &VersionedItem<V>) {
        self.inner.on_eviction(reason, key, &item.value);
    }
}

/// An off-heap cache of [`VersionedItem`]s that rejects writes older than the stored item.
///
/// # Protocol
///
/// A put first compares its version with the stored one without any lock, and fails fast with
/// [`ErrorKind::StaleItem`] if it is older. Otherwise it takes the write lock of the key's stripe, compares again,
/// and only then writes. Equal versions are accepted.
///
/// All other operations pass through to the wrapped cache.
pub struct VersionedOffHeapCache<K, V>
where
    K: Key,
    V: Value,
{
    cache: OffHeapCache<K, VersionedItem<V>>,
    locks: Arc<StripedRwLock>,
}

impl<K, V> Debug for VersionedOffHeapCache<K, V>
where
    K: Key,
    V: Value,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedOffHeapCache").field("cache", &self.cache).finish()
    }
}

impl<K, V> Clone for VersionedOffHeapCache<K, V>
where
    K: Key,
    V: Value,
{
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            locks: self.locks.clone(),
        }
    }
}

impl<K, V> VersionedOffHeapCache<K, V>
where
    K: Key,
    V: Value,
{
    /// Builder of the wrapped cache, with `serializer` for the bare values.
    pub fn builder(serializer: impl Serializer<V>) -> OffHeapCacheBuilder<K, VersionedItem<V>> {
        OffHeapCacheBuilder::new(VersionedSerializer::new(serializer))
    }

    /// Wrap a cache. The version locks use as many stripes as the cache.
    pub fn new(cache: OffHeapCache<K, VersionedItem<V>>) -> Self {
        let locks = Arc::new(StripedRwLock::new(cache.concurrency_level(), || ()));
        Self { cache, locks }
    }

    /// The wrapped cache.
    pub fn inner(&self) -> &OffHeapCache<K, VersionedItem<V>> {
        &self.cache
    }

    fn check(&self, key: &K, version: i32) -> Result<()> {
        match self.cache.peek(key)? {
            Some(current) if version < current.version => Err(Error::stale_item(version, current.version)),
            _ => Ok(()),
        }
    }

    fn put_inner(&self, key: K, item: VersionedItem<V>, ttl: Option<Duration>) -> Result<()> {
        self.check(&key, item.version)?;

        let _guard = self.locks.write(&key);
        self.check(&key, item.version)?;
        match ttl {
            Some(ttl) => self.cache.put_with_ttl(key, item, ttl),
            None => self.cache.put(key, item),
        }
    }

    /// Write an item unless the stored item has a higher version.
    ///
    /// Fails with [`ErrorKind::StaleItem`], leaving the stored item as is, if the stored version is higher.
    pub fn put(&self, key: K, item: VersionedItem<V>) -> Result<()> {
        self.put_inner(key, item, None)
    }

    /// Like [`VersionedOffHeapCache::put`], with a time-to-live.
    pub fn put_with_ttl(&self, key: K, item: VersionedItem<V>, ttl: Duration) -> Result<()> {
        self.put_inner(key, item, Some(ttl))
    }

    /// Get the stored item of a key.
    pub fn get(&self, key: &K) -> Result<Option<VersionedItem<V>>> {
        self.cache.get(key)
    }

    /// Remove an entry and return its item.
    pub fn invalidate(&self, key: &K) -> Result<Option<VersionedItem<V>>> {
        self.cache.invalidate(key)
    }

    /// Returns `true` if the key has a live entry.
    pub fn contains(&self, key: &K) -> bool {
        self.cache.contains(key)
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.cache.clear()
    }

    /// Count of entries.
    pub fn size(&self) -> usize {
        self.cache.size()
    }

    /// Return the items selected by the query.
    pub fn execute(&self, query: &Query) -> Result<Vec<VersionedItem<V>>> {
        self.cache.execute(query)
    }

    /// Register an index on an attribute of the bare value.
    pub fn add_index(&self, attribute: &str, index_type: IndexType, accessor: Accessor<V>) -> Result<()> {
        self.cache
            .add_index(attribute, index_type, Arc::new(move |item: &VersionedItem<V>| accessor(&item.value)))
    }

    /// Register an unindexed attribute of the bare value.
    pub fn add_attribute(&self, attribute: &str, accessor: Accessor<V>) -> Result<()> {
        self.cache
            .add_attribute(attribute, Arc::new(move |item: &VersionedItem<V>| accessor(&item.value)))
    }

    /// Counters of the wrapped cache.
    pub fn stats(&self) -> StatsSnapshot {
        self.cache.stats()
    }

    /// Close the wrapped cache.
    pub fn close(&self) {
        self.cache.close()
    }
}

impl<K, V> Cache<K, VersionedItem<V>> for VersionedOffHeapCache<K, V>
where
    K: Key,
    V: Value,
{
    fn name(&self) -> &str {
        self.cache.name()
    }

    fn put(&self, key: K, item: VersionedItem<V>) -> Result<()> {
        VersionedOffHeapCache::put(self, key, item)
    }

    fn put_with_ttl(&self, key: K, item: VersionedItem<V>, ttl: Duration) -> Result<()> {
        VersionedOffHeapCache::put_with_ttl(self, key, item, ttl)
    }

    fn get(&self, key: &K) -> Result<Option<VersionedItem<V>>> {
        VersionedOffHeapCache::get(self, key)
    }

    fn invalidate(&self, key: &K) -> Result<Option<VersionedItem<V>>> {
        VersionedOffHeapCache::invalidate(self, key)
    }

    fn contains(&self, key: &K) -> Result<bool> {
        Ok(VersionedOffHeapCache::contains(self, key))
    }

    fn clear(&self) -> Result<()> {
        VersionedOffHeapCache::clear(self);
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        Ok(VersionedOffHeapCache::size(self))
    }

    fn stats(&self) -> StatsSnapshot {
        VersionedOffHeapCache::stats(self)
    }
}

impl<K, V> SearchableCache<K, VersionedItem<V>> for VersionedOffHeapCache<K, V>
where
    K: Key,
    V: Value,
{
    fn execute(&self, query: &Query) -> Result<Vec<VersionedItem<V>>> {
        VersionedOffHeapCache::execute(self, query)
    }
}
