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
    collections::HashMap,
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use offcache_common::{
    code::{Key, Serializer, Value},
    error::{Error, ErrorKind, Result},
    event::{Event, EvictionListener},
    loader::CacheLoader,
    runtime::BackgroundTasks,
    stats::{CacheStats, StatsSnapshot},
    strict_assert_eq,
    striped::StripedRwLock,
};
use offcache_search::{Accessor, IndexHandler, IndexType, Query, Scanner};
use offcache_storage::{BufferUsage, ByteStore, Pointer, Relocation};
use parking_lot::{Mutex, RwLockWriteGuard};

use super::{config::OffHeapCacheConfig, eviction::Eviction};
use crate::traits::{Cache, SearchableCache};

#[derive(Debug, Clone, Copy)]
struct Entry {
    pointer: Pointer,
    expire_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expire_at.is_some_and(|at| at <= now)
    }
}

/// The entries of one lock stripe and their victim order.
///
/// Writers own the order through the stripe write lock. Readers holding the stripe read lock take its mutex to
/// record an access.
#[derive(Debug)]
struct Stripe<K> {
    entries: HashMap<K, Entry>,
    order: Mutex<Box<dyn Eviction<K>>>,
}

pub(crate) struct Inner<K, V>
where
    K: Key,
    V: Value,
{
    name: String,
    capacity: usize,
    cleaner_threshold: f64,

    directory: StripedRwLock<Stripe<K>>,
    store: ByteStore,
    size: AtomicUsize,
    tick: AtomicU64,

    serializer: Arc<dyn Serializer<V>>,
    loader: Option<Arc<dyn CacheLoader<Key = K, Value = V>>>,
    listener: Option<Arc<dyn EvictionListener<Key = K, Value = V>>>,
    index: Arc<dyn IndexHandler<K, V>>,

    stats: Arc<CacheStats>,
    closed: AtomicBool,
}

pub(crate) struct Collaborators<K, V> {
    pub serializer: Arc<dyn Serializer<V>>,
    pub loader: Option<Arc<dyn CacheLoader<Key = K, Value = V>>>,
    pub listener: Option<Arc<dyn EvictionListener<Key = K, Value = V>>>,
    pub index: Arc<dyn IndexHandler<K, V>>,
}

/// A cache that keeps serialized values in a byte store outside the managed heap.
///
/// The key directory is split into lock stripes, each with its own victim order. Writes to a key hold the write
/// lock of its stripe; reads hold the read lock. The capacity bound is global: a put over capacity evicts the
/// oldest head among the stripe orders. Compaction of the byte store holds every stripe's write lock while it moves payloads, so readers
/// never observe a moved range.
///
/// Two background tasks run on a dedicated runtime: the cleaner compacts fragmented buffers, and the sweeper
/// removes expired entries and enforces the capacity bound. Both stop on [`OffHeapCache::close`] or when the last
/// handle is dropped.
///
/// Cloning the cache is cheap; all clones share the same storage.
pub struct OffHeapCache<K, V>
where
    K: Key,
    V: Value,
{
    inner: Arc<Inner<K, V>>,
    tasks: Arc<BackgroundTasks>,
}

impl<K, V> Debug for OffHeapCache<K, V>
where
    K: Key,
    V: Value,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffHeapCache")
            .field("name", &self.inner.name)
            .field("size", &self.inner.size.load(Ordering::Relaxed))
            .field("capacity", &self.inner.capacity)
            .field("stripes", &self.inner.directory.stripes())
            .field("tasks", &self.tasks)
            .finish()
    }
}

impl<K, V> Clone for OffHeapCache<K, V>
where
    K: Key,
    V: Value,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            tasks: self.tasks.clone(),
        }
    }
}

impl<K, V> OffHeapCache<K, V>
where
    K: Key,
    V: Value,
{
    pub(crate) fn open(config: &OffHeapCacheConfig, collaborators: Collaborators<K, V>) -> Result<Self> {
        config.validate()?;

        let store = ByteStore::new(&config.store_config())?;
        let inner = Arc::new(Inner {
            name: config.name.clone(),
            capacity: config.capacity,
            cleaner_threshold: config.cleaner_threshold,
            directory: StripedRwLock::new(config.concurrency_level, || Stripe {
                entries: HashMap::new(),
                order: Mutex::new(config.eviction.build()),
            }),
            store,
            size: AtomicUsize::new(0),
            tick: AtomicU64::new(0),
            serializer: collaborators.serializer,
            loader: collaborators.loader,
            listener: collaborators.listener,
            index: collaborators.index,
            stats: Arc::new(CacheStats::default()),
            closed: AtomicBool::new(false),
        });

        let tasks = Arc::new(BackgroundTasks::new(format!("{}-bg", config.name))?);
        let weak = Arc::downgrade(&inner);
        tasks.spawn_periodic("cleaner", config.cleaner_period, move || {
            let Some(inner) = weak.upgrade() else {
                return false;
            };
            if let Err(e) = inner.clean() {
                tracing::warn!(cache = %inner.name, ?e, "[offheap cache]: clean pass failed");
            }
            true
        });
        let weak = Arc::downgrade(&inner);
        tasks.spawn_periodic("sweeper", config.eviction_period, move || {
            let Some(inner) = weak.upgrade() else {
                return false;
            };
            if let Err(e) = inner.sweep() {
                tracing::warn!(cache = %inner.name, ?e, "[offheap cache]: sweep pass failed");
            }
            true
        });

        tracing::info!(
            cache = %config.name,
            buffers = config.buffer_count,
            buffer_capacity = config.buffer_capacity,
            stripes = config.concurrency_level,
            capacity = config.capacity,
            "[offheap cache]: cache built"
        );

        Ok(Self { inner, tasks })
    }

    /// Cache name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Count of lock stripes.
    pub fn concurrency_level(&self) -> usize {
        self.inner.directory.stripes()
    }

    /// Insert or overwrite an entry that never expires.
    pub fn put(&self, key: K, value: V) -> Result<()> {
        self.inner.put(key, value, None)
    }

    /// Insert or overwrite an entry that expires after `ttl`.
    pub fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<()> {
        self.inner.put(key, value, Instant::now().checked_add(ttl))
    }

    /// Get the value of a key.
    ///
    /// On a miss the loader, if any, is asked for the value, and a loaded value is cached before it is returned.
    /// If another write for the key commits while the loader runs, that value is kept and returned instead.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.inner.get(key)
    }

    /// Get the value of a key without touching statistics, the eviction order or the loader.
    pub fn peek(&self, key: &K) -> Result<Option<V>> {
        self.inner.check_open()?;
        self.inner.peek(key)
    }

    /// Remove an entry and return its value.
    pub fn invalidate(&self, key: &K) -> Result<Option<V>> {
        self.inner.check_open()?;
        self.inner.remove(key, Event::Invalidate, |_| true)
    }

    /// Returns `true` if the key has a live entry. Never loads or counts.
    pub fn contains(&self, key: &K) -> bool {
        let now = Instant::now();
        self.inner
            .directory
            .read(key)
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Remove every entry and reset the byte store. Listeners are not called.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Count of entries, including expired entries not swept yet.
    pub fn size(&self) -> usize {
        self.inner.size.load(Ordering::Relaxed)
    }

    /// Resolve a query through the index handler and return the current values of the selected keys.
    pub fn execute(&self, query: &Query) -> Result<Vec<V>> {
        self.inner.check_open()?;
        let keys = self.inner.index.execute(query, self.inner.as_ref())?;
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.inner.peek(&key)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Register an index on an attribute and index the entries already cached.
    pub fn add_index(&self, attribute: &str, index_type: IndexType, accessor: Accessor<V>) -> Result<()> {
        self.inner.check_open()?;
        self.inner.index.add_index(attribute, index_type, accessor)?;
        self.inner.reindex()
    }

    /// Register an attribute without an index. Queries on it scan all values.
    pub fn add_attribute(&self, attribute: &str, accessor: Accessor<V>) -> Result<()> {
        self.inner.index.add_attribute(attribute, accessor)
    }

    /// Counters of this cache.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Per-buffer space accounting of the byte store.
    pub fn store_usage(&self) -> Vec<BufferUsage> {
        self.inner.store.usage()
    }

    /// Run a cleaner pass now. Returns the count of compacted buffers.
    pub fn clean(&self) -> Result<usize> {
        self.inner.clean()
    }

    /// Run a sweep pass now. Returns the count of removed entries.
    pub fn sweep(&self) -> Result<usize> {
        self.inner.sweep()
    }

    /// Stop the background tasks, waiting for in-flight passes, then drop every entry.
    ///
    /// Later operations fail with [`ErrorKind::Closed`].
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.tasks.shutdown();
        self.inner.clear();
        tracing::info!(cache = %self.inner.name, "[offheap cache]: cache closed");
    }
}

impl<K, V> Inner<K, V>
where
    K: Key,
    V: Value,
{
    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::new(ErrorKind::Closed, "cache is closed").with_context("cache", &self.name));
        }
        Ok(())
    }

    fn tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed)
    }

    fn load(&self, pointer: &Pointer) -> Result<V> {
        let payload = self.store.read(pointer)?;
        self.serializer.deserialize(&payload)
    }

    fn put(&self, key: K, value: V, expire_at: Option<Instant>) -> Result<()> {
        self.insert(key, &value, expire_at, true).map(|_| ())
    }

    /// Write an entry. Unless `overwrite` is set, a live entry is kept and its value returned instead.
    fn insert(&self, key: K, value: &V, expire_at: Option<Instant>, overwrite: bool) -> Result<Option<V>> {
        self.check_open()?;
        let payload = self.serializer.serialize(value)?;

        let mut compacted = false;
        let inserted = loop {
            let mut stripe = self.directory.write(&key);
            if !overwrite {
                if let Some(entry) = stripe.entries.get(&key).filter(|entry| !entry.is_expired(Instant::now())) {
                    return self.load(&entry.pointer).map(Some);
                }
            }
            match self.store.store(&payload) {
                Ok(pointer) => break self.commit(&mut stripe, key, value, pointer, expire_at)?,
                Err(e) if e.kind() == ErrorKind::NoSpace && !compacted => {
                    drop(stripe);
                    compacted = true;
                    if !self.compact_for(payload.len())? {
                        return Err(e);
                    }
                }
                Err(e) => return Err(e),
            }
        };

        if inserted {
            self.enforce_capacity()?;
        }
        Ok(None)
    }

    /// Swap the new pointer into the directory. Returns `true` if the key was absent.
    ///
    /// On failure the new pointer is freed and the directory is left untouched.
    fn commit(
        &self,
        stripe: &mut Stripe<K>,
        key: K,
        value: &V,
        pointer: Pointer,
        expire_at: Option<Instant>,
    ) -> Result<bool> {
        let old = match stripe.entries.get(&key) {
            Some(entry) => match self.load(&entry.pointer) {
                Ok(old) => Some((entry.pointer, old)),
                Err(e) => {
                    self.store.free(&pointer)?;
                    return Err(e);
                }
            },
            None => None,
        };

        stripe.entries.insert(key.clone(), Entry { pointer, expire_at });

        let inserted = match old {
            Some((pointer, old)) => {
                self.store.free(&pointer)?;
                self.index.remove(&key, &old);
                false
            }
            None => {
                self.size.fetch_add(1, Ordering::Relaxed);
                true
            }
        };
        self.index.add(&key, value);
        let tick = self.tick();
        stripe.order.get_mut().insert(&key, tick);

        Ok(inserted)
    }

    fn get(&self, key: &K) -> Result<Option<V>> {
        self.check_open()?;

        let now = Instant::now();
        let (payload, expired) = {
            let stripe = self.directory.read(key);
            match stripe.entries.get(key) {
                Some(entry) if entry.is_expired(now) => (None, true),
                Some(entry) => {
                    let payload = self.store.read(&entry.pointer)?;
                    let tick = self.tick();
                    stripe.order.lock().access(key, tick);
                    (Some(payload), false)
                }
                None => (None, false),
            }
        };

        if let Some(payload) = payload {
            self.stats.record_hit();
            return self.serializer.deserialize(&payload).map(Some);
        }
        if expired {
            self.remove(key, Event::Expire, |entry| entry.is_expired(now))?;
        }
        self.stats.record_miss();

        let Some(loader) = &self.loader else {
            return Ok(None);
        };
        let loaded = loader.load(key).map_err(|e| {
            Error::new(ErrorKind::External, "cache loader failed")
                .with_context("key", format!("{key:?}"))
                .with_source(e)
        })?;
        let Some(value) = loaded else {
            return Ok(None);
        };
        // A write that committed while loading wins over the loaded value.
        if let Some(current) = self.insert(key.clone(), &value, None, false)? {
            tracing::debug!(cache = %self.name, ?key, "[offheap cache]: loaded value superseded");
            return Ok(Some(current));
        }
        self.stats.record_load();
        Ok(Some(value))
    }

    fn peek(&self, key: &K) -> Result<Option<V>> {
        let now = Instant::now();
        let payload = {
            let stripe = self.directory.read(key);
            match stripe.entries.get(key) {
                Some(entry) if !entry.is_expired(now) => self.store.read(&entry.pointer)?,
                _ => return Ok(None),
            }
        };
        self.serializer.deserialize(&payload).map(Some)
    }

    /// Remove an entry if `predicate` holds for it, then notify the listener outside the lock.
    fn remove<P>(&self, key: &K, event: Event, predicate: P) -> Result<Option<V>>
    where
        P: FnOnce(&Entry) -> bool,
    {
        let value = {
            let mut stripe = self.directory.write(key);
            let Some(entry) = stripe.entries.get(key).copied() else {
                return Ok(None);
            };
            if !predicate(&entry) {
                return Ok(None);
            }
            self.detach(&mut stripe, key, entry)?
        };

        self.notify(key, event, &value);
        Ok(Some(value))
    }

    /// Drop an entry from the stripe, the byte store and the indices. The stripe write lock must be held.
    fn detach(&self, stripe: &mut Stripe<K>, key: &K, entry: Entry) -> Result<V> {
        let value = self.load(&entry.pointer)?;
        stripe.entries.remove(key);
        stripe.order.get_mut().remove(key);
        self.store.free(&entry.pointer)?;
        self.index.remove(key, &value);
        self.size.fetch_sub(1, Ordering::Relaxed);
        Ok(value)
    }

    fn notify(&self, key: &K, event: Event, value: &V) {
        self.stats.record_eviction();
        tracing::trace!(cache = %self.name, ?key, ?event, "[offheap cache]: entry removed");
        if let Some(listener) = &self.listener {
            listener.on_eviction(event, key, value);
        }
    }

    /// Stripe whose next victim is the oldest. Each stripe is locked on its own.
    fn victim_stripe(&self) -> Option<usize> {
        (0..self.directory.stripes())
            .filter_map(|index| {
                let tick = self.directory.read_at(index).order.lock().peek();
                tick.map(|tick| (tick, index))
            })
            .min()
            .map(|(_, index)| index)
    }

    fn enforce_capacity(&self) -> Result<usize> {
        let mut evicted = 0;
        while self.size.load(Ordering::Relaxed) > self.capacity {
            let Some(index) = self.victim_stripe() else {
                break;
            };
            let victim = {
                let mut stripe = self.directory.write_at(index);
                let Some(key) = stripe.order.get_mut().pop() else {
                    continue;
                };
                match stripe.entries.get(&key).copied() {
                    Some(entry) => {
                        let value = self.detach(&mut stripe, &key, entry)?;
                        Some((key, value))
                    }
                    None => None,
                }
            };
            if let Some((key, value)) = victim {
                self.notify(&key, Event::Evict, &value);
                evicted += 1;
            }
        }
        Ok(evicted)
    }

    fn sweep(&self) -> Result<usize> {
        let now = Instant::now();
        let mut expired = vec![];
        for stripe in 0..self.directory.stripes() {
            let stripe = self.directory.read_at(stripe);
            expired.extend(
                stripe
                    .entries
                    .iter()
                    .filter(|(_, entry)| entry.is_expired(now))
                    .map(|(key, _)| key.clone()),
            );
        }

        let mut removed = 0;
        for key in expired {
            if self.remove(&key, Event::Expire, |entry| entry.is_expired(now))?.is_some() {
                removed += 1;
            }
        }
        removed += self.enforce_capacity()?;

        if removed > 0 {
            tracing::debug!(cache = %self.name, removed, "[offheap cache]: sweep pass done");
        }
        Ok(removed)
    }

    fn clean(&self) -> Result<usize> {
        let buffers = self.store.fragmented_buffers(self.cleaner_threshold);
        if buffers.is_empty() {
            return Ok(0);
        }

        let mut directory = self.directory.write_all();
        for buffer in &buffers {
            let relocations = self.store.compact(*buffer)?;
            Self::relocate(&mut directory, relocations);
        }
        tracing::info!(cache = %self.name, ?buffers, "[offheap cache]: buffers compacted");
        Ok(buffers.len())
    }

    /// Compact a buffer that would fit a `len`-byte payload. Returns `false` if no buffer would.
    fn compact_for(&self, len: usize) -> Result<bool> {
        let mut directory = self.directory.write_all();
        let Some(buffer) = self.store.compactable_for(len) else {
            return Ok(false);
        };
        let relocations = self.store.compact(buffer)?;
        Self::relocate(&mut directory, relocations);
        tracing::debug!(cache = %self.name, buffer, len, "[offheap cache]: compacted to make room");
        Ok(true)
    }

    fn relocate(directory: &mut [RwLockWriteGuard<'_, Stripe<K>>], relocations: Vec<Relocation>) {
        if relocations.is_empty() {
            return;
        }
        let moves = relocations
            .into_iter()
            .map(|relocation| (relocation.from, relocation.to))
            .collect::<HashMap<_, _>>();

        let mut applied = 0;
        for stripe in directory.iter_mut() {
            for entry in stripe.entries.values_mut() {
                if let Some(to) = moves.get(&entry.pointer) {
                    entry.pointer = *to;
                    applied += 1;
                }
            }
        }

        if applied != moves.len() {
            tracing::error!(
                applied,
                moved = moves.len(),
                "[offheap cache]: moved ranges without a directory entry"
            );
        }
        strict_assert_eq!(applied, moves.len());
    }

    fn clear(&self) {
        let mut directory = self.directory.write_all();
        for stripe in directory.iter_mut() {
            stripe.entries.clear();
            stripe.order.get_mut().clear();
        }
        self.store.clear();
        self.index.clear();
        self.size.store(0, Ordering::Relaxed);
    }

    /// Feed every live entry to the index handler.
    fn reindex(&self) -> Result<()> {
        for stripe in 0..self.directory.stripes() {
            let stripe = self.directory.read_at(stripe);
            for (key, entry) in stripe.entries.iter() {
                let value = self.load(&entry.pointer)?;
                self.index.add(key, &value);
            }
        }
        Ok(())
    }
}

impl<K, V> Scanner<K, V> for Inner<K, V>
where
    K: Key,
    V: Value,
{
    fn scan(&self, f: &mut dyn FnMut(&K, &V)) -> Result<()> {
        let now = Instant::now();
        for stripe in 0..self.directory.stripes() {
            let stripe = self.directory.read_at(stripe);
            for (key, entry) in stripe.entries.iter() {
                if entry.is_expired(now) {
                    continue;
                }
                let value = self.load(&entry.pointer)?;
                f(key, &value);
            }
        }
        Ok(())
    }

    fn get(&self, key: &K) -> Result<Option<V>> {
        self.peek(key)
    }
}

impl<K, V> Cache<K, V> for OffHeapCache<K, V>
where
    K: Key,
    V: Value,
{
    fn name(&self) -> &str {
        OffHeapCache::name(self)
    }

    fn put(&self, key: K, value: V) -> Result<()> {
        OffHeapCache::put(self, key, value)
    }

    fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<()> {
        OffHeapCache::put_with_ttl(self, key, value, ttl)
    }

    fn get(&self, key: &K) -> Result<Option<V>> {
        OffHeapCache::get(self, key)
    }

    fn invalidate(&self, key: &K) -> Result<Option<V>> {
        OffHeapCache::invalidate(self, key)
    }

    fn contains(&self, key: &K) -> Result<bool> {
        Ok(OffHeapCache::contains(self, key))
    }

    fn clear(&self) -> Result<()> {
        OffHeapCache::clear(self);
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        Ok(OffHeapCache::size(self))
    }

    fn stats(&self) -> StatsSnapshot {
        OffHeapCache::stats(self)
    }
}

impl<K, V> SearchableCache<K, V> for OffHeapCache<K, V>
where
    K: Key,
    V: Value,
{
    fn execute(&self, query: &Query) -> Result<Vec<V>> {
        OffHeapCache::execute(self, query)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, thread};

    use offcache_common::code::BytesSerializer;

    use super::*;
    use crate::offheap::builder::OffHeapCacheBuilder;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_busy_stripe_does_not_block_others() {
        let cache = OffHeapCacheBuilder::<u64, Vec<u8>>::new(BytesSerializer)
            .with_buffer_capacity(4096)
            .with_concurrency_level(4)
            .with_cleaner_period(HOUR)
            .with_eviction_period(HOUR)
            .build()
            .unwrap();
        let directory = &cache.inner.directory;
        let busy = 0u64;
        let other = (1..).find(|k| directory.stripe_of(k) != directory.stripe_of(&busy)).unwrap();
        cache.put(busy, vec![0]).unwrap();
        cache.put(other, vec![1]).unwrap();

        // A reader of the busy stripe is recording an access.
        let stripe = directory.read(&busy);
        let _order = stripe.order.lock();

        let (tx, rx) = mpsc::channel();
        let handle = {
            let cache = cache.clone();
            thread::spawn(move || {
                let value = cache.get(&other).unwrap();
                cache.put(other, vec![2]).unwrap();
                cache.invalidate(&other).unwrap();
                tx.send(value).unwrap();
            })
        };
        assert_eq!(rx.recv_timeout(Duration::from_secs(10)).unwrap(), Some(vec![1]));
        handle.join().unwrap();
    }

    #[test]
    fn test_global_victim_order_across_stripes() {
        let cache = OffHeapCacheBuilder::<u64, Vec<u8>>::new(BytesSerializer)
            .with_buffer_capacity(4096)
            .with_capacity(4)
            .with_concurrency_level(8)
            .with_cleaner_period(HOUR)
            .with_eviction_period(HOUR)
            .build()
            .unwrap();
        for key in 0..4u64 {
            cache.put(key, vec![key as u8]).unwrap();
        }
        assert!(cache.get(&0).unwrap().is_some());
        cache.put(4, vec![4]).unwrap();
        cache.put(5, vec![5]).unwrap();

        assert_eq!(cache.size(), 4);
        assert!(cache.contains(&0));
        assert!(!cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!((3..6).all(|key| cache.contains(&key)));
    }
}
