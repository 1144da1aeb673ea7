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
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use itertools::Itertools;
use offcache::{
    accessor, BincodeSerializer, CacheIndexHandler, CacheLoader, Criteria, ErrorKind, Event, EvictionListener,
    IndexType, VersionedEvictionListener, VersionedItem, VersionedLoader, VersionedOffHeapCache,
};
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};

const HOUR: Duration = Duration::from_secs(3600);

fn versioned() -> VersionedOffHeapCache<String, String> {
    let cache = VersionedOffHeapCache::<String, String>::builder(BincodeSerializer::<String>::default())
        .with_cleaner_period(HOUR)
        .with_eviction_period(HOUR)
        .with_index_handler(Arc::new(CacheIndexHandler::<String, VersionedItem<String>>::new()))
        .build()
        .unwrap();
    VersionedOffHeapCache::new(cache)
}

#[test_log::test]
fn test_stale_write_rejected() {
    let cache = versioned();
    cache.put("a".to_string(), VersionedItem::new(2, "x".to_string())).unwrap();

    let err = cache
        .put("a".to_string(), VersionedItem::new(1, "y".to_string()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StaleItem);
    assert_eq!(err.stale_versions(), Some((1, 2)));

    let item = cache.get(&"a".to_string()).unwrap().unwrap();
    assert_eq!(item.version(), 2);
    assert_eq!(item.value(), "x");
}

#[test_log::test]
fn test_equal_and_newer_versions_accepted() {
    let cache = versioned();
    let key = "k".to_string();
    cache.put(key.clone(), VersionedItem::new(3, "first".to_string())).unwrap();
    cache.put(key.clone(), VersionedItem::new(3, "second".to_string())).unwrap();
    assert_eq!(cache.get(&key).unwrap().unwrap().value(), "second");

    cache.put(key.clone(), VersionedItem::new(7, "third".to_string())).unwrap();
    assert_eq!(cache.get(&key).unwrap().unwrap(), VersionedItem::new(7, "third".to_string()));

    cache
        .put(key.clone(), VersionedItem::new(i32::MIN, "oldest".to_string()))
        .unwrap_err();
    assert_eq!(cache.size(), 1);
}

#[test_log::test]
fn test_invalidate_resets_version() {
    let cache = versioned();
    let key = "k".to_string();
    cache.put(key.clone(), VersionedItem::new(10, "v10".to_string())).unwrap();
    assert_eq!(cache.invalidate(&key).unwrap().map(|item| item.version()), Some(10));
    cache.put(key.clone(), VersionedItem::new(1, "v1".to_string())).unwrap();
    assert_eq!(cache.get(&key).unwrap().map(|item| item.version()), Some(1));
}

#[test_log::test]
fn test_versioned_ttl() {
    let cache = versioned();
    let key = "k".to_string();
    cache
        .put_with_ttl(key.clone(), VersionedItem::new(5, "short".to_string()), Duration::from_millis(20))
        .unwrap();
    thread::sleep(Duration::from_millis(50));
    assert!(!cache.contains(&key));
    cache.put(key.clone(), VersionedItem::new(1, "after".to_string())).unwrap();
    assert_eq!(cache.get(&key).unwrap().map(|item| item.version()), Some(1));
}

#[test_log::test]
fn test_concurrent_versioned_writes() {
    const WRITERS: u64 = 8;
    const WRITES: usize = 500;

    let cache = versioned();
    let key = "contended".to_string();
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let cache = cache.clone();
        let key = key.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut last = i32::MIN;
            while !done.load(Ordering::Relaxed) {
                if let Some(item) = cache.get(&key).unwrap() {
                    assert!(item.version() >= last, "version went back from {last} to {}", item.version());
                    assert_eq!(item.value(), &item.version().to_string());
                    last = item.version();
                }
            }
        })
    };

    let writers = (0..WRITERS)
        .map(|t| {
            let cache = cache.clone();
            let key = key.clone();
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(t);
                let mut max = i32::MIN;
                for _ in 0..WRITES {
                    let version = rng.random_range(0..10_000);
                    max = max.max(version);
                    match cache.put(key.clone(), VersionedItem::new(version, version.to_string())) {
                        Ok(()) => {}
                        Err(e) => {
                            assert_eq!(e.kind(), ErrorKind::StaleItem);
                            let (attempted, current) = e.stale_versions().unwrap();
                            assert_eq!(attempted, version);
                            assert!(attempted < current);
                        }
                    }
                }
                max
            })
        })
        .collect_vec();

    let max = writers.into_iter().map(|handle| handle.join().unwrap()).max().unwrap();
    done.store(true, Ordering::Relaxed);
    reader.join().unwrap();

    let item = cache.get(&key).unwrap().unwrap();
    assert_eq!(item.version(), max);
    assert_eq!(item.value(), &max.to_string());
}

struct Greeter;

impl CacheLoader for Greeter {
    type Key = String;
    type Value = String;

    fn load(&self, key: &String) -> anyhow::Result<Option<String>> {
        Ok(Some(format!("hello, {key}")))
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<(Event, String, String)>>);

impl EvictionListener for Recorder {
    type Key = String;
    type Value = String;

    fn on_eviction(&self, reason: Event, key: &String, value: &String) {
        self.0.lock().push((reason, key.clone(), value.clone()));
    }
}

#[test_log::test]
fn test_versioned_loader_and_listener() {
    let recorder = Arc::new(Recorder::default());
    let cache = VersionedOffHeapCache::<String, String>::builder(BincodeSerializer::<String>::default())
        .with_cleaner_period(HOUR)
        .with_eviction_period(HOUR)
        .with_loader(Arc::new(VersionedLoader::<String, String>::new(Arc::new(Greeter))))
        .with_eviction_listener(Arc::new(VersionedEvictionListener::<String, String>::new(recorder.clone())))
        .build()
        .unwrap();
    let cache = VersionedOffHeapCache::new(cache);

    let key = "ada".to_string();
    let item = cache.get(&key).unwrap().unwrap();
    assert_eq!(item, VersionedItem::new(0, "hello, ada".to_string()));

    cache.put(key.clone(), VersionedItem::new(1, "bye".to_string())).unwrap();
    cache.invalidate(&key).unwrap();
    assert_eq!(
        *recorder.0.lock(),
        vec![(Event::Invalidate, "ada".to_string(), "bye".to_string())]
    );
}

#[test_log::test]
fn test_versioned_index_sees_bare_values() {
    let cache = versioned();
    cache
        .add_index("len", IndexType::Range, accessor(|v: &String| (v.len() as i64).into()))
        .unwrap();
    cache.put("a".to_string(), VersionedItem::new(1, "x".to_string())).unwrap();
    cache.put("b".to_string(), VersionedItem::new(1, "xyz".to_string())).unwrap();
    cache.put("b".to_string(), VersionedItem::new(2, "xy".to_string())).unwrap();

    let found = cache.execute(&Criteria::greater_than("len", 1i64).into()).unwrap();
    assert_eq!(found, vec![VersionedItem::new(2, "xy".to_string())]);
}

/// Commits a newer item for the key while it loads, once.
#[derive(Default)]
struct RacingLoader(Mutex<Option<VersionedOffHeapCache<String, String>>>);

impl CacheLoader for RacingLoader {
    type Key = String;
    type Value = VersionedItem<String>;

    fn load(&self, key: &String) -> anyhow::Result<Option<VersionedItem<String>>> {
        if let Some(cache) = self.0.lock().take() {
            cache.put(key.clone(), VersionedItem::new(5, "fresh".to_string()))?;
        }
        Ok(Some(VersionedItem::new(0, "loaded".to_string())))
    }
}

#[test_log::test]
fn test_loaded_item_never_replaces_newer_write() {
    let loader = Arc::new(RacingLoader::default());
    let cache = VersionedOffHeapCache::<String, String>::builder(BincodeSerializer::<String>::default())
        .with_cleaner_period(HOUR)
        .with_eviction_period(HOUR)
        .with_loader(loader.clone())
        .build()
        .unwrap();
    let cache = VersionedOffHeapCache::new(cache);
    *loader.0.lock() = Some(cache.clone());

    let key = "ada".to_string();
    let item = cache.get(&key).unwrap().unwrap();
    assert_eq!(item, VersionedItem::new(5, "fresh".to_string()));
    assert_eq!(cache.get(&key).unwrap().unwrap().version(), 5);
    assert_eq!(cache.stats().load, 0);

    cache.put(key.clone(), VersionedItem::new(4, "old".to_string())).unwrap_err();
}
