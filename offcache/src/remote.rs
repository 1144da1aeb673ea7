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

use offcache_common::{
    code::{Key, Serializer, Value},
    error::{Error, ErrorKind, Result},
    event::{Event, EvictionListener},
    loader::CacheLoader,
    stats::{CacheStats, StatsSnapshot},
};

use crate::traits::Cache;

/// Failures a remote store client reports.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The server cannot be reached.
    #[error("connection refused: {0}")]
    Refused(String),
    /// The server did not answer in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// The server answered with something unexpected.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// A key-value store server, as seen by [`RemoteCache`].
///
/// Keys and values are opaque byte strings. No retry happens on this side, a failed request fails the cache
/// operation.
pub trait RemoteClient: Send + Sync + 'static {
    /// Client error.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Get the value of a key.
    fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, Self::Error>;

    /// Set the value of a key without expiry.
    fn set(&self, key: &[u8], value: &[u8]) -> std::result::Result<(), Self::Error>;

    /// Set the value of a key that expires after `ttl`.
    fn set_with_ttl(&self, key: &[u8], value: &[u8], ttl: Duration) -> std::result::Result<(), Self::Error>;

    /// Expire a key now and return its last value.
    fn expire(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, Self::Error>;

    /// Drop every key of the selected database.
    fn flushdb(&self) -> std::result::Result<(), Self::Error>;

    /// Count of keys in the selected database.
    fn dbsize(&self) -> std::result::Result<usize, Self::Error>;
}

/// A cache backed by a remote key-value store.
///
/// Keys and values are serialized with their own serializers. Client failures surface as
/// [`ErrorKind::Connection`] with the client error as source.
pub struct RemoteCache<K, V, C>
where
    K: Key,
    V: Value,
    C: RemoteClient,
{
    name: String,
    client: C,
    key_serializer: Arc<dyn Serializer<K>>,
    value_serializer: Arc<dyn Serializer<V>>,
    loader: Option<Arc<dyn CacheLoader<Key = K, Value = V>>>,
    listener: Option<Arc<dyn EvictionListener<Key = K, Value = V>>>,
    stats: CacheStats,
}

impl<K, V, C> Debug for RemoteCache<K, V, C>
where
    K: Key,
    V: Value,
    C: RemoteClient,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCache").field("name", &self.name).finish()
    }
}

impl<K, V, C> RemoteCache<K, V, C>
where
    K: Key,
    V: Value,
    C: RemoteClient,
{
    /// Create a cache over `client`.
    pub fn new(client: C, key_serializer: impl Serializer<K>, value_serializer: impl Serializer<V>) -> Self {
        Self {
            name: "offcache-remote".to_string(),
            client,
            key_serializer: Arc::new(key_serializer),
            value_serializer: Arc::new(value_serializer),
            loader: None,
            listener: None,
            stats: CacheStats::default(),
        }
    }

    /// Set the name of the cache instance.
    ///
    /// Default: `offcache-remote`.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the loader called on misses.
    pub fn with_loader(mut self, loader: Arc<dyn CacheLoader<Key = K, Value = V>>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the listener called on invalidation.
    pub fn with_eviction_listener(mut self, listener: Arc<dyn EvictionListener<Key = K, Value = V>>) -> Self {
        self.listener = Some(listener);
        self
    }

    fn connection<E>(&self, op: &'static str) -> impl FnOnce(E) -> Error + '_
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |e| {
            tracing::warn!(cache = %self.name, op, error = %e, "[remote cache]: request failed");
            Error::connection(e).with_context("op", op)
        }
    }

    fn fetch(&self, key: &[u8]) -> Result<Option<V>> {
        match self.client.get(key).map_err(self.connection("get"))? {
            Some(payload) if !payload.is_empty() => self.value_serializer.deserialize(&payload).map(Some),
            _ => Ok(None),
        }
    }
}

impl<K, V, C> Cache<K, V> for RemoteCache<K, V, C>
where
    K: Key,
    V: Value,
    C: RemoteClient,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn put(&self, key: K, value: V) -> Result<()> {
        let key = self.key_serializer.serialize(&key)?;
        let value = self.value_serializer.serialize(&value)?;
        self.client.set(&key, &value).map_err(self.connection("set"))
    }

    fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<()> {
        let key = self.key_serializer.serialize(&key)?;
        let value = self.value_serializer.serialize(&value)?;
        self.client
            .set_with_ttl(&key, &value, ttl)
            .map_err(self.connection("set_with_ttl"))
    }

    fn get(&self, key: &K) -> Result<Option<V>> {
        let raw = self.key_serializer.serialize(key)?;
        if let Some(value) = self.fetch(&raw)? {
            self.stats.record_hit();
            return Ok(Some(value));
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
        let payload = self.value_serializer.serialize(&value)?;
        self.client.set(&raw, &payload).map_err(self.connection("set"))?;
        self.stats.record_load();
        Ok(Some(value))
    }

    fn invalidate(&self, key: &K) -> Result<Option<V>> {
        let raw = self.key_serializer.serialize(key)?;
        let Some(payload) = self.client.expire(&raw).map_err(self.connection("expire"))? else {
            return Ok(None);
        };
        let value = self.value_serializer.deserialize(&payload)?;
        self.stats.record_eviction();
        if let Some(listener) = &self.listener {
            listener.on_eviction(Event::Invalidate, key, &value);
        }
        Ok(Some(value))
    }

    fn contains(&self, key: &K) -> Result<bool> {
        let raw = self.key_serializer.serialize(key)?;
        Ok(self.client.get(&raw).map_err(self.connection("get"))?.is_some())
    }

    fn clear(&self) -> Result<()> {
        self.client.flushdb().map_err(self.connection("flushdb"))
    }

    fn size(&self) -> Result<usize> {
        self.client.dbsize().map_err(self.connection("dbsize"))
    }

    fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicBool, Ordering},
        time::Instant,
    };

    use offcache_common::code::BincodeSerializer;
    use parking_lot::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    struct MemoryClient {
        entries: Mutex<HashMap<Vec<u8>, (Vec<u8>, Option<Instant>)>>,
        down: AtomicBool,
    }

    impl MemoryClient {
        fn check(&self) -> std::result::Result<(), ConnectionError> {
            if self.down.load(Ordering::Relaxed) {
                return Err(ConnectionError::Refused("127.0.0.1:6379".to_string()));
            }
            Ok(())
        }
    }

    impl RemoteClient for Arc<MemoryClient> {
        type Error = ConnectionError;

        fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, ConnectionError> {
            self.check()?;
            let mut entries = self.entries.lock();
            match entries.get(key) {
                Some((_, Some(at))) if *at <= Instant::now() => {
                    entries.remove(key);
                    Ok(None)
                }
                Some((value, _)) => Ok(Some(value.clone())),
                None => Ok(None),
            }
        }

        fn set(&self, key: &[u8], value: &[u8]) -> std::result::Result<(), ConnectionError> {
            self.check()?;
            self.entries.lock().insert(key.to_vec(), (value.to_vec(), None));
            Ok(())
        }

        fn set_with_ttl(&self, key: &[u8], value: &[u8], ttl: Duration) -> std::result::Result<(), ConnectionError> {
            self.check()?;
            self.entries
                .lock()
                .insert(key.to_vec(), (value.to_vec(), Some(Instant::now() + ttl)));
            Ok(())
        }

        fn expire(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, ConnectionError> {
            self.check()?;
            Ok(self.entries.lock().remove(key).map(|(value, _)| value))
        }

        fn flushdb(&self) -> std::result::Result<(), ConnectionError> {
            self.check()?;
            self.entries.lock().clear();
            Ok(())
        }

        fn dbsize(&self) -> std::result::Result<usize, ConnectionError> {
            self.check()?;
            Ok(self.entries.lock().len())
        }
    }

    struct Doubler;

    impl CacheLoader for Doubler {
        type Key = u64;
        type Value = String;

        fn load(&self, key: &u64) -> anyhow::Result<Option<String>> {
            Ok((*key < 100).then(|| (key * 2).to_string()))
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(Event, u64, String)>>);

    impl EvictionListener for Recorder {
        type Key = u64;
        type Value = String;

        fn on_eviction(&self, reason: Event, key: &u64, value: &String) {
            self.0.lock().push((reason, *key, value.clone()));
        }
    }

    fn cache(client: Arc<MemoryClient>) -> RemoteCache<u64, String, Arc<MemoryClient>> {
        RemoteCache::new(
            client,
            BincodeSerializer::<u64>::default(),
            BincodeSerializer::<String>::default(),
        )
    }

    #[test_log::test]
    fn test_remote_cache() {
        let client = Arc::new(MemoryClient::default());
        let recorder = Arc::new(Recorder::default());
        let cache = cache(client.clone())
            .with_name("remote")
            .with_loader(Arc::new(Doubler))
            .with_eviction_listener(recorder.clone());

        cache.put(1, "one".to_string()).unwrap();
        assert_eq!(cache.get(&1).unwrap(), Some("one".to_string()));
        assert_eq!(cache.get(&21).unwrap(), Some("42".to_string()));
        assert_eq!(cache.get(&200).unwrap(), None);
        assert!(cache.contains(&21).unwrap());
        assert_eq!(cache.size().unwrap(), 2);

        assert_eq!(cache.invalidate(&1).unwrap(), Some("one".to_string()));
        assert_eq!(cache.invalidate(&1).unwrap(), None);
        assert_eq!(*recorder.0.lock(), vec![(Event::Invalidate, 1, "one".to_string())]);

        assert_eq!(
            cache.stats(),
            StatsSnapshot {
                hit: 1,
                miss: 2,
                load: 1,
                eviction: 1,
            }
        );

        cache.clear().unwrap();
        assert_eq!(cache.size().unwrap(), 0);
    }

    #[test_log::test]
    fn test_remote_ttl() {
        let client = Arc::new(MemoryClient::default());
        let cache = cache(client);
        cache
            .put_with_ttl(1, "one".to_string(), Duration::from_millis(20))
            .unwrap();
        assert!(cache.contains(&1).unwrap());
        std::thread::sleep(Duration::from_millis(50));
        assert!(!cache.contains(&1).unwrap());
    }

    #[test_log::test]
    fn test_connection_errors_surface() {
        let client = Arc::new(MemoryClient::default());
        let cache = cache(client.clone());
        cache.put(1, "one".to_string()).unwrap();

        client.down.store(true, Ordering::Relaxed);
        for err in [
            cache.get(&1).unwrap_err(),
            cache.put(2, "two".to_string()).unwrap_err(),
            cache.invalidate(&1).unwrap_err(),
            cache.clear().unwrap_err(),
            cache.size().unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::Connection);
            assert!(err.downcast_ref::<ConnectionError>().is_some());
        }

        client.down.store(false, Ordering::Relaxed);
        assert_eq!(cache.get(&1).unwrap(), Some("one".to_string()));
    }
}
