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
    collections::{HashMap, HashSet},
    fmt::Debug,
    marker::PhantomData,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use offcache_common::{
    code::{Key, Value},
    error::{Error, Result},
};
use parking_lot::RwLock;

use crate::{
    criteria::Criteria,
    index::{CacheIndex, IndexType},
    predicate::Predicate,
    query::Query,
    value::AttributeValue,
};

/// Extracts a named attribute from a cached value.
pub type Accessor<V> = Arc<dyn Fn(&V) -> AttributeValue + Send + Sync + 'static>;

/// Wrap a closure into an [`Accessor`].
pub fn accessor<V>(f: impl Fn(&V) -> AttributeValue + Send + Sync + 'static) -> Accessor<V> {
    Arc::new(f)
}

/// Read access to the cached entries, provided by the cache while a query runs.
pub trait Scanner<K, V> {
    /// Visit every live entry.
    fn scan(&self, f: &mut dyn FnMut(&K, &V)) -> Result<()>;

    /// Read the current value of a key.
    fn get(&self, key: &K) -> Result<Option<V>>;
}

/// Keeps secondary indices in step with the cache and answers queries.
///
/// The cache calls [`IndexHandler::add`] and [`IndexHandler::remove`] under the stripe lock of the key, so
/// index updates for one key are ordered with the writes to that key.
pub trait IndexHandler<K, V>: Send + Sync + 'static {
    /// Register an index on an attribute.
    ///
    /// Fails with [`ErrorKind::Config`](offcache_common::error::ErrorKind::Config) if the attribute is already
    /// registered. Entries already cached are not indexed by this call.
    fn add_index(&self, attribute: &str, index_type: IndexType, accessor: Accessor<V>) -> Result<()>;

    /// Register an attribute without an index. Queries on it scan all cached values.
    fn add_attribute(&self, attribute: &str, accessor: Accessor<V>) -> Result<()>;

    /// Index a new entry.
    fn add(&self, key: &K, value: &V);

    /// Drop an entry from every index.
    fn remove(&self, key: &K, value: &V);

    /// Drop all entries from every index. Registrations stay.
    fn clear(&self);

    /// Resolve the keys selected by the query.
    fn execute(&self, query: &Query, scanner: &dyn Scanner<K, V>) -> Result<Vec<K>>;
}

struct Attribute<K, V> {
    accessor: Accessor<V>,
    index: Option<(IndexType, RwLock<Box<dyn CacheIndex<K>>>)>,
}

/// The default [`IndexHandler`], backed by in-memory [`CacheIndex`]es.
///
/// Each index has its own lock. Writes only share the registry lock, and skip it while no index is registered.
pub struct CacheIndexHandler<K, V> {
    attributes: RwLock<HashMap<String, Attribute<K, V>>>,
    indexed: AtomicUsize,
}

impl<K, V> Debug for CacheIndexHandler<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let attributes = self.attributes.read();
        f.debug_map()
            .entries(
                attributes
                    .iter()
                    .map(|(name, attribute)| (name, attribute.index.as_ref().map(|(t, _)| *t))),
            )
            .finish()
    }
}

impl<K, V> Default for CacheIndexHandler<K, V> {
    fn default() -> Self {
        Self {
            attributes: RwLock::new(HashMap::new()),
            indexed: AtomicUsize::new(0),
        }
    }
}

impl<K, V> CacheIndexHandler<K, V>
where
    K: Key,
    V: Value,
{
    /// Create a handler with no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, attribute: &str, accessor: Accessor<V>, index_type: Option<IndexType>) -> Result<()> {
        let mut attributes = self.attributes.write();
        if attributes.contains_key(attribute) {
            return Err(Error::config("attribute already registered").with_context("attribute", attribute));
        }
        attributes.insert(
            attribute.to_string(),
            Attribute {
                accessor,
                index: index_type.map(|t| (t, RwLock::new(t.create::<K>()))),
            },
        );
        if index_type.is_some() {
            self.indexed.fetch_add(1, Ordering::Release);
        }
        tracing::debug!(attribute, ?index_type, "[index handler]: attribute registered");
        Ok(())
    }

    fn accessor(&self, attribute: &str) -> Result<Accessor<V>> {
        self.attributes
            .read()
            .get(attribute)
            .map(|attribute| attribute.accessor.clone())
            .ok_or_else(|| Error::unknown_attribute(attribute))
    }

    fn lookup(&self, attribute: &str, predicate: &Predicate, scanner: &dyn Scanner<K, V>) -> Result<Vec<K>> {
        // The attribute lock must be released before scanning, the scanner takes the stripe locks.
        let accessor = {
            let attributes = self.attributes.read();
            let entry = attributes
                .get(attribute)
                .ok_or_else(|| Error::unknown_attribute(attribute))?;
            if let Some((_, index)) = &entry.index {
                return index.read().find(attribute, predicate);
            }
            entry.accessor.clone()
        };

        tracing::trace!(attribute, "[index handler]: no index, scanning");
        let mut keys = vec![];
        let mut failure = None;
        scanner.scan(&mut |key, value| {
            if failure.is_some() {
                return;
            }
            match predicate.evaluate(attribute, &accessor(value)) {
                Ok(true) => keys.push(key.clone()),
                Ok(false) => {}
                Err(e) => failure = Some(e),
            }
        })?;
        match failure {
            Some(e) => Err(e),
            None => Ok(keys),
        }
    }

    fn resolve(&self, criteria: &Criteria, scanner: &dyn Scanner<K, V>) -> Result<Vec<K>> {
        match criteria {
            Criteria::Attribute { attribute, predicate } => self.lookup(attribute, predicate, scanner),
            Criteria::And(l, r) => {
                let l = self.resolve(l, scanner)?;
                let r = self.resolve(r, scanner)?.into_iter().collect::<HashSet<_>>();
                Ok(l.into_iter().filter(|key| r.contains(key)).collect())
            }
            Criteria::Or(l, r) => {
                let mut keys = self.resolve(l, scanner)?;
                let mut seen = keys.iter().cloned().collect::<HashSet<_>>();
                for key in self.resolve(r, scanner)? {
                    if seen.insert(key.clone()) {
                        keys.push(key);
                    }
                }
                Ok(keys)
            }
            Criteria::Diff(l, r) => {
                let l = self.resolve(l, scanner)?;
                let r = self.resolve(r, scanner)?.into_iter().collect::<HashSet<_>>();
                Ok(l.into_iter().filter(|key| !r.contains(key)).collect())
            }
        }
    }
}

impl<K, V> IndexHandler<K, V> for CacheIndexHandler<K, V>
where
    K: Key,
    V: Value,
{
    fn add_index(&self, attribute: &str, index_type: IndexType, accessor: Accessor<V>) -> Result<()> {
        self.register(attribute, accessor, Some(index_type))
    }

    fn add_attribute(&self, attribute: &str, accessor: Accessor<V>) -> Result<()> {
        self.register(attribute, accessor, None)
    }

    fn add(&self, key: &K, value: &V) {
        if self.indexed.load(Ordering::Acquire) == 0 {
            return;
        }
        let attributes = self.attributes.read();
        for attribute in attributes.values() {
            if let Some((_, index)) = &attribute.index {
                let value = (attribute.accessor)(value);
                index.write().put(value, key.clone());
            }
        }
    }

    fn remove(&self, key: &K, value: &V) {
        if self.indexed.load(Ordering::Acquire) == 0 {
            return;
        }
        let attributes = self.attributes.read();
        for attribute in attributes.values() {
            if let Some((_, index)) = &attribute.index {
                let value = (attribute.accessor)(value);
                index.write().remove(&value, key);
            }
        }
    }

    fn clear(&self) {
        let attributes = self.attributes.read();
        for attribute in attributes.values() {
            if let Some((_, index)) = &attribute.index {
                index.write().clear();
            }
        }
    }

    fn execute(&self, query: &Query, scanner: &dyn Scanner<K, V>) -> Result<Vec<K>> {
        // Validate everything up front, a failing query returns no partial result.
        if let Some(criteria) = query.criteria() {
            criteria.try_for_each_leaf(&mut |attribute, predicate| {
                self.accessor(attribute)?;
                predicate.validate(attribute)
            })?;
        }
        let mut accessors = HashMap::new();
        if let Some(filter) = query.filter() {
            filter.try_for_each_leaf(&mut |attribute, predicate| {
                predicate.validate(attribute)?;
                accessors.insert(attribute.to_string(), self.accessor(attribute)?);
                Ok(())
            })?;
        }

        let keys = match query.criteria() {
            Some(criteria) => self.resolve(criteria, scanner)?,
            None => {
                let mut keys = vec![];
                scanner.scan(&mut |key, _| keys.push(key.clone()))?;
                keys
            }
        };

        let limit = query.limit().unwrap_or(usize::MAX);
        let Some(filter) = query.filter() else {
            return Ok(keys.into_iter().take(limit).collect());
        };

        let mut selected = vec![];
        for key in keys {
            if selected.len() >= limit {
                break;
            }
            // The entry may have gone since the keys were resolved.
            if let Some(value) = scanner.get(&key)? {
                if filter.matches(&value, &accessors)? {
                    selected.push(key);
                }
            }
        }
        Ok(selected)
    }
}

/// An [`IndexHandler`] that indexes nothing. Every query returns no keys.
pub struct NoopIndexHandler<K, V>(PhantomData<fn(K, V)>);

impl<K, V> Debug for NoopIndexHandler<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoopIndexHandler").finish()
    }
}

impl<K, V> Default for NoopIndexHandler<K, V> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<K, V> IndexHandler<K, V> for NoopIndexHandler<K, V>
where
    K: Key,
    V: Value,
{
    fn add_index(&self, _: &str, _: IndexType, _: Accessor<V>) -> Result<()> {
        Ok(())
    }

    fn add_attribute(&self, _: &str, _: Accessor<V>) -> Result<()> {
        Ok(())
    }

    fn add(&self, _: &K, _: &V) {}

    fn remove(&self, _: &K, _: &V) {}

    fn clear(&self) {}

    fn execute(&self, _: &Query, _: &dyn Scanner<K, V>) -> Result<Vec<K>> {
        Ok(vec![])
    }
}
