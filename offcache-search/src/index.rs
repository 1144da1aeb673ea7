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
    collections::{BTreeMap, HashMap, HashSet},
    fmt::Debug,
    ops::Bound,
};

use offcache_common::{code::Key, error::Result};
use serde::{Deserialize, Serialize};

use crate::{predicate::Predicate, value::AttributeValue};

/// Kind of a secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    /// Attribute value to a single key. A later key with the same value replaces the former one.
    UniqueHash,
    /// Attribute value to a set of keys.
    NonUniqueHash,
    /// Sorted attribute values to sets of keys. Range lookups walk only the requested span.
    Range,
}

impl IndexType {
    /// Create an empty index of this kind.
    pub fn create<K: Key>(self) -> Box<dyn CacheIndex<K>> {
        match self {
            IndexType::UniqueHash => Box::<UniqueHashIndex<K>>::default(),
            IndexType::NonUniqueHash => Box::<NonUniqueHashIndex<K>>::default(),
            IndexType::Range => Box::<RangeIndex<K>>::default(),
        }
    }
}

/// Attribute value to keys mapping for one attribute.
pub trait CacheIndex<K>: Send + Sync + Debug + 'static {
    /// Map `value` to `key`.
    fn put(&mut self, value: AttributeValue, key: K);

    /// Drop the `value` to `key` mapping if it exists.
    fn remove(&mut self, value: &AttributeValue, key: &K);

    /// Keys whose value matches the predicate. The predicate must be validated.
    ///
    /// A range predicate fails with [`ErrorKind::NotComparable`](offcache_common::error::ErrorKind::NotComparable)
    /// if any indexed value of `attribute` is of another kind than its bound.
    fn find(&self, attribute: &str, predicate: &Predicate) -> Result<Vec<K>>;

    /// Drop all mappings.
    fn clear(&mut self);

    /// Count of indexed keys.
    fn len(&self) -> usize;

    /// Returns `true` if no key is indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Index for attributes that identify a single entry.
#[derive(Debug)]
pub struct UniqueHashIndex<K> {
    map: HashMap<AttributeValue, K>,
}

impl<K> Default for UniqueHashIndex<K> {
    fn default() -> Self {
        Self { map: HashMap::new() }
    }
}

impl<K: Key> CacheIndex<K> for UniqueHashIndex<K> {
    fn put(&mut self, value: AttributeValue, key: K) {
        if let Some(old) = self.map.insert(value, key) {
            tracing::trace!(?old, "[unique hash index]: key replaced");
        }
    }

    fn remove(&mut self, value: &AttributeValue, key: &K) {
        if self.map.get(value) == Some(key) {
            self.map.remove(value);
        }
    }

    fn find(&self, attribute: &str, predicate: &Predicate) -> Result<Vec<K>> {
        if let Predicate::Eq(value) = predicate {
            return Ok(self.map.get(value).cloned().into_iter().collect());
        }
        let mut keys = vec![];
        for (value, key) in self.map.iter() {
            if predicate.evaluate(attribute, value)? {
                keys.push(key.clone());
            }
        }
        Ok(keys)
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Index for attributes shared by many entries.
#[derive(Debug)]
pub struct NonUniqueHashIndex<K> {
    map: HashMap<AttributeValue, HashSet<K>>,
    len: usize,
}

impl<K> Default for NonUniqueHashIndex<K> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            len: 0,
        }
    }
}

impl<K: Key> CacheIndex<K> for NonUniqueHashIndex<K> {
    fn put(&mut self, value: AttributeValue, key: K) {
        if self.map.entry(value).or_default().insert(key) {
            self.len += 1;
        }
    }

    fn remove(&mut self, value: &AttributeValue, key: &K) {
        if let Some(keys) = self.map.get_mut(value) {
            if keys.remove(key) {
                self.len -= 1;
            }
            if keys.is_empty() {
                self.map.remove(value);
            }
        }
    }

    fn find(&self, attribute: &str, predicate: &Predicate) -> Result<Vec<K>> {
        if let Predicate::Eq(value) = predicate {
            return Ok(self
                .map
                .get(value)
                .map(|keys| keys.iter().cloned().collect())
                .unwrap_or_default());
        }
        let mut found = vec![];
        for (value, keys) in self.map.iter() {
            if predicate.evaluate(attribute, value)? {
                found.extend(keys.iter().cloned());
            }
        }
        Ok(found)
    }

    fn clear(&mut self) {
        self.map.clear();
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Sorted index for range lookups.
///
/// Values are ordered by kind first, so all values of one kind form a contiguous span.
#[derive(Debug)]
pub struct RangeIndex<K> {
    map: BTreeMap<AttributeValue, HashSet<K>>,
    len: usize,
}

impl<K> Default for RangeIndex<K> {
    fn default() -> Self {
        Self {
            map: BTreeMap::new(),
            len: 0,
        }
    }
}

impl<K: Key> RangeIndex<K> {
    fn gather<'a>(&self, spans: impl Iterator<Item = (&'a AttributeValue, &'a HashSet<K>)>) -> Vec<K>
    where
        K: 'a,
    {
        spans.flat_map(|(_, keys)| keys.iter().cloned()).collect()
    }

    /// Values are sorted by kind, so the smallest and largest non-null values bound every kind in the index.
    fn check_kinds(&self, attribute: &str, predicate: &Predicate) -> Result<()> {
        let first = self
            .map
            .range((Bound::Excluded(&AttributeValue::Null), Bound::Unbounded))
            .next();
        let last = self.map.last_key_value();
        for (value, _) in first.into_iter().chain(last) {
            predicate.check(attribute, value)?;
        }
        Ok(())
    }
}

impl<K: Key> CacheIndex<K> for RangeIndex<K> {
    fn put(&mut self, value: AttributeValue, key: K) {
        if self.map.entry(value).or_default().insert(key) {
            self.len += 1;
        }
    }

    fn remove(&mut self, value: &AttributeValue, key: &K) {
        if let Some(keys) = self.map.get_mut(value) {
            if keys.remove(key) {
                self.len -= 1;
            }
            if keys.is_empty() {
                self.map.remove(value);
            }
        }
    }

    fn find(&self, attribute: &str, predicate: &Predicate) -> Result<Vec<K>> {
        if predicate.bound().is_some() {
            self.check_kinds(attribute, predicate)?;
        }
        let keys = match predicate {
            Predicate::Eq(value) => self
                .map
                .get(value)
                .map(|keys| keys.iter().cloned().collect())
                .unwrap_or_default(),
            Predicate::Gt(bound) => self.gather(
                self.map
                    .range((Bound::Excluded(bound), Bound::Unbounded))
                    .take_while(|(value, _)| value.same_kind(bound)),
            ),
            Predicate::Lt(bound) => self.gather(
                self.map
                    .range((Bound::Unbounded, Bound::Excluded(bound)))
                    .rev()
                    .take_while(|(value, _)| value.same_kind(bound)),
            ),
            Predicate::Between(lower, upper) => {
                if lower > upper {
                    return Ok(vec![]);
                }
                self.gather(self.map.range(lower..=upper))
            }
        };
        Ok(keys)
    }

    fn clear(&mut self) {
        self.map.clear();
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use offcache_common::error::ErrorKind;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn int(v: i64) -> AttributeValue {
        AttributeValue::Int(v)
    }

    fn fill(index: &mut dyn CacheIndex<u64>) {
        for key in 0..10u64 {
            index.put(int(key as i64 % 5), key);
        }
        index.put(AttributeValue::Null, 101);
    }

    fn sorted(keys: Result<Vec<u64>>) -> Vec<u64> {
        keys.unwrap().into_iter().sorted().collect()
    }

    #[test]
    fn test_range_index() {
        let mut index = IndexType::Range.create::<u64>();
        fill(index.as_mut());
        assert_eq!(index.len(), 11);

        assert_eq!(sorted(index.find("n", &Predicate::Eq(int(3)))), vec![3, 8]);
        assert_eq!(sorted(index.find("n", &Predicate::Gt(int(3)))), vec![4, 9]);
        assert_eq!(sorted(index.find("n", &Predicate::Lt(int(1)))), vec![0, 5]);
        assert_eq!(
            sorted(index.find("n", &Predicate::Between(int(1), int(2)))),
            vec![1, 2, 6, 7]
        );
        assert!(sorted(index.find("n", &Predicate::Between(int(3), int(1)))).is_empty());
        assert_eq!(sorted(index.find("n", &Predicate::Eq(AttributeValue::Null))), vec![101]);
    }

    #[test]
    fn test_mixed_kinds_not_comparable() {
        for index_type in [IndexType::Range, IndexType::NonUniqueHash, IndexType::UniqueHash] {
            let mut index = index_type.create::<u64>();
            index.put(int(1), 1);
            index.put(AttributeValue::from("text"), 2);

            for predicate in [
                Predicate::Gt(int(0)),
                Predicate::Lt(AttributeValue::from("z")),
                Predicate::Between(AttributeValue::Float(0.0), AttributeValue::Float(2.0)),
            ] {
                let err = index.find("n", &predicate).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::NotComparable, "{index_type:?} {predicate:?}");
            }
            // Equality stays valid on mixed kinds.
            assert_eq!(sorted(index.find("n", &Predicate::Eq(int(1)))), vec![1]);
        }

        let mut index = IndexType::Range.create::<u64>();
        index.put(AttributeValue::Bool(true), 1);
        let err = index.find("flag", &Predicate::Gt(int(0))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotComparable);
    }

    #[test]
    fn test_hash_indices_agree_with_range_index() {
        let predicates = [
            Predicate::Eq(int(2)),
            Predicate::Gt(int(2)),
            Predicate::Lt(int(2)),
            Predicate::Between(int(0), int(4)),
            Predicate::Eq(AttributeValue::Null),
        ];

        let mut range = IndexType::Range.create::<u64>();
        let mut hash = IndexType::NonUniqueHash.create::<u64>();
        fill(range.as_mut());
        fill(hash.as_mut());

        for predicate in &predicates {
            assert_eq!(
                sorted(range.find("n", predicate)),
                sorted(hash.find("n", predicate)),
                "{predicate:?}"
            );
        }
    }

    #[test]
    fn test_non_unique_remove() {
        let mut index = IndexType::NonUniqueHash.create::<u64>();
        index.put(int(1), 1);
        index.put(int(1), 2);
        index.put(int(1), 2);
        assert_eq!(index.len(), 2);

        index.remove(&int(1), &1);
        assert_eq!(sorted(index.find("n", &Predicate::Eq(int(1)))), vec![2]);
        index.remove(&int(1), &42);
        index.remove(&int(2), &2);
        assert_eq!(index.len(), 1);

        index.remove(&int(1), &2);
        assert!(index.is_empty());
    }

    #[test]
    fn test_unique_last_write_wins() {
        let mut index = IndexType::UniqueHash.create::<&'static str>();
        index.put(AttributeValue::from("ada@example.com"), "a");
        index.put(AttributeValue::from("ada@example.com"), "b");
        assert_eq!(
            index
                .find("email", &Predicate::Eq(AttributeValue::from("ada@example.com")))
                .unwrap(),
            vec!["b"]
        );

        // Removing the replaced key keeps the current mapping.
        index.remove(&AttributeValue::from("ada@example.com"), &"a");
        assert_eq!(index.len(), 1);
        index.remove(&AttributeValue::from("ada@example.com"), &"b");
        assert!(index.is_empty());
    }

    #[test]
    fn test_range_index_random_model() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut index = IndexType::Range.create::<u64>();
        let mut model: HashMap<u64, i64> = HashMap::new();

        for _ in 0..2000 {
            let key = rng.random_range(0..64u64);
            if let Some(old) = model.remove(&key) {
                index.remove(&int(old), &key);
            }
            if rng.random_bool(0.7) {
                let value = rng.random_range(-50..50i64);
                index.put(int(value), key);
                model.insert(key, value);
            }
        }
        assert_eq!(index.len(), model.len());

        for _ in 0..200 {
            let a = rng.random_range(-60..60i64);
            let b = rng.random_range(-60..60i64);
            let predicate = match rng.random_range(0..4) {
                0 => Predicate::Eq(int(a)),
                1 => Predicate::Gt(int(a)),
                2 => Predicate::Lt(int(a)),
                _ => Predicate::Between(int(a.min(b)), int(a.max(b))),
            };
            let expected = model
                .iter()
                .filter(|(_, v)| predicate.matches(&int(**v)))
                .map(|(k, _)| *k)
                .sorted()
                .collect_vec();
            assert_eq!(sorted(index.find("n", &predicate)), expected, "{predicate:?}");
        }
    }
}
