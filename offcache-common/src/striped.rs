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

use std::hash::Hash;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::hasher::hash_key;

/// A fixed set of read/write locks, each guarding a disjoint partition of the key space.
///
/// A key belongs to stripe `hash(key) % stripes`. Operations on keys of different stripes never contend.
#[derive(Debug)]
pub struct StripedRwLock<T = ()> {
    stripes: Vec<RwLock<T>>,
}

impl<T> StripedRwLock<T> {
    /// Create `stripes` locks, each initialized with `init`.
    ///
    /// # Panics
    ///
    /// Panics if `stripes` is zero.
    pub fn new(stripes: usize, init: impl Fn() -> T) -> Self {
        assert!(stripes > 0, "stripe count must be positive");
        Self {
            stripes: (0..stripes).map(|_| RwLock::new(init())).collect(),
        }
    }

    /// Count of stripes.
    pub fn stripes(&self) -> usize {
        self.stripes.len()
    }

    /// Stripe index of the given hash.
    pub fn stripe_of_hash(&self, hash: u64) -> usize {
        (hash % self.stripes.len() as u64) as usize
    }

    /// Stripe index of the given key.
    pub fn stripe_of<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        self.stripe_of_hash(hash_key(key))
    }

    /// Acquire the read lock of the stripe that owns `key`.
    pub fn read<Q>(&self, key: &Q) -> RwLockReadGuard<'_, T>
    where
        Q: Hash + ?Sized,
    {
        self.stripes[self.stripe_of(key)].read()
    }

    /// Acquire the write lock of the stripe that owns `key`.
    pub fn write<Q>(&self, key: &Q) -> RwLockWriteGuard<'_, T>
    where
        Q: Hash + ?Sized,
    {
        self.stripes[self.stripe_of(key)].write()
    }

    /// Acquire the read lock of stripe `index`.
    pub fn read_at(&self, index: usize) -> RwLockReadGuard<'_, T> {
        self.stripes[index].read()
    }

    /// Acquire the write lock of stripe `index`.
    pub fn write_at(&self, index: usize) -> RwLockWriteGuard<'_, T> {
        self.stripes[index].write()
    }

    /// Acquire the write locks of all stripes.
    ///
    /// Locks are always taken in stripe order, so concurrent callers cannot deadlock with each other.
    pub fn write_all(&self) -> Vec<RwLockWriteGuard<'_, T>> {
        self.stripes.iter().map(|stripe| stripe.write()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn test_stripe_distribution() {
        let lock = StripedRwLock::new(8, || ());
        let mut hit = [false; 8];
        for i in 0..1024u64 {
            let stripe = lock.stripe_of(&i);
            assert!(stripe < 8);
            assert_eq!(stripe, lock.stripe_of(&i));
            hit[stripe] = true;
        }
        assert!(hit.iter().all(|h| *h));
    }

    #[test]
    fn test_striped_counter() {
        let lock = Arc::new(StripedRwLock::new(4, || 0u64));

        let handles = (0..8u64)
            .map(|t| {
                let lock = lock.clone();
                thread::spawn(move || {
                    for i in 0..1000u64 {
                        *lock.write(&(t * 1000 + i)) += 1;
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        let total: u64 = lock.write_all().iter().map(|guard| **guard).sum();
        assert_eq!(total, 8000);
        let v = *lock.read(&7u64);
        assert_eq!(v, *lock.read_at(lock.stripe_of(&7u64)));
    }

    #[test]
    #[should_panic]
    fn test_zero_stripes() {
        let _ = StripedRwLock::new(0, || ());
    }
}
