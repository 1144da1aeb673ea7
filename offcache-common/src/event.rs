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

use crate::code::{Key, Value};

/// Reason an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Removed by an explicit invalidation.
    Invalidate,
    /// Removed because its time-to-live elapsed.
    Expire,
    /// Removed by the eviction policy to respect the capacity bound.
    Evict,
}

/// Trait for the customized eviction listener.
///
/// The listener is called synchronously on the thread that removed the entry, after the entry's stripe lock is
/// released.
pub trait EvictionListener: Send + Sync + 'static {
    /// Associated key type.
    type Key;
    /// Associated value type.
    type Value;

    /// Called when a cache entry is removed by invalidation or eviction.
    #[expect(unused_variables)]
    fn on_eviction(&self, reason: Event, key: &Self::Key, value: &Self::Value)
    where
        Self::Key: Key,
        Self::Value: Value,
    {
    }
}
