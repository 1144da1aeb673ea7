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

use offcache_common::{error::Result, stats::StatsSnapshot};
use offcache_search::Query;

/// The contract shared by every cache backend.
pub trait Cache<K, V>: Send + Sync + 'static {
    /// Cache name.
    fn name(&self) -> &str;

    /// Insert or overwrite an entry that never expires.
    fn put(&self, key: K, value: V) -> Result<()>;

    /// Insert or overwrite an entry that expires after `ttl`.
    fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<()>;

    /// Get the value of a key, asking the loader on a miss.
    fn get(&self, key: &K) -> Result<Option<V>>;

    /// Remove an entry and return its value.
    fn invalidate(&self, key: &K) -> Result<Option<V>>;

    /// Returns `true` if the key has a live entry.
    fn contains(&self, key: &K) -> Result<bool>;

    /// Remove every entry.
    fn clear(&self) -> Result<()>;

    /// Count of entries.
    fn size(&self) -> Result<usize>;

    /// Operation counters.
    fn stats(&self) -> StatsSnapshot;
}

/// A cache that answers attribute queries.
pub trait SearchableCache<K, V>: Cache<K, V> {
    /// Return the values selected by the query.
    fn execute(&self, query: &Query) -> Result<Vec<V>>;
}
